//! Queue attributes and mqueue system configuration.

use std::fmt;
use std::fs;
use std::path::Path;

use bitflags::bitflags;
use nix::errno::Errno;
use serde::{Deserialize, Serialize};

use crate::error::Error;

bitflags! {
    /// Queue state flags.
    ///
    /// Only the non-blocking bit is meaningful here, and it is the only
    /// attribute that can change after creation.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct AttributeFlags: i64 {
        const NONBLOCK = libc::O_NONBLOCK as i64;
    }
}

impl Default for AttributeFlags {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Display for AttributeFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.contains(Self::NONBLOCK) {
            f.write_str("O_NONBLOCK")
        } else {
            Ok(())
        }
    }
}

// Serialized as the raw bits, matching the kernel's integer field.
impl Serialize for AttributeFlags {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(self.bits())
    }
}

impl<'de> Deserialize<'de> for AttributeFlags {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        i64::deserialize(deserializer).map(Self::from_bits_retain)
    }
}

/// A queue's configuration and state snapshot, mirroring the kernel's
/// attribute structure.
///
/// The capacity bounds are fixed when the queue is created and echoed back
/// by the kernel on every get/set call; only the non-blocking flag is
/// mutable afterwards. `current_depth` is whatever the queue held at the
/// moment of the snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attributes {
    /// Queue flags; zero or [`AttributeFlags::NONBLOCK`].
    #[serde(rename = "mq_flags")]
    pub flags: AttributeFlags,
    /// Maximum number of messages the queue holds.
    #[serde(rename = "mq_maxmsg")]
    pub max_queue_depth: i64,
    /// Maximum size of a single message in bytes.
    #[serde(rename = "mq_msgsize")]
    pub max_message_size: i64,
    /// Number of messages currently queued.
    #[serde(rename = "mq_curmsgs")]
    pub current_depth: i64,
}

impl Attributes {
    /// Creation attributes with the given capacity bounds.
    pub fn with_capacity(max_queue_depth: i64, max_message_size: i64) -> Self {
        Self {
            max_queue_depth,
            max_message_size,
            ..Self::default()
        }
    }

    /// Whether the non-blocking bit is set.
    pub fn is_nonblocking(&self) -> bool {
        self.flags.contains(AttributeFlags::NONBLOCK)
    }
}

/// Kernel `struct mq_attr`.
///
/// The four reserved tail words must be present: the get/set call writes the
/// full structure back.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct RawAttr {
    mq_flags: libc::c_long,
    mq_maxmsg: libc::c_long,
    mq_msgsize: libc::c_long,
    mq_curmsgs: libc::c_long,
    reserved: [libc::c_long; 4],
}

impl From<&Attributes> for RawAttr {
    fn from(attr: &Attributes) -> Self {
        Self {
            mq_flags: attr.flags.bits() as libc::c_long,
            mq_maxmsg: attr.max_queue_depth as libc::c_long,
            mq_msgsize: attr.max_message_size as libc::c_long,
            mq_curmsgs: attr.current_depth as libc::c_long,
            reserved: [0; 4],
        }
    }
}

impl From<RawAttr> for Attributes {
    fn from(raw: RawAttr) -> Self {
        Self {
            flags: AttributeFlags::from_bits_retain(raw.mq_flags as i64),
            max_queue_depth: raw.mq_maxmsg as i64,
            max_message_size: raw.mq_msgsize as i64,
            current_depth: raw.mq_curmsgs as i64,
        }
    }
}

const MQUEUE_SYSCTL_DIR: &str = "/proc/sys/fs/mqueue";

/// Maximum message size for queues created without explicit attributes.
pub fn default_message_size() -> Result<i64, Error> {
    read_setting("msgsize_default")
}

/// Ceiling on the maximum message size a queue may be created with.
pub fn max_message_size() -> Result<i64, Error> {
    read_setting("msgsize_max")
}

/// Maximum queue depth for queues created without explicit attributes.
pub fn default_queue_depth() -> Result<i64, Error> {
    read_setting("msg_default")
}

/// Ceiling on the maximum queue depth a queue may be created with.
pub fn max_queue_depth() -> Result<i64, Error> {
    read_setting("msg_max")
}

/// System-wide limit on the number of message queues.
pub fn max_queues() -> Result<i64, Error> {
    read_setting("queues_max")
}

fn read_setting(file: &'static str) -> Result<i64, Error> {
    let contents = fs::read_to_string(Path::new(MQUEUE_SYSCTL_DIR).join(file)).map_err(|err| {
        Error::Config {
            file,
            errno: Errno::from_raw(err.raw_os_error().unwrap_or(0)),
        }
    })?;
    contents.trim().parse().map_err(|_| Error::Config {
        file,
        errno: Errno::EINVAL,
    })
}
