//! The queue handle and its lifecycle.

use std::fmt;
use std::os::unix::io::{AsRawFd, RawFd};
use std::sync::OnceLock;

use bitflags::bitflags;
use nix::sys::signal::Signal;
use nix::sys::stat::Mode;
use tracing::{debug, trace, warn};

use crate::attr::{self, AttributeFlags, Attributes};
use crate::deadline::Deadline;
use crate::error::{Error, UnlinkError};
use crate::name::QueueName;
use crate::notify::Notify;
use crate::raw;

bitflags! {
    /// Flags selecting how a queue is opened.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct OpenFlags: libc::c_int {
        const WRITE_ONLY = libc::O_WRONLY;
        const READ_WRITE = libc::O_RDWR;
        const CLOEXEC = libc::O_CLOEXEC;
        const CREATE = libc::O_CREAT;
        const EXCLUSIVE = libc::O_EXCL;
        const NONBLOCK = libc::O_NONBLOCK;
    }
}

impl OpenFlags {
    /// Read-only access: the empty set. Absence of a write flag selects
    /// read-only mode, as in the kernel ABI.
    pub const READ_ONLY: OpenFlags = OpenFlags::empty();

    /// Conventional flags for opening an existing queue for reading.
    pub const DEFAULT_OPEN: OpenFlags = OpenFlags::READ_ONLY.union(OpenFlags::CLOEXEC);

    /// Conventional flags for creating a fresh queue for writing.
    pub const DEFAULT_CREATE: OpenFlags = OpenFlags::WRITE_ONLY
        .union(OpenFlags::CLOEXEC)
        .union(OpenFlags::CREATE)
        .union(OpenFlags::EXCLUSIVE);
}

/// Renders the set flags by their `O_*` names, sorted and joined with `|`.
/// With neither write flag set the output includes `O_RDONLY`.
impl fmt::Display for OpenFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const NAMES: [(OpenFlags, &str); 6] = [
            (OpenFlags::WRITE_ONLY, "O_WRONLY"),
            (OpenFlags::READ_WRITE, "O_RDWR"),
            (OpenFlags::CLOEXEC, "O_CLOEXEC"),
            (OpenFlags::CREATE, "O_CREAT"),
            (OpenFlags::EXCLUSIVE, "O_EXCL"),
            (OpenFlags::NONBLOCK, "O_NONBLOCK"),
        ];
        let mut names: Vec<&str> = NAMES
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|&(_, name)| name)
            .collect();
        if !self.intersects(OpenFlags::WRITE_ONLY.union(OpenFlags::READ_WRITE)) {
            names.push("O_RDONLY");
        }
        names.sort_unstable();
        f.write_str(&names.join("|"))
    }
}

/// Options controlling how a queue is opened or created.
///
/// Supplying creation attributes implies the create flag. When creating, a
/// zero mode defaults to `0644` and absent attributes fall back to the
/// system-wide defaults under `/proc/sys/fs/mqueue`. When opening an
/// existing queue, any supplied mode and attributes are discarded.
#[derive(Debug, Clone)]
pub struct OpenOptions {
    oflag: OpenFlags,
    mode: Mode,
    attr: Option<Attributes>,
}

impl Default for OpenOptions {
    fn default() -> Self {
        Self {
            oflag: OpenFlags::READ_ONLY,
            mode: Mode::empty(),
            attr: None,
        }
    }
}

impl OpenOptions {
    /// Read-only open of an existing queue; adjust with the other builders.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the open flags.
    pub fn flags(mut self, oflag: OpenFlags) -> Self {
        self.oflag = oflag;
        self
    }

    /// Requests creation with the given permission mode and capacity bounds.
    pub fn create_with(mut self, mode: Mode, max_queue_depth: i64, max_message_size: i64) -> Self {
        self.mode = mode;
        self.attr = Some(Attributes::with_capacity(max_queue_depth, max_message_size));
        self
    }

    /// Validates the name, resolves the options, and opens the queue.
    pub fn open(mut self, name: &str) -> Result<MessageQueue, Error> {
        let name = QueueName::new(name)?;
        self.resolve()?;
        let mqd = raw::open(&name, self.oflag, self.mode, self.attr.as_ref())?;
        debug!(name = %name, mqd, flags = %self.oflag, "opened message queue");
        Ok(MessageQueue {
            name,
            oflag: self.oflag,
            mode: self.mode,
            attr: self.attr,
            mqd,
            buf: Vec::new(),
            closed: OnceLock::new(),
        })
    }

    fn resolve(&mut self) -> Result<(), Error> {
        if self.attr.is_some() && !self.oflag.contains(OpenFlags::CREATE) {
            self.oflag |= OpenFlags::CREATE;
        }
        if self.oflag.contains(OpenFlags::CREATE) {
            if self.mode.is_empty() {
                self.mode = Mode::from_bits_truncate(0o644);
            }
            if self.attr.is_none() {
                let depth = attr::default_queue_depth()?;
                let size = attr::default_message_size()?;
                self.attr = Some(Attributes::with_capacity(depth, size));
            }
        } else {
            // Opening an existing queue consults neither; the kernel would
            // ignore them anyway.
            self.mode = Mode::empty();
            self.attr = None;
        }
        Ok(())
    }
}

/// An open message queue.
///
/// Created by [`MessageQueue::open`], [`MessageQueue::create`], or
/// [`OpenOptions::open`]. Closing is idempotent: repeated or racing calls
/// all observe the single underlying close attempt's result, and dropping
/// the handle closes it if the caller has not.
pub struct MessageQueue {
    name: QueueName,
    oflag: OpenFlags,
    mode: Mode,
    attr: Option<Attributes>,
    mqd: RawFd,
    // Receive buffer, allocated on first receive and reused afterwards.
    buf: Vec<u8>,
    closed: OnceLock<Result<(), Error>>,
}

impl MessageQueue {
    /// Opens an existing queue read-only with default options.
    pub fn open(name: &str) -> Result<Self, Error> {
        OpenOptions::new().open(name)
    }

    /// Creates a fresh queue with [`OpenFlags::DEFAULT_CREATE`] and the
    /// given capacity bounds.
    pub fn create(
        name: &str,
        mode: Mode,
        max_queue_depth: i64,
        max_message_size: i64,
    ) -> Result<Self, Error> {
        OpenOptions::new()
            .flags(OpenFlags::DEFAULT_CREATE)
            .create_with(mode, max_queue_depth, max_message_size)
            .open(name)
    }

    /// Sends a message with the given priority.
    ///
    /// Blocks while the queue is full unless it is non-blocking or the
    /// deadline expires first.
    pub fn send(
        &self,
        deadline: &(impl Deadline + ?Sized),
        data: &[u8],
        priority: u32,
    ) -> Result<(), Error> {
        raw::send(self.mqd, deadline, data, priority)?;
        trace!(mqd = self.mqd, len = data.len(), priority, "sent message");
        Ok(())
    }

    /// Receives the oldest, highest-priority message, returning the payload
    /// and the sender's priority.
    ///
    /// The payload borrows the handle's internal buffer and is overwritten
    /// by the next receive; copy it out to retain it. The buffer is
    /// allocated on first use, sized to the queue's maximum message size.
    /// For a buffer per call, use [`raw::receive`] with your own storage.
    pub fn receive(
        &mut self,
        deadline: &(impl Deadline + ?Sized),
    ) -> Result<(&[u8], u32), Error> {
        if self.buf.is_empty() {
            // Only the blocking flag can change on an open queue, so the
            // maximum message size needs fetching exactly once.
            let attr = self.get_attr()?;
            if attr.max_message_size <= 0 {
                return Err(Error::InvalidMessageSize);
            }
            self.buf = vec![0; attr.max_message_size as usize];
        }
        let mut priority = 0u32;
        let received = raw::receive(self.mqd, deadline, &mut self.buf, &mut priority)?;
        trace!(mqd = self.mqd, len = received, priority, "received message");
        Ok((&self.buf[..received], priority))
    }

    /// The queue's current attribute snapshot.
    pub fn get_attr(&self) -> Result<Attributes, Error> {
        raw::get_set_attributes(self.mqd, None)
    }

    /// Sets or clears the queue's blocking mode, the only attribute mutable
    /// after creation.
    ///
    /// Returns the attributes as of just before the change.
    pub fn set_blocking(&self, blocking: bool) -> Result<Attributes, Error> {
        let mut new = Attributes::default();
        if !blocking {
            new.flags = AttributeFlags::NONBLOCK;
        }
        raw::get_set_attributes(self.mqd, Some(&new))
    }

    /// Subscribes for delivery of `signal` when a message arrives on the
    /// empty queue.
    ///
    /// The kernel admits one subscriber per queue; a second registration
    /// fails with [`Error::NotifyBusy`].
    pub fn notify(&self, signal: Signal) -> Result<(), Error> {
        raw::notify(self.mqd, Some(Notify::Signal(signal)))
    }

    /// Registers the given notification record.
    pub fn notify_with(&self, notify: Notify) -> Result<(), Error> {
        raw::notify(self.mqd, Some(notify))
    }

    /// Clears the queue's notification subscription.
    pub fn clear_notify(&self) -> Result<(), Error> {
        raw::notify(self.mqd, None)
    }

    /// Closes the queue descriptor.
    ///
    /// The underlying close runs exactly once; repeated and racing calls
    /// all observe its result.
    pub fn close(&self) -> Result<(), Error> {
        *self.closed.get_or_init(|| {
            debug!(mqd = self.mqd, name = %self.name, "closing message queue");
            raw::close(self.mqd)
        })
    }

    /// Closes the queue and removes its name from the system namespace.
    ///
    /// The close is idempotent (see [`MessageQueue::close`]); name removal
    /// runs even when the handle was already closed, and failures from both
    /// steps are reported together. The kernel frees the queue once every
    /// process holding it closes its descriptor.
    pub fn unlink(&self) -> Result<(), UnlinkError> {
        let close = self.close().err();
        let removal = raw::unlink(&self.name).err();
        if removal.is_none() {
            debug!(name = %self.name, "unlinked message queue");
        }
        match UnlinkError::new(close, removal) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// The queue's validated name.
    pub fn name(&self) -> &QueueName {
        &self.name
    }

    /// The flags the queue was opened with.
    pub fn flags(&self) -> OpenFlags {
        self.oflag
    }

    /// The permission mode used at creation; empty unless the queue was
    /// created.
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// The attributes the queue was created with; `None` unless this handle
    /// created it.
    pub fn creation_attributes(&self) -> Option<Attributes> {
        self.attr
    }
}

impl AsRawFd for MessageQueue {
    fn as_raw_fd(&self) -> RawFd {
        self.mqd
    }
}

impl fmt::Debug for MessageQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageQueue")
            .field("name", &self.name.as_str())
            .field("mqd", &self.mqd)
            .field("flags", &self.oflag)
            .finish_non_exhaustive()
    }
}

impl Drop for MessageQueue {
    fn drop(&mut self) {
        if self.closed.get().is_none() {
            if let Err(err) = self.close() {
                warn!(mqd = self.mqd, name = %self.name, %err, "failed to close message queue");
            }
        }
    }
}
