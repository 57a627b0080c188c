//! Raw queue operations.
//!
//! One arity-checked syscall declaration per operation, each with its own
//! errno vocabulary. The tables never overlap within an operation, which the
//! gateway verifies the first time the operation is used. These functions
//! are the low-level surface; [`MessageQueue`] wraps them with lifecycle
//! management.
//!
//! [`MessageQueue`]: crate::MessageQueue

use std::os::unix::io::RawFd;
use std::sync::OnceLock;

use nix::sys::stat::Mode;
use nix::sys::time::TimeSpec;

use crate::attr::{Attributes, RawAttr};
use crate::deadline::{to_timespec, Deadline};
use crate::error::Error;
use crate::name::QueueName;
use crate::notify::Notify;
use crate::queue::OpenFlags;
use crate::sys::Syscall;

fn sys_open() -> &'static Syscall {
    static SYS: OnceLock<Syscall> = OnceLock::new();
    SYS.get_or_init(|| {
        Syscall::new(
            libc::SYS_mq_open,
            4,
            &[
                Error::OpenPermissionDenied,
                Error::AlreadyExists,
                Error::InvalidAttributes,
                Error::ProcessLimitReached,
                Error::NameTooLong,
                Error::SystemLimitReached,
                Error::NoSuchQueue,
                Error::NoMemory,
                Error::NoSpace,
            ],
        )
    })
}

/// Opens a message queue, returning its descriptor.
///
/// One of the direction flags selects access; absence of a write flag means
/// read-only. When creating, `attr` supplies the queue's capacity bounds.
pub fn open(
    name: &QueueName,
    oflag: OpenFlags,
    mode: Mode,
    attr: Option<&Attributes>,
) -> Result<RawFd, Error> {
    let raw_attr = attr.map(RawAttr::from);
    let attr_ptr = match &raw_attr {
        Some(raw) => raw as *const RawAttr as usize,
        None => 0,
    };
    let mqd = sys_open().call_value(&[
        name.as_kernel().as_ptr() as usize, // name
        oflag.bits() as usize,              // oflag
        mode.bits() as usize,               // mode
        attr_ptr,                           // attr
    ])?;
    Ok(mqd as RawFd)
}

fn sys_close() -> &'static Syscall {
    static SYS: OnceLock<Syscall> = OnceLock::new();
    SYS.get_or_init(|| Syscall::new(libc::SYS_close, 1, &[Error::BadDescriptor]))
}

/// Closes a queue descriptor.
pub fn close(mqd: RawFd) -> Result<(), Error> {
    sys_close().call(&[mqd as usize])
}

fn sys_unlink() -> &'static Syscall {
    static SYS: OnceLock<Syscall> = OnceLock::new();
    SYS.get_or_init(|| {
        Syscall::new(
            libc::SYS_mq_unlink,
            1,
            &[
                Error::UnlinkPermissionDenied,
                Error::NameTooLong,
                Error::UnlinkNoSuchQueue,
            ],
        )
    })
}

/// Removes a queue's name from the system namespace.
///
/// The kernel destroys the queue once the last process holding it closes
/// its descriptor.
pub fn unlink(name: &QueueName) -> Result<(), Error> {
    sys_unlink().call(&[name.as_kernel().as_ptr() as usize])
}

fn sys_send() -> &'static Syscall {
    static SYS: OnceLock<Syscall> = OnceLock::new();
    SYS.get_or_init(|| {
        Syscall::new(
            libc::SYS_mq_timedsend,
            5,
            &[
                Error::TimedOut,
                Error::Interrupted,
                Error::InvalidDeadline,
                Error::QueueFull,
                Error::NotOpenForWriting,
                Error::MessageTooLong,
            ],
        )
    })
}

fn sys_receive() -> &'static Syscall {
    static SYS: OnceLock<Syscall> = OnceLock::new();
    SYS.get_or_init(|| {
        Syscall::new(
            libc::SYS_mq_timedreceive,
            5,
            &[
                Error::TimedOut,
                Error::Interrupted,
                Error::InvalidDeadline,
                Error::QueueEmpty,
                Error::NotOpenForReading,
                Error::BufferTooSmall,
            ],
        )
    })
}

/// Sends `data` with the given priority.
///
/// Without a deadline the call blocks while the queue is full, unless the
/// queue is non-blocking.
pub fn send(
    mqd: RawFd,
    deadline: &(impl Deadline + ?Sized),
    data: &[u8],
    priority: u32,
) -> Result<(), Error> {
    let ts = to_timespec(deadline)?;
    sys_send().call(&[
        mqd as usize,           // mqdes
        data.as_ptr() as usize, // msg_ptr
        data.len(),             // msg_len
        priority as usize,      // msg_prio
        timeout_ptr(&ts),       // abs_timeout
    ])
}

/// Receives the oldest, highest-priority message into `buf`, storing the
/// sender's priority and returning the byte count.
///
/// `buf` must be at least the queue's maximum message size.
pub fn receive(
    mqd: RawFd,
    deadline: &(impl Deadline + ?Sized),
    buf: &mut [u8],
    priority: &mut u32,
) -> Result<usize, Error> {
    let ts = to_timespec(deadline)?;
    let received = sys_receive().call_value(&[
        mqd as usize,                // mqdes
        buf.as_mut_ptr() as usize,   // msg_ptr
        buf.len(),                   // msg_len
        priority as *mut u32 as usize, // msg_prio
        timeout_ptr(&ts),            // abs_timeout
    ])?;
    Ok(received as usize)
}

fn timeout_ptr(ts: &Option<TimeSpec>) -> usize {
    match ts {
        Some(ts) => ts.as_ref() as *const libc::timespec as usize,
        None => 0,
    }
}

fn sys_getsetattr() -> &'static Syscall {
    static SYS: OnceLock<Syscall> = OnceLock::new();
    SYS.get_or_init(|| {
        Syscall::new(
            libc::SYS_mq_getsetattr,
            3,
            &[Error::BadDescriptor, Error::InvalidAttributeFlags],
        )
    })
}

/// Reads, and optionally updates, a queue's attributes.
///
/// With `new` absent this is a pure read. With `new` present the kernel
/// applies only the blocking bit, rejecting any other set flag, and the
/// returned snapshot is from just before the change.
pub fn get_set_attributes(mqd: RawFd, new: Option<&Attributes>) -> Result<Attributes, Error> {
    let new_raw = new.map(RawAttr::from);
    let new_ptr = match &new_raw {
        Some(raw) => raw as *const RawAttr as usize,
        None => 0,
    };
    let mut old = RawAttr::default();
    sys_getsetattr().call(&[
        mqd as usize,                    // mqdes
        new_ptr,                         // newattr
        &mut old as *mut RawAttr as usize, // oldattr
    ])?;
    Ok(Attributes::from(old))
}

fn sys_notify() -> &'static Syscall {
    static SYS: OnceLock<Syscall> = OnceLock::new();
    SYS.get_or_init(|| {
        Syscall::new(
            libc::SYS_mq_notify,
            2,
            &[
                Error::BadDescriptor,
                Error::NoMemory,
                Error::NotifyBusy,
                Error::NotifyInvalid,
            ],
        )
    })
}

/// Registers, or with `None` clears, the queue's notification subscription.
pub fn notify(mqd: RawFd, notify: Option<Notify>) -> Result<(), Error> {
    let sev = notify.map(Notify::to_sigevent);
    let sev_ptr = match &sev {
        Some(sev) => sev as *const libc::sigevent as usize,
        None => 0,
    };
    sys_notify().call(&[mqd as usize, sev_ptr])
}
