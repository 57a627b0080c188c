//! # POSIX Message Queue Client
//!
//! A typed client library over the kernel's POSIX message-queue facility
//! (`mq_overview(7)`): open, send to, receive from, configure, subscribe for
//! notifications on, and destroy named kernel-managed queues.
//!
//! This crate marshals requests to the kernel's queue provider and
//! translates its error signals; it is not a queue implementation.
//! Durability, persistence, multi-consumer fan-out, and ordering guarantees
//! are entirely the kernel's. Linux only: the operations dispatch the
//! `mq_*` syscalls directly.
//!
//! ## Architecture Overview
//!
//! - `queue`: the [`MessageQueue`] handle and [`OpenOptions`] builder,
//!   owning the descriptor lifecycle (open, active, closed, unlinked)
//! - `raw`: one arity-checked syscall wrapper per operation, each with its
//!   own errno vocabulary
//! - `error`: the closed error taxonomy every operation's failures are
//!   translated into, plus passthrough for unanticipated codes
//! - `deadline`: the capability turning "does this caller have a timeout"
//!   into the kernel's absolute-time wait semantics
//! - `name`: queue-name validation, run before any descriptor is opened
//! - `attr`: the attribute snapshot mirroring the kernel structure, and the
//!   mqueue settings under `/proc/sys/fs/mqueue`
//! - `notify`: the single-subscriber notification record
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use posix_mq::{Mode, NoDeadline, OpenFlags, OpenOptions};
//! use std::time::Duration;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut mq = OpenOptions::new()
//!         .flags(OpenFlags::READ_WRITE | OpenFlags::CREATE | OpenFlags::CLOEXEC)
//!         .create_with(Mode::from_bits_truncate(0o600), 10, 1024)
//!         .open("/example")?;
//!
//!     mq.send(&NoDeadline, b"hello", 0)?;
//!     let (payload, priority) = mq.receive(&Duration::from_secs(1))?;
//!     println!("{} bytes at priority {}", payload.len(), priority);
//!
//!     mq.unlink()?;
//!     Ok(())
//! }
//! ```
//!
//! ## Blocking and Deadlines
//!
//! Every operation is a direct, thread-blocking call into the kernel; there
//! is no internal scheduler or retry machinery. Whether a call waits is
//! controlled by the queue's own blocking flag and the [`Deadline`] supplied
//! per call — [`NoDeadline`] waits indefinitely, an absolute `SystemTime`
//! fails once that instant passes, and a `Duration` anchors to the wall
//! clock when the call starts. Retry policy belongs to the caller:
//! [`Error::is_temporary`] and [`Error::is_timeout`] classify which
//! failures can clear on their own.

/// Queue attributes and mqueue system configuration.
pub mod attr;

/// Deadline abstraction for blocking operations.
pub mod deadline;

/// The typed error taxonomy.
pub mod error;

/// Queue name validation.
pub mod name;

/// Notification subscriptions.
pub mod notify;

/// The queue handle, open options, and lifecycle management.
pub mod queue;

/// Raw per-operation syscall wrappers.
pub mod raw;

mod sys;

// Re-export key types for convenient library usage.

pub use attr::{
    default_message_size, default_queue_depth, max_message_size, max_queue_depth, max_queues,
    AttributeFlags, Attributes,
};
pub use deadline::{Deadline, NoDeadline};
pub use error::{Error, UnlinkError};
pub use name::QueueName;
pub use notify::Notify;
pub use queue::{MessageQueue, OpenFlags, OpenOptions};

// Re-exported so callers can build open modes and notification signals
// without depending on nix directly.
pub use nix::sys::signal::Signal;
pub use nix::sys::stat::Mode;

/// The current version of the library.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
