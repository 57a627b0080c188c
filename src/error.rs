//! Typed errors for every queue operation.
//!
//! Each operation declares which subset of these kinds it can produce (see
//! the per-operation tables in [`crate::raw`]); anything the kernel reports
//! outside that vocabulary passes through as [`Error::Raw`] so unanticipated
//! behavior is never silently misclassified.

use std::fmt;

use nix::errno::Errno;
use thiserror::Error;

/// A failure from a queue operation.
///
/// Most kinds carry the errno the kernel reports for them, reachable through
/// [`Error::errno`]. Kinds produced by local validation (a malformed name, a
/// wrong argument count) are returned before any syscall happens and report
/// no errno.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum Error {
    // Name validation. Checked before any descriptor is opened; the kernel's
    // own rejection would be indistinguishable from other causes.
    #[error("queue name must not be empty")]
    NameEmpty,
    #[error("queue name must start with '/'")]
    NameMissingSlash,
    #[error("queue name was just '/' followed by no other characters")]
    NameOnlySlash,
    #[error("queue name contained more than one slash")]
    NameMultipleSlash,
    #[error("queue name was too long")]
    NameTooLong,
    #[error("queue name doesn't follow the correct format")]
    NameInvalid,

    /// The descriptor does not refer to an open message queue.
    #[error("the message queue descriptor specified is invalid")]
    BadDescriptor,
    #[error("insufficient memory")]
    NoMemory,

    // Open.
    #[error("the queue exists, but the caller does not have permission to open it in the specified mode")]
    OpenPermissionDenied,
    #[error("both the create and exclusive flags were set, but a queue with this name already exists")]
    AlreadyExists,
    #[error("the create flag was set and the supplied maximum queue depth or message size was invalid")]
    InvalidAttributes,
    #[error("the per-process limit on the number of open file and message queue descriptors has been reached")]
    ProcessLimitReached,
    #[error("the system-wide limit on the total number of open files and message queues has been reached")]
    SystemLimitReached,
    #[error("the create flag was not set and no queue with this name exists")]
    NoSuchQueue,
    #[error("insufficient space for the creation of a new message queue")]
    NoSpace,

    // Send and receive.
    #[error("the call timed out before a message could be transferred")]
    TimedOut,
    #[error("the call was interrupted by a signal handler")]
    Interrupted,
    #[error("the call would have blocked and the deadline was invalid")]
    InvalidDeadline,
    #[error("the queue was full and the non-blocking flag was set for the message queue")]
    QueueFull,
    #[error("the queue was empty and the non-blocking flag was set for the message queue")]
    QueueEmpty,
    #[error("the descriptor was invalid or not opened for writing")]
    NotOpenForWriting,
    #[error("the descriptor was invalid or not opened for reading")]
    NotOpenForReading,
    #[error("the message was longer than the queue's maximum message size")]
    MessageTooLong,
    #[error("the receive buffer was smaller than the queue's maximum message size")]
    BufferTooSmall,

    // Attributes.
    #[error("the new attribute flags contained set bits other than the non-blocking flag")]
    InvalidAttributeFlags,
    /// The kernel reported a non-positive maximum message size, so no receive
    /// buffer can be sized for the queue.
    #[error("the queue reported a non-positive maximum message size")]
    InvalidMessageSize,

    // Notify.
    #[error("another process has already registered to receive notification for this message queue")]
    NotifyBusy,
    #[error("the notification mode or signal number was not valid")]
    NotifyInvalid,

    // Unlink.
    #[error("the caller does not have permission to unlink this message queue")]
    UnlinkPermissionDenied,
    #[error("there is no message queue with the given name")]
    UnlinkNoSuchQueue,

    /// The argument list handed to a declared syscall had the wrong length.
    /// Returned before the kernel is touched.
    #[error("got {got} syscall arguments, expected {expected}")]
    ArgumentCount { got: usize, expected: usize },
    /// An mqueue setting under `/proc/sys/fs/mqueue` could not be read or
    /// parsed.
    #[error("failed to read mqueue setting {file} ({errno})")]
    Config { file: &'static str, errno: Errno },

    /// An errno outside the operation's declared vocabulary.
    #[error("{0}")]
    Raw(Errno),
}

impl Error {
    /// The underlying kernel error code, if this kind carries one.
    ///
    /// Local validation kinds ([`Error::ArgumentCount`],
    /// [`Error::InvalidMessageSize`]) report `None`.
    pub fn errno(&self) -> Option<Errno> {
        Some(match self {
            Self::NameEmpty | Self::NameMissingSlash | Self::NameInvalid => Errno::EINVAL,
            Self::NameOnlySlash => Errno::ENOENT,
            Self::NameMultipleSlash => Errno::EACCES,
            Self::NameTooLong => Errno::ENAMETOOLONG,
            Self::BadDescriptor => Errno::EBADF,
            Self::NoMemory => Errno::ENOMEM,
            Self::OpenPermissionDenied => Errno::EACCES,
            Self::AlreadyExists => Errno::EEXIST,
            Self::InvalidAttributes => Errno::EINVAL,
            Self::ProcessLimitReached => Errno::EMFILE,
            Self::SystemLimitReached => Errno::ENFILE,
            Self::NoSuchQueue => Errno::ENOENT,
            Self::NoSpace => Errno::ENOSPC,
            Self::TimedOut => Errno::ETIMEDOUT,
            Self::Interrupted => Errno::EINTR,
            Self::InvalidDeadline => Errno::EINVAL,
            Self::QueueFull | Self::QueueEmpty => Errno::EAGAIN,
            Self::NotOpenForWriting | Self::NotOpenForReading => Errno::EBADF,
            Self::MessageTooLong | Self::BufferTooSmall => Errno::EMSGSIZE,
            Self::InvalidAttributeFlags => Errno::EINVAL,
            Self::NotifyBusy => Errno::EBUSY,
            Self::NotifyInvalid => Errno::EINVAL,
            Self::UnlinkPermissionDenied => Errno::EACCES,
            Self::UnlinkNoSuchQueue => Errno::ENOENT,
            Self::Config { errno, .. } => *errno,
            Self::Raw(errno) => *errno,
            Self::ArgumentCount { .. } | Self::InvalidMessageSize => return None,
        })
    }

    /// Whether retrying the operation could plausibly succeed.
    ///
    /// Derived from the errno's own semantics: a full queue, an interrupting
    /// signal, or an expired deadline can all clear on their own; a malformed
    /// name never will.
    pub fn is_temporary(&self) -> bool {
        matches!(
            self.errno(),
            Some(
                Errno::EAGAIN
                    | Errno::EINTR
                    | Errno::ETIMEDOUT
                    | Errno::ECONNRESET
                    | Errno::ECONNABORTED
            )
        )
    }

    /// Whether the failure expresses an elapsed wait.
    pub fn is_timeout(&self) -> bool {
        matches!(self.errno(), Some(Errno::EAGAIN | Errno::ETIMEDOUT))
    }
}

/// Combined failure from [`MessageQueue::unlink`].
///
/// Unlink is a close followed by namespace removal; either step can fail and
/// both failures are reported, never one swallowing the other.
///
/// [`MessageQueue::unlink`]: crate::MessageQueue::unlink
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnlinkError {
    close: Option<Error>,
    removal: Option<Error>,
}

impl UnlinkError {
    /// `None` when neither step failed.
    pub(crate) fn new(close: Option<Error>, removal: Option<Error>) -> Option<Self> {
        if close.is_none() && removal.is_none() {
            None
        } else {
            Some(Self { close, removal })
        }
    }

    /// The failure from the close step, if any.
    pub fn close_error(&self) -> Option<Error> {
        self.close
    }

    /// The failure from the namespace-removal step, if any.
    pub fn removal_error(&self) -> Option<Error> {
        self.removal
    }
}

impl fmt::Display for UnlinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.close, &self.removal) {
            (Some(close), Some(removal)) => {
                write!(f, "close failed: {close}; unlink failed: {removal}")
            }
            (Some(close), None) => write!(f, "close failed: {close}"),
            (None, Some(removal)) => write!(f, "unlink failed: {removal}"),
            // Unreachable: construction requires at least one failure.
            (None, None) => f.write_str("unlink failed"),
        }
    }
}

impl std::error::Error for UnlinkError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.removal
            .as_ref()
            .or(self.close.as_ref())
            .map(|err| err as _)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_report_their_errno() {
        assert_eq!(Error::BadDescriptor.errno(), Some(Errno::EBADF));
        assert_eq!(Error::QueueFull.errno(), Some(Errno::EAGAIN));
        assert_eq!(Error::QueueEmpty.errno(), Some(Errno::EAGAIN));
        assert_eq!(Error::MessageTooLong.errno(), Some(Errno::EMSGSIZE));
        assert_eq!(Error::NotifyBusy.errno(), Some(Errno::EBUSY));
        assert_eq!(Error::NameMultipleSlash.errno(), Some(Errno::EACCES));
        assert_eq!(Error::Raw(Errno::EIO).errno(), Some(Errno::EIO));
    }

    #[test]
    fn local_kinds_report_no_errno() {
        assert_eq!(
            Error::ArgumentCount {
                got: 2,
                expected: 5
            }
            .errno(),
            None
        );
        assert_eq!(Error::InvalidMessageSize.errno(), None);
    }

    #[test]
    fn classification_follows_errno_semantics() {
        assert!(Error::TimedOut.is_timeout());
        assert!(Error::TimedOut.is_temporary());
        assert!(Error::QueueFull.is_timeout());
        assert!(Error::QueueFull.is_temporary());
        assert!(Error::Interrupted.is_temporary());
        assert!(!Error::Interrupted.is_timeout());
        assert!(!Error::NameEmpty.is_temporary());
        assert!(!Error::BadDescriptor.is_temporary());
    }

    #[test]
    fn unlink_error_reports_both_failures() {
        let err = UnlinkError::new(
            Some(Error::BadDescriptor),
            Some(Error::UnlinkNoSuchQueue),
        )
        .unwrap();
        let rendered = err.to_string();
        assert!(rendered.contains("close failed"));
        assert!(rendered.contains("unlink failed"));
        assert_eq!(err.close_error(), Some(Error::BadDescriptor));
        assert_eq!(err.removal_error(), Some(Error::UnlinkNoSuchQueue));
    }

    #[test]
    fn unlink_error_requires_a_failure() {
        assert!(UnlinkError::new(None, None).is_none());
        let err = UnlinkError::new(None, Some(Error::UnlinkNoSuchQueue)).unwrap();
        assert!(err.close_error().is_none());
    }
}
