//! Deadline abstraction for blocking queue operations.
//!
//! A [`Deadline`] answers one question: is there an absolute point in time
//! after which the operation must fail instead of waiting? Keeping that
//! question separate from how the kernel expresses timeouts lets callers
//! pass timers, cancellation scopes, or the permanent [`NoDeadline`]
//! sentinel uniformly.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use nix::sys::time::TimeSpec;

use crate::error::Error;

/// A capability that may carry an absolute deadline.
pub trait Deadline {
    /// The absolute wall-clock time after which a blocking operation must
    /// fail, or `None` to wait indefinitely (subject to the queue's own
    /// blocking mode).
    fn deadline(&self) -> Option<SystemTime>;
}

/// Never carries a deadline; operations block until they can complete.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoDeadline;

impl Deadline for NoDeadline {
    fn deadline(&self) -> Option<SystemTime> {
        None
    }
}

/// An absolute deadline. [`UNIX_EPOCH`] is the unset value and behaves like
/// [`NoDeadline`].
impl Deadline for SystemTime {
    fn deadline(&self) -> Option<SystemTime> {
        Some(*self)
    }
}

impl Deadline for Option<SystemTime> {
    fn deadline(&self) -> Option<SystemTime> {
        *self
    }
}

/// A relative timeout, anchored to the wall clock when the operation starts.
impl Deadline for Duration {
    fn deadline(&self) -> Option<SystemTime> {
        Some(SystemTime::now() + *self)
    }
}

impl<T: Deadline + ?Sized> Deadline for &T {
    fn deadline(&self) -> Option<SystemTime> {
        (**self).deadline()
    }
}

/// Converts a deadline to the kernel's absolute-timeout representation.
///
/// `None` means no timeout: the call blocks according to the queue's
/// blocking flag. A deadline the kernel cannot represent is surfaced as
/// [`Error::InvalidDeadline`], never silently clamped.
pub(crate) fn to_timespec(dl: &(impl Deadline + ?Sized)) -> Result<Option<TimeSpec>, Error> {
    match dl.deadline() {
        Some(at) if at != UNIX_EPOCH => {
            let since_epoch = at
                .duration_since(UNIX_EPOCH)
                .map_err(|_| Error::InvalidDeadline)?;
            let secs = libc::time_t::try_from(since_epoch.as_secs())
                .map_err(|_| Error::InvalidDeadline)?;
            Ok(Some(TimeSpec::new(secs, since_epoch.subsec_nanos() as _)))
        }
        _ => Ok(None),
    }
}
