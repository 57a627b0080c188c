//! Queue notification subscriptions.

use nix::sys::signal::Signal;

/// A notification subscription: have the kernel tell this process when a
/// message arrives on a previously empty queue.
///
/// The kernel admits at most one subscriber per queue at a time; a second
/// registration fails with [`Error::NotifyBusy`].
///
/// [`Error::NotifyBusy`]: crate::Error::NotifyBusy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notify {
    /// Register without signal delivery, reserving the subscription slot.
    None,
    /// Deliver the given signal.
    Signal(Signal),
}

impl Notify {
    /// The ABI-exact event record for the notify call.
    pub(crate) fn to_sigevent(self) -> libc::sigevent {
        // sigevent carries a union and padding the kernel ignores for these
        // modes; start zeroed and set only the fields it reads.
        let mut sev: libc::sigevent = unsafe { std::mem::zeroed() };
        match self {
            Notify::None => sev.sigev_notify = libc::SIGEV_NONE,
            Notify::Signal(signal) => {
                sev.sigev_notify = libc::SIGEV_SIGNAL;
                sev.sigev_signo = signal as libc::c_int;
            }
        }
        sev
    }
}
