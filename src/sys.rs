//! Errno tables and the syscall gateway.
//!
//! Every queue operation is declared once as a [`Syscall`]: its trap number,
//! its fixed arity, and the errno vocabulary its failures translate through.
//! The gateway is the single place raw kernel results become typed errors.

use nix::errno::Errno;

use crate::error::Error;

/// Duplicate-free mapping from errno values to one operation's typed errors.
pub(crate) struct ErrnoTable {
    entries: Vec<(Errno, Error)>,
}

impl ErrnoTable {
    /// Builds the table for one operation from its error kinds.
    ///
    /// Panics when two kinds report the same errno or a kind reports none.
    /// Tables are declared statically per operation, so a panic here is a
    /// programming error surfaced the first time the operation is used, not
    /// a runtime data error.
    pub(crate) fn new(kinds: &[Error]) -> Self {
        let mut entries: Vec<(Errno, Error)> = Vec::with_capacity(kinds.len());
        for &kind in kinds {
            let errno = match kind.errno() {
                Some(errno) => errno,
                None => panic!("error kind {kind:?} has no errno"),
            };
            if entries.iter().any(|&(registered, _)| registered == errno) {
                panic!("duplicate errno {errno} in table");
            }
            entries.push((errno, kind));
        }
        Self { entries }
    }

    /// Translates a raw result code into the operation's error vocabulary.
    ///
    /// Zero is the success sentinel. Registered codes map to their typed
    /// kind; any other code passes through as [`Error::Raw`].
    pub(crate) fn lookup(&self, code: i32) -> Result<(), Error> {
        if code == 0 {
            return Ok(());
        }
        let errno = Errno::from_raw(code);
        match self.entries.iter().find(|&&(registered, _)| registered == errno) {
            Some(&(_, kind)) => Err(kind),
            None => Err(Error::Raw(errno)),
        }
    }
}

/// A declared kernel operation.
pub(crate) struct Syscall {
    trap: libc::c_long,
    params: usize,
    errs: ErrnoTable,
}

impl Syscall {
    pub(crate) fn new(trap: libc::c_long, params: usize, kinds: &[Error]) -> Self {
        Self {
            trap,
            params,
            errs: ErrnoTable::new(kinds),
        }
    }

    /// Invokes the syscall, discarding its result word.
    pub(crate) fn call(&self, args: &[usize]) -> Result<(), Error> {
        self.call_value(args).map(|_| ())
    }

    /// Invokes the syscall and returns its result word.
    ///
    /// An argument count that does not match the declared arity fails fast
    /// with [`Error::ArgumentCount`] without touching the kernel. Absent
    /// trailing arguments are padded with zero to the calling convention's
    /// width: three words for short calls, six otherwise.
    pub(crate) fn call_value(&self, args: &[usize]) -> Result<isize, Error> {
        if args.len() != self.params {
            return Err(Error::ArgumentCount {
                got: args.len(),
                expected: self.params,
            });
        }
        let ret = if self.params <= 3 {
            let a = exactly::<3>(args);
            unsafe { libc::syscall(self.trap, a[0], a[1], a[2]) }
        } else {
            let a = exactly::<6>(args);
            unsafe { libc::syscall(self.trap, a[0], a[1], a[2], a[3], a[4], a[5]) }
        };
        let code = if ret == -1 { Errno::last_raw() } else { 0 };
        self.errs.lookup(code)?;
        Ok(ret as isize)
    }
}

/// Zero-pads `args` to exactly `N` words.
fn exactly<const N: usize>(args: &[usize]) -> [libc::c_long; N] {
    let mut out = [0 as libc::c_long; N];
    for (slot, &arg) in out.iter_mut().zip(args) {
        *slot = arg as libc::c_long;
    }
    out
}
