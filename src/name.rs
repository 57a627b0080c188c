//! Queue name validation.

use std::ffi::{CStr, CString};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// A validated POSIX queue name.
///
/// Queue names are path-like tokens: non-empty, exactly one leading `/`, and
/// no further `/` anywhere. Validity is checked once here, before any
/// descriptor is opened; everything downstream assumes it holds. The kernel
/// is handed the name without its leading separator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueName {
    full: String,
    kernel: CString,
}

impl QueueName {
    /// Validates `name`, failing with the specific kind for each rule:
    /// [`Error::NameEmpty`] for an empty string, [`Error::NameMissingSlash`]
    /// when the leading separator is absent, [`Error::NameOnlySlash`] when
    /// nothing follows it, and [`Error::NameMultipleSlash`] for any further
    /// separator. Interior NUL bytes are [`Error::NameInvalid`].
    pub fn new(name: &str) -> Result<Self, Error> {
        if name.is_empty() {
            return Err(Error::NameEmpty);
        }
        let stripped = name.strip_prefix('/').ok_or(Error::NameMissingSlash)?;
        if stripped.is_empty() {
            return Err(Error::NameOnlySlash);
        }
        if stripped.contains('/') {
            return Err(Error::NameMultipleSlash);
        }
        let kernel = CString::new(stripped).map_err(|_| Error::NameInvalid)?;
        Ok(Self {
            full: name.to_owned(),
            kernel,
        })
    }

    /// The name as supplied, leading separator included.
    pub fn as_str(&self) -> &str {
        &self.full
    }

    /// The form passed to the kernel, leading separator stripped.
    pub(crate) fn as_kernel(&self) -> &CStr {
        &self.kernel
    }
}

impl fmt::Display for QueueName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full)
    }
}

impl FromStr for QueueName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<&str> for QueueName {
    type Error = Error;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}
