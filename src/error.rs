use core::fmt;

/// The error returned when a key lookup finds no matching element.
///
/// Only direct lookups ([`RbTree::search`](crate::RbTree::search) and the adapters' `get`) report
/// it. Membership tests and erasure answer with a `bool` instead.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct NotFound;

impl fmt::Display for NotFound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("element not found")
    }
}

impl core::error::Error for NotFound {}
