//! Releaser types.

mod claim;
pub use claim::*;

mod dropper;
pub use dropper::*;
