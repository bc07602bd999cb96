//! Resource lowering: one module per resource kind.
//!
//! Each kind has an item type validated on construction and a collection
//! that enforces uniqueness and renders manifest-ready output.

pub mod device;
pub mod mount;
pub mod volume;
