//! composeforge: lower app resource descriptors into compose manifests.
//!
//! Device pass-through and volume declarations are validated against safety
//! and uniqueness rules, then rendered into the list and map forms a
//! compose-style manifest expects.

pub mod cli;
pub mod core;
pub mod resources;
