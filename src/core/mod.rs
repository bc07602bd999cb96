//! Core lowering logic: types, validation, parsing, the render pass.

pub mod error;
pub mod parser;
pub mod render;
pub mod types;
pub mod validation;
