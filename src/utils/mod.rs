//! Utility modules for the static site generator.

pub mod category;
pub mod path;
