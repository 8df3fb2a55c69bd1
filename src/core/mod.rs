//! Shared primitives.

pub mod text;
