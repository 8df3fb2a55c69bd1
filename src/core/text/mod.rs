//! Text helpers (escape stripping, width table, wrapping, truncation).
//!
//! These helpers are pure (string in/string out) and live under `core` so the transcript
//! and render layers share one width table.

pub mod ansi;
pub mod width;
pub mod wrap;
