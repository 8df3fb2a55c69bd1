//! Per-session transcript: event accumulation and row flattening.

pub mod accumulator;
pub mod flatten;
pub mod message;

pub use accumulator::{MalformedEvent, MessageAccumulator};
pub use flatten::{flatten_messages, ConversationLine};
pub use message::{ConversationMessage, MessageKind};
