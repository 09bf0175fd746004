//! Domain models for watched mail

mod message;

pub use message::{Message, MessageId};
