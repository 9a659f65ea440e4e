//! Shared routing types and the outbound trait seams used by both
//! transport loops.

pub mod outbound;
pub mod types;

pub use {
    outbound::{BrokerPublish, ChatOutbound},
    types::{ClassifiedPayload, MediaKind},
};
