//! MQTT side of the bridge: payload classification, the subscribe/forward
//! listener loop, and the publish wrapper used by the chat loop.

pub mod classify;
pub mod listener;
pub mod publisher;

pub use {
    classify::classify,
    listener::{BrokerListener, connect},
    publisher::MqttPublisher,
};
