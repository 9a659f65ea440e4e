//! Remote media retrieval for broker → chat forwarding.

pub mod error;
pub mod fetch;

pub use {
    error::{Error, Result},
    fetch::{FETCH_TIMEOUT, Fetch, HttpFetcher},
};
