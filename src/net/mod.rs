//! Requests, responses and the network seam.

pub mod classify;
pub mod client;
#[cfg(test)]
pub mod testing;
pub mod types;

pub use classify::{classify, is_interceptable, Category};
pub use client::{Fetch, HttpClient};
pub use types::{Destination, Request, Response};
