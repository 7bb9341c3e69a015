//! Typed wrappers for the Soil2Spoon REST endpoints.
//!
//! Each submodule adds methods to [`ApiClient`](crate::gateway::ApiClient)
//! for one area of the backend. All of them go through
//! [`ApiClient::request`](crate::gateway::ApiClient::request), so reads are
//! deduplicated and the bearer token is attached automatically.

mod addresses;
mod admin;
mod auth;
mod cart;
mod content;
mod orders;
mod products;

/// Percent-encode a single path segment.
fn segment(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}
