//! Transport layer for the Speckle client.

pub mod http;

pub use http::HttpTransport;
