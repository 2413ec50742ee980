//! Transport layer for the Bexio SDK.

pub mod http;

pub use http::{Download, HttpTransport};
