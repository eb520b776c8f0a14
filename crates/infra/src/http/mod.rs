//! HTTP transport shared by the prober and the request dispatcher

pub mod client;

pub use client::{error_for_status, HttpClient, HttpClientBuilder};
