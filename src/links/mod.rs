//! Link generation
//!
//! The engine only sees the [`LinkGenerator`](crate::core::LinkGenerator)
//! trait; this module provides the URL-based implementation the server uses.

pub mod generator;

pub use generator::UrlLinkGenerator;
