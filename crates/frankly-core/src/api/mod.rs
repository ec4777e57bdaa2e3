//! REST API client module for the Frankly platform.
//!
//! This module provides the `Client` for signed, session-authenticated
//! access to rooms, messages, users and announcements, file uploads, the
//! `Transport` it sends requests through, and cursor-based pagination for
//! list endpoints.

pub mod client;
pub mod files;
pub mod pagination;
pub mod resources;
pub mod transport;

pub use client::Client;
pub use files::{Files, Upload};
pub use pagination::{Page, Pager};
pub use resources::{Resource, ResourceKind, ResourceRef, Resources};
pub use transport::{RequestEnvelope, RetryPolicy, Transport};
