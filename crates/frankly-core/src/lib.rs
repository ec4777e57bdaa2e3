//! Client library for the Frankly chat platform.
//!
//! The crate is organised around a signed session:
//!
//! - [`auth`]: credentials, request signing, identity tokens and the
//!   [`SessionManager`](auth::SessionManager) that logs in lazily and renews
//!   expired or rejected tokens with a single shared attempt
//! - [`api`]: the [`Client`], its HTTP [`Transport`](api::Transport), typed
//!   resource operations and cursor pagination
//! - [`models`]: rooms, messages, users, announcements and files
//!
//! ```no_run
//! # async fn demo() -> frankly_core::Result<()> {
//! use frankly_core::{Client, ClientConfig, models::NewRoom};
//!
//! let client = Client::open(ClientConfig::new("https://app.franklychat.com", "key", "secret")).await?;
//! let room = client.rooms().create(&NewRoom::new("test")).await?;
//! client.rooms().delete(room.id).await?;
//! client.close();
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod models;

pub use api::{Client, Page, Pager, ResourceKind, ResourceRef};
pub use auth::{SessionData, SessionState};
pub use config::ClientConfig;
pub use error::{Error, Result};
