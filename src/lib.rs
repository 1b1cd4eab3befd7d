//! Session-aware client for the LMS REST API.
//!
//! One [`ApiClient`] owns the access/refresh token pair, attaches it to every
//! call, refreshes it once on an auth challenge, and persists it through a
//! [`usecase::contracts::TokenStore`].

pub mod config;
pub mod domain;
pub mod repository;
pub mod telemetry;
pub mod usecase;

pub use config::ClientConfig;
pub use usecase::client::ApiClient;
pub use usecase::error::{ClientError, UserAction};
pub use usecase::feed::BlogFeed;
