//! # Stockroom
//!
//! Session and route-access core of the Stockroom inventory dashboard.
//!
//! The dashboard talks to a remote authentication API and keeps the
//! resulting session in durable client storage. This crate owns that
//! session and decides, for every navigation, whether to render the
//! requested page, show a loading indicator, or redirect.
//!
//! ## Architecture
//!
//! Leaves first:
//!
//! - **Session store** ([`session::SessionStore`]): mirrors token + user into
//!   a key/value backend and restores them at start-up
//! - **Logout signal** ([`session::LogoutSignal`]): broadcast observed by every
//!   controller instance sharing it
//! - **API client** ([`api_client::ApiClient`]): auth endpoints, bearer token
//!   on authenticated calls, session teardown on 401
//! - **Auth controller** ([`auth::AuthController`]): state machine over the
//!   client and the store; the only owner of the in-memory session
//! - **Route guards** ([`routes`]): pure gates over the controller's state,
//!   plus the route table and a navigator
//! - **Search** ([`search`]): ranked filtering over catalog records
//!
//! ## Example
//!
//! ```
//! use stockroom::auth::AuthState;
//! use stockroom::routes::{Navigator, Page, View};
//!
//! let mut nav = Navigator::new();
//! let resolved = nav.navigate("/products", &AuthState::default());
//!
//! // Anonymous visitors are sent to the login page, with the target saved.
//! assert!(matches!(resolved.view, View::Page { page: Page::Login, .. }));
//! assert_eq!(resolved.location.from.as_deref(), Some("/products"));
//! ```

/// HTTP client for the authentication API.
pub mod api_client;
pub use api_client::{ApiClient, DEFAULT_API_URL};

/// Authentication models, errors, validation and state controller.
pub mod auth;
pub use auth::{AuthController, AuthError, AuthResult, AuthState, AuthStatus};

/// Route table, guards and navigation.
pub mod routes;

/// Catalog search.
pub mod search;

/// Session persistence and the logout signal.
pub mod session;
