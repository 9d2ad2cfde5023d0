//! Client-side authentication: models, errors, validation and the state controller.
//!
//! This module provides:
//! - The identity record and request/response payloads of the auth API
//! - [`AuthController`], the owner of the in-memory session
//! - Form validation run before any request is sent
//!
//! ## Example
//!
//! ```no_run
//! use stockroom::api_client::ApiClient;
//! use stockroom::auth::{AuthController, LoginCredentials};
//! use stockroom::session::{BroadcastLogoutSignal, FileStorage, SessionStore};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = SessionStore::new(Arc::new(FileStorage::new(".stockroom")));
//!     let signal = Arc::new(BroadcastLogoutSignal::default());
//!     let client = ApiClient::new("http://localhost:3000/api", store, signal);
//!     let auth = AuthController::new(client);
//!
//!     auth.login(LoginCredentials {
//!         email: "ada@example.com".to_string(),
//!         password: "Secur3#Password".to_string(),
//!     })
//!     .await?;
//!
//!     if let Some(user) = auth.state().user() {
//!         println!("Logged in as {}", user.full_name());
//!     }
//!     Ok(())
//! }
//! ```

pub mod controller;
pub mod errors;
pub mod models;
pub mod validation;

pub use controller::{AuthController, AuthState, AuthStatus};
pub use errors::{AuthError, AuthResult};
pub use models::{
    AuthResponse, ChangePasswordData, Department, LoginCredentials, MessageResponse,
    PasswordResetData, PasswordResetRequestData, RegistrationData, Role, User, UserId,
};
pub use validation::ValidationError;
