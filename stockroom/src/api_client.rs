//! HTTP client for the dashboard's authentication API.
//!
//! Calls made after a token exists carry `Authorization: Bearer <token>`.
//! A 401 response tears the local session down (store cleared, logout
//! broadcast, unauthorized hooks run) and comes back as
//! [`AuthError::Unauthorized`]; navigating to the login surface is left to
//! whoever owns navigation. The request is never reissued.

use crate::auth::{
    AuthError, AuthResponse, AuthResult, ChangePasswordData, LoginCredentials, MessageResponse,
    PasswordResetData, PasswordResetRequestData, RegistrationData, models::ApiErrorBody,
};
use crate::session::{LogoutEvent, LogoutReason, LogoutSignal, SessionStore};
use reqwest::{Method, Response, StatusCode};
use serde::{Serialize, de::DeserializeOwned};
use std::{
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};

/// Base URL used when none is configured
pub const DEFAULT_API_URL: &str = "http://localhost:3000/api";

/// Whether a request carries the stored bearer token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Credentials {
    /// Token-establishing calls go out without one
    None,
    /// Attach the token when one is stored
    Bearer,
}

/// Called with the logout a 401 raised; returning `false` unregisters it
type UnauthorizedHook = Box<dyn Fn(LogoutEvent) -> bool + Send + Sync>;

/// API client for the remote authentication service
#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    client: reqwest::Client,
    store: SessionStore,
    logout: Arc<dyn LogoutSignal>,
    unauthorized_hooks: Arc<Mutex<Vec<UnauthorizedHook>>>,
}

impl ApiClient {
    /// Create a new API client
    ///
    /// # Arguments
    ///
    /// * `base_url` - API root, e.g. `http://localhost:3000/api`
    /// * `store` - Session store the bearer token is read from
    /// * `logout` - Signal raised when a 401 tears the session down
    pub fn new(
        base_url: impl Into<String>,
        store: SessionStore,
        logout: Arc<dyn LogoutSignal>,
    ) -> Self {
        Self::with_http_client(base_url, store, logout, reqwest::Client::new())
    }

    /// Create a client whose requests give up after `timeout`
    ///
    /// # Errors
    ///
    /// * `AuthError::Network` - The HTTP client could not be built
    pub fn with_timeout(
        base_url: impl Into<String>,
        store: SessionStore,
        logout: Arc<dyn LogoutSignal>,
        timeout: Duration,
    ) -> AuthResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(AuthError::Network)?;
        Ok(Self::with_http_client(base_url, store, logout, client))
    }

    fn with_http_client(
        base_url: impl Into<String>,
        store: SessionStore,
        logout: Arc<dyn LogoutSignal>,
        client: reqwest::Client,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            client,
            store,
            logout,
            unauthorized_hooks: Arc::default(),
        }
    }

    /// API root every path is joined onto
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Session store backing the bearer token
    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Signal raised when a 401 tears the session down
    pub fn logout_signal(&self) -> &Arc<dyn LogoutSignal> {
        &self.logout
    }

    /// Register `hook` to run whenever a 401 ends the session.
    ///
    /// Hooks run synchronously, after the store is cleared and the logout is
    /// published but before the error reaches the caller. Clones of this
    /// client share hooks. A hook that returns `false` is dropped.
    pub fn on_unauthorized(&self, hook: impl Fn(LogoutEvent) -> bool + Send + Sync + 'static) {
        self.hooks().push(Box::new(hook));
    }

    fn hooks(&self) -> MutexGuard<'_, Vec<UnauthorizedHook>> {
        self.unauthorized_hooks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Log in with email and password
    pub async fn login(&self, credentials: &LoginCredentials) -> AuthResult<AuthResponse> {
        self.send(
            Method::POST,
            "/auth/login",
            Some(credentials),
            Credentials::None,
        )
        .await
    }

    /// Register a new account
    pub async fn register(&self, data: &RegistrationData) -> AuthResult<AuthResponse> {
        self.send(Method::POST, "/auth/register", Some(data), Credentials::None)
            .await
    }

    /// Forget the local session. No request is made.
    pub fn logout(&self) {
        self.store.clear();
    }

    /// Ask for password reset instructions to be emailed
    pub async fn request_password_reset(
        &self,
        data: &PasswordResetRequestData,
    ) -> AuthResult<MessageResponse> {
        self.send(
            Method::POST,
            "/auth/request-password-reset",
            Some(data),
            Credentials::None,
        )
        .await
    }

    /// Complete a password reset with the emailed token
    pub async fn reset_password(&self, data: &PasswordResetData) -> AuthResult<MessageResponse> {
        self.send(
            Method::POST,
            "/auth/reset-password",
            Some(data),
            Credentials::None,
        )
        .await
    }

    /// Change the password of the logged-in user
    pub async fn change_password(&self, data: &ChangePasswordData) -> AuthResult<MessageResponse> {
        self.send(
            Method::POST,
            "/auth/change-password",
            Some(data),
            Credentials::Bearer,
        )
        .await
    }

    /// Authenticated GET returning JSON
    pub async fn get_json<R: DeserializeOwned>(&self, path: &str) -> AuthResult<R> {
        self.send(Method::GET, path, None::<&()>, Credentials::Bearer)
            .await
    }

    /// Authenticated POST with a JSON body, returning JSON
    pub async fn post_json<B, R>(&self, path: &str, body: &B) -> AuthResult<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        self.send(Method::POST, path, Some(body), Credentials::Bearer)
            .await
    }

    async fn send<B, R>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        credentials: Credentials,
    ) -> AuthResult<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);

        let mut request = self.client.request(method.clone(), &url);
        if credentials == Credentials::Bearer {
            if let Some(token) = self.store.token() {
                request = request.bearer_auth(token);
            }
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        log::debug!("{method} {path}");
        let response = request.send().await.map_err(AuthError::Network)?;
        self.handle_response(path, response).await
    }

    async fn handle_response<R: DeserializeOwned>(
        &self,
        path: &str,
        response: Response,
    ) -> AuthResult<R> {
        let status = response.status();

        if status.is_success() {
            let bytes = response.bytes().await.map_err(AuthError::Network)?;
            return serde_json::from_slice(&bytes)
                .map_err(|err| AuthError::InvalidResponse(err.to_string()));
        }

        let message = error_message(status, response).await;

        if status == StatusCode::UNAUTHORIZED {
            log::warn!("{path} rejected with 401, ending local session");
            self.store.clear();
            let seq = self.logout.publish(LogoutReason::Unauthorized);
            let event = LogoutEvent {
                seq,
                reason: LogoutReason::Unauthorized,
            };
            self.hooks().retain(|hook| hook(event));
            return Err(AuthError::Unauthorized { message });
        }

        log::debug!("{path} failed with {status}: {message}");
        Err(AuthError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

/// Message from a JSON `{message}` error body, else the status reason phrase
async fn error_message(status: StatusCode, response: Response) -> String {
    let fallback = || {
        status
            .canonical_reason()
            .unwrap_or("Request failed")
            .to_string()
    };

    match response.text().await {
        Ok(text) => serde_json::from_str::<ApiErrorBody>(&text)
            .ok()
            .and_then(|body| body.message)
            .filter(|message| !message.trim().is_empty())
            .unwrap_or_else(fallback),
        Err(_) => fallback(),
    }
}
