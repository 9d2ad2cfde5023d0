//! Auth state controller: the single owner of the in-memory session.
//!
//! The controller combines the [`ApiClient`] and the [`SessionStore`] behind
//! one state record. Every state change that touches the session is mirrored
//! to the store inside the same update, so memory and storage never disagree
//! outside a single atomic update.
//!
//! Login and registration are ordered by a request sequence: each one, and
//! each logout, advances the sequence, and a response is applied only if no
//! newer login, registration or logout was issued while it was in flight.

use super::{
    errors::{AuthError, AuthResult},
    models::{
        AuthResponse, ChangePasswordData, LoginCredentials, PasswordResetData,
        PasswordResetRequestData, RegistrationData, User,
    },
};
use crate::api_client::ApiClient;
use crate::session::{LogoutEvent, LogoutReason, LogoutSignal, Session, SessionStore};
use std::{
    future::Future,
    sync::{
        Arc, Weak,
        atomic::{AtomicU64, Ordering},
    },
};
use tokio::sync::{
    broadcast::{self, error::RecvError},
    watch,
};

const LOGIN_FAILED: &str = "Failed to login. Please try again.";
const REGISTER_FAILED: &str = "Failed to register. Please try again.";
const RESET_REQUEST_FAILED: &str = "Failed to request password reset. Please try again.";
const RESET_FAILED: &str = "Failed to reset password. Please try again.";
const CHANGE_FAILED: &str = "Failed to change password. Please try again.";

/// Coarse authentication status derived from [`AuthState`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStatus {
    Anonymous,
    Authenticating,
    Authenticated,
    Error,
}

/// Snapshot of the authentication state
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthState {
    /// Token and user, present together or not at all
    pub session: Option<Session>,
    /// An auth operation is in flight
    pub is_loading: bool,
    /// Message from the last failed operation
    pub error: Option<String>,
}

impl AuthState {
    /// True iff both token and user are present
    pub fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }

    /// Logged-in user
    pub fn user(&self) -> Option<&User> {
        self.session.as_ref().map(|session| &session.user)
    }

    /// Bearer token of the current session
    pub fn token(&self) -> Option<&str> {
        self.session.as_ref().map(|session| session.token.as_str())
    }

    /// Current status
    pub fn status(&self) -> AuthStatus {
        if self.is_loading {
            AuthStatus::Authenticating
        } else if self.error.is_some() {
            AuthStatus::Error
        } else if self.session.is_some() {
            AuthStatus::Authenticated
        } else {
            AuthStatus::Anonymous
        }
    }
}

/// Handle to the auth state controller.
///
/// Cheap to clone; clones share state. Build one per application instance
/// and pass it to whatever needs it.
#[derive(Clone)]
pub struct AuthController {
    inner: Arc<Inner>,
}

struct Inner {
    client: ApiClient,
    store: SessionStore,
    logout: Arc<dyn LogoutSignal>,
    state: watch::Sender<AuthState>,
    /// Advanced by every login, registration and logout
    sequence: AtomicU64,
    /// Highest logout event already reflected in `state`
    handled_logout: AtomicU64,
}

impl AuthController {
    /// Create a controller, restoring any persisted session.
    ///
    /// The store and logout signal are the ones the client was built with.
    /// A listener task is spawned that resets the session whenever another
    /// instance raises a logout; it stops when the last handle is dropped.
    /// A 401 seen by the client resets the session before the failing call
    /// returns, whoever made it.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn new(client: ApiClient) -> Self {
        let store = client.store().clone();
        let logout = client.logout_signal().clone();

        let restored = store.load();
        if let Some(session) = &restored {
            log::info!("Restored session for user {}", session.user.id);
        }

        let (state, _) = watch::channel(AuthState {
            session: restored,
            ..AuthState::default()
        });

        let receiver = logout.subscribe();
        let inner = Arc::new(Inner {
            client,
            store,
            handled_logout: AtomicU64::new(logout.last_seq()),
            logout,
            state,
            sequence: AtomicU64::new(0),
        });

        let hook_target = Arc::downgrade(&inner);
        inner.client.on_unauthorized(move |event| {
            let Some(inner) = hook_target.upgrade() else {
                return false;
            };
            inner.apply_logout(event);
            true
        });

        let state_changes = inner.state.subscribe();
        tokio::spawn(listen_for_logout(
            Arc::downgrade(&inner),
            receiver,
            state_changes,
        ));

        Self { inner }
    }

    /// Current state snapshot
    pub fn state(&self) -> AuthState {
        self.inner.state.borrow().clone()
    }

    /// Watch state changes
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.inner.state.subscribe()
    }

    /// Whether a session is present
    pub fn is_authenticated(&self) -> bool {
        self.inner.state.borrow().is_authenticated()
    }

    /// API client used by this controller
    pub fn client(&self) -> &ApiClient {
        &self.inner.client
    }

    /// Log in, replacing any existing session.
    ///
    /// # Errors
    ///
    /// The API error is recorded in the state and also returned.
    /// `AuthError::Superseded` is returned when a newer login, registration
    /// or logout overtook this one; the state is left to the newer operation.
    pub async fn login(&self, credentials: LoginCredentials) -> AuthResult<()> {
        let ticket = self.inner.begin_authentication();
        let result = self.inner.client.login(&credentials).await;
        self.inner.finish_authentication(ticket, result, LOGIN_FAILED)
    }

    /// Register a new account and log in as it.
    ///
    /// # Errors
    ///
    /// Same contract as [`AuthController::login`].
    pub async fn register(&self, data: RegistrationData) -> AuthResult<()> {
        let ticket = self.inner.begin_authentication();
        let result = self.inner.client.register(&data).await;
        self.inner.finish_authentication(ticket, result, REGISTER_FAILED)
    }

    /// Drop the session and tell every other instance to do the same.
    ///
    /// Never fails; calling it while already logged out is harmless.
    pub fn logout(&self) {
        self.inner.sequence.fetch_add(1, Ordering::SeqCst);
        self.inner.commit(|state| {
            if *state == AuthState::default() {
                return false;
            }
            *state = AuthState::default();
            true
        });
        self.inner.client.logout();

        let seq = self.inner.logout.publish(LogoutReason::UserRequested);
        self.inner.handled_logout.fetch_max(seq, Ordering::SeqCst);
        log::info!("Logged out");
    }

    /// Ask for password reset instructions
    ///
    /// # Errors
    ///
    /// The API error is recorded in the state and also returned.
    pub async fn request_password_reset(&self, data: PasswordResetRequestData) -> AuthResult<()> {
        self.inner
            .track(
                RESET_REQUEST_FAILED,
                self.inner.client.request_password_reset(&data),
            )
            .await
    }

    /// Complete a password reset
    ///
    /// # Errors
    ///
    /// The API error is recorded in the state and also returned.
    pub async fn reset_password(&self, data: PasswordResetData) -> AuthResult<()> {
        self.inner
            .track(RESET_FAILED, self.inner.client.reset_password(&data))
            .await
    }

    /// Change the logged-in user's password
    ///
    /// # Errors
    ///
    /// The API error is recorded in the state and also returned.
    pub async fn change_password(&self, data: ChangePasswordData) -> AuthResult<()> {
        self.inner
            .track(CHANGE_FAILED, self.inner.client.change_password(&data))
            .await
    }

    /// Forget the last error; nothing else changes
    pub fn clear_error(&self) {
        self.inner.commit(|state| state.error.take().is_some());
    }
}

impl Inner {
    /// Apply `update` atomically and mirror any session change to the store.
    ///
    /// `update` returns whether it changed anything; watchers are only
    /// notified when it did.
    fn commit(&self, update: impl FnOnce(&mut AuthState) -> bool) -> bool {
        let store = &self.store;
        self.state.send_if_modified(|state| {
            let before = state.session.clone();
            let modified = update(state);
            if state.session != before {
                match &state.session {
                    Some(session) => store.save(&session.token, &session.user),
                    None => store.clear(),
                }
            }
            modified
        })
    }

    fn is_current(&self, ticket: u64) -> bool {
        self.sequence.load(Ordering::SeqCst) == ticket
    }

    fn begin_authentication(&self) -> u64 {
        // Logouts published before this point are older than the request:
        // apply them here so their late broadcast cannot supersede it.
        let published = self.logout.last_seq();
        let already_handled = self.handled_logout.fetch_max(published, Ordering::SeqCst);
        let ticket = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        self.commit(|state| {
            if published > already_handled {
                state.session = None;
            }
            state.is_loading = true;
            state.error = None;
            true
        });
        ticket
    }

    fn finish_authentication(
        &self,
        ticket: u64,
        result: AuthResult<AuthResponse>,
        fallback: &str,
    ) -> AuthResult<()> {
        match result {
            Ok(AuthResponse { user, token }) => {
                let user_id = user.id;
                let mut pending = Some(Session { token, user });
                self.commit(|state| {
                    if !self.is_current(ticket) {
                        return false;
                    }
                    *state = AuthState {
                        session: pending.take(),
                        is_loading: false,
                        error: None,
                    };
                    true
                });

                if pending.is_some() {
                    log::debug!("Discarding superseded authentication for user {user_id}");
                    return Err(AuthError::Superseded);
                }
                log::info!("Authenticated as user {user_id}");
                Ok(())
            }
            Err(err) => {
                let message = err
                    .client_message()
                    .unwrap_or_else(|| fallback.to_string());
                if err.is_unauthorized() {
                    self.end_session_after_unauthorized(message);
                } else {
                    self.commit(|state| {
                        if !self.is_current(ticket) {
                            return false;
                        }
                        state.is_loading = false;
                        state.error = Some(message);
                        true
                    });
                }
                Err(err)
            }
        }
    }

    /// Run a request that does not touch the session, tracking loading and error
    async fn track<T>(
        &self,
        fallback: &str,
        request: impl Future<Output = AuthResult<T>>,
    ) -> AuthResult<()> {
        self.commit(|state| {
            state.is_loading = true;
            state.error = None;
            true
        });

        match request.await {
            Ok(_) => {
                self.commit(|state| std::mem::replace(&mut state.is_loading, false));
                Ok(())
            }
            Err(err) => {
                let message = err
                    .client_message()
                    .unwrap_or_else(|| fallback.to_string());
                if err.is_unauthorized() {
                    self.end_session_after_unauthorized(message);
                } else {
                    self.commit(|state| {
                        state.is_loading = false;
                        state.error = Some(message);
                        true
                    });
                }
                Err(err)
            }
        }
    }

    /// Record the 401 message on an anonymous state.
    ///
    /// The client has already cleared the store, raised the logout and run
    /// the unauthorized hook; this only settles what the caller sees.
    fn end_session_after_unauthorized(&self, message: String) {
        self.sequence.fetch_add(1, Ordering::SeqCst);
        self.handled_logout
            .fetch_max(self.logout.last_seq(), Ordering::SeqCst);
        self.commit(|state| {
            *state = AuthState {
                session: None,
                is_loading: false,
                error: Some(message),
            };
            true
        });
    }

    /// Reset to anonymous in response to a logout raised elsewhere
    fn apply_logout(&self, event: LogoutEvent) {
        let already_handled = self.handled_logout.fetch_max(event.seq, Ordering::SeqCst);
        if event.seq <= already_handled {
            return;
        }

        self.sequence.fetch_add(1, Ordering::SeqCst);
        let changed = self.commit(|state| {
            if *state == AuthState::default() {
                return false;
            }
            *state = AuthState::default();
            true
        });
        if changed {
            log::info!("Session ended by logout #{} ({:?})", event.seq, event.reason);
        }
    }
}

async fn listen_for_logout(
    inner: Weak<Inner>,
    mut events: broadcast::Receiver<LogoutEvent>,
    mut state_changes: watch::Receiver<AuthState>,
) {
    loop {
        tokio::select! {
            event = events.recv() => {
                let Some(inner) = inner.upgrade() else { break };
                match event {
                    Ok(event) => inner.apply_logout(event),
                    Err(RecvError::Lagged(missed)) => {
                        log::warn!("Missed {missed} logout events, ending session");
                        inner.apply_logout(LogoutEvent {
                            seq: inner.logout.last_seq(),
                            reason: LogoutReason::UserRequested,
                        });
                    }
                    Err(RecvError::Closed) => break,
                }
            }
            changed = state_changes.changed() => {
                // Sender lives in `Inner`; an error means the controller is gone.
                if changed.is_err() {
                    break;
                }
            }
        }
    }
}
