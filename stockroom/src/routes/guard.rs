//! Route guards.
//!
//! Both guards are pure functions of the auth state and the requested
//! location. They decide what to show; they never change the session.

use crate::auth::AuthState;

/// Login surface
pub const LOGIN_PATH: &str = "/login";

/// Where an authenticated visitor lands when nothing else was requested
pub const DEFAULT_LANDING_PATH: &str = "/dashboard";

/// Shown when the user lacks every required role
pub const UNAUTHORIZED_PATH: &str = "/unauthorized";

/// A navigable location plus the location a guard saved for later resume
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub path: String,
    pub from: Option<String>,
}

impl Location {
    /// Location with no saved origin
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            from: None,
        }
    }

    /// Location remembering where the visitor was headed
    pub fn with_from(path: impl Into<String>, from: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            from: Some(from.into()),
        }
    }
}

/// What a guard decided
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardOutcome {
    /// Auth is in flight; show a loading indicator
    RenderLoading,
    /// Go somewhere else instead
    Redirect(Location),
    /// Render the guarded content
    RenderChildren,
}

/// Gate for authenticated-only routes.
///
/// Anonymous visitors go to the login surface with the requested path saved
/// so it can be resumed. When `required_roles` is non-empty the user must
/// hold at least one of them, otherwise they go to the unauthorized surface.
pub fn require_auth<S: AsRef<str>>(
    state: &AuthState,
    location: &Location,
    required_roles: &[S],
) -> GuardOutcome {
    if state.is_loading {
        return GuardOutcome::RenderLoading;
    }

    let Some(user) = state.user() else {
        return GuardOutcome::Redirect(Location::with_from(LOGIN_PATH, location.path.clone()));
    };

    if !user.has_any_role(required_roles) {
        return GuardOutcome::Redirect(Location::new(UNAUTHORIZED_PATH));
    }

    GuardOutcome::RenderChildren
}

/// Gate for public-only routes such as login and registration.
///
/// Authenticated visitors are sent to the location saved by
/// [`require_auth`], or to [`DEFAULT_LANDING_PATH`] when none was saved.
pub fn public_only(state: &AuthState, location: &Location) -> GuardOutcome {
    if state.is_loading {
        return GuardOutcome::RenderLoading;
    }

    if state.is_authenticated() {
        let target = location
            .from
            .as_deref()
            .filter(|from| *from != location.path)
            .unwrap_or(DEFAULT_LANDING_PATH);
        return GuardOutcome::Redirect(Location::new(target));
    }

    GuardOutcome::RenderChildren
}
