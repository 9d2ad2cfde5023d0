//! Resolves navigation requests through the route table and guards.

use super::{
    guard::{self, GuardOutcome, LOGIN_PATH, Location},
    table::{self, Access, Page},
};
use crate::auth::{AuthError, AuthState};

/// Upper bound on redirects followed for one navigation
pub const MAX_REDIRECTS: usize = 8;

/// What to show for the current location
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum View {
    /// Auth is in flight
    Loading,
    /// Render `page`, with any captured path parameters
    Page {
        page: Page,
        params: Vec<(&'static str, String)>,
    },
}

impl View {
    fn page(page: Page) -> Self {
        View::Page {
            page,
            params: Vec::new(),
        }
    }

    /// Value captured by a `:name` segment of the matched route
    pub fn param(&self, name: &str) -> Option<&str> {
        match self {
            View::Page { params, .. } => params
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| value.as_str()),
            View::Loading => None,
        }
    }
}

/// Outcome of a navigation: where we ended up and what to show there
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    pub location: Location,
    pub view: View,
}

/// Tracks the current location and history, consulting the guards on every move
#[derive(Debug, Clone)]
pub struct Navigator {
    current: Location,
    history: Vec<Location>,
}

impl Default for Navigator {
    fn default() -> Self {
        Self::new()
    }
}

impl Navigator {
    /// Start at the root
    pub fn new() -> Self {
        Self {
            current: Location::new("/"),
            history: Vec::new(),
        }
    }

    /// Current location
    pub fn current(&self) -> &Location {
        &self.current
    }

    /// Go to `path`
    pub fn navigate(&mut self, path: &str, state: &AuthState) -> Resolved {
        self.go(Location::new(table::normalize_path(path)), state)
    }

    /// Re-run the guards for the current location, e.g. after login
    pub fn refresh(&mut self, state: &AuthState) -> Resolved {
        let resolved = resolve(self.current.clone(), state);
        self.current = resolved.location.clone();
        resolved
    }

    /// Return to the previous location, or the root when there is none
    pub fn back(&mut self, state: &AuthState) -> Resolved {
        let previous = self.history.pop().unwrap_or_else(|| Location::new("/"));
        let resolved = resolve(previous, state);
        self.current = resolved.location.clone();
        resolved
    }

    /// React to an API failure.
    ///
    /// A 401 means the session is gone: move to the login surface,
    /// remembering where we were. Other errors leave navigation alone.
    pub fn handle_error(&mut self, err: &AuthError, state: &AuthState) -> Option<Resolved> {
        if !err.is_unauthorized() {
            return None;
        }
        // Already on the login surface: keep its saved origin
        let target = if self.current.path == LOGIN_PATH {
            self.current.clone()
        } else {
            Location::with_from(LOGIN_PATH, self.current.path.clone())
        };
        Some(self.go(target, state))
    }

    fn go(&mut self, target: Location, state: &AuthState) -> Resolved {
        let resolved = resolve(target, state);
        if resolved.location != self.current {
            let previous = std::mem::replace(&mut self.current, resolved.location.clone());
            self.history.push(previous);
        }
        resolved
    }
}

/// Follow guards and redirects from `location` until something renders
pub fn resolve(mut location: Location, state: &AuthState) -> Resolved {
    for _ in 0..=MAX_REDIRECTS {
        let Some(matched) = table::match_route(&location.path) else {
            return Resolved {
                location,
                view: View::page(Page::NotFound),
            };
        };

        let outcome = match matched.route.access {
            Access::Public => GuardOutcome::RenderChildren,
            Access::PublicOnly => guard::public_only(state, &location),
            Access::Protected { roles } => guard::require_auth(state, &location, roles),
        };

        match outcome {
            GuardOutcome::RenderLoading => {
                return Resolved {
                    location,
                    view: View::Loading,
                };
            }
            GuardOutcome::Redirect(next) => {
                log::debug!("{} redirected to {}", location.path, next.path);
                location = next;
            }
            GuardOutcome::RenderChildren => {
                return Resolved {
                    location,
                    view: View::Page {
                        page: matched.route.page,
                        params: matched.params,
                    },
                };
            }
        }
    }

    log::warn!("Too many redirects resolving {}", location.path);
    Resolved {
        location,
        view: View::page(Page::NotFound),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{Role, User};
    use crate::session::Session;
    use chrono::Utc;

    fn signed_in(roles: &[&str]) -> AuthState {
        let user = User {
            id: 9,
            first_name: "Lin".to_string(),
            last_name: "Chen".to_string(),
            email: "lin@example.com".to_string(),
            roles: roles
                .iter()
                .map(|name| Role {
                    id: 1,
                    name: name.to_string(),
                    description: None,
                })
                .collect(),
            department: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        AuthState {
            session: Some(Session {
                token: "tok".to_string(),
                user,
            }),
            ..AuthState::default()
        }
    }

    fn page_of(resolved: &Resolved) -> Option<Page> {
        match &resolved.view {
            View::Page { page, .. } => Some(*page),
            View::Loading => None,
        }
    }

    #[test]
    fn test_anonymous_protected_lands_on_login_with_from() {
        let mut nav = Navigator::new();
        let resolved = nav.navigate("/products", &AuthState::default());

        assert_eq!(page_of(&resolved), Some(Page::Login));
        assert_eq!(resolved.location, Location::with_from("/login", "/products"));
        assert_eq!(nav.current(), &resolved.location);
    }

    #[test]
    fn test_refresh_after_login_resumes_saved_location() {
        let mut nav = Navigator::new();
        nav.navigate("/products", &AuthState::default());

        let resolved = nav.refresh(&signed_in(&[]));
        assert_eq!(page_of(&resolved), Some(Page::Products));
        assert_eq!(resolved.location, Location::new("/products"));
    }

    #[test]
    fn test_login_page_when_signed_in_goes_to_dashboard() {
        let mut nav = Navigator::new();
        let resolved = nav.navigate("/login", &signed_in(&[]));
        assert_eq!(page_of(&resolved), Some(Page::Dashboard));
        assert_eq!(resolved.location.path, "/dashboard");
    }

    #[test]
    fn test_role_gated_route() {
        let mut nav = Navigator::new();
        let resolved = nav.navigate("/reports", &signed_in(&["clerk"]));
        assert_eq!(page_of(&resolved), Some(Page::Unauthorized));

        let resolved = nav.navigate("/reports", &signed_in(&["manager"]));
        assert_eq!(page_of(&resolved), Some(Page::Reports));
    }

    #[test]
    fn test_loading_state() {
        let mut nav = Navigator::new();
        let loading = AuthState {
            is_loading: true,
            ..AuthState::default()
        };
        let resolved = nav.navigate("/products", &loading);
        assert_eq!(resolved.view, View::Loading);
        assert_eq!(resolved.location.path, "/products");
    }

    #[test]
    fn test_unknown_path_is_not_found() {
        let mut nav = Navigator::new();
        let resolved = nav.navigate("/does-not-exist", &signed_in(&[]));
        assert_eq!(page_of(&resolved), Some(Page::NotFound));
    }

    #[test]
    fn test_params_reach_the_view() {
        let mut nav = Navigator::new();
        let resolved = nav.navigate("/reset-password/tok-42", &AuthState::default());
        assert_eq!(page_of(&resolved), Some(Page::ResetPassword));
        assert_eq!(resolved.view.param("token"), Some("tok-42"));
    }

    #[test]
    fn test_unauthorized_error_navigates_to_login() {
        let mut nav = Navigator::new();
        nav.navigate("/categories", &signed_in(&[]));

        let err = AuthError::Unauthorized {
            message: "expired".to_string(),
        };
        let resolved = nav.handle_error(&err, &AuthState::default()).unwrap();
        assert_eq!(page_of(&resolved), Some(Page::Login));
        assert_eq!(resolved.location.from.as_deref(), Some("/categories"));
    }

    #[test]
    fn test_unauthorized_on_login_keeps_saved_origin() {
        let mut nav = Navigator::new();
        let anonymous = AuthState::default();
        nav.navigate("/products", &anonymous);
        assert_eq!(nav.current().path, LOGIN_PATH);
        assert_eq!(nav.current().from.as_deref(), Some("/products"));

        let err = AuthError::Unauthorized {
            message: "expired".to_string(),
        };
        let resolved = nav.handle_error(&err, &anonymous).unwrap();
        assert_eq!(page_of(&resolved), Some(Page::Login));
        assert_eq!(resolved.location.from.as_deref(), Some("/products"));
        assert_eq!(nav.current().from.as_deref(), Some("/products"));
    }

    #[test]
    fn test_other_errors_leave_navigation_alone() {
        let mut nav = Navigator::new();
        nav.navigate("/categories", &signed_in(&[]));
        let err = AuthError::Api {
            status: 500,
            message: "boom".to_string(),
        };
        assert!(nav.handle_error(&err, &signed_in(&[])).is_none());
        assert_eq!(nav.current().path, "/categories");
    }

    #[test]
    fn test_back() {
        let mut nav = Navigator::new();
        let state = signed_in(&[]);
        nav.navigate("/products", &state);
        nav.navigate("/categories", &state);

        let resolved = nav.back(&state);
        assert_eq!(page_of(&resolved), Some(Page::Products));
    }
}
