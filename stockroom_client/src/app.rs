//! Console front end.
//!
//! [`ConsoleApp`] is the composition root: it owns the auth controller and
//! the navigator, runs form validation before any controller call, and
//! reacts to `Unauthorized` results by navigating to the login page.

use crate::commands::{Command, HELP};
use crate::config::ClientConfig;
use crate::logging::log_auth_event;
use anyhow::Context;
use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;
use stockroom::auth::{
    AuthController, AuthResult, ChangePasswordData, LoginCredentials, PasswordResetData,
    PasswordResetRequestData, RegistrationData, ValidationError, validation,
};
use stockroom::routes::{Navigator, Page, Resolved, View};
use stockroom::search::{SearchIndex, search};
use stockroom::session::{
    BroadcastLogoutSignal, FileStorage, LogoutSignal, MemoryStorage, SessionStore, Storage,
};
use stockroom::ApiClient;

const FORGOT_PASSWORD_PATH: &str = "/forgot-password";

/// Whether the console keeps reading commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Wire storage, signal and client together as `config` describes
///
/// # Errors
///
/// * `AuthError::Network` - The HTTP client could not be built
pub fn build_controller(config: &ClientConfig) -> AuthResult<AuthController> {
    let storage: Arc<dyn Storage> = match &config.session_dir {
        Some(dir) => Arc::new(FileStorage::new(dir.clone())),
        None => Arc::new(MemoryStorage::new()),
    };
    let store = SessionStore::new(storage);
    let signal: Arc<dyn LogoutSignal> = Arc::new(BroadcastLogoutSignal::default());

    let client = match config.http_timeout {
        Some(timeout) => ApiClient::with_timeout(&config.api_url, store, signal, timeout)?,
        None => ApiClient::new(&config.api_url, store, signal),
    };
    Ok(AuthController::new(client))
}

/// Read a JSON search index from disk
pub fn load_catalog(path: &Path) -> anyhow::Result<SearchIndex> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read catalog {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Invalid catalog {}", path.display()))
}

/// Line-oriented dashboard
pub struct ConsoleApp {
    auth: AuthController,
    navigator: Navigator,
    catalog: Option<SearchIndex>,
    /// Last resolution shown to the user
    shown: Resolved,
}

impl ConsoleApp {
    /// Create the app and resolve the start location
    pub fn new(auth: AuthController, catalog: Option<SearchIndex>) -> Self {
        let mut navigator = Navigator::new();
        let shown = navigator.refresh(&auth.state());
        Self {
            auth,
            navigator,
            catalog,
            shown,
        }
    }

    pub fn auth(&self) -> &AuthController {
        &self.auth
    }

    pub fn navigator(&self) -> &Navigator {
        &self.navigator
    }

    /// What is currently on screen
    pub fn view(&self) -> &View {
        &self.shown.view
    }

    /// Prompt showing who is logged in and where
    pub fn prompt(&self) -> String {
        let path = &self.navigator.current().path;
        match self.auth.state().user() {
            Some(user) => format!("{} {}> ", user.email, path),
            None => format!("{path}> "),
        }
    }

    /// Print the current location
    pub fn show_current(&self, out: &mut impl Write) -> io::Result<()> {
        print_resolved(&self.shown, out)
    }

    /// Run one command
    pub async fn execute(&mut self, command: Command, out: &mut impl Write) -> io::Result<Flow> {
        match command {
            Command::Login { email, password } => {
                if let Err(err) = validation::require("Email", &email)
                    .and_then(|()| validation::require("Password", &password))
                {
                    writeln!(out, "Error: {err}")?;
                    return Ok(Flow::Continue);
                }
                let result = self
                    .auth
                    .login(LoginCredentials { email, password })
                    .await;
                if result.is_err() {
                    let message = self.auth.state().error.unwrap_or_default();
                    log_auth_event("failed_login", None, &message);
                }
                self.report(result, "Logged in", out)?;
            }
            Command::Register {
                first_name,
                last_name,
                email,
                password,
                confirmation,
                department,
            } => {
                let checked = validation::require("First name", &first_name)
                    .and_then(|()| validation::require("Last name", &last_name))
                    .and_then(|()| validation::require("Email", &email))
                    .and_then(|()| validation::validate_new_password(&password, &confirmation));
                if let Err(err) = checked {
                    writeln!(out, "Error: {err}")?;
                    return Ok(Flow::Continue);
                }
                let result = self
                    .auth
                    .register(RegistrationData {
                        first_name,
                        last_name,
                        email,
                        password,
                        department,
                        roles: Vec::new(),
                    })
                    .await;
                self.report(result, "Account created", out)?;
            }
            Command::Logout => {
                self.auth.logout();
                writeln!(out, "Logged out")?;
            }
            Command::ForgotPassword { email } => {
                if let Err(err) = validation::require("Email", &email) {
                    writeln!(out, "Error: {err}")?;
                    return Ok(Flow::Continue);
                }
                let sent_to = format!("Password reset instructions sent to {email}");
                let result = self
                    .auth
                    .request_password_reset(PasswordResetRequestData { email })
                    .await;
                self.report(result, &sent_to, out)?;
            }
            Command::ResetPassword {
                email,
                token,
                password,
                confirmation,
            } => {
                let token = token.or_else(|| self.shown.view.param("token").map(str::to_string));
                let checked = validation::require("Email", &email).and_then(|()| {
                    validation::validate_password_reset(token.as_deref(), &password, &confirmation)
                });
                let token = match checked.and(token.ok_or(ValidationError::MissingResetToken)) {
                    Ok(token) => token,
                    Err(err) => {
                        writeln!(out, "Error: {err}")?;
                        return Ok(Flow::Continue);
                    }
                };
                let result = self
                    .auth
                    .reset_password(PasswordResetData {
                        email,
                        token,
                        new_password: password,
                    })
                    .await;
                let succeeded = result.is_ok();
                self.report(result, "Password reset. You can now log in.", out)?;
                if succeeded {
                    let resolved = self.navigator.navigate("/login", &self.auth.state());
                    self.show(resolved, out)?;
                }
            }
            Command::ChangePassword {
                current,
                new,
                confirmation,
            } => {
                if !self.auth.is_authenticated() {
                    writeln!(out, "Error: You need to log in first")?;
                    return Ok(Flow::Continue);
                }
                if let Err(err) = validation::validate_password_change(&current, &new, &confirmation)
                {
                    writeln!(out, "Error: {err}")?;
                    return Ok(Flow::Continue);
                }
                let result = self
                    .auth
                    .change_password(ChangePasswordData {
                        current_password: current,
                        new_password: new,
                    })
                    .await;
                self.report(result, "Password changed", out)?;
            }
            Command::Go { path } => {
                let resolved = self.navigator.navigate(&path, &self.auth.state());
                self.shown = resolved.clone();
                print_resolved(&resolved, out)?;
                self.leave_tokenless_reset(out)?;
            }
            Command::WhoAmI => match self.auth.state().user() {
                Some(user) => {
                    writeln!(out, "{} <{}>", user.full_name(), user.email)?;
                    let roles: Vec<&str> = user.role_names().collect();
                    if !roles.is_empty() {
                        writeln!(out, "Roles: {}", roles.join(", "))?;
                    }
                    if let Some(department) = &user.department {
                        writeln!(out, "Department: {}", department.name)?;
                    }
                }
                None => writeln!(out, "Not logged in")?,
            },
            Command::Status => {
                let state = self.auth.state();
                writeln!(out, "Status: {:?}", state.status())?;
                writeln!(out, "Location: {}", self.navigator.current().path)?;
                if let Some(error) = &state.error {
                    writeln!(out, "Error: {error}")?;
                }
            }
            Command::Search { query } => self.search(&query, out)?,
            Command::ClearError => {
                self.auth.clear_error();
                writeln!(out, "Error cleared")?;
            }
            Command::Help => write!(out, "{HELP}")?,
            Command::Quit => return Ok(Flow::Quit),
        }

        self.sync(out)?;
        Ok(Flow::Continue)
    }

    fn search(&self, query: &str, out: &mut impl Write) -> io::Result<()> {
        if !self.auth.is_authenticated() {
            return writeln!(out, "Error: You need to log in first");
        }
        let Some(catalog) = &self.catalog else {
            return writeln!(out, "No catalog loaded (use --catalog or STOCKROOM_CATALOG)");
        };

        let results = search(query, catalog);
        if results.is_empty() {
            return writeln!(out, "No results for '{}'", query.trim());
        }
        for result in results {
            writeln!(
                out,
                "[{}] {} - {} ({})",
                result.kind, result.title, result.description, result.url
            )?;
        }
        Ok(())
    }

    /// Print the outcome of a controller call, routing a 401 to the login page
    fn report(
        &mut self,
        result: AuthResult<()>,
        success: &str,
        out: &mut impl Write,
    ) -> io::Result<()> {
        let err = match result {
            Ok(()) => return writeln!(out, "{success}"),
            Err(err) => err,
        };

        let state = self.auth.state();
        let message = state.error.clone().unwrap_or_else(|| err.to_string());

        if err.is_unauthorized() {
            log_auth_event("forced_logout", None, &message);
            if let Some(resolved) = self.navigator.handle_error(&err, &state) {
                self.show(resolved, out)?;
            }
        }
        writeln!(out, "Error: {message}")
    }

    /// Re-run the guards for the current location, e.g. after login or logout
    fn sync(&mut self, out: &mut impl Write) -> io::Result<()> {
        let resolved = self.navigator.refresh(&self.auth.state());
        self.show(resolved, out)
    }

    /// Print `resolved` if it differs from what is on screen
    fn show(&mut self, resolved: Resolved, out: &mut impl Write) -> io::Result<()> {
        if resolved == self.shown {
            return Ok(());
        }
        print_resolved(&resolved, out)?;
        self.shown = resolved;
        self.leave_tokenless_reset(out)
    }

    /// A reset page reached without a token cannot be used; go request a new link
    fn leave_tokenless_reset(&mut self, out: &mut impl Write) -> io::Result<()> {
        let tokenless_reset = matches!(
            self.shown.view,
            View::Page { page: Page::ResetPassword, .. }
        ) && self.shown.view.param("token").is_none();
        if !tokenless_reset {
            return Ok(());
        }

        writeln!(out, "Error: {}", ValidationError::MissingResetToken)?;
        let resolved = self
            .navigator
            .navigate(FORGOT_PASSWORD_PATH, &self.auth.state());
        print_resolved(&resolved, out)?;
        self.shown = resolved;
        Ok(())
    }
}

fn print_resolved(resolved: &Resolved, out: &mut impl Write) -> io::Result<()> {
    match &resolved.view {
        View::Loading => writeln!(out, "{}: loading...", resolved.location.path),
        View::Page { page, .. } => writeln!(out, "-> {} [{page:?}]", resolved.location.path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offline_app() -> ConsoleApp {
        let config = ClientConfig {
            // Nothing listens on port 9
            api_url: "http://127.0.0.1:9/api".to_string(),
            session_dir: None,
            http_timeout: None,
            catalog: None,
        };
        ConsoleApp::new(build_controller(&config).unwrap(), None)
    }

    fn run_output(bytes: Vec<u8>) -> String {
        String::from_utf8(bytes).unwrap()
    }

    #[tokio::test]
    async fn test_starts_on_login_page() {
        let app = offline_app();
        assert_eq!(app.navigator().current().path, "/login");
        assert_eq!(app.prompt(), "/login> ");
    }

    #[tokio::test]
    async fn test_validation_runs_before_controller() {
        let mut app = offline_app();
        let mut out = Vec::new();

        let flow = app
            .execute(
                Command::Register {
                    first_name: "Ada".to_string(),
                    last_name: "Lovelace".to_string(),
                    email: "ada@example.com".to_string(),
                    password: "Secur3#Password".to_string(),
                    confirmation: "different".to_string(),
                    department: None,
                },
                &mut out,
            )
            .await
            .unwrap();

        assert_eq!(flow, Flow::Continue);
        assert!(run_output(out).contains("Passwords don't match"));
        // Controller never saw the request
        assert!(app.auth().state().error.is_none());
    }

    #[tokio::test]
    async fn test_tokenless_reset_link_goes_to_forgot_password() {
        let mut app = offline_app();
        let mut out = Vec::new();

        app.execute(
            Command::Go {
                path: "/reset-password".to_string(),
            },
            &mut out,
        )
        .await
        .unwrap();

        let output = run_output(out);
        assert!(output.contains("Invalid or expired password reset link"));
        assert_eq!(app.navigator().current().path, "/forgot-password");
    }

    #[tokio::test]
    async fn test_reset_uses_token_from_link() {
        let mut app = offline_app();
        let mut out = Vec::new();
        app.execute(
            Command::Go {
                path: "/reset-password/abc".to_string(),
            },
            &mut out,
        )
        .await
        .unwrap();
        assert_eq!(app.view().param("token"), Some("abc"));

        // Weak password is rejected locally, so the token was accepted
        let mut out = Vec::new();
        app.execute(
            Command::ResetPassword {
                email: "ada@example.com".to_string(),
                token: None,
                password: "weak".to_string(),
                confirmation: "weak".to_string(),
            },
            &mut out,
        )
        .await
        .unwrap();
        assert!(run_output(out).contains("at least 8 characters"));
    }

    #[tokio::test]
    async fn test_search_requires_login() {
        let mut app = offline_app();
        let mut out = Vec::new();
        app.execute(
            Command::Search {
                query: "drill".to_string(),
            },
            &mut out,
        )
        .await
        .unwrap();
        assert!(run_output(out).contains("log in first"));
    }

    #[tokio::test]
    async fn test_quit() {
        let mut app = offline_app();
        let mut out = Vec::new();
        let flow = app.execute(Command::Quit, &mut out).await.unwrap();
        assert_eq!(flow, Flow::Quit);
    }

    #[test]
    fn test_load_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.json");
        std::fs::write(&path, r#"{"products": [{"id": "p1", "name": "Drill"}]}"#).unwrap();

        let catalog = load_catalog(&path).unwrap();
        assert_eq!(catalog.products.len(), 1);

        std::fs::write(&path, "nope").unwrap();
        let err = load_catalog(&path).unwrap_err();
        assert!(err.to_string().contains("Invalid catalog"));
    }
}
