//! The dashboard's route table.

/// Screens the dashboard can show
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Page {
    Login,
    Register,
    ForgotPassword,
    ResetPassword,
    ChangePassword,
    Dashboard,
    Products,
    Categories,
    Transactions,
    Reports,
    Unauthorized,
    NotFound,
}

/// Who may see a route
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Anyone
    Public,
    /// Only visitors without a session
    PublicOnly,
    /// Only authenticated users holding one of `roles` (any user if empty)
    Protected { roles: &'static [&'static str] },
}

/// One entry in the route table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Route {
    /// Path pattern; `:name` segments capture a parameter
    pub pattern: &'static str,
    pub page: Page,
    pub access: Access,
}

const ANY_USER: Access = Access::Protected { roles: &[] };

/// Roles allowed to see reports
pub const REPORT_ROLES: &[&str] = &["admin", "manager"];

/// Every route, matched in order
#[rustfmt::skip]
pub const ROUTES: &[Route] = &[
    Route { pattern: "/login", page: Page::Login, access: Access::PublicOnly },
    Route { pattern: "/register", page: Page::Register, access: Access::PublicOnly },
    Route { pattern: "/forgot-password", page: Page::ForgotPassword, access: Access::PublicOnly },
    Route { pattern: "/reset-password", page: Page::ResetPassword, access: Access::PublicOnly },
    Route { pattern: "/reset-password/:token", page: Page::ResetPassword, access: Access::PublicOnly },
    Route { pattern: "/unauthorized", page: Page::Unauthorized, access: Access::Public },
    Route { pattern: "/", page: Page::Dashboard, access: ANY_USER },
    Route { pattern: "/dashboard", page: Page::Dashboard, access: ANY_USER },
    Route { pattern: "/change-password", page: Page::ChangePassword, access: ANY_USER },
    Route { pattern: "/products", page: Page::Products, access: ANY_USER },
    Route { pattern: "/products/:id", page: Page::Products, access: ANY_USER },
    Route { pattern: "/categories", page: Page::Categories, access: ANY_USER },
    Route { pattern: "/categories/:id", page: Page::Categories, access: ANY_USER },
    Route { pattern: "/transactions", page: Page::Transactions, access: ANY_USER },
    Route { pattern: "/transactions/:id", page: Page::Transactions, access: ANY_USER },
    Route { pattern: "/reports", page: Page::Reports, access: Access::Protected { roles: REPORT_ROLES } },
];

/// A route matched against a concrete path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch {
    pub route: &'static Route,
    pub params: Vec<(&'static str, String)>,
}

impl RouteMatch {
    /// Value captured by the `:name` segment
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// Drop any query/fragment and trailing slash, ensure a leading slash
pub fn normalize_path(path: &str) -> String {
    let path = path
        .split(['?', '#'])
        .next()
        .unwrap_or_default()
        .trim();
    let trimmed = path.trim_matches('/');
    format!("/{trimmed}")
}

/// Find the first route matching `path`
pub fn match_route(path: &str) -> Option<RouteMatch> {
    let path = normalize_path(path);
    ROUTES
        .iter()
        .find_map(|route| match_pattern(route.pattern, &path).map(|params| RouteMatch { route, params }))
}

fn match_pattern(pattern: &'static str, path: &str) -> Option<Vec<(&'static str, String)>> {
    let pattern_segments: Vec<&'static str> = pattern.split('/').filter(|s| !s.is_empty()).collect();
    let path_segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    if pattern_segments.len() != path_segments.len() {
        return None;
    }

    let mut params = Vec::new();
    for (&expected, &actual) in pattern_segments.iter().zip(path_segments.iter()) {
        if let Some(name) = expected.strip_prefix(':') {
            params.push((name, actual.to_string()));
        } else if expected != actual {
            return None;
        }
    }
    Some(params)
}
