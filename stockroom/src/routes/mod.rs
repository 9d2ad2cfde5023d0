//! Route access control.
//!
//! - [`guard`]: authenticated-only and public-only gates
//! - [`table`]: the dashboard's routes and their access rules
//! - [`navigator`]: resolves navigations through the guards

pub mod guard;
pub mod navigator;
pub mod table;

pub use guard::{
    DEFAULT_LANDING_PATH, GuardOutcome, LOGIN_PATH, Location, UNAUTHORIZED_PATH, public_only,
    require_auth,
};
pub use navigator::{Navigator, Resolved, View};
pub use table::{Access, Page, Route, RouteMatch, match_route};
