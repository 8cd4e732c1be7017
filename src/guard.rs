//! Route gating on session presence

use crate::auth::SessionStore;

/// Views of the client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Dashboard,
    Login,
    Register,
}

impl Route {
    /// Whether the view requires a session
    pub fn is_protected(self) -> bool {
        matches!(self, Route::Dashboard)
    }

    pub fn path(self) -> &'static str {
        match self {
            Route::Dashboard => "/",
            Route::Login => "/login",
            Route::Register => "/register",
        }
    }

    pub fn from_path(path: &str) -> Option<Route> {
        match path.trim_end_matches('/') {
            "" => Some(Route::Dashboard),
            "/login" => Some(Route::Login),
            "/register" => Some(Route::Register),
            _ => None,
        }
    }
}

/// Outcome of a navigation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    Render(Route),
    Redirect(Route),
}

/// Decide what to show for `requested`.
///
/// Only looks at whether a session is present, never whether its token is
/// still accepted; that is found out by the next API call.
pub fn guard(store: &SessionStore, requested: Route) -> Navigation {
    if requested.is_protected() && !store.is_authenticated() {
        Navigation::Redirect(Route::Login)
    } else {
        Navigation::Render(requested)
    }
}
