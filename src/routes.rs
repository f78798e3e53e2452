//! Route authorization
//!
//! Pure functions of the session state: nothing here blocks or performs I/O,
//! so the guard can run on every navigation and on every session change.

use std::fmt;

use crate::auth::SessionState;

/// Application routes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Login,
    Register,
    Dashboard,
    WorkoutPlan,
    MealPlan,
    /// Trainer home
    Admin,
    NotFound,
}

/// What a route needs from the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    /// Sign-in and registration pages; signed-in users are sent home
    Public,
    RequiresAuth,
    RequiresAdmin,
}

/// Outcome of a guard check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    RedirectTo(Route),
}

impl Route {
    pub fn from_path(path: &str) -> Self {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let path = match path.trim_end_matches('/') {
            "" => "/",
            trimmed => trimmed,
        };
        match path {
            "/login" => Self::Login,
            "/register" => Self::Register,
            "/" | "/dashboard" => Self::Dashboard,
            "/workout-plan" => Self::WorkoutPlan,
            "/meal-plan" => Self::MealPlan,
            "/admin" => Self::Admin,
            _ => Self::NotFound,
        }
    }

    pub fn to_path(&self) -> &'static str {
        match self {
            Self::Login => "/login",
            Self::Register => "/register",
            Self::Dashboard => "/dashboard",
            Self::WorkoutPlan => "/workout-plan",
            Self::MealPlan => "/meal-plan",
            Self::Admin => "/admin",
            Self::NotFound => "/404",
        }
    }

    pub fn requirement(&self) -> Requirement {
        match self {
            Self::Login | Self::Register => Requirement::Public,
            Self::Admin => Requirement::RequiresAdmin,
            Self::Dashboard | Self::WorkoutPlan | Self::MealPlan | Self::NotFound => {
                Requirement::RequiresAuth
            }
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_path())
    }
}

/// Landing route for a signed-in user
pub fn home_for(is_admin: bool) -> Route {
    if is_admin {
        Route::Admin
    } else {
        Route::Dashboard
    }
}

/// Decide whether the session may enter a route with `requirement`.
///
/// A session that is still authenticating counts as anonymous.
pub fn can_enter(requirement: Requirement, state: &SessionState) -> Decision {
    let profile = state.profile();
    match (requirement, profile) {
        (Requirement::Public, None) => Decision::Allow,
        (Requirement::Public, Some(p)) => Decision::RedirectTo(home_for(p.is_admin)),
        (Requirement::RequiresAuth, None) | (Requirement::RequiresAdmin, None) => {
            Decision::RedirectTo(Route::Login)
        }
        (Requirement::RequiresAuth, Some(_)) => Decision::Allow,
        (Requirement::RequiresAdmin, Some(p)) if p.is_admin => Decision::Allow,
        (Requirement::RequiresAdmin, Some(p)) => Decision::RedirectTo(home_for(p.is_admin)),
    }
}

/// Where navigation to `route` actually ends up
pub fn resolve(route: Route, state: &SessionState) -> Route {
    match can_enter(route.requirement(), state) {
        Decision::Allow => route,
        Decision::RedirectTo(target) => target,
    }
}

/// Tracks the current route and re-applies the guard when asked
#[derive(Debug, Clone)]
pub struct Navigator {
    current: Route,
}

impl Navigator {
    pub fn new(initial_path: &str, state: &SessionState) -> Self {
        Self {
            current: resolve(Route::from_path(initial_path), state),
        }
    }

    pub fn current(&self) -> Route {
        self.current
    }

    /// Navigate to `path`, returning the route actually entered
    pub fn navigate(&mut self, path: &str, state: &SessionState) -> Route {
        let target = Route::from_path(path);
        self.current = resolve(target, state);
        if self.current != target {
            tracing::debug!(from = %target, to = %self.current, "navigation redirected");
        }
        self.current
    }

    /// Re-check the current route after a session change. Returns the new
    /// route if the user has to be moved.
    pub fn on_session_change(&mut self, state: &SessionState) -> Option<Route> {
        let next = resolve(self.current, state);
        if next == self.current {
            return None;
        }
        self.current = next;
        Some(next)
    }
}
