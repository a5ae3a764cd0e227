//! Route table for the dashboard and the guard that gates it on the session.

use std::fmt;

use serde::Serialize;

use crate::auth::Session;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub enum Route {
    Login,
    Dashboard,
    Contacts,
    Sales,
    Marketing,
    Support,
    Reports,
    Settings,
}

/// Sidebar entries, in display order
pub const NAVIGATION: [Route; 7] = [
    Route::Dashboard,
    Route::Contacts,
    Route::Sales,
    Route::Marketing,
    Route::Support,
    Route::Reports,
    Route::Settings,
];

impl Route {
    pub fn path(self) -> &'static str {
        match self {
            Route::Login => "/login",
            Route::Dashboard => "/",
            Route::Contacts => "/contacts",
            Route::Sales => "/sales",
            Route::Marketing => "/marketing",
            Route::Support => "/support",
            Route::Reports => "/reports",
            Route::Settings => "/settings",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Route::Login => "Login",
            Route::Dashboard => "Dashboard",
            Route::Contacts => "Contacts",
            Route::Sales => "Sales",
            Route::Marketing => "Marketing",
            Route::Support => "Support",
            Route::Reports => "Reports",
            Route::Settings => "Settings",
        }
    }

    /// Reachable without a session
    pub fn is_public(self) -> bool {
        matches!(self, Route::Login)
    }

    /// Resolve a location to a route.
    /// Query strings, fragments and a trailing slash are ignored; anything
    /// unknown falls back to the dashboard.
    pub fn from_path(path: &str) -> Self {
        let path = path
            .split(['?', '#'])
            .next()
            .unwrap_or("")
            .trim();
        let path = path.trim_end_matches('/');
        let path = if path.is_empty() { "/" } else { path };

        std::iter::once(Route::Login)
            .chain(NAVIGATION)
            .find(|route| route.path() == path)
            .unwrap_or(Route::Dashboard)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// What the router should do with a requested route
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteDecision {
    Render(Route),
    /// Send the user to `to`; `from` is where they were headed
    Redirect { to: Route, from: Route },
}

impl RouteDecision {
    /// The route that ends up on screen
    pub fn target(self) -> Route {
        match self {
            RouteDecision::Render(route) => route,
            RouteDecision::Redirect { to, .. } => to,
        }
    }

    pub fn is_redirect(self) -> bool {
        matches!(self, RouteDecision::Redirect { .. })
    }
}

/// Render protected routes only for an authenticated session; everything
/// else goes to the login view.
pub fn guard(session: &Session, route: Route) -> RouteDecision {
    if route.is_public() || session.is_authenticated() {
        RouteDecision::Render(route)
    } else {
        RouteDecision::Redirect {
            to: Route::Login,
            from: route,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::User;

    fn signed_in() -> Session {
        let user: User = serde_json::from_str(r#"{"id":1,"name":"A"}"#).expect("user JSON");
        Session::authenticated(user, "tok1".to_string())
    }

    #[test]
    fn test_from_path_exact_matches() {
        assert_eq!(Route::from_path("/"), Route::Dashboard);
        assert_eq!(Route::from_path("/login"), Route::Login);
        assert_eq!(Route::from_path("/contacts"), Route::Contacts);
        assert_eq!(Route::from_path("/settings"), Route::Settings);
    }

    #[test]
    fn test_from_path_normalizes() {
        assert_eq!(Route::from_path("/sales/"), Route::Sales);
        assert_eq!(Route::from_path("/reports?range=30d"), Route::Reports);
        assert_eq!(Route::from_path("/support#open"), Route::Support);
        assert_eq!(Route::from_path(""), Route::Dashboard);
    }

    #[test]
    fn test_from_path_unknown_falls_back_to_dashboard() {
        assert_eq!(Route::from_path("/nope"), Route::Dashboard);
        assert_eq!(Route::from_path("/contacts/42"), Route::Dashboard);
        assert_eq!(Route::from_path("/Contacts"), Route::Dashboard);
    }

    #[test]
    fn test_every_route_round_trips_through_its_path() {
        for route in std::iter::once(Route::Login).chain(NAVIGATION) {
            assert_eq!(Route::from_path(route.path()), route);
        }
    }

    #[test]
    fn test_guard_redirects_protected_routes_when_logged_out() {
        let session = Session::empty();
        for route in NAVIGATION {
            assert_eq!(
                guard(&session, route),
                RouteDecision::Redirect { to: Route::Login, from: route }
            );
        }
    }

    #[test]
    fn test_guard_token_without_profile_is_not_enough() {
        let session = Session::with_token("tok1".to_string());
        assert!(guard(&session, Route::Dashboard).is_redirect());
    }

    #[test]
    fn test_guard_renders_for_authenticated_session() {
        let session = signed_in();
        for route in NAVIGATION {
            assert_eq!(guard(&session, route), RouteDecision::Render(route));
        }
    }

    #[test]
    fn test_login_is_always_reachable() {
        assert_eq!(guard(&Session::empty(), Route::Login), RouteDecision::Render(Route::Login));
        assert_eq!(guard(&signed_in(), Route::Login), RouteDecision::Render(Route::Login));
    }

    #[test]
    fn test_navigation_order_and_labels() {
        let labels: Vec<&str> = NAVIGATION.iter().map(|r| r.label()).collect();
        assert_eq!(
            labels,
            ["Dashboard", "Contacts", "Sales", "Marketing", "Support", "Reports", "Settings"]
        );
        assert!(!NAVIGATION.contains(&Route::Login));
        assert_eq!(RouteDecision::Redirect { to: Route::Login, from: Route::Sales }.target(), Route::Login);
    }
}
