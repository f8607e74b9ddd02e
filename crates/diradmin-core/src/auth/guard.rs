//! Routes and the access guard in front of them.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;
use tokio::sync::watch;

use super::session::{SessionState, SessionStatus};

/// Pages under the protected `/admin` subtree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminPage {
    Dashboard,
    Users,
    CreateUser,
    Businesses,
    CreateBusiness,
    Events,
    CreateEvent,
    EventDetail(i64),
    Settings,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Public entry point, `/`
    Login,
    Admin(AdminPage),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown route: {0}")]
pub struct RouteError(pub String);

impl Route {
    /// Where a successful login lands
    pub fn admin_home() -> Self {
        Route::Admin(AdminPage::Dashboard)
    }

    pub fn is_protected(&self) -> bool {
        matches!(self, Route::Admin(_))
    }

    pub fn path(&self) -> String {
        let page = match self {
            Route::Login => return "/".to_string(),
            Route::Admin(page) => page,
        };
        match page {
            AdminPage::Dashboard => "/admin".to_string(),
            AdminPage::Users => "/admin/users".to_string(),
            AdminPage::CreateUser => "/admin/users/create".to_string(),
            AdminPage::Businesses => "/admin/businesses".to_string(),
            AdminPage::CreateBusiness => "/admin/businesses/create".to_string(),
            AdminPage::Events => "/admin/events".to_string(),
            AdminPage::CreateEvent => "/admin/events/create".to_string(),
            AdminPage::EventDetail(id) => format!("/admin/events/{}", id),
            AdminPage::Settings => "/admin/settings".to_string(),
        }
    }
}

impl FromStr for Route {
    type Err = RouteError;

    fn from_str(path: &str) -> Result<Self, Self::Err> {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        let page = match segments.as_slice() {
            [] => return Ok(Route::Login),
            ["admin"] | ["admin", "dashboard"] => AdminPage::Dashboard,
            ["admin", "users"] => AdminPage::Users,
            ["admin", "users", "create"] => AdminPage::CreateUser,
            ["admin", "businesses"] => AdminPage::Businesses,
            ["admin", "businesses", "create"] => AdminPage::CreateBusiness,
            ["admin", "events"] => AdminPage::Events,
            ["admin", "events", "create"] => AdminPage::CreateEvent,
            ["admin", "events", id] => AdminPage::EventDetail(
                id.parse().map_err(|_| RouteError(path.to_string()))?,
            ),
            ["admin", "settings"] => AdminPage::Settings,
            _ => return Err(RouteError(path.to_string())),
        };
        Ok(Route::Admin(page))
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

/// What the front end should do with a requested route
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    Render,
    /// Session still resolving; show a neutral waiting indicator
    Wait,
    Redirect(Route),
}

/// Decide access to `route` for the given session state
pub fn decide(state: &SessionState, route: &Route) -> GuardDecision {
    match (route.is_protected(), state.status) {
        (_, SessionStatus::Uninitialized | SessionStatus::Loading) => GuardDecision::Wait,
        (true, SessionStatus::Authenticated) => GuardDecision::Render,
        (true, SessionStatus::Unauthenticated) => GuardDecision::Redirect(Route::Login),
        (false, SessionStatus::Authenticated) => GuardDecision::Redirect(Route::admin_home()),
        (false, SessionStatus::Unauthenticated) => GuardDecision::Render,
    }
}

/// Gate for protected views, following the live session state
pub struct RouteGuard {
    session: watch::Receiver<SessionState>,
}

impl RouteGuard {
    pub fn new(session: watch::Receiver<SessionState>) -> Self {
        Self { session }
    }

    /// Decision for the current state, without waiting
    pub fn check(&self, route: &Route) -> GuardDecision {
        decide(&self.session.borrow(), route)
    }

    /// Wait until the session leaves its loading states, then decide.
    ///
    /// Something must drive the session forward (normally
    /// `SessionManager::initialize`), otherwise this waits forever.
    pub async fn resolve(&mut self, route: &Route) -> GuardDecision {
        let settled = self
            .session
            .wait_for(|state| !state.is_loading())
            .await
            .map(|state| state.clone());

        match settled {
            Ok(state) => decide(&state, route),
            // Session context dropped: nothing left to authorize against
            Err(_) => GuardDecision::Redirect(Route::Login),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(status: SessionStatus) -> SessionState {
        SessionState { status, user: None }
    }

    #[test]
    fn test_route_parse_and_path() {
        let cases = [
            ("/", Route::Login),
            ("", Route::Login),
            ("/admin", Route::admin_home()),
            ("/admin/dashboard", Route::admin_home()),
            ("/admin/users/create", Route::Admin(AdminPage::CreateUser)),
            ("/admin/events/42/", Route::Admin(AdminPage::EventDetail(42))),
            ("/admin/settings", Route::Admin(AdminPage::Settings)),
        ];
        for (path, expected) in cases {
            assert_eq!(path.parse::<Route>(), Ok(expected), "path {}", path);
        }

        assert_eq!(Route::Admin(AdminPage::EventDetail(7)).path(), "/admin/events/7");
        assert_eq!(Route::Login.to_string(), "/");
    }

    #[test]
    fn test_route_parse_rejects_unknown() {
        assert!("/admin/reports".parse::<Route>().is_err());
        assert!("/admin/events/abc".parse::<Route>().is_err());
        assert!("/login".parse::<Route>().is_err());
    }

    #[test]
    fn test_protected_route_decisions() {
        let route = Route::Admin(AdminPage::Users);
        assert_eq!(decide(&state(SessionStatus::Authenticated), &route), GuardDecision::Render);
        assert_eq!(decide(&state(SessionStatus::Loading), &route), GuardDecision::Wait);
        assert_eq!(decide(&state(SessionStatus::Uninitialized), &route), GuardDecision::Wait);
        assert_eq!(
            decide(&state(SessionStatus::Unauthenticated), &route),
            GuardDecision::Redirect(Route::Login)
        );
    }

    #[test]
    fn test_login_route_decisions() {
        assert_eq!(
            decide(&state(SessionStatus::Authenticated), &Route::Login),
            GuardDecision::Redirect(Route::admin_home())
        );
        assert_eq!(
            decide(&state(SessionStatus::Unauthenticated), &Route::Login),
            GuardDecision::Render
        );
        assert_eq!(decide(&state(SessionStatus::Loading), &Route::Login), GuardDecision::Wait);
    }

    #[tokio::test]
    async fn test_resolve_waits_for_loading_to_finish() {
        let (tx, rx) = watch::channel(state(SessionStatus::Loading));
        let mut guard = RouteGuard::new(rx);
        let route = Route::Admin(AdminPage::Events);

        assert_eq!(guard.check(&route), GuardDecision::Wait);

        let waiter = tokio::spawn(async move { guard.resolve(&route).await });
        tokio::task::yield_now().await;
        tx.send_replace(state(SessionStatus::Unauthenticated));

        assert_eq!(waiter.await.unwrap(), GuardDecision::Redirect(Route::Login));
    }

    #[tokio::test]
    async fn test_resolve_when_already_settled() {
        let (_tx, rx) = watch::channel(state(SessionStatus::Authenticated));
        let mut guard = RouteGuard::new(rx);
        assert_eq!(
            guard.resolve(&Route::Admin(AdminPage::Settings)).await,
            GuardDecision::Render
        );
    }
}
