//! Route Guard: decides which surface a navigation may reach from the
//! current Session State. Evaluated synchronously on every navigation.

use crate::session::SessionState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    /// `/`, resolves to Dashboard or Auth
    Root,
    /// Public landing (login / register)
    Auth,
    Dashboard,
    Purchases,
    Admin,
}

impl Route {
    pub fn path(&self) -> &'static str {
        match self {
            Route::Root => "/",
            Route::Auth => "/auth",
            Route::Dashboard => "/dashboard",
            Route::Purchases => "/purchases",
            Route::Admin => "/admin",
        }
    }

    pub fn requires_authentication(&self) -> bool {
        matches!(self, Route::Dashboard | Route::Purchases | Route::Admin)
    }

    pub fn requires_admin(&self) -> bool {
        matches!(self, Route::Admin)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    Allow(Route),
    Redirect(Route),
}

#[derive(Clone)]
pub struct RouteGuard {
    session: SessionState,
}

impl RouteGuard {
    pub fn new(session: SessionState) -> Self {
        Self { session }
    }

    /// One step of the decision
    pub fn check(&self, route: Route) -> Navigation {
        let authenticated = self.session.is_authenticated();
        match route {
            Route::Root if authenticated => Navigation::Redirect(Route::Dashboard),
            Route::Root => Navigation::Redirect(Route::Auth),
            Route::Auth if authenticated => Navigation::Redirect(Route::Dashboard),
            r if r.requires_authentication() && !authenticated => Navigation::Redirect(Route::Auth),
            r if r.requires_admin() && !self.session.is_admin() => Navigation::Redirect(Route::Dashboard),
            r => Navigation::Allow(r),
        }
    }

    /// Follow redirects to the route that is finally shown
    pub fn resolve(&self, route: Route) -> Route {
        let mut current = route;
        // Each redirect moves toward Auth or Dashboard, so a few hops suffice
        for _ in 0..4 {
            match self.check(current) {
                Navigation::Allow(r) => return r,
                Navigation::Redirect(next) => current = next,
            }
        }
        current
    }
}
