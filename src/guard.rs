use std::sync::Arc;

use crate::stores::AuthStore;

/// Application routes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Login,
    Dashboard,
}

impl Route {
    pub fn requires_auth(self) -> bool {
        matches!(self, Route::Dashboard)
    }
}

/// Gates route entry on session initialization and authentication state
pub struct NavigationGuard {
    auth: Arc<AuthStore>,
}

impl NavigationGuard {
    pub fn new(auth: Arc<AuthStore>) -> Self {
        Self { auth }
    }

    /// Resolve a navigation request to the route that should render.
    /// The session is probed first if that has not happened yet.
    pub async fn resolve(&self, to: Route) -> Route {
        if !self.auth.is_initialized() {
            self.auth.init().await;
        }

        let authenticated = self.auth.is_authenticated().await;
        if to.requires_auth() && !authenticated {
            Route::Login
        } else if to == Route::Login && authenticated {
            Route::Dashboard
        } else {
            to
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::MockCatalogApi;
    use crate::types::Admin;

    fn admin() -> Admin {
        Admin {
            id: 1,
            username: "admin".to_string(),
        }
    }

    #[tokio::test]
    async fn test_protected_route_redirects_to_login() {
        let api = Arc::new(MockCatalogApi::new());
        let guard = NavigationGuard::new(Arc::new(AuthStore::new(api)));

        assert_eq!(guard.resolve(Route::Dashboard).await, Route::Login);
        assert_eq!(guard.resolve(Route::Login).await, Route::Login);
    }

    #[tokio::test]
    async fn test_authenticated_session_redirects_login_to_dashboard() {
        let api = Arc::new(MockCatalogApi::new().with_session(admin()));
        let guard = NavigationGuard::new(Arc::new(AuthStore::new(api)));

        assert_eq!(guard.resolve(Route::Login).await, Route::Dashboard);
        assert_eq!(guard.resolve(Route::Dashboard).await, Route::Dashboard);
    }

    #[tokio::test]
    async fn test_resolve_initializes_the_session_once() {
        let api = Arc::new(MockCatalogApi::new().with_session(admin()));
        let auth = Arc::new(AuthStore::new(api));
        let guard = NavigationGuard::new(auth.clone());

        assert!(!auth.is_initialized());
        guard.resolve(Route::Dashboard).await;
        assert!(auth.is_initialized());
        assert!(auth.is_authenticated().await);
    }
}
