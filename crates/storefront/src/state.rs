//! Application state shared across handlers.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use crate::catalog::CatalogService;
use crate::config::StorefrontConfig;
use crate::payments::PaymentGateway;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to the
/// configuration, the catalog, the payment gateway and the checkout guard.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    catalog: CatalogService,
    payments: Arc<dyn PaymentGateway>,
    checkouts: InFlightCheckouts,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(
        config: StorefrontConfig,
        catalog: CatalogService,
        payments: Arc<dyn PaymentGateway>,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                catalog,
                payments,
                checkouts: InFlightCheckouts::default(),
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the catalog service.
    #[must_use]
    pub fn catalog(&self) -> &CatalogService {
        &self.inner.catalog
    }

    /// Get a reference to the payment gateway.
    #[must_use]
    pub fn payments(&self) -> &dyn PaymentGateway {
        self.inner.payments.as_ref()
    }

    /// Sessions with a checkout submission in progress.
    #[must_use]
    pub fn checkouts(&self) -> &InFlightCheckouts {
        &self.inner.checkouts
    }
}

/// Set of session ids whose checkout call is outstanding.
///
/// A second submission from the same session is refused while the first one
/// holds its [`CheckoutGuard`].
#[derive(Clone, Default)]
pub struct InFlightCheckouts {
    sessions: Arc<Mutex<HashSet<String>>>,
}

impl InFlightCheckouts {
    /// Mark `session_id` busy. Returns `None` if it already is.
    #[must_use]
    pub fn try_begin(&self, session_id: &str) -> Option<CheckoutGuard> {
        let inserted = self
            .sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(session_id.to_owned());

        inserted.then(|| CheckoutGuard {
            sessions: Arc::clone(&self.sessions),
            session_id: session_id.to_owned(),
        })
    }

    #[must_use]
    pub fn is_busy(&self, session_id: &str) -> bool {
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(session_id)
    }
}

/// Clears the busy flag when dropped, including on early return or panic.
#[must_use = "the session is only marked busy while the guard is alive"]
pub struct CheckoutGuard {
    sessions: Arc<Mutex<HashSet<String>>>,
    session_id: String,
}

impl Drop for CheckoutGuard {
    fn drop(&mut self) {
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.session_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_begin_is_refused() {
        let checkouts = InFlightCheckouts::default();

        let guard = checkouts.try_begin("abc");
        assert!(guard.is_some());
        assert!(checkouts.try_begin("abc").is_none());
        assert!(checkouts.try_begin("other").is_some());
    }

    #[test]
    fn test_drop_releases_session() {
        let checkouts = InFlightCheckouts::default();

        {
            let _guard = checkouts.try_begin("abc");
            assert!(checkouts.is_busy("abc"));
        }

        assert!(!checkouts.is_busy("abc"));
        assert!(checkouts.try_begin("abc").is_some());
    }
}
