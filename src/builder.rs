use std::sync::Arc;

use crate::client::{CatalogApi, CatalogClient, ClientConfig};
use crate::error::CatalogResult;
use crate::guard::NavigationGuard;
use crate::notify::{Notifier, TracingNotifier};
use crate::product_form::ProductForm;
use crate::product_group_form::ProductGroupForm;
use crate::stores::{AuthStore, ProductGroupStore, ProductStore, ReviewStore};

/// Builder for a fully wired [`AdminConsole`]
pub struct AdminConsoleBuilder {
    config: Option<ClientConfig>,
    api: Option<Arc<dyn CatalogApi>>,
    notifier: Option<Arc<dyn Notifier>>,
}

impl AdminConsoleBuilder {
    pub fn new() -> Self {
        Self {
            config: None,
            api: None,
            notifier: None,
        }
    }

    pub fn with_config(mut self, config: ClientConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Inject a custom transport (e.g. [`crate::client::MockCatalogApi`])
    /// instead of the real HTTP client
    pub fn with_api(mut self, api: Arc<dyn CatalogApi>) -> Self {
        self.api = Some(api);
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Build the console, constructing the real HTTP client when no
    /// transport override was given
    pub fn build(self) -> CatalogResult<AdminConsole> {
        let config = self.config.unwrap_or_default();
        let api = match self.api {
            Some(api) => api,
            None => Arc::new(CatalogClient::new(config.clone())?),
        };
        let notifier = self
            .notifier
            .unwrap_or_else(|| Arc::new(TracingNotifier));

        Ok(AdminConsole {
            auth: Arc::new(AuthStore::new(api.clone())),
            products: Arc::new(ProductStore::new(api.clone())),
            product_groups: Arc::new(ProductGroupStore::new(api.clone())),
            reviews: Arc::new(ReviewStore::new(api)),
            notifier,
            config,
        })
    }
}

impl Default for AdminConsoleBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Complete admin-console wiring: one store per entity, a notifier, and
/// factories for the form engines bound to those stores
pub struct AdminConsole {
    config: ClientConfig,
    auth: Arc<AuthStore>,
    products: Arc<ProductStore>,
    product_groups: Arc<ProductGroupStore>,
    reviews: Arc<ReviewStore>,
    notifier: Arc<dyn Notifier>,
}

impl AdminConsole {
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn auth(&self) -> Arc<AuthStore> {
        self.auth.clone()
    }

    pub fn products(&self) -> Arc<ProductStore> {
        self.products.clone()
    }

    pub fn product_groups(&self) -> Arc<ProductGroupStore> {
        self.product_groups.clone()
    }

    pub fn reviews(&self) -> Arc<ReviewStore> {
        self.reviews.clone()
    }

    /// New product form bound to the product store. One form at a time:
    /// the engine assumes a single open modal.
    pub fn product_form(&self) -> ProductForm {
        ProductForm::new(
            self.products.clone(),
            self.notifier.clone(),
            self.config.asset_origin.clone(),
        )
    }

    pub fn product_group_form(&self) -> ProductGroupForm {
        ProductGroupForm::new(self.product_groups.clone(), self.notifier.clone())
    }

    pub fn guard(&self) -> NavigationGuard {
        NavigationGuard::new(self.auth.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::MockCatalogApi;

    #[test]
    fn test_builder_defaults() {
        let builder = AdminConsoleBuilder::new();
        assert!(builder.config.is_none());
        assert!(builder.api.is_none());
        assert!(builder.notifier.is_none());
    }

    #[test]
    fn test_build_with_default_config() {
        let console = AdminConsoleBuilder::new()
            .build()
            .expect("console should build");
        assert_eq!(console.config().api_url, "https://coffeecamp.ru/api");
    }

    #[tokio::test]
    async fn test_build_with_mock_api() {
        let console = AdminConsoleBuilder::new()
            .with_api(Arc::new(MockCatalogApi::new()))
            .build()
            .expect("console should build");

        console.products().fetch_products().await;
        assert!(console.products().products().await.is_empty());
        assert_eq!(console.products().last_error().await, None);
    }

    #[tokio::test]
    async fn test_forms_share_their_store() {
        let console = AdminConsoleBuilder::new()
            .with_api(Arc::new(MockCatalogApi::new()))
            .build()
            .expect("console should build");

        let mut form = console.product_form();
        form.open().await;
        assert!(!form.is_edit());
    }
}
