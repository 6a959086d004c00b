use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::error;
use validator::Validate;

use crate::client::CatalogApi;
use crate::error::CatalogResult;
use crate::payload::{ProductGroupPayload, ProductPayload};
use crate::types::{
    Admin, CreateReviewPayload, EntityId, LoginCredentials, Product, ProductGroup, Review,
};

/// Session state cache.
///
/// `init` probes the session cookie exactly once; the navigation guard
/// awaits it before deciding a route.
pub struct AuthStore {
    api: Arc<dyn CatalogApi>,
    admin: RwLock<Option<Admin>>,
    loading: AtomicBool,
    last_error: RwLock<Option<String>>,
    initialized: AtomicBool,
}

impl AuthStore {
    pub fn new(api: Arc<dyn CatalogApi>) -> Self {
        Self {
            api,
            admin: RwLock::new(None),
            loading: AtomicBool::new(false),
            last_error: RwLock::new(None),
            initialized: AtomicBool::new(false),
        }
    }

    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst)
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    pub async fn last_error(&self) -> Option<String> {
        self.last_error.read().await.clone()
    }

    pub async fn admin(&self) -> Option<Admin> {
        self.admin.read().await.clone()
    }

    pub async fn is_authenticated(&self) -> bool {
        self.admin.read().await.is_some()
    }

    /// Probe the current session once; later calls are no-ops
    pub async fn init(&self) {
        if self.is_initialized() {
            return;
        }

        self.loading.store(true, Ordering::SeqCst);
        match self.api.check_auth().await {
            Ok(status) if status.authenticated => {
                *self.admin.write().await = status.admin;
            }
            Ok(_) => {}
            Err(e) => error!(error = %e, "failed to initialize auth"),
        }
        self.loading.store(false, Ordering::SeqCst);
        self.initialized.store(true, Ordering::SeqCst);
    }

    /// Attempt a login; the failure message is recorded, not propagated
    pub async fn login(&self, credentials: &LoginCredentials) -> bool {
        self.loading.store(true, Ordering::SeqCst);
        *self.last_error.write().await = None;

        let logged_in = match self.api.login(credentials).await {
            Ok(response) => {
                *self.admin.write().await = Some(response.admin);
                true
            }
            Err(e) => {
                *self.last_error.write().await = Some(e.to_string());
                false
            }
        };

        self.loading.store(false, Ordering::SeqCst);
        logged_in
    }

    pub async fn logout(&self) {
        if let Err(e) = self.api.logout().await {
            error!(error = %e, "logout failed");
        }
        *self.admin.write().await = None;
    }
}

/// In-memory cache of catalog products plus the form edit target
pub struct ProductStore {
    api: Arc<dyn CatalogApi>,
    products: RwLock<Vec<Product>>,
    loading: AtomicBool,
    last_error: RwLock<Option<String>>,
    editing: RwLock<Option<Product>>,
}

impl ProductStore {
    pub fn new(api: Arc<dyn CatalogApi>) -> Self {
        Self {
            api,
            products: RwLock::new(Vec::new()),
            loading: AtomicBool::new(false),
            last_error: RwLock::new(None),
            editing: RwLock::new(None),
        }
    }

    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst)
    }

    pub async fn last_error(&self) -> Option<String> {
        self.last_error.read().await.clone()
    }

    pub async fn products(&self) -> Vec<Product> {
        self.products.read().await.clone()
    }

    /// Products ordered by group priority (higher first), then title
    pub async fn sorted_products(&self) -> Vec<Product> {
        let mut products = self.products.read().await.clone();
        products.sort_by(|a, b| {
            b.group_priority()
                .cmp(&a.group_priority())
                .then_with(|| a.title.cmp(&b.title))
        });
        products
    }

    /// Products indexed by their group; ungrouped products are not indexed
    pub async fn products_by_group(&self) -> HashMap<EntityId, Vec<Product>> {
        let mut map: HashMap<EntityId, Vec<Product>> = HashMap::new();
        for product in self.products.read().await.iter() {
            if let Some(group_id) = product.group_id() {
                map.entry(group_id).or_default().push(product.clone());
            }
        }
        map
    }

    /// Refresh the cache. Failures are recorded, not propagated.
    pub async fn fetch_products(&self) {
        self.loading.store(true, Ordering::SeqCst);
        *self.last_error.write().await = None;

        match self.api.products().await {
            Ok(products) => *self.products.write().await = products,
            Err(e) => {
                let message = e.to_string();
                error!(error = %message, "failed to fetch products");
                *self.last_error.write().await = Some(message);
            }
        }

        self.loading.store(false, Ordering::SeqCst);
    }

    /// Create a product and append the canonical entity to the cache
    pub async fn add_product(&self, payload: ProductPayload) -> CatalogResult<Product> {
        self.loading.store(true, Ordering::SeqCst);
        *self.last_error.write().await = None;

        let result = self.api.create_product(payload).await;
        match &result {
            Ok(product) => self.products.write().await.push(product.clone()),
            Err(e) => {
                let message = e.to_string();
                error!(error = %message, "failed to add product");
                *self.last_error.write().await = Some(message);
            }
        }

        self.loading.store(false, Ordering::SeqCst);
        result
    }

    /// Update a product and replace it in the cache. A missing id
    /// leaves the cache untouched.
    pub async fn edit_product(
        &self,
        id: EntityId,
        payload: ProductPayload,
    ) -> CatalogResult<Product> {
        self.loading.store(true, Ordering::SeqCst);
        *self.last_error.write().await = None;

        let result = self.api.update_product(id, payload).await;
        match &result {
            Ok(updated) => {
                let mut products = self.products.write().await;
                if let Some(slot) = products.iter_mut().find(|p| p.id == id) {
                    *slot = updated.clone();
                }
            }
            Err(e) => {
                let message = e.to_string();
                error!(error = %message, "failed to update product");
                *self.last_error.write().await = Some(message);
            }
        }

        self.loading.store(false, Ordering::SeqCst);
        result
    }

    pub async fn remove_product(&self, id: EntityId) -> CatalogResult<()> {
        self.loading.store(true, Ordering::SeqCst);
        *self.last_error.write().await = None;

        let result = self.api.delete_product(id).await;
        match &result {
            Ok(()) => self.products.write().await.retain(|p| p.id != id),
            Err(e) => {
                let message = e.to_string();
                error!(error = %message, "failed to delete product");
                *self.last_error.write().await = Some(message);
            }
        }

        self.loading.store(false, Ordering::SeqCst);
        result
    }

    /// Select the edit target; `None` switches the form to create mode
    pub async fn set_edit_mode(&self, product: Option<Product>) {
        *self.editing.write().await = product;
    }

    pub async fn editing(&self) -> Option<Product> {
        self.editing.read().await.clone()
    }

    pub async fn is_edit_mode(&self) -> bool {
        self.editing.read().await.is_some()
    }
}

/// In-memory cache of product groups plus the form edit target
pub struct ProductGroupStore {
    api: Arc<dyn CatalogApi>,
    groups: RwLock<Vec<ProductGroup>>,
    loading: AtomicBool,
    last_error: RwLock<Option<String>>,
    editing: RwLock<Option<ProductGroup>>,
}

impl ProductGroupStore {
    pub fn new(api: Arc<dyn CatalogApi>) -> Self {
        Self {
            api,
            groups: RwLock::new(Vec::new()),
            loading: AtomicBool::new(false),
            last_error: RwLock::new(None),
            editing: RwLock::new(None),
        }
    }

    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst)
    }

    pub async fn last_error(&self) -> Option<String> {
        self.last_error.read().await.clone()
    }

    pub async fn groups(&self) -> Vec<ProductGroup> {
        self.groups.read().await.clone()
    }

    /// Groups ordered by priority (higher first), then title
    pub async fn sorted_groups(&self) -> Vec<ProductGroup> {
        let mut groups = self.groups.read().await.clone();
        groups.sort_by(|a, b| b.priority.cmp(&a.priority).then_with(|| a.title.cmp(&b.title)));
        groups
    }

    /// Refresh the cache. Failures are recorded, not propagated.
    pub async fn fetch_groups(&self) {
        self.loading.store(true, Ordering::SeqCst);
        *self.last_error.write().await = None;

        match self.api.product_groups().await {
            Ok(groups) => *self.groups.write().await = groups,
            Err(e) => {
                let message = e.to_string();
                error!(error = %message, "failed to fetch product groups");
                *self.last_error.write().await = Some(message);
            }
        }

        self.loading.store(false, Ordering::SeqCst);
    }

    pub async fn add_group(&self, payload: &ProductGroupPayload) -> CatalogResult<ProductGroup> {
        self.loading.store(true, Ordering::SeqCst);
        *self.last_error.write().await = None;

        let result = self.api.create_product_group(payload).await;
        match &result {
            Ok(group) => self.groups.write().await.push(group.clone()),
            Err(e) => {
                let message = e.to_string();
                error!(error = %message, "failed to add product group");
                *self.last_error.write().await = Some(message);
            }
        }

        self.loading.store(false, Ordering::SeqCst);
        result
    }

    pub async fn edit_group(
        &self,
        id: EntityId,
        payload: &ProductGroupPayload,
    ) -> CatalogResult<ProductGroup> {
        self.loading.store(true, Ordering::SeqCst);
        *self.last_error.write().await = None;

        let result = self.api.update_product_group(id, payload).await;
        match &result {
            Ok(updated) => {
                let mut groups = self.groups.write().await;
                if let Some(slot) = groups.iter_mut().find(|g| g.id == id) {
                    *slot = updated.clone();
                }
            }
            Err(e) => {
                let message = e.to_string();
                error!(error = %message, "failed to update product group");
                *self.last_error.write().await = Some(message);
            }
        }

        self.loading.store(false, Ordering::SeqCst);
        result
    }

    pub async fn remove_group(&self, id: EntityId) -> CatalogResult<()> {
        self.loading.store(true, Ordering::SeqCst);
        *self.last_error.write().await = None;

        let result = self.api.delete_product_group(id).await;
        match &result {
            Ok(()) => self.groups.write().await.retain(|g| g.id != id),
            Err(e) => {
                let message = e.to_string();
                error!(error = %message, "failed to delete product group");
                *self.last_error.write().await = Some(message);
            }
        }

        self.loading.store(false, Ordering::SeqCst);
        result
    }

    /// Select the edit target; `None` switches the form to create mode
    pub async fn set_edit_mode(&self, group: Option<ProductGroup>) {
        *self.editing.write().await = group;
    }

    pub async fn editing(&self) -> Option<ProductGroup> {
        self.editing.read().await.clone()
    }

    pub async fn is_edit_mode(&self) -> bool {
        self.editing.read().await.is_some()
    }
}

/// In-memory cache of customer reviews
pub struct ReviewStore {
    api: Arc<dyn CatalogApi>,
    reviews: RwLock<Vec<Review>>,
    loading: AtomicBool,
    last_error: RwLock<Option<String>>,
}

impl ReviewStore {
    pub fn new(api: Arc<dyn CatalogApi>) -> Self {
        Self {
            api,
            reviews: RwLock::new(Vec::new()),
            loading: AtomicBool::new(false),
            last_error: RwLock::new(None),
        }
    }

    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst)
    }

    pub async fn last_error(&self) -> Option<String> {
        self.last_error.read().await.clone()
    }

    pub async fn reviews(&self) -> Vec<Review> {
        self.reviews.read().await.clone()
    }

    /// Reviews ordered newest first
    pub async fn sorted_reviews(&self) -> Vec<Review> {
        let mut reviews = self.reviews.read().await.clone();
        reviews.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        reviews
    }

    /// Arithmetic mean rating rounded to one decimal; 0 for an empty cache
    pub async fn average_rating(&self) -> f64 {
        let reviews = self.reviews.read().await;
        if reviews.is_empty() {
            return 0.0;
        }
        let sum: u32 = reviews.iter().map(|r| u32::from(r.rating)).sum();
        let mean = f64::from(sum) / reviews.len() as f64;
        (mean * 10.0).round() / 10.0
    }

    /// Refresh the cache. Failures are recorded, not propagated.
    pub async fn fetch_reviews(&self) {
        self.loading.store(true, Ordering::SeqCst);
        *self.last_error.write().await = None;

        match self.api.reviews().await {
            Ok(reviews) => *self.reviews.write().await = reviews,
            Err(e) => {
                let message = e.to_string();
                error!(error = %message, "failed to fetch reviews");
                *self.last_error.write().await = Some(message);
            }
        }

        self.loading.store(false, Ordering::SeqCst);
    }

    /// Validate and create a review, appending the canonical entity
    pub async fn add_review(&self, payload: &CreateReviewPayload) -> CatalogResult<Review> {
        self.loading.store(true, Ordering::SeqCst);
        *self.last_error.write().await = None;

        let result = match payload.validate() {
            Ok(()) => self.api.create_review(payload).await,
            Err(e) => Err(e.into()),
        };
        match &result {
            Ok(review) => self.reviews.write().await.push(review.clone()),
            Err(e) => {
                let message = e.to_string();
                error!(error = %message, "failed to add review");
                *self.last_error.write().await = Some(message);
            }
        }

        self.loading.store(false, Ordering::SeqCst);
        result
    }

    pub async fn remove_review(&self, id: EntityId) -> CatalogResult<()> {
        self.loading.store(true, Ordering::SeqCst);
        *self.last_error.write().await = None;

        let result = self.api.delete_review(id).await;
        match &result {
            Ok(()) => self.reviews.write().await.retain(|r| r.id != id),
            Err(e) => {
                let message = e.to_string();
                error!(error = %message, "failed to delete review");
                *self.last_error.write().await = Some(message);
            }
        }

        self.loading.store(false, Ordering::SeqCst);
        result
    }
}
