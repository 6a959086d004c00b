use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::warn;
use validator::Validate;

use crate::error::{CatalogError, CatalogResult};
use crate::payload::{PayloadPart, ProductGroupPayload, ProductPayload};
use crate::types::{
    Admin, AuthStatus, CreateReviewPayload, EntityId, LoginCredentials, LoginResponse, Product,
    ProductGroup, ProductImage, Review,
};

/// Client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the catalog REST API
    pub api_url: String,
    /// Origin prefixed to stored image paths for display URLs
    pub asset_origin: String,
    pub timeout_seconds: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: "https://coffeecamp.ru/api".to_string(),
            asset_origin: "https://coffeecamp.ru".to_string(),
            timeout_seconds: 30,
        }
    }
}

/// Typed surface of the catalog REST API - all transports must implement this
#[async_trait]
pub trait CatalogApi: Send + Sync {
    async fn login(&self, credentials: &LoginCredentials) -> CatalogResult<LoginResponse>;

    /// Probe the current session. Transport failures resolve to an
    /// unauthenticated status instead of propagating.
    async fn check_auth(&self) -> CatalogResult<AuthStatus>;

    /// End the current session. Failures are logged and swallowed.
    async fn logout(&self) -> CatalogResult<()>;

    async fn products(&self) -> CatalogResult<Vec<Product>>;
    async fn create_product(&self, payload: ProductPayload) -> CatalogResult<Product>;
    async fn update_product(&self, id: EntityId, payload: ProductPayload)
        -> CatalogResult<Product>;
    async fn delete_product(&self, id: EntityId) -> CatalogResult<()>;

    async fn product_groups(&self) -> CatalogResult<Vec<ProductGroup>>;
    async fn create_product_group(
        &self,
        payload: &ProductGroupPayload,
    ) -> CatalogResult<ProductGroup>;
    async fn update_product_group(
        &self,
        id: EntityId,
        payload: &ProductGroupPayload,
    ) -> CatalogResult<ProductGroup>;
    async fn delete_product_group(&self, id: EntityId) -> CatalogResult<()>;

    async fn reviews(&self) -> CatalogResult<Vec<Review>>;
    async fn create_review(&self, payload: &CreateReviewPayload) -> CatalogResult<Review>;
    async fn delete_review(&self, id: EntityId) -> CatalogResult<()>;
}

/// Error envelope the API attaches to failed responses
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    #[serde(default)]
    error: Option<String>,
}

/// HTTP implementation of [`CatalogApi`].
///
/// The underlying client keeps a cookie store, so the HTTP-only session
/// cookie set by `login` rides on every later request.
pub struct CatalogClient {
    config: ClientConfig,
    client: reqwest::Client,
}

impl CatalogClient {
    pub fn new(config: ClientConfig) -> CatalogResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .cookie_store(true)
            .build()
            .map_err(|e| {
                CatalogError::configuration(format!("failed to build HTTP client: {e}"))
            })?;

        Ok(Self { config, client })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.config.api_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Surface the envelope's error string when present, else a generic message
    async fn fail(response: reqwest::Response) -> CatalogError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if let Ok(envelope) = serde_json::from_str::<ErrorEnvelope>(&body) {
            if let Some(message) = envelope.error {
                return CatalogError::api(message);
            }
        }
        CatalogError::api(format!("HTTP {status}"))
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> CatalogResult<T> {
        if !response.status().is_success() {
            return Err(Self::fail(response).await);
        }
        response
            .json::<T>()
            .await
            .map_err(|e| CatalogError::serialization(format!("failed to parse response: {e}")))
    }

    /// Status check for endpoints whose body carries nothing of interest
    async fn expect_ok(response: reqwest::Response) -> CatalogResult<()> {
        if !response.status().is_success() {
            return Err(Self::fail(response).await);
        }
        Ok(())
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> CatalogResult<T> {
        let response = self.client.get(self.endpoint(path)).send().await?;
        Self::decode(response).await
    }

    async fn post_json<T, B>(&self, path: &str, body: &B) -> CatalogResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + Sync + ?Sized,
    {
        let response = self
            .client
            .post(self.endpoint(path))
            .json(body)
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn put_json<T, B>(&self, path: &str, body: &B) -> CatalogResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + Sync + ?Sized,
    {
        let response = self
            .client
            .put(self.endpoint(path))
            .json(body)
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn delete(&self, path: &str) -> CatalogResult<()> {
        let response = self.client.delete(self.endpoint(path)).send().await?;
        Self::expect_ok(response).await
    }

    async fn send_multipart<T: DeserializeOwned>(
        &self,
        method: reqwest::Method,
        path: &str,
        payload: ProductPayload,
    ) -> CatalogResult<T> {
        let form = payload.into_multipart()?;
        let response = self
            .client
            .request(method, self.endpoint(path))
            .multipart(form)
            .send()
            .await?;
        Self::decode(response).await
    }
}

#[async_trait]
impl CatalogApi for CatalogClient {
    async fn login(&self, credentials: &LoginCredentials) -> CatalogResult<LoginResponse> {
        credentials.validate()?;
        self.post_json("login", credentials).await
    }

    async fn check_auth(&self) -> CatalogResult<AuthStatus> {
        match self.get_json::<AuthStatus>("check-auth").await {
            Ok(status) => Ok(status),
            Err(_) => Ok(AuthStatus::unauthenticated()),
        }
    }

    async fn logout(&self) -> CatalogResult<()> {
        let body = serde_json::json!({});
        if let Err(e) = self
            .post_json::<serde_json::Value, _>("logout", &body)
            .await
        {
            warn!(error = %e, "logout request failed");
        }
        Ok(())
    }

    async fn products(&self) -> CatalogResult<Vec<Product>> {
        #[derive(Deserialize)]
        struct Body {
            #[serde(default)]
            products: Vec<Product>,
        }

        let body: Body = self.get_json("products").await?;
        Ok(body.products)
    }

    async fn create_product(&self, payload: ProductPayload) -> CatalogResult<Product> {
        #[derive(Deserialize)]
        struct Body {
            product: Product,
        }

        let body: Body = self
            .send_multipart(reqwest::Method::POST, "products", payload)
            .await?;
        Ok(body.product)
    }

    async fn update_product(
        &self,
        id: EntityId,
        payload: ProductPayload,
    ) -> CatalogResult<Product> {
        #[derive(Deserialize)]
        struct Body {
            product: Product,
        }

        let body: Body = self
            .send_multipart(reqwest::Method::PUT, &format!("products/{id}"), payload)
            .await?;
        Ok(body.product)
    }

    async fn delete_product(&self, id: EntityId) -> CatalogResult<()> {
        self.delete(&format!("products/{id}")).await
    }

    async fn product_groups(&self) -> CatalogResult<Vec<ProductGroup>> {
        #[derive(Deserialize)]
        struct Body {
            #[serde(default, rename = "productGroups")]
            product_groups: Vec<ProductGroup>,
        }

        let body: Body = self.get_json("product-groups").await?;
        Ok(body.product_groups)
    }

    async fn create_product_group(
        &self,
        payload: &ProductGroupPayload,
    ) -> CatalogResult<ProductGroup> {
        #[derive(Deserialize)]
        struct Body {
            #[serde(rename = "productGroup")]
            product_group: ProductGroup,
        }

        let body: Body = self.post_json("product-groups", payload).await?;
        Ok(body.product_group)
    }

    async fn update_product_group(
        &self,
        id: EntityId,
        payload: &ProductGroupPayload,
    ) -> CatalogResult<ProductGroup> {
        #[derive(Deserialize)]
        struct Body {
            #[serde(rename = "productGroup")]
            product_group: ProductGroup,
        }

        let body: Body = self
            .put_json(&format!("product-groups/{id}"), payload)
            .await?;
        Ok(body.product_group)
    }

    async fn delete_product_group(&self, id: EntityId) -> CatalogResult<()> {
        self.delete(&format!("product-groups/{id}")).await
    }

    async fn reviews(&self) -> CatalogResult<Vec<Review>> {
        #[derive(Deserialize)]
        struct Body {
            #[serde(default)]
            reviews: Vec<Review>,
        }

        let body: Body = self.get_json("reviews").await?;
        Ok(body.reviews)
    }

    async fn create_review(&self, payload: &CreateReviewPayload) -> CatalogResult<Review> {
        #[derive(Deserialize)]
        struct Body {
            review: Review,
        }

        let body: Body = self.post_json("reviews", payload).await?;
        Ok(body.review)
    }

    async fn delete_review(&self, id: EntityId) -> CatalogResult<()> {
        self.delete(&format!("reviews/{id}")).await
    }
}

/// In-memory mock of the catalog API for tests and wiring without a server.
///
/// Mutating calls are captured so tests can assert on the exact payloads
/// the reconciliation engines produced.
#[derive(Debug, Default)]
pub struct MockCatalogApi {
    should_fail: bool,
    session: Mutex<Option<Admin>>,
    products: Mutex<Vec<Product>>,
    groups: Mutex<Vec<ProductGroup>>,
    reviews: Mutex<Vec<Review>>,
    next_image_id: Mutex<EntityId>,
    product_payloads: Mutex<Vec<(Option<EntityId>, ProductPayload)>>,
    group_payloads: Mutex<Vec<(Option<EntityId>, ProductGroupPayload)>>,
}

impl MockCatalogApi {
    pub fn new() -> Self {
        Self {
            next_image_id: Mutex::new(1000),
            ..Self::default()
        }
    }

    /// Make every operation fail with a canned API error
    pub fn with_failure(mut self, should_fail: bool) -> Self {
        self.should_fail = should_fail;
        self
    }

    pub fn with_session(self, admin: Admin) -> Self {
        *self.session.lock().expect("mock lock poisoned") = Some(admin);
        self
    }

    pub fn with_products(self, products: Vec<Product>) -> Self {
        *self.products.lock().expect("mock lock poisoned") = products;
        self
    }

    pub fn with_groups(self, groups: Vec<ProductGroup>) -> Self {
        *self.groups.lock().expect("mock lock poisoned") = groups;
        self
    }

    pub fn with_reviews(self, reviews: Vec<Review>) -> Self {
        *self.reviews.lock().expect("mock lock poisoned") = reviews;
        self
    }

    /// Product payloads received so far, with the target id for updates
    pub fn product_payloads(&self) -> Vec<(Option<EntityId>, ProductPayload)> {
        self.product_payloads
            .lock()
            .expect("mock lock poisoned")
            .clone()
    }

    pub fn group_payloads(&self) -> Vec<(Option<EntityId>, ProductGroupPayload)> {
        self.group_payloads
            .lock()
            .expect("mock lock poisoned")
            .clone()
    }

    fn fail(&self) -> CatalogError {
        CatalogError::api("mock catalog failure")
    }

    fn fresh_image_id(&self) -> EntityId {
        let mut next = self.next_image_id.lock().expect("mock lock poisoned");
        let id = *next;
        *next += 1;
        id
    }

    fn group_for(&self, id: EntityId) -> ProductGroup {
        self.groups
            .lock()
            .expect("mock lock poisoned")
            .iter()
            .find(|group| group.id == id)
            .cloned()
            .unwrap_or(ProductGroup {
                id,
                title: String::new(),
                priority: 0,
                products: None,
            })
    }

    /// Apply a reconciliation payload the way the real server would
    fn apply_product_payload(&self, product: &mut Product, payload: &ProductPayload) {
        if let Some(title) = payload.text("title") {
            product.title = title.to_string();
        }
        if let Some(description) = payload.text("description") {
            product.description = description.to_string();
        }
        if let Some(cost) = payload.text("cost") {
            if let Ok(cost) = cost.parse::<Decimal>() {
                product.cost = cost;
            }
        }
        if let Some(group_id) = payload.text("productGroupId") {
            if let Ok(group_id) = group_id.parse::<EntityId>() {
                product.product_group = Some(self.group_for(group_id));
            }
        }
        if let Some(visible) = payload.text("visible") {
            if let Ok(visible) = visible.parse::<bool>() {
                product.visible = Some(visible);
            }
        }

        let remove_all = payload.text("existingImages") == Some("false");
        let survivors: Vec<EntityId> = payload
            .parts()
            .iter()
            .filter(|(key, _)| key.starts_with("existingImages["))
            .filter_map(|(_, part)| match part {
                PayloadPart::Text(value) => value.parse::<EntityId>().ok(),
                PayloadPart::File(_) => None,
            })
            .collect();
        let uploads: Vec<ProductImage> = payload
            .parts()
            .iter()
            .filter(|(key, _)| key.starts_with("images["))
            .filter_map(|(_, part)| match part {
                PayloadPart::File(upload) => Some(ProductImage {
                    id: self.fresh_image_id(),
                    path: format!("/uploads/{}", upload.file_name),
                }),
                PayloadPart::Text(_) => None,
            })
            .collect();

        if remove_all {
            product.images.clear();
        } else if !survivors.is_empty() || !uploads.is_empty() {
            product.images.retain(|image| survivors.contains(&image.id));
            product.images.extend(uploads);
        }
    }
}

#[async_trait]
impl CatalogApi for MockCatalogApi {
    async fn login(&self, credentials: &LoginCredentials) -> CatalogResult<LoginResponse> {
        if self.should_fail {
            return Err(CatalogError::api("Invalid credentials"));
        }
        let admin = Admin {
            id: 1,
            username: credentials.username.clone(),
        };
        *self.session.lock().expect("mock lock poisoned") = Some(admin.clone());
        Ok(LoginResponse {
            message: "ok".to_string(),
            token: None,
            admin,
        })
    }

    async fn check_auth(&self) -> CatalogResult<AuthStatus> {
        if self.should_fail {
            return Ok(AuthStatus::unauthenticated());
        }
        let admin = self.session.lock().expect("mock lock poisoned").clone();
        Ok(AuthStatus {
            authenticated: admin.is_some(),
            admin,
        })
    }

    async fn logout(&self) -> CatalogResult<()> {
        *self.session.lock().expect("mock lock poisoned") = None;
        Ok(())
    }

    async fn products(&self) -> CatalogResult<Vec<Product>> {
        if self.should_fail {
            return Err(self.fail());
        }
        Ok(self.products.lock().expect("mock lock poisoned").clone())
    }

    async fn create_product(&self, payload: ProductPayload) -> CatalogResult<Product> {
        if self.should_fail {
            return Err(self.fail());
        }
        self.product_payloads
            .lock()
            .expect("mock lock poisoned")
            .push((None, payload.clone()));

        let id = {
            let products = self.products.lock().expect("mock lock poisoned");
            products.iter().map(|p| p.id).max().unwrap_or(0) + 1
        };
        let mut product = Product {
            id,
            title: String::new(),
            description: String::new(),
            cost: Decimal::ZERO,
            images: Vec::new(),
            product_group: None,
            visible: None,
        };
        self.apply_product_payload(&mut product, &payload);
        self.products
            .lock()
            .expect("mock lock poisoned")
            .push(product.clone());
        Ok(product)
    }

    async fn update_product(
        &self,
        id: EntityId,
        payload: ProductPayload,
    ) -> CatalogResult<Product> {
        if self.should_fail {
            return Err(self.fail());
        }
        self.product_payloads
            .lock()
            .expect("mock lock poisoned")
            .push((Some(id), payload.clone()));

        let mut product = {
            let products = self.products.lock().expect("mock lock poisoned");
            products
                .iter()
                .find(|p| p.id == id)
                .cloned()
                .ok_or_else(|| CatalogError::api("Product not found"))?
        };
        self.apply_product_payload(&mut product, &payload);
        let mut products = self.products.lock().expect("mock lock poisoned");
        if let Some(slot) = products.iter_mut().find(|p| p.id == id) {
            *slot = product.clone();
        }
        Ok(product)
    }

    async fn delete_product(&self, id: EntityId) -> CatalogResult<()> {
        if self.should_fail {
            return Err(self.fail());
        }
        self.products
            .lock()
            .expect("mock lock poisoned")
            .retain(|p| p.id != id);
        Ok(())
    }

    async fn product_groups(&self) -> CatalogResult<Vec<ProductGroup>> {
        if self.should_fail {
            return Err(self.fail());
        }
        Ok(self.groups.lock().expect("mock lock poisoned").clone())
    }

    async fn create_product_group(
        &self,
        payload: &ProductGroupPayload,
    ) -> CatalogResult<ProductGroup> {
        if self.should_fail {
            return Err(self.fail());
        }
        self.group_payloads
            .lock()
            .expect("mock lock poisoned")
            .push((None, payload.clone()));

        let mut groups = self.groups.lock().expect("mock lock poisoned");
        let group = ProductGroup {
            id: groups.iter().map(|g| g.id).max().unwrap_or(0) + 1,
            title: payload.title.clone().unwrap_or_default(),
            priority: payload.priority.unwrap_or_default(),
            products: None,
        };
        groups.push(group.clone());
        Ok(group)
    }

    async fn update_product_group(
        &self,
        id: EntityId,
        payload: &ProductGroupPayload,
    ) -> CatalogResult<ProductGroup> {
        if self.should_fail {
            return Err(self.fail());
        }
        self.group_payloads
            .lock()
            .expect("mock lock poisoned")
            .push((Some(id), payload.clone()));

        let mut groups = self.groups.lock().expect("mock lock poisoned");
        let group = groups
            .iter_mut()
            .find(|g| g.id == id)
            .ok_or_else(|| CatalogError::api("Product group not found"))?;
        if let Some(title) = &payload.title {
            group.title = title.clone();
        }
        if let Some(priority) = payload.priority {
            group.priority = priority;
        }
        Ok(group.clone())
    }

    async fn delete_product_group(&self, id: EntityId) -> CatalogResult<()> {
        if self.should_fail {
            return Err(self.fail());
        }
        self.groups
            .lock()
            .expect("mock lock poisoned")
            .retain(|g| g.id != id);
        Ok(())
    }

    async fn reviews(&self) -> CatalogResult<Vec<Review>> {
        if self.should_fail {
            return Err(self.fail());
        }
        Ok(self.reviews.lock().expect("mock lock poisoned").clone())
    }

    async fn create_review(&self, payload: &CreateReviewPayload) -> CatalogResult<Review> {
        if self.should_fail {
            return Err(self.fail());
        }
        let mut reviews = self.reviews.lock().expect("mock lock poisoned");
        let review = Review {
            id: reviews.iter().map(|r| r.id).max().unwrap_or(0) + 1,
            name: payload.name.clone(),
            rating: payload.rating,
            comment: payload.comment.clone(),
            timestamp: Utc::now(),
        };
        reviews.push(review.clone());
        Ok(review)
    }

    async fn delete_review(&self, id: EntityId) -> CatalogResult<()> {
        if self.should_fail {
            return Err(self.fail());
        }
        self.reviews
            .lock()
            .expect("mock lock poisoned")
            .retain(|r| r.id != id);
        Ok(())
    }
}
