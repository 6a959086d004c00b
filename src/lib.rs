//! # CoffeeCamp Admin
//!
//! An administrative client for a small e-commerce catalog, featuring:
//!
//! - **Typed REST Transport**: cookie-based session auth over a unified
//!   client trait, with a mock implementation for offline wiring
//! - **Entity Stores**: in-memory caches for products, product groups,
//!   reviews, and the auth session, with loading/error flags
//! - **Form Reconciliation**: minimal-diff editing for products and
//!   product groups, serialized to multipart or plain payloads
//! - **Navigation Guard**: session-initialization + auth redirect logic
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use coffeecamp_admin::{AdminConsoleBuilder, LoginCredentials};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let console = AdminConsoleBuilder::new().build()?;
//!
//!     let auth = console.auth();
//!     if auth.login(&LoginCredentials::new("admin", "secret")).await {
//!         let products = console.products();
//!         products.fetch_products().await;
//!         println!("{} products", products.products().await.len());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! The library is organized into several key modules:
//!
//! - [`types`]: core entities and auth data structures
//! - [`error`]: error handling and result types
//! - [`client`]: the REST transport trait and its implementations
//! - [`payload`]: submission payload assembly types
//! - [`stores`]: per-entity in-memory caches over the transport
//! - [`product_form`] / [`product_group_form`]: the reconciliation
//!   engines that diff live form state against a frozen snapshot
//! - [`guard`]: route resolution against the session state
//! - [`builder`]: dependency wiring for the whole console
//!
//! ## Editing Flow
//!
//! 1. **Select Target**: a store's `set_edit_mode` holds the entity
//!    being edited; `None` means create mode
//! 2. **Open**: the form snapshots the target's editable fields and
//!    rebuilds the image roster
//! 3. **Edit**: the caller mutates the form state; validity is
//!    re-derived on read
//! 4. **Submit**: the engine diffs state against the snapshot and
//!    assembles the minimal payload
//! 5. **Send**: the store pushes the payload through the transport and
//!    reconciles its cache with the canonical entity returned

pub mod builder;
pub mod client;
pub mod error;
pub mod guard;
pub mod notify;
pub mod payload;
pub mod product_form;
pub mod product_group_form;
pub mod stores;
pub mod types;

// Re-export commonly used types for convenience
pub use builder::{AdminConsole, AdminConsoleBuilder};
pub use client::{CatalogApi, CatalogClient, ClientConfig, MockCatalogApi};
pub use error::{CatalogError, CatalogResult};
pub use guard::{NavigationGuard, Route};
pub use notify::{Notifier, NoticeLevel, RecordingNotifier, TracingNotifier};
pub use payload::{ImageUpload, PayloadPart, ProductGroupPayload, ProductPayload};
pub use product_form::{ProductChanges, ProductForm, ProductFormState, RosterEntry};
pub use product_group_form::{GroupFieldChanges, GroupFormState, ProductGroupForm};
pub use stores::{AuthStore, ProductGroupStore, ProductStore, ReviewStore};
pub use types::{
    Admin, AuthStatus, CreateReviewPayload, EntityId, LoginCredentials, LoginResponse, Product,
    ProductGroup, ProductImage, Review,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Prelude module for common imports
pub mod prelude {
    pub use crate::builder::{AdminConsole, AdminConsoleBuilder};
    pub use crate::client::{CatalogApi, ClientConfig};
    pub use crate::error::{CatalogError, CatalogResult};
    pub use crate::payload::{ImageUpload, ProductGroupPayload, ProductPayload};
    pub use crate::types::{LoginCredentials, Product, ProductGroup, Review};
}
