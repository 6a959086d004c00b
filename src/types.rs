use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Server-assigned entity identifier
pub type EntityId = i64;

/// Authenticated administrator account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Admin {
    pub id: EntityId,
    pub username: String,
}

/// Login request body. The password is wiped from memory on drop.
#[derive(Clone, Validate, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct LoginCredentials {
    #[validate(length(min = 1, message = "username must not be empty"))]
    pub username: String,
    #[validate(length(min = 1, message = "password must not be empty"))]
    pub password: String,
}

impl LoginCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl std::fmt::Debug for LoginCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Successful login response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub message: String,
    /// Legacy field; the session now rides on an HTTP-only cookie
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    pub admin: Admin,
}

/// Session probe result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthStatus {
    pub authenticated: bool,
    #[serde(default)]
    pub admin: Option<Admin>,
}

impl AuthStatus {
    /// Status every transport failure collapses to
    pub fn unauthenticated() -> Self {
        Self {
            authenticated: false,
            admin: None,
        }
    }
}

/// Stored product image reference
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductImage {
    pub id: EntityId,
    /// Server-relative storage path; display URLs prefix the asset origin
    pub path: String,
}

/// Product group (catalog section)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductGroup {
    pub id: EntityId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub priority: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub products: Option<Vec<Product>>,
}

/// Catalog product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: EntityId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub cost: Decimal,
    #[serde(default)]
    pub images: Vec<ProductImage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_group: Option<ProductGroup>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visible: Option<bool>,
}

impl Product {
    /// Group reference, if the server sent one
    pub fn group_id(&self) -> Option<EntityId> {
        self.product_group.as_ref().map(|group| group.id)
    }

    /// Group priority used for catalog ordering; ungrouped products sort last
    pub fn group_priority(&self) -> i64 {
        self.product_group
            .as_ref()
            .map(|group| group.priority)
            .unwrap_or_default()
    }

    /// Visibility flag; an absent flag means visible
    pub fn visible_or_default(&self) -> bool {
        self.visible.unwrap_or(true)
    }
}

/// Customer review
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub id: EntityId,
    pub name: String,
    pub rating: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// Review creation request
#[derive(Debug, Clone, Validate, Serialize, Deserialize)]
pub struct CreateReviewPayload {
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub name: String,
    #[validate(range(min = 1, max = 5, message = "rating must be between 1 and 5"))]
    pub rating: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_wire_names() {
        let json = r#"{
            "id": 7,
            "title": "Latte",
            "description": "with oat milk",
            "cost": 5.5,
            "images": [{"id": 1, "path": "/uploads/latte.jpg"}],
            "productGroup": {"id": 2, "title": "Coffee", "priority": 10},
            "visible": false
        }"#;
        let product: Product = serde_json::from_str(json).unwrap();
        assert_eq!(product.group_id(), Some(2));
        assert_eq!(product.group_priority(), 10);
        assert_eq!(product.visible_or_default(), false);
        assert_eq!(product.cost, Decimal::new(55, 1));

        let round_trip = serde_json::to_string(&product).unwrap();
        assert!(round_trip.contains("\"productGroup\""));
    }

    #[test]
    fn test_product_defaults_for_absent_fields() {
        let product: Product = serde_json::from_str(r#"{"id": 1}"#).unwrap();
        assert_eq!(product.title, "");
        assert_eq!(product.cost, Decimal::ZERO);
        assert!(product.images.is_empty());
        assert_eq!(product.group_id(), None);
        // an undefined visibility flag defaults to visible
        assert!(product.visible_or_default());
    }

    #[test]
    fn test_credentials_debug_redacts_password() {
        let credentials = LoginCredentials::new("admin", "hunter2");
        let debug = format!("{:?}", credentials);
        assert!(debug.contains("admin"));
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn test_review_payload_validation() {
        let valid = CreateReviewPayload {
            name: "Ivan".to_string(),
            rating: 5,
            comment: None,
        };
        assert!(valid.validate().is_ok());

        let invalid = CreateReviewPayload {
            name: String::new(),
            rating: 6,
            comment: None,
        };
        assert!(invalid.validate().is_err());
    }
}
