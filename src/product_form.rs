use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::error;

use crate::error::{CatalogError, CatalogResult};
use crate::notify::Notifier;
use crate::payload::{ImageUpload, ProductPayload};
use crate::stores::ProductStore;
use crate::types::{EntityId, ProductImage};

/// Editable scalar fields of the product form
#[derive(Debug, Clone, PartialEq)]
pub struct ProductFormState {
    pub title: String,
    pub description: String,
    pub cost: Decimal,
    pub product_group_id: Option<EntityId>,
    pub visible: bool,
}

impl Default for ProductFormState {
    fn default() -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            cost: Decimal::ZERO,
            product_group_id: None,
            visible: true,
        }
    }
}

/// Frozen copy of the edit target's editable fields, captured when
/// editing starts and used only for diffing
#[derive(Debug, Clone, PartialEq)]
pub struct ProductSnapshot {
    pub entity_id: EntityId,
    pub title: String,
    pub description: String,
    pub cost: Decimal,
    pub product_group_id: Option<EntityId>,
    pub visible: bool,
    pub images: Vec<ProductImage>,
}

/// One displayed image reference during editing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RosterEntry {
    /// Already-stored image, tagged by its position in the snapshot's
    /// image collection
    Existing { name: String, url: String },
    /// Newly attached upload awaiting submission
    Pending { name: String },
}

impl RosterEntry {
    /// Positional tag for the snapshot image at `index`. This tag is the
    /// sole mechanism for detecting which original images survive.
    pub fn existing_tag(index: usize) -> String {
        format!("existing-image-{index}")
    }

    pub fn name(&self) -> &str {
        match self {
            RosterEntry::Existing { name, .. } => name,
            RosterEntry::Pending { name } => name,
        }
    }

    pub fn is_existing(&self) -> bool {
        matches!(self, RosterEntry::Existing { .. })
    }
}

/// Scalar fields whose current value differs from the snapshot
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductFieldChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub cost: Option<Decimal>,
    /// Outer option: changed at all; inner option: the new value.
    /// A cleared group stays in the change set but is never serialized.
    pub product_group_id: Option<Option<EntityId>>,
    pub visible: Option<bool>,
}

impl ProductFieldChanges {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.cost.is_none()
            && self.product_group_id.is_none()
            && self.visible.is_none()
    }
}

/// Result of diffing the form against the snapshot
#[derive(Debug, Clone, PartialEq)]
pub struct ProductChanges {
    pub fields: ProductFieldChanges,
    pub images_changed: bool,
}

/// Form reconciliation engine for products.
///
/// Owns the mutable draft state and the frozen snapshot for as long as
/// the form is open; the edit target itself is read from the store once
/// per `open` and never retained.
pub struct ProductForm {
    store: Arc<ProductStore>,
    notifier: Arc<dyn Notifier>,
    asset_origin: String,
    visible: bool,
    submitting: bool,
    state: ProductFormState,
    original: Option<ProductSnapshot>,
    roster: Vec<RosterEntry>,
    uploads: Vec<ImageUpload>,
}

impl ProductForm {
    pub fn new(
        store: Arc<ProductStore>,
        notifier: Arc<dyn Notifier>,
        asset_origin: impl Into<String>,
    ) -> Self {
        Self {
            store,
            notifier,
            asset_origin: asset_origin.into(),
            visible: false,
            submitting: false,
            state: ProductFormState::default(),
            original: None,
            roster: Vec::new(),
            uploads: Vec::new(),
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    /// Edit mode holds exactly while a snapshot exists
    pub fn is_edit(&self) -> bool {
        self.original.is_some()
    }

    pub fn state(&self) -> &ProductFormState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut ProductFormState {
        &mut self.state
    }

    pub fn snapshot(&self) -> Option<&ProductSnapshot> {
        self.original.as_ref()
    }

    pub fn roster(&self) -> &[RosterEntry] {
        &self.roster
    }

    pub fn uploads(&self) -> &[ImageUpload] {
        &self.uploads
    }

    /// Open the form against the store's current edit target.
    ///
    /// Visibility flips first; population happens after a single yield so
    /// anything bound to the visibility flag observes the transition
    /// before the field writes. Re-opening re-derives everything from the
    /// target as it is at call time.
    pub async fn open(&mut self) {
        self.visible = true;
        tokio::task::yield_now().await;

        match self.store.editing().await {
            None => {
                self.state = ProductFormState::default();
                self.uploads.clear();
                self.roster.clear();
                self.original = None;
            }
            Some(product) => {
                let snapshot = ProductSnapshot {
                    entity_id: product.id,
                    title: product.title.clone(),
                    description: product.description.clone(),
                    cost: product.cost,
                    product_group_id: product.group_id(),
                    visible: product.visible_or_default(),
                    images: product.images.clone(),
                };

                self.state = ProductFormState {
                    title: snapshot.title.clone(),
                    description: snapshot.description.clone(),
                    cost: snapshot.cost,
                    product_group_id: snapshot.product_group_id,
                    visible: snapshot.visible,
                };
                self.roster = snapshot
                    .images
                    .iter()
                    .enumerate()
                    .map(|(index, image)| RosterEntry::Existing {
                        name: RosterEntry::existing_tag(index),
                        url: format!("{}{}", self.asset_origin, image.path),
                    })
                    .collect();
                self.uploads.clear();
                self.original = Some(snapshot);
            }
        }
    }

    /// Close the form, discarding the snapshot and transient image data.
    /// Scalar fields keep their values until the next create-mode `open`.
    pub fn close(&mut self) {
        self.visible = false;
        self.uploads.clear();
        self.roster.clear();
        self.original = None;
    }

    /// Replace the pending uploads. Pending roster entries are rebuilt to
    /// mirror the new set; pre-existing entries are untouched.
    pub fn update_uploads(&mut self, files: Vec<ImageUpload>) {
        self.roster.retain(|entry| entry.is_existing());
        for file in &files {
            self.roster.push(RosterEntry::Pending {
                name: file.file_name.clone(),
            });
        }
        self.uploads = files;
    }

    /// Remove one roster entry by name. Removing a pending entry also
    /// drops its upload.
    pub fn remove_image(&mut self, name: &str) {
        let Some(position) = self.roster.iter().position(|entry| entry.name() == name) else {
            return;
        };
        let entry = self.roster.remove(position);
        if !entry.is_existing() {
            self.uploads.retain(|file| file.file_name != name);
        }
    }

    /// Validity gate, re-derived from current state on every call.
    /// Edit mode waives the image requirement.
    pub fn form_valid(&self) -> bool {
        !self.state.title.trim().is_empty()
            && self.state.cost > Decimal::ZERO
            && self.state.product_group_id.is_some()
            && (self.is_edit() || !self.uploads.is_empty())
    }

    /// Diff the form against the snapshot. `None` outside edit mode.
    ///
    /// `images_changed` is count-based: pending uploads exist, or the
    /// surviving pre-existing entries no longer match the snapshot's
    /// image count. A same-count substitution is not detected.
    pub fn changed_fields(&self) -> Option<ProductChanges> {
        let original = self.original.as_ref()?;

        let mut fields = ProductFieldChanges::default();
        if self.state.title != original.title {
            fields.title = Some(self.state.title.clone());
        }
        if self.state.description != original.description {
            fields.description = Some(self.state.description.clone());
        }
        if self.state.cost != original.cost {
            fields.cost = Some(self.state.cost);
        }
        if self.state.product_group_id != original.product_group_id {
            fields.product_group_id = Some(self.state.product_group_id);
        }
        if self.state.visible != original.visible {
            fields.visible = Some(self.state.visible);
        }

        let existing_count = self.roster.iter().filter(|e| e.is_existing()).count();
        let images_changed = !self.uploads.is_empty() || existing_count != original.images.len();

        Some(ProductChanges {
            fields,
            images_changed,
        })
    }

    /// Assemble the submission payload from the current state.
    ///
    /// Edit mode emits the identity plus changed fields only; create mode
    /// emits everything. The validity gate guarantees a selected group in
    /// create mode, so a missing one here is an invariant violation.
    pub fn build_payload(&self) -> CatalogResult<ProductPayload> {
        let mut payload = ProductPayload::new();

        if let (Some(original), Some(changes)) = (self.original.as_ref(), self.changed_fields()) {
            payload.push_text("id", original.entity_id.to_string());

            if let Some(title) = changes.fields.title {
                payload.push_text("title", title);
            }
            if let Some(description) = changes.fields.description {
                payload.push_text("description", description);
            }
            if let Some(cost) = changes.fields.cost {
                payload.push_text("cost", cost.to_string());
            }
            if let Some(group) = changes.fields.product_group_id {
                if let Some(group_id) = group {
                    payload.push_text("productGroupId", group_id.to_string());
                }
            }
            if let Some(visible) = changes.fields.visible {
                payload.push_text("visible", visible.to_string());
            }

            if changes.images_changed {
                if self.roster.is_empty() {
                    // sentinel: remove every stored image
                    payload.push_text("existingImages", "false");
                } else {
                    for (index, upload) in self.uploads.iter().enumerate() {
                        payload.push_file(format!("images[{index}]"), upload.clone());
                    }
                    let survivors = original.images.iter().enumerate().filter(|(index, _)| {
                        let tag = RosterEntry::existing_tag(*index);
                        self.roster.iter().any(|entry| entry.name() == tag)
                    });
                    for (slot, (_, image)) in survivors.enumerate() {
                        payload.push_text(format!("existingImages[{slot}]"), image.id.to_string());
                    }
                }
            }
        } else {
            let group_id = self.state.product_group_id.ok_or_else(|| {
                CatalogError::internal("product group missing from a validated create submission")
            })?;

            payload.push_text("title", self.state.title.clone());
            payload.push_text("description", self.state.description.clone());
            payload.push_text("cost", self.state.cost.to_string());
            payload.push_text("productGroupId", group_id.to_string());
            payload.push_text("visible", self.state.visible.to_string());
            for (index, upload) in self.uploads.iter().enumerate() {
                payload.push_file(format!("images[{index}]"), upload.clone());
            }
        }

        Ok(payload)
    }

    /// Gate, then assemble. Assembly failures are logged and become "no
    /// payload"; closing after a successful submit is the caller's job.
    pub fn handle_submit(&mut self) -> Option<ProductPayload> {
        if !self.form_valid() {
            self.notifier.warn("Please fill in all required fields");
            return None;
        }

        self.submitting = true;
        let result = self.build_payload();
        self.submitting = false;

        match result {
            Ok(payload) => Some(payload),
            Err(e) => {
                error!(error = %e, "form submission error");
                None
            }
        }
    }
}
