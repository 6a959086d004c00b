use std::sync::Arc;

use crate::notify::Notifier;
use crate::payload::ProductGroupPayload;
use crate::stores::ProductGroupStore;
use crate::types::EntityId;

/// Editable fields of the product-group form
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupFormState {
    pub title: String,
    pub priority: i64,
}

/// Frozen copy of the edit target, captured when editing starts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupSnapshot {
    pub entity_id: EntityId,
    pub title: String,
    pub priority: i64,
}

/// Fields whose current value differs from the snapshot
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupFieldChanges {
    pub title: Option<String>,
    pub priority: Option<i64>,
}

impl GroupFieldChanges {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.priority.is_none()
    }
}

/// Form reconciliation engine for product groups.
///
/// The simpler sibling of the product form: no image roster, and a
/// no-op edit short-circuits with an informational notice instead of a
/// payload.
pub struct ProductGroupForm {
    store: Arc<ProductGroupStore>,
    notifier: Arc<dyn Notifier>,
    visible: bool,
    submitting: bool,
    state: GroupFormState,
    original: Option<GroupSnapshot>,
}

impl ProductGroupForm {
    pub fn new(store: Arc<ProductGroupStore>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            store,
            notifier,
            visible: false,
            submitting: false,
            state: GroupFormState::default(),
            original: None,
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub fn is_edit(&self) -> bool {
        self.original.is_some()
    }

    pub fn state(&self) -> &GroupFormState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut GroupFormState {
        &mut self.state
    }

    pub fn snapshot(&self) -> Option<&GroupSnapshot> {
        self.original.as_ref()
    }

    /// Open the form against the store's current edit target. Visibility
    /// flips before the single yield, population happens after it.
    pub async fn open(&mut self) {
        self.visible = true;
        tokio::task::yield_now().await;

        match self.store.editing().await {
            None => {
                self.state = GroupFormState::default();
                self.original = None;
            }
            Some(group) => {
                self.state = GroupFormState {
                    title: group.title.clone(),
                    priority: group.priority,
                };
                self.original = Some(GroupSnapshot {
                    entity_id: group.id,
                    title: group.title,
                    priority: group.priority,
                });
            }
        }
    }

    /// Close the form, discarding the snapshot. Fields keep their values
    /// until the next create-mode `open`.
    pub fn close(&mut self) {
        self.visible = false;
        self.original = None;
    }

    /// Validity gate. Priority is a plain integer here, so the original
    /// "must be defined" conjunct holds by construction.
    pub fn form_valid(&self) -> bool {
        !self.state.title.trim().is_empty()
    }

    /// Diff the form against the snapshot. `None` outside edit mode, and
    /// `None` when nothing changed.
    pub fn changed_fields(&self) -> Option<GroupFieldChanges> {
        let original = self.original.as_ref()?;

        let mut changes = GroupFieldChanges::default();
        if self.state.title != original.title {
            changes.title = Some(self.state.title.clone());
        }
        if self.state.priority != original.priority {
            changes.priority = Some(self.state.priority);
        }

        if changes.is_empty() {
            None
        } else {
            Some(changes)
        }
    }

    /// Gate, then assemble. Edit mode sends only the changed fields plus
    /// the identity; a no-op edit raises an informational notice and
    /// yields no payload. Create mode sends the full form state.
    pub fn handle_submit(&mut self) -> Option<ProductGroupPayload> {
        if !self.form_valid() {
            self.notifier.warn("Please fill in all required fields");
            return None;
        }

        self.submitting = true;
        let payload = match &self.original {
            Some(original) => match self.changed_fields() {
                Some(changes) => Some(ProductGroupPayload {
                    id: Some(original.entity_id),
                    title: changes.title,
                    priority: changes.priority,
                }),
                None => {
                    self.notifier.info("No changes to save");
                    None
                }
            },
            None => Some(ProductGroupPayload {
                id: None,
                title: Some(self.state.title.clone()),
                priority: Some(self.state.priority),
            }),
        };
        self.submitting = false;

        payload
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::MockCatalogApi;
    use crate::notify::RecordingNotifier;
    use crate::types::ProductGroup;
    use pretty_assertions::assert_eq;

    fn tea_group() -> ProductGroup {
        ProductGroup {
            id: 5,
            title: "Tea".to_string(),
            priority: 7,
            products: None,
        }
    }

    struct Harness {
        form: ProductGroupForm,
        notifier: Arc<RecordingNotifier>,
        store: Arc<ProductGroupStore>,
    }

    async fn harness(target: Option<ProductGroup>) -> Harness {
        let api = Arc::new(MockCatalogApi::new());
        let store = Arc::new(ProductGroupStore::new(api));
        store.set_edit_mode(target).await;
        let notifier = Arc::new(RecordingNotifier::new());
        let form = ProductGroupForm::new(store.clone(), notifier.clone());
        Harness {
            form,
            notifier,
            store,
        }
    }

    #[tokio::test]
    async fn test_open_create_mode_resets() {
        let mut h = harness(None).await;
        h.form.state_mut().title = "stale".to_string();
        h.form.state_mut().priority = 9;

        h.form.open().await;
        assert!(h.form.is_visible());
        assert!(!h.form.is_edit());
        assert_eq!(h.form.state(), &GroupFormState::default());
    }

    #[tokio::test]
    async fn test_open_edit_mode_captures_snapshot() {
        let mut h = harness(Some(tea_group())).await;
        h.form.open().await;

        assert!(h.form.is_edit());
        assert_eq!(h.form.state().title, "Tea");
        assert_eq!(h.form.state().priority, 7);
        assert_eq!(h.form.snapshot().unwrap().entity_id, 5);
    }

    #[tokio::test]
    async fn test_open_rederives_from_current_target() {
        let mut h = harness(Some(tea_group())).await;
        h.form.open().await;

        h.store.set_edit_mode(None).await;
        h.form.open().await;
        assert!(!h.form.is_edit());
        assert_eq!(h.form.state(), &GroupFormState::default());
    }

    #[tokio::test]
    async fn test_changed_fields_none_when_unchanged() {
        let mut h = harness(Some(tea_group())).await;
        h.form.open().await;
        assert_eq!(h.form.changed_fields(), None);
    }

    #[tokio::test]
    async fn test_changed_fields_partial_diff() {
        let mut h = harness(Some(tea_group())).await;
        h.form.open().await;
        h.form.state_mut().priority = 12;

        let changes = h.form.changed_fields().unwrap();
        assert_eq!(changes.title, None);
        assert_eq!(changes.priority, Some(12));
    }

    #[tokio::test]
    async fn test_noop_edit_raises_info_notice() {
        let mut h = harness(Some(tea_group())).await;
        h.form.open().await;

        let payload = h.form.handle_submit();
        assert!(payload.is_none());
        assert_eq!(h.notifier.infos(), vec!["No changes to save".to_string()]);
        assert!(h.notifier.warnings().is_empty());
        assert!(!h.form.is_submitting());
    }

    #[tokio::test]
    async fn test_edit_submit_merges_changes_with_identity() {
        let mut h = harness(Some(tea_group())).await;
        h.form.open().await;
        h.form.state_mut().title = "Herbal Tea".to_string();

        let payload = h.form.handle_submit().expect("payload expected");
        assert_eq!(
            payload,
            ProductGroupPayload {
                id: Some(5),
                title: Some("Herbal Tea".to_string()),
                priority: None,
            }
        );
    }

    #[tokio::test]
    async fn test_create_submit_sends_full_state() {
        let mut h = harness(None).await;
        h.form.open().await;
        h.form.state_mut().title = "Bakery".to_string();
        h.form.state_mut().priority = 3;

        let payload = h.form.handle_submit().expect("payload expected");
        assert_eq!(
            payload,
            ProductGroupPayload {
                id: None,
                title: Some("Bakery".to_string()),
                priority: Some(3),
            }
        );
    }

    #[tokio::test]
    async fn test_zero_priority_counts_as_defined() {
        let mut h = harness(None).await;
        h.form.open().await;
        h.form.state_mut().title = "Merch".to_string();
        assert_eq!(h.form.state().priority, 0);
        assert!(h.form.form_valid());

        let payload = h.form.handle_submit().expect("payload expected");
        assert_eq!(payload.priority, Some(0));
    }

    #[tokio::test]
    async fn test_blank_title_warns() {
        let mut h = harness(None).await;
        h.form.open().await;
        h.form.state_mut().title = "   ".to_string();

        let payload = h.form.handle_submit();
        assert!(payload.is_none());
        assert_eq!(
            h.notifier.warnings(),
            vec!["Please fill in all required fields".to_string()]
        );
    }

    #[tokio::test]
    async fn test_close_discards_snapshot_keeps_fields() {
        let mut h = harness(Some(tea_group())).await;
        h.form.open().await;
        h.form.state_mut().title = "Edited".to_string();

        h.form.close();
        assert!(!h.form.is_visible());
        assert!(!h.form.is_edit());
        assert_eq!(h.form.changed_fields(), None);
        assert_eq!(h.form.state().title, "Edited");
    }
}
