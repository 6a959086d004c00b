//! End-to-end editing flows: console wiring, store edit targets, form
//! reconciliation, and cache maintenance over the mock transport.

use std::sync::Arc;

use pretty_assertions::assert_eq;
use rust_decimal::Decimal;

use coffeecamp_admin::{
    AdminConsole, AdminConsoleBuilder, ImageUpload, MockCatalogApi, Product, ProductGroup,
    ProductImage, RecordingNotifier, Route,
};

fn coffee_group() -> ProductGroup {
    ProductGroup {
        id: 1,
        title: "Coffee".to_string(),
        priority: 10,
        products: None,
    }
}

fn latte() -> Product {
    Product {
        id: 3,
        title: "Latte".to_string(),
        description: "with milk".to_string(),
        cost: Decimal::new(500, 2),
        images: vec![
            ProductImage {
                id: 21,
                path: "/uploads/latte-1.jpg".to_string(),
            },
            ProductImage {
                id: 22,
                path: "/uploads/latte-2.jpg".to_string(),
            },
            ProductImage {
                id: 23,
                path: "/uploads/latte-3.jpg".to_string(),
            },
        ],
        product_group: Some(coffee_group()),
        visible: Some(true),
    }
}

fn console_with(api: Arc<MockCatalogApi>, notifier: Arc<RecordingNotifier>) -> AdminConsole {
    AdminConsoleBuilder::new()
        .with_api(api)
        .with_notifier(notifier)
        .build()
        .expect("console should build")
}

#[tokio::test]
async fn product_edit_flow_sends_diff_and_updates_cache() {
    let api = Arc::new(
        MockCatalogApi::new()
            .with_groups(vec![coffee_group()])
            .with_products(vec![latte()]),
    );
    let notifier = Arc::new(RecordingNotifier::new());
    let console = console_with(api.clone(), notifier);

    let products = console.products();
    products.fetch_products().await;
    products.set_edit_mode(Some(latte())).await;

    let mut form = console.product_form();
    form.open().await;
    form.state_mut().cost = Decimal::new(600, 2);

    let payload = form.handle_submit().expect("payload expected");
    let target = form.snapshot().expect("edit mode").entity_id;
    let updated = products
        .edit_product(target, payload)
        .await
        .expect("update should succeed");
    form.close();

    assert_eq!(updated.cost, Decimal::new(600, 2));
    let cached = products.products().await;
    assert_eq!(cached[0].cost, Decimal::new(600, 2));

    // the wire payload held exactly the identity and the one diff
    let sent = api.product_payloads();
    assert_eq!(sent.len(), 1);
    let (target, payload) = &sent[0];
    assert_eq!(*target, Some(3));
    let keys: Vec<&str> = payload.keys().collect();
    assert_eq!(keys, vec!["id", "cost"]);
    assert_eq!(payload.text("cost"), Some("6.00"));
}

#[tokio::test]
async fn image_removal_flow_keeps_survivors_in_original_order() {
    let api = Arc::new(MockCatalogApi::new().with_products(vec![latte()]));
    let notifier = Arc::new(RecordingNotifier::new());
    let console = console_with(api.clone(), notifier);

    let products = console.products();
    products.fetch_products().await;
    products.set_edit_mode(Some(latte())).await;

    let mut form = console.product_form();
    form.open().await;
    form.remove_image("existing-image-1");

    let payload = form.handle_submit().expect("payload expected");
    let updated = products
        .edit_product(3, payload)
        .await
        .expect("update should succeed");

    let ids: Vec<i64> = updated.images.iter().map(|image| image.id).collect();
    assert_eq!(ids, vec![21, 23]);
}

#[tokio::test]
async fn remove_all_images_flow_clears_the_entity() {
    let api = Arc::new(MockCatalogApi::new().with_products(vec![latte()]));
    let notifier = Arc::new(RecordingNotifier::new());
    let console = console_with(api.clone(), notifier);

    let products = console.products();
    products.fetch_products().await;
    products.set_edit_mode(Some(latte())).await;

    let mut form = console.product_form();
    form.open().await;
    for tag in ["existing-image-0", "existing-image-1", "existing-image-2"] {
        form.remove_image(tag);
    }

    let payload = form.handle_submit().expect("payload expected");
    assert_eq!(payload.text("existingImages"), Some("false"));

    let updated = products
        .edit_product(3, payload)
        .await
        .expect("update should succeed");
    assert!(updated.images.is_empty());
}

#[tokio::test]
async fn product_create_flow_appends_to_cache() {
    let api = Arc::new(MockCatalogApi::new().with_groups(vec![coffee_group()]));
    let notifier = Arc::new(RecordingNotifier::new());
    let console = console_with(api.clone(), notifier);

    let products = console.products();
    products.set_edit_mode(None).await;

    let mut form = console.product_form();
    form.open().await;
    form.state_mut().title = "Raf".to_string();
    form.state_mut().description = "sweet".to_string();
    form.state_mut().cost = Decimal::new(450, 2);
    form.state_mut().product_group_id = Some(1);
    form.update_uploads(vec![
        ImageUpload::new("raf-1.jpg", "image/jpeg", vec![1]),
        ImageUpload::new("raf-2.jpg", "image/jpeg", vec![2]),
    ]);

    let payload = form.handle_submit().expect("payload expected");
    let created = products
        .add_product(payload)
        .await
        .expect("create should succeed");
    form.close();

    assert_eq!(created.title, "Raf");
    assert_eq!(created.images.len(), 2);
    assert_eq!(created.group_id(), Some(1));
    assert_eq!(products.products().await.len(), 1);
}

#[tokio::test]
async fn group_noop_edit_raises_info_and_sends_nothing() {
    let api = Arc::new(MockCatalogApi::new().with_groups(vec![coffee_group()]));
    let notifier = Arc::new(RecordingNotifier::new());
    let console = console_with(api.clone(), notifier.clone());

    let groups = console.product_groups();
    groups.fetch_groups().await;
    groups.set_edit_mode(Some(coffee_group())).await;

    let mut form = console.product_group_form();
    form.open().await;

    let payload = form.handle_submit();
    assert!(payload.is_none());
    assert_eq!(notifier.infos(), vec!["No changes to save".to_string()]);
    assert!(notifier.warnings().is_empty());
    assert!(api.group_payloads().is_empty());
}

#[tokio::test]
async fn group_edit_flow_sends_changes_with_identity() {
    let api = Arc::new(MockCatalogApi::new().with_groups(vec![coffee_group()]));
    let notifier = Arc::new(RecordingNotifier::new());
    let console = console_with(api.clone(), notifier);

    let groups = console.product_groups();
    groups.fetch_groups().await;
    groups.set_edit_mode(Some(coffee_group())).await;

    let mut form = console.product_group_form();
    form.open().await;
    form.state_mut().priority = 20;

    let payload = form.handle_submit().expect("payload expected");
    assert_eq!(payload.id, Some(1));
    assert_eq!(payload.title, None);
    assert_eq!(payload.priority, Some(20));

    let updated = groups
        .edit_group(1, &payload)
        .await
        .expect("update should succeed");
    assert_eq!(updated.priority, 20);
    assert_eq!(groups.groups().await[0].priority, 20);
}

#[tokio::test]
async fn login_then_guard_reaches_the_dashboard() {
    let api = Arc::new(MockCatalogApi::new());
    let notifier = Arc::new(RecordingNotifier::new());
    let console = console_with(api, notifier);

    let guard = console.guard();
    assert_eq!(guard.resolve(Route::Dashboard).await, Route::Login);

    let logged_in = console
        .auth()
        .login(&coffeecamp_admin::LoginCredentials::new("admin", "secret"))
        .await;
    assert!(logged_in);
    assert_eq!(guard.resolve(Route::Login).await, Route::Dashboard);
}

#[tokio::test]
async fn reopening_after_target_switch_drops_stale_state() {
    let api = Arc::new(MockCatalogApi::new().with_products(vec![latte()]));
    let notifier = Arc::new(RecordingNotifier::new());
    let console = console_with(api, notifier);

    let products = console.products();
    products.set_edit_mode(Some(latte())).await;

    let mut form = console.product_form();
    form.open().await;
    form.state_mut().title = "stale edit".to_string();
    form.update_uploads(vec![ImageUpload::new("stale.jpg", "image/jpeg", vec![1])]);

    products.set_edit_mode(None).await;
    form.open().await;

    assert!(!form.is_edit());
    assert_eq!(form.state().title, "");
    assert!(form.uploads().is_empty());
    assert!(form.roster().is_empty());
}
