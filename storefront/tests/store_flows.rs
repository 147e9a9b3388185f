//! End-to-end flows through a real `Store` with in-memory gateways.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

use std::time::Duration;
use storefront::address::{AddressBook, AddressSelection};
use storefront::app::{AppAction, AppReducer, AppState};
use storefront::cart::CartAction;
use storefront::environment::StorefrontEnvironment;
use storefront::mocks::{MockObjectStorage, MockStorefront};
use storefront::profile::{AVATAR_UPLOAD_FAILED, AvatarFile, AvatarStatus, ProfileAction};
use storefront::types::{Address, AddressDraft, Cart, CartItem, ProductSnapshot, Role, User};
use storefront::view::{AddressForm, Classify, ViewBranch, cart_summary};
use storefront_core::crud::CrudAction;
use storefront_runtime::{RetryPolicy, Store};
use storefront_testing::test_clock;

type TestStore = Store<
    AppState,
    AppAction,
    StorefrontEnvironment<MockStorefront, MockObjectStorage>,
    AppReducer<MockStorefront, MockObjectStorage>,
>;

fn store(gateway: MockStorefront, storage: MockObjectStorage) -> TestStore {
    let env = StorefrontEnvironment::new(gateway, storage)
        .with_clock(test_clock())
        .with_avatar_retry(RetryPolicy::linear(3, Duration::ZERO));
    Store::new(AppState::default(), AppReducer::new(), env)
}

async fn dispatch(store: &TestStore, action: AppAction) {
    let mut handle = store.send(action).await.unwrap();
    handle
        .wait_with_timeout(Duration::from_secs(2))
        .await
        .unwrap();
}

fn address(id: &str, is_default: bool) -> Address {
    Address {
        id: id.to_string(),
        street: format!("{id} Main St"),
        city: "Springfield".to_string(),
        state: "IL".to_string(),
        country: "US".to_string(),
        zip_code: "62701".to_string(),
        mobile_no: "5550100".to_string(),
        is_default,
        user_id: Some("u1".to_string()),
    }
}

fn user() -> User {
    User {
        id: "u1".to_string(),
        name: "Ada".to_string(),
        email: "ada@example.com".to_string(),
        phone: None,
        role: Role::Customer,
        avatar: None,
    }
}

fn cart_with(quantity: u32, stock: u32) -> Cart {
    Cart {
        id: "cart-1".to_string(),
        user_id: Some("u1".to_string()),
        items: vec![CartItem {
            product: ProductSnapshot {
                id: "p1".to_string(),
                name: "Mug".to_string(),
                image: None,
                price: 12.5,
                discount: 0.0,
                stock,
            },
            quantity,
        }],
        total_price: 12.5 * f64::from(quantity),
    }
}

#[tokio::test]
async fn address_lifecycle_keeps_one_default() {
    let gateway = MockStorefront::new().with_addresses(vec![address("home", true)]);
    let store = store(gateway.clone(), MockObjectStorage::new());

    dispatch(&store, AppAction::Address(CrudAction::FetchAll)).await;
    assert_eq!(store.state(|s| s.addresses.len()).await, 1);

    // New default address: the old default is demoted first
    let form = AddressForm {
        street: "9 Office Rd".to_string(),
        city: "Springfield".to_string(),
        state: "IL".to_string(),
        country: "US".to_string(),
        zip_code: "62702".to_string(),
        mobile_no: "5550101".to_string(),
        is_default: true,
    };
    let draft: AddressDraft = form.validate().unwrap();
    let actions = store
        .state(|s| AddressBook::new(&s.addresses).save(None, draft))
        .await;
    assert_eq!(actions.len(), 2);
    for action in actions {
        dispatch(&store, AppAction::Address(action)).await;
    }

    let state = store.state(Clone::clone).await;
    assert_eq!(state.addresses.len(), 2);
    assert_eq!(state.addresses.message(), Some("Address created successfully"));
    let defaults: Vec<_> = state
        .addresses
        .entities
        .iter()
        .filter(|a| a.is_default)
        .map(|a| a.id.as_str())
        .collect();
    assert_eq!(defaults, vec!["addr-1"]);
    assert_eq!(
        gateway.calls(),
        vec![
            "GET /user/address/get/all",
            "PUT /user/address/update/:id",
            "POST /user/address/create",
        ]
    );

    // Checkout picks the default until the customer chooses another one
    assert_eq!(
        AddressSelection::new(&state.addresses).current().map(|a| a.id.as_str()),
        Some("addr-1")
    );
    let choose = AddressSelection::new(&state.addresses).choose("home").unwrap();
    dispatch(&store, AppAction::Address(choose)).await;
    let state = store.state(Clone::clone).await;
    assert_eq!(
        AddressSelection::new(&state.addresses).current().map(|a| a.id.as_str()),
        Some("home")
    );
    assert!(!state.addresses.find(&"home".to_string()).unwrap().is_default);

    // Deleting the selected address clears the selection
    dispatch(
        &store,
        AppAction::Address(CrudAction::Delete {
            id: "home".to_string(),
        }),
    )
    .await;
    let state = store.state(Clone::clone).await;
    assert!(state.addresses.find(&"home".to_string()).is_none());
    assert!(state.addresses.selected.is_none());
    assert_eq!(gateway.addresses().len(), 1);
}

#[tokio::test]
async fn pending_state_is_visible_while_request_is_in_flight() {
    let gateway = MockStorefront::new()
        .with_addresses(vec![address("home", true)])
        .with_latency(Duration::from_millis(50));
    let store = store(gateway, MockObjectStorage::new());

    let mut handle = store
        .send(AppAction::Address(CrudAction::FetchAll))
        .await
        .unwrap();
    assert_eq!(
        store.state(|s| s.addresses.view_branch()).await,
        ViewBranch::Loading
    );

    handle.wait().await;
    let state = store.state(Clone::clone).await;
    assert_eq!(state.addresses.view_branch(), ViewBranch::Populated);
    assert!(!state.addresses.is_loading());
}

#[tokio::test]
async fn rejected_request_keeps_entities_and_shows_server_message() {
    let gateway = MockStorefront::new().with_addresses(vec![address("home", true)]);
    let store = store(gateway.clone(), MockObjectStorage::new());
    dispatch(&store, AppAction::Address(CrudAction::FetchAll)).await;

    gateway.fail_next(Some("Address limit reached"));
    dispatch(
        &store,
        AppAction::Address(CrudAction::Create {
            draft: address("x", false).to_draft(),
        }),
    )
    .await;

    let state = store.state(Clone::clone).await;
    assert_eq!(state.addresses.len(), 1);
    assert_eq!(state.addresses.error(), Some("Address limit reached"));
    assert_eq!(
        state.addresses.view_branch(),
        ViewBranch::Error("Address limit reached".to_string())
    );
}

#[tokio::test]
async fn cart_guards_never_reach_the_server() {
    let gateway = MockStorefront::new().with_cart(cart_with(3, 3));
    let store = store(gateway.clone(), MockObjectStorage::new());
    dispatch(&store, AppAction::Cart(CartAction::Fetch)).await;

    dispatch(
        &store,
        AppAction::Cart(CartAction::IncreaseQuantity {
            product_id: "p1".to_string(),
        }),
    )
    .await;
    let state = store.state(Clone::clone).await;
    assert_eq!(state.cart.error(), Some("Only 3 left in stock"));
    assert_eq!(state.cart.quantity_of("p1"), Some(3));
    assert_eq!(gateway.calls(), vec!["GET /cart/get"]);

    dispatch(
        &store,
        AppAction::Cart(CartAction::DecreaseQuantity {
            product_id: "p1".to_string(),
        }),
    )
    .await;
    let state = store.state(Clone::clone).await;
    assert_eq!(state.cart.error(), None);
    assert_eq!(state.cart.quantity_of("p1"), Some(2));
    assert!((cart_summary(&state.cart).total - 25.0).abs() < f64::EPSILON);
    assert_eq!(gateway.calls(), vec!["GET /cart/get", "PUT /cart/update/item"]);
}

#[tokio::test]
async fn avatar_upload_failure_leaves_no_preview() {
    let gateway = MockStorefront::new().with_user(user());
    let storage = MockObjectStorage::new().failing(5);
    let store = store(gateway, storage.clone());
    dispatch(&store, AppAction::Profile(ProfileAction::Fetch)).await;

    let outcome = store
        .send_and_wait_for(
            AppAction::Profile(ProfileAction::UploadAvatar {
                file: AvatarFile::new("me.png", "image/png", vec![1, 2, 3]),
            }),
            |a| matches!(a, AppAction::Profile(ProfileAction::AvatarUploadFailed { .. })),
            Duration::from_secs(2),
        )
        .await
        .unwrap();
    assert!(matches!(outcome, AppAction::Profile(ProfileAction::AvatarUploadFailed { .. })));

    let state = store.state(Clone::clone).await;
    assert_eq!(state.profile.avatar.status, AvatarStatus::Failed);
    assert_eq!(state.profile.avatar.error.as_deref(), Some(AVATAR_UPLOAD_FAILED));
    assert!(state.profile.avatar.preview.is_none());
    assert_eq!(storage.attempts(), 3);
    assert_eq!(state.profile.user.and_then(|u| u.avatar), None);
}

#[tokio::test]
async fn avatar_upload_saves_url_on_profile() {
    let gateway = MockStorefront::new().with_user(user());
    let storage = MockObjectStorage::new().failing(1);
    let store = store(gateway, storage.clone());
    dispatch(&store, AppAction::Profile(ProfileAction::Fetch)).await;

    store
        .send_and_wait_for(
            AppAction::Profile(ProfileAction::UploadAvatar {
                file: AvatarFile::new("me.png", "image/png", vec![1, 2, 3]),
            }),
            |a| {
                matches!(
                    a,
                    AppAction::Profile(ProfileAction::Fulfilled { .. } | ProfileAction::Rejected { .. })
                )
            },
            Duration::from_secs(2),
        )
        .await
        .unwrap();

    let path = "avatars/u1/1735689600000-me.png";
    let state = store.state(Clone::clone).await;
    assert_eq!(state.profile.avatar.status, AvatarStatus::Uploaded);
    assert_eq!(
        state.profile.user.and_then(|u| u.avatar),
        Some(MockObjectStorage::public_url(path))
    );
    assert_eq!(storage.uploaded_paths(), vec![path.to_string()]);
}

#[tokio::test]
async fn avatar_handle_covers_the_profile_save() {
    let gateway = MockStorefront::new()
        .with_user(user())
        .with_latency(Duration::from_millis(50));
    let storage = MockObjectStorage::new().failing(1);
    let store = store(gateway.clone(), storage);
    dispatch(&store, AppAction::Profile(ProfileAction::Fetch)).await;

    let mut handle = store
        .send(AppAction::Profile(ProfileAction::UploadAvatar {
            file: AvatarFile::new("me.png", "image/png", vec![1, 2, 3]),
        }))
        .await
        .unwrap();
    handle
        .wait_with_timeout(Duration::from_secs(2))
        .await
        .unwrap();

    let state = store.state(Clone::clone).await;
    assert_eq!(state.profile.avatar.status, AvatarStatus::Uploaded);
    assert!(!state.profile.is_loading());
    assert_eq!(state.profile.message(), Some("Profile picture updated"));
    assert_eq!(handle.pending(), 0);
    assert_eq!(
        gateway.calls(),
        vec!["GET /user/profile", "PUT /user/profile/update"]
    );
}

#[tokio::test]
async fn sign_out_resets_every_slice() {
    let gateway = MockStorefront::new()
        .with_user(user())
        .with_cart(cart_with(1, 5))
        .with_addresses(vec![address("home", true)]);
    let store = store(gateway, MockObjectStorage::new());

    dispatch(&store, AppAction::Profile(ProfileAction::Fetch)).await;
    dispatch(&store, AppAction::Cart(CartAction::Fetch)).await;
    dispatch(&store, AppAction::Address(CrudAction::FetchAll)).await;
    dispatch(&store, AppAction::SignedOut).await;

    let state = store.state(Clone::clone).await;
    assert_eq!(state.profile.view_branch(), ViewBranch::Empty);
    assert_eq!(state.cart.view_branch(), ViewBranch::Empty);
    assert_eq!(state.addresses.view_branch(), ViewBranch::Empty);
}
