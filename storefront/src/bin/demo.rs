//! Storefront client demo
//!
//! Loads the catalog, the cart, the saved addresses and the profile from a
//! running storefront API and prints what each screen would render.
//!
//! # Usage
//!
//! ```bash
//! STOREFRONT_API_URL=http://localhost:8000/api/v1 cargo run --bin storefront-demo
//! ```

use anyhow::Context;
use storefront::address::AddressSelection;
use storefront::app::{AppAction, AppReducer, AppState};
use storefront::cart::CartAction;
use storefront::catalog::CatalogAction;
use storefront::environment::StorefrontEnvironment;
use storefront::gateway::{HttpAvatarStorage, HttpGateway};
use storefront::profile::ProfileAction;
use storefront::view::{Classify, ViewBranch, cart_summary};
use storefront_api::{ApiClient, ApiConfig};
use storefront_core::crud::CrudAction;
use storefront_runtime::Store;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,storefront=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ApiConfig::from_env().context("invalid storefront configuration")?;
    tracing::info!(base_url = %config.base_url, "starting storefront demo");

    let client = ApiClient::new(&config).context("failed to build HTTP client")?;
    let storage = HttpAvatarStorage::from_config(&config).context("failed to build storage client")?;
    let env = StorefrontEnvironment::new(HttpGateway::new(client), storage);
    let store = Store::new(AppState::default(), AppReducer::new(), env);

    let requests = [
        AppAction::Catalog(CatalogAction::FetchAll),
        AppAction::Cart(CartAction::Fetch),
        AppAction::Address(CrudAction::FetchAll),
        AppAction::Profile(ProfileAction::Fetch),
    ];

    let mut handles = Vec::with_capacity(requests.len());
    for action in requests {
        handles.push(store.send(action).await?);
    }
    for handle in &mut handles {
        handle.wait().await;
    }

    let state = store.state(Clone::clone).await;

    report("catalog", &state.catalog.view_branch());
    for product in &state.catalog.entities {
        println!("  {:<40} {:>8.2}", product.name, product.final_price());
    }

    report("cart", &state.cart.view_branch());
    let summary = cart_summary(&state.cart);
    for row in &summary.rows {
        println!("  {:<34} x{:<3} {:>8.2}", row.name, row.quantity, row.subtotal);
    }
    println!("  {} item(s), total {:.2}", summary.item_count, summary.total);

    report("addresses", &state.addresses.view_branch());
    if let Some(address) = AddressSelection::new(&state.addresses).current() {
        println!("  ship to: {}", address.one_line());
    }

    report("profile", &state.profile.view_branch());
    if let Some(user) = &state.profile.user {
        println!("  signed in as {} <{}>", user.name, user.email);
    }

    store
        .shutdown(std::time::Duration::from_secs(5))
        .await
        .context("store did not shut down cleanly")?;

    Ok(())
}

fn report(screen: &str, branch: &ViewBranch) {
    match branch {
        ViewBranch::Loading => println!("{screen}: loading"),
        ViewBranch::Error(message) => println!("{screen}: error: {message}"),
        ViewBranch::Empty => println!("{screen}: nothing here yet"),
        ViewBranch::Populated => println!("{screen}:"),
    }
}
