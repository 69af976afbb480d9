//! The assembled application root, from browsing to checkout.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use rust_decimal::Decimal;

use floa_core::{ProductId, ShoeSize};
use floa_integration_tests::{StaticCatalog, profiles, session_for};
use floa_storefront::app::{Storefront, StorefrontParts};
use floa_storefront::catalog::{CatalogQuery, PriceBand, ProductSelection, SelectionError};
use floa_storefront::checkout::{Checkout, CheckoutStep, DeliveryOption};
use floa_storefront::session::{ChannelSessionProvider, GuardDecision, RouteGuard};
use floa_storefront::storage::{FileStore, SharedStore};

fn storefront(store: SharedStore, sessions: Arc<ChannelSessionProvider>) -> Storefront {
    Storefront::assemble(StorefrontParts {
        store,
        catalog: Arc::new(StaticCatalog::sample()),
        profiles: profiles(),
        sessions,
    })
}

#[tokio::test]
async fn test_browse_select_and_check_out() {
    let dir = tempfile::tempdir().unwrap();
    let store: SharedStore = Arc::new(FileStore::open(dir.path().join("state.json")).unwrap());
    let mut app = storefront(store, Arc::new(ChannelSessionProvider::default()));

    let listing = app
        .catalog()
        .listing(&CatalogQuery::default().with_colour("rose"))
        .await;
    let ids: Vec<ProductId> = listing.products.iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![ProductId::new(1), ProductId::new(4)]);
    assert_eq!(listing.available_colours, vec!["Rose", "Sage"]);

    let cheap = app
        .catalog()
        .listing(&CatalogQuery::from_params(Some("kids"), None, None).with_price_band(PriceBand::UpTo100))
        .await;
    assert_eq!(cheap.products.len(), 1);
    assert_eq!(cheap.products[0].name, "Sprout Junior");

    let product = app.catalog().product(ProductId::new(1)).await.unwrap();
    let mut selection = ProductSelection::new(product);
    assert_eq!(
        selection.add_to_cart(app.cart_mut()),
        Err(SelectionError::MissingSize)
    );
    selection.select_size(ShoeSize::parse("38").unwrap());
    selection.add_to_cart(app.cart_mut()).unwrap();
    selection.add_to_cart(app.cart_mut()).unwrap();
    assert!(app.cart().is_preview_open());
    app.cart_mut().close_preview();

    assert!(app.favorites_mut().toggle(ProductId::new(4)));

    let mut checkout = Checkout::new();
    assert!(Checkout::can_proceed(app.cart()));
    checkout.next();
    checkout.form.delivery = DeliveryOption::Express;
    let summary = checkout.summary(app.cart());
    assert_eq!(summary.subtotal, Decimal::new(258, 0));
    assert_eq!(summary.total, Decimal::new(277, 0));
    assert_eq!(checkout.go_to(4), CheckoutStep::Confirmation);
}

#[tokio::test]
async fn test_restart_restores_cart_and_favorites() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");

    {
        let mut app = storefront(
            Arc::new(FileStore::open(&path).unwrap()),
            Arc::new(ChannelSessionProvider::default()),
        );
        let product = app.catalog().product(ProductId::new(2)).await.unwrap();
        let mut selection = ProductSelection::new(product);
        selection.select_size(ShoeSize::parse("42").unwrap());
        selection.add_to_cart(app.cart_mut()).unwrap();
        app.favorites_mut().toggle(ProductId::new(2));
    }

    let app = storefront(
        Arc::new(FileStore::open(&path).unwrap()),
        Arc::new(ChannelSessionProvider::default()),
    );
    assert_eq!(app.cart().total_quantity(), 1);
    assert_eq!(app.cart().total_price(), Decimal::new(145, 0));
    assert!(app.favorites().contains(ProductId::new(2)));
}

#[tokio::test]
async fn test_admin_route_waits_for_session() {
    let dir = tempfile::tempdir().unwrap();
    let store: SharedStore = Arc::new(FileStore::open(dir.path().join("state.json")).unwrap());
    let sessions = Arc::new(ChannelSessionProvider::new(Some(session_for(
        "customer@floa.shop",
        None,
    ))));
    let app = storefront(store, sessions);

    let view = app.session().ready().await;
    assert!(view.is_logged_in);
    assert_eq!(app.guard(RouteGuard::signed_in()), GuardDecision::Render);
    assert_eq!(app.guard(RouteGuard::admin()), GuardDecision::Redirect("/"));

    let user_id = session_for("new@floa.shop", None).user.id;
    app.register_profile(user_id).await.unwrap();
}
