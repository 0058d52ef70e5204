//! Demo binary for the trust scoring engine
//!
//! Seeds an in-memory marketplace, runs each public recompute operation once
//! and prints the resulting scores. The surrounding system (API layer, real
//! persistence) is expected to embed [`veritrade_engine::AppState`] the same
//! way.

use std::sync::Arc;

use anyhow::Context;
use chrono::{Duration, Utc};

use veritrade_engine::config::EngineConfig;
use veritrade_engine::models::{
    NewReview, Order, OrderItem, OrderItemStatus, Product, Seller, SessionLog, User,
};
use veritrade_engine::signals::SignalSet;
use veritrade_engine::store::InMemoryStore;
use veritrade_engine::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = EngineConfig::from_env().context("failed to load configuration")?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
        )
        .with_target(true)
        .init();

    let store = Arc::new(seed_marketplace());
    let state = AppState::new(store, SignalSet::deterministic(), config);

    let uba = state.orchestrator.recompute_uba(1).await?;
    tracing::info!(user_id = 1, score = uba.score, "recompute_uba");

    let cascade = state.orchestrator.recompute_pis_and_cascade(10).await?;
    tracing::info!(
        product_id = 10,
        pis = cascade.pis.score,
        scs = cascade.scs.score,
        "recompute_pis_and_cascade"
    );

    let scs = state.orchestrator.recompute_scs(100).await?;
    tracing::info!(seller_id = 100, score = scs.score, "recompute_scs");

    let outcome = state
        .orchestrator
        .on_review_posted(NewReview {
            user_id: 1,
            product_id: 10,
            rating: 4,
            review_text: "I think the fabric feels quite sturdy, though the zipper is a bit stiff"
                .to_string(),
            is_verified_purchase: true,
        })
        .await?;
    tracing::info!(
        pis = outcome.pis.score,
        scs = outcome.scs.score,
        "on_review_posted cascade"
    );

    println!("{}", serde_json::to_string_pretty(&cascade)?);
    Ok(())
}

fn seed_marketplace() -> InMemoryStore {
    let store = InMemoryStore::new();
    let now = Utc::now();

    store.seed_user(User {
        id: 1,
        email: "maria@example.com".to_string(),
        created_at: now - Duration::days(400),
        profile_completeness_score: 0.9,
        uba_score: None,
        last_uba_update: None,
    });
    store.seed_seller(Seller {
        id: 100,
        created_at: now - Duration::days(700),
        dispute_rate: 0.01,
        scs_score: None,
        last_scs_update: None,
    });
    store.seed_product(Product {
        id: 10,
        seller_id: 100,
        description: "A waxed canvas field jacket with a quilted liner, brass hardware, \
                      four bellows pockets and an adjustable storm hood for wet weather"
            .to_string(),
        price: 120.0,
        category: "outerwear".to_string(),
        image_urls: vec!["https://cdn.example-store.com/p/10/front.jpg".to_string()],
        pis_score: None,
        last_pis_update: None,
    });
    store.seed_product(Product {
        id: 11,
        seller_id: 100,
        description: "A lightweight packable rain shell with taped seams, pit zips and a \
                      two-way front zipper, sized for layering over a fleece"
            .to_string(),
        price: 95.0,
        category: "outerwear".to_string(),
        image_urls: vec!["https://cdn.example-store.com/p/11/front.jpg".to_string()],
        pis_score: None,
        last_pis_update: None,
    });

    store.seed_order(Order {
        id: 1000,
        user_id: 1,
        created_at: now - Duration::days(20),
    });
    for (item_id, product_id) in [(1, 10), (2, 10), (3, 11), (4, 11)] {
        store.seed_order_item(OrderItem {
            id: item_id,
            order_id: 1000,
            product_id,
            status: OrderItemStatus::Delivered,
            delivered_on_time: true,
            cancelled_by_seller: false,
            price_at_purchase: 110.0,
        });
    }

    store.seed_session(SessionLog {
        user_id: 1,
        ip_address: "93.184.216.34".to_string(),
        timestamp: now - Duration::days(2),
    });

    store
}
