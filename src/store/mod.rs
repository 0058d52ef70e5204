//! Repository interface for the scoring engines
//!
//! Engines read entity state and write scores exclusively through
//! [`TrustStore`], keeping relations as id-based lookups. Every read reflects
//! the current persisted state as of the call; nothing is cached across
//! calls. Score writes carry the score and its update timestamp together so
//! the pair is persisted atomically.

pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::EngineResult;
use crate::models::{
    NewReturn, NewReview, OrderItem, OrderItemId, OrderItemStatus, Product, ProductId, Return,
    Review, Seller, SellerId, SessionLog, User, UserId,
};

pub use memory::InMemoryStore;

#[async_trait]
pub trait TrustStore: Send + Sync {
    // ------------------------------------------------------------------
    // Entity lookups
    // ------------------------------------------------------------------

    async fn get_user(&self, id: UserId) -> EngineResult<Option<User>>;

    async fn get_seller(&self, id: SellerId) -> EngineResult<Option<Seller>>;

    async fn get_product(&self, id: ProductId) -> EngineResult<Option<Product>>;

    async fn get_order_item(&self, id: OrderItemId) -> EngineResult<Option<OrderItem>>;

    async fn products_by_seller(&self, seller_id: SellerId) -> EngineResult<Vec<Product>>;

    /// Prices of same-category listings, excluding the given product
    async fn category_peer_prices(
        &self,
        category: &str,
        exclude: ProductId,
    ) -> EngineResult<Vec<f64>>;

    // ------------------------------------------------------------------
    // Review queries
    // ------------------------------------------------------------------

    async fn reviews_by_product(&self, product_id: ProductId) -> EngineResult<Vec<Review>>;

    /// All reviews across every product of the seller
    async fn reviews_by_seller(&self, seller_id: SellerId) -> EngineResult<Vec<Review>>;

    /// The user's most recent reviews, newest first
    async fn recent_reviews_by_user(
        &self,
        user_id: UserId,
        limit: usize,
    ) -> EngineResult<Vec<Review>>;

    async fn count_reviews_by_user_since(
        &self,
        user_id: UserId,
        since: DateTime<Utc>,
    ) -> EngineResult<usize>;

    // ------------------------------------------------------------------
    // Session / order / return queries
    // ------------------------------------------------------------------

    /// Distinct source IPs from the user's sessions in the window
    async fn session_ips_since(
        &self,
        user_id: UserId,
        since: DateTime<Utc>,
    ) -> EngineResult<Vec<String>>;

    async fn count_order_items_by_user(&self, user_id: UserId) -> EngineResult<usize>;

    async fn count_order_items_by_product(&self, product_id: ProductId) -> EngineResult<usize>;

    async fn order_items_by_seller(&self, seller_id: SellerId) -> EngineResult<Vec<OrderItem>>;

    /// Order items of the seller whose order was placed in [from, to)
    async fn count_seller_sales_between(
        &self,
        seller_id: SellerId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> EngineResult<usize>;

    async fn returns_by_user(&self, user_id: UserId) -> EngineResult<Vec<Return>>;

    async fn count_integrity_returns_by_product(
        &self,
        product_id: ProductId,
    ) -> EngineResult<usize>;

    // ------------------------------------------------------------------
    // Score writes (score + timestamp, atomically)
    // ------------------------------------------------------------------

    async fn put_uba_score(
        &self,
        user_id: UserId,
        score: f64,
        updated_at: DateTime<Utc>,
    ) -> EngineResult<()>;

    async fn put_pis_score(
        &self,
        product_id: ProductId,
        score: f64,
        updated_at: DateTime<Utc>,
    ) -> EngineResult<()>;

    async fn put_scs_score(
        &self,
        seller_id: SellerId,
        score: f64,
        updated_at: DateTime<Utc>,
    ) -> EngineResult<()>;

    // ------------------------------------------------------------------
    // Event writes
    // ------------------------------------------------------------------

    async fn insert_review(
        &self,
        review: NewReview,
        created_at: DateTime<Utc>,
        linguistic_authenticity_score: f64,
    ) -> EngineResult<Review>;

    async fn insert_return(
        &self,
        ret: NewReturn,
        created_at: DateTime<Utc>,
    ) -> EngineResult<Return>;

    async fn set_order_item_status(
        &self,
        order_item_id: OrderItemId,
        status: OrderItemStatus,
    ) -> EngineResult<()>;

    async fn set_dispute_rate(&self, seller_id: SellerId, rate: f64) -> EngineResult<()>;

    async fn insert_session_log(&self, log: SessionLog) -> EngineResult<()>;
}
