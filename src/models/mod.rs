//! Data models for the trust scoring engine
//!
//! Root entities (User, Seller, Product) are addressed by integer identity and
//! related through id lookups on the repository, never through embedded object
//! pointers. Score fields are mutable outputs owned exclusively by their
//! engine: `uba_score` by the UBA engine, `pis_score` by the PIS engine and
//! `scs_score` by the SCS engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

pub type UserId = i64;
pub type SellerId = i64;
pub type ProductId = i64;
pub type OrderId = i64;
pub type OrderItemId = i64;
pub type ReviewId = i64;
pub type ReturnId = i64;

/// Marketplace buyer / reviewer
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub created_at: DateTime<Utc>,
    /// Fraction of profile fields filled in, 0.0-1.0
    pub profile_completeness_score: f64,
    /// User Behavior & Anomaly score, 0.0-1.0. None until first computed.
    pub uba_score: Option<f64>,
    pub last_uba_update: Option<DateTime<Utc>>,
}

/// Seller account
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Seller {
    pub id: SellerId,
    pub created_at: DateTime<Utc>,
    /// Externally maintained dispute / chargeback rate, 0.0-1.0
    pub dispute_rate: f64,
    /// Seller Credibility Score, 0.0-1.0. None until first computed.
    pub scs_score: Option<f64>,
    pub last_scs_update: Option<DateTime<Utc>>,
}

/// Product listing, owned by a seller
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Product {
    pub id: ProductId,
    pub seller_id: SellerId,
    pub description: String,
    pub price: f64,
    pub category: String,
    /// Ordered image URLs, possibly empty
    pub image_urls: Vec<String>,
    /// Product Integrity Score, 0.0-1.0. None until first computed.
    pub pis_score: Option<f64>,
    pub last_pis_update: Option<DateTime<Utc>>,
}

/// Product review
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Review {
    pub id: ReviewId,
    pub user_id: UserId,
    pub product_id: ProductId,
    /// Star rating, 1-5
    pub rating: i32,
    pub review_text: String,
    pub created_at: DateTime<Utc>,
    pub is_verified_purchase: bool,
    /// Derived from the text-risk analyzer when the review is posted
    pub linguistic_authenticity_score: Option<f64>,
}

/// Purchase order header
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
}

/// Order line item
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub status: OrderItemStatus,
    pub delivered_on_time: bool,
    pub cancelled_by_seller: bool,
    pub price_at_purchase: f64,
}

/// Order item lifecycle status
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OrderItemStatus {
    Pending,
    Delivered,
    Cancelled,
    Returned,
    Refunded,
    RefundRejected,
}

/// Product return record, linked to an order item
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Return {
    pub id: ReturnId,
    pub order_item_id: OrderItemId,
    pub user_id: UserId,
    pub reason_category: ReturnReason,
    pub reason_text: String,
    pub created_at: DateTime<Utc>,
}

/// Closed set of return reasons. Counterfeit, Fake and NotAsDescribed are
/// integrity-related and carry extra weight in the return-ratio factors.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReturnReason {
    Counterfeit,
    Fake,
    NotAsDescribed,
    Damaged,
    Other,
}

impl ReturnReason {
    pub fn is_integrity_related(&self) -> bool {
        matches!(
            self,
            ReturnReason::Counterfeit | ReturnReason::Fake | ReturnReason::NotAsDescribed
        )
    }
}

/// Login / browsing session, used for IP-churn and proxy-risk signals
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SessionLog {
    pub user_id: UserId,
    pub ip_address: String,
    pub timestamp: DateTime<Utc>,
}

// ============================================================================
// Operation inputs and outputs
// ============================================================================

/// A freshly persisted score with its update timestamp
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct ScoreUpdate {
    pub score: f64,
    pub updated_at: DateTime<Utc>,
}

/// Result of a PIS recomputation and its SCS cascade
#[derive(Debug, Serialize, Deserialize, Clone, Copy)]
pub struct CascadeOutcome {
    pub pis: ScoreUpdate,
    pub scs: ScoreUpdate,
}

/// Incoming review, validated before any mutation
#[derive(Debug, Deserialize, Validate, Clone)]
pub struct NewReview {
    pub user_id: UserId,
    pub product_id: ProductId,
    #[validate(range(min = 1, max = 5))]
    pub rating: i32,
    pub review_text: String,
    pub is_verified_purchase: bool,
}

/// Incoming return, validated before any mutation
#[derive(Debug, Deserialize, Validate, Clone)]
pub struct NewReturn {
    pub order_item_id: OrderItemId,
    pub user_id: UserId,
    pub reason_category: ReturnReason,
    #[validate(length(max = 2000))]
    pub reason_text: String,
}

/// Dispute rate update for a seller
#[derive(Debug, Deserialize, Validate, Clone, Copy)]
pub struct DisputeRateUpdate {
    pub seller_id: SellerId,
    #[validate(range(min = 0.0, max = 1.0))]
    pub rate: f64,
}
