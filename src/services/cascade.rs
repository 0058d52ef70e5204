//! Cascade orchestrator
//!
//! Guarantees that any event invalidating a product's integrity also
//! refreshes the owning seller's credibility: PIS is computed and its write
//! made visible before SCS reads the seller's products, and both updates
//! happen under a per-seller lock so two cascades touching the same seller
//! cannot interleave partial writes. Direct seller events (dispute updates)
//! take the same lock but skip the PIS recomputation.
//!
//! With deterministic signal providers every operation here is a pure
//! function of current persisted state, so repeating a call with no
//! intervening data change yields the same score.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use dashmap::DashMap;
use tokio::sync::Mutex;
use validator::Validate;

use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::models::{
    CascadeOutcome, DisputeRateUpdate, NewReturn, NewReview, OrderItemId, OrderItemStatus,
    ProductId, ScoreUpdate, SellerId, SessionLog, UserId,
};
use crate::signals::{resolve_signal, SignalSet, TEXT_RISK_FALLBACK};
use crate::store::TrustStore;

use super::{PisEngine, ScsEngine, UbaEngine};

pub struct CascadeOrchestrator {
    store: Arc<dyn TrustStore>,
    signals: SignalSet,
    uba: Arc<UbaEngine>,
    pis: Arc<PisEngine>,
    scs: Arc<ScsEngine>,
    seller_locks: DashMap<SellerId, Arc<Mutex<()>>>,
    signal_timeout: Duration,
}

impl CascadeOrchestrator {
    pub fn new(
        store: Arc<dyn TrustStore>,
        signals: SignalSet,
        uba: Arc<UbaEngine>,
        pis: Arc<PisEngine>,
        scs: Arc<ScsEngine>,
        config: &EngineConfig,
    ) -> Self {
        Self {
            store,
            signals,
            uba,
            pis,
            scs,
            seller_locks: DashMap::new(),
            signal_timeout: config.signal_timeout,
        }
    }

    fn seller_lock(&self, seller_id: SellerId) -> Arc<Mutex<()>> {
        self.seller_locks
            .entry(seller_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Resolve a product to its owning seller, failing with `NotFound` when
    /// either is absent. Every entry point that will eventually cascade calls
    /// this before its first write, so an orphaned product cannot leave a
    /// partial mutation behind.
    async fn resolve_product_owner(&self, product_id: ProductId) -> EngineResult<SellerId> {
        let product = self
            .store
            .get_product(product_id)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("product {product_id}")))?;
        let seller_id = product.seller_id;
        self.store
            .get_seller(seller_id)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("seller {seller_id}")))?;
        Ok(seller_id)
    }

    // ------------------------------------------------------------------
    // Public recompute operations
    // ------------------------------------------------------------------

    /// Recompute a user's UBA score. Concurrent recomputations for the same
    /// user are last-write-wins; the computation is a deterministic function
    /// of current state.
    pub async fn recompute_uba(&self, user_id: UserId) -> EngineResult<ScoreUpdate> {
        self.uba.compute_uba(user_id).await
    }

    /// Recompute a product's PIS, then the owning seller's SCS.
    ///
    /// The seller is resolved before any write so an unknown seller aborts
    /// the whole operation with no mutation. SCS runs strictly after the PIS
    /// write is visible, which is what makes its average-PIS factor read the
    /// fresh value.
    pub async fn recompute_pis_and_cascade(
        &self,
        product_id: ProductId,
    ) -> EngineResult<CascadeOutcome> {
        let seller_id = self.resolve_product_owner(product_id).await?;

        let lock = self.seller_lock(seller_id);
        let _guard = lock.lock().await;

        let pis = self.pis.compute_pis(product_id).await?;
        let scs = self.scs.compute_scs(seller_id).await?;

        tracing::info!(
            product_id,
            seller_id,
            pis_score = pis.score,
            scs_score = scs.score,
            "PIS cascade completed"
        );
        Ok(CascadeOutcome { pis, scs })
    }

    /// Recompute a seller's SCS without touching any product score
    pub async fn recompute_scs(&self, seller_id: SellerId) -> EngineResult<ScoreUpdate> {
        let lock = self.seller_lock(seller_id);
        let _guard = lock.lock().await;
        self.scs.compute_scs(seller_id).await
    }

    // ------------------------------------------------------------------
    // Marketplace event entry points
    // ------------------------------------------------------------------

    /// A buyer posted a review: persist it, refresh the author's UBA, then
    /// cascade PIS -> SCS for the reviewed product.
    pub async fn on_review_posted(&self, review: NewReview) -> EngineResult<CascadeOutcome> {
        review.validate()?;
        self.store
            .get_user(review.user_id)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("user {}", review.user_id)))?;
        self.resolve_product_owner(review.product_id).await?;

        let text_risk = resolve_signal(
            self.signals.text.analyze_text_risk(&review.review_text),
            self.signal_timeout,
            TEXT_RISK_FALLBACK,
            "text_risk",
        )
        .await;

        let user_id = review.user_id;
        let product_id = review.product_id;
        self.store
            .insert_review(review, Utc::now(), 1.0 - text_risk)
            .await?;

        self.uba.compute_uba(user_id).await?;
        self.recompute_pis_and_cascade(product_id).await
    }

    /// An item came back: persist the return, mark the item, refresh the
    /// returning user's UBA, then cascade for the item's product.
    pub async fn on_item_returned(&self, ret: NewReturn) -> EngineResult<CascadeOutcome> {
        ret.validate()?;
        let item = self
            .store
            .get_order_item(ret.order_item_id)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("order item {}", ret.order_item_id)))?;

        let user_id = ret.user_id;
        self.store
            .get_user(user_id)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("user {user_id}")))?;
        self.resolve_product_owner(item.product_id).await?;

        self.store.insert_return(ret, Utc::now()).await?;
        self.store
            .set_order_item_status(item.id, OrderItemStatus::Returned)
            .await?;

        self.uba.compute_uba(user_id).await?;
        self.recompute_pis_and_cascade(item.product_id).await
    }

    /// An order item changed status (delivered, cancelled, refunded...):
    /// cascade for its product.
    pub async fn on_order_item_status(
        &self,
        order_item_id: OrderItemId,
        status: OrderItemStatus,
    ) -> EngineResult<CascadeOutcome> {
        let item = self
            .store
            .get_order_item(order_item_id)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("order item {order_item_id}")))?;
        self.resolve_product_owner(item.product_id).await?;

        self.store
            .set_order_item_status(order_item_id, status)
            .await?;
        self.recompute_pis_and_cascade(item.product_id).await
    }

    /// The seller's dispute rate changed: write it and refresh SCS only.
    /// Runs under the seller lock so it cannot interleave with a cascade.
    pub async fn on_dispute_rate_updated(
        &self,
        update: DisputeRateUpdate,
    ) -> EngineResult<ScoreUpdate> {
        update.validate()?;

        let lock = self.seller_lock(update.seller_id);
        let _guard = lock.lock().await;

        self.store
            .set_dispute_rate(update.seller_id, update.rate)
            .await?;
        self.scs.compute_scs(update.seller_id).await
    }

    /// A user session was observed: persist it for the IP-consistency factor
    /// of later UBA computations. Sessions alone trigger no recomputation.
    pub async fn on_session_recorded(&self, log: SessionLog) -> EngineResult<()> {
        self.store
            .get_user(log.user_id)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("user {}", log.user_id)))?;
        self.store.insert_session_log(log).await
    }
}
