//! In-memory arena implementation of [`TrustStore`]
//!
//! Root entities live in id-keyed maps behind a single `RwLock`, so each
//! store call observes and mutates a consistent snapshot. Intended for the
//! demo binary and the test suites; a durable backend would implement the
//! same trait.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use crate::error::{EngineError, EngineResult};
use crate::models::{
    NewReturn, NewReview, Order, OrderId, OrderItem, OrderItemId, OrderItemStatus, Product,
    ProductId, Return, ReturnId, Review, ReviewId, Seller, SellerId, SessionLog, User, UserId,
};

use super::TrustStore;

#[derive(Default)]
struct Tables {
    users: HashMap<UserId, User>,
    sellers: HashMap<SellerId, Seller>,
    products: HashMap<ProductId, Product>,
    orders: HashMap<OrderId, Order>,
    order_items: HashMap<OrderItemId, OrderItem>,
    reviews: HashMap<ReviewId, Review>,
    returns: HashMap<ReturnId, Return>,
    sessions: Vec<SessionLog>,
}

#[derive(Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
    next_review_id: AtomicI64,
    next_return_id: AtomicI64,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
            next_review_id: AtomicI64::new(1),
            next_return_id: AtomicI64::new(1),
        }
    }

    fn bump(counter: &AtomicI64, seen_id: i64) {
        counter.fetch_max(seen_id + 1, Ordering::SeqCst);
    }

    // Seeding helpers for the demo binary and tests. Entities carry their own
    // ids so fixtures stay readable.

    pub fn seed_user(&self, user: User) {
        self.tables.write().users.insert(user.id, user);
    }

    pub fn seed_seller(&self, seller: Seller) {
        self.tables.write().sellers.insert(seller.id, seller);
    }

    pub fn seed_product(&self, product: Product) {
        self.tables.write().products.insert(product.id, product);
    }

    pub fn seed_order(&self, order: Order) {
        self.tables.write().orders.insert(order.id, order);
    }

    pub fn seed_order_item(&self, item: OrderItem) {
        self.tables.write().order_items.insert(item.id, item);
    }

    pub fn seed_review(&self, review: Review) {
        Self::bump(&self.next_review_id, review.id);
        self.tables.write().reviews.insert(review.id, review);
    }

    pub fn seed_return(&self, ret: Return) {
        Self::bump(&self.next_return_id, ret.id);
        self.tables.write().returns.insert(ret.id, ret);
    }

    pub fn seed_session(&self, log: SessionLog) {
        self.tables.write().sessions.push(log);
    }
}

#[async_trait]
impl TrustStore for InMemoryStore {
    async fn get_user(&self, id: UserId) -> EngineResult<Option<User>> {
        Ok(self.tables.read().users.get(&id).cloned())
    }

    async fn get_seller(&self, id: SellerId) -> EngineResult<Option<Seller>> {
        Ok(self.tables.read().sellers.get(&id).cloned())
    }

    async fn get_product(&self, id: ProductId) -> EngineResult<Option<Product>> {
        Ok(self.tables.read().products.get(&id).cloned())
    }

    async fn get_order_item(&self, id: OrderItemId) -> EngineResult<Option<OrderItem>> {
        Ok(self.tables.read().order_items.get(&id).cloned())
    }

    async fn products_by_seller(&self, seller_id: SellerId) -> EngineResult<Vec<Product>> {
        let tables = self.tables.read();
        let mut products: Vec<Product> = tables
            .products
            .values()
            .filter(|p| p.seller_id == seller_id)
            .cloned()
            .collect();
        products.sort_by_key(|p| p.id);
        Ok(products)
    }

    async fn category_peer_prices(
        &self,
        category: &str,
        exclude: ProductId,
    ) -> EngineResult<Vec<f64>> {
        let tables = self.tables.read();
        Ok(tables
            .products
            .values()
            .filter(|p| p.category == category && p.id != exclude)
            .map(|p| p.price)
            .collect())
    }

    async fn reviews_by_product(&self, product_id: ProductId) -> EngineResult<Vec<Review>> {
        let tables = self.tables.read();
        let mut reviews: Vec<Review> = tables
            .reviews
            .values()
            .filter(|r| r.product_id == product_id)
            .cloned()
            .collect();
        reviews.sort_by_key(|r| r.id);
        Ok(reviews)
    }

    async fn reviews_by_seller(&self, seller_id: SellerId) -> EngineResult<Vec<Review>> {
        let tables = self.tables.read();
        let seller_products: HashSet<ProductId> = tables
            .products
            .values()
            .filter(|p| p.seller_id == seller_id)
            .map(|p| p.id)
            .collect();
        let mut reviews: Vec<Review> = tables
            .reviews
            .values()
            .filter(|r| seller_products.contains(&r.product_id))
            .cloned()
            .collect();
        reviews.sort_by_key(|r| r.id);
        Ok(reviews)
    }

    async fn recent_reviews_by_user(
        &self,
        user_id: UserId,
        limit: usize,
    ) -> EngineResult<Vec<Review>> {
        let tables = self.tables.read();
        let mut reviews: Vec<Review> = tables
            .reviews
            .values()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        reviews.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        reviews.truncate(limit);
        Ok(reviews)
    }

    async fn count_reviews_by_user_since(
        &self,
        user_id: UserId,
        since: DateTime<Utc>,
    ) -> EngineResult<usize> {
        let tables = self.tables.read();
        Ok(tables
            .reviews
            .values()
            .filter(|r| r.user_id == user_id && r.created_at >= since)
            .count())
    }

    async fn session_ips_since(
        &self,
        user_id: UserId,
        since: DateTime<Utc>,
    ) -> EngineResult<Vec<String>> {
        let tables = self.tables.read();
        let mut seen = HashSet::new();
        let mut ips = Vec::new();
        for log in &tables.sessions {
            if log.user_id == user_id && log.timestamp >= since && seen.insert(log.ip_address.clone())
            {
                ips.push(log.ip_address.clone());
            }
        }
        Ok(ips)
    }

    async fn count_order_items_by_user(&self, user_id: UserId) -> EngineResult<usize> {
        let tables = self.tables.read();
        let user_orders: HashSet<OrderId> = tables
            .orders
            .values()
            .filter(|o| o.user_id == user_id)
            .map(|o| o.id)
            .collect();
        Ok(tables
            .order_items
            .values()
            .filter(|i| user_orders.contains(&i.order_id))
            .count())
    }

    async fn count_order_items_by_product(&self, product_id: ProductId) -> EngineResult<usize> {
        let tables = self.tables.read();
        Ok(tables
            .order_items
            .values()
            .filter(|i| i.product_id == product_id)
            .count())
    }

    async fn order_items_by_seller(&self, seller_id: SellerId) -> EngineResult<Vec<OrderItem>> {
        let tables = self.tables.read();
        let seller_products: HashSet<ProductId> = tables
            .products
            .values()
            .filter(|p| p.seller_id == seller_id)
            .map(|p| p.id)
            .collect();
        let mut items: Vec<OrderItem> = tables
            .order_items
            .values()
            .filter(|i| seller_products.contains(&i.product_id))
            .cloned()
            .collect();
        items.sort_by_key(|i| i.id);
        Ok(items)
    }

    async fn count_seller_sales_between(
        &self,
        seller_id: SellerId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> EngineResult<usize> {
        let tables = self.tables.read();
        let seller_products: HashSet<ProductId> = tables
            .products
            .values()
            .filter(|p| p.seller_id == seller_id)
            .map(|p| p.id)
            .collect();
        Ok(tables
            .order_items
            .values()
            .filter(|i| seller_products.contains(&i.product_id))
            .filter(|i| {
                tables
                    .orders
                    .get(&i.order_id)
                    .map(|o| o.created_at >= from && o.created_at < to)
                    .unwrap_or(false)
            })
            .count())
    }

    async fn returns_by_user(&self, user_id: UserId) -> EngineResult<Vec<Return>> {
        let tables = self.tables.read();
        let mut returns: Vec<Return> = tables
            .returns
            .values()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        returns.sort_by_key(|r| r.id);
        Ok(returns)
    }

    async fn count_integrity_returns_by_product(
        &self,
        product_id: ProductId,
    ) -> EngineResult<usize> {
        let tables = self.tables.read();
        Ok(tables
            .returns
            .values()
            .filter(|r| r.reason_category.is_integrity_related())
            .filter(|r| {
                tables
                    .order_items
                    .get(&r.order_item_id)
                    .map(|i| i.product_id == product_id)
                    .unwrap_or(false)
            })
            .count())
    }

    async fn put_uba_score(
        &self,
        user_id: UserId,
        score: f64,
        updated_at: DateTime<Utc>,
    ) -> EngineResult<()> {
        let mut tables = self.tables.write();
        let user = tables
            .users
            .get_mut(&user_id)
            .ok_or_else(|| EngineError::NotFound(format!("user {user_id}")))?;
        user.uba_score = Some(score);
        user.last_uba_update = Some(updated_at);
        Ok(())
    }

    async fn put_pis_score(
        &self,
        product_id: ProductId,
        score: f64,
        updated_at: DateTime<Utc>,
    ) -> EngineResult<()> {
        let mut tables = self.tables.write();
        let product = tables
            .products
            .get_mut(&product_id)
            .ok_or_else(|| EngineError::NotFound(format!("product {product_id}")))?;
        product.pis_score = Some(score);
        product.last_pis_update = Some(updated_at);
        Ok(())
    }

    async fn put_scs_score(
        &self,
        seller_id: SellerId,
        score: f64,
        updated_at: DateTime<Utc>,
    ) -> EngineResult<()> {
        let mut tables = self.tables.write();
        let seller = tables
            .sellers
            .get_mut(&seller_id)
            .ok_or_else(|| EngineError::NotFound(format!("seller {seller_id}")))?;
        seller.scs_score = Some(score);
        seller.last_scs_update = Some(updated_at);
        Ok(())
    }

    async fn insert_review(
        &self,
        review: NewReview,
        created_at: DateTime<Utc>,
        linguistic_authenticity_score: f64,
    ) -> EngineResult<Review> {
        let mut tables = self.tables.write();
        if !tables.users.contains_key(&review.user_id) {
            return Err(EngineError::NotFound(format!("user {}", review.user_id)));
        }
        if !tables.products.contains_key(&review.product_id) {
            return Err(EngineError::NotFound(format!(
                "product {}",
                review.product_id
            )));
        }

        let id = self.next_review_id.fetch_add(1, Ordering::SeqCst);
        let stored = Review {
            id,
            user_id: review.user_id,
            product_id: review.product_id,
            rating: review.rating,
            review_text: review.review_text,
            created_at,
            is_verified_purchase: review.is_verified_purchase,
            linguistic_authenticity_score: Some(linguistic_authenticity_score),
        };
        tables.reviews.insert(id, stored.clone());
        Ok(stored)
    }

    async fn insert_return(
        &self,
        ret: NewReturn,
        created_at: DateTime<Utc>,
    ) -> EngineResult<Return> {
        let mut tables = self.tables.write();
        if !tables.order_items.contains_key(&ret.order_item_id) {
            return Err(EngineError::NotFound(format!(
                "order item {}",
                ret.order_item_id
            )));
        }

        let id = self.next_return_id.fetch_add(1, Ordering::SeqCst);
        let stored = Return {
            id,
            order_item_id: ret.order_item_id,
            user_id: ret.user_id,
            reason_category: ret.reason_category,
            reason_text: ret.reason_text,
            created_at,
        };
        tables.returns.insert(id, stored.clone());
        Ok(stored)
    }

    async fn set_order_item_status(
        &self,
        order_item_id: OrderItemId,
        status: OrderItemStatus,
    ) -> EngineResult<()> {
        let mut tables = self.tables.write();
        let item = tables
            .order_items
            .get_mut(&order_item_id)
            .ok_or_else(|| EngineError::NotFound(format!("order item {order_item_id}")))?;
        item.status = status;
        Ok(())
    }

    async fn set_dispute_rate(&self, seller_id: SellerId, rate: f64) -> EngineResult<()> {
        let mut tables = self.tables.write();
        let seller = tables
            .sellers
            .get_mut(&seller_id)
            .ok_or_else(|| EngineError::NotFound(format!("seller {seller_id}")))?;
        seller.dispute_rate = rate;
        Ok(())
    }

    async fn insert_session_log(&self, log: SessionLog) -> EngineResult<()> {
        self.tables.write().sessions.push(log);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn user(id: UserId) -> User {
        User {
            id,
            email: format!("user{id}@example.com"),
            created_at: Utc::now() - Duration::days(100),
            profile_completeness_score: 1.0,
            uba_score: None,
            last_uba_update: None,
        }
    }

    #[tokio::test]
    async fn test_score_and_timestamp_written_together() {
        let store = InMemoryStore::new();
        store.seed_user(user(1));

        let ts = Utc::now();
        store.put_uba_score(1, 0.42, ts).await.unwrap();

        let stored = store.get_user(1).await.unwrap().unwrap();
        assert_eq!(stored.uba_score, Some(0.42));
        assert_eq!(stored.last_uba_update, Some(ts));
    }

    #[tokio::test]
    async fn test_put_score_unknown_entity() {
        let store = InMemoryStore::new();
        let err = store.put_uba_score(99, 0.5, Utc::now()).await.unwrap_err();
        assert_eq!(err.error_code(), "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_recent_reviews_ordering() {
        let store = InMemoryStore::new();
        store.seed_user(user(1));
        let now = Utc::now();
        for (id, days_ago) in [(1, 30), (2, 3), (3, 10)] {
            store.seed_review(Review {
                id,
                user_id: 1,
                product_id: 1,
                rating: 4,
                review_text: "ok".to_string(),
                created_at: now - Duration::days(days_ago),
                is_verified_purchase: true,
                linguistic_authenticity_score: None,
            });
        }

        let recent = store.recent_reviews_by_user(1, 2).await.unwrap();
        let ids: Vec<_> = recent.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![2, 3]);
    }

    #[tokio::test]
    async fn test_session_ips_distinct_within_window() {
        let store = InMemoryStore::new();
        let now = Utc::now();
        for (ip, days_ago) in [
            ("10.0.0.1", 1),
            ("10.0.0.1", 2),
            ("10.0.0.2", 5),
            ("10.0.0.3", 45),
        ] {
            store.seed_session(SessionLog {
                user_id: 1,
                ip_address: ip.to_string(),
                timestamp: now - Duration::days(days_ago),
            });
        }

        let ips = store
            .session_ips_since(1, now - Duration::days(30))
            .await
            .unwrap();
        assert_eq!(ips.len(), 2);
        assert!(!ips.contains(&"10.0.0.3".to_string()));
    }

    #[tokio::test]
    async fn test_insert_review_allocates_after_seeded_ids() {
        let store = InMemoryStore::new();
        store.seed_user(user(1));
        store.seed_product(Product {
            id: 7,
            seller_id: 1,
            description: "desc".to_string(),
            price: 10.0,
            category: "misc".to_string(),
            image_urls: vec![],
            pis_score: None,
            last_pis_update: None,
        });
        store.seed_review(Review {
            id: 40,
            user_id: 1,
            product_id: 7,
            rating: 5,
            review_text: "seeded".to_string(),
            created_at: Utc::now(),
            is_verified_purchase: false,
            linguistic_authenticity_score: None,
        });

        let inserted = store
            .insert_review(
                NewReview {
                    user_id: 1,
                    product_id: 7,
                    rating: 3,
                    review_text: "new".to_string(),
                    is_verified_purchase: true,
                },
                Utc::now(),
                0.8,
            )
            .await
            .unwrap();
        assert!(inserted.id > 40);
    }
}
