use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use tokio::sync::RwLock;

use crate::domain::{Order, OrderId, OrderStatus};

/// In-memory order records, standing in for the commerce host's tables.
pub struct OrderStore {
    orders: RwLock<HashMap<OrderId, Order>>,
    next_id: AtomicU64,
}

impl OrderStore {
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    /// Store whose first assigned order id is `first_id`.
    pub fn starting_at(first_id: OrderId) -> Self {
        Self {
            orders: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(first_id),
        }
    }

    pub async fn create(&self, status: OrderStatus, billing_email: String) -> Order {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let order = Order::new(id, status, billing_email);
        self.orders.write().await.insert(id, order.clone());
        order
    }

    /// Insert or replace an order under its own id.
    pub async fn insert(&self, order: Order) {
        self.next_id.fetch_max(order.id + 1, Ordering::SeqCst);
        self.orders.write().await.insert(order.id, order);
    }

    pub async fn get(&self, id: OrderId) -> Option<Order> {
        self.orders.read().await.get(&id).cloned()
    }

    /// Apply `f` to the stored order under the write lock.
    pub async fn update<F, R>(&self, id: OrderId, f: F) -> Option<R>
    where
        F: FnOnce(&mut Order) -> R,
    {
        let mut orders = self.orders.write().await;
        let order = orders.get_mut(&id)?;
        Some(f(order))
    }

    /// Set the status, returning the one it replaced.
    pub async fn set_status(&self, id: OrderId, status: OrderStatus) -> Option<OrderStatus> {
        self.update(id, |order| {
            let previous = order.status;
            order.status = status;
            order.updated_at = Utc::now();
            previous
        })
        .await
    }

    pub async fn add_note(&self, id: OrderId, note: impl Into<String>) -> bool {
        let note = note.into();
        self.update(id, move |order| order.add_note(note))
            .await
            .is_some()
    }

    pub async fn set_meta(&self, id: OrderId, key: &str, value: impl Into<String>) -> bool {
        let value = value.into();
        self.update(id, move |order| order.set_meta(key, value))
            .await
            .is_some()
    }
}

impl Default for OrderStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::CONNECTION_COMPLETED_KEY;

    #[tokio::test]
    async fn test_create_assigns_sequential_ids() {
        let store = OrderStore::starting_at(500);
        let first = store.create(OrderStatus::Pending, "a@b.com".to_string()).await;
        let second = store.create(OrderStatus::Pending, "c@d.com".to_string()).await;

        assert_eq!(first.id, 500);
        assert_eq!(second.id, 501);
        assert_eq!(store.get(501).await.unwrap().billing_email, "c@d.com");
    }

    #[tokio::test]
    async fn test_insert_advances_sequence() {
        let store = OrderStore::new();
        store
            .insert(Order::new(41, OrderStatus::Processing, String::new()))
            .await;

        let next = store.create(OrderStatus::Pending, String::new()).await;
        assert_eq!(next.id, 42);
    }

    #[tokio::test]
    async fn test_set_status_returns_previous() {
        let store = OrderStore::new();
        let order = store.create(OrderStatus::Pending, String::new()).await;

        let previous = store.set_status(order.id, OrderStatus::Completed).await;

        assert_eq!(previous, Some(OrderStatus::Pending));
        assert_eq!(store.get(order.id).await.unwrap().status, OrderStatus::Completed);
        assert_eq!(store.set_status(999, OrderStatus::Completed).await, None);
    }

    #[tokio::test]
    async fn test_notes_and_meta() {
        let store = OrderStore::new();
        let order = store.create(OrderStatus::Pending, String::new()).await;

        assert!(store.add_note(order.id, "first").await);
        assert!(store.set_meta(order.id, CONNECTION_COMPLETED_KEY, "1").await);
        assert!(!store.add_note(999, "nobody").await);

        let stored = store.get(order.id).await.unwrap();
        assert_eq!(stored.notes.len(), 1);
        assert!(stored.connection_completed());
    }
}
