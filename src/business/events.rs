use crate::config::Settings;
use crate::domain::{OrderId, OrderStatus};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// An order's status field changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderStatusChanged {
    pub order_id: OrderId,
    pub previous: OrderStatus,
    pub current: OrderStatus,
}

impl OrderStatusChanged {
    pub fn new(order_id: OrderId, previous: OrderStatus, current: OrderStatus) -> Self {
        Self {
            order_id,
            previous,
            current,
        }
    }

    /// A move into `completed` from any other status.
    pub fn is_completion(&self) -> bool {
        self.current == OrderStatus::Completed && self.previous != OrderStatus::Completed
    }
}

/// Receives order lifecycle events.
///
/// Subscribers run inside the request that changed the order and get the
/// settings snapshot taken for that request.
#[async_trait]
pub trait OrderEventSubscriber: Send + Sync {
    fn name(&self) -> &'static str;

    async fn on_status_changed(&self, event: &OrderStatusChanged, settings: &Settings);
}

/// Fans events out to subscribers in registration order
#[derive(Default, Clone)]
pub struct EventDispatcher {
    subscribers: Vec<Arc<dyn OrderEventSubscriber>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, subscriber: Arc<dyn OrderEventSubscriber>) {
        debug!("Registered order event subscriber: {}", subscriber.name());
        self.subscribers.push(subscriber);
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    pub async fn dispatch(&self, event: &OrderStatusChanged, settings: &Settings) {
        debug!(
            order_id = event.order_id,
            from = %event.previous,
            to = %event.current,
            "Dispatching order status change"
        );
        for subscriber in &self.subscribers {
            subscriber.on_status_changed(event, settings).await;
        }
    }
}
