use crate::business::{
    CustomerResolver, EventDispatcher, OrderFieldValidator, OrderStatusChanged,
};
use crate::config::{Settings, SettingsStore};
use crate::domain::{
    ChallengeFields, Order, OrderId, OrderStatus, OrderStore, BRAND_ID, CHALLENGE_PRICING_ID,
    CONNECTION_COMPLETED_KEY, STAGE_ID, USER_EMAIL,
};
use crate::domain::{CreateOrderRequest, UpdateOrderRequest};
use crate::error::AppError;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Order lifecycle as seen through the REST surface: field registration,
/// customer binding and status-change dispatch.
pub struct OrderService {
    orders: Arc<OrderStore>,
    settings: Arc<SettingsStore>,
    validator: OrderFieldValidator,
    resolver: CustomerResolver,
    dispatcher: EventDispatcher,
}

impl OrderService {
    pub fn new(
        orders: Arc<OrderStore>,
        settings: Arc<SettingsStore>,
        resolver: CustomerResolver,
        dispatcher: EventDispatcher,
    ) -> Self {
        Self {
            orders,
            settings,
            validator: OrderFieldValidator::new(),
            resolver,
            dispatcher,
        }
    }

    /// Create an order:
    /// 1. Validate the partner fields
    /// 2. Store the order and initialise its completion flag
    /// 3. Save the sanitized fields
    /// 4. Bind or create the customer for the billing email
    /// 5. Dispatch the move from `pending` to the requested status, if any
    pub async fn create_order(&self, request: CreateOrderRequest) -> Result<Order, AppError> {
        let settings = self.settings.snapshot().await;

        let fields = if settings.enabled {
            Some(self.validator.validate(request.fields())?)
        } else {
            None
        };

        let billing_email = request
            .billing_email
            .as_deref()
            .map(str::trim)
            .unwrap_or_default()
            .to_string();
        let order = self.orders.create(OrderStatus::Pending, billing_email).await;
        info!("Created order {}", order.id);

        if let Some(fields) = fields {
            self.orders
                .set_meta(order.id, CONNECTION_COMPLETED_KEY, "0")
                .await;
            self.save_fields(order.id, fields).await;
            self.bind_customer(order.id, &order.billing_email).await;
        }

        let status = request.status.unwrap_or(OrderStatus::Pending);
        if status != OrderStatus::Pending {
            self.transition(order.id, status, &settings).await?;
        }

        self.get_order(order.id).await
    }

    /// Update fields, billing email and/or status of an existing order.
    pub async fn update_order(
        &self,
        order_id: OrderId,
        request: UpdateOrderRequest,
    ) -> Result<Order, AppError> {
        let settings = self.settings.snapshot().await;
        let existing = self.get_order(order_id).await?;

        let fields = if settings.enabled {
            Some(self.validator.validate(request.fields())?)
        } else {
            None
        };

        let billing_email = match request.billing_email.as_deref() {
            Some(email) => {
                let email = email.trim().to_string();
                self.orders
                    .update(order_id, |order| order.billing_email = email.clone())
                    .await;
                email
            }
            None => existing.billing_email,
        };

        if let Some(fields) = fields {
            self.save_fields(order_id, fields).await;
            if existing.customer_id.is_none() || request.billing_email.is_some() {
                self.bind_customer(order_id, &billing_email).await;
            }
        }

        if let Some(status) = request.status {
            self.transition(order_id, status, &settings).await?;
        }

        self.get_order(order_id).await
    }

    pub async fn change_status(
        &self,
        order_id: OrderId,
        status: OrderStatus,
    ) -> Result<Order, AppError> {
        let settings = self.settings.snapshot().await;
        self.transition(order_id, status, &settings).await?;
        self.get_order(order_id).await
    }

    pub async fn get_order(&self, order_id: OrderId) -> Result<Order, AppError> {
        self.orders
            .get(order_id)
            .await
            .ok_or_else(|| AppError::NotFound(format!("Order {} not found", order_id)))
    }

    /// Every metadata entry stored on the order
    pub async fn order_meta(&self, order_id: OrderId) -> Result<BTreeMap<String, String>, AppError> {
        Ok(self.get_order(order_id).await?.meta)
    }

    async fn transition(
        &self,
        order_id: OrderId,
        status: OrderStatus,
        settings: &Settings,
    ) -> Result<(), AppError> {
        let previous = self
            .orders
            .set_status(order_id, status)
            .await
            .ok_or_else(|| AppError::NotFound(format!("Order {} not found", order_id)))?;

        if previous == status {
            debug!("Order {} already {}, no transition", order_id, status);
            return Ok(());
        }

        info!("Order {} status {} -> {}", order_id, previous, status);
        let event = OrderStatusChanged::new(order_id, previous, status);
        self.dispatcher.dispatch(&event, settings).await;
        Ok(())
    }

    async fn save_fields(&self, order_id: OrderId, fields: ChallengeFields) {
        self.orders
            .update(order_id, move |order| {
                order.set_meta(CHALLENGE_PRICING_ID, fields.challenge_pricing_id);
                order.set_meta(STAGE_ID, fields.stage_id);
                order.set_meta(USER_EMAIL, fields.user_email);
                order.set_meta(BRAND_ID, fields.brand_id);
            })
            .await;
    }

    /// Customer failures never fail the order request.
    async fn bind_customer(&self, order_id: OrderId, billing_email: &str) {
        if let Err(e) = self.resolver.resolve(order_id, billing_email).await {
            warn!("Could not bind customer for order {}: {}", order_id, e);
        }
    }
}
