use crate::business::events::{OrderEventSubscriber, OrderStatusChanged};
use crate::cache::TransientStore;
use crate::challenge::{ChallengeAccountRequest, ChallengeApiClient, ChallengeApiError};
use crate::config::Settings;
use crate::domain::{OrderId, OrderStore, CONNECTION_COMPLETED_KEY};
use crate::security::mask_key;
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

/// How long a provisioning lock holds before it lapses on its own.
pub const LOCK_TTL: Duration = Duration::from_secs(3);

/// Log target for partner request/response records.
pub const RESPONSE_LOG_TARGET: &str = "tfbgate::connection_response";

pub const SUCCESS_NOTE: &str = "Challenge account creation successful.";

/// Why an event did not lead to a partner call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NotCompletion,
    Disabled,
    AlreadyProcessed,
    Locked,
    OrderNotFound,
    /// The active environment has no API key configured.
    MissingKey,
}

/// Result of handling one status-change event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotifyOutcome {
    Skipped(SkipReason),
    Succeeded,
    TransportFailed(String),
    Rejected { status: u16, message: String },
}

pub fn failure_note(message: &str) -> String {
    format!("Challenge account creation failed: {}", message)
}

/// Calls the partner API once per order when it reaches `completed`.
pub struct CompletionNotifier {
    orders: Arc<OrderStore>,
    transients: TransientStore,
    client: Arc<ChallengeApiClient>,
    lock_ttl: Duration,
    /// Orders with a partner call under way. Outlives the transient lock,
    /// which can lapse before the client times out.
    in_flight: Mutex<HashSet<OrderId>>,
}

impl CompletionNotifier {
    pub fn new(
        orders: Arc<OrderStore>,
        transients: TransientStore,
        client: Arc<ChallengeApiClient>,
    ) -> Self {
        Self {
            orders,
            transients,
            client,
            lock_ttl: LOCK_TTL,
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    pub fn with_lock_ttl(mut self, lock_ttl: Duration) -> Self {
        self.lock_ttl = lock_ttl;
        self
    }

    pub fn lock_key(order_id: OrderId) -> String {
        format!("send_api_lock_{}", order_id)
    }

    async fn already_processed(&self, order_id: OrderId) -> Option<bool> {
        self.orders
            .get(order_id)
            .await
            .map(|order| order.connection_completed())
    }

    /// Run the completion workflow for one event.
    pub async fn handle(&self, event: &OrderStatusChanged, settings: &Settings) -> NotifyOutcome {
        if !event.is_completion() {
            return NotifyOutcome::Skipped(SkipReason::NotCompletion);
        }
        if !settings.enabled {
            debug!("Integration disabled, ignoring completion of order {}", event.order_id);
            return NotifyOutcome::Skipped(SkipReason::Disabled);
        }

        let order_id = event.order_id;
        match self.already_processed(order_id).await {
            None => return NotifyOutcome::Skipped(SkipReason::OrderNotFound),
            Some(true) => {
                debug!("Order {} already sent to partner", order_id);
                return NotifyOutcome::Skipped(SkipReason::AlreadyProcessed);
            }
            Some(false) => {}
        }

        if settings.resolve_target().key.is_empty() {
            warn!(
                "No API key configured for {:?}, not sending order {}",
                settings.environment, order_id
            );
            return NotifyOutcome::Skipped(SkipReason::MissingKey);
        }

        let lock_key = Self::lock_key(order_id);
        let Some(token) = self.transients.try_acquire(&lock_key, self.lock_ttl).await else {
            debug!("Order {} is already being sent to partner", order_id);
            return NotifyOutcome::Skipped(SkipReason::Locked);
        };

        if !self.in_flight.lock().await.insert(order_id) {
            debug!("Order {} still has a partner call in flight", order_id);
            self.transients.release(&lock_key, &token).await;
            return NotifyOutcome::Skipped(SkipReason::Locked);
        }

        // A holder that finished just before we took the lock has set the flag.
        let outcome = match self.orders.get(order_id).await {
            None => NotifyOutcome::Skipped(SkipReason::OrderNotFound),
            Some(order) if order.connection_completed() => {
                NotifyOutcome::Skipped(SkipReason::AlreadyProcessed)
            }
            Some(order) => {
                let request = ChallengeAccountRequest::new(order_id, order.challenge_fields());
                let outcome = self.send(&request, settings).await;
                self.record(order_id, &outcome).await;
                outcome
            }
        };

        self.in_flight.lock().await.remove(&order_id);
        self.transients.release(&lock_key, &token).await;
        outcome
    }

    async fn send(&self, request: &ChallengeAccountRequest, settings: &Settings) -> NotifyOutcome {
        let target = settings.resolve_target();
        let log_responses = settings.save_log_response;

        if log_responses {
            let body = serde_json::to_string(request).unwrap_or_default();
            info!(
                target: RESPONSE_LOG_TARGET,
                order_id = request.order_id,
                endpoint = %ChallengeApiClient::build_url(&target.endpoint),
                key = %mask_key(&target.key),
                body = %body,
                "Sending challenge account request"
            );
        }

        match self.client.create_challenge_account(&target, request).await {
            Ok(response) => {
                if log_responses {
                    info!(
                        target: RESPONSE_LOG_TARGET,
                        order_id = request.order_id,
                        status = response.status,
                        body = %response.body,
                        "Challenge account creation response"
                    );
                }
                NotifyOutcome::Succeeded
            }
            Err(ChallengeApiError::Rejected {
                status,
                message,
                body,
            }) => {
                if log_responses {
                    error!(
                        target: RESPONSE_LOG_TARGET,
                        order_id = request.order_id,
                        status,
                        body = %body,
                        "Challenge account creation rejected"
                    );
                }
                NotifyOutcome::Rejected { status, message }
            }
            Err(err) => {
                if log_responses {
                    error!(
                        target: RESPONSE_LOG_TARGET,
                        order_id = request.order_id,
                        error = %err,
                        "Challenge account creation error"
                    );
                }
                NotifyOutcome::TransportFailed(err.note_message())
            }
        }
    }

    /// Leave a note and set the flag, whatever the outcome.
    async fn record(&self, order_id: OrderId, outcome: &NotifyOutcome) {
        let note = match outcome {
            NotifyOutcome::Succeeded => SUCCESS_NOTE.to_string(),
            NotifyOutcome::Rejected { message, .. } => failure_note(message),
            NotifyOutcome::TransportFailed(message) => failure_note(message),
            NotifyOutcome::Skipped(_) => return,
        };

        let recorded = self
            .orders
            .update(order_id, |order| {
                order.add_note(note);
                order.set_meta(CONNECTION_COMPLETED_KEY, "1".to_string());
            })
            .await;

        if recorded.is_none() {
            warn!("Order {} vanished before its partner outcome was recorded", order_id);
        }
    }
}

#[async_trait]
impl OrderEventSubscriber for CompletionNotifier {
    fn name(&self) -> &'static str {
        "completion-notifier"
    }

    async fn on_status_changed(&self, event: &OrderStatusChanged, settings: &Settings) {
        let outcome = self.handle(event, settings).await;
        match &outcome {
            NotifyOutcome::Succeeded => info!("Challenge account created for order {}", event.order_id),
            NotifyOutcome::Skipped(reason) => {
                debug!("Completion of order {} skipped: {:?}", event.order_id, reason)
            }
            NotifyOutcome::TransportFailed(_) | NotifyOutcome::Rejected { .. } => {
                warn!("Challenge account creation failed for order {}", event.order_id)
            }
        }
    }
}
