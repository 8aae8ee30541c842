use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use poem_openapi::{Enum, Object};
use serde::{Deserialize, Serialize};

pub type OrderId = u64;

/// Metadata key of the persistent "partner call already made" marker.
pub const CONNECTION_COMPLETED_KEY: &str = "_connection_completed";
/// Metadata key mirroring the bound customer account.
pub const CUSTOMER_USER_KEY: &str = "_customer_user";

pub const CHALLENGE_PRICING_ID: &str = "challengePricingId";
pub const STAGE_ID: &str = "stageId";
pub const USER_EMAIL: &str = "userEmail";
pub const BRAND_ID: &str = "brandId";

/// The custom order fields, in validation order.
pub const CHALLENGE_FIELD_KEYS: [&str; 4] = [CHALLENGE_PRICING_ID, STAGE_ID, USER_EMAIL, BRAND_ID];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Enum)]
#[serde(rename_all = "lowercase")]
#[oai(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Processing,
    #[serde(rename = "on-hold")]
    #[oai(rename = "on-hold")]
    OnHold,
    Completed,
    Cancelled,
    Refunded,
    Failed,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Processing => "processing",
            OrderStatus::OnHold => "on-hold",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
            OrderStatus::Refunded => "refunded",
            OrderStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The four partner fields carried on every order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeFields {
    pub challenge_pricing_id: String,
    pub stage_id: String,
    pub user_email: String,
    pub brand_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Object)]
pub struct OrderNote {
    pub note: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub status: OrderStatus,
    pub billing_email: String,
    pub customer_id: Option<u64>,
    pub meta: BTreeMap<String, String>,
    pub notes: Vec<OrderNote>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn new(id: OrderId, status: OrderStatus, billing_email: String) -> Self {
        let now = Utc::now();
        Self {
            id,
            status,
            billing_email,
            customer_id: None,
            meta: BTreeMap::new(),
            notes: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn meta_value(&self, key: &str) -> Option<&str> {
        self.meta.get(key).map(String::as_str)
    }

    pub fn set_meta(&mut self, key: &str, value: String) {
        self.meta.insert(key.to_string(), value);
        self.updated_at = Utc::now();
    }

    /// Stored partner fields; missing keys read as empty strings.
    pub fn challenge_fields(&self) -> ChallengeFields {
        let get = |key: &str| self.meta_value(key).unwrap_or_default().to_string();
        ChallengeFields {
            challenge_pricing_id: get(CHALLENGE_PRICING_ID),
            stage_id: get(STAGE_ID),
            user_email: get(USER_EMAIL),
            brand_id: get(BRAND_ID),
        }
    }

    pub fn connection_completed(&self) -> bool {
        self.meta_value(CONNECTION_COMPLETED_KEY) == Some("1")
    }

    pub fn add_note(&mut self, note: impl Into<String>) {
        let now = Utc::now();
        self.notes.push(OrderNote {
            note: note.into(),
            created_at: now,
        });
        self.updated_at = now;
    }

    pub fn bind_customer(&mut self, customer_id: u64) {
        self.customer_id = Some(customer_id);
        self.set_meta(CUSTOMER_USER_KEY, customer_id.to_string());
    }
}

/// Order as returned by the REST surface
#[derive(Debug, Clone, Serialize, Deserialize, Object)]
pub struct OrderView {
    pub id: OrderId,
    pub status: OrderStatus,
    pub billing_email: String,
    pub customer_id: Option<u64>,
    #[oai(rename = "challengePricingId")]
    #[serde(rename = "challengePricingId")]
    pub challenge_pricing_id: String,
    #[oai(rename = "stageId")]
    #[serde(rename = "stageId")]
    pub stage_id: String,
    #[oai(rename = "userEmail")]
    #[serde(rename = "userEmail")]
    pub user_email: String,
    #[oai(rename = "brandId")]
    #[serde(rename = "brandId")]
    pub brand_id: String,
    pub connection_completed: bool,
    pub notes: Vec<OrderNote>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Order> for OrderView {
    fn from(order: &Order) -> Self {
        let fields = order.challenge_fields();
        Self {
            id: order.id,
            status: order.status,
            billing_email: order.billing_email.clone(),
            customer_id: order.customer_id,
            challenge_pricing_id: fields.challenge_pricing_id,
            stage_id: fields.stage_id,
            user_email: fields.user_email,
            brand_id: fields.brand_id,
            connection_completed: order.connection_completed(),
            notes: order.notes.clone(),
            created_at: order.created_at,
            updated_at: order.updated_at,
        }
    }
}

/// Body of `POST /orders`; the partner fields stay optional here so a blank
/// or absent one is reported by field validation instead of the parser.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Object)]
pub struct CreateOrderRequest {
    pub status: Option<OrderStatus>,
    pub billing_email: Option<String>,
    #[oai(rename = "challengePricingId")]
    #[serde(rename = "challengePricingId")]
    pub challenge_pricing_id: Option<String>,
    #[oai(rename = "stageId")]
    #[serde(rename = "stageId")]
    pub stage_id: Option<String>,
    #[oai(rename = "userEmail")]
    #[serde(rename = "userEmail")]
    pub user_email: Option<String>,
    #[oai(rename = "brandId")]
    #[serde(rename = "brandId")]
    pub brand_id: Option<String>,
}

/// Body of `PUT /orders/{id}`
#[derive(Debug, Clone, Default, Serialize, Deserialize, Object)]
pub struct UpdateOrderRequest {
    pub status: Option<OrderStatus>,
    pub billing_email: Option<String>,
    #[oai(rename = "challengePricingId")]
    #[serde(rename = "challengePricingId")]
    pub challenge_pricing_id: Option<String>,
    #[oai(rename = "stageId")]
    #[serde(rename = "stageId")]
    pub stage_id: Option<String>,
    #[oai(rename = "userEmail")]
    #[serde(rename = "userEmail")]
    pub user_email: Option<String>,
    #[oai(rename = "brandId")]
    #[serde(rename = "brandId")]
    pub brand_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Object)]
pub struct StatusChangeRequest {
    pub status: OrderStatus,
}

/// Raw partner field values as submitted, keyed by wire name.
pub fn submitted_fields<'a>(
    challenge_pricing_id: &'a Option<String>,
    stage_id: &'a Option<String>,
    user_email: &'a Option<String>,
    brand_id: &'a Option<String>,
) -> [(&'static str, Option<&'a str>); 4] {
    [
        (CHALLENGE_PRICING_ID, challenge_pricing_id.as_deref()),
        (STAGE_ID, stage_id.as_deref()),
        (USER_EMAIL, user_email.as_deref()),
        (BRAND_ID, brand_id.as_deref()),
    ]
}

impl CreateOrderRequest {
    pub fn fields(&self) -> [(&'static str, Option<&str>); 4] {
        submitted_fields(
            &self.challenge_pricing_id,
            &self.stage_id,
            &self.user_email,
            &self.brand_id,
        )
    }
}

impl UpdateOrderRequest {
    pub fn fields(&self) -> [(&'static str, Option<&str>); 4] {
        submitted_fields(
            &self.challenge_pricing_id,
            &self.stage_id,
            &self.user_email,
            &self.brand_id,
        )
    }
}
