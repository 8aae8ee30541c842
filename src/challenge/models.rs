use serde::{Deserialize, Serialize};

use crate::domain::{ChallengeFields, OrderId};

/// Body of `POST /api/source/challenge-accounts`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChallengeAccountRequest {
    pub order_id: OrderId,
    #[serde(flatten)]
    pub fields: ChallengeFields,
}

impl ChallengeAccountRequest {
    pub fn new(order_id: OrderId, fields: ChallengeFields) -> Self {
        Self { order_id, fields }
    }
}

/// Successful partner answer, kept raw for logging
#[derive(Debug, Clone)]
pub struct ChallengeAccountResponse {
    pub status: u16,
    pub body: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_wire_format() {
        let request = ChallengeAccountRequest::new(
            501,
            ChallengeFields {
                challenge_pricing_id: "P1".to_string(),
                stage_id: "S1".to_string(),
                user_email: "a@b.com".to_string(),
                brand_id: "B1".to_string(),
            },
        );

        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "order_id": 501,
                "challengePricingId": "P1",
                "stageId": "S1",
                "userEmail": "a@b.com",
                "brandId": "B1"
            })
        );
    }
}
