use poem_openapi::{param::Path, payload::Json, ApiResponse, Object, OpenApi};
use std::sync::Arc;

use crate::business::OrderService;
use crate::domain::{
    CreateOrderRequest, OrderId, OrderView, StatusChangeRequest, UpdateOrderRequest,
};
use crate::error::{AppError, ErrorBody};

pub struct OrdersApi {
    service: Arc<OrderService>,
}

impl OrdersApi {
    pub fn new(service: Arc<OrderService>) -> Self {
        Self { service }
    }
}

/// One stored metadata entry
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, Object)]
pub struct MetaEntry {
    pub key: String,
    pub value: String,
}

#[derive(ApiResponse)]
pub enum OrderResponse {
    #[oai(status = 200)]
    Ok(Json<OrderView>),

    #[oai(status = 201)]
    Created(Json<OrderView>),

    #[oai(status = 400)]
    BadRequest(Json<ErrorBody>),

    #[oai(status = 401)]
    Unauthorized(Json<ErrorBody>),

    #[oai(status = 404)]
    NotFound(Json<ErrorBody>),

    #[oai(status = 500)]
    InternalError(Json<ErrorBody>),
}

impl From<AppError> for OrderResponse {
    fn from(err: AppError) -> Self {
        let body = Json(err.body());
        match err {
            AppError::MissingField(_) => OrderResponse::BadRequest(body),
            AppError::NotFound(_) => OrderResponse::NotFound(body),
            AppError::Unauthorized => OrderResponse::Unauthorized(body),
            AppError::Internal(_) => OrderResponse::InternalError(body),
        }
    }
}

#[derive(ApiResponse)]
pub enum OrderMetaResponse {
    #[oai(status = 200)]
    Ok(Json<Vec<MetaEntry>>),

    #[oai(status = 404)]
    NotFound(Json<ErrorBody>),
}

#[OpenApi]
impl OrdersApi {
    /// Create an order carrying the challenge fields
    #[oai(path = "/orders", method = "post")]
    async fn create_order(&self, body: Json<CreateOrderRequest>) -> OrderResponse {
        match self.service.create_order(body.0).await {
            Ok(order) => OrderResponse::Created(Json(OrderView::from(&order))),
            Err(e) => e.into(),
        }
    }

    #[oai(path = "/orders/:id", method = "get")]
    async fn get_order(&self, id: Path<OrderId>) -> OrderResponse {
        match self.service.get_order(id.0).await {
            Ok(order) => OrderResponse::Ok(Json(OrderView::from(&order))),
            Err(e) => e.into(),
        }
    }

    /// Update an order; the challenge fields must be resent
    #[oai(path = "/orders/:id", method = "put")]
    async fn update_order(
        &self,
        id: Path<OrderId>,
        body: Json<UpdateOrderRequest>,
    ) -> OrderResponse {
        match self.service.update_order(id.0, body.0).await {
            Ok(order) => OrderResponse::Ok(Json(OrderView::from(&order))),
            Err(e) => e.into(),
        }
    }

    /// Change the order status
    ///
    /// Moving to `completed` triggers the challenge account request before
    /// this call returns.
    #[oai(path = "/orders/:id/status", method = "post")]
    async fn change_status(
        &self,
        id: Path<OrderId>,
        body: Json<StatusChangeRequest>,
    ) -> OrderResponse {
        match self.service.change_status(id.0, body.0.status).await {
            Ok(order) => OrderResponse::Ok(Json(OrderView::from(&order))),
            Err(e) => e.into(),
        }
    }

    /// All metadata stored on the order
    #[oai(path = "/orders/:id/meta", method = "get")]
    async fn order_meta(&self, id: Path<OrderId>) -> OrderMetaResponse {
        match self.service.order_meta(id.0).await {
            Ok(meta) => OrderMetaResponse::Ok(Json(
                meta.into_iter()
                    .map(|(key, value)| MetaEntry { key, value })
                    .collect(),
            )),
            Err(e) => OrderMetaResponse::NotFound(Json(e.body())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::business::FieldError;

    #[test]
    fn test_error_responses_keep_their_status() {
        assert!(matches!(
            OrderResponse::from(AppError::Unauthorized),
            OrderResponse::Unauthorized(_)
        ));
        assert!(matches!(
            OrderResponse::from(AppError::from(FieldError::new(vec!["brandId".to_string()]))),
            OrderResponse::BadRequest(_)
        ));
        assert!(matches!(
            OrderResponse::from(AppError::Internal(anyhow::anyhow!("boom"))),
            OrderResponse::InternalError(_)
        ));

        match OrderResponse::from(AppError::NotFound("Order 7 not found".to_string())) {
            OrderResponse::NotFound(body) => assert_eq!(body.0.message, "Order 7 not found"),
            _ => panic!("Expected NotFound"),
        }
    }
}
