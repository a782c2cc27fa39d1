use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;

use crate::domain::draft::ValidatedOrder;
use crate::domain::errors::GatewayError;
use crate::domain::order::{Area, AreaId, AvailabilityResult, DateRange, ListResult, Order, OrderId};
use crate::domain::ports::{AreaDirectory, OrderGateway};

use super::dto::{
    AreaResponse, CheckResponse, CreateOrderRequest, ErrorBody, ListOrdersResponse,
    OrderResponse, UpdateOrderRequest,
};

const DATE_FORMAT: &str = "%Y-%m-%d";

// ── Error conversions (infrastructure concern only) ──────────────────────────

impl From<reqwest::Error> for GatewayError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            GatewayError::Timeout
        } else if e.is_decode() {
            GatewayError::Decode(e.to_string())
        } else {
            GatewayError::Transport(e.to_string())
        }
    }
}

/// Turns a non-success response into the matching [`GatewayError`], using the
/// server's `message` when the body carries one.
async fn error_from_response(response: Response) -> GatewayError {
    let status = response.status();
    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&text)
        .ok()
        .and_then(|body| body.message)
        .map(|m| m.into_text())
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| {
            if text.trim().is_empty() {
                status.canonical_reason().unwrap_or("").to_string()
            } else {
                text
            }
        });

    match status {
        StatusCode::CONFLICT => GatewayError::Conflict(message),
        StatusCode::NOT_FOUND => GatewayError::NotFound,
        s if s.is_client_error() => GatewayError::Rejected {
            status: s.as_u16(),
            message,
        },
        s => GatewayError::Server {
            status: s.as_u16(),
            message,
        },
    }
}

// ── Gateway ──────────────────────────────────────────────────────────────────

/// [`OrderGateway`] and [`AreaDirectory`] over the backend's JSON REST API.
#[derive(Clone)]
pub struct HttpOrderGateway {
    client: Client,
    base_url: String,
}

impl HttpOrderGateway {
    /// # Arguments
    /// * `base_url` - API root, e.g. "http://localhost:3000"
    /// * `timeout` - per-request timeout applied by the HTTP client
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, GatewayError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, base_url))
    }

    pub fn with_client(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, GatewayError> {
        let response = request.send().await?;
        if response.status().is_success() {
            Ok(response)
        } else {
            Err(error_from_response(response).await)
        }
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, GatewayError> {
        let response = self.send(request).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| GatewayError::Decode(e.to_string()))
    }
}

#[async_trait]
impl OrderGateway for HttpOrderGateway {
    async fn check_exists(
        &self,
        area_id: AreaId,
        date: NaiveDate,
    ) -> Result<AvailabilityResult, GatewayError> {
        let date = date.format(DATE_FORMAT).to_string();
        log::debug!("GET /orders/check areaId={} date={}", area_id, date);
        let request = self
            .client
            .get(self.url("/orders/check"))
            .query(&[("areaId", area_id.to_string()), ("date", date)]);
        let body: CheckResponse = self.send_json(request).await?;
        Ok(body.into())
    }

    async fn create(&self, order: &ValidatedOrder) -> Result<Order, GatewayError> {
        let body = CreateOrderRequest::from_validated(order);
        log::debug!(
            "POST /orders areaId={} items={}",
            body.area_id,
            body.order_items.len()
        );
        let request = self.client.post(self.url("/orders")).json(&body);
        let created: OrderResponse = self.send_json(request).await?;
        Ok(created.into())
    }

    async fn update(&self, id: OrderId, order: &ValidatedOrder) -> Result<Order, GatewayError> {
        let body = UpdateOrderRequest::from_validated(order);
        log::debug!("PATCH /orders/{}", id);
        let request = self
            .client
            .patch(self.url(&format!("/orders/{}", id)))
            .json(&body);
        let updated: OrderResponse = self.send_json(request).await?;
        Ok(updated.into())
    }

    async fn find_by_id(&self, id: OrderId) -> Result<Option<Order>, GatewayError> {
        let request = self.client.get(self.url(&format!("/orders/{}", id)));
        match self.send_json::<OrderResponse>(request).await {
            Ok(order) => Ok(Some(order.into())),
            Err(GatewayError::NotFound) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn list(&self, page: i64, limit: i64) -> Result<ListResult, GatewayError> {
        let page = page.max(1);
        let limit = limit.clamp(1, 100);
        let request = self
            .client
            .get(self.url("/orders"))
            .query(&[("page", page), ("limit", limit)]);
        let body: ListOrdersResponse = self.send_json(request).await?;
        Ok(body.into())
    }

    async fn filter(&self, range: DateRange) -> Result<Vec<Order>, GatewayError> {
        let request = self.client.get(self.url("/orders/filter")).query(&[
            ("startDate", range.start.format(DATE_FORMAT).to_string()),
            ("endDate", range.end.format(DATE_FORMAT).to_string()),
        ]);
        let body: Vec<OrderResponse> = self.send_json(request).await?;
        Ok(body.into_iter().map(Order::from).collect())
    }

    async fn delete(&self, id: OrderId) -> Result<(), GatewayError> {
        log::info!("Deleting order {}", id);
        let request = self.client.delete(self.url(&format!("/orders/{}", id)));
        self.send(request).await?;
        Ok(())
    }
}

#[async_trait]
impl AreaDirectory for HttpOrderGateway {
    async fn list_areas(&self) -> Result<Vec<Area>, GatewayError> {
        let request = self.client.get(self.url("/areas"));
        let body: Vec<AreaResponse> = self.send_json(request).await?;
        Ok(body.into_iter().map(Area::from).collect())
    }
}
