use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::draft::ValidatedOrder;
use crate::domain::order::{
    Area, AreaId, AvailabilityResult, CompanyId, ListResult, Order, OrderId, OrderItem,
    OrderStatus, ProductId, UnitMeasurementId, UserId,
};

// ── Decimal encoding ─────────────────────────────────────────────────────────

/// Decimals travel as JSON numbers. Incoming values may also be strings
/// (numeric database columns are often serialized that way).
pub mod decimal {
    use std::str::FromStr;

    use bigdecimal::BigDecimal;
    use serde::de::Error as _;
    use serde::ser::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};
    use serde_json::Value;

    pub fn serialize<S: Serializer>(value: &BigDecimal, serializer: S) -> Result<S::Ok, S::Error> {
        let number: f64 = value.to_string().parse().map_err(S::Error::custom)?;
        serializer.serialize_f64(number)
    }

    /// Reads the number through its JSON text. `BigDecimal`'s own
    /// `Deserialize` takes JSON numbers as `f64` and keeps the binary
    /// expansion (`7.675` becomes `7.67499...`), which rounds the wrong way.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<BigDecimal, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::Number(n) => BigDecimal::from_str(&n.to_string()).map_err(D::Error::custom),
            Value::String(s) => BigDecimal::from_str(s.trim()).map_err(D::Error::custom),
            other => Err(D::Error::custom(format!("expected a decimal, got {}", other))),
        }
    }
}

// ── Requests ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemPayload {
    pub product_id: ProductId,
    #[serde(with = "decimal")]
    pub quantity: BigDecimal,
    #[serde(with = "decimal")]
    pub price: BigDecimal,
    pub unit_measurement_id: UnitMeasurementId,
}

impl From<&OrderItem> for OrderItemPayload {
    fn from(item: &OrderItem) -> Self {
        Self {
            product_id: item.product_id,
            quantity: item.quantity.clone(),
            price: item.price.clone(),
            unit_measurement_id: item.unit_measurement_id,
        }
    }
}

/// Body of `POST /orders`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub user_id: UserId,
    pub area_id: AreaId,
    #[serde(with = "decimal")]
    pub total_amount: BigDecimal,
    pub status: OrderStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observation: Option<String>,
    pub order_items: Vec<OrderItemPayload>,
}

impl CreateOrderRequest {
    /// `observation` is only sent when it has visible text.
    pub fn from_validated(order: &ValidatedOrder) -> Self {
        Self {
            user_id: order.user_id,
            area_id: order.area_id,
            total_amount: order.total_amount.clone(),
            status: order.status,
            observation: non_blank(order.observation.as_deref()),
            order_items: order.items.iter().map(OrderItemPayload::from).collect(),
        }
    }
}

/// Body of `PATCH /orders/{id}`. Absent fields are left untouched by the server.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOrderRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<OrderStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_items: Option<Vec<OrderItemPayload>>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_optional_decimal"
    )]
    pub total_amount: Option<BigDecimal>,
}

impl UpdateOrderRequest {
    /// The edit flow owns status, observation, items and total. A blank
    /// observation is sent as an empty string so the server clears it.
    pub fn from_validated(order: &ValidatedOrder) -> Self {
        Self {
            status: Some(order.status),
            observation: Some(non_blank(order.observation.as_deref()).unwrap_or_default()),
            order_items: Some(order.items.iter().map(OrderItemPayload::from).collect()),
            total_amount: Some(order.total_amount.clone()),
        }
    }
}

fn serialize_optional_decimal<S: serde::Serializer>(
    value: &Option<BigDecimal>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match value {
        Some(v) => decimal::serialize(v, serializer),
        None => serializer.serialize_none(),
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

// ── Responses ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckResponse {
    pub exists: bool,
    #[serde(default)]
    pub order_id: Option<OrderId>,
}

impl From<CheckResponse> for AvailabilityResult {
    fn from(r: CheckResponse) -> Self {
        AvailabilityResult {
            exists: r.exists,
            order_id: r.order_id,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemResponse {
    pub product_id: ProductId,
    #[serde(with = "decimal")]
    pub quantity: BigDecimal,
    #[serde(with = "decimal")]
    pub price: BigDecimal,
    pub unit_measurement_id: UnitMeasurementId,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    pub id: OrderId,
    pub user_id: UserId,
    pub area_id: AreaId,
    pub status: OrderStatus,
    #[serde(with = "decimal")]
    pub total_amount: BigDecimal,
    #[serde(default)]
    pub observation: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub order_items: Vec<OrderItemResponse>,
}

impl From<OrderResponse> for Order {
    fn from(r: OrderResponse) -> Self {
        Order {
            id: r.id,
            user_id: r.user_id,
            area_id: r.area_id,
            status: r.status,
            total_amount: r.total_amount,
            observation: r.observation,
            created_at: r.created_at,
            items: r
                .order_items
                .into_iter()
                .map(|i| OrderItem {
                    product_id: i.product_id,
                    quantity: i.quantity,
                    price: i.price,
                    unit_measurement_id: i.unit_measurement_id,
                })
                .collect(),
        }
    }
}

/// Page returned by `GET /orders?page&limit`.
#[derive(Debug, Clone, Deserialize)]
pub struct ListOrdersResponse {
    #[serde(alias = "data")]
    pub items: Vec<OrderResponse>,
    pub total: i64,
}

impl From<ListOrdersResponse> for ListResult {
    fn from(r: ListOrdersResponse) -> Self {
        ListResult {
            items: r.items.into_iter().map(Order::from).collect(),
            total: r.total,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AreaResponse {
    pub id: AreaId,
    pub name: String,
    pub company_id: CompanyId,
    #[serde(default)]
    pub color: Option<String>,
}

impl From<AreaResponse> for Area {
    fn from(r: AreaResponse) -> Self {
        Area {
            id: r.id,
            name: r.name,
            company_id: r.company_id,
            color: r.color,
        }
    }
}

/// Error body sent by the backend; `message` is a string or a list of strings.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    pub message: Option<ErrorMessage>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ErrorMessage {
    One(String),
    Many(Vec<String>),
}

impl ErrorMessage {
    pub fn into_text(self) -> String {
        match self {
            ErrorMessage::One(s) => s,
            ErrorMessage::Many(list) => list.join("; "),
        }
    }
}
