use std::fmt;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

pub type AreaId = i64;
pub type OrderId = i64;
pub type UserId = i64;
pub type ProductId = i64;
pub type UnitMeasurementId = i64;
pub type CompanyId = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Created,
    Process,
    Delivered,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Created => "created",
            OrderStatus::Process => "process",
            OrderStatus::Delivered => "delivered",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "created" => Ok(OrderStatus::Created),
            "process" => Ok(OrderStatus::Process),
            "delivered" => Ok(OrderStatus::Delivered),
            other => Err(format!("unknown order status '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Area {
    pub id: AreaId,
    pub name: String,
    pub company_id: CompanyId,
    pub color: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderItem {
    pub product_id: ProductId,
    pub quantity: BigDecimal,
    pub price: BigDecimal,
    pub unit_measurement_id: UnitMeasurementId,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub area_id: AreaId,
    pub status: OrderStatus,
    pub total_amount: BigDecimal,
    pub observation: Option<String>,
    pub created_at: DateTime<Utc>,
    pub items: Vec<OrderItem>,
}

/// Answer of the existence probe for one `(area, date)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AvailabilityResult {
    pub exists: bool,
    pub order_id: Option<OrderId>,
}

impl AvailabilityResult {
    pub fn free() -> Self {
        Self {
            exists: false,
            order_id: None,
        }
    }

    pub fn taken(order_id: Option<OrderId>) -> Self {
        Self {
            exists: true,
            order_id,
        }
    }

    /// Whether this result forbids composing an order.
    ///
    /// When editing, the existing order may be the one under edit; that does
    /// not count. An existing order with no id is always blocking.
    pub fn blocks(&self, editing: Option<OrderId>) -> bool {
        if !self.exists {
            return false;
        }
        match (self.order_id, editing) {
            (Some(found), Some(own)) => found != own,
            _ => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListResult {
    pub items: Vec<Order>,
    pub total: i64,
}

/// Inclusive range of business dates for the filtered order listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_parses_case_insensitively() {
        assert_eq!("Process".parse::<OrderStatus>(), Ok(OrderStatus::Process));
        assert_eq!(" delivered ".parse::<OrderStatus>(), Ok(OrderStatus::Delivered));
        assert!("shipped".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn status_display_matches_wire_name() {
        assert_eq!(OrderStatus::Created.to_string(), "created");
    }

    #[test]
    fn free_result_never_blocks() {
        assert!(!AvailabilityResult::free().blocks(None));
        assert!(!AvailabilityResult::free().blocks(Some(4)));
    }

    #[test]
    fn existing_order_blocks_new_composition() {
        assert!(AvailabilityResult::taken(Some(9)).blocks(None));
        assert!(AvailabilityResult::taken(None).blocks(None));
    }

    #[test]
    fn own_order_does_not_block_its_edit() {
        assert!(!AvailabilityResult::taken(Some(9)).blocks(Some(9)));
        assert!(AvailabilityResult::taken(Some(9)).blocks(Some(3)));
        assert!(AvailabilityResult::taken(None).blocks(Some(9)));
    }
}
