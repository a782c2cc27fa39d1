use async_trait::async_trait;
use chrono::NaiveDate;

use super::draft::ValidatedOrder;
use super::errors::GatewayError;
use super::order::{Area, AreaId, AvailabilityResult, DateRange, ListResult, Order, OrderId};

/// The order service as seen by the client.
#[async_trait]
pub trait OrderGateway: Send + Sync + 'static {
    /// Does an order already exist for `area_id` on `date`?
    async fn check_exists(
        &self,
        area_id: AreaId,
        date: NaiveDate,
    ) -> Result<AvailabilityResult, GatewayError>;

    async fn create(&self, order: &ValidatedOrder) -> Result<Order, GatewayError>;

    /// Writes the fields the edit flow owns: status, observation, items, total.
    async fn update(&self, id: OrderId, order: &ValidatedOrder) -> Result<Order, GatewayError>;

    async fn find_by_id(&self, id: OrderId) -> Result<Option<Order>, GatewayError>;

    async fn list(&self, page: i64, limit: i64) -> Result<ListResult, GatewayError>;

    async fn filter(&self, range: DateRange) -> Result<Vec<Order>, GatewayError>;

    async fn delete(&self, id: OrderId) -> Result<(), GatewayError>;
}

/// Read-only source of areas.
#[async_trait]
pub trait AreaDirectory: Send + Sync + 'static {
    async fn list_areas(&self) -> Result<Vec<Area>, GatewayError>;
}
