//! Client-side filtering and sorting of fetched orders.

use std::cmp::Ordering;

use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, Utc};

use crate::domain::clock::BusinessClock;
use crate::domain::order::{AreaId, Order, OrderId, OrderStatus};
use crate::domain::ports::AreaDirectory;

use super::area_cache::AreaCache;
use super::numbering::{index_by_order, DailyNumber};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    #[default]
    CreatedAt,
    Total,
    Status,
    AreaName,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    Ascending,
    #[default]
    Descending,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderListQuery {
    pub status: Option<OrderStatus>,
    pub area_id: Option<AreaId>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub search: Option<String>,
    pub sort: SortKey,
    pub direction: SortDirection,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderRow {
    pub id: OrderId,
    pub daily_number: Option<DailyNumber>,
    pub area_id: AreaId,
    pub area_name: String,
    pub status: OrderStatus,
    pub total_amount: BigDecimal,
    pub observation: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl OrderListQuery {
    /// Filters and sorts `orders`, numbering them per day over the full
    /// collection so that filtering does not renumber rows.
    pub fn apply<C, D>(&self, orders: &[Order], areas: &AreaCache<D>, clock: &C) -> Vec<OrderRow>
    where
        C: BusinessClock,
        D: AreaDirectory,
    {
        let numbers = index_by_order(orders, clock);
        let needle = self
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase);

        let mut rows: Vec<OrderRow> = orders
            .iter()
            .filter(|o| self.status.map_or(true, |s| o.status == s))
            .filter(|o| self.area_id.map_or(true, |a| o.area_id == a))
            .filter(|o| {
                let day = clock.business_date_of(o.created_at);
                self.from.map_or(true, |from| day >= from) && self.to.map_or(true, |to| day <= to)
            })
            .map(|o| OrderRow {
                id: o.id,
                daily_number: numbers.get(&o.id).copied(),
                area_id: o.area_id,
                area_name: areas.name_of(o.area_id),
                status: o.status,
                total_amount: o.total_amount.clone(),
                observation: o.observation.clone(),
                created_at: o.created_at,
            })
            .filter(|row| match &needle {
                Some(needle) => {
                    row.area_name.to_lowercase().contains(needle)
                        || row
                            .observation
                            .as_deref()
                            .map_or(false, |obs| obs.to_lowercase().contains(needle))
                }
                None => true,
            })
            .collect();

        rows.sort_by(|a, b| {
            let ord = compare(self.sort, a, b);
            match self.direction {
                SortDirection::Ascending => ord,
                SortDirection::Descending => ord.reverse(),
            }
        });
        rows
    }
}

fn status_rank(status: OrderStatus) -> u8 {
    match status {
        OrderStatus::Created => 0,
        OrderStatus::Process => 1,
        OrderStatus::Delivered => 2,
    }
}

fn compare(key: SortKey, a: &OrderRow, b: &OrderRow) -> Ordering {
    match key {
        SortKey::CreatedAt => a.created_at.cmp(&b.created_at),
        SortKey::Total => a.total_amount.cmp(&b.total_amount),
        SortKey::Status => status_rank(a.status).cmp(&status_rank(b.status)),
        SortKey::AreaName => a.area_name.to_lowercase().cmp(&b.area_name.to_lowercase()),
    }
}
