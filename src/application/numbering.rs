//! Per-day display numbers for orders.
//!
//! The backend id keeps growing across days; list views show instead the
//! position of an order within its own business day (`#1`, `#2`, ...).

use std::collections::HashMap;
use std::fmt;

use chrono::NaiveDate;

use crate::domain::clock::BusinessClock;
use crate::domain::order::{Order, OrderId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailyNumber {
    pub order_id: OrderId,
    pub date: NaiveDate,
    pub ordinal: u32,
}

impl fmt::Display for DailyNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} #{}", self.date.format("%a %d/%m/%Y"), self.ordinal)
    }
}

/// Numbers every order in `orders` within its business day.
///
/// Orders are ordered by creation time; equal timestamps keep their input
/// order. The result follows that same order.
pub fn number_orders<C: BusinessClock>(orders: &[Order], clock: &C) -> Vec<DailyNumber> {
    let mut sorted: Vec<&Order> = orders.iter().collect();
    sorted.sort_by_key(|o| o.created_at);

    let mut counters: HashMap<NaiveDate, u32> = HashMap::new();
    sorted
        .into_iter()
        .map(|order| {
            let date = clock.business_date_of(order.created_at);
            let ordinal = counters.entry(date).or_insert(0);
            *ordinal += 1;
            DailyNumber {
                order_id: order.id,
                date,
                ordinal: *ordinal,
            }
        })
        .collect()
}

/// Number of `order` among `same_day`. Returns `None` when the order is not
/// part of the collection.
pub fn daily_number<C: BusinessClock>(
    order: &Order,
    same_day: &[Order],
    clock: &C,
) -> Option<DailyNumber> {
    number_orders(same_day, clock)
        .into_iter()
        .find(|n| n.order_id == order.id)
}

/// Lookup table from order id to its daily number.
pub fn index_by_order<C: BusinessClock>(
    orders: &[Order],
    clock: &C,
) -> HashMap<OrderId, DailyNumber> {
    number_orders(orders, clock)
        .into_iter()
        .map(|n| (n.order_id, n))
        .collect()
}
