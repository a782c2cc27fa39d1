//! In-memory order service for composer tests.
//!
//! Enforces one order per area per business day like the real backend and
//! lets a test hold, fail or slow down individual calls.

#![allow(dead_code)]

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone, Utc};
use tokio::sync::Notify;

use order_admission::domain::order::{
    Area, AreaId, AvailabilityResult, DateRange, ListResult, Order, OrderId, OrderStatus,
};
use order_admission::domain::ports::{AreaDirectory, OrderGateway};
use order_admission::domain::draft::ValidatedOrder;
use order_admission::{
    BusinessClock, Config, DraftLine, FrozenClock, GatewayError, OrderDraft,
};

pub fn lima() -> FixedOffset {
    FixedOffset::west_opt(5 * 3600).unwrap()
}

/// 2024-06-01 10:00 in Lima.
pub fn now() -> DateTime<Utc> {
    lima()
        .with_ymd_and_hms(2024, 6, 1, 10, 0, 0)
        .unwrap()
        .with_timezone(&Utc)
}

pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
}

pub fn clock() -> FrozenClock {
    FrozenClock::new(now(), lima())
}

/// Clock the test moves by hand; clones share the same instant.
#[derive(Clone)]
pub struct SteppingClock {
    at: Arc<Mutex<DateTime<Utc>>>,
}

impl SteppingClock {
    pub fn starting_at(at: DateTime<Utc>) -> Self {
        Self {
            at: Arc::new(Mutex::new(at)),
        }
    }

    pub fn set(&self, at: DateTime<Utc>) {
        *self.at.lock().unwrap() = at;
    }
}

impl BusinessClock for SteppingClock {
    fn offset(&self) -> FixedOffset {
        lima()
    }

    fn now_utc(&self) -> DateTime<Utc> {
        *self.at.lock().unwrap()
    }
}

pub fn config() -> Config {
    Config {
        check_timeout: Duration::from_millis(200),
        submit_unlock_after: Duration::from_millis(100),
        ..Config::default()
    }
}

pub fn dec(s: &str) -> BigDecimal {
    BigDecimal::from_str(s).unwrap()
}

/// Draft for user 7 with two valid lines.
pub fn draft() -> OrderDraft {
    let mut draft = OrderDraft::for_user(7);
    draft.push_line(DraftLine::new(10, 1, dec("2"), dec("3.335")));
    draft.push_line(DraftLine::new(11, 2, dec("1"), dec("1.005")));
    draft
}

#[derive(Default)]
struct Store {
    orders: Vec<(NaiveDate, Order)>,
    next_id: OrderId,
    fail_checks: bool,
    check_delay: Option<Duration>,
    next_write_error: Option<GatewayError>,
}

#[derive(Default)]
pub struct InMemoryGateway {
    store: Mutex<Store>,
    check_gates: Mutex<HashMap<AreaId, Arc<Notify>>>,
    write_gate: Mutex<Option<Arc<Notify>>>,
    areas: Mutex<Vec<Area>>,
    pub check_calls: AtomicUsize,
    pub create_calls: AtomicUsize,
    pub update_calls: AtomicUsize,
    pub area_calls: AtomicUsize,
}

impl InMemoryGateway {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Places an order for `area_id` on `date` directly in the store, as
    /// another session would.
    pub fn insert_existing(&self, area_id: AreaId, date: NaiveDate) -> OrderId {
        let mut store = self.store.lock().unwrap();
        store.next_id += 1;
        let id = 1000 + store.next_id;
        let order = Order {
            id,
            user_id: 99,
            area_id,
            status: OrderStatus::Created,
            total_amount: dec("1"),
            observation: None,
            created_at: now(),
            items: vec![],
        };
        store.orders.push((date, order));
        id
    }

    pub fn fail_checks(&self, fail: bool) {
        self.store.lock().unwrap().fail_checks = fail;
    }

    pub fn delay_checks(&self, delay: Duration) {
        self.store.lock().unwrap().check_delay = Some(delay);
    }

    pub fn fail_next_write(&self, error: GatewayError) {
        self.store.lock().unwrap().next_write_error = Some(error);
    }

    /// Checks for `area_id` wait until the returned handle is notified.
    pub fn hold_checks(&self, area_id: AreaId) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.check_gates
            .lock()
            .unwrap()
            .insert(area_id, Arc::clone(&gate));
        gate
    }

    /// The next create/update waits until the returned handle is notified.
    pub fn hold_next_write(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.write_gate.lock().unwrap() = Some(Arc::clone(&gate));
        gate
    }

    pub fn set_areas(&self, areas: Vec<Area>) {
        *self.areas.lock().unwrap() = areas;
    }

    pub fn orders(&self) -> Vec<Order> {
        self.store
            .lock()
            .unwrap()
            .orders
            .iter()
            .map(|(_, o)| o.clone())
            .collect()
    }

    pub fn checks(&self) -> usize {
        self.check_calls.load(Ordering::SeqCst)
    }

    pub fn creates(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    pub fn updates(&self) -> usize {
        self.update_calls.load(Ordering::SeqCst)
    }

    async fn wait_write_gate(&self) {
        let gate = self.write_gate.lock().unwrap().take();
        if let Some(gate) = gate {
            gate.notified().await;
        }
    }

    fn take_write_error(&self) -> Option<GatewayError> {
        self.store.lock().unwrap().next_write_error.take()
    }
}

#[async_trait]
impl OrderGateway for InMemoryGateway {
    async fn check_exists(
        &self,
        area_id: AreaId,
        date: NaiveDate,
    ) -> Result<AvailabilityResult, GatewayError> {
        self.check_calls.fetch_add(1, Ordering::SeqCst);

        let gate = self.check_gates.lock().unwrap().get(&area_id).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        let (fail, delay) = {
            let store = self.store.lock().unwrap();
            (store.fail_checks, store.check_delay)
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if fail {
            return Err(GatewayError::Transport("connection reset".to_string()));
        }

        let store = self.store.lock().unwrap();
        Ok(store
            .orders
            .iter()
            .find(|(d, o)| *d == date && o.area_id == area_id)
            .map(|(_, o)| AvailabilityResult::taken(Some(o.id)))
            .unwrap_or_else(AvailabilityResult::free))
    }

    async fn create(&self, order: &ValidatedOrder) -> Result<Order, GatewayError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        self.wait_write_gate().await;
        if let Some(e) = self.take_write_error() {
            return Err(e);
        }

        let mut store = self.store.lock().unwrap();
        let day = today();
        if store
            .orders
            .iter()
            .any(|(d, o)| *d == day && o.area_id == order.area_id)
        {
            return Err(GatewayError::Conflict(format!(
                "Area {} already has an order for {}",
                order.area_id, day
            )));
        }
        store.next_id += 1;
        let created = Order {
            id: store.next_id,
            user_id: order.user_id,
            area_id: order.area_id,
            status: order.status,
            total_amount: order.total_amount.clone(),
            observation: order.observation.clone(),
            created_at: now(),
            items: order.items.clone(),
        };
        store.orders.push((day, created.clone()));
        Ok(created)
    }

    async fn update(&self, id: OrderId, order: &ValidatedOrder) -> Result<Order, GatewayError> {
        self.update_calls.fetch_add(1, Ordering::SeqCst);
        self.wait_write_gate().await;
        if let Some(e) = self.take_write_error() {
            return Err(e);
        }

        let mut store = self.store.lock().unwrap();
        let (_, existing) = store
            .orders
            .iter_mut()
            .find(|(_, o)| o.id == id)
            .ok_or(GatewayError::NotFound)?;
        existing.status = order.status;
        existing.observation = order.observation.clone();
        existing.items = order.items.clone();
        existing.total_amount = order.total_amount.clone();
        Ok(existing.clone())
    }

    async fn find_by_id(&self, id: OrderId) -> Result<Option<Order>, GatewayError> {
        Ok(self.orders().into_iter().find(|o| o.id == id))
    }

    async fn list(&self, page: i64, limit: i64) -> Result<ListResult, GatewayError> {
        let all = self.orders();
        let total = all.len() as i64;
        let items = all
            .into_iter()
            .skip(((page.max(1) - 1) * limit) as usize)
            .take(limit as usize)
            .collect();
        Ok(ListResult { items, total })
    }

    async fn filter(&self, range: DateRange) -> Result<Vec<Order>, GatewayError> {
        let store = self.store.lock().unwrap();
        Ok(store
            .orders
            .iter()
            .filter(|(d, _)| *d >= range.start && *d <= range.end)
            .map(|(_, o)| o.clone())
            .collect())
    }

    async fn delete(&self, id: OrderId) -> Result<(), GatewayError> {
        let mut store = self.store.lock().unwrap();
        let before = store.orders.len();
        store.orders.retain(|(_, o)| o.id != id);
        if store.orders.len() == before {
            Err(GatewayError::NotFound)
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl AreaDirectory for InMemoryGateway {
    async fn list_areas(&self) -> Result<Vec<Area>, GatewayError> {
        self.area_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.areas.lock().unwrap().clone())
    }
}
