//! Order composition sessions.
//!
//! One [`OrderComposer`] backs one open order form: the admin new-order page,
//! the fast-order page or the cart checkout. All three follow the same
//! admission contract:
//!
//! ```text
//! SelectingArea -> Checking -> { Available | Blocked | CheckFailed }
//! Available -> Submitting -> { Submitted | Blocked | Available }
//! ```
//!
//! Only `Available` may submit. Submission validates the draft locally,
//! re-checks availability and only then writes. A 409 from the server moves
//! the session to `Blocked` even when the last check said the area was free.
//!
//! Methods take `&self` so one session can be driven from concurrent tasks
//! (an area change racing a pending check, a double click on submit). Every
//! selection, submission start and close bumps an epoch; async work applies
//! its result only while the epoch it started under is still current. A save
//! that completes after its submission lock was released is the exception:
//! the order exists, so the form either finishes the submission or blocks.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::NaiveDate;
use tokio::time::Instant;
use uuid::Uuid;

use crate::config::Config;
use crate::domain::clock::BusinessClock;
use crate::domain::draft::OrderDraft;
use crate::domain::errors::ValidationError;
use crate::domain::order::{AreaId, Order, OrderId, OrderStatus};
use crate::domain::ports::OrderGateway;
use crate::errors::ComposeError;

use super::availability::AreaAvailabilityChecker;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryPoint {
    AdminForm,
    FastOrder,
    CartCheckout,
}

impl EntryPoint {
    /// Only the admin form may create an order directly in a later status.
    pub fn allows_status_override(&self) -> bool {
        matches!(self, EntryPoint::AdminForm)
    }
}

impl fmt::Display for EntryPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EntryPoint::AdminForm => "admin-form",
            EntryPoint::FastOrder => "fast-order",
            EntryPoint::CartCheckout => "cart-checkout",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComposerState {
    SelectingArea,
    Checking,
    Available,
    Blocked { existing_order_id: Option<OrderId> },
    CheckFailed { reason: String },
    Submitting,
    Submitted { order_id: OrderId },
}

impl ComposerState {
    pub fn can_submit(&self) -> bool {
        matches!(self, ComposerState::Available)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComposerSnapshot {
    pub session_id: Uuid,
    pub entry_point: EntryPoint,
    pub editing: Option<OrderId>,
    pub state: ComposerState,
    pub area_id: Option<AreaId>,
    pub business_date: Option<NaiveDate>,
    pub draft: OrderDraft,
}

/// A submission whose lock was released while its write was still pending.
struct ReleasedSubmission {
    epoch: u64,
    released_epoch: u64,
    draft: OrderDraft,
}

#[derive(Debug, Clone, Copy)]
struct EditTarget {
    order_id: OrderId,
    area_id: AreaId,
    business_date: NaiveDate,
}

struct Session {
    state: ComposerState,
    area_id: Option<AreaId>,
    date: Option<NaiveDate>,
    draft: OrderDraft,
    epoch: u64,
    submitting_since: Option<Instant>,
    released: Option<ReleasedSubmission>,
    closed: bool,
}

impl Session {
    fn ensure_open(&self) -> Result<(), ComposeError> {
        if self.closed {
            Err(ComposeError::Closed)
        } else {
            Ok(())
        }
    }

    fn is_current(&self, epoch: u64) -> bool {
        !self.closed && self.epoch == epoch
    }

    /// Releases a submission lock held longer than `unlock_after`. A late
    /// success is still applied by [`Session::apply_late_save`].
    fn release_stale_lock(&mut self, unlock_after: Duration) {
        let expired = matches!(self.state, ComposerState::Submitting)
            && self
                .submitting_since
                .map_or(false, |since| since.elapsed() >= unlock_after);
        if expired {
            log::warn!(
                "Submission still pending after {:?}, releasing the form",
                unlock_after
            );
            self.released = Some(ReleasedSubmission {
                epoch: self.epoch,
                released_epoch: self.epoch + 1,
                draft: self.draft.clone(),
            });
            self.state = ComposerState::Available;
            self.submitting_since = None;
            self.epoch += 1;
        }
    }

    fn finish_submission(&mut self, order_id: OrderId) {
        self.epoch += 1;
        self.state = ComposerState::Submitted { order_id };
        self.submitting_since = None;
        self.released = None;
        self.area_id = None;
        self.date = None;
        let user_id = self.draft.user_id;
        self.draft = OrderDraft {
            user_id,
            ..OrderDraft::default()
        };
    }

    /// Applies a write that succeeded after its lock was released. When the
    /// form is untouched since the release the save completes normally;
    /// otherwise an idle form on the same area and day is blocked by it.
    /// Returns whether the session changed.
    fn apply_late_save(
        &mut self,
        epoch: u64,
        saved: &Order,
        date: NaiveDate,
        creating: bool,
    ) -> bool {
        if self.closed {
            return false;
        }
        let released = match self.released.take() {
            Some(released) if released.epoch == epoch => released,
            other => {
                self.released = other;
                return false;
            }
        };
        let same_target = self.area_id == Some(saved.area_id) && self.date == Some(date);
        if same_target && self.epoch == released.released_epoch && self.draft == released.draft {
            self.finish_submission(saved.id);
            return true;
        }
        if creating && same_target && self.state == ComposerState::Available {
            self.state = ComposerState::Blocked {
                existing_order_id: Some(saved.id),
            };
            return true;
        }
        false
    }

    fn begin_check(&mut self, area_id: AreaId, date: NaiveDate) -> u64 {
        self.epoch += 1;
        self.area_id = Some(area_id);
        self.date = Some(date);
        self.draft.area_id = Some(area_id);
        self.state = ComposerState::Checking;
        self.epoch
    }
}

pub struct OrderComposer<G, C> {
    session_id: Uuid,
    entry_point: EntryPoint,
    editing: Option<EditTarget>,
    checker: AreaAvailabilityChecker<G>,
    clock: C,
    submit_unlock_after: Duration,
    session: Mutex<Session>,
}

impl<G: OrderGateway, C: BusinessClock> OrderComposer<G, C> {
    /// Starts a session for a new order.
    pub fn new(
        gateway: Arc<G>,
        clock: C,
        config: &Config,
        entry_point: EntryPoint,
        draft: OrderDraft,
    ) -> Self {
        let mut draft = draft;
        draft.area_id = None;
        Self::build(gateway, clock, config, entry_point, None, draft)
    }

    /// Starts a session editing `order`. The area is fixed to the order's and
    /// availability is evaluated for the business day the order was placed
    /// on; the order itself does not count as a conflict.
    pub fn for_existing(
        gateway: Arc<G>,
        clock: C,
        config: &Config,
        entry_point: EntryPoint,
        order: &Order,
    ) -> Self {
        let target = EditTarget {
            order_id: order.id,
            area_id: order.area_id,
            business_date: clock.business_date_of(order.created_at),
        };
        let mut draft = OrderDraft::from_order(order);
        draft.area_id = None;
        Self::build(gateway, clock, config, entry_point, Some(target), draft)
    }

    fn build(
        gateway: Arc<G>,
        clock: C,
        config: &Config,
        entry_point: EntryPoint,
        editing: Option<EditTarget>,
        draft: OrderDraft,
    ) -> Self {
        let session_id = Uuid::new_v4();
        log::debug!(
            "Composer {} opened ({}, editing={:?})",
            session_id,
            entry_point,
            editing.map(|t| t.order_id)
        );
        Self {
            session_id,
            entry_point,
            editing,
            checker: AreaAvailabilityChecker::new(gateway, config.check_timeout),
            clock,
            submit_unlock_after: config.submit_unlock_after,
            session: Mutex::new(Session {
                state: ComposerState::SelectingArea,
                area_id: None,
                date: None,
                draft,
                epoch: 0,
                submitting_since: None,
                released: None,
                closed: false,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn editing_id(&self) -> Option<OrderId> {
        self.editing.map(|t| t.order_id)
    }

    fn check_date(&self) -> NaiveDate {
        match self.editing {
            Some(target) => target.business_date,
            None => self.clock.today(),
        }
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn state(&self) -> ComposerState {
        self.snapshot().state
    }

    pub fn snapshot(&self) -> ComposerSnapshot {
        let mut s = self.lock();
        s.release_stale_lock(self.submit_unlock_after);
        ComposerSnapshot {
            session_id: self.session_id,
            entry_point: self.entry_point,
            editing: self.editing_id(),
            state: s.state.clone(),
            area_id: s.area_id,
            business_date: s.date,
            draft: s.draft.clone(),
        }
    }

    /// Selects the target area and checks it. Selecting the area that is
    /// already selected for the same day is a no-op unless its last check
    /// failed.
    pub async fn select_area(&self, area_id: AreaId) -> Result<ComposerState, ComposeError> {
        if area_id <= 0 {
            return Err(ValidationError::InvalidArea(area_id).into());
        }
        let date = self.check_date();

        let epoch = {
            let mut s = self.lock();
            s.ensure_open()?;
            s.release_stale_lock(self.submit_unlock_after);
            if s.state == ComposerState::Submitting {
                return Err(ComposeError::SubmissionInProgress);
            }
            if let Some(target) = self.editing {
                if target.area_id != area_id {
                    return Err(ValidationError::AreaLocked.into());
                }
            }
            let settled_for_same_key = s.area_id == Some(area_id)
                && s.date == Some(date)
                && matches!(
                    s.state,
                    ComposerState::Checking
                        | ComposerState::Available
                        | ComposerState::Blocked { .. }
                );
            if settled_for_same_key {
                log::debug!(
                    "Composer {}: area {} already checked for {}",
                    self.session_id,
                    area_id,
                    date
                );
                return Ok(s.state.clone());
            }
            s.begin_check(area_id, date)
        };

        self.run_check(epoch, area_id, date).await
    }

    /// Checks the current area again, typically after a failed check.
    pub async fn retry_check(&self) -> Result<ComposerState, ComposeError> {
        let (epoch, area_id, date) = {
            let mut s = self.lock();
            s.ensure_open()?;
            s.release_stale_lock(self.submit_unlock_after);
            if s.state == ComposerState::Submitting {
                return Err(ComposeError::SubmissionInProgress);
            }
            let area_id = s.area_id.ok_or(ValidationError::MissingArea)?;
            let date = self.check_date();
            (s.begin_check(area_id, date), area_id, date)
        };

        self.run_check(epoch, area_id, date).await
    }

    async fn run_check(
        &self,
        epoch: u64,
        area_id: AreaId,
        date: NaiveDate,
    ) -> Result<ComposerState, ComposeError> {
        let outcome = self.checker.check(area_id, date).await;

        let mut s = self.lock();
        s.ensure_open()?;
        if s.epoch != epoch {
            log::debug!(
                "Composer {}: discarding late availability result for area {}",
                self.session_id,
                area_id
            );
            return Ok(s.state.clone());
        }

        match outcome {
            Ok(result) => {
                s.state = if result.blocks(self.editing_id()) {
                    log::info!(
                        "Composer {}: area {} already has order {:?} on {}",
                        self.session_id,
                        area_id,
                        result.order_id,
                        date
                    );
                    ComposerState::Blocked {
                        existing_order_id: result.order_id,
                    }
                } else {
                    ComposerState::Available
                };
                Ok(s.state.clone())
            }
            Err(e) => {
                s.state = ComposerState::CheckFailed {
                    reason: e.to_string(),
                };
                Err(e)
            }
        }
    }

    /// Applies `f` to the draft. The selected area is owned by
    /// [`select_area`](Self::select_area) and cannot be changed here.
    pub fn update_draft<F, R>(&self, f: F) -> Result<R, ComposeError>
    where
        F: FnOnce(&mut OrderDraft) -> R,
    {
        let mut s = self.lock();
        s.ensure_open()?;
        s.release_stale_lock(self.submit_unlock_after);
        if s.state == ComposerState::Submitting {
            return Err(ComposeError::SubmissionInProgress);
        }
        let out = f(&mut s.draft);
        s.draft.area_id = s.area_id;
        Ok(out)
    }

    /// Sets a line's quantity from user input, keeping two decimals.
    pub fn set_quantity(&self, index: usize, input: &str) -> Result<(), ComposeError> {
        self.update_draft(|draft| draft.set_quantity(index, input))??;
        Ok(())
    }

    /// Validates, re-checks availability and writes the order.
    ///
    /// Returns the saved order so the caller can show its detail view. A call
    /// made while another submission is pending returns
    /// [`ComposeError::SubmissionInProgress`] and does nothing.
    pub async fn submit(&self) -> Result<Order, ComposeError> {
        let (epoch, order, area_id, date) = {
            let mut s = self.lock();
            s.ensure_open()?;
            s.release_stale_lock(self.submit_unlock_after);
            if s.state == ComposerState::Submitting {
                log::debug!("Composer {}: submit ignored, already submitting", self.session_id);
                return Err(ComposeError::SubmissionInProgress);
            }

            let mut order = s.draft.validate()?;
            if self.editing.is_none() && !self.entry_point.allows_status_override() {
                order.status = OrderStatus::Created;
            }
            if !s.state.can_submit() {
                return Err(ComposeError::NotAvailable);
            }
            let area_id = s.area_id.ok_or(ValidationError::MissingArea)?;
            // The re-check below targets the current business day, which may
            // have rolled over since the area was checked.
            let date = self.check_date();
            if s.date != Some(date) {
                log::info!(
                    "Composer {}: business day moved from {:?} to {}, re-checking area {}",
                    self.session_id,
                    s.date,
                    date,
                    area_id
                );
                s.date = Some(date);
            }

            s.epoch += 1;
            s.state = ComposerState::Submitting;
            s.submitting_since = Some(Instant::now());
            (s.epoch, order, area_id, date)
        };

        // Another order may have been placed since the area was selected.
        match self.checker.check(area_id, date).await {
            Ok(result) if result.blocks(self.editing_id()) => {
                log::warn!(
                    "Composer {}: order {:?} appeared for area {} on {} before submission",
                    self.session_id,
                    result.order_id,
                    area_id,
                    date
                );
                self.settle(
                    epoch,
                    ComposerState::Blocked {
                        existing_order_id: result.order_id,
                    },
                );
                return Err(ComposeError::duplicate(result.order_id));
            }
            Ok(_) => {}
            Err(e) => {
                self.settle(
                    epoch,
                    ComposerState::CheckFailed {
                        reason: e.to_string(),
                    },
                );
                return Err(e);
            }
        }

        {
            let s = self.lock();
            if !s.is_current(epoch) {
                return Err(if s.closed {
                    ComposeError::Closed
                } else {
                    ComposeError::Transport(
                        "The submission took too long, please try again".to_string(),
                    )
                });
            }
        }

        let gateway = self.checker.gateway();
        let written = match self.editing {
            Some(target) => gateway.update(target.order_id, &order).await,
            None => gateway.create(&order).await,
        };

        let mut s = self.lock();
        let current = s.is_current(epoch);
        match written {
            Ok(saved) => {
                log::info!(
                    "Composer {} ({}): order {} saved for area {} on {}",
                    self.session_id,
                    self.entry_point,
                    saved.id,
                    area_id,
                    date
                );
                if current {
                    s.finish_submission(saved.id);
                } else if s.apply_late_save(epoch, &saved, date, self.editing.is_none()) {
                    log::info!(
                        "Composer {}: late save of order {} applied as {:?}",
                        self.session_id,
                        saved.id,
                        s.state
                    );
                }
                Ok(saved)
            }
            Err(e) => {
                let err = ComposeError::from(e.clone());
                log::warn!(
                    "Composer {}: saving order for area {} failed: {}",
                    self.session_id,
                    area_id,
                    e
                );
                if current {
                    s.submitting_since = None;
                    s.state = match &err {
                        ComposeError::DuplicateRejected {
                            existing_order_id, ..
                        } => ComposerState::Blocked {
                            existing_order_id: *existing_order_id,
                        },
                        _ => ComposerState::Available,
                    };
                }
                Err(err)
            }
        }
    }

    fn settle(&self, epoch: u64, state: ComposerState) {
        let mut s = self.lock();
        if s.is_current(epoch) {
            s.state = state;
            s.submitting_since = None;
        }
    }

    /// Ends the session. Results of work still in flight are dropped.
    pub fn close(&self) {
        let mut s = self.lock();
        if !s.closed {
            s.closed = true;
            s.epoch += 1;
            log::debug!("Composer {} closed", self.session_id);
        }
    }
}
