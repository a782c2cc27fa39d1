use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;

use crate::domain::clock::parse_business_date;
use crate::domain::errors::ValidationError;
use crate::domain::order::{AreaId, AvailabilityResult};
use crate::domain::ports::OrderGateway;
use crate::errors::ComposeError;

/// Asks the order service whether an area already has an order on a day.
///
/// Every failure to get a clean answer (timeout, transport, non-2xx, bad
/// body) is reported as [`ComposeError::CheckFailed`]; callers treat that as
/// blocked.
pub struct AreaAvailabilityChecker<G> {
    gateway: Arc<G>,
    timeout: Duration,
}

impl<G> Clone for AreaAvailabilityChecker<G> {
    fn clone(&self) -> Self {
        Self {
            gateway: Arc::clone(&self.gateway),
            timeout: self.timeout,
        }
    }
}

impl<G: OrderGateway> AreaAvailabilityChecker<G> {
    pub fn new(gateway: Arc<G>, timeout: Duration) -> Self {
        Self { gateway, timeout }
    }

    pub fn gateway(&self) -> &Arc<G> {
        &self.gateway
    }

    pub async fn check(
        &self,
        area_id: AreaId,
        date: NaiveDate,
    ) -> Result<AvailabilityResult, ComposeError> {
        if area_id <= 0 {
            return Err(ValidationError::InvalidArea(area_id).into());
        }

        match tokio::time::timeout(self.timeout, self.gateway.check_exists(area_id, date)).await {
            Ok(Ok(result)) => {
                log::debug!(
                    "Availability for area {} on {}: exists={} order={:?}",
                    area_id,
                    date,
                    result.exists,
                    result.order_id
                );
                Ok(result)
            }
            Ok(Err(e)) => {
                log::warn!("Availability check for area {} on {} failed: {}", area_id, date, e);
                Err(ComposeError::CheckFailed(e.to_string()))
            }
            Err(_) => {
                log::warn!(
                    "Availability check for area {} on {} timed out after {:?}",
                    area_id,
                    date,
                    self.timeout
                );
                Err(ComposeError::CheckFailed(format!(
                    "no answer within {} ms",
                    self.timeout.as_millis()
                )))
            }
        }
    }

    /// Same as [`check`](Self::check) for a `YYYY-MM-DD` date typed by a user.
    pub async fn check_str(
        &self,
        area_id: AreaId,
        date: &str,
    ) -> Result<AvailabilityResult, ComposeError> {
        let date = parse_business_date(date)
            .ok_or_else(|| ValidationError::InvalidDate(date.to_string()))?;
        self.check(area_id, date).await
    }
}
