mod common;

use std::sync::Arc;
use std::time::Duration;

use order_admission::domain::order::AvailabilityResult;
use order_admission::{AreaAvailabilityChecker, ComposeError, ValidationError};

use common::{today, InMemoryGateway};

fn checker(gateway: &Arc<InMemoryGateway>) -> AreaAvailabilityChecker<InMemoryGateway> {
    AreaAvailabilityChecker::new(gateway.clone(), Duration::from_millis(200))
}

#[tokio::test]
async fn repeated_checks_agree_while_nothing_changes() {
    let gateway = InMemoryGateway::new();
    let checker = checker(&gateway);

    let first = checker.check(3, today()).await.unwrap();
    let second = checker.check(3, today()).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(first, AvailabilityResult::free());

    let id = gateway.insert_existing(3, today());
    let first = checker.check(3, today()).await.unwrap();
    let second = checker.check(3, today()).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(first, AvailabilityResult::taken(Some(id)));
}

#[tokio::test]
async fn invalid_area_is_rejected_locally() {
    let gateway = InMemoryGateway::new();
    let checker = checker(&gateway);

    assert_eq!(
        checker.check(-4, today()).await,
        Err(ComposeError::Validation(ValidationError::InvalidArea(-4)))
    );
    assert_eq!(gateway.checks(), 0);
}

#[tokio::test]
async fn typed_date_must_be_a_calendar_date() {
    let gateway = InMemoryGateway::new();
    let checker = checker(&gateway);

    assert_eq!(
        checker.check_str(3, "2024-02-30").await,
        Err(ComposeError::Validation(ValidationError::InvalidDate(
            "2024-02-30".to_string()
        )))
    );
    assert!(checker.check_str(3, "2024-06-01").await.is_ok());
    assert_eq!(gateway.checks(), 1);
}

#[tokio::test(start_paused = true)]
async fn transport_error_and_timeout_are_check_failures() {
    let gateway = InMemoryGateway::new();
    let checker = checker(&gateway);

    gateway.fail_checks(true);
    assert!(matches!(
        checker.check(3, today()).await,
        Err(ComposeError::CheckFailed(_))
    ));

    gateway.fail_checks(false);
    gateway.delay_checks(Duration::from_millis(400));
    assert!(matches!(
        checker.check(3, today()).await,
        Err(ComposeError::CheckFailed(_))
    ));
}
