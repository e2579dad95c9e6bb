//! Status poller behavior on a paused clock.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use acquiring::models::{PaymentId, ResponseStatus};
use acquiring::poller::StatusPoller;
use acquiring::Error;
use acquiring_integration_tests::setup_tracing;
use anyhow::Result;
use futures::StreamExt;

struct Script {
    statuses: Mutex<VecDeque<ResponseStatus>>,
    calls: Mutex<u32>,
}

impl Script {
    fn new(statuses: Vec<ResponseStatus>) -> Arc<Self> {
        Arc::new(Self {
            statuses: Mutex::new(statuses.into()),
            calls: Mutex::new(0),
        })
    }

    fn next(&self) -> Option<ResponseStatus> {
        *self.calls.lock().unwrap() += 1;
        self.statuses.lock().unwrap().pop_front()
    }

    fn calls(&self) -> u32 {
        *self.calls.lock().unwrap()
    }
}

fn accessor(
    script: Arc<Script>,
) -> impl FnMut(PaymentId) -> std::future::Ready<Result<Option<ResponseStatus>, Error>> {
    move |_| std::future::ready(Ok(script.next()))
}

/// AUTHORIZED on the third tick after two NEWs: three emissions, success,
/// and exactly two delays slept.
#[tokio::test(start_paused = true)]
async fn authorized_on_third_poll_takes_two_delays() -> Result<()> {
    setup_tracing();
    let script = Script::new(vec![
        ResponseStatus::New,
        ResponseStatus::New,
        ResponseStatus::Authorized,
    ]);
    let poller = StatusPoller::new(10, Duration::from_millis(3000));

    let started = tokio::time::Instant::now();
    let items: Vec<_> = poller
        .poll(PaymentId(1), accessor(script.clone()))
        .collect()
        .await;
    let elapsed = started.elapsed();

    let statuses: Vec<_> = items.into_iter().collect::<Result<Vec<_>, _>>()?;
    assert_eq!(
        statuses,
        vec![
            ResponseStatus::New,
            ResponseStatus::New,
            ResponseStatus::Authorized,
        ]
    );
    assert_eq!(script.calls(), 3);
    assert_eq!(elapsed, Duration::from_millis(6000));
    Ok(())
}

/// REJECTED stops polling immediately with a rejection-tagged error.
#[tokio::test(start_paused = true)]
async fn rejected_fails_without_further_polling() -> Result<()> {
    setup_tracing();
    let script = Script::new(vec![
        ResponseStatus::New,
        ResponseStatus::Rejected,
        ResponseStatus::Confirmed,
    ]);
    let poller = StatusPoller::new(10, Duration::from_millis(3000));

    let items: Vec<_> = poller
        .poll(PaymentId(5), accessor(script.clone()))
        .collect()
        .await;

    assert_eq!(script.calls(), 2, "no polling after REJECTED");
    assert!(matches!(items[0], Ok(ResponseStatus::New)));
    assert!(matches!(items[1], Ok(ResponseStatus::Rejected)));
    match items.last() {
        Some(Err(Error::Rejected { payment_id, status })) => {
            assert_eq!(*payment_id, PaymentId(5));
            assert_eq!(*status, ResponseStatus::Rejected);
        }
        other => panic!("expected a rejection error, got {other:?}"),
    }
    Ok(())
}

/// DEADLINE_EXPIRED surfaces as a timeout error carrying the status.
#[tokio::test(start_paused = true)]
async fn deadline_expired_fails_as_timeout_with_status() -> Result<()> {
    setup_tracing();
    let script = Script::new(vec![ResponseStatus::DeadlineExpired]);
    let poller = StatusPoller::default();

    let items: Vec<_> = poller
        .poll(PaymentId(8), accessor(script.clone()))
        .collect()
        .await;

    match items.last() {
        Some(Err(Error::StatusTimeout { payment_id, status })) => {
            assert_eq!(*payment_id, PaymentId(8));
            assert_eq!(*status, Some(ResponseStatus::DeadlineExpired));
        }
        other => panic!("expected a timeout error, got {other:?}"),
    }
    Ok(())
}

/// Exhausting the retry budget on non-terminal statuses times out with a
/// null status and spends the whole budget.
#[tokio::test(start_paused = true)]
async fn exhausted_budget_times_out_with_null_status() -> Result<()> {
    setup_tracing();
    let script = Script::new(vec![ResponseStatus::Authorizing; 10]);
    let poller = StatusPoller::new(10, Duration::from_millis(3000));

    let items: Vec<_> = poller
        .poll(PaymentId(2), accessor(script.clone()))
        .collect()
        .await;

    assert_eq!(script.calls(), 10);
    match items.last() {
        Some(Err(Error::StatusTimeout { payment_id, status })) => {
            assert_eq!(*payment_id, PaymentId(2));
            assert_eq!(*status, None);
        }
        other => panic!("expected a timeout error, got {other:?}"),
    }
    Ok(())
}
