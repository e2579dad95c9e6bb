//! Generic retry-with-delay polling over a status accessor.
//!
//! [`StatusPoller::poll`] yields a lazy stream of statuses for one payment
//! session. The stream is restartable per call but not resumable
//! mid-sequence: dropping it cancels the in-flight poll, and a fresh call
//! starts over with a full retry budget. The poller has no
//! payment-method-specific knowledge; every process reuses it as-is.

use std::future::Future;
use std::time::Duration;

use futures::stream::{self, Stream};

use crate::models::{PaymentId, ResponseStatus};
use crate::Error;

/// Default number of status fetches before giving up.
pub const DEFAULT_RETRIES_COUNT: u32 = 10;
/// Default pause between status fetches.
pub const DEFAULT_DELAY: Duration = Duration::from_millis(3000);

/// Polls a status accessor until a terminal status or an exhausted budget.
#[derive(Debug, Clone, Copy)]
pub struct StatusPoller {
    retries_count: u32,
    delay: Duration,
}

impl Default for StatusPoller {
    fn default() -> Self {
        Self {
            retries_count: DEFAULT_RETRIES_COUNT,
            delay: DEFAULT_DELAY,
        }
    }
}

enum Step {
    Poll { attempt: u32 },
    Fail(Error),
    Done,
}

impl StatusPoller {
    /// Poller with a custom retry budget and delay.
    pub fn new(retries_count: u32, delay: Duration) -> Self {
        Self {
            retries_count,
            delay,
        }
    }

    /// Poll `get_status` until the payment reaches a terminal state.
    ///
    /// Each tick calls the accessor and emits the status it returned, when
    /// any. Accessor errors are swallowed and count as "no status yet";
    /// a transient transport failure spends a retry instead of ending the
    /// stream. Termination:
    ///
    /// - success-terminal status → the stream ends normally after emitting;
    /// - [`ResponseStatus::Rejected`] → [`Error::Rejected`];
    /// - [`ResponseStatus::DeadlineExpired`] → [`Error::StatusTimeout`]
    ///   carrying that status;
    /// - budget exhausted → [`Error::StatusTimeout`] with no status.
    ///
    /// The delay is slept between ticks, not before the first one.
    pub fn poll<F, Fut>(
        &self,
        payment_id: PaymentId,
        get_status: F,
    ) -> impl Stream<Item = Result<ResponseStatus, Error>>
    where
        F: FnMut(PaymentId) -> Fut,
        Fut: Future<Output = Result<Option<ResponseStatus>, Error>>,
    {
        let retries_count = self.retries_count;
        let delay = self.delay;

        stream::try_unfold(
            (Step::Poll { attempt: 0 }, get_status),
            move |(mut step, mut get_status)| async move {
                loop {
                    let attempt = match step {
                        Step::Done => return Ok(None),
                        Step::Fail(error) => return Err(error),
                        Step::Poll { attempt } => attempt,
                    };
                    if attempt >= retries_count {
                        return Err(Error::StatusTimeout {
                            payment_id,
                            status: None,
                        });
                    }
                    if attempt > 0 {
                        tokio::time::sleep(delay).await;
                    }

                    let status = match get_status(payment_id).await {
                        Ok(status) => status,
                        Err(error) => {
                            tracing::debug!("status fetch failed, treating as no status: {error}");
                            None
                        }
                    };
                    let Some(status) = status else {
                        step = Step::Poll {
                            attempt: attempt + 1,
                        };
                        continue;
                    };

                    tracing::debug!("payment {payment_id} status {status}");
                    let next = if status.is_success_terminal() {
                        Step::Done
                    } else if status == ResponseStatus::Rejected {
                        Step::Fail(Error::Rejected { payment_id, status })
                    } else if status == ResponseStatus::DeadlineExpired {
                        Step::Fail(Error::StatusTimeout {
                            payment_id,
                            status: Some(status),
                        })
                    } else {
                        Step::Poll {
                            attempt: attempt + 1,
                        }
                    };
                    return Ok(Some((status, (next, get_status))));
                }
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    use futures::TryStreamExt;

    use super::*;

    fn scripted(
        statuses: Vec<Option<ResponseStatus>>,
    ) -> impl FnMut(PaymentId) -> std::future::Ready<Result<Option<ResponseStatus>, Error>> {
        let queue = Arc::new(Mutex::new(VecDeque::from(statuses)));
        move |_| {
            let next = queue.lock().unwrap().pop_front().flatten();
            std::future::ready(Ok(next))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn success_status_ends_the_stream() {
        let poller = StatusPoller::default();
        let statuses: Vec<ResponseStatus> = poller
            .poll(
                PaymentId(1),
                scripted(vec![
                    Some(ResponseStatus::Authorizing),
                    Some(ResponseStatus::Confirmed),
                ]),
            )
            .try_collect()
            .await
            .unwrap();
        assert_eq!(
            statuses,
            vec![ResponseStatus::Authorizing, ResponseStatus::Confirmed]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_budget_fails_with_no_status() {
        let poller = StatusPoller::new(3, Duration::from_millis(100));
        let result: Result<Vec<_>, _> = poller
            .poll(
                PaymentId(7),
                scripted(vec![
                    Some(ResponseStatus::New),
                    Some(ResponseStatus::New),
                    Some(ResponseStatus::New),
                ]),
            )
            .try_collect()
            .await;
        match result {
            Err(Error::StatusTimeout { payment_id, status }) => {
                assert_eq!(payment_id, PaymentId(7));
                assert_eq!(status, None);
            }
            other => panic!("expected StatusTimeout, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn accessor_errors_spend_a_retry_without_emitting() {
        let attempts = Arc::new(Mutex::new(0u32));
        let counter = attempts.clone();
        let poller = StatusPoller::new(2, Duration::from_millis(100));
        let result: Result<Vec<ResponseStatus>, _> = poller
            .poll(PaymentId(3), move |_| {
                *counter.lock().unwrap() += 1;
                std::future::ready(Err(Error::Custom("connection reset".to_string())))
            })
            .try_collect()
            .await;
        assert!(matches!(
            result,
            Err(Error::StatusTimeout { status: None, .. })
        ));
        assert_eq!(*attempts.lock().unwrap(), 2);
    }
}
