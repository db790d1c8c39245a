//! Polling for File Station background tasks (search, copy/move).

use std::future::Future;
use std::time::Duration;
use tokio::time::{sleep, timeout_at, Instant};
use tokio_util::sync::CancellationToken;

use crate::DsmError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    pub interval: Duration,
    pub timeout: Duration,
}

impl PollSettings {
    pub fn new(interval: Duration, timeout: Duration) -> Self {
        Self { interval, timeout }
    }
}

#[derive(Debug)]
pub(crate) enum PollError {
    TimedOut,
    Cancelled,
    Failed(DsmError),
}

/// Calls `probe` until it reports the task finished, sleeping `interval`
/// between calls. Returns the number of probes issued.
pub(crate) async fn poll_until_finished<F, Fut>(
    settings: PollSettings,
    cancel: &CancellationToken,
    mut probe: F,
) -> Result<u32, PollError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<bool, DsmError>>,
{
    let deadline = Instant::now() + settings.timeout;

    let polling = async {
        let mut polls = 0u32;
        loop {
            polls += 1;
            if probe().await.map_err(PollError::Failed)? {
                return Ok(polls);
            }

            tokio::select! {
                _ = sleep(settings.interval) => {}
                _ = cancel.cancelled() => return Err(PollError::Cancelled),
            }
        }
    };

    tokio::select! {
        result = timeout_at(deadline, polling) => result.unwrap_or(Err(PollError::TimedOut)),
        _ = cancel.cancelled() => Err(PollError::Cancelled),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast() -> PollSettings {
        PollSettings::new(Duration::from_millis(1), Duration::from_secs(5))
    }

    #[tokio::test]
    async fn stops_on_first_finished_report() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let polls = poll_until_finished(fast(), &CancellationToken::new(), move || async move {
            Ok(counter.fetch_add(1, Ordering::SeqCst) == 2)
        })
        .await
        .unwrap();
        assert_eq!(polls, 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn probe_failure_is_returned() {
        let result = poll_until_finished(fast(), &CancellationToken::new(), || async {
            Err(DsmError::InvalidResponse("boom".into()))
        })
        .await;
        assert!(matches!(result, Err(PollError::Failed(_))));
    }

    #[tokio::test]
    async fn times_out() {
        let settings = PollSettings::new(Duration::from_millis(5), Duration::from_millis(30));
        let result =
            poll_until_finished(settings, &CancellationToken::new(), || async { Ok(false) }).await;
        assert!(matches!(result, Err(PollError::TimedOut)));
    }

    #[tokio::test]
    async fn cancellation_wins() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = poll_until_finished(fast(), &cancel, || async { Ok(false) }).await;
        assert!(matches!(result, Err(PollError::Cancelled)));
    }
}
