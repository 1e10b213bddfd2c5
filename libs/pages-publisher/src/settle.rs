use std::future::Future;
use std::time::Duration;

/// How long to wait for GitHub to catch up after an eventually consistent call.
///
/// The wait starts with an unconditional pause, then probes for readiness with
/// exponential backoff. Running out of attempts is not an error: the caller
/// carries on just as it would after a fixed delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettlePolicy {
    pub initial_delay: Duration,
    pub poll_interval: Duration,
    /// Zero turns the policy into a plain fixed delay.
    pub max_attempts: u32,
}

impl SettlePolicy {
    /// After creating a repository, before committing to it.
    pub const REPOSITORY: SettlePolicy = SettlePolicy {
        initial_delay: Duration::from_secs(2),
        poll_interval: Duration::from_secs(1),
        max_attempts: 5,
    };

    /// After enabling Pages, before reporting the live URL.
    pub const PAGES: SettlePolicy = SettlePolicy {
        initial_delay: Duration::from_secs(5),
        poll_interval: Duration::from_secs(2),
        max_attempts: 6,
    };

    /// No waiting at all. One probe is still made.
    pub const fn immediate() -> Self {
        SettlePolicy {
            initial_delay: Duration::ZERO,
            poll_interval: Duration::ZERO,
            max_attempts: 1,
        }
    }

    /// Wait until `probe` reports readiness or the attempts run out.
    /// Returns whether readiness was confirmed.
    pub async fn wait_until<F, Fut>(&self, what: &str, mut probe: F) -> bool
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = bool>,
    {
        tokio::time::sleep(self.initial_delay).await;

        let mut interval = self.poll_interval;
        for attempt in 1..=self.max_attempts {
            if probe().await {
                log::debug!("{what} ready after {attempt} probe(s)");
                return true;
            }
            if attempt < self.max_attempts {
                tokio::time::sleep(interval).await;
                interval = interval.saturating_mul(2);
            }
        }

        if self.max_attempts > 0 {
            log::warn!(
                "{what} not confirmed after {} probe(s), continuing anyway",
                self.max_attempts
            );
        }
        false
    }
}
