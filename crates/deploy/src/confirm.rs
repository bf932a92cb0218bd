//! Seqno confirmation tracking.
//!
//! The ledger applies transactions asynchronously relative to
//! submission. Submitting transfer k+1 before k is included would be
//! rejected (wrong expected seqno) or silently dropped, so the mint
//! loop gates every submission on this tracker: poll the account's
//! seqno until it advances past the submitted one, or give up after a
//! bounded number of attempts.

use std::time::Duration;

use tracing::{debug, trace, warn};

use tonmint_ledger::{Address, LedgerConnection};

/// Polling parameters for a confirmation wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfirmPolicy {
    pub poll_interval: Duration,
    pub max_attempts: u32,
}

impl Default for ConfirmPolicy {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(2),
            max_attempts: 30,
        }
    }
}

/// Terminal outcome of a confirmation wait.
///
/// `TimedOut` is a reported value, not an error: the caller decides
/// whether to abort the run or abandon the affected item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    /// The seqno advanced past the submitted one.
    Confirmed { polls: u32 },
    /// No advancement within the attempt ceiling.
    TimedOut { attempts: u32 },
}

impl Confirmation {
    pub fn is_confirmed(self) -> bool {
        matches!(self, Confirmation::Confirmed { .. })
    }
}

/// Polls an account's seqno until a submitted transfer is applied.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConfirmationTracker {
    policy: ConfirmPolicy,
}

impl ConfirmationTracker {
    pub fn new(policy: ConfirmPolicy) -> Self {
        Self { policy }
    }

    /// Waits until `account`'s seqno is strictly greater than
    /// `submitted_seqno`.
    ///
    /// Each attempt sleeps the poll interval and then reads the seqno.
    /// A failed read is logged and consumes the attempt, so a
    /// persistently unreachable ledger surfaces as `TimedOut`, the one
    /// defined abort signal. Only the calling task is suspended; no
    /// lock is held across polls.
    pub async fn wait_for_confirmation(
        &self,
        ledger: &dyn LedgerConnection,
        account: &Address,
        submitted_seqno: u32,
    ) -> Confirmation {
        for attempt in 1..=self.policy.max_attempts {
            tokio::time::sleep(self.policy.poll_interval).await;

            match ledger.account_seqno(account).await {
                Ok(current) if current > submitted_seqno => {
                    debug!(submitted_seqno, current, polls = attempt, "transfer confirmed");
                    return Confirmation::Confirmed { polls: attempt };
                }
                Ok(current) => {
                    trace!(submitted_seqno, current, attempt, "seqno unchanged");
                }
                Err(e) => {
                    warn!(submitted_seqno, attempt, error = %e, "seqno poll failed");
                }
            }
        }

        warn!(
            submitted_seqno,
            attempts = self.policy.max_attempts,
            "transfer unconfirmed within attempt ceiling"
        );
        Confirmation::TimedOut {
            attempts: self.policy.max_attempts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::future::Future;
    use std::pin::Pin;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};

    use tonmint_ledger::{LedgerError, SealedTransfer};

    /// Ledger mock that replays a script of seqno reads.
    struct ScriptedLedger {
        script: Mutex<VecDeque<Result<u32, ()>>>,
        polls: AtomicU32,
    }

    impl ScriptedLedger {
        fn new(script: impl IntoIterator<Item = Result<u32, ()>>) -> Self {
            Self {
                script: Mutex::new(script.into_iter().collect()),
                polls: AtomicU32::new(0),
            }
        }

        fn polls(&self) -> u32 {
            self.polls.load(Ordering::SeqCst)
        }
    }

    impl LedgerConnection for ScriptedLedger {
        fn account_seqno<'a>(
            &'a self,
            _account: &'a Address,
        ) -> Pin<Box<dyn Future<Output = Result<u32, LedgerError>> + Send + 'a>> {
            self.polls.fetch_add(1, Ordering::SeqCst);
            let next = self.script.lock().unwrap().pop_front();
            Box::pin(async move {
                match next {
                    Some(Ok(seqno)) => Ok(seqno),
                    Some(Err(())) => Err(LedgerError::Rpc {
                        code: 429,
                        message: "scripted failure".into(),
                    }),
                    // Script exhausted: hold the last known state.
                    None => Ok(0),
                }
            })
        }

        fn send<'a>(
            &'a self,
            _transfer: &'a SealedTransfer,
        ) -> Pin<Box<dyn Future<Output = Result<(), LedgerError>> + Send + 'a>> {
            Box::pin(async { Ok(()) })
        }

        fn item_address<'a>(
            &'a self,
            _collection: &'a Address,
            _index: u64,
        ) -> Pin<Box<dyn Future<Output = Result<Address, LedgerError>> + Send + 'a>> {
            Box::pin(async { Ok(Address::new(0, [0; 32])) })
        }

        fn collection_next_index<'a>(
            &'a self,
            _collection: &'a Address,
        ) -> Pin<Box<dyn Future<Output = Result<u64, LedgerError>> + Send + 'a>> {
            Box::pin(async { Ok(0) })
        }
    }

    fn tracker(max_attempts: u32) -> ConfirmationTracker {
        ConfirmationTracker::new(ConfirmPolicy {
            poll_interval: Duration::from_secs(1),
            max_attempts,
        })
    }

    fn account() -> Address {
        Address::new(0, [1; 32])
    }

    #[tokio::test(start_paused = true)]
    async fn times_out_after_exactly_max_attempts() {
        let ledger = ScriptedLedger::new(std::iter::repeat_n(Ok(5), 10));
        let outcome = tracker(4)
            .wait_for_confirmation(&ledger, &account(), 5)
            .await;

        assert_eq!(outcome, Confirmation::TimedOut { attempts: 4 });
        assert_eq!(ledger.polls(), 4, "exactly max_attempts polls");
    }

    #[tokio::test(start_paused = true)]
    async fn confirms_on_second_poll() {
        let ledger = ScriptedLedger::new([Ok(5), Ok(6)]);
        let outcome = tracker(30)
            .wait_for_confirmation(&ledger, &account(), 5)
            .await;

        assert_eq!(outcome, Confirmation::Confirmed { polls: 2 });
        assert_eq!(ledger.polls(), 2, "no polling past confirmation");
    }

    #[tokio::test(start_paused = true)]
    async fn requires_strict_advancement() {
        // Equal seqno means the transfer has not been applied.
        let ledger = ScriptedLedger::new([Ok(5), Ok(5), Ok(6)]);
        let outcome = tracker(30)
            .wait_for_confirmation(&ledger, &account(), 5)
            .await;

        assert_eq!(outcome, Confirmation::Confirmed { polls: 3 });
    }

    #[tokio::test(start_paused = true)]
    async fn poll_failure_consumes_an_attempt() {
        let ledger = ScriptedLedger::new([Err(()), Ok(6)]);
        let outcome = tracker(30)
            .wait_for_confirmation(&ledger, &account(), 5)
            .await;

        assert_eq!(outcome, Confirmation::Confirmed { polls: 2 });
    }

    #[tokio::test(start_paused = true)]
    async fn persistent_poll_failures_time_out() {
        let ledger = ScriptedLedger::new(std::iter::repeat_n(Err(()), 10));
        let outcome = tracker(3)
            .wait_for_confirmation(&ledger, &account(), 5)
            .await;

        assert_eq!(outcome, Confirmation::TimedOut { attempts: 3 });
        assert_eq!(ledger.polls(), 3);
    }

    #[test]
    fn default_policy_is_bounded() {
        let policy = ConfirmPolicy::default();
        assert!(policy.max_attempts > 0);
        assert!(policy.poll_interval > Duration::ZERO);
    }
}
