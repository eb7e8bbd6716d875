use std::time::{Duration, Instant};

use tokio::time::sleep;

/// How often the pending-bot-task loop re-checks cancellation, both during
/// the inactivity countdown and during a typing-suppression hold.
const POLL_INTERVAL: Duration = Duration::from_millis(300);

/// Checks the two cancellation predicates from the spec:
/// a newer client token exists, or the agent acted after this token was issued.
pub fn check(current_token: u64, own_token: u64, last_agent_activity: Instant, token_issued_at: Instant) -> bool {
    current_token != own_token || last_agent_activity > token_issued_at
}

/// Drives the inactivity countdown followed by the suppression-window wait,
/// calling `snapshot` on every tick to read the live conversation state.
/// `snapshot` returns `(current_token, last_agent_activity, suppress_until)`.
pub async fn wait_for_takeover<F>(
    own_token: u64,
    token_issued_at: Instant,
    inactivity: Duration,
    mut snapshot: F,
) -> bool
where
    F: FnMut() -> (u64, Instant, Instant),
{
    let deadline = token_issued_at + inactivity;

    loop {
        let (current_token, last_agent_activity, _suppress_until) = snapshot();
        if check(current_token, own_token, last_agent_activity, token_issued_at) {
            return false;
        }
        if Instant::now() >= deadline {
            break;
        }
        let remaining = deadline.saturating_duration_since(Instant::now());
        sleep(remaining.min(POLL_INTERVAL)).await;
    }

    loop {
        let (current_token, last_agent_activity, suppress_until) = snapshot();
        if check(current_token, own_token, last_agent_activity, token_issued_at) {
            return false;
        }
        if Instant::now() >= suppress_until {
            return true;
        }
        let remaining = suppress_until.saturating_duration_since(Instant::now());
        sleep(remaining.min(POLL_INTERVAL)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn fires_after_inactivity_when_nothing_interferes() {
        let token_issued_at = Instant::now();
        let went_ready = wait_for_takeover(1, token_issued_at, Duration::from_millis(50), || {
            (1, token_issued_at, token_issued_at)
        })
        .await;
        assert!(went_ready);
    }

    #[tokio::test]
    async fn cancelled_by_newer_client_token() {
        let current = Arc::new(AtomicU64::new(1));
        let token_issued_at = Instant::now();
        let c = current.clone();
        tokio::spawn(async move {
            sleep(Duration::from_millis(20)).await;
            c.store(2, Ordering::SeqCst);
        });
        let went_ready = wait_for_takeover(1, token_issued_at, Duration::from_millis(200), || {
            (current.load(Ordering::SeqCst), token_issued_at, token_issued_at)
        })
        .await;
        assert!(!went_ready);
    }

    #[tokio::test]
    async fn cancelled_by_agent_activity_after_token() {
        let token_issued_at = Instant::now();
        let activity = Instant::now() + Duration::from_millis(10);
        let went_ready = wait_for_takeover(1, token_issued_at, Duration::from_millis(50), move || {
            (1, activity, token_issued_at)
        })
        .await;
        assert!(!went_ready);
    }

    #[tokio::test]
    async fn suppression_window_delays_readiness() {
        let token_issued_at = Instant::now();
        let suppress_until = Instant::now() + Duration::from_millis(100);
        let started = Instant::now();
        let went_ready = wait_for_takeover(1, token_issued_at, Duration::from_millis(10), move || {
            (1, token_issued_at, suppress_until)
        })
        .await;
        assert!(went_ready);
        assert!(started.elapsed() >= Duration::from_millis(90));
    }
}
