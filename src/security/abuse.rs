//! Abuse State Tracking
//!
//! Per-client sliding windows of failed auth attempts and recent requests,
//! plus the block set. Windows are pruned lazily on every read and write;
//! there is no background timer. A client enters the block set when its
//! failed-attempt count inside the failure window reaches the configured
//! threshold, and leaves it only through [`AbuseTracker::clear_block`].
//!
//! Mutation is serialized per client: the outer map is read-locked on the
//! hot path and each client's state sits behind its own mutex, so two IPs
//! never contend and two requests for the same IP never lose updates.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Mutex, RwLock};
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{info, warn};

use crate::config::SecurityConfig;

/// Sliding-window abuse state for one client identifier.
#[derive(Debug, Default)]
struct ClientState {
    /// Failed auth attempts inside the failure window.
    failures: VecDeque<Instant>,
    /// Requests inside the request window.
    requests: VecDeque<Instant>,
    /// Consecutive failed auth attempts since the last success.
    consecutive_failures: usize,
    /// Time of the most recent auth attempt.
    last_auth_attempt: Option<Instant>,
}

impl ClientState {
    /// Drop entries strictly older than the horizon; an entry exactly at
    /// the boundary still counts.
    fn prune(window: &mut VecDeque<Instant>, horizon: Duration, now: Instant) {
        while let Some(&oldest) = window.front() {
            if now.duration_since(oldest) > horizon {
                window.pop_front();
            } else {
                break;
            }
        }
    }
}

/// Tracks per-client abuse signals and block membership.
pub struct AbuseTracker {
    clients: RwLock<FxHashMap<String, Arc<Mutex<ClientState>>>>,
    blocked: RwLock<FxHashSet<String>>,
    max_failed_attempts: usize,
    failure_window: Duration,
    request_window: Duration,
    auth_reset_window: Duration,
}

impl AbuseTracker {
    pub fn new(config: &SecurityConfig) -> Self {
        Self {
            clients: RwLock::new(FxHashMap::default()),
            blocked: RwLock::new(FxHashSet::default()),
            max_failed_attempts: config.max_failed_attempts,
            failure_window: config.failure_window(),
            request_window: config.request_window(),
            auth_reset_window: config.auth_reset_window(),
        }
    }

    fn client(&self, client: &str) -> Arc<Mutex<ClientState>> {
        if let Some(state) = self.clients.read().get(client) {
            return Arc::clone(state);
        }
        Arc::clone(
            self.clients
                .write()
                .entry(client.to_string())
                .or_default(),
        )
    }

    /// Record one inbound request for rate tracking.
    pub fn record_request(&self, client: &str) {
        self.record_request_at(client, Instant::now());
    }

    pub(crate) fn record_request_at(&self, client: &str, now: Instant) {
        let state = self.client(client);
        let mut state = state.lock();
        state.requests.push_back(now);
        ClientState::prune(&mut state.requests, self.request_window, now);
    }

    /// Number of requests from this client inside the request window.
    pub fn request_count(&self, client: &str) -> usize {
        self.request_count_at(client, Instant::now())
    }

    pub(crate) fn request_count_at(&self, client: &str, now: Instant) -> usize {
        let state = match self.clients.read().get(client) {
            Some(state) => Arc::clone(state),
            None => return 0,
        };
        let mut state = state.lock();
        ClientState::prune(&mut state.requests, self.request_window, now);
        state.requests.len()
    }

    /// Record an authentication attempt. A success resets the consecutive
    /// counter; a failure feeds the failure window and may push the client
    /// into the block set.
    pub fn record_auth_attempt(&self, client: &str, success: bool) {
        self.record_auth_attempt_at(client, success, Instant::now());
    }

    pub(crate) fn record_auth_attempt_at(&self, client: &str, success: bool, now: Instant) {
        let state = self.client(client);
        let failure_count = {
            let mut state = state.lock();
            state.last_auth_attempt = Some(now);
            if success {
                state.consecutive_failures = 0;
                return;
            }
            state.consecutive_failures += 1;
            state.failures.push_back(now);
            ClientState::prune(&mut state.failures, self.failure_window, now);
            state.failures.len()
        };

        if failure_count >= self.max_failed_attempts {
            let newly_blocked = self.blocked.write().insert(client.to_string());
            if newly_blocked {
                warn!(client, failure_count, "client blocked after repeated auth failures");
            }
        }
    }

    /// Failed attempts from this client inside the failure window.
    pub fn failed_attempt_count(&self, client: &str) -> usize {
        self.failed_attempt_count_at(client, Instant::now())
    }

    pub(crate) fn failed_attempt_count_at(&self, client: &str, now: Instant) -> usize {
        let state = match self.clients.read().get(client) {
            Some(state) => Arc::clone(state),
            None => return 0,
        };
        let mut state = state.lock();
        ClientState::prune(&mut state.failures, self.failure_window, now);
        state.failures.len()
    }

    /// Whether auth attempts from this client should be refused outright.
    /// The consecutive counter resets after an idle period, so a client that
    /// backs off regains access without administrative action.
    pub fn is_auth_rate_limited(&self, client: &str) -> bool {
        self.is_auth_rate_limited_at(client, Instant::now())
    }

    pub(crate) fn is_auth_rate_limited_at(&self, client: &str, now: Instant) -> bool {
        let state = match self.clients.read().get(client) {
            Some(state) => Arc::clone(state),
            None => return false,
        };
        let mut state = state.lock();
        if let Some(last) = state.last_auth_attempt {
            if now.duration_since(last) > self.auth_reset_window {
                state.consecutive_failures = 0;
            }
        }
        state.consecutive_failures >= self.max_failed_attempts
    }

    /// Whether this client is in the block set.
    pub fn is_blocked(&self, client: &str) -> bool {
        self.blocked.read().contains(client)
    }

    /// Remove a client from the block set. Block membership never expires
    /// on its own; this is the only way out.
    pub fn clear_block(&self, client: &str) {
        if self.blocked.write().remove(client) {
            info!(client, "block cleared");
        }
    }

    /// Snapshot of currently blocked clients.
    pub fn blocked_clients(&self) -> Vec<String> {
        self.blocked.read().iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker() -> AbuseTracker {
        AbuseTracker::new(&SecurityConfig::default())
    }

    #[test]
    fn test_block_after_threshold_failures() {
        let tracker = tracker();
        for _ in 0..4 {
            tracker.record_auth_attempt("203.0.113.7", false);
        }
        assert!(!tracker.is_blocked("203.0.113.7"));

        tracker.record_auth_attempt("203.0.113.7", false);
        assert!(tracker.is_blocked("203.0.113.7"));
    }

    #[test]
    fn test_clients_are_independent() {
        let tracker = tracker();
        for _ in 0..5 {
            tracker.record_auth_attempt("203.0.113.7", false);
        }
        assert!(tracker.is_blocked("203.0.113.7"));
        assert!(!tracker.is_blocked("203.0.113.8"));
        assert_eq!(tracker.failed_attempt_count("203.0.113.8"), 0);
    }

    #[test]
    fn test_failure_window_prunes() {
        let tracker = tracker();
        let start = Instant::now();
        for _ in 0..3 {
            tracker.record_auth_attempt_at("203.0.113.7", false, start);
        }
        assert_eq!(tracker.failed_attempt_count_at("203.0.113.7", start), 3);

        // Just past the 900s horizon the window reads empty.
        let later = start + Duration::from_secs(901);
        assert_eq!(tracker.failed_attempt_count_at("203.0.113.7", later), 0);
    }

    #[test]
    fn test_old_failures_do_not_block() {
        let tracker = tracker();
        let start = Instant::now();
        for _ in 0..4 {
            tracker.record_auth_attempt_at("203.0.113.7", false, start);
        }
        // The fifth failure lands after the first four have aged out, so the
        // in-window count is 1 and no block forms.
        let later = start + Duration::from_secs(1000);
        tracker.record_auth_attempt_at("203.0.113.7", false, later);
        assert!(!tracker.is_blocked("203.0.113.7"));
        assert_eq!(tracker.failed_attempt_count_at("203.0.113.7", later), 1);
    }

    #[test]
    fn test_request_window_counts_and_prunes() {
        let tracker = tracker();
        let start = Instant::now();
        for i in 0..10 {
            tracker.record_request_at("203.0.113.7", start + Duration::from_secs(i));
        }
        assert_eq!(tracker.request_count_at("203.0.113.7", start + Duration::from_secs(9)), 10);

        // 61s after the first request, it has left the 60s window.
        let later = start + Duration::from_secs(61);
        assert_eq!(tracker.request_count_at("203.0.113.7", later), 9);
    }

    #[test]
    fn test_window_boundary_is_inclusive() {
        let tracker = tracker();
        let start = Instant::now();
        tracker.record_request_at("203.0.113.7", start);

        // An entry exactly as old as the window still counts; only strictly
        // older entries are purged.
        let boundary = start + Duration::from_secs(60);
        assert_eq!(tracker.request_count_at("203.0.113.7", boundary), 1);
        assert_eq!(
            tracker.request_count_at("203.0.113.7", boundary + Duration::from_secs(1)),
            0
        );
    }

    #[test]
    fn test_success_resets_consecutive_counter() {
        let tracker = tracker();
        for _ in 0..4 {
            tracker.record_auth_attempt("203.0.113.7", false);
        }
        assert!(!tracker.is_auth_rate_limited("203.0.113.7"));

        tracker.record_auth_attempt("203.0.113.7", true);
        tracker.record_auth_attempt("203.0.113.7", false);
        // One failure after a success is far from the limit.
        assert!(!tracker.is_auth_rate_limited("203.0.113.7"));
    }

    #[test]
    fn test_auth_rate_limit_and_idle_reset() {
        let tracker = tracker();
        let start = Instant::now();
        for _ in 0..5 {
            tracker.record_auth_attempt_at("203.0.113.7", false, start);
        }
        assert!(tracker.is_auth_rate_limited_at("203.0.113.7", start + Duration::from_secs(10)));

        // After 300s of silence the consecutive counter resets.
        assert!(!tracker.is_auth_rate_limited_at("203.0.113.7", start + Duration::from_secs(301)));
    }

    #[test]
    fn test_block_survives_window_expiry_until_cleared() {
        let tracker = tracker();
        let start = Instant::now();
        for _ in 0..5 {
            tracker.record_auth_attempt_at("203.0.113.7", false, start);
        }
        assert!(tracker.is_blocked("203.0.113.7"));

        // The failure window empties but the block stays.
        let later = start + Duration::from_secs(2000);
        assert_eq!(tracker.failed_attempt_count_at("203.0.113.7", later), 0);
        assert!(tracker.is_blocked("203.0.113.7"));

        tracker.clear_block("203.0.113.7");
        assert!(!tracker.is_blocked("203.0.113.7"));
    }

    #[test]
    fn test_concurrent_same_client_appends() {
        use std::sync::Arc;
        use std::thread;

        let tracker = Arc::new(tracker());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let tracker = Arc::clone(&tracker);
                thread::spawn(move || {
                    for _ in 0..50 {
                        tracker.record_request("203.0.113.7");
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(tracker.request_count("203.0.113.7"), 400);
    }
}
