//! Fixed-window rate limiting keyed by identity or origin.

use std::net::IpAddr;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use dashmap::DashMap;

use crate::auth::Identity;
use crate::config::RateLimitConfig;
use crate::error::AuthError;

/// Bucket a request is counted against.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RateKey {
    /// Authenticated caller, by username.
    Identity(String),
    /// Anonymous caller, by peer address.
    Origin(IpAddr),
    /// Anonymous caller with no known peer address.
    Anonymous,
}

impl RateKey {
    pub fn for_request(identity: Option<&Identity>, origin: Option<IpAddr>) -> Self {
        match (identity, origin) {
            (Some(identity), _) => RateKey::Identity(identity.username.clone()),
            (None, Some(ip)) => RateKey::Origin(ip),
            (None, None) => RateKey::Anonymous,
        }
    }
}

impl std::fmt::Display for RateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RateKey::Identity(name) => write!(f, "user:{name}"),
            RateKey::Origin(ip) => write!(f, "ip:{ip}"),
            RateKey::Anonymous => f.write_str("anonymous"),
        }
    }
}

/// Counter for one key. An absent entry is the idle state.
#[derive(Debug)]
struct WindowState {
    count: u32,
    window_start: Instant,
    last_seen: Instant,
}

/// Per-key fixed-window limiter.
///
/// Rejected requests still increment the counter, so a caller that keeps
/// bursting stays rejected until its window rolls over.
#[derive(Debug)]
pub struct RateLimiter {
    enabled: bool,
    window: Duration,
    max_requests: u32,
    idle_ttl: Duration,
    windows: DashMap<RateKey, WindowState>,
    last_sweep: Mutex<Instant>,
}

impl RateLimiter {
    pub fn new(window: Duration, max_requests: u32) -> Self {
        Self {
            enabled: true,
            window,
            max_requests,
            idle_ttl: window.saturating_mul(3),
            windows: DashMap::new(),
            last_sweep: Mutex::new(Instant::now()),
        }
    }

    pub fn from_config(config: &RateLimitConfig) -> Self {
        let window = Duration::from_secs(config.window_secs);
        Self {
            enabled: config.enabled,
            idle_ttl: window.saturating_mul(config.evict_after_windows.max(1)),
            ..Self::new(window, config.max_requests)
        }
    }

    /// A limiter that admits everything.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::new(Duration::from_secs(60), u32::MAX)
        }
    }

    pub fn admit(&self, key: &RateKey) -> Result<(), AuthError> {
        self.admit_at(key, Instant::now())
    }

    /// Count one request for `key` at time `now`.
    pub fn admit_at(&self, key: &RateKey, now: Instant) -> Result<(), AuthError> {
        if !self.enabled {
            return Ok(());
        }

        self.maybe_sweep(now);

        // The entry guard holds the shard lock for the whole read-modify-write.
        let count = {
            let mut state = self.windows.entry(key.clone()).or_insert_with(|| WindowState {
                count: 0,
                window_start: now,
                last_seen: now,
            });

            if now.saturating_duration_since(state.window_start) >= self.window {
                state.count = 0;
                state.window_start = now;
            }
            state.count = state.count.saturating_add(1);
            state.last_seen = now;
            state.count
        };

        if count > self.max_requests {
            Err(AuthError::RateExceeded)
        } else {
            Ok(())
        }
    }

    /// Requests counted for `key` in its current window.
    pub fn current_count(&self, key: &RateKey) -> Option<u32> {
        self.windows.get(key).map(|state| state.count)
    }

    /// Number of keys currently tracked.
    pub fn tracked_keys(&self) -> usize {
        self.windows.len()
    }

    /// Drop keys with no activity for the idle ttl.
    pub fn evict_idle(&self, now: Instant) -> usize {
        let before = self.windows.len();
        self.windows
            .retain(|_, state| now.saturating_duration_since(state.last_seen) < self.idle_ttl);
        before.saturating_sub(self.windows.len())
    }

    /// Sweep at most once per window. Skipped if another request is sweeping.
    fn maybe_sweep(&self, now: Instant) {
        let Ok(mut last) = self.last_sweep.try_lock() else {
            return;
        };
        if now.saturating_duration_since(*last) < self.window {
            return;
        }
        *last = now;
        drop(last);

        let evicted = self.evict_idle(now);
        if evicted > 0 {
            tracing::debug!(
                evicted,
                remaining = self.windows.len(),
                "Evicted idle rate-limit keys"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Barrier};

    fn key(name: &str) -> RateKey {
        RateKey::Identity(name.to_string())
    }

    #[test]
    fn eleventh_request_in_window_is_rejected() {
        let limiter = RateLimiter::new(Duration::from_secs(60), 10);
        let start = Instant::now();

        for i in 0..10 {
            assert_eq!(
                limiter.admit_at(&key("alice"), start + Duration::from_secs(i)),
                Ok(()),
                "request {} should pass",
                i + 1
            );
        }
        assert_eq!(
            limiter.admit_at(&key("alice"), start + Duration::from_secs(10)),
            Err(AuthError::RateExceeded)
        );
    }

    #[test]
    fn window_rollover_resets_counter() {
        let limiter = RateLimiter::new(Duration::from_secs(60), 10);
        let start = Instant::now();

        for _ in 0..12 {
            let _ = limiter.admit_at(&key("alice"), start);
        }
        assert_eq!(limiter.current_count(&key("alice")), Some(12));

        let later = start + Duration::from_secs(60);
        assert_eq!(limiter.admit_at(&key("alice"), later), Ok(()));
        assert_eq!(limiter.current_count(&key("alice")), Some(1));
    }

    #[test]
    fn rejections_keep_counting() {
        let limiter = RateLimiter::new(Duration::from_secs(60), 2);
        let start = Instant::now();

        for _ in 0..5 {
            let _ = limiter.admit_at(&key("bob"), start);
        }
        assert_eq!(limiter.current_count(&key("bob")), Some(5));
        assert_eq!(
            limiter.admit_at(&key("bob"), start + Duration::from_secs(59)),
            Err(AuthError::RateExceeded)
        );
    }

    #[test]
    fn keys_are_independent() {
        let limiter = RateLimiter::new(Duration::from_secs(60), 1);
        let now = Instant::now();
        let origin = RateKey::Origin("10.0.0.1".parse().unwrap());

        assert_eq!(limiter.admit_at(&key("alice"), now), Ok(()));
        assert_eq!(limiter.admit_at(&key("alice"), now), Err(AuthError::RateExceeded));
        assert_eq!(limiter.admit_at(&key("bob"), now), Ok(()));
        assert_eq!(limiter.admit_at(&origin, now), Ok(()));
    }

    #[test]
    fn disabled_limiter_admits_everything() {
        let limiter = RateLimiter::disabled();
        for _ in 0..1000 {
            assert_eq!(limiter.admit(&key("alice")), Ok(()));
        }
        assert_eq!(limiter.tracked_keys(), 0);
    }

    #[test]
    fn idle_keys_are_swept_lazily() {
        let limiter = RateLimiter::new(Duration::from_secs(60), 10);
        let start = Instant::now();

        limiter.admit_at(&key("alice"), start).unwrap();
        limiter.admit_at(&key("bob"), start + Duration::from_secs(150)).unwrap();
        assert_eq!(limiter.tracked_keys(), 2);

        // alice has been idle for over 3 windows by now; bob for one.
        limiter.admit_at(&key("carol"), start + Duration::from_secs(210)).unwrap();
        assert_eq!(limiter.current_count(&key("alice")), None);
        assert_eq!(limiter.current_count(&key("bob")), Some(1));
        assert_eq!(limiter.tracked_keys(), 2);
    }

    #[test]
    fn configured_eviction_horizon_is_honoured() {
        let config = RateLimitConfig {
            evict_after_windows: 1,
            ..RateLimitConfig::default()
        };
        let eager = RateLimiter::from_config(&config);
        let lenient = RateLimiter::from_config(&RateLimitConfig::default());
        let start = Instant::now();

        for limiter in [&eager, &lenient] {
            limiter.admit_at(&key("alice"), start).unwrap();
            limiter.admit_at(&key("bob"), start + Duration::from_secs(61)).unwrap();
        }

        assert_eq!(eager.current_count(&key("alice")), None);
        assert_eq!(eager.tracked_keys(), 1);
        assert_eq!(lenient.current_count(&key("alice")), Some(1));
        assert_eq!(lenient.tracked_keys(), 2);
    }

    #[test]
    fn disabled_config_admits_everything() {
        let config = RateLimitConfig {
            enabled: false,
            max_requests: 1,
            ..RateLimitConfig::default()
        };
        let limiter = RateLimiter::from_config(&config);

        for _ in 0..50 {
            assert_eq!(limiter.admit(&key("alice")), Ok(()));
        }
        assert_eq!(limiter.tracked_keys(), 0);
    }

    #[test]
    fn huge_window_does_not_overflow() {
        let config = RateLimitConfig {
            window_secs: u64::MAX,
            evict_after_windows: u32::MAX,
            max_requests: 2,
            ..RateLimitConfig::default()
        };
        let limiter = RateLimiter::from_config(&config);
        let start = Instant::now();

        assert_eq!(limiter.admit_at(&key("alice"), start), Ok(()));
        assert_eq!(limiter.admit_at(&key("alice"), start), Ok(()));
        assert_eq!(
            limiter.admit_at(&key("alice"), start + Duration::from_secs(3600)),
            Err(AuthError::RateExceeded)
        );
    }

    #[test]
    fn concurrent_admits_never_overshoot() {
        const THREADS: usize = 64;
        const MAX: u32 = 10;

        let limiter = Arc::new(RateLimiter::new(Duration::from_secs(60), MAX));
        let barrier = Arc::new(Barrier::new(THREADS));

        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let limiter = limiter.clone();
                let barrier = barrier.clone();
                std::thread::spawn(move || {
                    barrier.wait();
                    limiter.admit(&key("shared")).is_ok()
                })
            })
            .collect();

        let admitted = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();

        assert_eq!(admitted, MAX as usize);
        assert_eq!(limiter.current_count(&key("shared")), Some(THREADS as u32));
    }

    #[test]
    fn rate_key_prefers_identity() {
        let ip: IpAddr = "192.168.1.7".parse().unwrap();
        let identity = Identity::new("alice", crate::auth::Role::User);

        assert_eq!(RateKey::for_request(Some(&identity), Some(ip)), key("alice"));
        assert_eq!(RateKey::for_request(None, Some(ip)), RateKey::Origin(ip));
        assert_eq!(RateKey::for_request(None, None), RateKey::Anonymous);
    }
}
