//! Failed-login throttling for the authentication entry points.

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderValue, Method, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};
use tracing::warn;

use super::{ApiError, AppState};
use crate::config::AuthThrottleConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThrottleDecision {
    Allowed,
    Locked { retry_after: Duration },
}

#[derive(Debug, Clone, Copy)]
struct Attempts {
    failures: u32,
    window_start: Instant,
    locked_until: Option<Instant>,
}

impl Attempts {
    /// Window elapsed and no lockout in force; the entry no longer affects decisions.
    fn is_stale(&self, now: Instant, window: Duration) -> bool {
        let locked = self.locked_until.is_some_and(|until| now < until);
        !locked && now.duration_since(self.window_start) >= window
    }
}

/// Counts failed attempts per client key and locks the key out once
/// `max_attempts` failures land inside one window.
#[derive(Debug, Clone)]
pub struct LoginThrottle {
    max_attempts: u32,
    window: Duration,
    lockout: Duration,
    attempts: Arc<Mutex<HashMap<String, Attempts>>>,
}

impl LoginThrottle {
    #[must_use]
    pub fn new(config: &AuthThrottleConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            window: Duration::from_secs(config.window_seconds),
            lockout: Duration::from_secs(config.lockout_seconds),
            attempts: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    #[must_use]
    pub fn check(&self, key: &str) -> ThrottleDecision {
        self.check_at(key, Instant::now())
    }

    pub fn record_failure(&self, key: &str) {
        self.record_failure_at(key, Instant::now());
    }

    pub fn reset(&self, key: &str) {
        self.attempts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
    }

    fn check_at(&self, key: &str, now: Instant) -> ThrottleDecision {
        let mut attempts = self.attempts.lock().unwrap_or_else(PoisonError::into_inner);

        if attempts
            .get(key)
            .is_some_and(|a| a.is_stale(now, self.window))
        {
            attempts.remove(key);
        }

        match attempts.get(key).and_then(|a| a.locked_until) {
            Some(until) if now < until => ThrottleDecision::Locked {
                retry_after: until - now,
            },
            _ => ThrottleDecision::Allowed,
        }
    }

    fn record_failure_at(&self, key: &str, now: Instant) {
        if self.max_attempts == 0 {
            return;
        }

        let mut attempts = self.attempts.lock().unwrap_or_else(PoisonError::into_inner);
        attempts.retain(|_, a| !a.is_stale(now, self.window));

        let entry = attempts.entry(key.to_string()).or_insert(Attempts {
            failures: 0,
            window_start: now,
            locked_until: None,
        });

        let lock_expired = entry.locked_until.is_some_and(|until| now >= until);
        if lock_expired || now.duration_since(entry.window_start) >= self.window {
            entry.failures = 0;
            entry.window_start = now;
            entry.locked_until = None;
        }

        entry.failures += 1;
        if entry.failures >= self.max_attempts {
            entry.locked_until = Some(now + self.lockout);
            warn!(
                client = %key,
                failures = entry.failures,
                lockout_seconds = self.lockout.as_secs(),
                "Too many failed login attempts, locking out client"
            );
        }
    }
}

fn client_key(request: &Request) -> String {
    let client = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map_or_else(|| "unknown".to_string(), |ConnectInfo(addr)| addr.ip().to_string());

    format!("{}|{client}", request.uri().path())
}

/// Layered on the login routes. 401 responses count as failures; a
/// successful login clears the counter.
pub async fn login_throttle(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    if request.method() != Method::POST {
        return next.run(request).await;
    }

    let key = client_key(&request);

    if let ThrottleDecision::Locked { retry_after } = state.throttle.check(&key) {
        let seconds = retry_after.as_secs().max(1);
        warn!(client = %key, "Login attempt rejected during lockout");

        let mut response = ApiError::TooManyRequests(format!(
            "Too many failed attempts. Try again in {seconds} seconds"
        ))
        .into_response();
        if let Ok(value) = HeaderValue::from_str(&seconds.to_string()) {
            response.headers_mut().insert(header::RETRY_AFTER, value);
        }
        return response;
    }

    let response = next.run(request).await;

    match response.status() {
        StatusCode::UNAUTHORIZED => state.throttle.record_failure(&key),
        status if status.is_success() => state.throttle.reset(&key),
        _ => {}
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracked_keys(throttle: &LoginThrottle) -> usize {
        throttle.attempts.lock().unwrap().len()
    }

    fn throttle(max_attempts: u32) -> LoginThrottle {
        LoginThrottle::new(&AuthThrottleConfig {
            max_attempts,
            window_seconds: 60,
            lockout_seconds: 30,
        })
    }

    #[test]
    fn locks_after_max_failures() {
        let throttle = throttle(3);
        let now = Instant::now();

        for _ in 0..2 {
            throttle.record_failure_at("k", now);
            assert_eq!(throttle.check_at("k", now), ThrottleDecision::Allowed);
        }

        throttle.record_failure_at("k", now);
        assert_eq!(
            throttle.check_at("k", now),
            ThrottleDecision::Locked {
                retry_after: Duration::from_secs(30)
            }
        );
        assert_eq!(throttle.check_at("other", now), ThrottleDecision::Allowed);
    }

    #[test]
    fn lockout_expires() {
        let throttle = throttle(1);
        let now = Instant::now();

        throttle.record_failure_at("k", now);
        assert!(matches!(
            throttle.check_at("k", now + Duration::from_secs(29)),
            ThrottleDecision::Locked { .. }
        ));
        assert_eq!(
            throttle.check_at("k", now + Duration::from_secs(30)),
            ThrottleDecision::Allowed
        );
    }

    #[test]
    fn failures_outside_window_do_not_accumulate() {
        let throttle = throttle(2);
        let now = Instant::now();

        throttle.record_failure_at("k", now);
        throttle.record_failure_at("k", now + Duration::from_secs(61));
        assert_eq!(
            throttle.check_at("k", now + Duration::from_secs(61)),
            ThrottleDecision::Allowed
        );
    }

    #[test]
    fn reset_clears_failures() {
        let throttle = throttle(2);
        let now = Instant::now();

        throttle.record_failure_at("k", now);
        throttle.reset("k");
        throttle.record_failure_at("k", now);
        assert_eq!(throttle.check_at("k", now), ThrottleDecision::Allowed);
    }

    #[test]
    fn zero_max_attempts_disables_throttling() {
        let throttle = throttle(0);
        let now = Instant::now();

        for _ in 0..10 {
            throttle.record_failure_at("k", now);
        }
        assert_eq!(throttle.check_at("k", now), ThrottleDecision::Allowed);
    }

    #[test]
    fn stale_clients_are_forgotten() {
        let throttle = LoginThrottle::new(&AuthThrottleConfig {
            max_attempts: 1,
            window_seconds: 1,
            lockout_seconds: 1,
        });
        let now = Instant::now();

        for i in 0..10_000 {
            throttle.record_failure_at(&format!("client-{i}"), now);
        }
        assert_eq!(tracked_keys(&throttle), 10_000);

        let later = now + Duration::from_secs(3600);
        throttle.record_failure_at("fresh", later);
        assert_eq!(tracked_keys(&throttle), 1);
    }

    #[test]
    fn check_drops_a_stale_key() {
        let throttle = throttle(3);
        let now = Instant::now();

        throttle.record_failure_at("k", now);
        assert_eq!(tracked_keys(&throttle), 1);

        assert_eq!(
            throttle.check_at("k", now + Duration::from_secs(61)),
            ThrottleDecision::Allowed
        );
        assert_eq!(tracked_keys(&throttle), 0);
    }

    #[test]
    fn active_lockout_survives_pruning() {
        let throttle = LoginThrottle::new(&AuthThrottleConfig {
            max_attempts: 1,
            window_seconds: 10,
            lockout_seconds: 30,
        });
        let now = Instant::now();

        throttle.record_failure_at("locked", now);
        throttle.record_failure_at("other", now + Duration::from_secs(20));

        assert!(matches!(
            throttle.check_at("locked", now + Duration::from_secs(25)),
            ThrottleDecision::Locked { .. }
        ));
    }
}
