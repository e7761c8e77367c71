//! Per-provider fixed-window admission control.
//!
//! Each provider owns a counter that resets to zero once the current window
//! has elapsed. The reset is lazy: it happens inside the admission check,
//! never on a timer. Check and increment run under one lock, so concurrent
//! callers can never both be admitted past the limit.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use crate::config::Config;
use crate::models::ProviderKind;

/// Length of one rate-limit window.
pub fn window() -> Duration {
    Duration::hours(1)
}

/// Counter state of one provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitState {
    pub request_count: u32,
    pub limit: u32,
    pub window_reset_at: DateTime<Utc>,
}

impl RateLimitState {
    fn new(limit: u32, now: DateTime<Utc>) -> Self {
        Self {
            request_count: 0,
            limit,
            window_reset_at: now + window(),
        }
    }
}

#[derive(Debug)]
pub struct RateLimiter {
    states: Mutex<HashMap<ProviderKind, RateLimitState>>,
}

impl RateLimiter {
    /// Creates a limiter whose first windows end one hour from now.
    pub fn new(limits: impl IntoIterator<Item = (ProviderKind, u32)>) -> Self {
        Self::new_at(limits, Utc::now())
    }

    /// Creates a limiter whose first windows end one hour after `now`.
    pub fn new_at(
        limits: impl IntoIterator<Item = (ProviderKind, u32)>,
        now: DateTime<Utc>,
    ) -> Self {
        let states = limits
            .into_iter()
            .map(|(kind, limit)| (kind, RateLimitState::new(limit, now)))
            .collect();
        Self {
            states: Mutex::new(states),
        }
    }

    /// One state per provider, using each provider's configured limit.
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            ProviderKind::ALL
                .into_iter()
                .map(|kind| (kind, config.provider(kind).rate_limit)),
        )
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<ProviderKind, RateLimitState>> {
        // Counters stay consistent even if a holder panicked; each update is a single assignment.
        self.states.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Admits one request for `kind` if its current window has budget left.
    pub fn admit(&self, kind: ProviderKind) -> bool {
        self.admit_at(kind, Utc::now())
    }

    /// [`admit`](Self::admit) against an explicit instant.
    pub fn admit_at(&self, kind: ProviderKind, now: DateTime<Utc>) -> bool {
        let mut states = self.lock();
        let Some(state) = states.get_mut(&kind) else {
            tracing::warn!("No rate limit registered for {}; denying", kind);
            return false;
        };

        if now > state.window_reset_at {
            state.request_count = 0;
            state.window_reset_at = now + window();
        }

        if state.request_count >= state.limit {
            tracing::warn!(
                "Rate limit exceeded for {} ({}/{}), window resets at {}",
                kind,
                state.request_count,
                state.limit,
                state.window_reset_at
            );
            return false;
        }

        state.request_count += 1;
        true
    }

    /// Copy of a provider's counter, for diagnostics.
    pub fn snapshot(&self, kind: ProviderKind) -> Option<RateLimitState> {
        self.lock().get(&kind).copied()
    }

    /// Requests admitted in the provider's current window (0 if unregistered).
    pub fn usage(&self, kind: ProviderKind) -> u32 {
        self.snapshot(kind).map(|s| s.request_count).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::sync::Arc;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_denies_after_limit_within_window() {
        let limiter = RateLimiter::new_at([(ProviderKind::Tax, 3)], t0());

        for _ in 0..3 {
            assert!(limiter.admit_at(ProviderKind::Tax, t0()));
        }
        assert!(!limiter.admit_at(ProviderKind::Tax, t0() + Duration::minutes(59)));
        assert_eq!(limiter.usage(ProviderKind::Tax), 3);
    }

    #[test]
    fn test_window_rollover_resets_counter() {
        let limiter = RateLimiter::new_at([(ProviderKind::Background, 2)], t0());
        assert!(limiter.admit_at(ProviderKind::Background, t0()));
        assert!(limiter.admit_at(ProviderKind::Background, t0()));
        assert!(!limiter.admit_at(ProviderKind::Background, t0()));

        let reset_at = limiter
            .snapshot(ProviderKind::Background)
            .unwrap()
            .window_reset_at;
        let later = reset_at + Duration::seconds(1);

        assert!(limiter.admit_at(ProviderKind::Background, later));
        let state = limiter.snapshot(ProviderKind::Background).unwrap();
        assert_eq!(state.request_count, 1);
        assert_eq!(state.window_reset_at, later + window());
    }

    #[test]
    fn test_reset_instant_itself_is_still_in_window() {
        let limiter = RateLimiter::new_at([(ProviderKind::Email, 1)], t0());
        assert!(limiter.admit_at(ProviderKind::Email, t0()));
        assert!(!limiter.admit_at(ProviderKind::Email, t0() + window()));
    }

    #[test]
    fn test_providers_are_isolated() {
        let limiter = RateLimiter::new_at(
            [(ProviderKind::Identity, 1), (ProviderKind::Telecom, 1)],
            t0(),
        );
        assert!(limiter.admit_at(ProviderKind::Identity, t0()));
        assert!(!limiter.admit_at(ProviderKind::Identity, t0()));
        assert!(limiter.admit_at(ProviderKind::Telecom, t0()));
        assert_eq!(limiter.usage(ProviderKind::Telecom), 1);
    }

    #[test]
    fn test_unregistered_provider_is_denied() {
        let limiter = RateLimiter::new_at([(ProviderKind::Identity, 10)], t0());
        assert!(!limiter.admit_at(ProviderKind::Rental, t0()));
        assert!(limiter.snapshot(ProviderKind::Rental).is_none());
    }

    #[test]
    fn test_from_config_registers_every_provider() {
        let config = Config::from_lookup(|_| None).unwrap();
        let limiter = RateLimiter::from_config(&config);
        for kind in ProviderKind::ALL {
            let state = limiter.snapshot(kind).unwrap();
            assert_eq!(state.limit, config.provider(kind).rate_limit);
            assert_eq!(state.request_count, 0);
        }
    }

    #[test]
    fn test_concurrent_admissions_never_exceed_limit() {
        let limiter = Arc::new(RateLimiter::new([(ProviderKind::Rental, 50)]));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let limiter = Arc::clone(&limiter);
                std::thread::spawn(move || {
                    (0..20)
                        .filter(|_| limiter.admit(ProviderKind::Rental))
                        .count()
                })
            })
            .collect();

        let admitted: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(admitted, 50);
        assert_eq!(limiter.usage(ProviderKind::Rental), 50);
    }
}
