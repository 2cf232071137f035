use std::{collections::HashMap, net::IpAddr, sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use folio_shared_contracts::{
    rate_limit::{RateLimitDecision, RateLimitPolicy, RateLimitService},
    time::TimeService,
};
use tokio::sync::Mutex;
use tracing::trace;

const PRUNE_INTERVAL: Duration = Duration::from_secs(60);

/// Process-local rate limiter.
///
/// Counters live in memory and are lost on restart. Deployments with more
/// than one instance need a shared implementation of [`RateLimitService`].
#[derive(Debug, Clone)]
pub struct RateLimitServiceImpl<Time> {
    time: Time,
    state: Arc<Mutex<State>>,
}

#[derive(Debug, Default)]
struct State {
    windows: HashMap<(&'static str, IpAddr), Window>,
    last_prune: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy)]
struct Window {
    expires_at: DateTime<Utc>,
    count: u64,
}

impl<Time> RateLimitServiceImpl<Time> {
    pub fn new(time: Time) -> Self {
        Self {
            time,
            state: Default::default(),
        }
    }
}

impl<Time> RateLimitService for RateLimitServiceImpl<Time>
where
    Time: TimeService,
{
    async fn hit(&self, policy: &RateLimitPolicy, client: IpAddr) -> RateLimitDecision {
        let now = self.time.now();
        let mut state = self.state.lock().await;

        state.prune(now);

        let window = state
            .windows
            .entry((policy.name, client))
            .and_modify(|window| {
                if now >= window.expires_at {
                    *window = Window::start(now, policy.window);
                }
            })
            .or_insert_with(|| Window::start(now, policy.window));
        window.count = window.count.saturating_add(1);

        let decision = RateLimitDecision {
            allowed: window.count <= policy.limit,
            limit: policy.limit,
            remaining: policy.limit.saturating_sub(window.count),
            reset_after: (window.expires_at - now).to_std().unwrap_or_default(),
        };

        trace!(policy = policy.name, %client, count = window.count, ?decision, "rate limit hit");

        decision
    }
}

impl Window {
    fn start(now: DateTime<Utc>, length: Duration) -> Self {
        Self {
            expires_at: now + length,
            count: 0,
        }
    }
}

impl State {
    fn prune(&mut self, now: DateTime<Utc>) {
        if self
            .last_prune
            .is_some_and(|last_prune| now < last_prune + PRUNE_INTERVAL)
        {
            return;
        }
        self.last_prune = Some(now);

        let before = self.windows.len();
        self.windows.retain(|_, window| now < window.expires_at);
        let pruned = before - self.windows.len();
        if pruned > 0 {
            trace!(pruned, remaining = self.windows.len(), "pruned expired rate limit windows");
        }
    }
}
