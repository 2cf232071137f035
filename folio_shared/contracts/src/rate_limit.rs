use std::{future::Future, net::IpAddr, time::Duration};

#[cfg_attr(feature = "mock", mockall::automock)]
pub trait RateLimitService: Send + Sync + 'static {
    /// Counts a request from `client` against `policy`.
    ///
    /// Every call is counted, including calls that end up being rejected.
    fn hit(
        &self,
        policy: &RateLimitPolicy,
        client: IpAddr,
    ) -> impl Future<Output = RateLimitDecision> + Send;
}

/// A request cap per client address within a fixed time window.
///
/// Counters are separated by `name`, so several policies can be stacked on
/// the same route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitPolicy {
    pub name: &'static str,
    pub limit: u64,
    pub window: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub limit: u64,
    pub remaining: u64,
    /// Time until the current window of this client ends.
    pub reset_after: Duration,
}

#[cfg(feature = "mock")]
impl MockRateLimitService {
    pub fn with_hit(
        mut self,
        policy: RateLimitPolicy,
        client: IpAddr,
        result: RateLimitDecision,
    ) -> Self {
        self.expect_hit()
            .once()
            .with(
                mockall::predicate::eq(policy),
                mockall::predicate::eq(client),
            )
            .return_once(move |_, _| Box::pin(std::future::ready(result)));
        self
    }
}
