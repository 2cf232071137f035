use std::{sync::Arc, time::Duration};

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode},
    middleware::{from_fn_with_state, Next},
    response::{IntoResponse, Response},
    routing::MethodRouter,
    Json, Router,
};
use folio_shared_contracts::rate_limit::{RateLimitDecision, RateLimitService};
use tracing::warn;

use crate::{middlewares::client_ip::ClientIp, models::ApiMessage, RateLimitRule};

pub const RATELIMIT_POLICY: HeaderName = HeaderName::from_static("ratelimit-policy");
pub const RATELIMIT: HeaderName = HeaderName::from_static("ratelimit");

/// Limits every route of `router`.
pub fn add<S, R>(router: Router<S>, service: Arc<R>, rule: RateLimitRule) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
    R: RateLimitService,
{
    router.layer(from_fn_with_state((service, rule), limit::<R>))
}

/// Limits the handlers of a method route. Requests answered by its fallback
/// (e.g. `405 Method Not Allowed`) are not counted.
pub fn add_to_route<S, R>(
    route: MethodRouter<S>,
    service: Arc<R>,
    rule: RateLimitRule,
) -> MethodRouter<S>
where
    S: Clone + Send + Sync + 'static,
    R: RateLimitService,
{
    route.route_layer(from_fn_with_state((service, rule), limit::<R>))
}

async fn limit<R: RateLimitService>(
    State((service, rule)): State<(Arc<R>, RateLimitRule)>,
    request: Request,
    next: Next,
) -> Response {
    let client_ip = request
        .extensions()
        .get::<ClientIp>()
        .copied()
        .unwrap_or(ClientIp([0, 0, 0, 0].into()));

    let decision = service.hit(&rule.policy, client_ip.0).await;

    let mut response = if decision.allowed {
        next.run(request).await
    } else {
        warn!(
            client_ip = %client_ip.0,
            policy = rule.policy.name,
            "rate limit exceeded"
        );
        let mut response = (
            StatusCode::TOO_MANY_REQUESTS,
            Json(ApiMessage {
                message: &rule.message,
            }),
        )
            .into_response();
        response
            .headers_mut()
            .insert(header::RETRY_AFTER, seconds(decision.reset_after).into());
        response
    };

    set_headers(response.headers_mut(), &rule, &decision);
    response
}

/// Adds the `RateLimit-Policy` and `RateLimit` headers unless a more specific
/// limit already set them.
fn set_headers(headers: &mut HeaderMap, rule: &RateLimitRule, decision: &RateLimitDecision) {
    if headers.contains_key(RATELIMIT) {
        return;
    }

    let policy = format!("{};w={}", rule.policy.limit, seconds(rule.policy.window));
    let state = format!(
        "limit={}, remaining={}, reset={}",
        decision.limit,
        decision.remaining,
        seconds(decision.reset_after)
    );

    for (name, value) in [(RATELIMIT_POLICY, policy), (RATELIMIT, state)] {
        if let Ok(value) = HeaderValue::try_from(value) {
            headers.insert(name, value);
        }
    }
}

/// Whole seconds, rounded up.
fn seconds(duration: Duration) -> u64 {
    duration.as_secs() + u64::from(duration.subsec_nanos() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seconds_round_up() {
        assert_eq!(seconds(Duration::ZERO), 0);
        assert_eq!(seconds(Duration::from_secs(900)), 900);
        assert_eq!(seconds(Duration::from_millis(899_001)), 900);
        assert_eq!(seconds(Duration::from_millis(1)), 1);
    }
}
