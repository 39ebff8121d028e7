use axum::{
    body::Body,
    extract::ConnectInfo,
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
};
use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};
use std::{future::Future, net::SocketAddr, num::NonZeroU32, pin::Pin, sync::Arc, time::Duration};
use tower::{Layer, Service};

/// Per-client token buckets, keyed by client address.
///
/// State lives in this process only: it resets on restart and is not shared
/// between instances. Idle keys are pruned by [`spawn_pruning`].
pub type ClientRateLimiter = Arc<DefaultKeyedRateLimiter<String>>;

pub fn create_rate_limiter(per_minute: u32, burst: u32) -> ClientRateLimiter {
    let per_minute = NonZeroU32::new(per_minute).unwrap_or(NonZeroU32::MIN);
    let burst = NonZeroU32::new(burst).unwrap_or(NonZeroU32::MIN);
    let quota = Quota::per_minute(per_minute).allow_burst(burst);
    Arc::new(RateLimiter::keyed(quota))
}

/// Drop buckets that have refilled completely so the key map stays bounded.
pub fn spawn_pruning(limiter: ClientRateLimiter, every: Duration) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        loop {
            interval.tick().await;
            limiter.retain_recent();
            limiter.shrink_to_fit();
            tracing::debug!("Rate limiter tracking {} clients", limiter.len());
        }
    })
}

/// Socket peer, then a shared bucket.
///
/// The first X-Forwarded-For hop is only honoured with `trust_forwarded_for`,
/// i.e. when a proxy in front of the service overwrites that header.
pub fn client_key<B>(request: &Request<B>, trust_forwarded_for: bool) -> String {
    if trust_forwarded_for {
        if let Some(forwarded) = request
            .headers()
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty())
        {
            return forwarded.to_string();
        }
    }

    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

#[derive(Clone)]
pub struct RateLimitLayer {
    limiter: ClientRateLimiter,
    trust_forwarded_for: bool,
}

impl RateLimitLayer {
    pub fn new(limiter: ClientRateLimiter, trust_forwarded_for: bool) -> Self {
        Self {
            limiter,
            trust_forwarded_for,
        }
    }
}

impl<S> Layer<S> for RateLimitLayer {
    type Service = RateLimitService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RateLimitService {
            inner,
            limiter: self.limiter.clone(),
            trust_forwarded_for: self.trust_forwarded_for,
        }
    }
}

#[derive(Clone)]
pub struct RateLimitService<S> {
    inner: S,
    limiter: ClientRateLimiter,
    trust_forwarded_for: bool,
}

impl<S> Service<Request<Body>> for RateLimitService<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut std::task::Context<'_>) -> std::task::Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request<Body>) -> Self::Future {
        let limiter = self.limiter.clone();
        let mut inner = self.inner.clone();
        let key = client_key(&request, self.trust_forwarded_for);

        Box::pin(async move {
            if limiter.check_key(&key).is_err() {
                tracing::warn!("Rate limit exceeded for {}", key);
                return Ok(StatusCode::TOO_MANY_REQUESTS.into_response());
            }
            inner.call(request).await
        })
    }
}
