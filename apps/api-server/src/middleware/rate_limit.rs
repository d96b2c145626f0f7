//! Per-endpoint-class rate limiting middleware.

use actix_web::{
    Error, HttpMessage, HttpResponse,
    body::EitherBody,
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
    http::header::{HeaderName, HeaderValue},
};
use sambal_shared::ErrorResponse;
use std::future::{Future, Ready, ready};
use std::pin::Pin;
use std::rc::Rc;
use std::sync::Arc;

use sambal_core::domain::{Decision, EndpointClass, Quota};
use sambal_core::ports::RateLimiter;

use crate::observability::RequestId;

/// Rate limiting middleware factory, one per endpoint class.
pub struct RateLimit {
    limiter: Arc<dyn RateLimiter>,
    class: EndpointClass,
}

impl RateLimit {
    pub fn new(limiter: Arc<dyn RateLimiter>, class: EndpointClass) -> Self {
        Self { limiter, class }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RateLimit
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = RateLimitService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RateLimitService {
            service: Rc::new(service),
            limiter: self.limiter.clone(),
            class: self.class,
        }))
    }
}

pub struct RateLimitService<S> {
    service: Rc<S>,
    limiter: Arc<dyn RateLimiter>,
    class: EndpointClass,
}

/// Client address: first `X-Forwarded-For` hop, then `X-Real-IP`, then the peer.
pub fn client_ip(req: &ServiceRequest) -> Option<String> {
    let header = |name: &str| {
        req.headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };

    header("x-forwarded-for")
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .or_else(|| header("x-real-ip"))
        .map(String::from)
        .or_else(|| req.peer_addr().map(|addr| addr.ip().to_string()))
}

fn set_header<B>(res: &mut HttpResponse<B>, name: &'static str, value: impl ToString) {
    if let Ok(value) = HeaderValue::from_str(&value.to_string()) {
        res.headers_mut().insert(HeaderName::from_static(name), value);
    }
}

fn quota_headers<B>(res: &mut HttpResponse<B>, quota: &Quota) {
    set_header(res, "x-ratelimit-limit", quota.limit);
    set_header(res, "x-ratelimit-remaining", quota.remaining);
}

impl<S, B> Service<ServiceRequest> for RateLimitService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let limiter = self.limiter.clone();
        let class = self.class;

        Box::pin(async move {
            let Some(ip) = client_ip(&req) else {
                tracing::debug!(class = %class, "No client address, skipping rate limit");
                let res = service.call(req).await?;
                return Ok(res.map_into_left_body());
            };

            match limiter.check(&ip, class).await {
                Decision::Allow(quota) => {
                    let mut res = service.call(req).await?;
                    quota_headers(res.response_mut(), &quota);
                    Ok(res.map_into_left_body())
                }
                Decision::Deny {
                    quota,
                    retry_after_secs,
                } => {
                    tracing::warn!(ip = %ip, class = %class, retry_after_secs, "Rate limit exceeded");

                    let mut error = ErrorResponse::rate_limited(retry_after_secs);
                    if let Some(id) = req.extensions().get::<RequestId>() {
                        error = error.with_request_id(id.as_str());
                    }

                    let mut response = HttpResponse::TooManyRequests().json(error);
                    quota_headers(&mut response, &quota);
                    set_header(&mut response, "retry-after", retry_after_secs);
                    set_header(&mut response, "x-ratelimit-reset", quota.reset_at_secs());

                    Ok(req.into_response(response).map_into_right_body())
                }
            }
        })
    }
}
