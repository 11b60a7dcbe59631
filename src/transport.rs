//! The transport chain every request passes through.
//!
//! Each layer implements [`Transport`] and forwards to the layer it wraps. The client
//! composes them as [`RateLimit`] around [`BearerAuth`] around [`HttpTransport`], so a
//! request is throttled before it is authenticated and sent.

use std::{fmt, future::Future, num::NonZeroU32, time::Duration};

use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use oauth2::AccessToken;
use reqwest::header::{self, HeaderValue};

use crate::error::{Error, Result};

/// Something that can perform an HTTP request.
pub trait Transport: Send + Sync {
    fn execute(
        &self,
        request: reqwest::Request,
    ) -> impl Future<Output = Result<reqwest::Response>> + Send;
}

/// The innermost layer, sending requests with a [`reqwest::Client`].
#[derive(Debug, Clone, Default)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    #[must_use]
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Transport for HttpTransport {
    fn execute(
        &self,
        request: reqwest::Request,
    ) -> impl Future<Output = Result<reqwest::Response>> + Send {
        let pending = self.client.execute(request);
        async move { pending.await.map_err(Error::Request) }
    }
}

/// Adds `Authorization: Bearer <token>` to every request.
pub struct BearerAuth<T> {
    inner: T,
    authorization: HeaderValue,
}

impl<T> BearerAuth<T> {
    /// # Errors
    /// Returns [`Error::InvalidToken`] if the token can't be used in a header.
    pub fn new(inner: T, token: &AccessToken) -> Result<Self> {
        let mut authorization = HeaderValue::from_str(&format!("Bearer {}", token.secret()))
            .map_err(|_| Error::InvalidToken)?;
        authorization.set_sensitive(true);
        Ok(Self {
            inner,
            authorization,
        })
    }

    #[must_use]
    pub fn inner(&self) -> &T {
        &self.inner
    }
}

impl<T: Transport> Transport for BearerAuth<T> {
    fn execute(
        &self,
        mut request: reqwest::Request,
    ) -> impl Future<Output = Result<reqwest::Response>> + Send {
        request
            .headers_mut()
            .insert(header::AUTHORIZATION, self.authorization.clone());
        self.inner.execute(request)
    }
}

impl<T: fmt::Debug> fmt::Debug for BearerAuth<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BearerAuth")
            .field("inner", &self.inner)
            .field("authorization", &"Bearer [redacted]")
            .finish()
    }
}

/// Waits for a token from a single shared bucket of capacity 1 before forwarding.
///
/// Without a configured rate requests pass straight through. Dropping the returned
/// future while it waits cancels the call before anything is sent.
pub struct RateLimit<T> {
    inner: T,
    limiter: Option<DefaultDirectRateLimiter>,
}

impl<T> RateLimit<T> {
    /// # Errors
    /// Returns [`Error::InvalidRate`] if the interval `1s / ops_per_second` rounds to zero.
    pub fn new(inner: T, ops_per_second: Option<NonZeroU32>) -> Result<Self> {
        let limiter = match ops_per_second {
            Some(ops) => {
                let quota = Quota::with_period(Duration::from_secs(1) / ops.get())
                    .ok_or(Error::InvalidRate(ops.get()))?;
                Some(RateLimiter::direct(quota))
            }
            None => None,
        };
        Ok(Self { inner, limiter })
    }

    #[must_use]
    pub fn is_limited(&self) -> bool {
        self.limiter.is_some()
    }

    #[must_use]
    pub fn inner(&self) -> &T {
        &self.inner
    }
}

impl<T: Transport> Transport for RateLimit<T> {
    fn execute(
        &self,
        request: reqwest::Request,
    ) -> impl Future<Output = Result<reqwest::Response>> + Send {
        async move {
            if let Some(limiter) = &self.limiter {
                trace!(url = %request.url(), "waiting for rate limiter");
                limiter.until_ready().await;
            }
            self.inner.execute(request).await
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for RateLimit<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RateLimit")
            .field("inner", &self.inner)
            .field("limited", &self.limiter.is_some())
            .finish()
    }
}

/// The chain used by [`crate::Client`].
pub type DefaultTransport = RateLimit<BearerAuth<HttpTransport>>;
