use reqwest::{Method, header, multipart::Form};
use serde::{Serialize, de::DeserializeOwned};
use tokio::io::AsyncWrite;

use crate::{
    client::Client,
    error::{ApiErrorBody, Result},
    response,
    transport::Transport,
};

const APPLICATION_JSON: &str = "application/json";

/// An outbound call against the client's base URL, built up fluently and then sent
/// with [`RequestBuilder::fetch`] or [`RequestBuilder::download`].
///
/// Errors from resolving the URL or encoding the body are deferred until the request
/// is built.
#[derive(Debug)]
#[must_use = "a request does nothing until it is fetched"]
pub struct RequestBuilder<'a> {
    client: &'a Client,
    inner: Result<reqwest::RequestBuilder>,
    accept: &'static str,
}

impl<'a> RequestBuilder<'a> {
    pub(crate) fn new(client: &'a Client, inner: Result<reqwest::RequestBuilder>) -> Self {
        Self {
            client,
            inner,
            accept: APPLICATION_JSON,
        }
    }

    fn map(mut self, f: impl FnOnce(reqwest::RequestBuilder) -> reqwest::RequestBuilder) -> Self {
        self.inner = self.inner.map(f);
        self
    }

    /// Appends the non-`None` fields of `query` as query parameters.
    ///
    /// `Some(0)`, `Some(false)` and `Some("")` are sent; only absent values are omitted.
    pub fn query<T: Serialize + ?Sized>(self, query: &T) -> Self {
        self.map(|builder| builder.query(query))
    }

    /// Appends a single query parameter.
    pub fn param(self, key: &str, value: impl ToString) -> Self {
        let value = value.to_string();
        self.map(|builder| builder.query(&[(key, value)]))
    }

    /// Sends `body` JSON encoded with `Content-Type: application/json`.
    pub fn json<T: Serialize + ?Sized>(self, body: &T) -> Self {
        self.map(|builder| builder.json(body))
    }

    /// Sends a multipart form; the content type carries the form boundary.
    pub fn multipart(self, form: Form) -> Self {
        self.map(|builder| builder.multipart(form))
    }

    /// Overrides the `Accept` header, which defaults to `application/json`.
    pub fn accept(mut self, accept: &'static str) -> Self {
        self.accept = accept;
        self
    }

    /// Builds the request without sending it.
    pub fn build(self) -> Result<reqwest::Request> {
        let accept = self.accept;
        Ok(self.inner?.header(header::ACCEPT, accept).build()?)
    }

    /// Sends the request, decoding a 2xx body as `R` and any other body as `E`.
    pub async fn fetch<R, E>(self) -> Result<R>
    where
        R: DeserializeOwned,
        E: ApiErrorBody,
    {
        let client = self.client;
        let request = self.build()?;
        trace!(method = %request.method(), url = %request.url(), "sending request");
        client
            .with_deadline(async move {
                let response = client.transport().execute(request).await?;
                response::handle_response::<R, E>(response).await
            })
            .await
    }

    /// Sends the request and streams a 2xx body into `writer`; any other body is decoded as `E`.
    pub async fn download<E, W>(self, writer: &mut W) -> Result<u64>
    where
        E: ApiErrorBody,
        W: AsyncWrite + Unpin + ?Sized,
    {
        let client = self.client;
        let request = self.build()?;
        trace!(method = %request.method(), url = %request.url(), "sending download request");
        client
            .with_deadline(async move {
                let response = client.transport().execute(request).await?;
                response::stream_response::<E, W>(response, writer).await
            })
            .await
    }
}

impl Client {
    /// Starts a request against `endpoint`.
    pub fn request(
        &self,
        method: Method,
        endpoint: impl Into<crate::LexofficeEndpoint>,
    ) -> RequestBuilder<'_> {
        let endpoint = endpoint.into();
        let inner = endpoint
            .to_url(self.base_url())
            .map(|url| self.http_client().request(method, url));
        RequestBuilder::new(self, inner)
    }
}
