use std::{future::Future, num::NonZeroU32, sync::Arc, time::Duration};

use oauth2::AccessToken;
use url::Url;
use uuid::Uuid;

use crate::endpoints::BASE_URL;
use crate::entities::{
    contact::{self, Contact, ContactBody, ContactsPage},
    file::{self, FileReference},
    invoice::{self, CreateOptions, DeeplinkKind, DocumentFileReference, Invoice},
    ResourceReference,
};
use crate::error::{Error, Result};
use crate::transport::{BearerAuth, DefaultTransport, HttpTransport, RateLimit};

/// Environment variable holding the API key used by [`Client::from_env`].
pub const ENV_API_KEY: &str = "LEXOFFICE_API_KEY";
/// Optional environment variable overriding the base URL.
pub const ENV_BASE_URL: &str = "LEXOFFICE_BASE_URL";
/// Optional environment variable enabling the rate limiter.
pub const ENV_RATE: &str = "LEXOFFICE_RATE";

/// Settings applied once when a [`Client`] is created.
///
/// ```no_run
/// # fn main() -> lexoffice_rs::error::Result<()> {
/// use lexoffice_rs::{Client, ClientConfig};
///
/// let client = Client::new(
///     "api-key",
///     ClientConfig::default().with_rate(2),
/// )?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct ClientConfig {
    /// Overrides the default `https://api.lexoffice.io`.
    pub base_url: Option<String>,
    /// A custom HTTP client to send requests with.
    pub http_client: Option<reqwest::Client>,
    /// Limits outgoing calls to this many per second.
    pub rate: Option<u32>,
    /// Bounds every call, including the time spent waiting for the rate limiter.
    pub timeout: Option<Duration>,
}

impl ClientConfig {
    #[must_use]
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.http_client = Some(client);
        self
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    #[must_use]
    pub fn with_rate(mut self, ops_per_second: u32) -> Self {
        self.rate = Some(ops_per_second);
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();
        if let Some(base_url) = lookup(ENV_BASE_URL) {
            config.base_url = Some(base_url);
        }
        if let Some(rate) = lookup(ENV_RATE) {
            config.rate = Some(rate.trim().parse().map_err(|_| Error::MissingEnv(ENV_RATE))?);
        }
        Ok(config)
    }
}

/// The client used to talk to the lexoffice API.
///
/// Cloning is cheap: clones share the same transport and rate limiter, so a single
/// rate applies across all of them.
#[derive(Clone, Debug)]
pub struct Client {
    base_url: Url,
    http_client: reqwest::Client,
    transport: Arc<DefaultTransport>,
    timeout: Option<Duration>,
}

impl Client {
    /// Creates a client authenticating with `token`.
    ///
    /// # Errors
    /// Returns an error if the token is not a valid header value, the base URL can't be
    /// parsed, or the rate is zero or too high to express as an interval.
    #[instrument(skip(token))]
    pub fn new(token: impl Into<String>, config: ClientConfig) -> Result<Self> {
        let base_url = config.base_url.as_deref().unwrap_or(BASE_URL);
        let base_url =
            Url::parse(base_url).map_err(|e| Error::InvalidBaseUrl(format!("{base_url}: {e}")))?;
        if base_url.cannot_be_a_base() || !matches!(base_url.scheme(), "http" | "https") {
            return Err(Error::InvalidBaseUrl(base_url.to_string()));
        }

        let rate = match config.rate {
            Some(ops) => Some(NonZeroU32::new(ops).ok_or(Error::InvalidRate(ops))?),
            None => None,
        };

        let http_client = config.http_client.unwrap_or_default();
        let token = AccessToken::new(token.into());
        let transport = RateLimit::new(
            BearerAuth::new(HttpTransport::new(http_client.clone()), &token)?,
            rate,
        )?;

        debug!(%base_url, ?rate, timeout = ?config.timeout, "created lexoffice client");
        Ok(Self {
            base_url,
            http_client,
            transport: Arc::new(transport),
            timeout: config.timeout,
        })
    }

    /// Creates a client from `LEXOFFICE_API_KEY`, and optionally `LEXOFFICE_BASE_URL`
    /// and `LEXOFFICE_RATE`.
    ///
    /// # Errors
    /// Returns [`Error::MissingEnv`] if the API key is not set or the rate is not a number.
    pub fn from_env() -> Result<Self> {
        let lookup = |key: &str| std::env::var(key).ok();
        let token = lookup(ENV_API_KEY).ok_or(Error::MissingEnv(ENV_API_KEY))?;
        Self::new(token, ClientConfig::from_lookup(lookup)?)
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub(crate) fn http_client(&self) -> &reqwest::Client {
        &self.http_client
    }

    pub(crate) fn transport(&self) -> &DefaultTransport {
        &self.transport
    }

    /// Runs `call` under the configured timeout, if any.
    pub(crate) async fn with_deadline<T>(&self, call: impl Future<Output = Result<T>>) -> Result<T> {
        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, call).await.map_err(|_| {
                warn!(?limit, "request timed out");
                Error::Timeout(limit)
            })?,
            None => call.await,
        }
    }

    /// Access the contacts API
    #[must_use]
    pub fn contacts(&self) -> ContactsApi<'_> {
        ContactsApi { client: self }
    }

    /// Access the files API
    #[must_use]
    pub fn files(&self) -> FilesApi<'_> {
        FilesApi { client: self }
    }

    /// Access the invoices API
    #[must_use]
    pub fn invoices(&self) -> InvoicesApi<'_> {
        InvoicesApi { client: self }
    }
}

/// API handler for Contacts endpoints
#[derive(Debug)]
pub struct ContactsApi<'a> {
    client: &'a Client,
}

impl ContactsApi<'_> {
    /// Retrieve a single page of contacts matching the filters
    pub async fn list(&self, parameters: &contact::ListParameters) -> Result<ContactsPage> {
        contact::list(self.client, parameters).await
    }

    /// Retrieve every contact matching the filters, following all pages
    pub async fn list_all(&self, parameters: &contact::ListParameters) -> Result<Vec<Contact>> {
        contact::list_all(self.client, parameters).await
    }

    /// Retrieve a single contact by ID
    pub async fn get(&self, contact_id: Uuid) -> Result<Contact> {
        contact::get(self.client, contact_id).await
    }

    /// Create a new contact
    pub async fn create(&self, contact: &ContactBody) -> Result<ResourceReference> {
        contact::create(self.client, contact).await
    }

    /// Update an existing contact
    pub async fn update(&self, contact_id: Uuid, contact: &ContactBody) -> Result<ResourceReference> {
        contact::update(self.client, contact_id, contact).await
    }
}

/// API handler for Files endpoints
#[derive(Debug)]
pub struct FilesApi<'a> {
    client: &'a Client,
}

impl FilesApi<'_> {
    /// Upload a voucher file
    pub async fn upload(&self, file_name: &str, content: &[u8]) -> Result<FileReference> {
        file::upload(self.client, file_name, content).await
    }

    /// Download a file into `writer`, returning the number of bytes written
    pub async fn download<W>(&self, file_id: Uuid, writer: &mut W) -> Result<u64>
    where
        W: tokio::io::AsyncWrite + Unpin + ?Sized,
    {
        file::download(self.client, file_id, writer).await
    }
}

/// API handler for Invoices endpoints
#[derive(Debug)]
pub struct InvoicesApi<'a> {
    client: &'a Client,
}

impl InvoicesApi<'_> {
    /// Get a single invoice by ID
    pub async fn get(&self, invoice_id: Uuid) -> Result<Invoice> {
        invoice::get(self.client, invoice_id).await
    }

    /// Create an invoice, or pursue a preceding sales voucher to one
    pub async fn create(&self, options: CreateOptions) -> Result<ResourceReference> {
        invoice::create(self.client, options).await
    }

    /// Render the invoice document, returning the id of the resulting file
    pub async fn render_document(&self, invoice_id: Uuid) -> Result<DocumentFileReference> {
        invoice::render_document(self.client, invoice_id).await
    }

    /// Get the URL that opens the invoice in the lexoffice web app
    #[must_use]
    pub fn deeplink_url(&self, invoice_id: Uuid, kind: DeeplinkKind) -> String {
        invoice::deeplink_url(self.client, invoice_id, kind)
    }
}
