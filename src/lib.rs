//! # lexoffice-rs
//!
//! A Rust client library for the lexoffice API.
//!
//! Every call goes through the same pipeline: a [`request::RequestBuilder`] resolves
//! the endpoint against the base URL, the [`transport`] chain throttles and
//! authenticates it, and the response is decoded into the success type or, on a
//! non-2xx status, into the error shape of the endpoint family.
//!
//! ```no_run
//! # async fn run() -> lexoffice_rs::error::Result<()> {
//! use lexoffice_rs::{Client, ClientConfig, contact::ListParameters};
//!
//! let client = Client::new("api-key", ClientConfig::default().with_rate(2))?;
//! let customers = client
//!     .contacts()
//!     .list_all(&ListParameters {
//!         customer: Some(true),
//!         ..ListParameters::default()
//!     })
//!     .await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Errors
//!
//! Failed operations return [`Error::Operation`], whose message names the operation
//! and embeds the rendered API error, e.g.
//! `error creating contact (missing_entity: company.name (validation_failure)): unexpected status 400 Bad Request from ...`.
//! The decoded payload stays available through [`Error::payload`], and with a
//! `tracing_error::ErrorLayer` installed, [`Error::span_trace`] shows where the call
//! was made from.

#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]

#[macro_use]
extern crate tracing;

pub mod client;
pub mod endpoints;
pub mod entities;
pub mod error;
pub mod request;
mod response;
pub mod transport;
pub mod utils;

pub use client::{Client, ClientConfig};
pub use endpoints::LexofficeEndpoint;
pub use entities::*;
pub use error::{Error, ErrorPayload, ErrorResponse, LegacyErrorResponse};

// Re-export SpanTrace for users who want to access it
pub use tracing_error::SpanTrace;
