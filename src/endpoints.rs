use std::{borrow::Cow, fmt};
use url::Url;
use uuid::Uuid;

use crate::error::{Error, Result};

pub const BASE_URL: &str = "https://api.lexoffice.io";

/// A typed representation of lexoffice API endpoints.
///
/// Paths are absolute and resolved against the client's base URL, so a base URL
/// such as a local mock server can stand in for the public API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LexofficeEndpoint {
    Contacts,
    Contact(Uuid),
    Files,
    File(Uuid),
    Invoices,
    Invoice(Uuid),
    InvoiceDocument(Uuid),

    // Custom endpoint with an already formatted path
    Custom(String),
}

impl LexofficeEndpoint {
    /// The path of the endpoint, starting with `/`.
    #[must_use]
    pub fn path(&self) -> Cow<'_, str> {
        match self {
            Self::Contacts => Cow::Borrowed("/v1/contacts"),
            Self::Contact(id) => Cow::Owned(format!("/v1/contacts/{id}")),
            Self::Files => Cow::Borrowed("/v1/files"),
            Self::File(id) => Cow::Owned(format!("/v1/files/{id}")),
            Self::Invoices => Cow::Borrowed("/v1/invoices"),
            Self::Invoice(id) => Cow::Owned(format!("/v1/invoices/{id}")),
            Self::InvoiceDocument(id) => Cow::Owned(format!("/v1/invoices/{id}/document")),
            Self::Custom(path) => Cow::Borrowed(path),
        }
    }

    /// Resolves the endpoint against `base`.
    pub fn to_url(&self, base: &Url) -> Result<Url> {
        base.join(&self.path()).map_err(|_| Error::InvalidEndpoint)
    }
}

impl fmt::Display for LexofficeEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

impl From<String> for LexofficeEndpoint {
    fn from(path: String) -> Self {
        Self::Custom(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_against_default_base() {
        let base = Url::parse(BASE_URL).unwrap();
        let id = Uuid::parse_str("e9066f04-8cc7-4616-93f8-ac9ecc8479c8").unwrap();

        assert_eq!(
            LexofficeEndpoint::Contacts.to_url(&base).unwrap().as_str(),
            "https://api.lexoffice.io/v1/contacts"
        );
        assert_eq!(
            LexofficeEndpoint::InvoiceDocument(id)
                .to_url(&base)
                .unwrap()
                .as_str(),
            "https://api.lexoffice.io/v1/invoices/e9066f04-8cc7-4616-93f8-ac9ecc8479c8/document"
        );
    }

    #[test]
    fn resolves_against_mock_server_base() {
        let base = Url::parse("http://127.0.0.1:1234").unwrap();
        let id = Uuid::nil();
        assert_eq!(
            LexofficeEndpoint::File(id).to_url(&base).unwrap().as_str(),
            "http://127.0.0.1:1234/v1/files/00000000-0000-0000-0000-000000000000"
        );
    }

    #[test]
    fn custom_paths_are_used_verbatim() {
        let endpoint = LexofficeEndpoint::from(format!("/v1/{}/{}", "profile", "me"));
        assert_eq!(endpoint.to_string(), "/v1/profile/me");
    }
}
