use reqwest::Method;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    Client,
    endpoints::LexofficeEndpoint,
    entities::ResourceReference,
    error::{LegacyErrorResponse, Result},
};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerRole {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number: Option<i64>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VendorRole {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number: Option<i64>,
}

/// A contact is a customer, a vendor or both. Setting a role without a number lets
/// lexoffice assign one.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roles {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer: Option<CustomerRole>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vendor: Option<VendorRole>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactPerson {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub salutation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    pub last_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tax_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vat_registration_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_tax_free_invoices: Option<bool>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub contact_persons: Vec<ContactPerson>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub salutation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    pub last_name: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supplement: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub street: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    pub country_code: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Addresses {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub billing: Vec<Address>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub shipping: Vec<Address>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailAddresses {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub business: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub office: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub private: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub other: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhoneNumbers {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub business: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub office: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mobile: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub private: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fax: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub other: Vec<String>,
}

/// A contact as returned by the API.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    pub id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization_id: Option<Uuid>,
    pub version: i64,
    #[serde(default)]
    pub roles: Roles,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<Company>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub person: Option<Person>,
    #[serde(default)]
    pub addresses: Addresses,
    #[serde(default)]
    pub email_addresses: EmailAddresses,
    #[serde(default)]
    pub phone_numbers: PhoneNumbers,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default)]
    pub archived: bool,
}

/// The body used to create or update a contact. Exactly one of `company` and
/// `person` should be set.
///
/// `version` must be 0 when creating and the current version when updating.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactBody {
    pub version: i64,
    pub roles: Roles,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<Company>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub person: Option<Person>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub addresses: Option<Addresses>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_addresses: Option<EmailAddresses>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_numbers: Option<PhoneNumbers>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl From<Contact> for ContactBody {
    fn from(contact: Contact) -> Self {
        Self {
            version: contact.version,
            roles: contact.roles,
            company: contact.company,
            person: contact.person,
            addresses: Some(contact.addresses),
            email_addresses: Some(contact.email_addresses),
            phone_numbers: Some(contact.phone_numbers),
            note: contact.note,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Sort {
    pub property: String,
    pub direction: String,
    pub ignore_case: bool,
    pub null_handling: String,
    pub ascending: bool,
}

/// One page of the contacts list.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ContactsPage {
    pub content: Vec<Contact>,
    pub first: bool,
    pub last: bool,
    pub total_pages: u32,
    pub total_elements: u64,
    pub number_of_elements: u32,
    pub size: u32,
    pub number: u32,
    pub sort: Vec<Sort>,
}

/// Filters for listing contacts. `None` leaves a filter out of the request entirely,
/// while `Some(false)`, `Some(0)` and `Some(String::new())` are sent as given.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ListParameters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number: Option<i64>,
    /// `Some(true)` lists only customers, `Some(false)` only non-customers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer: Option<bool>,
    /// `Some(true)` lists only vendors, `Some(false)` only non-vendors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vendor: Option<bool>,
}

/// Retrieve a single page of contacts.
#[instrument(skip(client))]
pub async fn list(client: &Client, parameters: &ListParameters) -> Result<ContactsPage> {
    client
        .request(Method::GET, LexofficeEndpoint::Contacts)
        .query(parameters)
        .fetch::<_, LegacyErrorResponse>()
        .await
        .map_err(|e| e.context("error getting contacts"))
}

/// Retrieve all contacts by walking the pages from `parameters.page` (or the first
/// page) to the last one. Fails without partial results if any page fails.
#[instrument(skip(client))]
pub async fn list_all(client: &Client, parameters: &ListParameters) -> Result<Vec<Contact>> {
    let mut parameters = parameters.clone();
    let mut page = parameters.page.unwrap_or(0);
    let mut contacts = Vec::new();

    loop {
        parameters.page = Some(page);
        let response = list(client, &parameters).await?;
        debug!(
            page,
            total_pages = response.total_pages,
            received = response.content.len(),
            "received contacts page"
        );
        contacts.extend(response.content);

        match page.checked_add(1) {
            Some(next) if next < response.total_pages => page = next,
            _ => break,
        }
    }

    Ok(contacts)
}

/// Retrieve a single contact by it's `contact_id`.
#[instrument(skip(client))]
pub async fn get(client: &Client, contact_id: Uuid) -> Result<Contact> {
    client
        .request(Method::GET, LexofficeEndpoint::Contact(contact_id))
        .fetch::<_, LegacyErrorResponse>()
        .await
        .map_err(|e| e.context("error getting contact"))
}

/// Create a new contact.
#[instrument(skip(client, contact))]
pub async fn create(client: &Client, contact: &ContactBody) -> Result<ResourceReference> {
    trace!(json = ?serde_json::to_string(contact).ok(), "creating contact");
    client
        .request(Method::POST, LexofficeEndpoint::Contacts)
        .json(contact)
        .fetch::<_, LegacyErrorResponse>()
        .await
        .map_err(|e| e.context("error creating contact"))
}

/// Update an existing contact. `contact.version` must match the stored version.
#[instrument(skip(client, contact))]
pub async fn update(
    client: &Client,
    contact_id: Uuid,
    contact: &ContactBody,
) -> Result<ResourceReference> {
    trace!(json = ?serde_json::to_string(contact).ok(), "updating contact");
    client
        .request(Method::PUT, LexofficeEndpoint::Contact(contact_id))
        .json(contact)
        .fetch::<_, LegacyErrorResponse>()
        .await
        .map_err(|e| e.context("error updating contact"))
}
