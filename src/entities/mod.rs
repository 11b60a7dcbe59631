use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::utils::date_format::lexoffice_datetime_format_option;

pub mod contact;
pub mod file;
pub mod invoice;

/// Represents the structure returned by the lexoffice API when creating or updating
/// objects.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceReference {
    pub id: Uuid,
    #[serde(default)]
    pub resource_uri: String,
    #[serde(
        default,
        with = "lexoffice_datetime_format_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_date: Option<OffsetDateTime>,
    #[serde(
        default,
        with = "lexoffice_datetime_format_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub updated_date: Option<OffsetDateTime>,
    #[serde(default)]
    pub version: i64,
}
