use time::{OffsetDateTime, format_description::BorrowedFormatItem, macros::format_description};

/// The timestamp format used throughout the lexoffice API, e.g. `2023-02-21T00:00:00.000+01:00`.
pub const DATE_FORMAT: &[BorrowedFormatItem<'static>] = format_description!(
    "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:3][offset_hour sign:mandatory]:[offset_minute]"
);

/// Formats a timestamp in the API format. Sub-millisecond precision is truncated.
pub fn format_datetime(datetime: &OffsetDateTime) -> Result<String, time::error::Format> {
    datetime.format(DATE_FORMAT)
}

/// Parses a timestamp in the API format.
pub fn parse_datetime(datetime_str: &str) -> Result<OffsetDateTime, time::error::Parse> {
    OffsetDateTime::parse(datetime_str, DATE_FORMAT)
}

// Serialization module for time::OffsetDateTime
pub mod lexoffice_datetime_format {
    use serde::{self, Deserialize, Deserializer, Serializer};
    use time::OffsetDateTime;

    pub fn serialize<S>(datetime: &OffsetDateTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let formatted = super::format_datetime(datetime).map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(&formatted)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<OffsetDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let datetime_str = String::deserialize(deserializer)?;
        super::parse_datetime(&datetime_str).map_err(|e| {
            serde::de::Error::custom(format!("failed to parse datetime '{datetime_str}': {e}"))
        })
    }
}

// Optional OffsetDateTime serialization, treating null and "" as absent
pub mod lexoffice_datetime_format_option {
    use serde::{self, Deserialize, Deserializer, Serializer};
    use time::OffsetDateTime;

    #[allow(clippy::ref_option)]
    pub fn serialize<S>(datetime: &Option<OffsetDateTime>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match datetime {
            Some(dt) => super::lexoffice_datetime_format::serialize(dt, serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<OffsetDateTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<String>::deserialize(deserializer)? {
            Some(s) if !s.is_empty() => super::parse_datetime(&s).map(Some).map_err(|e| {
                serde::de::Error::custom(format!("failed to parse datetime '{s}': {e}"))
            }),
            _ => Ok(None),
        }
    }
}
