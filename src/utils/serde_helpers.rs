use serde::{Deserialize, Deserializer};

/// Deserializes a value, treating `null` like a missing field.
/// Error bodies sometimes send `"type": null` or `"details": null`.
pub fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, Default, Deserialize)]
    #[serde(default)]
    struct Lenient {
        #[serde(deserialize_with = "null_as_default")]
        name: String,
        #[serde(deserialize_with = "null_as_default")]
        tags: Vec<String>,
        #[serde(deserialize_with = "null_as_default")]
        count: u16,
    }

    #[test]
    fn null_becomes_default() {
        let value: Lenient =
            serde_json::from_str(r#"{"name":null,"tags":null,"count":null}"#).unwrap();
        assert!(value.name.is_empty());
        assert!(value.tags.is_empty());
        assert_eq!(value.count, 0);
    }

    #[test]
    fn present_values_are_kept() {
        let value: Lenient = serde_json::from_str(r#"{"name":"x","tags":["a"]}"#).unwrap();
        assert_eq!(value.name, "x");
        assert_eq!(value.tags, vec!["a".to_string()]);
        assert_eq!(value.count, 0);
    }
}
