use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tracing::warn;

use crate::errors::ParseError;

static LINE_BREAKS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\r\n]+").expect("line break pattern compiles"));

// A single-quoted run with no quote characters inside it. Nested or escaped
// quotes are not handled.
static SINGLE_QUOTED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"'([^'"]*)'"#).expect("single quote pattern compiles"));

/// Feature lists keyed by category label, in the order the blob listed them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeatureMap {
    categories: Vec<(String, Vec<String>)>,
}

impl FeatureMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a category, replacing the features of an existing label in place.
    pub fn insert(&mut self, label: impl Into<String>, features: Vec<String>) {
        let label = label.into();
        match self.categories.iter_mut().find(|(existing, _)| *existing == label) {
            Some((_, slot)) => *slot = features,
            None => self.categories.push((label, features)),
        }
    }

    pub fn get(&self, label: &str) -> Option<&[String]> {
        self.categories
            .iter()
            .find(|(existing, _)| existing == label)
            .map(|(_, features)| features.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.categories
            .iter()
            .map(|(label, features)| (label.as_str(), features.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

/// Rewrites the spreadsheet's single-quoted pseudo-JSON into JSON text.
pub fn repair_quotes(text: &str) -> String {
    let collapsed = LINE_BREAKS.replace_all(text.trim(), " ");
    SINGLE_QUOTED.replace_all(&collapsed, "\"${1}\"").into_owned()
}

/// Parses a category blurb such as `{'Amenities': ['Wifi', 'Parking']}`.
///
/// Entries whose value is not a list of strings are dropped with a warning.
pub fn try_parse_features(text: &str) -> Result<FeatureMap, ParseError> {
    let repaired = repair_quotes(text);
    let value: Value =
        serde_json::from_str(&repaired).map_err(|source| ParseError::InvalidFeatureBlock { source })?;

    let entries = match value {
        Value::Object(entries) => entries,
        other => {
            return Err(ParseError::FeatureBlockShape {
                found: value_kind(&other),
            })
        }
    };

    let mut features = FeatureMap::new();
    for (label, value) in entries {
        match string_list(&value) {
            Some(list) => features.insert(label, list),
            None => warn!(
                category = %label,
                kind = value_kind(&value),
                "Dropping feature category that is not a list of strings"
            ),
        }
    }
    Ok(features)
}

/// Like [`try_parse_features`] but never fails; malformed input yields an empty map.
pub fn parse_features(text: &str) -> FeatureMap {
    try_parse_features(text).unwrap_or_else(|err| {
        warn!(raw = text, error = %err, "Could not parse feature block");
        FeatureMap::new()
    })
}

fn string_list(value: &Value) -> Option<Vec<String>> {
    value
        .as_array()?
        .iter()
        .map(|item| item.as_str().map(str::to_string))
        .collect()
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_single_quoted_blob() {
        let map = parse_features("{'Amenities': ['Wifi', 'Parking']}");
        assert_eq!(map.len(), 1);
        assert_eq!(
            map.get("Amenities"),
            Some(&["Wifi".to_string(), "Parking".to_string()][..])
        );
    }

    #[test]
    fn keeps_blob_order_and_collapses_newlines() {
        let text = "\n {'Service_options': ['Dine-in',\n 'Takeout'],\r\n 'Accessibility': ['Wheelchair accessible entrance']} \n";
        let map = parse_features(text);
        let labels: Vec<&str> = map.iter().map(|(label, _)| label).collect();
        assert_eq!(labels, vec!["Service_options", "Accessibility"]);
    }

    #[test]
    fn drops_non_list_entries() {
        let map = parse_features("{'Amenities': ['Wifi'], 'Rating': 4.5, 'Owner': 'Sam', 'Mixed': ['a', 1]}");
        assert_eq!(map.len(), 1);
        assert!(map.get("Rating").is_none());
        assert!(map.get("Mixed").is_none());
    }

    #[test]
    fn malformed_blob_is_empty() {
        assert!(parse_features("Serves breakfast and lunch. halal").is_empty());
        assert!(parse_features("{'Amenities': ['Wifi'").is_empty());
        assert!(matches!(
            try_parse_features("['Wifi']"),
            Err(ParseError::FeatureBlockShape { found: "array" })
        ));
    }

    #[test]
    fn apostrophes_inside_values_are_not_repaired() {
        assert!(try_parse_features("{'Offerings': ['Kids' menu']}").is_err());
    }
}
