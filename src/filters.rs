use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::DataListError;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RangeBounds {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DateBounds {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,
}

/// One advanced filter selection.
///
/// Serialises to the plain JSON shapes a REST backend expects: a bare string,
/// `{ "min", "max" }` or `{ "start", "end" }`. When reading, a JSON number
/// becomes a scalar holding its decimal text and `null` becomes an empty
/// (inactive) scalar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FilterValue {
    Scalar(String),
    DateRange(DateBounds),
    Range(RangeBounds),
}

impl<'de> Deserialize<'de> for FilterValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Wire {
            Text(String),
            Number(serde_json::Number),
            DateRange(DateBounds),
            Range(RangeBounds),
            Null,
        }

        Ok(match Wire::deserialize(deserializer)? {
            Wire::Text(s) => FilterValue::Scalar(s),
            Wire::Number(n) => FilterValue::Scalar(n.to_string()),
            Wire::DateRange(d) => FilterValue::DateRange(d),
            Wire::Range(r) => FilterValue::Range(r),
            Wire::Null => FilterValue::Scalar(String::new()),
        })
    }
}

fn populated(bound: &Option<String>) -> bool {
    bound.as_deref().is_some_and(|s| !s.is_empty())
}

impl FilterValue {
    pub fn scalar(value: impl Into<String>) -> Self {
        FilterValue::Scalar(value.into())
    }

    pub fn range(min: Option<&str>, max: Option<&str>) -> Self {
        FilterValue::Range(RangeBounds {
            min: min.map(str::to_owned),
            max: max.map(str::to_owned),
        })
    }

    pub fn date_range(start: Option<&str>, end: Option<&str>) -> Self {
        FilterValue::DateRange(DateBounds {
            start: start.map(str::to_owned),
            end: end.map(str::to_owned),
        })
    }

    /// A non-empty scalar, or a range with at least one populated bound.
    pub fn is_active(&self) -> bool {
        match self {
            FilterValue::Scalar(s) => !s.is_empty(),
            FilterValue::Range(r) => populated(&r.min) || populated(&r.max),
            FilterValue::DateRange(d) => populated(&d.start) || populated(&d.end),
        }
    }
}

/// Advanced-filter selections keyed by filter field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilterState {
    values: BTreeMap<String, FilterValue>,
}

impl FilterState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a new state with `key` replaced by `value`. Merging is shallow:
    /// a range value replaces the previous range as a whole.
    pub fn merged(&self, key: &str, value: FilterValue) -> Self {
        let mut values = self.values.clone();
        values.insert(key.to_owned(), value);
        FilterState { values }
    }

    pub fn get(&self, key: &str) -> Option<&FilterValue> {
        self.values.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FilterValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn active_count(&self) -> usize {
        count_active_filters(self)
    }
}

impl<K: Into<String>> FromIterator<(K, FilterValue)> for FilterState {
    fn from_iter<I: IntoIterator<Item = (K, FilterValue)>>(iter: I) -> Self {
        FilterState {
            values: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

/// Number of meaningful entries in `filters`. Drives the "filters active" badge.
pub fn count_active_filters(filters: &FilterState) -> usize {
    filters.values.values().filter(|v| v.is_active()).count()
}

/// The declared type of an advanced filter field. The variant of a
/// [`FilterValue`] is decided by this, never by looking at the value's shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum FilterKind {
    Text,
    Select { options: Vec<String> },
    Range,
    DateRange,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterField {
    pub key: String,
    pub label: String,
    #[serde(flatten)]
    pub kind: FilterKind,
}

impl FilterField {
    pub fn new(key: &str, label: &str, kind: FilterKind) -> Self {
        FilterField {
            key: key.to_owned(),
            label: label.to_owned(),
            kind,
        }
    }

    pub fn empty_value(&self) -> FilterValue {
        match self.kind {
            FilterKind::Text | FilterKind::Select { .. } => FilterValue::Scalar(String::new()),
            FilterKind::Range => FilterValue::Range(RangeBounds::default()),
            FilterKind::DateRange => FilterValue::DateRange(DateBounds::default()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilterSchema {
    fields: Vec<FilterField>,
}

impl FilterSchema {
    const DATE_FORMAT: &str = "%Y-%m-%d";

    pub fn new(fields: Vec<FilterField>) -> Self {
        FilterSchema { fields }
    }

    pub fn fields(&self) -> &[FilterField] {
        &self.fields
    }

    pub fn field(&self, key: &str) -> Option<&FilterField> {
        self.fields.iter().find(|f| f.key == key)
    }

    pub fn empty_value(&self, key: &str) -> Option<FilterValue> {
        self.field(key).map(FilterField::empty_value)
    }

    /// A state holding the empty value of every declared field.
    pub fn empty_state(&self) -> FilterState {
        self.fields
            .iter()
            .map(|f| (f.key.clone(), f.empty_value()))
            .collect()
    }

    /// Check that `value` has the shape the field declares. Empty values are
    /// always accepted.
    pub fn validate(&self, key: &str, value: &FilterValue) -> Result<(), DataListError> {
        let field = self
            .field(key)
            .ok_or_else(|| DataListError::invalid_filter(key, "no such filter field"))?;

        match (&field.kind, value) {
            (FilterKind::Text, FilterValue::Scalar(_)) => Ok(()),
            (FilterKind::Select { options }, FilterValue::Scalar(s)) => {
                if s.is_empty() || options.iter().any(|o| o == s) {
                    Ok(())
                } else {
                    Err(DataListError::invalid_filter(
                        key,
                        format!("'{s}' is not one of the allowed options"),
                    ))
                }
            }
            (FilterKind::Range, FilterValue::Range(r)) => {
                let min = Self::parse_number(key, &r.min)?;
                let max = Self::parse_number(key, &r.max)?;
                match (min, max) {
                    (Some(min), Some(max)) if min > max => Err(DataListError::invalid_filter(
                        key,
                        "minimum is greater than maximum",
                    )),
                    _ => Ok(()),
                }
            }
            (FilterKind::DateRange, FilterValue::DateRange(d)) => {
                let start = Self::parse_date(key, &d.start)?;
                let end = Self::parse_date(key, &d.end)?;
                match (start, end) {
                    (Some(start), Some(end)) if start > end => Err(
                        DataListError::invalid_filter(key, "start date is after end date"),
                    ),
                    _ => Ok(()),
                }
            }
            (kind, _) => Err(DataListError::invalid_filter(
                key,
                format!("value does not match declared kind {kind:?}"),
            )),
        }
    }

    fn parse_number(key: &str, bound: &Option<String>) -> Result<Option<f64>, DataListError> {
        match bound.as_deref() {
            None | Some("") => Ok(None),
            Some(s) => s.trim().parse::<f64>().map(Some).map_err(|_| {
                DataListError::invalid_filter(key, format!("'{s}' is not a number"))
            }),
        }
    }

    fn parse_date(key: &str, bound: &Option<String>) -> Result<Option<NaiveDate>, DataListError> {
        match bound.as_deref() {
            None | Some("") => Ok(None),
            Some(s) => NaiveDate::parse_from_str(s, Self::DATE_FORMAT)
                .map(Some)
                .map_err(|_| {
                    DataListError::invalid_filter(key, format!("'{s}' is not a YYYY-MM-DD date"))
                }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use serde_json::json;

    fn member_schema() -> FilterSchema {
        FilterSchema::new(vec![
            FilterField::new("gender", "Gender", FilterKind::Select {
                options: vec!["male".into(), "female".into()],
            }),
            FilterField::new("ageRange", "Age", FilterKind::Range),
            FilterField::new("joinDate", "Join date", FilterKind::DateRange),
            FilterField::new("city", "City", FilterKind::Text),
        ])
    }

    #[test]
    fn test_range_counts_once_empty_scalar_ignored() {
        let filters: FilterState = [
            ("ageRange", FilterValue::range(Some("18"), Some(""))),
            ("gender", FilterValue::scalar("")),
        ]
        .into_iter()
        .collect();

        assert_eq!(count_active_filters(&filters), 1);
    }

    #[test]
    fn test_count_mixed_shapes() {
        let filters: FilterState = [
            ("city", FilterValue::scalar("Paris")),
            ("joinDate", FilterValue::date_range(None, Some("2024-01-31"))),
            ("ageRange", FilterValue::range(None, None)),
            ("weight", FilterValue::range(Some(""), Some(""))),
        ]
        .into_iter()
        .collect();

        assert_eq!(filters.active_count(), 2);
        assert_eq!(count_active_filters(&FilterState::new()), 0);
    }

    #[test]
    fn test_merged_returns_new_state() {
        let before = FilterState::new().merged("city", FilterValue::scalar("Rome"));
        let after = before.merged("ageRange", FilterValue::range(Some("20"), None));

        assert_eq!(before.len(), 1);
        assert_eq!(after.len(), 2);
        assert_eq!(after.get("city"), Some(&FilterValue::scalar("Rome")));

        // Shallow merge: the whole range is replaced
        let replaced = after.merged("ageRange", FilterValue::range(None, Some("40")));
        assert_eq!(
            replaced.get("ageRange"),
            Some(&FilterValue::range(None, Some("40")))
        );
    }

    #[test]
    fn test_json_shapes() {
        let state: FilterState = serde_json::from_value(json!({
            "gender": "male",
            "ageRange": { "min": "18", "max": "" },
            "joinDate": { "start": "2024-01-01" },
            "empty": {}
        }))
        .unwrap();

        assert_eq!(state.get("gender"), Some(&FilterValue::scalar("male")));
        assert_eq!(
            state.get("ageRange"),
            Some(&FilterValue::range(Some("18"), Some("")))
        );
        assert_eq!(
            state.get("joinDate"),
            Some(&FilterValue::date_range(Some("2024-01-01"), None))
        );
        assert!(!state.get("empty").unwrap().is_active());
        assert_eq!(state.active_count(), 3);

        let back = serde_json::to_value(&state).unwrap();
        assert_eq!(back["joinDate"], json!({ "start": "2024-01-01" }));
    }

    #[test]
    fn test_null_is_inactive() {
        let state: FilterState =
            serde_json::from_value(json!({ "gender": null, "age": { "min": "1" } })).unwrap();

        assert_eq!(state.len(), 2);
        assert_eq!(state.get("gender"), Some(&FilterValue::scalar("")));
        assert_eq!(count_active_filters(&state), 1);
    }

    #[test]
    fn test_numbers_are_active_scalars() {
        let state: FilterState = serde_json::from_value(json!({ "age": 18 })).unwrap();
        assert_eq!(state.get("age"), Some(&FilterValue::scalar("18")));
        assert_eq!(count_active_filters(&state), 1);

        let state: FilterState =
            serde_json::from_value(json!({ "weight": 72.5, "floor": 0, "delta": -3 })).unwrap();
        assert_eq!(state.get("weight"), Some(&FilterValue::scalar("72.5")));
        assert_eq!(state.get("delta"), Some(&FilterValue::scalar("-3")));
        assert_eq!(state.active_count(), 3);

        // Still strict about everything else
        assert!(serde_json::from_value::<FilterState>(json!({ "flag": true })).is_err());
        assert!(serde_json::from_value::<FilterState>(json!({ "r": { "lo": "1" } })).is_err());
    }

    #[test]
    fn test_schema_empty_values() {
        let schema = member_schema();
        assert_eq!(schema.empty_value("gender"), Some(FilterValue::scalar("")));
        assert_eq!(
            schema.empty_value("ageRange"),
            Some(FilterValue::Range(RangeBounds::default()))
        );
        assert_eq!(schema.empty_value("nope"), None);

        let state = schema.empty_state();
        assert_eq!(state.len(), 4);
        assert_eq!(state.active_count(), 0);
    }

    #[test]
    fn test_schema_validate() {
        let schema = member_schema();

        assert!(schema.validate("gender", &FilterValue::scalar("male")).is_ok());
        assert!(schema.validate("gender", &FilterValue::scalar("")).is_ok());
        assert!(schema.validate("gender", &FilterValue::scalar("other")).is_err());

        assert!(schema
            .validate("ageRange", &FilterValue::range(Some("18"), Some("65")))
            .is_ok());
        assert!(schema
            .validate("ageRange", &FilterValue::range(Some("65"), Some("18")))
            .is_err());
        assert!(schema
            .validate("ageRange", &FilterValue::range(Some("abc"), None))
            .is_err());

        assert!(schema
            .validate("joinDate", &FilterValue::date_range(Some("2024-01-01"), Some("2024-02-01")))
            .is_ok());
        assert!(schema
            .validate("joinDate", &FilterValue::date_range(Some("2024-03-01"), Some("2024-02-01")))
            .is_err());
        assert!(schema
            .validate("joinDate", &FilterValue::date_range(Some("01/02/2024"), None))
            .is_err());

        // Shape mismatch against declared kind
        let err = schema
            .validate("city", &FilterValue::range(Some("1"), None))
            .unwrap_err();
        assert!(matches!(err, DataListError::InvalidFilter { .. }));

        assert!(schema.validate("unknown", &FilterValue::scalar("x")).is_err());
    }

    #[test]
    fn test_schema_deserializes_with_type_tag() {
        let schema: FilterSchema = serde_json::from_value(json!([
            { "key": "status", "label": "Status", "type": "select", "options": ["active", "expired"] },
            { "key": "joinDate", "label": "Joined", "type": "dateRange" }
        ]))
        .unwrap();

        assert_eq!(schema.fields().len(), 2);
        assert!(matches!(schema.field("joinDate").unwrap().kind, FilterKind::DateRange));
    }

    proptest! {
        #[test]
        fn prop_count_never_exceeds_entries(
            entries in proptest::collection::btree_map("[a-z]{1,6}", "[a-z]{0,3}", 0..12)
        ) {
            let state: FilterState = entries
                .iter()
                .map(|(k, v)| (k.clone(), FilterValue::scalar(v.clone())))
                .collect();
            let expected = entries.values().filter(|v| !v.is_empty()).count();
            prop_assert_eq!(count_active_filters(&state), expected);
            prop_assert!(count_active_filters(&state) <= state.len());
        }
    }
}
