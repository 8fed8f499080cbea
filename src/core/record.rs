use serde::{Deserialize, Serialize};

/// A scalar value as delivered by a record source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
}

impl FieldValue {
    /// Text rendering used for matching; `None` for nulls and blank strings
    #[must_use]
    pub fn as_text(&self) -> Option<String> {
        match self {
            Self::Null => None,
            Self::Bool(b) => Some(b.to_string()),
            Self::Number(n) => {
                if !n.is_finite() {
                    None
                } else if n.fract() == 0.0 && n.abs() < 1e15 {
                    #[allow(clippy::cast_possible_truncation)]
                    Some(format!("{}", *n as i64))
                } else {
                    Some(n.to_string())
                }
            }
            Self::Text(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(trimmed.to_string())
                }
            }
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.as_text().is_none()
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<f64> for FieldValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<i64> for FieldValue {
    fn from(n: i64) -> Self {
        #[allow(clippy::cast_precision_loss)]
        Self::Number(n as f64)
    }
}

/// A metadata row exactly as a source produced it.
///
/// Field order is preserved. Lookups are case-insensitive on the field name;
/// when the same name appears twice with different casing, the first
/// non-empty occurrence wins.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "serde_json::Map<String, serde_json::Value>")]
#[serde(into = "serde_json::Map<String, serde_json::Value>")]
pub struct RawRecord {
    fields: Vec<(String, FieldValue)>,
}

impl RawRecord {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.insert(name, value);
        self
    }

    /// Set a field, replacing any existing field with the same name
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) {
        let name = name.into();
        let value = value.into();
        let key = name.trim();
        match self
            .fields
            .iter_mut()
            .find(|(k, _)| k.trim().eq_ignore_ascii_case(key))
        {
            Some((_, existing)) => *existing = value,
            None => self.fields.push((name, value)),
        }
    }

    /// Look up a field by case-insensitive, trimmed name, skipping empty values
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .filter(|(k, _)| k.trim().eq_ignore_ascii_case(name))
            .map(|(_, v)| v)
            .find(|v| !v.is_empty())
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>, V: Into<FieldValue>> FromIterator<(K, V)> for RawRecord {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl From<serde_json::Map<String, serde_json::Value>> for RawRecord {
    fn from(map: serde_json::Map<String, serde_json::Value>) -> Self {
        let fields = map
            .into_iter()
            .map(|(k, v)| {
                let value = match v {
                    serde_json::Value::Null => FieldValue::Null,
                    serde_json::Value::Bool(b) => FieldValue::Bool(b),
                    serde_json::Value::Number(n) => {
                        n.as_f64().map_or(FieldValue::Null, FieldValue::Number)
                    }
                    serde_json::Value::String(s) => FieldValue::Text(s),
                    // Nested values are flattened to their JSON text
                    other => FieldValue::Text(other.to_string()),
                };
                (k, value)
            })
            .collect();
        Self { fields }
    }
}

impl From<RawRecord> for serde_json::Map<String, serde_json::Value> {
    fn from(record: RawRecord) -> Self {
        record
            .fields
            .into_iter()
            .map(|(k, v)| {
                let value = match v {
                    FieldValue::Null => serde_json::Value::Null,
                    FieldValue::Bool(b) => serde_json::Value::Bool(b),
                    FieldValue::Number(n) => serde_json::Number::from_f64(n)
                        .map_or(serde_json::Value::Null, serde_json::Value::Number),
                    FieldValue::Text(s) => serde_json::Value::String(s),
                };
                (k, value)
            })
            .collect()
    }
}
