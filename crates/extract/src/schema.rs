use ingest::Label;
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use std::collections::BTreeMap;

pub const INVOICE_FIELDS: &[&str] = &["vendor", "amount", "due_date", "line_items"];
pub const CONTRACT_FIELDS: &[&str] = &["parties", "effective_date", "termination_date", "key_terms"];
pub const EARNINGS_FIELDS: &[&str] = &["reporting_period", "key_metrics", "executive_summary"];

/// Metadata field names belonging to `label`'s schema.
pub fn schema_fields(label: Label) -> &'static [&'static str] {
    match label {
        Label::Invoice => INVOICE_FIELDS,
        Label::Contract => CONTRACT_FIELDS,
        Label::Earnings => EARNINGS_FIELDS,
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub amount: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InvoiceMetadata {
    #[serde(default)]
    pub vendor: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub amount: Option<String>,
    #[serde(default)]
    pub due_date: Option<String>,
    #[serde(default)]
    pub line_items: Option<Vec<LineItem>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContractMetadata {
    #[serde(default)]
    pub parties: Option<Vec<String>>,
    #[serde(default)]
    pub effective_date: Option<String>,
    #[serde(default)]
    pub termination_date: Option<String>,
    #[serde(default)]
    pub key_terms: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
    Number(Number),
    Text(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EarningsMetadata {
    #[serde(default)]
    pub reporting_period: Option<String>,
    #[serde(default, deserialize_with = "metrics_without_nulls")]
    pub key_metrics: Option<BTreeMap<String, MetricValue>>,
    #[serde(default)]
    pub executive_summary: Option<String>,
}

/// Metadata extracted for one document, shaped by its label.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ExtractedMetadata {
    Invoice(InvoiceMetadata),
    Contract(ContractMetadata),
    Earnings(EarningsMetadata),
}

#[derive(Debug, thiserror::Error)]
pub enum SchemaViolation {
    #[error("expected a JSON object, found {0}")]
    NotAnObject(&'static str),

    #[error("{label} metadata does not match schema: {source}")]
    Mismatch {
        label: Label,
        #[source]
        source: serde_json::Error,
    },
}

impl ExtractedMetadata {
    /// Interpret a parsed completion under `label`'s schema. Keys outside the
    /// schema are dropped.
    pub fn parse(label: Label, value: Value) -> Result<Self, SchemaViolation> {
        if !value.is_object() {
            return Err(SchemaViolation::NotAnObject(json_kind(&value)));
        }

        let mismatch = |source| SchemaViolation::Mismatch { label, source };
        let metadata = match label {
            Label::Invoice => ExtractedMetadata::Invoice(serde_json::from_value(value).map_err(mismatch)?),
            Label::Contract => ExtractedMetadata::Contract(serde_json::from_value(value).map_err(mismatch)?),
            Label::Earnings => ExtractedMetadata::Earnings(serde_json::from_value(value).map_err(mismatch)?),
        };
        Ok(metadata)
    }

    pub fn label(&self) -> Label {
        match self {
            ExtractedMetadata::Invoice(_) => Label::Invoice,
            ExtractedMetadata::Contract(_) => Label::Contract,
            ExtractedMetadata::Earnings(_) => Label::Earnings,
        }
    }

    /// Every schema field, absent ones as `null`.
    pub fn into_fields(self) -> Map<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            // Plain structs of strings, lists and maps always serialize to objects.
            _ => Map::new(),
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Monetary amounts arrive as either `"$1,200.00"` or `1200`; keep them as text.
fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(de::Error::custom(format!(
            "expected string or number, found {}",
            json_kind(&other)
        ))),
    }
}

fn metrics_without_nulls<'de, D>(deserializer: D) -> Result<Option<BTreeMap<String, MetricValue>>, D::Error>
where
    D: Deserializer<'de>,
{
    let metrics = Option::<BTreeMap<String, Option<MetricValue>>>::deserialize(deserializer)?;
    Ok(metrics.map(|m| {
        m.into_iter()
            .filter_map(|(name, value)| value.map(|v| (name, v)))
            .collect()
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_invoice_drops_unknown_keys() {
        let value = json!({
            "vendor": "Acme Ltd",
            "amount": 1200.5,
            "due_date": "2025-06-01",
            "line_items": [{"description": "Widgets", "amount": "$1,200.50"}],
            "notes": "not part of the schema"
        });

        let parsed = ExtractedMetadata::parse(Label::Invoice, value).unwrap();
        assert_eq!(parsed.label(), Label::Invoice);

        let fields = parsed.into_fields();
        let mut keys: Vec<&str> = fields.keys().map(String::as_str).collect();
        keys.sort();
        let mut expected = INVOICE_FIELDS.to_vec();
        expected.sort();
        assert_eq!(keys, expected);
        assert_eq!(fields["amount"], json!("1200.5"));
        assert_eq!(fields["line_items"][0]["description"], json!("Widgets"));
    }

    #[test]
    fn test_missing_fields_become_null() {
        let parsed = ExtractedMetadata::parse(Label::Contract, json!({"parties": ["A", "B"]})).unwrap();
        let fields = parsed.into_fields();
        assert_eq!(fields.len(), CONTRACT_FIELDS.len());
        assert_eq!(fields["termination_date"], Value::Null);
        assert_eq!(fields["parties"], json!(["A", "B"]));
    }

    #[test]
    fn test_earnings_metrics_mixed_values() {
        let value = json!({
            "reporting_period": "Q1 2025",
            "key_metrics": {"revenue": "$4.2B", "eps": 1.25, "headcount": 1200, "ebitda": null},
            "executive_summary": "Strong quarter."
        });
        let fields = ExtractedMetadata::parse(Label::Earnings, value).unwrap().into_fields();
        let metrics = fields["key_metrics"].as_object().unwrap();
        assert_eq!(metrics["revenue"], json!("$4.2B"));
        assert_eq!(metrics["eps"], json!(1.25));
        assert_eq!(metrics["headcount"], json!(1200));
        assert!(!metrics.contains_key("ebitda"));
    }

    #[test]
    fn test_schema_violation() {
        let err = ExtractedMetadata::parse(Label::Contract, json!({"parties": "A and B"})).unwrap_err();
        assert!(matches!(err, SchemaViolation::Mismatch { label: Label::Contract, .. }));

        let err = ExtractedMetadata::parse(Label::Invoice, json!(["vendor"])).unwrap_err();
        assert!(matches!(err, SchemaViolation::NotAnObject("an array")));
    }

    #[test]
    fn test_schema_fields_are_disjoint() {
        for a in Label::ALL {
            for b in Label::ALL {
                if a == b {
                    continue;
                }
                assert!(schema_fields(a).iter().all(|f| !schema_fields(b).contains(f)));
            }
        }
    }
}
