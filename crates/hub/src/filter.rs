//! Filter-expression field resolution and evaluation (spec §4.8).
//!
//! Field values are represented as a small closed sum so the comparison
//! operators stay total over whatever a dotted path resolves to (spec
//! §9 design note).

use serde_json::Value;
use ssf_broker::SecurityEvent;
use ssf_registry::{FilterExpression, FilterOperator};

/// The result of resolving a dotted-path field against an event.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Seq(Vec<FieldValue>),
    Map(Vec<(String, FieldValue)>),
}

impl FieldValue {
    fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => FieldValue::Null,
            Value::Bool(b) => FieldValue::Bool(*b),
            Value::Number(n) => FieldValue::Number(n.as_f64().unwrap_or(0.0)),
            Value::String(s) => FieldValue::String(s.clone()),
            Value::Array(items) => FieldValue::Seq(items.iter().map(FieldValue::from_json).collect()),
            Value::Object(map) => {
                FieldValue::Map(map.iter().map(|(k, v)| (k.clone(), FieldValue::from_json(v))).collect())
            }
        }
    }

    fn as_string(&self) -> String {
        match self {
            FieldValue::Null => String::new(),
            FieldValue::Bool(b) => b.to_string(),
            FieldValue::Number(n) => n.to_string(),
            FieldValue::String(s) => s.clone(),
            FieldValue::Seq(_) | FieldValue::Map(_) => String::new(),
        }
    }

    fn get(&self, key: &str) -> Option<&FieldValue> {
        match self {
            FieldValue::Map(entries) => entries.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }
}

/// Resolves a dotted-path field against an event's flattened views
/// (spec §4.8 field resolution table).
pub fn resolve_field(event: &SecurityEvent, field: &str) -> FieldValue {
    let mut segments = field.split('.');
    let Some(head) = segments.next() else {
        return FieldValue::Null;
    };

    match head {
        "id" => FieldValue::String(event.id.clone()),
        "type" => FieldValue::String(event.event_type.clone()),
        "source" => FieldValue::String(event.source.clone()),
        "subject" => match segments.next() {
            Some("format") => FieldValue::String(event.subject.format.clone()),
            Some("identifier") => FieldValue::String(event.subject.identifier.clone()),
            Some(other) => resolve_path(&FieldValue::from_json(&event.subject.claims), std::iter::once(other).chain(segments)),
            None => FieldValue::from_json(&event.subject.claims),
        },
        "data" => resolve_path(&FieldValue::from_json(&event.data), segments),
        "extensions" => resolve_path(&FieldValue::from_json(&event.extensions), segments),
        "metadata" => match segments.next() {
            Some("transmitter_id") => FieldValue::String(event.metadata.transmitter_id.clone()),
            _ => FieldValue::Null,
        },
        _ => FieldValue::Null,
    }
}

fn resolve_path<'a>(root: &FieldValue, path: impl Iterator<Item = &'a str>) -> FieldValue {
    let mut current = root.clone();
    for segment in path {
        match current.get(segment) {
            Some(next) => current = next.clone(),
            None => return FieldValue::Null,
        }
    }
    current
}

/// Evaluates one filter expression against a resolved field value.
///
/// `contains` is a suffix check on stringified operands, matching the
/// upstream behavior this spec preserves (§4.8, §9 flags it as
/// questionable but keeps it). A regex engine is wired in for
/// `matches` — an invalid pattern fails the match rather than the
/// expression evaluation.
pub fn matches(expression: &FilterExpression, resolved: &FieldValue) -> bool {
    match expression.operator {
        FilterOperator::Exists => !matches!(resolved, FieldValue::Null),
        FilterOperator::Equals => field_equals_json(resolved, &expression.value),
        FilterOperator::Contains => {
            let haystack = resolved.as_string();
            let needle = json_as_string(&expression.value);
            haystack.ends_with(&needle)
        }
        FilterOperator::Matches => {
            let haystack = resolved.as_string();
            let pattern = json_as_string(&expression.value);
            match regex::Regex::new(&pattern) {
                Ok(re) => re.is_match(&haystack),
                Err(err) => {
                    tracing::warn!(pattern = %pattern, error = %err, "invalid filter regex, treating as no match");
                    false
                }
            }
        }
        FilterOperator::In => match &expression.value {
            Value::Array(items) => items.iter().any(|v| field_equals_json(resolved, v)),
            _ => false,
        },
    }
}

fn field_equals_json(resolved: &FieldValue, value: &Value) -> bool {
    *resolved == FieldValue::from_json(value)
}

fn json_as_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// A receiver matches an event iff every one of its filter expressions
/// evaluates true (empty filter list always matches).
pub fn receiver_matches(event: &SecurityEvent, filters: &[FilterExpression]) -> bool {
    filters.iter().all(|expr| {
        let resolved = resolve_field(event, &expr.field);
        matches(expr, &resolved)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ssf_broker::{EventMetadata, SubjectView};
    use chrono::Utc;
    use serde_json::json;

    fn sample_event() -> SecurityEvent {
        SecurityEvent {
            id: "evt-1".to_string(),
            event_type: "https://schemas.openid.net/secevent/caep/event-type/session-revoked".to_string(),
            source: "https://issuer.example".to_string(),
            spec_version: "1.0".to_string(),
            time: Utc::now(),
            subject: SubjectView {
                format: "email".to_string(),
                identifier: "u@example.com".to_string(),
                claims: json!({"format": "email", "email": "u@example.com"}),
            },
            data: json!({"initiating_entity": "policy"}),
            extensions: json!({"region": "eu-west-1"}),
            metadata: EventMetadata {
                received_at: Utc::now(),
                processed_at: Utc::now(),
                transmitter_id: "transmitter-1".to_string(),
                raw_set: "raw".to_string(),
                processing_id: "proc-1".to_string(),
                tags: Default::default(),
            },
        }
    }

    #[test]
    fn resolves_top_level_and_subject_fields() {
        let event = sample_event();
        assert_eq!(resolve_field(&event, "id"), FieldValue::String("evt-1".to_string()));
        assert_eq!(
            resolve_field(&event, "subject.identifier"),
            FieldValue::String("u@example.com".to_string())
        );
        assert_eq!(
            resolve_field(&event, "subject.email"),
            FieldValue::String("u@example.com".to_string())
        );
    }

    #[test]
    fn resolves_data_and_extensions_paths() {
        let event = sample_event();
        assert_eq!(
            resolve_field(&event, "data.initiating_entity"),
            FieldValue::String("policy".to_string())
        );
        assert_eq!(
            resolve_field(&event, "extensions.region"),
            FieldValue::String("eu-west-1".to_string())
        );
        assert_eq!(resolve_field(&event, "data.missing"), FieldValue::Null);
    }

    #[test]
    fn equals_operator_matches_exact_value() {
        let event = sample_event();
        let expr = FilterExpression {
            field: "subject.identifier".to_string(),
            operator: FilterOperator::Equals,
            value: json!("u@example.com"),
        };
        assert!(matches(&expr, &resolve_field(&event, &expr.field)));
    }

    #[test]
    fn contains_operator_is_a_suffix_check() {
        let event = sample_event();
        let expr = FilterExpression {
            field: "subject.identifier".to_string(),
            operator: FilterOperator::Contains,
            value: json!("example.com"),
        };
        assert!(matches(&expr, &resolve_field(&event, &expr.field)));

        let miss = FilterExpression {
            field: "subject.identifier".to_string(),
            operator: FilterOperator::Contains,
            value: json!("example.org"),
        };
        assert!(!matches(&miss, &resolve_field(&event, &miss.field)));
    }

    #[test]
    fn exists_operator_distinguishes_present_from_missing() {
        let event = sample_event();
        let present = FilterExpression {
            field: "data.initiating_entity".to_string(),
            operator: FilterOperator::Exists,
            value: Value::Null,
        };
        let missing = FilterExpression {
            field: "data.nonexistent".to_string(),
            operator: FilterOperator::Exists,
            value: Value::Null,
        };
        assert!(matches(&present, &resolve_field(&event, &present.field)));
        assert!(!matches(&missing, &resolve_field(&event, &missing.field)));
    }

    #[test]
    fn matches_operator_evaluates_as_regex() {
        let event = sample_event();
        let expr = FilterExpression {
            field: "subject.identifier".to_string(),
            operator: FilterOperator::Matches,
            value: json!(r"^u@.*\.com$"),
        };
        assert!(matches(&expr, &resolve_field(&event, &expr.field)));

        let miss = FilterExpression {
            field: "subject.identifier".to_string(),
            operator: FilterOperator::Matches,
            value: json!(r"^nobody@"),
        };
        assert!(!matches(&miss, &resolve_field(&event, &miss.field)));
    }

    #[test]
    fn matches_operator_treats_invalid_regex_as_no_match() {
        let event = sample_event();
        let expr = FilterExpression {
            field: "subject.identifier".to_string(),
            operator: FilterOperator::Matches,
            value: json!("("),
        };
        assert!(!matches(&expr, &resolve_field(&event, &expr.field)));
    }

    #[test]
    fn in_operator_checks_membership() {
        let event = sample_event();
        let expr = FilterExpression {
            field: "subject.identifier".to_string(),
            operator: FilterOperator::In,
            value: json!(["other@example.com", "u@example.com"]),
        };
        assert!(matches(&expr, &resolve_field(&event, &expr.field)));
    }

    #[test]
    fn receiver_matches_requires_every_filter_to_pass() {
        let event = sample_event();
        let filters = vec![
            FilterExpression {
                field: "subject.format".to_string(),
                operator: FilterOperator::Equals,
                value: json!("email"),
            },
            FilterExpression {
                field: "subject.identifier".to_string(),
                operator: FilterOperator::Equals,
                value: json!("nobody@example.com"),
            },
        ];
        assert!(!receiver_matches(&event, &filters));
        assert!(receiver_matches(&event, &filters[..1]));
    }
}
