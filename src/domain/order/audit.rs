use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ============================================================================
// Audit Trail - Timeline & Edit History
// ============================================================================
//
// Both logs are append-only. Commands build new entries and persist the
// extended vectors in a single write; no code path removes or reorders
// existing entries.
//
// ============================================================================

/// One human-readable line in an order's audit timeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineEntry {
    pub action: String,
    pub at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl TimelineEntry {
    pub fn now(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            at: Utc::now(),
            note: None,
        }
    }

    pub fn with_note(action: impl Into<String>, note: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            at: Utc::now(),
            note: Some(note.into()),
        }
    }
}

/// One structured field diff, written only when a value genuinely changed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditRecord {
    pub field: String,
    pub old: Value,
    pub new: Value,
    pub at: DateTime<Utc>,
}

/// Compare a proposed value with the current one and produce an edit record
/// only when they differ. Unchanged fields must leave the logs untouched.
pub fn diff_field<T>(field: &str, current: &T, proposed: &T) -> Option<EditRecord>
where
    T: Serialize + PartialEq,
{
    if current == proposed {
        return None;
    }
    Some(EditRecord {
        field: field.to_string(),
        old: serde_json::to_value(current).unwrap_or(Value::Null),
        new: serde_json::to_value(proposed).unwrap_or(Value::Null),
        at: Utc::now(),
    })
}

/// Clone a timeline with one more entry, preserving order.
pub fn appended<T: Clone>(log: &[T], entry: T) -> Vec<T> {
    let mut next = log.to_vec();
    next.push(entry);
    next
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn equal_values_produce_no_record() {
        let current = Some("0532 111 22 33".to_string());
        assert!(diff_field("customer.phone", &current, &current.clone()).is_none());
    }

    #[test]
    fn changed_values_capture_old_and_new() {
        let record = diff_field(
            "shipping.city",
            &"Istanbul".to_string(),
            &"Ankara".to_string(),
        )
        .unwrap();
        assert_eq!(record.field, "shipping.city");
        assert_eq!(record.old, json!("Istanbul"));
        assert_eq!(record.new, json!("Ankara"));
    }

    #[test]
    fn appended_keeps_existing_order() {
        let log = vec![TimelineEntry::now("Order created")];
        let next = appended(&log, TimelineEntry::now("Status changed"));
        assert_eq!(next.len(), 2);
        assert_eq!(next[0].action, "Order created");
        assert_eq!(next[1].action, "Status changed");
    }
}
