use ingest::Label;
use serde_json::{Map, Value};

use crate::{ActionItem, ActionType, Priority};

/// Derive the suggested actions for a document.
///
/// Rules are independent and evaluated in a fixed order (invoice, contract,
/// earnings); every rule that matches contributes one action.
pub fn derive_actions(label: Label, metadata: &Map<String, Value>) -> Vec<ActionItem> {
    let mut actions = Vec::new();

    if label == Label::Invoice
        && let Some(due_date) = non_empty_str(metadata, "due_date")
    {
        actions.push(
            ActionItem::new(ActionType::Payment, "Schedule payment for invoice")
                .with_deadline(due_date)
                .with_priority(Priority::High),
        );
    }

    if label == Label::Contract
        && let Some(termination_date) = non_empty_str(metadata, "termination_date")
    {
        actions.push(
            ActionItem::new(ActionType::Review, "Prepare for contract termination")
                .with_deadline(termination_date)
                .with_priority(Priority::Medium),
        );
    }

    if label == Label::Earnings && has_key_metrics(metadata) {
        actions.push(
            ActionItem::new(ActionType::Report, "Review financial performance summary")
                .with_priority(Priority::Low),
        );
    }

    actions
}

fn non_empty_str<'a>(metadata: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    metadata
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

fn has_key_metrics(metadata: &Map<String, Value>) -> bool {
    metadata
        .get("key_metrics")
        .and_then(Value::as_object)
        .is_some_and(|metrics| !metrics.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn meta(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_invoice_with_due_date() {
        let actions = derive_actions(Label::Invoice, &meta(json!({"due_date": "2025-06-01"})));
        assert_eq!(
            actions,
            vec![ActionItem {
                action_type: ActionType::Payment,
                description: "Schedule payment for invoice".into(),
                priority: Priority::High,
                status: "pending".into(),
                deadline: Some("2025-06-01".into()),
            }]
        );
    }

    #[test]
    fn test_invoice_without_due_date() {
        assert!(derive_actions(Label::Invoice, &meta(json!({"vendor": "Acme"}))).is_empty());
        assert!(derive_actions(Label::Invoice, &meta(json!({"due_date": null}))).is_empty());
        assert!(derive_actions(Label::Invoice, &meta(json!({"due_date": ""}))).is_empty());
    }

    #[test]
    fn test_whitespace_date_still_counts() {
        let actions = derive_actions(Label::Invoice, &meta(json!({"due_date": "   "})));
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].deadline.as_deref(), Some("   "));
    }

    #[test]
    fn test_contract_with_termination_date() {
        let actions = derive_actions(
            Label::Contract,
            &meta(json!({"effective_date": "2024-01-01", "termination_date": "2026-01-01"})),
        );
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].action_type, ActionType::Review);
        assert_eq!(actions[0].priority, Priority::Medium);
        assert_eq!(actions[0].deadline.as_deref(), Some("2026-01-01"));
    }

    #[test]
    fn test_earnings_needs_non_empty_metrics() {
        let actions = derive_actions(Label::Earnings, &meta(json!({"key_metrics": {"revenue": "$4.2B"}})));
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].action_type, ActionType::Report);
        assert_eq!(actions[0].priority, Priority::Low);
        assert_eq!(actions[0].deadline, None);

        assert!(derive_actions(Label::Earnings, &meta(json!({"key_metrics": {}}))).is_empty());
        assert!(derive_actions(Label::Earnings, &Map::new()).is_empty());
    }

    #[test]
    fn test_rules_are_bound_to_label() {
        // Invoice fields on a contract trigger nothing.
        let metadata = meta(json!({"due_date": "2025-06-01", "key_metrics": {"eps": 1.2}}));
        assert!(derive_actions(Label::Contract, &metadata).is_empty());
    }

    #[test]
    fn test_derivation_is_deterministic() {
        let metadata = meta(json!({"termination_date": "2027-03-31"}));
        assert_eq!(
            derive_actions(Label::Contract, &metadata),
            derive_actions(Label::Contract, &metadata)
        );
    }
}
