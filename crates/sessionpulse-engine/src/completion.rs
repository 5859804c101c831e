use sessionpulse_types::TransactionType;
use std::collections::BTreeSet;

/// Success-indicator fragments a transaction type is expected to produce.
///
/// A fragment counts as completed when any recorded success indicator
/// contains it, so a bare category ("data_operations:") accepts any pattern
/// from that category.
pub fn expected_fragments(transaction_type: TransactionType) -> &'static [&'static str] {
    match transaction_type {
        TransactionType::LoginFlow => &[
            "authentication:login.*success",
            "authentication:authenticated",
        ],
        TransactionType::PurchaseFlow => &[
            "transaction:order",
            "transaction:payment",
            "transaction:checkout",
        ],
        TransactionType::RegistrationFlow => &[
            "authentication:regist",
            "data_operations:account",
        ],
        TransactionType::DataRetrieval => &["data_operations:retrieved", "data_operations:found"],
        TransactionType::FormSubmission => &["form_submission:submitted", "form_submission:form"],
        TransactionType::MultiStepWorkflow => &[
            "authentication:",
            "data_operations:",
            "general:completed",
        ],
        TransactionType::Generic => &["general:success"],
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransactionCompletion {
    pub completed: u32,
    pub expected: u32,
}

impl TransactionCompletion {
    pub fn rate(&self) -> f64 {
        if self.expected == 0 {
            return 0.0;
        }
        self.completed as f64 / self.expected as f64
    }
}

pub fn count_completed_transactions(
    transaction_type: TransactionType,
    success_indicators: &BTreeSet<String>,
) -> TransactionCompletion {
    let fragments = expected_fragments(transaction_type);
    let completed = fragments
        .iter()
        .filter(|fragment| success_indicators.iter().any(|i| i.contains(*fragment)))
        .count();

    TransactionCompletion {
        completed: completed as u32,
        expected: fragments.len() as u32,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn indicators(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_login_flow_partial_completion() {
        let result = count_completed_transactions(
            TransactionType::LoginFlow,
            &indicators(&["authentication:login.*success", "general:success"]),
        );
        assert_eq!(result.completed, 1);
        assert_eq!(result.expected, 2);
        assert_eq!(result.rate(), 0.5);
    }

    #[test]
    fn test_category_fragment_accepts_any_pattern() {
        let result = count_completed_transactions(
            TransactionType::MultiStepWorkflow,
            &indicators(&["authentication:welcome", "data_operations:saved"]),
        );
        assert_eq!(result.completed, 2);
        assert_eq!(result.expected, 3);
    }

    #[test]
    fn test_no_indicators_means_nothing_completed() {
        let result = count_completed_transactions(TransactionType::PurchaseFlow, &BTreeSet::new());
        assert_eq!(result.completed, 0);
        assert_eq!(result.rate(), 0.0);
    }

    #[test]
    fn test_every_type_expects_something() {
        for kind in [
            TransactionType::LoginFlow,
            TransactionType::PurchaseFlow,
            TransactionType::RegistrationFlow,
            TransactionType::DataRetrieval,
            TransactionType::FormSubmission,
            TransactionType::MultiStepWorkflow,
            TransactionType::Generic,
        ] {
            assert!(!expected_fragments(kind).is_empty(), "{}", kind);
        }
    }
}
