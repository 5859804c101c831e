use sessionpulse_types::TransactionType;

// Ordered: the first rule with a matching keyword wins, so "login then
// checkout" is a login flow.
const RULES: &[(&[&str], TransactionType)] = &[
    (&["login", "auth"], TransactionType::LoginFlow),
    (
        &["purchase", "buy", "order", "checkout"],
        TransactionType::PurchaseFlow,
    ),
    (&["register", "signup"], TransactionType::RegistrationFlow),
    (
        &["retrieve", "fetch", "search"],
        TransactionType::DataRetrieval,
    ),
    (
        &["submit", "form", "create", "update"],
        TransactionType::FormSubmission,
    ),
    (
        &["workflow", "multi-step"],
        TransactionType::MultiStepWorkflow,
    ),
];

/// Map a free-text session goal to a coarse transaction type.
///
/// Case-insensitive substring matching; total over all inputs.
pub fn classify_goal(goal: &str) -> TransactionType {
    let lower = goal.to_lowercase();
    RULES
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| lower.contains(k)))
        .map(|(_, kind)| *kind)
        .unwrap_or(TransactionType::Generic)
}
