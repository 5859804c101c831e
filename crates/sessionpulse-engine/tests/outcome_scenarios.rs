use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::json;
use sessionpulse_engine::{
    apply_indicators, capture_session_data, classify_goal, extract_indicators, finalize_record,
    record_action, IndicatorClassifier, IndicatorSet, MtbaPolicy, RegexIndicatorClassifier,
    ResolverPolicy, DEFAULT_SESSION_DATA_KEYS,
};
use sessionpulse_types::{
    ResponsePayload, SessionOutcome, SessionRecord, ToolExecutionRecord, TransactionType,
};

fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 12, 14, 0, 0, 0).unwrap()
}

fn session_data_keys() -> Vec<String> {
    DEFAULT_SESSION_DATA_KEYS
        .iter()
        .map(|k| k.to_string())
        .collect()
}

fn call(
    step: i64,
    tool: &str,
    response: serde_json::Value,
    success: bool,
    error: Option<&str>,
) -> ToolExecutionRecord {
    ToolExecutionRecord {
        tool_name: tool.to_string(),
        parameters: json!({"step": step}),
        response: ResponsePayload::Json(response),
        duration_ms: 150,
        success,
        error_message: error.map(str::to_string),
        timestamp: base_time() + Duration::seconds(step),
    }
}

// Mirrors what the runtime tracker does per update.
fn drive(
    classifier: &dyn IndicatorClassifier,
    goal: &str,
    executions: Vec<ToolExecutionRecord>,
) -> SessionRecord {
    let mut record = SessionRecord::new(
        "session-1",
        "trace-1",
        goal,
        classify_goal(goal),
        50,
        base_time(),
    );
    let keys = session_data_keys();
    for execution in executions {
        apply_indicators(&mut record, extract_indicators(classifier, &execution));
        capture_session_data(&mut record, &execution, &keys);
        record_action(&mut record, execution.timestamp, &MtbaPolicy::default());
        record.executions.push(execution);
        record.current_step += 1;
    }
    record
}

#[test]
fn test_login_flow_is_successful_stateful() {
    let classifier = RegexIndicatorClassifier::default();
    let record = drive(
        &classifier,
        "Complete user login flow",
        vec![
            call(
                0,
                "post_login",
                json!({"message": "Login successful", "auth_token": "x"}),
                true,
                None,
            ),
            call(1, "get_profile", json!({"user": "bob"}), true, None),
            call(2, "post_logout", json!({"message": "bye"}), true, None),
        ],
    );

    assert_eq!(record.transaction_type, TransactionType::LoginFlow);

    let metrics = finalize_record(
        &record,
        None,
        base_time() + Duration::seconds(5),
        &ResolverPolicy::default(),
    );

    assert_eq!(metrics.outcome, SessionOutcome::Success);
    assert!(metrics.has_session_data);
    assert!(metrics.is_successful_stateful());
    assert_eq!(metrics.step_success_rate, 1.0);
    insta::assert_json_snapshot!(metrics.success_indicators, @r#"
    [
      "authentication:login.*success",
      "general:success"
    ]
    "#);
    insta::assert_json_snapshot!(metrics.session_data_keys, @r#"
    [
      "auth_token"
    ]
    "#);
}

#[test]
fn test_login_flow_with_no_successful_steps_fails() {
    let classifier = RegexIndicatorClassifier::default();
    let record = drive(
        &classifier,
        "Complete user login flow",
        (0..3)
            .map(|i| {
                call(
                    i,
                    "post_login",
                    json!({"detail": "Unauthorized"}),
                    false,
                    Some("401 Unauthorized"),
                )
            })
            .collect(),
    );

    let metrics = finalize_record(
        &record,
        None,
        base_time() + Duration::seconds(5),
        &ResolverPolicy::default(),
    );

    assert_eq!(metrics.step_success_rate, 0.0);
    assert_eq!(metrics.outcome, SessionOutcome::Failure);
    assert!(!metrics.has_session_data);
    assert_eq!(metrics.error_summary, vec!["401 Unauthorized"]);
}

#[test]
fn test_step_limit_overrides_success_rate() {
    let classifier = RegexIndicatorClassifier::default();
    let record = drive(
        &classifier,
        "Search products",
        (0..50)
            .map(|i| call(i, "search", json!({"result": "retrieved", "token": "t"}), true, None))
            .collect(),
    );

    let metrics = finalize_record(
        &record,
        None,
        base_time() + Duration::seconds(60),
        &ResolverPolicy::default(),
    );

    assert_eq!(metrics.total_steps, 50);
    assert_eq!(metrics.outcome, SessionOutcome::MaxStepsReached);
}

#[test]
fn test_slow_agent_accumulates_mtba_violations() {
    let classifier = RegexIndicatorClassifier::default();
    let record = drive(
        &classifier,
        "Fetch order history",
        (0..10)
            .map(|i| call(i * 2, "fetch", json!({"items": []}), true, None))
            .collect(),
    );

    assert_eq!(record.current_mtba, Some(2.0));
    assert_eq!(record.mtba_violations, 9);
}

struct StatusFieldClassifier;

impl IndicatorClassifier for StatusFieldClassifier {
    fn classify(&self, text: &str) -> IndicatorSet {
        let mut set = IndicatorSet::default();
        if let Ok(value) = serde_json::from_str::<serde_json::Value>(text) {
            match value.get("status").and_then(|s| s.as_str()) {
                Some("ok") => {
                    set.success.insert("structured:status_ok".to_string());
                }
                Some(_) => {
                    set.failure.insert("structured:status_not_ok".to_string());
                }
                None => {}
            }
        }
        set
    }
}

#[test]
fn test_alternate_classifier_plugs_into_resolution() {
    let record = drive(
        &StatusFieldClassifier,
        "Run nightly workflow",
        vec![
            call(0, "step", json!({"status": "ok"}), true, None),
            call(1, "step", json!({"status": "ok"}), true, None),
        ],
    );

    let metrics = finalize_record(
        &record,
        None,
        base_time() + Duration::seconds(2),
        &ResolverPolicy::default(),
    );

    assert_eq!(record.transaction_type, TransactionType::MultiStepWorkflow);
    assert_eq!(metrics.outcome, SessionOutcome::Success);
    assert!(!metrics.is_successful_stateful());
    assert_eq!(metrics.success_indicators, vec!["structured:status_ok"]);
}

#[test]
fn test_error_text_does_not_outweigh_successful_responses() {
    let classifier = RegexIndicatorClassifier::default();
    let mut executions: Vec<ToolExecutionRecord> = (0..7)
        .map(|i| {
            call(
                i,
                "post_login",
                json!({"message": "Login success", "auth_token": "x"}),
                true,
                None,
            )
        })
        .collect();
    for (i, error) in [
        "validation failed: missing field email",
        "bad gateway",
        "insufficient quota",
    ]
    .into_iter()
    .enumerate()
    {
        let mut failed = call(7 + i as i64, "post_login", json!(null), false, Some(error));
        failed.response = ResponsePayload::Empty;
        executions.push(failed);
    }

    let record = drive(&classifier, "Complete user login flow", executions);
    let metrics = finalize_record(
        &record,
        None,
        base_time() + Duration::seconds(12),
        &ResolverPolicy::default(),
    );

    assert!(metrics.failure_indicators.is_empty());
    assert_eq!(metrics.step_success_rate, 0.7);
    assert_eq!(metrics.error_summary.len(), 3);
    assert_eq!(metrics.outcome, SessionOutcome::Success);
}
