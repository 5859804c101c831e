// Integration tests for the complete write → finalize → aggregate flow,
// driven through MetricsCollector with a manual clock.
use serde_json::json;
use sessionpulse_runtime::Error;
use sessionpulse_testing::assertions::{
    assert_outcome, assert_percentage_bounds, assert_success_indicator, assert_summary_percentage,
};
use sessionpulse_testing::{fixtures, tool_call, TestWorld};
use sessionpulse_types::{SessionOutcome, TransactionType, ViolationKind};

const LOGIN_GOAL: &str = "Complete user login flow";

#[test]
fn test_successful_login_is_counted_as_stateful() -> anyhow::Result<()> {
    let world = TestWorld::new().with_step_gap_ms(200);
    let metrics = world.run_session("s-a", LOGIN_GOAL, fixtures::successful_login_run());

    assert_outcome(&metrics, SessionOutcome::Success)?;
    assert_success_indicator(&metrics, "authentication:login.*success")?;
    assert!(metrics.has_session_data);
    assert!(metrics.is_successful_stateful());
    assert_eq!(metrics.transaction_type, TransactionType::LoginFlow);
    assert_eq!(metrics.transactions_completed, 1);
    assert_eq!(metrics.transactions_expected, 2);
    insta::assert_json_snapshot!(metrics.session_data_keys, @r#"
    [
      "auth_token"
    ]
    "#);

    let pct = world
        .collector()
        .get_successful_stateful_sessions_percentage(60);
    assert_eq!(pct, 100.0);
    Ok(())
}

#[test]
fn test_rejected_login_fails() -> anyhow::Result<()> {
    let world = TestWorld::new();
    let metrics = world.run_session("s-b", LOGIN_GOAL, fixtures::rejected_login_run());

    assert_outcome(&metrics, SessionOutcome::Failure)?;
    assert_eq!(metrics.step_success_rate, 0.0);
    assert_eq!(metrics.error_summary, vec!["401 Unauthorized"]);
    insta::assert_json_snapshot!(metrics.failure_indicators, @r#"
    [
      "authentication:unauthori[sz]ed"
    ]
    "#);
    assert_eq!(
        world
            .collector()
            .get_successful_stateful_sessions_percentage(60),
        0.0
    );
    Ok(())
}

#[test]
fn test_step_limit_yields_max_steps_reached() -> anyhow::Result<()> {
    let world = TestWorld::new();
    let metrics = world.run_session("s-c", "Search products", fixtures::endless_search_run(50));

    assert_outcome(&metrics, SessionOutcome::MaxStepsReached)?;
    assert_eq!(metrics.total_steps, 50);
    Ok(())
}

#[test]
fn test_slow_agent_violates_mtba_on_every_sample() {
    let world = TestWorld::new().with_step_gap_ms(2_000);
    let steps = (0..10)
        .map(|i| tool_call("fetch").json(json!({"page": i})))
        .collect();
    let metrics = world.run_session("s-d", "Fetch order history", steps);

    assert_eq!(metrics.mtba, Some(2.0));
    assert_eq!(metrics.mtba_violations, 9);
    assert_eq!(world.collector().violation_count(ViolationKind::Mtba), 9);

    let summary = world.collector().get_session_metrics_summary(60);
    assert_eq!(summary.cognitive_latency_violations, 9);
    assert_eq!(summary.average_mtba, 2.0);
}

#[test]
fn test_empty_window_reports_zeroes() -> anyhow::Result<()> {
    let world = TestWorld::new();
    let collector = world.collector();

    let summary = collector.get_session_metrics_summary(60);
    assert_eq!(summary.total_sessions, 0);
    assert_eq!(summary.successful_stateful_sessions_percentage, 0.0);
    assert_eq!(summary.average_session_duration, 0.0);
    assert!(summary.outcome_distribution.is_empty());
    assert_summary_percentage(&summary)?;

    let perf = collector.get_performance_metrics(60);
    assert_eq!(perf.mtba.p99, 0.0);
    assert_eq!(perf.throughput_ops_per_second, 0.0);

    assert!(collector.validate_performance_targets().overall_performance_valid);
    Ok(())
}

#[test]
fn test_mixed_sessions_split_the_percentage() -> anyhow::Result<()> {
    let world = TestWorld::new();
    world.run_session("ok-1", LOGIN_GOAL, fixtures::successful_login_run());
    world.run_session("ok-2", LOGIN_GOAL, fixtures::successful_login_run());
    world.run_session("bad-1", LOGIN_GOAL, fixtures::rejected_login_run());
    world.run_session("bad-2", LOGIN_GOAL, fixtures::rejected_login_run());

    let summary = world.collector().get_session_metrics_summary(60);
    assert_eq!(summary.total_sessions, 4);
    assert_eq!(summary.successful_stateful_sessions, 2);
    assert_eq!(summary.successful_stateful_sessions_percentage, 50.0);
    assert_eq!(summary.outcome_distribution[&SessionOutcome::Success], 2);
    assert_eq!(summary.outcome_distribution[&SessionOutcome::Failure], 2);
    assert_eq!(
        summary.transaction_type_distribution[&TransactionType::LoginFlow],
        4
    );
    assert_summary_percentage(&summary)?;
    Ok(())
}

#[test]
fn test_success_without_state_is_not_stateful() -> anyhow::Result<()> {
    let world = TestWorld::new();
    let steps = vec![
        tool_call("get_status").json(json!({"result": "success"})),
        tool_call("get_status").json(json!({"result": "success"})),
    ];
    let metrics = world.run_session("s1", "Check service health", steps);

    assert_outcome(&metrics, SessionOutcome::Success)?;
    assert!(!metrics.has_session_data);
    assert_eq!(
        world
            .collector()
            .get_successful_stateful_sessions_percentage(60),
        0.0
    );
    Ok(())
}

#[test]
fn test_sessions_age_out_of_the_window() {
    let world = TestWorld::new();
    world.run_session("s1", LOGIN_GOAL, fixtures::successful_login_run());
    world.clock().advance_seconds(61 * 60);

    let collector = world.collector();
    assert_eq!(collector.get_session_metrics_summary(60).total_sessions, 0);
    assert_eq!(collector.get_session_metrics_summary(120).total_sessions, 1);
    assert_eq!(collector.get_successful_stateful_sessions_percentage(120), 100.0);
}

#[test]
fn test_repeated_queries_are_identical() {
    let world = TestWorld::new();
    world.run_session("s1", LOGIN_GOAL, fixtures::successful_login_run());
    world.run_session("s2", LOGIN_GOAL, fixtures::rejected_login_run());

    let collector = world.collector();
    assert_eq!(
        collector.get_session_metrics_summary(60),
        collector.get_session_metrics_summary(60)
    );
    assert_eq!(
        collector.get_performance_metrics(60),
        collector.get_performance_metrics(60)
    );
    assert_eq!(
        collector.validate_performance_targets(),
        collector.validate_performance_targets()
    );
}

#[test]
fn test_explicit_outcome_overrides_resolution() -> anyhow::Result<()> {
    let world = TestWorld::new();
    world.start("s1", LOGIN_GOAL);
    for step in fixtures::successful_login_run() {
        world.act("s1", step);
    }
    let metrics = world.finalize_as("s1", SessionOutcome::Error);

    assert_outcome(&metrics, SessionOutcome::Error)?;
    assert!(!metrics.is_successful_stateful());
    Ok(())
}

#[test]
fn test_explicit_session_data_makes_session_stateful() -> anyhow::Result<()> {
    let world = TestWorld::new();
    world.start("s1", "Retrieve account data");
    world.act("s1", tool_call("get_account").json(json!({"result": "retrieved"})));
    world.act("s1", tool_call("get_account").json(json!({"result": "retrieved"})));
    world
        .collector()
        .record_session_data("s1", "cookie", json!("abc"))?;
    let metrics = world.finalize("s1");

    assert_outcome(&metrics, SessionOutcome::Success)?;
    assert_eq!(metrics.session_data_keys, vec!["cookie"]);
    assert!(metrics.is_successful_stateful());
    Ok(())
}

#[test]
fn test_opaque_payload_is_scanned_as_text() {
    let world = TestWorld::new();
    world.start("s1", LOGIN_GOAL);
    world.act(
        "s1",
        tool_call("post_login").opaque(b"Login successful \xff\xfe"),
    );
    let snapshot = world
        .collector()
        .session_snapshot("s1")
        .expect("session is active");
    assert!(snapshot
        .success_indicators
        .contains("authentication:login.*success"));
}

#[test]
fn test_expired_sessions_are_swept_as_timeouts() -> anyhow::Result<()> {
    let world = TestWorld::new();
    world.start("old", LOGIN_GOAL);
    world.clock().advance_seconds(200);
    world.start("young", LOGIN_GOAL);
    world.clock().advance_seconds(150);

    let collector = world.collector();
    assert!(collector.is_expired("old")?);
    assert!(!collector.is_expired("young")?);
    assert_eq!(collector.expired_sessions(), vec!["old".to_string()]);

    let swept = collector.sweep_expired();
    assert_eq!(swept.len(), 1);
    assert_outcome(&swept[0], SessionOutcome::Timeout)?;
    assert_eq!(collector.active_session_count(), 1);
    assert!(collector.sweep_expired().is_empty());
    Ok(())
}

#[test]
fn test_caller_errors_are_surfaced() {
    let world = TestWorld::new();
    let collector = world.collector();

    let err = collector.finalize_session("ghost", None).unwrap_err();
    assert!(matches!(err, Error::SessionNotFound(ref id) if id == "ghost"));
    assert!(err.is_caller_error());

    world.start("s1", LOGIN_GOAL);
    assert!(matches!(
        collector.start_tracking_session("s1", "t", LOGIN_GOAL, 10),
        Err(Error::SessionAlreadyActive(_))
    ));

    collector.finalize_session("s1", None).unwrap();
    assert!(matches!(
        collector.finalize_session("s1", None),
        Err(Error::SessionNotFound(_))
    ));
}

#[test]
fn test_percentage_stays_in_bounds_for_every_window() -> anyhow::Result<()> {
    let world = TestWorld::new();
    for i in 0..12 {
        let id = format!("s{}", i);
        if i % 3 == 0 {
            world.run_session(&id, LOGIN_GOAL, fixtures::rejected_login_run());
        } else {
            world.run_session(&id, LOGIN_GOAL, fixtures::successful_login_run());
        }
        world.clock().advance_seconds(10 * 60);
    }

    for window in [0, 1, 15, 30, 60, 240, 24 * 60] {
        let summary = world.collector().get_session_metrics_summary(window);
        assert_summary_percentage(&summary)?;
        assert_percentage_bounds(
            world
                .collector()
                .get_successful_stateful_sessions_percentage(window),
        )?;
    }
    Ok(())
}
