use super::*;
use pretty_assertions::assert_eq;

#[test]
fn records_are_logged_in_submission_order() {
    let mut state = state();
    complete_analysis(&mut state, AnalysisType::RiskDetection, "one", Ok("r1"), at(9, 0));
    complete_analysis(&mut state, AnalysisType::TeamAnalysis, "two", Ok("r2"), at(9, 1));
    complete_analysis(&mut state, AnalysisType::RiskDetection, "three", Ok("r3"), at(9, 1));

    assert_eq!(logged_inputs(&state), vec!["one", "two", "three"]);
    let outputs: Vec<&str> = state
        .log
        .iter()
        .map(|record| record.output_text.as_str())
        .collect();
    assert_eq!(outputs, vec!["r1", "r2", "r3"]);
    assert_eq!(state.log.phase(), SessionPhase::NonEmpty);
}

#[test]
fn clear_history_empties_log_regardless_of_contents() {
    let mut state = state();
    run_user(&mut state, UserAction::ClearHistory);
    assert!(state.log.all().is_empty());

    complete_analysis(&mut state, AnalysisType::RiskDetection, "one", Ok("r1"), at(9, 0));
    complete_analysis(&mut state, AnalysisType::Recommendations, "two", Ok("r2"), at(9, 0));
    run_user(&mut state, UserAction::ClearHistory);

    assert!(state.log.all().is_empty());
    assert_eq!(state.log.phase(), SessionPhase::Empty);
    assert_eq!(
        state.banner.as_ref().map(|b| b.level),
        Some(BannerLevel::Info)
    );
}

#[test]
fn logging_resumes_after_clear() {
    let mut state = state();
    complete_analysis(&mut state, AnalysisType::RiskDetection, "before", Ok("x"), at(9, 0));
    run_user(&mut state, UserAction::ClearHistory);
    complete_analysis(&mut state, AnalysisType::RiskDetection, "after", Ok("y"), at(9, 2));
    assert_eq!(logged_inputs(&state), vec!["after"]);
}

#[test]
fn logout_discards_the_session_log() {
    let mut state = state();
    complete_analysis(&mut state, AnalysisType::ChangeGuidance, "kept?", Ok("no"), at(9, 0));
    run_user(&mut state, UserAction::Logout);

    assert!(matches!(state.auth, AuthState::LoggedOut(_)));
    assert!(state.log.is_empty());
    assert!(state.form(AnalysisType::ChangeGuidance).input.is_empty());

    run_runtime(
        &mut state,
        RuntimeAction::LoginSucceeded {
            username: "manager".to_string(),
        },
    );
    assert!(state.log.is_empty());
}

#[test]
fn stored_input_excludes_modifiers() {
    let mut state = state();
    run_user(&mut state, UserAction::SetUrgency(Urgency::High));
    complete_analysis(
        &mut state,
        AnalysisType::Recommendations,
        "Go-live slipping",
        Ok("plan"),
        at(10, 30),
    );
    let record = &state.log.all()[0];
    assert_eq!(record.input_text, "Go-live slipping");
    assert_eq!(record.timestamp, "2024-01-01 10:30");
    assert_eq!(record.analysis_type, AnalysisType::Recommendations);
}

#[test]
fn history_scroll_is_bounded_by_the_recent_records() {
    let mut state = state();
    run_user(&mut state, UserAction::ScrollHistory(3));
    assert_eq!(state.history_scroll, 0);

    complete_analysis(
        &mut state,
        AnalysisType::TeamAnalysis,
        "Morale",
        Ok("line one\nline two\nline three"),
        at(9, 0),
    );
    // heading, input, output label, three output lines, spacer
    run_user(&mut state, UserAction::ScrollHistory(100));
    assert_eq!(state.history_scroll, 6);
    run_user(&mut state, UserAction::ScrollHistory(-2));
    assert_eq!(state.history_scroll, 4);

    run_user(&mut state, UserAction::ClearHistory);
    assert_eq!(state.history_scroll, 0);
}
