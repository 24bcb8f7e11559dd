use chrono::NaiveDate;
use chrono::NaiveDateTime;

pub(super) use super::reduce;
pub(super) use super::SessionEffect;
pub(super) use crate::actions::AnalysisRequest;
pub(super) use crate::actions::RuntimeAction;
pub(super) use crate::actions::SessionAction;
pub(super) use crate::actions::UserAction;
pub(super) use crate::error::AnalysisError;
pub(super) use crate::state::AnalysisType;
pub(super) use crate::state::AuthState;
pub(super) use crate::state::BannerLevel;
pub(super) use crate::state::Framework;
pub(super) use crate::state::SessionPhase;
pub(super) use crate::state::SessionState;
pub(super) use crate::state::Urgency;
pub(super) use crate::state::ViewTab;

mod session_log;

fn logged_out() -> SessionState {
    SessionState::new(true)
}

fn state() -> SessionState {
    let mut state = logged_out();
    run_runtime(
        &mut state,
        RuntimeAction::LoginSucceeded {
            username: "admin".to_string(),
        },
    );
    state
}

fn at(hour: u32, minute: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 1)
        .and_then(|d| d.and_hms_opt(hour, minute, 0))
        .unwrap()
}

fn run_user(state: &mut SessionState, action: UserAction) -> Vec<SessionEffect> {
    reduce(state, SessionAction::User(action))
}

fn run_runtime(state: &mut SessionState, action: RuntimeAction) {
    let effects = reduce(state, SessionAction::Runtime(action));
    assert!(effects.is_empty());
}

fn type_text(state: &mut SessionState, text: &str) {
    run_user(state, UserAction::InputPaste(text.to_string()));
}

fn submitted_request(effects: &[SessionEffect]) -> AnalysisRequest {
    effects
        .iter()
        .find_map(|effect| match effect {
            SessionEffect::RunAnalysis(request) => Some(request.clone()),
            _ => None,
        })
        .expect("expected a RunAnalysis effect")
}

/// Selects the tab, types, submits and feeds back `outcome` at `finished_at`.
fn complete_analysis(
    state: &mut SessionState,
    kind: AnalysisType,
    input: &str,
    outcome: Result<&str, AnalysisError>,
    finished_at: NaiveDateTime,
) {
    run_user(state, UserAction::SelectTab(ViewTab::Analysis(kind)));
    run_user(state, UserAction::ClearInput);
    type_text(state, input);
    let request = submitted_request(&run_user(state, UserAction::SubmitAnalysis));
    run_runtime(
        state,
        RuntimeAction::AnalysisFinished {
            request_id: request.request_id,
            analysis_type: request.analysis_type,
            input_text: request.input_text,
            outcome: outcome.map(str::to_string),
            finished_at,
        },
    );
}

fn logged_inputs(state: &SessionState) -> Vec<String> {
    state
        .log
        .iter()
        .map(|record| record.input_text.clone())
        .collect()
}
