use chrono::Local;
use chrono::NaiveDateTime;

use super::error::AnalysisError;
use super::state::AnalysisType;
use super::state::Framework;
use super::state::Urgency;
use super::state::ViewTab;

#[derive(Debug, Clone)]
pub enum SessionAction {
    User(UserAction),
    Runtime(RuntimeAction),
}

#[derive(Debug, Clone)]
pub enum UserAction {
    LoginInput(char),
    LoginBackspace,
    LoginPaste(String),
    LoginToggleField,
    LoginSubmit,
    Logout,
    NextTab,
    PrevTab,
    SelectTab(ViewTab),
    InputChar(char),
    InputNewline,
    InputBackspace,
    InputPaste(String),
    ClearInput,
    CycleFramework,
    SetFramework(Framework),
    CycleUrgency,
    SetUrgency(Urgency),
    SubmitAnalysis,
    ClearHistory,
    ToggleTypeFilter(AnalysisType),
    SelectAllTypes,
    FocusSearch(bool),
    SearchInput(char),
    SearchBackspace,
    ClearSearch,
    ScrollTable(isize),
    ScrollHistory(isize),
    DismissBanner,
}

#[derive(Debug, Clone)]
pub enum RuntimeAction {
    SetApiConfigured(bool),
    SetHistoryLimits {
        recent_limit: usize,
        preview_chars: usize,
    },
    LoginSucceeded {
        username: String,
    },
    LoginRejected,
    AnalysisFinished {
        request_id: u64,
        analysis_type: AnalysisType,
        input_text: String,
        outcome: Result<String, AnalysisError>,
        finished_at: NaiveDateTime,
    },
}

/// Work the host must perform on behalf of the reducer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisRequest {
    pub request_id: u64,
    pub analysis_type: AnalysisType,
    /// What the user typed. This is what gets logged.
    pub input_text: String,
    /// Input plus modifiers. This is what the model sees.
    pub user_text: String,
    pub instruction: &'static str,
}

impl RuntimeAction {
    /// Result of `request`, stamped with the local wall clock.
    pub fn finished_now(request: AnalysisRequest, outcome: Result<String, AnalysisError>) -> Self {
        Self::AnalysisFinished {
            request_id: request.request_id,
            analysis_type: request.analysis_type,
            input_text: request.input_text,
            outcome,
            finished_at: Local::now().naive_local(),
        }
    }
}
