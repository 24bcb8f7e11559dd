use super::actions::AnalysisRequest;
use super::analytics::filter_records;
use super::analytics::recent;
use super::actions::RuntimeAction;
use super::actions::SessionAction;
use super::actions::UserAction;
use super::error::AnalysisError;
use super::prompts::compose_user_text;
use super::prompts::instruction_for;
use super::state::AnalysisRecord;
use super::state::AuthState;
use super::state::Banner;
use super::state::BannerLevel;
use super::state::InFlight;
use super::state::LoginForm;
use super::state::SessionState;
use super::state::TAB_ORDER;

const INVALID_LOGIN: &str = "Invalid credentials. Please try again.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEffect {
    RequestFrame,
    Authenticate { username: String, password: String },
    RunAnalysis(AnalysisRequest),
}

pub fn reduce(state: &mut SessionState, action: SessionAction) -> Vec<SessionEffect> {
    match action {
        SessionAction::User(user) => reduce_user(state, user),
        SessionAction::Runtime(runtime) => {
            reduce_runtime(state, runtime);
            Vec::new()
        }
    }
}

fn reduce_user(state: &mut SessionState, action: UserAction) -> Vec<SessionEffect> {
    if let AuthState::LoggedOut(form) = &mut state.auth {
        return reduce_login(form, action);
    }

    match action {
        UserAction::LoginInput(_)
        | UserAction::LoginBackspace
        | UserAction::LoginPaste(_)
        | UserAction::LoginToggleField
        | UserAction::LoginSubmit => Vec::new(),
        UserAction::Logout => {
            tracing::info!(
                user = state.auth.username().unwrap_or_default(),
                records = state.log.len(),
                "logout, discarding session"
            );
            state.reset_session();
            vec![SessionEffect::RequestFrame]
        }
        UserAction::NextTab => {
            state.tab = state.tab.next();
            vec![SessionEffect::RequestFrame]
        }
        UserAction::PrevTab => {
            state.tab = state.tab.prev();
            vec![SessionEffect::RequestFrame]
        }
        UserAction::SelectTab(tab) => {
            state.tab = tab;
            vec![SessionEffect::RequestFrame]
        }
        UserAction::InputChar(ch) => edit_active_input(state, |input| input.push(ch)),
        UserAction::InputNewline => edit_active_input(state, |input| input.push('\n')),
        UserAction::InputBackspace => edit_active_input(state, |input| {
            input.pop();
        }),
        UserAction::InputPaste(text) => edit_active_input(state, |input| input.push_str(&text)),
        UserAction::ClearInput => edit_active_input(state, String::clear),
        UserAction::CycleFramework => {
            state.modifiers.framework = state.modifiers.framework.next();
            vec![SessionEffect::RequestFrame]
        }
        UserAction::SetFramework(framework) => {
            state.modifiers.framework = framework;
            vec![SessionEffect::RequestFrame]
        }
        UserAction::CycleUrgency => {
            state.modifiers.urgency = state.modifiers.urgency.next();
            vec![SessionEffect::RequestFrame]
        }
        UserAction::SetUrgency(urgency) => {
            state.modifiers.urgency = urgency;
            vec![SessionEffect::RequestFrame]
        }
        UserAction::SubmitAnalysis => submit_analysis(state),
        UserAction::ClearHistory => {
            tracing::info!(records = state.log.len(), "history cleared");
            state.log.clear();
            state.analytics.table_scroll = 0;
            state.history_scroll = 0;
            state.banner = Some(Banner::new(BannerLevel::Info, "History cleared."));
            vec![SessionEffect::RequestFrame]
        }
        UserAction::ToggleTypeFilter(kind) => {
            let slot = &mut state.analytics.types[kind.ordinal()];
            *slot = !*slot;
            state.analytics.table_scroll = 0;
            vec![SessionEffect::RequestFrame]
        }
        UserAction::SelectAllTypes => {
            state.analytics.types = [true; 4];
            state.analytics.table_scroll = 0;
            vec![SessionEffect::RequestFrame]
        }
        UserAction::FocusSearch(focused) => {
            state.analytics.search_focused = focused;
            vec![SessionEffect::RequestFrame]
        }
        UserAction::SearchInput(ch) => {
            state.analytics.search.push(ch);
            state.analytics.table_scroll = 0;
            vec![SessionEffect::RequestFrame]
        }
        UserAction::SearchBackspace => {
            state.analytics.search.pop();
            state.analytics.table_scroll = 0;
            vec![SessionEffect::RequestFrame]
        }
        UserAction::ClearSearch => {
            state.analytics.search.clear();
            state.analytics.table_scroll = 0;
            vec![SessionEffect::RequestFrame]
        }
        UserAction::ScrollTable(delta) => {
            let rows = filter_records(state.log.all(), &state.analytics.log_filter()).len();
            state.analytics.table_scroll = state
                .analytics
                .table_scroll
                .saturating_add_signed(delta)
                .min(rows.saturating_sub(1));
            vec![SessionEffect::RequestFrame]
        }
        UserAction::ScrollHistory(delta) => {
            let lines = history_line_count(state);
            state.history_scroll = state
                .history_scroll
                .saturating_add_signed(delta)
                .min(lines.saturating_sub(1));
            vec![SessionEffect::RequestFrame]
        }
        UserAction::DismissBanner => {
            state.banner = None;
            vec![SessionEffect::RequestFrame]
        }
    }
}

fn reduce_login(form: &mut LoginForm, action: UserAction) -> Vec<SessionEffect> {
    let field = if form.focus_password {
        &mut form.password
    } else {
        &mut form.username
    };
    match action {
        UserAction::LoginInput(ch) | UserAction::InputChar(ch) => field.push(ch),
        UserAction::LoginBackspace | UserAction::InputBackspace => {
            field.pop();
        }
        UserAction::LoginPaste(text) | UserAction::InputPaste(text) => {
            field.push_str(text.trim_end_matches(['\r', '\n']));
        }
        UserAction::LoginToggleField | UserAction::NextTab | UserAction::PrevTab => {
            form.focus_password = !form.focus_password;
        }
        UserAction::LoginSubmit | UserAction::SubmitAnalysis => {
            if form.username.trim().is_empty() || form.password.is_empty() {
                form.error = Some(INVALID_LOGIN.into());
                return vec![SessionEffect::RequestFrame];
            }
            return vec![
                SessionEffect::Authenticate {
                    username: form.username.trim().to_string(),
                    password: form.password.clone(),
                },
                SessionEffect::RequestFrame,
            ];
        }
        UserAction::ClearInput => {
            *form = LoginForm::default();
        }
        _ => return Vec::new(),
    }
    vec![SessionEffect::RequestFrame]
}

/// Lines the History view lays out before wrapping: a heading, the input
/// preview, an output label, the output itself and a spacer per record.
fn history_line_count(state: &SessionState) -> usize {
    recent(state.log.all(), state.recent_limit)
        .iter()
        .map(|record| 4 + record.output_text.lines().count().max(1))
        .sum()
}

fn edit_active_input(
    state: &mut SessionState,
    edit: impl FnOnce(&mut String),
) -> Vec<SessionEffect> {
    match state.active_form_mut() {
        Some(form) => {
            edit(&mut form.input);
            vec![SessionEffect::RequestFrame]
        }
        None => Vec::new(),
    }
}

fn submit_analysis(state: &mut SessionState) -> Vec<SessionEffect> {
    let Some(kind) = state.tab.analysis_type() else {
        return Vec::new();
    };

    if state.in_flight.active {
        state.banner = Some(Banner::new(
            BannerLevel::Warning,
            "An analysis is already running. Please wait for it to finish.",
        ));
        return vec![SessionEffect::RequestFrame];
    }

    let input = state.form(kind).input.clone();
    let precondition = if !state.api_configured {
        Some(AnalysisError::ConfigurationMissing)
    } else if input.trim().is_empty() {
        Some(AnalysisError::EmptyInput)
    } else {
        None
    };
    if let Some(err) = precondition {
        tracing::debug!(kind = kind.tag(), reason = err.label(), "analysis not submitted");
        let level = if err == AnalysisError::EmptyInput {
            BannerLevel::Warning
        } else {
            BannerLevel::Error
        };
        state.banner = Some(Banner::new(level, err.user_message()));
        return vec![SessionEffect::RequestFrame];
    }

    let request_id = state.next_request_id;
    state.next_request_id = state.next_request_id.saturating_add(1);
    state.in_flight = InFlight {
        active: true,
        request_id,
    };
    state.banner = Some(Banner::new(
        BannerLevel::Info,
        format!("Running {} analysis...", kind.label()),
    ));

    let request = AnalysisRequest {
        request_id,
        analysis_type: kind,
        user_text: compose_user_text(kind, &input, state.modifiers),
        input_text: input,
        instruction: instruction_for(kind),
    };
    vec![
        SessionEffect::RunAnalysis(request),
        SessionEffect::RequestFrame,
    ]
}

fn reduce_runtime(state: &mut SessionState, action: RuntimeAction) {
    match action {
        RuntimeAction::SetApiConfigured(configured) => {
            state.api_configured = configured;
        }
        RuntimeAction::SetHistoryLimits {
            recent_limit,
            preview_chars,
        } => {
            state.recent_limit = recent_limit;
            state.preview_chars = preview_chars;
        }
        RuntimeAction::LoginSucceeded { username } => {
            if state.is_authenticated() {
                return;
            }
            tracing::info!(user = %username, "login accepted");
            state.reset_session();
            state.auth = AuthState::LoggedIn {
                username: username.into(),
            };
            state.tab = TAB_ORDER[0];
        }
        RuntimeAction::LoginRejected => {
            if let AuthState::LoggedOut(form) = &mut state.auth {
                tracing::info!(user = %form.username.trim(), "login rejected");
                form.password.clear();
                form.focus_password = true;
                form.error = Some(INVALID_LOGIN.into());
            }
        }
        RuntimeAction::AnalysisFinished {
            request_id,
            analysis_type,
            input_text,
            outcome,
            finished_at,
        } => {
            if !state.is_authenticated()
                || !state.in_flight.active
                || state.in_flight.request_id != request_id
            {
                tracing::debug!(request_id, "dropping result for a stale request");
                return;
            }
            state.in_flight.active = false;

            let (output, banner) = match outcome {
                Ok(text) => (
                    text,
                    Banner::new(BannerLevel::Success, "Analysis complete!"),
                ),
                Err(err) if err.is_precondition() => {
                    state.banner = Some(Banner::new(BannerLevel::Error, err.user_message()));
                    return;
                }
                Err(err) => {
                    let message = err.user_message();
                    (message.clone(), Banner::new(BannerLevel::Warning, message))
                }
            };

            state.form_mut(analysis_type).last_result = Some(output.clone());
            state.log.append(AnalysisRecord::new(
                analysis_type,
                input_text,
                output,
                finished_at,
            ));
            state.banner = Some(banner);
        }
    }
}

#[cfg(test)]
mod tests;
