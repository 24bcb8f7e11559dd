use std::sync::Arc;

use chrono::Local;
use chrono::NaiveDateTime;
use serde::Deserialize;
use serde::Serialize;

use crate::analytics::LogFilter;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisType {
    RiskDetection,
    ChangeGuidance,
    TeamAnalysis,
    Recommendations,
}

impl AnalysisType {
    /// Enumeration order. Also the tie-break order for aggregations.
    pub const ALL: [AnalysisType; 4] = [
        Self::RiskDetection,
        Self::ChangeGuidance,
        Self::TeamAnalysis,
        Self::Recommendations,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::RiskDetection => "Risk Detection",
            Self::ChangeGuidance => "Change Guidance",
            Self::TeamAnalysis => "Team Analysis",
            Self::Recommendations => "Recommendations",
        }
    }

    pub fn tag(self) -> &'static str {
        match self {
            Self::RiskDetection => "risk_detection",
            Self::ChangeGuidance => "change_guidance",
            Self::TeamAnalysis => "team_analysis",
            Self::Recommendations => "recommendations",
        }
    }

    /// Accepts tags (`risk_detection`), kebab-case and display labels.
    pub fn from_tag(input: &str) -> Option<Self> {
        let normalized = input.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        Self::ALL
            .into_iter()
            .find(|kind| kind.tag() == normalized)
    }

    pub fn ordinal(self) -> usize {
        match self {
            Self::RiskDetection => 0,
            Self::ChangeGuidance => 1,
            Self::TeamAnalysis => 2,
            Self::Recommendations => 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Framework {
    #[default]
    AutoSelect,
    Adkar,
    Kotter,
    Prosci,
    McKinsey7S,
}

impl Framework {
    pub const ALL: [Framework; 5] = [
        Self::AutoSelect,
        Self::Adkar,
        Self::Kotter,
        Self::Prosci,
        Self::McKinsey7S,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::AutoSelect => "Auto-select",
            Self::Adkar => "ADKAR",
            Self::Kotter => "Kotter's 8-Step",
            Self::Prosci => "Prosci",
            Self::McKinsey7S => "McKinsey 7-S",
        }
    }

    pub fn next(self) -> Self {
        match self {
            Self::AutoSelect => Self::Adkar,
            Self::Adkar => Self::Kotter,
            Self::Kotter => Self::Prosci,
            Self::Prosci => Self::McKinsey7S,
            Self::McKinsey7S => Self::AutoSelect,
        }
    }

    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_ascii_lowercase().as_str() {
            "auto" | "auto-select" => Some(Self::AutoSelect),
            "adkar" => Some(Self::Adkar),
            "kotter" | "kotter's 8-step" => Some(Self::Kotter),
            "prosci" => Some(Self::Prosci),
            "mckinsey" | "mckinsey-7s" | "mckinsey 7-s" => Some(Self::McKinsey7S),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    #[default]
    Low,
    Medium,
    High,
    Critical,
}

impl Urgency {
    pub fn label(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
            Self::Critical => "Critical",
        }
    }

    pub fn next(self) -> Self {
        match self {
            Self::Low => Self::Medium,
            Self::Medium => Self::High,
            Self::High => Self::Critical,
            Self::Critical => Self::Low,
        }
    }

    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_ascii_lowercase().as_str() {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            "critical" => Some(Self::Critical),
            _ => None,
        }
    }
}

/// Optional per-tab modifiers appended to the text sent to the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AnalysisModifiers {
    pub framework: Framework,
    pub urgency: Urgency,
}

/// One logged request/response pair. Immutable once it is in the log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisRecord {
    pub timestamp: String,
    pub analysis_type: AnalysisType,
    pub input_text: String,
    pub output_text: String,
}

impl AnalysisRecord {
    pub fn new(
        analysis_type: AnalysisType,
        input_text: impl Into<String>,
        output_text: impl Into<String>,
        at: NaiveDateTime,
    ) -> Self {
        Self {
            timestamp: at.format(TIMESTAMP_FORMAT).to_string(),
            analysis_type,
            input_text: input_text.into(),
            output_text: output_text.into(),
        }
    }

    pub fn now(
        analysis_type: AnalysisType,
        input_text: impl Into<String>,
        output_text: impl Into<String>,
    ) -> Self {
        Self::new(analysis_type, input_text, output_text, Local::now().naive_local())
    }

    /// Input as shown in history lists: first `max_chars` characters, then `...`.
    pub fn input_preview(&self, max_chars: usize) -> String {
        truncate_preview(&self.input_text, max_chars)
    }
}

pub fn truncate_preview(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max_chars).collect();
    out.push_str("...");
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Empty,
    NonEmpty,
}

/// Append-only record log scoped to one authenticated session.
#[derive(Debug, Clone, Default)]
pub struct SessionLog {
    records: Vec<AnalysisRecord>,
}

impl SessionLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, record: AnalysisRecord) {
        self.records.push(record);
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    pub fn all(&self) -> &[AnalysisRecord] {
        &self.records
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &AnalysisRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn phase(&self) -> SessionPhase {
        if self.records.is_empty() {
            SessionPhase::Empty
        } else {
            SessionPhase::NonEmpty
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewTab {
    Analysis(AnalysisType),
    History,
    Analytics,
}

pub const TAB_ORDER: [ViewTab; 6] = [
    ViewTab::Analysis(AnalysisType::RiskDetection),
    ViewTab::Analysis(AnalysisType::ChangeGuidance),
    ViewTab::Analysis(AnalysisType::TeamAnalysis),
    ViewTab::Analysis(AnalysisType::Recommendations),
    ViewTab::History,
    ViewTab::Analytics,
];

impl ViewTab {
    pub fn label(self) -> &'static str {
        match self {
            Self::Analysis(kind) => kind.label(),
            Self::History => "History",
            Self::Analytics => "Analytics",
        }
    }

    pub fn index(self) -> usize {
        TAB_ORDER.iter().position(|tab| *tab == self).unwrap_or(0)
    }

    pub fn next(self) -> Self {
        TAB_ORDER[(self.index() + 1) % TAB_ORDER.len()]
    }

    pub fn prev(self) -> Self {
        let idx = self.index();
        if idx == 0 {
            TAB_ORDER[TAB_ORDER.len() - 1]
        } else {
            TAB_ORDER[idx - 1]
        }
    }

    pub fn analysis_type(self) -> Option<AnalysisType> {
        match self {
            Self::Analysis(kind) => Some(kind),
            Self::History | Self::Analytics => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginField {
    Username,
    Password,
}

#[derive(Debug, Clone, Default)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
    pub focus_password: bool,
    pub error: Option<Arc<str>>,
}

impl LoginForm {
    pub fn focused(&self) -> LoginField {
        if self.focus_password {
            LoginField::Password
        } else {
            LoginField::Username
        }
    }
}

#[derive(Debug, Clone)]
pub enum AuthState {
    LoggedOut(LoginForm),
    LoggedIn { username: Arc<str> },
}

impl AuthState {
    pub fn username(&self) -> Option<&str> {
        match self {
            Self::LoggedIn { username } => Some(username),
            Self::LoggedOut(_) => None,
        }
    }
}

/// Per-tab input box and the last result shown under it.
#[derive(Debug, Clone, Default)]
pub struct AnalysisForm {
    pub input: String,
    pub last_result: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BannerLevel {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Banner {
    pub level: BannerLevel,
    pub message: Arc<str>,
}

impl Banner {
    pub fn new(level: BannerLevel, message: impl Into<Arc<str>>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AnalyticsSelection {
    pub types: [bool; 4],
    pub search: String,
    pub search_focused: bool,
    pub table_scroll: usize,
}

impl Default for AnalyticsSelection {
    fn default() -> Self {
        Self {
            types: [true; 4],
            search: String::new(),
            search_focused: false,
            table_scroll: 0,
        }
    }
}

impl AnalyticsSelection {
    pub fn selected_types(&self) -> Vec<AnalysisType> {
        AnalysisType::ALL
            .into_iter()
            .filter(|kind| self.types[kind.ordinal()])
            .collect()
    }

    pub fn log_filter(&self) -> LogFilter {
        LogFilter::with_types(self.selected_types()).with_search(self.search.clone())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct InFlight {
    pub active: bool,
    pub request_id: u64,
}

/// Everything one session owns. Mutated only through the reducer.
#[derive(Debug, Clone)]
pub struct SessionState {
    pub auth: AuthState,
    pub api_configured: bool,
    pub tab: ViewTab,
    pub forms: [AnalysisForm; 4],
    pub modifiers: AnalysisModifiers,
    pub log: SessionLog,
    pub analytics: AnalyticsSelection,
    /// First line shown in the History view.
    pub history_scroll: usize,
    pub banner: Option<Banner>,
    pub in_flight: InFlight,
    pub next_request_id: u64,
    pub recent_limit: usize,
    pub preview_chars: usize,
}

impl SessionState {
    pub fn new(api_configured: bool) -> Self {
        Self {
            auth: AuthState::LoggedOut(LoginForm::default()),
            api_configured,
            tab: TAB_ORDER[0],
            forms: Default::default(),
            modifiers: AnalysisModifiers::default(),
            log: SessionLog::new(),
            analytics: AnalyticsSelection::default(),
            history_scroll: 0,
            banner: None,
            in_flight: InFlight::default(),
            next_request_id: 1,
            recent_limit: 5,
            preview_chars: 200,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self.auth, AuthState::LoggedIn { .. })
    }

    pub fn form(&self, kind: AnalysisType) -> &AnalysisForm {
        &self.forms[kind.ordinal()]
    }

    pub fn form_mut(&mut self, kind: AnalysisType) -> &mut AnalysisForm {
        &mut self.forms[kind.ordinal()]
    }

    pub fn active_form_mut(&mut self) -> Option<&mut AnalysisForm> {
        let kind = self.tab.analysis_type()?;
        Some(self.form_mut(kind))
    }

    /// Drops everything tied to the logged-in user.
    pub fn reset_session(&mut self) {
        self.auth = AuthState::LoggedOut(LoginForm::default());
        self.tab = TAB_ORDER[0];
        self.forms = Default::default();
        self.modifiers = AnalysisModifiers::default();
        self.log.clear();
        self.analytics = AnalyticsSelection::default();
        self.history_scroll = 0;
        self.banner = None;
        self.in_flight = InFlight::default();
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    use super::*;

    fn at(hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .and_then(|d| d.and_hms_opt(hour, minute, 42))
            .unwrap()
    }

    #[test]
    fn record_timestamp_has_minute_resolution() {
        let record = AnalysisRecord::new(AnalysisType::TeamAnalysis, "in", "out", at(9, 5));
        assert_eq!(record.timestamp, "2024-01-01 09:05");
    }

    #[test]
    fn preview_truncates_long_input_only() {
        let long = "x".repeat(250);
        let record = AnalysisRecord::new(AnalysisType::RiskDetection, long, "", at(9, 0));
        let preview = record.input_preview(200);
        assert_eq!(preview.chars().count(), 203);
        assert!(preview.ends_with("..."));
        assert_eq!(record.input_text.len(), 250);

        assert_eq!(truncate_preview("short", 200), "short");
        assert_eq!(truncate_preview(&"y".repeat(200), 200), "y".repeat(200));
    }

    #[test]
    fn preview_counts_characters_not_bytes() {
        let text = "é".repeat(5);
        assert_eq!(truncate_preview(&text, 3), "ééé...");
    }

    #[test]
    fn session_log_phase_follows_append_and_clear() {
        let mut log = SessionLog::new();
        assert_eq!(log.phase(), SessionPhase::Empty);
        log.append(AnalysisRecord::new(AnalysisType::RiskDetection, "a", "b", at(9, 0)));
        assert_eq!(log.phase(), SessionPhase::NonEmpty);
        log.clear();
        assert_eq!(log.phase(), SessionPhase::Empty);
        log.clear();
        assert_eq!(log.phase(), SessionPhase::Empty);
    }

    #[test]
    fn analysis_type_tags_round_trip_and_accept_labels() {
        for kind in AnalysisType::ALL {
            assert_eq!(AnalysisType::from_tag(kind.tag()), Some(kind));
            assert_eq!(AnalysisType::from_tag(kind.label()), Some(kind));
        }
        assert_eq!(
            AnalysisType::from_tag("change-guidance"),
            Some(AnalysisType::ChangeGuidance)
        );
        assert_eq!(AnalysisType::from_tag("sentiment"), None);
    }

    #[test]
    fn tab_cycle_wraps_both_directions() {
        let first = TAB_ORDER[0];
        let last = TAB_ORDER[TAB_ORDER.len() - 1];
        assert_eq!(last.next(), first);
        assert_eq!(first.prev(), last);
        assert_eq!(first.next(), ViewTab::Analysis(AnalysisType::ChangeGuidance));
    }
}
