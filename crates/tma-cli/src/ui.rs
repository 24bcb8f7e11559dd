use std::io;
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crossterm::event::{
    self, DisableBracketedPaste, EnableBracketedPaste, Event, KeyCode, KeyEvent, KeyEventKind,
    KeyModifiers,
};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::{Backend, CrosstermBackend};
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{
    BarChart, Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Tabs, Wrap,
};
use ratatui::{Frame, Terminal};

use tma_core::analytics::{recent, summarize, AnalyticsReport};
use tma_core::prompts::{input_hint, tab_blurb};
use tma_core::state::{truncate_preview, LoginField, TAB_ORDER};
use tma_core::{
    AnalysisError, AnalysisRecord, AnalysisRequest, AnalysisType, AuthState, BannerLevel, LoginForm,
    SessionAction, SessionState, UserAction, ViewTab,
};

use crate::host::Host;

struct TuiGuard;

impl Drop for TuiGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(
            io::stdout(),
            DisableBracketedPaste,
            LeaveAlternateScreen,
            crossterm::cursor::Show
        );
    }
}

pub fn run(mut host: Host) -> anyhow::Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(
        stdout,
        EnterAlternateScreen,
        EnableBracketedPaste,
        crossterm::cursor::Hide
    )?;
    let _guard = TuiGuard;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    run_app(&mut terminal, &mut host)?;
    Ok(())
}

enum UiEvent {
    AnalysisFinished {
        request: AnalysisRequest,
        outcome: Result<String, AnalysisError>,
    },
}

enum KeyHandlerResult {
    Continue(Vec<UserAction>),
    Exit,
}

fn run_app<B: Backend>(terminal: &mut Terminal<B>, host: &mut Host) -> io::Result<()> {
    let (tx, rx) = mpsc::channel::<UiEvent>();

    loop {
        while let Ok(event) = rx.try_recv() {
            match event {
                UiEvent::AnalysisFinished { request, outcome } => host.finish(request, outcome),
            }
        }

        terminal.draw(|f| ui(f, &host.state))?;

        if !event::poll(Duration::from_millis(80))? {
            continue;
        }
        let actions = match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => {
                match handle_key_event(key, &host.state) {
                    KeyHandlerResult::Continue(actions) => actions,
                    KeyHandlerResult::Exit => return Ok(()),
                }
            }
            Event::Paste(text) => handle_paste(text, &host.state),
            _ => Vec::new(),
        };

        for action in actions {
            let dispatched = host.dispatch(SessionAction::User(action));
            for request in dispatched.analyses {
                let tx = tx.clone();
                let invoker = host.invoker();
                thread::spawn(move || {
                    let outcome = invoker.run(&request);
                    let _ = tx.send(UiEvent::AnalysisFinished { request, outcome });
                });
            }
        }
    }
}

fn handle_key_event(key: KeyEvent, state: &SessionState) -> KeyHandlerResult {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    if ctrl && matches!(key.code, KeyCode::Char('c') | KeyCode::Char('q')) {
        return KeyHandlerResult::Exit;
    }

    if matches!(state.auth, AuthState::LoggedOut(_)) {
        return handle_login_keys(key);
    }

    let global = match key.code {
        KeyCode::Tab => Some(UserAction::NextTab),
        KeyCode::BackTab => Some(UserAction::PrevTab),
        KeyCode::Char('l') if ctrl => Some(UserAction::Logout),
        KeyCode::Char('x') if ctrl => Some(UserAction::ClearHistory),
        _ => None,
    };
    if let Some(action) = global {
        return KeyHandlerResult::Continue(vec![action]);
    }

    match state.tab {
        ViewTab::Analysis(kind) => handle_analysis_keys(key, kind),
        ViewTab::History => handle_history_keys(key),
        ViewTab::Analytics => handle_analytics_keys(key, state),
    }
}

fn handle_login_keys(key: KeyEvent) -> KeyHandlerResult {
    let action = match key.code {
        KeyCode::Esc => return KeyHandlerResult::Exit,
        KeyCode::Enter => UserAction::LoginSubmit,
        KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => {
            UserAction::LoginToggleField
        }
        KeyCode::Backspace => UserAction::LoginBackspace,
        KeyCode::Char(c) => UserAction::LoginInput(c),
        _ => return KeyHandlerResult::Continue(Vec::new()),
    };
    KeyHandlerResult::Continue(vec![action])
}

fn handle_analysis_keys(key: KeyEvent, kind: AnalysisType) -> KeyHandlerResult {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    let action = match key.code {
        KeyCode::F(5) => UserAction::SubmitAnalysis,
        KeyCode::Char('s') if ctrl => UserAction::SubmitAnalysis,
        KeyCode::Char('f') if ctrl && kind == AnalysisType::ChangeGuidance => {
            UserAction::CycleFramework
        }
        KeyCode::Char('u') if ctrl && kind == AnalysisType::Recommendations => {
            UserAction::CycleUrgency
        }
        KeyCode::Char('k') if ctrl => UserAction::ClearInput,
        KeyCode::Esc => UserAction::DismissBanner,
        KeyCode::Enter => UserAction::InputNewline,
        KeyCode::Backspace => UserAction::InputBackspace,
        KeyCode::Char(c) if !ctrl => UserAction::InputChar(c),
        _ => return KeyHandlerResult::Continue(Vec::new()),
    };
    KeyHandlerResult::Continue(vec![action])
}

fn handle_history_keys(key: KeyEvent) -> KeyHandlerResult {
    let action = match key.code {
        KeyCode::Char('q') => return KeyHandlerResult::Exit,
        KeyCode::Esc => UserAction::DismissBanner,
        KeyCode::Up | KeyCode::Char('k') => UserAction::ScrollHistory(-1),
        KeyCode::Down | KeyCode::Char('j') => UserAction::ScrollHistory(1),
        KeyCode::PageUp => UserAction::ScrollHistory(-10),
        KeyCode::PageDown => UserAction::ScrollHistory(10),
        _ => return KeyHandlerResult::Continue(Vec::new()),
    };
    KeyHandlerResult::Continue(vec![action])
}

fn handle_analytics_keys(key: KeyEvent, state: &SessionState) -> KeyHandlerResult {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    if state.analytics.search_focused {
        let action = match key.code {
            KeyCode::Esc | KeyCode::Enter => UserAction::FocusSearch(false),
            KeyCode::Backspace => UserAction::SearchBackspace,
            KeyCode::Char('k') if ctrl => UserAction::ClearSearch,
            KeyCode::Char(c) if !ctrl => UserAction::SearchInput(c),
            _ => return KeyHandlerResult::Continue(Vec::new()),
        };
        return KeyHandlerResult::Continue(vec![action]);
    }

    let action = match key.code {
        KeyCode::Char('q') => return KeyHandlerResult::Exit,
        KeyCode::Char(c @ '1'..='4') => {
            let idx = c as usize - '1' as usize;
            UserAction::ToggleTypeFilter(AnalysisType::ALL[idx])
        }
        KeyCode::Char('a') => UserAction::SelectAllTypes,
        KeyCode::Char('/') => UserAction::FocusSearch(true),
        KeyCode::Char('c') => UserAction::ClearSearch,
        KeyCode::Up | KeyCode::Char('k') => UserAction::ScrollTable(-1),
        KeyCode::Down | KeyCode::Char('j') => UserAction::ScrollTable(1),
        KeyCode::PageUp => UserAction::ScrollTable(-10),
        KeyCode::PageDown => UserAction::ScrollTable(10),
        KeyCode::Esc => UserAction::DismissBanner,
        _ => return KeyHandlerResult::Continue(Vec::new()),
    };
    KeyHandlerResult::Continue(vec![action])
}

fn handle_paste(text: String, state: &SessionState) -> Vec<UserAction> {
    match (&state.auth, state.tab) {
        (AuthState::LoggedOut(_), _) => vec![UserAction::LoginPaste(text)],
        (_, ViewTab::Analysis(_)) => vec![UserAction::InputPaste(text.replace("\r\n", "\n"))],
        (_, ViewTab::Analytics) if state.analytics.search_focused => text
            .chars()
            .filter(|c| !c.is_control())
            .map(UserAction::SearchInput)
            .collect(),
        _ => Vec::new(),
    }
}

#[derive(Clone, Copy)]
struct UiPalette {
    accent: Color,
    success: Color,
    warning: Color,
    danger: Color,
    muted: Color,
    border: Color,
}

const PALETTE: UiPalette = UiPalette {
    accent: Color::Cyan,
    success: Color::Green,
    warning: Color::Yellow,
    danger: Color::Red,
    muted: Color::DarkGray,
    border: Color::Gray,
};

fn get_spinner() -> &'static str {
    let frames = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();
    frames[(millis / 100) as usize % frames.len()]
}

fn ui(f: &mut Frame, state: &SessionState) {
    match &state.auth {
        AuthState::LoggedOut(form) => render_login(f, form, state.api_configured),
        AuthState::LoggedIn { username } => render_main(f, state, username),
    }
}

fn render_login(f: &mut Frame, form: &LoginForm, api_configured: bool) {
    let area = centered_rect(50, 50, f.area());
    f.render_widget(Clear, area);

    let field_style = |field: LoginField| {
        if form.focused() == field {
            Style::default().fg(PALETTE.accent).add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        }
    };
    let masked: String = "•".repeat(form.password.chars().count());
    let mut lines = vec![
        Line::from(Span::styled(
            "Transformation Management Assistant",
            Style::default().fg(PALETTE.accent).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            "Please log in to continue",
            Style::default().fg(PALETTE.muted),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("Username: ", field_style(LoginField::Username)),
            Span::raw(form.username.as_str()),
        ]),
        Line::from(vec![
            Span::styled("Password: ", field_style(LoginField::Password)),
            Span::raw(masked),
        ]),
        Line::from(""),
    ];
    if let Some(error) = &form.error {
        lines.push(Line::from(Span::styled(
            error.as_ref(),
            Style::default().fg(PALETTE.danger),
        )));
    }
    if !api_configured {
        lines.push(Line::from(Span::styled(
            "API key missing: analyses will not run until OPENAI_API_KEY is set.",
            Style::default().fg(PALETTE.warning),
        )));
    }
    lines.push(Line::from(Span::styled(
        "Tab switch field | Enter log in | Esc quit",
        Style::default().fg(PALETTE.muted),
    )));

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(PALETTE.border))
        .title("Login");
    f.render_widget(
        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: false })
            .block(block),
        area,
    );
}

fn render_main(f: &mut Frame, state: &SessionState, username: &str) {
    let banner_h = if state.banner.is_some() { 3 } else { 0 };
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3),        // Header
            Constraint::Length(3),        // Tabs
            Constraint::Min(0),           // Content
            Constraint::Length(banner_h), // Banner
            Constraint::Length(1),        // Footer
        ])
        .split(f.area());

    let api = if state.api_configured {
        Span::styled("API key configured", Style::default().fg(PALETTE.success))
    } else {
        Span::styled("API key missing", Style::default().fg(PALETTE.danger))
    };
    let busy = if state.in_flight.active {
        format!("{} analyzing", get_spinner())
    } else {
        "idle".to_string()
    };
    let header = Paragraph::new(Line::from(vec![
        Span::styled(
            "Transformation Management Assistant",
            Style::default().fg(PALETTE.accent).add_modifier(Modifier::BOLD),
        ),
        Span::raw(format!(" | Welcome, {username} | ")),
        api,
        Span::raw(format!(" | Analyses this session: {} | {busy}", state.log.len())),
    ]))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(PALETTE.border)),
    );
    f.render_widget(header, chunks[0]);

    let titles: Vec<Line> = TAB_ORDER.iter().map(|t| Line::from(t.label())).collect();
    let tabs = Tabs::new(titles)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(PALETTE.border))
                .title("Views"),
        )
        .select(state.tab.index())
        .highlight_style(
            Style::default()
                .fg(PALETTE.accent)
                .add_modifier(Modifier::BOLD),
        );
    f.render_widget(tabs, chunks[1]);

    match state.tab {
        ViewTab::Analysis(kind) => render_analysis(f, chunks[2], state, kind),
        ViewTab::History => render_history(f, chunks[2], state),
        ViewTab::Analytics => render_analytics(f, chunks[2], state),
    }

    if let Some(banner) = &state.banner {
        let color = match banner.level {
            BannerLevel::Info => PALETTE.accent,
            BannerLevel::Success => PALETTE.success,
            BannerLevel::Warning => PALETTE.warning,
            BannerLevel::Error => PALETTE.danger,
        };
        let first_line = banner.message.lines().next().unwrap_or_default();
        f.render_widget(
            Paragraph::new(first_line)
                .style(Style::default().fg(color))
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .border_style(Style::default().fg(color)),
                ),
            chunks[3],
        );
    }

    f.render_widget(
        Paragraph::new(footer_hint(state)).style(Style::default().fg(PALETTE.muted)),
        chunks[4],
    );
}

fn footer_hint(state: &SessionState) -> String {
    let common = "Tab/Shift-Tab views | Ctrl-X clear history | Ctrl-L logout | Ctrl-Q quit";
    match state.tab {
        ViewTab::Analysis(AnalysisType::ChangeGuidance) => {
            format!("Ctrl-S analyze | Ctrl-F framework | Ctrl-K clear input | {common}")
        }
        ViewTab::Analysis(AnalysisType::Recommendations) => {
            format!("Ctrl-S analyze | Ctrl-U urgency | Ctrl-K clear input | {common}")
        }
        ViewTab::Analysis(_) => format!("Ctrl-S analyze | Ctrl-K clear input | {common}"),
        ViewTab::History => format!("j/k/PgUp/PgDn scroll | {common}"),
        ViewTab::Analytics if state.analytics.search_focused => {
            "Type to search | Enter/Esc done | Ctrl-K clear search".to_string()
        }
        ViewTab::Analytics => {
            format!("1-4 toggle type | a all | / search | j/k select row | {common}")
        }
    }
}

fn render_analysis(f: &mut Frame, area: Rect, state: &SessionState, kind: AnalysisType) {
    let form = state.form(kind);
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Percentage(40),
            Constraint::Min(0),
        ])
        .split(area);

    let mut intro = vec![Span::styled(
        tab_blurb(kind),
        Style::default().fg(PALETTE.muted),
    )];
    match kind {
        AnalysisType::ChangeGuidance => intro.push(Span::raw(format!(
            "  | Framework: {}",
            state.modifiers.framework.label()
        ))),
        AnalysisType::Recommendations => intro.push(Span::raw(format!(
            "  | Urgency: {}",
            state.modifiers.urgency.label()
        ))),
        _ => {}
    }
    f.render_widget(Paragraph::new(Line::from(intro)), rows[0]);

    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(PALETTE.accent))
        .title(input_hint(kind));
    let input = if form.input.is_empty() {
        Paragraph::new(Span::styled(
            "Start typing or paste text...",
            Style::default().fg(PALETTE.muted),
        ))
    } else {
        Paragraph::new(format!("{}▏", form.input))
    };
    f.render_widget(input.wrap(Wrap { trim: false }).block(input_block), rows[1]);

    let result_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(PALETTE.border))
        .title(format!("{} Results", kind.label()));
    let result = if state.in_flight.active {
        Paragraph::new(format!("{} Analyzing...", get_spinner()))
    } else {
        match &form.last_result {
            Some(text) => Paragraph::new(text.as_str()),
            None => Paragraph::new(Span::styled(
                "No results yet.",
                Style::default().fg(PALETTE.muted),
            )),
        }
    };
    f.render_widget(result.wrap(Wrap { trim: false }).block(result_block), rows[2]);
}

fn render_history(f: &mut Frame, area: Rect, state: &SessionState) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(PALETTE.border))
        .title(format!("Recent analyses (latest {})", state.recent_limit));

    let records = recent(state.log.all(), state.recent_limit);
    if records.is_empty() {
        f.render_widget(
            Paragraph::new("No analyses yet in this session.")
                .style(Style::default().fg(PALETTE.muted))
                .block(block),
            area,
        );
        return;
    }

    let mut lines = Vec::new();
    for record in records {
        lines.push(Line::from(vec![
            Span::styled(
                format!("{} ", record.timestamp),
                Style::default().fg(PALETTE.muted),
            ),
            Span::styled(
                record.analysis_type.label(),
                Style::default().fg(PALETTE.accent).add_modifier(Modifier::BOLD),
            ),
        ]));
        lines.push(Line::from(format!(
            "  Input: {}",
            record.input_preview(state.preview_chars)
        )));
        lines.push(Line::from("  Output:"));
        if record.output_text.is_empty() {
            lines.push(Line::from(""));
        }
        for text in record.output_text.lines() {
            lines.push(Line::from(format!("    {text}")));
        }
        lines.push(Line::from(""));
    }
    let scroll = u16::try_from(state.history_scroll).unwrap_or(u16::MAX);
    f.render_widget(
        Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .scroll((scroll, 0))
            .block(block),
        area,
    );
}

fn render_analytics(f: &mut Frame, area: Rect, state: &SessionState) {
    let report = summarize(state.log.all(), &state.analytics.log_filter());

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(9),
            Constraint::Min(0),
        ])
        .split(area);

    render_filters(f, rows[0], state);
    render_metrics(f, rows[1], &report);

    let charts = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(rows[2]);
    render_type_chart(f, charts[0], &report);
    render_timeline(f, charts[1], &report);

    let bottom = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(rows[3]);
    let selected = state
        .analytics
        .table_scroll
        .min(report.filtered.len().saturating_sub(1));
    render_table(f, bottom[0], selected, &report);
    render_record_detail(f, bottom[1], report.filtered.get(selected).copied());
}

fn render_filters(f: &mut Frame, area: Rect, state: &SessionState) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
        .split(area);

    let mut spans = Vec::new();
    for (idx, kind) in AnalysisType::ALL.into_iter().enumerate() {
        let on = state.analytics.types[kind.ordinal()];
        let mark = if on { "[x]" } else { "[ ]" };
        let style = if on {
            Style::default().fg(PALETTE.accent)
        } else {
            Style::default().fg(PALETTE.muted)
        };
        spans.push(Span::styled(
            format!("{} {mark} {}  ", idx + 1, kind.label()),
            style,
        ));
    }
    f.render_widget(
        Paragraph::new(Line::from(spans)).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(PALETTE.border))
                .title("Filter by type"),
        ),
        cols[0],
    );

    let border = if state.analytics.search_focused {
        PALETTE.accent
    } else {
        PALETTE.border
    };
    let search = if state.analytics.search_focused {
        format!("{}▏", state.analytics.search)
    } else {
        state.analytics.search.clone()
    };
    f.render_widget(
        Paragraph::new(search).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(border))
                .title("Search"),
        ),
        cols[1],
    );
}

fn render_metrics(f: &mut Frame, area: Rect, report: &AnalyticsReport<'_>) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(33),
            Constraint::Percentage(33),
            Constraint::Percentage(34),
        ])
        .split(area);
    let most_used = report
        .most_common
        .map(|c| format!("{} ({})", c.analysis_type.label(), c.count))
        .unwrap_or_else(|| "N/A".to_string());
    let metrics = [
        ("Total analyses (session)", report.total.to_string()),
        ("Analyses (filtered)", report.filtered_count().to_string()),
        ("Most used type (session)", most_used),
    ];
    for (col, (title, value)) in cols.iter().zip(metrics) {
        f.render_widget(
            Paragraph::new(value)
                .alignment(Alignment::Center)
                .style(Style::default().add_modifier(Modifier::BOLD))
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .border_style(Style::default().fg(PALETTE.border))
                        .title(title),
                ),
            *col,
        );
    }
}

fn chart_block(title: &str) -> Block<'_> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(PALETTE.border))
        .title(title)
}

fn short_label(kind: AnalysisType) -> &'static str {
    match kind {
        AnalysisType::RiskDetection => "Risk",
        AnalysisType::ChangeGuidance => "Guide",
        AnalysisType::TeamAnalysis => "Team",
        AnalysisType::Recommendations => "Recs",
    }
}

fn render_type_chart(f: &mut Frame, area: Rect, report: &AnalyticsReport<'_>) {
    if report.by_type.is_empty() {
        f.render_widget(
            Paragraph::new("No data for the current filters.")
                .style(Style::default().fg(PALETTE.muted))
                .block(chart_block("Analyses by type")),
            area,
        );
        return;
    }
    let data: Vec<(&str, u64)> = report
        .by_type
        .iter()
        .map(|c| (short_label(c.analysis_type), c.count as u64))
        .collect();
    let chart = BarChart::default()
        .block(chart_block("Analyses by type"))
        .data(data.as_slice())
        .bar_width(6)
        .bar_gap(2)
        .bar_style(Style::default().fg(PALETTE.accent))
        .value_style(Style::default().fg(Color::Black).bg(PALETTE.accent));
    f.render_widget(chart, area);
}

fn render_timeline(f: &mut Frame, area: Rect, report: &AnalyticsReport<'_>) {
    let Some(buckets) = &report.timeline else {
        f.render_widget(
            Paragraph::new("Timeline unavailable: some timestamps could not be read.")
                .style(Style::default().fg(PALETTE.warning))
                .wrap(Wrap { trim: false })
                .block(chart_block("Analyses per minute")),
            area,
        );
        return;
    };
    if buckets.is_empty() {
        f.render_widget(
            Paragraph::new("No data for the current filters.")
                .style(Style::default().fg(PALETTE.muted))
                .block(chart_block("Analyses per minute")),
            area,
        );
        return;
    }
    // keep the most recent minutes that fit
    let fit = usize::from(area.width.saturating_sub(2) / 7).max(1);
    let labels: Vec<String> = buckets.iter().map(|b| b.label()).collect();
    let data: Vec<(&str, u64)> = labels
        .iter()
        .zip(buckets)
        .map(|(label, bucket)| (label.as_str(), bucket.count as u64))
        .collect();
    let visible = &data[data.len().saturating_sub(fit)..];
    let chart = BarChart::default()
        .block(chart_block("Analyses per minute"))
        .data(visible)
        .bar_width(5)
        .bar_gap(2)
        .bar_style(Style::default().fg(PALETTE.success))
        .value_style(Style::default().fg(Color::Black).bg(PALETTE.success));
    f.render_widget(chart, area);
}

fn render_table(f: &mut Frame, area: Rect, selected: usize, report: &AnalyticsReport<'_>) {
    let rows: Vec<Row> = report
        .filtered
        .iter()
        .map(|record| {
            Row::new(vec![
                Cell::from(record.timestamp.clone()),
                Cell::from(record.analysis_type.label()),
                Cell::from(record.input_preview(40)),
                Cell::from(truncate_preview(&record.output_text, 40)),
            ])
        })
        .collect();
    let table = Table::new(
        rows,
        [
            Constraint::Length(17),
            Constraint::Length(16),
            Constraint::Percentage(40),
            Constraint::Percentage(40),
        ],
    )
    .header(
        Row::new(vec!["Timestamp", "Type", "Input", "Output"])
            .style(Style::default().fg(PALETTE.accent).add_modifier(Modifier::BOLD)),
    )
    .row_highlight_style(Style::default().bg(PALETTE.muted).add_modifier(Modifier::BOLD))
    .highlight_symbol("> ")
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(PALETTE.border))
            .title(format!(
                "Analyses ({} shown of {})",
                report.filtered_count(),
                report.total
            )),
    );
    let mut table_state = TableState::default();
    if !report.filtered.is_empty() {
        table_state.select(Some(selected));
    }
    f.render_stateful_widget(table, area, &mut table_state);
}

fn render_record_detail(f: &mut Frame, area: Rect, record: Option<&AnalysisRecord>) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(PALETTE.border))
        .title("Selected analysis");
    let Some(record) = record else {
        f.render_widget(
            Paragraph::new("No analyses match the current filters.")
                .style(Style::default().fg(PALETTE.muted))
                .block(block),
            area,
        );
        return;
    };

    let label = Style::default().fg(PALETTE.accent).add_modifier(Modifier::BOLD);
    let mut lines = vec![
        Line::from(vec![
            Span::styled(format!("{} ", record.timestamp), Style::default().fg(PALETTE.muted)),
            Span::styled(record.analysis_type.label(), label),
        ]),
        Line::from(Span::styled("Input", label)),
    ];
    lines.extend(record.input_text.lines().map(Line::from));
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled("Output", label)));
    lines.extend(record.output_text.lines().map(Line::from));
    f.render_widget(
        Paragraph::new(lines).wrap(Wrap { trim: false }).block(block),
        area,
    );
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
