use crate::credentials::CredentialStore;
use crate::error::LoadError;
use crate::grouping::{render_view, DateFormat, GroupedView, RawView, RenderView};
use crate::loader::{Backend, LoadOutcome, LoadPhase, LoadTicket};
use crate::provider::Provider;
use crate::session::IntegrationSession;
use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState, Wrap},
    Frame, Terminal,
};
use serde_json::Value;
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

type LoadResult = (LoadTicket, Result<Value, LoadError>);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Integrations,
    Data,
}

impl Page {
    pub fn next(&self) -> Self {
        match self {
            Page::Integrations => Page::Data,
            Page::Data => Page::Integrations,
        }
    }

    pub fn previous(&self) -> Self {
        // two pages: previous == next
        self.next()
    }

    pub fn title(&self) -> &str {
        match self {
            Page::Integrations => "Integrations",
            Page::Data => "Data",
        }
    }
}

pub struct App {
    pub session: IntegrationSession,
    pub store: CredentialStore,
    pub dates: DateFormat,
    pub backend_url: String,
    pub current_page: Page,
    pub provider_state: TableState,
    pub data_scroll: u16,
    pub show_raw: bool,
    pub notice: Option<String>,
    backend: Arc<dyn Backend>,
    runtime: Handle,
    results_tx: UnboundedSender<LoadResult>,
    results_rx: UnboundedReceiver<LoadResult>,
}

impl App {
    pub fn new(
        session: IntegrationSession,
        store: CredentialStore,
        dates: DateFormat,
        backend_url: String,
        backend: Arc<dyn Backend>,
        runtime: Handle,
    ) -> Self {
        let mut provider_state = TableState::default();
        provider_state.select(Some(0));

        let (results_tx, results_rx) = unbounded_channel();

        Self {
            session,
            store,
            dates,
            backend_url,
            current_page: Page::Integrations,
            provider_state,
            data_scroll: 0,
            show_raw: false,
            notice: None,
            backend,
            runtime,
            results_tx,
            results_rx,
        }
    }

    pub fn highlighted_provider(&self) -> Option<Provider> {
        self.provider_state
            .selected()
            .and_then(|i| Provider::ALL.get(i).copied())
    }

    pub fn select_provider(&mut self, provider: Provider) {
        self.session.select_provider(provider);
        if let Some(i) = Provider::ALL.iter().position(|p| *p == provider) {
            self.provider_state.select(Some(i));
        }
        self.notice = None;
        self.data_scroll = 0;
        self.show_raw = false;
    }

    pub fn connect(&mut self) {
        match self.session.connect(&self.store) {
            Ok(()) => {
                self.notice = None;
                self.data_scroll = 0;
            }
            Err(e) => self.notice = Some(e.to_string()),
        }
    }

    /// Spawn a load on the runtime; no-op while the load action is disabled
    pub fn start_load(&mut self) {
        let Some(request) = self.session.begin_load() else {
            return;
        };

        self.notice = None;
        let backend = Arc::clone(&self.backend);
        let tx = self.results_tx.clone();
        self.runtime.spawn(async move {
            let result = request.execute(backend.as_ref()).await;
            let _ = tx.send((request.ticket, result));
        });
    }

    pub fn clear(&mut self) {
        self.session.clear();
        self.data_scroll = 0;
    }

    /// Apply finished loads; results for a superseded context are dropped
    pub fn drain_results(&mut self) {
        while let Ok((ticket, result)) = self.results_rx.try_recv() {
            self.apply_result(ticket, result);
        }
    }

    fn apply_result(&mut self, ticket: LoadTicket, result: Result<Value, LoadError>) {
        match self.session.finish_load(ticket, result) {
            LoadOutcome::Loaded => {
                self.notice = None;
                self.data_scroll = 0;
            }
            LoadOutcome::Failed(message) => self.notice = Some(message),
            LoadOutcome::Stale => {}
        }
    }

    pub fn view(&self) -> RenderView {
        render_view(self.session.payload(), self.session.provider(), &self.dates)
    }

    pub fn next(&mut self) {
        match self.current_page {
            Page::Integrations => {
                let len = Provider::ALL.len();
                let i = match self.provider_state.selected() {
                    Some(i) if i >= len - 1 => 0,
                    Some(i) => i + 1,
                    None => 0,
                };
                self.provider_state.select(Some(i));
            }
            Page::Data => self.data_scroll = self.data_scroll.saturating_add(1),
        }
    }

    pub fn previous(&mut self) {
        match self.current_page {
            Page::Integrations => {
                let len = Provider::ALL.len();
                let i = match self.provider_state.selected() {
                    Some(0) | None => len - 1,
                    Some(i) => i - 1,
                };
                self.provider_state.select(Some(i));
            }
            Page::Data => self.data_scroll = self.data_scroll.saturating_sub(1),
        }
    }

    pub fn page_down(&mut self) {
        self.data_scroll = self.data_scroll.saturating_add(20);
    }

    pub fn page_up(&mut self) {
        self.data_scroll = self.data_scroll.saturating_sub(20);
    }

    /// Handle one key press; returns true when the user asked to quit
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Tab => self.current_page = self.current_page.next(),
            KeyCode::BackTab => self.current_page = self.current_page.previous(),
            KeyCode::Char(c @ '1'..='3') => {
                let index = c as usize - '1' as usize;
                if let Some(provider) = Provider::ALL.get(index).copied() {
                    self.select_provider(provider);
                }
            }
            KeyCode::Enter if self.current_page == Page::Integrations => {
                if let Some(provider) = self.highlighted_provider() {
                    self.select_provider(provider);
                }
            }
            KeyCode::Char(' ') => self.connect(),
            KeyCode::Char('l') => {
                self.start_load();
                if self.session.loader().is_loading() {
                    self.current_page = Page::Data;
                }
            }
            KeyCode::Char('c') if !key.modifiers.contains(KeyModifiers::CONTROL) => self.clear(),
            KeyCode::Char('c') => return true,
            KeyCode::Char('r') => self.show_raw = !self.show_raw,
            KeyCode::Down | KeyCode::Char('j') => self.next(),
            KeyCode::Up | KeyCode::Char('k') => self.previous(),
            KeyCode::PageDown => self.page_down(),
            KeyCode::PageUp => self.page_up(),
            KeyCode::Home => self.data_scroll = 0,
            _ => {}
        }
        false
    }
}

pub fn run_ui(app: &mut App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("Error: {:?}", err);
    }

    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> io::Result<()> {
    loop {
        app.drain_results();
        terminal.draw(|f| ui(f, app))?;

        // Poll so finished loads show up without waiting for a key
        if !event::poll(Duration::from_millis(100))? {
            continue;
        }

        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            if app.handle_key(key) {
                return Ok(());
            }
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header with navigation
            Constraint::Min(0),    // Content area
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);

    match app.current_page {
        Page::Integrations => render_integrations(f, chunks[1], app),
        Page::Data => render_data(f, chunks[1], app),
    }

    render_status_bar(f, chunks[2], app);
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let mut tab_spans = vec![];
    for (i, page) in [Page::Integrations, Page::Data].iter().enumerate() {
        if i > 0 {
            tab_spans.push(Span::raw(" │ "));
        }

        let style = if *page == app.current_page {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            Style::default().fg(Color::DarkGray)
        };

        tab_spans.push(Span::styled(page.title().to_string(), style));
    }

    let provider = app
        .session
        .provider()
        .map(|p| p.name())
        .unwrap_or("none");
    let connected = app.session.credentials().is_some();
    let phase = app.session.loader().phase();

    tab_spans.push(Span::raw("  |  "));
    tab_spans.push(Span::styled(
        format!("Integration: {}", provider),
        Style::default().fg(Color::White),
    ));
    tab_spans.push(Span::raw("  |  "));
    tab_spans.push(if connected {
        Span::styled("✓ connected", Style::default().fg(Color::Green))
    } else {
        Span::styled("✗ not connected", Style::default().fg(Color::DarkGray))
    });
    tab_spans.push(Span::raw("  |  "));
    tab_spans.push(Span::styled(phase.as_str(), phase_style(phase)));

    let header = Paragraph::new(vec![Line::from(tab_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(" 🔗 Integration Hub "),
    );

    f.render_widget(header, area);
}

fn phase_style(phase: LoadPhase) -> Style {
    match phase {
        LoadPhase::Idle => Style::default().fg(Color::DarkGray),
        LoadPhase::Loading => Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        LoadPhase::Loaded => Style::default().fg(Color::Green),
        LoadPhase::Failed => Style::default().fg(Color::Red),
    }
}

fn render_integrations(f: &mut Frame, area: Rect, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(area);

    let header_cells = ["#", "Integration", "Slug", "Description", "Status"]
        .iter()
        .map(|h| {
            Cell::from(*h).style(
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )
        });

    let header = Row::new(header_cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1);

    let active = app.session.provider();
    let connected_to = app.session.credentials().map(|b| b.provider());

    let rows = Provider::ALL.iter().enumerate().map(|(i, provider)| {
        let (status, color) = if connected_to == Some(*provider) && active == Some(*provider) {
            ("connected", Color::Green)
        } else if active == Some(*provider) {
            ("selected", Color::Yellow)
        } else {
            ("", Color::White)
        };

        Row::new(vec![
            Cell::from(format!("{}", i + 1)),
            Cell::from(provider.name()),
            Cell::from(provider.slug()),
            Cell::from(provider.description()),
            Cell::from(status).style(Style::default().fg(color)),
        ])
        .height(1)
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(3),
            Constraint::Length(12),
            Constraint::Length(10),
            Constraint::Min(20),
            Constraint::Length(10),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" Integrations "),
    )
    .highlight_style(
        Style::default()
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, chunks[0], &mut app.provider_state);

    let label = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);
    let ctx = app.session.context();
    let credential_line = match app.session.credentials() {
        Some(bundle) => Span::styled(
            format!("{} bundle ready", bundle.provider().name()),
            Style::default().fg(Color::Green),
        ),
        None => Span::styled("none", Style::default().fg(Color::DarkGray)),
    };

    let content = vec![
        Line::from(""),
        Line::from(vec![
            Span::styled("  User ID: ", label),
            Span::raw(ctx.user_id.clone()),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled("  Organization ID: ", label),
            Span::raw(ctx.org_id.clone()),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled("  Backend: ", label),
            Span::raw(app.backend_url.clone()),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled("  Date format: ", label),
            Span::raw(app.dates.pattern().to_string()),
        ]),
        Line::from(""),
        Line::from(vec![Span::styled("  Credentials: ", label), credential_line]),
        Line::from(""),
        Line::from("  ─────────────────────────────────────"),
        Line::from(""),
        Line::from(Span::styled(
            "  Enter select · Space connect · l load",
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
        )),
    ];

    let panel = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow))
            .title(" Connection "),
    );

    f.render_widget(panel, chunks[1]);
}

fn render_data(f: &mut Frame, area: Rect, app: &App) {
    let view = app.view();
    let lines = match &view {
        RenderView::Empty => empty_hint(app),
        other => data_lines(other, app.show_raw),
    };

    let paragraph = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .scroll((app.data_scroll, 0))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::White))
                .title(" Loaded Data "),
        );

    f.render_widget(paragraph, area);
}

fn empty_hint(app: &App) -> Vec<Line<'static>> {
    let hint = if app.session.provider().is_none() {
        "Select an integration on the Integrations page (1-3 or Enter)."
    } else if app.session.credentials().is_none() {
        "Press Space to connect the selected integration."
    } else if app.session.loader().is_loading() {
        "Loading..."
    } else {
        "Press l to load data."
    };

    vec![
        Line::from(""),
        Line::from(Span::styled(
            format!("  {}", hint),
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
        )),
    ]
}

fn category_color(index: usize) -> Color {
    match index {
        0 => Color::Blue,
        1 => Color::Magenta,
        2 => Color::Green,
        _ => Color::White,
    }
}

/// Lines for a grouped or raw view
pub fn data_lines(view: &RenderView, show_raw: bool) -> Vec<Line<'static>> {
    match view {
        RenderView::Empty => Vec::new(),
        RenderView::Grouped(grouped) => grouped_lines(grouped, show_raw),
        RenderView::Raw(raw) => {
            let mut lines = vec![Line::from(Span::styled(
                "Loaded Data:",
                Style::default().add_modifier(Modifier::BOLD),
            ))];
            lines.extend(raw_lines(raw));
            lines
        }
    }
}

fn grouped_lines(view: &GroupedView, show_raw: bool) -> Vec<Line<'static>> {
    let mut lines = vec![
        Line::from(Span::styled(
            format!("📊 {}", view.title),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
    ];

    let mut totals = vec![];
    for (i, total) in view.totals.iter().enumerate() {
        if i > 0 {
            totals.push(Span::raw("  │  "));
        }
        totals.push(Span::styled(
            format!("{}", total.count),
            Style::default()
                .fg(category_color(i))
                .add_modifier(Modifier::BOLD),
        ));
        totals.push(Span::raw(format!(" {}", total.category.label)));
    }
    lines.push(Line::from(totals));

    for section in &view.sections {
        let color = view
            .totals
            .iter()
            .position(|t| t.category == section.category)
            .map(category_color)
            .unwrap_or(Color::White);

        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!("{} ({})", section.category.label, section.count()),
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )));

        for entry in &section.entries {
            lines.push(Line::from(vec![
                Span::raw("  "),
                Span::styled(
                    format!("[{}]", section.category.badge),
                    Style::default().fg(color),
                ),
                Span::raw(" "),
                Span::styled(entry.name.clone(), Style::default().add_modifier(Modifier::BOLD)),
            ]));
            lines.push(Line::from(Span::styled(
                format!("      ID: {}", entry.id),
                Style::default().fg(Color::DarkGray),
            )));
            if let Some(created) = &entry.created {
                lines.push(Line::from(Span::styled(
                    format!("      Created: {}", created),
                    Style::default().fg(Color::DarkGray),
                )));
            }
            if let Some(url) = &entry.url {
                lines.push(Line::from(Span::styled(
                    format!("      {} → {}", view.link_label, url),
                    Style::default()
                        .fg(Color::Cyan)
                        .add_modifier(Modifier::UNDERLINED),
                )));
            }
        }
    }

    lines.push(Line::from(""));
    lines.push(Line::from("─────────────────────────────────────"));

    let expanded = show_raw || !view.raw.collapsed;
    let marker = if expanded { "▾" } else { "▸" };
    lines.push(Line::from(Span::styled(
        format!("{} 📄 View Raw JSON Data (r)", marker),
        Style::default().add_modifier(Modifier::BOLD),
    )));
    if expanded {
        lines.extend(raw_lines(&view.raw));
    }

    lines
}

fn raw_lines(raw: &RawView) -> Vec<Line<'static>> {
    raw.text
        .lines()
        .map(|l| Line::from(Span::styled(l.to_string(), Style::default().fg(Color::Gray))))
        .collect()
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let mut status_spans = vec![];

    if let Some(notice) = &app.notice {
        status_spans.push(Span::styled(
            format!(" ⚠ {} ", notice),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        ));
        status_spans.push(Span::raw("|"));
    }

    let key = Style::default().fg(Color::Yellow);
    let disabled = Style::default().fg(Color::DarkGray);

    status_spans.push(Span::raw(" "));
    status_spans.push(Span::styled("1-3/Enter", key));
    status_spans.push(Span::raw(" Select | "));
    status_spans.push(Span::styled("Space", key));
    status_spans.push(Span::raw(" Connect | "));

    let load_label = if app.session.loader().is_loading() {
        " Loading... | "
    } else {
        " Load Data | "
    };
    status_spans.push(Span::styled(
        "l",
        if app.session.can_load() { key } else { disabled },
    ));
    status_spans.push(Span::raw(load_label));

    if app.session.payload().is_some() {
        status_spans.push(Span::styled("c", key));
        status_spans.push(Span::raw(" Clear Data | "));
        status_spans.push(Span::styled("r", key));
        status_spans.push(Span::raw(" Raw | "));
    }

    status_spans.push(Span::styled("Tab", key));
    status_spans.push(Span::raw(" Page | "));
    status_spans.push(Span::styled("q", Style::default().fg(Color::Red)));
    status_spans.push(Span::raw(" Quit"));

    let status_bar = Paragraph::new(vec![Line::from(status_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );

    f.render_widget(status_bar, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::{ConnectContext, CredentialBundle};
    use crate::grouping::RenderView;
    use crate::record::Payload;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedBackend {
        calls: AtomicUsize,
        body: Value,
    }

    #[async_trait]
    impl Backend for FixedBackend {
        async fn load(&self, _provider: Provider, _bundle: &CredentialBundle) -> Result<Value, LoadError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.body.clone())
        }
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn app(rt: &tokio::runtime::Runtime, backend: Arc<FixedBackend>) -> App {
        let mut store = CredentialStore::new();
        store.insert(Provider::HubSpot, json!({"access_token": "tok"}));

        App::new(
            IntegrationSession::new(ConnectContext::new("TestUser", "TestOrg")),
            store,
            DateFormat::default(),
            "http://localhost:8000".to_string(),
            backend,
            rt.handle().clone(),
        )
    }

    fn wait_for_result(app: &mut App) {
        let (ticket, result) = app
            .runtime
            .clone()
            .block_on(app.results_rx.recv())
            .unwrap();
        app.apply_result(ticket, result);
    }

    #[test]
    fn test_number_keys_select_provider() {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let backend = Arc::new(FixedBackend { calls: AtomicUsize::new(0), body: json!([]) });
        let mut app = app(&rt, backend);

        app.handle_key(key(KeyCode::Char('3')));

        assert_eq!(app.session.provider(), Some(Provider::HubSpot));
        assert_eq!(app.highlighted_provider(), Some(Provider::HubSpot));
    }

    #[test]
    fn test_connect_without_credentials_sets_notice() {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let backend = Arc::new(FixedBackend { calls: AtomicUsize::new(0), body: json!([]) });
        let mut app = app(&rt, backend);

        app.handle_key(key(KeyCode::Char('1')));
        app.handle_key(key(KeyCode::Char(' ')));

        assert!(app.session.credentials().is_none());
        assert_eq!(app.notice.as_deref(), Some("no credentials configured for Notion"));
    }

    #[test]
    fn test_load_key_sends_one_request() {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let backend = Arc::new(FixedBackend {
            calls: AtomicUsize::new(0),
            body: json!([{"id": "1", "name": "Acme", "type": "company"}]),
        });
        let mut app = app(&rt, Arc::clone(&backend));

        app.handle_key(key(KeyCode::Char('l')));
        assert!(!app.session.loader().is_loading());

        app.handle_key(key(KeyCode::Char('3')));
        app.handle_key(key(KeyCode::Char(' ')));
        app.handle_key(key(KeyCode::Char('l')));
        app.handle_key(key(KeyCode::Char('l')));
        assert_eq!(app.current_page, Page::Data);

        wait_for_result(&mut app);

        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
        assert!(matches!(app.view(), RenderView::Grouped(_)));
    }

    #[test]
    fn test_grouped_lines_hide_raw_until_toggled() {
        let payload = Payload::from_value(json!([{"id": "1", "name": "Acme", "type": "company"}]));
        let view = render_view(Some(&payload), Some(Provider::HubSpot), &DateFormat::default());

        let collapsed = data_lines(&view, false);
        let expanded = data_lines(&view, true);

        assert!(expanded.len() > collapsed.len());
    }
}
