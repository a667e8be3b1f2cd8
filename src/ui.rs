use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use labor_dashboard::engine::{BarGroup as ChartGroup, DetailView, Overview, Point, ShareSlice};
use labor_dashboard::stats::fmt2;
use labor_dashboard::{
    BoxSummary, Chart, Indicator, Section, Selection, Session, ViewModel, YearRange,
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{
        block::{Position, Title},
        Axis, Bar, BarChart, BarGroup, Block, Borders, Cell, Chart as ChartWidget, Dataset,
        GraphType, List, ListItem, ListState, Paragraph, Row, Table, TableState, Tabs, Wrap,
    },
    Frame, Terminal,
};
use std::io;
use std::path::PathBuf;

const PALETTE: [Color; 6] = [
    Color::Cyan,
    Color::Yellow,
    Color::Green,
    Color::Magenta,
    Color::LightRed,
    Color::LightBlue,
];

const CHOOSE: &str = "Choose an option";

/// Overview tabs: About first, then one per section.
const OVERVIEW_TABS: usize = Section::ALL.len() + 1;

const ABOUT: &str = "This dashboard was developed to provide policymakers, researchers, and \
students with an interactive way to explore Sri Lanka's labor market and social protection \
landscape using curated indicators from the World Bank.";

const ABOUT_USAGE: &str = "Filter by theme, choose specific indicators, adjust year ranges and \
switch chart types (line, bar, scatter, box). Each indicator comes with summary statistics and \
its filtered rows can be exported as CSV for further analysis.";

const INSIGHTS: [&str; 4] = [
    "Labor force participation has stayed above 50% since 2000, while unemployment fluctuates.",
    "Employment has shifted from agriculture towards services, a sign of structural transformation.",
    "Social protection coverage is consistently higher in urban areas than in rural areas.",
    "Social protection measurably reduces poverty headcounts and income inequality.",
];

const DATA_SOURCE: &str = "Data Source: World Bank via Humanitarian Data Exchange (HDX)";

/// Sidebar control that receives ↑/↓.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Section,
    Indicator,
    Chart,
    Years,
}

impl Focus {
    pub fn next(&self) -> Self {
        match self {
            Focus::Section => Focus::Indicator,
            Focus::Indicator => Focus::Chart,
            Focus::Chart => Focus::Years,
            Focus::Years => Focus::Section,
        }
    }

    pub fn previous(&self) -> Self {
        match self {
            Focus::Section => Focus::Years,
            Focus::Indicator => Focus::Section,
            Focus::Chart => Focus::Indicator,
            Focus::Years => Focus::Chart,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Focus::Section => " Select Section ",
            Focus::Indicator => " Select Indicator ",
            Focus::Chart => " Chart Type ",
            Focus::Years => " Year Range ",
        }
    }
}

pub struct App {
    session: Session,
    pub selection: Selection,
    pub view: ViewModel,
    pub focus: Focus,
    /// 0 is "Choose an option", then `Section::ALL`
    pub section_state: ListState,
    /// 0 is "Choose an option", then the section's indicator options
    pub indicator_state: ListState,
    pub overview_tab: usize,
    pub rows_state: TableState,
    pub export_dir: PathBuf,
    pub status: Option<String>,
}

impl App {
    pub fn new(session: Session, export_dir: PathBuf) -> Self {
        let selection = Selection::new();
        let view = session.render(&selection);

        let mut section_state = ListState::default();
        section_state.select(Some(0));
        let mut indicator_state = ListState::default();
        indicator_state.select(Some(0));

        Self {
            session,
            selection,
            view,
            focus: Focus::Section,
            section_state,
            indicator_state,
            overview_tab: 0,
            rows_state: TableState::default(),
            export_dir,
            status: None,
        }
    }

    /// Recompute the whole view from the current selection.
    fn refresh(&mut self) {
        self.view = self.session.render(&self.selection);
        match &self.view {
            ViewModel::Detail(d) if !d.rows.is_empty() => self.rows_state.select(Some(0)),
            _ => self.rows_state.select(None),
        }
    }

    pub fn next_focus(&mut self) {
        self.focus = self.focus.next();
    }

    pub fn previous_focus(&mut self) {
        self.focus = self.focus.previous();
    }

    /// ↑/↓ on the focused control.
    pub fn step(&mut self, delta: i32) {
        match self.focus {
            Focus::Section => self.step_section(delta),
            Focus::Indicator => self.step_indicator(delta),
            Focus::Chart => self.cycle_chart(),
            Focus::Years => self.adjust_years(0, delta),
        }
    }

    fn step_section(&mut self, delta: i32) {
        let len = Section::ALL.len() + 1;
        let idx = wrap(self.section_state.selected().unwrap_or(0), delta, len);
        self.section_state.select(Some(idx));

        let section = idx.checked_sub(1).map(|i| Section::ALL[i]);
        self.selection = self.selection.with_section(section);
        self.indicator_state.select(Some(0));
        if let Some(s) = section {
            self.overview_tab = idx;
            self.status = Some(format!("Section: {}", s.title()));
        }
        self.refresh();
    }

    fn step_indicator(&mut self, delta: i32) {
        let options = self.selection.indicator_options();
        if options.is_empty() {
            self.status = Some("Select a section first".to_string());
            return;
        }
        let idx = wrap(self.indicator_state.selected().unwrap_or(0), delta, options.len() + 1);
        self.indicator_state.select(Some(idx));

        let indicator = idx.checked_sub(1).map(|i| options[i]);
        match self.selection.with_indicator(indicator) {
            Ok(selection) => {
                self.selection = selection;
                self.status = None;
            }
            Err(e) => self.status = Some(e.to_string()),
        }
        self.refresh();
    }

    pub fn cycle_chart(&mut self) {
        let kinds = self.session.options().chart_kinds;
        self.selection = self.selection.with_chart(kinds.cycle(self.selection.chart));
        self.refresh();
    }

    /// Move the range ends by the given deltas, staying inside the
    /// indicator's observed years.
    pub fn adjust_years(&mut self, start_delta: i32, end_delta: i32) {
        let ViewModel::Detail(detail) = &self.view else {
            self.status = Some("Year range applies to a selected indicator".to_string());
            return;
        };
        let (range, bounds) = (detail.range, detail.bounds);
        let start = (range.start + start_delta).clamp(bounds.start, bounds.end);
        let end = (range.end + end_delta).clamp(bounds.start, bounds.end);

        match YearRange::new(start, end) {
            Ok(years) => {
                self.selection = self.selection.with_years(Some(years));
                self.status = None;
                self.refresh();
            }
            Err(e) => self.status = Some(e.to_string()),
        }
    }

    pub fn next_tab(&mut self) {
        self.overview_tab = (self.overview_tab + 1) % OVERVIEW_TABS;
    }

    pub fn previous_tab(&mut self) {
        self.overview_tab = (self.overview_tab + OVERVIEW_TABS - 1) % OVERVIEW_TABS;
    }

    /// Back to the overview with nothing selected.
    pub fn reset(&mut self) {
        self.selection = Selection::new();
        self.section_state.select(Some(0));
        self.indicator_state.select(Some(0));
        self.status = Some("Selection cleared".to_string());
        self.refresh();
    }

    pub fn export(&mut self) {
        let ViewModel::Detail(detail) = &self.view else {
            self.status = Some("Select an indicator to export its rows".to_string());
            return;
        };
        let written = detail.export().and_then(|file| file.write_into(&self.export_dir));
        self.status = Some(match written {
            Ok(path) => format!("Exported {} rows to {}", detail.rows.len(), path.display()),
            Err(e) => format!("Export failed: {}", e),
        });
    }

    pub fn scroll_rows(&mut self, delta: i32) {
        let ViewModel::Detail(detail) = &self.view else {
            return;
        };
        let len = detail.rows.len();
        if len == 0 {
            return;
        }
        let current = self.rows_state.selected().unwrap_or(0) as i64;
        let next = (current + delta as i64).clamp(0, len as i64 - 1);
        self.rows_state.select(Some(next as usize));
    }
}

fn wrap(current: usize, delta: i32, len: usize) -> usize {
    (current as i64 + delta as i64).rem_euclid(len as i64) as usize
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
        println!("Error: {:?}", err);
    }

    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            match key.code {
                KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                KeyCode::Tab => app.next_focus(),
                KeyCode::BackTab => app.previous_focus(),
                KeyCode::Down | KeyCode::Char('j') => app.step(1),
                KeyCode::Up | KeyCode::Char('k') => app.step(-1),
                KeyCode::Left | KeyCode::Right => {
                    let delta = if key.code == KeyCode::Left { -1 } else { 1 };
                    let overview = matches!(app.view, ViewModel::Overview(_));
                    if overview && app.focus != Focus::Years {
                        if delta < 0 {
                            app.previous_tab();
                        } else {
                            app.next_tab();
                        }
                    } else if key.modifiers.contains(KeyModifiers::SHIFT) {
                        app.adjust_years(0, delta);
                    } else {
                        app.adjust_years(delta, 0);
                    }
                }
                KeyCode::Char(c @ '0'..='4') => {
                    app.overview_tab = c as usize - '0' as usize;
                }
                KeyCode::Char('c') => app.cycle_chart(),
                KeyCode::Char('r') => app.reset(),
                KeyCode::Char('e') => app.export(),
                KeyCode::PageDown => app.scroll_rows(10),
                KeyCode::PageUp => app.scroll_rows(-10),
                _ => {}
            }
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Sidebar + content
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(38), Constraint::Min(0)])
        .split(chunks[1]);

    render_sidebar(f, body[0], app);

    match &app.view {
        ViewModel::Overview(overview) => render_overview(f, body[1], overview, app.overview_tab),
        ViewModel::Detail(detail) => render_detail(f, body[1], detail, &mut app.rows_state),
        ViewModel::NoData(no_data) => {
            let message = Paragraph::new(vec![
                Line::from(""),
                Line::from(Span::styled(
                    format!("  {}", no_data.message),
                    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
                )),
            ])
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Yellow))
                    .title(format!(" {} ", no_data.section.title())),
            );
            f.render_widget(message, body[1]);
        }
    }

    render_status_bar(f, chunks[2], app);
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let mode = match &app.view {
        ViewModel::Overview(_) => "Overview".to_string(),
        ViewModel::Detail(d) => format!("Detail · {}-{}", d.range.start, d.range.end),
        ViewModel::NoData(_) => "No data".to_string(),
    };

    let header = Paragraph::new(Line::from(vec![
        Span::styled(
            "Sri Lanka Labor & Social Protection Indicators Dashboard",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Span::raw("  |  "),
        Span::styled(mode, Style::default().fg(Color::Yellow)),
        Span::raw("  |  "),
        Span::styled(
            format!("{} observations", app.session.table().len()),
            Style::default().fg(Color::White),
        ),
    ]))
    .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::Cyan)));

    f.render_widget(header, area);
}

fn focus_block(app: &App, focus: Focus) -> Block<'static> {
    let color = if app.focus == focus { Color::Yellow } else { Color::DarkGray };
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(color))
        .title(focus.title().to_string())
}

fn render_sidebar(f: &mut Frame, area: Rect, app: &mut App) {
    let options = app.selection.indicator_options();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(Section::ALL.len() as u16 + 3),
            Constraint::Min(5),
            Constraint::Length(app.session.options().chart_kinds.offered().len() as u16 + 2),
            Constraint::Length(4),
        ])
        .split(area);

    let highlight = Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD);

    let sections: Vec<ListItem> = std::iter::once(CHOOSE)
        .chain(Section::ALL.iter().map(|s| s.title()))
        .map(ListItem::new)
        .collect();
    let sections = List::new(sections)
        .block(focus_block(app, Focus::Section))
        .highlight_style(highlight)
        .highlight_symbol("→ ");
    f.render_stateful_widget(sections, chunks[0], &mut app.section_state);

    let width = chunks[1].width.saturating_sub(5) as usize;
    let indicators: Vec<ListItem> = std::iter::once(CHOOSE.to_string())
        .chain(options.iter().map(|i| truncate(i.name(), width)))
        .map(ListItem::new)
        .collect();
    let indicators = List::new(indicators)
        .block(focus_block(app, Focus::Indicator))
        .highlight_style(highlight)
        .highlight_symbol("→ ");
    f.render_stateful_widget(indicators, chunks[1], &mut app.indicator_state);

    let current = app.session.options().chart_kinds.resolve(app.selection.chart);
    let kinds: Vec<Line> = app
        .session
        .options()
        .chart_kinds
        .offered()
        .iter()
        .map(|kind| {
            if *kind == current {
                Line::from(Span::styled(
                    format!("(•) {}", kind.label()),
                    Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
                ))
            } else {
                Line::from(format!("( ) {}", kind.label()))
            }
        })
        .collect();
    f.render_widget(Paragraph::new(kinds).block(focus_block(app, Focus::Chart)), chunks[2]);

    let years = match &app.view {
        ViewModel::Detail(d) => vec![
            Line::from(Span::styled(
                format!("{} ◀──▶ {}", d.range.start, d.range.end),
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(
                format!(
                    "{} of {} observed years ({}-{})",
                    d.range.span(),
                    d.bounds.span(),
                    d.bounds.start,
                    d.bounds.end
                ),
                Style::default().fg(Color::DarkGray),
            )),
        ],
        _ => vec![Line::from(Span::styled(
            "select an indicator",
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        ))],
    };
    f.render_widget(Paragraph::new(years).block(focus_block(app, Focus::Years)), chunks[3]);
}

// ============================================================================
// OVERVIEW
// ============================================================================

fn render_overview(f: &mut Frame, area: Rect, overview: &Overview, tab: usize) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)])
        .split(area);

    let titles: Vec<String> = std::iter::once("0 About".to_string())
        .chain(
            overview
                .panels
                .iter()
                .enumerate()
                .map(|(i, p)| format!("{} {}", i + 1, p.title)),
        )
        .collect();
    let tabs = Tabs::new(titles)
        .block(Block::default().borders(Borders::ALL).title(" Overview "))
        .select(tab)
        .highlight_style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
        );
    f.render_widget(tabs, chunks[0]);

    let Some(panel) = tab.checked_sub(1).and_then(|i| overview.panels.get(i)) else {
        render_about(f, chunks[1]);
        return;
    };
    if panel.charts.is_empty() {
        return;
    }

    let constraints: Vec<Constraint> = panel
        .charts
        .iter()
        .map(|_| Constraint::Ratio(1, panel.charts.len() as u32))
        .collect();
    let slots = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(chunks[1]);

    for (chart, slot) in panel.charts.iter().zip(slots.iter()) {
        render_chart(f, *slot, chart);
    }
}

fn render_about(f: &mut Frame, area: Rect) {
    let heading = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);

    let mut lines = vec![
        Line::from(Span::styled("About This Dashboard", heading)),
        Line::from(""),
        Line::from(ABOUT),
        Line::from(""),
    ];
    lines.extend(Section::ALL.iter().map(|s| Line::from(format!("  • {}", s.title()))));
    lines.push(Line::from(""));
    lines.push(Line::from(ABOUT_USAGE));
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled("Summary Insights", heading)));
    lines.push(Line::from(""));
    lines.extend(
        INSIGHTS
            .iter()
            .enumerate()
            .map(|(i, insight)| Line::from(format!("  {}. {}", i + 1, insight))),
    );

    let about = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::White)),
        )
        .wrap(Wrap { trim: false });
    f.render_widget(about, area);
}

// ============================================================================
// DETAIL
// ============================================================================

fn render_detail(f: &mut Frame, area: Rect, detail: &DetailView, rows_state: &mut TableState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),  // Title + description
            Constraint::Min(10),    // Chart
            Constraint::Length(3),  // Metrics
            Constraint::Length(10), // Data preview
        ])
        .split(area);

    let heading = Paragraph::new(vec![Line::from(Span::styled(
        detail.description,
        Style::default().fg(Color::Gray).add_modifier(Modifier::ITALIC),
    ))])
    .wrap(Wrap { trim: true })
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(format!(" {} ", detail.title)),
    );
    f.render_widget(heading, chunks[0]);

    render_chart(f, chunks[1], &detail.chart);
    render_metrics(f, chunks[2], detail);
    render_rows(f, chunks[3], detail, rows_state);
}

fn render_metrics(f: &mut Frame, area: Rect, detail: &DetailView) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
        ])
        .split(area);

    let metrics = [
        ("Average", detail.stats.mean_display()),
        ("Max", detail.stats.max_display()),
        ("Min", detail.stats.min_display()),
    ];
    for ((label, value), col) in metrics.into_iter().zip(cols.iter()) {
        let metric = Paragraph::new(Span::styled(
            value,
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        ))
        .block(Block::default().borders(Borders::ALL).title(format!(" {} ", label)));
        f.render_widget(metric, *col);
    }
}

fn render_rows(f: &mut Frame, area: Rect, detail: &DetailView, state: &mut TableState) {
    let header_cells = detail.columns.iter().map(|h| {
        Cell::from(h.clone()).style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
    });
    let header = Row::new(header_cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1);

    let rows = detail.rows.iter().map(|r| {
        let cells = r.fields(&detail.columns).into_iter().map(|v| Cell::from(truncate(&v, 60)));
        Row::new(cells).height(1)
    });

    let widths: Vec<Constraint> = detail
        .columns
        .iter()
        .map(|c| match c.as_str() {
            "Year" => Constraint::Length(6),
            "Value" => Constraint::Length(14),
            _ => Constraint::Min(12),
        })
        .collect();

    let table = Table::new(rows, widths)
        .header(header)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::White))
                .title(format!(" Data Preview · {} rows ", detail.rows.len())),
        )
        .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
        .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, state);
}

// ============================================================================
// CHARTS
// ============================================================================

fn render_chart(f: &mut Frame, area: Rect, chart: &Chart) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::White))
        .title(format!(" {} ", chart.title()));

    match chart {
        Chart::Line { series, markers, .. } => {
            let lines: Vec<(String, Vec<(f64, f64)>)> = series
                .iter()
                .map(|s| (s.label.to_string(), plotted(&s.points)))
                .collect();
            let marker = if *markers { symbols::Marker::Dot } else { symbols::Marker::Braille };
            render_xy(f, area, block, &lines, GraphType::Line, marker, chart.axis_titles());
        }
        Chart::Scatter { points, .. } => {
            let dots = vec![("Value".to_string(), plotted(points))];
            render_xy(f, area, block, &dots, GraphType::Scatter, symbols::Marker::Dot, chart.axis_titles());
        }
        Chart::Bar { bars, .. } => render_bars(f, area, block, bars),
        Chart::GroupedBar { groups, .. } => render_grouped_bars(f, area, block, groups),
        Chart::Share { slices, .. } => render_share(f, area, block, slices),
        Chart::Box { summary, points, .. } => render_box(f, area, block, summary.as_ref(), points.len()),
    }
}

/// Observed points only; gaps are left out of the drawing.
fn plotted(points: &[Point]) -> Vec<(f64, f64)> {
    points
        .iter()
        .filter_map(|p| p.value.map(|v| (p.year as f64, v)))
        .collect()
}

fn render_xy(
    f: &mut Frame,
    area: Rect,
    block: Block,
    series: &[(String, Vec<(f64, f64)>)],
    graph_type: GraphType,
    marker: symbols::Marker,
    (x_title, y_title): (Option<&str>, &str),
) {
    if series.iter().all(|(_, data)| data.is_empty()) {
        f.render_widget(empty_chart(block), area);
        return;
    }

    let (x_bounds, y_bounds) = xy_bounds(series.iter().flat_map(|(_, data)| data.iter()));

    let datasets: Vec<Dataset> = series
        .iter()
        .enumerate()
        .map(|(i, (name, data))| {
            Dataset::default()
                .name(truncate(name, 48))
                .marker(marker)
                .graph_type(graph_type)
                .style(Style::default().fg(PALETTE[i % PALETTE.len()]))
                .data(data)
        })
        .collect();

    let chart = ChartWidget::new(datasets)
        .block(block)
        .x_axis(
            Axis::default()
                .title(x_title.unwrap_or_default())
                .style(Style::default().fg(Color::Gray))
                .bounds(x_bounds)
                .labels(axis_labels(x_bounds, 0)),
        )
        .y_axis(
            Axis::default()
                .title(y_title)
                .style(Style::default().fg(Color::Gray))
                .bounds(y_bounds)
                .labels(axis_labels(y_bounds, 1)),
        );

    f.render_widget(chart, area);
}

fn xy_bounds<'a>(points: impl Iterator<Item = &'a (f64, f64)>) -> ([f64; 2], [f64; 2]) {
    let mut x = [f64::INFINITY, f64::NEG_INFINITY];
    let mut y = [f64::INFINITY, f64::NEG_INFINITY];
    for (px, py) in points {
        x = [x[0].min(*px), x[1].max(*px)];
        y = [y[0].min(*py), y[1].max(*py)];
    }
    if x[0] == x[1] {
        x = [x[0] - 1.0, x[1] + 1.0];
    }
    let pad = ((y[1] - y[0]) * 0.05).max(0.5);
    ([x[0], x[1]], [y[0] - pad, y[1] + pad])
}

fn axis_labels(bounds: [f64; 2], decimals: usize) -> Vec<Span<'static>> {
    let mid = (bounds[0] + bounds[1]) / 2.0;
    [bounds[0], mid, bounds[1]]
        .iter()
        .map(|v| Span::raw(format!("{:.*}", decimals, v)))
        .collect()
}

/// Bar heights in hundredths, so two decimals survive the u64 scale.
fn bar_height(value: f64) -> u64 {
    (value.max(0.0) * 100.0).round() as u64
}

fn render_bars(f: &mut Frame, area: Rect, block: Block, points: &[Point]) {
    let bars: Vec<Bar> = points
        .iter()
        .filter_map(|p| {
            p.value.map(|v| {
                Bar::default()
                    .value(bar_height(v))
                    .text_value(format!("{:.1}", v))
                    .label(Line::from(p.year.to_string()))
                    .style(Style::default().fg(Color::Cyan))
            })
        })
        .collect();
    if bars.is_empty() {
        f.render_widget(empty_chart(block), area);
        return;
    }

    let chart = BarChart::default()
        .block(block)
        .bar_width(5)
        .bar_gap(1)
        .value_style(Style::default().fg(Color::Black).bg(Color::Cyan))
        .data(BarGroup::default().bars(&bars));
    f.render_widget(chart, area);
}

fn render_grouped_bars(f: &mut Frame, area: Rect, block: Block, groups: &[ChartGroup]) {
    // Colour by first-seen indicator so a series keeps its colour across years
    let mut order: Vec<Indicator> = Vec::new();
    for group in groups {
        for (indicator, _) in &group.bars {
            if !order.contains(indicator) {
                order.push(*indicator);
            }
        }
    }
    let color_of = |ind: &Indicator| {
        let i = order.iter().position(|o| o == ind).unwrap_or(0);
        PALETTE[i % PALETTE.len()]
    };

    if groups.is_empty() {
        f.render_widget(empty_chart(block), area);
        return;
    }

    let legend: Vec<Span> = order
        .iter()
        .flat_map(|ind| {
            [
                Span::styled(" ■ ", Style::default().fg(color_of(ind))),
                Span::raw(short_label(*ind)),
            ]
        })
        .collect();

    let mut chart = BarChart::default()
        .block(block.title(Title::from(Line::from(legend)).position(Position::Bottom)))
        .bar_width(4)
        .bar_gap(0)
        .group_gap(2);

    for group in groups {
        let bars: Vec<Bar> = group
            .bars
            .iter()
            .filter_map(|(ind, value)| {
                value.map(|v| {
                    Bar::default()
                        .value(bar_height(v))
                        .text_value(format!("{:.0}", v))
                        .style(Style::default().fg(color_of(ind)))
                })
            })
            .collect();
        chart = chart.data(
            BarGroup::default()
                .label(Line::from(group.year.to_string()))
                .bars(&bars),
        );
    }

    f.render_widget(chart, area);
}

/// Proportions as horizontal bars, one line per slice.
fn render_share(f: &mut Frame, area: Rect, block: Block, slices: &[ShareSlice]) {
    if slices.is_empty() {
        f.render_widget(empty_chart(block), area);
        return;
    }

    let width = area.width.saturating_sub(24) as usize;
    let mut lines = vec![Line::from("")];
    for (i, slice) in slices.iter().enumerate() {
        let color = PALETTE[i % PALETTE.len()];
        let share = slice.share.unwrap_or(0.0);
        let filled = (share * width as f64).round() as usize;
        lines.push(Line::from(Span::styled(
            format!("  {}", slice.label),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        )));
        lines.push(Line::from(vec![
            Span::styled(format!("  {}", "█".repeat(filled)), Style::default().fg(color)),
            Span::raw(format!(
                " {:.1}%  (mean {})",
                share * 100.0,
                fmt2(slice.mean)
            )),
        ]));
    }

    f.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_box(f: &mut Frame, area: Rect, block: Block, summary: Option<&BoxSummary>, count: usize) {
    let Some(summary) = summary else {
        f.render_widget(empty_chart(block), area);
        return;
    };

    let label = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);
    let row = |name: &'static str, value: f64| {
        Line::from(vec![
            Span::styled(format!("  {:<15}", name), label),
            Span::raw(format!("{:.2}", value)),
        ])
    };

    let outliers = if summary.outliers.is_empty() {
        "none".to_string()
    } else {
        summary
            .outliers
            .iter()
            .map(|v| format!("{:.2}", v))
            .collect::<Vec<_>>()
            .join(", ")
    };

    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            format!("  {}", box_strip(summary, area.width.saturating_sub(6) as usize)),
            Style::default().fg(Color::Yellow),
        )),
        Line::from(""),
        row("Upper whisker", summary.upper_whisker),
        row("Q3", summary.q3),
        row("Median", summary.median),
        row("Q1", summary.q1),
        row("Lower whisker", summary.lower_whisker),
        Line::from(vec![
            Span::styled(format!("  {:<15}", "Outliers"), label),
            Span::raw(outliers),
        ]),
        Line::from(vec![
            Span::styled(format!("  {:<15}", "Values"), label),
            Span::raw(count.to_string()),
        ]),
    ];

    f.render_widget(Paragraph::new(lines).block(block), area);
}

/// One-line `├───[══│══]───┤` drawing scaled between the whiskers.
fn box_strip(summary: &BoxSummary, width: usize) -> String {
    let width = width.max(10);
    let (lo, hi) = (summary.lower_whisker, summary.upper_whisker);
    let span = hi - lo;
    let pos = |v: f64| {
        if span <= 0.0 {
            width / 2
        } else {
            (((v - lo) / span) * (width - 1) as f64).round() as usize
        }
    };
    let (q1, median, q3) = (pos(summary.q1), pos(summary.median), pos(summary.q3));

    (0..width)
        .map(|i| match i {
            _ if i == median => '│',
            _ if i == q1 => '[',
            _ if i == q3 => ']',
            0 => '├',
            _ if i == width - 1 => '┤',
            _ if i > q1 && i < q3 => '═',
            _ => '─',
        })
        .collect()
}

fn empty_chart(block: Block) -> Paragraph {
    Paragraph::new(Span::styled(
        "  No observations to plot",
        Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
    ))
    .block(block)
}

fn short_label(indicator: Indicator) -> String {
    match indicator {
        Indicator::CoverageRural => "Rural".to_string(),
        Indicator::CoverageUrban => "Urban".to_string(),
        other => truncate(other.name(), 24),
    }
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let mut status_spans = vec![Span::styled(
        format!(" Chart: {} ", chart_kind_label(app)),
        Style::default().fg(Color::Cyan),
    )];

    if let Some(message) = &app.status {
        status_spans.push(Span::raw(" | "));
        status_spans.push(Span::styled(message.clone(), Style::default().fg(Color::Green)));
    }

    let hints: [(&str, &str); 7] = [
        ("Tab", " Focus"),
        ("↑/↓", " Change"),
        ("←/→", " Years/Tab"),
        ("c", " Chart"),
        ("e", " Export"),
        ("r", " Reset"),
        ("q", " Quit"),
    ];
    for (key, action) in hints {
        status_spans.push(Span::raw(" | "));
        let color = if key == "q" { Color::Red } else { Color::Yellow };
        status_spans.push(Span::styled(key, Style::default().fg(color)));
        status_spans.push(Span::raw(action));
    }

    let status_bar = Paragraph::new(Line::from(status_spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(
                Title::from(Span::styled(
                    format!(" 📊 {} ", DATA_SOURCE),
                    Style::default().fg(Color::DarkGray),
                ))
                .position(Position::Bottom)
                .alignment(Alignment::Right),
            ),
    );

    f.render_widget(status_bar, area);
}

fn chart_kind_label(app: &App) -> &'static str {
    match &app.view {
        ViewModel::Detail(d) => d.chart_kind.label(),
        _ => app.session.options().chart_kinds.resolve(app.selection.chart).label(),
    }
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
