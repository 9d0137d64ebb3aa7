use anyhow::Result;
use county_market_map::choropleth::tooltip_rows;
use county_market_map::filter::{StateFilter, PROPERTY_TYPES};
use county_market_map::{Dashboard, DashboardView, FilterSelection, JoinedRecord, Metric};
use crossterm::{
    event::{self, Event, KeyCode},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame, Terminal,
};
use std::io;

pub struct App<'a> {
    pub dashboard: &'a Dashboard,
    pub selection: FilterSelection,
    pub view: DashboardView<'a>,
    /// Indices into `view.rows`, highest metric first
    pub order: Vec<usize>,
    pub state: TableState,
    pub show_detail: bool,
}

impl<'a> App<'a> {
    pub fn new(dashboard: &'a Dashboard) -> Self {
        let selection = dashboard.default_selection();
        let view = dashboard.view(&selection);
        let mut app = Self {
            dashboard,
            selection,
            view,
            order: Vec::new(),
            state: TableState::default(),
            show_detail: false,
        };
        app.refresh();
        app
    }

    /// Re-run filter + render for the current selection.
    pub fn refresh(&mut self) {
        self.view = self.dashboard.view(&self.selection);

        let metric = self.selection.metric;
        let mut order: Vec<usize> = (0..self.view.rows.len()).collect();
        order.sort_by(|a, b| {
            let va = self.view.rows[*a].metric(metric);
            let vb = self.view.rows[*b].metric(metric);
            match (va, vb) {
                (Some(x), Some(y)) => y.total_cmp(&x),
                (Some(_), None) => std::cmp::Ordering::Less,
                (None, Some(_)) => std::cmp::Ordering::Greater,
                (None, None) => std::cmp::Ordering::Equal,
            }
        });
        self.order = order;

        if self.order.is_empty() {
            self.state.select(None);
        } else {
            self.state.select(Some(0));
        }
    }

    pub fn selected_row(&self) -> Option<&JoinedRecord> {
        self.state
            .selected()
            .and_then(|i| self.order.get(i))
            .map(|idx| self.view.rows[*idx])
    }

    pub fn toggle_detail(&mut self) {
        self.show_detail = !self.show_detail;
    }

    pub fn shift_period(&mut self, older: bool) {
        let periods = &self.dashboard.options().periods;
        if periods.is_empty() {
            return;
        }
        let current = periods
            .iter()
            .position(|p| *p == self.selection.period)
            .unwrap_or(0);
        let next = if older {
            (current + 1).min(periods.len() - 1)
        } else {
            current.saturating_sub(1)
        };
        self.selection.period = periods[next];
        self.refresh();
    }

    pub fn next_property_type(&mut self) {
        let current = PROPERTY_TYPES
            .iter()
            .position(|p| *p == self.selection.property_type)
            .unwrap_or(0);
        self.selection.property_type = PROPERTY_TYPES[(current + 1) % PROPERTY_TYPES.len()].to_string();
        self.refresh();
    }

    pub fn next_metric(&mut self) {
        self.selection.metric = self.selection.metric.next();
        self.refresh();
    }

    pub fn cycle_state(&mut self, backwards: bool) {
        let states = &self.dashboard.options().states;
        if states.is_empty() {
            return;
        }
        let current = states
            .iter()
            .position(|s| s == self.selection.state.label())
            .unwrap_or(0);
        let next = if backwards {
            (current + states.len() - 1) % states.len()
        } else {
            (current + 1) % states.len()
        };
        self.selection.state = StateFilter::parse(&states[next]);
        self.refresh();
    }

    pub fn adjust_threshold(&mut self, delta: i64) {
        let options = self.dashboard.options();
        let value = (self.selection.min_homes_sold as i64 + delta)
            .clamp(options.min_homes_sold as i64, options.max_homes_sold as i64);
        self.selection.min_homes_sold = value as u32;
        self.refresh();
    }

    pub fn next(&mut self) {
        let len = self.order.len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(i) if i >= len - 1 => 0,
            Some(i) => i + 1,
            None => 0,
        };
        self.state.select(Some(i));
    }

    pub fn previous(&mut self) {
        let len = self.order.len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        self.state.select(Some(i));
    }
}

/// "#78c679" → Rgb; anything else (e.g. the "white" no-data fill) → White
fn fill_color(fill: &str) -> Color {
    let hex = match fill.strip_prefix('#') {
        Some(hex) if hex.len() == 6 => hex,
        _ => return Color::White,
    };
    let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&hex[range], 16).ok();
    match (channel(0..2), channel(2..4), channel(4..6)) {
        (Some(r), Some(g), Some(b)) => Color::Rgb(r, g, b),
        _ => Color::White,
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
        println!("Error: {:?}", err);
    }

    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(terminal: &mut Terminal<B>, app: &mut App) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            match key.code {
                KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                KeyCode::Enter => app.toggle_detail(),
                KeyCode::Left => app.shift_period(true),
                KeyCode::Right => app.shift_period(false),
                KeyCode::Char('p') => app.next_property_type(),
                KeyCode::Char('m') => app.next_metric(),
                KeyCode::Char('s') => app.cycle_state(false),
                KeyCode::Char('S') => app.cycle_state(true),
                KeyCode::Char('+') => app.adjust_threshold(1),
                KeyCode::Char('-') => app.adjust_threshold(-1),
                KeyCode::Char('>') => app.adjust_threshold(10),
                KeyCode::Char('<') => app.adjust_threshold(-10),
                KeyCode::Down | KeyCode::Char('j') => app.next(),
                KeyCode::Up | KeyCode::Char('k') => app.previous(),
                KeyCode::Home => {
                    if !app.order.is_empty() {
                        app.state.select(Some(0));
                    }
                }
                KeyCode::End => {
                    if !app.order.is_empty() {
                        app.state.select(Some(app.order.len() - 1));
                    }
                }
                _ => {}
            }
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4), // Selection + scale
            Constraint::Min(0),    // Counties
            Constraint::Length(3), // Key help
        ])
        .split(f.size());

    render_header(f, chunks[0], app);

    if app.show_detail {
        let content_chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(chunks[1]);

        render_table(f, content_chunks[0], app);
        render_detail_panel(f, content_chunks[1], app);
    } else {
        render_table(f, chunks[1], app);
    }

    render_status_bar(f, chunks[2]);
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let selection = &app.selection;
    let label = Style::default().fg(Color::DarkGray);
    let value = Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD);

    let filters = Line::from(vec![
        Span::styled("Month ", label),
        Span::styled(selection.period.format("%Y-%m-%d").to_string(), value),
        Span::raw("  │  "),
        Span::styled("Type ", label),
        Span::styled(selection.property_type.clone(), value),
        Span::raw("  │  "),
        Span::styled("State ", label),
        Span::styled(selection.state.label().to_string(), value),
        Span::raw("  │  "),
        Span::styled("Sold ≥ ", label),
        Span::styled(selection.min_homes_sold.to_string(), value),
    ]);

    let mut scale_spans = vec![
        Span::styled("Metric: ", Style::default().fg(Color::White).add_modifier(Modifier::BOLD)),
        Span::styled(selection.metric.label(), Style::default().fg(Color::Cyan)),
        Span::raw("  "),
    ];
    match &app.view.choropleth.scale {
        Some(scale) => {
            for (i, color) in scale.colors.iter().enumerate() {
                let lower = scale.breaks.get(i).copied().unwrap_or_default();
                scale_spans.push(Span::styled("■ ", Style::default().fg(fill_color(color))));
                scale_spans.push(Span::raw(format!(
                    "{}  ",
                    county_market_map::scale::localize_number(lower)
                )));
            }
        }
        None => scale_spans.push(Span::styled(
            "No data for this selection",
            Style::default().fg(Color::Red),
        )),
    }

    let header = Paragraph::new(vec![filters, Line::from(scale_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(" County Market Map "),
    );

    f.render_widget(header, area);
}

fn render_table(f: &mut Frame, area: Rect, app: &mut App) {
    let metric: Metric = app.selection.metric;
    let header_cells = ["", "FIPS", "County", "State", metric.label(), "Homes Sold"]
        .into_iter()
        .map(|h| Cell::from(h).style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)));

    let header = Row::new(header_cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1);

    let rows = app.order.iter().map(|idx| {
        let row = app.view.rows[*idx];
        let fill = app.view.choropleth.fill_for(&row.county_fips);
        let fmt = |v: Option<f64>| {
            v.map(county_market_map::scale::localize_number)
                .unwrap_or_else(|| "N/A".to_string())
        };

        Row::new(vec![
            Cell::from("■").style(Style::default().fg(fill_color(fill))),
            Cell::from(row.county_fips.clone()),
            Cell::from(truncate(&row.region, 34)),
            Cell::from(row.state_code.clone()),
            Cell::from(fmt(row.metric(metric))),
            Cell::from(fmt(row.metric(Metric::HomesSold))),
        ])
        .height(1)
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(2),
            Constraint::Length(7),
            Constraint::Length(36),
            Constraint::Length(6),
            Constraint::Length(34),
            Constraint::Length(12),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(format!(" Counties ({}) ", app.order.len())),
    )
    .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.state);
}

fn render_detail_panel(f: &mut Frame, area: Rect, app: &App) {
    let lines: Vec<Line> = match app.selected_row() {
        Some(row) => tooltip_rows(row)
            .into_iter()
            .map(|r| {
                Line::from(vec![
                    Span::styled(format!("{:<36}", r.label), Style::default().fg(Color::Cyan)),
                    Span::raw(r.value),
                ])
            })
            .collect(),
        None => vec![Line::from("No county selected")],
    };

    let detail = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow))
            .title(" County Detail "),
    );

    f.render_widget(detail, area);
}

fn render_status_bar(f: &mut Frame, area: Rect) {
    let help = Line::from(vec![
        Span::styled("←/→", Style::default().fg(Color::Yellow)),
        Span::raw(" month  "),
        Span::styled("p", Style::default().fg(Color::Yellow)),
        Span::raw(" type  "),
        Span::styled("m", Style::default().fg(Color::Yellow)),
        Span::raw(" metric  "),
        Span::styled("s/S", Style::default().fg(Color::Yellow)),
        Span::raw(" state  "),
        Span::styled("+/- </>", Style::default().fg(Color::Yellow)),
        Span::raw(" min sold  "),
        Span::styled("Enter", Style::default().fg(Color::Yellow)),
        Span::raw(" detail  "),
        Span::styled("q", Style::default().fg(Color::Yellow)),
        Span::raw(" quit"),
    ]);

    let status = Paragraph::new(help).block(Block::default().borders(Borders::ALL));
    f.render_widget(status, area);
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use county_market_map::{BoundarySet, CountyBoundary, CountyReference, MarketRecord};
    use std::sync::Arc;

    fn record(period: &str, region: &str, state: &str, homes_sold: f64, price: f64) -> MarketRecord {
        let date = NaiveDate::parse_from_str(period, "%Y-%m-%d").unwrap();
        MarketRecord {
            period_begin: date,
            period_end: date,
            region: region.to_string(),
            parent_metro_region: String::new(),
            state_code: state.to_string(),
            property_type: "All Residential".to_string(),
            median_sale_price: Some(price),
            median_sale_price_yoy: None,
            homes_sold: Some(homes_sold),
            homes_sold_yoy: None,
            new_listings: None,
            new_listings_yoy: None,
            median_dom: None,
            avg_sale_to_list: None,
        }
    }

    fn test_dashboard() -> Dashboard {
        let market = vec![
            record("2021-08-01", "Wake County, NC", "NC", 40.0, 300000.0),
            record("2021-09-01", "Wake County, NC", "NC", 40.0, 310000.0),
            record("2021-09-01", "Greenville County, SC", "SC", 25.0, 450000.0),
        ];
        let counties = vec![
            CountyReference { name: "Wake".into(), state: "NC".into(), fips: Some("37183".into()) },
            CountyReference { name: "Greenville".into(), state: "SC".into(), fips: Some("45045".into()) },
        ];
        let square = geojson::Geometry::new(geojson::Value::Polygon(vec![vec![
            vec![0.0, 0.0],
            vec![1.0, 0.0],
            vec![1.0, 1.0],
            vec![0.0, 0.0],
        ]]));
        let boundaries = BoundarySet {
            boundaries: ["37183", "45045"]
                .iter()
                .map(|code| CountyBoundary {
                    county_fips: code.to_string(),
                    geometry: Arc::new(square.clone()),
                })
                .collect(),
            ..Default::default()
        };
        Dashboard::from_parts(&market, &counties, Arc::new(boundaries))
    }

    #[test]
    fn test_app_orders_by_metric() {
        let dashboard = test_dashboard();
        let app = App::new(&dashboard);

        assert_eq!(app.order.len(), 2);
        assert_eq!(app.selected_row().unwrap().county_fips, "45045");
    }

    #[test]
    fn test_app_period_and_state() {
        let dashboard = test_dashboard();
        let mut app = App::new(&dashboard);

        app.shift_period(true);
        assert_eq!(app.selection.period, NaiveDate::from_ymd_opt(2021, 8, 1).unwrap());
        assert_eq!(app.order.len(), 1);

        // already at the oldest month
        app.shift_period(true);
        assert_eq!(app.selection.period, NaiveDate::from_ymd_opt(2021, 8, 1).unwrap());

        app.shift_period(false);
        app.cycle_state(false);
        assert_eq!(app.selection.state, StateFilter::Code("NC".to_string()));
        assert_eq!(app.order.len(), 1);

        app.cycle_state(true);
        assert_eq!(app.selection.state, StateFilter::All);
    }

    #[test]
    fn test_app_threshold_is_clamped() {
        let dashboard = test_dashboard();
        let mut app = App::new(&dashboard);

        app.adjust_threshold(20);
        assert_eq!(app.selection.min_homes_sold, 30);
        assert_eq!(app.order.len(), 1);

        app.adjust_threshold(-1000);
        assert_eq!(app.selection.min_homes_sold, 1);

        app.adjust_threshold(10_000);
        assert_eq!(app.selection.min_homes_sold, 500);
        assert!(app.order.is_empty());
        assert!(app.state.selected().is_none());
        assert!(app.selected_row().is_none());
    }

    #[test]
    fn test_app_cycles_type_and_metric() {
        let dashboard = test_dashboard();
        let mut app = App::new(&dashboard);

        app.next_metric();
        assert_eq!(app.selection.metric, Metric::MedianSalePrice.next());

        app.next_property_type();
        assert_ne!(app.selection.property_type, "All Residential");
        assert!(app.order.is_empty());

        app.next();
        app.previous();
        assert!(app.state.selected().is_none());
    }

    #[test]
    fn test_fill_color() {
        assert_eq!(fill_color("#78c679"), Color::Rgb(0x78, 0xc6, 0x79));
        assert_eq!(fill_color("white"), Color::White);
        assert_eq!(fill_color("#zzzzzz"), Color::White);
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Wake County, NC", 34), "Wake County, NC");
        assert_eq!(truncate("San Bernardino County, CA", 10), "San Ber...");
    }
}
