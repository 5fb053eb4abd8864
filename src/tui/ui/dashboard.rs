//! Dashboard view: Main overview screen.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::application::report::RECOMMENDED_RANGES;
use crate::application::HistoryTrend;
use crate::domain::RiskCategory;
use crate::tui::styles::Theme;

/// Dashboard state for rendering.
#[derive(Debug, Clone, Default)]
pub struct DashboardState {
    /// Model file shown in the status panel
    pub model_label: String,
    pub capability: &'static str,
    pub history_backend: &'static str,
    pub persist_history: bool,
    pub history_count: Option<usize>,
}

/// Render the main dashboard view.
pub fn render_dashboard(f: &mut Frame, area: Rect, state: &DashboardState, trend: &HistoryTrend) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Main content
        ])
        .split(area);

    render_header(f, chunks[0]);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(chunks[1]);

    render_status_panels(f, columns[0], state);

    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(6)])
        .margin(1)
        .split(columns[1]);

    render_recent_summary(f, right[0], trend);
    render_ranges(f, right[1]);
}

fn render_header(f: &mut Frame, area: Rect) {
    let header = Paragraph::new(Line::from(vec![
        Span::styled(" ", Theme::text()),
        Span::styled("Glucorisk", Theme::title()),
        Span::styled(" │ ", Theme::text_muted()),
        Span::styled("Diabetes Risk Assessment", Theme::text_secondary()),
    ]))
    .block(
        Block::default()
            .borders(Borders::BOTTOM)
            .border_style(Theme::border()),
    );

    f.render_widget(header, area);
}

fn render_status_panels(f: &mut Frame, area: Rect, state: &DashboardState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(7), // System status
            Constraint::Min(0),    // Quick actions
        ])
        .margin(1)
        .split(area);

    let history_line = match state.history_count {
        Some(count) => Span::styled(count.to_string(), Theme::text()),
        None => Span::styled("unreadable", Theme::danger()),
    };

    let status_items = vec![
        Line::from(vec![
            Span::styled("  OK ", Theme::success()),
            Span::styled(state.model_label.clone(), Theme::text()),
        ]),
        Line::from(vec![
            Span::styled("  Capability: ", Theme::text_secondary()),
            Span::styled(state.capability, Theme::text()),
        ]),
        Line::from(vec![
            Span::styled("  History: ", Theme::text_secondary()),
            Span::styled(state.history_backend, Theme::text()),
            if state.persist_history {
                Span::styled(" (recording)", Theme::success())
            } else {
                Span::styled(" (disabled)", Theme::text_muted())
            },
        ]),
        Line::from(vec![
            Span::styled("  Submissions: ", Theme::text_secondary()),
            history_line,
        ]),
    ];

    let status_block = Block::default()
        .title(Span::styled(" System Status ", Theme::subtitle()))
        .borders(Borders::ALL)
        .border_style(Theme::border());

    f.render_widget(Paragraph::new(status_items).block(status_block), chunks[0]);

    let actions = vec![
        Line::from(vec![
            Span::styled("[N] ", Theme::key_hint()),
            Span::styled("New Assessment", Theme::key_desc()),
        ]),
        Line::from(vec![
            Span::styled("[H] ", Theme::key_hint()),
            Span::styled("History", Theme::key_desc()),
        ]),
        Line::from(vec![
            Span::styled("[Q] ", Theme::key_hint()),
            Span::styled("Quit", Theme::key_desc()),
        ]),
    ];

    let actions_block = Block::default()
        .title(Span::styled(" Quick Actions ", Theme::subtitle()))
        .borders(Borders::ALL)
        .border_style(Theme::border());

    f.render_widget(Paragraph::new(actions).block(actions_block), chunks[1]);
}

fn render_recent_summary(f: &mut Frame, area: Rect, trend: &HistoryTrend) {
    let block = Block::default()
        .title(Span::styled(" Recent Activity ", Theme::subtitle()))
        .borders(Borders::ALL)
        .border_style(Theme::border());

    let Some(latest) = trend.latest() else {
        let empty_msg = Paragraph::new(Line::from(Span::styled(
            "No assessments yet. Press [N] to start.",
            Theme::text_muted(),
        )))
        .block(block);
        f.render_widget(empty_msg, area);
        return;
    };

    let lines = vec![
        Line::from(vec![
            Span::styled("Total: ", Theme::text_secondary()),
            Span::styled(trend.total.to_string(), Theme::text()),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled("Low: ", Theme::text_secondary()),
            Span::styled(trend.low.to_string(), Theme::risk_category(RiskCategory::Low)),
            Span::styled("  High: ", Theme::text_secondary()),
            Span::styled(trend.high.to_string(), Theme::risk_category(RiskCategory::High)),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled("Latest: ", Theme::text_secondary()),
            Span::styled(
                latest.timestamp.format("%Y-%m-%d %H:%M").to_string(),
                Theme::text(),
            ),
            Span::styled(" │ ", Theme::text_muted()),
            Span::styled(
                latest.prediction.to_string(),
                Theme::risk_category(latest.prediction),
            ),
        ]),
    ];

    f.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_ranges(f: &mut Frame, area: Rect) {
    let lines: Vec<Line> = RECOMMENDED_RANGES
        .iter()
        .map(|(field, range)| {
            Line::from(vec![
                Span::styled(format!(" {field}: "), Theme::text_secondary()),
                Span::styled(*range, Theme::text()),
            ])
        })
        .collect();

    let block = Block::default()
        .title(Span::styled(" Recommended Ranges ", Theme::subtitle()))
        .borders(Borders::ALL)
        .border_style(Theme::border());

    f.render_widget(Paragraph::new(lines).block(block), area);
}
