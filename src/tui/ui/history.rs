//! History view: trend over past predictions.

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Gauge, Paragraph, Row, Sparkline, Table},
    Frame,
};

use crate::application::HistoryTrend;
use crate::tui::styles::Theme;

/// History screen state
#[derive(Default)]
pub struct HistoryState {
    pub trend: HistoryTrend,
    pub error: Option<String>,
}

/// Render the history view
pub fn render_history(f: &mut Frame, area: Rect, state: &HistoryState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Content
            Constraint::Length(3), // Footer
        ])
        .split(area);

    render_history_header(f, chunks[0], &state.trend);
    render_history_content(f, chunks[1], state);
    render_history_footer(f, chunks[2]);
}

fn render_history_header(f: &mut Frame, area: Rect, trend: &HistoryTrend) {
    let header = Paragraph::new(Line::from(vec![
        Span::styled(" ", Theme::text()),
        Span::styled("History", Theme::title()),
        Span::styled(
            format!(" │ {} submissions", trend.total),
            Theme::text_secondary(),
        ),
    ]))
    .block(
        Block::default()
            .borders(Borders::BOTTOM)
            .border_style(Theme::border()),
    );

    f.render_widget(header, area);
}

fn render_history_content(f: &mut Frame, area: Rect, state: &HistoryState) {
    if let Some(err) = &state.error {
        render_history_error(f, area, err);
        return;
    }

    if state.trend.total == 0 {
        let empty = Paragraph::new(vec![
            Line::from(""),
            Line::from(Span::styled("No submissions recorded yet", Theme::text_muted())),
        ])
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Theme::border()),
        );
        f.render_widget(empty, area);
        return;
    }

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(9), Constraint::Min(0)])
        .margin(1)
        .split(area);

    let top = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(rows[0]);

    render_sparklines(f, top[0], &state.trend);
    render_summary(f, top[1], &state.trend);
    render_recent_table(f, rows[1], &state.trend);
}

fn render_history_error(f: &mut Frame, area: Rect, message: &str) {
    let content = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled("! Cannot Load History", Theme::danger())),
        Line::from(""),
        Line::from(Span::styled(message, Theme::text())),
    ])
    .alignment(Alignment::Center)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Theme::danger()),
    );

    f.render_widget(content, area);
}

/// Sparkline needs unsigned bars.
fn bars(values: &[f64]) -> Vec<u64> {
    values.iter().map(|v| v.max(0.0).round() as u64).collect()
}

fn render_sparklines(f: &mut Frame, area: Rect, trend: &HistoryTrend) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(4), Constraint::Length(4)])
        .split(area);

    let glucose = bars(&trend.glucose);
    let glucose_spark = Sparkline::default()
        .block(
            Block::default()
                .title(Span::styled(" Glucose (mg/dL) ", Theme::subtitle()))
                .borders(Borders::ALL)
                .border_style(Theme::border()),
        )
        .data(&glucose)
        .style(Theme::info());
    f.render_widget(glucose_spark, chunks[0]);

    let bmi = bars(&trend.bmi);
    let bmi_spark = Sparkline::default()
        .block(
            Block::default()
                .title(Span::styled(" BMI ", Theme::subtitle()))
                .borders(Borders::ALL)
                .border_style(Theme::border()),
        )
        .data(&bmi)
        .style(Theme::warning());
    f.render_widget(bmi_spark, chunks[1]);
}

fn render_summary(f: &mut Frame, area: Rect, trend: &HistoryTrend) {
    let block = Block::default()
        .title(Span::styled(" Summary ", Theme::subtitle()))
        .borders(Borders::ALL)
        .border_style(Theme::border());

    let inner = block.inner(area);
    f.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(4), Constraint::Length(3)])
        .split(inner);

    let fmt_opt = |v: Option<f64>| v.map_or_else(|| "-".to_string(), |v| format!("{v:.1}"));
    let direction = trend
        .glucose_direction
        .map_or_else(|| "-".to_string(), |d| d.to_string());

    let text = Paragraph::new(vec![
        Line::from(vec![
            Span::styled(" Low: ", Theme::text_secondary()),
            Span::styled(trend.low.to_string(), Theme::success()),
            Span::styled("  High: ", Theme::text_secondary()),
            Span::styled(trend.high.to_string(), Theme::danger()),
        ]),
        Line::from(vec![
            Span::styled(" Mean glucose: ", Theme::text_secondary()),
            Span::styled(fmt_opt(trend.mean_glucose), Theme::text()),
        ]),
        Line::from(vec![
            Span::styled(" Mean BMI: ", Theme::text_secondary()),
            Span::styled(fmt_opt(trend.mean_bmi), Theme::text()),
        ]),
        Line::from(vec![
            Span::styled(" Glucose trend: ", Theme::text_secondary()),
            Span::styled(direction, Theme::text()),
        ]),
    ]);
    f.render_widget(text, chunks[0]);

    let share = trend.high_share() * 100.0;
    let gauge = Gauge::default()
        .block(
            Block::default()
                .title(Span::styled(" High Share ", Theme::text_secondary()))
                .borders(Borders::TOP)
                .border_style(Theme::border()),
        )
        .gauge_style(Theme::risk_gauge(share))
        .percent(share.round() as u16)
        .label(format!("{share:.0}%"));
    f.render_widget(gauge, chunks[1]);
}

fn render_recent_table(f: &mut Frame, area: Rect, trend: &HistoryTrend) {
    let header = Row::new(["Timestamp", "Glucose", "BP", "BMI", "Age", "Prediction"])
        .style(Theme::subtitle());

    let rows = trend.recent.iter().map(|record| {
        Row::new(vec![
            Cell::from(record.timestamp.format("%Y-%m-%d %H:%M:%S").to_string()),
            Cell::from(format!("{:.1}", record.glucose)),
            Cell::from(format!("{:.1}", record.blood_pressure)),
            Cell::from(format!("{:.2}", record.bmi)),
            Cell::from(record.age.to_string()),
            Cell::from(record.prediction.to_string())
                .style(Theme::risk_category(record.prediction)),
        ])
        .style(Theme::text())
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(20),
            Constraint::Length(9),
            Constraint::Length(7),
            Constraint::Length(7),
            Constraint::Length(5),
            Constraint::Min(10),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .title(Span::styled(" Recent Submissions ", Theme::subtitle()))
            .borders(Borders::ALL)
            .border_style(Theme::border()),
    );

    f.render_widget(table, area);
}

fn render_history_footer(f: &mut Frame, area: Rect) {
    let footer = Paragraph::new(Line::from(vec![
        Span::styled("[R] ", Theme::key_hint()),
        Span::styled("Refresh ", Theme::key_desc()),
        Span::styled("[N] ", Theme::key_hint()),
        Span::styled("New Assessment ", Theme::key_desc()),
        Span::styled("[Esc] ", Theme::key_hint()),
        Span::styled("Dashboard", Theme::key_desc()),
    ]))
    .block(
        Block::default()
            .borders(Borders::TOP)
            .border_style(Theme::border()),
    );

    f.render_widget(footer, area);
}
