//! Prediction result view.

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::Modifier,
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph, Wrap},
    Frame,
};

use crate::application::Assessment;
use crate::domain::RiskCategory;
use crate::tui::styles::Theme;

/// Result screen state
#[derive(Debug, Default)]
pub enum ResultState {
    /// Nothing submitted yet
    #[default]
    Idle,
    /// Scored submission, with the latest export message if any
    Complete {
        assessment: Box<Assessment>,
        notice: Option<String>,
    },
    /// Submission aborted
    Error { message: String },
}

/// Render the result view
pub fn render_result(f: &mut Frame, area: Rect, state: &ResultState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Content
            Constraint::Length(3), // Footer
        ])
        .split(area);

    render_result_header(f, chunks[0]);
    match state {
        ResultState::Idle => render_idle(f, chunks[1]),
        ResultState::Complete { assessment, .. } => render_assessment(f, chunks[1], assessment),
        ResultState::Error { message } => render_error(f, chunks[1], message),
    }
    render_result_footer(f, chunks[2], state);
}

fn render_result_header(f: &mut Frame, area: Rect) {
    let header = Paragraph::new(Line::from(vec![
        Span::styled(" ", Theme::text()),
        Span::styled("Risk Assessment", Theme::title()),
    ]))
    .block(
        Block::default()
            .borders(Borders::BOTTOM)
            .border_style(Theme::border()),
    );

    f.render_widget(header, area);
}

fn render_idle(f: &mut Frame, area: Rect) {
    let content = Paragraph::new(Line::from(Span::styled(
        "No prediction yet. Fill in the form and press Enter.",
        Theme::text_muted(),
    )))
    .alignment(Alignment::Center)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Theme::border()),
    );

    f.render_widget(content, area);
}

fn render_assessment(f: &mut Frame, area: Rect, assessment: &Assessment) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(area);

    render_verdict(f, columns[0], assessment);
    render_advice(f, columns[1], assessment.result.risk_category);
}

fn render_verdict(f: &mut Frame, area: Rect, assessment: &Assessment) {
    let block = Block::default()
        .title(Span::styled(" Result ", Theme::subtitle()))
        .borders(Borders::ALL)
        .border_style(Theme::border_focused());

    let inner = block.inner(area);
    f.render_widget(block, area);

    let result = &assessment.result;
    let gauge_height = if result.risk_score.is_some() { 3 } else { 0 };
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),            // Verdict
            Constraint::Length(gauge_height), // Risk gauge
            Constraint::Min(0),               // Metrics
        ])
        .margin(1)
        .split(inner);

    let category = result.risk_category;
    let risk_style = Theme::risk_category(category);
    let icon = match category {
        RiskCategory::Low => "OK",
        RiskCategory::High => "!",
    };
    let verdict = Paragraph::new(vec![
        Line::from(Span::styled(
            format!("{icon} {}", category.verdict()),
            risk_style.add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(category.encouragement(), Theme::text_secondary())),
    ])
    .alignment(Alignment::Center);
    f.render_widget(verdict, chunks[0]);

    if let Some(score) = result.risk_score {
        let gauge = Gauge::default()
            .block(
                Block::default()
                    .title(Span::styled(" Risk Score ", Theme::text_secondary()))
                    .borders(Borders::ALL)
                    .border_style(Theme::border()),
            )
            .gauge_style(Theme::risk_gauge(score))
            .percent(score.clamp(0.0, 100.0).round() as u16)
            .label(format!("{score:.1}%"));
        f.render_widget(gauge, chunks[1]);
    }

    let profile = &assessment.profile;
    let bmi_category = profile.bmi_category();
    let mut lines = vec![
        metric_line("Glucose", format!("{:.1} mg/dL", profile.glucose)),
        metric_line("Blood Pressure", format!("{:.1} mmHg", profile.blood_pressure)),
        Line::from(vec![
            Span::styled("  BMI: ", Theme::text_secondary()),
            Span::styled(format!("{:.2} ", profile.bmi), Theme::text()),
            Span::styled(bmi_category.to_string(), Theme::bmi_category(bmi_category)),
            Span::styled(
                format!(" ({})", bmi_category.range_label()),
                Theme::text_muted(),
            ),
        ]),
        metric_line("Age", format!("{} years", profile.age)),
    ];

    let secondary = &profile.secondary;
    if let Some(pregnancies) = secondary.pregnancies {
        lines.push(metric_line("Pregnancies", pregnancies.to_string()));
    }
    if let Some(insulin) = secondary.insulin_level {
        lines.push(metric_line("Insulin", format!("{insulin:.1} µU/mL")));
    }
    if let Some(skin) = secondary.skin_thickness {
        lines.push(metric_line("Skin Thickness", format!("{skin:.1} mm")));
    }

    lines.push(Line::from(""));
    for warning in &assessment.warnings {
        lines.push(Line::from(Span::styled(
            format!("  ! {warning}"),
            Theme::warning(),
        )));
    }
    if !assessment.history_saved {
        lines.push(Line::from(Span::styled(
            "  History not saved for this submission",
            Theme::text_muted(),
        )));
    }

    f.render_widget(Paragraph::new(lines), chunks[2]);
}

fn metric_line(label: &str, value: String) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("  {label}: "), Theme::text_secondary()),
        Span::styled(value, Theme::text()),
    ])
}

fn render_advice(f: &mut Frame, area: Rect, category: RiskCategory) {
    let block = Block::default()
        .title(Span::styled(
            format!(" {} ", category.advice_title()),
            Theme::subtitle(),
        ))
        .borders(Borders::ALL)
        .border_style(Theme::border());

    let lines: Vec<Line> = category
        .advice()
        .iter()
        .map(|tip| {
            Line::from(vec![
                Span::styled("  • ", Theme::risk_category(category)),
                Span::styled(*tip, Theme::text()),
            ])
        })
        .collect();

    f.render_widget(
        Paragraph::new(lines).block(block).wrap(Wrap { trim: false }),
        area,
    );
}

fn render_error(f: &mut Frame, area: Rect, message: &str) {
    let content = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled("! Prediction failed", Theme::danger())),
        Line::from(""),
        Line::from(Span::styled(message.to_string(), Theme::text())),
    ])
    .alignment(Alignment::Center)
    .wrap(Wrap { trim: true })
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Theme::danger()),
    );

    f.render_widget(content, area);
}

fn render_result_footer(f: &mut Frame, area: Rect, state: &ResultState) {
    let content = match state {
        ResultState::Complete {
            notice: Some(notice),
            ..
        } => Line::from(Span::styled(notice.clone(), Theme::info())),
        ResultState::Complete { .. } => Line::from(vec![
            Span::styled("[E] ", Theme::key_hint()),
            Span::styled("Export Report ", Theme::key_desc()),
            Span::styled("[C] ", Theme::key_hint()),
            Span::styled("Export CSV ", Theme::key_desc()),
            Span::styled("[N] ", Theme::key_hint()),
            Span::styled("New Submission ", Theme::key_desc()),
            Span::styled("[Esc] ", Theme::key_hint()),
            Span::styled("Dashboard", Theme::key_desc()),
        ]),
        ResultState::Error { .. } => Line::from(vec![
            Span::styled("[Enter] ", Theme::key_hint()),
            Span::styled("Back to Form ", Theme::key_desc()),
            Span::styled("[Esc] ", Theme::key_hint()),
            Span::styled("Dashboard", Theme::key_desc()),
        ]),
        ResultState::Idle => Line::from(vec![
            Span::styled("[Esc] ", Theme::key_hint()),
            Span::styled("Dashboard", Theme::key_desc()),
        ]),
    };

    let footer = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::TOP)
            .border_style(Theme::border()),
    );

    f.render_widget(footer, area);
}
