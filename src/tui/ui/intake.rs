//! Health metric intake form.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::domain::session::{FieldId, FieldSpec};
use crate::domain::{derive_bmi, BmiCategory, SessionState};
use crate::tui::styles::Theme;

/// Intake form state. Field values live in the [`SessionState`].
#[derive(Default)]
pub struct IntakeFormState {
    pub session: SessionState,
    pub selected_field: usize,
    pub error_message: Option<String>,
}

impl IntakeFormState {
    /// Move to the next field
    pub fn next_field(&mut self) {
        self.selected_field = (self.selected_field + 1) % self.session.len();
    }

    /// Move to the previous field
    pub fn prev_field(&mut self) {
        if self.selected_field == 0 {
            self.selected_field = self.session.len() - 1;
        } else {
            self.selected_field -= 1;
        }
    }

    /// Add a character to the current field
    pub fn input_char(&mut self, c: char) {
        if self.session.push_char(self.selected_field, c) {
            self.error_message = None;
        }
    }

    pub fn delete_char(&mut self) {
        self.session.pop_char(self.selected_field);
    }

    pub fn clear_field(&mut self) {
        self.session.clear_field(self.selected_field);
    }

    /// Replace every field with the Pima sample row.
    pub fn load_sample_data(&mut self) {
        self.session.load_sample();
        self.error_message = None;
    }

    /// Wipe all buffers and restore the documented defaults.
    pub fn reset(&mut self) {
        self.session.reset();
        self.selected_field = 0;
        self.error_message = None;
    }

    /// Live BMI preview: the entered value, or one derived from height/weight.
    #[must_use]
    pub fn bmi_preview(&self) -> Option<(f64, bool)> {
        let parse = |id| self.session.value(id).trim().parse::<f64>().ok();

        if let Some(bmi) = parse(FieldId::Bmi) {
            return Some((bmi, false));
        }
        let weight = parse(FieldId::WeightKg)?;
        let height = parse(FieldId::HeightCm).unwrap_or(0.0);
        Some((derive_bmi(height, weight), true))
    }
}

/// Render the intake form
pub fn render_intake_form(f: &mut Frame, area: Rect, state: &IntakeFormState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Form
            Constraint::Length(1), // BMI preview
            Constraint::Length(3), // Footer/error
        ])
        .split(area);

    render_form_header(f, chunks[0]);
    render_form_fields(f, chunks[1], state);
    render_bmi_preview(f, chunks[2], state);
    render_form_footer(f, chunks[3], state);
}

fn render_form_header(f: &mut Frame, area: Rect) {
    let header = Paragraph::new(Line::from(vec![
        Span::styled(" ", Theme::text()),
        Span::styled("Enter Your Health Information", Theme::title()),
        Span::styled(
            " │ BMI may be entered or derived from height and weight",
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

fn render_form_fields(f: &mut Frame, area: Rect, state: &IntakeFormState) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .margin(1)
        .split(area);

    let fields: Vec<(&'static FieldSpec, &str)> = state.session.fields().collect();
    let mid = (fields.len() + 1) / 2;

    render_field_column(f, columns[0], &fields[..mid], 0, state.selected_field);
    render_field_column(f, columns[1], &fields[mid..], mid, state.selected_field);
}

fn render_field_column(
    f: &mut Frame,
    area: Rect,
    fields: &[(&'static FieldSpec, &str)],
    offset: usize,
    selected: usize,
) {
    let constraints: Vec<Constraint> = fields
        .iter()
        .map(|_| Constraint::Length(3))
        .chain(std::iter::once(Constraint::Min(0)))
        .collect();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area);

    for (i, (spec, value)) in fields.iter().enumerate() {
        let is_selected = offset + i == selected;
        let (border_style, title_style) = if is_selected {
            (Theme::border_focused(), Theme::focused())
        } else {
            (Theme::border(), Theme::text_secondary())
        };

        let block = Block::default()
            .title(Span::styled(format!(" {} ", spec.label), title_style))
            .borders(Borders::ALL)
            .border_style(border_style);

        let value_display = if value.is_empty() {
            Span::styled(spec.hint, Theme::text_muted())
        } else {
            Span::styled(value.to_string(), Theme::text())
        };

        let content = Paragraph::new(Line::from(vec![
            Span::raw(" "),
            value_display,
            if is_selected {
                Span::styled("▌", Theme::cursor())
            } else {
                Span::raw("")
            },
        ]))
        .block(block);

        f.render_widget(content, chunks[i]);
    }
}

fn render_bmi_preview(f: &mut Frame, area: Rect, state: &IntakeFormState) {
    let line = match state.bmi_preview() {
        Some((bmi, derived)) => {
            let category = BmiCategory::from_bmi(bmi);
            Line::from(vec![
                Span::styled(" BMI: ", Theme::text_secondary()),
                Span::styled(format!("{bmi:.2}"), Theme::text()),
                Span::styled(
                    if derived { " (derived) " } else { " " },
                    Theme::text_muted(),
                ),
                Span::styled(category.to_string(), Theme::bmi_category(category)),
            ])
        }
        None => Line::from(Span::styled(
            " BMI: enter a BMI or a weight",
            Theme::text_muted(),
        )),
    };

    f.render_widget(Paragraph::new(line), area);
}

fn render_form_footer(f: &mut Frame, area: Rect, state: &IntakeFormState) {
    let content = if let Some(err) = &state.error_message {
        Line::from(vec![
            Span::styled("! ", Theme::danger()),
            Span::styled(err.clone(), Theme::danger()),
        ])
    } else {
        Line::from(vec![
            Span::styled("[↑↓/Tab] ", Theme::key_hint()),
            Span::styled("Navigate ", Theme::key_desc()),
            Span::styled("[Enter] ", Theme::key_hint()),
            Span::styled("Predict ", Theme::key_desc()),
            Span::styled("[F2] ", Theme::key_hint()),
            Span::styled("Sample Data ", Theme::key_desc()),
            Span::styled("[F5] ", Theme::key_hint()),
            Span::styled("Reset ", Theme::key_desc()),
            Span::styled("[Esc] ", Theme::key_hint()),
            Span::styled("Back", Theme::key_desc()),
        ])
    };

    let footer = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::TOP)
            .border_style(Theme::border()),
    );

    f.render_widget(footer, area);
}
