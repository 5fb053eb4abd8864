//! Main TUI application state machine.
//!
//! Handles:
//! - Screen navigation
//! - Input event handling
//! - Submission, export and history refresh through the assessment service

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    Terminal,
};

use crate::adapters::HistoryBackend;
use crate::application::{export_report, AssessmentService, HistoryTrend, ReportFormat};
use crate::domain::SubmissionStage;
use crate::GlucoriskError;

use super::ui::{
    dashboard::{render_dashboard, DashboardState},
    history::{render_history, HistoryState},
    intake::{render_intake_form, IntakeFormState},
    render_disclaimer,
    result::{render_result, ResultState},
};

/// Current screen/view in the application
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Dashboard,
    IntakeForm,
    Result,
    History,
}

/// Main application state
pub struct App {
    screen: Screen,
    should_quit: bool,

    service: AssessmentService<HistoryBackend>,

    /// Directory for exported reports
    report_dir: PathBuf,

    dashboard_state: DashboardState,
    intake_state: IntakeFormState,
    result_state: ResultState,
    history_state: HistoryState,
}

impl App {
    /// Create the application around a configured service.
    ///
    /// `model_label` and `history_backend` are shown on the dashboard.
    pub fn new(
        service: AssessmentService<HistoryBackend>,
        model_label: impl Into<String>,
        history_backend: &'static str,
        report_dir: impl Into<PathBuf>,
    ) -> Self {
        let dashboard_state = DashboardState {
            model_label: model_label.into(),
            capability: service.classifier().kind(),
            history_backend,
            persist_history: service.persists_history(),
            history_count: None,
        };

        let mut app = Self {
            screen: Screen::Dashboard,
            should_quit: false,
            service,
            report_dir: report_dir.into(),
            dashboard_state,
            intake_state: IntakeFormState::default(),
            result_state: ResultState::default(),
            history_state: HistoryState::default(),
        };
        app.refresh_history();
        app
    }

    /// Run the main application loop.
    ///
    /// # Errors
    /// Returns error if terminal operations fail.
    pub fn run(&mut self) -> Result<()> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let result = self.main_loop(&mut terminal);

        // Restore terminal
        disable_raw_mode()?;
        execute!(
            terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        )?;
        terminal.show_cursor()?;

        result
    }

    fn main_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
        loop {
            terminal.draw(|f| {
                let chunks = Layout::default()
                    .direction(Direction::Vertical)
                    .constraints([Constraint::Min(0), Constraint::Length(3)])
                    .split(f.area());

                let content_area = chunks[0];
                match self.screen {
                    Screen::Dashboard => render_dashboard(
                        f,
                        content_area,
                        &self.dashboard_state,
                        &self.history_state.trend,
                    ),
                    Screen::IntakeForm => render_intake_form(f, content_area, &self.intake_state),
                    Screen::Result => render_result(f, content_area, &self.result_state),
                    Screen::History => render_history(f, content_area, &self.history_state),
                }

                render_disclaimer(f, chunks[1]);
            })?;

            if event::poll(Duration::from_millis(100))? {
                if let Event::Key(key) = event::read()? {
                    self.handle_key(key.code, key.modifiers);
                }
            }

            if self.should_quit {
                break;
            }
        }

        Ok(())
    }

    #[must_use]
    pub fn screen(&self) -> Screen {
        self.screen
    }

    fn handle_key(&mut self, key: KeyCode, modifiers: KeyModifiers) {
        // Global quit handling
        if key == KeyCode::Char('q') && modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return;
        }

        match self.screen {
            Screen::Dashboard => self.handle_dashboard_key(key),
            Screen::IntakeForm => self.handle_intake_key(key),
            Screen::Result => self.handle_result_key(key),
            Screen::History => self.handle_history_key(key),
        }
    }

    fn handle_dashboard_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Char('n' | 'N') => self.start_new_submission(),
            KeyCode::Char('h' | 'H') => {
                self.refresh_history();
                self.screen = Screen::History;
            }
            KeyCode::Char('q' | 'Q') => self.should_quit = true,
            _ => {}
        }
    }

    fn handle_intake_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Esc => self.show_dashboard(),
            KeyCode::Up | KeyCode::BackTab => self.intake_state.prev_field(),
            KeyCode::Down | KeyCode::Tab => self.intake_state.next_field(),
            KeyCode::F(2) => self.intake_state.load_sample_data(),
            KeyCode::F(5) => self.intake_state.reset(),
            KeyCode::Char(c) => self.intake_state.input_char(c),
            KeyCode::Backspace => self.intake_state.delete_char(),
            KeyCode::Delete => self.intake_state.clear_field(),
            KeyCode::Enter => self.submit(),
            _ => {}
        }
    }

    fn handle_result_key(&mut self, key: KeyCode) {
        let complete = matches!(self.result_state, ResultState::Complete { .. });
        let failed = matches!(self.result_state, ResultState::Error { .. });

        match key {
            KeyCode::Char('e' | 'E') if complete => self.export(ReportFormat::Text),
            KeyCode::Char('c' | 'C') if complete => self.export(ReportFormat::Csv),
            KeyCode::Char('n' | 'N') if complete => self.start_new_submission(),
            KeyCode::Enter if failed => self.screen = Screen::IntakeForm,
            KeyCode::Esc => self.show_dashboard(),
            _ => {}
        }
    }

    fn handle_history_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Esc => self.show_dashboard(),
            KeyCode::Char('r' | 'R') => self.refresh_history(),
            KeyCode::Char('n' | 'N') => self.start_new_submission(),
            _ => {}
        }
    }

    fn start_new_submission(&mut self) {
        self.intake_state.reset();
        self.result_state = ResultState::Idle;
        self.screen = Screen::IntakeForm;
    }

    fn show_dashboard(&mut self) {
        self.refresh_history();
        self.screen = Screen::Dashboard;
    }

    fn submit(&mut self) {
        match self.service.submit(&mut self.intake_state.session) {
            Ok(assessment) => {
                self.intake_state.error_message = None;
                // Rendering the result is the terminal stage; exports are optional.
                self.intake_state.session.advance(SubmissionStage::Reported);
                self.result_state = ResultState::Complete {
                    assessment: Box::new(assessment),
                    notice: None,
                };
                self.screen = Screen::Result;
            }
            // Input problems stay on the form so the user can correct them.
            Err(
                e @ (GlucoriskError::MissingInput(_)
                | GlucoriskError::InvalidInput(_)
                | GlucoriskError::ShapeMismatch { .. }),
            ) => {
                self.intake_state.error_message = Some(e.to_string());
            }
            Err(e) => {
                tracing::error!("Prediction failed: {}", e);
                self.result_state = ResultState::Error {
                    message: e.to_string(),
                };
                self.screen = Screen::Result;
            }
        }
    }

    fn export(&mut self, format: ReportFormat) {
        let ResultState::Complete { assessment, notice } = &mut self.result_state else {
            return;
        };

        let outcome = export_report(
            &self.report_dir,
            format,
            &assessment.profile,
            &assessment.result,
            Some(&assessment.personal),
        );

        *notice = Some(match outcome {
            Ok(path) => format!("Report saved to {}", path.display()),
            Err(e) => {
                tracing::error!("Report export failed: {}", e);
                format!("Export failed: {e}")
            }
        });
    }

    fn refresh_history(&mut self) {
        match self.service.history() {
            Ok(records) => {
                self.history_state.trend = HistoryTrend::from_records(&records);
                self.history_state.error = None;
                self.dashboard_state.history_count = Some(records.len());
            }
            Err(e) => {
                tracing::warn!("Failed to load history: {}", e);
                self.history_state.trend = HistoryTrend::default();
                self.history_state.error = Some(e.to_string());
                self.dashboard_state.history_count = None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::adapters::csv_store::CsvHistoryStore;
    use crate::domain::FeatureVector;
    use crate::ports::{ClassifierCapability, ClassifierError};
    use tempfile::tempdir;

    fn app(dir: &std::path::Path, p_positive: f64) -> App {
        let store = HistoryBackend::Csv(CsvHistoryStore::new(dir.join("history.csv")));
        let classifier = ClassifierCapability::probability(
            move |_: &FeatureVector| -> Result<[f64; 2], ClassifierError> {
                Ok([1.0 - p_positive, p_positive])
            },
        );
        let service = AssessmentService::new(classifier, Arc::new(store));
        App::new(service, "test model", "csv", dir.join("reports"))
    }

    fn press(app: &mut App, key: KeyCode) {
        app.handle_key(key, KeyModifiers::NONE);
    }

    #[test]
    fn test_submit_sample_reaches_result_and_history() {
        let dir = tempdir().expect("tempdir");
        let mut app = app(dir.path(), 0.8);

        press(&mut app, KeyCode::Char('n'));
        assert_eq!(app.screen(), Screen::IntakeForm);
        press(&mut app, KeyCode::F(2));
        press(&mut app, KeyCode::Enter);

        assert_eq!(app.screen(), Screen::Result);
        assert!(matches!(app.result_state, ResultState::Complete { .. }));
        assert_eq!(app.intake_state.session.stage, SubmissionStage::Reported);

        press(&mut app, KeyCode::Esc);
        assert_eq!(app.screen(), Screen::Dashboard);
        assert_eq!(app.dashboard_state.history_count, Some(1));
        assert_eq!(app.history_state.trend.high, 1);
    }

    #[test]
    fn test_missing_bmi_stays_on_form() {
        let dir = tempdir().expect("tempdir");
        let mut app = app(dir.path(), 0.2);

        press(&mut app, KeyCode::Char('n'));
        press(&mut app, KeyCode::Enter);

        assert_eq!(app.screen(), Screen::IntakeForm);
        assert!(app.intake_state.error_message.is_some());
        assert_eq!(app.intake_state.session.stage, SubmissionStage::Idle);
    }

    #[test]
    fn test_export_writes_report_without_changing_stage() {
        let dir = tempdir().expect("tempdir");
        let mut app = app(dir.path(), 0.2);

        press(&mut app, KeyCode::Char('n'));
        press(&mut app, KeyCode::F(2));
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.intake_state.session.stage, SubmissionStage::Reported);
        press(&mut app, KeyCode::Char('c'));

        assert_eq!(app.intake_state.session.stage, SubmissionStage::Reported);
        let ResultState::Complete { notice, .. } = &app.result_state else {
            panic!("expected a completed result");
        };
        assert!(notice.as_deref().is_some_and(|n| n.starts_with("Report saved")));

        let exported: Vec<_> = std::fs::read_dir(dir.path().join("reports"))
            .expect("reports dir")
            .collect();
        assert_eq!(exported.len(), 1);
    }

    #[test]
    fn test_ctrl_q_quits_from_any_screen() {
        let dir = tempdir().expect("tempdir");
        let mut app = app(dir.path(), 0.2);

        press(&mut app, KeyCode::Char('n'));
        app.handle_key(KeyCode::Char('q'), KeyModifiers::CONTROL);
        assert!(app.should_quit);
    }
}
