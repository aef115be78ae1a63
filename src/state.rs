use crate::{
    bridge::UiEvent,
    model::{JobReport, JobStatus},
};

pub const IDLE_STATUS: &str = "Waiting for a URL...";

/// Everything the window shows, updated only on the UI thread
#[derive(Clone, Debug)]
pub struct ShellState {
    pub status: JobStatus,
    /// Progress bar value (0-100)
    pub progress: f32,
    pub status_text: String,
    /// Download and folder buttons are clickable
    pub controls_enabled: bool,
    pub last_report: Option<JobReport>,
    /// Error waiting to be shown in a modal dialog
    pub pending_error: Option<String>,
}

impl Default for ShellState {
    fn default() -> Self {
        Self {
            status: JobStatus::Idle,
            progress: 0.0,
            status_text: IDLE_STATUS.to_owned(),
            controls_enabled: true,
            last_report: None,
            pending_error: None,
        }
    }
}

impl ShellState {
    /// Locks the controls and resets the bar for a new job.
    pub fn begin_job(&mut self) {
        self.status = JobStatus::Running;
        self.controls_enabled = false;
        self.progress = 0.0;
        self.last_report = None;
        self.pending_error = None;
    }

    pub fn progress_label(&self) -> String {
        format!("{:.1}%", self.progress)
    }

    pub fn apply(&mut self, event: UiEvent) {
        match event {
            UiEvent::Progress(pct) => self.progress = pct.clamp(0.0, 100.0),
            UiEvent::Status(text) => self.status_text = text,
            UiEvent::Finished(outcome) => {
                // Controls come back whatever the outcome
                self.controls_enabled = true;
                match outcome {
                    Ok(report) => {
                        self.status = JobStatus::Done;
                        self.status_text = format!(
                            "Done! Download and conversion finished.\nCheck the folder: {}",
                            report.base_dir.display()
                        );
                        self.last_report = Some(report);
                    }
                    Err(message) => {
                        self.status = JobStatus::Failed;
                        self.status_text = format!("An error occurred: {message}");
                        self.pending_error = Some(message);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn begin_job_locks_controls_and_resets_bar() {
        let mut state = ShellState {
            progress: 80.0,
            ..ShellState::default()
        };
        state.begin_job();
        assert!(!state.controls_enabled);
        assert_eq!(state.status, JobStatus::Running);
        assert_eq!(state.progress_label(), "0.0%");
    }

    #[test]
    fn failure_re_enables_controls() {
        let mut state = ShellState::default();
        state.begin_job();
        state.apply(UiEvent::Progress(12.5));
        state.apply(UiEvent::Finished(Err("no network".into())));

        assert!(state.controls_enabled);
        assert_eq!(state.status, JobStatus::Failed);
        assert_eq!(state.status_text, "An error occurred: no network");
        assert_eq!(state.pending_error.as_deref(), Some("no network"));
    }

    #[test]
    fn success_records_report() {
        let mut state = ShellState::default();
        state.begin_job();
        state.apply(UiEvent::Progress(100.0));
        let report = JobReport {
            base_dir: PathBuf::from("/out"),
            video: PathBuf::from("/out/videos/a.mp4"),
            audio: PathBuf::from("/out/audios/a.mp3"),
            captions: vec![],
        };
        state.apply(UiEvent::Finished(Ok(report.clone())));

        assert!(state.controls_enabled);
        assert_eq!(state.status, JobStatus::Done);
        assert_eq!(state.progress_label(), "100.0%");
        assert!(state.status_text.contains("/out"));
        assert_eq!(state.last_report, Some(report));
    }
}
