//! The only path from the background worker to the window.
//!
//! Updates are queued on an unbounded channel and drained by the UI thread on
//! its next frame; the worker never touches UI state itself.

use eframe::egui;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};

use crate::model::JobReport;

/// Message posted from the worker to the UI thread
#[derive(Clone, Debug)]
pub enum UiEvent {
    /// Completion percentage of the running download (0-100)
    Progress(f32),
    /// Replaces the status line
    Status(String),
    /// Terminal outcome; the error is already rendered for display
    Finished(Result<JobReport, String>),
}

/// Worker-side handle of the bridge
#[derive(Clone)]
pub struct StatusBridge {
    tx: UnboundedSender<UiEvent>,
    repaint: Option<egui::Context>,
}

impl StatusBridge {
    /// Creates a bridge plus the receiver the UI loop drains.
    pub fn new(repaint: Option<egui::Context>) -> (Self, UnboundedReceiver<UiEvent>) {
        let (tx, rx) = unbounded_channel();
        (Self { tx, repaint }, rx)
    }

    pub fn progress(&self, percentage: f32) {
        self.post(UiEvent::Progress(percentage));
    }

    pub fn status(&self, message: impl Into<String>) {
        self.post(UiEvent::Status(message.into()));
    }

    pub fn finished(&self, outcome: Result<JobReport, String>) {
        self.post(UiEvent::Finished(outcome));
    }

    // Fire and forget: a closed window simply drops the update
    fn post(&self, event: UiEvent) {
        let _ = self.tx.send(event);
        if let Some(ctx) = &self.repaint {
            ctx.request_repaint();
        }
    }
}
