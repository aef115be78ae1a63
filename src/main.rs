//! Main application for the video grabber GUI

// Typed job errors
mod error;
// Data models for jobs, streams and captions
mod model;
// Command-line settings
mod config;
// Output folders and file-name stems
mod paths;
// Progress sample math and yt-dlp progress parsing
mod progress;
// Worker-to-UI message channel
mod bridge;
// Window state driven by bridge events
mod state;
// Content resolver seam and its yt-dlp implementation
mod resolver;
mod ytdlp;
// Lowest-resolution video download
mod downloader;
// Caption export
mod captions;
// Audio extraction and its ffmpeg backend
mod audio;
mod ffmpeg;
// Job validation and the sequential pipeline
mod job;

use std::sync::Arc;

use bridge::{StatusBridge, UiEvent};
use clap::Parser;
use config::Settings;
use eframe::{App, Frame, egui};
use egui::Visuals;
use ffmpeg::FfmpegBackend;
use job::{Toolkit, start_job};
use once_cell::sync::OnceCell;
use rfd::{FileDialog, MessageButtons, MessageDialog, MessageLevel};
use state::ShellState;
use tokio::{runtime::Runtime, sync::mpsc::UnboundedReceiver};
use tracing::{info, warn};
use ytdlp::YtDlpResolver;

// Global Tokio runtime stored in a OnceCell for lazy init
static RUNTIME: OnceCell<Runtime> = OnceCell::new();

/// Program entry point: parses settings, starts the runtime and launches the GUI
fn main() -> Result<(), eframe::Error> {
    let settings = Settings::parse();
    tracing_subscriber::fmt()
        .with_max_level(settings.log_level)
        .with_writer(std::io::stderr)
        .init();

    // jobs never overlap, so one worker thread suffices
    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .enable_all()
        .build()
        .expect("failed to start the tokio runtime");
    let _ = RUNTIME.set(rt);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([600.0, 450.0])
            .with_resizable(false),
        ..Default::default()
    };
    eframe::run_native(
        "Video Grabber",
        options,
        Box::new(move |cc| {
            cc.egui_ctx.set_visuals(Visuals::dark());
            Box::new(GrabberApp::new(&settings, cc.egui_ctx.clone()))
        }),
    )
}

/// Application state for the GUI
struct GrabberApp {
    /// Input field for the video URL
    url_input: String,
    /// Base folder for videos, audios and captions
    output_folder: String,
    /// Progress, status line and control lock
    shell: ShellState,
    /// Resolver, media backend and caption preferences
    tools: Arc<Toolkit>,
    /// Bridge receiver of the running job, if any
    events: Option<UnboundedReceiver<UiEvent>>,
    ctx: egui::Context,
}

impl GrabberApp {
    fn new(settings: &Settings, ctx: egui::Context) -> Self {
        let tools = Toolkit {
            resolver: Arc::new(YtDlpResolver::new(&settings.yt_dlp)),
            media: Arc::new(FfmpegBackend::new(&settings.ffmpeg, &settings.ffprobe)),
            caption_tags: settings.caption_tags(),
        };
        info!(captions = ?tools.caption_tags, "window ready");
        Self {
            url_input: String::new(),
            output_folder: settings.output_dir().display().to_string(),
            shell: ShellState::default(),
            tools: Arc::new(tools),
            events: None,
            ctx,
        }
    }

    fn select_output_folder(&mut self) {
        if let Some(folder) = FileDialog::new()
            .set_title("Select the folder to save files into")
            .set_directory(&self.output_folder)
            .pick_folder()
        {
            self.output_folder = folder.display().to_string();
            self.shell.status_text = format!("Files will be saved to: {}", self.output_folder);
        }
    }

    fn start_download(&mut self) {
        let Some(runtime) = RUNTIME.get() else {
            return;
        };
        let (bridge, rx) = StatusBridge::new(Some(self.ctx.clone()));
        match start_job(
            runtime.handle(),
            &self.url_input,
            &self.output_folder,
            Arc::clone(&self.tools),
            bridge,
        ) {
            Ok(_) => {
                self.shell.begin_job();
                self.events = Some(rx);
            }
            Err(e) => {
                warn!(error = %e, "job not started");
                MessageDialog::new()
                    .set_level(MessageLevel::Warning)
                    .set_title("Empty URL")
                    .set_description("Please enter a video URL.")
                    .set_buttons(MessageButtons::Ok)
                    .show();
            }
        }
    }

    /// Applies every queued bridge event on the UI thread.
    fn drain_events(&mut self) {
        let Some(rx) = self.events.as_mut() else {
            return;
        };
        let mut finished = false;
        while let Ok(event) = rx.try_recv() {
            finished |= matches!(event, UiEvent::Finished(_));
            self.shell.apply(event);
        }
        if finished {
            self.events = None;
        }
        if let Some(message) = self.shell.pending_error.take() {
            MessageDialog::new()
                .set_level(MessageLevel::Error)
                .set_title("Download error")
                .set_description(&format!("Could not complete the operation.\nDetails: {message}"))
                .set_buttons(MessageButtons::Ok)
                .show();
        }
    }
}

/// Opens `folder` in the platform file manager without blocking the UI
fn open_folder(folder: std::path::PathBuf) {
    std::thread::spawn(move || {
        #[cfg(target_os = "windows")]
        let opener = "explorer";
        #[cfg(target_os = "macos")]
        let opener = "open";
        #[cfg(all(unix, not(target_os = "macos")))]
        let opener = "xdg-open";
        if let Err(e) = std::process::Command::new(opener).arg(&folder).spawn() {
            warn!(error = %e, folder = %folder.display(), "could not open folder");
        }
    });
}

/// GUI update loop: called each frame to redraw and handle interactions
impl App for GrabberApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut Frame) {
        self.drain_events();
        let enabled = self.shell.controls_enabled;

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("Video Grabber");

            ui.horizontal(|ui| {
                ui.label("Video URL:");
                ui.add_sized(
                    [ui.available_width(), 20.0],
                    egui::TextEdit::singleline(&mut self.url_input),
                );
            });

            ui.horizontal(|ui| {
                ui.label("Save to:");
                ui.add(egui::TextEdit::singleline(&mut self.output_folder).interactive(false));
                if ui.add_enabled(enabled, egui::Button::new("Choose folder...")).clicked() {
                    self.select_output_folder();
                }
            });

            ui.add_space(10.0);
            let download = egui::Button::new("Download content").min_size([ui.available_width(), 32.0].into());
            if ui.add_enabled(enabled, download).clicked() {
                self.start_download();
            }

            ui.add_space(10.0);
            ui.group(|ui| {
                ui.strong("Progress:");
                ui.add(egui::ProgressBar::new(self.shell.progress / 100.0));
                ui.vertical_centered(|ui| ui.label(self.shell.progress_label()));
                ui.add_space(10.0);
                ui.label(egui::RichText::new(&self.shell.status_text).italics());
            });

            // When done, list the artifacts and offer to open their folder
            if let Some(report) = &self.shell.last_report {
                ui.add_space(10.0);
                for file in [&report.video, &report.audio].into_iter().chain(&report.captions) {
                    if let Some(name) = file.file_name() {
                        ui.label(name.to_string_lossy().into_owned());
                    }
                }
                if ui.button("Open Folder").clicked() {
                    open_folder(report.base_dir.clone());
                }
            }
        });
    }
}
