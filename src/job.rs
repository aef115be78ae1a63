//! One download-and-convert job, run start to finish on a background task.

use std::{path::PathBuf, sync::Arc};

use tokio::{runtime::Handle, task::JoinHandle};
use tracing::{error, info};

use crate::{
    audio::{MediaBackend, extract_audio},
    bridge::StatusBridge,
    captions::export_captions,
    downloader::spawn_download,
    error::JobError,
    model::{CaptionTag, Job, JobReport},
    paths::{prepare_output_dirs, sanitize_title},
    resolver::ContentResolver,
};

/// Collaborators shared by every job
pub struct Toolkit {
    pub resolver: Arc<dyn ContentResolver>,
    pub media: Arc<dyn MediaBackend>,
    /// Caption tags checked in order; every match is exported
    pub caption_tags: Vec<CaptionTag>,
}

/// Validates the input and starts the job on `runtime`.
///
/// An empty URL is rejected here, before any task or file exists.
pub fn start_job(
    runtime: &Handle,
    url: &str,
    base_dir: impl Into<PathBuf>,
    tools: Arc<Toolkit>,
    bridge: StatusBridge,
) -> Result<JoinHandle<()>, JobError> {
    let job = Job::new(url, base_dir)?;
    info!(url = %job.url, base = %job.base_dir.display(), "starting job");
    let worker = runtime.clone();
    Ok(runtime.spawn(async move {
        // a panicking pipeline must still report back so the window unlocks
        let outcome = match worker.spawn(run_pipeline(job, tools, bridge.clone())).await {
            Ok(outcome) => outcome,
            Err(e) => Err(JobError::Runtime(e.to_string())),
        };
        match &outcome {
            Ok(report) => info!(video = %report.video.display(), "job finished"),
            Err(e) => error!(error = %e, "job failed"),
        }
        bridge.finished(outcome.map_err(|e| e.to_string()));
    }))
}

async fn run_pipeline(job: Job, tools: Arc<Toolkit>, bridge: StatusBridge) -> Result<JobReport, JobError> {
    run_job(&job, &tools, &bridge).await
}

/// Runs every stage in order; captions and audio only after the video is on disk.
pub async fn run_job(job: &Job, tools: &Toolkit, bridge: &StatusBridge) -> Result<JobReport, JobError> {
    let paths = prepare_output_dirs(&job.base_dir).await?;

    bridge.status("Connecting...");
    let content = tools.resolver.resolve(&job.url).await?;
    let stem = sanitize_title(&content.title);

    let video = spawn_download(
        tools.resolver.as_ref(),
        &job.url,
        &content,
        paths.videos.clone(),
        &stem,
        bridge,
    )
    .await?;

    let captions = export_captions(
        tools.resolver.as_ref(),
        &content,
        &tools.caption_tags,
        &paths.captions,
        &stem,
        bridge,
    )
    .await;

    let audio = extract_audio(tools.media.as_ref(), &video, &paths.audios, &stem, bridge).await?;

    Ok(JobReport {
        base_dir: paths.base,
        video,
        audio,
        captions,
    })
}
