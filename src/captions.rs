use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::{
    bridge::StatusBridge,
    error::JobError,
    model::{CaptionTag, CaptionTrack, ResolvedContent},
    resolver::ContentResolver,
};

/// Extension of exported caption files
pub const CAPTION_EXT: &str = "txt";

/// Default preference list: auto-generated Portuguese, then English
pub fn default_caption_tags() -> Vec<CaptionTag> {
    vec![CaptionTag::new("a.pt"), CaptionTag::new("a.en")]
}

/// `<stem>_<lang>_caption.txt`
pub fn caption_file_name(stem: &str, tag: &CaptionTag) -> String {
    format!("{stem}_{}_caption.{CAPTION_EXT}", tag.lang())
}

/// Exports every preferred caption track the content offers as plain text.
///
/// Best effort: content without captions is skipped, a failing track is
/// reported and the remaining tags are still tried.
pub async fn export_captions(
    resolver: &dyn ContentResolver,
    content: &ResolvedContent,
    preferred: &[CaptionTag],
    caption_dir: &Path,
    stem: &str,
    bridge: &StatusBridge,
) -> Vec<PathBuf> {
    let Some(available) = &content.captions else {
        debug!("content exposes no captions");
        return Vec::new();
    };

    bridge.status("Looking for captions...");
    let mut written = Vec::new();
    for tag in preferred {
        let Some(track) = available.get(tag) else {
            debug!(%tag, "caption not offered");
            continue;
        };
        let kind = if tag.is_auto() { " auto-generated" } else { "" };
        bridge.status(format!(
            "Downloading {}{kind} caption...",
            tag.lang().to_uppercase()
        ));
        let path = caption_dir.join(caption_file_name(stem, tag));
        match export_one(resolver, track, &path).await {
            Ok(()) => {
                info!(%tag, path = %path.display(), "caption exported");
                written.push(path);
            }
            Err(e) => {
                warn!(%tag, error = %e, "skipping caption");
                bridge.status(e.to_string());
            }
        }
    }
    written
}

async fn export_one(
    resolver: &dyn ContentResolver,
    track: &CaptionTrack,
    path: &Path,
) -> Result<(), JobError> {
    debug!(tag = %track.tag, format = %track.ext, "fetching caption");
    let body = resolver.fetch_caption(track).await?;
    tokio::fs::write(path, timed_text_to_plain(&body))
        .await
        .map_err(|e| JobError::Caption(format!("{}: {e}", path.display())))
}

/// Reduces a WebVTT (or tagged XML) caption body to its spoken lines.
pub fn timed_text_to_plain(body: &str) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut in_header = body.trim_start().starts_with("WEBVTT");
    let mut in_block = false;

    let mut raws = body.lines().map(str::trim).peekable();
    while let Some(line) = raws.next() {
        if line.is_empty() {
            in_header = false;
            in_block = false;
            continue;
        }
        if in_header || in_block {
            continue;
        }
        if line.starts_with("NOTE") || line.starts_with("STYLE") || line.starts_with("REGION") {
            in_block = true;
            continue;
        }
        if line.contains("-->") {
            continue;
        }
        // cue identifier: a number directly above a timing line
        if line.chars().all(|c| c.is_ascii_digit()) && raws.peek().is_some_and(|next| next.contains("-->")) {
            continue;
        }

        let text = decode_entities(&strip_tags(line));
        let text = text.trim();
        if text.is_empty() || lines.last().is_some_and(|last| last == text) {
            continue;
        }
        lines.push(text.to_owned());
    }

    let mut out = lines.join("\n");
    if !out.is_empty() {
        out.push('\n');
    }
    out
}

fn strip_tags(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut in_tag = false;
    for c in line.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    out
}

fn decode_entities(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}
