use crate::model::ChunkProgress;

/// Prefix of the lines yt-dlp prints through `--progress-template`
pub const PROGRESS_PREFIX: &str = "progress:";

/// Template handed to yt-dlp so every chunk prints `progress:<done>/<total>/<estimate>`
pub const PROGRESS_TEMPLATE: &str = "download:progress:%(progress.downloaded_bytes)s/%(progress.total_bytes)s/%(progress.total_bytes_estimate)s";

/// Completion percentage (0-100) of a download with `bytes_remaining` left.
pub fn progress_sample(total_size: u64, bytes_remaining: u64) -> f32 {
    if total_size == 0 {
        return 0.0;
    }
    let downloaded = total_size - bytes_remaining.min(total_size);
    (downloaded as f64 / total_size as f64 * 100.0) as f32
}

/// Parses one yt-dlp progress line; `fallback_total` is used when the site
/// reports neither an exact nor an estimated size.
pub fn parse_progress_from_line(line: &str, fallback_total: Option<u64>) -> Option<ChunkProgress> {
    let rest = line.trim().strip_prefix(PROGRESS_PREFIX)?;
    let mut fields = rest.split('/').map(parse_bytes);
    let downloaded = fields.next()??;
    let total = fields.next().flatten();
    let estimate = fields.next().flatten();
    let total_size = total.or(estimate).or(fallback_total)?;
    Some(ChunkProgress {
        total_size,
        bytes_remaining: total_size.saturating_sub(downloaded),
    })
}

// yt-dlp prints `NA` for unknown values and floats for estimates
fn parse_bytes(field: &str) -> Option<u64> {
    let field = field.trim();
    field
        .parse::<u64>()
        .ok()
        .or_else(|| field.parse::<f64>().ok().filter(|v| *v >= 0.0).map(|v| v as u64))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_quarter_and_full() {
        assert_eq!(progress_sample(1000, 750), 25.0);
        assert_eq!(progress_sample(1000, 0), 100.0);
    }

    #[test]
    fn sample_is_non_decreasing_as_bytes_arrive() {
        let mut last = 0.0;
        for remaining in (0..=1000).rev().step_by(37) {
            let pct = progress_sample(1000, remaining);
            assert!(pct >= last);
            last = pct;
        }
    }

    #[test]
    fn sample_handles_degenerate_sizes() {
        assert_eq!(progress_sample(0, 0), 0.0);
        assert_eq!(progress_sample(100, 500), 0.0);
    }

    #[test]
    fn parses_exact_total() {
        let p = parse_progress_from_line("progress:250/1000/NA", None).unwrap();
        assert_eq!(p, ChunkProgress { total_size: 1000, bytes_remaining: 750 });
    }

    #[test]
    fn parses_estimate_and_fallback() {
        let p = parse_progress_from_line("progress:10/NA/40.0", None).unwrap();
        assert_eq!(p.total_size, 40);
        assert_eq!(p.bytes_remaining, 30);

        let p = parse_progress_from_line("progress:10/NA/NA", Some(20)).unwrap();
        assert_eq!(p.bytes_remaining, 10);

        assert!(parse_progress_from_line("progress:10/NA/NA", None).is_none());
    }

    #[test]
    fn ignores_other_lines() {
        assert!(parse_progress_from_line("[youtube] abc: Downloading webpage", None).is_none());
        assert!(parse_progress_from_line("progress:NA/100/NA", None).is_none());
    }
}
