use std::sync::OnceLock;

use regex::Regex;

/// One classified line of yt-dlp stdout (`--newline` mode).
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressLine {
    /// `[download]  45.3% of 10.55MiB at 1.23MiB/s ETA 00:05`
    Fetching { percent: f32, speed: Option<String> },
    /// First `[ExtractAudio]` line, ffmpeg has taken over.
    Converting,
    Other,
}

fn percent_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d+(?:\.\d+)?)%").expect("valid regex"))
}

fn speed_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"at\s+([\d.]+\s*[KMG]i?B/s)").expect("valid regex"))
}

/// Classify a raw stdout line. Percentages come back normalized to 0.0..=1.0.
pub fn parse_line(line: &str) -> ProgressLine {
    let line = line.trim();

    if line.starts_with("[ExtractAudio]") {
        return ProgressLine::Converting;
    }
    if !line.starts_with("[download]") {
        return ProgressLine::Other;
    }

    match percent_re().captures(line) {
        Some(caps) => {
            let percent = caps
                .get(1)
                .and_then(|m| m.as_str().parse::<f32>().ok())
                .unwrap_or(0.0)
                .clamp(0.0, 100.0);
            let speed = speed_re()
                .captures(line)
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_str().to_string());
            ProgressLine::Fetching {
                percent: percent / 100.0,
                speed,
            }
        }
        None => ProgressLine::Other,
    }
}
