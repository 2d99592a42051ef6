use std::io::Write;

use chrono::Local;
use vidfetch_core::{AppViewModel, NoticeLevel, RetrievalState, SessionRowView};

const MAX_URL_LEN: usize = 50;

/// Prints the view to stdout, skipping lines already shown.
#[derive(Debug, Default)]
pub struct TerminalRenderer {
    quiet: bool,
    shown: Vec<String>,
}

impl TerminalRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// A renderer that tracks lines but never prints; used by tests.
    pub fn quiet() -> Self {
        Self {
            quiet: true,
            shown: Vec::new(),
        }
    }

    pub fn render(&mut self, view: &AppViewModel) {
        let lines = render_lines(view);
        if lines == self.shown {
            return;
        }
        if !self.quiet {
            let mut out = std::io::stdout().lock();
            for line in lines.iter().filter(|line| !self.shown.contains(line)) {
                let _ = writeln!(out, "{line}");
            }
        }
        self.shown = lines;
    }
}

pub fn render_lines(view: &AppViewModel) -> Vec<String> {
    let mut lines = Vec::new();
    if view.submitting {
        lines.push("Starting download...".to_string());
    }
    for row in &view.sessions {
        lines.extend(session_lines(row));
    }
    if let Some(notice) = &view.notice {
        let prefix = match notice.level {
            NoticeLevel::Info => "",
            NoticeLevel::Error => "! ",
        };
        lines.push(format!("{prefix}{}", notice.text));
    }
    lines
}

fn session_lines(row: &SessionRowView) -> Vec<String> {
    let mut lines = vec![format!(
        "[{}] {}  quality: {}  format: {}  {}",
        row.status_text,
        truncate_url(&row.source_url),
        row.quality,
        row.format,
        row.created_at.with_timezone(&Local).format("%H:%M:%S"),
    )];
    if let Some(error) = &row.error_message {
        lines.push(format!("    Error: {error}"));
    }
    if let Some(RetrievalState::InFlight) = &row.retrieval {
        lines.push("    Downloading file...".to_string());
    }
    lines
}

fn truncate_url(url: &str) -> String {
    match url.char_indices().nth(MAX_URL_LEN) {
        Some((idx, _)) => format!("{}...", &url[..idx]),
        None => url.to_string(),
    }
}
