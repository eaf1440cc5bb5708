//! Terminal presentation: complaint cards, notices and confirmation prompts.

use std::io::{self, BufRead, Write};

use chrono::{DateTime, Utc};
use grievance_core::complaint::Complaint;
use grievance_core::notify::{Confirm, Notifier, Renderer};
use grievance_shared::types::NoticeLevel;

/// Prints the whole list whenever it changes.
pub struct TerminalRenderer;

impl Renderer for TerminalRenderer {
    fn render(&self, complaints: &[Complaint]) {
        let out = render_board(complaints, Utc::now());
        let mut stdout = io::stdout().lock();
        let _ = writeln!(stdout, "\n{out}");
        let _ = stdout.flush();
    }
}

/// Prints notices on their own line.
pub struct TerminalNotifier;

impl Notifier for TerminalNotifier {
    fn notify(&self, message: &str, level: NoticeLevel) {
        let badge = match level {
            NoticeLevel::Info => "[..]",
            NoticeLevel::Success => "[ok]",
            NoticeLevel::Warning => "[!!]",
            NoticeLevel::Error => "[xx]",
        };
        println!("{badge} {message}");
    }
}

/// Asks on stdin, defaulting to no.
pub struct TerminalConfirm;

impl Confirm for TerminalConfirm {
    fn confirm(&self, prompt: &str) -> bool {
        print!("{prompt} [y/N] ");
        let _ = io::stdout().flush();

        let mut answer = String::new();
        let read = tokio::task::block_in_place(|| io::stdin().lock().read_line(&mut answer));
        read.is_ok() && matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
    }
}

/// Formats the full board.
pub fn render_board(complaints: &[Complaint], now: DateTime<Utc>) -> String {
    if complaints.is_empty() {
        return "No complaints yet.".to_string();
    }

    let mut out = format!("== Complaints ({}) ==", complaints.len());
    for complaint in complaints {
        out.push('\n');
        out.push_str(&render_card(complaint, now));
    }
    out
}

/// Formats one complaint card.
pub fn render_card(complaint: &Complaint, now: DateTime<Utc>) -> String {
    let status = if complaint.resolved {
        "RESOLVED"
    } else {
        "OPEN"
    };

    let mut card = format!(
        "\n[{status}] {name}  (id {id})\n  Floor: {floor} | Flat: {flat}\n  Issue: {issue}",
        name = complaint.student_name,
        id = complaint.id,
        floor = complaint.floor_number,
        flat = complaint.flat_number,
        issue = capitalize(&complaint.issue_type),
    );

    if let Some(description) = &complaint.description {
        card.push_str(&format!("\n  {description}"));
    }

    if !complaint.attachments.is_empty() {
        card.push_str("\n  Attachments:");
        for attachment in &complaint.attachments {
            let kind = if attachment.is_image() { "image" } else { "audio" };
            card.push_str(&format!(
                "\n    - {} ({kind}, {}) {}",
                attachment.name,
                format_file_size(attachment.size),
                attachment.url
            ));
        }
    }

    card.push_str(&format!("\n  Posted {}", time_ago(complaint.timestamp, now)));
    card
}

fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Human-readable size with two decimals, e.g. `1.5 KB`.
#[allow(clippy::cast_precision_loss)]
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];

    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }

    let rounded = format!("{size:.2}");
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    format!("{trimmed} {}", UNITS[unit])
}

/// Relative age of a timestamp. Falls back to the date after a week.
pub fn time_ago(timestamp: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let elapsed = now.signed_duration_since(timestamp);
    let minutes = elapsed.num_minutes();
    let hours = elapsed.num_hours();
    let days = elapsed.num_days();

    if minutes < 1 {
        "just now".to_string()
    } else if minutes < 60 {
        plural(minutes, "minute")
    } else if hours < 24 {
        plural(hours, "hour")
    } else if days < 7 {
        plural(days, "day")
    } else {
        timestamp.format("%-d %b %Y").to_string()
    }
}

fn plural(count: i64, unit: &str) -> String {
    if count == 1 {
        format!("1 {unit} ago")
    } else {
        format!("{count} {unit}s ago")
    }
}
