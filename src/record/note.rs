//! Structured view of the free-text note column.
//!
//! A note is a status line, optionally followed by a run counter line:
//!
//! ```text
//! Running on dev-7
//! #3 | 2026-10-16 09:41
//! ```
//!
//! The counter tracks how many times a row was picked up today. Notes that
//! do not carry a counter line (hand-written ones included) parse with
//! `run_count = None`.

use chrono::{NaiveDate, NaiveDateTime};

const STAMP_FORMAT: &str = "%Y-%m-%d %H:%M";

/// How a note is rewritten.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteMode {
    /// Drop the counter entirely.
    New,
    /// Keep the count (starting at 1) and stamp the current time.
    Updated,
    /// Bump the count if the last stamp is from today, otherwise restart at 1.
    Reset,
    /// Same counting rule as [`NoteMode::Reset`]; used when a row is claimed.
    Claim,
}

/// Parsed note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Note {
    pub status_line: String,
    pub run_count: Option<u32>,
    pub stamped_at: Option<NaiveDateTime>,
}

impl Note {
    pub fn parse(text: &str) -> Self {
        let mut lines = text.lines();
        let status_line = lines.next().unwrap_or("").trim().to_string();

        let mut run_count = None;
        let mut stamped_at = None;
        for line in lines {
            if let Some((count, stamp)) = parse_counter_line(line) {
                run_count = Some(count);
                stamped_at = stamp;
                break;
            }
        }

        Self {
            status_line,
            run_count,
            stamped_at,
        }
    }

    /// Produce the next note for `status_line` under `mode`.
    pub fn advance(&self, status_line: &str, mode: NoteMode, now: NaiveDateTime) -> Note {
        let status_line = status_line.trim().to_string();
        match mode {
            NoteMode::New => Note {
                status_line,
                run_count: None,
                stamped_at: None,
            },
            NoteMode::Updated => Note {
                status_line,
                run_count: Some(self.run_count.unwrap_or(1)),
                stamped_at: Some(now),
            },
            NoteMode::Reset | NoteMode::Claim => {
                let today = now.date();
                let count = match (self.run_count, self.stamped_date()) {
                    (Some(count), Some(date)) if date == today => count.saturating_add(1),
                    _ => 1,
                };
                Note {
                    status_line,
                    run_count: Some(count),
                    stamped_at: Some(now),
                }
            }
        }
    }

    pub fn stamped_date(&self) -> Option<NaiveDate> {
        self.stamped_at.map(|t| t.date())
    }

    pub fn render(&self) -> String {
        match (self.run_count, self.stamped_at) {
            (Some(count), Some(at)) => {
                format!("{}\n#{} | {}", self.status_line, count, at.format(STAMP_FORMAT))
            }
            (Some(count), None) => format!("{}\n#{}", self.status_line, count),
            _ => self.status_line.clone(),
        }
    }
}

/// Rewrite raw note text in one step.
pub fn rewrite(current: &str, status_line: &str, mode: NoteMode, now: NaiveDateTime) -> String {
    Note::parse(current).advance(status_line, mode, now).render()
}

fn parse_counter_line(line: &str) -> Option<(u32, Option<NaiveDateTime>)> {
    let rest = line.trim().strip_prefix('#')?;
    let (count, stamp) = match rest.split_once('|') {
        Some((count, stamp)) => (count, Some(stamp)),
        None => (rest, None),
    };
    let count = count.trim().parse::<u32>().ok()?;
    let stamp = stamp.and_then(|s| NaiveDateTime::parse_from_str(s.trim(), STAMP_FORMAT).ok());
    Some((count, stamp))
}
