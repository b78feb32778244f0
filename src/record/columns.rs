//! Column catalogue for account rows.
//!
//! The sheet layout is fixed: 61 columns starting at column A, split into
//! three groups that are returned to callers as separate maps.

use std::ops::Range;

use crate::normalize::fold;

/// Number of columns in an account row.
pub const RECORD_WIDTH: usize = 61;

/// Only the leading columns are kept in clean form; nothing past the auth
/// group is ever compared.
pub const CLEAN_COLUMN_LIMIT: usize = 23;

pub const STATUS: usize = 0;
pub const NOTE: usize = 1;
pub const DEVICE_ID: usize = 2;
pub const USER_ID: usize = 3;
pub const UID: usize = 4;
pub const USER_NAME: usize = 5;
pub const EMAIL: usize = 6;
pub const PASSWORD: usize = 7;

/// Column names in sheet order.
pub const COLUMNS: [&str; RECORD_WIDTH] = [
    // auth / identity
    "status",
    "note",
    "device_id",
    "user_id",
    "uid",
    "user_name",
    "email",
    "password",
    "two_fa",
    "email_password",
    "recovery_email",
    "access_token",
    "refresh_token",
    "cookies",
    "proxy",
    "user_agent",
    "device_info",
    "region",
    "phone",
    "created_at",
    "last_login",
    "session_id",
    "avatar_url",
    // activity / stats
    "posts_total",
    "posts_today",
    "post_limit",
    "follows_total",
    "follows_today",
    "follow_limit",
    "likes_today",
    "like_limit",
    "comments_today",
    "comment_limit",
    "followers",
    "following",
    "live_sessions",
    "live_minutes",
    "live_viewers_peak",
    "shop_orders",
    "shop_revenue",
    "shop_products",
    "views_total",
    "last_post_at",
    "last_follow_at",
    "warm_up_day",
    "error_count",
    // AI / content settings
    "persona",
    "tone",
    "target_audience",
    "niche",
    "language",
    "content_style",
    "hashtags",
    "caption_template",
    "reply_style",
    "post_schedule",
    "ai_model",
    "ai_prompt",
    "banned_words",
    "cta_text",
    "bio_template",
];

/// The three field groups of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnGroup {
    Auth,
    Activity,
    Ai,
}

impl ColumnGroup {
    pub const ALL: [ColumnGroup; 3] = [ColumnGroup::Auth, ColumnGroup::Activity, ColumnGroup::Ai];

    /// Column range covered by this group.
    pub fn range(self) -> Range<usize> {
        match self {
            ColumnGroup::Auth => 0..23,
            ColumnGroup::Activity => 23..46,
            ColumnGroup::Ai => 46..RECORD_WIDTH,
        }
    }
}

/// Resolve a caller-supplied column name to its index.
///
/// Accepts any spelling that folds to the catalogue name once spaces and
/// dashes become underscores (`"Device ID"`, `"device-id"`).
pub fn column_index(name: &str) -> Option<usize> {
    let wanted: String = fold(name)
        .chars()
        .map(|c| if c == ' ' || c == '-' { '_' } else { c })
        .collect();
    COLUMNS.iter().position(|c| *c == wanted)
}

/// Spreadsheet column letters for a zero-based column index (`0 -> A`, `60 -> BI`).
pub fn column_letter(index: usize) -> String {
    let mut n = index + 1;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push((b'A' + rem as u8) as char);
        n = (n - 1) / 26;
    }
    letters.iter().rev().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_groups_cover_every_column() {
        let total: usize = ColumnGroup::ALL.iter().map(|g| g.range().len()).sum();
        assert_eq!(total, RECORD_WIDTH);
        assert_eq!(ColumnGroup::Auth.range().end, CLEAN_COLUMN_LIMIT);
    }

    #[test]
    fn test_column_index_spellings() {
        assert_eq!(column_index("status"), Some(STATUS));
        assert_eq!(column_index("Device ID"), Some(DEVICE_ID));
        assert_eq!(column_index("user-name"), Some(USER_NAME));
        assert_eq!(column_index("bio_template"), Some(60));
        assert_eq!(column_index("nonexistent"), None);
    }

    #[test]
    fn test_column_letter() {
        assert_eq!(column_letter(0), "A");
        assert_eq!(column_letter(25), "Z");
        assert_eq!(column_letter(26), "AA");
        assert_eq!(column_letter(RECORD_WIDTH - 1), "BI");
    }
}
