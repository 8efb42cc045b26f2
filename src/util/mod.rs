//
//  pampu
//  util/mod.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! # Utility Module
//!
//! Small helpers shared by the commands.
//!
//! ## Categories
//!
//! - **Time Utilities**: [`relative_time`], [`relative_time_at`], [`format_duration`]
//! - **Text Utilities**: [`strip_html`], [`manual_runner`]
//!
//! ## Example
//!
//! ```rust
//! use pampu::util::{strip_html, relative_time_at};
//!
//! let now = 1_700_000_000_000;
//! assert_eq!(relative_time_at(Some(now - 2 * 3_600_000), now), "2h");
//! assert_eq!(strip_html("Manual run by <a href=\"/u\">Ada</a>"), "Manual run by Ada");
//! ```

use std::time::Duration;

use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;

static HTML_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").unwrap());

static LINK_TEXT: Lazy<Regex> = Lazy::new(|| Regex::new(r">([^<]+)</a>").unwrap());

/// Formats an epoch-millisecond timestamp as a compact age.
///
/// # Returns
///
/// `""` for a missing timestamp, otherwise `now`, `{n}m`, `{n}h`, `{n}d`
/// or `{n}w`.
pub fn relative_time(timestamp_ms: Option<i64>) -> String {
    relative_time_at(timestamp_ms, Utc::now().timestamp_millis())
}

/// Like [`relative_time`], against an explicit current time.
///
/// # Example
///
/// ```rust
/// use pampu::util::relative_time_at;
///
/// let now = 1_700_000_000_000;
/// assert_eq!(relative_time_at(None, now), "");
/// assert_eq!(relative_time_at(Some(now - 30_000), now), "now");
/// assert_eq!(relative_time_at(Some(now - 5 * 60_000), now), "5m");
/// assert_eq!(relative_time_at(Some(now - 15 * 86_400_000), now), "2w");
/// ```
pub fn relative_time_at(timestamp_ms: Option<i64>, now_ms: i64) -> String {
    let Some(timestamp) = timestamp_ms.filter(|t| *t != 0) else {
        return String::new();
    };

    let secs = (now_ms - timestamp) / 1000;
    if secs < 60 {
        "now".to_string()
    } else if secs < 3600 {
        format!("{}m", secs / 60)
    } else if secs < 86400 {
        format!("{}h", secs / 3600)
    } else if secs < 604800 {
        format!("{}d", secs / 86400)
    } else {
        format!("{}w", secs / 604800)
    }
}

/// Formats a duration into a compact string.
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use pampu::util::format_duration;
///
/// assert_eq!(format_duration(Duration::from_secs(45)), "45s");
/// assert_eq!(format_duration(Duration::from_secs(125)), "2m 5s");
/// assert_eq!(format_duration(Duration::from_secs(3665)), "1h 1m");
/// ```
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();

    if secs < 60 {
        format!("{}s", secs)
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m", secs / 3600, (secs % 3600) / 60)
    }
}

/// Removes HTML tags from Bamboo's reason summaries.
pub fn strip_html(text: &str) -> String {
    HTML_TAG.replace_all(text, "").into_owned()
}

/// Extracts who triggered a manual run from a reason summary.
///
/// Bamboo writes `Manual run by <a href="...">Name</a>`.
///
/// # Example
///
/// ```rust
/// use pampu::util::manual_runner;
///
/// let reason = r#"Manual run by <a href="/browse/user/ada">Ada Lovelace</a>"#;
/// assert_eq!(manual_runner(reason).as_deref(), Some("Ada Lovelace"));
/// assert_eq!(manual_runner("Changes by Bob"), None);
/// ```
pub fn manual_runner(reason_summary: &str) -> Option<String> {
    if !reason_summary.contains("Manual run by") {
        return None;
    }
    LINK_TEXT
        .captures(reason_summary)
        .map(|c| c[1].to_string())
}
