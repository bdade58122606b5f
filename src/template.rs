//! Note content templates and link text

use crate::graph::NoteId;
use chrono::{DateTime, SecondsFormat, Utc};

const MODIFIED_KEY: &str = "Modified:";

fn header_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Initial content of a new note
pub fn format_content(id: &NoteId, created: &DateTime<Utc>, title: Option<&str>) -> String {
    let ts = header_timestamp(created);
    let mut content = format!("---\nUID: {id}\nCreated: {ts}\nModified: {ts}\n---\n");
    if let Some(title) = title.map(str::trim).filter(|t| !t.is_empty()) {
        content.push_str("# ");
        content.push_str(title);
        content.push('\n');
    }
    content
}

/// Replace the value of the first `Modified:` line with `now`.
///
/// Returns `None` when the content has no such line.
pub fn stamp_modified(content: &str, now: &DateTime<Utc>) -> Option<String> {
    let mut offset = 0;
    for line in content.split_inclusive('\n') {
        let indent = line.len() - line.trim_start().len();
        if line[indent..].starts_with(MODIFIED_KEY) {
            let body = line.trim_end_matches(['\n', '\r']);
            let ending = &line[body.len()..];
            let mut out = String::with_capacity(content.len());
            out.push_str(&content[..offset + indent]);
            out.push_str(MODIFIED_KEY);
            out.push(' ');
            out.push_str(&header_timestamp(now));
            out.push_str(ending);
            out.push_str(&content[offset + line.len()..]);
            return Some(out);
        }
        offset += line.len();
    }
    None
}

/// `[#id]`
pub fn reference_link(id: &NoteId) -> String {
    format!("[#{}]", id)
}

/// `[[title]]`
pub fn title_link(title: &str) -> String {
    format!("[[{}]]", title)
}

/// `<scheme>://id`
pub fn url_link(scheme: &str, id: &NoteId) -> String {
    format!("{}://{}", scheme, id)
}
