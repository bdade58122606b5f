//! Identifier generation for new notes
//!
//! Two policies: a formatted millisecond timestamp, strictly increasing
//! within the process, or a plain counter continuing after the largest
//! numeric identifier seen so far.

use crate::analysis::parse_timestamp;
use crate::graph::{NoteId, ZettelError, ZettelResult};
use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, TimeZone, Utc};
use std::fmt::Write;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Timestamp layout used when none is configured
pub const DEFAULT_ID_FORMAT: &str = "%Y%m%d%H%M%S%3f";

/// How new identifiers are allocated
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdPolicy {
    /// Creation time rendered with a strftime `format`
    Timestamp { format: String },
    /// Decimal counter
    Count,
}

impl Default for IdPolicy {
    fn default() -> Self {
        Self::Timestamp {
            format: DEFAULT_ID_FORMAT.to_string(),
        }
    }
}

/// True if chrono accepts every item of a strftime format
pub fn is_valid_format(format: &str) -> bool {
    StrftimeItems::new(format).all(|item| !matches!(item, Item::Error))
}

#[derive(Debug, Default)]
struct GeneratorState {
    last_millis: i64,
    next_count: u64,
    /// Every count up to `u64::MAX` is taken
    exhausted: bool,
}

/// Allocates identifiers according to an [`IdPolicy`]
#[derive(Debug, Default)]
pub struct IdGenerator {
    policy: IdPolicy,
    state: Mutex<GeneratorState>,
}

impl IdGenerator {
    pub fn new(policy: IdPolicy) -> Self {
        Self {
            policy,
            state: Mutex::default(),
        }
    }

    pub fn policy(&self) -> &IdPolicy {
        &self.policy
    }

    fn state(&self) -> MutexGuard<'_, GeneratorState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Allocate the next identifier.
    ///
    /// Under the timestamp policy the timestamp is returned as well, to be
    /// used as the note's creation time. Under the count policy this fails
    /// with `IdsExhausted` once `u64::MAX` has been handed out or seen.
    pub fn next(&self) -> ZettelResult<(NoteId, Option<DateTime<Utc>>)> {
        match &self.policy {
            IdPolicy::Timestamp { format } => {
                let ts = self.next_timestamp();
                Ok((NoteId::from(format_timestamp(format, &ts)), Some(ts)))
            }
            IdPolicy::Count => {
                let mut state = self.state();
                if state.exhausted {
                    return Err(ZettelError::IdsExhausted);
                }
                let count = state.next_count;
                match count.checked_add(1) {
                    Some(next) => state.next_count = next,
                    None => state.exhausted = true,
                }
                Ok((NoteId::from(count.to_string()), None))
            }
        }
    }

    /// Strictly increasing millisecond clock
    fn next_timestamp(&self) -> DateTime<Utc> {
        let mut state = self.state();
        let now = Utc::now().timestamp_millis();
        let millis = if now <= state.last_millis {
            state.last_millis + 1
        } else {
            now
        };
        state.last_millis = millis;
        Utc.timestamp_millis_opt(millis)
            .single()
            .unwrap_or_else(Utc::now)
    }

    /// Account for an existing identifier so the counter never reissues it.
    pub fn observe(&self, id: &NoteId) {
        if let Ok(n) = id.as_str().parse::<u64>() {
            let mut state = self.state();
            match n.checked_add(1) {
                Some(next) => state.next_count = state.next_count.max(next),
                None => state.exhausted = true,
            }
        }
    }

    /// Convert clipboard-style text into an identifier under this policy.
    ///
    /// Timestamps may be RFC 3339, RFC 2822 or any form the note header
    /// accepts. Counts must be non-negative integers.
    pub fn id_from_text(&self, text: &str) -> Option<NoteId> {
        let text = text.trim();
        match &self.policy {
            IdPolicy::Timestamp { format } => {
                let ts = parse_timestamp(text).or_else(|| {
                    DateTime::parse_from_rfc2822(text)
                        .ok()
                        .map(|ts| ts.with_timezone(&Utc))
                })?;
                Some(NoteId::from(format_timestamp(format, &ts)))
            }
            IdPolicy::Count => text.parse::<u64>().ok().map(|n| NoteId::from(n.to_string())),
        }
    }
}

/// Render `ts` with `format`, falling back to the default layout when
/// the format is not usable.
fn format_timestamp(format: &str, ts: &DateTime<Utc>) -> String {
    let mut out = String::new();
    if write!(out, "{}", ts.format(format)).is_ok() {
        return out;
    }
    tracing::warn!(format, "invalid id format, using default");
    out.clear();
    let _ = write!(out, "{}", ts.format(DEFAULT_ID_FORMAT));
    out
}
