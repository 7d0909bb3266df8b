//! Relay cursor
//!
//! The watermark a relay resumes from. Two advance policies exist because the
//! upstream contract advances by `limit`, which skips records whenever a
//! sparse upstream returns a short page that is not the last one.

use super::event_record::EventRecord;
use crate::error::StateSyncError;
use std::fmt;
use std::str::FromStr;

/// How the cursor moves after a page has been delivered.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CursorAdvance {
    /// `from_id += limit`
    #[default]
    ByLimit,
    /// `from_id = max id in the page`
    ByLastId,
}

impl FromStr for CursorAdvance {
    type Err = StateSyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "limit" | "by-limit" => Ok(CursorAdvance::ByLimit),
            "last-id" | "by-last-id" => Ok(CursorAdvance::ByLastId),
            other => Err(StateSyncError::invalid(format!(
                "unknown cursor advance policy: {other}"
            ))),
        }
    }
}

impl fmt::Display for CursorAdvance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CursorAdvance::ByLimit => write!(f, "limit"),
            CursorAdvance::ByLastId => write!(f, "last-id"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RelayCursor {
    from_id: u64,
    limit: u64,
    policy: CursorAdvance,
}

impl RelayCursor {
    pub fn new(from_id: u64, limit: u64, policy: CursorAdvance) -> Self {
        Self {
            from_id,
            limit,
            policy,
        }
    }

    /// Next fetch starts strictly after this id.
    pub fn position(&self) -> u64 {
        self.from_id
    }

    pub fn policy(&self) -> CursorAdvance {
        self.policy
    }

    /// Position after `page` is delivered. Never moves backwards.
    pub fn next_after(&self, page: &[EventRecord]) -> u64 {
        match self.policy {
            CursorAdvance::ByLimit => self.from_id.saturating_add(self.limit),
            CursorAdvance::ByLastId => page
                .iter()
                .map(|r| r.id)
                .max()
                .map_or(self.from_id, |last| last.max(self.from_id)),
        }
    }

    pub fn advance_to(&mut self, position: u64) {
        self.from_id = self.from_id.max(position);
    }
}
