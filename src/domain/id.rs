//! Client-minted identifiers and timestamps.
//!
//! The remote store has no id generator and no server clock we control,
//! so both are minted here. ULIDs are time-ordered, which keeps appended
//! rows roughly sorted by creation and makes id collisions across
//! concurrent clients a non-concern.

use chrono::{SecondsFormat, Utc};
use ulid::Ulid;

/// Mints a fresh ULID string (26 chars, Crockford base32).
pub fn mint_id() -> String {
    Ulid::new().to_string()
}

/// Current instant as an RFC3339 text cell.
///
/// Microsecond precision so two writes in the same second still produce
/// distinct `updated_at` tokens for the optimistic check.
pub fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}
