//! Versioned upgrades for persisted conversations
//!
//! Every record carries a `version`. Records written before the field
//! existed deserialize as [`LEGACY_VERSION`]. [`migrate`] walks the
//! [`MIGRATIONS`] table from the record's version up to
//! [`CURRENT_VERSION`], applying each step in order.

use super::short_id;
use super::types::Conversation;

/// Version assumed for records without a `version` field
pub const LEGACY_VERSION: u32 = 1;

/// Version written by this build
pub const CURRENT_VERSION: u32 = 2;

/// A single upgrade step, from `version` to `version + 1`
type MigrationStep = fn(&mut Conversation);

/// Upgrade steps keyed by the version they upgrade from
pub const MIGRATIONS: &[(u32, MigrationStep)] = &[(1, assign_short_id)];

/// Outcome of running the migration table over a record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Migration {
    /// Record was already current
    Unchanged,
    /// Record was upgraded and should be re-persisted
    Upgraded {
        /// Version found on disk
        from: u32,
    },
    /// Record was written by a newer build
    Unsupported {
        /// Version found on disk
        found: u32,
    },
}

/// v1 -> v2: records created before short ids existed get one derived from
/// their creation instant.
fn assign_short_id(conversation: &mut Conversation) {
    if conversation.short_id.trim().is_empty() {
        conversation.short_id = short_id::encode(conversation.metadata.created_at.timestamp_millis());
    }
}

/// Bring `conversation` up to [`CURRENT_VERSION`]
///
/// Only `version` and fields a step explicitly targets are touched; messages
/// and metadata are left as loaded.
pub fn migrate(conversation: &mut Conversation) -> Migration {
    let from = conversation.version;
    if from > CURRENT_VERSION {
        return Migration::Unsupported { found: from };
    }

    let missing_short_id = conversation.short_id.trim().is_empty();
    if from == CURRENT_VERSION && !missing_short_id {
        return Migration::Unchanged;
    }

    // MIGRATIONS is ordered by source version.
    for (step_from, step) in MIGRATIONS {
        if *step_from >= from {
            step(conversation);
        }
    }
    // Short ids are required at every version after 1.
    assign_short_id(conversation);
    conversation.version = CURRENT_VERSION;

    Migration::Upgraded { from }
}
