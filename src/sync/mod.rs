//! Conversation sync: pairing, the single-flight guard, the sync run, and
//! the auto-sync controller.

mod engine;
mod guard;
mod scheduler;
mod types;

pub use engine::{SyncEngine, SyncOutcome};
pub use guard::{SyncLease, SyncState};
pub use scheduler::{AutoSyncController, AutoSyncMode};
pub use types::{ConversationPair, ConversationTurn, Role, pair_turns};
