//! The four resolution policies.
//!
//! Each selector consumes per-request replica sets (already built and,
//! where the policy needs it, classified) and produces a decision: the
//! replica to open, the destinations still needing a copy, the replicas to
//! move, or the replicas safe to trim. Selectors never touch the catalog;
//! they are pure transformations over the sets they are handed.

mod error;
mod matching;
mod open;
mod phymove;
mod replicate;
mod trim;

pub use error::SelectError;
pub use open::select_for_open;
pub use phymove::{select_for_move, MoveDecision};
pub use replicate::{select_for_replicate, ReplicateDecision};
pub use trim::select_for_trim;
