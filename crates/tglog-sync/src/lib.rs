//! # tglog-sync
//!
//! Paginated history traversal and incremental sync.
//!
//! The pieces, leaves first:
//! - [`RateLimiter`] spaces consecutive page requests
//! - [`PageTraverser`] walks any count-bearing listing to the end, or until a
//!   stop predicate fires
//! - [`DialogIndex`] folds the dialogs listing into an ordered peer list and
//!   the users/chats it references
//! - [`HistorySyncer`] pulls one peer's history and groups it by day
//! - [`archive_all`] drives the syncer over every peer and hands the days to
//!   a [`LogSink`]
//!
//! Everything runs sequentially: one request in flight, one peer at a time.

pub mod archive;
pub mod dialogs;
pub mod error;
pub mod history;
pub mod rate_limit;
pub mod session;
pub mod traverse;

#[cfg(test)]
mod testing;

pub use archive::{archive_all, save_logs, LogSink, RunSummary};
pub use dialogs::{DialogIndex, Peer};
pub use error::SyncError;
pub use history::{group_by_day, DayGroups, HistorySyncer, PeerHistory, SyncProgress};
pub use rate_limit::RateLimiter;
pub use session::{LoginSession, RemoteSession};
pub use traverse::PageTraverser;
