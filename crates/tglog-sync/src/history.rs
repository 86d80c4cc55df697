//! Per-peer history sync and day grouping.

use std::collections::{BTreeMap, HashMap};

use chrono::{Local, NaiveDate, TimeZone};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, warn};

use tglog_shared::{HistoryPage, Message, Paged, PeerAddress, PeerId, UserId, UserRecord};

use crate::dialogs::Peer;
use crate::error::SyncError;
use crate::session::RemoteSession;
use crate::traverse::PageTraverser;

/// Messages of one peer bucketed by calendar day, each bucket in ascending
/// id order with no repeated ids.
pub type DayGroups = BTreeMap<NaiveDate, Vec<Message>>;

/// What one peer sync produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PeerHistory {
    pub days: DayGroups,
    /// User records embedded in the history pages, by id.
    pub senders: HashMap<UserId, UserRecord>,
}

/// Completion of the current peer's traversal, from 0.0 to 1.0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SyncProgress {
    pub peer: PeerId,
    pub fraction: f64,
}

pub struct HistorySyncer<'s, S, Tz: TimeZone = Local> {
    session: &'s S,
    traverser: PageTraverser,
    tz: Tz,
    progress: Option<UnboundedSender<SyncProgress>>,
}

impl<'s, S: RemoteSession> HistorySyncer<'s, S, Local> {
    /// Syncer bucketing by the local calendar.
    pub fn new(session: &'s S, traverser: PageTraverser) -> Self {
        Self {
            session,
            traverser,
            tz: Local,
            progress: None,
        }
    }
}

impl<'s, S: RemoteSession, Tz: TimeZone> HistorySyncer<'s, S, Tz> {
    pub fn with_timezone<T: TimeZone>(self, tz: T) -> HistorySyncer<'s, S, T> {
        HistorySyncer {
            session: self.session,
            traverser: self.traverser,
            tz,
            progress: self.progress,
        }
    }

    pub fn with_progress(mut self, progress: UnboundedSender<SyncProgress>) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn timezone(&self) -> &Tz {
        &self.tz
    }

    /// Fetch `peer`'s history and group it by day, collecting the sender
    /// records the pages carried along the way.
    ///
    /// With a `resume` day, paging stops at the first page holding a message
    /// older than that day, and older messages are dropped from the result.
    /// The resume day itself is returned in full, so callers must replace
    /// its file rather than append to it.
    pub async fn sync_peer(
        &self,
        peer: &Peer,
        resume: Option<NaiveDate>,
    ) -> Result<PeerHistory, SyncError> {
        let input = match &peer.address {
            PeerAddress::Resolved(input) => input,
            PeerAddress::Unresolvable { reason } => {
                return Err(SyncError::PeerUnresolved {
                    peer: peer.id,
                    reason: reason.clone(),
                });
            }
        };

        debug!(peer = %peer.id, ?resume, "Syncing history");
        self.report(peer.id, 0.0);

        let session = self.session;
        let mut seen = 0usize;
        let pages = self
            .traverser
            .traverse_until(
                move |offset, limit| session.fetch_history_page(input, offset, limit),
                0,
                |page: &HistoryPage| {
                    seen += page.item_count();
                    if let Some(total) = page.total_count() {
                        self.report(peer.id, completion(seen, total));
                    }
                    resume.is_some_and(|resume| {
                        page.messages
                            .iter()
                            .filter_map(|m| day_of(m, &self.tz))
                            .any(|day| day < resume)
                    })
                },
            )
            .await?;

        self.report(peer.id, 1.0);

        let mut senders = HashMap::new();
        let mut messages = Vec::new();
        for page in pages {
            for user in page.users {
                senders.insert(user.id, user);
            }
            messages.extend(page.messages);
        }

        let days = group_by_day(messages, &self.tz, resume);
        debug!(peer = %peer.id, days = days.len(), senders = senders.len(), "History grouped");
        Ok(PeerHistory { days, senders })
    }

    fn report(&self, peer: PeerId, fraction: f64) {
        if let Some(tx) = &self.progress {
            // A dropped receiver only means nobody is watching.
            let _ = tx.send(SyncProgress { peer, fraction });
        }
    }
}

/// Bucket messages by calendar day in `tz`.
///
/// Messages from before `resume` are dropped. Buckets are sorted by id, the
/// authoritative order (timestamps may tie or go backwards), and a message
/// repeated across pages is kept once.
pub fn group_by_day<Tz: TimeZone>(
    messages: impl IntoIterator<Item = Message>,
    tz: &Tz,
    resume: Option<NaiveDate>,
) -> DayGroups {
    let mut days = DayGroups::new();

    for message in messages {
        let Some(day) = day_of(&message, tz) else {
            warn!(id = message.id, date = message.date, "Dropping message with invalid timestamp");
            continue;
        };
        if resume.is_some_and(|resume| day < resume) {
            continue;
        }
        days.entry(day).or_default().push(message);
    }

    for bucket in days.values_mut() {
        bucket.sort_by_key(|m| m.id);
        bucket.dedup_by_key(|m| m.id);
    }

    days
}

fn day_of<Tz: TimeZone>(message: &Message, tz: &Tz) -> Option<NaiveDate> {
    tz.timestamp_opt(message.date, 0)
        .single()
        .map(|dt| dt.date_naive())
}

fn completion(seen: usize, total: u32) -> f64 {
    if total == 0 {
        return 1.0;
    }
    (seen as f64 / f64::from(total)).clamp(0.0, 1.0)
}
