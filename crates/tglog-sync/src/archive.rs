//! Sync every indexed peer into a log sink.

use std::borrow::Cow;
use std::collections::HashMap;

use chrono::{NaiveDate, TimeZone};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};

use tglog_shared::{Message, PeerAddress, UserId, UserRecord};

use crate::dialogs::DialogIndex;
use crate::error::SyncError;
use crate::history::{HistorySyncer, SyncProgress};
use crate::session::RemoteSession;
use crate::traverse::PageTraverser;

/// Where synced days end up.
pub trait LogSink {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Newest day already persisted under `directory`, if any.
    fn resume_point(&self, directory: &str) -> Result<Option<NaiveDate>, Self::Error>;

    /// Persist one day, replacing whatever was stored for it before.
    fn write_day(
        &self,
        directory: &str,
        day: NaiveDate,
        messages: &[Message],
        users: &HashMap<UserId, UserRecord>,
    ) -> Result<(), Self::Error>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub peers: usize,
    pub synced: usize,
    pub skipped: usize,
    pub days_written: usize,
}

/// Connect, index the dialogs and archive every peer.
pub async fn save_logs<S, Tz, W>(
    session: &mut S,
    traverser: PageTraverser,
    tz: Tz,
    progress: Option<UnboundedSender<SyncProgress>>,
    sink: &W,
) -> Result<RunSummary, SyncError>
where
    S: RemoteSession,
    Tz: TimeZone,
    W: LogSink,
{
    session.connect().await.map_err(SyncError::Connection)?;
    debug!("Connected");

    let session = &*session;
    let index = DialogIndex::build(session, &traverser).await?;

    let mut syncer = HistorySyncer::new(session, traverser).with_timezone(tz);
    if let Some(progress) = progress {
        syncer = syncer.with_progress(progress);
    }

    archive_all(&syncer, &index, sink).await
}

/// Sync every peer of `index`, one at a time, and write its days to `sink`.
///
/// A peer that cannot be addressed or whose history fails to download is
/// logged and skipped. Fatal errors ([`SyncError::is_fatal`]) end the run.
pub async fn archive_all<S, Tz, W>(
    syncer: &HistorySyncer<'_, S, Tz>,
    index: &DialogIndex,
    sink: &W,
) -> Result<RunSummary, SyncError>
where
    S: RemoteSession,
    Tz: TimeZone,
    W: LogSink,
{
    let mut summary = RunSummary {
        peers: index.peers().len(),
        ..Default::default()
    };

    for &peer_id in index.peers() {
        let peer = index.peer(peer_id);

        if let PeerAddress::Unresolvable { reason } = &peer.address {
            warn!(peer = %peer.id, name = %peer.display_name, %reason, "No addressing known for peer, skipping");
            summary.skipped += 1;
            continue;
        }

        let resume = sink
            .resume_point(&peer.directory_name)
            .map_err(|e| SyncError::Sink(Box::new(e)))?;
        info!(peer = %peer.id, name = %peer.display_name, ?resume, "Fetching history");

        let history = match syncer.sync_peer(&peer, resume).await {
            Ok(history) => history,
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                warn!(peer = %peer.id, name = %peer.display_name, error = %e, "Failed to fetch history, skipping");
                summary.skipped += 1;
                continue;
            }
        };

        let senders = merge_senders(index.users(), history.senders);
        for (day, messages) in &history.days {
            sink.write_day(&peer.directory_name, *day, messages, &senders)
                .map_err(|e| SyncError::Sink(Box::new(e)))?;
        }

        info!(
            peer = %peer.id,
            name = %peer.display_name,
            days = history.days.len(),
            directory = %peer.directory_name,
            "Done with peer"
        );
        summary.synced += 1;
        summary.days_written += history.days.len();
    }

    info!(
        peers = summary.peers,
        synced = summary.synced,
        skipped = summary.skipped,
        days = summary.days_written,
        "Done saving logs"
    );
    Ok(summary)
}

/// Dialog users plus senders only seen in a peer's history. Records from the
/// dialogs listing win.
fn merge_senders(
    known: &HashMap<UserId, UserRecord>,
    extra: HashMap<UserId, UserRecord>,
) -> Cow<'_, HashMap<UserId, UserRecord>> {
    if extra.keys().all(|id| known.contains_key(id)) {
        return Cow::Borrowed(known);
    }
    let mut all = known.clone();
    for (id, user) in extra {
        all.entry(id).or_insert(user);
    }
    Cow::Owned(all)
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::time::Duration;

    use chrono::Utc;
    use tglog_shared::{
        ChatId, ChatRecord, Dialog, DialogsPage, HistoryPage, InputPeer, PeerId, RemoteError, UserKind,
    };

    use super::*;
    use crate::rate_limit::RateLimiter;
    use crate::testing::{at, history_listing, msg, ScriptedSession};

    #[derive(Debug, thiserror::Error)]
    #[error("disk full")]
    struct DiskFull;

    #[derive(Default)]
    struct MemorySink {
        resume: HashMap<String, NaiveDate>,
        written: RefCell<Vec<(String, NaiveDate, Vec<i64>)>>,
        sender_names: RefCell<Vec<String>>,
        fail_writes: bool,
    }

    impl LogSink for MemorySink {
        type Error = DiskFull;

        fn resume_point(&self, directory: &str) -> Result<Option<NaiveDate>, DiskFull> {
            Ok(self.resume.get(directory).copied())
        }

        fn write_day(
            &self,
            directory: &str,
            day: NaiveDate,
            messages: &[Message],
            users: &HashMap<UserId, UserRecord>,
        ) -> Result<(), DiskFull> {
            if self.fail_writes {
                return Err(DiskFull);
            }
            self.sender_names.borrow_mut().extend(messages.iter().map(|m| {
                users
                    .get(&m.sender_id)
                    .map(UserRecord::display_name)
                    .unwrap_or_else(|| format!("User {}", m.sender_id))
            }));
            self.written.borrow_mut().push((
                directory.to_string(),
                day,
                messages.iter().map(|m| m.id).collect(),
            ));
            Ok(())
        }
    }

    fn user(id: i64, kind: UserKind) -> UserRecord {
        UserRecord {
            id: UserId(id),
            kind,
            first_name: String::new(),
            last_name: String::new(),
            username: Some(format!("user{id}")),
            phone: None,
            access_hash: None,
        }
    }

    fn index(users: Vec<UserRecord>) -> DialogIndex {
        let dialogs = users
            .iter()
            .map(|u| Dialog {
                peer: Some(PeerId::User { user_id: u.id }),
                top_message: None,
                unread_count: 0,
            })
            .collect();
        DialogIndex::from_pages(vec![DialogsPage {
            count: None,
            dialogs,
            users,
            chats: vec![],
        }])
    }

    fn contact(id: i64) -> InputPeer {
        InputPeer::Contact { user_id: UserId(id) }
    }

    fn traverser() -> PageTraverser {
        PageTraverser::new(100, RateLimiter::new(Duration::ZERO))
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    #[tokio::test]
    async fn test_archive_skips_failing_and_unresolvable_peers() {
        let index = index(vec![
            user(1, UserKind::Contact),
            user(2, UserKind::Unknown),
            user(3, UserKind::Contact),
            user(4, UserKind::Contact),
        ]);
        let session = ScriptedSession::default()
            .with_history(contact(1), history_listing(vec![msg(2, at(2024, 3, 2, 9)), msg(1, at(2024, 3, 1, 9))], 100))
            .with_history(contact(3), vec![Err(RemoteError::rpc(500, "INTERNAL"))])
            .with_history(contact(4), history_listing(vec![msg(7, at(2024, 3, 5, 9))], 100));
        let syncer = HistorySyncer::new(&session, traverser()).with_timezone(Utc);
        let sink = MemorySink::default();

        let summary = archive_all(&syncer, &index, &sink).await.unwrap();

        assert_eq!(
            summary,
            RunSummary {
                peers: 4,
                synced: 2,
                skipped: 2,
                days_written: 3
            }
        );
        assert_eq!(session.history_peers(), vec![contact(1), contact(3), contact(4)]);
        assert_eq!(
            *sink.written.borrow(),
            vec![
                ("user1".to_string(), day(1), vec![1]),
                ("user1".to_string(), day(2), vec![2]),
                ("user4".to_string(), day(5), vec![7]),
            ]
        );
    }

    #[tokio::test]
    async fn test_archive_aborts_on_auth_expiry() {
        let index = index(vec![user(1, UserKind::Contact), user(2, UserKind::Contact)]);
        let session = ScriptedSession::default()
            .with_history(contact(1), vec![Err(RemoteError::rpc(401, "AUTH_KEY_UNREGISTERED"))])
            .with_history(contact(2), history_listing(vec![msg(1, at(2024, 3, 1, 9))], 100));
        let syncer = HistorySyncer::new(&session, traverser()).with_timezone(Utc);
        let sink = MemorySink::default();

        let err = archive_all(&syncer, &index, &sink).await.unwrap_err();

        assert!(matches!(err, SyncError::AuthExpired(_)));
        assert_eq!(session.history_peers(), vec![contact(1)]);
        assert!(sink.written.borrow().is_empty());
    }

    #[tokio::test]
    async fn test_archive_passes_resume_point() {
        let index = index(vec![user(1, UserKind::Contact)]);
        let history = vec![
            msg(3, at(2024, 3, 3, 9)),
            msg(2, at(2024, 3, 2, 9)),
            msg(1, at(2024, 3, 1, 9)),
        ];
        let session = ScriptedSession::default().with_history(contact(1), history_listing(history, 100));
        let syncer = HistorySyncer::new(&session, traverser()).with_timezone(Utc);
        let sink = MemorySink {
            resume: HashMap::from([("user1".to_string(), day(2))]),
            ..Default::default()
        };

        archive_all(&syncer, &index, &sink).await.unwrap();

        let days: Vec<NaiveDate> = sink.written.borrow().iter().map(|(_, d, _)| *d).collect();
        assert_eq!(days, vec![day(2), day(3)]);
    }

    #[tokio::test]
    async fn test_archive_sink_failure_is_fatal() {
        let index = index(vec![user(1, UserKind::Contact), user(2, UserKind::Contact)]);
        let session = ScriptedSession::default()
            .with_history(contact(1), history_listing(vec![msg(1, at(2024, 3, 1, 9))], 100))
            .with_history(contact(2), history_listing(vec![msg(2, at(2024, 3, 1, 9))], 100));
        let syncer = HistorySyncer::new(&session, traverser()).with_timezone(Utc);
        let sink = MemorySink {
            fail_writes: true,
            ..Default::default()
        };

        let err = archive_all(&syncer, &index, &sink).await.unwrap_err();

        assert!(matches!(err, SyncError::Sink(_)));
        assert_eq!(session.history_peers(), vec![contact(1)]);
    }

    #[tokio::test]
    async fn test_user_and_chat_with_same_name_write_separate_days() {
        let mut team_user = user(1, UserKind::Contact);
        team_user.username = Some("team".into());
        let index = DialogIndex::from_pages(vec![DialogsPage {
            count: None,
            dialogs: vec![
                Dialog { peer: Some(PeerId::User { user_id: UserId(1) }), top_message: None, unread_count: 0 },
                Dialog { peer: Some(PeerId::Chat { chat_id: ChatId(2) }), top_message: None, unread_count: 0 },
            ],
            users: vec![team_user],
            chats: vec![ChatRecord { id: ChatId(2), title: "team".into() }],
        }]);
        let session = ScriptedSession::default()
            .with_history(contact(1), history_listing(vec![msg(10, at(2024, 3, 1, 9))], 100))
            .with_history(
                InputPeer::Chat { chat_id: ChatId(2) },
                history_listing(vec![msg(20, at(2024, 3, 1, 10))], 100),
            );
        let syncer = HistorySyncer::new(&session, traverser()).with_timezone(Utc);
        let sink = MemorySink::default();

        archive_all(&syncer, &index, &sink).await.unwrap();

        assert_eq!(
            *sink.written.borrow(),
            vec![
                ("team".to_string(), day(1), vec![10]),
                ("Chat 2".to_string(), day(1), vec![20]),
            ]
        );
    }

    #[tokio::test]
    async fn test_history_senders_are_available_to_sink() {
        let index = DialogIndex::from_pages(vec![DialogsPage {
            count: None,
            dialogs: vec![Dialog { peer: Some(PeerId::Chat { chat_id: ChatId(2) }), top_message: None, unread_count: 0 }],
            users: vec![user(1, UserKind::Contact)],
            chats: vec![ChatRecord { id: ChatId(2), title: "Team".into() }],
        }]);
        let mut from_stranger = msg(2, at(2024, 3, 1, 10));
        from_stranger.sender_id = UserId(40);
        let mut stranger = user(40, UserKind::Foreign);
        stranger.first_name = "Grace".into();
        let session = ScriptedSession::default().with_history(
            InputPeer::Chat { chat_id: ChatId(2) },
            vec![Ok(HistoryPage {
                count: None,
                messages: vec![msg(1, at(2024, 3, 1, 9)), from_stranger],
                users: vec![stranger],
            })],
        );
        let syncer = HistorySyncer::new(&session, traverser()).with_timezone(Utc);
        let sink = MemorySink::default();

        archive_all(&syncer, &index, &sink).await.unwrap();

        assert_eq!(*sink.sender_names.borrow(), vec!["user1", "Grace"]);
    }

    #[test]
    fn test_merge_senders_keeps_dialog_records() {
        let known = HashMap::from([(UserId(1), user(1, UserKind::Contact))]);
        let mut renamed = user(1, UserKind::Contact);
        renamed.username = Some("other".into());

        let same = merge_senders(&known, HashMap::from([(UserId(1), renamed)]));
        assert!(matches!(same, Cow::Borrowed(_)));

        let merged = merge_senders(&known, HashMap::from([(UserId(2), user(2, UserKind::Foreign))]));
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[&UserId(1)].username.as_deref(), Some("user1"));
    }

    #[tokio::test]
    async fn test_save_logs_end_to_end() {
        let mut session = ScriptedSession::default()
            .with_dialogs(vec![DialogsPage {
                count: None,
                dialogs: vec![
                    Dialog { peer: Some(PeerId::User { user_id: UserId(9) }), top_message: None, unread_count: 0 },
                    Dialog { peer: Some(PeerId::User { user_id: UserId(1) }), top_message: None, unread_count: 2 },
                ],
                users: vec![user(9, UserKind::Contact), user(1, UserKind::Contact)],
                chats: vec![],
            }])
            .with_history(contact(1), history_listing(vec![msg(1, at(2024, 3, 1, 9))], 100))
            .with_history(contact(9), history_listing(vec![msg(5, at(2024, 3, 4, 9))], 100));
        let sink = MemorySink::default();

        let summary = save_logs(&mut session, traverser(), Utc, None, &sink).await.unwrap();

        assert_eq!(summary.synced, 2);
        assert_eq!(session.history_peers(), vec![contact(1), contact(9)]);
        assert_eq!(sink.written.borrow().len(), 2);
    }

    #[tokio::test]
    async fn test_save_logs_connect_failure_is_fatal() {
        let mut session = ScriptedSession::default()
            .failing_connect(RemoteError::Transport("refused".into()));
        let sink = MemorySink::default();

        let err = save_logs(&mut session, traverser(), Utc, None, &sink)
            .await
            .unwrap_err();

        assert!(matches!(err, SyncError::Connection(_)));
        assert!(err.is_fatal());
        assert!(session.history_offsets().is_empty());
    }
}
