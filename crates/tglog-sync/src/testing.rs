//! Scripted in-memory session for unit tests.

use std::cell::RefCell;

use chrono::{TimeZone, Utc};

use tglog_shared::{DialogsPage, HistoryPage, InputPeer, Message, RemoteError, UserId};

use crate::session::RemoteSession;

/// Unix timestamp of `y-m-d h:00:00` UTC.
pub(crate) fn at(y: i32, m: u32, d: u32, h: u32) -> i64 {
    Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap().timestamp()
}

pub(crate) fn msg(id: i64, date: i64) -> Message {
    Message {
        id,
        sender_id: UserId(1),
        date,
        media: Default::default(),
        text: format!("message {id}"),
    }
}

/// Split `messages` into pages of `limit`, each carrying the full count.
pub(crate) fn history_listing(
    messages: Vec<Message>,
    limit: usize,
) -> Vec<Result<HistoryPage, RemoteError>> {
    let count = messages.len() as u32;
    messages
        .chunks(limit)
        .map(|chunk| {
            Ok(HistoryPage {
                count: Some(count),
                messages: chunk.to_vec(),
                users: Vec::new(),
            })
        })
        .collect()
}

/// Serves canned pages, indexed by `offset / limit`, and records requests.
/// Past the last canned page it answers with an empty page carrying the
/// same count, like the service does.
#[derive(Default)]
pub(crate) struct ScriptedSession {
    dialogs: Vec<DialogsPage>,
    history: Vec<(InputPeer, Vec<Result<HistoryPage, RemoteError>>)>,
    connect_error: Option<RemoteError>,
    history_requests: RefCell<Vec<(InputPeer, u32)>>,
}

impl ScriptedSession {
    pub(crate) fn with_dialogs(mut self, pages: Vec<DialogsPage>) -> Self {
        self.dialogs = pages;
        self
    }

    pub(crate) fn with_history(
        mut self,
        peer: InputPeer,
        pages: Vec<Result<HistoryPage, RemoteError>>,
    ) -> Self {
        self.history.push((peer, pages));
        self
    }

    pub(crate) fn failing_connect(mut self, err: RemoteError) -> Self {
        self.connect_error = Some(err);
        self
    }

    /// Offsets requested from any history listing, in order.
    pub(crate) fn history_offsets(&self) -> Vec<u32> {
        self.history_requests
            .borrow()
            .iter()
            .map(|(_, offset)| *offset)
            .collect()
    }

    pub(crate) fn history_peers(&self) -> Vec<InputPeer> {
        let mut peers: Vec<InputPeer> = Vec::new();
        for (peer, _) in self.history_requests.borrow().iter() {
            if !peers.contains(peer) {
                peers.push(peer.clone());
            }
        }
        peers
    }
}

impl RemoteSession for ScriptedSession {
    async fn connect(&mut self) -> Result<(), RemoteError> {
        match self.connect_error.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    async fn fetch_dialogs_page(&self, offset: u32, limit: u32) -> Result<DialogsPage, RemoteError> {
        let index = (offset / limit) as usize;
        Ok(self.dialogs.get(index).cloned().unwrap_or_else(|| DialogsPage {
            count: self.dialogs.first().and_then(|p| p.count),
            ..Default::default()
        }))
    }

    async fn fetch_history_page(
        &self,
        peer: &InputPeer,
        offset: u32,
        limit: u32,
    ) -> Result<HistoryPage, RemoteError> {
        self.history_requests
            .borrow_mut()
            .push((peer.clone(), offset));

        let pages = self
            .history
            .iter()
            .find(|(p, _)| p == peer)
            .map(|(_, pages)| pages)
            .ok_or_else(|| RemoteError::rpc(400, "PEER_ID_INVALID"))?;

        let index = (offset / limit) as usize;
        match pages.get(index) {
            Some(page) => page.clone(),
            None => Ok(HistoryPage {
                count: pages.first().and_then(|p| p.as_ref().ok()).and_then(|p| p.count),
                ..Default::default()
            }),
        }
    }
}
