//! The session's player face.

use super::session::Event;
use crate::game;
use crate::game::Player;
use crate::game::PlayerId;
use crate::machine::Mailbox;
use std::sync::Arc;
use std::sync::OnceLock;

/// What the lobby and games hold instead of the session itself. Every
/// capability call becomes an event in the session's mailbox, so game
/// code never touches session state and never blocks on a slow socket.
pub struct Client {
    id: PlayerId,
    nickname: Arc<OnceLock<String>>,
    mailbox: Mailbox<Event>,
}

impl Client {
    pub(crate) fn new(nickname: Arc<OnceLock<String>>, mailbox: Mailbox<Event>) -> Self {
        Self {
            id: PlayerId::default(),
            nickname,
            mailbox,
        }
    }

    pub fn id(&self) -> PlayerId {
        self.id
    }
}

#[async_trait::async_trait]
impl Player for Client {
    fn id(&self) -> PlayerId {
        self.id
    }

    fn nickname(&self) -> String {
        self.nickname
            .get()
            .cloned()
            .expect("nickname read before validation")
    }

    /// The session's mailbox closes exactly when its machine stops, so
    /// this is a faithful liveness signal with no extra bookkeeping.
    fn alive(&self) -> bool {
        self.mailbox.is_open()
    }

    async fn send_message(&self, line: &str) {
        self.mailbox.post(Event::Send(line.to_string()));
    }

    async fn on_game_started(&self, game: game::Handle) {
        self.mailbox.post(Event::Matched(game));
    }

    async fn on_game_finished(&self) {
        self.mailbox.post(Event::Disconnect);
    }
}
