//! Scripted participants for exercising games and the lobby.

use super::Game;
use super::Handle;
use super::Player;
use super::PlayerId;
use crate::ID;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use tokio::sync::mpsc::UnboundedSender;

/// Everything a probe observed, in arrival order.
#[derive(Debug, PartialEq)]
pub enum Note {
    Message(String),
    Started(ID<Game>),
    Finished,
}

/// Match participant that records every capability call into a channel.
pub struct Probe {
    id: PlayerId,
    nick: String,
    alive: AtomicBool,
    feed: UnboundedSender<Note>,
}

impl Probe {
    pub fn new(nick: &str, feed: UnboundedSender<Note>) -> Arc<Self> {
        Arc::new(Self {
            id: PlayerId::default(),
            nick: nick.to_string(),
            alive: AtomicBool::new(true),
            feed,
        })
    }

    /// Makes `alive` report false from here on.
    pub fn kill(&self) {
        self.alive.store(false, Ordering::Relaxed);
    }
}

#[async_trait::async_trait]
impl Player for Probe {
    fn id(&self) -> PlayerId {
        self.id
    }

    fn nickname(&self) -> String {
        self.nick.clone()
    }

    fn alive(&self) -> bool {
        self.alive.load(Ordering::Relaxed)
    }

    async fn send_message(&self, line: &str) {
        let _ = self.feed.send(Note::Message(line.to_string()));
    }

    async fn on_game_started(&self, game: Handle) {
        let _ = self.feed.send(Note::Started(game.id()));
    }

    async fn on_game_finished(&self) {
        let _ = self.feed.send(Note::Finished);
    }
}
