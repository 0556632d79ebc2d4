//! Registry of live connections.

use super::session::Event;
use crate::game::PlayerId;
use crate::machine::Mailbox;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// Who is plugged in right now. Purely observational: sessions run
/// themselves, and a stale entry here costs nothing but a map slot until
/// the next sweep prunes it.
pub struct Switchboard {
    lines: RwLock<HashMap<PlayerId, Mailbox<Event>>>,
}

impl Switchboard {
    pub fn new() -> Self {
        Self {
            lines: RwLock::new(HashMap::new()),
        }
    }

    pub async fn connect(&self, id: PlayerId, mailbox: Mailbox<Event>) {
        self.lines.write().await.insert(id, mailbox);
    }

    pub async fn disconnect(&self, id: &PlayerId) {
        self.lines.write().await.remove(id);
    }

    /// Number of sessions still running, after pruning the stopped ones.
    pub async fn census(&self) -> usize {
        let mut lines = self.lines.write().await;
        lines.retain(|_, mailbox| mailbox.is_open());
        lines.len()
    }

    /// Sweeps once a second and logs the census whenever it changes.
    pub fn patrol(self: &Arc<Self>, rt: &tokio::runtime::Handle) {
        let board = self.clone();
        rt.spawn(async move {
            let mut logged = 0;
            let mut tick = tokio::time::interval(Duration::from_secs(1));
            loop {
                tick.tick().await;
                let count = board.census().await;
                if count != logged {
                    log::info!("[switchboard] active sessions: {}", count);
                    logged = count;
                }
            }
        });
    }
}

impl Default for Switchboard {
    fn default() -> Self {
        Self::new()
    }
}
