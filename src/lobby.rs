//! Lock-free single-slot matchmaker.
//!
//! The whole lobby is one atomic slot. A player asking for a game first
//! tries to take whoever is parked there; if the slot was empty they park
//! themselves instead. Both steps are single atomic operations, so any
//! number of sessions can ask concurrently and every player ends up
//! either seated in exactly one new game or parked exactly once.

use crate::game::Game;
use crate::game::Player;
use arc_swap::ArcSwapOption;
use std::sync::Arc;

/// One player parked in the slot. `ArcSwapOption` needs a sized pointee,
/// which the trait object alone is not.
struct Waiting {
    player: Arc<dyn Player>,
}

/// Pairs waiting players into games.
pub struct Lobby {
    slot: ArcSwapOption<Waiting>,
    games: tokio::runtime::Handle,
}

impl Lobby {
    /// `games` is the runtime where created matches will run.
    pub fn new(games: tokio::runtime::Handle) -> Self {
        Self {
            slot: ArcSwapOption::new(None),
            games,
        }
    }

    /// Matches `player` with the current waiter, or parks them in the
    /// slot. A lost race on either step retries from the top; every
    /// attempt either completes a match or parks, so the loop runs only
    /// as long as other requests keep winning.
    pub fn request_game(&self, player: Arc<dyn Player>) {
        loop {
            match self.slot.swap(None) {
                Some(waiting) if waiting.player.id() != player.id() => {
                    log::info!(
                        "[lobby] pairing {} with {}",
                        waiting.player.nickname(),
                        player.nickname()
                    );
                    Game::new([waiting.player.clone(), player]).start(&self.games);
                    return;
                }
                _ => {
                    let claim = Some(Arc::new(Waiting { player: player.clone() }));
                    let seen = self.slot.compare_and_swap(&None::<Arc<Waiting>>, claim);
                    if seen.is_none() {
                        log::debug!("[lobby] {} waiting", player.nickname());
                        return;
                    }
                }
            }
        }
    }

    /// Withdraws `player`, but only if they are the one in the slot. A
    /// no-op when the player already got matched or was never parked.
    pub fn unregister(&self, player: &dyn Player) {
        let seen = self.slot.load();
        if let Some(waiting) = seen.as_ref() {
            if waiting.player.id() == player.id() {
                let _ = self.slot.compare_and_swap(&*seen, None);
                log::debug!("[lobby] {} withdrew", player.nickname());
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn occupant(&self) -> Option<crate::game::PlayerId> {
        self.slot.load().as_ref().map(|w| w.player.id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::doubles::Note;
    use crate::game::doubles::Probe;
    use std::time::Duration;
    use tokio::sync::mpsc::UnboundedReceiver;
    use tokio::sync::mpsc::unbounded_channel;

    fn probe(nick: &str) -> (Arc<Probe>, UnboundedReceiver<Note>) {
        let (tx, rx) = unbounded_channel();
        (Probe::new(nick, tx), rx)
    }

    fn lobby() -> Arc<Lobby> {
        Arc::new(Lobby::new(tokio::runtime::Handle::current()))
    }

    async fn started(rx: &mut UnboundedReceiver<Note>) -> crate::ID<Game> {
        match tokio::time::timeout(Duration::from_secs(1), rx.recv()).await {
            Ok(Some(Note::Started(id))) => id,
            other => panic!("expected a game start, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn two_requests_make_a_match() {
        let lobby = lobby();
        let (alice, mut heard_a) = probe("alice");
        let (bob, mut heard_b) = probe("bob");
        lobby.request_game(alice.clone());
        assert_eq!(lobby.occupant(), Some(alice.id()));
        lobby.request_game(bob.clone());
        assert_eq!(lobby.occupant(), None);
        assert_eq!(started(&mut heard_a).await, started(&mut heard_b).await);
    }

    #[tokio::test]
    async fn asking_twice_does_not_self_match() {
        let lobby = lobby();
        let (alice, mut heard_a) = probe("alice");
        lobby.request_game(alice.clone());
        lobby.request_game(alice.clone());
        assert_eq!(lobby.occupant(), Some(alice.id()));
        let note = tokio::time::timeout(Duration::from_millis(100), heard_a.recv()).await;
        assert!(note.is_err(), "matched with self: {:?}", note);
    }

    #[tokio::test]
    async fn unregister_vacates_only_your_own_seat() {
        let lobby = lobby();
        let (alice, _heard_a) = probe("alice");
        let (bob, _heard_b) = probe("bob");
        lobby.request_game(alice.clone());
        lobby.unregister(bob.as_ref());
        assert_eq!(lobby.occupant(), Some(alice.id()));
        lobby.unregister(alice.as_ref());
        assert_eq!(lobby.occupant(), None);
    }

    #[tokio::test]
    async fn unregister_after_matching_is_a_noop() {
        let lobby = lobby();
        let (alice, mut heard_a) = probe("alice");
        let (bob, mut heard_b) = probe("bob");
        lobby.request_game(alice.clone());
        lobby.request_game(bob.clone());
        started(&mut heard_a).await;
        started(&mut heard_b).await;
        lobby.unregister(alice.as_ref());
        lobby.unregister(bob.as_ref());
        assert_eq!(lobby.occupant(), None);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn three_concurrent_requests_pair_two() {
        let lobby = lobby();
        let mut probes = Vec::new();
        let mut tasks = Vec::new();
        for nick in ["alice", "bob", "carol"] {
            let (player, heard) = probe(nick);
            let lobby = lobby.clone();
            let contender: Arc<dyn Player> = player.clone();
            tasks.push(tokio::spawn(async move { lobby.request_game(contender) }));
            probes.push((player, heard));
        }
        for task in tasks {
            task.await.unwrap();
        }
        let parked = lobby.occupant().expect("odd one out should be parked");
        let mut games = Vec::new();
        for (player, heard) in probes.iter_mut() {
            if player.id() == parked {
                let note = tokio::time::timeout(Duration::from_millis(100), heard.recv()).await;
                assert!(note.is_err(), "parked player saw {:?}", note);
            } else {
                games.push(started(heard).await);
            }
        }
        assert_eq!(games.len(), 2);
        assert_eq!(games[0], games[1]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn a_swarm_pairs_off_completely() {
        let lobby = lobby();
        let mut probes = Vec::new();
        let mut tasks = Vec::new();
        for i in 0..16 {
            let (player, heard) = probe(&format!("bot-{}", i));
            let lobby = lobby.clone();
            let contender: Arc<dyn Player> = player.clone();
            tasks.push(tokio::spawn(async move { lobby.request_game(contender) }));
            probes.push((player, heard));
        }
        for task in tasks {
            task.await.unwrap();
        }
        assert_eq!(lobby.occupant(), None);
        let mut games = Vec::new();
        for (_, heard) in probes.iter_mut() {
            games.push(started(heard).await);
        }
        games.sort();
        games.dedup();
        assert_eq!(games.len(), 8, "sixteen players should seat eight games");
    }
}
