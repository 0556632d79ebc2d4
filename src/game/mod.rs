//! One refereed match between two players.
//!
//! A game is an actor whose whole world is its two seats. It reaches
//! players only through the [`Player`] capability, and players reach it
//! only through a cloneable [`Handle`], which vets the caller against
//! the roster before anything touches the game's mailbox. Round flow:
//!
//! - `Greetings` announces the match and prompts both seats
//! - `WaitingForFirstMove` takes the round's opening throw
//! - `WaitingForSecondMove` takes the answer, scores, and either
//!   restarts the round on a draw or ends the match
//! - `Over` delivers the verdicts exactly once and closes up

#[cfg(test)]
pub(crate) mod doubles;
mod moves;
mod player;

pub use moves::Move;
pub use player::Player;
pub use player::PlayerId;

use crate::ID;
use crate::machine::Actor;
use crate::machine::Machine;
use crate::machine::Mailbox;
use crate::protocol;
use std::sync::Arc;

/// Index of a player within one game's roster.
pub type Seat = usize;

/// Events a game processes. Callers are already resolved to seats by the
/// time anything lands here; the [`Handle`] does the vetting.
#[derive(Debug)]
pub enum Event {
    Moved { seat: Seat, throw: Move },
    Left { seat: Seat },
}

/// Match phases.
#[derive(Debug, Clone)]
pub enum State {
    Greetings,
    WaitingForFirstMove,
    WaitingForSecondMove { seat: Seat, throw: Move },
    Over { winner: Seat, loser: Seat },
}

/// All `Over` values compare equal, whoever won: the entry fixpoint then
/// settles after a single pass and the verdicts go out exactly once.
impl PartialEq for State {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (State::Greetings, State::Greetings) => true,
            (State::WaitingForFirstMove, State::WaitingForFirstMove) => true,
            (
                State::WaitingForSecondMove { seat: a, throw: x },
                State::WaitingForSecondMove { seat: b, throw: y },
            ) => a == b && x == y,
            (State::Over { .. }, State::Over { .. }) => true,
            _ => false,
        }
    }
}

/// One match: two fixed seats plus the actor machinery around them.
pub struct Game {
    id: ID<Game>,
    players: [Arc<dyn Player>; 2],
    mailbox: Mailbox<Event>,
}

impl Game {
    pub fn new(players: [Arc<dyn Player>; 2]) -> Self {
        Self {
            id: ID::default(),
            players,
            mailbox: Mailbox::new(),
        }
    }

    /// Spawns the match on the given runtime and hands back its address.
    pub fn start(self, rt: &tokio::runtime::Handle) -> Handle {
        let handle = self.handle();
        let mailbox = self.mailbox.clone();
        log::info!(
            "[game {}] {} vs {}",
            self.id,
            self.players[0].nickname(),
            self.players[1].nickname()
        );
        Machine::start(self, &mailbox, rt);
        handle
    }

    fn handle(&self) -> Handle {
        Handle {
            id: self.id,
            roster: [self.players[0].id(), self.players[1].id()],
            mailbox: self.mailbox.clone(),
        }
    }

    fn opponent(&self, seat: Seat) -> &Arc<dyn Player> {
        &self.players[1 - seat]
    }
}

#[async_trait::async_trait]
impl Actor for Game {
    type Event = Event;
    type State = State;

    fn initial(&self) -> State {
        State::Greetings
    }

    fn is_final(state: &State) -> bool {
        matches!(state, State::Over { .. })
    }

    async fn enter(m: &mut Machine<Self>, state: State) -> State {
        match state {
            State::Greetings => {
                let game = m.actor.handle();
                m.actor.players[0].on_game_started(game.clone()).await;
                m.actor.players[1].on_game_started(game).await;
                // a session can end between matching and this point;
                // never open a round nobody can answer
                if let Some(seat) = m.actor.players.iter().position(|p| !p.alive()) {
                    log::warn!(
                        "[game {}] {} gone before the first round, match forfeited",
                        m.actor.id,
                        m.actor.players[seat].nickname()
                    );
                    return State::Over { winner: 1 - seat, loser: seat };
                }
                let intro = protocol::game_on(&m.actor.players[1].nickname());
                m.actor.players[0].send_message(&intro).await;
                let intro = protocol::game_on(&m.actor.players[0].nickname());
                m.actor.players[1].send_message(&intro).await;
                State::WaitingForFirstMove
            }
            State::Over { winner, loser } => {
                log::info!(
                    "[game {}] {} beats {}",
                    m.actor.id,
                    m.actor.players[winner].nickname(),
                    m.actor.players[loser].nickname()
                );
                let verdict = protocol::win(&m.actor.players[loser].nickname());
                m.actor.players[winner].send_message(&verdict).await;
                let verdict = protocol::lose(&m.actor.players[winner].nickname());
                m.actor.players[loser].send_message(&verdict).await;
                m.actor.players[0].on_game_finished().await;
                m.actor.players[1].on_game_finished().await;
                State::Over { winner, loser }
            }
            state => state,
        }
    }

    async fn next(m: &mut Machine<Self>, state: State, event: Event) -> State {
        match (state, event) {
            (_, Event::Left { seat }) => {
                let gone = m.actor.players[seat].nickname();
                m.actor.opponent(seat).send_message(&protocol::forfeit(&gone)).await;
                State::Over { winner: 1 - seat, loser: seat }
            }
            (State::WaitingForFirstMove, Event::Moved { seat, throw }) => {
                let mover = m.actor.players[seat].nickname();
                let other = m.actor.opponent(seat).nickname();
                m.actor.players[seat].send_message(&protocol::wait_for(&other)).await;
                m.actor.opponent(seat).send_message(&protocol::opponent_moved(&mover)).await;
                State::WaitingForSecondMove { seat, throw }
            }
            (State::WaitingForSecondMove { seat: first, throw: opener }, Event::Moved { seat, .. })
                if seat == first =>
            {
                let other = m.actor.opponent(first).nickname();
                m.actor.players[first].send_message(&protocol::already_moved(&other)).await;
                State::WaitingForSecondMove { seat: first, throw: opener }
            }
            (State::WaitingForSecondMove { seat: first, throw: opener }, Event::Moved { seat, throw }) => {
                match opener.compare(throw) {
                    0 => {
                        m.actor.players[0].send_message(protocol::DRAW).await;
                        m.actor.players[1].send_message(protocol::DRAW).await;
                        State::WaitingForFirstMove
                    }
                    score if score > 0 => State::Over { winner: first, loser: seat },
                    _ => State::Over { winner: seat, loser: first },
                }
            }
            (state, event) => {
                log::debug!("[game {}] {:?} ignored in {:?}", m.actor.id, event, state);
                state
            }
        }
    }
}

/// Cloneable address of a running game. Carries the roster so stray
/// callers are turned away here, before anything reaches the mailbox.
#[derive(Debug, Clone)]
pub struct Handle {
    id: ID<Game>,
    roster: [PlayerId; 2],
    mailbox: Mailbox<Event>,
}

impl Handle {
    pub fn id(&self) -> ID<Game> {
        self.id
    }

    /// A throw by this player.
    pub async fn on_move(&self, player: &Arc<dyn Player>, throw: Move) {
        if let Some(seat) = self.admit(player).await {
            self.mailbox.post(Event::Moved { seat, throw });
        }
    }

    /// This player is gone, by choice or by disconnect.
    pub async fn on_leave(&self, player: &Arc<dyn Player>) {
        if let Some(seat) = self.admit(player).await {
            self.mailbox.post(Event::Left { seat });
        }
    }

    async fn admit(&self, player: &Arc<dyn Player>) -> Option<Seat> {
        let seat = self.roster.iter().position(|id| *id == player.id());
        if seat.is_none() {
            log::warn!("[game {}] {} is not in this game", self.id, player.id());
            player.send_message(protocol::INTRUDER).await;
        }
        seat
    }
}

impl PartialEq for Handle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}
