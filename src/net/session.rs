//! Per-connection protocol state machine.
//!
//! A session owns the write half of its socket and runs the player's
//! whole lifecycle: greeting, nickname validation, lobby, game, goodbye.
//! Input lines arrive as events from the reader task; games and the
//! lobby talk to the session only through its [`Client`] face, which
//! posts events right back here. The session is therefore the only
//! writer its socket ever has.

use super::client::Client;
use crate::game;
use crate::game::Move;
use crate::lobby::Lobby;
use crate::machine::Actor;
use crate::machine::Machine;
use crate::machine::Mailbox;
use crate::protocol;
use std::sync::Arc;
use std::sync::OnceLock;
use tokio::io::AsyncWriteExt;
use tokio::net::tcp::OwnedWriteHalf;

/// Everything a session can be asked to handle.
#[derive(Debug)]
pub enum Event {
    /// One trimmed line of input from the wire.
    Line(String),
    /// Write this line out to the client.
    Send(String),
    /// Matchmaking came through; the payload addresses the game.
    Matched(game::Handle),
    /// The connection is gone, or the session is told to hang up.
    Disconnect,
}

/// Connection lifecycle phases.
#[derive(Debug, Clone, PartialEq)]
pub enum State {
    Welcome,
    Nickname,
    InLobby,
    InGame { game: game::Handle },
    Over,
}

/// One connected player.
pub struct Session {
    writer: OwnedWriteHalf,
    lobby: Arc<Lobby>,
    nickname: Arc<OnceLock<String>>,
    mailbox: Mailbox<Event>,
    client: Arc<Client>,
}

impl Session {
    pub fn new(writer: OwnedWriteHalf, lobby: Arc<Lobby>) -> Self {
        let mailbox = Mailbox::new();
        let nickname = Arc::new(OnceLock::new());
        let client = Arc::new(Client::new(nickname.clone(), mailbox.clone()));
        Self {
            writer,
            lobby,
            nickname,
            mailbox,
            client,
        }
    }

    /// Where the reader task and the player face post their events.
    pub fn mailbox(&self) -> Mailbox<Event> {
        self.mailbox.clone()
    }

    /// The player face games and the lobby will hold.
    pub fn client(&self) -> Arc<Client> {
        self.client.clone()
    }

    fn player(&self) -> Arc<dyn game::Player> {
        self.client.clone()
    }

    async fn push(&mut self, line: &str) -> std::io::Result<()> {
        let frame = format!("{}\n", line);
        self.writer.write_all(frame.as_bytes()).await
    }

    /// Undoes whatever the current state holds elsewhere: a lobby seat
    /// or a seat in a running game. Shared by voluntary quits, hangups,
    /// and failed writes.
    async fn cleanup(&self, state: &State) {
        match state {
            State::InLobby => self.lobby.unregister(self.client.as_ref()),
            State::InGame { game } => game.on_leave(&self.player()).await,
            _ => {}
        }
    }
}

#[async_trait::async_trait]
impl Actor for Session {
    type Event = Event;
    type State = State;

    fn initial(&self) -> State {
        State::Welcome
    }

    fn is_final(state: &State) -> bool {
        matches!(state, State::Over)
    }

    async fn enter(m: &mut Machine<Self>, state: State) -> State {
        match state {
            State::Welcome => {
                m.feed(Event::Send(protocol::WELCOME.to_string())).await;
                State::Nickname
            }
            State::Nickname => {
                m.feed(Event::Send(protocol::ASK_NICKNAME.to_string())).await;
                State::Nickname
            }
            State::InLobby => {
                m.actor.lobby.request_game(m.actor.player());
                State::InLobby
            }
            State::Over => {
                m.feed(Event::Send(protocol::GOODBYE.to_string())).await;
                if let Err(e) = m.actor.writer.shutdown().await {
                    log::debug!("[session {}] shutdown failed: {}", m.actor.client.id(), e);
                }
                log::debug!("[session {}] closed", m.actor.client.id());
                State::Over
            }
            state => state,
        }
    }

    async fn next(m: &mut Machine<Self>, state: State, event: Event) -> State {
        match event {
            Event::Send(line) => match m.actor.push(&line).await {
                Ok(()) => state,
                Err(e) => {
                    log::warn!("[session {}] write failed: {}", m.actor.client.id(), e);
                    m.actor.cleanup(&state).await;
                    State::Over
                }
            },
            Event::Disconnect => {
                m.actor.cleanup(&state).await;
                State::Over
            }
            Event::Matched(game) => match state {
                State::InLobby => State::InGame { game },
                state => {
                    log::debug!(
                        "[session {}] match notice ignored in {:?}",
                        m.actor.client.id(),
                        state
                    );
                    state
                }
            },
            Event::Line(input) => match state {
                State::Nickname => {
                    let nick = input.trim();
                    if nick.is_empty() {
                        m.feed(Event::Send(protocol::EMPTY_NICKNAME.to_string())).await;
                        State::Nickname
                    } else if nick.chars().count() > protocol::NICKNAME_LIMIT {
                        m.feed(Event::Send(protocol::LONG_NICKNAME.to_string())).await;
                        State::Nickname
                    } else {
                        if m.actor.nickname.set(nick.to_string()).is_err() {
                            log::debug!("[session {}] nickname set twice", m.actor.client.id());
                        }
                        log::info!("[session {}] {} joined", m.actor.client.id(), nick);
                        m.feed(Event::Send(protocol::hello(nick))).await;
                        State::InLobby
                    }
                }
                State::InLobby => {
                    if input == protocol::WITHDRAW {
                        m.actor.cleanup(&State::InLobby).await;
                        State::Over
                    } else {
                        m.feed(Event::Send(protocol::STILL_WAITING.to_string())).await;
                        State::InLobby
                    }
                }
                State::InGame { game } => {
                    match Move::parse(&input) {
                        Some(throw) => game.on_move(&m.actor.player(), throw).await,
                        None => m.feed(Event::Send(protocol::INVALID_MOVE.to_string())).await,
                    }
                    State::InGame { game }
                }
                state => {
                    log::debug!(
                        "[session {}] input ignored in {:?}",
                        m.actor.client.id(),
                        state
                    );
                    state
                }
            },
        }
    }
}
