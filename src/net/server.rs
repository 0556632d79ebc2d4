//! TCP face of the service.

use super::session::Event;
use super::session::Session;
use super::switchboard::Switchboard;
use crate::lobby::Lobby;
use crate::machine::Machine;
use crate::machine::Mailbox;
use anyhow::Context;
use std::sync::Arc;
use tokio::io::AsyncBufReadExt;
use tokio::io::BufReader;
use tokio::net::TcpListener;
use tokio::net::TcpStream;
use tokio::net::tcp::OwnedReadHalf;

/// Accepts connections and wires each one into a session actor plus a
/// reader task. One lobby serves every connection for the lifetime of
/// the process.
pub struct Server {
    addr: String,
    lobby: Arc<Lobby>,
    net: tokio::runtime::Handle,
    switchboard: Arc<Switchboard>,
}

impl Server {
    /// `net` is the runtime that carries sessions and reader tasks;
    /// games live wherever the lobby puts them.
    pub fn new(addr: String, lobby: Arc<Lobby>, net: tokio::runtime::Handle) -> Self {
        Self {
            addr,
            lobby,
            net,
            switchboard: Arc::new(Switchboard::new()),
        }
    }

    /// Binds the configured address and serves forever.
    pub async fn run(self) -> anyhow::Result<()> {
        let listener = TcpListener::bind(&self.addr)
            .await
            .with_context(|| format!("bind {}", self.addr))?;
        self.serve(listener).await
    }

    /// Accept loop over an already-bound listener. A refused accept is
    /// the peer's problem, never a reason to stop accepting.
    pub async fn serve(self, listener: TcpListener) -> anyhow::Result<()> {
        let addr = listener.local_addr().context("read bound address")?;
        log::info!("[server] rock paper scissors server started on {}", addr);
        self.switchboard.patrol(&self.net);
        loop {
            match listener.accept().await {
                Ok((stream, peer)) => {
                    log::debug!("[server] connection from {}", peer);
                    self.plug(stream).await;
                }
                Err(e) => log::warn!("[server] accept failed: {}", e),
            }
        }
    }

    async fn plug(&self, stream: TcpStream) {
        let (reader, writer) = stream.into_split();
        let session = Session::new(writer, self.lobby.clone());
        let mailbox = session.mailbox();
        let id = session.client().id();
        Machine::start(session, &mailbox, &self.net);
        self.switchboard.connect(id, mailbox.clone()).await;
        let switchboard = self.switchboard.clone();
        self.net.spawn(async move {
            relay(reader, &mailbox).await;
            mailbox.post(Event::Disconnect);
            switchboard.disconnect(&id).await;
        });
    }
}

/// Feeds trimmed input lines into the session until EOF or a read error,
/// either of which means the connection is gone.
async fn relay(reader: OwnedReadHalf, mailbox: &Mailbox<Event>) {
    let mut lines = BufReader::new(reader).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => mailbox.post(Event::Line(line.trim().to_string())),
            Ok(None) => return,
            Err(e) => {
                log::debug!("[server] read failed: {}", e);
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol;
    use std::time::Duration;
    use tokio::io::AsyncWriteExt;
    use tokio::io::Lines;
    use tokio::net::tcp::OwnedWriteHalf;

    struct Side {
        lines: Lines<BufReader<OwnedReadHalf>>,
        writer: OwnedWriteHalf,
    }

    async fn join(addr: std::net::SocketAddr) -> Side {
        let stream = TcpStream::connect(addr).await.unwrap();
        let (reader, writer) = stream.into_split();
        Side {
            lines: BufReader::new(reader).lines(),
            writer,
        }
    }

    async fn read(side: &mut Side) -> String {
        tokio::time::timeout(Duration::from_secs(1), side.lines.next_line())
            .await
            .expect("read timed out")
            .expect("read failed")
            .expect("connection closed early")
    }

    async fn eof(side: &mut Side) {
        let end = tokio::time::timeout(Duration::from_secs(1), side.lines.next_line())
            .await
            .expect("read timed out")
            .expect("read failed");
        assert_eq!(end, None);
    }

    async fn say(side: &mut Side, line: &str) {
        side.writer
            .write_all(format!("{}\r\n", line).as_bytes())
            .await
            .unwrap();
    }

    async fn serve() -> std::net::SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let rt = tokio::runtime::Handle::current();
        let lobby = Arc::new(Lobby::new(rt.clone()));
        let server = Server::new(addr.to_string(), lobby, rt);
        tokio::spawn(server.serve(listener));
        addr
    }

    async fn sign_in(side: &mut Side, nick: &str) {
        assert_eq!(read(side).await, protocol::WELCOME);
        assert_eq!(read(side).await, protocol::ASK_NICKNAME);
        say(side, nick).await;
        assert_eq!(read(side).await, protocol::hello(nick));
    }

    #[tokio::test]
    async fn a_whole_match_over_real_sockets() {
        let addr = serve().await;
        let mut alice = join(addr).await;
        let mut bob = join(addr).await;
        sign_in(&mut alice, "alice").await;
        sign_in(&mut bob, "bob").await;
        for line in protocol::game_on("bob").lines() {
            assert_eq!(read(&mut alice).await, line);
        }
        for line in protocol::game_on("alice").lines() {
            assert_eq!(read(&mut bob).await, line);
        }

        say(&mut alice, "rock").await;
        assert_eq!(read(&mut alice).await, protocol::wait_for("bob"));
        assert_eq!(read(&mut bob).await, protocol::opponent_moved("alice"));

        say(&mut bob, "S").await;
        assert_eq!(read(&mut alice).await, protocol::win("bob"));
        assert_eq!(read(&mut bob).await, protocol::lose("alice"));
        assert_eq!(read(&mut alice).await, protocol::GOODBYE);
        assert_eq!(read(&mut bob).await, protocol::GOODBYE);
        eof(&mut alice).await;
        eof(&mut bob).await;
    }

    #[tokio::test]
    async fn ragequitting_hands_the_match_to_the_survivor() {
        let addr = serve().await;
        let mut alice = join(addr).await;
        let mut bob = join(addr).await;
        sign_in(&mut alice, "alice").await;
        sign_in(&mut bob, "bob").await;
        for line in protocol::game_on("bob").lines() {
            assert_eq!(read(&mut alice).await, line);
        }
        for line in protocol::game_on("alice").lines() {
            assert_eq!(read(&mut bob).await, line);
        }

        drop(bob);
        assert_eq!(read(&mut alice).await, protocol::forfeit("bob"));
        assert_eq!(read(&mut alice).await, protocol::win("bob"));
        assert_eq!(read(&mut alice).await, protocol::GOODBYE);
        eof(&mut alice).await;
    }

    #[tokio::test]
    async fn quitting_the_lobby_over_the_wire() {
        let addr = serve().await;
        let mut side = join(addr).await;
        sign_in(&mut side, "loner").await;
        say(&mut side, "anyone?").await;
        assert_eq!(read(&mut side).await, protocol::STILL_WAITING);
        say(&mut side, protocol::WITHDRAW).await;
        assert_eq!(read(&mut side).await, protocol::GOODBYE);
        eof(&mut side).await;
    }
}
