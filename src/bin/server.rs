//! Rock, paper, scissors over TCP.
//!
//! Sessions and socket plumbing run on one runtime, games on another, so
//! a flood of slow connections cannot starve matches already in play.
//! The two runtimes are wired together only through the lobby.
//!
//! ```text
//! cargo run --bin server -- --addr 0.0.0.0:8080
//! ```

use clap::Parser;
use roshambo::lobby::Lobby;
use roshambo::net::Server;
use std::sync::Arc;

#[derive(Parser)]
#[command(about = "rock paper scissors match server")]
struct Args {
    /// Address to listen on.
    #[arg(long, default_value = "0.0.0.0:8080")]
    addr: String,
}

fn main() -> anyhow::Result<()> {
    roshambo::log();
    let args = Args::parse();
    let games = tokio::runtime::Builder::new_multi_thread()
        .thread_name("games")
        .enable_all()
        .build()?;
    let net = tokio::runtime::Builder::new_multi_thread()
        .thread_name("net")
        .enable_all()
        .build()?;
    let lobby = Arc::new(Lobby::new(games.handle().clone()));
    let server = Server::new(args.addr, lobby, net.handle().clone());
    net.block_on(async {
        roshambo::trap();
        server.run().await
    })
}
