//! Bot swarm for soaking the server end to end.
//!
//! Each bot connects, names itself, plays random moves at human-ish
//! speed until the goodbye line, then reconnects and goes again, so a
//! running swarm keeps the lobby slot under constant contention.
//!
//! ```text
//! cargo run --bin stress -- --addr 127.0.0.1:8080 --bots 100
//! ```

use clap::Parser;
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use std::time::Duration;
use tokio::io::AsyncBufReadExt;
use tokio::io::AsyncWriteExt;
use tokio::io::BufReader;
use tokio::net::TcpStream;
use tokio::net::tcp::OwnedWriteHalf;

const MOVES: [&str; 3] = ["ROCK", "PAPER", "SCISSORS"];

#[derive(Parser)]
#[command(about = "rock paper scissors load generator")]
struct Args {
    /// Server to hammer.
    #[arg(long, default_value = "127.0.0.1:8080")]
    addr: String,
    /// How many bots to keep playing.
    #[arg(long, default_value_t = 100)]
    bots: usize,
}

#[tokio::main]
async fn main() {
    roshambo::log();
    let args = Args::parse();
    log::info!("[stress] sending {} bots at {}", args.bots, args.addr);
    for id in 0..args.bots {
        let addr = args.addr.clone();
        tokio::spawn(bot(id, addr));
        // stagger the stampede
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    tokio::signal::ctrl_c().await.expect("install Ctrl-C handler");
    println!();
    log::warn!("[stress] interrupt received, exiting");
}

/// One bot: connect, react to whatever the server says, reconnect when
/// the session ends. Runs forever.
async fn bot(id: usize, addr: String) {
    let mut rng = SmallRng::seed_from_u64(id as u64);
    loop {
        let stream = match TcpStream::connect(&addr).await {
            Ok(stream) => stream,
            Err(e) => {
                log::warn!("[bot {}] connect failed: {}", id, e);
                tokio::time::sleep(Duration::from_secs(1)).await;
                continue;
            }
        };
        log::debug!("[bot {}] connected", id);
        let (reader, mut writer) = stream.into_split();
        let mut lines = BufReader::new(reader).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            let line = line.to_lowercase();
            if line.contains("enter your nickname") {
                tokio::time::sleep(Duration::from_millis(rng.random_range(500..2000))).await;
                if say(&mut writer, &format!("Bot-{}", id)).await.is_err() {
                    break;
                }
            } else if line.contains("your opponent is") {
                tokio::time::sleep(Duration::from_millis(rng.random_range(3000..5000))).await;
                if say(&mut writer, MOVES[rng.random_range(0..MOVES.len())]).await.is_err() {
                    break;
                }
            } else if line.contains("draw") {
                tokio::time::sleep(Duration::from_millis(500)).await;
                if say(&mut writer, MOVES[rng.random_range(0..MOVES.len())]).await.is_err() {
                    break;
                }
            } else if line.contains("goodbye") {
                break;
            }
        }
        log::debug!("[bot {}] session over, reconnecting", id);
        tokio::time::sleep(Duration::from_secs(1)).await;
    }
}

async fn say(writer: &mut OwnedWriteHalf, line: &str) -> std::io::Result<()> {
    writer.write_all(format!("{}\n", line).as_bytes()).await
}
