//! Rock, paper, scissors matches refereed over raw TCP.
//!
//! Everything that holds state is an actor: one mailbox, one state slot,
//! one task. Sessions, games, and the lobby never share memory beyond
//! cloneable handles, so there is not a single user-facing lock in the
//! crate.
//!
//! - [`machine`] is the actor kernel
//! - [`game`] referees one match between two [`game::Player`] capabilities
//! - [`lobby`] pairs waiting players through a lock-free single slot
//! - [`net`] owns the transport: sessions, the accept loop, the census
//! - [`protocol`] is the single source of truth for every line on the wire

pub mod game;
pub mod lobby;
pub mod machine;
pub mod net;
pub mod protocol;

use std::cmp::Ordering;
use std::fmt::Debug;
use std::fmt::Display;
use std::fmt::Formatter;
use std::hash::Hash;
use std::hash::Hasher;
use std::marker::PhantomData;

/// Generic ID wrapper providing compile-time type safety over uuid::Uuid.
/// The marker may be unsized, so trait objects work as markers too.
pub struct ID<T: ?Sized> {
    inner: uuid::Uuid,
    marker: PhantomData<T>,
}

impl<T: ?Sized> ID<T> {
    pub fn inner(&self) -> uuid::Uuid {
        self.inner
    }
}

impl<T: ?Sized> Default for ID<T> {
    fn default() -> Self {
        Self {
            inner: uuid::Uuid::now_v7(),
            marker: PhantomData,
        }
    }
}

impl<T: ?Sized> Copy for ID<T> {}
impl<T: ?Sized> Clone for ID<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: ?Sized> Eq for ID<T> {}
impl<T: ?Sized> PartialEq for ID<T> {
    fn eq(&self, other: &Self) -> bool {
        self.inner == other.inner
    }
}

impl<T: ?Sized> Ord for ID<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.inner.cmp(&other.inner)
    }
}
impl<T: ?Sized> PartialOrd for ID<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T: ?Sized> Hash for ID<T> {
    fn hash<H>(&self, state: &mut H)
    where
        H: Hasher,
    {
        self.inner.hash(state);
    }
}

impl<T: ?Sized> Debug for ID<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ID").field(&self.inner).finish()
    }
}
impl<T: ?Sized> Display for ID<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.inner, f)
    }
}

/// Sets up logging to both the terminal and a timestamped file under
/// `logs/`. The terminal stays at Info; the file keeps everything down
/// to Debug, which is where the actors narrate their transitions.
pub fn log() {
    std::fs::create_dir_all("logs").expect("create logs directory");
    let config = simplelog::ConfigBuilder::new()
        .set_location_level(log::LevelFilter::Off)
        .set_target_level(log::LevelFilter::Off)
        .set_thread_level(log::LevelFilter::Off)
        .build();
    let time = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("time moves slow")
        .as_secs();
    let file = simplelog::WriteLogger::new(
        log::LevelFilter::Debug,
        config.clone(),
        std::fs::File::create(format!("logs/{}.log", time)).expect("create log file"),
    );
    let term = simplelog::TermLogger::new(
        log::LevelFilter::Info,
        config.clone(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    );
    simplelog::CombinedLogger::init(vec![term, file]).expect("initialize logger");
}

/// Register Ctrl+C handler for immediate (non-graceful) termination.
/// Sessions hold no durable state, so hard shutdown loses nothing.
pub fn trap() {
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.unwrap();
        println!();
        log::warn!("interrupt received, exiting immediately");
        std::process::exit(0);
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Apple;
    struct Orange;

    #[test]
    fn ids_are_unique() {
        assert_ne!(ID::<Apple>::default(), ID::<Apple>::default());
    }

    #[test]
    fn ids_are_copy_and_eq() {
        let id = ID::<Orange>::default();
        let same = id;
        assert_eq!(id, same);
        assert_eq!(id.inner(), same.inner());
    }
}
