//! The capability a game holds for each participant.

use super::Handle;
use crate::ID;

/// Stable identity for one participant, shared by the lobby, the game
/// roster, and the connection registry.
pub type PlayerId = ID<dyn Player>;

/// What a game can do to a participant, independent of transport.
///
/// In production this is the session's [`Client`](crate::net::Client)
/// face, which turns every call into an event in the session's own
/// mailbox. Calls must therefore be cheap and non-blocking; none of them
/// reports delivery.
#[async_trait::async_trait]
pub trait Player: Send + Sync {
    /// Identity used for seat lookups and lobby bookkeeping.
    fn id(&self) -> PlayerId;

    /// Display name shown to the opponent.
    ///
    /// # Panics
    /// If read before the player passed nickname validation. Nobody
    /// reaches a lobby or a game without one, so this is a wiring error.
    fn nickname(&self) -> String;

    /// False once the player can no longer be reached at all.
    fn alive(&self) -> bool {
        true
    }

    /// Delivers one line of text, best effort.
    async fn send_message(&self, line: &str);

    /// The match this player was paired into is live; `game` is how the
    /// player addresses it from now on.
    async fn on_game_started(&self, game: Handle);

    /// The match ended, in whatever way; nothing further will arrive
    /// from it.
    async fn on_game_finished(&self);
}
