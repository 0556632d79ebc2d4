//! Every line the server ever writes, in one place.
//!
//! Sessions and games compose messages exclusively from these constants
//! and builders, and the end-to-end tests assert against the same
//! definitions, so the wire format cannot drift between the two.

/// Greeting written the moment a connection is accepted.
pub const WELCOME: &str = "Welcome to Rock, Paper, Scissors!";

/// Prompt for the nickname phase.
pub const ASK_NICKNAME: &str = "Please enter your nickname:";

/// Rejection for whitespace-only nicknames.
pub const EMPTY_NICKNAME: &str = "Nickname cannot be empty. Please try again:";

/// Rejection for nicknames over [`NICKNAME_LIMIT`] characters.
pub const LONG_NICKNAME: &str = "Nickname is too long (max 20 chars). Please try again:";

/// Longest accepted nickname, counted in characters rather than bytes.
pub const NICKNAME_LIMIT: usize = 20;

/// Reply to anything typed while parked in the lobby.
pub const STILL_WAITING: &str = "Waiting for opponent...";

/// Lobby command that withdraws the player and ends the session.
pub const WITHDRAW: &str = "q";

/// Both players threw the same move; the round restarts.
pub const DRAW: &str = "It's a draw! Enter your new move:";

/// Reply to input that does not parse as a move.
pub const INVALID_MOVE: &str = "Invalid move";

/// Reply to a player meddling with a game they are not part of.
pub const INTRUDER: &str = "You are not part of this game";

/// Final line of every session, written right before the socket closes.
pub const GOODBYE: &str = "Goodbye!";

/// Acknowledges a validated nickname.
pub fn hello(nick: &str) -> String {
    format!("Hello, {}! Entering lobby...", nick)
}

/// Match intro; the second line prompts for the first move.
pub fn game_on(nick: &str) -> String {
    format!(
        "Your opponent is {}! Game started!\nEnter your move (ROCK/PAPER/SCISSORS or R/P/S):",
        nick
    )
}

/// Told to the player who moved first this round.
pub fn wait_for(nick: &str) -> String {
    format!("You made your move. Wait for {}.", nick)
}

/// Told to the player who has yet to move this round.
pub fn opponent_moved(nick: &str) -> String {
    format!("{} made his move. Enter your move:", nick)
}

/// Told to a player trying to move twice in one round.
pub fn already_moved(nick: &str) -> String {
    format!("You already made your move. Wait for {}.", nick)
}

/// Verdict for the winner, naming the loser.
pub fn win(nick: &str) -> String {
    format!("You win against {}! Congratulations!", nick)
}

/// Verdict for the loser, naming the winner.
pub fn lose(nick: &str) -> String {
    format!("You lose against {}! Better luck next time!", nick)
}

/// Told to the survivor when the opponent leaves mid-game.
pub fn forfeit(nick: &str) -> String {
    format!("{} left the game", nick)
}
