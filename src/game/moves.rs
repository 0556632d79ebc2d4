//! The three throws and their cyclic dominance.

/// One throw of the hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Move {
    Rock = 0,
    Paper = 1,
    Scissors = 2,
}

impl Move {
    /// Parses a player's token: full word or single letter, any case.
    pub fn parse(token: &str) -> Option<Self> {
        match token.to_uppercase().as_str() {
            "ROCK" | "R" => Some(Move::Rock),
            "PAPER" | "P" => Some(Move::Paper),
            "SCISSORS" | "S" => Some(Move::Scissors),
            _ => None,
        }
    }

    /// Scores this throw against another: 0 on a tie, +1 when this one
    /// wins, -1 when it loses. Dominance is cyclic with period 3, which
    /// is why the distance between discriminants decides the sign.
    pub fn compare(self, that: Move) -> i8 {
        if self == that {
            0
        } else {
            ((self as i8 - that as i8 + 3) % 3 % 2) * 2 - 1
        }
    }
}
