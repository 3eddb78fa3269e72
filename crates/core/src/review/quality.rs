//! Move quality tiers

use std::fmt;

use serde::{Deserialize, Serialize};

pub const INACCURACY: u32 = 50;
pub const MISTAKE: u32 = 100;
pub const BLUNDER: u32 = 300;

/// Quality of a move, by centipawn loss
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// < 50 centipawn loss
    Good,
    /// >= 50 centipawn loss
    Inaccuracy,
    /// >= 100 centipawn loss
    Mistake,
    /// >= 300 centipawn loss
    Blunder,
}

impl Tier {
    /// Classifies a loss by its magnitude. The sign is ignored.
    pub fn from_cp_loss(cp_loss: i32) -> Self {
        match cp_loss.unsigned_abs() {
            l if l >= BLUNDER => Tier::Blunder,
            l if l >= MISTAKE => Tier::Mistake,
            l if l >= INACCURACY => Tier::Inaccuracy,
            _ => Tier::Good,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Good => "good",
            Tier::Inaccuracy => "inaccuracy",
            Tier::Mistake => "mistake",
            Tier::Blunder => "blunder",
        }
    }
}

/// Free-function form of [`Tier::from_cp_loss`].
pub fn classify(cp_loss: i32) -> Tier {
    Tier::from_cp_loss(cp_loss)
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boundaries() {
        assert_eq!(classify(0), Tier::Good);
        assert_eq!(classify(49), Tier::Good);
        assert_eq!(classify(50), Tier::Inaccuracy);
        assert_eq!(classify(99), Tier::Inaccuracy);
        assert_eq!(classify(100), Tier::Mistake);
        assert_eq!(classify(299), Tier::Mistake);
        assert_eq!(classify(300), Tier::Blunder);
        assert_eq!(classify(100_000), Tier::Blunder);
    }

    #[test]
    fn test_symmetric_in_sign() {
        for x in [0, 1, 49, 50, 99, 100, 299, 300, 12_345, i32::MAX] {
            assert_eq!(classify(x), classify(-x), "loss {}", x);
        }
    }

    #[test]
    fn test_total_at_extremes() {
        assert_eq!(classify(i32::MIN), Tier::Blunder);
        assert_eq!(classify(i32::MAX), Tier::Blunder);
    }

    #[test]
    fn test_serde_lowercase() {
        assert_eq!(serde_json::to_string(&Tier::Inaccuracy).unwrap(), "\"inaccuracy\"");
        assert_eq!(Tier::Blunder.to_string(), "blunder");
    }
}
