//! `/roll` parsing and sampling.

use rand::Rng;
use thiserror::Error;

pub const USAGE: &str = "Sorry, I didn't understand your input. \
Should be XDYY where X is the number of dice, and YY is the number of sides";

const MAX_DICE: u32 = 10;
const MAX_SIDES: u32 = 20;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("could not parse dice expression")]
pub struct RollParseError;

/// A validated dice expression, e.g. `2d6`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiceRoll {
    pub num_dice: u32,
    pub sides: u32,
}

impl DiceRoll {
    /// Parse `<N>d<S>` (case-insensitive). `N` in [1, 10], `S` in [1, 20];
    /// anything else is a recovered input error, never a panic.
    pub fn parse(text: &str) -> Result<Self, RollParseError> {
        let text = text.trim().to_lowercase();
        let (num, sides) = text.split_once('d').ok_or(RollParseError)?;
        let num_dice: u32 = num.parse().map_err(|_| RollParseError)?;
        let sides: u32 = sides.parse().map_err(|_| RollParseError)?;
        if num_dice == 0 || num_dice > MAX_DICE {
            return Err(RollParseError);
        }
        if sides == 0 || sides > MAX_SIDES {
            return Err(RollParseError);
        }
        Ok(DiceRoll { num_dice, sides })
    }

    /// Roll `num_dice` independent uniform samples in `[1, sides]`.
    pub fn roll(&self) -> Vec<u32> {
        let mut rng = rand::rng();
        (0..self.num_dice)
            .map(|_| rng.random_range(1..=self.sides))
            .collect()
    }

    pub fn format_message(&self, user_id: &str, rolls: &[u32]) -> String {
        format!(
            "<@{}> Rolled {} D{}: {:?}",
            user_id, self.num_dice, self.sides, rolls
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_expressions() {
        assert_eq!(
            DiceRoll::parse("2d6").unwrap(),
            DiceRoll { num_dice: 2, sides: 6 }
        );
        assert_eq!(
            DiceRoll::parse("1d1").unwrap(),
            DiceRoll { num_dice: 1, sides: 1 }
        );
        assert_eq!(
            DiceRoll::parse("10d20").unwrap(),
            DiceRoll { num_dice: 10, sides: 20 }
        );
        // Uppercase D and surrounding whitespace are fine.
        assert_eq!(
            DiceRoll::parse(" 3D12 ").unwrap(),
            DiceRoll { num_dice: 3, sides: 12 }
        );
    }

    #[test]
    fn test_parse_malformed_expressions() {
        for input in ["0d5", "11d5", "3d21", "3d0", "abc", "3x5", "", "d6", "3d", "1d6d4", "-1d6"] {
            assert_eq!(DiceRoll::parse(input), Err(RollParseError), "input: {input:?}");
        }
    }

    #[test]
    fn test_roll_count_and_bounds() {
        let roll = DiceRoll { num_dice: 10, sides: 6 };
        for _ in 0..50 {
            let samples = roll.roll();
            assert_eq!(samples.len(), 10);
            assert!(samples.iter().all(|&v| (1..=6).contains(&v)));
        }
    }

    #[test]
    fn test_one_sided_die_is_deterministic() {
        let roll = DiceRoll { num_dice: 4, sides: 1 };
        assert_eq!(roll.roll(), vec![1, 1, 1, 1]);
    }

    #[test]
    fn test_format_message() {
        let roll = DiceRoll { num_dice: 2, sides: 6 };
        let message = roll.format_message("U2147483697", &[3, 5]);
        assert_eq!(message, "<@U2147483697> Rolled 2 D6: [3, 5]");
    }
}
