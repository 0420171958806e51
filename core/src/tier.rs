//! Skill tiers and the escalation ladder.
//!
//! RULE: A call is only ever handled by an employee whose tier is
//! at or above the call's required tier. Routing scans upward, never down.

use crate::error::{DispatchError, DispatchResult};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Junior,
    Mid,
    Senior,
}

/// Next tier up, indexed by `Tier::index()`. `None` marks the top of the ladder.
const ESCALATION_LADDER: [Option<Tier>; 3] = [
    Some(Tier::Mid),    // Junior
    Some(Tier::Senior), // Mid
    None,               // Senior
];

impl Tier {
    /// All tiers in ascending seniority.
    pub const ALL: [Tier; 3] = [Tier::Junior, Tier::Mid, Tier::Senior];

    pub fn index(self) -> usize {
        self as usize
    }

    /// The tier a call moves to when an employee of this tier escalates it.
    pub fn next(self) -> Option<Tier> {
        ESCALATION_LADDER[self.index()]
    }

    pub fn can_escalate(self) -> bool {
        self.next().is_some()
    }

    /// This tier and every tier above it, in ascending order.
    pub fn and_above(self) -> impl Iterator<Item = Tier> {
        Self::ALL.into_iter().filter(move |t| *t >= self)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Junior => "junior",
            Self::Mid => "mid",
            Self::Senior => "senior",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Tier {
    type Err = DispatchError;

    fn from_str(s: &str) -> DispatchResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "junior" => Ok(Self::Junior),
            "mid" => Ok(Self::Mid),
            "senior" => Ok(Self::Senior),
            _ => Err(DispatchError::InvalidTier { tier: s.to_string() }),
        }
    }
}

impl TryFrom<u8> for Tier {
    type Error = DispatchError;

    fn try_from(rank: u8) -> DispatchResult<Self> {
        Self::ALL
            .get(rank as usize)
            .copied()
            .ok_or_else(|| DispatchError::InvalidTier { tier: rank.to_string() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ladder_climbs_one_step_and_stops_at_senior() {
        assert_eq!(Tier::Junior.next(), Some(Tier::Mid));
        assert_eq!(Tier::Mid.next(), Some(Tier::Senior));
        assert_eq!(Tier::Senior.next(), None);
        assert!(!Tier::Senior.can_escalate());
    }

    #[test]
    fn and_above_never_includes_lower_tiers() {
        let above_mid: Vec<Tier> = Tier::Mid.and_above().collect();
        assert_eq!(above_mid, vec![Tier::Mid, Tier::Senior]);

        let above_junior: Vec<Tier> = Tier::Junior.and_above().collect();
        assert_eq!(above_junior, Tier::ALL.to_vec());
    }

    #[test]
    fn parses_names_and_rejects_unknown() {
        assert_eq!("Senior".parse::<Tier>().unwrap(), Tier::Senior);
        assert_eq!(" mid ".parse::<Tier>().unwrap(), Tier::Mid);

        let err = "director".parse::<Tier>().unwrap_err();
        assert!(matches!(err, DispatchError::InvalidTier { ref tier } if tier == "director"));
    }

    #[test]
    fn rank_conversion_bounds() {
        assert_eq!(Tier::try_from(0u8).unwrap(), Tier::Junior);
        assert_eq!(Tier::try_from(2u8).unwrap(), Tier::Senior);
        assert!(matches!(Tier::try_from(3u8), Err(DispatchError::InvalidTier { .. })));
    }
}
