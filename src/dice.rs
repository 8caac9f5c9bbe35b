//! Dice types and their fixed physical/labeling constants

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// All supported dice types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiceType {
    #[serde(rename = "d4")]
    D4,
    #[serde(rename = "d6")]
    D6,
    #[serde(rename = "d8")]
    D8,
    /// Tens die paired with a d100 (faces 0-9)
    #[serde(rename = "d9")]
    D9,
    #[serde(rename = "d10")]
    D10,
    #[serde(rename = "d12")]
    D12,
    #[serde(rename = "d20")]
    D20,
    /// Percentile die (faces 00-90)
    #[serde(rename = "d100")]
    D100,
}

impl DiceType {
    pub const ALL: [DiceType; 8] = [
        DiceType::D4,
        DiceType::D6,
        DiceType::D8,
        DiceType::D9,
        DiceType::D10,
        DiceType::D12,
        DiceType::D20,
        DiceType::D100,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DiceType::D4 => "d4",
            DiceType::D6 => "d6",
            DiceType::D8 => "d8",
            DiceType::D9 => "d9",
            DiceType::D10 => "d10",
            DiceType::D12 => "d12",
            DiceType::D20 => "d20",
            DiceType::D100 => "d100",
        }
    }

    /// Inclusive range of face labels `(lo, hi)`
    pub fn face_range(&self) -> (i32, i32) {
        match self {
            DiceType::D4 => (1, 4),
            DiceType::D6 => (1, 6),
            DiceType::D8 => (1, 8),
            DiceType::D9 | DiceType::D10 | DiceType::D100 => (0, 9),
            DiceType::D12 => (1, 12),
            DiceType::D20 => (1, 20),
        }
    }

    /// Number of distinct labels on the die
    pub fn face_span(&self) -> i32 {
        let (lo, hi) = self.face_range();
        hi - lo + 1
    }

    /// Simulated mass
    pub fn mass(&self) -> f32 {
        match self {
            DiceType::D4 | DiceType::D6 => 300.0,
            DiceType::D8 => 340.0,
            DiceType::D9 | DiceType::D10 | DiceType::D12 | DiceType::D100 => 350.0,
            DiceType::D20 => 400.0,
        }
    }

    /// Spin bias applied at launch; heavier-looking shapes tumble harder
    pub fn inertia(&self) -> f32 {
        match self {
            DiceType::D4 => 5.0,
            DiceType::D6 => 13.0,
            DiceType::D8 => 10.0,
            DiceType::D9 | DiceType::D10 | DiceType::D100 => 9.0,
            DiceType::D12 => 8.0,
            DiceType::D20 => 6.0,
        }
    }

    /// Geometry radius relative to the box's dice scale
    pub fn size_factor(&self) -> f32 {
        match self {
            DiceType::D4 => 1.2,
            DiceType::D6 => 1.1,
            DiceType::D8 | DiceType::D20 => 1.0,
            DiceType::D9 | DiceType::D10 | DiceType::D12 | DiceType::D100 => 0.9,
        }
    }

    /// Convert a face label into the value shown to the player
    pub fn display_value(&self, label: i32) -> i32 {
        match self {
            DiceType::D100 => label * 10,
            DiceType::D10 if label == 0 => 10,
            _ => label,
        }
    }

    /// Inverse of [`display_value`](Self::display_value); `None` when the
    /// value cannot appear on this die
    pub fn label_for_value(&self, value: i32) -> Option<i32> {
        let label = match self {
            DiceType::D100 => {
                if value % 10 != 0 {
                    return None;
                }
                value / 10
            }
            DiceType::D10 if value == 10 => 0,
            _ => value,
        };
        let (lo, hi) = self.face_range();
        (lo..=hi).contains(&label).then_some(label)
    }

    /// Wrap a label into this die's range, shifting by whole spans
    pub fn wrap_label(&self, mut label: i32) -> i32 {
        let (lo, hi) = self.face_range();
        let span = self.face_span();
        while label > hi {
            label -= span;
        }
        while label < lo {
            label += span;
        }
        label
    }
}

impl fmt::Display for DiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for an unrecognised dice type string
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown dice type: {0}")]
pub struct UnknownDiceType(pub String);

impl FromStr for DiceType {
    type Err = UnknownDiceType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DiceType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| UnknownDiceType(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dice_type_parse() {
        assert_eq!("d4".parse::<DiceType>(), Ok(DiceType::D4));
        assert_eq!("d100".parse::<DiceType>(), Ok(DiceType::D100));
        assert!("d7".parse::<DiceType>().is_err());
        assert!("d06".parse::<DiceType>().is_err());
        // Exact match only, like the notation's type lookup
        assert!("D6".parse::<DiceType>().is_err());
    }

    #[test]
    fn test_every_type_has_constants() {
        for t in DiceType::ALL {
            let (lo, hi) = t.face_range();
            assert!(lo < hi, "{t} has an empty range");
            assert!(t.mass() > 0.0);
            assert!(t.inertia() > 0.0);
            assert!(t.size_factor() > 0.0);
            assert_eq!(t.as_str().parse::<DiceType>(), Ok(t));
        }
    }

    #[test]
    fn test_display_value_conventions() {
        assert_eq!(DiceType::D10.display_value(0), 10);
        assert_eq!(DiceType::D10.display_value(7), 7);
        assert_eq!(DiceType::D9.display_value(0), 0);
        assert_eq!(DiceType::D100.display_value(0), 0);
        assert_eq!(DiceType::D100.display_value(4), 40);
        assert_eq!(DiceType::D20.display_value(20), 20);
    }

    #[test]
    fn test_label_for_value() {
        assert_eq!(DiceType::D10.label_for_value(10), Some(0));
        assert_eq!(DiceType::D10.label_for_value(0), Some(0));
        assert_eq!(DiceType::D10.label_for_value(11), None);
        assert_eq!(DiceType::D100.label_for_value(70), Some(7));
        assert_eq!(DiceType::D100.label_for_value(75), None);
        assert_eq!(DiceType::D100.label_for_value(100), None);
        assert_eq!(DiceType::D6.label_for_value(0), None);
        assert_eq!(DiceType::D6.label_for_value(7), None);
        assert_eq!(DiceType::D4.label_for_value(4), Some(4));
    }

    #[test]
    fn test_wrap_label_both_ends() {
        assert_eq!(DiceType::D6.wrap_label(7), 1);
        assert_eq!(DiceType::D6.wrap_label(0), 6);
        assert_eq!(DiceType::D6.wrap_label(-5), 1);
        assert_eq!(DiceType::D10.wrap_label(10), 0);
        assert_eq!(DiceType::D10.wrap_label(-1), 9);
        assert_eq!(DiceType::D20.wrap_label(41), 1);
    }
}
