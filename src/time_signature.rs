//! Time signatures and their sub-beat windows.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ScoreError};
use crate::length::UNITS_PER_WHOLE;

/// Largest numerator accepted over a half or quarter denominator.
pub const MAX_NUMERATOR: u32 = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawTimeSignature")]
pub struct TimeSignature {
    numerator: u32,
    denominator: u32,
}

#[derive(Deserialize)]
struct RawTimeSignature {
    numerator: u32,
    denominator: u32,
}

impl TryFrom<RawTimeSignature> for TimeSignature {
    type Error = ScoreError;

    fn try_from(raw: RawTimeSignature) -> Result<Self> {
        TimeSignature::new(raw.numerator, raw.denominator)
    }
}

impl TimeSignature {
    pub const FOUR_FOUR: TimeSignature = TimeSignature {
        numerator: 4,
        denominator: 4,
    };

    /// Denominator must be 2, 4 or 8. Eighth-based meters allow at most 12
    /// beats, half and quarter meters at most [`MAX_NUMERATOR`].
    pub fn new(numerator: u32, denominator: u32) -> Result<Self> {
        let supported = numerator >= 1
            && match denominator {
                2 | 4 => numerator <= MAX_NUMERATOR,
                8 => numerator <= 12,
                _ => false,
            }
            && numerator.checked_mul(UNITS_PER_WHOLE).is_some();
        if !supported {
            log::warn!("rejected time signature {numerator}/{denominator}");
            return Err(ScoreError::UnsupportedTimeSignature {
                numerator,
                denominator,
            });
        }
        Ok(Self {
            numerator,
            denominator,
        })
    }

    pub fn numerator(&self) -> u32 {
        self.numerator
    }

    pub fn denominator(&self) -> u32 {
        self.denominator
    }

    /// Bar length in units.
    pub fn units(&self) -> u32 {
        self.numerator * UNITS_PER_WHOLE / self.denominator
    }

    /// Number of sub-beat windows, or `None` for eighth-based meters that
    /// have no grouping scheme (5, 7, 8, 9, 10, 11, 12 eighths). Such bars are
    /// treated as one ungrouped window.
    pub fn number_of_sub_groups(&self) -> Option<u32> {
        match self.denominator {
            2 => Some(self.numerator * 2),
            4 => Some(self.numerator),
            _ => match self.numerator {
                1..=3 => Some(1),
                4 | 6 => Some(2),
                _ => None,
            },
        }
    }

    pub fn is_ungrouped(&self) -> bool {
        self.number_of_sub_groups().is_none()
    }

    fn window_count(&self) -> u32 {
        self.number_of_sub_groups().unwrap_or(1)
    }

    fn window_width(&self) -> u32 {
        self.units() / self.window_count()
    }

    /// Inclusive `(start, end)` units of every sub-beat window, in order.
    pub fn sub_group_windows(&self) -> Vec<(u32, u32)> {
        let width = self.window_width();
        (0..self.window_count())
            .map(|i| (i * width + 1, (i + 1) * width))
            .collect()
    }

    /// Window index of an interval starting at `start_unit`.
    pub fn calculate_sub_group(&self, start_unit: u32) -> Result<usize> {
        self.window_of(start_unit)
    }

    /// Window index that contains `end_unit`.
    pub fn calculate_last_covered_sub_group(&self, end_unit: u32) -> Result<usize> {
        self.window_of(end_unit)
    }

    fn window_of(&self, unit: u32) -> Result<usize> {
        let units = self.units();
        if unit == 0 || unit > units {
            return Err(ScoreError::UnitOutOfRange { unit, units });
        }
        Ok(((unit - 1) / self.window_width()) as usize)
    }
}

impl Default for TimeSignature {
    fn default() -> Self {
        Self::FOUR_FOUR
    }
}

impl fmt::Display for TimeSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}
