//! Rhythmic lengths and the canonical decomposition of unit spans.
//!
//! All durations are integers in units of 1/48 of a whole note.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ScoreError};

/// Units in a whole note.
pub const UNITS_PER_WHOLE: u32 = 48;

/// Undotted, untupled note value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BasicLength {
    Sixteenth,
    Eighth,
    Quarter,
    Half,
    Whole,
}

impl BasicLength {
    pub fn units(self) -> u32 {
        match self {
            BasicLength::Sixteenth => 3,
            BasicLength::Eighth => 6,
            BasicLength::Quarter => 12,
            BasicLength::Half => 24,
            BasicLength::Whole => 48,
        }
    }

    fn name(self) -> &'static str {
        match self {
            BasicLength::Sixteenth => "sixteenth",
            BasicLength::Eighth => "eighth",
            BasicLength::Quarter => "quarter",
            BasicLength::Half => "half",
            BasicLength::Whole => "whole",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum LengthModifier {
    #[default]
    None,
    Dotted,
    Triplet,
}

/// A note value together with its modifier.
///
/// Only valid combinations can be constructed, so `units()` is always
/// positive. Dotted sixteenths do not exist in this model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawLength")]
pub struct RhythmicLength {
    basic: BasicLength,
    modifier: LengthModifier,
}

#[derive(Deserialize)]
struct RawLength {
    basic: BasicLength,
    #[serde(default)]
    modifier: LengthModifier,
}

impl TryFrom<RawLength> for RhythmicLength {
    type Error = ScoreError;

    fn try_from(raw: RawLength) -> Result<Self> {
        RhythmicLength::new(raw.basic, raw.modifier)
    }
}

impl RhythmicLength {
    pub fn new(basic: BasicLength, modifier: LengthModifier) -> Result<Self> {
        if basic == BasicLength::Sixteenth && modifier == LengthModifier::Dotted {
            return Err(ScoreError::InvalidLength("a sixteenth cannot be dotted"));
        }
        Ok(Self { basic, modifier })
    }

    /// Unmodified length; always valid.
    pub const fn plain(basic: BasicLength) -> Self {
        Self {
            basic,
            modifier: LengthModifier::None,
        }
    }

    pub fn dotted(basic: BasicLength) -> Result<Self> {
        Self::new(basic, LengthModifier::Dotted)
    }

    pub fn triplet(basic: BasicLength) -> Self {
        Self {
            basic,
            modifier: LengthModifier::Triplet,
        }
    }

    pub fn basic(&self) -> BasicLength {
        self.basic
    }

    pub fn modifier(&self) -> LengthModifier {
        self.modifier
    }

    /// Duration in units. Modifiers truncate toward zero.
    pub fn units(&self) -> u32 {
        let base = self.basic.units();
        match self.modifier {
            LengthModifier::None => base,
            LengthModifier::Dotted => base * 3 / 2,
            LengthModifier::Triplet => base * 2 / 3,
        }
    }
}

impl fmt::Display for RhythmicLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.modifier {
            LengthModifier::None => write!(f, "{}", self.basic.name()),
            LengthModifier::Dotted => write!(f, "dotted {}", self.basic.name()),
            LengthModifier::Triplet => write!(f, "triplet {}", self.basic.name()),
        }
    }
}

const fn entry(basic: BasicLength, modifier: LengthModifier) -> RhythmicLength {
    RhythmicLength { basic, modifier }
}

/// Every representable length, largest first.
pub const CATALOG: [RhythmicLength; 14] = [
    entry(BasicLength::Whole, LengthModifier::Dotted),       // 72
    entry(BasicLength::Whole, LengthModifier::None),         // 48
    entry(BasicLength::Half, LengthModifier::Dotted),        // 36
    entry(BasicLength::Whole, LengthModifier::Triplet),      // 32
    entry(BasicLength::Half, LengthModifier::None),          // 24
    entry(BasicLength::Quarter, LengthModifier::Dotted),     // 18
    entry(BasicLength::Half, LengthModifier::Triplet),       // 16
    entry(BasicLength::Quarter, LengthModifier::None),       // 12
    entry(BasicLength::Eighth, LengthModifier::Dotted),      // 9
    entry(BasicLength::Quarter, LengthModifier::Triplet),    // 8
    entry(BasicLength::Eighth, LengthModifier::None),        // 6
    entry(BasicLength::Eighth, LengthModifier::Triplet),     // 4
    entry(BasicLength::Sixteenth, LengthModifier::None),     // 3
    entry(BasicLength::Sixteenth, LengthModifier::Triplet),  // 2
];

/// Express `units` as canonical lengths, in the order they fill a gap from
/// left to right.
///
/// The scan is greedy over [`CATALOG`] and never revisits an entry larger than
/// the last one taken. An entry is skipped when taking it would strand a
/// remainder the entries from there on cannot fill, so the scan backs off to
/// the next smaller entry instead.
pub fn lengths_from_unit_length(units: u32) -> Result<Vec<RhythmicLength>> {
    let mut lengths = Vec::new();
    let mut remaining = units;
    let mut lower_bound = 0;
    while remaining > 0 {
        let next = CATALOG
            .iter()
            .enumerate()
            .skip(lower_bound)
            .find(|(_, length)| {
                length.units() <= remaining && fillable(remaining - length.units(), length.units())
            });
        let Some((idx, length)) = next else {
            log::warn!("no canonical decomposition for {units} units");
            return Err(ScoreError::Unrepresentable(units));
        };
        lengths.push(*length);
        remaining -= length.units();
        lower_bound = idx;
    }
    Ok(lengths)
}

/// Whether `remaining` can be built from catalog entries no longer than
/// `largest`. The two smallest entries (3 and 2) cover every span of two or
/// more units; with only the 2 left, spans must be even.
fn fillable(remaining: u32, largest: u32) -> bool {
    match remaining {
        0 => true,
        1 => false,
        _ => largest >= 3 || remaining % 2 == 0,
    }
}
