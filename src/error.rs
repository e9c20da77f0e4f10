//! Error type shared by every model operation.
//!
//! Input rejections leave the model untouched. `Invariant` marks a breach of
//! the tiling or sub-group bookkeeping that no documented call sequence should
//! be able to produce.

use thiserror::Error;

use crate::length::RhythmicLength;
use crate::time_signature::TimeSignature;

pub type Result<T> = std::result::Result<T, ScoreError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScoreError {
    #[error("note height {0} is outside 0..=12")]
    InvalidHeight(u8),

    #[error("no note head at height {0}")]
    NoNoteHead(u8),

    #[error("interval is already a rest")]
    AlreadyRest,

    #[error("voice number {0} is outside 1..=4")]
    InvalidVoice(u8),

    #[error("voice {0} does not exist")]
    MissingVoice(u8),

    #[error("interval index {index} is out of range (voice has {len} intervals)")]
    IntervalIndex { index: usize, len: usize },

    #[error("bar index {index} is out of range (score has {len} bars)")]
    BarIndex { index: usize, len: usize },

    #[error("unsupported time signature {numerator}/{denominator}")]
    UnsupportedTimeSignature { numerator: u32, denominator: u32 },

    #[error("invalid rhythmic length: {0}")]
    InvalidLength(&'static str),

    #[error("interval already has length {0}")]
    NoLengthChange(RhythmicLength),

    #[error("interval would end at unit {end}, past the bar's {units} units")]
    ExceedsBar { end: u32, units: u32 },

    #[error("unit {unit} lies outside the bar's {units} units")]
    UnitOutOfRange { unit: u32, units: u32 },

    #[error("time signature {new} is not larger than {current}")]
    NotLarger { current: TimeSignature, new: TimeSignature },

    #[error("time signature {new} is not smaller than {current}")]
    NotSmaller { current: TimeSignature, new: TimeSignature },

    #[error("time signature is already {0}")]
    SameTimeSignature(TimeSignature),

    #[error("interval at unit {start} does not belong to sub-group {start_unit}..={end_unit}")]
    OutsideSubGroup { start: u32, start_unit: u32, end_unit: u32 },

    #[error("interval is already registered in this sub-group")]
    AlreadyInSubGroup,

    #[error("interval is not registered in this sub-group")]
    NotInSubGroup,

    /// A span no catalog combination fills, in practice a single stranded
    /// unit. Ordinary edits (shrinking a dotted eighth to a triplet quarter)
    /// can produce one, so this is rejected input and not fatal, even though
    /// the tiling rules alone would call it a broken invariant.
    #[error("{0} units cannot be expressed with canonical lengths")]
    Unrepresentable(u32),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("document error: {0}")]
    Document(String),

    #[error("invariant violated: {0}")]
    Invariant(String),
}

impl ScoreError {
    /// True for breaches of the model's own invariants, as opposed to
    /// rejected input.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ScoreError::Invariant(_))
    }

    pub(crate) fn invariant(msg: impl Into<String>) -> Self {
        let msg = msg.into();
        log::error!("score invariant violated: {msg}");
        ScoreError::Invariant(msg)
    }
}
