//! Rhythmic intervals: one slot of a voice, either a chord of note heads or a rest.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ScoreError};
use crate::length::RhythmicLength;

/// Highest staff position a note head can take.
pub const MAX_NOTE_HEIGHT: u8 = 12;

/// Shape of a percussion note head.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NoteHeadType {
    /// Regular filled or hollow oval (drums).
    Elliptic,
    /// Cross (cymbals, closed hi-hat).
    Cross,
    /// Circled cross (open hi-hat).
    CircledCross,
}

/// Identity of an interval within its voice. Stable across resizes and moves;
/// assigned by the owning voice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct IntervalId(pub(crate) u32);

#[derive(Debug, Clone, PartialEq)]
pub struct RhythmicInterval {
    pub(crate) id: IntervalId,
    length: RhythmicLength,
    start_unit: u32,
    note_heads: BTreeMap<u8, NoteHeadType>,
}

impl RhythmicInterval {
    /// A headless interval of `length` starting at the 1-based `start_unit`.
    pub fn rest(length: RhythmicLength, start_unit: u32) -> Self {
        Self {
            id: IntervalId::default(),
            length,
            start_unit,
            note_heads: BTreeMap::new(),
        }
    }

    pub fn id(&self) -> IntervalId {
        self.id
    }

    pub fn length(&self) -> RhythmicLength {
        self.length
    }

    pub fn length_in_units(&self) -> u32 {
        self.length.units()
    }

    pub fn start_unit(&self) -> u32 {
        self.start_unit
    }

    /// Last unit covered, inclusive.
    pub fn end_unit(&self) -> u32 {
        self.start_unit + self.length.units() - 1
    }

    pub fn note_heads(&self) -> &BTreeMap<u8, NoteHeadType> {
        &self.note_heads
    }

    pub fn is_rest(&self) -> bool {
        self.note_heads.is_empty()
    }

    /// Sum of note head heights and how many there are.
    pub fn note_height_totals(&self) -> (u32, u32) {
        let sum: u32 = self.note_heads.keys().map(|h| *h as u32).sum();
        (sum, self.note_heads.len() as u32)
    }

    /// Place a head at `height`, replacing any head already there.
    pub fn add_note_head(&mut self, height: u8, head: NoteHeadType) -> Result<()> {
        if height > MAX_NOTE_HEIGHT {
            return Err(ScoreError::InvalidHeight(height));
        }
        self.note_heads.insert(height, head);
        Ok(())
    }

    pub fn remove_note_head(&mut self, height: u8) -> Result<NoteHeadType> {
        self.note_heads
            .remove(&height)
            .ok_or(ScoreError::NoNoteHead(height))
    }

    pub fn make_rest(&mut self) -> Result<()> {
        if self.is_rest() {
            return Err(ScoreError::AlreadyRest);
        }
        self.note_heads.clear();
        Ok(())
    }

    pub(crate) fn set_length(&mut self, length: RhythmicLength) {
        self.length = length;
    }

    pub(crate) fn set_start_unit(&mut self, start_unit: u32) {
        self.start_unit = start_unit;
    }

    pub(crate) fn with_note_heads(mut self, note_heads: BTreeMap<u8, NoteHeadType>) -> Self {
        self.note_heads = note_heads;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::length::BasicLength;

    fn quarter_at(start: u32) -> RhythmicInterval {
        RhythmicInterval::rest(RhythmicLength::plain(BasicLength::Quarter), start)
    }

    #[test]
    fn end_unit_is_inclusive() {
        let iv = quarter_at(13);
        assert_eq!(iv.end_unit(), 24);
        assert!(iv.is_rest());
    }

    #[test]
    fn note_heads_toggle_rest_flag() {
        let mut iv = quarter_at(1);
        iv.add_note_head(3, NoteHeadType::Elliptic).unwrap();
        assert!(!iv.is_rest());

        iv.add_note_head(3, NoteHeadType::Cross).unwrap();
        assert_eq!(iv.note_heads().get(&3), Some(&NoteHeadType::Cross));
        assert_eq!(iv.note_heads().len(), 1);

        assert_eq!(iv.remove_note_head(3), Ok(NoteHeadType::Cross));
        assert!(iv.is_rest());
        assert_eq!(iv.remove_note_head(3), Err(ScoreError::NoNoteHead(3)));
    }

    #[test]
    fn height_above_staff_is_rejected() {
        let mut iv = quarter_at(1);
        assert_eq!(
            iv.add_note_head(13, NoteHeadType::Elliptic),
            Err(ScoreError::InvalidHeight(13))
        );
        assert!(iv.is_rest());
    }

    #[test]
    fn make_rest_requires_notes() {
        let mut iv = quarter_at(1);
        assert_eq!(iv.make_rest(), Err(ScoreError::AlreadyRest));
        iv.add_note_head(0, NoteHeadType::Elliptic).unwrap();
        iv.add_note_head(12, NoteHeadType::CircledCross).unwrap();
        assert_eq!(iv.note_height_totals(), (12, 2));
        iv.make_rest().unwrap();
        assert!(iv.is_rest());
    }
}
