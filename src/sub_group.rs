//! Sub-beat groups: the intervals of a voice whose start falls in one window
//! of the bar. Beaming, padding and single-voice stem direction are decided
//! per group.

use crate::error::{Result, ScoreError};
use crate::interval::{IntervalId, RhythmicInterval};
use crate::time_signature::TimeSignature;

/// Average note height at or below which stems point up.
pub const STEM_UP_MAX_AVERAGE: f64 = 6.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StemDirection {
    Up,
    Down,
}

impl StemDirection {
    pub fn for_average_height(average: f64) -> Self {
        if average <= STEM_UP_MAX_AVERAGE {
            StemDirection::Up
        } else {
            StemDirection::Down
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubGroup {
    start_unit: u32,
    end_unit: u32,
    /// Member intervals in voice order.
    intervals: Vec<IntervalId>,
    padding_factor: u32,
    last_interval: Option<IntervalId>,
    note_height_sum: Option<u32>,
    notes_count: u32,
}

impl SubGroup {
    pub fn new(start_unit: u32, end_unit: u32) -> Self {
        Self {
            start_unit,
            end_unit,
            intervals: Vec::new(),
            padding_factor: 0,
            last_interval: None,
            note_height_sum: None,
            notes_count: 0,
        }
    }

    pub fn start_unit(&self) -> u32 {
        self.start_unit
    }

    pub fn end_unit(&self) -> u32 {
        self.end_unit
    }

    pub fn intervals(&self) -> &[IntervalId] {
        &self.intervals
    }

    pub fn contains(&self, id: IntervalId) -> bool {
        self.intervals.contains(&id)
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    /// Sub-group boundaries to pad after the last interval of this group.
    pub fn padding_factor(&self) -> u32 {
        self.padding_factor
    }

    /// Rhythmically last member.
    pub fn last_interval(&self) -> Option<IntervalId> {
        self.last_interval
    }

    pub fn note_height_sum(&self) -> Option<u32> {
        self.note_height_sum
    }

    pub fn notes_count(&self) -> u32 {
        self.notes_count
    }

    pub fn add(&mut self, interval: &RhythmicInterval) -> Result<()> {
        self.check_window(interval)?;
        if self.contains(interval.id()) {
            return Err(ScoreError::AlreadyInSubGroup);
        }
        self.intervals.push(interval.id());
        Ok(())
    }

    pub fn remove(&mut self, interval: &RhythmicInterval) -> Result<()> {
        self.check_window(interval)?;
        if self.detach(interval.id()) {
            Ok(())
        } else {
            Err(ScoreError::NotInSubGroup)
        }
    }

    /// Drop a member regardless of where it currently starts.
    pub(crate) fn detach(&mut self, id: IntervalId) -> bool {
        let before = self.intervals.len();
        self.intervals.retain(|member| *member != id);
        self.intervals.len() != before
    }

    fn check_window(&self, interval: &RhythmicInterval) -> Result<()> {
        let start = interval.start_unit();
        if start < self.start_unit || start > self.end_unit {
            return Err(ScoreError::OutsideSubGroup {
                start,
                start_unit: self.start_unit,
                end_unit: self.end_unit,
            });
        }
        Ok(())
    }

    fn members<'a>(&self, intervals: &'a [RhythmicInterval]) -> Vec<&'a RhythmicInterval> {
        intervals
            .iter()
            .filter(|iv| self.intervals.contains(&iv.id()))
            .collect()
    }

    pub fn calculate_note_height_sum(&mut self, intervals: &[RhythmicInterval]) {
        let (sum, count) = self
            .members(intervals)
            .into_iter()
            .map(RhythmicInterval::note_height_totals)
            .fold((0, 0), |(s, c), (is, ic)| (s + is, c + ic));
        self.notes_count = count;
        self.note_height_sum = (count > 0).then_some(sum);
    }

    /// `is_final` marks the bar's last window, which never pads.
    pub fn calculate_padding_factor(
        &mut self,
        intervals: &[RhythmicInterval],
        time_signature: &TimeSignature,
        own_index: usize,
        is_final: bool,
    ) -> Result<()> {
        let last = self.members(intervals).last().copied();
        self.last_interval = last.map(RhythmicInterval::id);
        self.padding_factor = match last {
            Some(_) if is_final => 0,
            Some(iv) => {
                let covered = time_signature.calculate_last_covered_sub_group(iv.end_unit())?;
                (covered.saturating_sub(own_index) as u32).max(1)
            }
            None => 0,
        };
        Ok(())
    }

    /// Bring the group up to date with the voice: forget members that left
    /// the voice, restore voice order and recompute the aggregates.
    pub(crate) fn refresh(
        &mut self,
        intervals: &[RhythmicInterval],
        time_signature: &TimeSignature,
        own_index: usize,
        is_final: bool,
    ) -> Result<()> {
        self.intervals = self
            .members(intervals)
            .into_iter()
            .map(RhythmicInterval::id)
            .collect();
        self.calculate_note_height_sum(intervals);
        self.calculate_padding_factor(intervals, time_signature, own_index, is_final)
    }

    pub fn average_note_height(&self) -> Option<f64> {
        self.note_height_sum
            .map(|sum| sum as f64 / self.notes_count as f64)
    }

    /// Direction this group's stems take when its voice has none assigned.
    pub fn stem_direction(&self) -> Option<StemDirection> {
        self.average_note_height().map(StemDirection::for_average_height)
    }
}
