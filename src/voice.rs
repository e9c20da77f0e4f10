//! Voices: gap-free interval sequences spanning exactly one bar.
//!
//! Every public mutation re-establishes the tiling invariant and the
//! sub-group membership before it returns.

use std::collections::{HashMap, HashSet};

use crate::error::{Result, ScoreError};
use crate::interval::{IntervalId, NoteHeadType, RhythmicInterval};
use crate::length::{lengths_from_unit_length, RhythmicLength};
use crate::sub_group::{StemDirection, SubGroup};
use crate::time_signature::TimeSignature;

#[derive(Debug, Clone, PartialEq)]
pub struct Voice {
    intervals: Vec<RhythmicInterval>,
    time_signature: TimeSignature,
    sub_groups: Vec<SubGroup>,
    interval_to_sub_group: HashMap<IntervalId, usize>,
    /// Set by the bar when several voices compete for stem space.
    stem_direction: Option<StemDirection>,
    next_id: u32,
}

/// Rests covering `units` units, starting at `start_unit`.
fn rests_for_span(units: u32, start_unit: u32) -> Result<Vec<RhythmicInterval>> {
    let mut start = start_unit;
    Ok(lengths_from_unit_length(units)?
        .into_iter()
        .map(|length| {
            let rest = RhythmicInterval::rest(length, start);
            start += length.units();
            rest
        })
        .collect())
}

/// Check that `intervals` start at unit 1, touch without gaps or overlaps and
/// end exactly on `units`.
pub fn check_tiling(intervals: &[RhythmicInterval], units: u32) -> Result<()> {
    let mut expected_start = 1;
    for iv in intervals {
        if iv.start_unit() != expected_start {
            return Err(ScoreError::invariant(format!(
                "interval starts at unit {} but unit {expected_start} was expected",
                iv.start_unit()
            )));
        }
        if iv.end_unit() > units {
            return Err(ScoreError::ExceedsBar {
                end: iv.end_unit(),
                units,
            });
        }
        expected_start = iv.end_unit() + 1;
    }
    if expected_start != units + 1 {
        return Err(ScoreError::invariant(format!(
            "intervals cover {} of {units} units",
            expected_start - 1
        )));
    }
    Ok(())
}

impl Voice {
    /// Build a voice from intervals that already tile `time_signature`.
    pub fn new(intervals: Vec<RhythmicInterval>, time_signature: TimeSignature) -> Result<Self> {
        if intervals.is_empty() {
            return Err(ScoreError::invariant("voice constructed without intervals"));
        }
        check_tiling(&intervals, time_signature.units())?;

        let mut voice = Self {
            intervals,
            time_signature,
            sub_groups: Vec::new(),
            interval_to_sub_group: HashMap::new(),
            stem_direction: None,
            next_id: 1,
        };
        for pos in 0..voice.intervals.len() {
            let id = voice.fresh_id();
            voice.intervals[pos].id = id;
        }
        voice.rebuild_sub_groups()?;
        Ok(voice)
    }

    /// A voice holding nothing but canonical rests.
    pub fn filled_with_rests(time_signature: TimeSignature) -> Result<Self> {
        Self::new(rests_for_span(time_signature.units(), 1)?, time_signature)
    }

    /// Build a voice from leading content shorter than the bar, filling the
    /// remainder with rests.
    pub(crate) fn with_trailing_rests(
        mut intervals: Vec<RhythmicInterval>,
        time_signature: TimeSignature,
    ) -> Result<Self> {
        let covered = intervals.last().map_or(0, RhythmicInterval::end_unit);
        let units = time_signature.units();
        if covered < units {
            intervals.extend(rests_for_span(units - covered, covered + 1)?);
        }
        Self::new(intervals, time_signature)
    }

    pub fn intervals(&self) -> &[RhythmicInterval] {
        &self.intervals
    }

    pub fn interval(&self, index: usize) -> Option<&RhythmicInterval> {
        self.intervals.get(index)
    }

    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    pub fn time_signature(&self) -> TimeSignature {
        self.time_signature
    }

    pub fn sub_groups(&self) -> &[SubGroup] {
        &self.sub_groups
    }

    /// Index of the sub-group holding the interval at `index`.
    pub fn sub_group_of(&self, index: usize) -> Option<usize> {
        let id = self.intervals.get(index)?.id();
        self.interval_to_sub_group.get(&id).copied()
    }

    pub fn stem_direction(&self) -> Option<StemDirection> {
        self.stem_direction
    }

    pub(crate) fn set_stem_direction(&mut self, direction: Option<StemDirection>) {
        self.stem_direction = direction;
    }

    /// Direction for stems in `sub_group`: the voice's own if the bar assigned
    /// one, else whatever the group decides on its own.
    pub fn stem_direction_for(&self, sub_group: usize) -> Option<StemDirection> {
        self.stem_direction
            .or_else(|| self.sub_groups.get(sub_group).and_then(SubGroup::stem_direction))
    }

    pub fn is_all_rests(&self) -> bool {
        self.intervals.iter().all(RhythmicInterval::is_rest)
    }

    pub fn average_note_height(&self) -> Option<f64> {
        let (sum, count) = self
            .intervals
            .iter()
            .map(RhythmicInterval::note_height_totals)
            .fold((0u32, 0u32), |(s, c), (is, ic)| (s + is, c + ic));
        (count > 0).then(|| sum as f64 / count as f64)
    }

    pub fn check_tiling(&self) -> Result<()> {
        check_tiling(&self.intervals, self.time_signature.units())
    }

    fn fresh_id(&mut self) -> IntervalId {
        let id = IntervalId(self.next_id);
        self.next_id += 1;
        id
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index >= self.intervals.len() {
            return Err(ScoreError::IntervalIndex {
                index,
                len: self.intervals.len(),
            });
        }
        Ok(())
    }

    pub fn add_note_head(&mut self, index: usize, height: u8, head: NoteHeadType) -> Result<()> {
        self.check_index(index)?;
        self.intervals[index].add_note_head(height, head)?;
        self.refresh_sub_groups()
    }

    pub fn remove_note_head(&mut self, index: usize, height: u8) -> Result<()> {
        self.check_index(index)?;
        self.intervals[index].remove_note_head(height)?;
        self.refresh_sub_groups()
    }

    pub fn make_rest(&mut self, index: usize) -> Result<()> {
        self.check_index(index)?;
        self.intervals[index].make_rest()?;
        self.refresh_sub_groups()
    }

    /// Change the length of the interval at `index`, keeping the voice tiled.
    ///
    /// Shrinking leaves canonical rests in the vacated span. Growing swallows
    /// the intervals it fully covers; an interval it only partly covers keeps
    /// its note heads on the first canonical piece of its remaining tail, and
    /// the rest of that tail becomes rests.
    pub fn resize_interval(&mut self, index: usize, length: RhythmicLength) -> Result<()> {
        self.check_index(index)?;
        let current = self.intervals[index].length();
        if current == length {
            return Err(ScoreError::NoLengthChange(length));
        }

        if length.units() < current.units() {
            self.shrink(index, length)?;
        } else {
            self.grow(index, length)?;
        }
        log::debug!("resized interval {index} from {current} to {length}");

        self.recalculate_sub_groups_from(index)?;
        self.check_tiling()
    }

    fn shrink(&mut self, index: usize, length: RhythmicLength) -> Result<()> {
        let target = &self.intervals[index];
        let vacated = target.length_in_units() - length.units();
        let rests = rests_for_span(vacated, target.start_unit() + length.units())?;

        self.intervals[index].set_length(length);
        self.insert_fresh(index + 1, rests);
        Ok(())
    }

    fn grow(&mut self, index: usize, length: RhythmicLength) -> Result<()> {
        let units = self.time_signature.units();
        let new_end = self.intervals[index].start_unit() + length.units() - 1;
        if new_end > units {
            return Err(ScoreError::ExceedsBar { end: new_end, units });
        }

        let mut fully_replaced = 0;
        let mut split = None;
        for (pos, iv) in self.intervals.iter().enumerate().skip(index + 1) {
            if iv.end_unit() <= new_end {
                fully_replaced += 1;
                continue;
            }
            if iv.start_unit() <= new_end {
                let tail = lengths_from_unit_length(iv.end_unit() - new_end)?;
                split = Some((pos, tail));
            }
            break;
        }

        if let Some((pos, tail)) = split {
            let mut pieces = tail.into_iter();
            if let Some(first) = pieces.next() {
                let continuation = &mut self.intervals[pos];
                continuation.set_length(first);
                continuation.set_start_unit(new_end + 1);

                let mut start = new_end + 1 + first.units();
                let rests = pieces
                    .map(|piece| {
                        let rest = RhythmicInterval::rest(piece, start);
                        start += piece.units();
                        rest
                    })
                    .collect();
                self.insert_fresh(pos + 1, rests);
            }
        }

        self.intervals.drain(index + 1..index + 1 + fully_replaced);
        self.intervals[index].set_length(length);
        Ok(())
    }

    fn insert_fresh(&mut self, at: usize, intervals: Vec<RhythmicInterval>) {
        for (offset, mut iv) in intervals.into_iter().enumerate() {
            iv.id = self.fresh_id();
            self.intervals.insert(at + offset, iv);
        }
    }

    /// Re-home every interval from `index` onward into the sub-group its start
    /// now falls in, then drop members that left the voice and recompute
    /// every group's aggregates. Running it twice changes nothing.
    pub fn recalculate_sub_groups_from(&mut self, index: usize) -> Result<()> {
        for iv in self.intervals.iter().skip(index) {
            let window = self.time_signature.calculate_sub_group(iv.start_unit())?;
            let group = self.sub_groups.get_mut(window).ok_or_else(|| {
                ScoreError::invariant(format!("sub-group {window} missing from voice"))
            })?;
            match self.interval_to_sub_group.get(&iv.id()).copied() {
                None => group.add(iv)?,
                Some(old) if old != window => {
                    group.add(iv)?;
                    if let Some(previous) = self.sub_groups.get_mut(old) {
                        previous.detach(iv.id());
                    }
                }
                Some(_) => {}
            }
            self.interval_to_sub_group.insert(iv.id(), window);
        }

        let live: HashSet<IntervalId> = self.intervals.iter().map(RhythmicInterval::id).collect();
        self.interval_to_sub_group.retain(|id, _| live.contains(id));
        self.refresh_sub_groups()
    }

    fn refresh_sub_groups(&mut self) -> Result<()> {
        let last = self.sub_groups.len().saturating_sub(1);
        for (k, group) in self.sub_groups.iter_mut().enumerate() {
            group.refresh(&self.intervals, &self.time_signature, k, k == last)?;
        }
        Ok(())
    }

    fn rebuild_sub_groups(&mut self) -> Result<()> {
        self.sub_groups = self
            .time_signature
            .sub_group_windows()
            .into_iter()
            .map(|(start, end)| SubGroup::new(start, end))
            .collect();
        self.interval_to_sub_group.clear();
        self.recalculate_sub_groups_from(0)
    }

    /// Adopt a longer signature, appending rests after the existing content.
    pub(crate) fn extend_to(&mut self, time_signature: TimeSignature) -> Result<()> {
        let old_units = self.time_signature.units();
        let added = time_signature
            .units()
            .checked_sub(old_units)
            .ok_or_else(|| ScoreError::invariant("extension to a shorter signature"))?;
        let rests = rests_for_span(added, old_units + 1)?;
        let at = self.intervals.len();
        self.insert_fresh(at, rests);
        self.time_signature = time_signature;
        self.rebuild_sub_groups()?;
        self.check_tiling()
    }

    /// Adopt a signature of the same bar length; only the sub-groups change.
    pub(crate) fn regroup(&mut self, time_signature: TimeSignature) -> Result<()> {
        if time_signature.units() != self.time_signature.units() {
            return Err(ScoreError::invariant(format!(
                "cannot regroup {} as {time_signature}",
                self.time_signature
            )));
        }
        self.time_signature = time_signature;
        self.rebuild_sub_groups()
    }

    /// Adopt a shorter signature and return what no longer fits, renumbered
    /// to start at unit 1.
    ///
    /// An interval straddling the new bar line is split: its in-bar part and
    /// its overflow part are each decomposed canonically, and the first piece
    /// of each keeps the note heads.
    pub(crate) fn truncate_to(
        &mut self,
        time_signature: TimeSignature,
    ) -> Result<Vec<RhythmicInterval>> {
        let boundary = time_signature.units();
        let mut kept = Vec::new();
        let mut overflow: Vec<RhythmicInterval> = Vec::new();
        let mut overflow_start = 1;

        for iv in &self.intervals {
            if iv.end_unit() <= boundary {
                kept.push(iv.clone());
            } else if iv.start_unit() <= boundary {
                let inside = lengths_from_unit_length(boundary - iv.start_unit() + 1)?;
                let outside = lengths_from_unit_length(iv.end_unit() - boundary)?;

                let mut start = iv.start_unit();
                for (k, length) in inside.into_iter().enumerate() {
                    let mut piece = RhythmicInterval::rest(length, start);
                    if k == 0 {
                        piece = piece.with_note_heads(iv.note_heads().clone());
                    }
                    start += length.units();
                    kept.push(piece);
                }
                for (k, length) in outside.into_iter().enumerate() {
                    let mut piece = RhythmicInterval::rest(length, overflow_start);
                    if k == 0 {
                        piece = piece.with_note_heads(iv.note_heads().clone());
                    }
                    overflow_start += length.units();
                    overflow.push(piece);
                }
            } else {
                let mut moved = iv.clone();
                moved.set_start_unit(overflow_start);
                overflow_start += moved.length_in_units();
                overflow.push(moved);
            }
        }

        check_tiling(&kept, boundary)?;
        self.intervals = Vec::with_capacity(kept.len());
        self.insert_fresh(0, kept);
        self.time_signature = time_signature;
        self.rebuild_sub_groups()?;
        Ok(overflow)
    }
}
