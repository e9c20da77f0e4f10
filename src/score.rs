//! The score: a title and an ordered list of bars.

use std::collections::BTreeMap;

use crate::bar::{Bar, Overflow};
use crate::config::EditorConfig;
use crate::error::{Result, ScoreError};
use crate::interval::NoteHeadType;
use crate::length::RhythmicLength;
use crate::time_signature::TimeSignature;
use crate::voice::Voice;

#[derive(Debug, Clone, PartialEq)]
pub struct Score {
    title: String,
    bars: Vec<Bar>,
}

impl Score {
    /// Create a score without bars.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            bars: Vec::new(),
        }
    }

    /// Create a score with the configured title and number of empty bars.
    pub fn from_config(config: &EditorConfig) -> Result<Self> {
        let time_signature = config.time_signature()?;
        let mut score = Self::new(config.title.clone());
        for _ in 0..config.initial_bars {
            score.push_empty_bar(time_signature)?;
        }
        Ok(score)
    }

    pub(crate) fn from_bars(title: String, bars: Vec<Bar>) -> Self {
        let mut score = Self { title, bars };
        score.renumber();
        score
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn bar(&self, index: usize) -> Option<&Bar> {
        self.bars.get(index)
    }

    pub fn bar_count(&self) -> usize {
        self.bars.len()
    }

    fn bar_mut(&mut self, index: usize) -> Result<&mut Bar> {
        let len = self.bars.len();
        self.bars
            .get_mut(index)
            .ok_or(ScoreError::BarIndex { index, len })
    }

    /// Keep bar numbers equal to position + 1.
    fn renumber(&mut self) {
        for (pos, bar) in self.bars.iter_mut().enumerate() {
            bar.set_bar_nr(pos as u32 + 1);
        }
    }

    pub fn push_empty_bar(&mut self, time_signature: TimeSignature) -> Result<()> {
        let bar = Bar::empty(self.bars.len() as u32 + 1, time_signature)?;
        self.bars.push(bar);
        Ok(())
    }

    pub fn insert_empty_bar(&mut self, index: usize, time_signature: TimeSignature) -> Result<()> {
        if index > self.bars.len() {
            return Err(ScoreError::BarIndex {
                index,
                len: self.bars.len(),
            });
        }
        self.bars.insert(index, Bar::empty(0, time_signature)?);
        self.renumber();
        Ok(())
    }

    pub fn delete_bar(&mut self, index: usize) -> Result<Bar> {
        if index >= self.bars.len() {
            return Err(ScoreError::BarIndex {
                index,
                len: self.bars.len(),
            });
        }
        let removed = self.bars.remove(index);
        self.renumber();
        log::debug!("deleted bar {}, {} bars left", removed.bar_nr(), self.bars.len());
        Ok(removed)
    }

    pub fn add_note(
        &mut self,
        bar_index: usize,
        voice_num: u8,
        length: RhythmicLength,
        head: NoteHeadType,
        height: u8,
        interval_idx: usize,
    ) -> Result<()> {
        self.bar_mut(bar_index)?
            .add_note(voice_num, length, head, height, interval_idx)
    }

    pub fn add_rest(
        &mut self,
        bar_index: usize,
        voice_num: u8,
        length: RhythmicLength,
        interval_idx: usize,
    ) -> Result<()> {
        self.bar_mut(bar_index)?.add_rest(voice_num, length, interval_idx)
    }

    pub fn remove_note(
        &mut self,
        bar_index: usize,
        voice_num: u8,
        height: u8,
        interval_idx: usize,
    ) -> Result<()> {
        self.bar_mut(bar_index)?.remove_note(voice_num, height, interval_idx)
    }

    /// Change the signature of the bar at `index`.
    ///
    /// When notes spill past the new bar line they are carried into new bars
    /// inserted right after it, in the new signature; content longer than one
    /// new bar keeps spilling into further bars. Returns how many bars were
    /// inserted.
    pub fn change_bar_time_signature(
        &mut self,
        index: usize,
        time_signature: TimeSignature,
    ) -> Result<usize> {
        let mut bar = self.bar_mut(index)?.clone();
        let previous = bar.time_signature();
        let mut overflow = bar.apply_time_signature_change(time_signature)?;

        let mut successors = Vec::new();
        while !overflow.is_empty() {
            let mut carrier = carrier_bar(overflow, previous)?;
            overflow = carrier.change_time_signature_to_smaller(time_signature)?;
            successors.push(carrier);
        }

        let inserted = successors.len();
        self.bars[index] = bar;
        for (offset, successor) in successors.into_iter().enumerate() {
            self.bars.insert(index + 1 + offset, successor);
        }
        self.renumber();
        log::debug!(
            "bar {}: {previous} -> {time_signature}, {inserted} bar(s) inserted",
            index + 1
        );
        Ok(inserted)
    }
}

/// A bar in the previous signature that starts with the overflow and is
/// padded with rests, ready to be cut down to the new signature.
fn carrier_bar(overflow: Overflow, time_signature: TimeSignature) -> Result<Bar> {
    let mut voices = BTreeMap::new();
    for (num, intervals) in overflow.into_voices() {
        voices.insert(num, Voice::with_trailing_rests(intervals, time_signature)?);
    }
    Bar::with_voices(0, time_signature, voices)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::length::BasicLength;
    use pretty_assertions::assert_eq;

    fn whole() -> RhythmicLength {
        RhythmicLength::plain(BasicLength::Whole)
    }

    fn units(bar: &Bar, voice: u8) -> Vec<(u32, bool)> {
        bar.voice(voice)
            .unwrap()
            .intervals()
            .iter()
            .map(|iv| (iv.length_in_units(), iv.is_rest()))
            .collect()
    }

    fn score_with_bars(n: usize) -> Score {
        let mut score = Score::new("Groove");
        for _ in 0..n {
            score.push_empty_bar(TimeSignature::FOUR_FOUR).unwrap();
        }
        score
    }

    #[test]
    fn bars_are_renumbered() {
        let mut score = score_with_bars(3);
        score.insert_empty_bar(1, TimeSignature::new(3, 4).unwrap()).unwrap();
        let numbers: Vec<u32> = score.bars().iter().map(Bar::bar_nr).collect();
        assert_eq!(numbers, vec![1, 2, 3, 4]);
        assert_eq!(score.bar(1).unwrap().time_signature().units(), 36);

        score.delete_bar(0).unwrap();
        let numbers: Vec<u32> = score.bars().iter().map(Bar::bar_nr).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
        assert!(matches!(score.delete_bar(3), Err(ScoreError::BarIndex { index: 3, len: 3 })));
    }

    #[test]
    fn halving_a_whole_note_creates_successor() {
        let mut score = score_with_bars(2);
        score.add_note(0, 1, whole(), NoteHeadType::Elliptic, 4, 0).unwrap();
        let two_four = TimeSignature::new(2, 4).unwrap();

        let inserted = score.change_bar_time_signature(0, two_four).unwrap();

        assert_eq!(inserted, 1);
        assert_eq!(score.bar_count(), 3);
        assert_eq!(units(&score.bars()[0], 1), vec![(24, false)]);
        assert_eq!(units(&score.bars()[1], 1), vec![(24, false)]);
        assert_eq!(score.bars()[1].time_signature(), two_four);
        assert_eq!(score.bars()[2].bar_nr(), 3);
        assert_eq!(score.bars()[2].time_signature(), TimeSignature::FOUR_FOUR);
    }

    #[test]
    fn long_overflow_spills_into_several_bars() {
        let mut score = score_with_bars(1);
        score.add_note(0, 1, whole(), NoteHeadType::Cross, 9, 0).unwrap();
        let one_four = TimeSignature::new(1, 4).unwrap();

        assert_eq!(score.change_bar_time_signature(0, one_four).unwrap(), 3);
        for bar in score.bars() {
            assert_eq!(units(bar, 1), vec![(12, false)]);
        }
    }

    #[test]
    fn rest_only_overflow_inserts_nothing() {
        let mut score = score_with_bars(1);
        let quarter = RhythmicLength::plain(BasicLength::Quarter);
        score.add_note(0, 1, quarter, NoteHeadType::Elliptic, 2, 0).unwrap();
        let two_four = TimeSignature::new(2, 4).unwrap();
        assert_eq!(score.change_bar_time_signature(0, two_four).unwrap(), 0);
        assert_eq!(score.bar_count(), 1);
        assert_eq!(units(&score.bars()[0], 1), vec![(12, false), (12, true)]);
    }

    #[test]
    fn failed_change_keeps_score() {
        let mut score = score_with_bars(1);
        let before = score.clone();
        assert!(score.change_bar_time_signature(0, TimeSignature::FOUR_FOUR).is_err());
        assert!(score.change_bar_time_signature(4, TimeSignature::FOUR_FOUR).is_err());
        assert_eq!(score, before);
    }

    #[test]
    fn from_config_builds_empty_bars() {
        let toml = "title = \"Fills\"\ninitial_bars = 2\n\
                    [time_signature]\nnumerator = 6\ndenominator = 8\n";
        let config = EditorConfig::from_toml_str(toml).unwrap();
        let score = Score::from_config(&config).unwrap();
        assert_eq!(score.title(), "Fills");
        assert_eq!(score.bar_count(), 2);
        assert!(score.bars().iter().all(Bar::is_bar_of_rests));
        assert_eq!(units(&score.bars()[1], 1), vec![(36, true)]);
    }
}
