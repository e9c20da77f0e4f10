//! Bars: up to four voices under one time signature.
//!
//! Edits work on a copy of the touched voice(s) and are committed only once
//! every step succeeded, so a rejected edit leaves the bar as it was.

use std::collections::BTreeMap;

use crate::error::{Result, ScoreError};
use crate::interval::{NoteHeadType, RhythmicInterval};
use crate::length::RhythmicLength;
use crate::sub_group::{StemDirection, STEM_UP_MAX_AVERAGE};
use crate::time_signature::TimeSignature;
use crate::voice::Voice;

pub const MAX_VOICES: u8 = 4;

fn check_voice_num(voice_num: u8) -> Result<()> {
    if (1..=MAX_VOICES).contains(&voice_num) {
        Ok(())
    } else {
        log::warn!("rejected voice number {voice_num}");
        Err(ScoreError::InvalidVoice(voice_num))
    }
}

/// Content pushed past the bar line by a smaller time signature, keyed by
/// voice number. Each list starts at unit 1. Voices that only spilled rests
/// are left out.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Overflow {
    voices: BTreeMap<u8, Vec<RhythmicInterval>>,
}

impl Overflow {
    /// True when nothing renderable spilled over.
    pub fn is_empty(&self) -> bool {
        self.voices.is_empty()
    }

    pub fn voices(&self) -> &BTreeMap<u8, Vec<RhythmicInterval>> {
        &self.voices
    }

    pub fn voice(&self, voice_num: u8) -> Option<&[RhythmicInterval]> {
        self.voices.get(&voice_num).map(Vec::as_slice)
    }

    pub(crate) fn into_voices(self) -> BTreeMap<u8, Vec<RhythmicInterval>> {
        self.voices
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    bar_nr: u32,
    time_signature: TimeSignature,
    voices: BTreeMap<u8, Voice>,
}

impl Bar {
    /// A bar holding a single voice of rests.
    pub fn empty(bar_nr: u32, time_signature: TimeSignature) -> Result<Self> {
        let mut voices = BTreeMap::new();
        voices.insert(1, Voice::filled_with_rests(time_signature)?);
        Ok(Self {
            bar_nr,
            time_signature,
            voices,
        })
    }

    pub fn with_voices(
        bar_nr: u32,
        time_signature: TimeSignature,
        voices: BTreeMap<u8, Voice>,
    ) -> Result<Self> {
        if voices.is_empty() {
            return Err(ScoreError::invariant(format!("bar {bar_nr} has no voices")));
        }
        for (num, voice) in &voices {
            check_voice_num(*num)?;
            if voice.time_signature() != time_signature {
                return Err(ScoreError::invariant(format!(
                    "voice {num} is in {} but bar {bar_nr} is in {time_signature}",
                    voice.time_signature()
                )));
            }
        }
        let mut bar = Self {
            bar_nr,
            time_signature,
            voices,
        };
        bar.calculate_voice_stem_directions()?;
        Ok(bar)
    }

    pub fn bar_nr(&self) -> u32 {
        self.bar_nr
    }

    pub(crate) fn set_bar_nr(&mut self, bar_nr: u32) {
        self.bar_nr = bar_nr;
    }

    pub fn time_signature(&self) -> TimeSignature {
        self.time_signature
    }

    pub fn voices(&self) -> &BTreeMap<u8, Voice> {
        &self.voices
    }

    pub fn voice(&self, voice_num: u8) -> Option<&Voice> {
        self.voices.get(&voice_num)
    }

    pub fn is_bar_of_rests(&self) -> bool {
        self.voices.values().all(Voice::is_all_rests)
    }

    /// Working copy of a voice, or a fresh voice of rests (targeting its
    /// first interval) if the bar does not have it yet.
    fn editable_voice(&self, voice_num: u8, interval_idx: usize) -> Result<(Voice, usize)> {
        check_voice_num(voice_num)?;
        let (voice, idx) = match self.voices.get(&voice_num) {
            Some(voice) => (voice.clone(), interval_idx),
            None => (Voice::filled_with_rests(self.time_signature)?, 0),
        };
        if idx >= voice.len() {
            log::warn!("bar {}: interval {idx} out of range in voice {voice_num}", self.bar_nr);
            return Err(ScoreError::IntervalIndex {
                index: idx,
                len: voice.len(),
            });
        }
        Ok((voice, idx))
    }

    fn commit(&mut self, voice_num: u8, voice: Voice) -> Result<()> {
        self.voices.insert(voice_num, voice);
        self.calculate_voice_stem_directions()
    }

    /// Put a note head on an interval and give it `length`.
    ///
    /// A voice that does not exist yet is created from rests and the note
    /// lands on its first interval.
    pub fn add_note(
        &mut self,
        voice_num: u8,
        length: RhythmicLength,
        head: NoteHeadType,
        height: u8,
        interval_idx: usize,
    ) -> Result<()> {
        let (mut voice, idx) = self.editable_voice(voice_num, interval_idx)?;
        voice.add_note_head(idx, height, head)?;
        if voice.intervals()[idx].length() != length {
            voice.resize_interval(idx, length)?;
        }
        self.commit(voice_num, voice)?;
        log::debug!(
            "bar {}: voice {voice_num} interval {idx} has {length} note at height {height}",
            self.bar_nr
        );
        Ok(())
    }

    /// Turn an interval into a rest of `length`.
    pub fn add_rest(
        &mut self,
        voice_num: u8,
        length: RhythmicLength,
        interval_idx: usize,
    ) -> Result<()> {
        let (mut voice, idx) = self.editable_voice(voice_num, interval_idx)?;
        if !voice.intervals()[idx].is_rest() {
            voice.make_rest(idx)?;
        }
        if voice.intervals()[idx].length() != length {
            voice.resize_interval(idx, length)?;
        }
        self.commit(voice_num, voice)?;
        log::debug!("bar {}: voice {voice_num} interval {idx} is a {length} rest", self.bar_nr);
        Ok(())
    }

    /// Remove the head at `height`; the interval becomes a rest when it was
    /// the last one.
    pub fn remove_note(&mut self, voice_num: u8, height: u8, interval_idx: usize) -> Result<()> {
        check_voice_num(voice_num)?;
        let mut voice = self
            .voices
            .get(&voice_num)
            .cloned()
            .ok_or(ScoreError::MissingVoice(voice_num))?;
        voice.remove_note_head(interval_idx, height)?;
        self.commit(voice_num, voice)
    }

    /// Assign stem directions across voices.
    ///
    /// A lone voice gets none and leaves the choice to its sub-groups.
    /// Otherwise voices are ranked by average note height: the lowest points
    /// down, the highest up, a middle voice of three down, and the middle pair
    /// of four down then up. Voices without notes rank at the staff midline.
    pub fn calculate_voice_stem_directions(&mut self) -> Result<()> {
        let count = self.voices.len();
        if count <= 1 {
            for voice in self.voices.values_mut() {
                voice.set_stem_direction(None);
            }
            return Ok(());
        }
        let directions: &[StemDirection] = match count {
            2 => &[StemDirection::Down, StemDirection::Up],
            3 => &[StemDirection::Down, StemDirection::Down, StemDirection::Up],
            4 => &[
                StemDirection::Down,
                StemDirection::Down,
                StemDirection::Up,
                StemDirection::Up,
            ],
            _ => {
                return Err(ScoreError::invariant(format!(
                    "bar {} has {count} voices",
                    self.bar_nr
                )))
            }
        };

        let mut ranking: Vec<(f64, u8)> = self
            .voices
            .iter()
            .map(|(num, voice)| (voice.average_note_height().unwrap_or(STEM_UP_MAX_AVERAGE), *num))
            .collect();
        ranking.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

        for ((_, num), direction) in ranking.into_iter().zip(directions) {
            if let Some(voice) = self.voices.get_mut(&num) {
                voice.set_stem_direction(Some(*direction));
            }
        }
        Ok(())
    }

    /// Replace all content with a single voice of rests in `time_signature`.
    fn reset_to_rests(&mut self, time_signature: TimeSignature) -> Result<()> {
        let voice = Voice::filled_with_rests(time_signature)?;
        self.voices = BTreeMap::from([(1, voice)]);
        self.time_signature = time_signature;
        self.calculate_voice_stem_directions()
    }

    /// Adopt a longer signature; every voice gains trailing rests.
    pub fn change_time_signature_to_larger(&mut self, time_signature: TimeSignature) -> Result<()> {
        if time_signature.units() <= self.time_signature.units() {
            return Err(ScoreError::NotLarger {
                current: self.time_signature,
                new: time_signature,
            });
        }
        if self.is_bar_of_rests() {
            return self.reset_to_rests(time_signature);
        }

        let mut voices = self.voices.clone();
        for voice in voices.values_mut() {
            voice.extend_to(time_signature)?;
        }
        log::debug!(
            "bar {}: {} -> {time_signature}",
            self.bar_nr,
            self.time_signature
        );
        self.voices = voices;
        self.time_signature = time_signature;
        self.calculate_voice_stem_directions()
    }

    /// Adopt a shorter signature and hand back what no longer fits.
    ///
    /// The caller decides whether the overflow warrants a successor bar.
    pub fn change_time_signature_to_smaller(
        &mut self,
        time_signature: TimeSignature,
    ) -> Result<Overflow> {
        if time_signature.units() >= self.time_signature.units() {
            return Err(ScoreError::NotSmaller {
                current: self.time_signature,
                new: time_signature,
            });
        }
        if self.is_bar_of_rests() {
            self.reset_to_rests(time_signature)?;
            return Ok(Overflow::default());
        }

        let mut voices = self.voices.clone();
        let mut overflow = Overflow::default();
        for (num, voice) in voices.iter_mut() {
            let spilled = voice.truncate_to(time_signature)?;
            if spilled.iter().any(|iv| !iv.is_rest()) {
                overflow.voices.insert(*num, spilled);
            }
        }
        log::debug!(
            "bar {}: {} -> {time_signature}, {} voice(s) overflow",
            self.bar_nr,
            self.time_signature,
            overflow.voices.len()
        );
        self.voices = voices;
        self.time_signature = time_signature;
        self.calculate_voice_stem_directions()?;
        Ok(overflow)
    }

    /// Apply any signature change, dispatching on bar length.
    ///
    /// A signature of the same length only regroups the voices.
    pub fn apply_time_signature_change(
        &mut self,
        time_signature: TimeSignature,
    ) -> Result<Overflow> {
        let current = self.time_signature;
        if time_signature == current {
            return Err(ScoreError::SameTimeSignature(current));
        }
        match time_signature.units().cmp(&current.units()) {
            std::cmp::Ordering::Greater => {
                self.change_time_signature_to_larger(time_signature)?;
                Ok(Overflow::default())
            }
            std::cmp::Ordering::Less => self.change_time_signature_to_smaller(time_signature),
            std::cmp::Ordering::Equal => {
                let mut voices = self.voices.clone();
                for voice in voices.values_mut() {
                    voice.regroup(time_signature)?;
                }
                self.voices = voices;
                self.time_signature = time_signature;
                self.calculate_voice_stem_directions()?;
                Ok(Overflow::default())
            }
        }
    }
}
