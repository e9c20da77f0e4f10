//! Persistence shape of a score.
//!
//! A field-for-field projection of the model used for storage and for data
//! exchange with UI hosts. Importing goes back through the model
//! constructors, so a document that breaks the tiling invariant is rejected.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::bar::Bar;
use crate::error::Result;
use crate::interval::{NoteHeadType, RhythmicInterval};
use crate::length::{BasicLength, LengthModifier, RhythmicLength};
use crate::score::Score;
use crate::time_signature::TimeSignature;
use crate::voice::Voice;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreDocument {
    pub title: String,
    pub bars: Vec<BarDocument>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BarDocument {
    pub bar_nr: u32,
    pub time_signature: TimeSignatureDocument,
    /// Intervals per voice number
    pub voices: BTreeMap<u8, Vec<IntervalDocument>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeSignatureDocument {
    pub numerator: u32,
    pub denominator: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntervalDocument {
    pub basic_length: BasicLength,
    #[serde(default)]
    pub modifier: LengthModifier,
    pub start_unit: u32,
    /// Share of the bar's width, in percent. Derived on export, ignored on import.
    #[serde(default)]
    pub width_percent: f64,
    #[serde(default)]
    pub note_heads: BTreeMap<u8, NoteHeadType>,
}

impl IntervalDocument {
    fn from_interval(interval: &RhythmicInterval, bar_units: u32) -> Self {
        let length = interval.length();
        Self {
            basic_length: length.basic(),
            modifier: length.modifier(),
            start_unit: interval.start_unit(),
            width_percent: interval.length_in_units() as f64 * 100.0 / bar_units as f64,
            note_heads: interval.note_heads().clone(),
        }
    }

    fn to_interval(&self) -> Result<RhythmicInterval> {
        let length = RhythmicLength::new(self.basic_length, self.modifier)?;
        let mut interval = RhythmicInterval::rest(length, self.start_unit);
        for (height, head) in &self.note_heads {
            interval.add_note_head(*height, *head)?;
        }
        Ok(interval)
    }
}

impl BarDocument {
    fn from_bar(bar: &Bar) -> Self {
        let ts = bar.time_signature();
        Self {
            bar_nr: bar.bar_nr(),
            time_signature: TimeSignatureDocument {
                numerator: ts.numerator(),
                denominator: ts.denominator(),
            },
            voices: bar
                .voices()
                .iter()
                .map(|(num, voice)| {
                    let intervals = voice
                        .intervals()
                        .iter()
                        .map(|iv| IntervalDocument::from_interval(iv, ts.units()))
                        .collect();
                    (*num, intervals)
                })
                .collect(),
        }
    }

    fn to_bar(&self) -> Result<Bar> {
        let ts = TimeSignature::new(
            self.time_signature.numerator,
            self.time_signature.denominator,
        )?;
        let mut voices = BTreeMap::new();
        for (num, intervals) in &self.voices {
            let intervals = intervals
                .iter()
                .map(IntervalDocument::to_interval)
                .collect::<Result<Vec<_>>>()?;
            voices.insert(*num, Voice::new(intervals, ts)?);
        }
        Bar::with_voices(self.bar_nr, ts, voices)
    }
}

impl ScoreDocument {
    pub fn from_score(score: &Score) -> Self {
        Self {
            title: score.title().to_string(),
            bars: score.bars().iter().map(BarDocument::from_bar).collect(),
        }
    }

    /// Rebuild the model. Bars are renumbered by position.
    pub fn into_score(self) -> Result<Score> {
        let mut bars = Vec::with_capacity(self.bars.len());
        for (pos, doc) in self.bars.iter().enumerate() {
            if doc.bar_nr as usize != pos + 1 {
                log::warn!("bar at position {} claims number {}", pos + 1, doc.bar_nr);
            }
            bars.push(doc.to_bar()?);
        }
        Ok(Score::from_bars(self.title, bars))
    }
}
