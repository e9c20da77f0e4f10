//! Time signature change tests: truncation, overflow and extension of bars.

use drumscore::{
    Bar, BasicLength, NoteHeadType, RhythmicLength, Score, ScoreError, TimeSignature, Voice,
};
use pretty_assertions::assert_eq;

fn ts(n: u32, d: u32) -> TimeSignature {
    TimeSignature::new(n, d).unwrap()
}

fn layout(voice: &Voice) -> Vec<(u32, u32, bool)> {
    voice
        .intervals()
        .iter()
        .map(|iv| (iv.start_unit(), iv.length_in_units(), iv.is_rest()))
        .collect()
}

fn quarters_bar(notes: [bool; 4]) -> Bar {
    let mut bar = Bar::empty(1, TimeSignature::FOUR_FOUR).unwrap();
    let quarter = RhythmicLength::plain(BasicLength::Quarter);
    for (idx, is_note) in notes.iter().enumerate() {
        if *is_note {
            bar.add_note(1, quarter, NoteHeadType::Elliptic, 4, idx).unwrap();
        } else {
            bar.add_rest(1, quarter, idx).unwrap();
        }
    }
    bar
}

#[test]
fn whole_note_halved_spills_a_half() {
    let mut bar = Bar::empty(1, TimeSignature::FOUR_FOUR).unwrap();
    let whole = RhythmicLength::plain(BasicLength::Whole);
    bar.add_note(1, whole, NoteHeadType::Elliptic, 5, 0).unwrap();

    let overflow = bar.change_time_signature_to_smaller(ts(2, 4)).unwrap();

    assert_eq!(bar.time_signature(), ts(2, 4));
    let voice = bar.voice(1).unwrap();
    assert_eq!(layout(voice), vec![(1, 24, false)]);
    assert_eq!(voice.time_signature(), ts(2, 4));
    assert_eq!(voice.sub_groups().len(), 2);

    let spilled = overflow.voice(1).expect("voice 1 should overflow");
    assert_eq!(spilled.len(), 1);
    assert_eq!(spilled[0].start_unit(), 1);
    assert_eq!(spilled[0].length(), RhythmicLength::plain(BasicLength::Half));
    assert_eq!(spilled[0].note_heads().get(&5), Some(&NoteHeadType::Elliptic));
}

#[test]
fn intervals_past_the_bar_line_are_relocated() {
    let mut bar = quarters_bar([true, false, true, true]);

    let overflow = bar.change_time_signature_to_smaller(ts(2, 4)).unwrap();

    assert_eq!(layout(bar.voice(1).unwrap()), vec![(1, 12, false), (13, 12, true)]);
    let spilled: Vec<(u32, u32, bool)> = overflow
        .voice(1)
        .unwrap()
        .iter()
        .map(|iv| (iv.start_unit(), iv.length_in_units(), iv.is_rest()))
        .collect();
    assert_eq!(spilled, vec![(1, 12, false), (13, 12, false)]);
}

#[test]
fn straddling_note_is_split_at_the_bar_line() {
    let mut bar = Bar::empty(1, TimeSignature::FOUR_FOUR).unwrap();
    let dotted_half = RhythmicLength::dotted(BasicLength::Half).unwrap();
    bar.add_note(1, dotted_half, NoteHeadType::Cross, 8, 0).unwrap();

    let overflow = bar.change_time_signature_to_smaller(ts(2, 4)).unwrap();

    assert_eq!(layout(bar.voice(1).unwrap()), vec![(1, 24, false)]);
    let spilled: Vec<(u32, u32, bool)> = overflow
        .voice(1)
        .unwrap()
        .iter()
        .map(|iv| (iv.start_unit(), iv.length_in_units(), iv.is_rest()))
        .collect();
    assert_eq!(spilled, vec![(1, 12, false), (13, 12, true)]);
}

#[test]
fn rest_only_spill_is_not_reported() {
    let mut bar = quarters_bar([true, false, false, false]);
    let dotted_half = RhythmicLength::dotted(BasicLength::Half).unwrap();
    bar.add_note(2, dotted_half, NoteHeadType::Cross, 11, 0).unwrap();

    let overflow = bar.change_time_signature_to_smaller(ts(3, 4)).unwrap();

    assert!(overflow.voice(1).is_none(), "voice 1 only spilled rests");
    assert!(overflow.voice(2).is_none(), "voice 2 only spilled rests");
    assert!(overflow.is_empty());
    assert_eq!(layout(bar.voice(2).unwrap()), vec![(1, 36, false)]);
    for voice in bar.voices().values() {
        voice.check_tiling().unwrap();
    }
}

#[test]
fn second_voice_overflows_alone() {
    let mut bar = quarters_bar([true, false, false, false]);
    let whole = RhythmicLength::plain(BasicLength::Whole);
    bar.add_note(2, whole, NoteHeadType::Cross, 11, 0).unwrap();

    let overflow = bar.change_time_signature_to_smaller(ts(3, 4)).unwrap();

    assert!(overflow.voice(1).is_none());
    let spilled = overflow.voice(2).unwrap();
    assert_eq!(spilled.len(), 1);
    assert_eq!(spilled[0].length_in_units(), 12);
    assert_eq!(layout(bar.voice(2).unwrap()), vec![(1, 36, false)]);
}

#[test]
fn rest_bar_is_reset_on_change() {
    let mut bar = Bar::empty(1, TimeSignature::FOUR_FOUR).unwrap();
    bar.add_rest(3, RhythmicLength::plain(BasicLength::Eighth), 0).unwrap();
    assert_eq!(bar.voices().len(), 2);

    let overflow = bar.change_time_signature_to_smaller(ts(3, 8)).unwrap();

    assert!(overflow.is_empty());
    assert_eq!(bar.voices().len(), 1);
    assert_eq!(layout(bar.voice(1).unwrap()), vec![(1, 18, true)]);
}

#[test]
fn truncating_into_an_ungrouped_meter() {
    let mut bar = Bar::empty(1, ts(6, 8)).unwrap();
    let dotted_quarter = RhythmicLength::dotted(BasicLength::Quarter).unwrap();
    bar.add_note(1, dotted_quarter, NoteHeadType::Elliptic, 3, 0).unwrap();

    let overflow = bar.change_time_signature_to_smaller(ts(5, 8)).unwrap();

    assert!(overflow.is_empty());
    let voice = bar.voice(1).unwrap();
    assert_eq!(layout(voice), vec![(1, 18, false), (19, 12, true)]);
    assert_eq!(voice.sub_groups().len(), 1);
    assert!(voice.time_signature().is_ungrouped());
}

#[test]
fn wrong_direction_is_rejected() {
    let mut bar = quarters_bar([true, true, false, false]);
    let before = bar.clone();
    assert_eq!(
        bar.change_time_signature_to_smaller(ts(5, 4)),
        Err(ScoreError::NotSmaller {
            current: TimeSignature::FOUR_FOUR,
            new: ts(5, 4)
        })
    );
    assert!(matches!(
        bar.change_time_signature_to_larger(ts(2, 2)),
        Err(ScoreError::NotLarger { .. })
    ));
    assert_eq!(bar, before);
}

#[test]
fn score_grow_then_shrink_restores_content() {
    let mut score = Score::new("Shuffle");
    score.push_empty_bar(TimeSignature::FOUR_FOUR).unwrap();
    score.push_empty_bar(TimeSignature::FOUR_FOUR).unwrap();
    let quarter = RhythmicLength::plain(BasicLength::Quarter);
    score.add_note(0, 1, quarter, NoteHeadType::Elliptic, 2, 0).unwrap();

    assert_eq!(score.change_bar_time_signature(0, ts(6, 4)).unwrap(), 0);
    assert_eq!(
        layout(score.bars()[0].voice(1).unwrap()),
        vec![(1, 12, false), (13, 36, true), (49, 24, true)]
    );

    assert_eq!(score.change_bar_time_signature(0, TimeSignature::FOUR_FOUR).unwrap(), 0);
    assert_eq!(
        layout(score.bars()[0].voice(1).unwrap()),
        vec![(1, 12, false), (13, 36, true)]
    );
    assert_eq!(score.bar_count(), 2);
}
