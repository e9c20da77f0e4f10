//! drumscore: rhythmic score model for a percussion sheet-music editor.
//!
//! A score is a list of bars; each bar holds up to four voices that always
//! tile the bar exactly, in units of 1/48 of a whole note. Edits (adding
//! notes and rests, changing lengths, changing time signatures) keep that
//! invariant and the sub-beat grouping used for beaming up to date.
//!
//! # Example
//! ```
//! use drumscore::{BasicLength, NoteHeadType, RhythmicLength, Score, TimeSignature};
//!
//! let mut score = Score::new("Rock beat");
//! score.push_empty_bar(TimeSignature::FOUR_FOUR).unwrap();
//! let quarter = RhythmicLength::plain(BasicLength::Quarter);
//! score.add_note(0, 1, quarter, NoteHeadType::Elliptic, 3, 0).unwrap();
//!
//! let voice = score.bars()[0].voice(1).unwrap();
//! assert_eq!(voice.intervals().len(), 2);
//! ```

pub mod bar;
pub mod config;
pub mod document;
pub mod error;
pub mod interval;
pub mod length;
pub mod score;
pub mod sub_group;
pub mod time_signature;
pub mod voice;

pub use bar::{Bar, Overflow, MAX_VOICES};
pub use config::EditorConfig;
pub use document::ScoreDocument;
pub use error::{Result, ScoreError};
pub use interval::{IntervalId, NoteHeadType, RhythmicInterval, MAX_NOTE_HEIGHT};
pub use length::{lengths_from_unit_length, BasicLength, LengthModifier, RhythmicLength, CATALOG};
pub use score::Score;
pub use sub_group::{StemDirection, SubGroup};
pub use time_signature::{TimeSignature, MAX_NUMERATOR};
pub use voice::Voice;

/// Convert a score to its JSON persistence form.
pub fn score_to_json(score: &Score) -> Result<String> {
    serde_json::to_string_pretty(&ScoreDocument::from_score(score))
        .map_err(|e| ScoreError::Document(format!("JSON serialization error: {e}")))
}

/// Rebuild a score from its JSON persistence form, validating every bar.
pub fn score_from_json(json: &str) -> Result<Score> {
    let doc: ScoreDocument = serde_json::from_str(json)
        .map_err(|e| ScoreError::Document(format!("Invalid score JSON: {e}")))?;
    doc.into_score()
}

// ═══════════════════════════════════════════════════════════════════════
// C FFI for iOS (static library) and Android hosts
// ═══════════════════════════════════════════════════════════════════════

use std::ffi::{CStr, CString};
use std::os::raw::c_char;

/// Validate a score document and return it re-serialized as a C string, with
/// derived fields (bar numbers, widths) recomputed. Returns null if the
/// document is malformed or breaks a model invariant.
/// The caller must free the returned string with `drumscore_free_string`.
///
/// # Safety
/// `json` must be a valid null-terminated UTF-8 C string.
#[no_mangle]
pub unsafe extern "C" fn drumscore_normalize_json(json: *const c_char) -> *mut c_char {
    if json.is_null() {
        return std::ptr::null_mut();
    }
    let c_str = unsafe { CStr::from_ptr(json) };
    let json = match c_str.to_str() {
        Ok(s) => s,
        Err(_) => return std::ptr::null_mut(),
    };

    match score_from_json(json).and_then(|score| score_to_json(&score)) {
        Ok(out) => CString::new(out).unwrap_or_default().into_raw(),
        Err(e) => {
            log::warn!("rejected score document: {e}");
            std::ptr::null_mut()
        }
    }
}

/// Free a string previously returned by drumscore functions.
///
/// # Safety
/// `ptr` must be a string previously returned by a drumscore function, or null.
#[no_mangle]
pub unsafe extern "C" fn drumscore_free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        unsafe {
            let _ = CString::from_raw(ptr);
        }
    }
}
