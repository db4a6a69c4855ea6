//! Word-reveal timing.
//!
//! Words are spread evenly over the narration: word `k` (0-based) of `n` becomes visible
//! at `duration / n * k` seconds, regardless of its length. Frame `i` covers time
//! `i / fps` and shows every word whose display time has been reached.

use crate::foundation::core::{FrameIndex, Fps};

// Absorbs float noise when a frame time lands exactly on a word boundary.
const TIME_EPSILON: f64 = 1e-9;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RevealEntry {
    pub frame: FrameIndex,
    pub visible_words: usize,
}

/// Ordered `frame -> visible word count` mapping for one narration.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RevealSchedule {
    pub entries: Vec<RevealEntry>,
    pub total_words: usize,
}

impl RevealSchedule {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RevealEntry> {
        self.entries.iter()
    }

    /// Number of distinct word counts, i.e. frames that actually need compositing.
    pub fn unique_frames(&self) -> usize {
        let mut n = 0;
        let mut last = None;
        for e in &self.entries {
            if last != Some(e.visible_words) {
                n += 1;
                last = Some(e.visible_words);
            }
        }
        n
    }
}

/// Display time in seconds of every word of an `n`-word text narrated over `duration_secs`.
pub fn word_display_times(word_count: usize, duration_secs: f64) -> Vec<f64> {
    if word_count == 0 {
        return Vec::new();
    }
    let per_word = duration_secs / word_count as f64;
    (0..word_count).map(|k| per_word * k as f64).collect()
}

/// Compute the reveal schedule for `summary` narrated over `duration_secs` at `fps`.
///
/// The schedule has `ceil(duration_secs * fps)` entries and is empty when the duration is
/// not positive. The last frame always shows the full text, even when there are more
/// words than frames.
pub fn schedule(summary: &str, duration_secs: f64, fps: Fps) -> RevealSchedule {
    let total_words = summary.split_whitespace().count();
    let frame_count = fps.secs_to_frames_ceil(duration_secs);
    if frame_count == 0 {
        return RevealSchedule {
            entries: Vec::new(),
            total_words,
        };
    }

    let times = word_display_times(total_words, duration_secs);
    let mut entries = Vec::with_capacity(frame_count as usize);
    // `times` is sorted, so the visible count only ever advances.
    let mut visible = 0usize;
    for i in 0..frame_count {
        let t = fps.frames_to_secs(i);
        while visible < times.len() && t + TIME_EPSILON >= times[visible] {
            visible += 1;
        }
        entries.push(RevealEntry {
            frame: FrameIndex(i),
            visible_words: visible,
        });
    }

    if let Some(last) = entries.last_mut() {
        last.visible_words = total_words;
    }

    RevealSchedule {
        entries,
        total_words,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/schedule.rs"]
mod tests;
