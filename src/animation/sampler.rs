//! Pure animation sampling.
//!
//! The avatar's mouth and the highlighted word are functions of elapsed time
//! only.  Nothing here reads a clock, so every frame can be computed (and
//! tested) from an explicit `Duration`.

use std::time::Duration;

/// Ceiling on a single animation run.  Playback is force-stopped when reached.
pub const DEFAULT_TOTAL: Duration = Duration::from_millis(10_000);

/// Divisor applied to elapsed milliseconds before taking the sine.
const MOUTH_PERIOD_MS: f64 = 100.0;

/// Fully open mouth.
pub const MAX_OPENNESS: f32 = 100.0;

/// One sampled animation frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationFrame {
    /// Jaw opening in `[0, 100]`.
    pub mouth_openness: f32,
    /// Word to highlight; `None` when there are no words.
    pub word_index: Option<usize>,
    /// Fraction of the run completed, in `[0, 1]`.
    pub progress: f32,
    /// `true` once `progress` reaches 1.
    pub done: bool,
}

/// Sample the animation at `elapsed` into a run of `total` over `word_count`
/// words.
///
/// ```
/// use std::time::Duration;
/// use talking_avatar::animation::{sample, DEFAULT_TOTAL};
///
/// let frame = sample(Duration::from_millis(5_000), 4, DEFAULT_TOTAL);
/// assert_eq!(frame.word_index, Some(2));
/// assert!(!frame.done);
/// ```
pub fn sample(elapsed: Duration, word_count: usize, total: Duration) -> AnimationFrame {
    let elapsed_ms = elapsed.as_secs_f64() * 1000.0;
    let total_ms = total.as_secs_f64() * 1000.0;

    let mouth_openness = ((elapsed_ms / MOUTH_PERIOD_MS).sin().abs() * MAX_OPENNESS as f64) as f32;

    let progress = if total_ms > 0.0 {
        (elapsed_ms / total_ms).min(1.0)
    } else {
        1.0
    };

    let word_index = match word_count {
        0 => None,
        n => {
            let last = n - 1;
            if total_ms > 0.0 {
                let per_word = total_ms / n as f64;
                Some(((elapsed_ms / per_word).floor() as usize).min(last))
            } else {
                Some(last)
            }
        }
    };

    AnimationFrame {
        mouth_openness: mouth_openness.clamp(0.0, MAX_OPENNESS),
        word_index,
        progress: progress as f32,
        done: progress >= 1.0,
    }
}
