//! Time-driven avatar animation.
//!
//! ```text
//! PlaybackClock::elapsed(now) ──▶ sample(elapsed, words, total) ──▶ AnimationFrame
//!   (paused time excluded)          mouth = |sin(ms / 100)| × 100      mouth_openness
//!                                   word  = ⌊ms / (total / n)⌋         word_index
//!                                                                      progress / done
//! ```
//!
//! The mouth curve is synthetic; it does not follow the audio signal.

pub mod clock;
pub mod sampler;
pub mod words;

pub use clock::PlaybackClock;
pub use sampler::{sample, AnimationFrame, DEFAULT_TOTAL, MAX_OPENNESS};
pub use words::split_words;
