//! Runaway-stream watchdog for follow-up answers.
//!
//! Small local models occasionally fall into a loop and repeat one fragment,
//! or one short run of fragments, until the context window is exhausted. The
//! guard is fed every fragment and trips as soon as such a loop is evident.

use std::collections::VecDeque;

use serde::Serialize;
use thiserror::Error;

// ═══════════════════════════════════════════════════════════
// Configuration
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamGuardConfig {
    /// Same fragment N times in a row trips the guard.
    pub max_consecutive_identical: usize,
    /// Length of the fragment run checked for back-to-back repetition.
    pub sequence_length: usize,
    /// That run repeated M times back-to-back trips the guard.
    pub max_sequence_repeats: usize,
    /// Hard cap on fragments per answer.
    pub max_total_fragments: usize,
}

impl Default for StreamGuardConfig {
    fn default() -> Self {
        Self {
            max_consecutive_identical: 20,
            sequence_length: 10,
            max_sequence_repeats: 5,
            max_total_fragments: 8192,
        }
    }
}

// ═══════════════════════════════════════════════════════════
// Abort reasons
// ═══════════════════════════════════════════════════════════

/// Why a stream was cut off. Carries counts only, never fragment text.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "pattern", rename_all = "snake_case")]
pub enum StreamAbort {
    #[error("fragment repeated {count} times in a row")]
    FragmentRepeat { count: usize },

    #[error("{length}-fragment sequence repeated {repeats} times")]
    SequenceRepeat { length: usize, repeats: usize },

    #[error("fragment limit reached ({total})")]
    FragmentLimit { total: usize },
}

// ═══════════════════════════════════════════════════════════
// StreamGuard
// ═══════════════════════════════════════════════════════════

/// Stateful watchdog; one instance per stream.
pub struct StreamGuard {
    config: StreamGuardConfig,
    /// The last `sequence_length` fragments.
    window: VecDeque<String>,
    total: usize,
    consecutive: usize,
    /// How many fragments in a row matched the fragment `sequence_length` positions earlier.
    periodic_run: usize,
}

impl StreamGuard {
    pub fn new(config: StreamGuardConfig) -> Self {
        let capacity = config.sequence_length.max(1);
        Self {
            config,
            window: VecDeque::with_capacity(capacity),
            total: 0,
            consecutive: 0,
            periodic_run: 0,
        }
    }

    /// Account for one more fragment. `Err` means the stream must be abandoned.
    pub fn feed(&mut self, fragment: &str) -> Result<(), StreamAbort> {
        self.total += 1;
        if self.total >= self.config.max_total_fragments {
            return Err(StreamAbort::FragmentLimit { total: self.total });
        }

        if self.window.back().is_some_and(|last| last == fragment) {
            self.consecutive += 1;
        } else {
            self.consecutive = 1;
        }
        if self.consecutive >= self.config.max_consecutive_identical {
            return Err(StreamAbort::FragmentRepeat {
                count: self.consecutive,
            });
        }

        let k = self.config.sequence_length;
        if k > 0 {
            // Front of a full window is the fragment exactly k positions back.
            if self.window.len() == k && self.window.front().is_some_and(|f| f == fragment) {
                self.periodic_run += 1;
            } else {
                self.periodic_run = 0;
            }
            // A run of k * (M - 1) periodic matches means the last k * M fragments
            // are one k-sequence repeated M times.
            let needed = k * self.config.max_sequence_repeats.saturating_sub(1);
            if needed > 0 && self.periodic_run >= needed {
                return Err(StreamAbort::SequenceRepeat {
                    length: k,
                    repeats: self.config.max_sequence_repeats,
                });
            }
            if self.window.len() == k {
                self.window.pop_front();
            }
        } else {
            self.window.clear();
        }
        self.window.push_back(fragment.to_string());

        Ok(())
    }

    pub fn total_fragments(&self) -> usize {
        self.total
    }
}
