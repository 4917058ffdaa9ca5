//! # Rolling Series
//! Fixed-capacity sample buffers behind the bot vs human chart.
//!
//! Each series keeps the last `capacity` samples, oldest first. A push into a
//! full series evicts exactly one sample (the oldest) before appending, so the
//! newest value is never dropped.

use std::collections::VecDeque;

/// Default number of samples kept per series.
pub const DEFAULT_MAX_LENGTH: usize = 100;

/// Which of the two series a sample belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SeriesId {
    Bot,
    Human,
}

impl SeriesId {
    /// Route a classification tag value to a series.
    ///
    /// Only the exact tag text `true` is a bot; everything else (including
    /// `false`, an empty value or `True`) is human.
    pub fn from_tag(is_bot: &str) -> Self {
        if is_bot == "true" {
            SeriesId::Bot
        } else {
            SeriesId::Human
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SeriesId::Bot => "Bots",
            SeriesId::Human => "Humans",
        }
    }
}

/// Bounded FIFO of numeric samples.
#[derive(Debug, Clone, PartialEq)]
pub struct RollingSeries {
    buf: VecDeque<f64>,
    capacity: usize,
}

impl RollingSeries {
    /// Create an empty series holding at most `capacity` samples (minimum 1).
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            buf: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a sample, evicting the oldest one first when full.
    pub fn push(&mut self, value: f64) {
        debug_assert!(value.is_finite(), "rolling series sample must be finite");
        if self.buf.len() >= self.capacity {
            self.buf.pop_front();
        }
        self.buf.push_back(value);
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Most recent sample.
    pub fn last(&self) -> Option<f64> {
        self.buf.back().copied()
    }

    /// Samples oldest-first as a contiguous vector.
    pub fn to_vec(&self) -> Vec<f64> {
        self.buf.iter().copied().collect()
    }
}

impl Default for RollingSeries {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_MAX_LENGTH)
    }
}

/// The bot and human series, selected by [`SeriesId`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DualSeries {
    bots: RollingSeries,
    humans: RollingSeries,
}

impl DualSeries {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            bots: RollingSeries::with_capacity(capacity),
            humans: RollingSeries::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, id: SeriesId, value: f64) {
        self.get_mut(id).push(value);
    }

    pub fn get(&self, id: SeriesId) -> &RollingSeries {
        match id {
            SeriesId::Bot => &self.bots,
            SeriesId::Human => &self.humans,
        }
    }

    fn get_mut(&mut self, id: SeriesId) -> &mut RollingSeries {
        match id {
            SeriesId::Bot => &mut self.bots,
            SeriesId::Human => &mut self.humans,
        }
    }

    pub fn bots(&self) -> &RollingSeries {
        &self.bots
    }

    pub fn humans(&self) -> &RollingSeries {
        &self.humans
    }
}
