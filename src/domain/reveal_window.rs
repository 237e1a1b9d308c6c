//! Reveal and display windows over a price series.
//!
//! `current_index` counts the bars revealed to the trader and only ever grows,
//! one bar per `advance`. The display mode picks how much of that revealed
//! prefix the chart shows; changing it never moves `current_index`.

use std::fmt;
use std::ops::Range;
use std::str::FromStr;

use crate::domain::error::TraderError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WindowMode {
    /// Every revealed bar.
    All,
    /// The last `k` revealed bars.
    Fixed(usize),
}

impl fmt::Display for WindowMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WindowMode::All => write!(f, "All"),
            WindowMode::Fixed(k) => write!(f, "{}", k),
        }
    }
}

impl FromStr for WindowMode {
    type Err = TraderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("all") {
            return Ok(WindowMode::All);
        }
        match trimmed.parse::<usize>() {
            Ok(k) if k > 0 => Ok(WindowMode::Fixed(k)),
            _ => Err(TraderError::InvalidCommand {
                input: trimmed.to_string(),
                reason: "window must be 'all' or a positive bar count".into(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevealWindow {
    current_index: usize,
    len: usize,
    mode: WindowMode,
}

impl RevealWindow {
    /// Start a window over `len` bars with `initial_reveal` bars visible.
    ///
    /// `initial_reveal` is clamped into `[1, len]` so the boundary bar always
    /// exists, even for series shorter than the configured reveal count.
    pub fn new(len: usize, initial_reveal: usize) -> Result<Self, TraderError> {
        if len == 0 {
            return Err(TraderError::InvalidSeries {
                reason: "cannot reveal an empty series".into(),
            });
        }
        Ok(Self {
            current_index: initial_reveal.clamp(1, len),
            len,
            mode: WindowMode::All,
        })
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn mode(&self) -> WindowMode {
        self.mode
    }

    /// Index of the most recently revealed bar.
    pub fn boundary_index(&self) -> usize {
        self.current_index - 1
    }

    pub fn is_exhausted(&self) -> bool {
        self.current_index >= self.len
    }

    pub fn remaining(&self) -> usize {
        self.len - self.current_index
    }

    /// Reveal one more bar and return the new boundary index.
    ///
    /// At the end of the series this leaves state untouched and returns
    /// `NoMoreData`.
    pub fn advance(&mut self) -> Result<usize, TraderError> {
        if self.is_exhausted() {
            return Err(TraderError::NoMoreData { len: self.len });
        }
        self.current_index += 1;
        Ok(self.boundary_index())
    }

    /// Switch display mode and return the new displayed range.
    pub fn set_mode(&mut self, mode: WindowMode) -> Range<usize> {
        self.mode = mode;
        self.display_range()
    }

    pub fn visible_count(&self) -> usize {
        match self.mode {
            WindowMode::All => self.current_index,
            WindowMode::Fixed(k) => k.min(self.current_index),
        }
    }

    /// Bars currently shown: `[current_index - visible_count, current_index)`.
    pub fn display_range(&self) -> Range<usize> {
        (self.current_index - self.visible_count())..self.current_index
    }

    /// Bars the trader has seen: `[0, current_index)`.
    pub fn revealed_range(&self) -> Range<usize> {
        0..self.current_index
    }
}
