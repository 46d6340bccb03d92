use std::fmt;

use serde::{Serialize, Serializer};

/// Ages `[start, start + width - 1]` inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AgeBucket {
    pub start: u32,
    pub width: u32,
}

impl AgeBucket {
    /// The bucket holding `age`. A zero width is treated as 1.
    pub fn containing(age: u32, width: u32) -> Self {
        let width = width.max(1);
        Self {
            start: age / width * width,
            width,
        }
    }

    pub fn end(&self) -> u32 {
        self.start + self.width - 1
    }

    pub fn contains(&self, age: u32) -> bool {
        (self.start..=self.end()).contains(&age)
    }
}

impl fmt::Display for AgeBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.width == 1 {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{}-{}", self.start, self.end())
        }
    }
}

// Serialised as its label so maps keyed by buckets become JSON objects.
impl Serialize for AgeBucket {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Visit start times `[start_hour:00, start_hour + width:00)` within one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimeBucket {
    pub start_hour: u32,
    pub width: u32,
}

impl TimeBucket {
    /// The bucket holding `hour` (0..24). Width is clamped to `1..=24`.
    pub fn containing(hour: u32, width: u32) -> Self {
        let width = width.clamp(1, 24);
        Self {
            start_hour: hour % 24 / width * width,
            width,
        }
    }

    /// Exclusive end hour; the last bucket of the day stops at 24.
    pub fn end_hour(&self) -> u32 {
        (self.start_hour + self.width).min(24)
    }
}

impl fmt::Display for TimeBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:00-{:02}:00", self.start_hour, self.end_hour())
    }
}

impl Serialize for TimeBucket {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
