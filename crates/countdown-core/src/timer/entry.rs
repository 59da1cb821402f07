use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

const MAX_HOURS: u8 = 23;
const MAX_MINUTES: u8 = 59;
const MAX_SECONDS: u8 = 59;

/// One of the three counters of a [`TimeEntry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryField {
    Hours,
    Minutes,
    Seconds,
}

impl EntryField {
    pub fn max(self) -> u8 {
        match self {
            EntryField::Hours => MAX_HOURS,
            EntryField::Minutes => MAX_MINUTES,
            EntryField::Seconds => MAX_SECONDS,
        }
    }

    fn name(self) -> &'static str {
        match self {
            EntryField::Hours => "hours",
            EntryField::Minutes => "minutes",
            EntryField::Seconds => "seconds",
        }
    }
}

/// User-entered duration for a new countdown.
///
/// Each counter wraps around its range when adjusted, so the entry is always
/// a valid `HH:MM:SS` value below 24 hours.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeEntry {
    hours: u8,
    minutes: u8,
    seconds: u8,
}

impl TimeEntry {
    /// Build an entry, rejecting any counter above its maximum.
    pub fn new(hours: u8, minutes: u8, seconds: u8) -> Result<Self, ValidationError> {
        for (field, value) in [
            (EntryField::Hours, hours),
            (EntryField::Minutes, minutes),
            (EntryField::Seconds, seconds),
        ] {
            if value > field.max() {
                return Err(ValidationError::OutOfRange {
                    field: field.name(),
                    value: value as u64,
                    max: field.max() as u64,
                });
            }
        }
        Ok(Self {
            hours,
            minutes,
            seconds,
        })
    }

    /// Split a total number of seconds into an entry.
    pub fn from_secs(total: u64) -> Result<Self, ValidationError> {
        let hours = total / 3600;
        if hours > MAX_HOURS as u64 {
            return Err(ValidationError::OutOfRange {
                field: "hours",
                value: hours,
                max: MAX_HOURS as u64,
            });
        }
        Ok(Self {
            hours: hours as u8,
            minutes: ((total % 3600) / 60) as u8,
            seconds: (total % 60) as u8,
        })
    }

    pub fn hours(&self) -> u8 {
        self.hours
    }

    pub fn minutes(&self) -> u8 {
        self.minutes
    }

    pub fn seconds(&self) -> u8 {
        self.seconds
    }

    pub fn get(&self, field: EntryField) -> u8 {
        match field {
            EntryField::Hours => self.hours,
            EntryField::Minutes => self.minutes,
            EntryField::Seconds => self.seconds,
        }
    }

    /// Move one counter by `delta`, wrapping at both ends of its range.
    ///
    /// The engine only forwards `+1`/`-1`, but any delta wraps consistently.
    pub fn adjust(&mut self, field: EntryField, delta: i8) {
        let modulus = field.max() as i16 + 1;
        let slot = match field {
            EntryField::Hours => &mut self.hours,
            EntryField::Minutes => &mut self.minutes,
            EntryField::Seconds => &mut self.seconds,
        };
        *slot = (*slot as i16 + delta as i16).rem_euclid(modulus) as u8;
    }

    pub fn to_duration_secs(&self) -> u64 {
        self.hours as u64 * 3600 + self.minutes as u64 * 60 + self.seconds as u64
    }
}

impl fmt::Display for TimeEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}:{:02}", self.hours, self.minutes, self.seconds)
    }
}

/// Render a second count as `HH:MM:SS` (hours are not capped at 23).
pub fn format_hms(total_secs: u64) -> String {
    format!(
        "{:02}:{:02}:{:02}",
        total_secs / 3600,
        (total_secs % 3600) / 60,
        total_secs % 60
    )
}

/// Accepts `HH:MM:SS`, `MM:SS` or a bare `SS`.
impl FromStr for TimeEntry {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |message: String| ValidationError::InvalidValue {
            field: "duration".into(),
            message,
        };

        let parts = s
            .trim()
            .split(':')
            .map(|p| {
                p.parse::<u8>()
                    .map_err(|_| invalid(format!("'{p}' is not a number in '{s}'")))
            })
            .collect::<Result<Vec<_>, _>>()?;

        match parts.as_slice() {
            [h, m, sec] => Self::new(*h, *m, *sec),
            [m, sec] => Self::new(0, *m, *sec),
            [sec] => Self::new(0, 0, *sec),
            _ => Err(invalid(format!("expected HH:MM:SS, MM:SS or SS, got '{s}'"))),
        }
    }
}
