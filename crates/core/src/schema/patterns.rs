//! Named string formats used by the catalog.

use once_cell::sync::Lazy;
use regex::Regex;

static ISO_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}$").expect("ISO date pattern compiles"));
static DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]+$").expect("digits pattern compiles"));
static HOUR_MINUTE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]{2}:[0-9]{2}$").expect("duration pattern compiles"));
static EMAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern compiles")
});

/// A regex constraint with its caller-facing message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pattern {
    /// `YYYY-MM-DD`
    IsoDate,
    /// One or more ASCII digits.
    Digits,
    /// `HH:MM`
    HourMinute,
    Email,
}

impl Pattern {
    pub fn source(self) -> &'static str {
        self.regex().as_str()
    }

    pub fn message(self) -> &'static str {
        match self {
            Self::IsoDate => "must be a date in YYYY-MM-DD format",
            Self::Digits => "must contain digits only",
            Self::HourMinute => "must be a duration in HH:MM format",
            Self::Email => "must be an email address",
        }
    }

    pub fn is_match(self, value: &str) -> bool {
        self.regex().is_match(value)
    }

    fn regex(self) -> &'static Regex {
        match self {
            Self::IsoDate => &ISO_DATE,
            Self::Digits => &DIGITS,
            Self::HourMinute => &HOUR_MINUTE,
            Self::Email => &EMAIL,
        }
    }
}
