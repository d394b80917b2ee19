//! Date and time handling for the two legacy NITF field layouts.
//!
//! NITF 2.1/NSIF code date-time fields as `CCYYMMDDhhmmss`, while NITF 2.0
//! uses `DDHHMMSSZMONYY` with an upper case three letter month. Both layouts
//! are fourteen bytes wide. Parsing accepts either layout unconditionally;
//! emission always uses the exact layout of the target version.
use crate::enums::Version;
use crate::errors::*;

const MONTHS: [&str; 12] = [
    "JAN", "FEB", "MAR", "APR", "MAY", "JUN", "JUL", "AUG", "SEP", "OCT", "NOV", "DEC",
];

/// A parsed NITF date-time, always kept with a four digit year.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NitfDateTime {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

impl NitfDateTime {
    pub fn new(year: u16, month: u8, day: u8, hour: u8, minute: u8, second: u8) -> Self {
        NitfDateTime {
            year,
            month,
            day,
            hour,
            minute,
            second,
        }
    }

    /// Parse a fourteen byte field in either layout. The 2.1 layout is tried
    /// first; a `Z` at byte eight selects the 2.0 layout outright.
    ///
    /// ```
    /// use nitf_core::datetime::NitfDateTime;
    ///
    /// let modern = NitfDateTime::parse("19990908070513").unwrap();
    /// let legacy = NitfDateTime::parse("08070513ZSEP99").unwrap();
    /// assert_eq!(modern, legacy);
    /// ```
    pub fn parse(s: &str) -> Result<Self, NitfError> {
        let s = s.trim_end();
        if s.len() != 14 {
            return Err(NitfError::Parse {
                field: "date-time".to_string(),
                value: s.to_string(),
            });
        }
        if s.as_bytes()[8] == b'Z' {
            Self::parse_nitf20(s)
        } else {
            Self::parse_nitf21(s)
        }
    }

    /// Parse the `CCYYMMDDhhmmss` layout.
    pub fn parse_nitf21(s: &str) -> Result<Self, NitfError> {
        let bad = |v: &str| NitfError::Parse {
            field: "date-time".to_string(),
            value: v.to_string(),
        };
        if s.len() != 14 || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(bad(s));
        }
        let dt = NitfDateTime {
            year: s[0..4].parse().map_err(|_| bad(s))?,
            month: s[4..6].parse().map_err(|_| bad(s))?,
            day: s[6..8].parse().map_err(|_| bad(s))?,
            hour: s[8..10].parse().map_err(|_| bad(s))?,
            minute: s[10..12].parse().map_err(|_| bad(s))?,
            second: s[12..14].parse().map_err(|_| bad(s))?,
        };
        dt.check(s)
    }

    /// Parse the `DDHHMMSSZMONYY` layout. The two digit year follows the
    /// usual century window: 69-99 is 19xx, 00-68 is 20xx.
    pub fn parse_nitf20(s: &str) -> Result<Self, NitfError> {
        let bad = |v: &str| NitfError::Parse {
            field: "date-time".to_string(),
            value: v.to_string(),
        };
        if s.len() != 14 || s.as_bytes()[8] != b'Z' {
            return Err(bad(s));
        }
        let month = MONTHS
            .iter()
            .position(|m| *m == &s[9..12])
            .ok_or_else(|| bad(s))? as u8
            + 1;
        let yy: u16 = s[12..14].parse().map_err(|_| bad(s))?;
        let year = if yy >= 69 { 1900 + yy } else { 2000 + yy };
        let dt = NitfDateTime {
            year,
            month,
            day: s[0..2].parse().map_err(|_| bad(s))?,
            hour: s[2..4].parse().map_err(|_| bad(s))?,
            minute: s[4..6].parse().map_err(|_| bad(s))?,
            second: s[6..8].parse().map_err(|_| bad(s))?,
        };
        dt.check(s)
    }

    fn check(self, source: &str) -> Result<Self, NitfError> {
        let ok = (1..=12).contains(&self.month)
            && (1..=31).contains(&self.day)
            && self.hour < 24
            && self.minute < 60
            && self.second < 60;
        if ok {
            Ok(self)
        } else {
            Err(NitfError::Parse {
                field: "date-time".to_string(),
                value: source.to_string(),
            })
        }
    }

    /// Emit the fourteen byte field in the layout of the target version.
    pub fn format(&self, version: Version) -> String {
        if version.is_legacy() {
            format!(
                "{:02}{:02}{:02}{:02}Z{}{:02}",
                self.day,
                self.hour,
                self.minute,
                self.second,
                MONTHS[(self.month - 1) as usize],
                self.year % 100,
            )
        } else {
            format!(
                "{:04}{:02}{:02}{:02}{:02}{:02}",
                self.year, self.month, self.day, self.hour, self.minute, self.second,
            )
        }
    }
}
