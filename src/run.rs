use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, TimeZone, Timelike, Utc};

use crate::error::{Error, Result};

/// Synoptic hours at which GSM runs are published.
pub const SYNOPTIC_HOURS: [u32; 4] = [0, 6, 12, 18];

/// A GSM initialization time (UTC date + cycle hour).
///
/// All string tokens used in remote URLs and local paths are derived from
/// these two fields, so two equal identities always resolve to the same
/// locations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RunIdentity {
    date: NaiveDate,
    hour: u32,
}

impl RunIdentity {
    /// Any hour of day is accepted here. Use [`RunIdentity::parse_run_id`] or
    /// [`RunIdentity::is_synoptic`] when only published cycles make sense.
    pub fn new(date: NaiveDate, hour: u32) -> Result<Self> {
        if hour > 23 {
            return Err(Error::InvalidInput(format!(
                "cycle hour must be within 0..=23, got {hour}"
            )));
        }
        Ok(Self { date, hour })
    }

    /// Truncate an instant to its UTC date and hour.
    ///
    /// The offset carried by `instant` is honoured, so `2026-01-30T09:30+09:00`
    /// becomes run `2026013000`.
    pub fn from_instant<Tz: TimeZone>(instant: &DateTime<Tz>) -> Self {
        let utc = instant.with_timezone(&Utc);
        Self {
            date: utc.date_naive(),
            hour: utc.hour(),
        }
    }

    /// Parse an RFC 3339 timestamp. Timestamps without an explicit offset are
    /// rejected: a naive local time would silently shift the run id.
    pub fn parse_instant(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        match DateTime::parse_from_rfc3339(trimmed) {
            Ok(dt) => Ok(Self::from_instant(&dt)),
            Err(_) if is_naive_timestamp(trimmed) => Err(Error::InvalidInput(format!(
                "timestamp has no UTC offset: {trimmed}"
            ))),
            Err(e) => Err(Error::InvalidInput(format!(
                "invalid timestamp {trimmed}: {e}"
            ))),
        }
    }

    /// Parse a `YYYYMMDDHH` run id. HH must be one of 00/06/12/18.
    pub fn parse_run_id(run_id: &str) -> Result<Self> {
        let t = run_id.trim();
        if t.len() != 10 || !t.bytes().all(|b| b.is_ascii_digit()) {
            return Err(Error::InvalidInput(format!(
                "run id must be YYYYMMDDHH (10 digits), got {run_id:?}"
            )));
        }

        let date = NaiveDate::parse_from_str(&t[..8], "%Y%m%d")
            .map_err(|_| Error::InvalidInput(format!("invalid run date: {}", &t[..8])))?;
        let hour: u32 = t[8..]
            .parse()
            .map_err(|_| Error::InvalidInput(format!("invalid cycle hour: {}", &t[8..])))?;

        if !SYNOPTIC_HOURS.contains(&hour) {
            return Err(Error::InvalidInput(format!(
                "cycle hour must be one of 00,06,12,18, got {hour:02}"
            )));
        }

        Ok(Self { date, hour })
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn hour(&self) -> u32 {
        self.hour
    }

    pub fn is_synoptic(&self) -> bool {
        SYNOPTIC_HOURS.contains(&self.hour)
    }

    /// `YYYYMMDD`
    pub fn date_token(&self) -> String {
        format!(
            "{:04}{:02}{:02}",
            self.date.year(),
            self.date.month(),
            self.date.day()
        )
    }

    /// `HH`
    pub fn cycle_token(&self) -> String {
        format!("{:02}", self.hour)
    }

    /// `HH0000`, the per-cycle directory name on the portal.
    pub fn cycle_dir(&self) -> String {
        format!("{:02}0000", self.hour)
    }

    /// `YYYYMMDDHH`
    pub fn run_id(&self) -> String {
        format!("{}{}", self.date_token(), self.cycle_token())
    }

    /// `YYYYMMDDHH0000` (14 digits), embedded verbatim in open-product filenames.
    pub fn init_stamp(&self) -> String {
        format!("{}{}", self.date_token(), self.cycle_dir())
    }

    /// Step back one synoptic cycle. `None` only at the calendar lower bound.
    fn previous_cycle(&self) -> Option<Self> {
        if self.hour >= 6 {
            Some(Self {
                date: self.date,
                hour: self.hour - 6,
            })
        } else {
            self.date.pred_opt().map(|date| Self { date, hour: 18 })
        }
    }
}

impl fmt::Display for RunIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.run_id())
    }
}

impl FromStr for RunIdentity {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse_run_id(s)
    }
}

/// The `count` most recent synoptic cycles at or before `instant`, newest first.
///
/// Only calendar arithmetic; whether a run is actually published has to be
/// probed separately.
pub fn recent_cycles<Tz: TimeZone>(instant: &DateTime<Tz>, count: usize) -> Vec<RunIdentity> {
    let utc = instant.with_timezone(&Utc);
    let mut cur = RunIdentity {
        date: utc.date_naive(),
        hour: (utc.hour() / 6) * 6,
    };

    let mut out = Vec::with_capacity(count);
    while out.len() < count {
        out.push(cur);
        match cur.previous_cycle() {
            Some(prev) => cur = prev,
            None => break,
        }
    }
    out
}

fn is_naive_timestamp(s: &str) -> bool {
    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M"]
        .iter()
        .any(|fmt| NaiveDateTime::parse_from_str(s, fmt).is_ok())
        || NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok()
}
