//! Timestamp domain - an anchor instant, then offsets alternating around it.

use super::ValueDomain;
use crate::error::DomainError;
use chrono::{DateTime, SecondsFormat, TimeDelta, Utc};

/// How timestamp values are written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimestampFormat {
    /// RFC 3339 with second precision, e.g. `2023-01-03T00:00:00Z`
    #[default]
    DateTime,
    /// `2023-01-03`
    Date,
    /// `00:00:00`
    Time,
}

/// Enumerates `anchor`, `anchor + step`, `anchor - step`, `anchor + 2*step`, ...
///
/// `top` is the total number of values, the anchor included.
#[derive(Debug, Clone)]
pub struct TimestampDomain {
    anchor: DateTime<Utc>,
    step: TimeDelta,
    top: usize,
    format: TimestampFormat,
    index: usize,
    current: Option<DateTime<Utc>>,
}

impl TimestampDomain {
    pub fn new(anchor: DateTime<Utc>, step_days: i64, step_seconds: i64, top: usize) -> Self {
        let step = TimeDelta::try_days(step_days).unwrap_or(TimeDelta::zero())
            + TimeDelta::try_seconds(step_seconds).unwrap_or(TimeDelta::zero());
        Self {
            anchor,
            step,
            top,
            format: TimestampFormat::default(),
            index: 0,
            current: None,
        }
    }

    pub fn with_format(mut self, format: TimestampFormat) -> Self {
        self.format = format;
        self
    }

    fn candidate(&self, index: usize) -> Option<DateTime<Utc>> {
        if index == 0 {
            return Some(self.anchor);
        }
        let multiplier = i32::try_from(index.div_ceil(2)).ok()?;
        let offset = self.step.checked_mul(multiplier)?;
        if index % 2 == 1 {
            self.anchor.checked_add_signed(offset)
        } else {
            self.anchor.checked_sub_signed(offset)
        }
    }
}

impl ValueDomain for TimestampDomain {
    fn reset(&mut self) -> Result<(), DomainError> {
        self.index = 0;
        self.current = None;
        Ok(())
    }

    fn next(&mut self) -> Result<bool, DomainError> {
        if self.index >= self.top {
            self.current = None;
            return Ok(false);
        }
        // Offsets past the representable range end the sequence early
        self.current = self.candidate(self.index);
        if self.current.is_none() {
            self.index = self.top;
            return Ok(false);
        }
        self.index += 1;
        Ok(true)
    }

    fn value(&mut self) -> Result<String, DomainError> {
        let Some(ts) = self.current else {
            return Ok(String::new());
        };
        Ok(match self.format {
            TimestampFormat::DateTime => ts.to_rfc3339_opts(SecondsFormat::Secs, true),
            TimestampFormat::Date => ts.format("%Y-%m-%d").to_string(),
            TimestampFormat::Time => ts.format("%H:%M:%S").to_string(),
        })
    }

    fn is_unbounded(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::enumerate;

    fn anchor() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-02-28T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn test_date_format() {
        let mut domain = TimestampDomain::new(anchor(), 1, 0, 3).with_format(TimestampFormat::Date);
        assert_eq!(
            enumerate(&mut domain, 10).unwrap(),
            vec!["2024-02-28", "2024-02-29", "2024-02-27"]
        );
    }

    #[test]
    fn test_time_format() {
        let mut domain = TimestampDomain::new(anchor(), 0, 90, 3).with_format(TimestampFormat::Time);
        assert_eq!(
            enumerate(&mut domain, 10).unwrap(),
            vec!["12:00:00", "12:01:30", "11:58:30"]
        );
    }
}
