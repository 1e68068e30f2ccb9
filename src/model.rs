use std::fmt;
use std::str::FromStr;

use crate::parse::{parse_date, ParseError};

/// Number of components in a log timestamp.
pub const DATE_ENTRIES: usize = 4;

/// Log timestamp `[day:hour:minute:second]`.
///
/// This is an ordinal tuple, not a calendar date: components are compared as
/// plain integers and never range checked.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct LogTime(pub [i64; DATE_ENTRIES]);

impl LogTime {
    pub fn new(day: i64, hour: i64, minute: i64, second: i64) -> Self {
        Self([day, hour, minute, second])
    }

    pub fn components(&self) -> &[i64; DATE_ENTRIES] { &self.0 }
}

impl FromStr for LogTime {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> { parse_date(s) }
}

impl fmt::Display for LogTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [d, h, m, s] = self.0;
        write!(f, "[{d}:{h}:{m}:{s}]")
    }
}

/// The three parts of an HTTP request line, e.g. `GET /Software.html HTTP/1.0`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Request {
    pub method: String,
    pub uri: String,
    pub protocol: String,
}

/// One parsed access log line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogRecord {
    pub host: String,
    pub date: LogTime,
    /// Raw request line with the surrounding quotes removed.
    pub request: String,
    pub http_response: String,
    /// Reply size in bytes; kept as text, `-` is common.
    pub ret_size: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_time_displays_in_log_format() {
        assert_eq!(LogTime::new(29, 23, 54, 18).to_string(), "[29:23:54:18]");
    }

    #[test]
    fn log_time_from_str() {
        let t: LogTime = "[30:0:5:7]".parse().unwrap();
        assert_eq!(t.components(), &[30, 0, 5, 7]);
        assert!("29:23".parse::<LogTime>().is_err());
    }
}
