use crate::model::{LogRecord, LogTime};
use crate::parse::{parse_request, LogParser};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

pub const HTTP_OK: &str = "200";

#[derive(Debug, Error)]
pub enum AnalyzeError {
    #[error("could not open {}", .path.display())]
    Open { path: PathBuf, #[source] source: std::io::Error },
    #[error("read failed at line {line}")]
    Read { line: usize, #[source] source: std::io::Error },
}

/// Which report to build.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    /// Accesses per host.
    Webserver,
    /// Qualifying retrievals per URI.
    Resource,
}

/// Inclusive bounds for the date filter. Only exists when both ends are known.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DateRange {
    pub min: LogTime,
    pub max: LogTime,
}

impl DateRange {
    pub fn from_bounds(min: Option<LogTime>, max: Option<LogTime>) -> Option<Self> {
        match (min, max) {
            (Some(min), Some(max)) => Some(Self { min, max }),
            _ => None,
        }
    }

    /// A candidate is rejected only when some component is below `min` and
    /// above `max` at the same index. Components are checked left to right
    /// and the first such index decides.
    pub fn contains(&self, candidate: &LogTime) -> bool {
        let (min, max, c) = (self.min.components(), self.max.components(), candidate.components());
        !(0..c.len()).any(|i| min[i] > c[i] && max[i] < c[i])
    }
}

/// Date filter entry point: no range means everything passes.
pub fn in_range(candidate: &LogTime, range: Option<&DateRange>) -> bool {
    range.map_or(true, |r| r.contains(candidate))
}

/// Method and status a request needs for the resource report.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Qualifier {
    pub method: String,
    pub status: String,
}

impl Default for Qualifier {
    fn default() -> Self { Self { method: "GET".into(), status: HTTP_OK.into() } }
}

impl Qualifier {
    /// Returns the requested URI when method and status both match exactly.
    pub fn qualifies(&self, record: &LogRecord) -> Option<String> {
        let request = parse_request(&record.request).ok()?;
        (request.method == self.method && record.http_response == self.status).then_some(request.uri)
    }
}

#[derive(Clone, Debug)]
pub struct ReportConfig {
    pub action: Action,
    pub range: Option<DateRange>,
    pub qualifier: Qualifier,
}

impl ReportConfig {
    pub fn new(action: Action) -> Self {
        Self { action, range: None, qualifier: Qualifier::default() }
    }

    pub fn with_range(mut self, range: Option<DateRange>) -> Self {
        self.range = range;
        self
    }
}

pub struct Analyzer {
    pub config: ReportConfig,
    pub counts: HashMap<String, u64>,

    pub lines_read: u64,
    pub malformed_lines: u64,
    pub filtered_out: u64,
    pub unqualified: u64,
}

impl Analyzer {
    pub fn new(config: ReportConfig) -> Self {
        Self {
            config,
            counts: HashMap::new(),
            lines_read: 0,
            malformed_lines: 0,
            filtered_out: 0,
            unqualified: 0,
        }
    }

    pub fn consume_file<P: LogParser>(&mut self, parser: &mut P, path: &Path) -> Result<(), AnalyzeError> {
        let f = File::open(path).map_err(|source| AnalyzeError::Open { path: path.to_path_buf(), source })?;
        self.consume_reader(parser, BufReader::new(f))
    }

    /// Lines are decoded lossily: bytes that are not UTF-8 (Latin-1 URIs and
    /// the like) become U+FFFD and the line is still counted.
    pub fn consume_reader<P: LogParser, R: BufRead>(&mut self, parser: &mut P, mut reader: R) -> Result<(), AnalyzeError> {
        let malformed_before = self.malformed_lines;
        let mut buf = Vec::new();
        let mut line_no = 0;
        loop {
            buf.clear();
            line_no += 1;
            let n = reader
                .read_until(b'\n', &mut buf)
                .map_err(|source| AnalyzeError::Read { line: line_no, source })?;
            if n == 0 { break; }

            let raw = buf.strip_suffix(b"\n").unwrap_or(&buf[..]);
            let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
            let line = String::from_utf8_lossy(raw);
            if line.trim().is_empty() { continue; }
            self.lines_read += 1;
            match parser.parse_line(&line) {
                Ok(record) => self.consume_record(&record),
                Err(e) => {
                    debug!(line = line_no, error = %e, "skipping malformed line");
                    self.malformed_lines += 1;
                }
            }
        }
        let skipped = self.malformed_lines - malformed_before;
        if skipped > 0 {
            warn!(skipped, "malformed lines were left out of the report");
        }
        Ok(())
    }

    pub fn consume_record(&mut self, record: &LogRecord) {
        if !in_range(&record.date, self.config.range.as_ref()) {
            self.filtered_out += 1;
            return;
        }
        let key = match self.config.action {
            Action::Webserver => record.host.clone(),
            Action::Resource => match self.config.qualifier.qualifies(record) {
                Some(uri) => uri,
                None => {
                    self.unqualified += 1;
                    return;
                }
            },
        };
        *self.counts.entry(key).or_default() += 1;
    }
}
