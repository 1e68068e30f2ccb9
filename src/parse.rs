use crate::model::{LogRecord, LogTime, Request, DATE_ENTRIES};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("missing {0} column")]
    MissingColumn(&'static str),
    #[error("request column has no closing quote")]
    UnterminatedRequest,
    #[error("invalid date {0:?}")]
    Date(String),
    #[error("invalid request line {0:?}")]
    Request(String),
}

pub trait LogParser {
    /// Parse a single line into a LogRecord
    fn parse_line(&mut self, line: &str) -> Result<LogRecord, ParseError>;
}

/// Parser for the fixed five column access log format:
///
/// ```text
/// host [D:H:M:S] "METHOD URI PROTOCOL" status size
/// ```
///
/// Columns are located purely by delimiter offsets; there is no tolerance for
/// missing columns or alternate layouts.
#[derive(Debug, Default)]
pub struct ColumnarLogParser;

impl ColumnarLogParser {
    pub fn new() -> Self { Self }
}

impl LogParser for ColumnarLogParser {
    fn parse_line(&mut self, line: &str) -> Result<LogRecord, ParseError> {
        let mut cols = Columns { line, pos: 0 };
        let host = cols.next_plain("host")?;
        let date = cols.next_plain("date")?;
        let request = cols.next_quoted()?;
        let http_response = cols.next_plain("response")?;
        let ret_size = cols.last("size")?;

        Ok(LogRecord {
            host: host.to_string(),
            date: parse_date(date)?,
            request: request.to_string(),
            http_response: http_response.to_string(),
            ret_size: ret_size.to_string(),
        })
    }
}

struct Columns<'a> { line: &'a str, pos: usize }

fn is_column_end(c: char) -> bool { c == ' ' || c == '\n' }

impl<'a> Columns<'a> {
    fn rest(&self) -> &'a str { &self.line[self.pos..] }

    fn next_plain(&mut self, name: &'static str) -> Result<&'a str, ParseError> {
        let rest = self.rest();
        let end = rest.find(is_column_end).ok_or(ParseError::MissingColumn(name))?;
        self.pos += end + 1;
        non_empty(&rest[..end], name)
    }

    // The request contains spaces, so it runs from just past the opening quote
    // up to the first `" ` sequence.
    fn next_quoted(&mut self) -> Result<&'a str, ParseError> {
        let rest = self.rest();
        let end = rest.find("\" ").ok_or(ParseError::UnterminatedRequest)?;
        self.pos += end + 2;
        let column = rest.get(1..end).ok_or(ParseError::MissingColumn("request"))?;
        non_empty(column, "request")
    }

    fn last(&mut self, name: &'static str) -> Result<&'a str, ParseError> {
        let rest = self.rest();
        let end = rest.find(is_column_end).unwrap_or(rest.len());
        self.pos += end;
        non_empty(&rest[..end], name)
    }
}

fn non_empty<'a>(column: &'a str, name: &'static str) -> Result<&'a str, ParseError> {
    if column.is_empty() { Err(ParseError::MissingColumn(name)) } else { Ok(column) }
}

/// Parse `[D:H:M:S]` into a [`LogTime`].
///
/// The first character is skipped without being checked. Each component ends
/// at the next `:` or `]` (or the end of the text) and must be an integer.
pub fn parse_date(text: &str) -> Result<LogTime, ParseError> {
    let invalid = || ParseError::Date(text.to_string());
    let mut rest = text.get(1..).ok_or_else(invalid)?;
    let mut out = [0i64; DATE_ENTRIES];

    for slot in out.iter_mut() {
        let end = rest.find(|c: char| c == ':' || c == ']').unwrap_or(rest.len());
        *slot = rest[..end].parse().map_err(|_| invalid())?;
        rest = rest.get(end + 1..).unwrap_or("");
    }
    let [day, hour, minute, second] = out;
    Ok(LogTime::new(day, hour, minute, second))
}

/// Split a request line on its first two spaces.
///
/// Fewer than three tokens is an error. Anything after a third space is
/// dropped, so `protocol` is always a single token.
pub fn parse_request(text: &str) -> Result<Request, ParseError> {
    let invalid = || ParseError::Request(text.to_string());
    let (method, rest) = text.split_once(' ').ok_or_else(invalid)?;
    let (uri, rest) = rest.split_once(' ').ok_or_else(invalid)?;
    let protocol = rest.split(' ').next().unwrap_or_default();

    Ok(Request { method: method.to_string(), uri: uri.to_string(), protocol: protocol.to_string() })
}

#[cfg(test)]
mod tests {
    use super::*;

    const LINE: &str = r#"wpbfl2-45.gate.net [29:23:54:16] "GET /icons/circle_logo_small.gif HTTP/1.0" 200 2624"#;

    #[test]
    fn parses_all_five_columns() {
        let rec = ColumnarLogParser::new().parse_line(LINE).unwrap();
        assert_eq!(rec.host, "wpbfl2-45.gate.net");
        assert_eq!(rec.date, LogTime::new(29, 23, 54, 16));
        assert_eq!(rec.request, "GET /icons/circle_logo_small.gif HTTP/1.0");
        assert_eq!(rec.http_response, "200");
        assert_eq!(rec.ret_size, "2624");
    }

    #[test]
    fn size_column_may_be_dash_or_followed_by_newline() {
        let mut p = ColumnarLogParser::new();
        let rec = p.parse_line("h [1:2:3:4] \"GET / HTTP/1.0\" 302 -").unwrap();
        assert_eq!(rec.ret_size, "-");
        let rec = p.parse_line("h [1:2:3:4] \"GET / HTTP/1.0\" 200 10\n").unwrap();
        assert_eq!(rec.ret_size, "10");
    }

    #[test]
    fn request_keeps_embedded_quotes_until_quote_space() {
        let line = r#"h [1:2:3:4] "GET /a"b HTTP/1.0" 200 1"#;
        let rec = ColumnarLogParser::new().parse_line(line).unwrap();
        assert_eq!(rec.request, r#"GET /a"b HTTP/1.0"#);
    }

    #[test]
    fn rejects_lines_missing_columns() {
        let mut p = ColumnarLogParser::new();
        assert_eq!(p.parse_line("lonely-host"), Err(ParseError::MissingColumn("host")));
        assert_eq!(
            p.parse_line("h [1:2:3:4] \"GET / HTTP/1.0\""),
            Err(ParseError::UnterminatedRequest)
        );
        assert_eq!(
            p.parse_line("h [1:2:3:4] \"GET / HTTP/1.0\" 200"),
            Err(ParseError::MissingColumn("response"))
        );
        assert_eq!(
            p.parse_line("h [1:2:3:4] \"GET / HTTP/1.0\" 200 "),
            Err(ParseError::MissingColumn("size"))
        );
    }

    #[test]
    fn rejects_non_numeric_date() {
        let err = ColumnarLogParser::new()
            .parse_line("h [29:xx:54:16] \"GET / HTTP/1.0\" 200 1")
            .unwrap_err();
        assert_eq!(err, ParseError::Date("[29:xx:54:16]".into()));
    }

    #[test]
    fn parse_date_components() {
        assert_eq!(parse_date("[29:23:54:18]"), Ok(LogTime::new(29, 23, 54, 18)));
        assert_eq!(parse_date("[01:00:00:09]"), Ok(LogTime::new(1, 0, 0, 9)));
        // no closing bracket: last component runs to the end
        assert_eq!(parse_date("[1:2:3:4"), Ok(LogTime::new(1, 2, 3, 4)));
        assert!(parse_date("[1:2:3]").is_err());
        assert!(parse_date("").is_err());
        assert!(parse_date("[::::]").is_err());
    }

    #[test]
    fn parse_request_splits_on_first_two_spaces() {
        let req = parse_request("GET /Software.html HTTP/1.0").unwrap();
        assert_eq!(req.method, "GET");
        assert_eq!(req.uri, "/Software.html");
        assert_eq!(req.protocol, "HTTP/1.0");

        let req = parse_request("GET /a HTTP/1.0 trailing").unwrap();
        assert_eq!(req.protocol, "HTTP/1.0");
    }

    #[test]
    fn parse_request_needs_three_tokens() {
        assert_eq!(parse_request("GET"), Err(ParseError::Request("GET".into())));
        assert!(parse_request("GET /index.html").is_err());
    }
}
