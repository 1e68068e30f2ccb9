use crate::analyze::Analyzer;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportEntry { pub key: String, pub count: u64 }

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Report {
    pub entries: Vec<ReportEntry>,
    pub lines_read: u64,
    pub malformed_lines: u64,
    pub filtered_out: u64,
    pub unqualified: u64,
}

impl Report {
    /// `"<key> <count>"` per entry, in report order.
    pub fn lines(&self) -> impl Iterator<Item = String> + '_ {
        self.entries.iter().map(|e| format!("{} {}", e.key, e.count))
    }

    pub fn truncate(&mut self, n: usize) { self.entries.truncate(n); }
}

/// Sort counts by count desc, then key asc.
pub fn build_report(an: &Analyzer) -> Report {
    let mut entries: Vec<ReportEntry> = an.counts.iter()
        .map(|(k, v)| ReportEntry { key: k.clone(), count: *v }).collect();
    entries.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.key.cmp(&b.key)));

    Report {
        entries,
        lines_read: an.lines_read,
        malformed_lines: an.malformed_lines,
        filtered_out: an.filtered_out,
        unqualified: an.unqualified,
    }
}
