//! Filtering and ordering of the report list.

use std::cmp::{Ordering, Reverse};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::{ReportSummary, Severity};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeverityFilter {
    #[default]
    All,
    Critical,
    High,
    Medium,
    Low,
}

impl SeverityFilter {
    pub fn matches(self, severity: Severity) -> bool {
        match self {
            SeverityFilter::All => true,
            SeverityFilter::Critical => severity == Severity::Critical,
            SeverityFilter::High => severity == Severity::High,
            SeverityFilter::Medium => severity == Severity::Medium,
            SeverityFilter::Low => severity == Severity::Low,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    #[default]
    Date,
    Severity,
    Vulnerabilities,
}

/// The five reports the dashboard ships with.
pub fn seed_reports() -> Vec<ReportSummary> {
    let row = |id: u32,
               url: &str,
               date: &str,
               time: &str,
               vulnerabilities: u32,
               severity: Severity,
               size: &str| {
        ReportSummary {
            id,
            url: url.into(),
            date: date.into(),
            time: time.into(),
            vulnerabilities,
            severity,
            status: "completed".into(),
            size: size.into(),
        }
    };

    vec![
        row(1, "example.com", "2024-01-15", "14:30", 5, Severity::High, "2.4 MB"),
        row(2, "testsite.org", "2024-01-14", "09:15", 0, Severity::Low, "1.8 MB"),
        row(3, "webapp.net", "2024-01-13", "16:45", 12, Severity::Critical, "3.1 MB"),
        row(4, "secure.io", "2024-01-12", "11:20", 2, Severity::Medium, "2.0 MB"),
        row(5, "mysite.com", "2024-01-11", "13:10", 1, Severity::Low, "1.9 MB"),
    ]
}

/// Whether `report` passes the text and severity filters. The text match is
/// a case-insensitive substring match on the URL; an empty query matches all.
pub fn matches(report: &ReportSummary, query: &str, filter: SeverityFilter) -> bool {
    report.url.to_lowercase().contains(&query.to_lowercase()) && filter.matches(report.severity)
}

/// Filters `reports` and orders the survivors most-recent / most-severe
/// first. Ties keep their input order.
pub fn view(
    reports: &[ReportSummary],
    query: &str,
    filter: SeverityFilter,
    sort: SortKey,
) -> Vec<ReportSummary> {
    let mut selected: Vec<ReportSummary> = reports
        .iter()
        .filter(|r| matches(r, query, filter))
        .cloned()
        .collect();

    selected.sort_by(|a, b| compare(a, b, sort));
    selected
}

fn compare(a: &ReportSummary, b: &ReportSummary, sort: SortKey) -> Ordering {
    match sort {
        // None orders below every date, so unparseable dates land last
        SortKey::Date => Reverse(report_date(a)).cmp(&Reverse(report_date(b))),
        SortKey::Severity => b.severity.rank().cmp(&a.severity.rank()),
        SortKey::Vulnerabilities => b.vulnerabilities.cmp(&a.vulnerabilities),
    }
}

fn report_date(report: &ReportSummary) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(&report.date, "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn urls(reports: &[ReportSummary]) -> Vec<&str> {
        reports.iter().map(|r| r.url.as_str()).collect()
    }

    #[test]
    fn sort_by_vulnerabilities() {
        let out = view(&seed_reports(), "", SeverityFilter::All, SortKey::Vulnerabilities);
        assert_eq!(
            urls(&out),
            vec!["webapp.net", "example.com", "secure.io", "mysite.com", "testsite.org"]
        );
    }

    #[test]
    fn sort_by_date_newest_first() {
        let mut reports = seed_reports();
        reports.reverse();
        let out = view(&reports, "", SeverityFilter::All, SortKey::Date);
        assert_eq!(
            urls(&out),
            vec!["example.com", "testsite.org", "webapp.net", "secure.io", "mysite.com"]
        );
    }

    #[test]
    fn sort_by_severity_is_stable_for_ties() {
        let out = view(&seed_reports(), "", SeverityFilter::All, SortKey::Severity);
        // testsite.org and mysite.com are both low and keep seed order
        assert_eq!(
            urls(&out),
            vec!["webapp.net", "example.com", "secure.io", "testsite.org", "mysite.com"]
        );
    }

    #[test]
    fn unknown_severity_sorts_last() {
        let mut reports = seed_reports();
        reports[0].severity = Severity::Unknown;
        let out = view(&reports, "", SeverityFilter::All, SortKey::Severity);
        assert_eq!(out.last().unwrap().url, "example.com");
    }

    #[test]
    fn unparseable_date_sorts_last() {
        let mut reports = seed_reports();
        reports[4].date = "2024-01-99".into();
        reports[1].date = "not a date".into();
        let out = view(&reports, "", SeverityFilter::All, SortKey::Date);
        assert_eq!(
            urls(&out),
            vec!["example.com", "webapp.net", "secure.io", "testsite.org", "mysite.com"]
        );
    }

    #[test]
    fn critical_filter_returns_webapp_only() {
        let out = view(&seed_reports(), "", SeverityFilter::Critical, SortKey::Date);
        assert_eq!(urls(&out), vec!["webapp.net"]);
    }

    #[test]
    fn query_is_case_insensitive_substring() {
        let out = view(&seed_reports(), "SITE", SeverityFilter::All, SortKey::Date);
        assert_eq!(urls(&out), vec!["testsite.org", "mysite.com"]);

        let out = view(&seed_reports(), ".com", SeverityFilter::Low, SortKey::Date);
        assert_eq!(urls(&out), vec!["mysite.com"]);
    }

    #[test]
    fn no_match_is_an_empty_view() {
        let out = view(&seed_reports(), "nowhere.invalid", SeverityFilter::All, SortKey::Date);
        assert!(out.is_empty());
    }

    #[test]
    fn filtering_is_idempotent() {
        let seed = seed_reports();
        for filter in [
            SeverityFilter::All,
            SeverityFilter::Critical,
            SeverityFilter::High,
            SeverityFilter::Medium,
            SeverityFilter::Low,
        ] {
            for query in ["", "e", "COM", "zzz"] {
                let once = view(&seed, query, filter, SortKey::Vulnerabilities);
                let twice = view(&once, query, filter, SortKey::Vulnerabilities);
                assert_eq!(once, twice);
            }
        }
    }

    #[test]
    fn query_params_deserialize_lowercase() {
        let filter: SeverityFilter = serde_json::from_str(r#""medium""#).unwrap();
        assert_eq!(filter, SeverityFilter::Medium);
        let sort: SortKey = serde_json::from_str(r#""vulnerabilities""#).unwrap();
        assert_eq!(sort, SortKey::Vulnerabilities);
        assert!(serde_json::from_str::<SortKey>(r#""size""#).is_err());
    }
}
