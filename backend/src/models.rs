use serde::{Deserialize, Serialize};

use crate::scanner::ScanReport;

/// Body of `POST /scan`. `url` is optional at the wire level so that a
/// missing key is reported as an invalid request instead of a decode failure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScanRequest {
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvelopeStatus {
    Success,
    Error,
}

#[derive(Debug, Serialize)]
pub struct ScanResponse {
    pub status: EnvelopeStatus,
    pub results: ScanReport,
    pub report_url: String,
}

impl ScanResponse {
    pub fn success(results: ScanReport) -> Self {
        Self {
            status: EnvelopeStatus::Success,
            results,
            report_url: "/download_report".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorEnvelope {
    pub status: EnvelopeStatus,
    pub message: String,
}

impl ErrorEnvelope {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: EnvelopeStatus::Error,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DownloadNotice {
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
    Unknown,
}

impl Severity {
    /// Position in the severity ordering; unrecognised labels rank lowest.
    pub fn rank(self) -> u8 {
        match self {
            Severity::Critical => 4,
            Severity::High => 3,
            Severity::Medium => 2,
            Severity::Low => 1,
            Severity::Unknown => 0,
        }
    }
}

impl From<String> for Severity {
    fn from(label: String) -> Self {
        match label.as_str() {
            "critical" => Severity::Critical,
            "high" => Severity::High,
            "medium" => Severity::Medium,
            "low" => Severity::Low,
            _ => Severity::Unknown,
        }
    }
}

/// One row of the reports list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub id: u32,
    pub url: String,
    pub date: String, // YYYY-MM-DD
    pub time: String,
    pub vulnerabilities: u32,
    pub severity: Severity,
    pub status: String,
    pub size: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_url_key_decodes_to_none() {
        let req: ScanRequest = serde_json::from_str("{}").unwrap();
        assert!(req.url.is_none());

        let req: ScanRequest = serde_json::from_str(r#"{"url": null}"#).unwrap();
        assert!(req.url.is_none());
    }

    #[test]
    fn unknown_severity_label_ranks_zero() {
        let sev: Severity = serde_json::from_str(r#""catastrophic""#).unwrap();
        assert_eq!(sev, Severity::Unknown);
        assert_eq!(sev.rank(), 0);

        let sev: Severity = serde_json::from_str(r#""critical""#).unwrap();
        assert_eq!(sev.rank(), 4);
        assert_eq!(serde_json::to_string(&sev).unwrap(), r#""critical""#);
    }

    #[test]
    fn error_envelope_shape() {
        let value = serde_json::to_value(ErrorEnvelope::new("URL is required")).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"status": "error", "message": "URL is required"})
        );
    }
}
