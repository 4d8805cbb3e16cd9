//! The seven simulated checks that make up a scan.
//!
//! None of them touch the network. Their output is either fixed demo data or
//! drawn from the generator handed in by the caller, which keeps a seeded scan
//! reproducible.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::Rng;
use serde::Serialize;

use crate::error::ScanError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeKind {
    Headers,
    SqlInjection,
    Xss,
    Directories,
    Ports,
    Subdomains,
    GeoIp,
}

/// Which part of the target a probe looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeInput {
    Url,
    Hostname,
}

impl ProbeKind {
    pub const ALL: [ProbeKind; 7] = [
        ProbeKind::Headers,
        ProbeKind::SqlInjection,
        ProbeKind::Xss,
        ProbeKind::Directories,
        ProbeKind::Ports,
        ProbeKind::Subdomains,
        ProbeKind::GeoIp,
    ];

    /// Key under which the finding appears in the composite report.
    pub fn key(self) -> &'static str {
        match self {
            ProbeKind::Headers => "headers",
            ProbeKind::SqlInjection => "sql_injection",
            ProbeKind::Xss => "xss",
            ProbeKind::Directories => "directories",
            ProbeKind::Ports => "ports",
            ProbeKind::Subdomains => "subdomains",
            ProbeKind::GeoIp => "geoip",
        }
    }

    pub fn latency(self) -> Duration {
        let ms = match self {
            ProbeKind::Headers => 1000,
            ProbeKind::SqlInjection => 1500,
            ProbeKind::Xss => 1200,
            ProbeKind::Directories => 800,
            ProbeKind::Ports => 2000,
            ProbeKind::Subdomains => 1500,
            ProbeKind::GeoIp => 500,
        };
        Duration::from_millis(ms)
    }

    pub fn input(self) -> ProbeInput {
        match self {
            ProbeKind::Headers
            | ProbeKind::SqlInjection
            | ProbeKind::Xss
            | ProbeKind::Directories => ProbeInput::Url,
            ProbeKind::Ports | ProbeKind::Subdomains | ProbeKind::GeoIp => ProbeInput::Hostname,
        }
    }
}

/// A single check run against one scan target.
///
/// `input` is the full URL or the hostname depending on
/// [`ProbeKind::input`]. Implementations must only draw randomness from `rng`.
pub trait Probe: Send + Sync {
    fn kind(&self) -> ProbeKind;

    fn latency(&self) -> Duration {
        self.kind().latency()
    }

    fn run(&self, input: &str, rng: &mut StdRng) -> Result<ProbeFinding, ScanError>;
}

/// The standard probe set, in report order.
pub fn default_probes() -> Vec<Arc<dyn Probe>> {
    vec![
        Arc::new(HeadersProbe),
        Arc::new(SqlInjectionProbe),
        Arc::new(XssProbe),
        Arc::new(DirectoriesProbe),
        Arc::new(PortsProbe),
        Arc::new(SubdomainsProbe),
        Arc::new(GeoIpProbe),
    ]
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProbeFinding {
    Headers(HeadersFinding),
    SqlInjection(SqlInjectionFinding),
    Xss(XssFinding),
    Directories(DirectoriesFinding),
    Ports(PortsFinding),
    Subdomains(SubdomainsFinding),
    GeoIp(GeoIpFinding),
}

impl ProbeFinding {
    pub fn kind(&self) -> ProbeKind {
        match self {
            ProbeFinding::Headers(_) => ProbeKind::Headers,
            ProbeFinding::SqlInjection(_) => ProbeKind::SqlInjection,
            ProbeFinding::Xss(_) => ProbeKind::Xss,
            ProbeFinding::Directories(_) => ProbeKind::Directories,
            ProbeFinding::Ports(_) => ProbeKind::Ports,
            ProbeFinding::Subdomains(_) => ProbeKind::Subdomains,
            ProbeFinding::GeoIp(_) => ProbeKind::GeoIp,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VulnStatus {
    Vulnerable,
    Secure,
}

// ---------------------------------------------------------------------------
// headers

const OBSERVED_HEADERS: [(&str, &str); 3] = [
    ("Content-Security-Policy", "default-src 'self'"),
    ("X-Frame-Options", "DENY"),
    ("X-Content-Type-Options", "nosniff"),
];

const CHECKED_HEADERS: [&str; 5] = [
    "Content-Security-Policy",
    "Strict-Transport-Security",
    "X-Frame-Options",
    "X-Content-Type-Options",
    "Referrer-Policy",
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeadersFinding {
    pub status: String,
    pub found_headers: BTreeMap<String, String>,
    pub missing_headers: Vec<String>,
    pub security_grade: String,
    pub grade_explanation: String,
    pub recommendations: Vec<String>,
}

pub struct HeadersProbe;

impl Probe for HeadersProbe {
    fn kind(&self) -> ProbeKind {
        ProbeKind::Headers
    }

    fn run(&self, _url: &str, _rng: &mut StdRng) -> Result<ProbeFinding, ScanError> {
        let observed: BTreeMap<String, String> = OBSERVED_HEADERS
            .iter()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect();

        let missing: Vec<String> = CHECKED_HEADERS
            .iter()
            .filter(|name| !observed.contains_key(**name))
            .map(|name| name.to_string())
            .collect();

        let score: u32 = observed.keys().map(|name| header_weight(name)).sum();
        let grade = security_grade(score);

        Ok(ProbeFinding::Headers(HeadersFinding {
            status: "success".into(),
            recommendations: missing
                .iter()
                .filter_map(|name| header_recommendation(name))
                .map(String::from)
                .collect(),
            found_headers: observed,
            missing_headers: missing,
            security_grade: grade.to_string(),
            grade_explanation: grade_explanation(grade).into(),
        }))
    }
}

fn header_weight(name: &str) -> u32 {
    match name {
        "Content-Security-Policy" | "Strict-Transport-Security" => 3,
        "X-Frame-Options" | "X-Content-Type-Options" => 2,
        _ => 1,
    }
}

pub fn security_grade(score: u32) -> char {
    match score {
        s if s >= 8 => 'A',
        s if s >= 5 => 'B',
        s if s >= 3 => 'C',
        _ => 'D',
    }
}

fn grade_explanation(grade: char) -> &'static str {
    match grade {
        'A' => "Excellent security headers implementation",
        'B' => "Good security headers but room for improvement",
        'C' => "Basic security headers implemented",
        _ => "Poor security headers implementation",
    }
}

fn header_recommendation(name: &str) -> Option<&'static str> {
    match name {
        "Content-Security-Policy" => Some("Implement CSP to prevent XSS attacks"),
        "Strict-Transport-Security" => Some("Enable HSTS to enforce HTTPS"),
        "X-Frame-Options" => Some("Set X-Frame-Options to 'DENY' to prevent clickjacking"),
        "X-Content-Type-Options" => Some("Set X-Content-Type-Options to 'nosniff'"),
        "Referrer-Policy" => Some("Add a Referrer-Policy such as 'strict-origin'"),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// sql injection

const SQLI_VULNERABLE_CHANCE: f64 = 0.3;
const SQLI_PARAMETERS: [&str; 3] = ["id", "user_id", "product_id"];
const SQLI_PAYLOADS: [(&str, &str); 8] = [
    ("'", "Error-based"),
    ("\"", "Error-based"),
    ("1' OR '1'='1", "Boolean-based"),
    ("1\" OR \"1\"=\"1", "Boolean-based"),
    ("1 AND 1=1", "Boolean-based"),
    ("1 AND 1=2", "Boolean-based"),
    ("1; WAITFOR DELAY '0:0:5'--", "Time-based"),
    ("1 OR SLEEP(5)", "Time-based"),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SqlParameter {
    pub parameter: String,
    pub confidence: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestedPayload {
    pub payload: String,
    #[serde(rename = "type")]
    pub technique: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SqlInjectionFinding {
    pub status: VulnStatus,
    pub vulnerable_parameters: Vec<SqlParameter>,
    pub tested_payloads: Vec<TestedPayload>,
    pub severity: String,
    pub recommendation: String,
}

pub struct SqlInjectionProbe;

impl Probe for SqlInjectionProbe {
    fn kind(&self) -> ProbeKind {
        ProbeKind::SqlInjection
    }

    fn run(&self, _url: &str, rng: &mut StdRng) -> Result<ProbeFinding, ScanError> {
        let vulnerable = rng.gen_bool(SQLI_VULNERABLE_CHANCE);

        let vulnerable_parameters = if vulnerable {
            SQLI_PARAMETERS
                .iter()
                .map(|param| SqlParameter {
                    parameter: param.to_string(),
                    confidence: format!("{}%", rng.gen_range(80..=100)),
                })
                .collect()
        } else {
            Vec::new()
        };

        let tested_payloads = SQLI_PAYLOADS
            .iter()
            .map(|(payload, technique)| TestedPayload {
                payload: payload.to_string(),
                technique: technique.to_string(),
            })
            .collect();

        let (status, severity, recommendation) = if vulnerable {
            (
                VulnStatus::Vulnerable,
                "Critical",
                "Use parameterized queries and prepared statements",
            )
        } else {
            (VulnStatus::Secure, "None", "No SQLi vulnerabilities detected")
        };

        Ok(ProbeFinding::SqlInjection(SqlInjectionFinding {
            status,
            vulnerable_parameters,
            tested_payloads,
            severity: severity.into(),
            recommendation: recommendation.into(),
        }))
    }
}

// ---------------------------------------------------------------------------
// xss

const XSS_VULNERABLE_CHANCE: f64 = 0.4;
const XSS_PARAMETERS: [&str; 4] = ["search", "comment", "message", "user_input"];
const XSS_SEVERITIES: [&str; 3] = ["Low", "Medium", "High"];
const XSS_PAYLOADS: [&str; 5] = [
    "<script>alert('XSS')</script>",
    "<img src=x onerror=alert('XSS')>",
    "<svg/onload=alert('XSS')>",
    "'\"><script>alert('XSS')</script>",
    "javascript:alert('XSS')",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct XssParameter {
    pub parameter: String,
    pub severity: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct XssFinding {
    pub status: VulnStatus,
    pub vulnerable_parameters: Vec<XssParameter>,
    pub tested_payloads: Vec<String>,
    pub recommendation: String,
    pub protection_level: String,
}

pub struct XssProbe;

impl Probe for XssProbe {
    fn kind(&self) -> ProbeKind {
        ProbeKind::Xss
    }

    fn run(&self, _url: &str, rng: &mut StdRng) -> Result<ProbeFinding, ScanError> {
        let vulnerable = rng.gen_bool(XSS_VULNERABLE_CHANCE);

        let vulnerable_parameters: Vec<XssParameter> = if vulnerable {
            XSS_PARAMETERS
                .iter()
                .map(|param| XssParameter {
                    parameter: param.to_string(),
                    severity: XSS_SEVERITIES[rng.gen_range(0..XSS_SEVERITIES.len())].to_string(),
                })
                .collect()
        } else {
            Vec::new()
        };

        let protection_level = xss_protection_level(&vulnerable_parameters);
        let (status, recommendation) = if vulnerable {
            (
                VulnStatus::Vulnerable,
                "Implement input validation and output encoding",
            )
        } else {
            (VulnStatus::Secure, "No XSS vulnerabilities detected")
        };

        Ok(ProbeFinding::Xss(XssFinding {
            status,
            vulnerable_parameters,
            tested_payloads: XSS_PAYLOADS.iter().map(|p| p.to_string()).collect(),
            recommendation: recommendation.into(),
            protection_level: protection_level.into(),
        }))
    }
}

fn xss_protection_level(params: &[XssParameter]) -> &'static str {
    if params.is_empty() {
        "Excellent"
    } else if params.iter().any(|p| p.severity == "High") {
        "Poor"
    } else {
        "Moderate"
    }
}

// ---------------------------------------------------------------------------
// directories

const COMMON_DIRECTORIES: [&str; 12] = [
    "admin",
    "login",
    "wp-admin",
    "backup",
    "phpmyadmin",
    "test",
    "uploads",
    "config",
    "sql",
    "db",
    "database",
    "logs",
];
const SENSITIVE_DIRECTORIES: [&str; 3] = ["admin", "backup", "config"];
const OBSERVED_DIRECTORIES: [(&str, u16); 3] = [("admin", 200), ("backup", 403), ("config", 404)];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirectoryHit {
    pub path: String,
    pub status: u16,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DirectoriesFinding {
    pub found_directories: Vec<DirectoryHit>,
    pub total_scanned: usize,
    pub sensitive_paths: Vec<String>,
    pub recommendation: String,
}

pub struct DirectoriesProbe;

impl Probe for DirectoriesProbe {
    fn kind(&self) -> ProbeKind {
        ProbeKind::Directories
    }

    fn run(&self, _url: &str, _rng: &mut StdRng) -> Result<ProbeFinding, ScanError> {
        let found: Vec<DirectoryHit> = OBSERVED_DIRECTORIES
            .iter()
            .map(|(path, status)| DirectoryHit {
                path: path.to_string(),
                status: *status,
            })
            .collect();

        // a 404 means the path is not exposed, sensitive or not
        let sensitive_paths: Vec<String> = found
            .iter()
            .filter(|hit| hit.status != 404 && SENSITIVE_DIRECTORIES.contains(&hit.path.as_str()))
            .map(|hit| hit.path.clone())
            .collect();

        let recommendation = if sensitive_paths.is_empty() {
            "No sensitive directories found"
        } else {
            "Restrict access to sensitive directories"
        };

        Ok(ProbeFinding::Directories(DirectoriesFinding {
            found_directories: found,
            total_scanned: COMMON_DIRECTORIES.len(),
            sensitive_paths,
            recommendation: recommendation.into(),
        }))
    }
}

// ---------------------------------------------------------------------------
// ports

const COMMON_PORTS: [u16; 7] = [21, 22, 80, 443, 3306, 8080, 8443];
const OBSERVED_OPEN_PORTS: [u16; 3] = [80, 443, 22];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OpenPort {
    pub port: u16,
    pub service: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PortsFinding {
    pub open_ports: Vec<OpenPort>,
    pub total_scanned: usize,
    pub recommendation: String,
}

pub struct PortsProbe;

impl Probe for PortsProbe {
    fn kind(&self) -> ProbeKind {
        ProbeKind::Ports
    }

    fn run(&self, _host: &str, _rng: &mut StdRng) -> Result<ProbeFinding, ScanError> {
        let open_ports: Vec<OpenPort> = OBSERVED_OPEN_PORTS
            .iter()
            .map(|&port| OpenPort {
                port,
                service: service_for_port(port).into(),
            })
            .collect();

        let recommendation = if open_ports.is_empty() {
            "No unnecessary open ports found"
        } else {
            "Close unnecessary ports and secure services"
        };

        Ok(ProbeFinding::Ports(PortsFinding {
            open_ports,
            total_scanned: COMMON_PORTS.len(),
            recommendation: recommendation.into(),
        }))
    }
}

pub fn service_for_port(port: u16) -> &'static str {
    match port {
        21 => "FTP",
        22 => "SSH",
        80 => "HTTP",
        443 => "HTTPS",
        3306 => "MySQL",
        8080 => "HTTP-Alt",
        8443 => "HTTPS-Alt",
        _ => "Unknown",
    }
}

// ---------------------------------------------------------------------------
// subdomains

const COMMON_SUBDOMAINS: [&str; 14] = [
    "www", "mail", "ftp", "admin", "dev", "test", "staging", "api", "blog", "shop", "secure",
    "vpn", "portal", "webmail",
];
const OBSERVED_SUBDOMAINS: [&str; 3] = ["www", "mail", "api"];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubdomainsFinding {
    pub found_subdomains: Vec<String>,
    pub total_tested: usize,
    pub recommendation: String,
}

pub struct SubdomainsProbe;

impl Probe for SubdomainsProbe {
    fn kind(&self) -> ProbeKind {
        ProbeKind::Subdomains
    }

    fn run(&self, host: &str, _rng: &mut StdRng) -> Result<ProbeFinding, ScanError> {
        Ok(ProbeFinding::Subdomains(SubdomainsFinding {
            found_subdomains: OBSERVED_SUBDOMAINS
                .iter()
                .map(|prefix| format!("{}.{}", prefix, host))
                .collect(),
            total_tested: COMMON_SUBDOMAINS.len(),
            recommendation: "Monitor all subdomains for security issues".into(),
        }))
    }
}

// ---------------------------------------------------------------------------
// geoip

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeoIpFinding {
    pub ip: String,
    pub location: String,
    pub isp: String,
    pub threat_level: String,
    pub threat_description: String,
}

pub struct GeoIpProbe;

impl Probe for GeoIpProbe {
    fn kind(&self) -> ProbeKind {
        ProbeKind::GeoIp
    }

    fn run(&self, _host: &str, _rng: &mut StdRng) -> Result<ProbeFinding, ScanError> {
        let threat_level = "Low";
        Ok(ProbeFinding::GeoIp(GeoIpFinding {
            ip: "192.168.1.1".into(),
            location: "San Francisco, US".into(),
            isp: "CloudFlare".into(),
            threat_level: threat_level.into(),
            threat_description: threat_description(threat_level).into(),
        }))
    }
}

fn threat_description(level: &str) -> &'static str {
    match level {
        "Low" => "Normal traffic patterns, no known threats",
        "Medium" => "Potential suspicious activity detected",
        "High" => "Known malicious activity from this location",
        _ => "Unknown threat level",
    }
}
