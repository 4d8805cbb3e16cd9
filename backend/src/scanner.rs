//! Scan orchestration: turns a target URL into a composite report by running
//! every probe and collecting their findings.

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, SecondsFormat, Utc};
use futures_util::future::try_join_all;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tracing::{debug, info, info_span, Instrument};
use url::Url;
use uuid::Uuid;

use crate::config::Config;
use crate::error::ScanError;
use crate::models::ScanRequest;
use crate::probes::{
    default_probes, DirectoriesFinding, GeoIpFinding, HeadersFinding, PortsFinding, Probe,
    ProbeFinding, ProbeInput, ProbeKind, SqlInjectionFinding, SubdomainsFinding, XssFinding,
};

/// A validated scan target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanTarget {
    /// The URL as submitted (trimmed), handed to URL-level probes.
    pub url: String,
    /// Hostname derived from the URL, handed to host-level probes.
    pub hostname: String,
}

impl ScanTarget {
    pub fn parse(raw: &str) -> Result<Self, ScanError> {
        let url = raw.trim();
        if url.is_empty() {
            return Err(ScanError::InvalidInput("URL is required".into()));
        }

        Ok(Self {
            hostname: derive_hostname(url)?,
            url: url.to_string(),
        })
    }
}

/// Extracts the hostname. Input without a `scheme://` prefix is read as
/// `https://` + input; an explicit scheme must be http or https.
pub fn derive_hostname(url: &str) -> Result<String, ScanError> {
    let candidate: Cow<'_, str> = if has_scheme(url) {
        Cow::Borrowed(url)
    } else {
        Cow::Owned(format!("https://{}", url))
    };

    let parsed = Url::parse(&candidate)
        .map_err(|e| ScanError::InvalidInput(format!("Invalid URL '{}': {}", url, e)))?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ScanError::InvalidInput(format!(
            "Invalid URL '{}': unsupported scheme '{}'",
            url,
            parsed.scheme()
        )));
    }

    parsed
        .host_str()
        .filter(|host| !host.is_empty())
        .map(str::to_owned)
        .ok_or_else(|| ScanError::InvalidInput(format!("Invalid URL '{}': no hostname", url)))
}

/// True when `url` opens with `scheme://`, the scheme being a letter followed
/// by letters, digits, `+`, `-` or `.`. `example.com:8443` has no scheme.
fn has_scheme(url: &str) -> bool {
    let Some((scheme, _)) = url.split_once("://") else {
        return false;
    };

    let mut chars = scheme.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

/// How the probes of one scan are scheduled. Both produce the same report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExecutionStrategy {
    #[default]
    Sequential,
    Concurrent,
}

impl FromStr for ExecutionStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sequential" => Ok(ExecutionStrategy::Sequential),
            "concurrent" => Ok(ExecutionStrategy::Concurrent),
            other => Err(format!(
                "unknown strategy '{}', expected 'sequential' or 'concurrent'",
                other
            )),
        }
    }
}

impl fmt::Display for ExecutionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionStrategy::Sequential => f.write_str("sequential"),
            ExecutionStrategy::Concurrent => f.write_str("concurrent"),
        }
    }
}

/// The composite report. Serialises to exactly the seven probe keys plus
/// `timestamp`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScanReport {
    pub headers: HeadersFinding,
    pub sql_injection: SqlInjectionFinding,
    pub xss: XssFinding,
    pub directories: DirectoriesFinding,
    pub ports: PortsFinding,
    pub subdomains: SubdomainsFinding,
    pub geoip: GeoIpFinding,
    pub timestamp: String,
}

#[derive(Debug, Default)]
struct ScanReportBuilder {
    headers: Option<HeadersFinding>,
    sql_injection: Option<SqlInjectionFinding>,
    xss: Option<XssFinding>,
    directories: Option<DirectoriesFinding>,
    ports: Option<PortsFinding>,
    subdomains: Option<SubdomainsFinding>,
    geoip: Option<GeoIpFinding>,
}

impl ScanReportBuilder {
    fn insert(&mut self, finding: ProbeFinding) -> Result<(), ScanError> {
        let kind = finding.kind();
        let occupied = match finding {
            ProbeFinding::Headers(f) => self.headers.replace(f).is_some(),
            ProbeFinding::SqlInjection(f) => self.sql_injection.replace(f).is_some(),
            ProbeFinding::Xss(f) => self.xss.replace(f).is_some(),
            ProbeFinding::Directories(f) => self.directories.replace(f).is_some(),
            ProbeFinding::Ports(f) => self.ports.replace(f).is_some(),
            ProbeFinding::Subdomains(f) => self.subdomains.replace(f).is_some(),
            ProbeFinding::GeoIp(f) => self.geoip.replace(f).is_some(),
        };

        if occupied {
            return Err(ScanError::InternalFailure(format!(
                "duplicate {} result",
                kind.key()
            )));
        }
        Ok(())
    }

    fn build(self, captured_at: DateTime<Utc>) -> Result<ScanReport, ScanError> {
        fn require<T>(slot: Option<T>, kind: ProbeKind) -> Result<T, ScanError> {
            slot.ok_or_else(|| {
                ScanError::InternalFailure(format!("missing {} result", kind.key()))
            })
        }

        Ok(ScanReport {
            headers: require(self.headers, ProbeKind::Headers)?,
            sql_injection: require(self.sql_injection, ProbeKind::SqlInjection)?,
            xss: require(self.xss, ProbeKind::Xss)?,
            directories: require(self.directories, ProbeKind::Directories)?,
            ports: require(self.ports, ProbeKind::Ports)?,
            subdomains: require(self.subdomains, ProbeKind::Subdomains)?,
            geoip: require(self.geoip, ProbeKind::GeoIp)?,
            timestamp: captured_at.to_rfc3339_opts(SecondsFormat::Millis, true),
        })
    }
}

/// Runs scans. Safe to share between requests; each scan builds its own
/// report and only holds the generator lock while drawing its seeds.
pub struct Scanner {
    probes: Vec<Arc<dyn Probe>>,
    strategy: ExecutionStrategy,
    simulate_latency: bool,
    rng: Mutex<StdRng>,
}

impl Scanner {
    pub fn new(probes: Vec<Arc<dyn Probe>>, rng: StdRng) -> Self {
        Self {
            probes,
            strategy: ExecutionStrategy::default(),
            simulate_latency: true,
            rng: Mutex::new(rng),
        }
    }

    /// Standard probes with a fixed seed.
    pub fn seeded(seed: u64) -> Self {
        Self::new(default_probes(), StdRng::seed_from_u64(seed))
    }

    pub fn from_config(config: &Config) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Self::new(default_probes(), rng)
            .with_strategy(config.strategy)
            .with_latency(config.simulate_latency)
    }

    pub fn with_strategy(mut self, strategy: ExecutionStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_latency(mut self, simulate: bool) -> Self {
        self.simulate_latency = simulate;
        self
    }

    pub async fn run_scan(&self, request: &ScanRequest) -> Result<ScanReport, ScanError> {
        let target = ScanTarget::parse(request.url.as_deref().unwrap_or_default())?;
        let span = info_span!("scan", scan_id = %Uuid::new_v4(), host = %target.hostname);

        self.scan_target(&target).instrument(span).await
    }

    async fn scan_target(&self, target: &ScanTarget) -> Result<ScanReport, ScanError> {
        info!(url = %target.url, strategy = %self.strategy, "scan started");

        // Seeds are drawn up front in probe order so the outcome does not
        // depend on how the probes get scheduled.
        let seeds: Vec<u64> = {
            let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
            self.probes.iter().map(|_| rng.gen()).collect()
        };

        let findings = match self.strategy {
            ExecutionStrategy::Sequential => {
                let mut findings = Vec::with_capacity(self.probes.len());
                for (probe, seed) in self.probes.iter().zip(seeds) {
                    findings.push(self.run_probe(probe.as_ref(), target, seed).await?);
                }
                findings
            }
            ExecutionStrategy::Concurrent => {
                try_join_all(
                    self.probes
                        .iter()
                        .zip(seeds)
                        .map(|(probe, seed)| self.run_probe(probe.as_ref(), target, seed)),
                )
                .await?
            }
        };

        let mut builder = ScanReportBuilder::default();
        for finding in findings {
            builder.insert(finding)?;
        }
        let report = builder.build(Utc::now())?;

        info!("scan finished");
        Ok(report)
    }

    async fn run_probe(
        &self,
        probe: &dyn Probe,
        target: &ScanTarget,
        seed: u64,
    ) -> Result<ProbeFinding, ScanError> {
        let kind = probe.kind();
        if self.simulate_latency {
            tokio::time::sleep(probe.latency()).await;
        }

        let input = match kind.input() {
            ProbeInput::Url => target.url.as_str(),
            ProbeInput::Hostname => target.hostname.as_str(),
        };

        let mut rng = StdRng::seed_from_u64(seed);
        let finding = probe.run(input, &mut rng)?;
        if finding.kind() != kind {
            return Err(ScanError::InternalFailure(format!(
                "{} probe produced a {} result",
                kind.key(),
                finding.kind().key()
            )));
        }

        debug!(probe = kind.key(), "probe finished");
        Ok(finding)
    }
}
