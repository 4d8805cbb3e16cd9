use std::path::Path;
use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use pandascan_backend::probes::{default_probes, Probe, ProbeFinding, ProbeKind};
use pandascan_backend::{router, AppState, ScanError, Scanner};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

fn app_with(scanner: Scanner, static_dir: &Path) -> Router {
    router(Arc::new(AppState::new(scanner)), static_dir)
}

fn app() -> Router {
    app_with(
        Scanner::seeded(7).with_latency(false),
        Path::new("does-not-exist"),
    )
}

async fn send(app: Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn post_scan(body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/scan")
        .header("content-type", "application/json")
        .body(body.into())
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn scan_returns_success_envelope() {
    let (status, body) = send(app(), post_scan(json!({"url": "example.com"}).to_string())).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    assert_eq!(body["report_url"], "/download_report");

    let results = body["results"].as_object().unwrap();
    let mut keys: Vec<&str> = results.keys().map(String::as_str).collect();
    keys.sort_unstable();
    assert_eq!(
        keys,
        [
            "directories",
            "geoip",
            "headers",
            "ports",
            "sql_injection",
            "subdomains",
            "timestamp",
            "xss"
        ]
    );

    let subs = results["subdomains"]["found_subdomains"].as_array().unwrap();
    assert_eq!(subs.len(), 3);
    assert!(subs.iter().all(|s| s.as_str().unwrap().ends_with("example.com")));
    assert_eq!(results["headers"]["security_grade"], "B");
    assert_eq!(results["geoip"]["ip"], "192.168.1.1");
}

#[tokio::test]
async fn bare_host_starting_with_http_is_scanned() {
    for (url, host) in [
        ("httpbin.org", "httpbin.org"),
        ("httpstat.us/200", "httpstat.us"),
        ("HTTPS://Example.com/x", "example.com"),
    ] {
        let (status, body) = send(app(), post_scan(json!({ "url": url }).to_string())).await;
        assert_eq!(status, StatusCode::OK, "{}", url);

        let subs = body["results"]["subdomains"]["found_subdomains"]
            .as_array()
            .unwrap();
        assert_eq!(subs.len(), 3);
        for sub in subs {
            assert!(sub.as_str().unwrap().ends_with(&format!(".{}", host)), "{}", sub);
        }
    }
}

#[tokio::test]
async fn non_web_scheme_is_bad_request() {
    let (status, body) = send(
        app(),
        post_scan(json!({"url": "ftp://files.example.com"}).to_string()),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "error");
}

#[tokio::test]
async fn empty_url_is_bad_request() {
    for payload in [json!({"url": ""}), json!({"url": "   "}), json!({}), json!({"url": null})] {
        let (status, body) = send(app(), post_scan(payload.to_string())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"status": "error", "message": "URL is required"}));
    }
}

#[tokio::test]
async fn unparseable_url_is_bad_request() {
    let (status, body) = send(app(), post_scan(json!({"url": "exa mple.com"}).to_string())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "error");
    assert!(body["message"].as_str().unwrap().contains("exa mple.com"));
}

#[tokio::test]
async fn malformed_body_is_bad_request() {
    let (status, body) = send(app(), post_scan("{not json")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "error");
}

struct BrokenGeoIp;

impl Probe for BrokenGeoIp {
    fn kind(&self) -> ProbeKind {
        ProbeKind::GeoIp
    }

    fn run(&self, _host: &str, _rng: &mut StdRng) -> Result<ProbeFinding, ScanError> {
        Err(ScanError::InternalFailure("geoip lookup table corrupted".into()))
    }
}

#[tokio::test]
async fn probe_failure_is_internal_error_with_message() {
    let probes = default_probes()
        .into_iter()
        .map(|p| {
            if p.kind() == ProbeKind::GeoIp {
                Arc::new(BrokenGeoIp) as Arc<dyn Probe>
            } else {
                p
            }
        })
        .collect();
    let scanner = Scanner::new(probes, StdRng::seed_from_u64(0)).with_latency(false);

    let (status, body) = send(
        app_with(scanner, Path::new("does-not-exist")),
        post_scan(json!({"url": "example.com"}).to_string()),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body,
        json!({"status": "error", "message": "geoip lookup table corrupted"})
    );
}

#[tokio::test]
async fn download_report_is_a_placeholder() {
    let (status, body) = send(app(), get("/download_report")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"message": "Report download would be implemented here"})
    );
}

fn report_urls(body: &Value) -> Vec<&str> {
    body["reports"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["url"].as_str().unwrap())
        .collect()
}

#[tokio::test]
async fn reports_sorted_by_vulnerabilities() {
    let (status, body) = send(app(), get("/api/reports?sort=vulnerabilities")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 5);
    assert_eq!(
        report_urls(&body),
        ["webapp.net", "example.com", "secure.io", "mysite.com", "testsite.org"]
    );
}

#[tokio::test]
async fn reports_filtered_by_severity_and_query() {
    let (_, body) = send(app(), get("/api/reports?severity=critical")).await;
    assert_eq!(report_urls(&body), ["webapp.net"]);
    assert_eq!(body["reports"][0]["vulnerabilities"], 12);

    let (_, body) = send(app(), get("/api/reports?q=SITE&sort=severity")).await;
    assert_eq!(report_urls(&body), ["testsite.org", "mysite.com"]);
}

#[tokio::test]
async fn reports_empty_result_is_an_empty_list() {
    let (status, body) = send(app(), get("/api/reports?q=nothing-here")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"total": 0, "reports": []}));
}

#[tokio::test]
async fn reports_reject_unknown_sort() {
    let (status, body) = send(app(), get("/api/reports?sort=size")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "error");
}

fn temp_static_dir() -> TempDir {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("index.html"), "<html>panda shell</html>").unwrap();
    dir
}

#[tokio::test]
async fn unknown_routes_serve_the_app_shell() {
    let dir = temp_static_dir();

    for uri in ["/", "/dashboard", "/reports/3"] {
        let app = app_with(Scanner::seeded(0).with_latency(false), dir.path());
        let resp = app.oneshot(get(uri)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK, "{}", uri);
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"<html>panda shell</html>");
    }
}
