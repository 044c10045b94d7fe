//! HTTP server for interactive analysis mode
//!
//! `synthdetect serve --backend http://localhost:8080` → starts a local
//! server, opens the browser, serves the embedded dashboard. The page asks
//! this server to analyze local files by path; the server uploads them to
//! the detection backend, normalizes the payload and keeps the session
//! history, so the browser never talks to the backend directly.

use crate::client::DetectorClient;
use crate::media::FileInfo;
use crate::normalize::{self, NormalizedResult};
use crate::report::SessionReport;
use crate::session::Session;
use serde::{Deserialize, Serialize};
use tiny_http::{Header, Method, Request, Response, Server};

// Embed the UI directly in the binary
const UI_HTML: &str = include_str!("ui.html");

#[derive(Serialize)]
struct ApiResponse<T> {
    ok: bool,
    data: Option<T>,
    error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    fn success(data: T) -> Self {
        Self {
            ok: true,
            data: Some(data),
            error: None,
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

#[derive(Deserialize, Serialize, Debug)]
pub struct AnalyzeParams {
    pub path: String,
    /// Number of consecutive analyses; repeats get the cosmetic boost.
    #[serde(default = "default_runs")]
    pub runs: u32,
}

fn default_runs() -> u32 {
    1
}

#[derive(Serialize)]
struct AnalyzeResponse<'a> {
    file: &'a FileInfo,
    result: &'a NormalizedResult,
    analysis_number: u32,
    indicators: String,
}

/// Start server, open browser, serve UI. Single-threaded: one session,
/// mutated only between requests.
pub fn start(port: u16, backend: &str) -> std::io::Result<()> {
    let addr = format!("127.0.0.1:{}", port);
    let server = Server::http(&addr)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;

    let url = format!("http://localhost:{}", port);
    let client = DetectorClient::new(backend);

    eprintln!("\n\x1b[1;32m🛰  synthdetect\x1b[0m");
    eprintln!("   {}", url);
    eprintln!("   Backend: {}\n", client.base_url());

    if let Err(e) = client.health() {
        eprintln!("\x1b[33mWarning: backend health check failed: {}\x1b[0m", e);
    }

    let _ = open::that(&url);

    let mut session = Session::new();
    for request in server.incoming_requests() {
        if let Err(e) = handle_request(request, &mut session, &client) {
            eprintln!("Error: {}", e);
        }
    }

    Ok(())
}

fn handle_request(
    mut request: Request,
    session: &mut Session,
    client: &DetectorClient,
) -> std::io::Result<()> {
    let url = request.url().to_string();
    let path = url.split('?').next().unwrap_or("/");
    let method = request.method().clone();

    match (&method, path) {
        // Serve embedded UI with the backend URL injected
        (&Method::Get, "/") => {
            let html = UI_HTML.replace("{{BACKEND_URL}}", client.base_url());
            let response = Response::from_string(html)
                .with_header(Header::from_bytes(&b"Content-Type"[..], &b"text/html"[..]).unwrap());
            request.respond(response)
        }

        // API: Analyze a local file via the backend
        (&Method::Get, "/api/analyze") | (&Method::Post, "/api/analyze") => {
            let params = match parse_params(&mut request) {
                Some(p) => p,
                None => {
                    return respond_json(
                        request,
                        &ApiResponse::<()>::failure("missing or invalid parameters"),
                    )
                }
            };
            eprintln!("→ {}", params.path);

            match run_analysis(session, client, &params) {
                Ok(()) => {
                    // complete() just ran, so file and result are present
                    let (file, entry) = match (session.current_file(), session.history().last()) {
                        (Some(f), Some(e)) => (f, e),
                        _ => {
                            return respond_json(
                                request,
                                &ApiResponse::<()>::failure("analysis produced no result"),
                            )
                        }
                    };
                    let data = AnalyzeResponse {
                        file,
                        result: &entry.result,
                        analysis_number: entry.analysis_number,
                        indicators: crate::report::indicators(file.kind, &entry.result),
                    };
                    respond_json(request, &ApiResponse::success(data))
                }
                Err(message) => respond_json(request, &ApiResponse::<()>::failure(message)),
            }
        }

        // API: Session history
        (&Method::Get, "/api/history") => {
            respond_json(request, &ApiResponse::success(session.history()))
        }

        // API: Full session report
        (&Method::Get, "/api/report") => match SessionReport::from_session(session) {
            Some(report) => respond_json(request, &ApiResponse::success(report)),
            None => respond_json(
                request,
                &ApiResponse::<()>::failure("no completed analysis yet"),
            ),
        },

        // 404
        _ => {
            let response = Response::from_string("Not found").with_status_code(404);
            request.respond(response)
        }
    }
}

/// Validate, upload and record `params.runs` analyses. A failed run reverts
/// the session to the upload state and surfaces a generic message; partial
/// results are never kept.
fn run_analysis(
    session: &mut Session,
    client: &DetectorClient,
    params: &AnalyzeParams,
) -> Result<(), String> {
    let file = FileInfo::from_path(&params.path)
        .ok_or_else(|| "unsupported file type: expected image, audio or video".to_string())?;

    session.select_file(file.clone());

    let runs = params.runs.max(1);
    for _ in 0..runs {
        let token = match session.begin_analysis() {
            Some(t) => t,
            None => return Err("no file selected".to_string()),
        };

        match client.detect(&file) {
            Ok(raw) => {
                let mut result = normalize::normalize(&raw);
                if session.is_reanalysis() {
                    result = normalize::boost(&result);
                }
                session.complete(token, result);
            }
            Err(e) => {
                eprintln!("Analysis failed: {}", e);
                session.fail(token);
                return Err("analysis failed, please try again".to_string());
            }
        }
    }

    Ok(())
}

fn parse_params(request: &mut Request) -> Option<AnalyzeParams> {
    let url = request.url().to_string();

    // Try query string
    if let Some(query) = url.split('?').nth(1) {
        if let Ok(params) = serde_urlencoded::from_str::<AnalyzeParams>(query) {
            return Some(params);
        }
    }

    // Try JSON body
    let mut body = String::new();
    request.as_reader().read_to_string(&mut body).ok()?;
    if !body.is_empty() {
        if let Ok(params) = serde_json::from_str::<AnalyzeParams>(&body) {
            return Some(params);
        }
    }

    None
}

fn respond_json<T: Serialize>(request: Request, payload: &T) -> std::io::Result<()> {
    let json = serde_json::to_string(payload)?;
    let response = Response::from_string(json).with_header(
        Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..]).unwrap(),
    );
    request.respond(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params_from_query_string() {
        let params: AnalyzeParams =
            serde_urlencoded::from_str("path=%2Fmedia%2Fphoto.jpg&runs=3").unwrap();
        assert_eq!(params.path, "/media/photo.jpg");
        assert_eq!(params.runs, 3);
    }

    #[test]
    fn test_params_runs_defaults_to_one() {
        let params: AnalyzeParams = serde_json::from_str(r#"{"path": "clip.mp4"}"#).unwrap();
        assert_eq!(params.runs, 1);
    }

    #[test]
    fn test_unsupported_file_rejected_without_state_change() {
        let mut session = Session::new();
        let client = DetectorClient::new("http://localhost:1");
        let params = AnalyzeParams {
            path: "notes.txt".into(),
            runs: 1,
        };

        let err = run_analysis(&mut session, &client, &params).unwrap_err();
        assert!(err.contains("unsupported file type"));
        assert!(session.current_file().is_none());
        assert!(session.history().is_empty());
    }

    #[test]
    fn test_backend_failure_reverts_session() {
        // The file does not exist, so the upload fails before any network
        let mut session = Session::new();
        let client = DetectorClient::new("http://127.0.0.1:1");
        let params = AnalyzeParams {
            path: "/nonexistent/photo.jpg".into(),
            runs: 1,
        };

        let err = run_analysis(&mut session, &client, &params).unwrap_err();
        assert_eq!(err, "analysis failed, please try again");
        assert_eq!(session.phase(), crate::session::Phase::Upload);
        assert!(session.history().is_empty());
    }
}
