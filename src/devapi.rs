//! Dev-time HTTP API consumed by the preview UI.
//!
//! Routes live under `/__api/`. Request handling is a pure function of an
//! [`ApiRequest`] and the project state so it can be exercised without a
//! socket; [`DevServer`] feeds it from a single `tiny_http` loop. A failing
//! handler becomes a JSON error response and never stops the loop.

use crate::edit::{EditCommand, EditDocument};
use crate::project::{DevProcess, Project, BRIEF_FILE, OUTLINE_FILE};
use crate::schema::validate_brief;
use crate::Error;
use log::{debug, info, warn};
use serde::Deserialize;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};

/// Route prefix shared by every endpoint.
pub const API_PREFIX: &str = "/__api/";

const EDITS_FILE: &str = "edits.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Other,
}

/// A decoded HTTP request.
#[derive(Debug, Clone)]
pub struct ApiRequest<'a> {
    pub method: Method,
    /// Path without the query string
    pub path: &'a str,
    pub query: Option<&'a str>,
    pub content_type: Option<&'a str>,
    pub body: &'a [u8],
}

impl<'a> ApiRequest<'a> {
    pub fn new(method: Method, url: &'a str, content_type: Option<&'a str>, body: &'a [u8]) -> Self {
        let (path, query) = match url.split_once('?') {
            Some((p, q)) => (p, Some(q)),
            None => (url, None),
        };
        Self {
            method,
            path,
            query,
            content_type,
            body,
        }
    }

    /// First value of a query parameter.
    pub fn query_param(&self, name: &str) -> Option<String> {
        let query = self.query?;
        url::form_urlencoded::parse(query.as_bytes())
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.into_owned())
    }
}

/// A JSON response.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

impl ApiResponse {
    fn ok(body: Value) -> Self {
        Self { status: 200, body }
    }
}

#[derive(Debug)]
enum ApiError {
    BadRequest(String, Option<Value>),
    NotFound(String),
    MethodNotAllowed,
    Internal(String),
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        match err {
            Error::UnknownNode(_) => ApiError::NotFound(err.to_string()),
            Error::Json(_) | Error::UnknownTheme { .. } => ApiError::BadRequest(err.to_string(), None),
            Error::Io(ref io) if io.kind() == std::io::ErrorKind::NotFound => ApiError::NotFound(err.to_string()),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<std::io::Error> for ApiError {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err).into()
    }
}

impl ApiError {
    fn into_response(self) -> ApiResponse {
        let (status, message, issues) = match self {
            ApiError::BadRequest(m, issues) => (400, m, issues),
            ApiError::NotFound(m) => (404, m, None),
            ApiError::MethodNotAllowed => (405, "method not allowed".to_string(), None),
            ApiError::Internal(m) => (500, m, None),
        };
        let mut body = json!({ "error": message });
        if let Some(issues) = issues {
            body["issues"] = issues;
        }
        ApiResponse { status, body }
    }
}

type ApiResult = std::result::Result<Value, ApiError>;

/// Body of `POST /__api/edits`.
#[derive(Debug, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
enum EditOp {
    Apply { command: EditCommand },
    Undo,
    Redo,
    Load { html: String },
}

/// Request handler state: the project plus the live edit document.
pub struct DevApi {
    project: Project,
    edits: EditDocument,
}

impl DevApi {
    pub fn new(project: Project) -> Self {
        let path = edits_path(&project);
        let edits = match std::fs::read_to_string(&path) {
            Ok(data) => serde_json::from_str(&data).unwrap_or_else(|e| {
                warn!("Ignoring unreadable {}: {}", path.display(), e);
                EditDocument::new()
            }),
            Err(_) => EditDocument::new(),
        };
        Self { project, edits }
    }

    pub fn project(&self) -> &Project {
        &self.project
    }

    pub fn edits(&self) -> &EditDocument {
        &self.edits
    }

    /// Dispatch one request.
    pub fn handle(&mut self, req: &ApiRequest) -> ApiResponse {
        let result = match req.path.strip_prefix(API_PREFIX) {
            Some("status") => self.status(req),
            Some("brief") => self.brief(req),
            Some("files") => self.files(req),
            Some("assets") => self.assets(req),
            Some("edits") => self.edit(req),
            _ => Err(ApiError::NotFound(format!("no route for {}", req.path))),
        };
        match result {
            Ok(body) => ApiResponse::ok(body),
            Err(e) => {
                debug!("{} {} failed: {:?}", method_name(req.method), req.path, e);
                e.into_response()
            }
        }
    }

    fn status(&self, req: &ApiRequest) -> ApiResult {
        if req.method != Method::Get {
            return Err(ApiError::MethodNotAllowed);
        }
        let config = &self.project.config;
        let root = &self.project.root;
        Ok(json!({
            "ok": true,
            "version": env!("CARGO_PKG_VERSION"),
            "deck": {
                "id": config.id,
                "title": config.title,
                "theme": config.theme,
                "url": config.deck_url,
                "slideCount": self.project.deck().ok().map(|d| d.slide_count),
            },
            "files": {
                "brief": root.join(BRIEF_FILE).is_file(),
                "outline": root.join(OUTLINE_FILE).is_file(),
                "manifest": self.project.manifest_path().is_file(),
            },
        }))
    }

    fn brief(&self, req: &ApiRequest) -> ApiResult {
        let path = self.project.root.join(BRIEF_FILE);
        match req.method {
            Method::Get => read_json(&path),
            Method::Post => {
                let value: Value = serde_json::from_slice(req.body)
                    .map_err(|e| ApiError::BadRequest(format!("invalid JSON: {}", e), None))?;
                let report = validate_brief(&value);
                if !report.is_ok() {
                    return Err(ApiError::BadRequest(
                        "brief failed validation".to_string(),
                        Some(json!(report.issues)),
                    ));
                }
                std::fs::write(&path, serde_json::to_string_pretty(&value).map_err(Error::from)?)?;
                info!("Saved {}", path.display());
                Ok(json!({ "ok": true }))
            }
            Method::Other => Err(ApiError::MethodNotAllowed),
        }
    }

    fn files(&self, req: &ApiRequest) -> ApiResult {
        if req.method != Method::Get {
            return Err(ApiError::MethodNotAllowed);
        }
        read_json(&self.project.manifest_path())
    }

    fn assets(&self, req: &ApiRequest) -> ApiResult {
        let dir = self.project.assets_dir();
        match req.method {
            Method::Get => {
                let mut assets = Vec::new();
                if dir.is_dir() {
                    for entry in std::fs::read_dir(&dir)? {
                        let entry = entry?;
                        let meta = entry.metadata()?;
                        if meta.is_file() {
                            assets.push(json!({
                                "name": entry.file_name().to_string_lossy(),
                                "bytes": meta.len(),
                            }));
                        }
                    }
                }
                assets.sort_by(|a, b| a["name"].as_str().cmp(&b["name"].as_str()));
                Ok(json!({ "assets": assets }))
            }
            Method::Post => {
                let uploads = match req.content_type.filter(|ct| ct.starts_with("multipart/form-data")) {
                    Some(ct) => parse_multipart(ct, req.body)
                        .ok_or_else(|| ApiError::BadRequest("malformed multipart body".to_string(), None))?
                        .into_iter()
                        .filter_map(|part| part.filename.map(|name| (name, part.data)))
                        .collect::<Vec<_>>(),
                    None => {
                        let name = req
                            .query_param("name")
                            .ok_or_else(|| ApiError::BadRequest("missing ?name= for raw upload".to_string(), None))?;
                        vec![(name, req.body.to_vec())]
                    }
                };
                if uploads.is_empty() {
                    return Err(ApiError::BadRequest("no files in upload".to_string(), None));
                }

                std::fs::create_dir_all(&dir)?;
                let mut saved = Vec::new();
                for (name, data) in uploads {
                    let name = safe_file_name(&name)
                        .ok_or_else(|| ApiError::BadRequest(format!("invalid file name '{}'", name), None))?;
                    std::fs::write(dir.join(&name), &data)?;
                    info!("Stored asset {} ({} bytes)", name, data.len());
                    saved.push(name);
                }
                Ok(json!({ "saved": saved }))
            }
            Method::Other => Err(ApiError::MethodNotAllowed),
        }
    }

    fn edit(&mut self, req: &ApiRequest) -> ApiResult {
        match req.method {
            Method::Get => Ok(self.edits_body()),
            Method::Post => {
                let op: EditOp = serde_json::from_slice(req.body)
                    .map_err(|e| ApiError::BadRequest(format!("invalid edit operation: {}", e), None))?;
                let changed = match op {
                    EditOp::Apply { command } => {
                        self.edits.apply(command)?;
                        true
                    }
                    EditOp::Undo => self.edits.undo(),
                    EditOp::Redo => self.edits.redo(),
                    EditOp::Load { html } => self.edits.load_html(&html) > 0,
                };
                if changed {
                    self.save_edits()?;
                }
                let mut body = self.edits_body();
                body["changed"] = json!(changed);
                Ok(body)
            }
            Method::Other => Err(ApiError::MethodNotAllowed),
        }
    }

    fn edits_body(&self) -> Value {
        let nodes: serde_json::Map<String, Value> = self
            .edits
            .nodes()
            .map(|(id, node)| (id.to_string(), json!({ "text": node.text, "style": node.style })))
            .collect();
        json!({
            "nodes": nodes,
            "canUndo": self.edits.can_undo(),
            "canRedo": self.edits.can_redo(),
        })
    }

    fn save_edits(&self) -> std::result::Result<(), ApiError> {
        let path = edits_path(&self.project);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, serde_json::to_string_pretty(&self.edits).map_err(Error::from)?)?;
        Ok(())
    }
}

fn edits_path(project: &Project) -> PathBuf {
    project.generated_dir().join(EDITS_FILE)
}

fn method_name(method: Method) -> &'static str {
    match method {
        Method::Get => "GET",
        Method::Post => "POST",
        Method::Other => "OTHER",
    }
}

fn read_json(path: &Path) -> ApiResult {
    let data = std::fs::read_to_string(path)
        .map_err(|_| ApiError::NotFound(format!("{} not found", path.display())))?;
    serde_json::from_str(&data).map_err(|e| ApiError::Internal(format!("{} is not valid JSON: {}", path.display(), e)))
}

/// Reduce an uploaded name to a plain file name, rejecting paths and hidden
/// files.
pub fn safe_file_name(name: &str) -> Option<String> {
    let trimmed = name.trim();
    let file = Path::new(trimmed).file_name()?.to_str()?;
    if file != trimmed || file.starts_with('.') || file.contains('\\') {
        return None;
    }
    Some(file.to_string())
}

/// One part of a `multipart/form-data` body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultipartPart {
    pub name: Option<String>,
    pub filename: Option<String>,
    pub data: Vec<u8>,
}

/// Split a `multipart/form-data` body into its parts.
///
/// Returns `None` when the content type has no boundary or the body does not
/// start with one.
pub fn parse_multipart(content_type: &str, body: &[u8]) -> Option<Vec<MultipartPart>> {
    let (_, params) = content_type.split_once(';')?;
    let boundary = header_params(params)
        .into_iter()
        .find(|(k, _)| k.eq_ignore_ascii_case("boundary"))
        .map(|(_, v)| v)?;
    if boundary.is_empty() {
        return None;
    }
    let delimiter = format!("--{}", boundary).into_bytes();

    let mut pos = find(body, &delimiter, 0)?;
    let mut parts = Vec::new();
    loop {
        let after = pos + delimiter.len();
        if body.get(after..after + 2) == Some(&b"--"[..]) {
            break;
        }
        let start = if body.get(after..after + 2) == Some(&b"\r\n"[..]) { after + 2 } else { after };
        let next = find(body, &delimiter, start)?;
        let mut section = &body[start..next];
        if section.ends_with(b"\r\n") {
            section = &section[..section.len() - 2];
        }
        parts.push(parse_part(section)?);
        pos = next;
    }
    Some(parts)
}

fn parse_part(section: &[u8]) -> Option<MultipartPart> {
    let split = find(section, b"\r\n\r\n", 0)?;
    let headers = String::from_utf8_lossy(&section[..split]);
    let data = section[split + 4..].to_vec();

    let mut name = None;
    let mut filename = None;
    for line in headers.lines() {
        let Some((key, value)) = line.split_once(':') else { continue };
        if !key.trim().eq_ignore_ascii_case("content-disposition") {
            continue;
        }
        let Some((_, params)) = value.split_once(';') else { continue };
        for (k, v) in header_params(params) {
            match k.to_ascii_lowercase().as_str() {
                "name" => name = Some(v),
                "filename" => filename = Some(v),
                _ => {}
            }
        }
    }
    Some(MultipartPart { name, filename, data })
}

/// Split `k=v; k="quoted; value"` header parameters.
///
/// Separators inside double quotes are literal; a backslash escapes the next
/// character of a quoted value.
fn header_params(params: &str) -> Vec<(String, String)> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    let mut escaped = false;
    for c in params.chars() {
        match c {
            _ if escaped => escaped = false,
            '\\' if quoted => escaped = true,
            '"' => quoted = !quoted,
            ';' if !quoted => {
                segments.push(std::mem::take(&mut current));
                continue;
            }
            _ => {}
        }
        current.push(c);
    }
    segments.push(current);

    segments
        .iter()
        .filter_map(|segment| {
            let (key, value) = segment.split_once('=')?;
            let key = key.trim();
            if key.is_empty() {
                return None;
            }
            Some((key.to_string(), unquote(value.trim())))
        })
        .collect()
}

fn unquote(value: &str) -> String {
    let Some(inner) = value.strip_prefix('"').and_then(|v| v.strip_suffix('"')) else {
        return value.to_string();
    };
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            out.extend(chars.next());
        } else {
            out.push(c);
        }
    }
    out
}

fn find(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    if needle.is_empty() || from > haystack.len() {
        return None;
    }
    haystack[from..]
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|i| i + from)
}

/// The dev API bound to a local address.
pub struct DevServer {
    server: tiny_http::Server,
}

impl DevServer {
    pub fn bind(addr: &str) -> crate::Result<Self> {
        let server = tiny_http::Server::http(addr)
            .map_err(|e| Error::InitializationError(format!("Failed to bind dev API on {}: {}", addr, e)))?;
        Ok(Self { server })
    }

    /// Address actually bound (useful with port 0).
    pub fn local_addr(&self) -> String {
        self.server.server_addr().to_string()
    }

    /// Serve requests until the process exits.
    pub fn run(self, mut api: DevApi) {
        info!("Dev API listening on http://{}{}", self.local_addr(), API_PREFIX);
        for mut request in self.server.incoming_requests() {
            let method = match request.method() {
                tiny_http::Method::Get => Method::Get,
                tiny_http::Method::Post => Method::Post,
                _ => Method::Other,
            };
            let content_type = request
                .headers()
                .iter()
                .find(|h| h.field.equiv("Content-Type"))
                .map(|h| h.value.as_str().to_string());
            let url = request.url().to_string();

            let mut body = Vec::new();
            let response = match request.as_reader().read_to_end(&mut body) {
                Ok(_) => api.handle(&ApiRequest::new(method, &url, content_type.as_deref(), &body)),
                Err(e) => ApiError::BadRequest(format!("failed to read body: {}", e), None).into_response(),
            };

            let payload = response.body.to_string();
            let mut reply = tiny_http::Response::from_string(payload).with_status_code(response.status);
            if let Ok(header) = tiny_http::Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..]) {
                reply = reply.with_header(header);
            }
            if let Err(e) = request.respond(reply) {
                warn!("Failed to send response for {}: {}", url, e);
            }
        }
    }
}

/// Bind the dev API on `addr`, then start the bundler dev server when
/// `bundler` is set. Nothing is spawned when the address cannot be bound.
pub fn start_dev(project: &Project, addr: &str, bundler: bool) -> crate::Result<(DevServer, Option<DevProcess>)> {
    let server = DevServer::bind(addr)?;
    let process = if bundler { Some(project.spawn_dev_server()?) } else { None };
    Ok((server, process))
}
