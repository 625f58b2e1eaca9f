//! Typed models and validation for the project's JSON documents.
//!
//! `brief.json` describes the presentation intent, `outline.json` the
//! slide-by-slide plan and `generated/manifest.json` the ingested sources.
//! Validation works on raw JSON so every issue carries a JSON-pointer path;
//! it never fails, it returns a [`ValidationReport`].

use crate::theme::Theme;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::fmt;

/// Slide types an outline may use.
pub const SLIDE_TYPES: &[&str] = &[
    "title-hero",
    "section",
    "content",
    "bullets",
    "two-column",
    "stat",
    "quote",
    "image",
    "comparison",
    "timeline",
    "closing",
];

/// Current manifest format version.
pub const MANIFEST_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Brief {
    pub title: String,
    pub audience: String,
    pub goal: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub key_messages: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutlineSlide {
    pub id: String,
    #[serde(rename = "type")]
    pub slide_type: String,
    pub intent: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headline: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bullets: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Outline {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    pub slides: Vec<OutlineSlide>,
}

/// Coarse classification of an ingested source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Document,
    Image,
    Data,
    Text,
    Other,
}

impl FileKind {
    pub const ALL: [FileKind; 5] = [
        FileKind::Document,
        FileKind::Image,
        FileKind::Data,
        FileKind::Text,
        FileKind::Other,
    ];

    /// Classify by file extension (case-insensitive).
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_ascii_lowercase().as_str() {
            "pdf" | "doc" | "docx" | "ppt" | "pptx" | "key" | "odt" | "odp" | "rtf" => FileKind::Document,
            "png" | "jpg" | "jpeg" | "gif" | "svg" | "webp" | "avif" => FileKind::Image,
            "csv" | "tsv" | "json" | "xls" | "xlsx" | "ods" | "yaml" | "yml" => FileKind::Data,
            "md" | "markdown" | "txt" | "html" | "htm" => FileKind::Text,
            _ => FileKind::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FileKind::Document => "document",
            FileKind::Image => "image",
            FileKind::Data => "data",
            FileKind::Text => "text",
            FileKind::Other => "other",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestFile {
    pub path: String,
    pub kind: FileKind,
    pub bytes: u64,
    pub sha256: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    pub version: u32,
    pub generated_at: String,
    pub files: Vec<ManifestFile>,
}

/// One problem found in a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    /// JSON pointer to the offending value (`""` for the document root)
    pub path: String,
    pub message: String,
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path = if self.path.is_empty() { "/" } else { self.path.as_str() };
        write!(f, "{}: {}", path, self.message)
    }
}

/// Outcome of validating one document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    pub fn is_ok(&self) -> bool {
        self.issues.is_empty()
    }

    /// Issues rendered as `path: message` lines.
    pub fn messages(&self) -> Vec<String> {
        self.issues.iter().map(ToString::to_string).collect()
    }
}

#[derive(Default)]
struct Checker {
    issues: Vec<ValidationIssue>,
}

impl Checker {
    fn push(&mut self, path: &str, message: impl Into<String>) {
        self.issues.push(ValidationIssue {
            path: path.to_string(),
            message: message.into(),
        });
    }

    fn object<'v>(&mut self, value: &'v Value, path: &str) -> Option<&'v Map<String, Value>> {
        let obj = value.as_object();
        if obj.is_none() {
            self.push(path, "must be an object");
        }
        obj
    }

    fn required_string<'v>(&mut self, obj: &'v Map<String, Value>, key: &str, path: &str) -> Option<&'v str> {
        let at = format!("{}/{}", path, key);
        match obj.get(key) {
            None | Some(Value::Null) => {
                self.push(&at, "is required");
                None
            }
            Some(Value::String(s)) if s.trim().is_empty() => {
                self.push(&at, "must not be empty");
                None
            }
            Some(Value::String(s)) => Some(s.as_str()),
            Some(_) => {
                self.push(&at, "must be a string");
                None
            }
        }
    }

    fn optional_string<'v>(&mut self, obj: &'v Map<String, Value>, key: &str, path: &str) -> Option<&'v str> {
        match obj.get(key) {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.as_str()),
            Some(_) => {
                self.push(&format!("{}/{}", path, key), "must be a string");
                None
            }
        }
    }

    fn optional_string_array(&mut self, obj: &Map<String, Value>, key: &str, path: &str) {
        let at = format!("{}/{}", path, key);
        match obj.get(key) {
            None | Some(Value::Null) => {}
            Some(Value::Array(items)) => {
                for (i, item) in items.iter().enumerate() {
                    if !item.as_str().is_some_and(|s| !s.trim().is_empty()) {
                        self.push(&format!("{}/{}", at, i), "must be a non-empty string");
                    }
                }
            }
            Some(_) => self.push(&at, "must be an array of strings"),
        }
    }

    fn optional_theme(&mut self, obj: &Map<String, Value>, path: &str) {
        if let Some(name) = self.optional_string(obj, "theme", path) {
            if let Err(e) = Theme::lookup(name) {
                self.push(&format!("{}/theme", path), e.to_string());
            }
        }
    }

    fn finish(self) -> ValidationReport {
        ValidationReport { issues: self.issues }
    }
}

/// Validate a `brief.json` document.
pub fn validate_brief(value: &Value) -> ValidationReport {
    let mut c = Checker::default();
    let Some(obj) = c.object(value, "") else {
        return c.finish();
    };
    c.required_string(obj, "title", "");
    c.required_string(obj, "audience", "");
    c.required_string(obj, "goal", "");
    c.optional_string(obj, "tone", "");
    if let Some(d) = obj.get("durationMinutes").filter(|d| !d.is_null()) {
        if !d.as_u64().is_some_and(|m| m > 0) {
            c.push("/durationMinutes", "must be a positive integer");
        }
    }
    c.optional_string_array(obj, "keyMessages", "");
    c.optional_theme(obj, "");
    c.finish()
}

/// Validate an `outline.json` document.
pub fn validate_outline(value: &Value) -> ValidationReport {
    let mut c = Checker::default();
    let Some(obj) = c.object(value, "") else {
        return c.finish();
    };
    c.optional_string(obj, "title", "");
    c.optional_theme(obj, "");

    match obj.get("slides") {
        Some(Value::Array(slides)) if slides.is_empty() => c.push("/slides", "must contain at least one slide"),
        Some(Value::Array(slides)) => {
            let mut seen = HashSet::new();
            for (i, slide) in slides.iter().enumerate() {
                let path = format!("/slides/{}", i);
                let Some(s) = c.object(slide, &path) else { continue };
                if let Some(id) = c.required_string(s, "id", &path) {
                    if !seen.insert(id.to_string()) {
                        c.push(&format!("{}/id", path), format!("duplicate slide id '{}'", id));
                    }
                }
                if let Some(t) = c.required_string(s, "type", &path) {
                    if !SLIDE_TYPES.contains(&t) {
                        c.push(
                            &format!("{}/type", path),
                            format!("unknown slide type '{}' (expected one of: {})", t, SLIDE_TYPES.join(", ")),
                        );
                    }
                }
                c.required_string(s, "intent", &path);
                c.optional_string(s, "headline", &path);
                c.optional_string(s, "body", &path);
                c.optional_string(s, "notes", &path);
                c.optional_string_array(s, "bullets", &path);
            }
        }
        None | Some(Value::Null) => c.push("/slides", "is required"),
        Some(_) => c.push("/slides", "must be an array"),
    }
    c.finish()
}

/// Validate a `manifest.json` document.
pub fn validate_manifest(value: &Value) -> ValidationReport {
    let mut c = Checker::default();
    let Some(obj) = c.object(value, "") else {
        return c.finish();
    };

    if !obj.get("version").and_then(Value::as_u64).is_some_and(|v| v >= 1) {
        c.push("/version", "must be a positive integer");
    }
    if let Some(ts) = c.required_string(obj, "generatedAt", "") {
        if chrono::DateTime::parse_from_rfc3339(ts).is_err() {
            c.push("/generatedAt", "must be an RFC 3339 timestamp");
        }
    }

    match obj.get("files") {
        Some(Value::Array(files)) => {
            for (i, file) in files.iter().enumerate() {
                let path = format!("/files/{}", i);
                let Some(f) = c.object(file, &path) else { continue };
                c.required_string(f, "path", &path);
                if let Some(kind) = c.required_string(f, "kind", &path) {
                    if !FileKind::ALL.iter().any(|k| k.as_str() == kind) {
                        c.push(&format!("{}/kind", path), format!("unknown file kind '{}'", kind));
                    }
                }
                if f.get("bytes").and_then(Value::as_u64).is_none() {
                    c.push(&format!("{}/bytes", path), "must be a non-negative integer");
                }
                if let Some(digest) = c.required_string(f, "sha256", &path) {
                    if digest.len() != 64 || !digest.chars().all(|ch| ch.is_ascii_hexdigit()) {
                        c.push(&format!("{}/sha256", path), "must be 64 hex digits");
                    }
                }
            }
        }
        _ => c.push("/files", "must be an array"),
    }
    c.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_outline_fails() {
        let report = validate_outline(&json!({ "slides": [] }));
        assert!(!report.is_ok());
        assert_eq!(report.issues[0].path, "/slides");
    }

    #[test]
    fn title_hero_outline_passes() {
        let outline = json!({
            "theme": "slate",
            "slides": [{ "id": "s1", "type": "title-hero", "intent": "x", "headline": "y" }]
        });
        let report = validate_outline(&outline);
        assert!(report.is_ok(), "{:?}", report.messages());
        let typed: Outline = serde_json::from_value(outline).unwrap();
        assert_eq!(typed.slides[0].slide_type, "title-hero");
    }

    #[test]
    fn outline_issues_carry_paths() {
        let report = validate_outline(&json!({
            "theme": "neon",
            "slides": [
                { "id": "a", "type": "title-hero", "intent": "x" },
                { "id": "a", "type": "hologram", "bullets": ["ok", 3] },
                "nope"
            ]
        }));
        let paths: Vec<&str> = report.issues.iter().map(|i| i.path.as_str()).collect();
        assert!(paths.contains(&"/theme"));
        assert!(paths.contains(&"/slides/1/id"));
        assert!(paths.contains(&"/slides/1/type"));
        assert!(paths.contains(&"/slides/1/intent"));
        assert!(paths.contains(&"/slides/1/bullets/1"));
        assert!(paths.contains(&"/slides/2"));
    }

    #[test]
    fn brief_requires_core_fields() {
        let report = validate_brief(&json!({ "title": "Q3", "audience": "", "durationMinutes": 0 }));
        let messages = report.messages();
        assert!(messages.contains(&"/audience: must not be empty".to_string()));
        assert!(messages.contains(&"/goal: is required".to_string()));
        assert!(messages.contains(&"/durationMinutes: must be a positive integer".to_string()));

        let ok = json!({ "title": "Q3", "audience": "Board", "goal": "Approve budget", "theme": "Paper" });
        assert!(validate_brief(&ok).is_ok());
        assert!(!validate_brief(&json!([1, 2])).is_ok());
    }

    #[test]
    fn manifest_validation() {
        let good = json!({
            "version": 1,
            "generatedAt": "2024-05-01T12:00:00Z",
            "files": [{ "path": "notes.md", "kind": "text", "bytes": 12, "sha256": "a".repeat(64) }]
        });
        assert!(validate_manifest(&good).is_ok());
        let typed: Manifest = serde_json::from_value(good).unwrap();
        assert_eq!(typed.files[0].kind, FileKind::Text);

        let bad = json!({
            "version": 0,
            "generatedAt": "yesterday",
            "files": [{ "path": "x", "kind": "video", "bytes": -1, "sha256": "abc" }]
        });
        assert_eq!(validate_manifest(&bad).issues.len(), 5);
    }

    #[test]
    fn file_kinds_from_extension() {
        assert_eq!(FileKind::from_extension("PDF"), FileKind::Document);
        assert_eq!(FileKind::from_extension("jpeg"), FileKind::Image);
        assert_eq!(FileKind::from_extension("csv"), FileKind::Data);
        assert_eq!(FileKind::from_extension("md"), FileKind::Text);
        assert_eq!(FileKind::from_extension("bin"), FileKind::Other);
    }
}
