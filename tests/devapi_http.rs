//! Dev API served over HTTP

use reqwest::blocking::Client;
use serde_json::{json, Value};
use slidewright::devapi::{DevApi, DevServer};
use slidewright::project::Project;

fn start_api(dir: &std::path::Path) -> String {
    let project = Project::init(dir, "api-deck", "API deck", "paper").expect("init");
    let server = DevServer::bind("127.0.0.1:0").expect("bind");
    let base = format!("http://{}/__api", server.local_addr());
    std::thread::spawn(move || server.run(DevApi::new(project)));
    base
}

#[test]
fn test_status_and_brief_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let base = start_api(dir.path());
    let client = Client::new();

    let status: Value = client.get(format!("{}/status", base)).send().unwrap().json().unwrap();
    assert_eq!(status["ok"], true);
    assert_eq!(status["deck"]["id"], "api-deck");
    assert_eq!(status["deck"]["slideCount"], 2);
    assert_eq!(status["files"]["manifest"], false);

    let res = client
        .post(format!("{}/brief", base))
        .body(r#"{"title":"","audience":"Board"}"#)
        .send()
        .unwrap();
    assert_eq!(res.status().as_u16(), 400);
    let body: Value = res.json().unwrap();
    let paths: Vec<&str> = body["issues"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|i| i["path"].as_str())
        .collect();
    assert!(paths.contains(&"/goal"), "issues: {}", body);

    let brief = json!({"title": "Q3", "audience": "Board", "goal": "Approve budget"});
    let res = client.post(format!("{}/brief", base)).json(&brief).send().unwrap();
    assert_eq!(res.status().as_u16(), 200);
    let saved: Value = client.get(format!("{}/brief", base)).send().unwrap().json().unwrap();
    assert_eq!(saved, brief);

    let res = client.get(format!("{}/files", base)).send().unwrap();
    assert_eq!(res.status().as_u16(), 404);
    let res = client.get(format!("{}/nope", base)).send().unwrap();
    assert_eq!(res.status().as_u16(), 404);
}

#[test]
fn test_asset_upload_and_edits() {
    let dir = tempfile::tempdir().unwrap();
    let base = start_api(dir.path());
    let client = Client::new();

    let boundary = "XBOUNDARYX";
    let body = format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"logo.svg\"\r\nContent-Type: image/svg+xml\r\n\r\n<svg/>\r\n--{b}--\r\n",
        b = boundary
    );
    let res = client
        .post(format!("{}/assets", base))
        .header("Content-Type", format!("multipart/form-data; boundary={}", boundary))
        .body(body)
        .send()
        .unwrap();
    assert_eq!(res.status().as_u16(), 200);
    assert_eq!(std::fs::read_to_string(dir.path().join("assets/logo.svg")).unwrap(), "<svg/>");

    let res = client
        .post(format!("{}/assets?name=../escape.txt", base))
        .header("Content-Type", "application/octet-stream")
        .body("x")
        .send()
        .unwrap();
    assert_eq!(res.status().as_u16(), 400);
    assert!(!dir.path().join("escape.txt").exists());

    let listing: Value = client.get(format!("{}/assets", base)).send().unwrap().json().unwrap();
    assert_eq!(listing["assets"][0]["name"], "logo.svg");

    let load = json!({"op": "load", "html": r#"<h1 data-edit-id="t" style="color: red">Title</h1>"#});
    let state: Value = client.post(format!("{}/edits", base)).json(&load).send().unwrap().json().unwrap();
    assert_eq!(state["nodes"]["t"]["text"], "Title");

    let apply = json!({"op": "apply", "command": {"nodeId": "t", "property": {"kind": "text"}, "value": "New title"}});
    let state: Value = client.post(format!("{}/edits", base)).json(&apply).send().unwrap().json().unwrap();
    assert_eq!(state["nodes"]["t"]["text"], "New title");
    assert_eq!(state["canUndo"], true);

    let state: Value = client
        .post(format!("{}/edits", base))
        .json(&json!({"op": "undo"}))
        .send()
        .unwrap()
        .json()
        .unwrap();
    assert_eq!(state["nodes"]["t"]["text"], "Title");
    assert_eq!(state["canRedo"], true);

    let missing = json!({"op": "apply", "command": {"nodeId": "missing", "property": {"kind": "text"}, "value": "x"}});
    let res = client.post(format!("{}/edits", base)).json(&missing).send().unwrap();
    assert_eq!(res.status().as_u16(), 404);

    assert!(dir.path().join("generated/edits.json").is_file());
}
