//! Common test utilities for raiplay-dl integration tests

#![allow(dead_code)]

use serde_json::{Value, json};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use raiplay_dl::Config;

/// Show page path served by [`mount_show`]
pub const SHOW_PATH: &str = "/programmi/ilcommissario";

/// Episode JSON path referenced by the show page
pub const EPISODES_JSON_PATH: &str = "/programmi/ilcommissario/stagioni/ContentSet-42/episodes.json";

/// Build a RaiPlay-like episode JSON with one season of the given `(name, weblink)` cards
pub fn season_json(cards: &[(&str, &str)]) -> Value {
    let cards: Vec<Value> = cards
        .iter()
        .map(|(name, weblink)| json!({ "name": name, "weblink": weblink }))
        .collect();
    json!({ "seasons": [ { "episodes": [ { "cards": cards } ] } ] })
}

/// Serve a show page and its episode JSON from `server`
pub async fn mount_show(server: &MockServer, data: Value) {
    let page = r#"<!DOCTYPE html>
<html><body>
  <rai-episodes base_path="/programmi/ilcommissario" block="stagioni" set="ContentSet-42" episode_path="episodes.json"></rai-episodes>
</body></html>"#;

    Mock::given(method("GET"))
        .and(path(SHOW_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string(page))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path(EPISODES_JSON_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(data))
        .mount(server)
        .await;
}

/// Stand-in for yt-dlp: writes `<template with ext=mp4>`, prints progress lines, and
/// fails for URLs containing `broken`. `-F` prints a small format table.
#[cfg(unix)]
pub fn write_stub_ytdlp(dir: &Path) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let script = r#"#!/bin/sh
out=""
url=""
while [ $# -gt 0 ]; do
  case "$1" in
    -F) echo "ID   EXT RESOLUTION"; echo "720p mp4 1280x720"; exit 0 ;;
    -o) out="$2"; shift 2 ;;
    *) url="$1"; shift ;;
  esac
done
case "$url" in
  *broken*) echo "ERROR: [RaiPlay] Unable to extract relinker" >&2; exit 1 ;;
esac
file=$(printf '%s' "$out" | sed 's/%(ext)s/mp4/')
printf 'video' > "$file"
echo "[download] Destination: $file"
echo "[progress]downloading|2|5|NA|$file"
echo "[progress]finished|5|5|NA|$file"
"#;

    let path = dir.join("yt-dlp");
    std::fs::write(&path, script).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

/// Configuration pointing the catalog at `server` and the fetcher at `ytdlp`
pub fn test_config(server: &MockServer, ytdlp: PathBuf, temp_dir: &TempDir) -> Config {
    let mut config = Config::default();
    config.catalog.base_url = server.uri();
    config.catalog.request_timeout = Duration::from_secs(5);
    config.download.download_dir = temp_dir.path().join("downloads");
    config.download.max_concurrent_downloads = 2;
    config.tools.ytdlp_path = Some(ytdlp);
    config.tools.search_path = false;
    config
}
