//! Append-only transcript of one session, written to the user's state
//! directory. Every prompt, reply, mode switch, upload and HTTP exchange
//! lands here; credential headers are the only thing masked.

use crate::http::debug::masked_header;
use anyhow::{Result, anyhow, bail};
use reqwest::header::HeaderMap;
use std::env;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
#[cfg(unix)]
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

const TRACE_DIR_NAME: &str = "codemate/traces";

#[derive(Clone)]
pub struct SessionTrace {
    inner: Arc<TraceFile>,
}

struct TraceFile {
    path: PathBuf,
    writer: Mutex<BufWriter<File>>,
    warned: AtomicBool,
}

impl SessionTrace {
    pub fn create(session_id: &str) -> Result<Self> {
        let dir = resolve_trace_dir_from_env()?;
        Self::create_in_dir(session_id, &dir)
    }

    pub fn create_in_dir(session_id: &str, dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir)
            .map_err(|err| anyhow!("Failed to create trace directory {}: {err}", dir.display()))?;

        let started = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |duration| duration.as_secs());
        let path = dir.join(format!("session-{session_id}-{started}.log"));
        let file = open_owner_only(&path)
            .map_err(|err| anyhow!("Failed to create trace file {}: {err}", path.display()))?;

        Ok(Self {
            inner: Arc::new(TraceFile {
                path,
                writer: Mutex::new(BufWriter::new(file)),
                warned: AtomicBool::new(false),
            }),
        })
    }

    pub fn file_path(&self) -> &Path {
        &self.inner.path
    }

    pub fn log_user(&self, text: &str) {
        self.log_lines("user", text);
    }

    pub fn log_assistant(&self, text: &str) {
        self.log_lines("assistant", text);
    }

    /// Free-form session events: mode switches, uploads, failures.
    pub fn log_event(&self, kind: &str, text: &str) {
        self.log_lines(kind, text);
    }

    pub fn log_http_request(&self, method: &str, url: &str, headers: &HeaderMap, body: &str) {
        self.log_line("http.req", &format!("{method} {url}"));
        self.log_headers("http.req", headers);
        self.log_lines("http.req", body);
    }

    pub fn log_http_response(&self, status: u16, headers: &HeaderMap, body: &str) {
        self.log_line("http.resp", &format!("HTTP {status}"));
        self.log_headers("http.resp", headers);
        self.log_lines("http.resp", body);
    }

    pub fn log_http_error(&self, message: &str) {
        self.log_line("http.err", message);
    }

    /// Credential headers are masked; everything else is written as sent.
    fn log_headers(&self, kind: &str, headers: &HeaderMap) {
        for (name, value) in headers {
            let value = masked_header(name.as_str(), value);
            self.log_line(kind, &format!("{}: {value}", name.as_str()));
        }
    }

    fn log_lines(&self, kind: &str, text: &str) {
        if text.is_empty() {
            self.log_line(kind, "<empty>");
            return;
        }
        for line in text.lines() {
            self.log_line(kind, line);
        }
    }

    fn log_line(&self, kind: &str, text: &str) {
        let entry = format!("[{}] [{kind:<9}] {text}\n", timestamp());
        let Ok(mut writer) = self.inner.writer.lock() else {
            self.warn_once("trace writer lock poisoned");
            return;
        };
        if writer.write_all(entry.as_bytes()).is_err() || writer.flush().is_err() {
            self.warn_once("failed to write to trace file");
        }
    }

    fn warn_once(&self, message: &str) {
        if !self.inner.warned.swap(true, Ordering::Relaxed) {
            eprintln!("codemate trace warning: {message}");
        }
    }
}

#[cfg(unix)]
fn open_owner_only(path: &Path) -> std::io::Result<File> {
    OpenOptions::new()
        .create(true)
        .truncate(true)
        .write(true)
        .mode(0o600)
        .open(path)
}

#[cfg(not(unix))]
fn open_owner_only(path: &Path) -> std::io::Result<File> {
    File::create(path)
}

fn timestamp() -> String {
    let now = OffsetDateTime::now_utc();
    let now = now
        .replace_nanosecond(now.millisecond() as u32 * 1_000_000)
        .unwrap_or(now);
    now.format(&Rfc3339)
        .unwrap_or_else(|_| now.unix_timestamp().to_string())
}

pub fn resolve_trace_dir_from_env() -> Result<PathBuf> {
    let xdg_state = env::var("XDG_STATE_HOME").ok();
    resolve_trace_dir(xdg_state.as_deref(), dirs::home_dir().as_deref())
}

fn resolve_trace_dir(xdg_state_home: Option<&str>, home_dir: Option<&Path>) -> Result<PathBuf> {
    if let Some(xdg) = xdg_state_home {
        let trimmed = xdg.trim();
        if trimmed.is_empty() {
            bail!("Failed to resolve trace path: XDG_STATE_HOME is set but empty");
        }
        return Ok(PathBuf::from(trimmed).join(TRACE_DIR_NAME));
    }

    let home = home_dir
        .ok_or_else(|| anyhow!("Failed to resolve trace path: HOME directory is unavailable"))?;
    Ok(home.join(".local/state").join(TRACE_DIR_NAME))
}

#[cfg(test)]
mod tests {
    use super::{SessionTrace, resolve_trace_dir};
    use std::fs;
    #[cfg(unix)]
    use std::os::unix::fs::PermissionsExt;
    use std::path::Path;
    use tempfile::tempdir;

    #[test]
    fn trace_dir_prefers_xdg_state_home() {
        let dir = resolve_trace_dir(Some("/tmp/state"), Some(Path::new("/home/u"))).expect("dir");
        assert_eq!(dir, Path::new("/tmp/state/codemate/traces"));
    }

    #[test]
    fn trace_dir_falls_back_to_home() {
        let dir = resolve_trace_dir(None, Some(Path::new("/home/u"))).expect("dir");
        assert_eq!(dir, Path::new("/home/u/.local/state/codemate/traces"));
    }

    #[test]
    fn trace_dir_rejects_blank_xdg_state_home() {
        let err = resolve_trace_dir(Some("  "), Some(Path::new("/home/u"))).expect_err("blank");
        assert!(err.to_string().contains("XDG_STATE_HOME is set but empty"));
    }

    #[test]
    fn trace_dir_requires_some_base() {
        let err = resolve_trace_dir(None, None).expect_err("no base");
        assert!(err.to_string().contains("HOME directory is unavailable"));
    }

    #[test]
    fn each_line_is_stamped_and_tagged() {
        let dir = tempdir().expect("tempdir");
        let trace = SessionTrace::create_in_dir("abc", dir.path()).expect("trace");
        trace.log_user("why does this crash\nat line 3");
        trace.log_assistant("");

        let content = fs::read_to_string(trace.file_path()).expect("read");
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("[20"));
        assert!(lines[0].contains("Z] [user     ] why does this crash"));
        assert!(lines[1].ends_with("[user     ] at line 3"));
        assert!(lines[2].ends_with("[assistant] <empty>"));
    }

    #[test]
    fn file_name_contains_session_id() {
        let dir = tempdir().expect("tempdir");
        let trace = SessionTrace::create_in_dir("feed-1", dir.path()).expect("trace");
        let name = trace
            .file_path()
            .file_name()
            .and_then(|n| n.to_str())
            .expect("file name");
        assert!(name.starts_with("session-feed-1-"));
        assert!(name.ends_with(".log"));
    }

    #[cfg(unix)]
    #[test]
    fn trace_file_is_owner_only() {
        let dir = tempdir().expect("tempdir");
        let trace = SessionTrace::create_in_dir("abc", dir.path()).expect("trace");
        let mode = fs::metadata(trace.file_path())
            .expect("metadata")
            .permissions()
            .mode()
            & 0o777;
        assert_eq!(mode, 0o600);
    }
}
