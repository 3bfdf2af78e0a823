use anyhow::{Context, Result, anyhow, bail};
use reqwest::header::HeaderMap;
use std::env;
use std::fmt::Write as _;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
#[cfg(unix)]
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use time::OffsetDateTime;

const TRACE_SUBDIR: [&str; 2] = ["groundchat", "traces"];

/// Per-session append-only log. Cheap to clone; all clones share one file.
#[derive(Clone)]
pub struct SessionTrace {
    shared: Arc<TraceFile>,
}

struct TraceFile {
    path: PathBuf,
    writer: Mutex<BufWriter<File>>,
    warned: AtomicBool,
}

impl SessionTrace {
    pub fn create(session_id: &str) -> Result<Self> {
        let dir = resolve_trace_dir(
            env::var("XDG_STATE_HOME").ok().as_deref(),
            dirs::home_dir().as_deref(),
        )?;
        Self::create_in_dir(session_id, &dir)
    }

    pub fn create_in_dir(session_id: &str, dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create trace directory {}", dir.display()))?;

        let started = OffsetDateTime::now_utc().unix_timestamp();
        let path = dir.join(format!("session-{session_id}-{started}.log"));
        let file = open_private(&path)
            .with_context(|| format!("Failed to create trace file {}", path.display()))?;

        Ok(Self {
            shared: Arc::new(TraceFile {
                path,
                writer: Mutex::new(BufWriter::new(file)),
                warned: AtomicBool::new(false),
            }),
        })
    }

    pub fn file_path(&self) -> &Path {
        &self.shared.path
    }

    pub fn log_chat_input(&self, text: &str) {
        self.record("chat.in", text);
    }

    pub fn log_chat_output(&self, text: &str) {
        self.record("chat.out", text);
    }

    pub fn log_chat_error(&self, text: &str) {
        self.record("chat.err", text);
    }

    pub fn log_command(&self, text: &str) {
        self.record("cmd.in", text);
    }

    pub fn log_system(&self, text: &str) {
        self.record("sys", text);
    }

    pub fn log_http_request(&self, method: &str, url: &str, headers: &HeaderMap, body: &str) {
        self.record("http.req", &format!("{method} {url}"));
        self.record_headers("http.req", headers);
        self.record("http.req", body);
    }

    pub fn log_http_response(&self, status: u16, headers: &HeaderMap, body: &str) {
        self.record("http.res", &format!("HTTP {status}"));
        self.record_headers("http.res", headers);
        self.record("http.res", body);
    }

    pub fn log_http_error(&self, message: &str) {
        self.record("http.err", message);
    }

    pub fn log_http_debug(&self, line: &str) {
        self.record("http.debug", line);
    }

    fn record_headers(&self, kind: &str, headers: &HeaderMap) {
        for (name, value) in headers {
            let value = value.to_str().unwrap_or("<non-utf8>");
            self.record(kind, &format!("{name}: {value}"));
        }
    }

    /// Writes one trace line per text line; empty text is recorded as `<empty>`.
    fn record(&self, kind: &str, text: &str) {
        let stamp = timestamp(OffsetDateTime::now_utc());
        let mut out = String::new();
        if text.is_empty() {
            let _ = writeln!(out, "[{stamp}] [{kind:<11}] <empty>");
        } else {
            for line in text.lines() {
                let _ = writeln!(out, "[{stamp}] [{kind:<11}] {line}");
            }
        }
        self.append(&out);
    }

    fn append(&self, text: &str) {
        let written = match self.shared.writer.lock() {
            Ok(mut writer) => writer
                .write_all(text.as_bytes())
                .and_then(|()| writer.flush())
                .map_err(|err| err.to_string()),
            Err(_) => Err("trace writer lock poisoned".to_string()),
        };

        if let Err(reason) = written
            && !self.shared.warned.swap(true, Ordering::Relaxed)
        {
            eprintln!("GroundChat trace warning: {reason}");
        }
    }
}

#[cfg(unix)]
fn open_private(path: &Path) -> std::io::Result<File> {
    OpenOptions::new()
        .create(true)
        .truncate(true)
        .write(true)
        .mode(0o600)
        .open(path)
}

#[cfg(not(unix))]
fn open_private(path: &Path) -> std::io::Result<File> {
    File::create(path)
}

fn timestamp(now: OffsetDateTime) -> String {
    format!(
        "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}.{:03}Z",
        now.year(),
        u8::from(now.month()),
        now.day(),
        now.hour(),
        now.minute(),
        now.second(),
        now.millisecond()
    )
}

fn resolve_trace_dir(xdg_state_home: Option<&str>, home_dir: Option<&Path>) -> Result<PathBuf> {
    let base = match xdg_state_home {
        Some(raw) if raw.trim().is_empty() => {
            bail!("Failed to resolve trace path: XDG_STATE_HOME is set but empty")
        }
        Some(raw) => PathBuf::from(raw.trim()),
        None => home_dir
            .map(|home| home.join(".local").join("state"))
            .ok_or_else(|| anyhow!("Failed to resolve trace path: HOME directory is unavailable"))?,
    };

    Ok(TRACE_SUBDIR.iter().fold(base, |path, part| path.join(part)))
}
