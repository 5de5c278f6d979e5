use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::trace::trace::SubmitTraceEvent;

/// Appends one JSON line per submission event to a JSONL file.
///
/// Each line is flushed as soon as it is written, so the file reflects every
/// stage reached even when the process exits on the next failure. Write
/// failures only warn; a broken trace never blocks a submission.
pub struct TraceLogger {
    sink: Option<TraceSink>,
}

struct TraceSink {
    path: PathBuf,
    file: Mutex<File>,
}

impl TraceLogger {
    /// Open (or create) the trace file, creating missing parent directories.
    /// A file that cannot be opened leaves the logger disabled.
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match open_append(path) {
            Ok(file) => Self {
                sink: Some(TraceSink {
                    path: path.to_path_buf(),
                    file: Mutex::new(file),
                }),
            },
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "could not open trace file, submission trace disabled");
                Self { sink: None }
            }
        }
    }

    pub fn disabled() -> Self {
        Self { sink: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.sink.is_some()
    }

    /// Trace file in use, if any.
    pub fn path(&self) -> Option<&Path> {
        self.sink.as_ref().map(|s| s.path.as_path())
    }

    pub fn log(&self, event: &SubmitTraceEvent) {
        let Some(sink) = &self.sink else {
            return;
        };

        let line = match serde_json::to_string(event) {
            Ok(line) => line,
            Err(e) => {
                tracing::warn!(error = %e, "failed to serialize submit trace event");
                return;
            }
        };

        let Ok(mut file) = sink.file.lock() else {
            tracing::warn!(path = %sink.path.display(), "submit trace file lock poisoned");
            return;
        };

        if let Err(e) = writeln!(file, "{}", line).and_then(|_| file.flush()) {
            tracing::warn!(path = %sink.path.display(), error = %e, "failed to write submit trace event");
        }
    }
}

fn open_append(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}
