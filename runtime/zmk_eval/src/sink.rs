//! Text output sinks.
//!
//! Generated text goes to one of:
//! - Stdout (default root sink)
//! - a string buffer (writer variables, captured command output, tests)
//! - a file opened by a `Writer` definition
//! - nowhere (silent)
//!
//! Uses enum dispatch; the sink set is closed. Every write takes the
//! sink's lock for the duration of the call, so text from concurrent
//! script threads interleaves per write, never within one.

use std::fs::File;
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::errors::{file_error, EvalResult};

/// File-backed sink.
pub struct FileSink {
    path: PathBuf,
    file: Mutex<File>,
}

impl FileSink {
    /// Create or truncate `path`.
    pub fn create(path: &Path) -> EvalResult<Self> {
        let file = File::create(path).map_err(|e| file_error(path.display(), e))?;
        Ok(FileSink {
            path: path.to_path_buf(),
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write(&self, text: &str) -> EvalResult<()> {
        self.file
            .lock()
            .write_all(text.as_bytes())
            .map_err(|e| file_error(self.path.display(), e))
    }

    fn clear(&self) -> EvalResult<()> {
        let mut file = self.file.lock();
        file.set_len(0)
            .and_then(|()| file.seek(SeekFrom::Start(0)).map(|_| ()))
            .map_err(|e| file_error(self.path.display(), e))
    }

    fn flush(&self) -> EvalResult<()> {
        self.file
            .lock()
            .flush()
            .map_err(|e| file_error(self.path.display(), e))
    }
}

/// An output destination.
pub enum OutputSink {
    Stdout(Mutex<()>),
    Buffer(Mutex<String>),
    File(FileSink),
    /// Discards everything.
    Silent,
}

impl OutputSink {
    /// Append `text`.
    pub fn write(&self, text: &str) -> EvalResult<()> {
        match self {
            Self::Stdout(lock) => {
                let _guard = lock.lock();
                print!("{text}");
                Ok(())
            }
            Self::Buffer(buf) => {
                buf.lock().push_str(text);
                Ok(())
            }
            Self::File(file) => file.write(text),
            Self::Silent => Ok(()),
        }
    }

    /// Captured text. Empty for sinks that don't capture.
    pub fn contents(&self) -> String {
        match self {
            Self::Buffer(buf) => buf.lock().clone(),
            Self::Stdout(_) | Self::File(_) | Self::Silent => String::new(),
        }
    }

    /// Drop everything written so far (clear-then-append assignment).
    pub fn clear(&self) -> EvalResult<()> {
        match self {
            Self::Buffer(buf) => {
                buf.lock().clear();
                Ok(())
            }
            Self::File(file) => file.clear(),
            Self::Stdout(_) | Self::Silent => Ok(()),
        }
    }

    pub fn flush(&self) -> EvalResult<()> {
        match self {
            Self::Stdout(lock) => {
                let _guard = lock.lock();
                std::io::stdout()
                    .flush()
                    .map_err(|e| file_error("<stdout>", e))
            }
            Self::File(file) => file.flush(),
            Self::Buffer(_) | Self::Silent => Ok(()),
        }
    }
}

/// Shared sink handle.
pub type SharedSink = Arc<OutputSink>;

pub fn stdout_sink() -> SharedSink {
    Arc::new(OutputSink::Stdout(Mutex::new(())))
}

pub fn buffer_sink() -> SharedSink {
    Arc::new(OutputSink::Buffer(Mutex::new(String::new())))
}

/// Buffer pre-filled with `text`.
pub fn buffer_sink_with(text: &str) -> SharedSink {
    Arc::new(OutputSink::Buffer(Mutex::new(text.to_string())))
}

pub fn silent_sink() -> SharedSink {
    Arc::new(OutputSink::Silent)
}

pub fn file_sink(path: &Path) -> EvalResult<SharedSink> {
    FileSink::create(path).map(|f| Arc::new(OutputSink::File(f)))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::ErrorTag;

    #[test]
    fn buffer_captures_writes() {
        let sink = buffer_sink();
        sink.write("hello").unwrap();
        sink.write(" world").unwrap();
        assert_eq!(sink.contents(), "hello world");
    }

    #[test]
    fn clear_empties_buffer() {
        let sink = buffer_sink_with("old");
        sink.clear().unwrap();
        sink.write("new").unwrap();
        assert_eq!(sink.contents(), "new");
    }

    #[test]
    fn silent_discards() {
        let sink = silent_sink();
        sink.write("x").unwrap();
        assert_eq!(sink.contents(), "");
    }

    #[test]
    fn file_sink_truncates_on_clear() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.txt");
        let sink = file_sink(&path).unwrap();
        sink.write("first").unwrap();
        sink.clear().unwrap();
        sink.write("second").unwrap();
        sink.flush().unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "second");
    }

    #[test]
    fn missing_directory_is_a_file_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = file_sink(&dir.path().join("no/such/out.txt")).err().unwrap();
        assert_eq!(err.tag(), ErrorTag::FileError);
    }

    #[test]
    fn concurrent_writes_do_not_tear() {
        let sink = buffer_sink();
        let other = Arc::clone(&sink);
        let t = std::thread::spawn(move || {
            for _ in 0..100 {
                other.write("ab").unwrap();
            }
        });
        for _ in 0..100 {
            sink.write("ab").unwrap();
        }
        t.join().unwrap();
        let out = sink.contents();
        assert_eq!(out.len(), 400);
        assert!(out.as_bytes().chunks(2).all(|c| c == b"ab"));
    }
}
