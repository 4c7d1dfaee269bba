//! Per-run logger with file and callback output.
//!
//! Every archive run writes its own log file. Lines are also forwarded to
//! an optional callback, and stage details are held back in a bounded tail
//! that is replayed only when the run fails.

use std::collections::VecDeque;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::Local;
use parking_lot::Mutex;

use super::types::{LogCallback, LogConfig, LogLevel, MessagePrefix};

/// Writer side of a run logger, guarded by one lock.
struct Sink {
    file: Option<BufWriter<File>>,
    callback: Option<LogCallback>,
    tail: VecDeque<String>,
}

impl Sink {
    fn emit(&mut self, line: &str) {
        if let Some(file) = self.file.as_mut() {
            let _ = writeln!(file, "{}", line);
        }
        if let Some(callback) = self.callback.as_ref() {
            callback(line);
        }
    }
}

/// Logger owned by a single archive run.
pub struct RunLogger {
    path: PathBuf,
    config: LogConfig,
    sink: Mutex<Sink>,
}

impl RunLogger {
    /// Create `<log_dir>/<run_name>.log` and a logger writing to it.
    ///
    /// # Arguments
    /// * `run_name` - Run name, sanitized into the file name
    /// * `log_dir` - Directory for the log file (created if missing)
    /// * `config` - Level, compact mode, tail size and timestamps
    /// * `callback` - Optional receiver of every written line
    pub fn new(
        run_name: impl AsRef<str>,
        log_dir: impl AsRef<Path>,
        config: LogConfig,
        callback: Option<LogCallback>,
    ) -> std::io::Result<Self> {
        let log_dir = log_dir.as_ref();
        fs::create_dir_all(log_dir)?;

        let path = log_dir.join(format!("{}.log", sanitize_filename(run_name.as_ref())));
        let file = BufWriter::new(File::create(&path)?);

        Ok(Self {
            path,
            sink: Mutex::new(Sink {
                file: Some(file),
                callback,
                tail: VecDeque::with_capacity(config.error_tail),
            }),
            config,
        })
    }

    pub fn info(&self, message: &str) {
        self.write(LogLevel::Info, None, message);
    }

    pub fn debug(&self, message: &str) {
        self.write(LogLevel::Debug, None, message);
    }

    pub fn warn(&self, message: &str) {
        self.write(LogLevel::Warn, Some(MessagePrefix::Warning), message);
    }

    pub fn error(&self, message: &str) {
        self.write(LogLevel::Error, Some(MessagePrefix::Error), message);
    }

    /// `=== name ===` marker at the start of a pipeline step.
    pub fn phase(&self, name: &str) {
        self.write(LogLevel::Info, Some(MessagePrefix::Phase), name);
    }

    /// `--- name ---` marker inside a step.
    pub fn section(&self, name: &str) {
        self.write(LogLevel::Info, Some(MessagePrefix::Section), name);
    }

    pub fn success(&self, message: &str) {
        self.write(LogLevel::Info, Some(MessagePrefix::Success), message);
    }

    /// Record a stage detail line.
    ///
    /// The line always enters the tail. It is written immediately only in
    /// non-compact mode at debug level.
    pub fn detail(&self, line: &str) {
        let mut sink = self.sink.lock();
        if sink.tail.len() >= self.config.error_tail.max(1) {
            sink.tail.pop_front();
        }
        sink.tail.push_back(line.to_string());

        if !self.config.compact && self.config.level <= LogLevel::Debug {
            sink.emit(&self.stamp(line));
        }
    }

    /// Replay the tail under a `[header/tail]` line. Does nothing if empty.
    pub fn show_tail(&self, header: &str) {
        let mut sink = self.sink.lock();
        if sink.tail.is_empty() {
            return;
        }

        let lines: Vec<String> = std::iter::once(format!("[{}/tail]", header))
            .chain(sink.tail.iter().cloned())
            .map(|l| self.stamp(&l))
            .collect();
        for line in &lines {
            sink.emit(line);
        }
    }

    pub fn flush(&self) {
        if let Some(file) = self.sink.lock().file.as_mut() {
            let _ = file.flush();
        }
    }

    /// Close the log file and move it into `dir`, returning its new path.
    pub fn archive_to(&self, dir: impl AsRef<Path>) -> std::io::Result<PathBuf> {
        self.close();

        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;
        let target = match self.path.file_name() {
            Some(name) => dir.join(name),
            None => return Err(std::io::ErrorKind::InvalidInput.into()),
        };

        // Rename fails across filesystems
        if fs::rename(&self.path, &target).is_err() {
            fs::copy(&self.path, &target)?;
            fs::remove_file(&self.path)?;
        }

        Ok(target)
    }

    fn close(&self) {
        if let Some(mut file) = self.sink.lock().file.take() {
            let _ = file.flush();
        }
    }

    fn write(&self, level: LogLevel, prefix: Option<MessagePrefix>, message: &str) {
        if level < self.config.level {
            return;
        }

        let line = match prefix {
            Some(p) => self.stamp(&p.format(message)),
            None => self.stamp(message),
        };
        self.sink.lock().emit(&line);
    }

    fn stamp(&self, message: &str) -> String {
        if self.config.show_timestamps {
            format!("[{}] {}", Local::now().format("%H:%M:%S"), message)
        } else {
            message.to_string()
        }
    }
}

impl Drop for RunLogger {
    fn drop(&mut self) {
        self.close();
    }
}

/// Replace characters that are not allowed in file names.
fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            _ => c,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tempfile::tempdir;

    fn plain(level: LogLevel, compact: bool, error_tail: usize) -> LogConfig {
        LogConfig {
            level,
            compact,
            error_tail,
            show_timestamps: false,
        }
    }

    fn collecting() -> (Arc<Mutex<Vec<String>>>, LogCallback) {
        let lines = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&lines);
        let callback: LogCallback = Box::new(move |l: &str| sink.lock().push(l.to_string()));
        (lines, callback)
    }

    #[test]
    fn writes_markers_to_file() {
        let dir = tempdir().unwrap();
        let logger = RunLogger::new("XB.ELYSE", dir.path(), LogConfig::default(), None).unwrap();

        logger.phase("Preprocess");
        logger.info("Retained 18 of 20 windows");
        logger.flush();

        let content = fs::read_to_string(dir.path().join("XB.ELYSE.log")).unwrap();
        assert!(content.contains("=== Preprocess ==="));
        assert!(content.contains("Retained 18 of 20 windows"));
    }

    #[test]
    fn level_filters_messages() {
        let dir = tempdir().unwrap();
        let logger =
            RunLogger::new("run", dir.path(), plain(LogLevel::Warn, true, 5), None).unwrap();

        logger.info("hidden");
        logger.warn("shown");
        logger.flush();

        let content = fs::read_to_string(dir.path().join("run.log")).unwrap();
        assert_eq!(content, "[WARNING] shown\n");
    }

    #[test]
    fn calls_callback() {
        let dir = tempdir().unwrap();
        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);
        let callback: LogCallback = Box::new(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let logger =
            RunLogger::new("run", dir.path(), LogConfig::default(), Some(callback)).unwrap();
        logger.info("Message 1");
        logger.success("Message 2");

        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn compact_details_only_appear_in_tail() {
        let dir = tempdir().unwrap();
        let (lines, callback) = collecting();
        let logger =
            RunLogger::new("run", dir.path(), plain(LogLevel::Debug, true, 5), Some(callback))
                .unwrap();

        logger.detail("cluster 0: 12 members");
        assert!(lines.lock().is_empty());

        logger.show_tail("Segment");
        assert_eq!(
            *lines.lock(),
            vec!["[Segment/tail]".to_string(), "cluster 0: 12 members".to_string()]
        );
    }

    #[test]
    fn verbose_details_are_written_immediately() {
        let dir = tempdir().unwrap();
        let (lines, callback) = collecting();
        let logger =
            RunLogger::new("run", dir.path(), plain(LogLevel::Debug, false, 5), Some(callback))
                .unwrap();

        logger.detail("window 3 rejected");

        assert_eq!(*lines.lock(), vec!["window 3 rejected".to_string()]);
    }

    #[test]
    fn tail_keeps_most_recent_lines() {
        let dir = tempdir().unwrap();
        let (lines, callback) = collecting();
        let logger =
            RunLogger::new("run", dir.path(), plain(LogLevel::Info, true, 3), Some(callback))
                .unwrap();

        for i in 0..10 {
            logger.detail(&format!("Line {}", i));
        }
        logger.show_tail("Drift");

        assert_eq!(
            *lines.lock(),
            vec!["[Drift/tail]", "Line 7", "Line 8", "Line 9"]
        );
    }

    #[test]
    fn empty_tail_shows_nothing() {
        let dir = tempdir().unwrap();
        let (lines, callback) = collecting();
        let logger =
            RunLogger::new("run", dir.path(), LogConfig::default(), Some(callback)).unwrap();

        logger.show_tail("Export");

        assert!(lines.lock().is_empty());
    }

    #[test]
    fn archive_moves_log() {
        let dir = tempdir().unwrap();
        let logs = dir.path().join("logs");
        let out = dir.path().join("out");
        let logger = RunLogger::new("run", &logs, LogConfig::default(), None).unwrap();
        logger.info("done");

        let archived = logger.archive_to(&out).unwrap();

        assert_eq!(archived, out.join("run.log"));
        assert!(!logs.join("run.log").exists());
        assert!(fs::read_to_string(&archived).unwrap().contains("done"));
    }

    #[test]
    fn sanitizes_filename() {
        assert_eq!(sanitize_filename("XB.ELYSE"), "XB.ELYSE");
        assert_eq!(sanitize_filename("has/slash"), "has_slash");
        assert_eq!(sanitize_filename("a<b>c"), "a_b_c");
    }
}
