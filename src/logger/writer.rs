//! File sink for the file layer.

use std::fs::{File, OpenOptions};
use std::path::Path;
use std::sync::Mutex;

use crate::logger::{FileConfig, LoggerError};

/// Opens the configured log file, creating parent directories.
///
/// `Mutex<File>` is a `MakeWriter`, so the result plugs straight into
/// `fmt::layer().with_writer(..)`.
pub(crate) fn open_log_writer(config: &FileConfig) -> Result<Mutex<File>, LoggerError> {
    match config.path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => std::fs::create_dir_all(parent)?,
        _ => {}
    }

    Ok(Mutex::new(open_log_file(&config.path, config.append)?))
}

fn open_log_file(path: &Path, append: bool) -> std::io::Result<File> {
    let mut options = OpenOptions::new();
    options.create(true);
    if append {
        options.append(true);
    } else {
        options.write(true).truncate(true);
    }
    options.open(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logger::LogFormat;
    use std::io::Write;
    use tempfile::TempDir;

    fn file_config(dir: &TempDir, append: bool) -> FileConfig {
        FileConfig {
            enabled: true,
            path: dir.path().join("nested").join("ledger.log"),
            append,
            format: LogFormat::Compact,
        }
    }

    #[test]
    fn test_creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        let config = file_config(&dir, true);
        open_log_writer(&config).unwrap();
        assert!(config.path.exists());
    }

    #[test]
    fn test_append_keeps_previous_content() {
        let dir = TempDir::new().unwrap();
        let config = file_config(&dir, true);

        for line in ["first\n", "second\n"] {
            let writer = open_log_writer(&config).unwrap();
            writer.lock().unwrap().write_all(line.as_bytes()).unwrap();
        }

        let content = std::fs::read_to_string(&config.path).unwrap();
        assert_eq!(content, "first\nsecond\n");
    }

    #[test]
    fn test_truncate_when_not_appending() {
        let dir = TempDir::new().unwrap();
        let config = file_config(&dir, false);

        for line in ["first\n", "second\n"] {
            let writer = open_log_writer(&config).unwrap();
            writer.lock().unwrap().write_all(line.as_bytes()).unwrap();
        }

        let content = std::fs::read_to_string(&config.path).unwrap();
        assert_eq!(content, "second\n");
    }
}
