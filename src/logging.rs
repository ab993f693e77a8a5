use std::{fs, fs::File, path::PathBuf};

use simplelog::{ConfigBuilder, LevelFilter, WriteLogger};

use crate::config::APP_DIR;

const LOG_FILE: &str = "markdown-editor.log";

/// Starts the file logger. Runs without logging if the file can't be created.
pub fn init(level: LevelFilter) {
    let Some(path) = log_file_path() else {
        return;
    };

    if let Some(parent) = path.parent() {
        if fs::create_dir_all(parent).is_err() {
            return;
        }
    }

    let log_config = ConfigBuilder::new().set_time_format_rfc3339().build();

    if let Ok(log_file) = File::create(&path) {
        let _ = WriteLogger::init(level, log_config, log_file);
    }
}

fn log_file_path() -> Option<PathBuf> {
    let mut path = dirs::cache_dir().or_else(dirs::home_dir)?;
    path.push(APP_DIR);
    path.push(LOG_FILE);
    Some(path)
}
