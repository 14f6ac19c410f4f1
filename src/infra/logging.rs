//! Numbered error logs and the panic hook.
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::Local;
use crossterm::event::DisableBracketedPaste;
use crossterm::execute;
use crossterm::terminal::disable_raw_mode;

const PANIC_LOG: &str = "panic.log";

/// Write `error` with a context line to the next `error_{n}.txt` in
/// `logs_dir`. Returns the path written, even when the write failed.
pub fn log_error(logs_dir: &Path, context: &str, error: &str) -> PathBuf {
    fs::create_dir_all(logs_dir).ok();

    // Count existing error files to determine next number
    let error_count = fs::read_dir(logs_dir)
        .map(|entries| {
            entries
                .filter_map(|e| e.ok())
                .filter(|e| e.file_name().to_string_lossy().starts_with("error_"))
                .count()
        })
        .unwrap_or(0);

    let error_num = error_count + 1;
    let filepath = logs_dir.join(format!("error_{}.txt", error_num));

    let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S");
    let content = format!(
        "Error Log #{}\n\
         Timestamp: {}\n\
         Context: {}\n\
         \n\
         Error Details:\n\
         {}\n",
        error_num, timestamp, context, error
    );

    fs::write(&filepath, content).ok();
    filepath
}

/// Restore the terminal and append the panic with a backtrace to
/// `logs_dir/panic.log` before the default hook runs.
pub fn install_panic_hook(logs_dir: PathBuf) {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), DisableBracketedPaste);

        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S");
        let backtrace = std::backtrace::Backtrace::force_capture();
        let msg = format!("[{}] {}\n\n{}\n\n---\n", timestamp, info, backtrace);
        let _ = fs::create_dir_all(&logs_dir);
        let _ = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(logs_dir.join(PANIC_LOG))
            .and_then(|mut f| f.write_all(msg.as_bytes()));

        default_hook(info);
    }));
}
