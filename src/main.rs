mod app;
mod constants;
mod infra;
mod ingest;
mod llms;
mod stream;
mod ui;

use std::io::{self, IsTerminal, Read};
use std::process::ExitCode;

use crossterm::ExecutableCommand;
use crossterm::event::{DisableBracketedPaste, EnableBracketedPaste};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};

use sage_base::config::{AppDirs, Config};

use app::App;
use infra::logging::{install_panic_hook, log_error};

/// Wrap piped stdin as the first turn, with the command line as the query.
fn piped_turn(content: &str, args: &[String]) -> Option<String> {
    let content = content.trim();
    if content.is_empty() {
        return None;
    }
    let mut wrapped = format!("[PIPED CONTENT]\n{}", content);
    if !args.is_empty() {
        wrapped.push_str(&format!("\n\n[USER QUERY]\n{}", args.join(" ")));
    }
    Some(wrapped)
}

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();

    let piped = if io::stdin().is_terminal() {
        None
    } else {
        let mut buf = String::new();
        let _ = io::stdin().read_to_string(&mut buf);
        piped_turn(&buf, &args)
    };

    let dirs = AppDirs::resolve();
    if let Err(e) = dirs.ensure() {
        eprintln!("CRITICAL ERROR: cannot create {}: {}", dirs.root.display(), e);
        return ExitCode::FAILURE;
    }

    install_panic_hook(dirs.logs_dir.clone());

    let config = match Config::load(&dirs.settings_file()) {
        Ok((config, warnings)) => {
            for warning in warnings {
                eprintln!("Warning: {}", warning);
            }
            config
        }
        Err(e) => {
            let path = log_error(&dirs.logs_dir, "Loading settings", &e.to_string());
            eprintln!("Warning: {} (using defaults, see {})", e, path.display());
            Config::default()
        }
    };

    // Raw mode goes through the controlling terminal, so it also works with piped stdin
    let interactive = enable_raw_mode().is_ok();
    if interactive {
        let _ = io::stdout().execute(EnableBracketedPaste);
    }

    let mut app = App::new(config, dirs, interactive);
    app.run(piped);
    app.save_config();

    if interactive {
        let _ = io::stdout().execute(DisableBracketedPaste);
        let _ = disable_raw_mode();
    }
    ExitCode::SUCCESS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn piped_content_with_query() {
        let args = vec!["explain".to_string(), "this".to_string()];
        assert_eq!(
            piped_turn("  fn main() {}\n", &args).as_deref(),
            Some("[PIPED CONTENT]\nfn main() {}\n\n[USER QUERY]\nexplain this")
        );
    }

    #[test]
    fn piped_content_alone() {
        assert_eq!(piped_turn("log line", &[]).as_deref(), Some("[PIPED CONTENT]\nlog line"));
        assert_eq!(piped_turn(" \n ", &[]), None);
    }
}
