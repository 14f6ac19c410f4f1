use std::env;

use sage_base::config::constants::MIN_REFRESH_RATE;

use crate::app::App;
use crate::ui::highlight::{theme_exists, theme_names};
use crate::ui::panels;

/// Parse a positive integer no smaller than `min`.
pub fn parse_at_least(input: &str, min: u64) -> Option<u64> {
    input.trim().parse::<u64>().ok().filter(|v| *v >= min)
}

pub fn show(app: &mut App) {
    let cwd = env::current_dir().unwrap_or_default();
    let panel = panels::settings(&app.config, &app.dirs, &cwd);
    app.print(&panel);
}

pub fn system_prompt(app: &mut App) {
    let Some(prompt) = app.prompt("Enter a system prompt: ", true) else { return };
    app.config.system_prompt = prompt.clone();
    app.save_config();
    app.success(&format!("System prompt updated to: {}", prompt));
    app.info("Use !reset to start a session with the new prompt. Be sure to !save first, if desired.");
}

pub fn context_length(app: &mut App) {
    let Some(input) = app.prompt("Enter a max context length: ", false) else { return };
    let Some(value) = parse_at_least(&input, 1) else {
        app.show_error("VALUE ERROR", "Please enter a positive number.");
        return;
    };
    app.config.context_length = value as usize;
    app.save_config();
    app.success(&format!("Context length set to: {}", value));
}

pub fn refresh_rate(app: &mut App) {
    let Some(input) = app.prompt("Enter a refresh rate: ", false) else { return };
    let Some(value) = parse_at_least(&input, MIN_REFRESH_RATE as u64).and_then(|v| u32::try_from(v).ok()) else {
        app.show_error("VALUE ERROR", &format!("Please enter a positive number ≥ {}.", MIN_REFRESH_RATE));
        return;
    };
    app.config.refresh_rate = value;
    app.save_config();
    app.success(&format!("Refresh rate set to: {}", value));
}

pub fn code_theme(app: &mut App) {
    let Some(theme) = app.prompt("Enter a valid theme name: ", false) else { return };
    if !theme_exists(&theme) {
        let known = theme_names().join(", ");
        app.show_error("VALUE ERROR", &format!("Unknown theme '{}'. Available: {}", theme, known));
        return;
    }
    app.config.code_theme = theme.clone();
    app.console.set_code_theme(&theme);
    app.save_config();
    app.success(&format!("Your theme has been set to: {}", theme));
}

pub fn toggle_consume(app: &mut App) {
    app.config.reasoning_panel_consume = !app.config.reasoning_panel_consume;
    app.save_config();
    if app.config.reasoning_panel_consume {
        app.success("Reasoning panel consumption toggled on.");
    } else {
        app.fail("Reasoning panel consumption toggled off.");
    }
}

/// The key lives only in memory for the rest of the process.
pub fn api_key(app: &mut App) {
    let Some(key) = app.prompt("Enter an API key: ", false) else { return };
    app.set_api_key(key);
    app.success("API key updated for this session.");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_bounds() {
        assert_eq!(parse_at_least("4", 4), Some(4));
        assert_eq!(parse_at_least(" 120 ", 4), Some(120));
        assert_eq!(parse_at_least("3", 4), None);
        assert_eq!(parse_at_least("0", 1), None);
        assert_eq!(parse_at_least("-5", 1), None);
        assert_eq!(parse_at_least("ten", 1), None);
    }
}
