use sage_base::config::constants::STORED_KEY_MARKER;
use sage_base::config::{Config, ModelProfile, ProfileRemoval};

use crate::app::App;
use crate::ui::panels;

const ALIAS_PROMPT: &str = "Enter a profile name: ";

/// `alias → name [endpoint]`, tagging the active profile.
pub fn profile_lines(config: &Config) -> Vec<String> {
    config
        .models
        .iter()
        .map(|m| {
            let tag = if m.alias == config.active_model { " (active)" } else { "" };
            format!("{} → {} [{}]{}", m.alias, m.name, m.endpoint, tag)
        })
        .collect()
}

pub fn list(app: &mut App) {
    let lines = profile_lines(&app.config);
    app.print(&panels::list("Configured profiles:", &lines));
}

pub fn add(app: &mut App) {
    let Some(alias) = app.prompt("Profile name: ", false) else { return };
    let Some(name) = app.prompt("Model name: ", false) else { return };
    app.warn("Format: http://ipaddress:port/v1");
    let Some(endpoint) = app.prompt("API endpoint: ", false) else { return };

    let profile = ModelProfile { alias: alias.clone(), name, endpoint, api_key: STORED_KEY_MARKER.to_string() };
    if !app.config.add_profile(profile) {
        app.info(&format!("Profile '{}' already exists.", alias));
        return;
    }
    app.save_config();
    app.success(&format!("Profile '{}' added.", alias));
}

pub fn remove(app: &mut App) {
    list(app);
    let Some(alias) = app.prompt(ALIAS_PROMPT, false) else { return };

    match app.config.remove_profile(&alias) {
        ProfileRemoval::Removed => {
            app.save_config();
            app.success(&format!("Profile '{}' removed.", alias));
        }
        ProfileRemoval::Active => app.info("The active profile cannot be removed."),
        ProfileRemoval::Missing => app.info(&format!("No profile found under alias '{}'.", alias)),
    }
}

pub fn switch(app: &mut App) {
    list(app);
    let Some(alias) = app.prompt(ALIAS_PROMPT, false) else { return };

    match app.config.switch_profile(&alias) {
        Some(profile) => {
            app.save_config();
            app.success(&format!("Switched to: {} {}", profile.name, profile.endpoint));
        }
        None => app.info(&format!("No profile found under alias '{}'.", alias)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn active_profile_is_tagged() {
        let mut config = Config::default();
        config.add_profile(ModelProfile {
            alias: "remote".into(),
            name: "qwen".into(),
            endpoint: "http://10.0.0.2:8000/v1".into(),
            api_key: STORED_KEY_MARKER.into(),
        });
        let lines = profile_lines(&config);
        assert_eq!(lines[0], "default → Sage [http://localhost:8080/v1] (active)");
        assert_eq!(lines[1], "remote → qwen [http://10.0.0.2:8000/v1]");
    }
}
