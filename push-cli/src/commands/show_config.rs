//! Show the current configuration.

use anyhow::Result;
use std::path::Path;

use crate::config::Config;
use crate::prompt::mask;

/// Run the config command.
pub async fn run(config_path: &Path) -> Result<()> {
    let config = Config::load(config_path).await?;
    println!("{}", render(config_path, &config));
    Ok(())
}

/// Render the config with secrets masked.
pub fn render(config_path: &Path, config: &Config) -> String {
    let or_unset = |v: &str| {
        if v.trim().is_empty() {
            "(not set)".to_string()
        } else {
            v.to_string()
        }
    };

    let mut lines = vec![
        format!("Config file:      {}", config_path.display()),
        format!("App token:        {}", mask(config.app_token.trim())),
        format!("User key:         {}", mask(config.user_key.trim())),
        format!("Device id:        {}", or_unset(&config.device_id)),
        format!("Device secret:    {}", mask(config.device_secret.trim())),
        format!("Default device:   {}", or_unset(&config.default_device)),
        format!("Default priority: {}", config.default_priority()),
    ];
    if let Some(url) = &config.base_url {
        lines.push(format!("API base URL:     {url}"));
    }
    lines.join("\n")
}
