//! Forget the registered device.

use anyhow::Result;
use std::path::Path;

use crate::config::Config;

/// Run the logout command.
pub async fn run(config_path: &Path) -> Result<()> {
    let mut config = Config::load(config_path).await?;
    if !config.has_device() {
        println!("Not logged in.");
        return Ok(());
    }

    config.clear_device();
    config.save(config_path).await?;

    println!("✓ Logged out. Device credentials removed.");
    Ok(())
}
