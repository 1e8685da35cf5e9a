//! Log in and register this machine as a receiving device.

use anyhow::{Context, Result};
use push_client::{AuthHandshake, DeviceCredentials, LoginOutcome, PushClient, Transport};
use std::path::Path;

use crate::config::Config;
use crate::prompt::{prompt_line, prompt_secret, prompt_with_default};

/// Device name used when none is given.
pub const DEFAULT_DEVICE_NAME: &str = "push-cli";

/// Run the login command.
pub async fn run(config_path: &Path, device_name: Option<&str>) -> Result<()> {
    let mut config = Config::load(config_path).await?;

    config.app_token = prompt_with_default("Application token", &config.app_token)?;
    let email = prompt_line("Email")?;
    let password = prompt_secret("Password")?;
    let device_name = match device_name.map(str::trim) {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => DEFAULT_DEVICE_NAME.to_string(),
    };

    let client = config.client()?;
    let (device, user_key) = login_with(client, &email, &password, &device_name, || {
        prompt_line("Two-factor code")
    })
    .await?;

    apply_login(&mut config, device, &user_key, &device_name);
    config.save(config_path).await?;

    println!("{}", login_summary(&config));
    println!("  Config saved to {}", config_path.display());
    Ok(())
}

/// Run the handshake against `client`, asking for a two-factor code when
/// the service wants one. A rejected code is asked for once more.
///
/// Returns the device credentials and the account's user key.
pub async fn login_with<T, F>(
    client: PushClient<T>,
    email: &str,
    password: &str,
    device_name: &str,
    mut ask_code: F,
) -> Result<(DeviceCredentials, String)>
where
    T: Transport,
    F: FnMut() -> Result<String>,
{
    let mut handshake = AuthHandshake::new(client, email, password);

    let mut outcome = handshake.submit().await.context("Login failed")?;
    let mut tries = 0;
    while outcome == LoginOutcome::TwoFactorRequired {
        if tries == 2 {
            anyhow::bail!("two-factor code rejected");
        }
        tries += 1;
        let code = ask_code()?;
        outcome = handshake
            .submit_code(&code)
            .await
            .context("Login failed")?;
    }

    let user_key = handshake.user_key().unwrap_or_default().to_string();
    let device = handshake
        .register_device(device_name)
        .await
        .context("Device registration failed")?;
    Ok((device, user_key))
}

/// Store a completed login in the config.
pub fn apply_login(config: &mut Config, device: DeviceCredentials, user_key: &str, name: &str) {
    config.device_id = device.device_id;
    config.device_secret = device.device_secret;
    if config.user_key.trim().is_empty() && !user_key.is_empty() {
        config.user_key = user_key.to_string();
    }
    if config.default_device.trim().is_empty() {
        config.default_device = name.to_string();
    }
}

/// Success line naming the device id the service assigned.
pub fn login_summary(config: &Config) -> String {
    format!("✓ Logged in. Device \"{}\" registered.", config.device_id)
}
