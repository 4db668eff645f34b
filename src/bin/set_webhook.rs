//! Webhook registration tool.
//!
//! Reads the bot token and public webhook URL from `config.toml` (or the
//! path given as first argument), registers the webhook with Telegram, then
//! prints the webhook status and the bot identity.
//!
//! `--url <https://host/path>` overrides the configured URL. A URL without a
//! path gets `server.webhook_path` appended.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use teloxide::prelude::*;
use url::Url;

const TOKEN_ENV: &str = "TELEGRAM_BOT_TOKEN";
const DEFAULT_WEBHOOK_PATH: &str = "/webhook";

// ── Raw TOML parse structs (only the fields this tool needs) ──────────────────

#[derive(Deserialize, Default)]
struct RawConfig {
    telegram: Option<RawTelegram>,
    server: Option<RawServer>,
}

#[derive(Deserialize, Default)]
struct RawTelegram {
    bot_token: Option<String>,
    webhook_url: Option<String>,
}

#[derive(Deserialize, Default)]
struct RawServer {
    webhook_path: Option<String>,
}

struct Settings {
    bot_token: String,
    webhook_url: Option<String>,
    webhook_path: String,
}

fn read_settings(path: &Path, env_token: Option<String>) -> Result<Settings> {
    let raw: RawConfig = if path.exists() {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Could not read {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("Invalid TOML in {}", path.display()))?
    } else {
        RawConfig::default()
    };
    settings_from(raw, env_token)
}

fn settings_from(raw: RawConfig, env_token: Option<String>) -> Result<Settings> {
    let telegram = raw.telegram.unwrap_or_default();
    let bot_token = env_token
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .or(telegram.bot_token)
        .filter(|t| !t.trim().is_empty())
        .with_context(|| format!("No bot token: set [telegram] bot_token or {TOKEN_ENV}"))?;

    Ok(Settings {
        bot_token,
        webhook_url: telegram.webhook_url.filter(|u| !u.trim().is_empty()),
        webhook_path: raw
            .server
            .and_then(|s| s.webhook_path)
            .unwrap_or_else(|| DEFAULT_WEBHOOK_PATH.to_string()),
    })
}

/// Pick the URL to register: the CLI override wins over the config file.
fn resolve_webhook_url(
    cli_url: Option<&str>,
    configured: Option<&str>,
    webhook_path: &str,
) -> Result<Url> {
    let raw = cli_url
        .or(configured)
        .context("No webhook URL: set [telegram] webhook_url or pass --url")?;
    let mut url = Url::parse(raw).with_context(|| format!("Invalid webhook URL: {raw}"))?;
    if url.scheme() != "https" {
        anyhow::bail!("Telegram requires an https webhook URL, got {raw}");
    }
    if url.path() == "/" {
        url.set_path(webhook_path);
    }
    Ok(url)
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .map(String::as_str)
}

fn config_path(args: &[String]) -> PathBuf {
    let mut rest = args.iter().skip(1);
    while let Some(arg) = rest.next() {
        if arg == "--url" {
            rest.next();
        } else if !arg.starts_with("--") {
            return PathBuf::from(arg);
        }
    }
    PathBuf::from("config.toml")
}

// ── Entry point ────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let path = config_path(&args);
    let settings = read_settings(&path, std::env::var(TOKEN_ENV).ok())?;
    let url = resolve_webhook_url(
        flag_value(&args, "--url"),
        settings.webhook_url.as_deref(),
        &settings.webhook_path,
    )?;

    let bot = Bot::new(&settings.bot_token);

    println!("Setting webhook to: {url}");
    match bot.set_webhook(url).await {
        Ok(_) => println!("✅ Webhook set successfully!"),
        Err(e) => println!("❌ Failed to set webhook\nError: {e}"),
    }

    println!("\n--- Webhook Information ---");
    let info = bot
        .get_webhook_info()
        .await
        .context("getWebhookInfo failed")?;
    println!(
        "URL: {}",
        info.url.map_or_else(|| "Not set".to_string(), |u| u.to_string())
    );
    println!(
        "Has custom certificate: {}",
        if info.has_custom_certificate { "Yes" } else { "No" }
    );
    println!("Pending update count: {}", info.pending_update_count);
    println!(
        "Last error date: {}",
        info.last_error_date
            .map_or_else(|| "None".to_string(), |d| d.to_string())
    );
    println!(
        "Last error message: {}",
        info.last_error_message.as_deref().unwrap_or("None")
    );

    println!("\n--- Bot Information ---");
    let me = bot.get_me().await.context("getMe failed")?;
    println!("Bot username: @{}", me.username());
    println!("Bot name: {}", me.user.first_name);
    println!("Bot ID: {}", me.user.id);

    Ok(())
}

// ── Tests ──────────────────────────────────────────────────────────────────────
