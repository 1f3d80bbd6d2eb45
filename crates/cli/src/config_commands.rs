use std::path::Path;

use {
    anyhow::Result,
    herald_channels::{AppAllowlist, ChannelStatus},
    herald_config::validate::{self, Severity},
    herald_gotify::{GotifyClient, NotificationSource},
    herald_telegram::{TelegramConfig, TelegramOutbound, build_bot},
};

/// ANSI color codes.
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const GREEN: &str = "\x1b[32m";
const CYAN: &str = "\x1b[36m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

/// Validate the config file, then probe Gotify (and Telegram, if configured).
pub async fn check(config_path: Option<&Path>, verbose: bool) -> Result<()> {
    let result = validate::validate(config_path);

    if let Some(ref path) = result.config_path {
        eprintln!("Checking {}\n", path.display());
    } else {
        eprintln!("No config file found; checking defaults.\n");
    }

    let mut shown = 0;
    for d in &result.diagnostics {
        if d.severity == Severity::Info && !verbose {
            continue;
        }

        let (color, label) = match d.severity {
            Severity::Error => (RED, "error"),
            Severity::Warning => (YELLOW, "warning"),
            Severity::Info => (CYAN, "info"),
        };

        if d.path.is_empty() {
            eprintln!("  {BOLD}{color}{label}{RESET} {}", d.message);
        } else {
            eprintln!("  {BOLD}{color}{label}{RESET} {}: {}", d.path, d.message);
        }
        shown += 1;
    }

    let errors = result.count(Severity::Error);
    let warnings = result.count(Severity::Warning);

    if shown > 0 {
        eprintln!();
    }

    if errors == 0 && warnings == 0 {
        eprintln!("No issues found.");
    } else {
        eprintln!("{errors} error(s), {warnings} warning(s)");
    }

    if errors > 0 {
        std::process::exit(1);
    }

    let (config, _) = crate::load_config(config_path)?;
    eprintln!();
    probe_gotify(&config).await?;
    if let Some(raw) = config.channels.telegram.clone() {
        probe_telegram(TelegramConfig::from_value(raw)?).await?;
    }
    Ok(())
}

async fn probe_gotify(config: &herald_config::HeraldConfig) -> Result<()> {
    let client = GotifyClient::new(&config.gotify.server, config.gotify.token.clone())?;

    match client.health().await {
        Ok(h) if h.is_green() => eprintln!("  {GREEN}gotify{RESET} {} is healthy", client.base_url()),
        Ok(h) => eprintln!(
            "  {YELLOW}gotify{RESET} {} reports health={} database={}",
            client.base_url(),
            h.health,
            h.database
        ),
        Err(e) => {
            eprintln!("  {RED}gotify{RESET} {} unreachable: {e}", client.base_url());
            std::process::exit(1);
        },
    }

    let allowlist = AppAllowlist::new(config.applications.iter().cloned());
    let apps = match client.fetch_applications().await {
        Ok(apps) => apps,
        Err(e) => {
            eprintln!("  {RED}gotify{RESET} failed to list applications: {e}");
            std::process::exit(1);
        },
    };

    eprintln!("\nApplications ({}):", apps.len());
    for app in &apps {
        let name = app.display_name().unwrap_or("<unnamed>");
        let forwarded = app.display_name().is_some_and(|n| allowlist.is_allowed(n));
        let mark = if forwarded { "forwarded" } else { "ignored" };
        eprintln!("  [{:>4}] {name} ({mark})", app.id);
    }

    for wanted in &config.applications {
        if !apps.iter().any(|a| a.display_name() == Some(wanted.as_str())) {
            eprintln!("  {YELLOW}warning{RESET} monitored application {wanted:?} does not exist on the server");
        }
    }
    Ok(())
}

async fn probe_telegram(config: TelegramConfig) -> Result<()> {
    let outbound = TelegramOutbound::new(build_bot(&config)?);
    let snapshot = outbound.probe().await?;
    let details = snapshot.details.unwrap_or_default();
    if snapshot.connected {
        eprintln!("\n  {GREEN}telegram{RESET} {details}");
    } else {
        eprintln!("\n  {RED}telegram{RESET} {details}");
    }
    Ok(())
}

/// Print the destinations registered in the config.
pub fn destinations(config_path: Option<&Path>) -> Result<()> {
    let (config, path) = crate::load_config(config_path)?;
    if config.destinations.is_empty() {
        eprintln!(
            "No destinations registered in {}. Send /gotify_register to the bot or run `herald register <chat id>`.",
            path.display()
        );
        return Ok(());
    }
    for d in &config.destinations {
        println!("{d}");
    }
    Ok(())
}
