use std::collections::BTreeMap;

use anyhow::{bail, Context};
use clap::Parser;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tradewatch_core::catalog;
use tradewatch_core::domain::setup::GenerationRequest;

#[derive(Debug, Parser)]
#[command(name = "tradewatch_cli")]
struct Args {
    /// Trigger id from the catalog (see --list-triggers).
    #[arg(long)]
    trigger: Option<String>,

    /// Ticker symbol for the payload preview. Uppercased before embedding.
    #[arg(long)]
    ticker: Option<String>,

    /// Trigger parameter override as NAME=VALUE. May be repeated.
    #[arg(long = "set", value_name = "NAME=VALUE")]
    set: Vec<String>,

    /// Print the trigger catalog and exit.
    #[arg(long)]
    list_triggers: bool,

    /// Emit one JSON object instead of the two text blocks.
    #[arg(long)]
    json: bool,
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = tradewatch_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();

    if args.list_triggers {
        for def in catalog::catalog() {
            println!("{:<18} {}", def.id, def.explanation);
        }
        return Ok(());
    }

    let Some(trigger) = args.trigger else {
        bail!("--trigger is required (use --list-triggers to see the catalog)");
    };

    let mut params = BTreeMap::new();
    for pair in &args.set {
        let (name, value) = parse_set(pair).with_context(|| format!("invalid --set {pair:?}"))?;
        params.insert(name, value);
    }

    let request = GenerationRequest {
        trigger,
        ticker: args.ticker,
        params,
    };

    let result = match catalog::generate(&request) {
        Ok(result) => result,
        Err(err) => {
            let err = anyhow::Error::new(err);
            sentry_anyhow::capture_anyhow(&err);
            return Err(err);
        }
    };

    tracing::debug!(trigger = %request.trigger, "generated trade watch setup");

    if args.json {
        println!(
            "{}",
            serde_json::json!({ "script": result.script, "payload": result.payload })
        );
    } else {
        println!("{}", result.script);
        println!("{}", result.payload);
    }

    Ok(())
}

fn parse_set(pair: &str) -> anyhow::Result<(String, serde_json::Value)> {
    let (name, value) = pair.split_once('=').context("expected NAME=VALUE")?;
    let name = name.trim();
    anyhow::ensure!(!name.is_empty(), "parameter name must be non-empty");

    // Numeric overrides travel as numbers so integer params resolve; anything
    // else stays a string.
    let value = match value.trim().parse::<i64>() {
        Ok(n) => serde_json::Value::from(n),
        Err(_) => serde_json::Value::from(value.trim()),
    };

    Ok((name.to_string(), value))
}

fn init_sentry(settings: &tradewatch_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_numeric_and_text_overrides() {
        let (name, value) = parse_set("lookback=50").unwrap();
        assert_eq!(name, "lookback");
        assert_eq!(value, serde_json::json!(50));

        let (name, value) = parse_set("basis=Close").unwrap();
        assert_eq!(name, "basis");
        assert_eq!(value, serde_json::json!("Close"));
    }

    #[test]
    fn rejects_pairs_without_a_value() {
        assert!(parse_set("lookback").is_err());
        assert!(parse_set("=50").is_err());
    }
}
