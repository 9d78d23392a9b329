//! fin-analyze: run one analysis over a directory of snapshot JSON files and
//! print the result as pretty JSON.
//!
//! Usage:
//!   fin-analyze summary  --code 2330 --period 2023Q3
//!   fin-analyze trend    --code 2330 [--periods 2023Q1 2023Q2 2023Q3]
//!   fin-analyze peers    --period 2023Q3 --peers 2330 2303 2454 [--metrics roe debt_ratio]
//!   fin-analyze factors  --code 2330 --period 2023Q3 [--peers 2303 2454 3711]
//!   fin-analyze earnings --code 2330 --period 2023Q3
//!   fin-analyze roic     --code 2330 --period 2023Q3 [--beta 1.2] [--tax-rate 0.2] [--cost-of-debt 0.04]
//!   fin-analyze warnings --code 2330 --period 2023Q3
//!   fin-analyze allocation --code 2330 --period 2023Q3 --inputs allocation.json
//!   fin-analyze management --inputs management.json
//!   fin-analyze periods  --code 2330
//!   fin-analyze stocks
//!
//! `--data-dir` overrides FINANCIAL_DATA_PATH (default ./data/financial_reports).

use analysis_core::EngineConfig;
use analysis_orchestrator::FinancialAnalysisService;
use anyhow::{bail, Context};
use chrono::{DateTime, Utc};
use fundamental_analysis::{AllocationInputs, CapitalOverrides, PeerMetric};
use quality_scoring::ManagementInputs;
use serde::de::DeserializeOwned;
use serde::Serialize;
use snapshot_store::JsonSnapshotStore;
use std::path::PathBuf;

const DEFAULT_DATA_DIR: &str = "./data/financial_reports";

const USAGE: &str = "usage: fin-analyze <summary|trend|peers|factors|earnings|roic|warnings|allocation|management|periods|stocks> \
[--code CODE] [--period PERIOD] [--peers CODE...] [--data-dir DIR]";

#[derive(Serialize)]
struct Envelope {
    command: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    stock_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    period: Option<String>,
    generated_at: DateTime<Utc>,
    result: serde_json::Value,
}

/// Value following `flag`, if any.
fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .filter(|v| !v.starts_with("--"))
        .map(|s| s.as_str())
}

/// Every value after `flag` up to the next flag.
fn flag_values(args: &[String], flag: &str) -> Option<Vec<String>> {
    let start = args.iter().position(|a| a == flag)? + 1;
    Some(
        args[start..]
            .iter()
            .take_while(|a| !a.starts_with("--"))
            .cloned()
            .collect(),
    )
}

fn parse_f64(args: &[String], flag: &str) -> anyhow::Result<Option<f64>> {
    flag_value(args, flag)
        .map(|v| v.parse::<f64>().with_context(|| format!("{} expects a number, got {}", flag, v)))
        .transpose()
}

fn read_json<T: DeserializeOwned>(args: &[String]) -> anyhow::Result<T> {
    let path = flag_value(args, "--inputs").context("--inputs FILE is required")?;
    let raw = std::fs::read_to_string(path).with_context(|| format!("reading {}", path))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing {}", path))
}

fn to_json<T: Serialize>(value: T) -> anyhow::Result<serde_json::Value> {
    Ok(serde_json::to_value(value)?)
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fin_analyze=info,analysis_orchestrator=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();
    let command = match args.get(1) {
        Some(c) if !c.starts_with("--") => c.clone(),
        _ => {
            eprintln!("{}", USAGE);
            return Ok(());
        }
    };

    let data_dir: PathBuf = flag_value(&args, "--data-dir")
        .map(PathBuf::from)
        .or_else(|| std::env::var("FINANCIAL_DATA_PATH").ok().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));

    let config = EngineConfig::from_env();
    config.validate()?;

    let store = JsonSnapshotStore::open(&data_dir)?;
    tracing::info!("Reading snapshots from {}", data_dir.display());
    let service = FinancialAnalysisService::new(store, config);

    let code = flag_value(&args, "--code");
    let period = flag_value(&args, "--period");
    let require_code = || code.context("--code is required");
    let require_period = || period.context("--period is required");

    let result = match command.as_str() {
        "summary" => to_json(service.summary(require_code()?, require_period()?)?)?,
        "trend" => {
            let periods = flag_values(&args, "--periods");
            to_json(service.trend(require_code()?, periods.as_deref())?)?
        }
        "peers" => {
            let peers = flag_values(&args, "--peers").context("--peers CODE... is required")?;
            let metrics = match flag_values(&args, "--metrics") {
                Some(names) => Some(
                    names
                        .iter()
                        .map(|n| PeerMetric::parse(n).with_context(|| format!("unknown metric {}", n)))
                        .collect::<anyhow::Result<Vec<_>>>()?,
                ),
                None => None,
            };
            to_json(service.compare_peers(&peers, require_period()?, metrics.as_deref())?)?
        }
        "factors" => {
            let peers = flag_values(&args, "--peers");
            to_json(service.factor_exposures(require_code()?, require_period()?, peers.as_deref())?)?
        }
        "earnings" => {
            let history = flag_values(&args, "--periods");
            to_json(service.earnings_quality(require_code()?, require_period()?, history.as_deref())?)?
        }
        "roic" => {
            let overrides = CapitalOverrides {
                beta: parse_f64(&args, "--beta")?,
                cost_of_debt: parse_f64(&args, "--cost-of-debt")?,
                tax_rate: parse_f64(&args, "--tax-rate")?,
            };
            to_json(service.roic_wacc(require_code()?, require_period()?, &overrides)?)?
        }
        "warnings" => {
            let history = flag_values(&args, "--periods");
            to_json(service.early_warnings(require_code()?, require_period()?, history.as_deref())?)?
        }
        "allocation" => {
            let inputs: AllocationInputs = read_json(&args)?;
            to_json(service.capital_allocation(require_code()?, require_period()?, &inputs)?)?
        }
        "management" => {
            let inputs: ManagementInputs = read_json(&args)?;
            to_json(service.management_score(&inputs))?
        }
        "periods" => to_json(service.list_periods(require_code()?))?,
        "stocks" => to_json(service.list_stocks())?,
        other => bail!("unknown command {}\n{}", other, USAGE),
    };

    let envelope = Envelope {
        command,
        stock_code: code.map(str::to_string),
        period: period.map(str::to_string),
        generated_at: Utc::now(),
        result,
    };
    println!("{}", serde_json::to_string_pretty(&envelope)?);
    Ok(())
}
