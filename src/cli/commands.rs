use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::Value;
use tracing::debug;

use crate::spec::{load_contract, Route};
use crate::validator::{
    coerce_string_map, query_object, validate, RequestPart, ValidationOutcome,
};

/// Command-line interface for contract-router
///
/// Inspects contract documents and runs the validator adapter on sample data.
#[derive(Parser, Debug)]
#[command(name = "contract-router")]
#[command(about = "Contract router developer tool", long_about = None, version)]
pub struct Cli {
    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Request part selectable on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PartArg {
    Params,
    Headers,
    Query,
    Body,
}

impl From<PartArg> for RequestPart {
    fn from(part: PartArg) -> Self {
        match part {
            PartArg::Params => RequestPart::PathParams,
            PartArg::Headers => RequestPart::Headers,
            PartArg::Query => RequestPart::Query,
            PartArg::Body => RequestPart::Body,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the flattened route table of a contract
    Routes {
        /// Path to the contract document (YAML or JSON)
        #[arg(short, long, env = "CONTRACT_FILE")]
        contract: PathBuf,
    },
    /// Validate a JSON value against one part of a route
    Validate {
        /// Path to the contract document (YAML or JSON)
        #[arg(short, long, env = "CONTRACT_FILE")]
        contract: PathBuf,

        /// Dotted route key, e.g. `pets.get`
        #[arg(short, long)]
        route: String,

        /// Which part of the request the data represents
        #[arg(short, long, value_enum)]
        part: PartArg,

        /// The value to validate, as JSON
        #[arg(short, long)]
        data: String,

        /// JSON-decode query values first (only with `--part query`)
        #[arg(long, default_value_t = false)]
        json_query: bool,
    },
}

/// Run the parsed command
///
/// Returns exit code 1 when `validate` rejects the data.
pub fn run_cli(cli: Cli) -> anyhow::Result<ExitCode> {
    match cli.command {
        Commands::Routes { contract } => {
            print!("{}", routes_table(&contract)?);
            Ok(ExitCode::SUCCESS)
        }
        Commands::Validate {
            contract,
            route,
            part,
            data,
            json_query,
        } => {
            let data: Value = serde_json::from_str(&data).context("--data is not valid JSON")?;
            let outcome = validate_part(&contract, &route, part.into(), data, json_query)?;
            match outcome {
                Ok(parsed) => {
                    println!("valid");
                    println!("{}", serde_json::to_string_pretty(&parsed)?);
                    Ok(ExitCode::SUCCESS)
                }
                Err(failure) => {
                    println!("invalid");
                    println!("{}", serde_json::to_string_pretty(&failure)?);
                    Ok(ExitCode::FAILURE)
                }
            }
        }
    }
}

/// Route table as printed by `routes`: one `METHOD PATH KEY` line per route
pub fn routes_table(contract: &Path) -> anyhow::Result<String> {
    let router = load_contract(contract)?;
    let routes = router.routes();
    let width = routes.iter().map(|(_, r)| r.path.len()).max().unwrap_or(0);
    let mut out = String::new();
    for (key, route) in &routes {
        out.push_str(&format!(
            "{:<7} {:<width$} {key}\n",
            route.method.as_str(),
            route.path
        ));
    }
    Ok(out)
}

/// Run the adapter the way the request pipeline would for `part`
pub fn validate_part(
    contract: &Path,
    route_key: &str,
    part: RequestPart,
    data: Value,
    json_query: bool,
) -> anyhow::Result<ValidationOutcome> {
    let router = load_contract(contract)?;
    let route = router
        .find(route_key)
        .ok_or_else(|| anyhow!("no route '{route_key}' in {}", contract.display()))?;
    let (shape, value) = prepare(&route, part, data, json_query);
    let Some(shape) = shape else {
        debug!(route = route_key, part = %part, "No shape declared; accepting as-is");
        return Ok(Ok(value));
    };
    Ok(validate(value, &shape, part.default_mode(), part))
}

/// Pick the declared shape and coerce string inputs like the pipeline does
fn prepare(route: &Route, part: RequestPart, data: Value, json_query: bool) -> (Option<Value>, Value) {
    match part {
        RequestPart::PathParams => {
            let value = string_map(&data)
                .map(|m| coerce_string_map(&m, Some(&route.path_params)))
                .unwrap_or(data);
            (Some(route.path_params.clone()), value)
        }
        RequestPart::Headers => {
            let value = string_map(&data)
                .map(|m| {
                    let m = m
                        .into_iter()
                        .map(|(k, v)| (k.to_ascii_lowercase(), v))
                        .collect();
                    coerce_string_map(&m, route.headers.as_ref())
                })
                .unwrap_or(data);
            (route.headers.clone(), value)
        }
        RequestPart::Query => {
            let value = match &data {
                Value::Object(map) => {
                    let pairs: Vec<(String, String)> = map
                        .iter()
                        .flat_map(|(k, v)| query_texts(v).into_iter().map(move |t| (k.clone(), t)))
                        .collect();
                    query_object(&pairs, route.query.as_ref(), json_query)
                }
                _ => data,
            };
            (route.query.clone(), value)
        }
        RequestPart::Body | RequestPart::Response => (route.body.clone(), data),
    }
}

/// An object whose values are all strings, as a host would deliver them
fn string_map(data: &Value) -> Option<HashMap<String, String>> {
    data.as_object()?
        .iter()
        .map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
        .collect()
}

/// Raw query texts for one key; arrays stand for repeated keys
fn query_texts(value: &Value) -> Vec<String> {
    match value {
        Value::String(s) => vec![s.clone()],
        Value::Array(items) => items.iter().flat_map(query_texts).collect(),
        other => vec![other.to_string()],
    }
}
