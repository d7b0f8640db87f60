//! fleet-tco entry point: request loading, command dispatch, and output.

use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use fleet_tco::config::RequestConfig;
use fleet_tco::io::export::{export_csv, export_json};
use fleet_tco::registry::Registry;
use fleet_tco::scenario::{
    AssumptionVariable, DEFAULT_ITERATIONS, MonteCarloVariable, SensitivityVariable,
    StressTestId, SweepRange,
};
use fleet_tco::ScenarioType;

#[derive(Parser)]
#[command(name = "fleet-tco")]
#[command(about = "School bus fleet total cost of ownership calculator", long_about = None)]
struct Cli {
    /// Load the request from a TOML file
    #[arg(long, value_name = "FILE", global = true, conflicts_with = "preset")]
    input: Option<PathBuf>,

    /// Use a built-in request (demo, northern_large, california)
    #[arg(long, global = true)]
    preset: Option<String>,

    /// Scenario for single-scenario commands, overriding the request
    #[arg(long, global = true)]
    scenario: Option<ScenarioType>,

    /// Print JSON instead of a text report
    #[arg(long, global = true, default_value_t = false)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Cost one scenario
    Calculate,
    /// Cost and compare all four scenarios
    Compare {
        /// Write the per-scenario summary as CSV
        #[arg(long, value_name = "PATH")]
        csv_out: Option<PathBuf>,

        /// Write the full comparison export as JSON
        #[arg(long, value_name = "PATH")]
        json_out: Option<PathBuf>,
    },
    /// Run one stress test, or all of them
    Stress {
        #[arg(long)]
        id: Option<StressTestId>,
    },
    /// Sweep the default sensitivity variables and rank them
    Sensitivity,
    /// Find where an electric scenario matches diesel net TCO
    BreakEven {
        /// Variable to sweep; all standard sweeps when omitted
        #[arg(long)]
        variable: Option<AssumptionVariable>,

        #[arg(long, requires = "variable")]
        min: Option<f64>,

        #[arg(long, requires = "variable")]
        max: Option<f64>,

        #[arg(long, requires = "variable")]
        step: Option<f64>,

        /// Electric scenario compared against diesel
        #[arg(long, default_value = "MOBILE_CHARGING")]
        target: ScenarioType,
    },
    /// Sample uncertain assumptions and summarize the net TCO spread
    MonteCarlo {
        #[arg(long, default_value_t = DEFAULT_ITERATIONS)]
        iterations: usize,

        /// name:normal:mean:sd, name:uniform:min:max, or name:triangular:min:mode:max
        #[arg(long = "var", value_name = "VAR", required = true)]
        vars: Vec<MonteCarloVariable>,
    },
    /// Export the assumption registry, or check a value against it
    Registry {
        /// id=value
        #[arg(long, value_name = "ID=VALUE")]
        check: Option<String>,
    },
    /// Serve the JSON API
    #[cfg(feature = "api")]
    Serve {
        #[arg(long, default_value_t = 3000)]
        port: u16,
    },
}

fn load_request(cli: &Cli) -> Result<RequestConfig> {
    let mut request = match (&cli.input, &cli.preset) {
        (Some(path), _) => RequestConfig::from_toml_file(path)?,
        (None, Some(name)) => RequestConfig::from_preset(name)?,
        (None, None) => RequestConfig::demo(),
    };
    if let Some(scenario) = cli.scenario {
        request.scenario = Some(scenario);
    }
    Ok(request)
}

fn emit<T: Serialize + std::fmt::Display>(value: &T, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        println!("{value}");
    }
    Ok(())
}

fn run(cli: Cli) -> Result<()> {
    let request = load_request(&cli)?;
    let engine = request.engine();
    let input = request.to_input(ScenarioType::MobileCharging);
    info!(
        scenario = %input.scenario_type,
        buses = input.fleet.total_buses(),
        state = %input.location.state,
        "request loaded"
    );

    match cli.command {
        Commands::Calculate => emit(&engine.calculate_tco(&input)?, cli.json)?,
        Commands::Compare { csv_out, json_out } => {
            let comparison = engine.compare_scenarios(&request.to_comparison_input())?;
            emit(&comparison, cli.json)?;
            if let Some(path) = csv_out {
                export_csv(&comparison, &path)
                    .with_context(|| format!("writing {}", path.display()))?;
                eprintln!("Comparison exported to {}", path.display());
            }
            if let Some(path) = json_out {
                export_json(&comparison, &path)
                    .with_context(|| format!("writing {}", path.display()))?;
                eprintln!("Comparison exported to {}", path.display());
            }
        }
        Commands::Stress { id: Some(id) } => {
            let result = engine.run_stress_test(&input, id)?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                println!(
                    "{}: net TCO {:.0} -> {:.0} ({:+.1}%)",
                    result.name, result.base_net_tco, result.stressed_net_tco, result.impact_pct
                );
                for w in &result.warnings {
                    println!("  ! {w}");
                }
            }
        }
        Commands::Stress { id: None } => emit(&engine.run_all_stress_tests(&input)?, cli.json)?,
        Commands::Sensitivity => {
            let vars: Vec<SensitivityVariable> = AssumptionVariable::sensitivity_defaults()
                .into_iter()
                .map(SensitivityVariable::from)
                .collect();
            emit(&engine.run_sensitivity_analysis(&input, &vars)?, cli.json)?;
        }
        Commands::BreakEven {
            variable,
            min,
            max,
            step,
            target,
        } => {
            let comparison_input = request.to_comparison_input();
            let results = match variable {
                Some(variable) => {
                    let default = variable.default_sweep();
                    let range = SweepRange::new(
                        min.unwrap_or(default.min),
                        max.unwrap_or(default.max),
                        step.unwrap_or(default.step),
                    );
                    vec![engine.find_break_even_point(&comparison_input, variable, range, target)?]
                }
                None => engine.find_all_break_even_points(&comparison_input, target)?,
            };
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&results)?);
            } else {
                for r in &results {
                    println!("{r}");
                }
            }
        }
        Commands::MonteCarlo { iterations, vars } => {
            emit(&engine.run_monte_carlo_simulation(&input, &vars, iterations)?, cli.json)?;
        }
        Commands::Registry { check } => {
            let registry = Registry::from_defaults(engine.defaults());
            match check {
                Some(pair) => {
                    let Some((id, value)) = pair.split_once('=') else {
                        bail!("--check expects id=value, got \"{pair}\"");
                    };
                    let value: f64 = value
                        .trim()
                        .parse()
                        .with_context(|| format!("\"{value}\" is not a number"))?;
                    let check = registry.validate_value(id.trim(), value)?;
                    println!("{}", check.message);
                    if !check.valid {
                        bail!("value out of range");
                    }
                }
                None => println!("{}", registry.export_for_audit()?),
            }
        }
        #[cfg(feature = "api")]
        Commands::Serve { port } => {
            use std::net::SocketAddr;
            use std::sync::Arc;

            let state = Arc::new(fleet_tco::api::AppState::new(engine));
            let addr = SocketAddr::from(([0, 0, 0, 0], port));
            let rt = tokio::runtime::Runtime::new().context("creating tokio runtime")?;
            rt.block_on(fleet_tco::api::serve(state, addr))?;
        }
    }
    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    if let Err(e) = run(Cli::parse()) {
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}
