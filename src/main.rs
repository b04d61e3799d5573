use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::{debug, info};

use fuzzy_fatigue::config::{FatigueConfig, LogLevel, OutputFormat};
use fuzzy_fatigue::{build_model, FatigueModel, Reading};

/// Driver fatigue advisory: maps five sensor readings to an alert level and a break suggestion.
#[derive(Parser)]
#[command(name = "fuzzy-fatigue", version, about)]
struct Args {
    /// Configuration file (defaults to ./fuzzy-fatigue.toml, then the user config dir)
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Logging level
    #[arg(long, value_enum, global = true)]
    log_level: Option<LogLevel>,

    /// Output format
    #[arg(long, value_enum, global = true)]
    format: Option<OutputFormat>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Evaluate one reading
    Assess {
        /// Eye blinks per second (0.1 - 1.0)
        #[arg(long)]
        blink_rate: f64,
        /// Steering wheel movements per minute (0 - 50)
        #[arg(long)]
        steering_freq: f64,
        /// Minutes behind the wheel (0 - 300)
        #[arg(long)]
        drive_time: f64,
        /// Cabin temperature in degrees Celsius (10 - 40)
        #[arg(long)]
        temp: f64,
        /// Music volume (0 - 100)
        #[arg(long)]
        music_volume: f64,
    },
    /// List the rule base
    Rules,
    /// Print sampled membership curves
    Curves {
        /// Only this variable
        variable: Option<String>,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = FatigueConfig::load_with(args.config.as_deref())?;

    if let Some(level) = args.log_level {
        config.general.log_level = level;
    }

    if let Some(format) = args.format {
        config.general.format = format;
    }

    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::from(config.general.log_level))
        .with_writer(std::io::stderr)
        .init();

    debug!(?config, "loaded configuration");

    let fatigue = build_model().context("failed to assemble the fatigue model")?;

    match args.command {
        Command::Assess {
            blink_rate,
            steering_freq,
            drive_time,
            temp,
            music_volume,
        } => {
            let reading = Reading::new(blink_rate, steering_freq, drive_time, temp, music_volume);

            assess(&fatigue, &config, &reading)
        },
        Command::Rules => {
            let rules = fatigue.model().describe_rules();

            match config.general.format {
                OutputFormat::Text => {
                    for (i, rule) in rules.iter().enumerate() {
                        println!("Rule {}: {rule}", i + 1);
                    }
                },
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&rules)?),
            }

            Ok(())
        },
        Command::Curves { variable } => curves(&fatigue, &config, variable.as_deref()),
    }
}

fn assess(fatigue: &FatigueModel, config: &FatigueConfig, reading: &Reading) -> Result<()> {
    info!(?reading, "assessing reading");

    let outputs = fatigue.evaluate(reading)?;
    let assessment = fatigue.assessment(&outputs);
    let suggests_break = assessment.suggests_break(config.advisory.break_threshold);

    match config.general.format {
        OutputFormat::Text => {
            println!("Alert level: %{:.2}", assessment.alert_level);
            println!("Break suggested: {}", if suggests_break { "yes" } else { "no" });

            for (name, fallback) in [
                ("alert_level", outputs.is_fallback(fatigue.alert_level)),
                ("break_suggestion", outputs.is_fallback(fatigue.break_suggestion)),
            ] {
                if fallback {
                    println!("note: no rule fired for {name}; reported the midpoint of its range");
                }
            }
        },
        OutputFormat::Json => {
            let report = serde_json::json!({
                "reading": reading,
                "assessment": assessment,
                "suggests_break": suggests_break,
                "firing_strengths": outputs.firing_strengths(),
            });

            println!("{}", serde_json::to_string_pretty(&report)?);
        },
    }

    Ok(())
}

fn curves(fatigue: &FatigueModel, config: &FatigueConfig, variable: Option<&str>) -> Result<()> {
    let model = fatigue.model();
    let keys: Vec<_> = match variable {
        Some(name) => match model.find(name) {
            Some((key, _)) => vec![key],
            None => bail!("unknown variable `{name}`"),
        },
        None => model.variables().iter().map(|(key, _)| key).collect(),
    };
    let curves: Vec<_> = keys.into_iter().filter_map(|key| model.curves(key)).collect();

    match config.general.format {
        OutputFormat::Text => {
            for curve in &curves {
                println!("{}", curve.variable);

                for (i, u) in curve.universe.iter().enumerate() {
                    let degrees: Vec<_> = curve
                        .terms
                        .iter()
                        .map(|term| format!("{}={:.3}", term.term, term.membership[i]))
                        .collect();

                    println!("  {u:>8.2}  {}", degrees.join("  "));
                }
            }
        },
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&curves)?),
    }

    Ok(())
}
