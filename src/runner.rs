//! Command line handling for the `vaxnet` binary.
//!
//! Scenarios come from an optional JSON config file (one object or an array
//! of objects); without one the default scenario runs. Every replicate summary
//! is written as one JSON line carrying its scenario and replicate indices.

use std::io::Write;
use std::path::PathBuf;

use clap::{Args, Command, FromArgMatches as _};
use log::info;
use serde::Serialize;

use crate::error::SimError;
use crate::event::EventRecord;
use crate::log::LogSpec;
use crate::parameters::{load_parameters_from_json, Parameters};
use crate::replicates::{run_replicates, ReplicateSummary};
use crate::simulation::Simulation;

/// Command line arguments of the `vaxnet` binary
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct BaseArgs {
    /// Path of a JSON file holding one scenario or an array of scenarios
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Random seed, overriding any seed in the config
    #[arg(short, long)]
    pub random_seed: Option<u64>,

    /// Number of replicates per scenario
    #[arg(long, default_value_t = 1)]
    pub replicates: usize,

    /// Number of worker threads for replicates
    #[arg(short, long, default_value_t = 1)]
    pub threads: usize,

    /// Log level, e.g. `info` or `vaxnet::voter=trace,warn`
    #[arg(short, long)]
    pub log_level: Option<String>,

    /// Also print every event record (single replicate only)
    #[arg(short, long)]
    pub events: bool,
}

#[derive(Serialize)]
struct SummaryLine<'a> {
    scenario: usize,
    #[serde(flatten)]
    replicate: &'a ReplicateSummary,
}

#[derive(Serialize)]
struct EventLine<'a> {
    scenario: usize,
    replicate: usize,
    #[serde(flatten)]
    record: &'a EventRecord,
}

#[must_use]
pub fn create_vaxnet_cli() -> Command {
    let cli = Command::new("vaxnet").about(
        "Simulates disease spread, vaccination and vaccine opinion on coupled contact networks",
    );
    BaseArgs::augment_args(cli)
}

/// Parses the process arguments and runs, writing JSON lines to stdout.
///
/// # Errors
///
/// Returns an error if argument parsing or any run fails.
pub fn run_with_args() -> Result<(), Box<dyn std::error::Error>> {
    let matches = create_vaxnet_cli().get_matches();
    let args = BaseArgs::from_arg_matches(&matches)?;
    let stdout = std::io::stdout();
    run(&args, &mut stdout.lock())?;
    Ok(())
}

fn load_scenarios(args: &BaseArgs) -> Result<Vec<Parameters>, SimError> {
    let mut scenarios = match &args.config {
        Some(path) => {
            info!("loading scenarios from {}", path.display());
            load_parameters_from_json(path)?
        }
        None => vec![Parameters::default()],
    };
    if let Some(seed) = args.random_seed {
        for parameters in &mut scenarios {
            parameters.random_seed = Some(seed);
        }
    }
    Ok(scenarios)
}

/// Runs every scenario described by `args`, writing results to `out`.
///
/// # Errors
///
/// Returns `InvalidParameter` for inconsistent arguments, and otherwise the
/// first config, run or output error.
pub fn run<W: Write>(args: &BaseArgs, out: &mut W) -> Result<(), SimError> {
    if let Some(spec) = &args.log_level {
        LogSpec::parse(spec)?.apply();
    }
    if args.events && args.replicates != 1 {
        return Err(SimError::invalid(
            "events",
            "event output needs exactly one replicate",
        ));
    }

    let scenarios = load_scenarios(args)?;
    for (scenario, parameters) in scenarios.into_iter().enumerate() {
        let replicates = if args.events {
            vec![run_with_events(scenario, parameters, out)?]
        } else {
            run_replicates(&parameters, args.replicates, args.threads)?
        };
        for replicate in &replicates {
            serde_json::to_writer(&mut *out, &SummaryLine { scenario, replicate })?;
            writeln!(out)?;
        }
    }
    out.flush()?;
    Ok(())
}

fn run_with_events<W: Write>(
    scenario: usize,
    parameters: Parameters,
    out: &mut W,
) -> Result<ReplicateSummary, SimError> {
    let mut simulation = Simulation::new(Parameters {
        retain_event_log: true,
        ..parameters
    })?;
    simulation.init()?;
    simulation.execute()?;
    for record in simulation.event_log() {
        let line = EventLine {
            scenario,
            replicate: 0,
            record,
        };
        serde_json::to_writer(&mut *out, &line)?;
        writeln!(out)?;
    }
    Ok(ReplicateSummary {
        replicate: 0,
        summary: simulation.summary(),
    })
}

#[cfg(test)]
mod tests {
    use std::io::Write as _;

    use serde_json::Value;
    use tempfile::NamedTempFile;

    use super::*;

    fn parse(arguments: &[&str]) -> BaseArgs {
        let matches = create_vaxnet_cli()
            .try_get_matches_from(std::iter::once("vaxnet").chain(arguments.iter().copied()))
            .unwrap();
        BaseArgs::from_arg_matches(&matches).unwrap()
    }

    fn lines(output: &[u8]) -> Vec<Value> {
        std::str::from_utf8(output)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    fn config(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    const SMALL: &str = r#"{"population": 50, "max_duration": 120,
        "network": {"contact_factor": 0}}"#;

    #[test]
    fn defaults() {
        let args = parse(&[]);
        assert_eq!(
            args,
            BaseArgs {
                replicates: 1,
                threads: 1,
                ..BaseArgs::default()
            }
        );
    }

    #[test]
    fn prints_one_line_per_replicate() {
        let file = config(SMALL);
        let args = parse(&[
            "--config",
            file.path().to_str().unwrap(),
            "--random-seed",
            "12",
            "--replicates",
            "3",
            "--threads",
            "2",
        ]);
        let mut output = Vec::new();
        run(&args, &mut output).unwrap();
        let lines = lines(&output);
        assert_eq!(lines.len(), 3);
        for (index, line) in lines.iter().enumerate() {
            assert_eq!(line["scenario"], 0);
            assert_eq!(line["replicate"], index);
            assert_eq!(line["random_seed"], 12 + index as u64);
        }
    }

    #[test]
    fn scenarios_are_numbered() {
        let file = config(&format!("[{SMALL}, {SMALL}]"));
        let args = parse(&["-c", file.path().to_str().unwrap(), "-r", "5"]);
        let mut output = Vec::new();
        run(&args, &mut output).unwrap();
        let lines = lines(&output);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1]["scenario"], 1);
        assert_eq!(lines[0]["transmissions"], lines[1]["transmissions"]);
    }

    #[test]
    fn events_precede_the_summary() {
        let file = config(SMALL);
        let args = parse(&["-c", file.path().to_str().unwrap(), "-r", "3", "--events"]);
        let mut output = Vec::new();
        run(&args, &mut output).unwrap();
        let lines = lines(&output);
        let summary = lines.last().unwrap();
        let events = &lines[..lines.len() - 1];
        assert_eq!(summary["events_processed"], events.len());
        assert!(events.iter().all(|line| line.get("type").is_some()));
    }

    #[test]
    fn events_need_a_single_replicate() {
        let args = parse(&["--events", "--replicates", "2"]);
        assert!(matches!(
            run(&args, &mut Vec::new()),
            Err(SimError::InvalidParameter { name: "events", .. })
        ));
    }

    #[test]
    fn bad_log_level_is_rejected() {
        let args = parse(&["--log-level", "chatty"]);
        assert!(matches!(
            run(&args, &mut Vec::new()),
            Err(SimError::InvalidParameter {
                name: "log_level",
                ..
            })
        ));
    }

    #[test]
    fn missing_config_is_an_io_error() {
        let args = parse(&["--config", "/nonexistent/vaxnet.json"]);
        assert!(matches!(
            run(&args, &mut Vec::new()),
            Err(SimError::IoError(_))
        ));
    }
}
