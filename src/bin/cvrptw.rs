use std::error::Error;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{arg, value_parser, ArgMatches, Command};
use tracing::info;
use tracing_subscriber::EnvFilter;

use u_cvrptw::colgen::ColumnGeneration;
use u_cvrptw::config::Config;
use u_cvrptw::generator::{generate, GeneratorConfig};
use u_cvrptw::lp::MicroLpSolver;
use u_cvrptw::models::InputTables;

fn cli() -> Command {
    Command::new("cvrptw")
        .about("Solves single-depot CVRPTW instances by column generation")
        .arg(
            arg!(--input <PATH> "JSON document holding all four input tables")
                .value_parser(value_parser!(PathBuf))
                .conflicts_with_all(["depots", "generate"]),
        )
        .arg(
            arg!(--depots <PATH> "Depot table (CSV)")
                .value_parser(value_parser!(PathBuf))
                .requires_all(["customers", "transit", "vehicles"])
                .conflicts_with("generate"),
        )
        .arg(arg!(--customers <PATH> "Customer table (CSV)").value_parser(value_parser!(PathBuf)))
        .arg(arg!(--transit <PATH> "Transportation matrix (CSV)").value_parser(value_parser!(PathBuf)))
        .arg(arg!(--vehicles <PATH> "Vehicle table (CSV)").value_parser(value_parser!(PathBuf)))
        .arg(arg!(--generate <N> "Generate a random instance with N customers").value_parser(value_parser!(usize)))
        .arg(
            arg!(--seed <SEED> "Seed of the generated instance")
                .default_value("0")
                .value_parser(value_parser!(u64)),
        )
        .arg(
            arg!(--"save-tables" <PATH> "Write the input tables as JSON before solving")
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(arg!(--config <PATH> "JSON run configuration").value_parser(value_parser!(PathBuf)))
        .arg(
            arg!(--"max-iterations" <N> "Override the iteration limit of the configuration")
                .value_parser(value_parser!(usize)),
        )
        .arg(
            arg!(--format <FORMAT> "Output format of the plan")
                .default_value("csv")
                .value_parser(["csv", "json"]),
        )
        .arg(arg!(--output <PATH> "Write the plan here instead of stdout").value_parser(value_parser!(PathBuf)))
        .arg(arg!(--"log-level" <LEVEL> "Log filter, overrides RUST_LOG").value_parser(value_parser!(String)))
}

fn init_logging(level: Option<&String>) {
    let filter = match level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn open(path: &Path) -> Result<BufReader<File>, Box<dyn Error>> {
    let file = File::open(path).map_err(|err| format!("cannot open {}: {err}", path.display()))?;
    Ok(BufReader::new(file))
}

fn csv_path<'a>(matches: &'a ArgMatches, name: &str) -> Result<&'a PathBuf, Box<dyn Error>> {
    matches
        .get_one::<PathBuf>(name)
        .ok_or_else(|| format!("--{name} is required with --depots").into())
}

fn load_tables(matches: &ArgMatches) -> Result<InputTables, Box<dyn Error>> {
    if let Some(path) = matches.get_one::<PathBuf>("input") {
        return Ok(InputTables::from_json_reader(open(path)?)?);
    }
    if let Some(depots) = matches.get_one::<PathBuf>("depots") {
        return Ok(InputTables::from_csv_readers(
            open(depots)?,
            open(csv_path(matches, "customers")?)?,
            open(csv_path(matches, "transit")?)?,
            open(csv_path(matches, "vehicles")?)?,
        )?);
    }
    if let Some(&customers) = matches.get_one::<usize>("generate") {
        let seed = matches.get_one::<u64>("seed").copied().unwrap_or_default();
        return Ok(generate(&GeneratorConfig::new(customers, seed))?);
    }
    Err("one of --input, --depots/--customers/--transit/--vehicles or --generate is required".into())
}

fn load_config(matches: &ArgMatches) -> Result<Config, Box<dyn Error>> {
    let mut config = match matches.get_one::<PathBuf>("config") {
        Some(path) => Config::from_json_reader(open(path)?)?,
        None => Config::default(),
    };
    if let Some(&max_iterations) = matches.get_one::<usize>("max-iterations") {
        config = config.with_max_iterations(max_iterations);
    }
    Ok(config)
}

fn run(matches: &ArgMatches) -> Result<(), Box<dyn Error>> {
    let tables = load_tables(matches)?;
    if let Some(path) = matches.get_one::<PathBuf>("save-tables") {
        tables.to_json_writer(BufWriter::new(File::create(path)?))?;
        info!(path = %path.display(), "input tables written");
    }
    let config = load_config(matches)?;

    let mut engine = ColumnGeneration::new(config, &MicroLpSolver);
    let outcome = engine.run_tables(&tables)?;
    info!(
        termination = ?outcome.termination,
        iterations = outcome.iterations,
        columns = outcome.pool.len(),
        objective = outcome.plan.objective,
        "solved"
    );

    let mut writer: Box<dyn Write> = match matches.get_one::<PathBuf>("output") {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };
    match matches.get_one::<String>("format").map(String::as_str) {
        Some("json") => outcome.plan.write_json(&mut writer)?,
        _ => outcome.plan.write_csv(&mut writer)?,
    }
    writer.flush()?;
    Ok(())
}

fn main() -> ExitCode {
    let matches = cli().get_matches();
    init_logging(matches.get_one::<String>("log-level"));
    match run(&matches) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}
