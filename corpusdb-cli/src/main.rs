use clap::{Parser, Subcommand, ValueEnum};
use corpusdb::pipeline::{EXIT_CLEAN, EXIT_SETUP_ERROR, EXIT_VIOLATIONS};
use corpusdb::sink::write_document_map;
use corpusdb::violation::has_errors;
use corpusdb::{
    fs_rules, validate_structure, Outcome, Pipeline, PipelineOptions, RelationalSink, SqlDumpSink,
    SqliteSink, Violation,
};
use std::path::PathBuf;
use std::process;

/// corpusdb: validate a flat-file corpus and build its relational model
#[derive(Parser)]
#[command(name = "corpusdb", version, about)]
struct Cli {
    /// Corpus root directory
    #[arg(long, default_value = ".")]
    root: PathBuf,

    /// Filesystem rule spec (default: <root>/fs_spec.yaml)
    #[arg(long)]
    spec: Option<PathBuf>,

    /// Schema directory (default: <root>/schemas)
    #[arg(long)]
    schemas: Option<PathBuf>,

    /// Corpus config (default: <root>/config.yaml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Report format
    #[arg(long, default_value = "yaml")]
    format: OutputFormat,

    /// Log traversal detail (overrides RUST_LOG)
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    Yaml,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Check the directory layout against the rule spec only
    CheckStructure,

    /// Check layout, then documents, attachments and references
    Check,

    /// Run every stage and write the relational outputs
    Build {
        /// Write a portable SQL dump
        #[arg(long)]
        dump_sql: Option<PathBuf>,
        /// Write a SQLite database
        #[arg(long)]
        db_out: Option<PathBuf>,
        /// Write the collections map as JSON
        #[arg(long)]
        map_out: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();

    let mut logger = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if cli.verbose {
        logger.filter_level(log::LevelFilter::Debug);
    }
    logger.init();

    match run(&cli) {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("ERROR:{e}");
            process::exit(EXIT_SETUP_ERROR);
        }
    }
}

fn options(cli: &Cli) -> PipelineOptions {
    let mut options = PipelineOptions::new(&cli.root);
    if let Some(spec) = &cli.spec {
        options.rule_spec = spec.clone();
    }
    if let Some(schemas) = &cli.schemas {
        options.schemas_dir = schemas.clone();
    }
    if let Some(config) = &cli.config {
        options.config = config.clone();
    }
    options
}

fn run(cli: &Cli) -> Result<i32, Box<dyn std::error::Error>> {
    let options = options(cli);

    match &cli.command {
        Command::CheckStructure => {
            let spec = fs_rules::parse_rule_spec(&options.rule_spec)?;
            let violations = validate_structure(&options.root, &spec)?;
            print_report("structure", &violations, &cli.format)?;
            Ok(exit_code(&violations))
        }

        Command::Check => {
            let pipeline = Pipeline::open(&options)?;
            let mut violations = pipeline.setup_warnings().to_vec();
            violations.extend(pipeline.check_structure()?);
            if has_errors(&violations) {
                print_report("structure", &violations, &cli.format)?;
                return Ok(EXIT_VIOLATIONS);
            }
            let (_, content) = pipeline.check_collections()?;
            violations.extend(content);
            print_report("content", &violations, &cli.format)?;
            Ok(exit_code(&violations))
        }

        Command::Build {
            dump_sql,
            db_out,
            map_out,
        } => {
            let pipeline = Pipeline::open(&options)?;
            let outcome = pipeline.run()?;
            let stage = match &outcome {
                Outcome::Clean { .. } => "build",
                Outcome::StructureViolations { .. } => "structure",
                Outcome::ContentViolations { .. } => "content",
            };
            print_report(stage, outcome.violations(), &cli.format)?;

            if let Outcome::Clean { map, model, .. } = &outcome {
                let mut sinks: Vec<Box<dyn RelationalSink>> = Vec::new();
                if let Some(path) = dump_sql {
                    sinks.push(Box::new(SqlDumpSink::new(path)));
                }
                if let Some(path) = db_out {
                    sinks.push(Box::new(SqliteSink::new(path)));
                }
                for sink in &sinks {
                    sink.emit(model)?;
                }
                if let Some(path) = map_out {
                    write_document_map(map, path)?;
                }
            }
            Ok(outcome.exit_code())
        }
    }
}

fn exit_code(violations: &[Violation]) -> i32 {
    if has_errors(violations) {
        EXIT_VIOLATIONS
    } else {
        EXIT_CLEAN
    }
}

fn print_report(
    stage: &str,
    violations: &[Violation],
    format: &OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let errors = violations.iter().filter(|v| v.is_error()).count();
    let report = serde_json::json!({
        "stage": stage,
        "ok": errors == 0,
        "errors": errors,
        "warnings": violations.len() - errors,
        "violations": violations,
    });
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Yaml => print!("{}", serde_yaml::to_string(&report)?),
    }
    if errors > 0 {
        eprintln!("{stage}: {errors} error(s)");
    }
    Ok(())
}
