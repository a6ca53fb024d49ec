//! EmailFlow intake CLI
//!
//! Entry point for the `emailflow-intake` command-line tool.

use clap::{Parser, Subcommand};
use emailflow_intake::config::{default_host_path, default_repo_path};
use emailflow_intake::{validate, EffectiveConfig, FileRef, IntakePolicy, ReplayScript};
use emailflow_protocol::ColumnMapping;
use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::process;

/// Exit code for a rejected file or missing columns.
const EXIT_REJECTED: i32 = 1;
/// Exit code for unreadable input or invalid configuration.
const EXIT_ERROR: i32 = 2;

#[derive(Parser)]
#[command(name = "emailflow-intake")]
#[command(about = "Upload intake checks and page controller replay", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check a file against the upload policy
    Validate {
        /// File to check
        path: PathBuf,

        /// Path to repo config file (default: .emailflow/intake.toml)
        #[arg(long, short = 'c')]
        config: Option<PathBuf>,

        /// Override the maximum upload size in bytes
        #[arg(long)]
        max_bytes: Option<u64>,
    },

    /// Map a CSV header line onto the import columns
    Columns {
        /// CSV file to inspect
        path: PathBuf,
    },

    /// Print the effective configuration with its sources
    Config {
        /// Path to repo config file (default: .emailflow/intake.toml)
        #[arg(long, short = 'c')]
        config: Option<PathBuf>,
    },

    /// Feed a timed event script through the page controller
    Replay {
        /// JSON script with a route and timed steps
        script: PathBuf,

        /// Path to repo config file (default: .emailflow/intake.toml)
        #[arg(long, short = 'c')]
        config: Option<PathBuf>,
    },
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    let code = match cli.command {
        Commands::Validate {
            path,
            config,
            max_bytes,
        } => run_validate(&path, config, max_bytes),
        Commands::Columns { path } => run_columns(&path),
        Commands::Config { config } => run_config(config),
        Commands::Replay { script, config } => run_replay(&script, config),
    };
    process::exit(code);
}

/// Logs go to stderr so stdout stays machine-readable.
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(
    repo_path: Option<PathBuf>,
    overrides: Option<serde_json::Value>,
) -> Result<EffectiveConfig, String> {
    let host = default_host_path();
    let repo = match repo_path {
        Some(path) => path,
        None => {
            let cwd = std::env::current_dir().map_err(|e| format!("cannot read current directory: {}", e))?;
            default_repo_path(&cwd)
        }
    };
    EffectiveConfig::build(host.as_deref(), Some(&repo), overrides).map_err(|e| e.to_string())
}

fn load_policy(
    repo_path: Option<PathBuf>,
    overrides: Option<serde_json::Value>,
) -> Result<IntakePolicy, String> {
    load_config(repo_path, overrides)?
        .policy()
        .map_err(|e| e.to_string())
}

fn print_json<T: serde::Serialize>(value: &T) -> i32 {
    match serde_json::to_string_pretty(value) {
        Ok(json) => {
            println!("{}", json);
            0
        }
        Err(e) => {
            eprintln!("Error serializing output: {}", e);
            EXIT_ERROR
        }
    }
}

fn run_validate(path: &Path, config_path: Option<PathBuf>, max_bytes: Option<u64>) -> i32 {
    let overrides = max_bytes.map(|max| serde_json::json!({"upload": {"max_bytes": max}}));
    let policy = match load_policy(config_path, overrides) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            return EXIT_ERROR;
        }
    };

    let metadata = match fs::metadata(path) {
        Ok(m) => m,
        Err(e) => {
            eprintln!("Error reading {}: {}", path.display(), e);
            return EXIT_ERROR;
        }
    };
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let file = FileRef::new(name, metadata.len());

    let result = validate(&file, &policy.upload_policy());
    tracing::info!(file = %file.name, size_bytes = file.size_bytes, reason = ?result.reason_code, "validated");
    match print_json(&result) {
        0 if !result.accepted => EXIT_REJECTED,
        code => code,
    }
}

fn run_columns(path: &Path) -> i32 {
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Error opening {}: {}", path.display(), e);
            return EXIT_ERROR;
        }
    };

    let mut header = String::new();
    if let Err(e) = BufReader::new(file).read_line(&mut header) {
        eprintln!("Error reading {}: {}", path.display(), e);
        return EXIT_ERROR;
    }

    match ColumnMapping::from_header_line(header.trim_end()).require() {
        Ok(mapping) => print_json(&mapping),
        Err(e) => {
            eprintln!("{}", e);
            match print_json(&e) {
                0 => EXIT_REJECTED,
                code => code,
            }
        }
    }
}

fn run_config(config_path: Option<PathBuf>) -> i32 {
    match load_config(config_path, None) {
        Ok(config) => print_json(&config),
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            EXIT_ERROR
        }
    }
}

fn run_replay(script_path: &Path, config_path: Option<PathBuf>) -> i32 {
    let policy = match load_policy(config_path, None) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            return EXIT_ERROR;
        }
    };

    let records = match ReplayScript::from_file(script_path).and_then(|script| script.run(policy)) {
        Ok(records) => records,
        Err(e) => {
            eprintln!("Error replaying {}: {}", script_path.display(), e);
            return EXIT_ERROR;
        }
    };

    for record in &records {
        match serde_json::to_string(record) {
            Ok(line) => println!("{}", line),
            Err(e) => {
                eprintln!("Error serializing output: {}", e);
                return EXIT_ERROR;
            }
        }
    }
    0
}
