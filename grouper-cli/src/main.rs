//! grouper: Command-line interface for the grouper assignment solver
//!
//! # Commands
//!
//! - `solve`: Assign students to groups from a problem file
//! - `validate`: Validate a problem file without solving
//! - `example`: Print an example problem definition

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use grouper_core::models::ApiInput;
use grouper_core::{create_groups, solver::MAX_POPULATION};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "grouper")]
#[command(version = "0.1.0")]
#[command(about = "Goal-driven student/group assignment", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the solver on a problem file
    Solve {
        /// Input file path, JSON or YAML by extension (use --stdin for JSON on stdin)
        #[arg(value_name = "FILE")]
        input: Option<PathBuf>,

        /// Read JSON input from stdin instead of a file
        #[arg(long)]
        stdin: bool,

        /// Output file path (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Validate a problem file without solving
    Validate {
        /// Input file path, JSON or YAML by extension
        #[arg(value_name = "FILE")]
        input: Option<PathBuf>,

        /// Read JSON input from stdin instead of a file
        #[arg(long)]
        stdin: bool,
    },

    /// Print an example problem definition
    Example {
        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Solve {
            input,
            stdin,
            output,
            pretty,
        } => cmd_solve(input, stdin, output, pretty),

        Commands::Validate { input, stdin } => cmd_validate(input, stdin),

        Commands::Example { pretty } => cmd_example(pretty),
    }
}

fn read_input(file: Option<PathBuf>, use_stdin: bool) -> Result<ApiInput> {
    if use_stdin {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .context("Failed to read from stdin")?;
        serde_json::from_str(&buffer).context("Failed to parse input JSON")
    } else if let Some(path) = file {
        let text = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read file: {:?}", path))?;
        parse_input(&path, &text)
    } else {
        anyhow::bail!("Either provide an input file or use --stdin")
    }
}

fn parse_input(path: &Path, text: &str) -> Result<ApiInput> {
    let is_yaml = matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    );
    if is_yaml {
        serde_yaml::from_str(text).context("Failed to parse input YAML")
    } else {
        serde_json::from_str(text).context("Failed to parse input JSON")
    }
}

fn cmd_solve(
    input: Option<PathBuf>,
    stdin: bool,
    output: Option<PathBuf>,
    pretty: bool,
) -> Result<()> {
    let api_input = read_input(input, stdin)?;

    eprintln!("Running solver...");
    let outcome = create_groups(&api_input).map_err(|e| anyhow::anyhow!("Solver error: {}", e))?;

    let output_json = if pretty {
        serde_json::to_string_pretty(&outcome)?
    } else {
        serde_json::to_string(&outcome)?
    };

    if let Some(output_path) = output {
        fs::write(&output_path, &output_json)
            .with_context(|| format!("Failed to write output to {:?}", output_path))?;
        eprintln!("Result written to {:?}", output_path);
    } else {
        println!("{}", output_json);
    }

    Ok(())
}

fn cmd_validate(input: Option<PathBuf>, stdin: bool) -> Result<()> {
    let api_input = match read_input(input, stdin) {
        Ok(api_input) => api_input,
        Err(e) => {
            println!(
                "{{\"valid\": false, \"error\": \"{}\"}}",
                format!("{:#}", e).replace('"', "\\\"")
            );
            return Ok(());
        }
    };

    if api_input.students.len() > MAX_POPULATION || api_input.groups.len() > MAX_POPULATION {
        println!(
            "{{\"valid\": false, \"error\": \"more than {} students or groups\"}}",
            MAX_POPULATION
        );
    } else {
        println!("{{\"valid\": true, \"message\": \"Problem definition is valid\"}}");
    }
    Ok(())
}

fn cmd_example(pretty: bool) -> Result<()> {
    use grouper_core::models::{Goal, GroupFilterParams, PropMap};
    use grouper_core::Filter;

    fn entry(pairs: &[(&str, grouper_core::PropValue)]) -> PropMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    let example = ApiInput {
        students: vec![
            entry(&[("name", "ada".into()), ("honors", "y".into())]),
            entry(&[("name", "grace".into()), ("honors", "y".into())]),
            entry(&[("name", "linus".into()), ("honors", "n".into())]),
        ],
        groups: vec![
            entry(&[("honors", "y".into()), ("size", 2.into())]),
            entry(&[("honors", "n".into()), ("size", 2.into())]),
        ],
        goal_sets: vec![vec![Goal::GroupFilter(GroupFilterParams {
            student_filter: Some(Filter::new([("honors", "y")])),
            group_filter: Some(Filter::new([("honors", "y")])),
            required: true,
            net_reward: 10.0,
            partial_reward: 1.0,
        })]],
        deterministic: false,
    };

    let output_json = if pretty {
        serde_json::to_string_pretty(&example)?
    } else {
        serde_json::to_string(&example)?
    };
    println!("{}", output_json);
    Ok(())
}
