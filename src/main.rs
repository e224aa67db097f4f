use adl_lang::cli::{self, CheckOptions, CheckResult, CliError};
use clap::{Parser as ClapParser, Subcommand};
use std::fs;
use std::io::{self, Read};
use tracing_subscriber::EnvFilter;

#[derive(ClapParser)]
#[command(name = "adl")]
#[command(about = "ADL - declare counts, sums, profiles, fractions and histograms over streams of records")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate an ADL program and evaluate it against JSON columns
    Check {
        /// The ADL program, or a path to it with --file
        program: String,

        /// Read the program from the file named by PROGRAM
        #[arg(short, long)]
        file: bool,

        /// JSON object of named columns (reads from stdin if not provided)
        #[arg(short, long)]
        input: Option<String>,

        /// Provenance tag for `source` blocks
        #[arg(short, long)]
        source: Option<String>,

        /// Print only the aggregation at this path, e.g. `central/2/events`
        #[arg(long)]
        path: Option<String>,

        /// Pretty-print the output
        #[arg(short, long)]
        pretty: bool,

        /// Only validate the program, don't execute
        #[arg(long)]
        syntax_only: bool,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Check {
            program,
            file,
            input,
            source,
            path,
            pretty,
            syntax_only,
        } => run_check(program, file, input, source, path, pretty, syntax_only),
    };

    if let Err(e) = result {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

fn run_check(
    program: String,
    file: bool,
    input: Option<String>,
    source: Option<String>,
    path: Option<String>,
    pretty: bool,
    syntax_only: bool,
) -> Result<(), CliError> {
    let program = if file {
        fs::read_to_string(&program).map_err(CliError::Io)?
    } else {
        program
    };

    let input = match input {
        Some(s) => Some(s),
        None if !syntax_only && !atty::is(atty::Stream::Stdin) => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer).map_err(CliError::Io)?;
            Some(buffer)
        }
        None => None,
    };

    let options = CheckOptions {
        program,
        input,
        source,
        path,
        pretty,
        syntax_only,
    };

    match cli::execute_check(&options)? {
        CheckResult::SyntaxValid => println!("Program is valid"),
        CheckResult::Success(output) => {
            let json = if pretty {
                serde_json::to_string_pretty(&output)
            } else {
                serde_json::to_string(&output)
            }?;
            println!("{}", json);
        }
    }
    Ok(())
}
