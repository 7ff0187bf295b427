use clap::{Parser as ClapParser, Subcommand};
use mql_lang::cli::{self, CheckOptions, CheckResult, CliError, InputSource};
use mql_lang::output::{render, Format};
use mql_lang::Params;
use std::io::{self, Read};
use std::path::PathBuf;

#[derive(ClapParser)]
#[command(name = "mql")]
#[command(about = "MQL - SQL-style SELECT queries over JSON metadata records, run through jq")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the jq program for a query
    Compile {
        /// The MQL query to compile
        query: String,
    },

    /// Validate and execute an MQL query
    Check {
        /// The MQL query to execute
        query: String,

        /// JSON file holding an array of records
        #[arg(short, long, conflicts_with = "input")]
        file: Option<PathBuf>,

        /// JSON input (reads from stdin if neither this nor --file is given)
        #[arg(short, long)]
        input: Option<String>,

        /// Pretty-print the output
        #[arg(short, long, conflicts_with = "table")]
        pretty: bool,

        /// Print the output as a text table
        #[arg(short, long)]
        table: bool,

        /// Only validate the query, don't execute
        #[arg(long)]
        syntax_only: bool,

        /// jq binary to run (defaults to $MQL_JQ, then `jq`)
        #[arg(long)]
        jq: Option<PathBuf>,

        /// Bind parameter value, NAME=JSON (repeatable)
        #[arg(long = "param", value_name = "NAME=JSON")]
        params: Vec<String>,
    },
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Compile { query } => cli::execute_compile(&query).map(|program| {
            println!("{}", program);
        }),
        Commands::Check {
            query,
            file,
            input,
            pretty,
            table,
            syntax_only,
            jq,
            params,
        } => {
            let format = if table {
                Format::Table
            } else if pretty {
                Format::JsonPretty
            } else {
                Format::Json
            };
            run_check(query, file, input, format, syntax_only, jq, params)
        }
    };

    if let Err(e) = result {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

fn run_check(
    query: String,
    file: Option<PathBuf>,
    input: Option<String>,
    format: Format,
    syntax_only: bool,
    jq: Option<PathBuf>,
    params: Vec<String>,
) -> Result<(), CliError> {
    let input = match (file, input) {
        (Some(path), _) => InputSource::File(path),
        (None, Some(s)) => InputSource::Json(s),
        (None, None) if !syntax_only && !atty::is(atty::Stream::Stdin) => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer).map_err(CliError::Io)?;
            InputSource::Json(buffer)
        }
        (None, None) => InputSource::None,
    };

    let params = params
        .iter()
        .map(|p| cli::parse_param(p))
        .collect::<Result<Params, _>>()?;

    let options = CheckOptions {
        query,
        input,
        syntax_only,
        jq,
        params,
    };

    match cli::execute_check(&options)? {
        CheckResult::SyntaxValid => println!("Syntax is valid"),
        CheckResult::Success(result) => match format {
            Format::Table => print!("{}", render(&result, format)),
            _ => println!("{}", render(&result, format)),
        },
    }
    Ok(())
}
