//! Purpose: `bookshelf` CLI entry point: run the server or call a running one.
//! Role: Binary crate root; parses args, dispatches commands, emits JSON on stdout.
//! Invariants: Successful commands print exactly one JSON value on stdout.
//! Invariants: Non-interactive errors are emitted as JSON on stderr.
//! Invariants: Process exit code is derived from `api::to_exit_code`.
#![allow(clippy::result_large_err)]
use std::error::Error as StdError;
use std::io::{self, IsTerminal};
use std::net::SocketAddr;

use clap::{Args, Parser, Subcommand, error::ErrorKind as ClapErrorKind};
use serde_json::{Map, Value, json};

mod serve;

use bookshelf::api::{
    DEFAULT_LIST_STEP_MS, DEFAULT_SAVE_SCALE_MS, Error, ErrorKind, Latency, RemoteClient,
    to_exit_code,
};

const DEFAULT_URL: &str = "http://127.0.0.1:3000";
const DEFAULT_MAX_BODY_BYTES: u64 = 1024 * 1024;

#[derive(Parser)]
#[command(
    name = "bookshelf",
    version,
    about = "In-memory library of book titles over HTTP/JSON",
    after_help = r#"EXAMPLES
  $ bookshelf serve                       # Terminal 1: listen on 127.0.0.1:3000
  $ bookshelf add "Dune"                  # Terminal 2
  $ bookshelf rename "Dune" "Dune Messiah"
  $ bookshelf list
  $ bookshelf save"#,
    arg_required_else_help = true
)]
struct Cli {
    #[arg(
        long,
        global = true,
        default_value = DEFAULT_URL,
        help = "Server URL used by client commands"
    )]
    url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    #[command(about = "Serve the library over HTTP (loopback by default)")]
    Serve(ServeArgs),
    #[command(about = "Add a book title (POST /addBook)")]
    Add {
        #[arg(help = "Book title")]
        title: String,
    },
    #[command(about = "Remove a book title (DELETE /removeBook)")]
    Remove {
        #[arg(help = "Book title")]
        title: String,
    },
    #[command(about = "Rename a book in place (PATCH /updateBook)")]
    Rename {
        #[arg(help = "Existing title")]
        original: String,
        #[arg(help = "Replacement title")]
        new: String,
    },
    #[command(about = "Print the library as one comma-separated string (GET /getLibrary)")]
    List,
    #[command(about = "Run the simulated database save (PUT /saveToDatabase)")]
    Save,
}

#[derive(Args)]
struct ServeArgs {
    #[arg(
        long,
        default_value = "127.0.0.1:3000",
        help = "Bind address",
        help_heading = "Connection"
    )]
    bind: String,
    #[arg(
        long,
        help = "Allow non-loopback binds",
        help_heading = "Safety"
    )]
    allow_non_loopback: bool,
    #[arg(
        long,
        default_value_t = DEFAULT_MAX_BODY_BYTES,
        help = "Max request body size in bytes",
        help_heading = "Safety"
    )]
    max_body_bytes: u64,
    #[arg(
        long,
        default_value_t = DEFAULT_LIST_STEP_MS,
        help = "Delay before each title while listing, in milliseconds",
        help_heading = "Simulation"
    )]
    list_step_ms: u64,
    #[arg(
        long,
        default_value_t = DEFAULT_SAVE_SCALE_MS,
        help = "Save delay per title character (times a random factor), in milliseconds",
        help_heading = "Simulation"
    )]
    save_scale_ms: u64,
    #[arg(
        long = "seed",
        value_name = "TITLE",
        help = "Start with this title in the library (repeatable)",
        help_heading = "Simulation"
    )]
    seed: Vec<String>,
}

fn main() {
    let exit_code = match run() {
        Ok(code) => code,
        Err(err) => {
            emit_error(&err);
            to_exit_code(err.kind())
        }
    };
    std::process::exit(exit_code);
}

fn run() -> Result<i32, Error> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => match err.kind() {
            ClapErrorKind::DisplayHelp
            | ClapErrorKind::DisplayVersion
            | ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
                err.print().map_err(|io_err| {
                    Error::new(ErrorKind::Io)
                        .with_message("failed to write help")
                        .with_source(io_err)
                })?;
                let exit_code = if matches!(
                    err.kind(),
                    ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
                ) {
                    2
                } else {
                    0
                };
                return Ok(exit_code);
            }
            _ => {
                return Err(Error::new(ErrorKind::Usage)
                    .with_message(clap_error_summary(&err))
                    .with_hint("Try `bookshelf --help`."));
            }
        },
    };

    dispatch(cli.command, &cli.url)?;
    Ok(0)
}

fn dispatch(command: Command, url: &str) -> Result<(), Error> {
    match command {
        Command::Serve(args) => {
            let config = serve_config_from_args(args)?;
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
                .map_err(|err| {
                    Error::new(ErrorKind::Internal)
                        .with_message("failed to start runtime")
                        .with_source(err)
                })?;
            runtime.block_on(serve::serve(config))
        }
        Command::Add { title } => {
            RemoteClient::new(url)?.add_book(&title)?;
            emit_json(json!({ "success": true }));
            Ok(())
        }
        Command::Remove { title } => {
            RemoteClient::new(url)?.remove_book(&title)?;
            emit_json(json!({ "success": true }));
            Ok(())
        }
        Command::Rename { original, new } => {
            RemoteClient::new(url)?.rename_book(&original, &new)?;
            emit_json(json!({ "success": true }));
            Ok(())
        }
        Command::List => {
            let library = RemoteClient::new(url)?.list_books()?;
            emit_json(json!({ "library": library }));
            Ok(())
        }
        Command::Save => {
            let saved = RemoteClient::new(url)?.save_to_database()?;
            emit_json(json!(saved));
            Ok(())
        }
    }
}

fn serve_config_from_args(args: ServeArgs) -> Result<serve::ServeConfig, Error> {
    let bind: SocketAddr = args.bind.parse().map_err(|err| {
        Error::new(ErrorKind::Usage)
            .with_message("invalid --bind address")
            .with_hint("Use host:port, for example 127.0.0.1:3000.")
            .with_source(err)
    })?;
    Ok(serve::ServeConfig {
        bind,
        allow_non_loopback: args.allow_non_loopback,
        max_body_bytes: args.max_body_bytes,
        latency: Latency::from_millis(args.list_step_ms, args.save_scale_ms),
        seed_titles: args.seed,
    })
}

fn emit_json(value: Value) {
    let encoded = if io::stdout().is_terminal() {
        serde_json::to_string_pretty(&value)
    } else {
        serde_json::to_string(&value)
    };
    let json = encoded.unwrap_or_else(|_| "{\"error\":\"json encode failed\"}".to_string());
    println!("{json}");
}

fn emit_error(err: &Error) {
    if io::stderr().is_terminal() {
        eprintln!("{}", error_text(err));
        return;
    }

    let json = serde_json::to_string(&error_json(err)).unwrap_or_else(|_| {
        "{\"error\":{\"kind\":\"Internal\",\"message\":\"json encode failed\"}}".to_string()
    });
    eprintln!("{json}");
}

fn error_message(err: &Error) -> String {
    if let Some(message) = err.message() {
        return message.to_string();
    }
    match err.kind() {
        ErrorKind::Internal => "internal error".to_string(),
        ErrorKind::Usage => "usage error".to_string(),
        ErrorKind::InvalidInput => "invalid input".to_string(),
        ErrorKind::DuplicateEntry => "duplicate entry".to_string(),
        ErrorKind::NotFound => "not found".to_string(),
        ErrorKind::Io => "i/o error".to_string(),
    }
}

fn error_causes(err: &Error) -> Vec<String> {
    let mut causes = Vec::new();
    let mut cur = err.source();
    while let Some(source) = cur {
        causes.push(source.to_string());
        cur = source.source();
    }
    causes
}

fn error_json(err: &Error) -> Value {
    let mut inner = Map::new();
    inner.insert("kind".to_string(), json!(format!("{:?}", err.kind())));
    inner.insert("message".to_string(), json!(error_message(err)));
    if let Some(hint) = err.hint() {
        inner.insert("hint".to_string(), json!(hint));
    }
    let causes = error_causes(err);
    if !causes.is_empty() {
        inner.insert("causes".to_string(), json!(causes));
    }

    let mut outer = Map::new();
    outer.insert("error".to_string(), Value::Object(inner));
    Value::Object(outer)
}

fn error_text(err: &Error) -> String {
    let mut lines = vec![format!("error: {}", error_message(err))];
    if let Some(hint) = err.hint() {
        lines.push(format!("hint: {hint}"));
    }
    for cause in error_causes(err) {
        lines.push(format!("caused by: {cause}"));
    }
    lines.join("\n")
}

fn clap_error_summary(err: &clap::Error) -> String {
    for line in err.to_string().lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if let Some(rest) = trimmed.strip_prefix("error:") {
            return rest.trim().to_string();
        }
        return trimmed.to_string();
    }
    "invalid arguments".to_string()
}
