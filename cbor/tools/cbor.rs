/*!
CBOR Tools - A CLI for working with Quarry RPC payloads

# Commands

- `inspect`: Decode CBOR and display it as diagnostic notation, JSON or hex
- `compose`: Convert JSON to CBOR

# Examples

```bash
# Inspect a captured RPC frame
cbor inspect response.cbor

# Decode in 7-byte chunks, as if read from a socket, with debug logging
RUST_LOG=quarry_cbor=trace cbor inspect --chunk 7 response.cbor

# Inspect as JSON (lossy)
cbor inspect --format json response.cbor

# Compose a request from JSON
echo '{"id": 1, "method": "ping"}' | cbor compose -o request.cbor

# Round-trip test
cbor compose request.json | cbor inspect --format json -
```
*/

use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, filter::LevelFilter};

mod compose;
mod inspect;
mod io;

/// A CLI tool for working with CBOR data
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "A CLI tool for inspecting and composing Quarry CBOR payloads"
)]
struct Cli {
    /// Log level used when RUST_LOG is not set
    #[arg(long, default_value = "warn", global = true)]
    log_level: LevelFilter,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Decode and display CBOR data in various formats
    Inspect(inspect::Command),

    /// Convert JSON to CBOR binary
    Compose(compose::Command),
}

fn init_logger(log_level: LevelFilter) {
    let filter = EnvFilter::builder()
        .with_default_directive(log_level.into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(log_level > LevelFilter::INFO)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logger(cli.log_level);

    match cli.command {
        Commands::Inspect(args) => args.exec(),
        Commands::Compose(args) => args.exec(),
    }
}
