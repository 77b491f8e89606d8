use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use log::error;

use a2squery::{QueryConfig, QueryOutcome, ServerQuery, SourceQueryError};

/// Query a Source engine game server.
#[derive(Debug, Parser)]
#[command(name = "a2squery", version)]
struct Args {
    /// Server address: host:port, host,port or steam://connect/host:port
    address: String,

    /// Send and receive timeout in milliseconds
    #[arg(long, default_value_t = 2000)]
    timeout_ms: u64,

    /// Query A2S_INFO
    #[arg(long)]
    info: bool,

    /// Query A2S_PLAYER
    #[arg(long)]
    players: bool,

    /// Query A2S_RULES
    #[arg(long)]
    rules: bool,
}

fn print_outcome<T: std::fmt::Debug>(name: &str, outcome: QueryOutcome<T>) {
    match outcome {
        QueryOutcome::Data(data) => println!("{}: {:#?}", name, data),
        QueryOutcome::NoData(anomaly) => println!("{}: no data ({})", name, anomaly),
    }
}

async fn run(args: Args) -> Result<(), SourceQueryError> {
    let timeout: Duration = Duration::from_millis(args.timeout_ms);
    let config: QueryConfig = QueryConfig::default().with_timeouts(timeout, timeout);
    let query: ServerQuery = ServerQuery::connect(&args.address, config).await?;

    // no flags means everything
    let all: bool = !(args.info || args.players || args.rules);

    if all || args.info {
        print_outcome("info", query.info().await?);
    }
    if all || args.players {
        print_outcome("players", query.players().await?);
    }
    if all || args.rules {
        print_outcome("rules", query.rules().await?);
    }

    query.close().await;
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::init();

    match run(Args::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
