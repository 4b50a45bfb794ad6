use std::{
    fs::File,
    sync::{Arc, Mutex},
};

use auto_bridge::{
    activity::ActivityLog,
    balances::{spawn_refresher, BalanceBoard, REFRESH_INTERVAL},
    calls::short_hex,
    client::{AlloyClient, ChainClient},
    config::{Args, Config},
    console::Console,
    sequencer::BridgeController,
};
use clap::Parser;
use colored::Colorize;
use tokio::io::BufReader;
use time::UtcOffset;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

fn main() -> eyre::Result<()> {
    // The local offset can only be read while the process is single threaded.
    let offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(run(Args::parse(), offset))
}

async fn run(args: Args, offset: UtcOffset) -> eyre::Result<()> {
    if let Err(err) = dotenvy::from_path(&args.env_file) {
        if !err.not_found() {
            return Err(err.into());
        }
    }
    init_tracing(&args)?;

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{}", format!("Fatal Error: {err}").red());
            std::process::exit(1);
        }
    };
    tracing::debug!(?config, "configuration loaded");

    let log = Arc::new(ActivityLog::new(args.log_width).with_offset(offset));
    log.system("Initializing...");

    let client = Arc::new(AlloyClient::new(config.signer));
    log.info(format!("Wallet: {}", short_hex(&client.address().to_string())));

    let registry = Arc::new(config.registry);
    let balances = Arc::new(BalanceBoard::default());
    let controller = Arc::new(BridgeController::new(
        registry.clone(),
        client.clone(),
        log.clone(),
        balances.clone(),
    ));

    log.system("Fetching initial network balances...");
    balances.refresh(&registry, client.as_ref()).await;

    let stop = CancellationToken::new();
    let refresher = spawn_refresher(
        balances.clone(),
        registry,
        client.clone(),
        REFRESH_INTERVAL,
        stop.clone(),
    );

    log.success("Bridge bot is ready. Select an action.");
    log.warning("Note: Verify all Sepolia RPC endpoints and contracts if needed.");

    let console = Console::new(
        controller,
        log,
        balances,
        client.as_ref(),
        std::io::stdout(),
    );
    let result = console.run(BufReader::new(tokio::io::stdin())).await;

    stop.cancel();
    refresher.await?;
    result
}

fn init_tracing(args: &Args) -> eyre::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(args.log_level.to_string()));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match &args.log_file {
        Some(path) => builder
            .with_ansi(false)
            .with_writer(Mutex::new(File::create(path)?))
            .init(),
        None => builder.with_writer(std::io::stderr).init(),
    }
    Ok(())
}
