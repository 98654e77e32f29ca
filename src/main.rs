//! mintwatch - SPL Token Mint Birth Watcher
//!
//! Run modes:
//!   cargo run                    - Show usage
//!   cargo run -- watch           - Track mint births and serve the API
//!   cargo run -- snapshot        - Count current mint accounts at the latest slot

use mintwatch::common::{init_from_settings, MintWatchError, WatcherSettings};
use mintwatch::mint_tracker::{
    create_tracker_service, start_api_server, summarize_snapshot, LedgerSource, MintEvent,
    SolanaMintSource,
};
use std::env;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        print_usage();
        return;
    }

    let result = match args[1].as_str() {
        "watch" => run_watch(&args[2..]).await,
        "snapshot" => run_snapshot().await,
        "help" | "--help" | "-h" => {
            print_usage();
            Ok(())
        }
        _ => {
            print_usage();
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("Error [{}]: {}", e.error_code(), e);
        std::process::exit(1);
    }
}

fn print_usage() {
    println!("mintwatch - SPL Token Mint Birth Watcher");
    println!();
    println!("Usage:");
    println!("  mintwatch watch [--interval-ms <ms>] [--no-seed] [--port <port>]");
    println!("                                  Track mint births and serve the API");
    println!("  mintwatch snapshot              Count current mint accounts");
    println!("  mintwatch help                  Show this message");
    println!();
    println!("Environment Variables:");
    println!("  MINTWATCH_NETWORK               mainnet | testnet | devnet (default: mainnet)");
    println!("  MINTWATCH_SOLANA_RPC            Solana RPC endpoint");
    println!("  MINTWATCH_SOLANA_WS             Solana pubsub endpoint (derived from RPC)");
    println!("  MINTWATCH_PROGRAM_ID            Token program to watch");
    println!("  MINTWATCH_POLL_INTERVAL_MS      Reconciliation period, 0 disables (default: 60000)");
    println!("  MINTWATCH_SEED_EXISTING         Mark existing mints seen on start (default: true)");
    println!("  MINTWATCH_BLOCK_TIME_TIMEOUT_MS Block time lookup timeout (default: 2000)");
    println!("  MINTWATCH_EVENT_CAPACITY        Event buffer size (default: 1024)");
    println!("  MINTWATCH_API_PORT              API port (default: 3002)");
    println!("  MINTWATCH_LOG_LEVEL             trace | debug | info | warn | error");
    println!("  MINTWATCH_LOG_JSON              Emit JSON log lines");
}

async fn run_watch(args: &[String]) -> Result<(), MintWatchError> {
    let mut settings = WatcherSettings::from_env()?;

    // Parse arguments
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--interval-ms" if i + 1 < args.len() => {
                settings.tracker.poll_interval_ms = args[i + 1]
                    .parse()
                    .unwrap_or(settings.tracker.poll_interval_ms);
                i += 2;
            }
            "--port" if i + 1 < args.len() => {
                settings.api_port = args[i + 1].parse().unwrap_or(settings.api_port);
                i += 2;
            }
            "--no-seed" => {
                settings.tracker.seed_existing_on_start = false;
                i += 1;
            }
            _ => i += 1,
        }
    }

    init_from_settings(&settings)?;
    settings.print_summary();

    let source = Arc::new(SolanaMintSource::from_settings(&settings));
    let service = create_tracker_service(source, settings.tracker.clone());

    let mut events = service.subscribe();
    let printer = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(MintEvent::Birth(birth)) => {
                    println!(
                        "[birth] mint={} creator={} slot={} ts={}",
                        birth.mint, birth.creator, birth.first_seen_slot, birth.timestamp
                    );
                }
                Ok(MintEvent::Error { message }) => eprintln!("[error] {}", message),
                Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => break,
            }
        }
    });

    service.start().await?;

    let api = tokio::spawn(start_api_server(service.clone(), settings.api_port));

    println!("Watching for new mints...");
    println!("Press Ctrl+C to stop");
    println!();

    let outcome: Result<(), MintWatchError> = tokio::select! {
        result = tokio::signal::ctrl_c() => {
            info!("shutdown requested");
            result.map_err(MintWatchError::from)
        }
        result = api => match result {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => {
                error!(error = %e, "API server failed");
                Err(e.into())
            }
            Err(e) => Err(MintWatchError::api(e.to_string())),
        },
    };

    service.stop();
    printer.abort();
    println!("Stopped. Stats: {:?}", service.stats());
    outcome
}

async fn run_snapshot() -> Result<(), MintWatchError> {
    let settings = WatcherSettings::from_env()?;
    init_from_settings(&settings)?;

    let source = SolanaMintSource::from_settings(&settings);
    println!("Fetching mint accounts from {} ...", settings.solana_rpc);

    let records = source.fetch_mint_accounts().await?;
    let summary = summarize_snapshot(&records);

    println!("Program: {}", source.program_id());
    match summary.slot {
        Some(slot) => println!("Slot: {}", slot),
        None => println!("Slot: -"),
    }
    println!("Mint accounts: {}", summary.accounts);
    println!("Initialized: {}", summary.initialized);

    Ok(())
}
