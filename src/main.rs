//! ledctl — interactive request client for the remote LED actuator
//! service.
//!
//! Runs the dialogue on stdin and reports request outcomes on stdout.
//! Without a deployed middleware it talks to the bundled loopback
//! service, which makes the binary a self-contained demo of the whole
//! request/response cycle.

use std::process::ExitCode;

use clap::Parser;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use ledctl::{
    client, ClientConfig, LedClient, LoopbackService, Notification, Protocol, StdinSource,
};

/// Send LED control requests to the remote actuator service.
#[derive(Parser, Debug)]
#[command(name = "ledctl", version)]
struct Args {
    /// Prefer TCP over UDP for the middleware transport
    #[arg(long)]
    tcp: bool,

    /// Suppress request/response report lines
    #[arg(long)]
    quiet: bool,

    /// Minimum delay between consecutive requests, in milliseconds
    #[arg(long, default_value_t = 1000)]
    cycle: u64,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::WARN.into())
                .from_env_lossy(),
        )
        .init();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Couldn't initialize client: {err}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> ledctl::Result<()> {
    let protocol = if args.tcp { Protocol::Tcp } else { Protocol::Udp };
    println!(
        "Client settings [protocol={protocol}:quiet={}:cycle={}]",
        args.quiet, args.cycle
    );

    let config = ClientConfig::builder()
        .cycle_ms(args.cycle)
        .preferred_protocol(protocol)
        .build();

    let (events, intake) = client::event_channel();
    let service = LoopbackService::connect(events, config.endpoint);
    let (led_client, mut notifications) =
        LedClient::spawn(config, intake, service, StdinSource::new());

    // Quiet mode silences the report stream only; it never gates sending.
    let quiet = args.quiet;
    let printer = tokio::spawn(async move {
        while let Some(report) = notifications.recv().await {
            if quiet {
                continue;
            }
            match report {
                Notification::ResponseReceived { .. } | Notification::MalformedResponse { .. } => {
                    println!("{report}");
                    println!("\n*************************************");
                }
                _ => println!("{report}"),
            }
        }
    });

    let cancel = led_client.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel.cancel();
        }
    });

    led_client.wait().await;
    let _ = printer.await;
    Ok(())
}
