//! CLI for KidOS
//!
//! Subcommands:
//! - `master`: run the broker
//! - `talker`: demo node publishing a counter on a topic
//! - `listener`: demo node printing what arrives on a topic

use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use kidos::config::load_config;
use kidos::utils::logging;
use kidos::{Master, Node};
use serde_json::Value;
use tracing::{error, info};

const DEFAULT_ADDR: &str = "127.0.0.1:12345";
const DEFAULT_TOPIC: &str = "hello_topic";

#[derive(Parser)]
#[command(name = "kidos", version, about = "Minimal publish/subscribe broker")]
enum Command {
    /// Run the master until interrupted
    Master {
        /// Interface to listen on (overrides configuration)
        #[arg(long)]
        host: Option<String>,
        /// Port to listen on (overrides configuration)
        #[arg(long)]
        port: Option<u16>,
    },
    /// Publish "Hello KidOS! Count: n" on a topic at a fixed interval
    Talker {
        #[arg(long, default_value = DEFAULT_ADDR)]
        addr: String,
        #[arg(long, default_value = DEFAULT_TOPIC)]
        topic: String,
        #[arg(long, default_value_t = 1000)]
        interval_ms: u64,
    },
    /// Print every payload received on a topic
    Listener {
        #[arg(long, default_value = DEFAULT_ADDR)]
        addr: String,
        #[arg(long, default_value = DEFAULT_TOPIC)]
        topic: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cmd = Command::parse();

    let mut settings = match load_config() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            return ExitCode::FAILURE;
        }
    };
    if let Err(e) = logging::init(&settings.logging.level) {
        eprintln!("{e}");
        return ExitCode::FAILURE;
    }

    let result = match cmd {
        Command::Master { host, port } => {
            if let Some(host) = host {
                settings.master.host = host;
            }
            if let Some(port) = port {
                settings.master.port = port;
            }
            run_master(&settings).await
        }
        Command::Talker {
            addr,
            topic,
            interval_ms,
        } => run_talker(&addr, &topic, Duration::from_millis(interval_ms)).await,
        Command::Listener { addr, topic } => run_listener(&addr, &topic).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn run_master(settings: &kidos::config::Settings) -> kidos::Result<()> {
    let master = Master::bind(settings).await?;
    master
        .run_until(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
}

async fn run_talker(addr: &str, topic: &str, interval: Duration) -> kidos::Result<()> {
    let node = Node::connect("talker", addr).await?;
    let publisher = node.create_publisher(topic).await?;
    let mut ticker = tokio::time::interval(interval);

    for count in 0u64.. {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = tokio::signal::ctrl_c() => break,
        }
        let message = format!("Hello KidOS! Count: {count}");
        publisher.publish(Value::from(message.as_str())).await?;
        println!("Published: {message}");
    }

    node.destroy().await
}

async fn run_listener(addr: &str, topic: &str) -> kidos::Result<()> {
    let node = Node::connect("listener", addr).await?;
    node.create_subscription(topic, |data| match data {
        Value::String(text) => println!("Received: {text}"),
        other => println!("Received: {other}"),
    })
    .await?;

    info!(topic, "listener started, waiting for messages");
    let _ = tokio::signal::ctrl_c().await;
    node.destroy().await
}
