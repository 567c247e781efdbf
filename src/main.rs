//! knx-bridge host process.
//!
//! Reads one JSON command per line on stdin and writes one JSON message per
//! line on stdout. Logs go to stderr. Stops on Ctrl-C or end of input.

use clap::Parser;
use knx_bridge::net::transport::BusConnector;
use knx_bridge::{Bridge, BridgeConfig, HostCommand, KnxdConnector, Outbox, OutgoingMessage};
use std::future::Future;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;

const DEFAULT_CONFIG_PATH: &str = "knx.json";

#[derive(Parser, Debug)]
#[command(about = "Bridge a KNX bus to a JSON-lines host channel")]
struct Cli {
    #[clap(long)]
    #[arg(default_value_t = false)]
    verbose: bool,

    /// Configuration file
    #[clap(long)]
    #[arg(default_value_t = DEFAULT_CONFIG_PATH.to_string())]
    config: String,

    /// knxd endpoint, overrides the configuration file
    #[clap(long)]
    connection: Option<String>,
}

async fn print_messages(mut messages: mpsc::UnboundedReceiver<OutgoingMessage>) -> std::io::Result<()> {
    let mut stdout = tokio::io::stdout();
    while let Some(message) = messages.recv().await {
        let mut line = match message.to_json() {
            Ok(line) => line,
            Err(e) => {
                log::error!("cannot encode {message:?}: {e}");
                continue;
            }
        };
        line.push('\n');
        stdout.write_all(line.as_bytes()).await?;
        stdout.flush().await?;
    }
    Ok(())
}

/// Feed host commands to `bridge` until the input ends or `interrupt`
/// completes. A command still being handled is abandoned on interrupt.
async fn serve<C, R>(bridge: &Bridge<C>, input: R, interrupt: impl Future)
where
    C: BusConnector,
    R: AsyncBufRead + Unpin,
{
    tokio::pin!(interrupt);
    let mut lines = input.lines();
    loop {
        let line = tokio::select! {
            line = lines.next_line() => line,
            _ = &mut interrupt => break,
        };
        let command = match line {
            Ok(Some(line)) if line.trim().is_empty() => continue,
            Ok(Some(line)) => match HostCommand::from_json(&line) {
                Ok(command) => command,
                Err(e) => {
                    log::warn!("ignoring {line:?}: {e}");
                    continue;
                }
            },
            Ok(None) => {
                log::info!("host channel closed");
                return;
            }
            Err(e) => {
                log::error!("reading host channel: {e}");
                return;
            }
        };
        tokio::select! {
            () = bridge.handle(command) => {}
            _ = &mut interrupt => break,
        }
    }
    log::info!("interrupted");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        log::LevelFilter::Trace
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::new()
        .target(env_logger::Target::Stderr)
        .filter_level(log_level)
        .parse_default_env()
        .format_timestamp(Some(env_logger::TimestampPrecision::Millis))
        .init();

    let mut config = BridgeConfig::load(&cli.config)?;
    if let Some(connection) = cli.connection {
        config.connection = connection;
    }
    let connector = KnxdConnector::new(&config.connection)?;
    log::info!("using knxd at {}", connector.endpoint());

    let (outbox, messages) = Outbox::channel();
    let printer = tokio::spawn(print_messages(messages));
    let bridge = Bridge::start(&config, connector, outbox)?;

    serve(&bridge, BufReader::new(tokio::io::stdin()), tokio::signal::ctrl_c()).await;

    bridge.shutdown().await;
    printer.await??;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use knx_bridge::MockBus;
    use std::time::Duration;
    use tokio::time::timeout;

    const CONFIG: &str = r#"{"devices": [
        {"name": "Blind", "type": "shutter", "channel": [1, 2, 4],
         "attributes": {"short": "0/1/1", "long": "0/1/2"}}
    ]}"#;

    fn bridge() -> (Bridge<MockBus>, mpsc::UnboundedReceiver<OutgoingMessage>) {
        let (outbox, messages) = Outbox::channel();
        let config = BridgeConfig::from_json(CONFIG).unwrap();
        (Bridge::start(&config, MockBus::new(), outbox).unwrap(), messages)
    }

    #[tokio::test]
    async fn test_serve_until_end_of_input() {
        let (bridge, mut messages) = bridge();
        let input: &[u8] = br#"
{"action": "query"}
not json
{"action": "write", "channel": "1/2/4", "payload": "up"}
"#;

        timeout(Duration::from_secs(1), serve(&bridge, input, std::future::pending::<()>()))
            .await
            .unwrap();

        assert!(matches!(messages.recv().await, Some(OutgoingMessage::Announce { .. })));
        assert!(matches!(messages.recv().await, Some(OutgoingMessage::State { .. })));
        bridge.shutdown().await;
    }

    #[tokio::test]
    async fn test_interrupt_ends_pending_input() {
        let (bridge, mut messages) = bridge();
        let (mut host, input) = tokio::io::duplex(256);
        host.write_all(b"{\"action\": \"query\"}\n").await.unwrap();

        // input stays open, only the interrupt can end the loop
        let interrupt = tokio::time::sleep(Duration::from_millis(100));
        timeout(Duration::from_secs(1), serve(&bridge, BufReader::new(input), interrupt))
            .await
            .unwrap();

        assert!(matches!(messages.recv().await, Some(OutgoingMessage::Announce { .. })));
        drop(host);
        bridge.shutdown().await;
    }
}
