use std::time::Duration;

use boardsync::{
    init_logging,
    ui::{render_json, render_text},
    ClientConfig, Color, ConnectionManager, ConnectionStatus, EndpointConnector, GameState, GameStateStore,
    PlayerPalette, DEFAULT_ADDRESS, DEFAULT_BOARD_HEIGHT, DEFAULT_BOARD_WIDTH, DEFAULT_RETRY_DELAY,
};
use clap::{Parser, ValueEnum};

#[derive(ValueEnum, Clone, Copy, Debug)]
enum OutputFormat {
    Text,
    Json,
}

/// Mirror a game server's board and print every update.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Server address: ws://, wss:// or tcp://host:port.
    #[arg(long, default_value = DEFAULT_ADDRESS)]
    connect: String,
    /// Wait before reconnecting after the connection drops.
    #[arg(long, default_value_t = DEFAULT_RETRY_DELAY.as_millis() as u64)]
    retry_delay_ms: u64,
    #[arg(long, default_value_t = DEFAULT_BOARD_WIDTH)]
    width: u32,
    #[arg(long, default_value_t = DEFAULT_BOARD_HEIGHT)]
    height: u32,
    /// Pin a cell key to a color, e.g. --color X=red --color O=#ffffff.
    #[arg(long = "color", value_parser = PlayerPalette::parse_override)]
    colors: Vec<(char, Color)>,
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging();

    let config = ClientConfig::new(cli.connect)
        .with_retry_delay(Duration::from_millis(cli.retry_delay_ms))
        .with_initial_size(cli.width, cli.height);
    if let Err(e) = config.validate() {
        match e {
            boardsync::ConfigError::InvalidAddress(_) => {
                log::warn!("{}; attempts will keep failing until the server is reachable", e)
            }
            other => return Err(other.into()),
        }
    }

    let palette = cli
        .colors
        .into_iter()
        .fold(PlayerPalette::new(), |palette, (key, color)| palette.with_override(key, color));

    let store = GameStateStore::from_config(&config);
    let mut manager = ConnectionManager::new(config, store.clone(), palette);
    let handle = manager.handle();

    let format = cli.format;
    let print = move |state: &GameState, status: ConnectionStatus| match format {
        OutputFormat::Text => println!("{}", render_text(state, status)),
        OutputFormat::Json => match render_json(state, status) {
            Ok(line) => println!("{line}"),
            Err(e) => log::warn!("failed to encode state: {}", e),
        },
    };

    print(&*store.state(), handle.status());
    let status = handle.clone();
    let subscription = store.subscribe(move |state| print(&**state, status.status()));

    let mut connector = EndpointConnector::new();
    let interrupt = async {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::info!("interrupted, shutting down");
        }
        handle.disconnect();
    };
    tokio::join!(manager.run(&mut connector), interrupt);

    store.unsubscribe(subscription);
    Ok(())
}
