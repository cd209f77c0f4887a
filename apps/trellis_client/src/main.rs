use std::sync::Arc;

use clap::Parser;
use tracing::{Level, error, info, warn};

use trellis_bridge::{CallableTracker, DecodedValue};
use trellis_log::{LogConfig, init_logging};
use trellis_protocol::{TcpTransport, Transport};

mod render;
mod widget;

use widget::{WidgetSession, preserved_data};

const VERSION: &str = "0.1.0";

/// Trellis Client - render widgets driven by a remote compute backend
#[derive(Parser, Debug)]
#[command(name = "trellis_client")]
#[command(version = VERSION)]
#[command(about = "Trellis widget client", long_about = None)]
struct Args {
    /// Backend address (host:port, or from TRELLIS_SERVER env)
    #[arg(short, long, env = "TRELLIS_SERVER")]
    server: String,

    /// Name of the widget to fetch and render
    #[arg(short, long, env = "TRELLIS_WIDGET")]
    widget: String,

    /// Minimum log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: Level,

    /// Optional file to also write logs to
    #[arg(long)]
    log_file: Option<std::path::PathBuf>,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let config = LogConfig::new("trellis_client::").with_level(args.log_level);
    let config = match &args.log_file {
        Some(path) => match std::fs::File::create(path) {
            Ok(file) => config.with_log_file(file),
            Err(e) => {
                eprintln!("Cannot open log file {}: {}", path.display(), e);
                return;
            }
        },
        None => config,
    };
    if let Err(e) = init_logging(config) {
        eprintln!("Failed to initialize logging: {}", e);
        return;
    }

    info!("Trellis client v{}", VERSION);
    info!("Connecting to {}", args.server);

    let transport = match TcpTransport::connect(args.server.as_str()).await {
        Ok(transport) => transport,
        Err(e) => {
            error!("Connection to {} failed: {}", args.server, e);
            return;
        }
    };
    let client: Arc<dyn Transport> = Arc::new(transport);

    // One tracker per connection; dropped proxies release their remote side
    // through it for as long as the process runs
    let tracker = CallableTracker::for_transport(Arc::clone(&client));
    let session = WidgetSession::new(Arc::clone(&client), tracker);

    info!("Fetching widget '{}'", args.widget);
    let document = match session.fetch(&args.widget).await {
        Ok(document) => document,
        Err(e) => {
            error!("Failed to fetch widget '{}': {}", args.widget, e);
            return;
        }
    };

    print!("{}", render::render_document(&document.root));

    let preserved = preserved_data(document.data.as_ref());
    match &preserved.panel_ids {
        Some(ids) => info!("Panels to restore on reload: {}", ids.join(", ")),
        None => info!("No panels to restore"),
    }

    // Exercise the root's press handler once, if the widget exposes one
    let handler = document
        .root
        .get("props")
        .and_then(|props| props.get("onPress"))
        .and_then(DecodedValue::as_callable);
    if let Some(proxy) = handler {
        info!("Invoking onPress handler '{}'", proxy.id());
        match proxy.call(vec![]).await {
            Ok(result) => info!("onPress returned: {:?}", result),
            Err(e) => warn!("onPress invocation failed: {}", e),
        }
    }

    info!("Done");
}
