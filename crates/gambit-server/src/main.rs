//! Chess relay server.
//!
//! ```text
//! GAMBIT_BIND=0.0.0.0:8000 GAMBIT_SWEEP_INTERVAL_MS=1000 cargo run -p gambit-server
//! ```
//!
//! Log verbosity follows `RUST_LOG` (default `info`).

use gambit::prelude::*;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), GambitError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = ServerConfig::from_env();
    let server = GambitServerBuilder::new()
        .config(config)
        .build::<ChessEngine>()
        .await?;

    tracing::info!(addr = %server.local_addr()?, "listening");
    server.run().await
}
