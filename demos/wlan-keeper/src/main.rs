//! Command-line keeper for campus WLAN portals.
//!
//! Usage: `wlan-keeper [CONFIG]`, where `CONFIG` is a JSON file holding a
//! [`KeeperConfig`] (defaults to `keeper.json` in the working directory).
//! Runs until Ctrl-C, then logs out of the portal and exits. Log verbosity
//! follows `RUST_LOG`.

use std::path::Path;
use std::time::Duration;

use portkeep::prelude::*;

/// Per-request deadline for the command-line tool.
///
/// The library default leaves requests unbounded; an interactive tool wants
/// a stuck LAN to surface as an error instead of a hang.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

fn load_config(path: &Path) -> Result<KeeperConfig, Box<dyn std::error::Error>> {
    let raw = std::fs::read_to_string(path)
        .map_err(|err| format!("cannot read config {}: {err}", path.display()))?;
    let config: KeeperConfig = serde_json::from_str(&raw)
        .map_err(|err| format!("cannot parse config {}: {err}", path.display()))?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    portkeep::logging::init();

    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "keeper.json".to_owned());
    let config = load_config(Path::new(&path))?;

    let mut keeper = KeeperBuilder::new(config)
        .request_timeout(REQUEST_TIMEOUT)
        .build()?;

    let cancel = keeper.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel.cancel();
        }
    });

    keeper.run().await;
    Ok(())
}
