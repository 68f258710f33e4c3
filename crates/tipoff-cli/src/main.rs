//! 🚀 tipoff-cli - the front door, the bouncer, the maitre d' of tipoff.
//!
//! 🎬 *[narrator voice]* "It all started with a simple main() function..."
//! 📦 This binary crate is the thin CLI wrapper that sets up logging, loads config,
//! and then lets the real code do the heavy lifting. Like a manager. 🦆

use anyhow::{Context, Result};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// 🚀 main() - where it all begins. Tip-off.
///
/// 🔧 Steps:
/// 1. Init tracing (so we can see what goes wrong, and when)
/// 2. Load config (env vars, plus a TOML file if one was passed as the first arg)
/// 3. Run the relay until someone says stop or the provider hangs up
/// 4. Handle errors (cry, then exit 1)
#[tokio::main]
async fn main() -> Result<()> {
    // 📡 RUST_LOG wins if it's set. Otherwise: info. Console only, as promised.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    // 🎯 Optional config file. No file? Env vars only. We don't assume pineapple on the pizza.
    let config_file = std::env::args().nth(1).map(std::path::PathBuf::from);

    let result = async {
        let app_config = tipoff::app_config::load_config(config_file.as_deref())
            .context("💀 In tipoff-cli, main, we couldn't assemble the configuration. Check the env vars and the file, if you passed one.")?;
        tipoff::run(app_config).await
    }
    .await;

    match result {
        Ok(exit) => {
            info!("✅ Done ({:?}). Pop the champagne. 🍾", exit);
            Ok(())
        }
        Err(err) => {
            error!("💀 error: {}", err);
            // -- 🧅 peel the onion of sadness, one layer at a time
            for cause in err.chain().skip(1) {
                error!("⚠️  cause: {}", cause);
            }
            // 🗑️ Exit with prejudice. Process exitus maximus.
            std::process::exit(1);
        }
    }
}
