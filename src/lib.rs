pub mod core;

use tracing_subscriber::EnvFilter;

pub use crate::core::error::{ServerError, ServerResult};
pub use crate::core::plugin::{GameDefinition, GameServerPlugin, PluginInfo, XonoticServer};
pub use crate::core::settings::{ManagerSettings, ServerConfig};
pub use crate::core::version::Version;

/// Install the structured logging subscriber. Later calls are no-ops.
pub fn init_tracing() {
    let initialized = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,xonotic_gsm=debug")),
        )
        .try_init()
        .is_ok();

    if initialized {
        tracing::info!("xonotic-gsm {} ready", env!("CARGO_PKG_VERSION"));
    }
}
