pub mod contract;
pub mod definition;
pub mod xonotic;

pub use contract::GameServerPlugin;
pub use definition::{xonotic_plugin_info, GameDefinition, PluginInfo};
pub use xonotic::XonoticServer;
