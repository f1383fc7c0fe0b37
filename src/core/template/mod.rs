pub mod server_cfg;

pub use server_cfg::{substitute, ConfigTemplater};
