pub mod installer;

pub use installer::{ArchiveInstaller, ReleaseInstaller};
