// ─── Server Lifecycle Core ───
// Install, update and supervise one dedicated game server installation.
//
// Architecture:
//   core/
//     version/    — Remote release feed + local version marker
//     downloader/ — Streaming downloads with progress reporting
//     archive/    — Zip extraction
//     backup/     — Tree copy + user data snapshot/restore
//     install/    — Fresh install from a versioned archive
//     update/     — Data-preserving wipe-and-reinstall
//     process/    — Server process start/stop + console capture
//     template/   — Server config templates
//     plugin/     — Game definition + host-facing capability trait

pub mod archive;
pub mod backup;
pub mod downloader;
pub mod error;
pub mod http;
pub mod install;
pub mod paths;
pub mod plugin;
pub mod process;
pub mod settings;
pub mod template;
pub mod update;
pub mod version;

#[cfg(test)]
pub(crate) mod testing;
