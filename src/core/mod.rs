// ─── Nation Launcher Core ───
// Backend for the community client launcher: authenticate, provision the
// managed runtime and mod loader, mirror the mod repository, launch.
//
// Architecture:
//   core/
//     account/       — Remote account table + register/login service
//     config         — Last-logged-in identity on disk
//     downloader     — Sequential HTTP file downloads
//     events         — Single typed event stream to the frontend
//     install_state  — Persisted per-artifact install progress
//     launch         — Preconditions, launch spec, game process monitor
//     modloader      — Forge installer subprocess + version discovery
//     mods           — Remote listing sync into the mods directory
//     paths          — Directory layout under the launcher root
//     runtime        — Managed Java runtime install
//     session        — Derived pseudo-identity for a launch
//     state          — Global application state

pub mod account;
pub mod config;
pub mod downloader;
pub mod error;
pub mod events;
pub mod http;
pub mod install_state;
pub mod launch;
pub mod modloader;
pub mod mods;
pub mod paths;
pub mod runtime;
pub mod session;
pub mod state;
