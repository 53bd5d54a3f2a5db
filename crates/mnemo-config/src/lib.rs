// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration system for the mnemo memory engine.
//!
//! Loads layered TOML configuration (XDG hierarchy plus `MNEMO_*`
//! environment overrides) into typed structs with compiled defaults.

pub mod loader;
pub mod model;

pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::MnemoConfig;
