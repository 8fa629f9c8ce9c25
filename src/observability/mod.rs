// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Logging setup.
//!
//! The crate emits structured events through `tracing`; embedding
//! applications may install any subscriber they like. [`init`] offers the
//! default: an fmt subscriber whose filter is read from the `JOBGRAPH_LOG`
//! environment variable (standard `EnvFilter` syntax, e.g.
//! `JOBGRAPH_LOG=jobgraph=debug`), falling back to `info`.

use std::sync::Once;

use tracing_subscriber::EnvFilter;

/// Environment variable consulted for the default log filter.
pub const LOG_ENV_VAR: &str = "JOBGRAPH_LOG";

static INIT: Once = Once::new();

/// Install the default global subscriber. Calling it more than once, or
/// after another subscriber has been installed, is a no-op.
pub fn init() {
    INIT.call_once(|| {
        let filter =
            EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new("info"));
        let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
    });
}
