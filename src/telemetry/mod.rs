// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Structured logging.
//!
//! Initialize once at startup:
//!
//! ```rust,ignore
//! use codepilot::telemetry::{init_telemetry, TelemetryConfig};
//!
//! init_telemetry(&TelemetryConfig::default())?;
//! ```
//!
//! Session entry points carry `#[instrument]` spans with the session id, so
//! every routed message and approval step can be traced back to its connection.

mod init;

pub use init::{init_telemetry, TelemetryConfig};
