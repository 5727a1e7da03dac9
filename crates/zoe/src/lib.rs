// SPDX-FileCopyrightText: 2026 Zoe Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Composition root for the Zoe assistant core.
//!
//! [`AppContext`] owns the database, the timer service, the module loader,
//! the intent pipeline and the lazily created metrics collector. The `zoe`
//! binary builds one per process.

pub mod context;
pub mod shutdown;

pub use context::{AppContext, CONSOLE_DEVICE, build_pipeline};
pub use shutdown::install_signal_handler;
