// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

//! Logging macros shared by the tProc compiler crates.
//!
//! All records are emitted with the target `tproc::<module path>`, so that a
//! single filter (e.g. `RUST_LOG=tproc=debug`) selects the whole tool chain.
//! Diagnostics are per-gate and per-shot records, logged at info level but
//! only while [`init_logging`] enabled them.

use std::sync::atomic::{AtomicBool, Ordering};

#[doc(hidden)]
pub use log as _log;

#[doc(hidden)]
#[macro_export]
macro_rules! __emit {
    ($level:ident, $($arg:tt)+) => {
        $crate::_log::$level!(target: concat!("tproc::", module_path!()), $($arg)+)
    };
}

#[macro_export]
macro_rules! debug {
    ($($arg:tt)+) => {
        $crate::__emit!(debug, $($arg)+)
    };
}

#[macro_export]
macro_rules! info {
    ($($arg:tt)+) => {
        $crate::__emit!(info, $($arg)+)
    };
}

#[macro_export]
macro_rules! warn {
    ($($arg:tt)+) => {
        $crate::__emit!(warn, $($arg)+)
    };
}

/// Log at info level if diagnostics are enabled.
#[macro_export]
macro_rules! diagnostic {
    ($($arg:tt)+) => {
        if $crate::is_diagnostics_enabled() {
            $crate::__emit!(info, $($arg)+)
        }
    };
}

static DIAGNOSTICS: AtomicBool = AtomicBool::new(false);

#[inline]
pub fn is_diagnostics_enabled() -> bool {
    DIAGNOSTICS.load(Ordering::Relaxed)
}

/// Switch diagnostics on or off.
///
/// No logger is installed here; the `asm-averager` binary sets up
/// `env_logger`, library users keep their own `log` backend.
pub fn init_logging(with_diagnostics: bool) {
    DIAGNOSTICS.store(with_diagnostics, Ordering::Relaxed);
}
