//! Conditional logging macros gated by a module-level `ENABLE_LOGS` flag and
//! by the process-wide stealth flag.
//!
//! Usage:
//! ```rust,ignore
//! // In your module, define the flag first:
//! const ENABLE_LOGS: bool = true;
//!
//! // Then use the macros (they're exported at the crate root):
//! use crate::{log_info, log_warn, log_error};
//!
//! log_info!("This will log if ENABLE_LOGS is true and stealth mode is off");
//! ```
//!
//! Stealth mode silences every macro. The flag is mirrored from the settings
//! store by [`follow_settings`].

use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::watch;

use crate::settings::Settings;

static STEALTH: AtomicBool = AtomicBool::new(false);

pub fn stealth_enabled() -> bool {
    STEALTH.load(Ordering::Relaxed)
}

pub fn set_stealth(enabled: bool) {
    STEALTH.store(enabled, Ordering::Relaxed);
}

/// Seeds the stealth flag and reports it. This line ignores the gate on purpose
/// so a silent process can still be told apart from a broken one.
pub fn init_stealth(enabled: bool) {
    set_stealth(enabled);
    log::info!(
        "[logger] stealth mode is {}",
        if enabled { "ENABLED" } else { "DISABLED" }
    );
}

/// Keeps the stealth flag in sync with the settings store until the store is dropped.
pub async fn follow_settings(rx: watch::Receiver<Settings>) {
    mirror_stealth(rx, &STEALTH).await
}

async fn mirror_stealth(mut rx: watch::Receiver<Settings>, flag: &AtomicBool) {
    while rx.changed().await.is_ok() {
        let stealth = rx.borrow_and_update().stealth_mode;
        flag.store(stealth, Ordering::Relaxed);
    }
}

/// Macro for conditional info logging.
/// Checks the `ENABLE_LOGS` const in the calling module and the stealth flag.
///
/// Each module that uses this macro must define:
/// ```rust,ignore
/// const ENABLE_LOGS: bool = true; // or false
/// ```
#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        if ENABLE_LOGS && !$crate::utils::logging::stealth_enabled() {
            ::log::info!($($arg)*);
        }
    };
}

/// Macro for conditional warn logging.
#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        if ENABLE_LOGS && !$crate::utils::logging::stealth_enabled() {
            ::log::warn!($($arg)*);
        }
    };
}

/// Macro for conditional error logging.
#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {
        if ENABLE_LOGS && !$crate::utils::logging::stealth_enabled() {
            ::log::error!($($arg)*);
        }
    };
}
