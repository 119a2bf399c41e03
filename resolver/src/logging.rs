//! Logging configuration for the scope resolver
//!
//! Thin wrapper over `log` and `env_logger` so binaries and tests initialize
//! logging the same way.
//!
//! # Log Levels
//!
//! - `error!` - Failures that abort a compilation unit
//! - `warn!` - Suspicious input the resolver still accepts
//! - `info!` - Unit start/finish
//! - `debug!` - Scope push/pop and collection summaries
//! - `trace!` - Every reference and member binding
//!
//! # Environment Variable
//!
//! ```bash
//! RUST_LOG=warn scopecheck resolve main.json            # Default, quiet output
//! RUST_LOG=resolver::walk=trace scopecheck resolve main.json
//! ```

use env_logger::Builder;
use log::LevelFilter;
use std::io::Write;
use std::sync::Once;

static INIT: Once = Once::new();

/// Initialize logging at Warn level. Later calls are no-ops.
pub fn init() {
    init_with_level(LevelFilter::Warn);
}

/// Initialize logging with a specific level. Later calls are no-ops.
pub fn init_with_level(level: LevelFilter) {
    INIT.call_once(|| {
        Builder::new()
            .filter_level(level)
            .format(|buf, record| {
                writeln!(
                    buf,
                    "[{:5}] {} - {}",
                    record.level(),
                    record.module_path().unwrap_or("unknown"),
                    record.args()
                )
            })
            .init();
    });
}

/// Initialize logging from `RUST_LOG`, defaulting to `warn`.
pub fn init_from_env() {
    INIT.call_once(|| {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    });
}

/// Initialize logging for tests; safe to call from every test.
pub fn init_test() {
    let _ = env_logger::builder()
        .filter_level(LevelFilter::Warn)
        .is_test(true)
        .try_init();
}

pub fn is_initialized() -> bool {
    INIT.is_completed()
}
