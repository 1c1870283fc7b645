//! Logging abstraction
//!
//! Provides unified logging macros that work across different targets:
//! - Embedded (`defmt` feature): Uses defmt
//! - Host (`log` feature): Uses the `log` facade (the SITL installs env_logger)
//! - Host tests without either feature: Uses println!
//! - Anything else: No-op
//!
//! Format strings must stay within the subset defmt understands: plain `{}`
//! placeholders over primitives and types deriving `defmt::Format`.

/// Log informational message
#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {{
        #[cfg(feature = "defmt")]
        ::defmt::info!($($arg)*);

        #[cfg(feature = "log")]
        ::log::info!($($arg)*);

        #[cfg(all(not(feature = "defmt"), not(feature = "log"), test))]
        std::println!("[INFO] {}", format_args!($($arg)*));
    }};
}

/// Log warning message
#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {{
        #[cfg(feature = "defmt")]
        ::defmt::warn!($($arg)*);

        #[cfg(feature = "log")]
        ::log::warn!($($arg)*);

        #[cfg(all(not(feature = "defmt"), not(feature = "log"), test))]
        std::println!("[WARN] {}", format_args!($($arg)*));
    }};
}

/// Log error message
#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {{
        #[cfg(feature = "defmt")]
        ::defmt::error!($($arg)*);

        #[cfg(feature = "log")]
        ::log::error!($($arg)*);

        #[cfg(all(not(feature = "defmt"), not(feature = "log"), test))]
        std::eprintln!("[ERROR] {}", format_args!($($arg)*));
    }};
}

/// Log debug message
#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => {{
        #[cfg(feature = "defmt")]
        ::defmt::debug!($($arg)*);

        #[cfg(feature = "log")]
        ::log::debug!($($arg)*);

        #[cfg(all(not(feature = "defmt"), not(feature = "log"), test))]
        std::println!("[DEBUG] {}", format_args!($($arg)*));
    }};
}

/// Log trace message
#[macro_export]
macro_rules! log_trace {
    ($($arg:tt)*) => {{
        #[cfg(feature = "defmt")]
        ::defmt::trace!($($arg)*);

        #[cfg(feature = "log")]
        ::log::trace!($($arg)*);

        #[cfg(all(not(feature = "defmt"), not(feature = "log"), test))]
        std::println!("[TRACE] {}", format_args!($($arg)*));
    }};
}
