//! Logging shims: `defmt` on target builds, `tracing` on hosts, nothing when neither is enabled.
#![allow(unused_macros)]

macro_rules! trace {
    ($($arg:tt)*) => {{
        #[cfg(feature = "defmt")]
        ::defmt::trace!($($arg)*);
        #[cfg(all(feature = "tracing", not(feature = "defmt")))]
        ::tracing::trace!($($arg)*);
        #[cfg(not(any(feature = "tracing", feature = "defmt")))]
        let _ = ::core::format_args!($($arg)*);
    }};
}

macro_rules! debug {
    ($($arg:tt)*) => {{
        #[cfg(feature = "defmt")]
        ::defmt::debug!($($arg)*);
        #[cfg(all(feature = "tracing", not(feature = "defmt")))]
        ::tracing::debug!($($arg)*);
        #[cfg(not(any(feature = "tracing", feature = "defmt")))]
        let _ = ::core::format_args!($($arg)*);
    }};
}

macro_rules! info {
    ($($arg:tt)*) => {{
        #[cfg(feature = "defmt")]
        ::defmt::info!($($arg)*);
        #[cfg(all(feature = "tracing", not(feature = "defmt")))]
        ::tracing::info!($($arg)*);
        #[cfg(not(any(feature = "tracing", feature = "defmt")))]
        let _ = ::core::format_args!($($arg)*);
    }};
}

macro_rules! warn {
    ($($arg:tt)*) => {{
        #[cfg(feature = "defmt")]
        ::defmt::warn!($($arg)*);
        #[cfg(all(feature = "tracing", not(feature = "defmt")))]
        ::tracing::warn!($($arg)*);
        #[cfg(not(any(feature = "tracing", feature = "defmt")))]
        let _ = ::core::format_args!($($arg)*);
    }};
}
