// Logging shims. Forward to defmt on the device, to `log` on the host, and
// compile away when neither feature is enabled.

#![allow(unused_macros)]

macro_rules! info {
    ($($arg:tt)*) => {{
        #[cfg(feature = "no_std")]
        defmt::info!($($arg)*);
        #[cfg(feature = "std")]
        log::info!($($arg)*);
    }};
}

macro_rules! debug {
    ($($arg:tt)*) => {{
        #[cfg(feature = "no_std")]
        defmt::debug!($($arg)*);
        #[cfg(feature = "std")]
        log::debug!($($arg)*);
    }};
}

macro_rules! warn {
    ($($arg:tt)*) => {{
        #[cfg(feature = "no_std")]
        defmt::warn!($($arg)*);
        #[cfg(feature = "std")]
        log::warn!($($arg)*);
    }};
}
