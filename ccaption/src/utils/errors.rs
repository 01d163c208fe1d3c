#[macro_export]
macro_rules! log_or_err {
    ($state:expr, $level:expr, $err:expr $(,)?) => {{
        if $level <= $state.fail_level {
            return Err($err);
        } else {
            match $level {
                ::log::Level::Error => ::log::error!("{}", $err),
                ::log::Level::Warn => ::log::warn!("{}", $err),
                ::log::Level::Info => ::log::info!("{}", $err),
                ::log::Level::Debug => ::log::debug!("{}", $err),
                ::log::Level::Trace => ::log::trace!("{}", $err),
            }
        }
    }};
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SyntaxError {
    #[error("{name} out of range: value = {value}, allowed {min}..={max}")]
    OutOfRange {
        name: &'static str,
        value: u64,
        min: u64,
        max: u64,
    },

    #[error("Invalid value for fixed field {name}: read {actual:#X}, expected {expected:#X}")]
    FixedMismatch {
        name: &'static str,
        actual: u32,
        expected: u32,
    },

    #[error("Not enough space to write {name}: {width} bits needed, {available} bits left")]
    OutOfSpace {
        name: &'static str,
        width: u32,
        available: u64,
    },

    #[error("Written syntax does not end on a byte boundary ({0} bits)")]
    UnalignedOutput(u64),
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SideDataError {
    #[error("A53 CC side data length must be a multiple of 3 (got {0})")]
    InvalidLength(usize),

    #[error("A53 CC can only fit 31 packets in a single user data block (got {0})")]
    TooManyPackets(usize),

    #[error("User data is not ATSC cc_data")]
    NotCcData,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CaptionError {
    #[error("cc_valid is not set")]
    InvalidUnit,

    #[error("Parity check failed on cc_data_2: {0:#04X}")]
    ParityFailed(u8),

    #[error("Unsupported cc data unit: type {0}")]
    Unsupported(u8),

    #[error("Data ignored since exceeding screen width at column {0}")]
    ScreenWidthExceeded(usize),
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractError {
    #[error("Insufficient buffer data for unit extraction")]
    InsufficientData,
}
