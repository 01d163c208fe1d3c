//! A/53 registered user data
//!
//! ## Layout
//!
//! A 32-bit `user_identifier` selects the payload:
//!
//! - **ATSC** (`GA94`): an 8-bit `user_data_type_code` followed by
//!   [`Cea708CcData`] (0x03) or [`A53BarData`] (0x06)
//! - **AFD** (`DTG1`): active format description
//!
//! Unknown identifiers and type codes are accepted and left undecoded.

use anyhow::Result;
use log::warn;

use crate::structs::bar_data::A53BarData;
use crate::structs::cc_data::Cea708CcData;
use crate::utils::syntax::{Syntax, SyntaxCursor};

pub const A53_USER_IDENTIFIER_ATSC: u32 = u32::from_be_bytes(*b"GA94");
pub const A53_USER_IDENTIFIER_AFD: u32 = u32::from_be_bytes(*b"DTG1");

pub const A53_USER_DATA_TYPE_CODE_CC_DATA: u8 = 0x03;
pub const A53_USER_DATA_TYPE_CODE_BAR_DATA: u8 = 0x06;

/// Active format description.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct A53AfdData {
    pub active_format_flag: bool,
    pub active_format: u8,
}

impl Syntax for A53AfdData {
    fn syntax<C: SyntaxCursor>(&mut self, rw: &mut C) -> Result<()> {
        rw.fixed(1, "zero_bit", 0)?;
        rw.flag("active_format_flag", &mut self.active_format_flag)?;
        rw.fixed(6, "alignment_bits", 1)?;

        if self.active_format_flag {
            rw.fixed(4, "reserved", 0xf)?;
            rw.ui(4, "active_format", &mut self.active_format)?;
        }

        Ok(())
    }
}

/// ATSC user data, keyed by `user_data_type_code`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum A53AtscUserData {
    CcData(Cea708CcData),
    BarData(A53BarData),
    Unknown(u8),
}

impl Default for A53AtscUserData {
    fn default() -> Self {
        Self::Unknown(0)
    }
}

impl A53AtscUserData {
    pub fn with_type_code(user_data_type_code: u8) -> Self {
        match user_data_type_code {
            A53_USER_DATA_TYPE_CODE_CC_DATA => Self::CcData(Cea708CcData::default()),
            A53_USER_DATA_TYPE_CODE_BAR_DATA => Self::BarData(A53BarData::default()),
            code => Self::Unknown(code),
        }
    }

    pub fn user_data_type_code(&self) -> u8 {
        match self {
            Self::CcData(_) => A53_USER_DATA_TYPE_CODE_CC_DATA,
            Self::BarData(_) => A53_USER_DATA_TYPE_CODE_BAR_DATA,
            Self::Unknown(code) => *code,
        }
    }
}

impl Syntax for A53AtscUserData {
    fn syntax<C: SyntaxCursor>(&mut self, rw: &mut C) -> Result<()> {
        let mut user_data_type_code = self.user_data_type_code();
        rw.ui(8, "user_data_type_code", &mut user_data_type_code)?;

        if C::READING {
            *self = Self::with_type_code(user_data_type_code);
        }

        match self {
            Self::CcData(cc_data) => cc_data.syntax(rw),
            Self::BarData(bar_data) => bar_data.syntax(rw),
            Self::Unknown(code) => {
                warn!("Unknown ATSC user data found: type code {code:#04x}");
                Ok(())
            }
        }
    }
}

/// Registered user data, keyed by `user_identifier`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum A53UserData {
    Atsc(A53AtscUserData),
    Afd(A53AfdData),
    Unknown(u32),
}

impl Default for A53UserData {
    fn default() -> Self {
        Self::Unknown(0)
    }
}

impl A53UserData {
    pub fn with_identifier(user_identifier: u32) -> Self {
        match user_identifier {
            A53_USER_IDENTIFIER_ATSC => Self::Atsc(A53AtscUserData::default()),
            A53_USER_IDENTIFIER_AFD => Self::Afd(A53AfdData::default()),
            id => Self::Unknown(id),
        }
    }

    pub fn user_identifier(&self) -> u32 {
        match self {
            Self::Atsc(_) => A53_USER_IDENTIFIER_ATSC,
            Self::Afd(_) => A53_USER_IDENTIFIER_AFD,
            Self::Unknown(id) => *id,
        }
    }

    /// The caption block, if this is ATSC cc_data.
    pub fn cc_data(&self) -> Option<&Cea708CcData> {
        match self {
            Self::Atsc(A53AtscUserData::CcData(cc_data)) => Some(cc_data),
            _ => None,
        }
    }
}

impl From<Cea708CcData> for A53UserData {
    fn from(cc_data: Cea708CcData) -> Self {
        Self::Atsc(A53AtscUserData::CcData(cc_data))
    }
}

impl Syntax for A53UserData {
    fn syntax<C: SyntaxCursor>(&mut self, rw: &mut C) -> Result<()> {
        let mut user_identifier = self.user_identifier();
        rw.ui(32, "user_identifier", &mut user_identifier)?;

        if C::READING {
            *self = Self::with_identifier(user_identifier);
        }

        match self {
            Self::Atsc(atsc) => atsc.syntax(rw),
            Self::Afd(afd) => afd.syntax(rw),
            Self::Unknown(id) => {
                warn!("Unknown registered user data found: identifier {id:#010x}");
                Ok(())
            }
        }
    }
}
