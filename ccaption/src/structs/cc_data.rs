//! CEA-708 cc_data() structures
//!
//! Caption data as carried in ATSC A/53 user data: a small header followed
//! by up to 31 three-byte packets, each holding one EIA-608 byte pair or a
//! fragment of a DTVCC packet.

use anyhow::Result;

use crate::utils::syntax::{Syntax, SyntaxCursor};

/// Maximum number of packets in one cc_data() block.
pub const MAX_CC_COUNT: usize = 31;

/// Size of a packet in bytes.
pub const CC_PACKET_SIZE: usize = 3;

/// EIA-608 field 1.
pub const CC_TYPE_NTSC_FIELD_1: u8 = 0;
/// EIA-608 field 2.
pub const CC_TYPE_NTSC_FIELD_2: u8 = 1;
/// DTVCC packet data.
pub const CC_TYPE_DTVCC_DATA: u8 = 2;
/// DTVCC packet start.
pub const CC_TYPE_DTVCC_START: u8 = 3;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Cea708CcDataPacket {
    pub cc_valid: bool,
    pub cc_type: u8,
    pub cc_data_1: u8,
    pub cc_data_2: u8,
}

impl Cea708CcDataPacket {
    pub fn is_608(&self) -> bool {
        self.cc_type == CC_TYPE_NTSC_FIELD_1 || self.cc_type == CC_TYPE_NTSC_FIELD_2
    }
}

impl Syntax for Cea708CcDataPacket {
    fn syntax<C: SyntaxCursor>(&mut self, rw: &mut C) -> Result<()> {
        rw.fixed(5, "marker_bits", 0x1f)?;
        rw.flag("cc_valid", &mut self.cc_valid)?;
        rw.ui(2, "cc_type", &mut self.cc_type)?;

        rw.ui(8, "cc_data_1", &mut self.cc_data_1)?;
        rw.ui(8, "cc_data_2", &mut self.cc_data_2)?;

        Ok(())
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Cea708CcData {
    pub process_em_data_flag: bool,
    pub process_cc_data_flag: bool,
    pub additional_data_flag: bool,

    pub cc_count: u8,

    pub em_data: u8,

    pub cc_data_pkts: [Cea708CcDataPacket; MAX_CC_COUNT],
}

impl Cea708CcData {
    /// Builds a block from packets, as used for side data carriage.
    ///
    /// At most [`MAX_CC_COUNT`] packets are taken.
    pub fn from_packets(packets: &[Cea708CcDataPacket]) -> Self {
        let count = packets.len().min(MAX_CC_COUNT);
        let mut cc_data = Self {
            process_cc_data_flag: true,
            cc_count: count as u8,
            ..Default::default()
        };

        cc_data.cc_data_pkts[..count].copy_from_slice(&packets[..count]);
        cc_data
    }

    /// Packets in use.
    pub fn packets(&self) -> &[Cea708CcDataPacket] {
        let count = (self.cc_count as usize).min(MAX_CC_COUNT);
        &self.cc_data_pkts[..count]
    }
}

impl Syntax for Cea708CcData {
    fn syntax<C: SyntaxCursor>(&mut self, rw: &mut C) -> Result<()> {
        rw.flag("process_em_data_flag", &mut self.process_em_data_flag)?;
        rw.flag("process_cc_data_flag", &mut self.process_cc_data_flag)?;
        rw.flag("additional_data_flag", &mut self.additional_data_flag)?;

        rw.ui(5, "cc_count", &mut self.cc_count)?;

        rw.ui(8, "em_data", &mut self.em_data)?;

        for i in 0..self.cc_count as usize {
            self.cc_data_pkts[i].syntax(rw)?;
        }

        rw.fixed(8, "marker_bits", 0xff)?;

        // additional_data is not interpreted.

        Ok(())
    }
}
