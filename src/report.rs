use serde::Serialize;

use ccaption::structs::cc_data::Cea708CcDataPacket;
use ccaption::structs::sequence_header::SequenceHeader;
use ccaption::structs::user_data::{A53AtscUserData, A53UserData};

/// One decoded user data unit, as printed by `info --dump`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum UserDataRecord {
    #[serde(rename_all = "camelCase")]
    CcData {
        picture: u64,
        process_cc_data: bool,
        em_data: u8,
        packets: Vec<CcPacketRecord>,
    },
    #[serde(rename_all = "camelCase")]
    BarData {
        picture: u64,
        #[serde(skip_serializing_if = "Option::is_none")]
        top: Option<u16>,
        #[serde(skip_serializing_if = "Option::is_none")]
        bottom: Option<u16>,
        #[serde(skip_serializing_if = "Option::is_none")]
        left: Option<u16>,
        #[serde(skip_serializing_if = "Option::is_none")]
        right: Option<u16>,
    },
    #[serde(rename_all = "camelCase")]
    Afd {
        picture: u64,
        #[serde(skip_serializing_if = "Option::is_none")]
        active_format: Option<u8>,
    },
    #[serde(rename_all = "camelCase")]
    Unknown {
        picture: u64,
        identifier: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        type_code: Option<u8>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CcPacketRecord {
    pub valid: bool,
    pub cc_type: u8,
    pub data: String,
    #[serde(skip)]
    pub line21: bool,
}

impl From<&Cea708CcDataPacket> for CcPacketRecord {
    fn from(packet: &Cea708CcDataPacket) -> Self {
        Self {
            valid: packet.cc_valid,
            cc_type: packet.cc_type,
            data: format!("{:02X} {:02X}", packet.cc_data_1, packet.cc_data_2),
            line21: packet.is_608(),
        }
    }
}

fn identifier_str(identifier: u32) -> String {
    let bytes = identifier.to_be_bytes();
    if bytes.iter().all(|b| b.is_ascii_graphic()) {
        bytes.iter().map(|&b| char::from(b)).collect()
    } else {
        format!("{identifier:#010x}")
    }
}

impl UserDataRecord {
    pub fn new(picture: u64, user_data: &A53UserData) -> Self {
        match user_data {
            A53UserData::Atsc(A53AtscUserData::CcData(cc_data)) => Self::CcData {
                picture,
                process_cc_data: cc_data.process_cc_data_flag,
                em_data: cc_data.em_data,
                packets: cc_data.packets().iter().map(CcPacketRecord::from).collect(),
            },
            A53UserData::Atsc(A53AtscUserData::BarData(bar_data)) => Self::BarData {
                picture,
                top: bar_data
                    .top_bar_flag
                    .then_some(bar_data.line_number_end_of_top_bar),
                bottom: bar_data
                    .bottom_bar_flag
                    .then_some(bar_data.line_number_end_of_bottom_bar),
                left: bar_data
                    .left_bar_flag
                    .then_some(bar_data.line_number_end_of_left_bar),
                right: bar_data
                    .right_bar_flag
                    .then_some(bar_data.line_number_end_of_right_bar),
            },
            A53UserData::Atsc(A53AtscUserData::Unknown(code)) => Self::Unknown {
                picture,
                identifier: identifier_str(user_data.user_identifier()),
                type_code: Some(*code),
            },
            A53UserData::Afd(afd) => Self::Afd {
                picture,
                active_format: afd.active_format_flag.then_some(afd.active_format),
            },
            A53UserData::Unknown(identifier) => Self::Unknown {
                picture,
                identifier: identifier_str(*identifier),
                type_code: None,
            },
        }
    }
}

/// Stream totals printed by `info`.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamSummary {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frame_rate: Option<String>,
    pub pictures: u64,
    pub user_data_units: u64,
    pub cc_data: u64,
    pub bar_data: u64,
    pub afd: u64,
    pub unknown: u64,
    pub undecodable: u64,
    pub cc_packets_608: u64,
    pub cc_packets_dtvcc: u64,
}

impl StreamSummary {
    pub fn set_sequence_header(&mut self, header: &SequenceHeader) {
        self.width = Some(header.horizontal_size_value);
        self.height = Some(header.vertical_size_value);
        self.frame_rate = header.frame_rate().map(|(num, den)| {
            if den == 1 {
                num.to_string()
            } else {
                format!("{:.3}", num as f64 / den as f64)
            }
        });
    }

    pub fn count(&mut self, record: &UserDataRecord) {
        self.user_data_units += 1;

        match record {
            UserDataRecord::CcData { packets, .. } => {
                self.cc_data += 1;
                for packet in packets.iter().filter(|p| p.valid) {
                    if packet.line21 {
                        self.cc_packets_608 += 1;
                    } else {
                        self.cc_packets_dtvcc += 1;
                    }
                }
            }
            UserDataRecord::BarData { .. } => self.bar_data += 1,
            UserDataRecord::Afd { .. } => self.afd += 1,
            UserDataRecord::Unknown { .. } => self.unknown += 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ccaption::process::transcode::read_a53_user_data;
    use ccaption::process::{EXAMPLE_AFD_DATA, EXAMPLE_BAR_DATA, EXAMPLE_USER_DATA};

    #[test]
    fn cc_data_yaml() -> anyhow::Result<()> {
        let user_data = read_a53_user_data(EXAMPLE_USER_DATA)?;
        let record = UserDataRecord::new(7, &user_data);

        let yaml = serde_yaml_ng::to_string(&record)?;
        let value: serde_yaml_ng::Value = serde_yaml_ng::from_str(&yaml)?;

        assert_eq!(value["type"].as_str(), Some("ccData"));
        assert_eq!(value["picture"].as_u64(), Some(7));
        assert_eq!(value["emData"].as_u64(), Some(255));
        assert_eq!(value["packets"][1]["data"].as_str(), Some("C8 E9"));
        assert_eq!(value["packets"][1]["ccType"].as_u64(), Some(0));
        Ok(())
    }

    #[test]
    fn optional_fields_are_skipped() -> anyhow::Result<()> {
        let record = UserDataRecord::new(0, &read_a53_user_data(EXAMPLE_BAR_DATA)?);
        let yaml = serde_yaml_ng::to_string(&record)?;
        assert_eq!(yaml, "type: barData\npicture: 0\ntop: 60\nbottom: 420\n");

        let record = UserDataRecord::new(1, &read_a53_user_data(EXAMPLE_AFD_DATA)?);
        let yaml = serde_yaml_ng::to_string(&record)?;
        assert_eq!(yaml, "type: afd\npicture: 1\nactiveFormat: 8\n");

        let record = UserDataRecord::new(2, &read_a53_user_data(b"GA94\x09")?);
        let yaml = serde_yaml_ng::to_string(&record)?;
        assert_eq!(yaml, "type: unknown\npicture: 2\nidentifier: GA94\ntypeCode: 9\n");
        Ok(())
    }

    #[test]
    fn summary_counts() -> anyhow::Result<()> {
        let mut summary = StreamSummary::default();
        summary.set_sequence_header(&SequenceHeader {
            horizontal_size_value: 720,
            vertical_size_value: 480,
            frame_rate_code: 4,
            ..Default::default()
        });

        for data in [EXAMPLE_USER_DATA, EXAMPLE_BAR_DATA, EXAMPLE_AFD_DATA] {
            summary.count(&UserDataRecord::new(0, &read_a53_user_data(data)?));
        }

        assert_eq!(summary.frame_rate.as_deref(), Some("29.970"));
        assert_eq!(summary.user_data_units, 3);
        assert_eq!(summary.cc_data, 1);
        assert_eq!(summary.cc_packets_608, 2);
        assert_eq!(summary.bar_data, 1);
        assert_eq!(summary.afd, 1);
        Ok(())
    }
}
