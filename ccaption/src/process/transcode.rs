use anyhow::{Result, bail};
use log::{error, trace};

use crate::structs::cc_data::{CC_PACKET_SIZE, Cea708CcData, MAX_CC_COUNT};
use crate::structs::user_data::A53UserData;
use crate::utils::bitstream_io::{BsIoSliceReader, BsIoSliceWriter};
use crate::utils::errors::{SideDataError, SyntaxError};
use crate::utils::syntax::Syntax;

/// Decodes one A/53 registered user data block.
///
/// The whole of `buffer` is the block; trailing bytes beyond the grammar are
/// left unread.
pub fn read_a53_user_data(buffer: &[u8]) -> Result<A53UserData> {
    let reader = &mut BsIoSliceReader::from_slice(buffer);

    let mut data = A53UserData::default();
    data.syntax(reader)?;

    trace!("Read A53 user data: {} of {} bits", reader.position()?, buffer.len() << 3);
    Ok(data)
}

/// Encodes `data` into `buffer`, returning the number of bytes written.
///
/// Fails with [`SyntaxError::OutOfSpace`] when `buffer` is too small.
pub fn write_a53_user_data(data: &A53UserData, buffer: &mut [u8]) -> Result<usize> {
    let writer = &mut BsIoSliceWriter::from_slice(buffer);

    let mut current = *data;
    current.syntax(writer)?;

    // The grammar always ends on a byte boundary.
    if !writer.byte_aligned() {
        bail!(SyntaxError::UnalignedOutput(writer.position()));
    }

    Ok((writer.position() >> 3) as usize)
}

/// Decodes A53 CC side data: a flat array of 3-byte cc_data packets.
///
/// The result is ATSC cc_data with `process_cc_data_flag` set and the other
/// header fields zeroed.
pub fn read_a53_cc_side_data(side_data: &[u8]) -> Result<A53UserData> {
    if side_data.len() % CC_PACKET_SIZE != 0 {
        error!(
            "A53 CC side data length must be a multiple of 3 (got {}).",
            side_data.len()
        );
        bail!(SideDataError::InvalidLength(side_data.len()));
    }

    let cc_count = side_data.len() / CC_PACKET_SIZE;
    if cc_count > MAX_CC_COUNT {
        error!("A53 CC can only fit 31 packets in a single user data block (got {cc_count}).");
        bail!(SideDataError::TooManyPackets(cc_count));
    }

    let mut cc_data = Cea708CcData {
        process_em_data_flag: false,
        process_cc_data_flag: true,
        additional_data_flag: false,
        em_data: 0,
        cc_count: cc_count as u8,
        ..Default::default()
    };

    let reader = &mut BsIoSliceReader::from_slice(side_data);
    for packet in cc_data.cc_data_pkts[..cc_count].iter_mut() {
        packet.syntax(reader)?;
    }

    Ok(cc_data.into())
}

/// Appends the cc_data packets of `data` to `side_data`.
///
/// `side_data` grows by exactly `3 * cc_count` bytes. If `cc_count` is over
/// [`MAX_CC_COUNT`] or a packet cannot be written, the buffer is released and
/// the error returned.
pub fn write_a53_cc_side_data(side_data: &mut Vec<u8>, data: &A53UserData) -> Result<()> {
    let Some(cc_data) = data.cc_data() else {
        bail!(SideDataError::NotCcData);
    };

    let cc_count = cc_data.cc_count as usize;
    if cc_count > MAX_CC_COUNT {
        error!("A53 CC can only fit 31 packets in a single user data block (got {cc_count}).");
        *side_data = Vec::new();
        bail!(SideDataError::TooManyPackets(cc_count));
    }

    let start = side_data.len();
    let size = CC_PACKET_SIZE * cc_count;
    side_data.resize(start + size, 0);

    let writer = &mut BsIoSliceWriter::from_slice(&mut side_data[start..]);
    for packet in cc_data.packets() {
        let mut packet = *packet;
        if let Err(e) = packet.syntax(writer) {
            *side_data = Vec::new();
            return Err(e);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::{EXAMPLE_AFD_DATA, EXAMPLE_BAR_DATA, EXAMPLE_USER_DATA};
    use crate::structs::bar_data::A53BarData;
    use crate::structs::cc_data::Cea708CcDataPacket;
    use crate::structs::user_data::{A53AfdData, A53AtscUserData};

    fn packet(cc_type: u8, cc_data_1: u8, cc_data_2: u8) -> Cea708CcDataPacket {
        Cea708CcDataPacket {
            cc_valid: true,
            cc_type,
            cc_data_1,
            cc_data_2,
        }
    }

    fn round_trip(data: &A53UserData) -> Result<A53UserData> {
        let mut buf = [0u8; 128];
        let len = write_a53_user_data(data, &mut buf)?;
        read_a53_user_data(&buf[..len])
    }

    #[test]
    fn read_cc_user_data() -> Result<()> {
        let data = read_a53_user_data(EXAMPLE_USER_DATA)?;
        let cc_data = data.cc_data().expect("cc_data");

        assert!(cc_data.process_cc_data_flag);
        assert!(!cc_data.process_em_data_flag);
        assert_eq!(cc_data.em_data, 0xFF);
        assert_eq!(
            cc_data.packets(),
            &[packet(0, 0x94, 0x20), packet(0, 0xC8, 0xE9)]
        );
        Ok(())
    }

    #[test]
    fn write_matches_wire_bytes() -> Result<()> {
        let data = read_a53_user_data(EXAMPLE_USER_DATA)?;

        let mut buf = [0u8; 64];
        let len = write_a53_user_data(&data, &mut buf)?;
        assert_eq!(&buf[..len], EXAMPLE_USER_DATA);
        Ok(())
    }

    #[test]
    fn read_bar_and_afd() -> Result<()> {
        let data = read_a53_user_data(EXAMPLE_BAR_DATA)?;
        assert_eq!(
            data,
            A53UserData::Atsc(A53AtscUserData::BarData(A53BarData {
                top_bar_flag: true,
                bottom_bar_flag: true,
                line_number_end_of_top_bar: 60,
                line_number_end_of_bottom_bar: 420,
                ..Default::default()
            }))
        );

        let data = read_a53_user_data(EXAMPLE_AFD_DATA)?;
        assert_eq!(
            data,
            A53UserData::Afd(A53AfdData {
                active_format_flag: true,
                active_format: 8,
            })
        );
        Ok(())
    }

    #[test]
    fn round_trip_cc_counts() -> Result<()> {
        for count in [0usize, 1, 2, 15, 31] {
            let packets: Vec<_> = (0..count)
                .map(|i| packet((i % 4) as u8, i as u8, 0x80 | i as u8))
                .collect();
            let mut cc_data = Cea708CcData::from_packets(&packets);
            cc_data.em_data = 0x5A;
            cc_data.process_em_data_flag = count % 2 == 1;

            let data = A53UserData::from(cc_data);
            assert_eq!(round_trip(&data)?, data);
        }
        Ok(())
    }

    #[test]
    fn round_trip_bar_flags() -> Result<()> {
        for mask in 0..16u8 {
            let bar_data = A53BarData {
                top_bar_flag: mask & 1 != 0,
                bottom_bar_flag: mask & 2 != 0,
                left_bar_flag: mask & 4 != 0,
                right_bar_flag: mask & 8 != 0,
                line_number_end_of_top_bar: if mask & 1 != 0 { 0x3FFF } else { 0 },
                line_number_end_of_bottom_bar: if mask & 2 != 0 { 480 } else { 0 },
                line_number_end_of_left_bar: if mask & 4 != 0 { 1 } else { 0 },
                line_number_end_of_right_bar: if mask & 8 != 0 { 719 } else { 0 },
            };

            let data = A53UserData::Atsc(A53AtscUserData::BarData(bar_data));
            assert_eq!(round_trip(&data)?, data);
        }
        Ok(())
    }

    #[test]
    fn round_trip_afd() -> Result<()> {
        for data in [
            A53UserData::Afd(A53AfdData::default()),
            A53UserData::Afd(A53AfdData {
                active_format_flag: true,
                active_format: 0xA,
            }),
        ] {
            assert_eq!(round_trip(&data)?, data);
        }
        Ok(())
    }

    #[test]
    fn unknown_tags_are_accepted() -> Result<()> {
        let data = read_a53_user_data(b"XYZW\x01\x02")?;
        assert_eq!(data, A53UserData::Unknown(u32::from_be_bytes(*b"XYZW")));

        let data = read_a53_user_data(b"GA94\x09\xFF")?;
        assert_eq!(data, A53UserData::Atsc(A53AtscUserData::Unknown(9)));

        let mut buf = [0u8; 8];
        assert_eq!(write_a53_user_data(&data, &mut buf)?, 5);
        assert_eq!(&buf[..5], b"GA94\x09");
        Ok(())
    }

    #[test]
    fn bad_marker_is_invalid_data() {
        let mut corrupted = EXAMPLE_USER_DATA.to_vec();
        corrupted[10] = 0xDC;

        let err = read_a53_user_data(&corrupted).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SyntaxError>(),
            Some(SyntaxError::FixedMismatch {
                name: "marker_bits",
                ..
            })
        ));
    }

    #[test]
    fn write_out_of_space() -> Result<()> {
        let data = read_a53_user_data(EXAMPLE_USER_DATA)?;

        let mut buf = [0u8; 8];
        let err = write_a53_user_data(&data, &mut buf).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SyntaxError>(),
            Some(SyntaxError::OutOfSpace { .. })
        ));
        Ok(())
    }

    #[test]
    fn side_data_count_bound() -> Result<()> {
        let accepted = [0xFC, 0x80, 0x80].repeat(31);
        let data = read_a53_cc_side_data(&accepted)?;
        assert_eq!(data.cc_data().map(|cc| cc.cc_count), Some(31));

        let rejected = [0xFC, 0x80, 0x80].repeat(32);
        let err = read_a53_cc_side_data(&rejected).unwrap_err();
        assert_eq!(
            err.downcast_ref::<SideDataError>(),
            Some(&SideDataError::TooManyPackets(32))
        );

        let err = read_a53_cc_side_data(&[0xFC, 0x80]).unwrap_err();
        assert_eq!(
            err.downcast_ref::<SideDataError>(),
            Some(&SideDataError::InvalidLength(2))
        );
        Ok(())
    }

    #[test]
    fn side_data_round_trip_appends() -> Result<()> {
        let side_data = [0xFC, 0x94, 0x2C, 0xFD, 0x80, 0x80, 0xFE, 0x01, 0x02];
        let data = read_a53_cc_side_data(&side_data)?;

        let cc_data = data.cc_data().expect("cc_data");
        assert!(cc_data.process_cc_data_flag);
        assert_eq!(cc_data.packets()[1], packet(1, 0x80, 0x80));
        assert_eq!(cc_data.packets()[2], packet(2, 0x01, 0x02));

        let mut out = vec![0xAA];
        write_a53_cc_side_data(&mut out, &data)?;
        assert_eq!(out.len(), 1 + side_data.len());
        assert_eq!(&out[1..], &side_data);
        Ok(())
    }

    #[test]
    fn side_data_write_rejects_other_payloads() -> Result<()> {
        let data = read_a53_user_data(EXAMPLE_AFD_DATA)?;

        let mut out = vec![1, 2, 3];
        let err = write_a53_cc_side_data(&mut out, &data).unwrap_err();
        assert_eq!(
            err.downcast_ref::<SideDataError>(),
            Some(&SideDataError::NotCcData)
        );
        assert_eq!(out, [1, 2, 3]);
        Ok(())
    }

    #[test]
    fn side_data_write_failure_releases_buffer() {
        let mut cc_data = Cea708CcData::from_packets(&[packet(0, 0x94, 0x20)]);
        cc_data.cc_data_pkts[0].cc_type = 4;

        let mut out = vec![1, 2, 3];
        let err = write_a53_cc_side_data(&mut out, &cc_data.into()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SyntaxError>(),
            Some(SyntaxError::OutOfRange { name: "cc_type", .. })
        ));
        assert!(out.is_empty());
        assert_eq!(out.capacity(), 0);
    }

    #[test]
    fn side_data_write_rejects_oversized_count() {
        let packets = [packet(0, 0x80, 0x80); MAX_CC_COUNT];
        let mut cc_data = Cea708CcData::from_packets(&packets);
        cc_data.cc_count = 40;

        let mut out = vec![1, 2, 3];
        let err = write_a53_cc_side_data(&mut out, &cc_data.into()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SideDataError>(),
            Some(SideDataError::TooManyPackets(40))
        ));
        assert!(out.is_empty());
    }
}
