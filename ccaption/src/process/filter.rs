use anyhow::{Result, anyhow};
use log::{trace, warn};

use crate::log_or_err;
use crate::process::extract::Unit;
use crate::process::transcode::{read_a53_user_data, write_a53_cc_side_data};
use crate::structs::sequence_extension::SequenceExtension;
use crate::structs::sequence_header::{
    SequenceHeader, aspect_ratio_information, best_frame_rate,
};

/// What to do with A/53 closed captions found in user data units.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum A53CcAction {
    #[default]
    Pass,
    Remove,
    Extract,
}

/// Rewrites the user data units of a fragment according to an
/// [`A53CcAction`].
///
/// A fragment is the list of units belonging to one coded picture.
#[derive(Debug)]
pub struct UserDataFilter {
    action: A53CcAction,
    pub fail_level: log::Level,
    units_removed: usize,
    packets_extracted: usize,
}

impl UserDataFilter {
    pub fn new(action: A53CcAction) -> Self {
        Self {
            action,
            fail_level: log::Level::Error,
            units_removed: 0,
            packets_extracted: 0,
        }
    }

    /// Sets the failure level for undecodable user data.
    ///
    /// - `log::Level::Error`: undecodable units are logged and kept (default)
    /// - `log::Level::Warn`: undecodable units abort filtering (strict mode)
    pub fn set_fail_level(&mut self, level: log::Level) {
        self.fail_level = level;
    }

    pub fn action(&self) -> A53CcAction {
        self.action
    }

    pub fn units_removed(&self) -> usize {
        self.units_removed
    }

    pub fn packets_extracted(&self) -> usize {
        self.packets_extracted
    }

    /// Applies the action to `units`.
    ///
    /// Remove deletes the first caption unit of the fragment. Extract
    /// leaves the units in place and returns their packets as A53 CC side
    /// data, or `None` if the fragment carried no captions.
    pub fn filter(&mut self, units: &mut Vec<Unit>) -> Result<Option<Vec<u8>>> {
        if self.action == A53CcAction::Pass {
            return Ok(None);
        }

        let mut side_data = Vec::new();
        let mut found = false;

        for i in 0..units.len() {
            let unit = &units[i];
            // identifier + type code + cc_count byte
            if !unit.is_user_data() || unit.data.len() < 6 {
                continue;
            }

            let user_data = match read_a53_user_data(&unit.data) {
                Ok(user_data) => user_data,
                Err(e) => {
                    log_or_err!(
                        self,
                        log::Level::Warn,
                        anyhow!("Failed to read user data: {e}")
                    );
                    continue;
                }
            };

            let Some(cc_data) = user_data.cc_data() else {
                continue;
            };

            match self.action {
                A53CcAction::Remove => {
                    trace!("A53 CC remove: {} bytes", unit.data.len());
                    units.remove(i);
                    self.units_removed += 1;
                    break;
                }
                A53CcAction::Extract => {
                    trace!("A53 CC extract: {} bytes", unit.data.len());
                    self.packets_extracted += cc_data.cc_count as usize;
                    write_a53_cc_side_data(&mut side_data, &user_data)?;
                    found = true;
                }
                A53CcAction::Pass => {}
            }
        }

        Ok(found.then_some(side_data))
    }
}

/// Rewrites the display aspect ratio and frame rate carried by the
/// sequence header and sequence extension of a fragment.
#[derive(Debug, Default)]
pub struct SequenceFilter {
    /// Display aspect ratio as `(num, den)`.
    pub display_aspect_ratio: Option<(u32, u32)>,
    /// Frame rate as `(num, den)`.
    pub frame_rate: Option<(u32, u32)>,
    mpeg1_warned: bool,
    sequences_rewritten: usize,
}

impl SequenceFilter {
    pub fn is_active(&self) -> bool {
        self.display_aspect_ratio.is_some() || self.frame_rate.is_some()
    }

    pub fn sequences_rewritten(&self) -> usize {
        self.sequences_rewritten
    }

    /// Rewrites the sequence header of `units` in place.
    ///
    /// Returns false when there is nothing to do or the fragment has no
    /// sequence header followed by a sequence extension. Zero ratios are
    /// ignored.
    pub fn rewrite(&mut self, units: &mut [Unit]) -> Result<bool> {
        if !self.is_active() {
            return Ok(false);
        }

        let header_pos = units.iter().position(Unit::is_sequence_header);
        let extension_pos = units.iter().position(Unit::is_sequence_extension);

        let (Some(header_pos), Some(extension_pos)) = (header_pos, extension_pos) else {
            if header_pos.is_some() && !self.mpeg1_warned {
                warn!(
                    "Stream contains a sequence header but not a sequence extension: maybe it's actually MPEG-1?"
                );
                self.mpeg1_warned = true;
            }
            return Ok(false);
        };

        let mut header = SequenceHeader::from_bytes(&units[header_pos].data)?;
        let mut extension = SequenceExtension::from_bytes(&units[extension_pos].data)?;

        if let Some((num, den)) = self.display_aspect_ratio.filter(|&(n, d)| n != 0 && d != 0) {
            header.aspect_ratio_information = aspect_ratio_information(num, den);
        }

        if let Some((num, den)) = self.frame_rate.filter(|&(n, d)| n != 0 && d != 0) {
            let (code, n, d) = best_frame_rate(num, den);
            header.frame_rate_code = code;
            extension.frame_rate_extension_n = n;
            extension.frame_rate_extension_d = d;
        }

        trace!(
            "Sequence rewrite: aspect_ratio_information {} frame_rate_code {} ext {}/{}",
            header.aspect_ratio_information,
            header.frame_rate_code,
            extension.frame_rate_extension_n,
            extension.frame_rate_extension_d
        );

        header.write_to(&mut units[header_pos].data)?;
        extension.write_to(&mut units[extension_pos].data)?;
        self.sequences_rewritten += 1;

        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::extract::{EXTENSION_START_CODE, Extractor, USER_DATA_START_CODE};
    use crate::process::{
        EXAMPLE_AFD_DATA, EXAMPLE_ES, EXAMPLE_SEQUENCE_EXTENSION, EXAMPLE_USER_DATA,
    };

    fn example_units() -> Vec<Unit> {
        let mut extractor = Extractor::default();
        extractor.push_bytes(EXAMPLE_ES);
        extractor.finish();
        extractor.flatten().collect()
    }

    fn user_data_unit(data: &[u8]) -> Unit {
        Unit {
            start_code: USER_DATA_START_CODE,
            data: data.to_vec(),
        }
    }

    #[test]
    fn pass_keeps_units() -> Result<()> {
        let mut units = example_units();
        let mut filter = UserDataFilter::new(A53CcAction::Pass);

        assert_eq!(filter.filter(&mut units)?, None);
        assert_eq!(units, example_units());
        Ok(())
    }

    #[test]
    fn remove_first_caption_unit() -> Result<()> {
        let mut units = example_units();
        units.push(user_data_unit(EXAMPLE_USER_DATA));
        units.push(user_data_unit(EXAMPLE_AFD_DATA));

        let mut filter = UserDataFilter::new(A53CcAction::Remove);
        assert_eq!(filter.filter(&mut units)?, None);

        assert_eq!(units.len(), 6);
        assert!(!units[3].is_user_data());
        // Only one unit goes per fragment.
        assert_eq!(units[4].data, EXAMPLE_USER_DATA);
        assert_eq!(units[5].data, EXAMPLE_AFD_DATA);
        assert_eq!(filter.units_removed(), 1);
        Ok(())
    }

    #[test]
    fn extract_side_data() -> Result<()> {
        let mut units = example_units();
        units.push(user_data_unit(EXAMPLE_AFD_DATA));
        units.push(user_data_unit(EXAMPLE_USER_DATA));

        let mut filter = UserDataFilter::new(A53CcAction::Extract);
        let side_data = filter.filter(&mut units)?;

        assert_eq!(
            side_data.as_deref(),
            Some(&[0xFC, 0x94, 0x20, 0xFC, 0xC8, 0xE9, 0xFC, 0x94, 0x20, 0xFC, 0xC8, 0xE9][..])
        );
        assert_eq!(units.len(), 7);
        assert_eq!(filter.packets_extracted(), 4);

        let mut units = vec![user_data_unit(EXAMPLE_AFD_DATA)];
        assert_eq!(filter.filter(&mut units)?, None);
        Ok(())
    }

    #[test]
    fn undecodable_user_data() -> Result<()> {
        let mut corrupted = EXAMPLE_USER_DATA.to_vec();
        corrupted[13] = 0x00;
        let mut units = vec![user_data_unit(&corrupted), user_data_unit(EXAMPLE_USER_DATA)];

        let mut filter = UserDataFilter::new(A53CcAction::Extract);
        let side_data = filter.filter(&mut units)?;
        assert_eq!(side_data.map(|s| s.len()), Some(6));

        filter.set_fail_level(log::Level::Warn);
        assert!(filter.filter(&mut units).is_err());
        Ok(())
    }

    fn with_sequence_extension() -> Vec<Unit> {
        let mut units = example_units();
        units.insert(
            1,
            Unit {
                start_code: EXTENSION_START_CODE,
                data: EXAMPLE_SEQUENCE_EXTENSION.to_vec(),
            },
        );
        units
    }

    #[test]
    fn rewrite_sequence_metadata() -> Result<()> {
        let mut units = with_sequence_extension();
        let mut filter = SequenceFilter {
            display_aspect_ratio: Some((16, 9)),
            frame_rate: Some((15, 1)),
            ..Default::default()
        };

        assert!(filter.rewrite(&mut units)?);

        let header = SequenceHeader::from_bytes(&units[0].data)?;
        assert_eq!(header.aspect_ratio_information, 3);
        assert_eq!(header.frame_rate(), Some((25, 1)));
        assert_eq!(header.horizontal_size_value, 720);

        let extension = SequenceExtension::from_bytes(&units[1].data)?;
        assert_eq!(
            (extension.frame_rate_extension_n, extension.frame_rate_extension_d),
            (2, 4)
        );
        assert_eq!(filter.sequences_rewritten(), 1);
        Ok(())
    }

    #[test]
    fn aspect_ratio_only() -> Result<()> {
        let mut units = with_sequence_extension();
        let mut filter = SequenceFilter {
            display_aspect_ratio: Some((16, 9)),
            ..Default::default()
        };

        assert!(filter.rewrite(&mut units)?);
        assert_eq!(units[0].data[3], 0x34);
        assert_eq!(units[1].data, EXAMPLE_SEQUENCE_EXTENSION);
        Ok(())
    }

    #[test]
    fn sequence_without_extension_is_kept() -> Result<()> {
        let mut units = example_units();
        let mut filter = SequenceFilter {
            frame_rate: Some((25, 1)),
            ..Default::default()
        };

        assert!(!filter.rewrite(&mut units)?);
        assert!(!filter.rewrite(&mut units)?);
        assert_eq!(units, example_units());

        let mut inactive = SequenceFilter::default();
        let mut units = with_sequence_extension();
        assert!(!inactive.rewrite(&mut units)?);
        Ok(())
    }
}
