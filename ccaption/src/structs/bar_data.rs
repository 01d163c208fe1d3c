//! A/53 bar_data() structure
//!
//! Letterbox and pillarbox bar positions. Each edge has a presence flag and,
//! when present, the last line (or pixel column) covered by the bar.

use anyhow::Result;

use crate::utils::syntax::{Syntax, SyntaxCursor};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct A53BarData {
    pub top_bar_flag: bool,
    pub bottom_bar_flag: bool,
    pub left_bar_flag: bool,
    pub right_bar_flag: bool,

    pub line_number_end_of_top_bar: u16,
    pub line_number_end_of_bottom_bar: u16,
    pub line_number_end_of_left_bar: u16,
    pub line_number_end_of_right_bar: u16,
}

impl Syntax for A53BarData {
    fn syntax<C: SyntaxCursor>(&mut self, rw: &mut C) -> Result<()> {
        rw.flag("top_bar_flag", &mut self.top_bar_flag)?;
        rw.flag("bottom_bar_flag", &mut self.bottom_bar_flag)?;
        rw.flag("left_bar_flag", &mut self.left_bar_flag)?;
        rw.flag("right_bar_flag", &mut self.right_bar_flag)?;
        rw.fixed(4, "reserved", 0xf)?;

        if self.top_bar_flag {
            rw.fixed(2, "one_bits", 3)?;
            rw.ui(
                14,
                "line_number_end_of_top_bar",
                &mut self.line_number_end_of_top_bar,
            )?;
        }
        if self.bottom_bar_flag {
            rw.fixed(2, "one_bits", 3)?;
            rw.ui(
                14,
                "line_number_end_of_bottom_bar",
                &mut self.line_number_end_of_bottom_bar,
            )?;
        }
        if self.left_bar_flag {
            rw.fixed(2, "one_bits", 3)?;
            rw.ui(
                14,
                "line_number_end_of_left_bar",
                &mut self.line_number_end_of_left_bar,
            )?;
        }
        if self.right_bar_flag {
            rw.fixed(2, "one_bits", 3)?;
            rw.ui(
                14,
                "line_number_end_of_right_bar",
                &mut self.line_number_end_of_right_bar,
            )?;
        }

        Ok(())
    }
}
