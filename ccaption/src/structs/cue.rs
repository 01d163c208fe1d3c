use std::fmt::{Display, Formatter};

/// Line break marker inside cue text.
pub const LINE_BREAK: &str = "\\N";

/// A caption event produced by the decoder.
///
/// `start` and `duration` are in the time base of the timestamps handed to
/// [`crate::process::decode::CaptionDecoder::decode`]. Real-time cues have no
/// duration; they last until the next cue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cue {
    pub text: String,
    pub start: i64,
    pub duration: Option<i64>,
}

impl Cue {
    pub fn end(&self) -> Option<i64> {
        self.duration.map(|d| self.start + d)
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Text lines with the escaped line breaks resolved.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.text.split(LINE_BREAK)
    }
}

impl Display for Cue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.end() {
            Some(end) => write!(f, "[{} -> {}] {}", self.start, end, self.text),
            None => write!(f, "[{} -> ...] {}", self.start, self.text),
        }
    }
}

#[test]
fn print_cue() {
    let cue = Cue {
        text: "Hello\\Nworld".to_string(),
        start: 100,
        duration: Some(50),
    };
    assert_eq!(format!("{cue}"), "[100 -> 150] Hello\\Nworld");
    assert_eq!(cue.lines().collect::<Vec<_>>(), ["Hello", "world"]);

    let cue = Cue {
        duration: None,
        ..cue
    };
    assert_eq!(cue.end(), None);
    assert_eq!(format!("{cue}"), "[100 -> ...] Hello\\Nworld");
}
