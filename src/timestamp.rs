/// Ticks per second of MPEG system timestamps.
pub const TIME_BASE: i64 = 90_000;

pub fn ticks_to_ms(ticks: i64) -> u64 {
    (ticks.max(0) as u64 * 1000 + TIME_BASE as u64 / 2) / TIME_BASE as u64
}

/// Timestamp of frame `index` at `fps` frames per second.
pub fn frame_ticks(index: u64, fps: f64) -> i64 {
    (index as f64 * TIME_BASE as f64 / fps).round() as i64
}

/// `HH:MM:SS<sep>mmm`, widening the hour field past 99 hours.
pub fn time_str(ms: u64, sep: char) -> String {
    let hours = ms / 3_600_000;
    let minutes = ms % 3_600_000 / 60_000;
    let seconds = ms % 60_000 / 1000;
    let milliseconds = ms % 1000;

    format!("{hours:02}:{minutes:02}:{seconds:02}{sep}{milliseconds:03}")
}

#[test]
fn format_times() {
    assert_eq!(time_str(0, '.'), "00:00:00.000");
    assert_eq!(time_str(3_723_004, ','), "01:02:03,004");
    assert_eq!(time_str(360_000_000, ','), "100:00:00,000");

    assert_eq!(ticks_to_ms(90_000), 1000);
    assert_eq!(ticks_to_ms(3003), 33);
    assert_eq!(ticks_to_ms(-5), 0);

    assert_eq!(frame_ticks(1, 30000.0 / 1001.0), 3003);
    assert_eq!(frame_ticks(25, 25.0), 90_000);
}
