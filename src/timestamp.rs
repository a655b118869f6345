/// Formats a duration in seconds as `HH:MM:SS.mmm`.
///
/// Hours widen past two digits instead of wrapping. Negative and NaN
/// inputs are shown as zero.
pub fn time_str(sec: f64) -> String {
    let total_ms = if sec.is_finite() && sec > 0.0 {
        (sec * 1000.0).round() as u64
    } else {
        0
    };

    let hours = total_ms / 3_600_000;
    let minutes = total_ms / 60_000 % 60;
    let seconds = total_ms / 1000 % 60;
    let milliseconds = total_ms % 1000;

    format!("{hours:02}:{minutes:02}:{seconds:02}.{milliseconds:03}")
}

#[test]
fn test_time_str() {
    assert_eq!(time_str(0.0), "00:00:00.000");
    assert_eq!(time_str(1.5), "00:00:01.500");
    assert_eq!(time_str(3723.004), "01:02:03.004");
    assert_eq!(time_str(360_000.0), "100:00:00.000");
    assert_eq!(time_str(-2.0), "00:00:00.000");
}
