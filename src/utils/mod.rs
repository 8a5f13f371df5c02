/// Percentage of `downloaded` against the exact total, or the estimate when
/// the exact total is unknown. `None` when neither gives a usable total.
pub fn download_percent(
    downloaded: u64,
    total_bytes: Option<u64>,
    total_bytes_estimate: Option<f64>,
) -> Option<f32> {
    let total = match total_bytes {
        Some(t) if t > 0 => t as f64,
        _ => total_bytes_estimate.filter(|t| t.is_finite() && *t > 0.0)?,
    };

    Some(((downloaded as f64 / total) * 100.0).clamp(0.0, 100.0) as f32)
}

/// Human readable byte count, binary units
pub fn format_bytes(bytes: f64) -> String {
    const UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];

    let mut value = bytes.max(0.0);
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    if unit == 0 {
        format!("{:.0}{}", value, UNITS[unit])
    } else {
        format!("{:.2}{}", value, UNITS[unit])
    }
}

pub fn format_speed(bytes_per_second: f64) -> String {
    format!("{}/s", format_bytes(bytes_per_second))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent_prefers_exact_total() {
        assert_eq!(download_percent(50, Some(200), Some(1000.0)), Some(25.0));
        assert_eq!(download_percent(50, None, Some(100.0)), Some(50.0));
    }

    #[test]
    fn test_percent_without_total() {
        assert_eq!(download_percent(50, None, None), None);
        assert_eq!(download_percent(50, Some(0), None), None);
        assert_eq!(download_percent(50, Some(0), Some(0.0)), None);
        assert_eq!(download_percent(50, None, Some(f64::NAN)), None);
    }

    #[test]
    fn test_percent_is_clamped() {
        // estimates can undershoot the real size
        assert_eq!(download_percent(300, None, Some(200.0)), Some(100.0));
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512.0), "512B");
        assert_eq!(format_bytes(1536.0), "1.50KiB");
        assert_eq!(format_speed(3.0 * 1024.0 * 1024.0), "3.00MiB/s");
    }
}
