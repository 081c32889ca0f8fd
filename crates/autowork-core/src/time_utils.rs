use chrono::{DateTime, Local, Utc};

/// Returns the current Unix timestamp in milliseconds.
pub fn current_unix_timestamp_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis()
        .try_into()
        .unwrap_or(u64::MAX)
}

/// Renders a UTC instant as local `YYYY-MM-DD HH:MM`.
pub fn format_local_minute(value: &DateTime<Utc>) -> String {
    value
        .with_timezone(&Local)
        .format("%Y-%m-%d %H:%M")
        .to_string()
}

/// Renders the current local wall-clock time as `HH:MM:SS`.
pub fn format_local_clock() -> String {
    Local::now().format("%H:%M:%S").to_string()
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::{current_unix_timestamp_ms, format_local_clock, format_local_minute};

    #[test]
    fn unit_current_unix_timestamp_ms_is_after_2024() {
        assert!(current_unix_timestamp_ms() > 1_704_067_200_000);
    }

    #[test]
    fn unit_local_formats_have_expected_shape() {
        let instant = Utc
            .with_ymd_and_hms(2025, 3, 14, 9, 26, 53)
            .single()
            .expect("valid instant");
        let minute = format_local_minute(&instant);
        assert_eq!(minute.len(), "2025-03-14 09:26".len());
        assert_eq!(&minute[4..5], "-");
        assert_eq!(&minute[13..14], ":");

        let clock = format_local_clock();
        assert_eq!(clock.len(), 8);
        assert_eq!(clock.matches(':').count(), 2);
    }
}
