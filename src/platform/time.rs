//! Wall-clock time source

/// Seconds since the Unix epoch
#[cfg(target_arch = "wasm32")]
pub fn unix_time() -> f64 {
    js_sys::Date::now() / 1000.0
}

/// Seconds since the Unix epoch (0 if the system clock is before 1970)
#[cfg(not(target_arch = "wasm32"))]
pub fn unix_time() -> f64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unix_time_is_recent() {
        // 2020-01-01T00:00:00Z
        assert!(unix_time() > 1_577_836_800.0);
    }
}
