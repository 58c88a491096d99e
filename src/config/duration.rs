//! Duration parsing for interval arguments.

use anyhow::Context;
use std::time::Duration;

const UNITS: [(&str, u64); 4] = [("ms", 1), ("h", 3_600_000), ("m", 60_000), ("s", 1_000)];

/// Parse a duration string like "500ms", "10s", "5m", "1h" or "300".
///
/// A plain number is seconds. Zero is rejected.
pub fn parse_duration(s: &str) -> anyhow::Result<Duration> {
    let s = s.trim();
    if s.is_empty() {
        anyhow::bail!("Empty duration string");
    }

    let (number, millis_per_unit) = UNITS
        .iter()
        .find_map(|(suffix, millis)| s.strip_suffix(suffix).map(|n| (n, *millis)))
        .unwrap_or((s, 1_000));

    let value: u64 = number
        .parse()
        .with_context(|| format!("Invalid duration value: {s}"))?;
    let millis = value
        .checked_mul(millis_per_unit)
        .with_context(|| format!("Duration out of range: {s}"))?;
    if millis == 0 {
        anyhow::bail!("Duration must be positive: {s}");
    }
    Ok(Duration::from_millis(millis))
}
