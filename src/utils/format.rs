/// Human-readable bit rate for a byte count, decimal units (`1.6 kbit`)
pub fn format_bits(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["bit", "kbit", "Mbit", "Gbit", "Tbit"];
    scale(bytes as f64 * 8.0, 1000.0, &UNITS)
}

/// Human-readable size, binary units (`256 KiB`)
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];
    scale(bytes as f64, 1024.0, &UNITS)
}

fn scale(value: f64, base: f64, units: &[&str]) -> String {
    let mut magnitude = value.max(0.0);
    let mut unit = 0;
    while magnitude >= base && unit < units.len() - 1 {
        magnitude /= base;
        unit += 1;
    }
    let rounded = format!("{:.2}", magnitude);
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", trimmed, units[unit])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_bits() {
        assert_eq!(format_bits(0), "0 bit");
        assert_eq!(format_bits(1), "8 bit");
        assert_eq!(format_bits(200), "1.6 kbit");
        assert_eq!(format_bits(125_000), "1 Mbit");
        assert_eq!(format_bits(1_234_567), "9.88 Mbit");
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(262_144), "256 KiB");
        assert_eq!(format_bytes(1_572_864), "1.5 MiB");
    }
}
