use log::warn;

const MEMINFO_FIELDS: [&str; 3] = ["MemFree:", "Buffers:", "Cached:"];

/// Bytes of memory the scaler may use, `None` when unknown.
#[cfg(target_os = "linux")]
pub fn free_memory() -> Option<u64> {
    match std::fs::read_to_string("/proc/meminfo") {
        Ok(content) => Some(parse_meminfo(&content)),
        Err(e) => {
            warn!("Failed to read /proc/meminfo: {e}");
            None
        }
    }
}

#[cfg(not(target_os = "linux"))]
pub fn free_memory() -> Option<u64> {
    None
}

/// Sums free, buffer and cache memory. Values in meminfo are in kB.
pub fn parse_meminfo(content: &str) -> u64 {
    let kilobytes: u64 = content
        .lines()
        .filter_map(|line| {
            let mut tokens = line.split_whitespace();
            let name = tokens.next()?;
            if !MEMINFO_FIELDS.contains(&name) {
                return None;
            }
            tokens.next()?.parse::<u64>().ok()
        })
        .sum();
    kilobytes * 1024
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sums_free_buffers_and_cached() {
        let content = "MemTotal:       16314248 kB\n\
                       MemFree:          100 kB\n\
                       MemAvailable:    9000 kB\n\
                       Buffers:           20 kB\n\
                       Cached:             3 kB\n\
                       SwapCached:      5000 kB\n";
        assert_eq!(parse_meminfo(content), 123 * 1024);
    }

    #[test]
    fn malformed_values_are_skipped() {
        assert_eq!(parse_meminfo("MemFree: lots kB\nCached: 1 kB"), 1024);
        assert_eq!(parse_meminfo(""), 0);
    }
}
