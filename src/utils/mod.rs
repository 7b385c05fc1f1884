use std::time::{Duration, Instant};
use tracing::info;

/// A simple wall-clock timer for logging elapsed time.
pub struct Timer {
    label: String,
    start: Instant,
}

impl Timer {
    pub fn start(label: impl Into<String>) -> Self {
        let label = label.into();
        info!("⏱  Starting: {}", label);
        Self {
            label,
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        info!("⏱  Finished: {} (took {:.2?})", self.label, self.elapsed());
    }
}

/// Format a large integer with thousands separators.
pub fn fmt_number(n: i64) -> String {
    let s = n.abs().to_string();
    let mut result = String::new();
    for (i, ch) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(ch);
    }
    if n < 0 {
        result.push('-');
    }
    result.chars().rev().collect()
}

/// Split comma-separated input, trim each entry, drop empties.
pub fn clean_list<S: AsRef<str>>(raw: &[S]) -> Vec<String> {
    raw.iter()
        .flat_map(|s| s.as_ref().split(','))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// `clean_list`, upper-cased.
pub fn clean_symbols<S: AsRef<str>>(raw: &[S]) -> Vec<String> {
    clean_list(raw)
        .into_iter()
        .map(|s| crate::transform::normalise_symbol(&s))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fmt_number() {
        assert_eq!(fmt_number(1_234_567), "1,234,567");
        assert_eq!(fmt_number(0), "0");
        assert_eq!(fmt_number(-42_000), "-42,000");
        assert_eq!(fmt_number(999), "999");
    }

    #[test]
    fn test_clean_list() {
        assert_eq!(clean_list(&["Portland, London,,  ,Karachi"]), ["Portland", "London", "Karachi"]);
        assert_eq!(clean_list(&["London", " "]), ["London"]);
        assert!(clean_list::<&str>(&[]).is_empty());
    }

    #[test]
    fn test_clean_symbols() {
        assert_eq!(clean_symbols(&["aapl, msft"]), ["AAPL", "MSFT"]);
    }
}
