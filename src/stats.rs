//! Throughput extraction from the control surface's stats text.
//!
//! The stats format is loosely structured and has changed between helper
//! releases, so extraction is a fixed, ordered list of strategies. The first
//! strategy that finds a numeric value decides the result.

use tracing::debug;

use crate::error::StatsError;

/// Labels accepted by [`Strategy::CaseInsensitiveLabel`].
const GENERIC_LABELS: &[&str] = &["throughput", "rate", "speed"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// `Throughput: <N> [unit]`, exact case.
    ExactLabel,
    /// `<label>[:=] <N> [unit]` where label is one of [`GENERIC_LABELS`], any case.
    CaseInsensitiveLabel,
    /// `throughput = <N> Mbps` inside a "Throughput Stats" section.
    Section,
}

pub const STRATEGIES: [Strategy; 3] = [
    Strategy::ExactLabel,
    Strategy::CaseInsensitiveLabel,
    Strategy::Section,
];

/// Parse a throughput figure out of `text`, normalised to bits per second.
///
/// A line whose value cannot be read does not stop the search. If no
/// strategy yields a value, the first such error is returned, otherwise
/// [`StatsError::NoThroughput`].
pub fn parse_throughput(text: &str) -> Result<u64, StatsError> {
    let mut first_err = None;
    for strategy in STRATEGIES {
        match strategy.extract(text) {
            Ok(Some(bps)) => {
                debug!(?strategy, bps, "throughput extracted");
                return Ok(bps);
            }
            Ok(None) => {}
            Err(e) => {
                first_err.get_or_insert(e);
            }
        }
    }
    Err(first_err.unwrap_or(StatsError::NoThroughput))
}

impl Strategy {
    /// `Ok(None)` means the strategy found nothing and the next one should run.
    /// `Err` means it found only lines it could not read.
    pub fn extract(self, text: &str) -> Result<Option<u64>, StatsError> {
        let mut scan = Scan::new(self);
        match self {
            Strategy::ExactLabel => {
                for line in text.lines() {
                    if let Some(idx) = line.find("Throughput:")
                        && let Some(v) = scan.value(line, &line[idx + "Throughput:".len()..])
                    {
                        return Ok(Some(v));
                    }
                }
            }
            Strategy::CaseInsensitiveLabel => {
                for line in text.lines() {
                    let Some((label, rest)) = split_label(line) else {
                        continue;
                    };
                    if GENERIC_LABELS.iter().any(|l| label.eq_ignore_ascii_case(l))
                        && let Some(v) = scan.value(line, rest)
                    {
                        return Ok(Some(v));
                    }
                }
            }
            Strategy::Section => {
                let mut in_section = false;
                for line in text.lines() {
                    let lower = line.to_ascii_lowercase();
                    if lower.contains("throughput stats") {
                        in_section = true;
                        continue;
                    }
                    if !in_section {
                        continue;
                    }
                    if is_section_header(line) {
                        in_section = false;
                        continue;
                    }
                    if lower.contains("throughput")
                        && let Some(v) = scan.value(line, line)
                    {
                        return Ok(Some(v));
                    }
                }
            }
        }
        scan.finish()
    }
}

/// Per-strategy line scanner that skips unreadable values but remembers the
/// first one.
struct Scan {
    strategy: Strategy,
    first_err: Option<StatsError>,
}

impl Scan {
    fn new(strategy: Strategy) -> Self {
        Self {
            strategy,
            first_err: None,
        }
    }

    fn value(&mut self, line: &str, s: &str) -> Option<u64> {
        match value_in(s) {
            Ok(v) => v,
            Err(e) => {
                debug!(strategy = ?self.strategy, line, error = %e, "skipping stats line");
                self.first_err.get_or_insert(e);
                None
            }
        }
    }

    fn finish(self) -> Result<Option<u64>, StatsError> {
        match self.first_err {
            Some(e) => Err(e),
            None => Ok(None),
        }
    }
}

/// Split `label: rest` / `label = rest` / `label rest`.
fn split_label(line: &str) -> Option<(&str, &str)> {
    let line = line.trim_start();
    match line.find([':', '=']) {
        Some(idx) => Some((line[..idx].trim(), &line[idx + 1..])),
        None => line.split_once(char::is_whitespace),
    }
}

// Headers look like "Throughput Stats", "----- Tx Stats -----" or "[rx]".
fn is_section_header(line: &str) -> bool {
    let t = line.trim();
    if t.is_empty() {
        return false;
    }
    let lower = t.to_ascii_lowercase();
    (lower.ends_with("stats") || lower.starts_with('[') || lower.starts_with("---"))
        && !t.contains(['=', ':'])
}

/// First numeric token in `s` plus an optional unit right after it.
fn value_in(s: &str) -> Result<Option<u64>, StatsError> {
    let Some(start) = s.find(|c: char| c.is_ascii_digit()) else {
        return Ok(None);
    };
    let rest = &s[start..];
    let end = rest
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(rest.len());
    let number = &rest[..end];
    let unit = rest[end..]
        .trim_start()
        .split(|c: char| c.is_whitespace() || c == ',' || c == ';' || c == ')')
        .next()
        .unwrap_or("");
    to_bps(number, unit).map(Some)
}

// Bit-rate spellings after an optional k/m/g prefix.
const RATE_UNITS: &[&str] = &[
    "bps", "b/s", "bit/s", "bits/s", "b/sec", "bit/sec", "bits/sec",
];

fn unit_multiplier(unit: &str) -> Option<u64> {
    let unit = unit.to_ascii_lowercase();
    if unit.is_empty() {
        return Some(1);
    }
    let (scale, base) = if let Some(b) = unit.strip_prefix('k') {
        (1_000, b)
    } else if let Some(b) = unit.strip_prefix('m') {
        (1_000_000, b)
    } else if let Some(b) = unit.strip_prefix('g') {
        (1_000_000_000, b)
    } else {
        (1, unit.as_str())
    };
    RATE_UNITS.contains(&base).then_some(scale)
}

/// A word that reads as some per-second rate, e.g. "pps", "Tbps", "MBytes/sec".
fn looks_like_rate(unit: &str) -> bool {
    let lower = unit.to_ascii_lowercase();
    unit.chars().next().is_some_and(|c| c.is_ascii_alphabetic())
        && (lower.ends_with("ps") || lower.ends_with("/s") || lower.ends_with("/sec"))
}

fn to_bps(number: &str, unit: &str) -> Result<u64, StatsError> {
    // A word after the number that is not a rate unit ("pkts", "bytes") is ignored
    let mult = match unit_multiplier(unit) {
        Some(m) => m,
        None if looks_like_rate(unit) => {
            return Err(StatsError::UnknownUnit(unit.to_string()));
        }
        None => 1,
    };

    if let Ok(n) = number.parse::<u64>() {
        return n
            .checked_mul(mult)
            .ok_or_else(|| StatsError::BadNumber(number.to_string()));
    }
    let f: f64 = number
        .parse()
        .map_err(|_| StatsError::BadNumber(number.to_string()))?;
    let bps = (f * mult as f64).round();
    if !bps.is_finite() || bps < 0.0 || bps > u64::MAX as f64 {
        return Err(StatsError::BadNumber(number.to_string()));
    }
    Ok(bps as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_label_line() {
        let text = "Tx packets: 1000\nThroughput: 987654321\n";
        assert_eq!(parse_throughput(text).unwrap(), 987_654_321);
    }

    #[test]
    fn exact_label_with_unit() {
        assert_eq!(parse_throughput("Throughput: 12 Mbps").unwrap(), 12_000_000);
    }

    #[test]
    fn section_mbps_converts_to_bps() {
        let text = "\
Tx Stats
  packets     = 204800
  bytes       = 307200000

Throughput Stats
  duration    = 10 sec
  throughput  = 250 Mbps
";
        assert_eq!(parse_throughput(text).unwrap(), 250_000_000);
    }

    #[test]
    fn section_strategy_alone() {
        let text = "Throughput Stats\n  throughput  = 250 Mbps\n";
        assert_eq!(Strategy::Section.extract(text).unwrap(), Some(250_000_000));
        assert_eq!(Strategy::ExactLabel.extract(text).unwrap(), None);
    }

    #[test]
    fn section_ignores_lines_after_next_header() {
        let text = "Throughput Stats\n  duration = 10\nRx Stats\n  throughput = 5 Mbps\n";
        assert_eq!(Strategy::Section.extract(text).unwrap(), None);
    }

    #[test]
    fn generic_labels_any_case() {
        assert_eq!(parse_throughput("RATE: 1500").unwrap(), 1_500);
        assert_eq!(parse_throughput("tx speed\nSpeed = 2 Gbps").unwrap(), 2_000_000_000);
        assert_eq!(parse_throughput("rate 640 kbps").unwrap(), 640_000);
    }

    #[test]
    fn exact_label_takes_priority() {
        let text = "rate: 1\nThroughput: 2\n";
        assert_eq!(parse_throughput(text).unwrap(), 2);
    }

    #[test]
    fn decimal_values() {
        assert_eq!(parse_throughput("throughput = 12.5 Mbps").unwrap(), 12_500_000);
        assert_eq!(parse_throughput("Throughput: 1.25Gbps").unwrap(), 1_250_000_000);
    }

    #[test]
    fn missing_value_is_an_error() {
        assert_eq!(parse_throughput(""), Err(StatsError::NoThroughput));
        assert_eq!(
            parse_throughput("packets = 10\nerrors = 0\n"),
            Err(StatsError::NoThroughput)
        );
        assert_eq!(
            parse_throughput("Throughput: n/a\n"),
            Err(StatsError::NoThroughput)
        );
    }

    #[test]
    fn unknown_rate_unit_is_an_error() {
        assert_eq!(
            parse_throughput("Throughput: 5 Tbps"),
            Err(StatsError::UnknownUnit("Tbps".into()))
        );
    }

    #[test]
    fn malformed_number_is_an_error() {
        assert!(matches!(
            parse_throughput("Throughput: 1.2.3"),
            Err(StatsError::BadNumber(_))
        ));
    }

    #[test]
    fn unreadable_line_does_not_hide_later_value() {
        let text = "rate: 81000 pps\nThroughput Stats\n  throughput  = 250 Mbps\n";
        assert_eq!(parse_throughput(text).unwrap(), 250_000_000);
    }

    #[test]
    fn later_line_in_same_strategy_is_used() {
        let text = "rate: 81000 pps\nrate: 3 Mbps\n";
        assert_eq!(
            Strategy::CaseInsensitiveLabel.extract(text).unwrap(),
            Some(3_000_000)
        );
    }

    #[test]
    fn only_unreadable_lines_report_first_error() {
        let text = "rate: 81000 pps\nspeed: 2 Tbps\n";
        assert_eq!(
            parse_throughput(text),
            Err(StatsError::UnknownUnit("pps".into()))
        );
    }

    #[test]
    fn per_second_spellings() {
        assert_eq!(parse_throughput("Throughput: 250 Mbits/sec").unwrap(), 250_000_000);
        assert_eq!(parse_throughput("throughput = 250 Mbit/sec").unwrap(), 250_000_000);
        assert_eq!(parse_throughput("rate: 64 kbits/sec").unwrap(), 64_000);
        assert_eq!(parse_throughput("speed = 1.5 Gbits/sec").unwrap(), 1_500_000_000);
        assert_eq!(parse_throughput("Throughput: 900 bits/s").unwrap(), 900);
        assert_eq!(parse_throughput("Throughput: 7 Mb/sec").unwrap(), 7_000_000);
    }

    #[test]
    fn unknown_per_second_unit_is_an_error() {
        assert_eq!(
            parse_throughput("Throughput: 30 MBytes/sec"),
            Err(StatsError::UnknownUnit("MBytes/sec".into()))
        );
        assert_eq!(
            parse_throughput("Throughput: 30 pkt/s"),
            Err(StatsError::UnknownUnit("pkt/s".into()))
        );
    }
}
