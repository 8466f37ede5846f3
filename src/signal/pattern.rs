//! Pattern label + strength extraction shared by strong/medium signals
//! (spec.md §4.2 "extract pattern... pattern strength %").

use super::types::Pattern;
use regex::Regex;
use rust_decimal::Decimal;
use std::str::FromStr;
use std::sync::OnceLock;

fn pattern_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\*\*([^*]+)\*\*\s*(\d+(?:\.\d+)?)%").unwrap())
}

/// Categorizes a bolded pattern label by substring; order matters since
/// "ob reversal" and "os reversal" both contain "reversal".
fn categorize(label: &str) -> Pattern {
    let lower = label.to_lowercase();
    if lower.contains("trend") {
        Pattern::TrendReversal
    } else if lower.contains("ob revers") || lower.contains("overbought") {
        Pattern::ObReversal
    } else if lower.contains("os revers") || lower.contains("oversold") {
        Pattern::OsReversal
    } else if lower.contains("breakout") {
        Pattern::Breakout
    } else if lower.contains("pullback") {
        Pattern::Pullback
    } else if lower.contains("diverg") {
        Pattern::Divergence
    } else {
        Pattern::Unknown
    }
}

/// Returns the pattern category and its strength percentage, if present.
pub fn extract(text: &str) -> Option<(Pattern, Decimal)> {
    let caps = pattern_re().captures(text)?;
    let strength = Decimal::from_str(&caps[2]).ok()?;
    Some((categorize(&caps[1]), strength))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categorizes_trend_reversal_and_strength() {
        let (pattern, strength) = extract("**\u{2193} TREND Reversal \u{2191}** 65%").unwrap();
        assert_eq!(pattern, Pattern::TrendReversal);
        assert_eq!(strength, Decimal::from(65));
    }

    #[test]
    fn categorizes_breakout() {
        let (pattern, _) = extract("**Breakout confirmed** 40%").unwrap();
        assert_eq!(pattern, Pattern::Breakout);
    }

    #[test]
    fn unrecognized_label_is_unknown() {
        let (pattern, _) = extract("**Something else** 10%").unwrap();
        assert_eq!(pattern, Pattern::Unknown);
    }

    #[test]
    fn absent_pattern_returns_none() {
        assert_eq!(extract("no pattern line here"), None);
    }
}
