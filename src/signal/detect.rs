//! Fixed-priority type classifier (spec.md §4.2 "Type detection").

use super::types::SignalKind;
use regex::Regex;
use std::sync::OnceLock;

const FUNDING_MARKER: &str = "\u{421}\u{438}\u{433}\u{43d}\u{430}\u{43b} \u{43f}\u{43e} \u{444}\u{430}\u{43d}\u{434}\u{438}\u{43d}\u{433}\u{443}";
const QUICK_GROWTH_MARKER: &str =
    "\u{41d}\u{41e}\u{412}\u{410}\u{42f} \u{426}\u{415}\u{41b}\u{042c} \u{420}\u{41e}\u{421}\u{422}\u{410}";
const QUICK_DECLINE_MARKER: &str = "\u{41d}\u{41e}\u{412}\u{410}\u{42f} \u{426}\u{415}\u{41b}\u{042c} \u{41f}\u{410}\u{414}\u{415}\u{041d}\u{418}\u{042f}";

fn sentiment_header_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\bday\b[^%\n]{0,40}%").unwrap())
}

/// Applies the seven-step fixed priority from spec.md §4.2. Returns `None`
/// for "otherwise null" (step 7).
pub fn detect(text: &str) -> Option<SignalKind> {
    if text.contains(FUNDING_MARKER) {
        return Some(SignalKind::FundingRate);
    }
    if text.contains(QUICK_GROWTH_MARKER) || text.contains(QUICK_DECLINE_MARKER) {
        return Some(SignalKind::QuickTarget);
    }
    if text.contains("#SENTIMENT") || sentiment_header_re().is_match(text) {
        return Some(SignalKind::Sentiment);
    }
    if text.contains("#StrongSignal") {
        return Some(SignalKind::StrongSignal);
    }
    if text.contains("#MediumSignal") {
        return Some(SignalKind::MediumSignal);
    }
    if text.contains("**Entry:**") && text.contains("**Targets:**") {
        return Some(SignalKind::EntrySignal);
    }
    None
}
