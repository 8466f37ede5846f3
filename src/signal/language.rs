//! Language detection (spec.md §4.2): ru if Cyrillic and no 3+-letter Latin
//! run, mixed if both, else en.

use super::types::Language;

fn has_cyrillic(text: &str) -> bool {
    text.chars().any(|c| ('\u{0400}'..='\u{04FF}').contains(&c))
}

fn has_latin_run(text: &str) -> bool {
    let mut run = 0;
    for c in text.chars() {
        if c.is_ascii_alphabetic() {
            run += 1;
            if run >= 3 {
                return true;
            }
        } else {
            run = 0;
        }
    }
    false
}

pub fn detect(text: &str) -> Language {
    match (has_cyrillic(text), has_latin_run(text)) {
        (true, true) => Language::Mixed,
        (true, false) => Language::Ru,
        _ => Language::En,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_english_when_no_cyrillic() {
        assert_eq!(detect("LONG BTC entry now"), Language::En);
    }

    #[test]
    fn detects_russian_when_cyrillic_without_latin_run() {
        assert_eq!(detect("Сигнал по фандингу 123"), Language::Ru);
    }

    #[test]
    fn detects_mixed_when_both_present() {
        assert_eq!(detect("Сигнал BTCUSDT growth"), Language::Mixed);
    }

    #[test]
    fn short_latin_runs_under_three_do_not_count_as_latin() {
        assert_eq!(detect("Сигнал AB CD"), Language::Ru);
    }
}
