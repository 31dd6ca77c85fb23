//! Description keyword scan.

/// Words that push the score up by a full point.
pub const HIGH_SEVERITY_KEYWORDS: &[&str] = &[
    "emergency",
    "urgent",
    "dangerous",
    "blocking",
    "major",
    "severe",
    "accident",
    "injury",
    "broken",
    "flood",
    "leak",
    "overflow",
];

/// Words that push the score up by half a point.
pub const MEDIUM_SEVERITY_KEYWORDS: &[&str] =
    &["damaged", "cracked", "slow", "dirty", "clogged", "minor"];

/// Words that pull the score down by half a point.
pub const LOW_SEVERITY_KEYWORDS: &[&str] = &["maintenance", "cleaning", "cosmetic", "small"];

/// Words suggesting the reporter measured the problem.
pub const MEASUREMENT_WORDS: &[&str] = &["meter", "feet", "inch", "cm", "deep", "wide", "long"];

const HIGH_DELTA: f64 = 1.0;
const MEDIUM_DELTA: f64 = 0.5;
const LOW_DELTA: f64 = -0.5;

/// Outcome of scanning a description.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct KeywordScan {
    pub high: Option<&'static str>,
    pub medium: Option<&'static str>,
    pub low: Option<&'static str>,
}

impl KeywordScan {
    /// Net score adjustment, clamped to [-1, 1]. Each list counts at most once.
    pub fn adjustment(&self) -> f64 {
        let mut adjustment = 0.0;
        if self.high.is_some() {
            adjustment += HIGH_DELTA;
        }
        if self.medium.is_some() {
            adjustment += MEDIUM_DELTA;
        }
        if self.low.is_some() {
            adjustment += LOW_DELTA;
        }
        f64::clamp(adjustment, -1.0, 1.0)
    }
}

fn first_match(text: &str, list: &[&'static str]) -> Option<&'static str> {
    list.iter().copied().find(|keyword| text.contains(keyword))
}

/// Scan an already lower-cased description against the three lists.
pub fn scan(description_lower: &str) -> KeywordScan {
    KeywordScan {
        high: first_match(description_lower, HIGH_SEVERITY_KEYWORDS),
        medium: first_match(description_lower, MEDIUM_SEVERITY_KEYWORDS),
        low: first_match(description_lower, LOW_SEVERITY_KEYWORDS),
    }
}

pub fn mentions_measurement(description_lower: &str) -> bool {
    first_match(description_lower, MEASUREMENT_WORDS).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_keyword_in_list_order_wins() {
        let s = scan("broken pipe, dangerous");
        assert_eq!(s.high, Some("dangerous"));
        assert_eq!(s.adjustment(), 1.0);
    }

    #[test]
    fn test_lists_combine_and_clamp() {
        assert_eq!(scan("urgent and dirty").adjustment(), 1.0);
        assert_eq!(scan("dirty").adjustment(), 0.5);
        assert_eq!(scan("small cosmetic chip").adjustment(), -0.5);
        assert_eq!(scan("dirty but small").adjustment(), 0.0);
        assert_eq!(scan("nothing notable").adjustment(), 0.0);
    }

    #[test]
    fn test_measurement_words() {
        assert!(mentions_measurement("about 2 feet across"));
        assert!(mentions_measurement("30cm"));
        assert!(!mentions_measurement("signal broken, dangerous intersection"));
    }
}
