//! Popularity key extraction for job ordering.
//!
//! Target names in a batch usually lead with a popularity figure, e.g.
//! `1.2万点赞.mp4` or `8500_views.mp4`. The figure is read best-effort:
//! a name without a leading figure ranks last (key 0) and never errors.

use once_cell::sync::Lazy;
use regex::Regex;

/// Suffix meaning "ten thousand"
pub const TEN_THOUSAND_SUFFIX: &str = "万";

/// Suffix meaning "thousand"
pub const THOUSAND_SUFFIX: &str = "千";

static LEADING_FIGURE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+(?:\.\d+)?)(万|千)?").expect("leading figure pattern is valid"));

/// Extract the ordering key from a display name.
///
/// `"1.0万"` → 10000.0, `"3千"` → 3000.0, `"8500"` → 8500.0, `"clip"` → 0.0
pub fn extract_priority_key(display_name: &str) -> f64 {
    let Some(caps) = LEADING_FIGURE.captures(display_name) else {
        return 0.0;
    };

    let Ok(value) = caps[1].parse::<f64>() else {
        return 0.0;
    };

    let multiplier = match caps.get(2).map(|m| m.as_str()) {
        Some(TEN_THOUSAND_SUFFIX) => 10_000.0,
        Some(THOUSAND_SUFFIX) => 1_000.0,
        _ => 1.0,
    };

    value * multiplier
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_figure() {
        assert_eq!(extract_priority_key("8500.mp4"), 8500.0);
        assert_eq!(extract_priority_key("42-likes.mkv"), 42.0);
    }

    #[test]
    fn test_ten_thousand_suffix() {
        assert_eq!(extract_priority_key("1.0万"), 10_000.0);
        assert_eq!(extract_priority_key("2.5万点赞.mp4"), 25_000.0);
    }

    #[test]
    fn test_thousand_suffix() {
        assert_eq!(extract_priority_key("3千.mp4"), 3_000.0);
        assert_eq!(extract_priority_key("1.5千播放.mov"), 1_500.0);
    }

    #[test]
    fn test_unparseable_names_rank_last() {
        assert_eq!(extract_priority_key("holiday.mp4"), 0.0);
        assert_eq!(extract_priority_key(""), 0.0);
        assert_eq!(extract_priority_key("万.mp4"), 0.0);
    }

    #[test]
    fn test_figure_must_lead() {
        assert_eq!(extract_priority_key("clip 900.mp4"), 0.0);
    }

    #[test]
    fn test_unknown_suffix_is_ignored() {
        // "k" is not a recognised multiplier, the bare figure still counts
        assert_eq!(extract_priority_key("12k.mp4"), 12.0);
    }
}
