//! Conversions between flat region names and `(area, location)` pairs.

use foundation::RoiKey;

/// Location id of the base instance of every area.
pub const BASE_LOCATION: &str = "1";

/// Canonical ROI key for an area/location pair.
///
/// `resolve_roi("park", "1") == "park"`, `resolve_roi("park", "2") == "park_2"`.
pub fn resolve_roi(area: &str, location: &str) -> RoiKey {
    if location == BASE_LOCATION {
        RoiKey::new(area)
    } else {
        RoiKey::new(format!("{area}_{location}"))
    }
}

/// Splits a flat region name into its base area and location id.
///
/// A trailing `_<digits>` suffix is a location of the base; anything else is
/// itself a base area at [`BASE_LOCATION`]. An empty base (`"_2"`) is not
/// treated as a suffix match.
pub fn split_region(name: &str) -> (&str, &str) {
    if let Some((base, suffix)) = name.rsplit_once('_') {
        if !base.is_empty() && !suffix.is_empty() && suffix.bytes().all(|b| b.is_ascii_digit()) {
            return (base, suffix);
        }
    }
    (name, BASE_LOCATION)
}

/// Human label for an area key: underscores become spaces and the first
/// character of every whitespace-delimited word is uppercased.
pub fn format_label(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    let mut at_word_start = true;
    for ch in key.chars() {
        let ch = if ch == '_' { ' ' } else { ch };
        if ch.is_whitespace() {
            at_word_start = true;
            out.push(ch);
        } else if at_word_start {
            at_word_start = false;
            out.extend(ch.to_uppercase());
        } else {
            out.push(ch);
        }
    }
    out
}
