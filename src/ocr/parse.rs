//! Contact field parsing from raw OCR text.
//!
//! Pure pattern heuristics over already-extracted text: an email regex, a
//! set of phone patterns, and an ordered rule list for candidate names.
//! All three extractions are independent and deterministic.

use std::sync::OnceLock;

use regex::Regex;

/// Sentinel returned when no name could be extracted.
pub const NAME_NOT_FOUND: &str = "Name Not Found";
/// Sentinel returned when no email could be extracted.
pub const EMAIL_NOT_FOUND: &str = "email@not.found";
/// Sentinel returned when no phone number could be extracted.
pub const PHONE_NOT_FOUND: &str = "Phone Not Found";

/// Minimum digits for a match to count as a phone number.
const MIN_PHONE_DIGITS: usize = 7;

fn email_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[\w.-]+@[\w.-]+\.\w+").expect("email regex should compile"))
}

fn phone_regexes() -> &'static Vec<Regex> {
    static RES: OnceLock<Vec<Regex>> = OnceLock::new();
    RES.get_or_init(|| {
        [
            // US format with optional country code
            r"\+?1?\s*\(?[0-9]{3}\)?[\s.-]?[0-9]{3}[\s.-]?[0-9]{4}",
            // International
            r"\+?[0-9]{1,4}[\s.-]?[0-9]{3,4}[\s.-]?[0-9]{3,4}[\s.-]?[0-9]{3,4}",
            // Standard US
            r"\(?[0-9]{3}\)?[\s.-]?[0-9]{3}[\s.-]?[0-9]{4}",
        ]
        .iter()
        .map(|p| Regex::new(p).expect("phone regex should compile"))
        .collect()
    })
}

fn name_label_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\bname\s*[:\-]\s*([^,\n]+)").expect("name label regex should compile")
    })
}

/// Extract the first email address from text.
pub fn extract_email(text: &str) -> Option<String> {
    email_regex().find(text).map(|m| m.as_str().to_string())
}

/// Extract the first phone number from text.
///
/// Patterns are tried in priority order; a match must carry at least
/// [`MIN_PHONE_DIGITS`] digits to count.
pub fn extract_phone(text: &str) -> Option<String> {
    for pattern in phone_regexes() {
        if let Some(m) = pattern.find(text) {
            let digits = m.as_str().chars().filter(|c| c.is_ascii_digit()).count();
            if digits >= MIN_PHONE_DIGITS {
                return Some(m.as_str().trim().to_string());
            }
        }
    }
    None
}

/// Markers of lines that are clearly not a person's name.
const NON_NAME_MARKERS: &[&str] = &["@", "http", "www", "phone", "email", "address", "company"];

/// Extract a candidate name from text.
///
/// Rules, in priority order:
/// 1. A line labeled `name:` (or `name -`), value taken after the separator.
/// 2. Scan lines top-to-bottom, skipping lines with non-name markers;
///    prefer a line of 2-4 words where at least 80% are alphabetic.
/// 3. Fall back to the first non-blank line without a non-name marker.
pub fn extract_name(text: &str) -> Option<String> {
    if let Some(caps) = name_label_regex().captures(text) {
        let value = caps[1].trim().to_string();
        if value.len() >= 3 {
            return Some(value);
        }
    }

    let mut first_plain_line: Option<&str> = None;

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let lower = line.to_lowercase();
        if NON_NAME_MARKERS.iter().any(|marker| lower.contains(marker)) {
            continue;
        }

        first_plain_line.get_or_insert(line);

        let words: Vec<&str> = line.split_whitespace().collect();
        if (2..=4).contains(&words.len()) {
            let alphabetic = words
                .iter()
                .filter(|w| {
                    let stripped: String = w.chars().filter(|c| *c != '.' && *c != '-').collect();
                    !stripped.is_empty() && stripped.chars().all(|c| c.is_alphabetic())
                })
                .count();
            if alphabetic as f32 >= words.len() as f32 * 0.8 {
                let name = words.join(" ");
                if name.len() >= 3 {
                    return Some(name);
                }
            }
        }
    }

    first_plain_line
        .map(str::to_string)
        .filter(|l| l.len() >= 3)
}
