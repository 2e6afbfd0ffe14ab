//! Record naming
//!
//! Derives a readable, file-safe name for a transcript from its first user
//! messages, sanitizes caller-supplied names, and resolves collisions
//! against the names already present in a store.

use crate::Transcript;
use chrono::{Local, NaiveDateTime};
use std::collections::HashSet;

/// User messages whose trimmed content is this short or shorter are ignored
pub const MIN_MESSAGE_CHARS: usize = 3;

/// Number of qualifying user messages that feed a derived name
pub const MAX_SOURCE_MESSAGES: usize = 5;

/// Joined source text is cut to this many characters before tokenizing
pub const MAX_SOURCE_CHARS: usize = 200;

/// Tokens this short or shorter are dropped
pub const MIN_TOKEN_CHARS: usize = 3;

/// Number of tokens kept in a derived name
pub const MAX_TOKENS: usize = 5;

/// Upper bound on the length of a sanitized name, in characters
pub const MAX_NAME_CHARS: usize = 120;

/// Upper bound on the UTF-8 length of a sanitized name. Leaves room under
/// the common 255-byte file name limit for a `_NN` suffix and `.json.tmp`.
pub const MAX_NAME_BYTES: usize = 200;

const RECORD_EXTENSION: &str = ".json";

/// Derive a default name for a transcript using the local wall clock
/// for the fallback path.
pub fn derive_name(transcript: &Transcript) -> String {
    derive_name_at(transcript, Local::now().naive_local())
}

/// Derive a default name for a transcript.
///
/// The name is built from the first words of the first user messages. When
/// no usable word survives filtering, `chat_<YYYYMMDD>_<HHMMSS>` built from
/// `now` is returned, so the result is never empty.
pub fn derive_name_at(transcript: &Transcript, now: NaiveDateTime) -> String {
    let source = transcript
        .user_contents()
        .map(str::trim)
        .filter(|content| content.chars().count() > MIN_MESSAGE_CHARS)
        .take(MAX_SOURCE_MESSAGES)
        .collect::<Vec<_>>()
        .join(" ");
    let source: String = source.chars().take(MAX_SOURCE_CHARS).collect();

    let words: String = source
        .chars()
        .map(|c| if is_word_char(c) { c } else { ' ' })
        .collect();
    let tokens: Vec<String> = words
        .split_whitespace()
        .map(str::to_lowercase)
        .filter(|token| token.chars().count() > MIN_TOKEN_CHARS)
        .take(MAX_TOKENS)
        .collect();

    let name = sanitize_name(&tokens.join("_"));
    if name.is_empty() {
        fallback_name(now)
    } else {
        name
    }
}

/// Timestamp-based name used when a transcript yields no words
pub fn fallback_name(now: NaiveDateTime) -> String {
    format!("chat_{}", now.format("%Y%m%d_%H%M%S"))
}

/// Make a name safe for the storage medium.
///
/// Characters other than letters, digits, `-`, `_`, `.` and space become
/// `_`; a trailing `.json` is dropped; surrounding whitespace and
/// underscores are trimmed. The result is capped at [`MAX_NAME_CHARS`]
/// characters and [`MAX_NAME_BYTES`] bytes. Returns an empty string when
/// nothing usable is left, including names made only of dots.
pub fn sanitize_name(raw: &str) -> String {
    let mut name: String = raw
        .trim()
        .chars()
        .map(|c| if is_name_char(c) { c } else { '_' })
        .collect();

    let suffix_start = name.len().saturating_sub(RECORD_EXTENSION.len());
    if name
        .get(suffix_start..)
        .is_some_and(|suffix| suffix.eq_ignore_ascii_case(RECORD_EXTENSION))
    {
        name.truncate(suffix_start);
    }

    let capped: String = trim_name(&name).chars().take(MAX_NAME_CHARS).collect();
    let trimmed = trim_name(truncate_bytes(&capped, MAX_NAME_BYTES));
    if trimmed.chars().all(|c| c == '.') {
        return String::new();
    }
    trimmed.to_string()
}

/// Return `base` if it is free, otherwise the first free `base_NN`
pub fn unique_name(base: &str, existing: &HashSet<String>) -> String {
    if !existing.contains(base) {
        return base.to_string();
    }

    let mut n = 1usize;
    loop {
        let candidate = format!("{}_{:02}", base, n);
        if !existing.contains(&candidate) {
            return candidate;
        }
        n += 1;
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '-' | '_' | '.' | ' ')
}

/// Longest prefix of `name` within `max_bytes`, cut on a char boundary
fn truncate_bytes(name: &str, max_bytes: usize) -> &str {
    if name.len() <= max_bytes {
        return name;
    }
    let mut end = max_bytes;
    while !name.is_char_boundary(end) {
        end -= 1;
    }
    &name[..end]
}

fn trim_name(name: &str) -> &str {
    name.trim_matches(|c: char| c == '_' || c.is_whitespace())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Message;
    use chrono::NaiveDate;

    fn noon() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 9)
            .unwrap()
            .and_hms_opt(12, 0, 5)
            .unwrap()
    }

    fn transcript_of(user_messages: &[&str]) -> Transcript {
        let mut transcript = Transcript::with_greeting("Hi! How can I help?");
        for content in user_messages {
            transcript.add_user_message(*content);
            transcript.add_assistant_message("ok", "compound-beta");
        }
        transcript
    }

    #[test]
    fn test_derive_name_from_first_user_messages() {
        let transcript = transcript_of(&["hola, como estas?", "contame sobre gatos"]);
        assert_eq!(
            derive_name_at(&transcript, noon()),
            "hola_como_estas_contame_sobre"
        );
    }

    #[test]
    fn test_derive_name_ignores_assistant_and_short_messages() {
        let mut transcript = Transcript::new();
        transcript.push(Message::assistant("Explain everything about databases"));
        transcript.add_user_message("ok");
        transcript.add_user_message("   hi   ");
        transcript.add_user_message("Explain Rust lifetimes please");
        assert_eq!(
            derive_name_at(&transcript, noon()),
            "explain_rust_lifetimes_please"
        );
    }

    #[test]
    fn test_derive_name_falls_back_to_timestamp() {
        assert_eq!(
            derive_name_at(&Transcript::new(), noon()),
            "chat_20240309_120005"
        );
        assert_eq!(
            derive_name_at(&transcript_of(&["a b c d", "¿¿¿???"]), noon()),
            "chat_20240309_120005"
        );
        assert!(!derive_name(&Transcript::with_greeting("hello there")).is_empty());
    }

    #[test]
    fn test_derive_name_ignores_trailing_whitespace() {
        let plain = transcript_of(&["tell me about sorting algorithms"]);
        let padded = transcript_of(&["tell me about sorting algorithms   \n\t"]);
        assert_eq!(
            derive_name_at(&plain, noon()),
            derive_name_at(&padded, noon())
        );
    }

    #[test]
    fn test_derive_name_bounds_source_length() {
        let long = format!("{} tail words here", "a".repeat(250));
        let name = derive_name_at(&transcript_of(&[&long]), noon());
        assert_eq!(name.chars().count(), MAX_NAME_CHARS);
        assert!(!name.contains("tail"));
    }

    #[test]
    fn test_derive_name_keeps_non_ascii_words() {
        let transcript = transcript_of(&["¿Cuál es la canción más famosa?"]);
        assert_eq!(
            derive_name_at(&transcript, noon()),
            "cuál_canción_famosa"
        );
    }

    #[test]
    fn test_derive_name_bounds_bytes_of_unspaced_text() {
        let prompt = "请告诉我关于猫的所有事情".repeat(20);
        let name = derive_name_at(&transcript_of(&[&prompt]), noon());

        assert!(name.len() <= MAX_NAME_BYTES);
        assert_eq!(name.chars().count(), MAX_NAME_BYTES / 3);
        assert!(prompt.starts_with(&name));
    }

    #[test]
    fn test_sanitize_name_cuts_on_char_boundary() {
        // 2-byte chars never straddle the byte cap
        let name = sanitize_name(&"é".repeat(150));
        assert_eq!(name.len(), MAX_NAME_BYTES);
        assert_eq!(name.chars().count(), MAX_NAME_BYTES / 2);

        let name = sanitize_name(&format!("a{}", "é".repeat(150)));
        assert_eq!(name.len(), MAX_NAME_BYTES - 1);
    }

    #[test]
    fn test_sanitize_name() {
        assert_eq!(sanitize_name("chat/2024:test"), "chat_2024_test");
        assert_eq!(sanitize_name("  __my chat__ "), "my chat");
        assert_eq!(sanitize_name("report.v2-final"), "report.v2-final");
        assert_eq!(sanitize_name("notes.JSON"), "notes");
        assert_eq!(sanitize_name("<>|?*"), "");
        assert_eq!(sanitize_name(".."), "");
        assert_eq!(sanitize_name(""), "");
        assert_eq!(sanitize_name(&"x".repeat(300)).len(), MAX_NAME_CHARS);
    }

    #[test]
    fn test_unique_name() {
        let mut existing = HashSet::new();
        assert_eq!(unique_name("gatos", &existing), "gatos");

        existing.insert("gatos".to_string());
        assert_eq!(unique_name("gatos", &existing), "gatos_01");

        existing.insert("gatos_01".to_string());
        existing.insert("gatos_02".to_string());
        assert_eq!(unique_name("gatos", &existing), "gatos_03");
    }
}
