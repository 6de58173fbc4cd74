//! Emoji shortcodes (`:tada:`) and text smileys (`:)`).

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::borrow::Cow;

static SHORTCODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r":([a-z0-9_+\-]+):").expect("Invalid SHORTCODE regex pattern"));

// Only matched as whole whitespace-separated words.
const SMILEYS: &[(&str, &str)] = &[
    (":)", "😃"),
    (":-)", "😃"),
    (";)", "😉"),
    (";-)", "😉"),
    (":(", "😞"),
    (":-(", "😞"),
    (":D", "😄"),
    (":-D", "😄"),
    (":P", "😛"),
    (":p", "😛"),
    (":o", "😮"),
    (":O", "😮"),
    (":|", "😐"),
    (":/", "😕"),
    (":'(", "😢"),
    ("<3", "❤️"),
];

/// Look up the emoji of a GitHub shortcode name, without the colons.
pub fn shortcode(name: &str) -> Option<&'static str> {
    emojis::get_by_shortcode(name).map(emojis::Emoji::as_str)
}

fn smiley(word: &str) -> Option<&'static str> {
    SMILEYS
        .iter()
        .find_map(|(smiley, emoji)| (*smiley == word).then_some(*emoji))
}

/// Replace known shortcodes and smileys in `text`.
///
/// Unknown shortcodes are left as written.
pub fn replace(text: &str) -> Cow<'_, str> {
    let text = SHORTCODE.replace_all(text, |caps: &Captures| {
        shortcode(&caps[1])
            .map(str::to_string)
            .unwrap_or_else(|| caps[0].to_string())
    });

    if !text.split_whitespace().any(|word| smiley(word).is_some()) {
        return text;
    }

    let mut replaced = String::with_capacity(text.len());
    let mut word_start = None;
    for (idx, c) in text.char_indices() {
        if c.is_whitespace() {
            if let Some(start) = word_start.take() {
                push_word(&mut replaced, &text[start..idx]);
            }
            replaced.push(c);
        } else if word_start.is_none() {
            word_start = Some(idx);
        }
    }
    if let Some(start) = word_start {
        push_word(&mut replaced, &text[start..]);
    }

    Cow::Owned(replaced)
}

fn push_word(out: &mut String, word: &str) {
    out.push_str(smiley(word).unwrap_or(word));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shortcodes() {
        assert_eq!(replace("Ship it :rocket:"), "Ship it 🚀");
        assert_eq!(replace(":+1: and :-1:"), "👍 and 👎");
        assert_eq!(replace(":smile_cat: :100:"), "😸 💯");
    }

    #[test]
    fn test_shortcode_lookup() {
        assert_eq!(shortcode("tada"), Some("🎉"));
        assert_eq!(shortcode("white_check_mark"), Some("✅"));
        assert_eq!(shortcode("30"), None);
    }

    #[test]
    fn test_unknown_shortcode_is_kept() {
        assert_eq!(replace("time is 10:30:00"), "time is 10:30:00");
        assert_eq!(replace(":not_an_emoji:"), ":not_an_emoji:");
    }

    #[test]
    fn test_smileys_are_whole_words() {
        assert_eq!(replace("nice :) right"), "nice 😃 right");
        assert_eq!(replace("<3"), "❤️");
        assert_eq!(replace("see https://example.com"), "see https://example.com");
        assert_eq!(replace("f(:))"), "f(:))");
    }

    #[test]
    fn test_whitespace_is_preserved() {
        assert_eq!(replace("  :)\tok "), "  😃\tok ");
    }

    #[test]
    fn test_no_match_borrows() {
        assert!(matches!(replace("plain text"), Cow::Borrowed(_)));
    }
}
