//! Script detection for language-preserving rewrites.

use unicode_segmentation::UnicodeSegmentation;

/// Writing system of a piece of text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Script {
    /// At least one word contains Arabic letters.
    Arabic,
    /// Every letter is unaccented ASCII.
    Latin,
    Other,
}

// Function words that mark an ASCII question as English.
const ENGLISH_MARKERS: &[&str] = &[
    "a", "an", "the", "of", "in", "on", "for", "to", "and", "or", "with", "is", "are", "was",
    "do", "does", "can", "should", "how", "what", "which", "when", "where", "why", "who", "my",
    "i", "it", "this", "that", "best", "much", "many",
];

/// Detect the writing system of `text`.
///
/// A single Arabic word is enough to classify the text as Arabic.
pub fn detect_script(text: &str) -> Script {
    let mut letters = false;
    let mut ascii_only = true;

    for word in text.unicode_words() {
        if word.chars().any(is_arabic) {
            return Script::Arabic;
        }
        for c in word.chars().filter(|c| c.is_alphabetic()) {
            letters = true;
            if !c.is_ascii_alphabetic() {
                ascii_only = false;
            }
        }
    }

    if letters && ascii_only {
        Script::Latin
    } else {
        Script::Other
    }
}

/// Whether `text` reads as English: ASCII letters only, with at least one
/// common English function word.
pub fn is_english(text: &str) -> bool {
    detect_script(text) == Script::Latin
        && text
            .unicode_words()
            .any(|w| ENGLISH_MARKERS.contains(&w.to_lowercase().as_str()))
}

/// Instruction telling the rewriter which language to write in.
///
/// The default language is only imposed on English questions; anything else
/// keeps the language it was asked in.
pub fn language_instruction(original_question: &str, default_language: &str) -> String {
    match detect_script(original_question) {
        Script::Arabic => {
            "The question contains Arabic words, so write the new question in Arabic.".to_string()
        }
        _ if is_english(original_question) => {
            format!("Write the new question in {}.", default_language)
        }
        _ => "Write the new question in the same language as the question.".to_string(),
    }
}

fn is_arabic(c: char) -> bool {
    matches!(
        c,
        '\u{0600}'..='\u{06FF}'
            | '\u{0750}'..='\u{077F}'
            | '\u{08A0}'..='\u{08FF}'
            | '\u{FB50}'..='\u{FDFF}'
            | '\u{FE70}'..='\u{FEFF}'
    )
}
