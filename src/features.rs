//! Text featurization for the spam classifier.
//!
//! [`prepare`] turns raw SMS text into the fixed-width numeric vector the
//! classifier was trained on. It is deterministic and pure: the same text
//! always yields the same vector, and nothing here touches shared state.

use once_cell::sync::Lazy;
use regex::Regex;
use smallvec::SmallVec;

/// Number of features produced by [`prepare`].
pub const FEATURE_DIM: usize = 7;

// === Feature Slots ===

/// Character count of the raw text.
pub const FEAT_CHAR_COUNT: usize = 0;
/// Word-token count.
pub const FEAT_TOKEN_COUNT: usize = 1;
/// ASCII digit count.
pub const FEAT_DIGIT_COUNT: usize = 2;
/// Uppercase letters as a fraction of all letters.
pub const FEAT_UPPERCASE_RATIO: usize = 3;
/// Exclamation mark count.
pub const FEAT_EXCLAMATION_COUNT: usize = 4;
/// Currency symbol count ($, £, €).
pub const FEAT_CURRENCY_COUNT: usize = 5;
/// Number of tokens matching the spam marker list.
pub const FEAT_SPAM_MARKERS: usize = 6;

/// Fixed-width feature vector, stack-allocated for the common case.
pub type FeatureVector = SmallVec<[f32; FEATURE_DIM]>;

static TOKEN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[a-z0-9']+").expect("token regex is valid"));

/// Tokens strongly associated with spam in the training corpus.
const SPAM_MARKERS: &[&str] = &[
    "free",
    "win",
    "winner",
    "won",
    "prize",
    "claim",
    "urgent",
    "cash",
    "txt",
    "reply",
    "stop",
    "guaranteed",
    "offer",
];

/// Extract the feature vector for one SMS text.
pub fn prepare(text: &str) -> FeatureVector {
    let lowered = text.to_lowercase();

    let char_count = text.chars().count();
    let digit_count = text.chars().filter(char::is_ascii_digit).count();
    let exclamation_count = text.chars().filter(|&c| c == '!').count();
    let currency_count = text
        .chars()
        .filter(|&c| matches!(c, '$' | '£' | '€'))
        .count();

    let letter_count = text.chars().filter(|c| c.is_alphabetic()).count();
    let uppercase_count = text.chars().filter(|c| c.is_uppercase()).count();
    let uppercase_ratio = if letter_count > 0 {
        uppercase_count as f32 / letter_count as f32
    } else {
        0.0
    };

    let mut token_count = 0usize;
    let mut marker_hits = 0usize;
    for token in TOKEN_RE.find_iter(&lowered) {
        token_count += 1;
        if SPAM_MARKERS.contains(&token.as_str()) {
            marker_hits += 1;
        }
    }

    let mut features = FeatureVector::from_elem(0.0, FEATURE_DIM);
    features[FEAT_CHAR_COUNT] = char_count as f32;
    features[FEAT_TOKEN_COUNT] = token_count as f32;
    features[FEAT_DIGIT_COUNT] = digit_count as f32;
    features[FEAT_UPPERCASE_RATIO] = uppercase_ratio;
    features[FEAT_EXCLAMATION_COUNT] = exclamation_count as f32;
    features[FEAT_CURRENCY_COUNT] = currency_count as f32;
    features[FEAT_SPAM_MARKERS] = marker_hits as f32;
    features
}
