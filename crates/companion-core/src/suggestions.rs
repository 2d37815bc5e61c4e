//! Follow-up suggestion chips derived from bot replies.

/// Maximum number of chips attached to one reply
pub const MAX_SUGGESTIONS: usize = 3;

/// Chips used when no rule matches
pub const DEFAULT_SUGGESTIONS: [&str; 3] = ["Tell me more", "How can you help me?", "Mental health tips"];

/// Keywords that trigger a rule, and the phrases it contributes
pub struct SuggestionRule {
    pub keywords: &'static [&'static str],
    pub suggestions: &'static [&'static str],
}

impl SuggestionRule {
    /// Case-sensitive substring match against any keyword
    pub fn matches(&self, text: &str) -> bool {
        self.keywords.iter().any(|k| text.contains(k))
    }
}

/// Evaluated top to bottom; earlier rules win when the cap is reached
pub const RULES: &[SuggestionRule] = &[
    SuggestionRule {
        keywords: &["anxiety", "stress"],
        suggestions: &["How can I manage anxiety?", "Breathing exercises"],
    },
    SuggestionRule {
        keywords: &["feeling", "mood"],
        suggestions: &["Why do I feel this way?", "How to improve mood"],
    },
    SuggestionRule {
        keywords: &["sleep"],
        suggestions: &["Sleep meditation", "Insomnia tips"],
    },
];

/// Suggestions for a reply, using the built-in rule table
pub fn suggestions_for(text: &str) -> Vec<String> {
    suggestions_with(RULES, text)
}

pub fn suggestions_with(rules: &[SuggestionRule], text: &str) -> Vec<String> {
    let mut picked: Vec<String> = rules
        .iter()
        .filter(|rule| rule.matches(text))
        .flat_map(|rule| rule.suggestions.iter())
        .take(MAX_SUGGESTIONS)
        .map(|s| s.to_string())
        .collect();

    if picked.is_empty() {
        picked = DEFAULT_SUGGESTIONS.iter().map(|s| s.to_string()).collect();
    }

    picked
}
