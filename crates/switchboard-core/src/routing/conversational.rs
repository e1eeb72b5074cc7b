//! Small-talk detection.
//!
//! Greetings, thanks and content-free messages are answered directly with a
//! canned reply instead of invoking a tool.

const GREETINGS: &[&str] = &[
    "hi",
    "hello",
    "hey",
    "hiya",
    "howdy",
    "yo",
    "greetings",
    "good morning",
    "good afternoon",
    "good evening",
    "hello there",
    "hey there",
    "what's up",
    "whats up",
];

const GRATITUDE: &[&str] = &[
    "thanks",
    "thank you",
    "thanks a lot",
    "thank you so much",
    "thanks so much",
    "many thanks",
    "thx",
    "ty",
    "cheers",
    "much appreciated",
    "appreciate it",
];

const VAGUE: &[&str] = &[
    "ok", "okay", "sure", "cool", "nice", "great", "alright", "fine", "hmm", "yes", "no", "yep",
    "nope", "help", "test",
];

/// Kind of small talk detected in a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmallTalk {
    Greeting,
    Gratitude,
    TooShort,
    Vague,
}

impl SmallTalk {
    pub fn reply(self) -> &'static str {
        match self {
            SmallTalk::Greeting => {
                "Hello! I can explain topics, write code, or search the web for current \
                 information. What would you like to do?"
            }
            SmallTalk::Gratitude => {
                "You're welcome! Let me know if there's anything else I can help with."
            }
            SmallTalk::TooShort | SmallTalk::Vague => {
                "Could you tell me a bit more about what you need? I can explain topics, \
                 write code, or look up current information."
            }
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SmallTalk::Greeting => "greeting",
            SmallTalk::Gratitude => "gratitude",
            SmallTalk::TooShort => "too short",
            SmallTalk::Vague => "vague",
        }
    }
}

/// Lower-case, trim, and drop trailing punctuation.
pub fn normalize(message: &str) -> String {
    message
        .trim()
        .to_lowercase()
        .trim_end_matches(['!', '?', '.', ','])
        .trim()
        .to_string()
}

/// Classify a message as small talk, or `None` if it needs a tool.
pub fn classify(message: &str) -> Option<SmallTalk> {
    let normalized = normalize(message);
    let text = normalized.as_str();
    if GREETINGS.contains(&text) {
        Some(SmallTalk::Greeting)
    } else if GRATITUDE.contains(&text) {
        Some(SmallTalk::Gratitude)
    } else if text.chars().count() <= 2 {
        Some(SmallTalk::TooShort)
    } else if VAGUE.contains(&text) {
        Some(SmallTalk::Vague)
    } else {
        None
    }
}
