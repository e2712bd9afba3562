//! crates/solace_core/src/screening.rs
//!
//! Crisis screening for user messages. A `CrisisLexicon` holds a versioned
//! list of risk phrases; `detect` does a case-insensitive substring scan of
//! one message against it. Substring (not word-boundary) matching is
//! deliberate: false positives are acceptable here, missed signals are not.

use std::fs;
use std::io;
use std::path::Path;

/// The reply returned verbatim whenever screening flags a message. Sent in
/// place of a model completion; the gateway is never contacted on this path.
pub const CRISIS_SUPPORT_MESSAGE: &str = "I'm really concerned about what you're sharing, and I want you to know that I care about your safety. What you're feeling is serious, and you deserve real human support right now.

**Please reach out to crisis support:**
- 🆘 **National Suicide Prevention Lifeline**: 988 (US)
- 💬 **Crisis Text Line**: Text HOME to 741741
- 🌍 **International Association for Suicide Prevention**: https://www.iasp.info/resources/Crisis_Centres/
- 🇬🇧 **Samaritans (UK)**: 116 123

You don't have to face this alone. These trained counselors are available 24/7 and can provide the support you need right now.

Is there someone you trust-a friend, family member, or counselor-you could reach out to? I'm here to listen, but please also consider connecting with professional help. 💚";

/// Version tag of the built-in phrase list. Bump when the list below changes.
const BUILTIN_VERSION: &str = "builtin-2025.1";

/// The built-in risk phrases. All lowercase; `detect` lowercases the message
/// before scanning. Any replacement list must keep matching everything this
/// one matches.
const BUILTIN_PHRASES: [&str; 18] = [
    "suicide",
    "suicidal",
    "kill myself",
    "end my life",
    "want to die",
    "self-harm",
    "hurt myself",
    "cutting",
    "overdose",
    "no reason to live",
    "better off dead",
    "can't go on",
    "give up",
    "end it all",
    "goodbye forever",
    "don't want to be here",
    "wish i was dead",
    "planning to die",
];

/// A versioned set of risk phrases, loaded once at startup and shared
/// read-only across requests. The version shows up in startup logs so an
/// operator can tell which list a running instance screens with.
#[derive(Debug, Clone)]
pub struct CrisisLexicon {
    pub version: String,
    pub phrases: Vec<String>,
}

impl CrisisLexicon {
    /// The built-in lexicon.
    pub fn builtin() -> Self {
        Self {
            version: BUILTIN_VERSION.to_string(),
            phrases: BUILTIN_PHRASES.iter().map(|p| p.to_string()).collect(),
        }
    }

    /// Loads a lexicon from a plain-text file: one phrase per line, `#`
    /// starts a comment, blank lines are skipped, phrases are lowercased.
    /// The version is derived from the file name. A file that yields zero
    /// phrases is refused rather than silently disabling screening.
    pub fn from_file(path: &Path) -> io::Result<Self> {
        let contents = fs::read_to_string(path)?;
        let version = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("custom")
            .to_string();
        Self::from_contents(version, &contents)
    }

    fn from_contents(version: String, contents: &str) -> io::Result<Self> {
        let phrases: Vec<String> = contents
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(str::to_lowercase)
            .collect();
        if phrases.is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("crisis lexicon '{version}' contains no phrases"),
            ));
        }
        Ok(Self { version, phrases })
    }

    /// Scans one message for risk phrases. Case-insensitive substring match;
    /// first hit wins; an empty message never matches.
    pub fn detect(&self, message: &str) -> bool {
        if message.is_empty() {
            return false;
        }
        let lowered = message.to_lowercase();
        self.phrases.iter().any(|phrase| lowered.contains(phrase.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_builtin_phrase_is_detected() {
        let lexicon = CrisisLexicon::builtin();
        for phrase in BUILTIN_PHRASES {
            let message = format!("lately I keep thinking {phrase} and I can't stop");
            assert!(lexicon.detect(&message), "missed phrase: {phrase}");
        }
    }

    #[test]
    fn detection_ignores_case() {
        let lexicon = CrisisLexicon::builtin();
        assert!(lexicon.detect("I WANT TO DIE"));
        assert!(lexicon.detect("Sometimes I Wish I Was Dead."));
    }

    #[test]
    fn negated_phrasing_still_matches() {
        // Recall over precision: "I don't want to die" contains "want to die".
        let lexicon = CrisisLexicon::builtin();
        assert!(lexicon.detect("I don't want to die, I just want the pain to stop"));
    }

    #[test]
    fn substring_matching_is_intentional() {
        let lexicon = CrisisLexicon::builtin();
        assert!(lexicon.detect("I spent the weekend woodcutting with my dad"));
    }

    #[test]
    fn ordinary_messages_are_not_flagged() {
        let lexicon = CrisisLexicon::builtin();
        assert!(!lexicon.detect("I feel anxious about work"));
        assert!(!lexicon.detect("today was actually a pretty good day"));
        assert!(!lexicon.detect(""));
    }

    #[test]
    fn file_contents_are_parsed_line_by_line() {
        let contents = "# custom additions\nFeeling Hopeless\n\n  alone forever  \n";
        let lexicon = CrisisLexicon::from_contents("custom-test".to_string(), contents)
            .expect("two usable phrases");
        assert_eq!(lexicon.phrases, vec!["feeling hopeless", "alone forever"]);
        assert!(lexicon.detect("I've been feeling hopeless all week"));
        assert!(!lexicon.detect("I feel fine"));
    }

    #[test]
    fn an_empty_lexicon_is_refused() {
        let err = CrisisLexicon::from_contents("empty".to_string(), "# only comments\n\n")
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn crisis_reply_names_the_hotlines() {
        assert!(CRISIS_SUPPORT_MESSAGE.contains("988"));
        assert!(CRISIS_SUPPORT_MESSAGE.contains("741741"));
        assert!(CRISIS_SUPPORT_MESSAGE.contains("116 123"));
    }
}
