use std::fmt;

// Keywords that mark a link as possibly dangerous. Matched as raw,
// case-sensitive substrings of the whole payload.
pub const FLAGGED_TOKENS: [&str; 3] = ["phishing", "virus", "t.me"];

pub const URL_PREFIXES: [&str; 2] = ["http://", "https://"];

pub const DANGER_LABEL: &str = "⚠️ ВОЗМОЖНО ОПАСНАЯ ССЫЛКА";
pub const SAFE_LABEL: &str = "✅ ССЫЛКА БЕЗОПАСНА";
pub const FOUND_PREFIX: &str = "Найдено: ";

// Classification bucket, drives the banner color
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub enum VerdictKind {
    Neutral, // Payload is not a link
    Danger,  // Link containing a flagged token
    Safe,    // Link without flagged tokens
}

impl VerdictKind {
    /// Banner color as plain RGB, independent of the UI toolkit.
    pub fn rgb(&self) -> [u8; 3] {
        match self {
            VerdictKind::Neutral => [0x88, 0x88, 0x88],
            VerdictKind::Danger => [0xFF, 0x00, 0x00],
            VerdictKind::Safe => [0x4C, 0xAF, 0x50],
        }
    }
}

// Short tag used in headless output and logs
impl fmt::Display for VerdictKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            VerdictKind::Neutral => write!(f, "TEXT"),
            VerdictKind::Danger => write!(f, "DANGER"),
            VerdictKind::Safe => write!(f, "SAFE"),
        }
    }
}

/// The (color, label) pair shown to the user for the latest payload.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Verdict {
    pub kind: VerdictKind,
    pub label: String,
}

pub fn is_url(payload: &str) -> bool {
    URL_PREFIXES.iter().any(|prefix| payload.starts_with(prefix))
}

/// Returns the first flagged token found in `payload`, if any.
pub fn flagged_token(payload: &str) -> Option<&'static str> {
    FLAGGED_TOKENS
        .iter()
        .copied()
        .find(|token| payload.contains(token))
}

/// Maps a decoded payload to its verdict.
///
/// Non-links are echoed back as "found" text. Links are dangerous when any
/// flagged token appears anywhere in them, safe otherwise. Total over any input.
pub fn classify(payload: &str) -> Verdict {
    if !is_url(payload) {
        return Verdict {
            kind: VerdictKind::Neutral,
            label: format!("{}{}", FOUND_PREFIX, payload),
        };
    }

    match flagged_token(payload) {
        Some(token) => {
            log::debug!("Payload matched flagged token '{}'", token);
            Verdict {
                kind: VerdictKind::Danger,
                label: DANGER_LABEL.to_string(),
            }
        }
        None => Verdict {
            kind: VerdictKind::Safe,
            label: SAFE_LABEL.to_string(),
        },
    }
}
