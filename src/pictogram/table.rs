use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

/// Errors building a [`PictogramTable`].
#[derive(Debug, thiserror::Error)]
pub enum TableError {
    #[error("pictogram sequence for glyph {glyph:?} is empty")]
    EmptySequence { glyph: String },
    #[error("failed to compile pictogram matcher: {0}")]
    Pattern(#[from] regex::Error),
}

/// Emoji sequences and emoticons recognised out of the box.
///
/// The left side is what the user types (and what the pictogram reverts
/// to); the right side is the glyph drawn in its place.
const BUILTIN: &[(&str, &str)] = &[
    // Emoticons
    (":)", "🙂"),
    (":-)", "🙂"),
    (":(", "🙁"),
    (":-(", "🙁"),
    (":D", "😄"),
    (":-D", "😄"),
    (";)", "😉"),
    (";-)", "😉"),
    (":P", "😛"),
    (":-P", "😛"),
    (":'(", "😢"),
    (":O", "😮"),
    ("<3", "❤️"),
    ("</3", "💔"),
    // Faces
    ("😀", "😀"),
    ("😃", "😃"),
    ("😄", "😄"),
    ("😁", "😁"),
    ("😂", "😂"),
    ("🤣", "🤣"),
    ("🙂", "🙂"),
    ("😉", "😉"),
    ("😊", "😊"),
    ("😍", "😍"),
    ("😘", "😘"),
    ("😎", "😎"),
    ("🤔", "🤔"),
    ("😢", "😢"),
    ("😭", "😭"),
    ("😡", "😡"),
    ("😮", "😮"),
    // Hands, with skin-tone modifier sequences
    ("👍", "👍"),
    ("👍🏻", "👍🏻"),
    ("👍🏼", "👍🏼"),
    ("👍🏽", "👍🏽"),
    ("👍🏾", "👍🏾"),
    ("👍🏿", "👍🏿"),
    ("👎", "👎"),
    ("👏", "👏"),
    ("👋", "👋"),
    ("🙏", "🙏"),
    // Symbols; the bare heart also matches without its variation selector
    ("❤️", "❤️"),
    ("❤", "❤️"),
    ("💔", "💔"),
    ("🔥", "🔥"),
    ("🎉", "🎉"),
    ("✅", "✅"),
    ("❌", "❌"),
    ("⭐", "⭐"),
    // ZWJ sequences
    ("👨‍💻", "👨‍💻"),
    ("👩‍💻", "👩‍💻"),
    ("🏳️‍🌈", "🏳️‍🌈"),
];

static BUILTIN_TABLE: LazyLock<PictogramTable> = LazyLock::new(|| {
    PictogramTable::from_pairs(BUILTIN.iter().copied())
        .unwrap_or_else(|_| PictogramTable::empty())
});

/// A fixed set of character sequences that turn into pictograms.
///
/// Matching is greedy and leftmost-first: at the earliest position where
/// any sequence matches, the longest sequence wins.
#[derive(Debug, Clone)]
pub struct PictogramTable {
    glyphs: HashMap<String, String>,
    matcher: Option<Regex>,
}

/// One match inside a string, in character offsets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PictogramMatch {
    pub start: usize,
    pub end: usize,
    pub label: String,
    pub glyph: String,
}

impl PictogramTable {
    /// The built-in emoji and emoticon table.
    pub fn builtin() -> Self {
        BUILTIN_TABLE.clone()
    }

    /// A table that matches nothing.
    pub fn empty() -> Self {
        Self {
            glyphs: HashMap::new(),
            matcher: None,
        }
    }

    /// Build a table from `(sequence, glyph)` pairs. Later duplicates win.
    ///
    /// # Errors
    /// Returns an error for an empty sequence or if the matcher fails to compile.
    pub fn from_pairs<S, G>(pairs: impl IntoIterator<Item = (S, G)>) -> Result<Self, TableError>
    where
        S: Into<String>,
        G: Into<String>,
    {
        let mut glyphs = HashMap::new();
        for (sequence, glyph) in pairs {
            let sequence = sequence.into();
            let glyph = glyph.into();
            if sequence.is_empty() {
                return Err(TableError::EmptySequence { glyph });
            }
            glyphs.insert(sequence, glyph);
        }
        if glyphs.is_empty() {
            return Ok(Self::empty());
        }

        let mut sequences: Vec<&String> = glyphs.keys().collect();
        // Longest first so the alternation prefers the longest sequence at a position.
        sequences.sort_by(|a, b| b.chars().count().cmp(&a.chars().count()).then(a.cmp(b)));
        let pattern = sequences
            .iter()
            .map(|sequence| regex::escape(sequence))
            .collect::<Vec<_>>()
            .join("|");
        let matcher = Regex::new(&pattern)?;
        Ok(Self {
            glyphs,
            matcher: Some(matcher),
        })
    }

    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }

    /// Glyph for an exact sequence.
    pub fn glyph(&self, sequence: &str) -> Option<&str> {
        self.glyphs.get(sequence).map(String::as_str)
    }

    /// Non-overlapping matches in `text`, left to right.
    pub fn find_all(&self, text: &str) -> Vec<PictogramMatch> {
        let Some(matcher) = &self.matcher else {
            return Vec::new();
        };
        let mut out = Vec::new();
        let mut chars_seen = 0;
        let mut bytes_seen = 0;
        for found in matcher.find_iter(text) {
            chars_seen += text[bytes_seen..found.start()].chars().count();
            let len = found.as_str().chars().count();
            if let Some(glyph) = self.glyphs.get(found.as_str()) {
                out.push(PictogramMatch {
                    start: chars_seen,
                    end: chars_seen + len,
                    label: found.as_str().to_string(),
                    glyph: glyph.clone(),
                });
            }
            chars_seen += len;
            bytes_seen = found.end();
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_table_is_populated() {
        let table = PictogramTable::builtin();
        assert!(!table.is_empty());
        assert_eq!(table.glyph(":)"), Some("🙂"));
    }

    #[test]
    fn test_longest_sequence_wins_at_same_position() {
        let table = PictogramTable::builtin();
        let found = table.find_all("ok 👍🏽!");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].label, "👍🏽");
        assert_eq!((found[0].start, found[0].end), (3, 5));
    }

    #[test]
    fn test_leftmost_match_is_taken_first() {
        let table = PictogramTable::from_pairs([("ab", "X"), ("bc", "Y")]).unwrap();
        let found = table.find_all("abc");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].glyph, "X");
    }

    #[test]
    fn test_char_offsets_account_for_multibyte_text() {
        let table = PictogramTable::builtin();
        let found = table.find_all("é :) é <3");
        let spans: Vec<_> = found.iter().map(|m| (m.start, m.end)).collect();
        assert_eq!(spans, vec![(2, 4), (7, 9)]);
    }

    #[test]
    fn test_empty_sequence_is_rejected() {
        let err = PictogramTable::from_pairs([("", "X")]).unwrap_err();
        assert!(matches!(err, TableError::EmptySequence { .. }));
    }

    #[test]
    fn test_empty_table_matches_nothing() {
        let table = PictogramTable::empty();
        assert!(table.find_all(":) <3").is_empty());
    }

    #[test]
    fn test_regex_metacharacters_are_literal() {
        let table = PictogramTable::from_pairs([("(y)", "👍"), (".*", "✨")]).unwrap();
        let found = table.find_all("a (y) b");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].label, "(y)");
    }
}
