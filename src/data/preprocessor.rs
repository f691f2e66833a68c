// ============================================================
// Layer 4 — Text Preprocessor
// ============================================================
// Normalises raw text before it is split into tokens.
//
// Dataset exports and form input often contain:
//   - Non-breaking spaces (U+00A0)
//   - Zero-width spaces (U+200B) and byte order marks
//   - Tabs, carriage returns and newlines
//   - Stray control characters
//
// All of these become a plain space so they act as token
// delimiters instead of being glued into a word and hashed.
//
// Lower-casing is optional. It changes which words collide in
// the hash space, so the same setting must be used for training
// and inference. It lives in EncoderConfig.
//
// Reference: Rust Book §8 (Strings in Rust)

#[derive(Debug, Clone, Copy)]
pub struct Preprocessor {
    lowercase: bool,
}

impl Preprocessor {
    pub fn new(lowercase: bool) -> Self {
        Self { lowercase }
    }

    /// Normalise one text. Never fails; empty in, empty out.
    pub fn clean(&self, text: &str) -> String {
        let cleaned: String = text
            .chars()
            .map(|c| match c {
                '\t' | '\r' | '\n' => ' ',
                '\u{00A0}' | '\u{200B}' | '\u{FEFF}' => ' ',
                c if c.is_control() => ' ',
                c => c,
            })
            .collect();

        if self.lowercase {
            cleaned.to_lowercase()
        } else {
            cleaned
        }
    }

    /// Clean, then split on whitespace. Runs of whitespace never
    /// produce empty tokens.
    pub fn tokens(&self, text: &str) -> Vec<String> {
        self.clean(text)
            .split_whitespace()
            .map(str::to_string)
            .collect()
    }
}

impl Default for Preprocessor {
    fn default() -> Self {
        Self::new(true)
    }
}
