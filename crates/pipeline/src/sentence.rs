//! Sentence buffering for speech output
//!
//! Accumulates streamed text deltas and hands out complete sentences.
//! Speech synthesis must never receive a partial word, so text only
//! leaves the buffer at a terminal-punctuation boundary or an explicit
//! flush.

const TERMINATORS: [char; 3] = ['.', '!', '?'];
const CLOSERS: [char; 6] = ['"', '\'', ')', ']', '\u{201d}', '\u{2019}'];

/// Streaming sentence-boundary buffer
#[derive(Debug, Clone, Default)]
pub struct SentenceBuffer {
    buffer: String,
}

impl SentenceBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a delta and extract any sentences it completed.
    pub fn push(&mut self, text: &str) -> Vec<String> {
        self.buffer.push_str(text);
        self.extract()
    }

    /// Scan the buffer for complete sentences.
    ///
    /// A terminator ends a sentence after absorbing closing quotes or
    /// brackets and one trailing whitespace. A period flanked by digits
    /// is a decimal point, not a boundary; a digit-period at the very end
    /// of the buffer waits for the next delta to decide.
    fn extract(&mut self) -> Vec<String> {
        let chars: Vec<char> = self.buffer.chars().collect();
        let mut sentences = Vec::new();
        let mut current = String::new();
        let mut consumed = 0;
        let mut i = 0;

        while i < chars.len() {
            let c = chars[i];
            current.push(c);

            if !TERMINATORS.contains(&c) {
                i += 1;
                continue;
            }

            if c == '.' {
                let prev_is_digit = i > 0 && chars[i - 1].is_ascii_digit();
                match (prev_is_digit, chars.get(i + 1)) {
                    (true, Some(next)) if next.is_ascii_digit() => {
                        i += 1;
                        continue;
                    }
                    (true, None) => break,
                    _ => {}
                }
            }

            // Absorb closing quotes/brackets, then one whitespace.
            let mut end = i + 1;
            while end < chars.len() {
                let next = chars[end];
                if CLOSERS.contains(&next) {
                    current.push(next);
                    end += 1;
                } else if next.is_whitespace() {
                    current.push(next);
                    end += 1;
                    break;
                } else {
                    break;
                }
            }
            i = end;

            let sentence = current.trim().to_string();
            if !sentence.is_empty() {
                sentences.push(sentence);
            }
            current.clear();
            consumed = i;
        }

        self.buffer = chars[consumed..].iter().collect();
        sentences
    }

    /// Flush the remaining fragment, if any. Used on stream completion.
    pub fn flush(&mut self) -> Option<String> {
        let text = self.buffer.trim().to_string();
        self.buffer.clear();
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }

    /// Drop any buffered fragment. Used on cancellation so no partial
    /// sentence is ever spoken.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    /// Check if the buffer holds unflushed text
    pub fn is_empty(&self) -> bool {
        self.buffer.trim().is_empty()
    }
}
