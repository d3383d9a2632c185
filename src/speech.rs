//! The sink narration phrases are pushed into.

/// Marker separating phrases in the buffered narration; replaced with the
/// backend's silence directive before playback.
pub const PAUSE: &str = "{pause}";

/// Append-only buffer of spoken phrases.
///
/// Each pushed phrase is followed by a pause marker and a newline, so the
/// buffered text doubles as a readable transcript.
#[derive(Debug, Default)]
pub struct SpeechBuffer {
    buf: String,
}

impl SpeechBuffer {
    pub fn new() -> Self {
        SpeechBuffer::default()
    }

    /// Appends one phrase. Empty phrases are dropped so callers can push
    /// conditionally-built text without guarding.
    pub fn push(&mut self, phrase: &str) {
        if phrase.is_empty() {
            return;
        }
        self.buf.push_str(phrase);
        self.buf.push_str(PAUSE);
        self.buf.push('\n');
    }

    /// The narration produced so far, pause markers included.
    pub fn text(&self) -> &str {
        &self.buf
    }

    /// The narration with every pause marker replaced by `silence`.
    pub fn materialize(&self, silence: &str) -> String {
        self.buf.replace(PAUSE, silence)
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn clear(&mut self) {
        self.buf.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phrases_are_separated_by_pause_markers() {
        let mut b = SpeechBuffer::new();
        b.push("package main");
        b.push("imports");
        assert_eq!(b.text(), "package main{pause}\nimports{pause}\n");
    }

    #[test]
    fn empty_phrases_are_dropped() {
        let mut b = SpeechBuffer::new();
        b.push("");
        assert!(b.is_empty());
    }

    #[test]
    fn materialize_substitutes_silence() {
        let mut b = SpeechBuffer::new();
        b.push("hello");
        assert_eq!(b.materialize("[[slnc 200]]"), "hello[[slnc 200]]\n");
    }
}
