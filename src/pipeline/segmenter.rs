//! Sentence segmentation of a streamed reply.
//!
//! [`SentenceSegmenter`] accumulates arbitrarily-chunked text deltas and
//! emits a unit every time one of the sentence punctuation marks
//! (`。`, `、`, `！`, `？`, newline) is seen.  The mark stays attached to the
//! unit.  Whatever follows the last mark is held back until the next call or
//! until [`flush`](SentenceSegmenter::flush) at the end of the turn.
//!
//! # Example
//!
//! ```rust
//! use ec_voice_bot::pipeline::SentenceSegmenter;
//!
//! let mut seg = SentenceSegmenter::new();
//! assert!(seg.add("こんにちは").is_empty());
//! assert_eq!(seg.add("。今日は"), vec!["こんにちは。".to_string()]);
//! assert_eq!(seg.flush().as_deref(), Some("今日は"));
//! ```
//!
//! # Unbounded buffer
//!
//! Text without any punctuation grows the pending buffer without limit.
//! [`with_max_pending`](SentenceSegmenter::with_max_pending) opts into a
//! forced cut after a fixed number of characters.

/// Characters that terminate a sentence unit.
pub const SENTENCE_PUNCTUATION: [char; 5] = ['。', '、', '！', '？', '\n'];

/// Stateful filter turning text deltas into sentence units.
#[derive(Debug, Default, Clone)]
pub struct SentenceSegmenter {
    pending: String,
    max_pending: Option<usize>,
}

impl SentenceSegmenter {
    /// Segmenter with an unbounded pending buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Segmenter that forces a cut once `max_chars` characters are pending
    /// without punctuation.  `0` is treated as unbounded.
    pub fn with_max_pending(max_chars: usize) -> Self {
        Self {
            pending: String::new(),
            max_pending: (max_chars > 0).then_some(max_chars),
        }
    }

    /// Feed one delta and return the sentence units it completed, in order.
    ///
    /// Whitespace-only units are dropped; every returned unit is trimmed.
    pub fn add(&mut self, fragment: &str) -> Vec<String> {
        self.pending.push_str(fragment);

        let mut units = Vec::new();
        let mut last_cut = 0;
        for (idx, ch) in self.pending.char_indices() {
            if is_sentence_end(ch) {
                let end = idx + ch.len_utf8();
                push_trimmed(&mut units, &self.pending[last_cut..end]);
                last_cut = end;
            }
        }
        self.pending.drain(..last_cut);

        if let Some(max) = self.max_pending {
            if self.pending.chars().count() >= max {
                log::debug!(
                    "segmenter: forcing a cut after {max} characters without punctuation"
                );
                let forced = std::mem::take(&mut self.pending);
                push_trimmed(&mut units, &forced);
            }
        }

        units
    }

    /// Return the trimmed residual text, if any, and clear the buffer.
    ///
    /// A second call in a row always returns `None`.
    pub fn flush(&mut self) -> Option<String> {
        let rest = std::mem::take(&mut self.pending);
        let trimmed = rest.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    }

    /// Text received but not yet emitted.
    pub fn pending(&self) -> &str {
        &self.pending
    }
}

/// Returns `true` for the characters that close a sentence unit.
pub fn is_sentence_end(ch: char) -> bool {
    SENTENCE_PUNCTUATION.contains(&ch)
}

fn push_trimmed(units: &mut Vec<String>, raw: &str) {
    let unit = raw.trim();
    if !unit.is_empty() {
        units.push(unit.to_string());
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn feed_all(seg: &mut SentenceSegmenter, fragments: &[&str]) -> Vec<String> {
        let mut out = Vec::new();
        for f in fragments {
            out.extend(seg.add(f));
        }
        out.extend(seg.flush());
        out
    }

    #[test]
    fn japanese_fragments_split_at_punctuation() {
        let mut seg = SentenceSegmenter::new();
        let units = feed_all(
            &mut seg,
            &["こんにちは", "。", "今日は", "いい天気", "ですね", "。"],
        );
        assert_eq!(units, vec!["こんにちは。", "今日はいい天気ですね。"]);
    }

    #[test]
    fn no_punctuation_yields_nothing_until_flush() {
        let mut seg = SentenceSegmenter::new();
        assert!(seg.add("おすすめの本は").is_empty());
        assert!(seg.add("こちらです").is_empty());
        assert_eq!(seg.pending(), "おすすめの本はこちらです");
        assert_eq!(seg.flush().as_deref(), Some("おすすめの本はこちらです"));
    }

    #[test]
    fn several_units_in_one_fragment_keep_order() {
        let mut seg = SentenceSegmenter::new();
        let units = seg.add("はい！そうですね？では、どうぞ。残り");
        assert_eq!(units, vec!["はい！", "そうですね？", "では、", "どうぞ。"]);
        assert_eq!(seg.pending(), "残り");
    }

    #[test]
    fn newline_terminates_and_is_trimmed() {
        let mut seg = SentenceSegmenter::new();
        let units = seg.add("一行目\n二行目\n");
        assert_eq!(units, vec!["一行目", "二行目"]);
    }

    #[test]
    fn whitespace_only_cuts_are_dropped() {
        let mut seg = SentenceSegmenter::new();
        let units = seg.add("  \n\n。");
        assert_eq!(units, vec!["。"]);
        assert!(seg.add(" \n ").is_empty());
        assert_eq!(seg.flush(), None);
    }

    #[test]
    fn flush_twice_returns_unit_then_none() {
        let mut seg = SentenceSegmenter::new();
        seg.add("最後の文");
        assert_eq!(seg.flush().as_deref(), Some("最後の文"));
        assert_eq!(seg.flush(), None);
    }

    #[test]
    fn concatenation_preserves_every_character() {
        let fragments = [
            "[走れメロス](/books/1)は",
            "名作です。",
            "ほかに",
            "も、[こころ](/books/2",
            ")も",
            "おすすめ！",
            "いかがですか？最後",
        ];
        let mut seg = SentenceSegmenter::new();
        let units = feed_all(&mut seg, &fragments);
        assert_eq!(units.concat(), fragments.concat());
    }

    #[test]
    fn residue_plus_units_equals_input_mid_stream() {
        let mut seg = SentenceSegmenter::new();
        let mut emitted = seg.add("ひとつめ。ふた");
        emitted.extend(seg.add("つめ、みっ"));
        assert_eq!(emitted.concat() + seg.pending(), "ひとつめ。ふたつめ、みっ");
    }

    #[test]
    fn max_pending_forces_a_cut() {
        let mut seg = SentenceSegmenter::with_max_pending(5);
        assert!(seg.add("あいう").is_empty());
        assert_eq!(seg.add("えおか"), vec!["あいうえおか"]);
        assert_eq!(seg.pending(), "");
        assert_eq!(seg.add("き。"), vec!["き。"]);
    }

    #[test]
    fn zero_max_pending_means_unbounded() {
        let mut seg = SentenceSegmenter::with_max_pending(0);
        assert!(seg.add(&"あ".repeat(1_000)).is_empty());
        assert_eq!(seg.pending().chars().count(), 1_000);
    }

    #[test]
    fn punctuation_set_membership() {
        for ch in SENTENCE_PUNCTUATION {
            assert!(is_sentence_end(ch));
        }
        assert!(!is_sentence_end('.'));
        assert!(!is_sentence_end('a'));
    }
}
