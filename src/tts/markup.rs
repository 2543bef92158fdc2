//! Markdown link stripping for speech.
//!
//! Replies recommend books as `[title](/books/<id>)`.  The display keeps the
//! link; the synthesizer only gets `title`.

use std::sync::LazyLock;

use regex::Regex;

/// `[label](target)`; the label may hold one level of nested `[...]`.
static MARKDOWN_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[((?:[^\[\]]|\[[^\]]*\])+)\]\(([^)]+)\)").expect("link pattern compiles")
});

/// Replace every `[label](target)` with `label`.
///
/// Anything that does not form a complete link is copied through unchanged.
///
/// ```rust
/// use ec_voice_bot::tts::strip_markdown_links;
///
/// assert_eq!(
///     strip_markdown_links("こちらの[走れメロス](/books/1)はいかがでしょうか？"),
///     "こちらの走れメロスはいかがでしょうか？",
/// );
/// ```
pub fn strip_markdown_links(text: &str) -> String {
    MARKDOWN_LINK.replace_all(text, "$1").into_owned()
}
