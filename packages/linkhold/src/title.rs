//! Best-effort page title extraction.
//!
//! Scans at most [`TITLE_SCAN_LIMIT`] bytes of markup with html5ever's
//! streaming tokenizer (no DOM is built) and returns the content of the
//! first `<title>` element. Extraction never fails: a missing or
//! unparseable title must never block saving a link, so failure is
//! reported through the returned string instead of an error channel.

use html5ever::tendril::StrTendril;
use html5ever::tokenizer::states::RawKind;
use html5ever::tokenizer::{
    BufferQueue, TagKind, Token, TokenSink, TokenSinkResult, Tokenizer, TokenizerOpts,
};

/// Byte budget for the title scan. Bytes past this point are never parsed,
/// which caps parsing cost on untrusted remote content.
pub const TITLE_SCAN_LIMIT: usize = 8192;

/// Returned when a `<title>` start tag was found but no text followed it.
pub const PARSE_FAILED_TITLE: &str = "failed to parse title";

enum Outcome {
    Title(String),
    ParseFailed,
}

#[derive(Default)]
struct TitleSink {
    in_title: bool,
    saw_text: bool,
    buf: String,
    outcome: Option<Outcome>,
}

impl TitleSink {
    fn finish_title(&mut self) {
        self.in_title = false;
        self.outcome = Some(if self.saw_text {
            Outcome::Title(std::mem::take(&mut self.buf))
        } else {
            // A <title> with no following text token.
            Outcome::ParseFailed
        });
    }
}

impl TokenSink for TitleSink {
    type Handle = ();

    fn process_token(&mut self, token: Token, _line_number: u64) -> TokenSinkResult<()> {
        if self.outcome.is_some() {
            return TokenSinkResult::Continue;
        }
        match token {
            Token::TagToken(tag) => match tag.kind {
                TagKind::StartTag if !self.in_title && &*tag.name == "title" => {
                    self.in_title = true;
                    // <title> content is RCDATA: switch the tokenizer so the
                    // content arrives as character tokens, entities decoded,
                    // until the matching end tag.
                    return TokenSinkResult::RawData(RawKind::Rcdata);
                }
                TagKind::EndTag if self.in_title => {
                    self.finish_title();
                }
                _ => {}
            },
            Token::CharacterTokens(text) => {
                if self.in_title {
                    self.saw_text = true;
                    self.buf.push_str(&text);
                }
            }
            Token::EOFToken => {
                if self.in_title {
                    self.finish_title();
                }
            }
            _ => {}
        }
        TokenSinkResult::Continue
    }
}

/// Extract the first `<title>` from `body`, scanning at most
/// [`TITLE_SCAN_LIMIT`] bytes.
///
/// Returns, in order of preference: the title text exactly as written
/// (surrounding whitespace preserved), [`PARSE_FAILED_TITLE`] if a title
/// tag had no text after it, or `fallback` if the scan window held no
/// title tag at all.
pub fn extract_title(body: &[u8], fallback: &str) -> String {
    let window = &body[..body.len().min(TITLE_SCAN_LIMIT)];
    // Truncation can cut a UTF-8 sequence in half; lossy decoding keeps the
    // rest of the window parseable.
    let text = String::from_utf8_lossy(window);

    let mut input = BufferQueue::default();
    input.push_back(StrTendril::from_slice(&text));

    let mut tokenizer = Tokenizer::new(TitleSink::default(), TokenizerOpts::default());
    let _ = tokenizer.feed(&mut input);
    tokenizer.end();

    match tokenizer.sink.outcome {
        Some(Outcome::Title(title)) => title,
        Some(Outcome::ParseFailed) => PARSE_FAILED_TITLE.to_string(),
        None => fallback.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FALLBACK: &str = "https://example.com";

    #[test]
    fn extracts_simple_title() {
        let html = b"<html><head><title>Example Domain</title></head><body></body></html>";
        assert_eq!(extract_title(html, FALLBACK), "Example Domain");
    }

    #[test]
    fn preserves_surrounding_whitespace() {
        let html = b"<title>  Example  </title>";
        assert_eq!(extract_title(html, FALLBACK), "  Example  ");
    }

    #[test]
    fn tag_matching_is_case_insensitive() {
        let html = b"<HTML><HEAD><TITLE>Shouty</TITLE></HEAD></HTML>";
        assert_eq!(extract_title(html, FALLBACK), "Shouty");
    }

    #[test]
    fn decodes_character_references() {
        let html = b"<title>Tom &amp; Jerry</title>";
        assert_eq!(extract_title(html, FALLBACK), "Tom & Jerry");
    }

    #[test]
    fn ignores_title_attributes() {
        let html = b"<title data-i18n=\"page.title\">Attributed</title>";
        assert_eq!(extract_title(html, FALLBACK), "Attributed");
    }

    #[test]
    fn markup_inside_title_is_literal_text() {
        // RCDATA: tags inside <title> are not tags.
        let html = b"<title>a <b>bold</b> claim</title>";
        assert_eq!(extract_title(html, FALLBACK), "a <b>bold</b> claim");
    }

    #[test]
    fn uses_first_title_only() {
        let html = b"<title>first</title><title>second</title>";
        assert_eq!(extract_title(html, FALLBACK), "first");
    }

    #[test]
    fn no_title_returns_fallback() {
        let html = b"<html><body><h1>No title here</h1></body></html>";
        assert_eq!(extract_title(html, FALLBACK), FALLBACK);
    }

    #[test]
    fn empty_input_returns_fallback() {
        assert_eq!(extract_title(b"", FALLBACK), FALLBACK);
    }

    #[test]
    fn non_html_returns_fallback() {
        let body = br#"{"title": "this is json, not markup"}"#;
        assert_eq!(extract_title(body, FALLBACK), FALLBACK);
    }

    #[test]
    fn empty_title_element_is_a_parse_failure() {
        let html = b"<html><head><title></title></head></html>";
        assert_eq!(extract_title(html, FALLBACK), PARSE_FAILED_TITLE);
    }

    #[test]
    fn stream_ending_right_after_title_tag_is_a_parse_failure() {
        let html = b"<html><head><title>";
        assert_eq!(extract_title(html, FALLBACK), PARSE_FAILED_TITLE);
    }

    #[test]
    fn title_past_the_scan_limit_returns_fallback() {
        let mut body = "x".repeat(TITLE_SCAN_LIMIT + 100).into_bytes();
        body.extend_from_slice(b"<title>too late</title>");
        assert_eq!(extract_title(&body, FALLBACK), FALLBACK);
    }

    #[test]
    fn title_cut_by_the_scan_limit_keeps_the_in_window_text() {
        // The tag opens inside the window but the text runs past it; the
        // in-window portion is still a usable title.
        let mut body = "x".repeat(TITLE_SCAN_LIMIT - 15).into_bytes();
        body.extend_from_slice(b"<title>abcdefghijklmnop</title>");
        let title = extract_title(&body, FALLBACK);
        assert_eq!(title, "abcdefgh");
    }

    #[test]
    fn scan_never_reads_past_the_limit() {
        // 1 MiB of padding after the window must not affect the result.
        let mut body = b"<title>early</title>".to_vec();
        body.extend(std::iter::repeat(b'y').take(1 << 20));
        assert_eq!(extract_title(&body, FALLBACK), "early");
    }

    #[test]
    fn truncated_utf8_at_window_edge_is_tolerated() {
        let mut body = "x".repeat(TITLE_SCAN_LIMIT - 1).into_bytes();
        body.extend_from_slice("é".as_bytes()); // two bytes, cut in half
        body.extend_from_slice(b"<title>after</title>");
        assert_eq!(extract_title(&body, FALLBACK), FALLBACK);
    }
}
