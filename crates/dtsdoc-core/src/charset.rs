//! Decoding of page bodies into text.
//!
//! A charset declared in `Content-Type` is used as-is, except `ISO-8859-1`,
//! which servers send as a default without looking at the body. Without a
//! usable declaration the body is read as UTF-8 when it is valid UTF-8, else
//! the encoding is guessed from the bytes. A guess that does not decode
//! cleanly falls back to GB18030, the superset of GBK and GB2312.

use chardetng::EncodingDetector;
use encoding_rs::{Encoding, GB18030, UTF_8, WINDOWS_1252};
use tracing::debug;

/// The `charset` parameter of a `Content-Type` value, unquoted.
#[must_use]
pub fn charset_param(content_type: &str) -> Option<&str> {
    content_type.split(';').skip(1).find_map(|param| {
        let (name, value) = param.split_once('=')?;
        name.trim()
            .eq_ignore_ascii_case("charset")
            .then(|| value.trim().trim_matches(|c| c == '"' || c == '\''))
            .filter(|value| !value.is_empty())
    })
}

/// Encoding declared by `content_type`, ignoring the Latin-1 default.
fn declared_encoding(content_type: Option<&str>) -> Option<&'static Encoding> {
    let label = charset_param(content_type?)?;
    // encoding_rs maps ISO-8859-1 and US-ASCII labels to windows-1252.
    Encoding::for_label(label.as_bytes()).filter(|enc| *enc != WINDOWS_1252)
}

/// Guess the encoding of an undeclared body.
#[must_use]
pub fn sniff_encoding(bytes: &[u8]) -> &'static Encoding {
    if std::str::from_utf8(bytes).is_ok() {
        return UTF_8;
    }

    let mut detector = EncodingDetector::new();
    detector.feed(bytes, true);
    let guess = detector.guess(None, true);
    if guess
        .decode_without_bom_handling_and_without_replacement(bytes)
        .is_some()
    {
        guess
    } else {
        GB18030
    }
}

/// Decode a response body, honoring the declared charset when there is one.
#[must_use]
pub fn decode_markup(bytes: &[u8], content_type: Option<&str>) -> String {
    let encoding = declared_encoding(content_type).unwrap_or_else(|| sniff_encoding(bytes));
    let (text, used, had_errors) = encoding.decode(bytes);
    if had_errors {
        debug!("decoding as {} replaced malformed bytes", used.name());
    }
    text.into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use encoding_rs::GBK;

    const PAGE_TEXT: &str = "<h1 class=\"page-title\">Class: Marker</h1>\
        <div class=\"class-description\">标记图层用于在三维场景中添加点标注，\
        每个标注可以包含文字和图片。通过添加方法可以一次添加一个或多个标注，\
        通过删除方法可以按编号移除标注，清空方法会移除图层中的全部标注。</div>";

    #[test]
    fn test_charset_param() {
        assert_eq!(charset_param("text/html; charset=gbk"), Some("gbk"));
        assert_eq!(charset_param("text/html;Charset=\"UTF-8\""), Some("UTF-8"));
        assert_eq!(charset_param("text/html"), None);
        assert_eq!(charset_param("text/html; charset="), None);
    }

    #[test]
    fn test_declared_charset_is_used() {
        let (bytes, _, _) = GBK.encode("<h1>标记</h1>");
        assert_eq!(
            decode_markup(&bytes, Some("text/html; charset=gbk")),
            "<h1>标记</h1>"
        );
    }

    #[test]
    fn test_utf8_body_without_declaration() {
        assert_eq!(decode_markup("<h1>标记</h1>".as_bytes(), None), "<h1>标记</h1>");
    }

    #[test]
    fn test_gbk_body_without_declaration_is_sniffed() {
        let (bytes, _, _) = GBK.encode(PAGE_TEXT);
        assert_eq!(decode_markup(&bytes, Some("text/html")), PAGE_TEXT);
    }

    #[test]
    fn test_latin1_default_is_not_trusted() {
        let (bytes, _, _) = GBK.encode(PAGE_TEXT);
        assert_eq!(
            decode_markup(&bytes, Some("text/html; charset=ISO-8859-1")),
            PAGE_TEXT
        );
    }

    #[test]
    fn test_gb_family_labels() {
        let (bytes, _, _) = GB18030.encode("标记");
        assert_eq!(decode_markup(&bytes, Some("text/html; charset=gb2312")), "标记");
        assert_eq!(decode_markup(&bytes, Some("text/html; charset=GB18030")), "标记");
    }
}
