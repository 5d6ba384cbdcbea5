//! Charset detection for decoding textual response bodies.
//!
//! Sniffing only runs for html/plain/xml media types; anything else decodes
//! as utf-8 with replacement. Detection order: explicit `charset=` parameter,
//! HTML5 meta tag, HTML4 http-equiv meta tag, XML declaration, utf-8.

use std::str::FromStr;

use encoding_rs::Encoding;
use once_cell::sync::Lazy;
use regex::bytes::Regex;

/// Meta tags and XML declarations are only honored this deep into the body.
const SNIFF_WINDOW: usize = 1024;

static META_CHARSET: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)<meta.+?charset=["']([^"']+)["']"#).expect("static pattern compiles")
});

static META_HTTP_EQUIV: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)<meta\s+?http-equiv=["']content-type["']\s+?content=["']([^"']+)["']"#)
        .expect("static pattern compiles")
});

static XML_DECLARATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)<\?xml.+?encoding=["']([^"']+)["']"#).expect("static pattern compiles")
});

/// Decodes body bytes into text under the fetch charset rules, using the
/// owner's `Content-Type` value when one is known.
pub(crate) fn decode_text(content: &[u8], content_type: Option<&str>) -> String {
    let media_type = content_type.and_then(|ct| mime::Mime::from_str(ct).ok());

    if !media_type.as_ref().map(is_sniffable).unwrap_or(false) {
        return String::from_utf8_lossy(content).into_owned();
    }

    let label = detect_charset(content, media_type.as_ref());
    let encoding = match Encoding::for_label(label.as_bytes()) {
        Some(encoding) => encoding,
        None => {
            tracing::debug!(
                target: "webfetch::charset",
                label = %label,
                "unknown charset label, decoding as utf-8"
            );
            encoding_rs::UTF_8
        }
    };

    let (text, _, _) = encoding.decode(content);
    text.into_owned()
}

/// Textual media types that participate in charset sniffing.
fn is_sniffable(media_type: &mime::Mime) -> bool {
    if media_type.type_() == mime::TEXT {
        return matches!(
            media_type.subtype().as_str(),
            "html" | "plain" | "xml"
        );
    }
    if media_type.type_() == mime::APPLICATION {
        return media_type.subtype() == "xml"
            || media_type.subtype() == "xhtml"
            || media_type.suffix().map(|s| s == "xml").unwrap_or(false);
    }
    false
}

fn detect_charset(content: &[u8], media_type: Option<&mime::Mime>) -> String {
    if let Some(charset) = media_type.and_then(|m| m.get_param(mime::CHARSET)) {
        return remap(charset.as_str());
    }

    let window = &content[..content.len().min(SNIFF_WINDOW)];

    if let Some(caps) = META_CHARSET.captures(window) {
        if let Some(label) = caps.get(1) {
            return remap(&String::from_utf8_lossy(label.as_bytes()));
        }
    }

    if let Some(caps) = META_HTTP_EQUIV.captures(window) {
        if let Some(content_attr) = caps.get(1) {
            let value = String::from_utf8_lossy(content_attr.as_bytes());
            if let Ok(embedded) = mime::Mime::from_str(value.trim()) {
                if let Some(charset) = embedded.get_param(mime::CHARSET) {
                    return remap(charset.as_str());
                }
            }
        }
    }

    if let Some(caps) = XML_DECLARATION.captures(window) {
        if let Some(label) = caps.get(1) {
            return remap(&String::from_utf8_lossy(label.as_bytes()));
        }
    }

    "utf-8".to_owned()
}

/// gb2312 and gbk pages are routinely mislabeled; gb18030 is the documented
/// superset of both.
fn remap(label: &str) -> String {
    let trimmed = label.trim();
    if trimmed.eq_ignore_ascii_case("gb2312") || trimmed.eq_ignore_ascii_case("gbk") {
        "gb18030".to_owned()
    } else {
        trimmed.to_owned()
    }
}
