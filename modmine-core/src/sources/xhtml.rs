use super::{extension_of, TextSource};
use regex::{Captures, Regex};
use std::path::Path;
use std::sync::LazyLock;

// Pre-compiled regexes for flattening extractor XHTML
static INVISIBLE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<head\b.*?</head>|<script\b.*?</script>|<style\b.*?</style>|<!--.*?-->")
        .unwrap()
});

static LINE_BREAK_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)<br\s*/?>|</(?:p|div|li|h[1-6]|tr|td|th|table|ul|ol)\s*>").unwrap()
});

static TAG_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").unwrap());

static ENTITY_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&(#[xX][0-9a-fA-F]{1,6}|#[0-9]{1,7}|[a-zA-Z]+);").unwrap());

static BLANK_RUN_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{3,}").unwrap());

/// XHTML as written by Tika-style PDF extractors: every paragraph becomes
/// a line, tags are dropped and common entities decoded.
pub struct XhtmlTextSource;

fn decode_entity(caps: &Captures<'_>) -> String {
    let entity = &caps[1];
    let decoded = if let Some(hex) = entity.strip_prefix("#x").or_else(|| entity.strip_prefix("#X")) {
        u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
    } else if let Some(dec) = entity.strip_prefix('#') {
        dec.parse::<u32>().ok().and_then(char::from_u32)
    } else {
        match entity {
            "amp" => Some('&'),
            "lt" => Some('<'),
            "gt" => Some('>'),
            "quot" => Some('"'),
            "apos" => Some('\''),
            "nbsp" => Some(' '),
            "auml" => Some('ä'),
            "ouml" => Some('ö'),
            "uuml" => Some('ü'),
            "Auml" => Some('Ä'),
            "Ouml" => Some('Ö'),
            "Uuml" => Some('Ü'),
            "szlig" => Some('ß'),
            _ => None,
        }
    };
    // Unknown entities stay as written
    decoded.map_or_else(|| caps[0].to_string(), String::from)
}

impl TextSource for XhtmlTextSource {
    fn markup_to_text(&self, markup: &str) -> String {
        let visible = INVISIBLE_REGEX.replace_all(markup, "");
        let with_breaks = LINE_BREAK_REGEX.replace_all(&visible, "\n");
        let stripped = TAG_REGEX.replace_all(&with_breaks, "");
        let decoded = ENTITY_REGEX.replace_all(&stripped, decode_entity);

        let lines: Vec<&str> = decoded.lines().map(str::trim_end).collect();
        let joined = lines.join("\n");
        BLANK_RUN_REGEX
            .replace_all(joined.trim_matches('\n'), "\n\n")
            .into_owned()
    }

    fn name(&self) -> &str {
        "Xhtml"
    }

    fn supports_file_type(&self, path: &Path) -> bool {
        matches!(extension_of(path).as_deref(), Some("html" | "htm" | "xhtml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paragraphs_become_lines() {
        let xhtml = r#"<html><head><title>Handbuch</title><style>p { x: 1 }</style></head>
<body><div class="page"><p>Modul: Lineare Algebra</p>
<p>ECTS: 9</p><p>Inhalt: Vektorr&auml;ume &amp; Matrizen</p></div></body></html>"#;
        let text = XhtmlTextSource.markup_to_text(xhtml);
        assert_eq!(
            text,
            "Modul: Lineare Algebra\n\nECTS: 9\nInhalt: Vektorräume & Matrizen"
        );
    }

    #[test]
    fn numeric_entities_and_unknown_entities() {
        let text = XhtmlTextSource.markup_to_text("<p>Pr&#252;fung &#x2013; &bogus;</p>");
        assert_eq!(text, "Prüfung \u{2013} &bogus;");
    }
}
