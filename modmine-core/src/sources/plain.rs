use super::{extension_of, TextSource};
use std::path::Path;

/// Plain text dumps (`pdftotext` output and the like)
pub struct PlainTextSource;

impl TextSource for PlainTextSource {
    fn markup_to_text(&self, markup: &str) -> String {
        markup
            .strip_prefix('\u{feff}')
            .unwrap_or(markup)
            .replace("\r\n", "\n")
    }

    fn name(&self) -> &str {
        "PlainText"
    }

    fn supports_file_type(&self, path: &Path) -> bool {
        matches!(extension_of(path).as_deref(), Some("txt" | "text" | "md"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_bom_and_crlf() {
        let text = PlainTextSource.markup_to_text("\u{feff}Modul: A\r\nECTS: 5\r\n");
        assert_eq!(text, "Modul: A\nECTS: 5\n");
    }
}
