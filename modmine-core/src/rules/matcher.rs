use super::block::BlockTerminator;
use crate::config::{CaptureMode, Language, PatternConfig};
use regex::{Regex, RegexBuilder};

/// Compile a user pattern the way every rule and marker is matched:
/// case-insensitive, multi-line, with a bounded automaton size.
pub fn compile_pattern(pattern: &str, size_limit: usize) -> Result<Regex, regex::Error> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .multi_line(true)
        .size_limit(size_limit)
        .dfa_size_limit(size_limit)
        .build()
}

/// One compiled entry of a field's pattern list
#[derive(Debug, Clone)]
pub struct Matcher {
    regex: Regex,
    mode: CaptureMode,
    lang: Option<Language>,
}

impl Matcher {
    pub fn compile(config: &PatternConfig, size_limit: usize) -> Result<Self, regex::Error> {
        Ok(Self {
            regex: compile_pattern(&config.pattern, size_limit)?,
            mode: config.mode,
            lang: config.lang,
        })
    }

    pub fn lang(&self) -> Option<Language> {
        self.lang
    }

    pub fn mode(&self) -> CaptureMode {
        self.mode
    }

    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }

    /// Raw (not yet normalized) text this matcher captures from the span,
    /// or `None` when it doesn't match anywhere.
    pub fn capture<'t>(&self, text: &'t str, terminator: &dyn BlockTerminator) -> Option<&'t str> {
        match self.mode {
            CaptureMode::Inline => self.capture_inline(text),
            CaptureMode::Block => self.capture_block(text, terminator),
        }
    }

    fn capture_inline<'t>(&self, text: &'t str) -> Option<&'t str> {
        let caps = self.regex.captures(text)?;
        // Group 1 when the pattern has one and it participated, else the whole match
        caps.get(1).or_else(|| caps.get(0)).map(|m| m.as_str())
    }

    fn capture_block<'t>(&self, text: &'t str, terminator: &dyn BlockTerminator) -> Option<&'t str> {
        for label in self.regex.find_iter(text) {
            let body_start = label.end();
            let first_line_end = text[body_start..]
                .find('\n')
                .map_or(text.len(), |nl| body_start + nl);
            // A label with nothing after it on its line is not a block
            if text[body_start..first_line_end].trim().is_empty() {
                continue;
            }
            // Label wrapped onto the next line, which starts another field
            if label.as_str().contains('\n') {
                let line_start = text[..body_start].rfind('\n').map_or(0, |nl| nl + 1);
                if terminator.is_label_line(&text[line_start..first_line_end]) {
                    continue;
                }
            }
            let end = terminator.block_end(text, body_start).max(first_line_end);
            return Some(&text[body_start..end]);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::block::{BlankLine, NextLabelLine};

    fn matcher(pattern: &str, mode: CaptureMode) -> Matcher {
        let config = PatternConfig {
            pattern: pattern.to_string(),
            mode,
            lang: None,
        };
        Matcher::compile(&config, 1 << 20).unwrap()
    }

    fn label_terminator() -> NextLabelLine {
        NextLabelLine::new(r"^[ \t]*\p{Lu}[^:\n]{0,80}:", 1 << 20).unwrap()
    }

    #[test]
    fn inline_takes_first_group() {
        let m = matcher(r"ECTS[:\s]+(\d+)", CaptureMode::Inline);
        assert_eq!(m.capture("Umfang ECTS: 9 Punkte", &BlankLine), Some("9"));
    }

    #[test]
    fn inline_without_group_takes_whole_match() {
        let m = matcher(r"Vorlesung|Seminar", CaptureMode::Inline);
        assert_eq!(m.capture("Form: seminar", &BlankLine), Some("seminar"));
    }

    #[test]
    fn inline_is_case_insensitive_and_unanchored() {
        let m = matcher(r"Sprache[:\s]+([^\n]+)", CaptureMode::Inline);
        let text = "irgendwas\nSPRACHE: Deutsch\nmehr";
        assert_eq!(m.capture(text, &BlankLine), Some("Deutsch"));
    }

    #[test]
    fn block_runs_until_next_label() {
        let m = matcher(r"Voraussetzungen[:\s]+", CaptureMode::Block);
        let text = "Voraussetzungen: Analysis I\nund Lineare Algebra\nSprache: Deutsch";
        assert_eq!(
            m.capture(text, &label_terminator()),
            Some("Analysis I\nund Lineare Algebra\n")
        );
    }

    #[test]
    fn block_label_may_wrap_onto_next_line() {
        let m = matcher(r"Inhalt[:\s]+", CaptureMode::Block);
        let text = "Inhalt:\n  Graphen und Bäume\nSprache: Deutsch";
        assert_eq!(m.capture(text, &label_terminator()), Some("Graphen und Bäume\n"));
    }

    #[test]
    fn empty_label_does_not_swallow_next_label() {
        let m = matcher(r"Voraussetzungen[:\s]+", CaptureMode::Block);
        let text = "Voraussetzungen:\nSprache: Deutsch\nInhalt:\nLernziele: Rechnen\n";
        assert_eq!(m.capture(text, &label_terminator()), None);
    }

    #[test]
    fn empty_label_skips_to_later_occurrence() {
        let m = matcher(r"Inhalt[:\s]+", CaptureMode::Block);
        let text = "Inhalt:\nSprache: Deutsch\nInhalt: Graphen\nLernziele: Rechnen";
        assert_eq!(m.capture(text, &label_terminator()), Some("Graphen\n"));
    }

    #[test]
    fn block_label_without_body_does_not_match() {
        let m = matcher(r"Inhalt[:\s]+", CaptureMode::Block);
        assert_eq!(m.capture("Kurzbeschreibung\nInhalt:   ", &label_terminator()), None);
    }
}
