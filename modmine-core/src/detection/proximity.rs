use super::{seed_from, DetectionStrategy};
use crate::types::{BoundaryStrategy, CandidateBoundary};
use regex::Regex;

/// Uses a weaker marker ("ECTS: 5") that usually sits *inside* a record to
/// recover the record's start: for each occurrence, the nearest direct
/// marker within a bounded backward window becomes the candidate.
///
/// Occurrences with no direct marker in their window emit nothing. Adjacent
/// occurrences may rediscover the same marker; those duplicates are kept.
pub struct ProximityMarkerStrategy {
    secondary: Regex,
    direct: Regex,
    window_chars: usize,
}

impl ProximityMarkerStrategy {
    pub fn new(secondary: Regex, direct: Regex, window_chars: usize) -> Self {
        Self {
            secondary,
            direct,
            window_chars,
        }
    }

    fn nearest_marker_before(&self, text: &str, end: usize) -> Option<CandidateBoundary> {
        let start = window_start(text, end, self.window_chars);
        let window = &text[start..end];
        let caps = self.direct.captures_iter(window).last()?;
        let whole = caps.get(0)?;
        Some(CandidateBoundary {
            position: start + whole.start(),
            strategy: BoundaryStrategy::ProximityMarker,
            seed_value: seed_from(&caps),
        })
    }
}

/// Byte offset `window_chars` characters before `end` (clamped to 0)
fn window_start(text: &str, end: usize, window_chars: usize) -> usize {
    if window_chars == 0 {
        return end;
    }
    text[..end]
        .char_indices()
        .rev()
        .nth(window_chars - 1)
        .map_or(0, |(i, _)| i)
}

impl DetectionStrategy for ProximityMarkerStrategy {
    fn detect(&self, text: &str) -> Vec<CandidateBoundary> {
        self.secondary
            .find_iter(text)
            .filter_map(|m| self.nearest_marker_before(text, m.start()))
            .collect()
    }

    fn name(&self) -> &str {
        "ProximityMarker"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::compile_marker;

    fn strategy(window: usize) -> ProximityMarkerStrategy {
        ProximityMarkerStrategy::new(
            compile_marker("proximity", r"ECTS[:\s]+(\d+(?:[.,]\d+)?)", 1 << 20).unwrap(),
            compile_marker("direct", r"Modul[:\s]+([^\n]+)", 1 << 20).unwrap(),
            window,
        )
    }

    #[test]
    fn finds_marker_inside_window() {
        let filler = "x".repeat(80);
        let text = format!("Modul: Datenbanken\n{filler}\nECTS: 5\n");
        let found = strategy(500).detect(&text);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].position, 0);
        assert_eq!(found[0].seed_value.as_deref(), Some("Datenbanken"));
        assert_eq!(found[0].strategy, BoundaryStrategy::ProximityMarker);
    }

    #[test]
    fn marker_outside_window_is_ignored() {
        let filler = "x".repeat(600);
        let text = format!("Modul: Datenbanken\n{filler}\nECTS: 5\n");
        assert!(strategy(500).detect(&text).is_empty());
    }

    #[test]
    fn picks_nearest_marker() {
        let text = "Modul: Erstes\nModul: Zweites\nECTS: 5";
        let found = strategy(500).detect(text);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].position, text.find("Modul: Zweites").unwrap());
        assert_eq!(found[0].seed_value.as_deref(), Some("Zweites"));
    }

    #[test]
    fn adjacent_occurrences_rediscover_the_same_marker() {
        let text = "Modul: Theorie\nECTS: 5\nLP: 5\nECTS: 5,0";
        let found = strategy(500).detect(text);
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].position, found[1].position);
    }

    #[test]
    fn window_counts_characters_not_bytes() {
        let text = "ääää";
        assert_eq!(window_start(text, text.len(), 2), 4);
        assert_eq!(window_start(text, text.len(), 10), 0);
        assert_eq!(window_start(text, 4, 0), 4);
    }
}
