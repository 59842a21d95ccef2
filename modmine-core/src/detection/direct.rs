use super::{seed_from, DetectionStrategy};
use crate::types::{BoundaryStrategy, CandidateBoundary};
use regex::Regex;

/// Emits a candidate at every record-introducing marker ("Modul: ...")
pub struct DirectMarkerStrategy {
    marker: Regex,
}

impl DirectMarkerStrategy {
    pub fn new(marker: Regex) -> Self {
        Self { marker }
    }
}

impl DetectionStrategy for DirectMarkerStrategy {
    fn detect(&self, text: &str) -> Vec<CandidateBoundary> {
        self.marker
            .captures_iter(text)
            .filter_map(|caps| {
                let whole = caps.get(0)?;
                Some(CandidateBoundary {
                    position: whole.start(),
                    strategy: BoundaryStrategy::DirectMarker,
                    seed_value: seed_from(&caps),
                })
            })
            .collect()
    }

    fn name(&self) -> &str {
        "DirectMarker"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::compile_marker;

    fn strategy() -> DirectMarkerStrategy {
        DirectMarkerStrategy::new(compile_marker("direct", r"Modul[:\s]+([^\n]+)", 1 << 20).unwrap())
    }

    #[test]
    fn finds_every_marker_with_seed() {
        let text = "Vorwort\nModul: Lineare Algebra\nText\nMODUL  Analysis \n";
        let found = strategy().detect(text);
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].position, text.find("Modul:").unwrap());
        assert_eq!(found[0].seed_value.as_deref(), Some("Lineare Algebra"));
        assert_eq!(found[1].position, text.find("MODUL").unwrap());
        assert_eq!(found[1].seed_value.as_deref(), Some("Analysis"));
        assert!(found.iter().all(|c| c.strategy == BoundaryStrategy::DirectMarker));
    }

    #[test]
    fn marker_without_group_has_no_seed() {
        let strategy =
            DirectMarkerStrategy::new(compile_marker("direct", r"Modulbeschreibung", 1 << 20).unwrap());
        let found = strategy.detect("Modulbeschreibung\nECTS: 5");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].seed_value, None);
    }
}
