use crate::error::{MinerError, MinerResult};
use serde::{Deserialize, Serialize};

// Default value functions for serde
fn default_true() -> bool {
    true
}

fn default_direct_marker() -> String {
    r"Modul[:\s]+([^\n]+)".to_string()
}

fn default_proximity_marker() -> String {
    r"ECTS[:\s]+(\d+(?:[.,]\d+)?)".to_string()
}

fn default_proximity_window() -> usize {
    500 // Characters searched backwards from a proximity marker
}

fn default_excerpt_limit() -> usize {
    2000
}

fn default_key_prefix() -> String {
    "PDF".to_string()
}

fn default_key_name_limit() -> usize {
    50
}

fn default_label_line_pattern() -> String {
    // A line opening with a capitalized word (optionally more words) and a colon
    r"^[ \t]*\p{Lu}[^:\n]{0,80}:".to_string()
}

fn default_regex_size_limit() -> usize {
    1 << 20
}

fn default_identity_field() -> String {
    "modul_name".to_string()
}

fn default_credit_field() -> String {
    "ects".to_string()
}

/// Record attributes that share the JSON object with extracted fields
const RESERVED_FIELD_NAMES: &[&str] = &[
    "id",
    "key",
    "raw_excerpt",
    "span",
    "strategy",
    "provenance",
    "source_file",
];

/// Complete miner configuration: detector markers, extraction settings,
/// resource limits and the per-field rule table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MinerConfig {
    #[serde(default)]
    pub detection: DetectionConfig,
    #[serde(default)]
    pub extraction: ExtractionConfig,
    #[serde(default)]
    pub limits: LimitsConfig,
    /// Field that carries the module identity (anchor, receives the seed)
    #[serde(default = "default_identity_field")]
    pub identity_field: String,
    /// Field that carries the numeric credit value (anchor)
    #[serde(default = "default_credit_field")]
    pub credit_field: String,
    /// Rule table, evaluated per field in declared pattern order
    #[serde(default = "default_fields")]
    pub fields: Vec<FieldRuleConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionConfig {
    /// Record-introducing marker; capture group 1 becomes the seed name
    #[serde(default = "default_direct_marker")]
    pub direct_marker: String,
    /// Secondary marker that usually sits inside a record
    #[serde(default = "default_proximity_marker")]
    pub proximity_marker: String,
    /// Backward search window for the proximity strategy (characters)
    #[serde(default = "default_proximity_window")]
    pub proximity_window: usize,
    #[serde(default = "default_true")]
    pub enable_proximity: bool,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            direct_marker: default_direct_marker(),
            proximity_marker: default_proximity_marker(),
            proximity_window: default_proximity_window(),
            enable_proximity: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Hard cap on the raw excerpt kept per record (characters)
    #[serde(default = "default_excerpt_limit")]
    pub excerpt_limit: usize,
    /// How multi-line block fields find their end
    #[serde(default)]
    pub block_terminator: BlockTerminatorConfig,
    /// Prefix of the graph pseudo-key ("PDF" -> "PDF_LineareAlgebra")
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
    /// Identity characters used when building the pseudo-key
    #[serde(default = "default_key_name_limit")]
    pub key_name_limit: usize,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            excerpt_limit: default_excerpt_limit(),
            block_terminator: BlockTerminatorConfig::default(),
            key_prefix: default_key_prefix(),
            key_name_limit: default_key_name_limit(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum BlockTerminatorConfig {
    /// Stop before the next line that looks like a field label
    NextLabelLine {
        #[serde(default = "default_label_line_pattern")]
        label_pattern: String,
    },
    /// Stop at the first blank line
    BlankLine,
}

impl Default for BlockTerminatorConfig {
    fn default() -> Self {
        BlockTerminatorConfig::NextLabelLine {
            label_pattern: default_label_line_pattern(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Compiled size limit for every regex (bytes)
    #[serde(default = "default_regex_size_limit")]
    pub regex_size_limit: usize,
    /// Spans longer than this are searched only up to this many characters
    #[serde(default)]
    pub max_span_chars: Option<usize>,
    /// Wall-clock budget per span; fields not reached in time stay absent
    #[serde(default)]
    pub span_budget_ms: Option<u64>,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            regex_size_limit: default_regex_size_limit(),
            max_span_chars: None,
            span_budget_ms: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    #[default]
    Text,
    /// Integer credit points, fractional part truncated
    Credits,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureMode {
    /// Capture group 1, or the whole match
    #[default]
    Inline,
    /// Pattern matches the label; value runs until the block terminator
    Block,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    De,
    En,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldRuleConfig {
    pub name: String,
    #[serde(default)]
    pub kind: FieldKind,
    pub patterns: Vec<PatternConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternConfig {
    pub pattern: String,
    #[serde(default)]
    pub mode: CaptureMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lang: Option<Language>,
}

impl PatternConfig {
    pub fn inline(pattern: &str, lang: Option<Language>) -> Self {
        Self {
            pattern: pattern.to_string(),
            mode: CaptureMode::Inline,
            lang,
        }
    }

    pub fn block(pattern: &str, lang: Option<Language>) -> Self {
        Self {
            pattern: pattern.to_string(),
            mode: CaptureMode::Block,
            lang,
        }
    }
}

impl FieldRuleConfig {
    pub fn new(name: &str, kind: FieldKind, patterns: Vec<PatternConfig>) -> Self {
        Self {
            name: name.to_string(),
            kind,
            patterns,
        }
    }
}

/// Module-handbook rule table (German labels first, English variants after)
fn default_fields() -> Vec<FieldRuleConfig> {
    use Language::{De, En};
    const CREDIT: &str = r"(\d+(?:[.,]\d+)?)";

    vec![
        FieldRuleConfig::new(
            "modul_name",
            FieldKind::Text,
            vec![
                PatternConfig::inline(r"Modul[:\s]+([^\n]+)", Some(De)),
                PatternConfig::inline(r"Modulbezeichnung[:\s]+([^\n]+)", Some(De)),
                PatternConfig::inline(r"Modulname[:\s]+([^\n]+)", Some(De)),
            ],
        ),
        FieldRuleConfig::new(
            "ects",
            FieldKind::Credits,
            vec![
                PatternConfig::inline(&format!(r"ECTS[:\s]+{CREDIT}"), None),
                PatternConfig::inline(&format!(r"Leistungspunkte[:\s]+{CREDIT}"), Some(De)),
                PatternConfig::inline(&format!(r"Credit\s+Points[:\s]+{CREDIT}"), Some(En)),
                PatternConfig::inline(&format!(r"LP[:\s]+{CREDIT}"), Some(De)),
            ],
        ),
        FieldRuleConfig::new(
            "semester",
            FieldKind::Text,
            vec![
                PatternConfig::inline(r"(\d+\.?\s*Semester)", Some(De)),
                PatternConfig::inline(r"Semester[:\s]+(\d+)", None),
                PatternConfig::inline(r"Studienjahr[:\s]+(\d+)", Some(De)),
            ],
        ),
        FieldRuleConfig::new(
            "veranstaltungsart",
            FieldKind::Text,
            vec![
                PatternConfig::inline(r"Veranstaltungsart[:\s]+([^\n]+)", Some(De)),
                PatternConfig::inline(r"Art[:\s]+([^\n]+)", Some(De)),
                PatternConfig::inline(r"(Vorlesung|Übung|Seminar|Praktikum|Projekt)", Some(De)),
            ],
        ),
        FieldRuleConfig::new(
            "sprache",
            FieldKind::Text,
            vec![
                PatternConfig::inline(r"Sprache[:\s]+([^\n]+)", Some(De)),
                PatternConfig::inline(r"Language[:\s]+([^\n]+)", Some(En)),
            ],
        ),
        FieldRuleConfig::new(
            "voraussetzungen",
            FieldKind::Text,
            vec![
                PatternConfig::block(r"Voraussetzungen[:\s]+", Some(De)),
                PatternConfig::block(r"Prerequisites[:\s]+", Some(En)),
                PatternConfig::block(r"Vorkenntnisse[:\s]+", Some(De)),
            ],
        ),
        FieldRuleConfig::new(
            "inhalte",
            FieldKind::Text,
            vec![
                PatternConfig::block(r"Inhalt[:\s]+", Some(De)),
                PatternConfig::block(r"Inhalte[:\s]+", Some(De)),
                PatternConfig::block(r"Content[:\s]+", Some(En)),
            ],
        ),
        FieldRuleConfig::new(
            "lernziele",
            FieldKind::Text,
            vec![
                PatternConfig::block(r"Lernziele[:\s]+", Some(De)),
                PatternConfig::block(r"Learning\s+Objectives[:\s]+", Some(En)),
                PatternConfig::block(r"Ziele[:\s]+", Some(De)),
            ],
        ),
        FieldRuleConfig::new(
            "pruefung",
            FieldKind::Text,
            vec![
                PatternConfig::block(r"Prüfung[:\s]+", Some(De)),
                PatternConfig::inline(r"Prüfungsform[:\s]+([^\n]+)", Some(De)),
                PatternConfig::block(r"Examination[:\s]+", Some(En)),
            ],
        ),
    ]
}

impl Default for MinerConfig {
    fn default() -> Self {
        Self {
            detection: DetectionConfig::default(),
            extraction: ExtractionConfig::default(),
            limits: LimitsConfig::default(),
            identity_field: default_identity_field(),
            credit_field: default_credit_field(),
            fields: default_fields(),
        }
    }
}

impl MinerConfig {
    /// Load config from a YAML file
    pub fn load_from_file(path: &str) -> MinerResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: MinerConfig = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load config with fallback to default
    pub fn load_with_fallback(path: Option<&str>) -> Self {
        match path {
            Some(p) => Self::load_from_file(p).unwrap_or_else(|e| {
                tracing::warn!(path = p, error = %e, "failed to load config, using defaults");
                Self::default()
            }),
            None => Self::default(),
        }
    }

    pub fn to_yaml(&self) -> MinerResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Structural checks that don't need compiled regexes
    pub fn validate(&self) -> MinerResult<()> {
        let mut seen = std::collections::BTreeSet::new();
        for field in &self.fields {
            if field.name.trim().is_empty() {
                return Err(MinerError::InvalidConfig("field with empty name".into()));
            }
            if RESERVED_FIELD_NAMES.contains(&field.name.as_str()) {
                return Err(MinerError::InvalidConfig(format!(
                    "field name '{}' collides with a record attribute",
                    field.name
                )));
            }
            if !seen.insert(field.name.as_str()) {
                return Err(MinerError::InvalidConfig(format!(
                    "field '{}' declared twice",
                    field.name
                )));
            }
            if field.patterns.is_empty() {
                return Err(MinerError::InvalidConfig(format!(
                    "field '{}' has no patterns",
                    field.name
                )));
            }
        }

        let kind_of = |name: &str| {
            self.fields
                .iter()
                .find(|f| f.name == name)
                .map(|f| f.kind)
        };
        match kind_of(&self.identity_field) {
            Some(FieldKind::Text) => {}
            Some(FieldKind::Credits) => {
                return Err(MinerError::InvalidConfig(format!(
                    "identity field '{}' must be a text field",
                    self.identity_field
                )))
            }
            None => {
                return Err(MinerError::InvalidConfig(format!(
                    "identity field '{}' not in rule table",
                    self.identity_field
                )))
            }
        }
        match kind_of(&self.credit_field) {
            Some(FieldKind::Credits) => {}
            Some(FieldKind::Text) => {
                return Err(MinerError::InvalidConfig(format!(
                    "credit field '{}' must have kind 'credits'",
                    self.credit_field
                )))
            }
            None => {
                return Err(MinerError::InvalidConfig(format!(
                    "credit field '{}' not in rule table",
                    self.credit_field
                )))
            }
        }

        if self.detection.proximity_window == 0 && self.detection.enable_proximity {
            return Err(MinerError::InvalidConfig(
                "proximity_window must be positive".into(),
            ));
        }
        Ok(())
    }
}
