use crate::config::BlockTerminatorConfig;
use crate::error::{MinerError, MinerResult};
use regex::{Regex, RegexBuilder};

/// Decides where a multi-line block field ends.
///
/// `body_start` is the byte offset right after the field label. The block
/// always keeps its first line; implementations look for the end only past
/// it. The returned offset is exclusive and never smaller than `body_start`.
pub trait BlockTerminator {
    fn block_end(&self, text: &str, body_start: usize) -> usize;
    fn name(&self) -> &str;

    /// Whether `line` would itself start a new field
    fn is_label_line(&self, _line: &str) -> bool {
        false
    }
}

/// Offset of the line following the one containing `from`, if any
fn next_line_start(text: &str, from: usize) -> Option<usize> {
    text[from..].find('\n').map(|nl| from + nl + 1)
}

/// Ends the block before the next line that looks like a field label
/// ("Lernziele:", "Learning Objectives:", ...).
pub struct NextLabelLine {
    label: Regex,
}

impl NextLabelLine {
    pub fn new(label_pattern: &str, size_limit: usize) -> MinerResult<Self> {
        // Case-sensitive on purpose: the capital letter is the whole signal
        let label = RegexBuilder::new(label_pattern)
            .multi_line(true)
            .size_limit(size_limit)
            .dfa_size_limit(size_limit)
            .build()
            .map_err(|source| MinerError::InvalidPattern {
                field: "block_terminator".to_string(),
                pattern: label_pattern.to_string(),
                source,
            })?;
        Ok(Self { label })
    }
}

impl BlockTerminator for NextLabelLine {
    fn block_end(&self, text: &str, body_start: usize) -> usize {
        let Some(search_from) = next_line_start(text, body_start) else {
            return text.len();
        };
        // `^` in multi-line mode only matches at line starts, and search_from is one
        match self.label.find(&text[search_from..]) {
            Some(label) => search_from + label.start(),
            None => text.len(),
        }
    }

    fn name(&self) -> &str {
        "NextLabelLine"
    }

    fn is_label_line(&self, line: &str) -> bool {
        self.label.is_match(line)
    }
}

/// Ends the block at the first blank line after its first line
pub struct BlankLine;

impl BlockTerminator for BlankLine {
    fn block_end(&self, text: &str, body_start: usize) -> usize {
        let mut line_start = match next_line_start(text, body_start) {
            Some(start) => start,
            None => return text.len(),
        };
        while line_start < text.len() {
            let line_end = text[line_start..]
                .find('\n')
                .map_or(text.len(), |nl| line_start + nl);
            if text[line_start..line_end].trim().is_empty() {
                return line_start;
            }
            line_start = line_end + 1;
        }
        text.len()
    }

    fn name(&self) -> &str {
        "BlankLine"
    }
}

pub fn terminator_from_config(
    config: &BlockTerminatorConfig,
    size_limit: usize,
) -> MinerResult<Box<dyn BlockTerminator + Send + Sync>> {
    Ok(match config {
        BlockTerminatorConfig::NextLabelLine { label_pattern } => {
            Box::new(NextLabelLine::new(label_pattern, size_limit)?)
        }
        BlockTerminatorConfig::BlankLine => Box::new(BlankLine),
    })
}
