//! Script inventory types.

use crate::models::LoadAttribute;

/// A `<script src=...>` reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalScript {
    pub src: String,
    pub load: LoadAttribute,
}

/// The body of an inline `<script>` element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineScript {
    /// Truncated to `MAX_SCRIPT_CONTENT_SIZE`
    pub text: String,
    /// Contains code that creates and inserts a script element
    pub creates_script: bool,
}

/// Everything script-related found in one document.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ScriptInventory {
    pub external_scripts: Vec<ExternalScript>,
    pub inline_scripts: Vec<InlineScript>,
    /// Inner markup of each `<noscript>` element
    pub noscript_blocks: Vec<String>,
    /// Scripts were recovered from raw text that structural parsing missed
    pub parse_degraded: bool,
}

impl ScriptInventory {
    pub fn is_empty(&self) -> bool {
        self.external_scripts.is_empty()
            && self.inline_scripts.is_empty()
            && self.noscript_blocks.is_empty()
    }

    pub fn script_count(&self) -> usize {
        self.external_scripts.len() + self.inline_scripts.len()
    }

    /// `src` values in document order, without duplicates.
    pub fn external_sources(&self) -> Vec<String> {
        let mut sources: Vec<String> = Vec::with_capacity(self.external_scripts.len());
        for script in &self.external_scripts {
            if !sources.contains(&script.src) {
                sources.push(script.src.clone());
            }
        }
        sources
    }
}
