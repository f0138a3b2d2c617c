//! Translation backend and token-estimation seams.
//!
//! The batch engine only ever sees these two traits. The real
//! machine-translation client lives behind `TranslationBackend`; what ships
//! here is the pass-through implementation used for dry runs and tests, and
//! a heuristic token counter good enough for budget admission.

use anyhow::Result;

/// Opaque translation service. One call per row.
pub trait TranslationBackend {
    fn translate(&self, text: &str) -> Result<String>;
    /// Model identifier recorded in the checkpoint.
    fn model(&self) -> &str;
}

/// Model-specific token estimation.
pub trait TokenCounter {
    fn count(&self, text: &str) -> usize;
}

/// Returns the input unchanged. Dry runs exercise the whole pipeline with
/// this; the merge stage downstream behaves identically either way.
pub struct PassthroughBackend {
    model: String,
}

impl PassthroughBackend {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
        }
    }
}

impl TranslationBackend for PassthroughBackend {
    fn translate(&self, text: &str) -> Result<String> {
        Ok(text.to_owned())
    }

    fn model(&self) -> &str {
        &self.model
    }
}

/// Whitespace/CJK-aware estimate: one token per whitespace-separated word
/// plus one per CJK character, which tokenizers treat as roughly one token
/// each.
pub struct HeuristicCounter;

impl TokenCounter for HeuristicCounter {
    fn count(&self, text: &str) -> usize {
        let words = text.split_whitespace().count();
        let cjk = text
            .chars()
            .filter(|c| {
                matches!(u32::from(*c),
                    0x4E00..=0x9FFF | 0x3400..=0x4DBF | 0x3040..=0x30FF | 0xAC00..=0xD7AF)
            })
            .count();
        words + cjk
    }
}

/// Strip a reasoning preamble from a raw model response.
///
/// Everything up to and including the last `</think>` marker is dropped.
/// Responses without the marker fall back to the last non-empty paragraph,
/// which drops any explanation the model emitted before the translation.
pub fn clean_response(raw: &str) -> String {
    if let Some(idx) = raw.rfind("</think>") {
        return raw[idx + "</think>".len()..].trim().to_owned();
    }
    raw.rsplit("\n\n")
        .map(str::trim)
        .find(|p| !p.is_empty())
        .unwrap_or(raw.trim())
        .to_owned()
}
