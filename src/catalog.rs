//! Models the client knows how to label. Any other id is still forwarded as-is.

/// Model used when a request does not name one.
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelInfo {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
}

pub const MODELS: &[ModelInfo] = &[
    ModelInfo {
        id: "claude-opus-4-5-20251101",
        name: "Claude Opus 4.5",
        description: "Most capable",
    },
    ModelInfo {
        id: "claude-sonnet-4-5-20250929",
        name: "Claude Sonnet 4.5",
        description: "Balanced",
    },
    ModelInfo {
        id: DEFAULT_MODEL,
        name: "Claude Sonnet 4",
        description: "Fast & capable",
    },
    ModelInfo {
        id: "claude-3-7-sonnet-20250219",
        name: "Claude 3.7 Sonnet",
        description: "Previous gen",
    },
];

/// Look up a known model by id.
pub fn find(id: &str) -> Option<&'static ModelInfo> {
    MODELS.iter().find(|model| model.id == id)
}
