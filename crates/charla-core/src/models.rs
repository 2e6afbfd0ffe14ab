//! Catalog of the hosted models a chat can be routed to

/// A selectable model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelInfo {
    /// Provider-side model identifier
    pub id: &'static str,
    /// One-line description shown next to the id
    pub description: &'static str,
}

/// Known models; the first entry is the default
pub const MODELS: &[ModelInfo] = &[
    ModelInfo {
        id: "compound-beta",
        description: "Modelo avanzado para respuestas detalladas",
    },
    ModelInfo {
        id: "compound-beta-mini",
        description: "Versión ligera de Compound Beta",
    },
    ModelInfo {
        id: "gemma2-9b-it",
        description: "Modelo eficiente de Google",
    },
    ModelInfo {
        id: "meta-llama/llama-4-scout-17b-16e-instruct",
        description: "Llama 4 optimizado para instrucciones",
    },
];

pub fn default_model() -> &'static str {
    MODELS[0].id
}

pub fn find_model(id: &str) -> Option<&'static ModelInfo> {
    MODELS.iter().find(|m| m.id == id)
}
