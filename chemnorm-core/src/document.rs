//! # Documentos e Anotações
//!
//! Um documento é um título, um resumo e a lista de menções já reconhecidas
//! (spans). Os offsets são posições em bytes no texto `título + " " + resumo`.

use serde::{Deserialize, Serialize};

/// Uma menção anotada.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    pub start: usize,
    pub end: usize,
    /// Texto de superfície.
    pub text: String,
    /// Tipo da entidade (ex: `Chemical`, `Disease`).
    #[serde(rename = "type")]
    pub entity_type: String,
    /// Forma expandida de uma abreviação, quando conhecida.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expanded: Option<String>,
    /// IDs finais separados por vírgula. Ausente até a normalização.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
}

impl Annotation {
    pub fn new(start: usize, end: usize, text: impl Into<String>, entity_type: impl Into<String>) -> Self {
        Self {
            start,
            end,
            text: text.into(),
            entity_type: entity_type.into(),
            expanded: None,
            identifier: None,
        }
    }

    pub fn with_expansion(mut self, expanded: impl Into<String>) -> Self {
        self.expanded = Some(expanded.into());
        self
    }

    /// Texto usado na busca: a expansão se houver, senão o texto de superfície.
    pub fn lookup_text(&self) -> &str {
        self.expanded.as_deref().unwrap_or(&self.text)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, rename = "abstract")]
    pub abstract_text: String,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
}

impl Document {
    pub fn new(id: impl Into<String>, title: impl Into<String>, abstract_text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            abstract_text: abstract_text.into(),
            annotations: Vec::new(),
        }
    }

    /// Título e resumo unidos por um espaço, base dos offsets.
    pub fn full_text(&self) -> String {
        if self.abstract_text.is_empty() {
            self.title.clone()
        } else {
            format!("{} {}", self.title, self.abstract_text)
        }
    }

    /// Anota a primeira ocorrência de `surface` a partir de `from`.
    ///
    /// Retorna o offset final da menção, ou `None` se o texto não ocorre.
    pub fn annotate(
        &mut self,
        surface: &str,
        entity_type: &str,
        expanded: Option<&str>,
        from: usize,
    ) -> Option<usize> {
        let text = self.full_text();
        let start = from + text.get(from..)?.find(surface)?;
        let end = start + surface.len();
        let mut annotation = Annotation::new(start, end, surface, entity_type);
        if let Some(expanded) = expanded {
            annotation = annotation.with_expansion(expanded);
        }
        self.annotations.push(annotation);
        Some(end)
    }
}
