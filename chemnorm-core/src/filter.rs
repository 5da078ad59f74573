//! # Filtro de Recurso Alvo
//!
//! Cada execução normaliza para um único espaço de identificadores (ex: apenas
//! descritores MeSH, ou apenas ChEBI). O filtro recebe o identificador já
//! separado em `(recurso, acesso)` e decide se ele é um candidato válido.

use std::fmt;
use std::sync::Arc;

use crate::error::{NormError, Result};

/// Separa `RECURSO:ACESSO` no primeiro `:`. Sem `:`, o acesso é vazio.
pub fn split_id(id: &str) -> (&str, &str) {
    id.split_once(':').unwrap_or((id, ""))
}

type Predicate = dyn Fn(&str, &str) -> bool + Send + Sync;

/// Predicado `(recurso, acesso) -> bool` compartilhável entre threads.
#[derive(Clone)]
pub struct TargetFilter {
    name: String,
    predicate: Arc<Predicate>,
}

impl TargetFilter {
    /// Filtro arbitrário fornecido pelo chamador.
    pub fn from_fn<F>(name: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&str, &str) -> bool + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            predicate: Arc::new(predicate),
        }
    }

    /// Descritores e conceitos suplementares MeSH; qualificadores (`Q...`) ficam de fora.
    pub fn mesh() -> Self {
        Self::from_fn("MESH", |resource, accession| {
            resource == "MESH" && !accession.starts_with('Q')
        })
    }

    pub fn chebi() -> Self {
        Self::from_fn("CHEBI", |resource, _| resource == "CHEBI")
    }

    pub fn mondo() -> Self {
        Self::from_fn("MONDO", |resource, _| resource == "MONDO")
    }

    /// Aceita qualquer identificador.
    pub fn any() -> Self {
        Self::from_fn("ANY", |_, _| true)
    }

    /// Resolve o filtro pelo nome do recurso configurado.
    pub fn for_resource(resource: &str) -> Result<Self> {
        match resource.to_ascii_uppercase().as_str() {
            "MESH" => Ok(Self::mesh()),
            "CHEBI" => Ok(Self::chebi()),
            "MONDO" => Ok(Self::mondo()),
            _ => Err(NormError::UnknownTargetResource(resource.to_string())),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Testa um identificador completo.
    pub fn accepts(&self, id: &str) -> bool {
        let (resource, accession) = split_id(id);
        (self.predicate)(resource, accession)
    }
}

impl fmt::Debug for TargetFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TargetFilter").field("name", &self.name).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_id() {
        assert_eq!(split_id("MESH:D001241"), ("MESH", "D001241"));
        assert_eq!(split_id("CHEBI:15365"), ("CHEBI", "15365"));
        assert_eq!(split_id("OBO:NCIT:C123"), ("OBO", "NCIT:C123"));
        assert_eq!(split_id("-"), ("-", ""));
    }

    #[test]
    fn test_mesh_filter_excludes_qualifiers() {
        let filter = TargetFilter::mesh();
        assert!(filter.accepts("MESH:D001241"));
        assert!(filter.accepts("MESH:C017644"));
        assert!(!filter.accepts("MESH:Q000008"));
        assert!(!filter.accepts("CHEBI:15365"));
    }

    #[test]
    fn test_for_resource() {
        assert!(TargetFilter::for_resource("chebi").unwrap().accepts("CHEBI:15365"));
        assert!(TargetFilter::for_resource("MONDO").unwrap().accepts("MONDO:0005015"));
        assert!(matches!(
            TargetFilter::for_resource("UMLS"),
            Err(NormError::UnknownTargetResource(_))
        ));
    }

    #[test]
    fn test_custom_filter() {
        let filter = TargetFilter::from_fn("MESH_D", |r, a| r == "MESH" && a.starts_with('D'));
        assert!(filter.accepts("MESH:D000082"));
        assert!(!filter.accepts("MESH:C000082"));
        assert_eq!(filter.name(), "MESH_D");
    }
}
