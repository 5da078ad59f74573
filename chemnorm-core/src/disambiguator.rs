//! # Desambiguação no Nível do Documento
//!
//! Recebe o resultado das peneiras para cada texto de menção distinto de um
//! documento e decide o conjunto final de identificadores em três passadas
//! completas, cada uma vendo o estado deixado pela anterior:
//!
//! 1. **Classificação**: sem letras, sem candidatos, um candidato ou vários.
//!    Os IDs das menções não ambíguas formam o contexto do documento.
//! 2. **Contexto**: menções ambíguas ficam com a interseção entre seus
//!    candidatos e o contexto, quando ela não é vazia.
//! 3. **Permitidos**: remove IDs fora da lista de permitidos; o que sobrar
//!    com mais de um ID vira desconhecido.
//!
//! Cada decisão fica registrada no [`ProcessingPath`] da menção.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::lexicon::{IdSet, Lexicon};
use crate::sieve::SieveResult;

/// Passo registrado no caminho de processamento de uma menção.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathCode {
    /// Consulta inicial às peneiras.
    Lookup,
    /// Texto sem nenhuma letra ASCII.
    FilteredEmptyText,
    NoMatch,
    Unambiguous,
    Ambiguous,
    /// Passada 2: já estava resolvida.
    AlreadyUnambiguous,
    /// Passada 2: sem interseção com o contexto, mantém os candidatos.
    UnresolvedAmbiguous,
    ResolvedByContext,
    /// Passada 3: algum ID fora da lista de permitidos foi removido.
    AllowedFiltered,
    /// Passada 3: ainda restam vários IDs, vira desconhecida.
    StillAmbiguousAfterFilter,
}

impl PathCode {
    /// Código numérico estável (0..=9) usado nos logs.
    pub fn code(self) -> u8 {
        match self {
            PathCode::Lookup => 0,
            PathCode::FilteredEmptyText => 1,
            PathCode::NoMatch => 2,
            PathCode::Unambiguous => 3,
            PathCode::Ambiguous => 4,
            PathCode::AlreadyUnambiguous => 5,
            PathCode::UnresolvedAmbiguous => 6,
            PathCode::ResolvedByContext => 7,
            PathCode::AllowedFiltered => 8,
            PathCode::StillAmbiguousAfterFilter => 9,
        }
    }
}

/// Sequência de decisões tomadas para uma menção. Sempre começa com [`PathCode::Lookup`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessingPath(Vec<PathCode>);

impl ProcessingPath {
    pub fn new() -> Self {
        Self(vec![PathCode::Lookup])
    }

    pub fn push(&mut self, step: PathCode) {
        self.0.push(step);
    }

    pub fn steps(&self) -> &[PathCode] {
        &self.0
    }

    pub fn codes(&self) -> Vec<u8> {
        self.0.iter().map(|s| s.code()).collect()
    }

    pub fn last(&self) -> PathCode {
        self.0.last().copied().unwrap_or(PathCode::Lookup)
    }
}

impl Default for ProcessingPath {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ProcessingPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let codes: Vec<String> = self.0.iter().map(|s| s.code().to_string()).collect();
        write!(f, "[{}]", codes.join(", "))
    }
}

/// Resultado final de uma menção: no máximo um identificador.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalResult {
    pub path: ProcessingPath,
    pub candidate_ids: IdSet,
}

/// `true` se o texto tem pelo menos uma letra ASCII (`[A-Za-z]`).
pub fn has_ascii_letter(text: &str) -> bool {
    text.bytes().any(|b| b.is_ascii_alphabetic())
}

/// Aplica as três passadas a um documento.
#[derive(Debug, Clone, Copy)]
pub struct DocumentDisambiguator<'a> {
    lexicon: &'a Lexicon,
}

impl<'a> DocumentDisambiguator<'a> {
    pub fn new(lexicon: &'a Lexicon) -> Self {
        Self { lexicon }
    }

    pub fn resolve_document(
        &self,
        mentions: &BTreeMap<String, SieveResult>,
    ) -> BTreeMap<String, FinalResult> {
        let unknown = IdSet::from([self.lexicon.unknown_id().to_string()]);

        // Passada 1: classificação e contexto do documento
        let mut context = IdSet::new();
        let mut states: BTreeMap<String, FinalResult> = BTreeMap::new();
        for (text, sieve) in mentions {
            let mut path = ProcessingPath::new();
            let candidate_ids = if !has_ascii_letter(text) {
                path.push(PathCode::FilteredEmptyText);
                IdSet::new()
            } else if sieve.candidate_ids.is_empty() {
                path.push(PathCode::NoMatch);
                unknown.clone()
            } else if sieve.candidate_ids.len() == 1 {
                path.push(PathCode::Unambiguous);
                context.extend(sieve.candidate_ids.iter().cloned());
                sieve.candidate_ids.clone()
            } else {
                path.push(PathCode::Ambiguous);
                sieve.candidate_ids.clone()
            };
            states.insert(text.clone(), FinalResult { path, candidate_ids });
        }

        // Passada 2: apenas menções que tiveram candidatos na passada 1
        for state in states.values_mut() {
            match state.path.last() {
                PathCode::Unambiguous => state.path.push(PathCode::AlreadyUnambiguous),
                PathCode::Ambiguous => {
                    let overlap: IdSet = state
                        .candidate_ids
                        .intersection(&context)
                        .cloned()
                        .collect();
                    if overlap.is_empty() {
                        state.path.push(PathCode::UnresolvedAmbiguous);
                    } else {
                        state.path.push(PathCode::ResolvedByContext);
                        state.candidate_ids = overlap;
                    }
                }
                _ => {}
            }
        }

        // Passada 3: todas as menções; vazio e desconhecido passam sem alteração
        for state in states.values_mut() {
            let before = state.candidate_ids.len();
            state.candidate_ids.retain(|id| self.lexicon.is_allowed(id));
            if state.candidate_ids.len() != before {
                state.path.push(PathCode::AllowedFiltered);
            }
            if state.candidate_ids.len() > 1 {
                state.path.push(PathCode::StillAmbiguousAfterFilter);
                state.candidate_ids = unknown.clone();
            }
        }

        debug!(
            mentions = states.len(),
            context = context.len(),
            "Documento desambiguado"
        );
        states
    }
}
