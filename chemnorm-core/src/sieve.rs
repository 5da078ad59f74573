//! # Resolvedor em Peneiras (Sieves)
//!
//! Cada menção passa por cinco estratégias de busca, da mais confiável para a
//! menos confiável. A primeira que produzir candidatos no recurso alvo vence:
//!
//! | Nível | Estratégia                                        |
//! |-------|---------------------------------------------------|
//! | 0     | Nome exato                                        |
//! | 1     | Template colapsado                                |
//! | 2     | Template com stemming                             |
//! | 3     | Referências cruzadas a partir do nível 1          |
//! | 4     | Referências cruzadas a partir do nível 2          |
//!
//! Os conjuntos brutos são calculados sob demanda: uma menção resolvida no
//! nível 0 nem chega a calcular seus templates.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::canonicalizer::{self, Template};
use crate::filter::TargetFilter;
use crate::lexicon::{IdSet, Lexicon};

/// Estratégia de busca que produziu os candidatos.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SieveLevel {
    Name,
    CollapsedTemplate,
    StemmedTemplate,
    XrefCollapsed,
    XrefStemmed,
}

impl SieveLevel {
    /// Ordem de avaliação.
    pub const ALL: [SieveLevel; 5] = [
        SieveLevel::Name,
        SieveLevel::CollapsedTemplate,
        SieveLevel::StemmedTemplate,
        SieveLevel::XrefCollapsed,
        SieveLevel::XrefStemmed,
    ];

    /// Número do nível (0..=4).
    pub fn level(self) -> u8 {
        match self {
            SieveLevel::Name => 0,
            SieveLevel::CollapsedTemplate => 1,
            SieveLevel::StemmedTemplate => 2,
            SieveLevel::XrefCollapsed => 3,
            SieveLevel::XrefStemmed => 4,
        }
    }

    fn index(self) -> usize {
        self.level() as usize
    }
}

/// Candidatos de uma menção e o nível que os encontrou.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SieveResult {
    pub candidate_ids: IdSet,
    pub sieve: SieveLevel,
}

impl SieveResult {
    pub fn new(candidate_ids: IdSet, sieve: SieveLevel) -> Self {
        Self { candidate_ids, sieve }
    }

    /// Nenhum nível encontrou candidatos.
    pub fn empty() -> Self {
        Self::new(IdSet::new(), SieveLevel::XrefStemmed)
    }
}

/// Conjuntos de um nível, antes e depois do filtro de recurso alvo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelTrace {
    pub level: SieveLevel,
    pub raw: IdSet,
    pub filtered: IdSet,
}

/// Avaliação completa dos cinco níveis, para diagnóstico.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SieveTrace {
    pub mention: String,
    pub template: Template,
    pub levels: Vec<LevelTrace>,
    pub result: SieveResult,
}

/// Resolve menções contra um léxico, restritas a um recurso alvo.
#[derive(Debug, Clone, Copy)]
pub struct SieveResolver<'a> {
    lexicon: &'a Lexicon,
    filter: &'a TargetFilter,
}

impl<'a> SieveResolver<'a> {
    pub fn new(lexicon: &'a Lexicon, filter: &'a TargetFilter) -> Self {
        Self { lexicon, filter }
    }

    /// Retorna o primeiro nível cujo conjunto filtrado não é vazio.
    pub fn resolve(&self, mention: &str) -> SieveResult {
        let mut probe = Probe::new(self.lexicon, mention);
        for level in SieveLevel::ALL {
            let candidates = self.retain_targets(probe.raw(level));
            if !candidates.is_empty() {
                return SieveResult::new(candidates, level);
            }
        }
        SieveResult::empty()
    }

    /// Calcula todos os níveis. O resultado é sempre igual ao de [`resolve`](Self::resolve).
    pub fn trace(&self, mention: &str) -> SieveTrace {
        let mut probe = Probe::new(self.lexicon, mention);
        let levels: Vec<LevelTrace> = SieveLevel::ALL
            .iter()
            .map(|&level| {
                let raw = probe.raw(level).clone();
                let filtered = self.retain_targets(&raw);
                LevelTrace { level, raw, filtered }
            })
            .collect();

        let result = levels
            .iter()
            .find(|l| !l.filtered.is_empty())
            .map(|l| SieveResult::new(l.filtered.clone(), l.level))
            .unwrap_or_else(SieveResult::empty);

        let template = probe.template().clone();
        debug!(
            mention,
            collapsed = %template.collapsed,
            stemmed = %template.stemmed,
            raw_sizes = ?levels.iter().map(|l| l.raw.len()).collect::<Vec<_>>(),
            sieve = result.sieve.level(),
            candidates = ?result.candidate_ids,
            "LOOKUP"
        );

        SieveTrace {
            mention: mention.to_string(),
            template,
            levels,
            result,
        }
    }

    fn retain_targets(&self, ids: &IdSet) -> IdSet {
        ids.iter()
            .filter(|id| self.filter.accepts(id))
            .cloned()
            .collect()
    }
}

/// Memoiza templates e conjuntos brutos de uma menção.
struct Probe<'a> {
    lexicon: &'a Lexicon,
    mention: &'a str,
    template: Option<Template>,
    sets: [Option<IdSet>; 5],
}

impl<'a> Probe<'a> {
    fn new(lexicon: &'a Lexicon, mention: &'a str) -> Self {
        Self {
            lexicon,
            mention,
            template: None,
            sets: Default::default(),
        }
    }

    fn template(&mut self) -> &Template {
        let mention = self.mention;
        self.template
            .get_or_insert_with(|| canonicalizer::template(mention))
    }

    fn raw(&mut self, level: SieveLevel) -> &IdSet {
        let i = level.index();
        if self.sets[i].is_none() {
            let lexicon = self.lexicon;
            let ids = match level {
                SieveLevel::Name => lexicon
                    .ids_for_name(self.mention)
                    .cloned()
                    .unwrap_or_default(),
                SieveLevel::CollapsedTemplate => {
                    let key = self.template().collapsed.clone();
                    ids_for_names(lexicon, lexicon.names_for_collapsed(&key))
                }
                SieveLevel::StemmedTemplate => {
                    let key = self.template().stemmed.clone();
                    ids_for_names(lexicon, lexicon.names_for_stemmed(&key))
                }
                SieveLevel::XrefCollapsed => {
                    let base = self.raw(SieveLevel::CollapsedTemplate).clone();
                    expand_xrefs(lexicon, &base)
                }
                SieveLevel::XrefStemmed => {
                    let base = self.raw(SieveLevel::StemmedTemplate).clone();
                    expand_xrefs(lexicon, &base)
                }
            };
            self.sets[i] = Some(ids);
        }
        self.sets[i].get_or_insert_with(IdSet::new)
    }
}

/// União dos IDs de todos os nomes de um bucket de template.
fn ids_for_names(lexicon: &Lexicon, names: Option<&BTreeSet<String>>) -> IdSet {
    names
        .into_iter()
        .flatten()
        .filter_map(|name| lexicon.ids_for_name(name))
        .flatten()
        .cloned()
        .collect()
}

/// Vizinhos a um salto no grafo de referências, sem os IDs de partida.
fn expand_xrefs(lexicon: &Lexicon, base: &IdSet) -> IdSet {
    base.iter()
        .filter_map(|id| lexicon.related_ids(id))
        .flatten()
        .filter(|id| !base.contains(*id))
        .cloned()
        .collect()
}
