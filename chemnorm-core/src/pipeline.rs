//! # Pipeline de Normalização — Orquestrador com Eventos Observáveis
//!
//! O pipeline coordena peneiras e desambiguação para um documento inteiro e
//! emite eventos em cada passo via um canal Rust (`mpsc`), permitindo que o
//! servidor WebSocket transmita o progresso em tempo real para o cliente.
//!
//! ## Fluxo
//!
//! 1. Coleta os textos distintos das anotações do tipo configurado.
//! 2. Resolve cada texto expandido distinto nas peneiras.
//! 3. Desambigua no nível do documento.
//! 4. Grava os IDs finais nas anotações; as que ficam sem ID são removidas.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::mpsc;
use std::time::Instant;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, Level};

use crate::config::NormalizerConfig;
use crate::disambiguator::{DocumentDisambiguator, FinalResult, ProcessingPath};
use crate::document::{Annotation, Document};
use crate::error::Result;
use crate::filter::TargetFilter;
use crate::lexicon::{IdSet, Lexicon};
use crate::sieve::{SieveLevel, SieveResolver, SieveResult};

/// Eventos emitidos pelo pipeline durante o processamento de um documento.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum PipelineEvent {
    /// **Passo 1**: Textos de menção distintos coletados.
    MentionsCollected {
        document_id: String,
        annotations: usize,
        distinct_texts: usize,
        distinct_expanded: usize,
    },
    /// **Passo 2**: Resultado das peneiras para um texto expandido.
    SieveResolved {
        text: String,
        sieve: SieveLevel,
        level: u8,
        candidate_ids: IdSet,
    },
    /// **Passo 3**: Decisão final da desambiguação para um texto expandido.
    MentionFinalized {
        text: String,
        path: ProcessingPath,
        codes: Vec<u8>,
        candidate_ids: IdSet,
        names: Vec<String>,
    },
    /// **Passo 4**: Identificador gravado numa anotação (ou anotação removida).
    AnnotationNormalized {
        start: usize,
        end: usize,
        text: String,
        expanded: String,
        identifier: Option<String>,
    },
    /// **Conclusão**: Documento normalizado e resultados por menção.
    Done {
        document: Document,
        mentions: BTreeMap<String, FinalResult>,
        processing_ms: u64,
    },
}

/// O pipeline de normalização.
///
/// É `Sync`: uma instância pode atender várias threads ao mesmo tempo.
///
/// # Modos de Uso
/// - **Sync**: [`normalize_document`](Self::normalize_document) e
///   [`normalize_documents`](Self::normalize_documents).
/// - **Streaming**: [`normalize_streaming`](Self::normalize_streaming) para UIs reativas.
#[derive(Debug, Clone)]
pub struct NormalizationPipeline {
    lexicon: Lexicon,
    filter: TargetFilter,
    entity_type: String,
}

impl NormalizationPipeline {
    pub fn new(lexicon: Lexicon, filter: TargetFilter, entity_type: impl Into<String>) -> Self {
        Self {
            lexicon,
            filter,
            entity_type: entity_type.into(),
        }
    }

    /// Carrega o léxico e o filtro descritos na configuração.
    pub fn from_config(config: &NormalizerConfig) -> Result<Self> {
        config.validate()?;
        let filter = config.target_filter()?;
        let lexicon = Lexicon::load(config)?;
        info!(
            target_resource = filter.name(),
            entity_type = %config.entity_type,
            "Pipeline de normalização pronto"
        );
        Ok(Self::new(lexicon, filter, config.entity_type.clone()))
    }

    pub fn lexicon(&self) -> &Lexicon {
        &self.lexicon
    }

    pub fn filter(&self) -> &TargetFilter {
        &self.filter
    }

    pub fn entity_type(&self) -> &str {
        &self.entity_type
    }

    pub fn resolver(&self) -> SieveResolver<'_> {
        SieveResolver::new(&self.lexicon, &self.filter)
    }

    pub fn disambiguator(&self) -> DocumentDisambiguator<'_> {
        DocumentDisambiguator::new(&self.lexicon)
    }

    /// Nomes de exibição dos IDs, `UNKNOWN` quando o ID não tem nome.
    pub fn display_names(&self, ids: &IdSet) -> Vec<String> {
        ids.iter()
            .map(|id| self.lexicon.preferred_name(id).unwrap_or("UNKNOWN").to_string())
            .collect()
    }

    /// Normaliza um documento no lugar e retorna os resultados por texto expandido.
    pub fn normalize_document(&self, document: &mut Document) -> BTreeMap<String, FinalResult> {
        let (tx, rx) = mpsc::channel();
        self.normalize_streaming(document, tx);

        // Consome todos os eventos até o fim
        let mut mentions = BTreeMap::new();
        while let Ok(event) = rx.recv() {
            if let PipelineEvent::Done {
                document: normalized,
                mentions: finals,
                ..
            } = event
            {
                *document = normalized;
                mentions = finals;
            }
        }
        mentions
    }

    /// Normaliza vários documentos em paralelo.
    pub fn normalize_documents(&self, documents: &mut [Document]) {
        let start = Instant::now();
        documents.par_iter_mut().for_each(|document| {
            self.normalize_document(document);
        });
        info!(
            documents = documents.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Documentos normalizados"
        );
    }

    /// Executa o pipeline enviando eventos de progresso pelo canal `tx`.
    ///
    /// O documento de entrada não é alterado; a versão normalizada segue no
    /// evento `Done`. Um receptor descartado não interrompe o processamento.
    pub fn normalize_streaming(&self, document: &Document, tx: mpsc::Sender<PipelineEvent>) {
        let start = Instant::now();

        // === Passo 1: coleta ===
        // O primeiro texto expandido visto para cada texto de superfície vale para o documento
        let mut text2expanded: HashMap<&str, &str> = HashMap::new();
        let mut selected = 0;
        for annotation in self.selected(&document.annotations) {
            selected += 1;
            text2expanded
                .entry(annotation.text.as_str())
                .or_insert_with(|| annotation.lookup_text());
        }
        let distinct_expanded: BTreeSet<&str> = text2expanded.values().copied().collect();

        let _ = tx.send(PipelineEvent::MentionsCollected {
            document_id: document.id.clone(),
            annotations: selected,
            distinct_texts: text2expanded.len(),
            distinct_expanded: distinct_expanded.len(),
        });

        // === Passo 2: peneiras ===
        let resolver = self.resolver();
        let mut sieved: BTreeMap<String, SieveResult> = BTreeMap::new();
        for &expanded in &distinct_expanded {
            let result = if tracing::enabled!(Level::DEBUG) {
                resolver.trace(expanded).result
            } else {
                resolver.resolve(expanded)
            };
            let _ = tx.send(PipelineEvent::SieveResolved {
                text: expanded.to_string(),
                sieve: result.sieve,
                level: result.sieve.level(),
                candidate_ids: result.candidate_ids.clone(),
            });
            sieved.insert(expanded.to_string(), result);
        }

        // === Passo 3: desambiguação ===
        let finals = self.disambiguator().resolve_document(&sieved);
        for (text, result) in &finals {
            let _ = tx.send(PipelineEvent::MentionFinalized {
                text: text.clone(),
                path: result.path.clone(),
                codes: result.path.codes(),
                candidate_ids: result.candidate_ids.clone(),
                names: self.display_names(&result.candidate_ids),
            });
        }

        // === Passo 4: gravação ===
        let mut normalized = document.clone();
        let mut kept = Vec::with_capacity(normalized.annotations.len());
        for mut annotation in normalized.annotations.drain(..) {
            if annotation.entity_type != self.entity_type {
                kept.push(annotation);
                continue;
            }

            let expanded = text2expanded
                .get(annotation.text.as_str())
                .copied()
                .unwrap_or(annotation.text.as_str())
                .to_string();
            let ids = finals
                .get(&expanded)
                .map(|r| r.candidate_ids.clone())
                .unwrap_or_default();
            let identifier = if ids.is_empty() {
                None
            } else {
                Some(ids.iter().cloned().collect::<Vec<_>>().join(","))
            };

            debug!(
                document_id = %document.id,
                text = %annotation.text,
                expanded = %expanded,
                path = %finals.get(&expanded).map(|r| r.path.to_string()).unwrap_or_default(),
                ids = ?ids,
                names = ?self.display_names(&ids),
                "NORM"
            );

            let _ = tx.send(PipelineEvent::AnnotationNormalized {
                start: annotation.start,
                end: annotation.end,
                text: annotation.text.clone(),
                expanded,
                identifier: identifier.clone(),
            });

            if identifier.is_some() {
                annotation.identifier = identifier;
                kept.push(annotation);
            }
        }
        normalized.annotations = kept;

        let _ = tx.send(PipelineEvent::Done {
            document: normalized,
            mentions: finals,
            processing_ms: start.elapsed().as_millis() as u64,
        });
    }

    fn selected<'d>(&'d self, annotations: &'d [Annotation]) -> impl Iterator<Item = &'d Annotation> + 'd {
        annotations
            .iter()
            .filter(move |a| a.entity_type == self.entity_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::{demo_documents, demo_lexicon, DEMO_ENTITY_TYPE};

    fn pipeline() -> NormalizationPipeline {
        NormalizationPipeline::new(demo_lexicon(), TargetFilter::mesh(), DEMO_ENTITY_TYPE)
    }

    fn doc_with(mentions: &[(&str, Option<&str>)]) -> Document {
        let title = mentions.iter().map(|(m, _)| *m).collect::<Vec<_>>().join(" and ");
        let mut doc = Document::new("t", title, "");
        let mut from = 0;
        for (mention, expanded) in mentions {
            from = doc.annotate(mention, DEMO_ENTITY_TYPE, *expanded, from).unwrap();
        }
        doc
    }

    fn identifier_of<'a>(doc: &'a Document, text: &str) -> Option<&'a str> {
        doc.annotations
            .iter()
            .find(|a| a.text == text)
            .and_then(|a| a.identifier.as_deref())
    }

    #[test]
    fn test_pipeline_basic() {
        let pipeline = pipeline();
        let mut doc = doc_with(&[("Aspirin", None), ("paracetamol", None)]);
        let mentions = pipeline.normalize_document(&mut doc);

        assert_eq!(mentions.len(), 2);
        assert_eq!(identifier_of(&doc, "Aspirin"), Some("MESH:D001241"));
        assert_eq!(identifier_of(&doc, "paracetamol"), Some("MESH:D000082"));
    }

    #[test]
    fn test_context_resolves_abbreviation() {
        let pipeline = pipeline();
        let mut doc = doc_with(&[("pentachlorophenol", None), ("PCP", None)]);
        let mentions = pipeline.normalize_document(&mut doc);

        assert_eq!(identifier_of(&doc, "PCP"), Some("MESH:D010416"));
        assert_eq!(mentions["PCP"].path.codes(), vec![0, 4, 7]);
    }

    #[test]
    fn test_ambiguous_abbreviation_alone_is_unknown() {
        let pipeline = pipeline();
        let mut doc = doc_with(&[("PCP", None)]);
        pipeline.normalize_document(&mut doc);
        assert_eq!(identifier_of(&doc, "PCP"), Some(pipeline.lexicon().unknown_id()));
    }

    #[test]
    fn test_expansion_is_used_for_lookup() {
        let pipeline = pipeline();
        let mut doc = doc_with(&[("ASA", Some("acetylsalicylic acid"))]);
        let mentions = pipeline.normalize_document(&mut doc);

        assert!(mentions.contains_key("acetylsalicylic acid"));
        assert_eq!(identifier_of(&doc, "ASA"), Some("MESH:D001241"));
    }

    #[test]
    fn test_empty_results_are_removed_and_other_types_kept() {
        let pipeline = pipeline();
        let mut doc = doc_with(&[("(+)", None), ("aspirin", None)]);
        doc.annotations.push(Annotation::new(0, 3, "(+)", "Disease"));
        pipeline.normalize_document(&mut doc);

        assert_eq!(doc.annotations.len(), 2);
        assert!(doc.annotations.iter().any(|a| a.entity_type == "Disease" && a.identifier.is_none()));
        assert_eq!(identifier_of(&doc, "aspirin"), Some("MESH:D001241"));
    }

    #[test]
    fn test_disallowed_id_removes_annotation() {
        let pipeline = pipeline();
        let mut doc = doc_with(&[("steroids", None)]);
        pipeline.normalize_document(&mut doc);
        assert!(doc.annotations.is_empty());
    }

    #[test]
    fn test_pipeline_events_streaming() {
        let pipeline = pipeline();
        let doc = doc_with(&[("Aspirin", None), ("PCP", None)]);
        let (tx, rx) = mpsc::channel();
        pipeline.normalize_streaming(&doc, tx);

        let events: Vec<PipelineEvent> = rx.try_iter().collect();
        assert!(
            matches!(&events[0], PipelineEvent::MentionsCollected { distinct_texts: 2, .. }),
            "Primeiro evento deve ser MentionsCollected"
        );
        let sieved = events
            .iter()
            .filter(|e| matches!(e, PipelineEvent::SieveResolved { .. }))
            .count();
        assert_eq!(sieved, 2);
        assert!(
            matches!(events.last().unwrap(), PipelineEvent::Done { .. }),
            "Último evento deve ser Done"
        );
        // Entrada intacta
        assert!(doc.annotations.iter().all(|a| a.identifier.is_none()));
    }

    #[test]
    fn test_event_json_shape() {
        let event = PipelineEvent::SieveResolved {
            text: "aspirin".to_string(),
            sieve: SieveLevel::Name,
            level: 0,
            candidate_ids: IdSet::from(["MESH:D001241".to_string()]),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "SieveResolved");
        assert_eq!(json["data"]["sieve"], "name");
    }

    #[test]
    fn test_normalize_documents_parallel_matches_sequential() {
        let pipeline = pipeline();
        let mut parallel = demo_documents();
        let mut sequential = demo_documents();

        pipeline.normalize_documents(&mut parallel);
        for doc in &mut sequential {
            pipeline.normalize_document(doc);
        }
        assert_eq!(parallel, sequential);
    }

    #[test]
    fn test_document_without_annotations() {
        let pipeline = pipeline();
        let mut doc = Document::new("empty", "Nothing here.", "");
        let mentions = pipeline.normalize_document(&mut doc);
        assert!(mentions.is_empty());
        assert!(doc.annotations.is_empty());
    }
}
