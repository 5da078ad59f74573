//! # chemnorm-core — Normalização de Entidades Químicas e Biomédicas
//!
//! Este crate associa menções de entidades (texto livre já reconhecido num
//! documento) a identificadores de vocabulários curados como MeSH, ChEBI e
//! MONDO. A busca usa uma cascata de comparações aproximadas e o contexto do
//! documento para resolver ambiguidades.
//!
//! ## Arquitetura do Sistema
//!
//! O dado flui em estágios, cada um consumindo o resultado do anterior:
//!
//! 1.  **Entrada**: [`Document`] com anotações (spans) de um tipo de entidade.
//! 2.  **Canonicalização** ([`canonicalizer`]): cada nome vira um par de
//!     templates (colapsado e com stemming) após a conversão para ASCII ([`ascii`]).
//! 3.  **Peneiras** ([`sieve`]): cinco níveis de busca no [`Lexicon`], do nome
//!     exato até referências cruzadas, restritos ao recurso alvo ([`filter`]).
//! 4.  **Desambiguação** ([`disambiguator`]): três passadas sobre todas as
//!     menções do documento, registrando o caminho de cada decisão.
//! 5.  **Saída**: anotações com no máximo um identificador cada.
//!
//! ## Exemplo de Uso
//!
//! ```rust
//! use chemnorm_core::corpus::{demo_documents, demo_lexicon, DEMO_ENTITY_TYPE};
//! use chemnorm_core::{NormalizationPipeline, TargetFilter};
//!
//! // 1. Monta o pipeline com o léxico de demonstração
//! let pipeline = NormalizationPipeline::new(demo_lexicon(), TargetFilter::mesh(), DEMO_ENTITY_TYPE);
//!
//! // 2. Normaliza um documento no lugar
//! let mut doc = demo_documents().remove(0);
//! let mentions = pipeline.normalize_document(&mut doc);
//!
//! // 3. Exibe os identificadores atribuídos
//! for annotation in &doc.annotations {
//!     println!("{} -> {:?}", annotation.text, annotation.identifier);
//! }
//! assert_eq!(mentions["Aspirin"].candidate_ids.len(), 1);
//! ```
//!
//! ## Módulos Principais
//!
//! - [`pipeline`]: Orquestrador que conecta todos os estágios e emite eventos.
//! - [`lexicon`]: Índices imutáveis e carregamento a partir de arquivos.
//! - [`config`]: Configuração da execução.
//! - [`corpus`]: Léxico e documentos de demonstração.

pub mod ascii;
pub mod canonicalizer;
pub mod config;
pub mod corpus;
pub mod disambiguator;
pub mod document;
pub mod error;
pub mod filter;
pub mod lexicon;
pub mod pipeline;
pub mod sieve;

pub use config::NormalizerConfig;
pub use disambiguator::{DocumentDisambiguator, FinalResult, PathCode, ProcessingPath};
pub use document::{Annotation, Document};
pub use error::{NormError, Result};
pub use filter::TargetFilter;
pub use lexicon::{EntityId, IdSet, Lexicon, LexiconBuilder};
pub use pipeline::{NormalizationPipeline, PipelineEvent};
pub use sieve::{SieveLevel, SieveResolver, SieveResult, SieveTrace};
