//! # Erros do Normalizador
//!
//! A resolução em si é uma função pura e nunca falha. Erros só aparecem na
//! inicialização: leitura de dicionários, configuração inválida ou
//! identificadores mal formados. Todos são fatais antes do primeiro documento.

use std::path::PathBuf;

use thiserror::Error;

/// Erros de construção do léxico e de configuração.
#[derive(Debug, Error)]
pub enum NormError {
    #[error("Falha de I/O em {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON inválido em {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Configuração sem unknown_id")]
    MissingUnknownId,

    #[error("Recurso alvo desconhecido: '{0}' (suportados: MESH, CHEBI, MONDO)")]
    UnknownTargetResource(String),

    #[error("Linha {line} de {path} mal formada: '{content}'")]
    MalformedAllowedLine {
        path: PathBuf,
        line: usize,
        content: String,
    },

    #[error("Identificador mal formado: '{0}' (esperado RECURSO:ACESSO)")]
    MalformedEntityId(String),
}

/// Atalho para resultados do crate.
pub type Result<T> = std::result::Result<T, NormError>;

impl NormError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        NormError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        NormError::Json {
            path: path.into(),
            source,
        }
    }
}
