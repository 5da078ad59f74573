//! # Configuração de Execução
//!
//! Arquivo JSON com os caminhos dos dicionários e as constantes da execução:
//!
//! ```json
//! {
//!   "unknown_id": "MESH:-",
//!   "target_resource": "MESH",
//!   "entity_type": "Chemical",
//!   "name2ids_filename": "data/name2ids.json",
//!   "id2ids_filename": "data/id2ids.json",
//!   "id2type_filename": "data/id2type.tsv",
//!   "c_template_cache_filename": "cache/c_templates.json",
//!   "p_template_cache_filename": "cache/p_templates.json"
//! }
//! ```
//!
//! Erros de configuração são fatais e detectados por [`NormalizerConfig::validate`]
//! antes de qualquer documento ser processado.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{NormError, Result};
use crate::filter::TargetFilter;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizerConfig {
    /// Sentinela "sem resolução confiável".
    #[serde(default)]
    pub unknown_id: String,
    /// Nome do recurso alvo (`MESH`, `CHEBI`, `MONDO`).
    pub target_resource: String,
    /// Tipo de anotação normalizado por esta execução (ex: `Chemical`).
    pub entity_type: String,
    /// JSON `{nome: [ids]}`.
    pub name2ids_filename: PathBuf,
    /// JSON `{id: [ids relacionados]}`.
    pub id2ids_filename: PathBuf,
    /// TSV `id<TAB>true|false` com os identificadores permitidos na saída.
    pub id2type_filename: PathBuf,
    #[serde(default)]
    pub c_template_cache_filename: Option<PathBuf>,
    #[serde(default)]
    pub p_template_cache_filename: Option<PathBuf>,
}

impl NormalizerConfig {
    /// Lê e valida a configuração.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|e| NormError::io(path, e))?;
        let config: NormalizerConfig =
            serde_json::from_str(&raw).map_err(|e| NormError::json(path, e))?;
        config.validate()?;
        Ok(config)
    }

    /// Checagens fatais de inicialização.
    pub fn validate(&self) -> Result<()> {
        if self.unknown_id.trim().is_empty() {
            return Err(NormError::MissingUnknownId);
        }
        self.target_filter().map(|_| ())
    }

    pub fn target_filter(&self) -> Result<TargetFilter> {
        TargetFilter::for_resource(&self.target_resource)
    }

    /// Caminhos dos dois caches, apenas se ambos estiverem configurados.
    pub fn template_cache_paths(&self) -> Option<(&Path, &Path)> {
        match (&self.c_template_cache_filename, &self.p_template_cache_filename) {
            (Some(c), Some(p)) => Some((c.as_path(), p.as_path())),
            _ => None,
        }
    }
}
