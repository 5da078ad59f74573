//! # Léxico — Índices Imutáveis de Nomes e Identificadores
//!
//! O léxico é construído uma única vez por execução e depois apenas consultado.
//! Ele agrega:
//!
//! - **name2ids**: nome exato → identificadores.
//! - **templates**: template colapsado → nomes e template com stemming → nomes.
//! - **id2ids**: grafo dirigido de referências cruzadas entre vocabulários.
//! - **allowed**: identificadores elegíveis como resposta final (sempre inclui o `unknown_id`).
//!
//! ## Construção
//!
//! ```rust
//! use chemnorm_core::lexicon::{EntityRecord, Lexicon};
//!
//! let mut builder = Lexicon::builder("MESH:-");
//! builder.add_entity(&EntityRecord {
//!     id: "MESH:D001241".to_string(),
//!     names: vec!["aspirin".to_string(), "acetylsalicylic acid".to_string()],
//!     xrefs: vec!["CHEBI:15365".to_string()],
//! });
//! builder.allow("MESH:D001241");
//! let lexicon = builder.build();
//!
//! assert!(lexicon.ids_for_name("aspirin").unwrap().contains("MESH:D001241"));
//! assert!(lexicon.is_allowed("MESH:-"));
//! ```
//!
//! Os buckets de templates podem vir de um cache em disco; o cache apenas
//! economiza tempo de inicialização e nunca altera os resultados.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use std::time::Instant;

use rayon::prelude::*;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::canonicalizer::{template, Template};
use crate::config::NormalizerConfig;
use crate::error::{NormError, Result};

/// Identificador opaco `RECURSO:ACESSO`.
pub type EntityId = String;

/// Conjunto ordenado de identificadores (ordem determinística na saída).
pub type IdSet = BTreeSet<EntityId>;

/// Registro do dicionário de entidades já mesclado.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntityRecord {
    pub id: EntityId,
    #[serde(default)]
    pub names: Vec<String>,
    #[serde(default)]
    pub xrefs: Vec<EntityId>,
}

/// Buckets template → nomes, para as duas variantes de template.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TemplateCache {
    pub collapsed: HashMap<String, BTreeSet<String>>,
    pub stemmed: HashMap<String, BTreeSet<String>>,
}

impl TemplateCache {
    /// Calcula os templates de todos os nomes em paralelo.
    pub fn compute<'a, I>(names: I) -> Self
    where
        I: IntoIterator<Item = &'a String>,
    {
        let names: Vec<&String> = names.into_iter().collect();
        let templates: Vec<(&String, Template)> = names
            .par_iter()
            .map(|name| (*name, template(name)))
            .collect();

        let mut cache = TemplateCache::default();
        for (name, t) in templates {
            cache.collapsed.entry(t.collapsed).or_default().insert(name.clone());
            cache.stemmed.entry(t.stemmed).or_default().insert(name.clone());
        }
        cache
    }

    /// Lê os dois arquivos de cache (`{template: [nomes]}`).
    pub fn load(collapsed_path: &Path, stemmed_path: &Path) -> Result<Self> {
        Ok(Self {
            collapsed: read_json(collapsed_path)?,
            stemmed: read_json(stemmed_path)?,
        })
    }

    pub fn save(&self, collapsed_path: &Path, stemmed_path: &Path) -> Result<()> {
        write_json(collapsed_path, &self.collapsed)?;
        write_json(stemmed_path, &self.stemmed)
    }

    /// Cada nome do dicionário aparece em exatamente um bucket de cada variante,
    /// e nenhum bucket cita um nome fora dele.
    fn covers<V>(&self, names: &HashMap<String, V>) -> bool {
        fn same_names<V>(
            buckets: &HashMap<String, BTreeSet<String>>,
            names: &HashMap<String, V>,
        ) -> bool {
            let mut seen: HashSet<&str> = HashSet::with_capacity(names.len());
            for name in buckets.values().flatten() {
                if !names.contains_key(name) || !seen.insert(name.as_str()) {
                    return false;
                }
            }
            seen.len() == names.len()
        }
        same_names(&self.collapsed, names) && same_names(&self.stemmed, names)
    }
}

/// Contagens do léxico para logs e diagnóstico.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LexiconStats {
    pub names: usize,
    pub named_ids: usize,
    pub xref_sources: usize,
    pub collapsed_templates: usize,
    pub stemmed_templates: usize,
    pub allowed_ids: usize,
}

/// Índices somente-leitura usados pelo resolvedor e pelo desambiguador.
#[derive(Debug, Clone)]
pub struct Lexicon {
    unknown_id: EntityId,
    name2ids: HashMap<String, IdSet>,
    templates: TemplateCache,
    id2ids: HashMap<EntityId, IdSet>,
    allowed: HashSet<EntityId>,
    id2name: HashMap<EntityId, String>,
}

impl Lexicon {
    pub fn builder(unknown_id: impl Into<EntityId>) -> LexiconBuilder {
        LexiconBuilder::new(unknown_id)
    }

    /// Carrega os dicionários descritos na configuração.
    ///
    /// Se ambos os caches de templates existirem eles são usados; caso
    /// contrário os templates são calculados e gravados para a próxima execução.
    pub fn load(config: &NormalizerConfig) -> Result<Self> {
        config.validate()?;
        let mut builder = Lexicon::builder(config.unknown_id.clone());

        let start = Instant::now();
        for id in read_allowed_ids(&config.id2type_filename)? {
            builder.allow(id);
        }
        info!(
            count = builder.allowed.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "IDs permitidos carregados"
        );

        let start = Instant::now();
        let name2ids: HashMap<String, Vec<EntityId>> = read_json(&config.name2ids_filename)?;
        for (name, ids) in &name2ids {
            for id in ids {
                if !id.contains(':') {
                    return Err(NormError::MalformedEntityId(id.clone()));
                }
                builder.add_name(name, id);
            }
        }
        info!(
            count = builder.name2ids.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Mapa nome → IDs carregado"
        );
        drop(name2ids);

        let start = Instant::now();
        let id2ids: HashMap<EntityId, Vec<EntityId>> = read_json(&config.id2ids_filename)?;
        for (from, targets) in &id2ids {
            for to in targets {
                builder.add_xref(from, to);
            }
        }
        info!(
            count = builder.id2ids.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Grafo de referências cruzadas carregado"
        );

        let cache_paths = config.template_cache_paths();
        let mut cache_loaded = false;
        if let Some((c_path, p_path)) = cache_paths {
            if c_path.exists() && p_path.exists() {
                match TemplateCache::load(c_path, p_path) {
                    Ok(cache) => {
                        info!(path = %c_path.display(), "Templates carregados do cache");
                        cache_loaded = builder.with_templates(cache);
                    }
                    Err(e) => warn!(error = %e, "Cache de templates ilegível, recalculando"),
                }
            }
        }

        let lexicon = builder.build();

        if let (Some((c_path, p_path)), false) = (cache_paths, cache_loaded) {
            lexicon.templates.save(c_path, p_path)?;
            info!(path = %c_path.display(), "Cache de templates gravado");
        }

        Ok(lexicon)
    }

    pub fn unknown_id(&self) -> &str {
        &self.unknown_id
    }

    pub fn ids_for_name(&self, name: &str) -> Option<&IdSet> {
        self.name2ids.get(name)
    }

    pub fn names_for_collapsed(&self, template: &str) -> Option<&BTreeSet<String>> {
        self.templates.collapsed.get(template)
    }

    pub fn names_for_stemmed(&self, template: &str) -> Option<&BTreeSet<String>> {
        self.templates.stemmed.get(template)
    }

    /// Vizinhos diretos no grafo de referências cruzadas.
    pub fn related_ids(&self, id: &str) -> Option<&IdSet> {
        self.id2ids.get(id)
    }

    pub fn is_allowed(&self, id: &str) -> bool {
        self.allowed.contains(id)
    }

    pub fn templates(&self) -> &TemplateCache {
        &self.templates
    }

    /// Nome de exibição do identificador (minúsculo).
    pub fn preferred_name(&self, id: &str) -> Option<&str> {
        self.id2name.get(id).map(String::as_str)
    }

    pub fn stats(&self) -> LexiconStats {
        LexiconStats {
            names: self.name2ids.len(),
            named_ids: self.id2name.len(),
            xref_sources: self.id2ids.len(),
            collapsed_templates: self.templates.collapsed.len(),
            stemmed_templates: self.templates.stemmed.len(),
            allowed_ids: self.allowed.len(),
        }
    }
}

/// Acumula entradas do dicionário antes de congelar o [`Lexicon`].
#[derive(Debug, Clone)]
pub struct LexiconBuilder {
    unknown_id: EntityId,
    name2ids: HashMap<String, IdSet>,
    id2ids: HashMap<EntityId, IdSet>,
    allowed: HashSet<EntityId>,
    templates: Option<TemplateCache>,
}

impl LexiconBuilder {
    pub fn new(unknown_id: impl Into<EntityId>) -> Self {
        Self {
            unknown_id: unknown_id.into(),
            name2ids: HashMap::new(),
            id2ids: HashMap::new(),
            allowed: HashSet::new(),
            templates: None,
        }
    }

    /// Associa um nome a um identificador. Espaços são normalizados e nomes vazios ignorados.
    pub fn add_name(&mut self, name: &str, id: &str) {
        let name = normalize_whitespace(name);
        if name.is_empty() {
            return;
        }
        self.name2ids.entry(name).or_default().insert(id.to_string());
    }

    /// Aresta dirigida `from → to` no grafo de referências cruzadas.
    pub fn add_xref(&mut self, from: &str, to: &str) {
        self.id2ids
            .entry(from.to_string())
            .or_default()
            .insert(to.to_string());
    }

    pub fn add_entity(&mut self, record: &EntityRecord) {
        for name in &record.names {
            self.add_name(name, &record.id);
        }
        for xref in &record.xrefs {
            self.add_xref(&record.id, xref);
        }
    }

    pub fn allow(&mut self, id: impl Into<EntityId>) {
        self.allowed.insert(id.into());
    }

    /// Usa buckets pré-calculados. Um cache que não cobre exatamente os nomes
    /// atuais é descartado; retorna se o cache foi aceito.
    pub fn with_templates(&mut self, cache: TemplateCache) -> bool {
        if cache.covers(&self.name2ids) {
            self.templates = Some(cache);
            true
        } else {
            warn!(names = self.name2ids.len(), "Cache de templates desatualizado, descartado");
            false
        }
    }

    pub fn build(self) -> Lexicon {
        let LexiconBuilder {
            unknown_id,
            name2ids,
            id2ids,
            mut allowed,
            templates,
        } = self;

        allowed.insert(unknown_id.clone());

        let templates = templates.unwrap_or_else(|| {
            let start = Instant::now();
            let cache = TemplateCache::compute(name2ids.keys());
            info!(
                collapsed = cache.collapsed.len(),
                stemmed = cache.stemmed.len(),
                elapsed_ms = start.elapsed().as_millis() as u64,
                "Templates calculados"
            );
            cache
        });

        let id2name = preferred_names(&name2ids);

        Lexicon {
            unknown_id,
            name2ids,
            templates,
            id2ids,
            allowed,
            id2name,
        }
    }
}

/// Para cada ID escolhe, entre seus nomes em minúsculas, aquele compartilhado
/// pelo maior número de IDs. Empates ficam com o menor nome lexicográfico.
fn preferred_names(name2ids: &HashMap<String, IdSet>) -> HashMap<EntityId, String> {
    let mut lower2ids: HashMap<String, HashSet<&str>> = HashMap::new();
    for (name, ids) in name2ids {
        lower2ids
            .entry(name.to_lowercase())
            .or_default()
            .extend(ids.iter().map(String::as_str));
    }

    let mut best: HashMap<EntityId, (usize, String)> = HashMap::new();
    for (lower, ids) in &lower2ids {
        let count = ids.len();
        for id in ids {
            match best.get_mut(*id) {
                Some(entry) => {
                    if count > entry.0 || (count == entry.0 && *lower < entry.1) {
                        *entry = (count, lower.clone());
                    }
                }
                None => {
                    best.insert(id.to_string(), (count, lower.clone()));
                }
            }
        }
    }

    best.into_iter().map(|(id, (_, name))| (id, name)).collect()
}

fn normalize_whitespace(name: &str) -> String {
    name.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// TSV `id<TAB>true|false`; retorna apenas os IDs marcados como `true`.
fn read_allowed_ids(path: &Path) -> Result<Vec<EntityId>> {
    let file = File::open(path).map_err(|e| NormError::io(path, e))?;
    let mut allowed = Vec::new();
    for (i, line) in BufReader::new(file).lines().enumerate() {
        let line = line.map_err(|e| NormError::io(path, e))?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < 2 {
            return Err(NormError::MalformedAllowedLine {
                path: path.to_path_buf(),
                line: i + 1,
                content: line.to_string(),
            });
        }
        if fields[1].trim().eq_ignore_ascii_case("true") {
            allowed.push(fields[0].to_string());
        }
    }
    Ok(allowed)
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let file = File::open(path).map_err(|e| NormError::io(path, e))?;
    serde_json::from_reader(BufReader::new(file)).map_err(|e| NormError::json(path, e))
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let file = File::create(path).map_err(|e| NormError::io(path, e))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value).map_err(|e| NormError::json(path, e))?;
    writer.flush().map_err(|e| NormError::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn small_lexicon() -> Lexicon {
        let mut builder = Lexicon::builder("MESH:-");
        builder.add_name("Aspirin", "MESH:D001241");
        builder.add_name("aspirin", "MESH:D001241");
        builder.add_name("aspirin", "CHEBI:15365");
        builder.add_name("  acetylsalicylic   acid ", "MESH:D001241");
        builder.add_name("   ", "MESH:D999999");
        builder.add_xref("CHEBI:15365", "MESH:D001241");
        builder.allow("MESH:D001241");
        builder.build()
    }

    #[test]
    fn test_names_are_whitespace_normalized() {
        let lexicon = small_lexicon();
        assert!(lexicon.ids_for_name("acetylsalicylic acid").is_some());
        assert!(lexicon.ids_for_name("").is_none());
        assert_eq!(lexicon.stats().names, 3);
    }

    #[test]
    fn test_template_buckets() {
        let lexicon = small_lexicon();
        let bucket = lexicon.names_for_collapsed("aspirin").unwrap();
        assert!(bucket.contains("Aspirin"));
        assert!(bucket.contains("aspirin"));
        assert!(lexicon.names_for_stemmed("acetylsalicylicacid").is_some());
    }

    #[test]
    fn test_unknown_id_always_allowed() {
        let lexicon = small_lexicon();
        assert!(lexicon.is_allowed("MESH:-"));
        assert!(lexicon.is_allowed("MESH:D001241"));
        assert!(!lexicon.is_allowed("CHEBI:15365"));
        assert_eq!(lexicon.unknown_id(), "MESH:-");
    }

    #[test]
    fn test_xref_graph_is_directed() {
        let lexicon = small_lexicon();
        assert!(lexicon.related_ids("CHEBI:15365").unwrap().contains("MESH:D001241"));
        assert!(lexicon.related_ids("MESH:D001241").is_none());
    }

    #[test]
    fn test_preferred_name_picks_most_shared_lowercase() {
        let lexicon = small_lexicon();
        // "aspirin" é compartilhado por dois IDs; "acetylsalicylic acid" por um
        assert_eq!(lexicon.preferred_name("MESH:D001241"), Some("aspirin"));
        assert_eq!(lexicon.preferred_name("CHEBI:15365"), Some("aspirin"));
        assert_eq!(lexicon.preferred_name("MESH:D000000"), None);
    }

    #[test]
    fn test_stale_cache_is_rejected() {
        let mut builder = Lexicon::builder("MESH:-");
        builder.add_name("aspirin", "MESH:D001241");
        builder.add_name("ibuprofen", "MESH:D007052");
        let stale = TemplateCache::compute(&["aspirin".to_string()]);
        assert!(!builder.with_templates(stale));
        let lexicon = builder.build();
        assert!(lexicon.names_for_collapsed("ibuprofen").is_some());
    }

    #[test]
    fn test_cache_with_same_count_but_other_names_is_rejected() {
        let mut builder = Lexicon::builder("MESH:-");
        builder.add_name("ibuprofen", "MESH:D007052");
        let other = TemplateCache::compute(&["aspirin".to_string()]);
        assert!(!builder.with_templates(other));

        let current = TemplateCache::compute(&["ibuprofen".to_string()]);
        assert!(builder.with_templates(current));
    }

    fn write_dictionary(dir: &Path, name2ids: &str) -> NormalizerConfig {
        let name2ids_path = dir.join("name2ids.json");
        let id2ids = dir.join("id2ids.json");
        let allowed = dir.join("id2type.tsv");
        fs::write(&name2ids_path, name2ids).unwrap();
        fs::write(&id2ids, "{}").unwrap();
        fs::write(&allowed, "MESH:D001241\ttrue\nMESH:D007052\ttrue\n").unwrap();

        NormalizerConfig {
            unknown_id: "MESH:-".to_string(),
            target_resource: "MESH".to_string(),
            entity_type: "Chemical".to_string(),
            name2ids_filename: name2ids_path,
            id2ids_filename: id2ids,
            id2type_filename: allowed,
            c_template_cache_filename: Some(dir.join("c_templates.json")),
            p_template_cache_filename: Some(dir.join("p_templates.json")),
        }
    }

    #[test]
    fn test_reload_after_dictionary_change_ignores_old_cache() {
        let dir = tempfile::tempdir().unwrap();
        let config = write_dictionary(dir.path(), r#"{"aspirin": ["MESH:D001241"]}"#);
        Lexicon::load(&config).unwrap();

        // Mesmo número de nomes, nomes diferentes
        let config = write_dictionary(dir.path(), r#"{"ibuprofen": ["MESH:D007052"]}"#);
        let cached = Lexicon::load(&config).unwrap();
        let mut fresh = Lexicon::builder("MESH:-");
        fresh.add_name("ibuprofen", "MESH:D007052");
        fresh.allow("MESH:D007052");
        let fresh = fresh.build();

        assert_eq!(cached.templates(), fresh.templates());
        let filter = crate::filter::TargetFilter::mesh();
        let with_cache = crate::sieve::SieveResolver::new(&cached, &filter).resolve("Ibuprofen");
        let without_cache = crate::sieve::SieveResolver::new(&fresh, &filter).resolve("Ibuprofen");
        assert_eq!(with_cache, without_cache);
        assert!(with_cache.candidate_ids.contains("MESH:D007052"));

        // O cache regravado já corresponde ao dicionário atual
        let (c_path, p_path) = config.template_cache_paths().unwrap();
        assert_eq!(&TemplateCache::load(c_path, p_path).unwrap(), fresh.templates());
    }

    #[test]
    fn test_unreadable_cache_is_rebuilt() {
        let dir = tempfile::tempdir().unwrap();
        let config = write_dictionary(dir.path(), r#"{"aspirin": ["MESH:D001241"]}"#);
        let (c_path, p_path) = config.template_cache_paths().unwrap();
        fs::write(c_path, "not json").unwrap();
        fs::write(p_path, "{}").unwrap();

        let lexicon = Lexicon::load(&config).unwrap();
        assert!(lexicon.names_for_collapsed("aspirin").is_some());
        let rewritten = TemplateCache::load(c_path, p_path).unwrap();
        assert_eq!(&rewritten, lexicon.templates());
    }

    #[test]
    fn test_load_from_files_and_cache_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let name2ids = dir.path().join("name2ids.json");
        let id2ids = dir.path().join("id2ids.json");
        let allowed = dir.path().join("id2type.tsv");
        let c_cache = dir.path().join("c_templates.json");
        let p_cache = dir.path().join("p_templates.json");

        fs::write(
            &name2ids,
            r#"{"aspirin": ["MESH:D001241"], "Statins": ["MESH:D019161"]}"#,
        )
        .unwrap();
        fs::write(&id2ids, r#"{"CHEBI:15365": ["MESH:D001241"]}"#).unwrap();
        fs::write(&allowed, "MESH:D001241\tTrue\nMESH:D019161\tfalse\n\n").unwrap();

        let config = NormalizerConfig {
            unknown_id: "MESH:-".to_string(),
            target_resource: "MESH".to_string(),
            entity_type: "Chemical".to_string(),
            name2ids_filename: name2ids,
            id2ids_filename: id2ids,
            id2type_filename: allowed,
            c_template_cache_filename: Some(c_cache.clone()),
            p_template_cache_filename: Some(p_cache.clone()),
        };

        let first = Lexicon::load(&config).unwrap();
        assert!(c_cache.exists() && p_cache.exists());
        assert!(first.is_allowed("MESH:D001241"));
        assert!(!first.is_allowed("MESH:D019161"));

        // Segunda carga usa o cache e produz os mesmos buckets
        let second = Lexicon::load(&config).unwrap();
        assert_eq!(first.templates(), second.templates());
        assert_eq!(first.stats(), second.stats());
    }

    #[test]
    fn test_malformed_allowed_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("id2type.tsv");
        fs::write(&path, "MESH:D001241 true\n").unwrap();
        assert!(matches!(
            read_allowed_ids(&path),
            Err(NormError::MalformedAllowedLine { line: 1, .. })
        ));
    }

    #[test]
    fn test_malformed_entity_id_in_dictionary() {
        let dir = tempfile::tempdir().unwrap();
        let name2ids = dir.path().join("name2ids.json");
        let id2ids = dir.path().join("id2ids.json");
        let allowed = dir.path().join("id2type.tsv");
        fs::write(&name2ids, r#"{"aspirin": ["D001241"]}"#).unwrap();
        fs::write(&id2ids, "{}").unwrap();
        fs::write(&allowed, "").unwrap();

        let config = NormalizerConfig {
            unknown_id: "MESH:-".to_string(),
            target_resource: "MESH".to_string(),
            entity_type: "Chemical".to_string(),
            name2ids_filename: name2ids,
            id2ids_filename: id2ids,
            id2type_filename: allowed,
            c_template_cache_filename: None,
            p_template_cache_filename: None,
        };
        assert!(matches!(
            Lexicon::load(&config),
            Err(NormError::MalformedEntityId(id)) if id == "D001241"
        ));
    }
}
