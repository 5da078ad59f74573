//! # Canonicalizador — Templates de Nomes
//!
//! Reduz qualquer nome a duas chaves de comparação aproximada:
//!
//! - **collapsed**: ASCII, minúsculas, pontuação colapsada e espaços removidos
//!   entre letras/dígitos (exceto dígito-dígito).
//! - **stemmed**: igual, mas com cada palavra passando pelo `s_stem` antes da
//!   compactação final.
//!
//! ## Exemplo
//!
//! ```rust
//! use chemnorm_core::canonicalizer::template;
//!
//! let t = template("1,25α-Dihydroxyvitamins D3");
//! assert_eq!(t.collapsed, "1 25alphadihydroxyvitaminsd3");
//! assert_eq!(t.stemmed, "1 25alphadihydroxyvitamind3");
//! ```
//!
//! A separação em dois passos existe porque a quebra em palavras é necessária
//! para o stemming, mas a chave final precisa ser compacta: nomenclatura
//! química mistura letras e dígitos sem separadores consistentes.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::ascii::fold_to_ascii;

/// Par de templates derivado de um nome.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Template {
    pub collapsed: String,
    pub stemmed: String,
}

fn non_alphanumeric() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new("[^a-z0-9]+").expect("regex estática válida"))
}

/// Calcula os dois templates de um nome.
pub fn template(name: &str) -> Template {
    let raw = collapse(name);
    let stemmed_raw = stem_all(&raw);

    let collapsed = compact(&raw);
    // Stemming sem efeito: reaproveita a mesma compactação
    let stemmed = if stemmed_raw == raw {
        collapsed.clone()
    } else {
        compact(&stemmed_raw)
    };

    Template { collapsed, stemmed }
}

/// Forma colapsada "crua": ASCII, minúsculas, tokens `[a-z0-9]+` separados por
/// um único espaço.
pub fn collapse(name: &str) -> String {
    let lower = fold_to_ascii(name).to_ascii_lowercase();
    let spaced = non_alphanumeric().replace_all(&lower, " ");
    spaced.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Aplica `s_stem` a cada palavra de uma forma colapsada.
///
/// Assume espaços já normalizados (um único espaço entre palavras).
pub fn stem_all(collapsed: &str) -> String {
    collapsed
        .split(' ')
        .map(s_stem)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Stemmer heurístico de plurais em inglês.
///
/// A entrada já deve estar em minúsculas. A ordem dos testes é relevante:
/// os buckets do léxico são pré-calculados com exatamente estas regras.
///
/// | Terminação                          | Resultado       |
/// |-------------------------------------|-----------------|
/// | não termina em `s`                  | inalterado      |
/// | `ies` (exceto `eies`, `aies`)       | `ies` → `y`     |
/// | `es` (exceto `aes`, `ees`, `oes`)   | `es` → `e`      |
/// | `s` (exceto `us`, `ss`)             | remove o `s`    |
/// | demais                              | inalterado      |
pub fn s_stem(word: &str) -> String {
    if !word.ends_with('s') {
        return word.to_string();
    }
    if word.ends_with("ies") && !word.ends_with("eies") && !word.ends_with("aies") {
        return format!("{}y", &word[..word.len() - 3]);
    }
    if word.ends_with("es") && !word.ends_with("aes") && !word.ends_with("ees") && !word.ends_with("oes") {
        return word[..word.len() - 1].to_string();
    }
    if !word.ends_with("us") && !word.ends_with("ss") {
        return word[..word.len() - 1].to_string();
    }
    word.to_string()
}

/// Remove o espaço entre letra-letra, letra-dígito e dígito-letra.
///
/// A decisão é tomada sobre os vizinhos originais de cada espaço, então
/// sequências como `"a b c"` viram `"abc"`; apenas dígito-dígito mantém o espaço.
fn compact(collapsed: &str) -> String {
    let chars: Vec<char> = collapsed.chars().collect();
    let mut out = String::with_capacity(collapsed.len());

    for (i, &ch) in chars.iter().enumerate() {
        if ch == ' ' && i > 0 && i + 1 < chars.len() {
            let prev = chars[i - 1];
            let next = chars[i + 1];
            let joinable = prev.is_ascii_alphanumeric()
                && next.is_ascii_alphanumeric()
                && !(prev.is_ascii_digit() && next.is_ascii_digit());
            if joinable {
                continue;
            }
        }
        out.push(ch);
    }

    out
}
