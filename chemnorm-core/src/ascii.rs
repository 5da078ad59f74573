//! # Dobramento Unicode → ASCII
//!
//! Nomenclatura química chega com letras gregas, hífens tipográficos, espaços
//! finos, sinais de marca registrada e, ocasionalmente, letras cirílicas que
//! se passam por latinas ("Nа2CO3" com um `а` cirílico). Antes de qualquer
//! comparação o texto é reduzido a ASCII de forma determinística.
//!
//! ## Regras
//!
//! | Entrada                  | Saída                         |
//! |--------------------------|-------------------------------|
//! | Letra grega (`α`, `Β`)   | Nome por extenso (`alpha`, `Beta`), separado por espaço de letras vizinhas |
//! | Cirílico parecido        | Letra latina análoga (`а` → `a`) |
//! | Letra acentuada          | Letra base (`ö` → `o`)        |
//! | Aspas, hífens, espaços   | Equivalente ASCII             |
//! | `™`                      | Removido (vira separador)     |
//! | `·`, `±`, `©`, `®`, `→`  | `*`, `+-`, `(c)`, `(r)`, `-`  |
//!
//! Qualquer outro caractere passa pela decomposição NFKD e mantém apenas a
//! parte ASCII; se nada sobrar, é descartado. A função é total.
//!
//! ```rust
//! use chemnorm_core::ascii::fold_to_ascii;
//!
//! assert_eq!(fold_to_ascii("1,25α-dihydroxyvitamin D3"), "1,25alpha-dihydroxyvitamin D3");
//! assert_eq!(fold_to_ascii("NF-κB"), "NF-kappa B");
//! ```

use unicode_normalization::UnicodeNormalization;

/// Como um caractere não-ASCII deve ser reescrito.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Fold {
    /// Substituição literal (pode ser vazia).
    Text(&'static str),
    /// Letra grega por extenso, com espaçamento em relação a letras vizinhas.
    Greek(&'static str),
    /// Símbolo suprimido que ainda separa as palavras ao redor.
    Separator,
    /// Sem regra explícita: decomposição NFKD.
    Decompose,
}

/// Converte qualquer string para ASCII puro.
pub fn fold_to_ascii(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());

    for (i, &ch) in chars.iter().enumerate() {
        if ch.is_ascii() {
            out.push(ch);
            continue;
        }
        let next = chars.get(i + 1).copied();
        match fold_char(ch) {
            Fold::Text(s) => out.push_str(s),
            Fold::Greek(name) => {
                if out.ends_with(|c: char| c.is_ascii_alphabetic()) {
                    out.push(' ');
                }
                out.push_str(name);
                if next.map_or(false, char::is_alphabetic) {
                    out.push(' ');
                }
            }
            Fold::Separator => {
                let after_word = !out.is_empty() && !out.ends_with(char::is_whitespace);
                let before_word = next.map_or(false, |c| !c.is_whitespace());
                if after_word && before_word {
                    out.push(' ');
                }
            }
            Fold::Decompose => {
                out.extend(std::iter::once(ch).nfkd().filter(char::is_ascii));
            }
        }
    }

    out
}

fn fold_char(ch: char) -> Fold {
    if let Some(name) = greek_name(ch) {
        return Fold::Greek(name);
    }
    if let Some(latin) = cyrillic_lookalike(ch) {
        return Fold::Text(latin);
    }
    match ch {
        // Espaços tipográficos
        '\u{00A0}' | '\u{2000}'..='\u{200A}' | '\u{202F}' | '\u{205F}' | '\u{3000}' => Fold::Text(" "),
        // Caracteres invisíveis
        '\u{00AD}' | '\u{200B}'..='\u{200D}' | '\u{2060}' | '\u{FEFF}' => Fold::Text(""),
        // Hífens e travessões
        '\u{2010}'..='\u{2013}' | '\u{2212}' | '\u{FE63}' | '\u{FF0D}' => Fold::Text("-"),
        '\u{2014}' | '\u{2015}' | '\u{2043}' => Fold::Text("--"),
        // Aspas e primos
        '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{201B}' | '\u{2032}' => Fold::Text("'"),
        '\u{2035}' => Fold::Text("`"),
        '\u{201C}' | '\u{201D}' | '\u{201E}' | '\u{201F}' => Fold::Text("\""),
        '\u{2033}' => Fold::Text("''"),
        '\u{2036}' => Fold::Text("``"),
        '\u{2034}' => Fold::Text("'''"),
        // Símbolos
        '\u{00B7}' | '\u{2022}' | '\u{2219}' | '\u{22C5}' => Fold::Text("*"),
        '\u{00B1}' => Fold::Text("+-"),
        '\u{2213}' => Fold::Text("-+"),
        '\u{00D7}' => Fold::Text("x"),
        '\u{00A9}' => Fold::Text("(c)"),
        '\u{00AE}' => Fold::Text("(r)"),
        '\u{2192}' | '\u{2190}' | '\u{2194}' => Fold::Text("-"),
        '\u{2122}' | '\u{2120}' => Fold::Separator,
        // Letras latinas sem decomposição canônica
        'ł' => Fold::Text("l"),
        'Ł' => Fold::Text("L"),
        'ø' => Fold::Text("o"),
        'Ø' => Fold::Text("O"),
        'đ' => Fold::Text("d"),
        'Đ' => Fold::Text("D"),
        'ı' => Fold::Text("i"),
        'ß' => Fold::Text("ss"),
        'æ' => Fold::Text("ae"),
        'Æ' => Fold::Text("AE"),
        'œ' => Fold::Text("oe"),
        'Œ' => Fold::Text("OE"),
        'þ' => Fold::Text("th"),
        'Þ' => Fold::Text("TH"),
        'ð' => Fold::Text("d"),
        'Ð' => Fold::Text("D"),
        _ => Fold::Decompose,
    }
}

/// Nome por extenso de letras gregas (incluindo o sinal micro `µ`).
fn greek_name(ch: char) -> Option<&'static str> {
    let name = match ch {
        'α' => "alpha",
        'β' | 'ϐ' => "beta",
        'γ' => "gamma",
        'δ' => "delta",
        'ε' | 'ϵ' => "epsilon",
        'ζ' => "zeta",
        'η' => "eta",
        'θ' | 'ϑ' => "theta",
        'ι' => "iota",
        'κ' | 'ϰ' => "kappa",
        'λ' => "lambda",
        'μ' | 'µ' => "mu",
        'ν' => "nu",
        'ξ' => "xi",
        'ο' => "omicron",
        'π' | 'ϖ' => "pi",
        'ρ' | 'ϱ' => "rho",
        'σ' | 'ς' => "sigma",
        'τ' => "tau",
        'υ' => "upsilon",
        'φ' | 'ϕ' => "phi",
        'χ' => "chi",
        'ψ' => "psi",
        'ω' => "omega",
        'Α' => "Alpha",
        'Β' => "Beta",
        'Γ' => "Gamma",
        'Δ' => "Delta",
        'Ε' => "Epsilon",
        'Ζ' => "Zeta",
        'Η' => "Eta",
        'Θ' => "Theta",
        'Ι' => "Iota",
        'Κ' => "Kappa",
        'Λ' => "Lambda",
        'Μ' => "Mu",
        'Ν' => "Nu",
        'Ξ' => "Xi",
        'Ο' => "Omicron",
        'Π' => "Pi",
        'Ρ' => "Rho",
        'Σ' => "Sigma",
        'Τ' => "Tau",
        'Υ' => "Upsilon",
        'Φ' => "Phi",
        'Χ' => "Chi",
        'Ψ' => "Psi",
        'Ω' => "Omega",
        _ => return None,
    };
    Some(name)
}

/// Letras cirílicas visualmente idênticas a letras latinas.
fn cyrillic_lookalike(ch: char) -> Option<&'static str> {
    let latin = match ch {
        'А' => "A",
        'В' => "B",
        'Е' => "E",
        'К' => "K",
        'М' => "M",
        'Н' => "H",
        'О' => "O",
        'Р' => "P",
        'С' => "C",
        'Т' => "T",
        'У' => "Y",
        'Х' => "X",
        'Ѕ' => "S",
        'І' => "I",
        'Ј' => "J",
        'а' => "a",
        'в' => "b",
        'е' => "e",
        'к' => "k",
        'м' => "m",
        'н' => "h",
        'о' => "o",
        'р' => "p",
        'с' => "c",
        'т' => "t",
        'у' => "y",
        'х' => "x",
        'ѕ' => "s",
        'і' => "i",
        'ј' => "j",
        _ => return None,
    };
    Some(latin)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_passthrough() {
        assert_eq!(fold_to_ascii(""), "");
        assert_eq!(
            fold_to_ascii("The quick brown fox jumped over the lazy dog."),
            "The quick brown fox jumped over the lazy dog."
        );
    }

    #[test]
    fn test_greek_spacing() {
        assert_eq!(fold_to_ascii("1,25α-dihydroxyvitamin D3"), "1,25alpha-dihydroxyvitamin D3");
        assert_eq!(fold_to_ascii("1α,25-(OH)2-vitamin D3"), "1alpha,25-(OH)2-vitamin D3");
        assert_eq!(fold_to_ascii("24-methylenecycloartan-3-β-ol"), "24-methylenecycloartan-3-beta-ol");
        assert_eq!(
            fold_to_ascii("3α,7α-dihydroxy-5β-cholan-24-oic acid"),
            "3alpha,7alpha-dihydroxy-5beta-cholan-24-oic acid"
        );
        assert_eq!(fold_to_ascii("Cβ"), "C beta");
        assert_eq!(fold_to_ascii("Neu5Acα"), "Neu5Ac alpha");
        assert_eq!(fold_to_ascii("βME"), "beta ME");
        assert_eq!(fold_to_ascii("17βME"), "17beta ME");
        assert_eq!(fold_to_ascii("17β-estradiol"), "17beta-estradiol");
        assert_eq!(fold_to_ascii("NF-κB signaling pathways"), "NF-kappa B signaling pathways");
        assert_eq!(fold_to_ascii("π"), "pi");
        assert_eq!(fold_to_ascii("β\u{2010}cycloitral"), "beta-cycloitral");
    }

    #[test]
    fn test_cyrillic_lookalikes() {
        assert_eq!(fold_to_ascii("N\u{0430}2CO3"), "Na2CO3");
        assert_eq!(fold_to_ascii("\u{0412}\u{041D}\u{0425}"), "BHX");
        assert_eq!(fold_to_ascii("\u{0421}\u{0420}"), "CP");
    }

    #[test]
    fn test_diacritics() {
        assert_eq!(fold_to_ascii("Gö6976"), "Go6976");
        assert_eq!(fold_to_ascii("\u{e0}\u{e7}\u{eb}\u{ed}\u{f1}\u{f6}\u{fd}\u{142}\u{15b}"), "aceinoyls");
    }

    #[test]
    fn test_trademark_suppressed() {
        assert_eq!(fold_to_ascii("Lipofectamine\u{2122} 2000"), "Lipofectamine 2000");
        assert_eq!(fold_to_ascii("Lipofectamine\u{2122}2000 Reagent"), "Lipofectamine 2000 Reagent");
    }

    #[test]
    fn test_spacing_and_hyphens() {
        assert_eq!(fold_to_ascii("dioxane\u{2009}+\u{2009}water"), "dioxane + water");
        assert_eq!(fold_to_ascii("a\u{00A0}b"), "a b");
        assert_eq!(
            fold_to_ascii("a-b\u{2010}c\u{2011}d\u{2012}e\u{2013}f\u{2014}g\u{2015}h\u{2212}i\u{AD}j-k\u{2043}l"),
            "a-b-c-d-e-f--g--h-ij-k--l"
        );
    }

    #[test]
    fn test_quotes_and_symbols() {
        assert_eq!(fold_to_ascii("a'b\u{2018}c\u{2019}d\u{2032}e\u{2035}f"), "a'b'c'd'e`f");
        assert_eq!(fold_to_ascii("a\"b\u{201C}c\u{201D}d\u{2033}e\u{2036}f"), "a\"b\"c\"d''e``f");
        assert_eq!(
            fold_to_ascii("a b\u{B7}c\u{B1}d\u{A9}e\u{AE}f\u{2122}g\u{2192}h"),
            "a b*c+-d(c)e(r)f g-h"
        );
    }

    #[test]
    fn test_output_is_always_ascii() {
        let folded = fold_to_ascii("漢字 ½ ﬁne ∑ Ωmega ✓");
        assert!(folded.is_ascii());
        assert!(folded.contains("fine"));
    }
}
