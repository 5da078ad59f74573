//! # Material de Demonstração
//!
//! Um léxico químico pequeno (MeSH + ChEBI com referências cruzadas) e alguns
//! resumos anotados no estilo PubTator. Alimenta o servidor web quando nenhuma
//! configuração é fornecida e serve de fixture para os testes.
//!
//! Os casos cobertos incluem:
//! - variações de caixa e pontuação (`Aspirin`, `acetylsalicylic acid`);
//! - letras gregas (`17β-estradiol`, `1α,25-dihydroxyvitamin D3`);
//! - plurais (`statin` → `Statins`);
//! - abreviação ambígua (`PCP`: fenciclidina ou pentaclorofenol);
//! - qualificador MeSH e descritor fora da lista de permitidos.

use crate::document::Document;
use crate::lexicon::{EntityRecord, Lexicon};

pub const DEMO_UNKNOWN_ID: &str = "MESH:-";
pub const DEMO_ENTITY_TYPE: &str = "Chemical";

/// (id, nomes, referências cruzadas, permitido na saída)
type DemoEntity = (
    &'static str,
    &'static [&'static str],
    &'static [&'static str],
    bool,
);

const DEMO_ENTITIES: &[DemoEntity] = &[
    ("MESH:D001241", &["Aspirin", "Acetylsalicylic Acid", "2-(Acetyloxy)benzoic Acid"], &["CHEBI:15365"], true),
    ("CHEBI:15365", &["aspirin", "acetylsalicylic acid"], &["MESH:D001241"], false),
    ("MESH:D000082", &["Acetaminophen", "Paracetamol", "4-Acetamidophenol"], &["CHEBI:46195"], true),
    ("CHEBI:46195", &["paracetamol", "acetaminophen", "APAP"], &["MESH:D000082"], false),
    ("MESH:D004958", &["Estradiol", "17beta-Estradiol", "Oestradiol"], &[], true),
    ("MESH:D002117", &["Calcitriol", "1alpha,25-Dihydroxyvitamin D3", "1,25-Dihydroxycholecalciferol"], &[], true),
    ("MESH:D002762", &["Cholecalciferol", "Vitamin D3"], &[], true),
    ("MESH:D005947", &["Glucose", "D-Glucose", "Dextrose"], &[], true),
    ("MESH:D002945", &["Cisplatin", "cis-Diamminedichloroplatinum(II)", "Platinol"], &[], true),
    ("MESH:D010622", &["Phencyclidine", "PCP", "Angel Dust"], &[], true),
    ("MESH:D010416", &["Pentachlorophenol", "PCP"], &[], true),
    ("MESH:D019161", &["Hydroxymethylglutaryl-CoA Reductase Inhibitors", "Statins"], &[], true),
    ("MESH:D017693", &["Sodium Bicarbonate", "Baking Soda", "NaHCO3"], &[], true),
    ("MESH:D013256", &["Steroids"], &[], false),
    ("MESH:Q000008", &["administration & dosage"], &[], false),
];

/// Registros do léxico de demonstração.
pub fn demo_records() -> Vec<EntityRecord> {
    DEMO_ENTITIES
        .iter()
        .map(|(id, names, xrefs, _)| EntityRecord {
            id: id.to_string(),
            names: names.iter().map(|n| n.to_string()).collect(),
            xrefs: xrefs.iter().map(|x| x.to_string()).collect(),
        })
        .collect()
}

pub fn demo_lexicon() -> Lexicon {
    let mut builder = Lexicon::builder(DEMO_UNKNOWN_ID);
    for record in demo_records() {
        builder.add_entity(&record);
    }
    for (id, _, _, allowed) in DEMO_ENTITIES {
        if *allowed {
            builder.allow(*id);
        }
    }
    builder.build()
}

/// (texto, tipo, expansão), na ordem em que aparecem no documento.
type DemoMention = (&'static str, &'static str, Option<&'static str>);

fn demo_document(id: &str, title: &str, abstract_text: &str, mentions: &[DemoMention]) -> Document {
    let mut doc = Document::new(id, title, abstract_text);
    let mut from = 0;
    for (surface, entity_type, expanded) in mentions {
        if let Some(end) = doc.annotate(surface, entity_type, *expanded, from) {
            from = end;
        }
    }
    doc
}

/// Resumos anotados para demonstração.
pub fn demo_documents() -> Vec<Document> {
    const C: &str = DEMO_ENTITY_TYPE;
    const D: &str = "Disease";
    const ASA: Option<&str> = Some("Acetylsalicylic acid");

    vec![
        demo_document(
            "demo-analgesics",
            "Aspirin versus acetaminophen for postoperative fever.",
            "Acetylsalicylic acid (ASA) and paracetamol were compared in 120 patients. \
             ASA reduced fever faster than paracetamol.",
            &[
                ("Aspirin", C, None),
                ("acetaminophen", C, None),
                ("fever", D, None),
                ("Acetylsalicylic acid", C, None),
                ("ASA", C, ASA),
                ("paracetamol", C, None),
                ("ASA", C, ASA),
                ("fever", D, None),
                ("paracetamol", C, None),
            ],
        ),
        demo_document(
            "demo-pcp-exposure",
            "Urinary pentachlorophenol in sawmill workers.",
            "PCP concentrations were measured after exposure to wood preservatives \
             containing pentachlorophenol.",
            &[
                ("pentachlorophenol", C, None),
                ("PCP", C, None),
                ("pentachlorophenol", C, None),
            ],
        ),
        demo_document(
            "demo-vitamin-d",
            "Calcitriol and 17β-estradiol regulate bone turnover.",
            "1α,25-dihydroxyvitamin D3 and vitamin D3 were given with a statin, \
             glucose and (+) controls; steroids were excluded.",
            &[
                ("Calcitriol", C, None),
                ("17β-estradiol", C, None),
                ("1α,25-dihydroxyvitamin D3", C, None),
                ("vitamin D3", C, None),
                ("statin", C, None),
                ("glucose", C, None),
                ("(+)", C, None),
                ("steroids", C, None),
            ],
        ),
        demo_document(
            "demo-nephrotoxicity",
            "Cisplatin nephrotoxicity in rats.",
            "cis-Diamminedichloroplatinum(II) was given with PCP and xylotoxin.",
            &[
                ("Cisplatin", C, None),
                ("nephrotoxicity", D, None),
                ("cis-Diamminedichloroplatinum(II)", C, None),
                ("PCP", C, None),
                ("xylotoxin", C, None),
            ],
        ),
    ]
}
