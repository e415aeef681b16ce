//! Source institution identification
//!
//! The bank label comes from the statement file name (`nubank_2024-01.csv`
//! → `Nubank`). Generic names such as `extrato.csv` fall back to sniffing
//! the first descriptions for institution-specific phrases.

use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

/// Label used when the file name token is too short to mean anything
pub const GENERIC_BANK: &str = "Banco";

/// File name tokens that never name an institution
const GENERIC_NAMES: &[&str] = &[
    "extrato",
    "statement",
    "relatorio",
    "financeiro",
    "export",
    "data",
    "banco",
];

/// Descriptions sampled for content sniffing
const CONTENT_SAMPLE: usize = 20;

/// Shortest token accepted as a bank name
const MIN_NAME_LEN: usize = 3;

/// How an institution shows up in descriptions
enum Signature {
    /// Any of the phrases
    Any(&'static [&'static str]),
    /// All of the words
    All(&'static [&'static str]),
}

impl Signature {
    fn matches(&self, sample: &str) -> bool {
        match self {
            Self::Any(phrases) => phrases.iter().any(|p| sample.contains(p)),
            Self::All(words) => words.iter().all(|w| sample.contains(w)),
        }
    }
}

/// Institution signatures, checked in priority order
const CONTENT_SIGNATURES: &[(Signature, &str)] = &[
    (Signature::Any(&["nu pagamentos", "pagamento de fatura"]), "Nubank"),
    (Signature::Any(&["mercado pago", "mercadopago"]), "Mercado Pago"),
    (Signature::All(&["inter", "banco"]), "Inter"),
    (Signature::Any(&["bradesco"]), "Bradesco"),
    (Signature::Any(&["itaú", "itau"]), "Itaú"),
    (Signature::Any(&["santander"]), "Santander"),
];

fn separators() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[_\-.]").expect("valid regex"))
}

/// Title-cased first token of the file name
pub fn name_from_filename(filename: &str) -> String {
    let token = separators().split(filename.trim()).next().unwrap_or("");
    let label = title_case(token);
    if label.chars().count() < MIN_NAME_LEN {
        GENERIC_BANK.to_string()
    } else {
        label
    }
}

/// Bank label for a statement, from its name and descriptions
pub fn identify_bank<S: AsRef<str>>(filename: &str, descriptions: &[S]) -> String {
    let label = name_from_filename(filename);
    if !is_generic(&label) {
        return label;
    }

    match detect_from_content(descriptions) {
        Some(bank) => {
            debug!("Identified {} from content of {}", bank, filename);
            bank.to_string()
        }
        None => label,
    }
}

fn is_generic(label: &str) -> bool {
    label.chars().count() < MIN_NAME_LEN || GENERIC_NAMES.contains(&label.to_lowercase().as_str())
}

/// Institution named by phrases in the first descriptions
pub fn detect_from_content<S: AsRef<str>>(descriptions: &[S]) -> Option<&'static str> {
    let sample = descriptions
        .iter()
        .take(CONTENT_SAMPLE)
        .map(|d| d.as_ref().to_lowercase())
        .collect::<Vec<_>>()
        .join(" ");

    CONTENT_SIGNATURES
        .iter()
        .find(|(signature, _)| signature.matches(&sample))
        .map(|(_, bank)| *bank)
}

/// Uppercase the first letter of each word, lowercase the rest
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut at_word_start = true;
    for c in s.chars() {
        if c.is_alphabetic() {
            if at_word_start {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(c);
            at_word_start = true;
        }
    }
    out
}
