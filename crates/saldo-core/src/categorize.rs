//! Transaction categorization
//!
//! Categories are resolved in three layers, first match wins:
//! 1. User rules, in rule set order (keyword substring match)
//! 2. [`BUILTIN_RULES`], an ordered table of keyword predicates
//! 3. The fallback category `Outros`
//!
//! Matching runs on a normalized description: lowercased, diacritics
//! folded to their base letter, any other non-ASCII character dropped.
//! Built-in keywords are written in that normalized form.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::models::{category, Transaction};
use crate::rules::RuleSet;

/// Keyword predicate of a built-in rule
#[derive(Debug, Clone, Copy)]
pub enum Matcher {
    /// Any of the keywords occurs
    Any(&'static [&'static str]),
    /// The anchor occurs together with any of the keywords
    AnchorWith(&'static str, &'static [&'static str]),
}

impl Matcher {
    /// Returns the keyword that triggered the match
    pub fn matches(&self, normalized: &str) -> Option<&'static str> {
        match self {
            Self::Any(keywords) => keywords.iter().copied().find(|k| normalized.contains(k)),
            Self::AnchorWith(anchor, keywords) => {
                if normalized.contains(anchor) {
                    keywords.iter().copied().find(|k| normalized.contains(k))
                } else {
                    None
                }
            }
        }
    }
}

/// One entry of the built-in rule table
#[derive(Debug, Clone, Copy)]
pub struct Rule {
    pub matcher: Matcher,
    pub category: &'static str,
}

const fn any(keywords: &'static [&'static str], category: &'static str) -> Rule {
    Rule {
        matcher: Matcher::Any(keywords),
        category,
    }
}

const fn anchored(
    anchor: &'static str,
    keywords: &'static [&'static str],
    category: &'static str,
) -> Rule {
    Rule {
        matcher: Matcher::AnchorWith(anchor, keywords),
        category,
    }
}

/// Built-in rules in evaluation order
pub const BUILTIN_RULES: &[Rule] = &[
    // Card bill paid from a Bradesco account
    anchored(
        "bradesco",
        &["transferencia", "pix enviado", "ted", "doc"],
        category::INVOICE_PAYMENT,
    ),
    any(
        &[
            "conveniencia",
            "condoveniencia",
            "am pm",
            "am/pm",
            "select",
            "7 eleven",
            "7-eleven",
            "loja de conveniencia",
        ],
        category::CONVENIENCE,
    ),
    any(
        &[
            "uber",
            "99",
            "posto",
            "combustivel",
            "ipva",
            "estacionamento",
            "sem parar",
            "veloe",
        ],
        category::TRANSPORT,
    ),
    any(
        &[
            "ifood",
            "restaurante",
            "mercado",
            "market",
            "padaria",
            "mc donalds",
            "burguer",
            "sodie",
            "cafe",
            "starbucks",
            "pao de acucar",
            "carrefour",
            "walmart",
            "san club",
            "atacadao",
        ],
        category::FOOD,
    ),
    any(
        &[
            "netflix",
            "spotify",
            "amazon",
            "prime",
            "hbo",
            "disney",
            "adobe",
            "apple",
            "google",
            "youtube",
            "globoplay",
            "sky",
            "claro",
            "vivo",
            "tim",
            "oi",
        ],
        category::SUBSCRIPTIONS,
    ),
    any(
        &["drogaria", "farmacia", "pacheco", "raia", "drogasil"],
        category::PHARMACY,
    ),
    any(
        &[
            "consultorio",
            "exame",
            "laboratorio",
            "hospital",
            "medico",
            "dentista",
            "psicologo",
        ],
        category::HEALTH,
    ),
    any(
        &[
            "aluguel",
            "condominio",
            "luz",
            "energia",
            "agua",
            "gas",
            "internet",
            "iptu",
            "seguro incendio",
        ],
        category::HOUSING,
    ),
    any(
        &[
            "shein",
            "shopee",
            "mercadolivre",
            "mercado livre",
            "amazon mkt",
            "magalu",
            "loja",
            "store",
            "vestuario",
            "roupa",
            "zara",
            "renner",
            "riachuelo",
        ],
        category::SHOPPING,
    ),
    any(
        &[
            "curso",
            "faculdade",
            "escola",
            "udemy",
            "alura",
            "livraria",
            "papelaria",
        ],
        category::EDUCATION,
    ),
    any(
        &[
            "cinema", "teatro", "show", "ingresso", "sympla", "eventim", "bar", "chopp", "cerveja",
        ],
        category::LEISURE,
    ),
    any(&["compra", "debito", "cartao"], category::GENERAL),
    any(
        &[
            "pix recebido",
            "transferencia recebida",
            "salario",
            "provento",
            "deposito",
            "credit",
            "resgate",
            "rendimento",
        ],
        category::INCOME,
    ),
    anchored("pix", &["enviado"], category::PIX),
    anchored("pix", &["pagamento"], category::PIX),
    any(
        &[
            "transferencia enviada",
            "ted enviado",
            "doc enviado",
            "pagamento",
        ],
        category::TRANSFERS,
    ),
    any(&["pix"], category::PIX),
];

/// Lowercase, fold diacritics and turn any Unicode space (NBSP included)
/// into `' '`; other non-ASCII characters are dropped
pub fn normalize(text: &str) -> String {
    text.chars()
        .flat_map(char::to_lowercase)
        .filter_map(fold_char)
        .collect()
}

fn fold_char(c: char) -> Option<char> {
    if c.is_ascii() {
        return Some(c);
    }
    if c.is_whitespace() {
        return Some(' ');
    }
    let folded = match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' | 'ª' => 'a',
        'ç' => 'c',
        'è' | 'é' | 'ê' | 'ë' => 'e',
        'ì' | 'í' | 'î' | 'ï' => 'i',
        'ñ' => 'n',
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'º' => 'o',
        'ù' | 'ú' | 'û' | 'ü' => 'u',
        'ý' | 'ÿ' => 'y',
        _ => return None,
    };
    Some(folded)
}

/// Which layer produced a category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleSource {
    User,
    Builtin,
    Fallback,
}

impl RuleSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Builtin => "builtin",
            Self::Fallback => "fallback",
        }
    }
}

impl std::fmt::Display for RuleSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Category decision with the keyword that triggered it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Classification {
    pub category: String,
    pub source: RuleSource,
    /// Matched keyword, None for the fallback
    pub keyword: Option<String>,
}

/// Classifier bound to one user rule set.
///
/// User keywords are normalized once up front.
#[derive(Debug, Clone)]
pub struct Categorizer<'a> {
    user_rules: Vec<(String, &'a str)>,
}

impl<'a> Categorizer<'a> {
    pub fn new(rules: &'a RuleSet) -> Self {
        let user_rules = rules
            .iter()
            .map(|(keyword, category)| (normalize(keyword), category))
            .filter(|(keyword, _)| !keyword.is_empty())
            .collect();
        Self { user_rules }
    }

    pub fn classify(&self, description: &str) -> String {
        self.explain(description).category
    }

    pub fn explain(&self, description: &str) -> Classification {
        let normalized = normalize(description);

        if let Some((keyword, category)) = self
            .user_rules
            .iter()
            .find(|(keyword, _)| normalized.contains(keyword.as_str()))
        {
            return Classification {
                category: category.to_string(),
                source: RuleSource::User,
                keyword: Some(keyword.clone()),
            };
        }

        for rule in BUILTIN_RULES {
            if let Some(keyword) = rule.matcher.matches(&normalized) {
                return Classification {
                    category: rule.category.to_string(),
                    source: RuleSource::Builtin,
                    keyword: Some(keyword.to_string()),
                };
            }
        }

        Classification {
            category: category::OTHER.to_string(),
            source: RuleSource::Fallback,
            keyword: None,
        }
    }

    /// Re-categorize transactions in place
    pub fn classify_batch(&self, transactions: &mut [Transaction]) {
        for tx in transactions {
            tx.category = self.classify(&tx.description);
        }
    }
}

/// Category for a description under the given user rules
pub fn classify(description: &str, user_rules: &RuleSet) -> String {
    Categorizer::new(user_rules).classify(description)
}

/// Like [`classify`], also reporting which rule decided
pub fn explain(description: &str, user_rules: &RuleSet) -> Classification {
    Categorizer::new(user_rules).explain(description)
}

/// Sorted categories present in the table plus the default selection set
pub fn known_categories(transactions: &[Transaction]) -> Vec<String> {
    let mut categories: BTreeSet<String> =
        transactions.iter().map(|tx| tx.category.clone()).collect();
    categories.extend(category::DEFAULTS.iter().map(|c| c.to_string()));
    categories.into_iter().collect()
}
