//! Identifier generation for derived metadata.
//!
//! OIDs are `PREFIX.DATASET.VARIABLE[.TOKEN[.N]]`, joined with [`DELIMITER`].
//! A token is the normalized leading condition value of a conditional
//! subset; it never contains the delimiter or whitespace.

use std::collections::HashMap;
use std::fmt;

use define_model::{Oid, VariableKey};

/// Structural delimiter between OID segments.
pub const DELIMITER: char = '.';

/// Joins the words of a token.
pub const WORD_SEPARATOR: &str = "-";

/// Punctuation treated as a word break when tokenizing.
const SEPARATORS: &[char] = &['-', '.', '/', '\\', ',', ';', ':', '|'];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OidKind {
    Codelist,
    WhereClause,
    ValueList,
    Item,
}

impl OidKind {
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::Codelist => "CL",
            Self::WhereClause => "WC",
            Self::ValueList => "VL",
            Self::Item => "IT",
        }
    }
}

/// Normalize free text into an identifier-safe token.
///
/// Whitespace runs and separator punctuation become word breaks; words are
/// re-joined with [`WORD_SEPARATOR`]. Case is preserved.
pub fn name_to_token(text: &str) -> String {
    text.split(|c: char| c.is_whitespace() || SEPARATORS.contains(&c))
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join(WORD_SEPARATOR)
}

/// Join `kind`'s prefix and the non-empty segments.
pub fn build_oid(kind: OidKind, segments: &[&str]) -> Oid {
    let mut oid = String::from(kind.prefix());
    for segment in segments.iter().filter(|s| !s.is_empty()) {
        oid.push(DELIMITER);
        oid.push_str(segment);
    }
    Oid::new(oid)
}

/// Token of one conditional subset, with its collision ordinal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotToken {
    token: String,
    ordinal: Option<usize>,
}

impl SlotToken {
    pub fn token(&self) -> &str {
        &self.token
    }

    /// 1-based position among the slots sharing this token, if shared.
    pub fn ordinal(&self) -> Option<usize> {
        self.ordinal
    }

    fn oid(&self, kind: OidKind, key: &VariableKey) -> Oid {
        let ordinal = self.ordinal.map(|n| n.to_string()).unwrap_or_default();
        build_oid(kind, &[key.dataset(), key.variable(), &self.token, &ordinal])
    }
}

impl fmt::Display for SlotToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.ordinal {
            Some(n) => write!(f, "{}{DELIMITER}{n}", self.token),
            None => f.write_str(&self.token),
        }
    }
}

/// Tokens for the conditional subsets of one variable, in declaration order.
///
/// When a token repeats, every occurrence gets a 1-based ordinal in
/// declaration order. A value that normalizes to nothing is replaced by the
/// slot's 1-based position.
pub fn slot_tokens<'a, I>(leading_values: I) -> Vec<SlotToken>
where
    I: IntoIterator<Item = &'a str>,
{
    let tokens: Vec<String> = leading_values
        .into_iter()
        .enumerate()
        .map(|(idx, value)| {
            let token = name_to_token(value);
            if token.is_empty() {
                (idx + 1).to_string()
            } else {
                token
            }
        })
        .collect();

    let mut totals: HashMap<&str, usize> = HashMap::new();
    for token in &tokens {
        *totals.entry(token.as_str()).or_default() += 1;
    }
    let mut seen: HashMap<&str, usize> = HashMap::new();
    tokens
        .iter()
        .map(|token| {
            let ordinal = (totals[token.as_str()] > 1).then(|| {
                let n = seen.entry(token.as_str()).or_default();
                *n += 1;
                *n
            });
            SlotToken {
                token: token.clone(),
                ordinal,
            }
        })
        .collect()
}

/// `CL.DS.VAR`: codelist of a variable without value-level metadata.
pub fn variable_codelist_oid(key: &VariableKey) -> Oid {
    build_oid(OidKind::Codelist, &[key.dataset(), key.variable()])
}

/// `CL.DS.VAR.TOKEN`: codelist of one conditional subset.
pub fn slot_codelist_oid(key: &VariableKey, token: &SlotToken) -> Oid {
    token.oid(OidKind::Codelist, key)
}

pub fn where_clause_oid(key: &VariableKey, token: &SlotToken) -> Oid {
    token.oid(OidKind::WhereClause, key)
}

pub fn item_oid(key: &VariableKey, token: &SlotToken) -> Oid {
    token.oid(OidKind::Item, key)
}

/// `VL.DS.VAR`, shared by every value-level entry of the variable.
pub fn value_list_oid(key: &VariableKey) -> Oid {
    build_oid(OidKind::ValueList, &[key.dataset(), key.variable()])
}

/// `CL.C66731`: an authority codelist emitted in full.
pub fn authority_codelist_oid(code: &str) -> Oid {
    build_oid(OidKind::Codelist, &[code])
}

/// `CL.DOMAIN.VS`: one-term domain abbreviation codelist.
pub fn domain_codelist_oid(dataset: &str) -> Oid {
    build_oid(OidKind::Codelist, &["DOMAIN", dataset])
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn key() -> VariableKey {
        "QS.QSORRES".parse().unwrap()
    }

    #[test]
    fn questionnaire_name_tokenizes() {
        assert_eq!(
            name_to_token("IPAQ SHORT - SELF ADMINISTERED VERSION"),
            "IPAQ-SHORT-SELF-ADMINISTERED-VERSION"
        );
        assert_eq!(name_to_token("  HbA1c  /  GLUCOSE "), "HbA1c-GLUCOSE");
        assert_eq!(name_to_token("V1.2"), "V1-2");
        assert_eq!(name_to_token(" - "), "");
    }

    #[test]
    fn repeated_tokens_get_ordinals() {
        let tokens = slot_tokens(["INSULIN", "AGE", "INSULIN"]);
        let wc: Vec<String> = tokens
            .iter()
            .map(|t| where_clause_oid(&key(), t).to_string())
            .collect();
        assert_eq!(
            wc,
            vec!["WC.QS.QSORRES.INSULIN.1", "WC.QS.QSORRES.AGE", "WC.QS.QSORRES.INSULIN.2"]
        );
    }

    #[test]
    fn values_that_normalize_alike_collide() {
        let tokens = slot_tokens(["ORAL THERAPY", "ORAL-THERAPY"]);
        assert_eq!(tokens[0].to_string(), "ORAL-THERAPY.1");
        assert_eq!(tokens[1].to_string(), "ORAL-THERAPY.2");
    }

    #[test]
    fn empty_token_falls_back_to_position() {
        let tokens = slot_tokens(["AGE", "--"]);
        assert_eq!(tokens[1].token(), "2");
        assert_eq!(tokens[1].ordinal(), None);
    }

    #[test]
    fn fixed_oids() {
        assert_eq!(variable_codelist_oid(&key()).as_str(), "CL.QS.QSORRES");
        assert_eq!(value_list_oid(&key()).as_str(), "VL.QS.QSORRES");
        assert_eq!(authority_codelist_oid("C66731").as_str(), "CL.C66731");
        assert_eq!(domain_codelist_oid("FACM").as_str(), "CL.DOMAIN.FACM");
        let token = &slot_tokens(["AGE"])[0];
        assert_eq!(item_oid(&key(), token).as_str(), "IT.QS.QSORRES.AGE");
        assert_eq!(slot_codelist_oid(&key(), token).as_str(), "CL.QS.QSORRES.AGE");
    }

    proptest! {
        #[test]
        fn tokenizing_is_idempotent(text in "\\PC*") {
            let once = name_to_token(&text);
            prop_assert_eq!(name_to_token(&once), once);
        }

        #[test]
        fn tokens_are_identifier_safe(text in "[A-Za-z0-9 ./,;:|-]{0,40}") {
            let token = name_to_token(&text);
            prop_assert!(!token.contains(DELIMITER));
            prop_assert!(!token.chars().any(char::is_whitespace));
            prop_assert!(!token.starts_with(WORD_SEPARATOR));
            prop_assert!(!token.contains("--"));
        }

        #[test]
        fn slot_oids_are_unique(values in proptest::collection::vec("[A-C ]{0,3}", 1..8)) {
            let tokens = slot_tokens(values.iter().map(String::as_str));
            let key: VariableKey = "FA.FAORRES".parse().unwrap();
            let mut oids: Vec<Oid> = tokens.iter().map(|t| where_clause_oid(&key, t)).collect();
            let total = oids.len();
            oids.sort();
            oids.dedup();
            prop_assert_eq!(oids.len(), total);
        }
    }
}
