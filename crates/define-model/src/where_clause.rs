use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{ModelError, Oid};

/// Define-XML range-check comparator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Comparator {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    In,
    NotIn,
}

impl Comparator {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Eq => "EQ",
            Self::Ne => "NE",
            Self::Lt => "LT",
            Self::Le => "LE",
            Self::Gt => "GT",
            Self::Ge => "GE",
            Self::In => "IN",
            Self::NotIn => "NOTIN",
        }
    }
}

impl FromStr for Comparator {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "EQ" | "=" | "==" => Ok(Self::Eq),
            "NE" | "!=" => Ok(Self::Ne),
            "LT" => Ok(Self::Lt),
            "LE" => Ok(Self::Le),
            "GT" => Ok(Self::Gt),
            "GE" => Ok(Self::Ge),
            "IN" => Ok(Self::In),
            "NOTIN" | "NOT IN" => Ok(Self::NotIn),
            _ => Err(ModelError::InvalidComparator(s.to_string())),
        }
    }
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One range check: `variable comparator value1 | value2 | ...`.
///
/// Multiple values are OR-ed. Values keep their declared order and
/// duplicates are dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    pub variable: String,
    pub comparator: Comparator,
    values: Vec<String>,
}

impl Condition {
    pub fn new<I, S>(
        variable: impl Into<String>,
        comparator: Comparator,
        values: I,
    ) -> Result<Self, ModelError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let variable = variable.into().trim().to_string();
        if variable.is_empty() {
            return Err(ModelError::MissingConditionVariable);
        }
        let mut unique: Vec<String> = Vec::new();
        for value in values {
            let value = value.into();
            if !unique.contains(&value) {
                unique.push(value);
            }
        }
        if unique.is_empty() {
            return Err(ModelError::EmptyCondition { variable });
        }
        Ok(Self {
            variable,
            comparator,
            values: unique,
        })
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }

    /// First declared value; used to name the selector.
    pub fn leading_value(&self) -> &str {
        // Construction guarantees at least one value.
        self.values.first().map(String::as_str).unwrap_or_default()
    }

    pub fn joined_values(&self, separator: &str) -> String {
        self.values.join(separator)
    }
}

/// A selector restricting a variable definition to a context.
///
/// Conditions are AND-ed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WhereClause {
    pub oid: Oid,
    pub dataset: String,
    /// Variable whose value-level definition this selector belongs to.
    pub owner: String,
    pub conditions: Vec<Condition>,
}

impl WhereClause {
    pub fn leading_condition(&self) -> Option<&Condition> {
        self.conditions.first()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn condition_keeps_value_order_and_drops_duplicates() {
        let condition = Condition::new(
            "FATESTCD",
            Comparator::In,
            ["INSULIN", "CGM", "INSULIN"],
        )
        .unwrap();
        assert_eq!(condition.values(), ["INSULIN", "CGM"]);
        assert_eq!(condition.leading_value(), "INSULIN");
        assert_eq!(condition.joined_values("|"), "INSULIN|CGM");
    }

    #[test]
    fn condition_requires_values_and_variable() {
        assert_eq!(
            Condition::new("FATESTCD", Comparator::Eq, Vec::<String>::new()),
            Err(ModelError::EmptyCondition {
                variable: "FATESTCD".to_string()
            })
        );
        assert_eq!(
            Condition::new("  ", Comparator::Eq, ["AGE"]),
            Err(ModelError::MissingConditionVariable)
        );
    }

    #[test]
    fn comparator_parses_define_spellings() {
        assert_eq!("eq".parse::<Comparator>().unwrap(), Comparator::Eq);
        assert_eq!("NOT IN".parse::<Comparator>().unwrap(), Comparator::NotIn);
        assert!("LIKE".parse::<Comparator>().is_err());
    }
}
