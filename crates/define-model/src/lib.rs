//! Entity model for Define-XML value-level metadata derivation.
//!
//! Codelists, where clauses and value-level entries are immutable once
//! emitted; the subset specification is the immutable input of a run.

pub mod ct;
pub mod diagnostics;
pub mod error;
pub mod ids;
pub mod spec;
pub mod vlm;
pub mod where_clause;

pub use ct::{Codelist, CodelistTerm, DataType, TermOrigin};
pub use diagnostics::{Diagnostic, DiagnosticKind, DiagnosticReport, Severity};
pub use error::{ModelError, Result};
pub use ids::{Oid, VariableKey};
pub use spec::{StandardMarker, SubsetSlot, SubsetSpecification, VariableSubsetSpec};
pub use vlm::ValueLevelMetadata;
pub use where_clause::{Comparator, Condition, WhereClause};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_counts() {
        let key: VariableKey = "FA.FAORRES".parse().unwrap();
        let mut report = DiagnosticReport::default();
        report.push(
            Diagnostic::new(DiagnosticKind::SpecificationMismatch, "IPA0499 not in C141665")
                .for_variable(&key)
                .at_slot(0)
                .with_codelist("C141665"),
        );
        report.push(Diagnostic::new(
            DiagnosticKind::MisalignedSpecification,
            "3 data types but 2 conditions",
        ));
        assert_eq!(report.error_count(), 1);
        assert_eq!(report.warning_count(), 1);
        assert!(report.has_errors());
        assert_eq!(report.for_variable(&key).count(), 1);
        assert_eq!(report.diagnostics[0].condition, Some(1));
    }

    #[test]
    fn report_serializes() {
        let report = DiagnosticReport {
            diagnostics: vec![Diagnostic::new(DiagnosticKind::EmptySubset, "no terms")],
        };
        let json = serde_json::to_string(&report).expect("serialize report");
        let round: DiagnosticReport = serde_json::from_str(&json).expect("deserialize report");
        assert_eq!(round, report);
        assert!(json.contains("\"empty_subset\""));
    }
}
