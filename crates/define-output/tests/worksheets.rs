//! Worksheet and diagnostics output of a derivation run.

use define_core::{DerivationOptions, DerivationOutput, derive};
use define_model::{
    Comparator, Condition, DataType, StandardMarker, SubsetSpecification, VariableSubsetSpec,
};
use define_output::{
    DiagnosticsReport, REPORT_FILE_NAME, SheetKind, build_sheets, render_csv, write_outputs,
    write_report,
};
use define_terminology::{AuthorityCodelist, MemoryResolver};

const PACKAGE: &str = "sdtmct-2021-12-17";

fn education_level() -> AuthorityCodelist {
    AuthorityCodelist::new("C66790", "Education Level")
        .with_term("C100001", "COLLEGE", Some("College"))
        .with_term("C100002", "HIGH SCHOOL", Some("High School"))
}

fn condition(value: &str) -> Vec<Condition> {
    vec![Condition::new("SCTESTCD", Comparator::Eq, [value]).unwrap()]
}

fn scorres() -> VariableSubsetSpec {
    let mut spec = VariableSubsetSpec::new("SC.SCORRES".parse().unwrap(), true);
    spec.data_types = vec![DataType::Text, DataType::Float];
    spec.markers = vec![
        StandardMarker::Authority("C66790".to_string()),
        StandardMarker::NoCodelist,
    ];
    spec.conditions = vec![condition("EDULEVEL"), condition("HEIGHT")];
    spec.inclusions = vec![
        vec!["COLLEGE".to_string(), "DOCTORATE".to_string()],
        Vec::new(),
    ];
    spec.extensions = vec![vec!["TRADE SCHOOL".to_string()], Vec::new()];
    spec
}

fn derived() -> DerivationOutput {
    let spec = SubsetSpecification::new(vec![scorres()]);
    let resolver = MemoryResolver::new().with_codelist(PACKAGE, education_level());
    derive(&spec, &resolver, &DerivationOptions::default()).unwrap()
}

#[test]
fn codelist_worksheet() {
    let [codelists, _, _] = build_sheets(&derived());
    let csv = render_csv(&codelists).unwrap();
    insta::assert_snapshot!(csv, @r"
    OID,Name,NCI Codelist Code,Data Type,Order,Term,NCI Term Code,Decoded Value,Comment,IsNonStandard,StandardOID
    CL.SC.SCORRES.EDULEVEL,Codelist for SC SCORRES where EDULEVEL,C66790,text,1,COLLEGE,C100001,College,Incomplete subset: DOCTORATE not found in C66790,,STD.2
    CL.SC.SCORRES.EDULEVEL,Codelist for SC SCORRES where EDULEVEL,C66790,text,2,TRADE SCHOOL,,,Incomplete subset: DOCTORATE not found in C66790,Yes,
    ");
}

#[test]
fn where_clause_worksheet() {
    let [_, where_clauses, _] = build_sheets(&derived());
    let csv = render_csv(&where_clauses).unwrap();
    insta::assert_snapshot!(csv, @r"
    OID,Dataset,Variable,Comparator,Value,Comment
    WC.SC.SCORRES.EDULEVEL,SC,SCTESTCD,EQ,EDULEVEL,
    WC.SC.SCORRES.HEIGHT,SC,SCTESTCD,EQ,HEIGHT,
    ");
}

#[test]
fn value_level_worksheet() {
    let [_, _, value_level] = build_sheets(&derived());
    let csv = render_csv(&value_level).unwrap();
    insta::assert_snapshot!(csv, @r"
    OID,Order,Dataset,Variable,ItemOID,Where Clause,Data Type,Length,Significant Digits,Format,Mandatory,Codelist,Comment
    VL.SC.SCORRES,1,SC,SCORRES,IT.SC.SCORRES.EDULEVEL,WC.SC.SCORRES.EDULEVEL,text,12,,,No,CL.SC.SCORRES.EDULEVEL,Incomplete subset: DOCTORATE not found in C66790
    VL.SC.SCORRES,2,SC,SCORRES,IT.SC.SCORRES.HEIGHT,WC.SC.SCORRES.HEIGHT,float,3,2,3.2,No,,
    ");
}

#[test]
fn diagnostics_report() {
    let output = derived();
    let report = DiagnosticsReport::from_output(&output);
    insta::assert_json_snapshot!(report, @r#"
    {
      "summary": {
        "variables": 1,
        "derived_variables": 1,
        "failed_variables": 0,
        "authority_fetches": 1,
        "codelists": 1,
        "codelist_terms": 2,
        "where_clauses": 2,
        "value_level": 2,
        "errors": 0,
        "warnings": 1
      },
      "diagnostics": [
        {
          "kind": "specification_mismatch",
          "severity": "warning",
          "variable": "SC.SCORRES",
          "condition": 1,
          "codelist_code": "C66790",
          "message": "declared term 'DOCTORATE' is not in codelist C66790 (Education Level)"
        }
      ]
    }
    "#);
}

#[test]
fn writes_all_files_into_a_new_directory() {
    let temp = tempfile::tempdir().unwrap();
    let dir = temp.path().join("define");
    let output = derived();

    let written = write_outputs(&dir, &output).unwrap();
    let names: Vec<String> = written
        .iter()
        .map(|path| path.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, ["codelists.csv", "whereclauses.csv", "valuelevel.csv"]);

    let on_disk = std::fs::read_to_string(dir.join(SheetKind::ValueLevel.file_name())).unwrap();
    let [_, _, value_level] = build_sheets(&output);
    assert_eq!(on_disk, render_csv(&value_level).unwrap());

    let report_path = dir.join(REPORT_FILE_NAME);
    write_report(&report_path, &output).unwrap();
    let report: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(report_path).unwrap()).unwrap();
    assert_eq!(report["summary"]["warnings"], 1);
    assert_eq!(report["diagnostics"][0]["variable"], "SC.SCORRES");
}

#[test]
fn empty_run_writes_header_only_sheets() {
    let output = derive(
        &SubsetSpecification::default(),
        &MemoryResolver::new(),
        &DerivationOptions::default(),
    )
    .unwrap();
    let [codelists, _, _] = build_sheets(&output);
    assert!(codelists.is_empty());
    let csv = render_csv(&codelists).unwrap();
    assert_eq!(csv.lines().count(), 1);
}
