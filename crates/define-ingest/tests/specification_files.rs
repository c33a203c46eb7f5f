use std::fs;
use std::path::Path;

use define_ingest::{
    IngestError, load_inclusions, load_specification, parse_specification, write_specification,
};
use define_model::{Comparator, DataType, ModelError, StandardMarker, VariableKey};

const SUBSETS: &str = r#"{
    "SC.SCORRES": {
        "IsNonStandard": ["C66790", "Yes"],
        "VLM": "Yes",
        "type": ["text", "text"],
        "whereclause": [
            [{"variable": "SCTESTCD", "comparator": "EQ", "value": ["EDULEVEL"]}],
            [{"variable": "SCTESTCD", "comparator": "IN", "value": ["EMPJOB", "EMPSTAT"]},
             {"variable": "SCCAT", "comparator": "EQ", "value": ["EMPLOYMENT"]}]
        ],
        "subset_terms": ["", "EMPLOYED, UNEMPLOYED"],
        "domain": "SC"
    },
    "FA.FAORRES": {
        "IsNonStandard": ["No", "No"],
        "VLM": "Yes",
        "type": ["integer", "float"],
        "whereclause": [
            {"variable": "FATESTCD", "comparator": "EQ", "value": "AGE"},
            {"variable": "FATESTCD", "comparator": "EQ", "value": "HBA1C"}
        ],
        "length": [2, null]
    },
    "DM.RACE": {
        "IsNonStandard": ["C74457"],
        "VLM": "No",
        "type": ["text"],
        "whereclause": []
    }
}"#;

fn key(raw: &str) -> VariableKey {
    raw.parse().unwrap()
}

#[test]
fn parses_both_where_clause_forms_in_file_order() {
    let spec = parse_specification(SUBSETS, Path::new("cl_subsets.json")).unwrap();
    let keys: Vec<String> = spec.variables().iter().map(|v| v.key.to_string()).collect();
    assert_eq!(keys, vec!["SC.SCORRES", "FA.FAORRES", "DM.RACE"]);

    let sc = spec.get(&key("SC.SCORRES")).unwrap();
    assert!(sc.value_level);
    assert_eq!(sc.markers[0], StandardMarker::Authority("C66790".to_string()));
    assert_eq!(sc.markers[1], StandardMarker::NonStandard);
    assert_eq!(sc.conditions[1].len(), 2);
    assert_eq!(sc.conditions[1][0].comparator, Comparator::In);
    assert_eq!(sc.conditions[1][0].values(), ["EMPJOB", "EMPSTAT"]);
    assert!(sc.inclusions[0].is_empty());
    assert_eq!(sc.inclusions[1], vec!["EMPLOYED", "UNEMPLOYED"]);

    let fa = spec.get(&key("FA.FAORRES")).unwrap();
    assert_eq!(fa.data_types, vec![DataType::Integer, DataType::Float]);
    assert_eq!(fa.markers, vec![StandardMarker::NoCodelist; 2]);
    assert_eq!(fa.conditions[1][0].leading_value(), "HBA1C");
    assert_eq!(fa.lengths, vec![Some(2), None]);
    assert!(fa.slot_count().is_ok());

    let dm = spec.get(&key("DM.RACE")).unwrap();
    assert!(!dm.value_level);
    assert_eq!(dm.slot_count().unwrap(), 1);
}

#[test]
fn invalid_data_type_names_the_entry() {
    let json = r#"{"FA.FAORRES": {"IsNonStandard": ["No"], "VLM": "No", "type": ["decimal"]}}"#;
    let err = parse_specification(json, Path::new("cl_subsets.json")).unwrap_err();
    match err {
        IngestError::InvalidEntry { key, .. } => assert_eq!(key, "FA.FAORRES"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn short_codelist_marker_names_the_entry() {
    let json = r#"{"DM.RACE": {"IsNonStandard": ["N/A"], "VLM": "No", "type": ["text"]}}"#;
    let err = parse_specification(json, Path::new("cl_subsets.json")).unwrap_err();
    match err {
        IngestError::InvalidEntry { key, source, .. } => {
            assert_eq!(key, "DM.RACE");
            assert_eq!(source, ModelError::InvalidMarker("N/A".to_string()));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn written_specification_loads_back() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("cl_subsets.json");
    fs::write(&source, SUBSETS).unwrap();
    let spec = load_specification(&source).unwrap();

    let written = dir.path().join("cl_subsets.enriched.json");
    write_specification(&written, &spec).unwrap();
    let reloaded = load_specification(&written).unwrap();
    assert_eq!(reloaded, spec);
}

#[test]
fn inclusion_file_enriches_without_mutating() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("cl_subsets.json");
    fs::write(&source, SUBSETS).unwrap();
    let spec = load_specification(&source).unwrap();

    let inclusions = dir.path().join("subset_terms.json");
    fs::write(
        &inclusions,
        r#"{"SC.SCORRES": ["COLLEGE, HIGH SCHOOL", ["EMPLOYED"]]}"#,
    )
    .unwrap();
    let enriched = load_inclusions(&spec, &inclusions).unwrap();

    let sc = key("SC.SCORRES");
    assert_eq!(
        enriched.get(&sc).unwrap().inclusions,
        vec![vec!["COLLEGE", "HIGH SCHOOL"], vec!["EMPLOYED"]]
    );
    assert!(spec.get(&sc).unwrap().inclusions[0].is_empty());
}

#[test]
fn inclusion_for_unknown_variable_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let inclusions = dir.path().join("subset_terms.json");
    fs::write(&inclusions, r#"{"DM.SEX": ["M, F"]}"#).unwrap();
    let spec = parse_specification(SUBSETS, Path::new("cl_subsets.json")).unwrap();
    assert!(matches!(
        load_inclusions(&spec, &inclusions),
        Err(IngestError::UnknownVariable { .. })
    ));
}

#[test]
fn missing_file_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_specification(&dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(err, IngestError::FileRead { .. }));
}
