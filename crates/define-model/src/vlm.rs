use serde::{Deserialize, Serialize};

use crate::{DataType, Oid};

/// One value-level definition of a variable.
///
/// `oid` is the value-list OID shared by every entry of the same variable;
/// an entry is identified by (`oid`, `order`) or by its `item_oid`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueLevelMetadata {
    pub oid: Oid,
    /// 1-based position of the conditional subset within the variable.
    pub order: u32,
    pub dataset: String,
    pub variable: String,
    pub item_oid: Oid,
    pub where_clause: Oid,
    pub data_type: DataType,
    pub length: Option<u32>,
    /// Only set for fractional types.
    pub significant_digits: Option<u32>,
    /// `"<length>.<significant digits>"`, only set for fractional types.
    pub display_format: Option<String>,
    /// Always `false`: value-level mandatory status is not derivable from
    /// the mapping specification.
    pub mandatory: bool,
    /// Present only for `text` entries that have an emitted codelist.
    pub codelist: Option<Oid>,
    pub comment: Option<String>,
}
