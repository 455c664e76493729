//! Column descriptions returned by the describe path.

use serde::Serialize;

/// One column of a table description.
///
/// Only `field` is always present; the service omits the other attributes
/// for columns they do not apply to, and absent attributes stay `None`
/// rather than being defaulted.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ColumnDescription {
    /// Column name.
    pub field: String,
    /// SQL-ish type string, e.g. `int(11)` or `varchar(128)`.
    pub column_type: Option<String>,
    /// Whether the column is nullable, as reported (`YES` / `NO`).
    pub nullable: Option<String>,
    /// Key classification, e.g. `PRI` for the primary key.
    pub key_type: Option<String>,
    /// Default value, when the column has one.
    pub default_value: Option<String>,
    /// Extra attributes, e.g. `auto_increment`.
    pub extra: Option<String>,
}
