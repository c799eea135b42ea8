use crate::spreadsheet::classify::ValueKind;

/// SQL column types produced by schema inference.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ColumnType {
    /// Plain numbers
    DoublePrecision,
    /// Date formatted numbers
    Timestamp,
    /// Boolean values (true/false)
    Boolean,
    /// Everything else: text, blank, error and unresolved formula values
    Text,
}

impl ColumnType {
    /// Returns the type name used in column definitions.
    pub const fn as_str(&self) -> &'static str {
        match self {
            ColumnType::DoublePrecision => "DOUBLE PRECISION",
            ColumnType::Timestamp => "TIMESTAMP",
            ColumnType::Boolean => "BOOLEAN",
            ColumnType::Text => "TEXT",
        }
    }

    /// Maps a sampled value kind to its column type.
    pub const fn from_kind(kind: ValueKind) -> Self {
        match kind {
            ValueKind::Numeric { date_formatted: true } => ColumnType::Timestamp,
            ValueKind::Numeric { date_formatted: false } => ColumnType::DoublePrecision,
            ValueKind::Boolean => ColumnType::Boolean,
            ValueKind::Text | ValueKind::Blank | ValueKind::Error | ValueKind::Unresolved => ColumnType::Text,
        }
    }
}

/// A named, typed column of the target table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Column {
    /// Sanitized field name
    pub name: String,
    /// Column data type
    pub kind: ColumnType,
    /// 0-based sheet column the values are read from
    pub source: usize,
}

/// Ordered column list of the target table, in source column order.
/// Names are not deduplicated.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ColumnSchema {
    columns: Vec<Column>,
}

impl ColumnSchema {
    pub fn new(columns: Vec<Column>) -> Self {
        ColumnSchema { columns }
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Comma separated field names, as used in an insert column list.
    pub fn field_names(&self) -> String {
        self.columns
            .iter()
            .map(|column| column.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Comma separated `name TYPE` pairs, as used in a table definition.
    pub fn definitions(&self) -> String {
        self.columns
            .iter()
            .map(|column| format!("{} {}", column.name, column.kind.as_str()))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn kind_to_type() {
        assert_eq!(ColumnType::from_kind(ValueKind::Numeric { date_formatted: true }), ColumnType::Timestamp);
        assert_eq!(ColumnType::from_kind(ValueKind::Numeric { date_formatted: false }), ColumnType::DoublePrecision);
        assert_eq!(ColumnType::from_kind(ValueKind::Boolean), ColumnType::Boolean);
        assert_eq!(ColumnType::from_kind(ValueKind::Text), ColumnType::Text);
        assert_eq!(ColumnType::from_kind(ValueKind::Blank), ColumnType::Text);
        assert_eq!(ColumnType::from_kind(ValueKind::Error), ColumnType::Text);
        assert_eq!(ColumnType::from_kind(ValueKind::Unresolved), ColumnType::Text);
    }

    #[test]
    fn schema_text() {
        let schema = ColumnSchema::new(vec![
            Column { name: "code".to_owned(), kind: ColumnType::DoublePrecision, source: 0 },
            Column { name: "name".to_owned(), kind: ColumnType::Text, source: 1 },
            Column { name: "name".to_owned(), kind: ColumnType::Timestamp, source: 3 },
        ]);

        assert_eq!(schema.len(), 3);
        assert_eq!(schema.field_names(), "code, name, name");
        assert_eq!(schema.definitions(), "code DOUBLE PRECISION, name TEXT, name TIMESTAMP");
    }
}
