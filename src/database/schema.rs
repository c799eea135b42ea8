use crate::database::column::Column;
use crate::database::column::ColumnSchema;
use crate::database::column::ColumnType;
use crate::database::range::resolve;
use crate::database::range::Span;
use crate::spreadsheet::classify::Classifier;
use crate::spreadsheet::classify::ValueKind;
use crate::spreadsheet::sheet::Sheet;
use crate::transliterate::field_name;
use crate::transliterate::sanitize;
use crate::transliterate::Transliterate;
use tracing::debug;
use tracing::warn;

/// Infers the target table's columns from one sampled data row.
///
/// Both modes return an empty schema instead of an error when the requested rows or columns
/// cannot be used; callers treat an empty schema as fatal for the sheet.
pub struct SchemaInference<'a> {
    classifier: &'a Classifier,
    transliterator: &'a dyn Transliterate,
}

impl<'a> SchemaInference<'a> {
    pub fn new(classifier: &'a Classifier, transliterator: &'a dyn Transliterate) -> Self {
        SchemaInference { classifier, transliterator }
    }

    /// Names columns after the header row cells.
    ///
    /// The header row's first and last non-blank cells bound the columns; a requested range is
    /// clamped into them and may not be wider than the header row's physical cell count.
    pub fn by_header(&self, sheet: &Sheet, header_row: usize, data_row: usize, columns: Option<Span>) -> ColumnSchema {
        if !sheet.contains_row(header_row) || !sheet.contains_row(data_row) {
            warn!(sheet = %sheet.name, header_row, data_row, "header or data row outside the sheet");
            return ColumnSchema::default();
        }
        let Some(header) = sheet.row(header_row) else {
            warn!(sheet = %sheet.name, header_row, "header row is missing");
            return ColumnSchema::default();
        };
        let Some(span) = header.filled_bounds()
            .and_then(|(first, last)| resolve(columns.map(|it| it.from), columns.map(|it| it.to), first, last))
            .filter(|span| span.fits(header.physical_cells()))
        else {
            warn!(sheet = %sheet.name, header_row, ?columns, "column range does not fit the header row");
            return ColumnSchema::default();
        };

        let mut fields = Vec::with_capacity(span.width());
        for col in span.indexes() {
            let Some(cell) = header.cell(col) else {
                warn!(sheet = %sheet.name, header_row, col, "header cell is absent");
                return ColumnSchema::default();
            };
            let Some(text) = self.classifier.resolve(cell).display_text().map(|text| text.into_owned()) else {
                warn!(sheet = %sheet.name, header_row, col, kind = cell.kind_name(), "header cell has no text");
                return ColumnSchema::default();
            };
            fields.push(Column {
                name: field_name(self.transliterator, &text),
                kind: self.sample_type(sheet, data_row, col),
                source: col,
            });
        }
        debug!(sheet = %sheet.name, columns = fields.len(), "schema inferred from header row");
        ColumnSchema::new(fields)
    }

    /// Names columns after an explicit field list, starting at the range's first column.
    ///
    /// Without a column range the columns run from the first sheet column for as many
    /// columns as there are names. A range wider than the name list yields nothing.
    pub fn by_field_names(&self, sheet: &Sheet, data_row: usize, field_names: &[String], columns: Option<Span>) -> ColumnSchema {
        if !sheet.contains_row(data_row) {
            warn!(sheet = %sheet.name, data_row, "data row outside the sheet");
            return ColumnSchema::default();
        }
        let Some(span) = field_names.len()
            .checked_sub(1)
            .and_then(|last| resolve(columns.map(|it| it.from), Some(columns.map_or(last, |it| it.to)), 0, usize::MAX))
            .filter(|span| span.fits(field_names.len()))
        else {
            warn!(sheet = %sheet.name, names = field_names.len(), ?columns, "column range is wider than the field names");
            return ColumnSchema::default();
        };

        let fields: Vec<Column> = field_names
            .iter()
            .zip(span.indexes())
            .map(|(name, col)| Column {
                name: sanitize(name),
                kind: self.sample_type(sheet, data_row, col),
                source: col,
            })
            .collect();
        debug!(sheet = %sheet.name, columns = fields.len(), "schema inferred from field names");
        ColumnSchema::new(fields)
    }

    /// Column type of the sampled cell; an absent cell samples as text.
    fn sample_type(&self, sheet: &Sheet, data_row: usize, col: usize) -> ColumnType {
        let kind = sheet.cell(data_row, col)
            .map(|cell| self.classifier.classify(cell))
            .unwrap_or(ValueKind::Text);
        ColumnType::from_kind(kind)
    }
}
