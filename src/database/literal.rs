use crate::database::column::ColumnSchema;
use crate::database::column::ColumnType;
use crate::spreadsheet::cell::format_number;
use crate::spreadsheet::cell::Cell;
use crate::spreadsheet::classify::CellValue;
use crate::spreadsheet::classify::Classifier;
use crate::spreadsheet::sheet::Row;

/// Unquoted null keyword
pub const NULL: &str = "NULL";

/// Renders cells as SQL literals matching their column's type.
///
/// A value whose kind does not match the column type renders as `NULL`, as do error and
/// unresolved formula values. Text is wrapped in single quotes as is, without escaping.
pub struct LiteralRenderer<'a> {
    classifier: &'a Classifier,
}

impl<'a> LiteralRenderer<'a> {
    pub fn new(classifier: &'a Classifier) -> Self {
        LiteralRenderer { classifier }
    }

    /// Renders one cell; an absent cell is `NULL`.
    pub fn render(&self, cell: Option<&Cell>, kind: ColumnType) -> String {
        let Some(cell) = cell else {
            return NULL.to_owned();
        };
        let literal = match (self.classifier.resolve(cell), kind) {
            (CellValue::Numeric(number), ColumnType::Timestamp) if number.is_date_formatted() => {
                number.to_date_string()
            }
            (CellValue::Numeric(number), ColumnType::DoublePrecision) if !number.is_date_formatted() => {
                Some(format_number(number.value))
            }
            (CellValue::Boolean(value), ColumnType::Boolean) => Some(value.to_string()),
            (CellValue::Text(text), ColumnType::Text) => Some(text.into_owned()),
            (CellValue::Blank, ColumnType::Text) => Some(String::new()),
            _ => None,
        };
        match literal {
            Some(literal) => format!("'{literal}'"),
            None => NULL.to_owned(),
        }
    }

    /// Renders one row as a parenthesized tuple, one value per schema column in schema order.
    pub fn render_row(&self, row: &Row, schema: &ColumnSchema) -> String {
        let values: Vec<String> = schema
            .columns()
            .iter()
            .map(|column| self.render(row.cell(column.source), column.kind))
            .collect();
        format!("({})", values.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::column::Column;
    use crate::spreadsheet::cell::Formula;
    use crate::spreadsheet::cell::FormulaResult;
    use crate::spreadsheet::cell::Number;
    use crate::spreadsheet::cell::NumberFormat;
    use pretty_assertions::assert_eq;

    fn schema() -> ColumnSchema {
        ColumnSchema::new(vec![
            Column { name: "code".to_owned(), kind: ColumnType::DoublePrecision, source: 0 },
            Column { name: "name".to_owned(), kind: ColumnType::Text, source: 1 },
            Column { name: "basis".to_owned(), kind: ColumnType::Boolean, source: 2 },
        ])
    }

    fn formula(cached: FormulaResult) -> Cell {
        Cell::Formula(Formula { expression: "X1".to_owned(), cached: Some(cached) })
    }

    #[test]
    fn renders_matching_values() {
        let classifier = Classifier::default();
        let renderer = LiteralRenderer::new(&classifier);
        let date = Cell::Numeric(Number::with_format(45_292.6, NumberFormat::Date1900));

        assert_eq!(renderer.render(Some(&Cell::Numeric(Number::new(1.0))), ColumnType::DoublePrecision), "'1'");
        assert_eq!(renderer.render(Some(&Cell::Numeric(Number::new(2.5e20))), ColumnType::DoublePrecision), "'2.5e20'");
        assert_eq!(renderer.render(Some(&date), ColumnType::Timestamp), "'2024-01-01'");
        assert_eq!(renderer.render(Some(&Cell::Boolean(false)), ColumnType::Boolean), "'false'");
        assert_eq!(renderer.render(Some(&Cell::Text("Acme".to_owned())), ColumnType::Text), "'Acme'");
        assert_eq!(renderer.render(Some(&Cell::Blank), ColumnType::Text), "''");
    }

    #[test]
    fn renders_null_for_absent_and_mismatched() {
        let classifier = Classifier::default();
        let renderer = LiteralRenderer::new(&classifier);
        let date = Cell::Numeric(Number::with_format(45_292.0, NumberFormat::Date1900));

        assert_eq!(renderer.render(None, ColumnType::Text), "NULL");
        assert_eq!(renderer.render(Some(&Cell::Text("N/A".to_owned())), ColumnType::DoublePrecision), "NULL");
        assert_eq!(renderer.render(Some(&Cell::Blank), ColumnType::Boolean), "NULL");
        assert_eq!(renderer.render(Some(&Cell::Error("#DIV/0!".to_owned())), ColumnType::Text), "NULL");
        assert_eq!(renderer.render(Some(&date), ColumnType::DoublePrecision), "NULL");
        assert_eq!(renderer.render(Some(&Cell::Numeric(Number::new(3.0))), ColumnType::Timestamp), "NULL");
        assert_eq!(renderer.render(Some(&Cell::Numeric(Number::new(1.0))), ColumnType::Text), "NULL");
    }

    #[test]
    fn renders_null_for_dates_out_of_range() {
        let classifier = Classifier::default();
        let renderer = LiteralRenderer::new(&classifier);

        for format in [NumberFormat::Date1900, NumberFormat::Date1904] {
            let huge = Cell::Numeric(Number::with_format(1e15, format));
            assert_eq!(renderer.render(Some(&huge), ColumnType::Timestamp), "NULL");
        }
    }

    #[test]
    fn renders_formula_results() {
        let classifier = Classifier::default();
        let renderer = LiteralRenderer::new(&classifier);

        assert_eq!(renderer.render(Some(&formula(FormulaResult::Numeric(Number::new(4.0)))), ColumnType::DoublePrecision), "'4'");
        assert_eq!(renderer.render(Some(&formula(FormulaResult::Text("x".to_owned()))), ColumnType::Text), "'x'");
        assert_eq!(renderer.render(Some(&formula(FormulaResult::Boolean(true))), ColumnType::Boolean), "'true'");
        assert_eq!(renderer.render(Some(&formula(FormulaResult::Text("x".to_owned()))), ColumnType::Boolean), "NULL");
        assert_eq!(renderer.render(Some(&formula(FormulaResult::Error("#REF!".to_owned()))), ColumnType::Text), "NULL");
    }

    #[test]
    fn text_is_not_escaped() {
        let classifier = Classifier::default();
        let renderer = LiteralRenderer::new(&classifier);
        assert_eq!(renderer.render(Some(&Cell::Text("O'Brien".to_owned())), ColumnType::Text), "'O'Brien'");
    }

    #[test]
    fn renders_rows() {
        let classifier = Classifier::default();
        let renderer = LiteralRenderer::new(&classifier);

        let sample = Row::from_iter([
            (0, Cell::Numeric(Number::new(1.0))),
            (1, Cell::Text("Acme".to_owned())),
            (2, Cell::Boolean(true)),
        ]);
        assert_eq!(renderer.render_row(&sample, &schema()), "('1', 'Acme', 'true')");

        let later = Row::from_iter([
            (0, Cell::Text("N/A".to_owned())),
            (1, Cell::Text("Widget".to_owned())),
            (2, Cell::Boolean(false)),
        ]);
        assert_eq!(renderer.render_row(&later, &schema()), "(NULL, 'Widget', 'false')");

        let sparse = Row::from_iter([(1, Cell::Blank), (7, Cell::Boolean(true))]);
        assert_eq!(renderer.render_row(&sparse, &schema()), "(NULL, '', NULL)");
    }
}
