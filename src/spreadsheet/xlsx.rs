use crate::error::LoaderError;
use crate::helpers::reader::UnifiedReader;
use crate::helpers::xml::XmlNodeHelper;
use crate::helpers::xml::XmlReader;
use crate::helpers::xml::XmlTextContextHelper;
use crate::helpers::zip::ZipHelper;
use crate::match_xml_events;
use crate::spreadsheet::cell::Cell;
use crate::spreadsheet::cell::Formula;
use crate::spreadsheet::cell::FormulaResult;
use crate::spreadsheet::cell::Number;
use crate::spreadsheet::cell::NumberFormat;
use crate::spreadsheet::cell::MILLISECONDS_PER_DAY;
use crate::spreadsheet::reference::index_to_reference;
use crate::spreadsheet::reference::reference_to_index;
use crate::spreadsheet::sheet::Row;
use crate::spreadsheet::sheet::Sheet;
use crate::spreadsheet::SpreadsheetError;
use crate::spreadsheet::Workbook;
use chrono::NaiveDate;
use chrono::NaiveDateTime;
use chrono::NaiveTime;
use quick_xml::events::Event;
use quick_xml::name::QName;
use std::borrow::Cow;
use std::collections::HashMap;
use std::io::BufReader;
use tracing::debug;
use zip::read::ZipFile;
use zip::ZipArchive;

// XML tag names for parsing Excel XLSX format
const TAG_RELATIONSHIP: &[u8] = b"Relationship";      // Package relationship
const TAG_CUSTOM_FORMATS: QName = QName(b"numFmts"); // Custom number formats container
const TAG_CUSTOM_FORMAT: QName = QName(b"numFmt");   // Individual custom number format
const TAG_FORMAT_INDEXES: QName = QName(b"cellXfs");  // Cell format indexes container
const TAG_FORMAT_INDEX: QName = QName(b"xf");         // Individual cell format index
const TAG_SHARED_STRING_ITEM: QName = QName(b"si");   // Shared string table item
const TAG_PHONETIC_TEXT: QName = QName(b"rPh");       // Phonetic text for Asian languages
const TAG_TEXT: QName = QName(b"t");                  // Text content within strings
const TAG_WORKBOOK_PROPERTIES: QName = QName(b"workbookPr"); // Workbook properties
const TAG_SHEET: QName = QName(b"sheet");             // Worksheet definition
const TAG_ROW: QName = QName(b"row");                 // Row in worksheet
const TAG_CELL: QName = QName(b"c");                  // Cell in worksheet
const TAG_INLINE_STRING: QName = QName(b"is");        // Inline string value
const TAG_VALUE: QName = QName(b"v");                 // Cell value content
const TAG_FORMULA: QName = QName(b"f");               // Cell formula expression

/// Stored type of a worksheet cell, taken from its `t` attribute
#[derive(Copy, Clone, Debug, PartialEq)]
enum ValueType {
    Number,
    SharedString,
    InlineString,
    FormulaString,
    Boolean,
    Error,
    IsoDate,
}

impl ValueType {
    fn parse(t: Option<&str>) -> Self {
        match t {
            Some("s") => Self::SharedString,
            Some("inlineStr") => Self::InlineString,
            Some("str") => Self::FormulaString,
            Some("b") => Self::Boolean,
            Some("e") => Self::Error,
            Some("d") => Self::IsoDate,
            _ => Self::Number,
        }
    }
}

/// Workbook-level parts needed to decode worksheet cells
struct CellDecoder {
    /// File name of the spreadsheet
    name: String,
    /// Number formats indexed by cell style id
    number_formats: Vec<NumberFormat>,
    /// Shared string table
    shared_strings: Vec<String>,
}

/// Reads a whole XLSX/XLSM package into an immutable [`Workbook`]
pub(crate) struct XlsxReader {
    /// ZIP archive containing the package parts
    zip: ZipArchive<UnifiedReader>,
    decoder: CellDecoder,
    /// Worksheets as (name, zip_path) pairs
    sheets: Vec<(String, String)>,
}

impl XlsxReader {
    /// Opens the package and loads workbook-level parts (sheets, styles, shared strings)
    pub(crate) fn open(name: &str, reader: UnifiedReader) -> Result<XlsxReader, LoaderError> {
        let mut zip = ZipArchive::new(reader)?;
        let (sheets, is_1904) = load_workbook(&mut zip)?;
        if sheets.is_empty() {
            Err(SpreadsheetError::EmptyWorkbook(name.to_owned()))?
        }
        let number_formats = load_number_formats(&mut zip, is_1904)?;
        let shared_strings = load_shared_strings(&mut zip)?;
        Ok(XlsxReader {
            zip,
            decoder: CellDecoder {
                name: name.to_owned(),
                number_formats,
                shared_strings,
            },
            sheets,
        })
    }

    /// Reads every worksheet and assembles the workbook
    pub(crate) fn read(mut self) -> Result<Workbook, LoaderError> {
        let mut sheets = Vec::with_capacity(self.sheets.len());
        for (sheet_name, zip_path) in std::mem::take(&mut self.sheets) {
            let sheet = self.read_sheet(&sheet_name, &zip_path)?;
            debug!(sheet = %sheet_name, first_row = ?sheet.first_row(), last_row = ?sheet.last_row(), "worksheet loaded");
            sheets.push(sheet);
        }
        Ok(Workbook::new(&self.decoder.name, sheets))
    }

    fn read_sheet(&mut self, sheet_name: &str, zip_path: &str) -> Result<Sheet, LoaderError> {
        let mut sheet = Sheet::new(sheet_name);
        let decoder = &self.decoder;
        let mut reader = self.zip.xml_reader(zip_path)?
            .ok_or_else(|| SpreadsheetError::FileError(zip_path.to_owned()))?;

        let mut row_count = 0usize;
        let mut col_count = 0usize;
        let mut row = 0usize;
        let mut col = 0usize;
        let mut kind = ValueType::Number;
        let mut style = NumberFormat::General;
        let mut value: Option<String> = None;
        let mut formula: Option<String> = None;
        match_xml_events!(reader => {
            Event::Start(event) if event.name() == TAG_ROW => {
                row = event.parse_attribute_value::<usize>("r")?
                    .filter(|number| *number > 0)
                    .map(|number| number - 1)
                    .unwrap_or(row_count);
                row_count = row + 1;
                col_count = 0;
                sheet.push_row(row, Row::new());
            }
            Event::Start(event) if event.name() == TAG_CELL => {
                (row, col) = event.get_attribute_value("r")?
                    .and_then(|reference| reference_to_index(&reference))
                    .unwrap_or((row, col_count));
                col_count = col + 1;
                kind = ValueType::parse(event.get_attribute_value("t")?.as_deref());
                style = match event.parse_attribute_value::<usize>("s")? {
                    Some(index) => decoder.number_formats.get(index).copied().unwrap_or_default(),
                    None => NumberFormat::General,
                };
                value = None;
                formula = None;
            }
            Event::Start(event) if event.name() == TAG_INLINE_STRING => {
                value = Some(read_string_value(&mut reader, TAG_INLINE_STRING, false)?);
            }
            Event::Start(event) if event.name() == TAG_VALUE => {
                value = Some(read_string_value(&mut reader, TAG_VALUE, true)?);
            }
            Event::Start(event) if event.name() == TAG_FORMULA => {
                formula = Some(read_string_value(&mut reader, TAG_FORMULA, true)?);
            }
            Event::End(event) if event.name() == TAG_CELL => {
                let cell = decoder.to_cell(sheet_name, row, col, kind, style, value.take(), formula.take())?;
                sheet.push(row, col, cell);
            }
        });
        Ok(sheet)
    }
}

impl CellDecoder {
    /// Builds a cell from the raw attributes and contents of a `<c>` element
    #[allow(clippy::too_many_arguments)]
    fn to_cell(
        &self,
        sheet_name: &str,
        row: usize,
        col: usize,
        kind: ValueType,
        style: NumberFormat,
        value: Option<String>,
        formula: Option<String>,
    ) -> Result<Cell, LoaderError> {
        let value = value.filter(|value| {
            !value.is_empty() || matches!(kind, ValueType::InlineString | ValueType::FormulaString)
        });
        let mapper = |message: String| {
            SpreadsheetError::CellValueError(
                self.name.to_owned(),
                sheet_name.to_owned(),
                index_to_reference(row, col),
                message,
            )
        };

        if let Some(expression) = formula {
            let cached = value
                .map(|value| self.to_formula_result(kind, style, value))
                .transpose()
                .map_err(mapper)?;
            return Ok(Cell::Formula(Formula { expression, cached }));
        }

        let Some(value) = value else {
            return Ok(Cell::Blank);
        };
        let cell = match kind {
            ValueType::SharedString => Cell::Text(self.shared_string(&value).map_err(mapper)?),
            ValueType::InlineString | ValueType::FormulaString => Cell::Text(value),
            ValueType::IsoDate => Cell::Numeric(parse_iso_date(&value).map_err(mapper)?),
            ValueType::Boolean => Cell::Boolean(parse_boolean(&value).map_err(mapper)?),
            ValueType::Error => Cell::Error(value),
            ValueType::Number => Cell::Numeric(parse_number(&value, style).map_err(mapper)?),
        };
        Ok(cell)
    }

    fn to_formula_result(&self, kind: ValueType, style: NumberFormat, value: String) -> Result<FormulaResult, String> {
        Ok(match kind {
            ValueType::FormulaString | ValueType::InlineString => FormulaResult::Text(value),
            ValueType::IsoDate => FormulaResult::Numeric(parse_iso_date(&value)?),
            ValueType::SharedString => FormulaResult::Text(self.shared_string(&value)?),
            ValueType::Boolean => FormulaResult::Boolean(parse_boolean(&value)?),
            ValueType::Error => FormulaResult::Error(value),
            ValueType::Number => FormulaResult::Numeric(parse_number(&value, style)?),
        })
    }

    fn shared_string(&self, index: &str) -> Result<String, String> {
        index.trim()
            .parse::<usize>()
            .ok()
            .and_then(|index| self.shared_strings.get(index))
            .cloned()
            .ok_or_else(|| format!("shared string '{index}' not found"))
    }
}

fn parse_boolean(value: &str) -> Result<bool, String> {
    match value.trim() {
        "1" | "true" | "TRUE" => Ok(true),
        "0" | "false" | "FALSE" => Ok(false),
        _ => Err(format!("parse '{value}' to boolean failed")),
    }
}

fn parse_number(value: &str, style: NumberFormat) -> Result<Number, String> {
    value.trim()
        .parse::<f64>()
        .map(|number| Number::with_format(number, style))
        .map_err(|_| format!("parse '{value}' to number failed"))
}

/// Parses an ISO 8601 date, date-time or time into a date formatted serial number.
fn parse_iso_date(value: &str) -> Result<Number, String> {
    let text = value.trim().trim_end_matches('Z');
    let datetime = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDate::parse_from_str(text, "%Y-%m-%d").map(|date| date.and_time(NaiveTime::MIN)));
    let number = match datetime {
        Ok(datetime) => Number::from_datetime(datetime),
        Err(_) => NaiveTime::parse_from_str(text, "%H:%M:%S%.f")
            .ok()
            .map(|time| (time - NaiveTime::MIN).num_milliseconds() as f64 / MILLISECONDS_PER_DAY)
            .map(|serial| Number::with_format(serial, NumberFormat::Date1900)),
    };
    number.ok_or_else(|| format!("parse '{value}' to date failed"))
}

/// Loads worksheet names and their part paths, and the date system flag
fn load_workbook(zip: &mut ZipArchive<UnifiedReader>) -> Result<(Vec<(String, String)>, bool), LoaderError> {
    let relationships = load_relationships(zip, "xl/_rels/workbook.xml.rels")?;
    let mut reader = zip.xml_reader("xl/workbook.xml")?
        .ok_or_else(|| SpreadsheetError::FileError("xl/workbook.xml".to_string()))?;
    let mut sheets: Vec<(String, String)> = Vec::new();
    let mut is_1904 = false;
    match_xml_events!(reader => {
        Event::Start(event) if event.name() == TAG_SHEET => {
            let mut name = None::<String>;
            let mut id = None::<String>;
            for result in event.attributes() {
                let attribute = result?;
                let key = attribute.key.local_name();
                if key.as_ref() == b"name" {
                    name = Some(attribute.unescape_value()?.to_string());
                } else if key.as_ref() == b"id" {
                    id = Some(attribute.unescape_value()?.to_string());
                }
            }
            if let Some((name, id)) = name.zip(id) {
                if let Some(path) = relationships.get(&id) {
                    sheets.push((name, path.to_owned()));
                }
            }
        }
        Event::Start(event) if event.name() == TAG_WORKBOOK_PROPERTIES => {
            is_1904 = event.get_attribute_value("date1904")?
                .map(|value| value.eq("1") || value.eq("true"))
                .unwrap_or(false);
        }
    });
    Ok((sheets, is_1904))
}

/// Loads worksheet relationships: relationship id to worksheet part path
fn load_relationships(zip: &mut ZipArchive<UnifiedReader>, path: &str) -> Result<HashMap<String, String>, LoaderError> {
    let mut reader = zip.xml_reader(path)?
        .ok_or_else(|| SpreadsheetError::FileError(path.to_string()))?;
    let mut relationships: HashMap<String, String> = HashMap::new();
    match_xml_events!(reader => {
        Event::Start(event) if event.local_name().as_ref() == TAG_RELATIONSHIP => {
            let id = event.get_attribute_value("Id")?;
            let kind = event.get_attribute_value("Type")?;
            let target = event.get_attribute_value("Target")?;
            if kind.map(|it| it.ends_with("/worksheet")).unwrap_or(true) {
                if let Some((id, target)) = id.zip(target) {
                    relationships.insert(id.to_string(), to_zip_path(target));
                }
            }
        }
    });
    Ok(relationships)
}

/// Loads number formats from styles.xml, indexed by cell style id
fn load_number_formats(zip: &mut ZipArchive<UnifiedReader>, is_1904: bool) -> Result<Vec<NumberFormat>, LoaderError> {
    let mut reader = match zip.xml_reader("xl/styles.xml")? {
        Some(reader) => reader,
        None => return Ok(Vec::new()),
    };

    let mut custom_formats_context = false;
    let mut custom_formats = HashMap::<String, NumberFormat>::new();
    let mut format_indexes_context = false;
    let mut format_indexes = Vec::<String>::new();

    match_xml_events!(reader => {
        Event::Start(event) if event.name() == TAG_CUSTOM_FORMATS => custom_formats_context = true,
        Event::End(event) if event.name() == TAG_CUSTOM_FORMATS => custom_formats_context = false,
        Event::Start(event) if custom_formats_context && event.name() == TAG_CUSTOM_FORMAT => {
            let id = event.get_attribute_value("numFmtId")?;
            let format = event.get_attribute_value("formatCode")?;
            if let Some((id, format)) = id.zip(format) {
                custom_formats.insert(id.to_string(), NumberFormat::parse_custom_number_format(&format, is_1904));
            }
        }
        Event::Start(event) if event.name() == TAG_FORMAT_INDEXES => format_indexes_context = true,
        Event::End(event) if event.name() == TAG_FORMAT_INDEXES => format_indexes_context = false,
        Event::Start(event) if format_indexes_context && event.name() == TAG_FORMAT_INDEX => {
            format_indexes.push(event.get_attribute_value("numFmtId")?.unwrap_or_default().to_string());
        }
    });

    Ok(format_indexes
        .iter()
        .map(|id| {
            custom_formats
                .get(id)
                .copied()
                .or_else(|| NumberFormat::parse_builtin_number_format_id(id, is_1904))
                .unwrap_or_default()
        })
        .collect())
}

/// Loads the shared string table, empty when the part is missing
fn load_shared_strings(zip: &mut ZipArchive<UnifiedReader>) -> Result<Vec<String>, LoaderError> {
    let mut shared_strings = Vec::<String>::new();
    let mut reader = match zip.xml_reader("xl/sharedStrings.xml")? {
        Some(reader) => reader,
        None => return Ok(shared_strings),
    };
    match_xml_events!(reader => {
        Event::Start(event) if event.name() == TAG_SHARED_STRING_ITEM => {
            shared_strings.push(read_string_value(&mut reader, TAG_SHARED_STRING_ITEM, false)?);
        }
    });
    Ok(shared_strings)
}

/// Normalizes a relationship target to a path inside the archive
fn to_zip_path(path: Cow<'_, str>) -> String {
    if let Some(path) = path.strip_prefix('/') {
        path.to_string()
    } else if path.starts_with("xl/") {
        path.to_string()
    } else {
        format!("xl/{path}")
    }
}

/// Reads string content up to `end_tag`, skipping phonetic runs.
/// With `is_text_content` the element's own text counts, otherwise only `<t>` children do.
fn read_string_value(
    reader: &mut XmlReader<BufReader<ZipFile<'_, UnifiedReader>>>,
    end_tag: QName,
    is_text_content: bool,
) -> Result<String, LoaderError> {
    let mut is_phonetic_text = false;
    let mut is_text = is_text_content;
    let mut text = String::new();
    match_xml_events!(reader => {
        Event::End(event) if event.name() == end_tag => break,
        Event::Start(event) if event.name() == TAG_PHONETIC_TEXT => is_phonetic_text = true,
        Event::End(event) if event.name() == TAG_PHONETIC_TEXT => is_phonetic_text = false,
        Event::Start(event) if !is_phonetic_text && event.name() == TAG_TEXT => is_text = true,
        Event::End(event) if is_text && event.name() == TAG_TEXT => is_text = is_text_content,
        Event::Text(event) if is_text => text.push_str(&event.xml_content()?),
        Event::CData(event) if is_text => text.push_str(&event.xml_content()?),
        Event::GeneralRef(event) if is_text => text.push_bytes_ref(&event)?,
    });
    Ok(text)
}
