use chrono::TimeDelta;
use chrono::NaiveDate;
use chrono::NaiveDateTime;

/// Milliseconds in one spreadsheet day
pub(crate) const MILLISECONDS_PER_DAY: f64 = 86_400_000f64;

/// How a numeric cell is displayed, as far as the loader cares.
/// Date and time formats are both "date formatted"; the variant records the epoch.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum NumberFormat {
    #[default]
    General,
    /// Serial date counted from the 1900 epoch
    Date1900,
    /// Serial date counted from the 1904 epoch
    Date1904,
}

impl NumberFormat {
    fn date(is_1904: bool) -> Self {
        if is_1904 { Self::Date1904 } else { Self::Date1900 }
    }

    #[inline]
    pub fn is_date(&self) -> bool {
        !matches!(self, NumberFormat::General)
    }

    /// Parses built-in Excel number format IDs to determine whether they display dates.
    pub(crate) fn parse_builtin_number_format_id(id: &str, is_1904: bool) -> Option<Self> {
        match id {
            "14" | "15" | "16" | "17" | "18" | "19" | "20" | "21" | "22" | "45" | "46" | "47" => {
                Some(Self::date(is_1904))
            }
            _ => None,
        }
    }

    /// Parses custom number format strings, looking for date/time tokens
    /// outside of quoted literals, escapes and bracketed sections.
    pub(crate) fn parse_custom_number_format(format: &str, is_1904: bool) -> Self {
        let mut is_escaped = false;
        let mut is_literal = false;
        let mut is_color = false;
        let mut is_date = false;
        for character in format.chars() {
            match character {
                _ if is_escaped => is_escaped = false,
                '_' | '\\' if !is_literal => is_escaped = true,

                '"' if is_literal => is_literal = false,
                '"' if !is_literal && !is_color => is_literal = true,

                ']' if is_color => is_color = false,
                '[' if !is_color && !is_literal => is_color = true,
                _ if is_literal || is_color => (),

                'Y' | 'y' | 'D' | 'd' | 'H' | 'h' | 'S' | 's' => is_date = true,
                _ => (),
            }
        }

        if is_date {
            Self::date(is_1904)
        } else {
            Self::General
        }
    }
}

/// A numeric cell value together with its display format.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Number {
    pub value: f64,
    pub format: NumberFormat,
}

impl Number {
    pub fn new(value: f64) -> Self {
        Number { value, format: NumberFormat::General }
    }

    pub fn with_format(value: f64, format: NumberFormat) -> Self {
        Number { value, format }
    }

    #[inline]
    pub fn is_date_formatted(&self) -> bool {
        self.format.is_date()
    }

    /// Converts the serial value to a local date-time.
    /// Returns `None` for values the epoch cannot represent (negative, non-finite or out of range).
    pub fn to_datetime(&self) -> Option<NaiveDateTime> {
        if !self.value.is_finite() || self.value < 0f64 {
            return None;
        }
        let days = self.value.trunc() as i64;
        let offset = match self.format {
            NumberFormat::Date1904 => 1_462,
            // Handle Lotus 1-2-3 leap year bug (1900-02-29 does not exist)
            _ if days < 60 => 1,
            _ => 0,
        };
        let milliseconds = (self.value.fract() * MILLISECONDS_PER_DAY).round() as i64;
        let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
        epoch.checked_add_signed(TimeDelta::try_days(days.checked_add(offset)?)?)?
            .checked_add_signed(TimeDelta::try_milliseconds(milliseconds)?)
    }

    /// Converts a date-time to a 1900 serial date, the inverse of [`Number::to_datetime`].
    pub fn from_datetime(datetime: NaiveDateTime) -> Option<Number> {
        let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
        let days = (datetime - epoch).num_milliseconds() as f64 / MILLISECONDS_PER_DAY;
        // Serials before 1900-03-01 are one behind because of the phantom 1900-02-29
        let serial = if days < 61f64 { days - 1f64 } else { days };
        (serial >= 0f64).then(|| Number::with_format(serial, NumberFormat::Date1900))
    }

    /// Date part of the value formatted as `YYYY-MM-DD`.
    pub fn to_date_string(&self) -> Option<String> {
        self.to_datetime().map(|datetime| datetime.date().format("%Y-%m-%d").to_string())
    }
}

/// The cached result of a formula, as stored by the application that last calculated it.
#[derive(Clone, Debug, PartialEq)]
pub enum FormulaResult {
    Numeric(Number),
    Text(String),
    Boolean(bool),
    Error(String),
}

/// A formula cell: the unevaluated expression plus whatever result was stored with it.
#[derive(Clone, Debug, PartialEq)]
pub struct Formula {
    pub expression: String,
    pub cached: Option<FormulaResult>,
}

/// Runtime content of a present cell.
#[derive(Clone, Debug, PartialEq)]
pub enum Cell {
    Numeric(Number),
    Boolean(bool),
    Text(String),
    Formula(Formula),
    Blank,
    Error(String),
}

impl Cell {
    /// Short name of the stored kind, used in diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Cell::Numeric(number) if number.is_date_formatted() => "date",
            Cell::Numeric(_) => "numeric",
            Cell::Boolean(_) => "boolean",
            Cell::Text(_) => "text",
            Cell::Formula(_) => "formula",
            Cell::Blank => "blank",
            Cell::Error(_) => "error",
        }
    }
}

/// Canonical decimal text of a number.
/// Integral values print without a fraction; extreme magnitudes switch to scientific notation.
pub fn format_number(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_owned()
    } else if value.is_infinite() {
        if value > 0f64 { "Infinity" } else { "-Infinity" }.to_owned()
    } else if value == 0f64 {
        "0".to_owned()
    } else if (1e-7..1e16).contains(&value.abs()) {
        format!("{}", value)
    } else {
        format!("{:e}", value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_date_formats() {
        assert_eq!(NumberFormat::parse_builtin_number_format_id("14", false), Some(NumberFormat::Date1900));
        assert_eq!(NumberFormat::parse_builtin_number_format_id("22", true), Some(NumberFormat::Date1904));
        assert_eq!(NumberFormat::parse_builtin_number_format_id("47", false), Some(NumberFormat::Date1900));
        assert_eq!(NumberFormat::parse_builtin_number_format_id("2", false), None);
    }

    #[test]
    fn custom_date_formats() {
        assert_eq!(NumberFormat::parse_custom_number_format("yyyy-mm-dd", false), NumberFormat::Date1900);
        assert_eq!(NumberFormat::parse_custom_number_format("hh:mm", true), NumberFormat::Date1904);
        assert_eq!(NumberFormat::parse_custom_number_format("0.00", false), NumberFormat::General);
        assert_eq!(NumberFormat::parse_custom_number_format("#,##0 \"days\"", false), NumberFormat::General);
        assert_eq!(NumberFormat::parse_custom_number_format("[Red]0.0", false), NumberFormat::General);
        assert_eq!(NumberFormat::parse_custom_number_format("0\\d", false), NumberFormat::General);
    }

    #[test]
    fn serial_dates_1900() {
        let date = |value| Number::with_format(value, NumberFormat::Date1900).to_date_string();
        assert_eq!(date(1.0).as_deref(), Some("1900-01-01"));
        assert_eq!(date(59.0).as_deref(), Some("1900-02-28"));
        assert_eq!(date(61.0).as_deref(), Some("1900-03-01"));
        assert_eq!(date(45_292.75).as_deref(), Some("2024-01-01"));
        assert_eq!(date(-1.0), None);
    }

    #[test]
    fn serial_dates_out_of_range() {
        assert_eq!(Number::with_format(1e15, NumberFormat::Date1900).to_datetime(), None);
        assert_eq!(Number::with_format(1e15, NumberFormat::Date1904).to_datetime(), None);
        assert_eq!(Number::with_format(f64::MAX, NumberFormat::Date1904).to_date_string(), None);
    }

    #[test]
    fn serial_from_datetime() {
        let serial = |date: &str| {
            let datetime = NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap().and_hms_opt(12, 0, 0).unwrap();
            Number::from_datetime(datetime).map(|number| number.value)
        };
        assert_eq!(serial("1900-01-01"), Some(1.5));
        assert_eq!(serial("1900-02-28"), Some(59.5));
        assert_eq!(serial("1900-03-01"), Some(61.5));
        assert_eq!(serial("2024-01-01"), Some(45_292.5));
        assert_eq!(serial("1899-12-01"), None);
    }

    #[test]
    fn serial_dates_1904() {
        let number = Number::with_format(0.5, NumberFormat::Date1904);
        assert_eq!(number.to_date_string().as_deref(), Some("1904-01-01"));
        assert_eq!(
            number.to_datetime().map(|it| it.format("%H:%M:%S").to_string()).as_deref(),
            Some("12:00:00")
        );
    }

    #[test]
    fn number_text() {
        assert_eq!(format_number(1.0), "1");
        assert_eq!(format_number(-2.5), "-2.5");
        assert_eq!(format_number(0.0), "0");
        assert_eq!(format_number(123456789.125), "123456789.125");
        assert_eq!(format_number(1e20), "1e20");
        assert_eq!(format_number(1.5e-9), "1.5e-9");
        assert_eq!(format_number(f64::INFINITY), "Infinity");
    }
}
