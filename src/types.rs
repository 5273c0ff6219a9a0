//! Core data model types shared by the readers and the workbook writer.
//!
//! Text sources produce [`Record`]s of raw strings; the writer turns each raw string into a
//! typed [`CellValue`] according to a [`CellOption`].

/// One logical row of raw field values produced by a text source.
pub type Record = Vec<String>;

/// Most decimal places an Excel number format can show.
pub const MAX_DECIMAL_PLACES: u32 = 30;

/// Per-cell options applied when raw strings are written into the workbook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CellOption {
    /// Number of decimal places numeric cells are rounded to and displayed with, at most
    /// [`MAX_DECIMAL_PLACES`].
    ///
    /// `None` keeps the full precision of the parsed value.
    pub decimal_places: Option<u32>,
    /// Keep digit strings with a leading zero (`"007"`) as text instead of numbers.
    pub preserve_leading_zeros: bool,
}

impl CellOption {
    /// Options that round numbers to `decimal_places`.
    pub fn with_decimal_places(decimal_places: u32) -> Self {
        Self {
            decimal_places: Some(decimal_places),
            ..Default::default()
        }
    }
}

/// How a numeric cell is displayed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum NumberFormat {
    /// Excel's `General` format.
    #[default]
    General,
    /// A fixed number of decimal places (`0`, `0.0`, `0.00`, ...).
    Fixed(u32),
    /// Any other format code (dates, percentages, currencies, ...), kept verbatim.
    Custom(String),
}

impl NumberFormat {
    /// Classify an Excel format code.
    pub fn from_code(code: &str) -> Self {
        let code = code.trim();
        if code.is_empty() || code.eq_ignore_ascii_case("general") {
            return Self::General;
        }
        if code == "0" {
            return Self::Fixed(0);
        }
        match code.strip_prefix("0.") {
            Some(zeros)
                if !zeros.is_empty()
                    && zeros.len() <= MAX_DECIMAL_PLACES as usize
                    && zeros.bytes().all(|b| b == b'0') =>
            {
                Self::Fixed(zeros.len() as u32)
            }
            _ => Self::Custom(code.to_string()),
        }
    }

    /// Format code to store in the workbook; `None` for `General`.
    pub fn code(&self) -> Option<String> {
        match self {
            Self::General => None,
            Self::Fixed(dp) => Some(number_format(*dp)),
            Self::Custom(code) => Some(code.clone()),
        }
    }

    /// Render `value` under this format.
    ///
    /// Fixed-point, grouped (`#,##0.00`) and percent codes are rendered; date, time, fraction
    /// and scientific codes fall back to the plain value.
    pub fn render(&self, value: f64) -> String {
        match self {
            Self::General => value.to_string(),
            Self::Fixed(dp) => {
                format!("{value:.prec$}", prec = (*dp).min(MAX_DECIMAL_PLACES) as usize)
            }
            Self::Custom(code) => render_custom(code, value).unwrap_or_else(|| value.to_string()),
        }
    }
}

/// A single typed value stored in a sheet.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    /// Verbatim text.
    Text(String),
    /// Numeric value and its display format.
    Number { value: f64, format: NumberFormat },
    /// Boolean. Only produced when loading an existing workbook.
    Bool(bool),
    /// Formula text without the leading `=`. Only produced when loading an existing workbook.
    Formula(String),
}

impl CellValue {
    /// Infer the cell type of `raw`.
    ///
    /// The value is a number iff the whole string parses as a finite base-10 float; anything
    /// else (including `inf`/`NaN`) is stored verbatim as text. When a precision is requested
    /// the stored value is rounded to it.
    pub fn infer(raw: &str, option: &CellOption) -> Self {
        if option.preserve_leading_zeros && has_leading_zero(raw) {
            return Self::Text(raw.to_owned());
        }
        match raw.parse::<f64>() {
            Ok(value) if value.is_finite() => Self::Number {
                value: round_to(value, option.decimal_places),
                format: option
                    .decimal_places
                    .map_or(NumberFormat::General, |dp| {
                        NumberFormat::Fixed(dp.min(MAX_DECIMAL_PLACES))
                    }),
            },
            _ => Self::Text(raw.to_owned()),
        }
    }

    /// A number with `decimal_places` fixed decimals, or `General` when `None`.
    pub fn number(value: f64, decimal_places: Option<u32>) -> Self {
        Self::Number {
            value,
            format: decimal_places.map_or(NumberFormat::General, NumberFormat::Fixed),
        }
    }

    /// Returns `true` for [`CellValue::Number`].
    pub fn is_number(&self) -> bool {
        matches!(self, Self::Number { .. })
    }

    /// Render the value the way a spreadsheet would display it.
    pub fn display(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::Number { value, format } => format.render(*value),
            Self::Bool(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
            Self::Formula(f) => format!("={f}"),
        }
    }
}

/// Excel number format string for a fixed precision (`0`, `0.0`, `0.00`, ...).
pub fn number_format(decimal_places: u32) -> String {
    match decimal_places.min(MAX_DECIMAL_PLACES) {
        0 => "0".to_string(),
        dp => format!("0.{}", "0".repeat(dp as usize)),
    }
}

fn round_to(value: f64, decimal_places: Option<u32>) -> f64 {
    match decimal_places {
        Some(dp) => format!("{value:.prec$}", prec = dp.min(MAX_DECIMAL_PLACES) as usize)
            .parse::<f64>()
            .unwrap_or(value),
        None => value,
    }
}

fn has_leading_zero(raw: &str) -> bool {
    let digits = raw.strip_prefix(['+', '-']).unwrap_or(raw);
    let mut chars = digits.chars();
    chars.next() == Some('0') && chars.next().is_some_and(|c| c.is_ascii_digit())
}

fn render_custom(code: &str, value: f64) -> Option<String> {
    let section = visible_section(code);
    let unsupported = |c: char| {
        matches!(
            c.to_ascii_lowercase(),
            'y' | 'm' | 'd' | 'h' | 's' | 'e' | '@' | '?' | '/'
        )
    };
    if section.chars().any(unsupported) {
        return None;
    }

    let start = section.find(['0', '#'])?;
    let (prefix, rest) = section.split_at(start);
    let len = rest
        .find(|c: char| !matches!(c, '0' | '#' | ',' | '.'))
        .unwrap_or(rest.len());
    let (pattern, suffix) = rest.split_at(len);

    let decimals = pattern
        .split_once('.')
        .map(|(_, frac)| frac.chars().filter(|c| matches!(c, '0' | '#')).count())
        .unwrap_or(0)
        .min(MAX_DECIMAL_PLACES as usize);
    let grouped = pattern.split('.').next().is_some_and(|int| int.contains(','));
    let scaled = if section.contains('%') { value * 100.0 } else { value };

    let digits = format!("{:.decimals$}", scaled.abs());
    let digits = if grouped { group_thousands(&digits) } else { digits };
    let negative = scaled < 0.0 && digits.bytes().any(|b| (b'1'..=b'9').contains(&b));
    let sign = if negative { "-" } else { "" };
    Some(format!("{sign}{prefix}{digits}{suffix}"))
}

/// First section of a format code with colors, conditions, quoted literals and padding removed.
fn visible_section(code: &str) -> String {
    let section = code.split(';').next().unwrap_or_default();
    let mut out = String::new();
    let mut chars = section.chars();
    while let Some(c) = chars.next() {
        match c {
            '[' => {
                for c in chars.by_ref() {
                    if c == ']' {
                        break;
                    }
                }
            }
            '"' => {
                for c in chars.by_ref() {
                    if c == '"' {
                        break;
                    }
                }
            }
            '\\' => out.extend(chars.next()),
            '_' | '*' => {
                chars.next();
            }
            c => out.push(c),
        }
    }
    out
}

fn group_thousands(digits: &str) -> String {
    let (int, frac) = match digits.split_once('.') {
        Some((int, frac)) => (int, Some(frac)),
        None => (digits, None),
    };
    let mut out = String::with_capacity(digits.len() + int.len() / 3);
    for (i, c) in int.chars().enumerate() {
        if i > 0 && (int.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    if let Some(frac) = frac {
        out.push('.');
        out.push_str(frac);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::{CellOption, CellValue, MAX_DECIMAL_PLACES, NumberFormat, number_format};

    #[test]
    fn numbers_are_rounded_and_displayed_with_precision() {
        let v = CellValue::infer("3.14159", &CellOption::with_decimal_places(2));
        assert_eq!(
            v,
            CellValue::Number {
                value: 3.14,
                format: NumberFormat::Fixed(2)
            }
        );
        assert_eq!(v.display(), "3.14");

        let v = CellValue::infer("2", &CellOption::with_decimal_places(1));
        assert!(v.is_number());
        assert_eq!(v.display(), "2.0");
    }

    #[test]
    fn full_precision_when_no_decimal_places() {
        let v = CellValue::infer("0.125", &CellOption::default());
        assert_eq!(v, CellValue::number(0.125, None));
        assert_eq!(v.display(), "0.125");
        assert_eq!(CellValue::infer("2", &CellOption::default()).display(), "2");
    }

    #[test]
    fn huge_precision_is_capped_instead_of_panicking() {
        let v = CellValue::infer("1.5", &CellOption::with_decimal_places(70_000));
        assert_eq!(
            v,
            CellValue::Number {
                value: 1.5,
                format: NumberFormat::Fixed(MAX_DECIMAL_PLACES)
            }
        );
        assert_eq!(v.display().len(), "1.".len() + MAX_DECIMAL_PLACES as usize);
        assert_eq!(number_format(u32::MAX).len(), "0.".len() + MAX_DECIMAL_PLACES as usize);
        assert_eq!(NumberFormat::Fixed(u32::MAX).render(2.0).len(), 32);
    }

    #[test]
    fn non_numeric_strings_stay_text() {
        let opt = CellOption::with_decimal_places(2);
        for raw in ["abc", " 1", "1 ", "1,5", "", "inf", "NaN", "0x10", "1e"] {
            assert_eq!(CellValue::infer(raw, &opt), CellValue::Text(raw.to_string()), "{raw:?}");
        }
    }

    #[test]
    fn leading_zeros_are_numeric_unless_preserved() {
        assert!(CellValue::infer("007", &CellOption::default()).is_number());

        let keep = CellOption {
            preserve_leading_zeros: true,
            ..Default::default()
        };
        assert_eq!(CellValue::infer("007", &keep), CellValue::Text("007".to_string()));
        assert_eq!(CellValue::infer("-012", &keep), CellValue::Text("-012".to_string()));
        assert!(CellValue::infer("0", &keep).is_number());
        assert!(CellValue::infer("0.5", &keep).is_number());
    }

    #[test]
    fn number_formats() {
        assert_eq!(number_format(0), "0");
        assert_eq!(number_format(3), "0.000");
    }

    #[test]
    fn format_codes_are_classified() {
        assert_eq!(NumberFormat::from_code("General"), NumberFormat::General);
        assert_eq!(NumberFormat::from_code("0"), NumberFormat::Fixed(0));
        assert_eq!(NumberFormat::from_code("0.00"), NumberFormat::Fixed(2));
        assert_eq!(
            NumberFormat::from_code("yyyy-mm-dd"),
            NumberFormat::Custom("yyyy-mm-dd".to_string())
        );
        assert_eq!(NumberFormat::Fixed(1).code().as_deref(), Some("0.0"));
        assert_eq!(NumberFormat::General.code(), None);
    }

    #[test]
    fn custom_codes_render_like_a_spreadsheet() {
        let custom = |code: &str| NumberFormat::Custom(code.to_string());
        assert_eq!(custom("#,##0.00").render(1234.5), "1,234.50");
        assert_eq!(custom("0.00%").render(0.125), "12.50%");
        assert_eq!(custom("$#,##0").render(-1234.0), "-$1,234");
        assert_eq!(custom("[Red]0.0").render(2.26), "2.3");
        assert_eq!(custom("#,##0").render(999.0), "999");
        assert_eq!(custom("yyyy-mm-dd").render(45000.0), "45000");
    }
}
