use time::Date;

/// The columns every sales export must carry, in the order they are reported when missing.
pub const REQUIRED_COLUMNS: [&str; 10] = [
    "empresa",
    "fecha_dcto",
    "id_co",
    "id_item",
    "descripcion",
    "linea",
    "und_dia",
    "venta_sin_impuesto_dia",
    "und_acum",
    "venta_sin_impuesto_acum",
];

/// The columns appended by [`write_normalized()`](crate::write_normalized()).
pub const DERIVED_COLUMNS: [&str; 4] = ["empresa_norm", "id_co_norm", "sede", "fecha"];

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Cannot use '{0}' as delimiter")]
    InvalidDelimiter(char),
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error("Missing columns in CSV: {names:?}")]
    MissingColumns { names: Vec<String> },
}

/// A row of a sales export along with the attributes derived from it.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// The company name as it was written in the export.
    pub company: String,
    /// The date as it was written in the export.
    pub raw_date: String,
    /// The store code as it was written in the export.
    pub branch_code: String,
    pub item_id: String,
    pub description: String,
    pub line: String,
    pub units_day: f64,
    pub revenue_day: f64,
    pub units_acc: f64,
    pub revenue_acc: f64,

    /// The canonical company key.
    pub company_key: String,
    /// The canonical 3-digit store code.
    pub branch: String,
    /// The display name of the branch, or `branch` if it isn't in the catalog.
    pub branch_label: String,
    /// `None` if `raw_date` couldn't be parsed.
    pub date: Option<Date>,
}

#[derive(Clone, Debug)]
pub struct Options {
    pub delimiter: char,
}

impl Default for Options {
    fn default() -> Self {
        Options { delimiter: ',' }
    }
}

/// Parse dates like `20250901`, `"20250901.0"` or `2025-09-01`, returning `None` if it's not a valid calendar date.
pub fn parse_date(value: &str) -> Option<Date> {
    let value = value.trim();
    let value = value.strip_suffix(".0").unwrap_or(value).replace('-', "");
    if value.len() != 8 || !value.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let year: i32 = value[..4].parse().ok()?;
    let month: u8 = value[4..6].parse().ok()?;
    let day: u8 = value[6..].parse().ok()?;
    Date::from_calendar_date(year, month.try_into().ok()?, day).ok()
}

/// Parse a measure, treating anything that isn't a finite number as zero.
pub fn parse_measure(value: &str) -> f64 {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .unwrap_or_default()
}

pub(crate) mod function {
    use crate::normalize::{
        parse_date, parse_measure, Error, Options, Record, DERIVED_COLUMNS, REQUIRED_COLUMNS,
    };
    use crate::{normalize_branch_code, Catalog};
    use std::borrow::Cow;

    /// Read a sales export from `csv_data` and normalize each of its rows.
    ///
    /// Fails if any of the required columns is missing, but never because of the content of a row.
    pub fn normalize(
        csv_data: impl std::io::Read,
        catalog: &Catalog,
        Options { delimiter }: Options,
    ) -> Result<Vec<Record>, Error> {
        let delimiter = delimiter
            .try_into()
            .map_err(|_| Error::InvalidDelimiter(delimiter))?;
        let mut csv = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .flexible(true)
            .from_reader(csv_data);

        let indices = {
            let headers = csv.byte_headers()?;
            let mut missing = Vec::new();
            let mut indices = [0usize; REQUIRED_COLUMNS.len()];
            for (index, name) in indices.iter_mut().zip(REQUIRED_COLUMNS) {
                match headers.iter().position(|header| header == name.as_bytes()) {
                    Some(pos) => *index = pos,
                    None => missing.push(name.to_owned()),
                }
            }
            if !missing.is_empty() {
                return Err(Error::MissingColumns { names: missing });
            }
            indices
        };

        let mut records = Vec::new();
        let mut undated = 0usize;
        let mut row = csv::ByteRecord::new();
        while csv.read_byte_record(&mut row)? {
            let fields = indices.map(|index| decode(row.get(index).unwrap_or_default()));
            let record = normalize_row(catalog, &fields);
            if record.date.is_none() {
                undated += 1;
            }
            records.push(record);
        }

        if undated > 0 {
            tracing::warn!(
                rows = undated,
                "rows with an unparseable 'fecha_dcto' will be excluded from date ranges"
            );
        }
        tracing::debug!(rows = records.len(), "normalized sales export");
        Ok(records)
    }

    /// Write `records` as CSV, with the source columns followed by the derived ones.
    pub fn write_normalized<'a>(
        records: impl IntoIterator<Item = &'a Record>,
        out: impl std::io::Write,
    ) -> Result<(), csv::Error> {
        static ISO_DATE: &[time::format_description::FormatItem<'static>] =
            time::macros::format_description!("[year]-[month]-[day]");
        let mut out = csv::WriterBuilder::new().delimiter(b',').from_writer(out);
        out.write_record(REQUIRED_COLUMNS.iter().chain(DERIVED_COLUMNS.iter()))?;
        for record in records {
            let date = record
                .date
                .map(|date| date.format(ISO_DATE).expect("static format always applies"))
                .unwrap_or_default();
            out.write_record([
                record.company.as_str(),
                &record.raw_date,
                &record.branch_code,
                &record.item_id,
                &record.description,
                &record.line,
                &record.units_day.to_string(),
                &record.revenue_day.to_string(),
                &record.units_acc.to_string(),
                &record.revenue_acc.to_string(),
                &record.company_key,
                &record.branch,
                &record.branch_label,
                &date,
            ])?;
        }
        out.flush()?;
        Ok(())
    }

    /// Decode a field as UTF-8, or as Latin-1 if it isn't valid UTF-8 as is common for exports of older systems.
    fn decode(field: &[u8]) -> Cow<'_, str> {
        match std::str::from_utf8(field) {
            Ok(field) => Cow::Borrowed(field),
            Err(_) => Cow::Owned(field.iter().map(|b| char::from(*b)).collect()),
        }
    }

    fn normalize_row(
        catalog: &Catalog,
        [company, raw_date, branch_code, item_id, description, line, units_day, revenue_day, units_acc, revenue_acc]: &[Cow<'_, str>; 10],
    ) -> Record {
        let company_key = catalog.company_key(company);
        let branch = normalize_branch_code(branch_code);
        let branch_label = catalog.branch_label(&company_key, &branch).to_owned();
        Record {
            company: company.to_string(),
            raw_date: raw_date.to_string(),
            branch_code: branch_code.to_string(),
            item_id: item_id.trim().to_owned(),
            description: description.trim().to_owned(),
            line: line.to_string(),
            units_day: parse_measure(units_day),
            revenue_day: parse_measure(revenue_day),
            units_acc: parse_measure(units_acc),
            revenue_acc: parse_measure(revenue_acc),
            date: parse_date(raw_date),
            company_key,
            branch,
            branch_label,
        }
    }
}
