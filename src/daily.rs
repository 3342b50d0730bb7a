use time::{Date, Weekday};

/// The header of the leading date column.
pub const DATE_COLUMN: &str = "Fecha";
/// The header of the column with the per-day total across branches.
pub const TOTAL_COLUMN: &str = "T. Dia";
/// What's shown instead of a zero in display tables.
pub const ZERO_PLACEHOLDER: &str = "-";

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("The first day {start} of the range is after its last day {end}")]
    InvalidRange { start: Date, end: Date },
}

#[derive(Clone, Debug)]
pub struct Options {
    /// The first day of the table.
    pub start: Date,
    /// The last day of the table, inclusive.
    pub end: Date,
    /// The label of the summary row, like `Acum. Rango:` or `Acum. Mes:`.
    pub total_label: String,
}

/// Units sold per day and branch, with one row for every day of the range.
#[derive(Clone, Debug, PartialEq)]
pub struct Pivot {
    /// Every day from the first to the last, ascending and without gaps.
    pub dates: Vec<Date>,
    /// The branch labels in column order.
    pub branches: Vec<String>,
    /// One row per entry in `dates` with one value per entry in `branches`.
    pub units: Vec<Vec<f64>>,
}

/// A pivot prepared for display, with all values formatted as text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Table {
    /// `Fecha`, one column per branch, and `T. Dia`.
    pub header: Vec<String>,
    /// One row per day, followed by the summary row.
    pub rows: Vec<Vec<String>>,
}

impl Pivot {
    /// The sum of each row across all branches.
    pub fn daily_totals(&self) -> Vec<f64> {
        self.units.iter().map(|row| row.iter().sum()).collect()
    }

    /// The sum of each branch column over all days.
    pub fn branch_totals(&self) -> Vec<f64> {
        let mut totals = vec![0.0; self.branches.len()];
        for row in &self.units {
            for (total, value) in totals.iter_mut().zip(row) {
                *total += value;
            }
        }
        totals
    }

    /// Turn this instance into a display table whose last row is labeled `total_label`.
    pub fn to_table(&self, total_label: &str) -> Table {
        let mut header = Vec::with_capacity(self.branches.len() + 2);
        header.push(DATE_COLUMN.to_owned());
        header.extend(self.branches.iter().cloned());
        header.push(TOTAL_COLUMN.to_owned());

        let mut rows: Vec<Vec<String>> = self
            .dates
            .iter()
            .zip(&self.units)
            .zip(self.daily_totals())
            .map(|((date, units), total)| {
                std::iter::once(day_label(*date))
                    .chain(units.iter().chain(Some(&total)).map(|v| format_units(*v)))
                    .collect()
            })
            .collect();

        let branch_totals = self.branch_totals();
        let grand_total: f64 = self.daily_totals().iter().sum();
        rows.push(
            std::iter::once(total_label.to_owned())
                .chain(
                    branch_totals
                        .iter()
                        .chain(Some(&grand_total))
                        .map(|v| format_units(*v)),
                )
                .collect(),
        );
        Table { header, rows }
    }

    /// Write the numeric variant as CSV for consumers that plot a time axis: ISO dates, plain numbers
    /// including zeros, the daily total, and no summary row.
    pub fn write_csv(&self, out: impl std::io::Write) -> Result<(), csv::Error> {
        static ISO_DATE: &[time::format_description::FormatItem<'static>] =
            time::macros::format_description!("[year]-[month]-[day]");
        let mut out = csv::WriterBuilder::new().delimiter(b',').from_writer(out);
        let mut record = csv::StringRecord::new();
        record.push_field(DATE_COLUMN);
        for branch in &self.branches {
            record.push_field(branch);
        }
        record.push_field(TOTAL_COLUMN);
        out.write_record(&record)?;

        for ((date, units), total) in self.dates.iter().zip(&self.units).zip(self.daily_totals()) {
            record.clear();
            record.push_field(
                &date
                    .format(ISO_DATE)
                    .expect("static format always applies"),
            );
            for value in units {
                record.push_field(&value.to_string());
            }
            record.push_field(&total.to_string());
            out.write_record(&record)?;
        }
        out.flush()?;
        Ok(())
    }
}

impl Table {
    /// Return all values of the column named `name`, including the summary row.
    pub fn column(&self, name: &str) -> Option<Vec<&str>> {
        let index = self.header.iter().position(|header| header == name)?;
        Some(self.rows.iter().map(|row| row[index].as_str()).collect())
    }

    /// The trailing summary row.
    pub fn summary(&self) -> &[String] {
        self.rows.last().map(Vec::as_slice).unwrap_or_default()
    }

    pub fn write_csv(&self, out: impl std::io::Write) -> Result<(), csv::Error> {
        let mut out = csv::WriterBuilder::new().delimiter(b',').from_writer(out);
        out.write_record(&self.header)?;
        for row in &self.rows {
            out.write_record(row)?;
        }
        out.flush()?;
        Ok(())
    }
}

/// Format `date` as day of month and Spanish weekday abbreviation, like `7/dom`.
pub fn day_label(date: Date) -> String {
    let weekday = match date.weekday() {
        Weekday::Monday => "lun",
        Weekday::Tuesday => "mar",
        Weekday::Wednesday => "mié",
        Weekday::Thursday => "jue",
        Weekday::Friday => "vie",
        Weekday::Saturday => "sáb",
        Weekday::Sunday => "dom",
    };
    format!("{}/{weekday}", date.day())
}

/// Format a number of units for display: whole numbers without decimals, zero as placeholder,
/// and everything else rounded to one decimal.
pub fn format_units(value: f64) -> String {
    let rounded = value.round();
    if (value - rounded).abs() < 1e-9 {
        if rounded == 0.0 {
            ZERO_PLACEHOLDER.to_owned()
        } else {
            format!("{rounded:.0}")
        }
    } else {
        format!("{value:.1}")
    }
}

pub(crate) mod function {
    use crate::daily::{Error, Options, Pivot, Table};
    use crate::normalize::Record;
    use crate::Catalog;
    use std::collections::BTreeMap;
    use time::Date;

    /// Sum the units sold per day and branch of `records` for every day from `start` to `end`.
    ///
    /// Days without sales are present with all zeros, and records dated outside of the range
    /// or without a valid date are ignored.
    pub fn pivot<'a>(
        records: impl IntoIterator<Item = &'a Record>,
        catalog: &Catalog,
        start: Date,
        end: Date,
    ) -> Result<Pivot, Error> {
        if start > end {
            return Err(Error::InvalidRange { start, end });
        }
        let mut dates = Vec::new();
        let mut date = Some(start);
        while let Some(day) = date.filter(|day| *day <= end) {
            dates.push(day);
            date = day.next_day();
        }

        let mut encountered = Vec::<&str>::new();
        let mut sums = BTreeMap::<(Date, usize), f64>::new();
        for record in records {
            let Some(date) = record.date.filter(|date| (start..=end).contains(date)) else {
                continue;
            };
            let label = record.branch_label.as_str();
            let column = match encountered.iter().position(|known| *known == label) {
                Some(column) => column,
                None => {
                    encountered.push(label);
                    encountered.len() - 1
                }
            };
            *sums.entry((date, column)).or_default() += record.units_day;
        }

        let branches = catalog.column_order(encountered.iter().copied());
        let columns: Vec<usize> = branches
            .iter()
            .filter_map(|branch| encountered.iter().position(|known| *known == branch.as_str()))
            .collect();
        let units = dates
            .iter()
            .map(|date| {
                columns
                    .iter()
                    .map(|column| sums.get(&(*date, *column)).copied().unwrap_or_default())
                    .collect()
            })
            .collect();
        tracing::debug!(
            days = dates.len(),
            branches = branches.len(),
            "built daily pivot"
        );
        Ok(Pivot {
            dates,
            branches,
            units,
        })
    }

    /// Build the display table of units sold per day and branch, closed by a summary row labeled `total_label`.
    pub fn build_daily_table<'a>(
        records: impl IntoIterator<Item = &'a Record>,
        catalog: &Catalog,
        Options {
            start,
            end,
            total_label,
        }: Options,
    ) -> Result<Table, Error> {
        Ok(pivot(records, catalog, start, end)?.to_table(&total_label))
    }
}
