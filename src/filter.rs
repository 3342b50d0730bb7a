//! Select the records to aggregate by company, date window and items.
use crate::normalize::Record;
use time::Date;

/// A single item selection, either by its id or by a piece of its description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemQuery {
    Id(String),
    /// A lowercase needle to find in the description.
    Description(String),
}

impl ItemQuery {
    /// Interpret `text` as written by a user or picked from [`items_display_list()`]:
    /// `"1234 - Arroz"` and `"1234"` select by id, everything else searches descriptions.
    pub fn parse(text: &str) -> Self {
        if let Some((id, _description)) = text.split_once(" - ") {
            return ItemQuery::Id(id.trim().to_owned());
        }
        let trimmed = text.trim();
        if !trimmed.is_empty() && trimmed.bytes().all(|b| b.is_ascii_digit()) {
            ItemQuery::Id(trimmed.to_owned())
        } else {
            ItemQuery::Description(trimmed.to_lowercase())
        }
    }

    pub fn matches(&self, record: &Record) -> bool {
        match self {
            ItemQuery::Id(id) => record.item_id == *id,
            ItemQuery::Description(needle) => {
                record.description.to_lowercase().contains(needle.as_str())
            }
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Filter {
    /// The company name as entered, it's resolved to a key before comparison.
    pub company: Option<String>,
    /// The first day to include.
    pub start: Option<Date>,
    /// The last day to include.
    pub end: Option<Date>,
    /// If not empty, a record must match at least one of these.
    pub items: Vec<ItemQuery>,
}

/// Return all items of `records` as unique and sorted `"id - description"` strings.
pub fn items_display_list<'a>(records: impl IntoIterator<Item = &'a Record>) -> Vec<String> {
    let items: std::collections::BTreeSet<_> = records
        .into_iter()
        .map(|record| format!("{} - {}", record.item_id, record.description))
        .collect();
    items.into_iter().collect()
}

/// Return the earliest and latest valid date in `records`, or `None` if there is none.
pub fn date_span<'a>(records: impl IntoIterator<Item = &'a Record>) -> Option<(Date, Date)> {
    records
        .into_iter()
        .filter_map(|record| record.date)
        .fold(None, |span, date| match span {
            None => Some((date, date)),
            Some((first, last)) => Some((first.min(date), last.max(date))),
        })
}

/// Return the first and the last day of the month `date` is in.
pub fn month_bounds(date: Date) -> (Date, Date) {
    let (year, month) = (date.year(), date.month());
    let day = |day| Date::from_calendar_date(year, month, day).expect("day is within the month");
    (day(1), day(time::util::days_in_year_month(year, month)))
}

pub(crate) mod function {
    use crate::filter::Filter;
    use crate::normalize::Record;
    use crate::Catalog;

    /// Return the records that are selected by `filter`, in their original order.
    ///
    /// As soon as a date bound is set, records without a valid date are excluded.
    pub fn filter<'a>(
        records: impl IntoIterator<Item = &'a Record>,
        catalog: &Catalog,
        Filter {
            company,
            start,
            end,
            items,
        }: &Filter,
    ) -> Vec<&'a Record> {
        let company = company.as_deref().map(|name| catalog.company_key(name));
        let out: Vec<_> = records
            .into_iter()
            .filter(|record| company.as_ref().map_or(true, |key| record.company_key == *key))
            .filter(|record| {
                if start.is_none() && end.is_none() {
                    return true;
                }
                record.date.map_or(false, |date| {
                    start.map_or(true, |start| date >= start) && end.map_or(true, |end| date <= end)
                })
            })
            .filter(|record| items.is_empty() || items.iter().any(|item| item.matches(record)))
            .collect();
        tracing::debug!(selected = out.len(), "filtered records");
        out
    }
}
