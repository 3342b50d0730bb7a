use crate::options::Args;
use anyhow::{bail, Context};
use clap::Parser;
use std::path::Path;
use ventool::filter::{self, ItemQuery};
use ventool::Catalog;

mod options {
    use std::path::PathBuf;
    use time::Date;

    #[derive(Debug, clap::Parser)]
    #[command(name = "ventool", about = "A tool to turn sales exports into daily tables per branch")]
    pub enum Args {
        /// Validate a sales export and print it with its derived columns: company key, store code, branch and date.
        Normalize {
            #[clap(long, short = 'd', default_value = ",")]
            delimiter: char,
            /// A RON file with the companies and branches to use instead of the built-in ones.
            #[clap(long, short = 'b')]
            branches: Option<PathBuf>,
            /// The CSV file with the sales export.
            csv_file: PathBuf,
        },
        /// List all items of a sales export as 'id - description', one per line.
        Items {
            #[clap(long, short = 'd', default_value = ",")]
            delimiter: char,
            csv_file: PathBuf,
        },
        /// Print a table with the units sold per day and branch, a daily total and a summary row.
        ///
        /// Without a range, all days between the first and the last valid date of the export are shown.
        Daily {
            #[clap(long, short = 'd', default_value = ",")]
            delimiter: char,
            #[clap(long, short = 'b')]
            branches: Option<PathBuf>,
            /// Only use sales of this company.
            #[clap(long, short = 'c')]
            company: Option<String>,
            /// The first day to show, like 2025-09-01.
            #[clap(long, value_parser = parse_date, conflicts_with = "month")]
            from: Option<Date>,
            /// The last day to show, inclusive.
            #[clap(long, value_parser = parse_date, conflicts_with = "month")]
            to: Option<Date>,
            /// Show all days of this month, like 2025-09.
            #[clap(long, short = 'm', value_parser = parse_month)]
            month: Option<Date>,
            /// Only use sales of these items, given by id, 'id - description' or a piece of the description.
            #[clap(long = "item", short = 'i')]
            items: Vec<String>,
            /// The label of the summary row. Defaults to 'Acum. Mes:' with --month and 'Acum. Rango:' otherwise.
            #[clap(long, short = 'f')]
            footer: Option<String>,
            /// Print plain numbers with ISO dates and without summary row, for plotting.
            #[clap(long)]
            numeric: bool,
            csv_file: PathBuf,
        },
    }

    fn parse_date(value: &str) -> Result<Date, String> {
        static FORMAT: &[time::format_description::FormatItem<'static>] =
            time::macros::format_description!("[year]-[month]-[day]");
        Date::parse(value, FORMAT).map_err(|err| format!("expected a date like 2025-09-01: {err}"))
    }

    fn parse_month(value: &str) -> Result<Date, String> {
        parse_date(&format!("{value}-01"))
            .map_err(|_| format!("expected a month like 2025-09, got '{value}'"))
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = options::Args::parse();
    let stdout = std::io::BufWriter::new(std::io::stdout());
    match args {
        Args::Normalize {
            delimiter,
            branches,
            csv_file,
        } => {
            let catalog = catalog(branches.as_deref())?;
            let records = load(&csv_file, &catalog, delimiter)?;
            ventool::write_normalized(&records, stdout)?;
        }
        Args::Items {
            delimiter,
            csv_file,
        } => {
            use std::io::Write;
            let records = load(&csv_file, Catalog::builtin(), delimiter)?;
            let mut out = stdout;
            for item in filter::items_display_list(&records) {
                writeln!(out, "{item}")?;
            }
            out.flush()?;
        }
        Args::Daily {
            delimiter,
            branches,
            company,
            from,
            to,
            month,
            items,
            footer,
            numeric,
            csv_file,
        } => {
            let catalog = catalog(branches.as_deref())?;
            let records = load(&csv_file, &catalog, delimiter)?;
            let (start, end) = match month {
                Some(month) => filter::month_bounds(month),
                None => {
                    let span = filter::date_span(&records);
                    match (from.or(span.map(|s| s.0)), to.or(span.map(|s| s.1))) {
                        (Some(start), Some(end)) => (start, end),
                        _ => bail!(
                            "There are no valid dates in '{}', please provide --from and --to",
                            csv_file.display()
                        ),
                    }
                }
            };
            let footer = footer.unwrap_or_else(|| {
                let label = if month.is_some() { "Acum. Mes:" } else { "Acum. Rango:" };
                label.into()
            });
            let selected = ventool::filter(
                &records,
                &catalog,
                &filter::Filter {
                    company,
                    start: Some(start),
                    end: Some(end),
                    items: items.iter().map(|item| ItemQuery::parse(item)).collect(),
                },
            );
            tracing::info!(
                records = selected.len(),
                %start,
                %end,
                "building daily table"
            );
            if numeric {
                ventool::pivot(selected, &catalog, start, end)?.write_csv(stdout)?;
            } else {
                ventool::build_daily_table(
                    selected,
                    &catalog,
                    ventool::daily::Options {
                        start,
                        end,
                        total_label: footer,
                    },
                )?
                .write_csv(stdout)?;
            }
        }
    };
    Ok(())
}

fn catalog(path: Option<&Path>) -> anyhow::Result<Catalog> {
    Ok(match path {
        Some(path) => Catalog::from_path(path)
            .with_context(|| format!("Could not load branch catalog from '{}'", path.display()))?,
        None => Catalog::builtin().clone(),
    })
}

fn load(
    path: &Path,
    catalog: &Catalog,
    delimiter: char,
) -> anyhow::Result<Vec<ventool::normalize::Record>> {
    let data = std::fs::read(path)
        .with_context(|| format!("Could not read from CSV file at '{}'", path.display()))?;
    ventool::normalize(
        std::io::Cursor::new(data),
        catalog,
        ventool::normalize::Options { delimiter },
    )
    .with_context(|| format!("Could not process the sales export at '{}'", path.display()))
}
