#![deny(rust_2018_idioms)]

pub mod branches;
pub use branches::Catalog;

pub mod normalize;
pub use normalize::function::{normalize, write_normalized};

pub mod filter;
pub use filter::function::filter;

pub mod daily;
pub use daily::function::{build_daily_table, pivot};

use unicode_normalization::{char::is_combining_mark, UnicodeNormalization};

/// Turn a free-text company name into its comparable form: trimmed, lowercase and without diacritics,
/// so that "Bogotá " and "bogota" are the same company.
pub fn normalize_company(name: &str) -> String {
    name.trim()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Transform store codes as encountered in exports, like `5`, `"005"`, `" 5 "` or `5.0`, into their canonical
/// 3-digit form.
///
/// Codes that aren't numeric are returned trimmed, but otherwise unchanged.
pub fn normalize_branch_code(code: &str) -> String {
    let code = code.trim();
    let code = code.strip_suffix(".0").unwrap_or(code);
    let all_digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    if all_digits(code) {
        if let Ok(number) = code.parse::<u64>() {
            return format!("{number:03}");
        }
    }
    match code.get(..3) {
        Some(prefix) if all_digits(prefix) => prefix.to_owned(),
        _ => code.to_owned(),
    }
}
