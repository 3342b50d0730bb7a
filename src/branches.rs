//! The catalog of companies and their branches, used to turn store codes into display names
//! and to decide the order of branch columns.

use once_cell::sync::Lazy;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Failed to open branch catalog file for reading")]
    Open(#[from] std::io::Error),
    #[error("Could not decode the branch catalog")]
    Decode(#[from] ron::de::SpannedError),
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Branch {
    /// The canonical 3-digit store code.
    pub code: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Company {
    /// The canonical company key, lowercase and without diacritics.
    pub key: String,
    /// Alternate spellings that resolve to `key`.
    #[serde(default)]
    pub aliases: Vec<String>,
    /// Branches in the order their columns should appear.
    pub branches: Vec<Branch>,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Catalog {
    /// Companies in priority order.
    pub companies: Vec<Company>,
}

static BUILTIN: Lazy<Catalog> = Lazy::new(|| {
    fn company(key: &str, aliases: &[&str], branches: &[(&str, &str)]) -> Company {
        Company {
            key: key.into(),
            aliases: aliases.iter().map(|a| a.to_string()).collect(),
            branches: branches
                .iter()
                .map(|(code, label)| Branch {
                    code: code.to_string(),
                    label: label.to_string(),
                })
                .collect(),
        }
    }
    Catalog {
        companies: vec![
            company(
                "mercamio",
                &["merca mio", "merca-mio"],
                &[
                    ("001", "La 5"),
                    ("002", "La 39"),
                    ("003", "Plaza"),
                    ("004", "Jardin"),
                    ("005", "C.sur"),
                    ("006", "Palmira"),
                ],
            ),
            company(
                "mercatodo",
                &["merca todo", "merca-todo"],
                &[("001", "FTA"), ("002", "FLA"), ("003", "MN")],
            ),
            company(
                "bogota",
                &["bogota d.c.", "bogota dc"],
                &[("001", "La 80"), ("002", "Chia")],
            ),
        ],
    }
});

impl Catalog {
    /// The catalog compiled into the binary. It is built on first use and never changes.
    pub fn builtin() -> &'static Catalog {
        &BUILTIN
    }

    pub fn from_ron(read: impl std::io::Read) -> Result<Self, Error> {
        Ok(ron::de::from_reader(read)?)
    }

    pub fn from_path(path: impl AsRef<std::path::Path>) -> Result<Self, Error> {
        Self::from_ron(std::fs::File::open(path)?)
    }

    /// Normalize `raw` and resolve known aliases to their company key.
    pub fn company_key(&self, raw: &str) -> String {
        let key = crate::normalize_company(raw);
        self.companies
            .iter()
            .find(|company| {
                company
                    .aliases
                    .iter()
                    .any(|alias| crate::normalize_company(alias) == key)
            })
            .map(|company| company.key.clone())
            .unwrap_or(key)
    }

    pub fn company(&self, key: &str) -> Option<&Company> {
        self.companies.iter().find(|company| company.key == key)
    }

    /// Return the display name of branch `code` of the company with `company_key`, or `code` itself
    /// if either is unknown.
    pub fn branch_label<'a>(&'a self, company_key: &str, code: &'a str) -> &'a str {
        self.company(company_key)
            .and_then(|company| company.branches.iter().find(|branch| branch.code == code))
            .map(|branch| branch.label.as_str())
            .unwrap_or(code)
    }

    /// Put `present` labels into column order: each company's preferred sequence in company priority order,
    /// followed by all unclassified labels in the order they were passed.
    pub fn column_order<'a>(&self, present: impl IntoIterator<Item = &'a str>) -> Vec<String> {
        let present: Vec<&str> = present.into_iter().collect();
        let mut out = Vec::<String>::with_capacity(present.len());
        for branch in self.companies.iter().flat_map(|company| &company.branches) {
            if present.contains(&branch.label.as_str())
                && !out.iter().any(|label| *label == branch.label)
            {
                out.push(branch.label.clone());
            }
        }
        for label in present {
            if !out.iter().any(|known| known == label) {
                out.push(label.to_owned());
            }
        }
        out
    }
}
