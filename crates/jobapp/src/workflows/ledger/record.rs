use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Opaque vacancy token; compared as text, never parsed as a number.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VacancyId(String);

impl VacancyId {
    pub fn new(raw: impl AsRef<str>) -> Self {
        Self(raw.as_ref().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VacancyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One ledger row. Field order is the on-disk column order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationRecord {
    pub submitted_on: NaiveDate,
    pub identifier: VacancyId,
    pub title: String,
    pub organization: String,
}

impl ApplicationRecord {
    pub fn new(
        submitted_on: NaiveDate,
        identifier: VacancyId,
        title: &str,
        organization: &str,
    ) -> Self {
        Self {
            submitted_on,
            identifier,
            title: title.trim().to_string(),
            organization: organization.to_string(),
        }
    }

    pub(crate) fn contains(&self, needle: &str) -> bool {
        self.submitted_on.to_string().contains(needle)
            || self.identifier.as_str().contains(needle)
            || self.title.contains(needle)
            || self.organization.contains(needle)
    }
}

impl fmt::Display for ApplicationRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} | {} | {} | {}",
            self.submitted_on, self.identifier, self.title, self.organization
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_trims_title_but_not_organization_content() {
        let date = NaiveDate::from_ymd_opt(2025, 9, 24).expect("valid date");
        let record = ApplicationRecord::new(
            date,
            VacancyId::new(" 55555 "),
            " Budget Analyst ",
            "Dept of X",
        );

        assert_eq!(record.identifier.as_str(), "55555");
        assert_eq!(record.title, "Budget Analyst");
        assert_eq!(record.organization, "Dept of X");
        assert_eq!(
            record.to_string(),
            "2025-09-24 | 55555 | Budget Analyst | Dept of X"
        );
    }

    #[test]
    fn identifiers_keep_leading_zeros() {
        assert_ne!(VacancyId::new("0042"), VacancyId::new("42"));
    }
}
