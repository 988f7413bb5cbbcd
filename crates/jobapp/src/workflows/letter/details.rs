use chrono::NaiveDate;

use super::renderer::RenderError;
use super::variables::TemplateVariables;
use crate::config::FieldMapping;
use crate::workflows::ledger::{ApplicationRecord, VacancyId};

/// The parts of a letter the send pipeline needs by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicationDetails {
    pub identifier: VacancyId,
    pub title: String,
    pub organization: String,
    pub recipient_name: String,
    pub recipient_address: String,
}

impl ApplicationDetails {
    pub fn from_variables(
        variables: &TemplateVariables,
        fields: &FieldMapping,
    ) -> Result<Self, RenderError> {
        let identifier = VacancyId::new(variables.require(&fields.identifier)?);
        if identifier.as_str().is_empty() {
            return Err(RenderError::EmptyValue {
                name: fields.identifier.clone(),
            });
        }

        Ok(Self {
            identifier,
            title: variables.require(&fields.title)?.trim().to_string(),
            organization: variables.require(&fields.organization)?.to_string(),
            recipient_name: variables.require(&fields.recipient_name)?.trim().to_string(),
            recipient_address: variables.require(&fields.recipient_address)?.trim().to_string(),
        })
    }

    /// Ledger row for this application, dated `submitted_on`.
    pub fn record(&self, submitted_on: NaiveDate) -> ApplicationRecord {
        ApplicationRecord::new(
            submitted_on,
            self.identifier.clone(),
            &self.title,
            &self.organization,
        )
    }
}
