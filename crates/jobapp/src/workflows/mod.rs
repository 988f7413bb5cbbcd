pub mod ledger;
pub mod letter;
pub mod mailer;
pub mod submission;
