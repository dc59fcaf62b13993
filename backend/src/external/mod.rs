//! External service integrations

pub mod mail;

pub use mail::{LogMailer, MailError, Mailer, SmtpMailer};
