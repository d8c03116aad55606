//! Contact form model: field validation, submission state and delivery.

use regex::Regex;
use std::fmt;
use std::sync::LazyLock;
use thiserror::Error;

pub const SUCCESS_MESSAGE: &str = "Message sent successfully! I will get back to you soon.";

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));

/// `local@domain.tld` shaped, no whitespace, exactly one `@`.
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Name,
    Email,
    Subject,
    Message,
}

impl Field {
    pub const ALL: [Field; 4] = [Field::Name, Field::Email, Field::Subject, Field::Message];

    /// The `name` attribute of the form control.
    pub fn name(self) -> &'static str {
        match self {
            Field::Name => "name",
            Field::Email => "email",
            Field::Subject => "subject",
            Field::Message => "message",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please fill in all fields.")]
    MissingField(Field),
    #[error("Please enter a valid email address.")]
    InvalidEmail,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubmitError {
    #[error("Failed to send message. Please try again.")]
    Delivery { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ContactMessage {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
}

impl ContactMessage {
    /// Build a message by looking up each field through `value_of`.
    pub fn from_fields(mut value_of: impl FnMut(Field) -> String) -> Self {
        Self {
            name: value_of(Field::Name),
            email: value_of(Field::Email),
            subject: value_of(Field::Subject),
            message: value_of(Field::Message),
        }
    }

    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::Name => &self.name,
            Field::Email => &self.email,
            Field::Subject => &self.subject,
            Field::Message => &self.message,
        }
    }

    /// Empty fields are reported before a malformed email.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(field) = Field::ALL.into_iter().find(|f| self.get(*f).is_empty()) {
            return Err(ValidationError::MissingField(field));
        }
        if !is_valid_email(&self.email) {
            return Err(ValidationError::InvalidEmail);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormState {
    #[default]
    Idle,
    Validating,
    Submitting,
    Success,
    Error,
}

/// Where a validated message goes once the send delay has elapsed.
pub trait Outbox {
    fn deliver(&mut self, message: &ContactMessage) -> Result<(), SubmitError>;
}

/// Accepts every message without sending it anywhere.
#[derive(Debug, Default)]
pub struct SimulatedOutbox;

impl Outbox for SimulatedOutbox {
    fn deliver(&mut self, message: &ContactMessage) -> Result<(), SubmitError> {
        log::info!("simulated delivery of contact message ({} chars)", message.message.len());
        Ok(())
    }
}
