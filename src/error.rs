use crate::models::MailchimpError;
use std::fmt::Display;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Credentials not set: {0}")]
    CredentialsNotSet(Credential),
    #[error("Invalid data center code {0:?}: expected \"us1\" to \"us16\"")]
    InvalidDataCenter(String),
    #[error("Request error: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Mailchimp error: {0}")]
    Api(MailchimpError),
    #[error("Invalid response body: {0}")]
    Body(#[from] serde_json::Error),
}

/// The piece of configuration a call was missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Credential {
    ApiKey,
    ListId,
}

impl Display for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Credential::ApiKey => f.write_str("API key"),
            Credential::ListId => f.write_str("default list id"),
        }
    }
}
