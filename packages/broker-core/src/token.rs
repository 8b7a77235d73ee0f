//! Operation token codec.
//!
//! The OSB polling call carries only an instance id and the opaque `operation`
//! string returned by the async response. In a multi-service broker that string
//! is the only way to learn which service issued the operation, so the router
//! prefixes the service id to whatever marker the service returned.
//!
//! # Wire format
//!
//! ```text
//! token          = service-id [ SP operation-data ]
//! service-id     = 1*<any char except SP>
//! operation-data = *<any char>
//! ```
//!
//! Decoding splits on the first space only, so `operation-data` may contain
//! spaces. A token without a space is a bare service id with no operation data.

use std::fmt;
use std::str::FromStr;

/// Separates the service id from the operation data.
pub const DELIMITER: char = ' ';

/// Errors from building or parsing an [`OperationToken`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("operation token is empty")]
    Empty,
    #[error("operation token has an empty service id")]
    MissingServiceId,
    #[error("service id {service_id:?} contains the token delimiter")]
    DelimiterInServiceId { service_id: String },
}

/// `(service_id, operation_data)` pair carried through the polling round trip.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OperationToken {
    service_id: String,
    operation_data: Option<String>,
}

impl OperationToken {
    /// Builds a token.
    ///
    /// # Errors
    ///
    /// Returns `TokenError` if `service_id` is empty or contains [`DELIMITER`];
    /// either would make the encoded token decode to a different service id.
    pub fn new(
        service_id: impl Into<String>,
        operation_data: Option<String>,
    ) -> Result<Self, TokenError> {
        let service_id = service_id.into();
        if service_id.is_empty() {
            return Err(TokenError::MissingServiceId);
        }
        if service_id.contains(DELIMITER) {
            return Err(TokenError::DelimiterInServiceId { service_id });
        }
        Ok(Self {
            service_id,
            operation_data,
        })
    }

    /// Parses an encoded token.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Empty` for an empty string and
    /// `TokenError::MissingServiceId` when the token starts with the delimiter.
    pub fn decode(token: &str) -> Result<Self, TokenError> {
        if token.is_empty() {
            return Err(TokenError::Empty);
        }
        let (service_id, operation_data) = match token.split_once(DELIMITER) {
            Some((service_id, rest)) => (service_id, Some(rest.to_string())),
            None => (token, None),
        };
        if service_id.is_empty() {
            return Err(TokenError::MissingServiceId);
        }
        Ok(Self {
            service_id: service_id.to_string(),
            operation_data,
        })
    }

    /// Encodes the token into its wire string.
    #[must_use]
    pub fn encode(&self) -> String {
        self.to_string()
    }

    #[must_use]
    pub fn service_id(&self) -> &str {
        &self.service_id
    }

    #[must_use]
    pub fn operation_data(&self) -> Option<&str> {
        self.operation_data.as_deref()
    }

    #[must_use]
    pub fn into_parts(self) -> (String, Option<String>) {
        (self.service_id, self.operation_data)
    }
}

impl fmt::Display for OperationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.operation_data {
            Some(data) => write!(f, "{}{DELIMITER}{data}", self.service_id),
            None => f.write_str(&self.service_id),
        }
    }
}

impl FromStr for OperationToken {
    type Err = TokenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::decode(s)
    }
}
