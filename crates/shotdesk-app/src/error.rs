// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use thiserror::Error;

/// Failure of a single roster operation. Each variant is terminal for the
/// user action that produced it; nothing is retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RosterError {
    #[error("{}", network_message(.status, .message))]
    Network {
        status: Option<u16>,
        message: String,
    },
    #[error("unexpected response: {0}")]
    Parse(String),
    #[error("{0}")]
    Validation(String),
}

impl RosterError {
    pub fn network(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::Network {
            status,
            message: message.into(),
        }
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

fn network_message(status: &Option<u16>, message: &str) -> String {
    match status {
        Some(code) => format!("server returned {code}: {message}"),
        None => message.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::RosterError;

    #[test]
    fn network_display_includes_status_when_known() {
        let error = RosterError::network(Some(404), "shot not found");
        assert_eq!(error.to_string(), "server returned 404: shot not found");

        let transport = RosterError::network(None, "cannot reach server");
        assert_eq!(transport.to_string(), "cannot reach server");
    }

    #[test]
    fn validation_display_is_the_bare_message() {
        let error = RosterError::validation("nothing selected");
        assert_eq!(error.to_string(), "nothing selected");
        assert!(error.is_validation());
    }
}
