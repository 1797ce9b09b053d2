// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Basic-auth credentials and static bearer tokens.

use super::config::{BasicAuthConfig, BasicAuthFormat, StaticTokenConfig};
use super::SecretData;
use crate::constants::{
    DATA_KEY_CSV, DATA_KEY_PASSWORD, DATA_KEY_STATIC_TOKEN_CSV, DATA_KEY_USER_NAME,
    STATIC_TOKEN_LENGTH, SYSTEM_PRIVILEGED_GROUP,
};
use crate::errors::SecretsError;
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::Serialize;

/// Random alphanumeric string of `length` characters.
#[must_use]
pub fn random_string(length: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}

/// A username and password pair.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BasicAuth {
    pub name: String,
    pub format: BasicAuthFormat,
    pub username: String,
    pub password: String,
}

impl BasicAuth {
    #[must_use]
    pub fn generate(config: &BasicAuthConfig) -> Self {
        Self {
            name: config.name.clone(),
            format: config.format,
            username: config.username.clone(),
            password: random_string(config.password_length),
        }
    }

    #[must_use]
    pub fn secret_data(&self) -> SecretData {
        let mut data = SecretData::new();
        match self.format {
            BasicAuthFormat::Normal => {
                data.insert(DATA_KEY_USER_NAME.to_string(), self.username.clone().into_bytes());
                data.insert(DATA_KEY_PASSWORD.to_string(), self.password.clone().into_bytes());
            }
            BasicAuthFormat::Csv => {
                let line = format!(
                    "{},{},{},{}",
                    self.password, self.username, self.username, SYSTEM_PRIVILEGED_GROUP
                );
                data.insert(DATA_KEY_CSV.to_string(), line.into_bytes());
            }
        }
        data
    }

    /// Rebuild credentials from stored secret data.
    ///
    /// # Errors
    ///
    /// Returns an error if the keys of the configured format are missing or
    /// the CSV line is malformed.
    pub fn from_secret_data(config: &BasicAuthConfig, data: &SecretData) -> Result<Self, SecretsError> {
        let (username, password) = match config.format {
            BasicAuthFormat::Normal => (
                utf8_value(&config.name, data, DATA_KEY_USER_NAME)?,
                utf8_value(&config.name, data, DATA_KEY_PASSWORD)?,
            ),
            BasicAuthFormat::Csv => {
                let csv = utf8_value(&config.name, data, DATA_KEY_CSV)?;
                let mut fields = csv.trim().splitn(3, ',');
                match (fields.next(), fields.next()) {
                    (Some(password), Some(username)) if !password.is_empty() => {
                        (username.to_string(), password.to_string())
                    }
                    _ => {
                        return Err(SecretsError::MalformedLedgerEntry {
                            name: config.name.clone(),
                            reason: format!("{DATA_KEY_CSV} is not a password,user,... line"),
                        })
                    }
                }
            }
        };

        Ok(Self {
            name: config.name.clone(),
            format: config.format,
            username,
            password,
        })
    }
}

/// A bearer token bound to a user.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Token {
    pub username: String,
    pub user_id: String,
    pub groups: Vec<String>,
    pub token: String,
}

impl Token {
    fn csv_line(&self) -> String {
        let mut line = format!("{},{},{}", self.token, self.username, self.user_id);
        if !self.groups.is_empty() {
            line.push_str(&format!(",\"{}\"", self.groups.join(",")));
        }
        line
    }

    fn parse_csv_line(line: &str) -> Option<Self> {
        let mut fields = line.splitn(4, ',');
        let token = fields.next()?.to_string();
        let username = fields.next()?.to_string();
        let user_id = fields.next()?.to_string();
        let groups = fields
            .next()
            .map(|g| {
                g.trim_matches('"')
                    .split(',')
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        if token.is_empty() || username.is_empty() {
            return None;
        }

        Some(Self {
            username,
            user_id,
            groups,
            token,
        })
    }
}

/// The static token file of the kube-apiserver.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StaticToken {
    pub name: String,
    pub tokens: Vec<Token>,
}

impl StaticToken {
    /// Issue a fresh token for every configured identity.
    #[must_use]
    pub fn generate(config: &StaticTokenConfig) -> Self {
        let tokens = config
            .tokens
            .values()
            .map(|t| Token {
                username: t.username.clone(),
                user_id: t.user_id.clone(),
                groups: t.groups.clone(),
                token: random_string(STATIC_TOKEN_LENGTH),
            })
            .collect();

        Self {
            name: config.name.clone(),
            tokens,
        }
    }

    /// Bring an existing token set in line with `config`.
    ///
    /// Tokens of identities still configured are kept as they are, missing
    /// identities get a fresh token and identities no longer configured are
    /// dropped. Returns `true` if anything changed.
    pub fn reconcile(&mut self, config: &StaticTokenConfig) -> bool {
        let before = self.tokens.len();
        self.tokens.retain(|existing| {
            config
                .tokens
                .values()
                .any(|t| t.username == existing.username && t.user_id == existing.user_id)
        });
        let mut changed = self.tokens.len() != before;

        for wanted in config.tokens.values() {
            if self.tokens.iter().all(|t| t.username != wanted.username) {
                self.tokens.push(Token {
                    username: wanted.username.clone(),
                    user_id: wanted.user_id.clone(),
                    groups: wanted.groups.clone(),
                    token: random_string(STATIC_TOKEN_LENGTH),
                });
                changed = true;
            }
        }

        changed
    }

    /// Look up the token issued to `username`.
    ///
    /// # Errors
    ///
    /// Returns [`SecretsError::MissingToken`] if no token belongs to the user.
    pub fn get_token_for_username(&self, username: &str) -> Result<&Token, SecretsError> {
        self.tokens
            .iter()
            .find(|t| t.username == username)
            .ok_or_else(|| SecretsError::MissingToken {
                secret: self.name.clone(),
                username: username.to_string(),
            })
    }

    #[must_use]
    pub fn secret_data(&self) -> SecretData {
        let csv = self
            .tokens
            .iter()
            .map(Token::csv_line)
            .collect::<Vec<_>>()
            .join("\n");

        let mut data = SecretData::new();
        data.insert(DATA_KEY_STATIC_TOKEN_CSV.to_string(), csv.into_bytes());
        data
    }

    /// Parse a stored `static_tokens.csv`.
    ///
    /// # Errors
    ///
    /// Returns an error if the CSV key is missing or a line is malformed.
    pub fn from_secret_data(name: &str, data: &SecretData) -> Result<Self, SecretsError> {
        let csv = utf8_value(name, data, DATA_KEY_STATIC_TOKEN_CSV)?;
        let tokens = csv
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(|line| {
                Token::parse_csv_line(line).ok_or_else(|| SecretsError::MalformedLedgerEntry {
                    name: name.to_string(),
                    reason: "static token line has fewer than three fields".to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            name: name.to_string(),
            tokens,
        })
    }
}

pub(crate) fn utf8_value(secret: &str, data: &SecretData, key: &str) -> Result<String, SecretsError> {
    let bytes = data.get(key).ok_or_else(|| SecretsError::MissingDataKey {
        secret: secret.to_string(),
        key: key.to_string(),
    })?;

    String::from_utf8(bytes.clone()).map_err(|e| SecretsError::MalformedLedgerEntry {
        name: secret.to_string(),
        reason: format!("{key} is not UTF-8: {e}"),
    })
}

#[cfg(test)]
#[path = "credentials_tests.rs"]
mod credentials_tests;
