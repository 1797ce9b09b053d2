// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `credentials.rs`

#[cfg(test)]
mod tests {
    use super::super::*;
    use crate::secrets::config::{BasicAuthConfig, BasicAuthFormat, StaticTokenConfig, TokenConfig};
    use std::collections::BTreeMap;

    fn token_config(entries: &[(&str, Option<&str>)]) -> StaticTokenConfig {
        StaticTokenConfig {
            name: "static-token".to_string(),
            tokens: entries
                .iter()
                .map(|(username, group)| {
                    (
                        (*username).to_string(),
                        TokenConfig {
                            username: (*username).to_string(),
                            user_id: (*username).to_string(),
                            groups: group.iter().map(|g| (*g).to_string()).collect(),
                        },
                    )
                })
                .collect::<BTreeMap<_, _>>(),
        }
    }

    #[test]
    fn test_random_string_length_and_charset() {
        let s = random_string(32);
        assert_eq!(s.len(), 32);
        assert!(s.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(s, random_string(32));
    }

    #[test]
    fn test_basic_auth_csv_layout() {
        let config = BasicAuthConfig {
            name: "kube-apiserver-basic-auth".to_string(),
            format: BasicAuthFormat::Csv,
            username: "admin".to_string(),
            password_length: 32,
        };
        let auth = BasicAuth::generate(&config);
        let data = auth.secret_data();

        let csv = String::from_utf8(data["basic_auth.csv"].clone()).unwrap();
        assert_eq!(csv, format!("{},admin,admin,system:masters", auth.password));
        assert_eq!(auth.password.len(), 32);

        let parsed = BasicAuth::from_secret_data(&config, &data).unwrap();
        assert_eq!(parsed, auth);
    }

    #[test]
    fn test_basic_auth_normal_layout() {
        let config = BasicAuthConfig::normal("monitoring-ingress-credentials", "admin", 32);
        let auth = BasicAuth::generate(&config);
        let data = auth.secret_data();

        assert_eq!(data["username"], b"admin".to_vec());
        assert_eq!(data["password"], auth.password.as_bytes().to_vec());
        assert!(!data.contains_key("basic_auth.csv"));
    }

    #[test]
    fn test_basic_auth_missing_key_is_reported() {
        let config = BasicAuthConfig::normal("curator-sg-credentials", "curator", 32);
        let err = BasicAuth::from_secret_data(&config, &SecretData::new()).unwrap_err();

        assert_eq!(
            err,
            SecretsError::MissingDataKey {
                secret: "curator-sg-credentials".to_string(),
                key: "username".to_string(),
            }
        );
    }

    #[test]
    fn test_static_token_lookup() {
        let config = token_config(&[
            ("system:cluster-admin", Some("system:masters")),
            ("health-check", None),
        ]);
        let static_token = StaticToken::generate(&config);

        let token = static_token
            .get_token_for_username("system:cluster-admin")
            .unwrap();
        assert_eq!(token.groups, vec!["system:masters".to_string()]);
        assert_eq!(token.token.len(), 128);

        let err = static_token.get_token_for_username("nobody").unwrap_err();
        assert_eq!(
            err,
            SecretsError::MissingToken {
                secret: "static-token".to_string(),
                username: "nobody".to_string(),
            }
        );
    }

    #[test]
    fn test_static_token_csv_survives_reload() {
        let config = token_config(&[
            ("system:cluster-admin", Some("system:masters")),
            ("health-check", None),
        ]);
        let static_token = StaticToken::generate(&config);
        let data = static_token.secret_data();

        let csv = String::from_utf8(data["static_tokens.csv"].clone()).unwrap();
        assert!(csv.contains(",system:cluster-admin,system:cluster-admin,\"system:masters\""));

        let reloaded = StaticToken::from_secret_data("static-token", &data).unwrap();
        assert_eq!(reloaded, static_token);
    }

    #[test]
    fn test_static_token_reconcile_keeps_adds_and_drops() {
        let original = token_config(&[
            ("system:cluster-admin", Some("system:masters")),
            ("system:konnectivity-server", None),
        ]);
        let mut static_token = StaticToken::generate(&original);
        let admin_token = static_token
            .get_token_for_username("system:cluster-admin")
            .unwrap()
            .token
            .clone();

        let wanted = token_config(&[
            ("system:cluster-admin", Some("system:masters")),
            ("health-check", None),
        ]);
        assert!(static_token.reconcile(&wanted));

        assert_eq!(
            static_token
                .get_token_for_username("system:cluster-admin")
                .unwrap()
                .token,
            admin_token
        );
        assert!(static_token.get_token_for_username("health-check").is_ok());
        assert!(static_token
            .get_token_for_username("system:konnectivity-server")
            .is_err());

        assert!(!static_token.reconcile(&wanted));
    }

    #[test]
    fn test_static_token_malformed_line() {
        let mut data = SecretData::new();
        data.insert("static_tokens.csv".to_string(), b"only-a-token".to_vec());

        let err = StaticToken::from_secret_data("static-token", &data).unwrap_err();
        assert!(matches!(err, SecretsError::MalformedLedgerEntry { .. }));
    }
}
