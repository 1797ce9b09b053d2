// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Kubeconfig documents embedded in control-plane secrets.

use super::config::KubeconfigRequest;
use super::credentials::{BasicAuth, Token};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Kubeconfig {
    #[serde(rename = "apiVersion")]
    pub api_version: String,
    pub kind: String,
    #[serde(rename = "current-context")]
    pub current_context: String,
    pub clusters: Vec<NamedCluster>,
    pub users: Vec<NamedUser>,
    pub contexts: Vec<NamedContext>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NamedCluster {
    pub name: String,
    pub cluster: Cluster,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Cluster {
    pub server: String,
    #[serde(rename = "certificate-authority-data")]
    pub certificate_authority_data: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NamedUser {
    pub name: String,
    pub user: AuthInfo,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AuthInfo {
    #[serde(rename = "client-certificate-data", skip_serializing_if = "Option::is_none")]
    pub client_certificate_data: Option<String>,
    #[serde(rename = "client-key-data", skip_serializing_if = "Option::is_none")]
    pub client_key_data: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NamedContext {
    pub name: String,
    pub context: Context,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Context {
    pub cluster: String,
    pub user: String,
}

/// Client credentials a kubeconfig authenticates with.
#[derive(Default)]
pub struct Credentials<'a> {
    pub certificate_pem: Option<&'a [u8]>,
    pub private_key_pem: Option<&'a [u8]>,
    pub token: Option<&'a Token>,
    pub basic_auth: Option<&'a BasicAuth>,
}

impl Kubeconfig {
    /// Build a kubeconfig for `request` trusting `ca_pem`.
    ///
    /// The main user carries the client certificate and token. Basic-auth
    /// credentials get a separate `<cluster>-basic-auth` user and context so
    /// no single user mixes authentication methods.
    #[must_use]
    pub fn new(request: &KubeconfigRequest, ca_pem: &[u8], credentials: &Credentials<'_>) -> Self {
        let cluster_name = request.cluster_name.clone();

        let mut users = vec![NamedUser {
            name: cluster_name.clone(),
            user: AuthInfo {
                client_certificate_data: credentials.certificate_pem.map(|c| STANDARD.encode(c)),
                client_key_data: credentials.private_key_pem.map(|k| STANDARD.encode(k)),
                token: credentials.token.map(|t| t.token.clone()),
                ..AuthInfo::default()
            },
        }];
        let mut contexts = vec![NamedContext {
            name: cluster_name.clone(),
            context: Context {
                cluster: cluster_name.clone(),
                user: cluster_name.clone(),
            },
        }];

        if let Some(basic_auth) = credentials.basic_auth {
            let name = format!("{cluster_name}-basic-auth");
            users.push(NamedUser {
                name: name.clone(),
                user: AuthInfo {
                    username: Some(basic_auth.username.clone()),
                    password: Some(basic_auth.password.clone()),
                    ..AuthInfo::default()
                },
            });
            contexts.push(NamedContext {
                name: name.clone(),
                context: Context {
                    cluster: cluster_name.clone(),
                    user: name,
                },
            });
        }

        Self {
            api_version: "v1".to_string(),
            kind: "Config".to_string(),
            current_context: cluster_name.clone(),
            clusters: vec![NamedCluster {
                name: cluster_name,
                cluster: Cluster {
                    server: format!("https://{}", request.api_server_url),
                    certificate_authority_data: STANDARD.encode(ca_pem),
                },
            }],
            users,
            contexts,
        }
    }

    /// # Errors
    ///
    /// Returns an error if YAML serialization fails.
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }
}

#[cfg(test)]
#[path = "kubeconfig_tests.rs"]
mod kubeconfig_tests;
