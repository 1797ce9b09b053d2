// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Generation of secret data from a [`SecretConfig`].

use super::certificate::Certificate;
use super::config::{ControlPlaneConfig, SecretConfig};
use super::credentials::{BasicAuth, StaticToken};
use super::keys::{RsaKeys, VpnTlsAuth};
use super::kubeconfig::{Credentials, Kubeconfig};
use super::SecretData;
use crate::constants::{
    DATA_KEY_CERTIFICATE_CA, DATA_KEY_KUBECONFIG, DATA_KEY_PASSWORD, DATA_KEY_TOKEN,
    DATA_KEY_USER_NAME,
};
use crate::errors::SecretsError;

/// Generate fresh secret data for `config`.
///
/// `signing_ca` must be the CA named by [`SecretConfig::signing_ca`] for
/// certificate and control-plane configs; it is ignored otherwise.
///
/// # Errors
///
/// Returns an error if the signing CA is missing or generation fails.
pub fn generate(
    config: &SecretConfig,
    signing_ca: Option<&Certificate>,
) -> Result<SecretData, SecretsError> {
    match config {
        SecretConfig::Certificate(c) => Ok(Certificate::generate(c, signing_ca)?.secret_data()),
        SecretConfig::ControlPlane(c) => control_plane(c, signing_ca),
        SecretConfig::BasicAuth(c) => Ok(BasicAuth::generate(c).secret_data()),
        SecretConfig::StaticToken(c) => Ok(StaticToken::generate(c).secret_data()),
        SecretConfig::Rsa(c) => Ok(RsaKeys::generate(c)?.secret_data()),
        SecretConfig::VpnTlsAuth(c) => Ok(VpnTlsAuth::generate(&c.name).secret_data()),
    }
}

/// Data keys: `ca.crt`, then `<name>.crt`/`<name>.key` if a client
/// certificate is issued, `username`/`password`, `token` and `kubeconfig` as
/// requested.
fn control_plane(
    config: &ControlPlaneConfig,
    signing_ca: Option<&Certificate>,
) -> Result<SecretData, SecretsError> {
    let name = &config.certificate.name;
    let ca = signing_ca.ok_or_else(|| SecretsError::UnresolvedSigningCa {
        secret: name.clone(),
        ca: config.certificate.signing_ca.clone().unwrap_or_default(),
    })?;

    let certificate = if config.certificate.common_name.is_empty() {
        None
    } else {
        Some(Certificate::generate(&config.certificate, Some(ca))?)
    };

    let mut data = SecretData::new();
    data.insert(
        DATA_KEY_CERTIFICATE_CA.to_string(),
        ca.certificate_pem.clone().into_bytes(),
    );

    if let Some(cert) = &certificate {
        data.insert(format!("{name}.crt"), cert.certificate_pem.clone().into_bytes());
        data.insert(format!("{name}.key"), cert.private_key_pem.clone().into_bytes());
    }

    if let Some(basic_auth) = &config.basic_auth {
        data.insert(
            DATA_KEY_USER_NAME.to_string(),
            basic_auth.username.clone().into_bytes(),
        );
        data.insert(
            DATA_KEY_PASSWORD.to_string(),
            basic_auth.password.clone().into_bytes(),
        );
    }

    if let Some(token) = &config.token {
        data.insert(DATA_KEY_TOKEN.to_string(), token.token.clone().into_bytes());
    }

    if let Some(request) = &config.kubeconfig_request {
        let kubeconfig = Kubeconfig::new(
            request,
            ca.certificate_pem.as_bytes(),
            &Credentials {
                certificate_pem: certificate.as_ref().map(|c| c.certificate_pem.as_bytes()),
                private_key_pem: certificate.as_ref().map(|c| c.private_key_pem.as_bytes()),
                token: config.token.as_ref(),
                basic_auth: config.basic_auth.as_ref(),
            },
        );
        let yaml = kubeconfig
            .to_yaml()
            .map_err(|e| SecretsError::Serialization {
                secret: name.clone(),
                reason: e.to_string(),
            })?;
        data.insert(DATA_KEY_KUBECONFIG.to_string(), yaml.into_bytes());
    }

    Ok(data)
}

#[cfg(test)]
#[path = "material_tests.rs"]
mod material_tests;
