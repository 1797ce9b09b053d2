// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! X.509 certificate authorities and leaf certificates.
//!
//! Keys are RSA (generated with the `rsa` crate) so that every consumer in the
//! control plane can read them; `rcgen` builds and signs the certificates.
//! CAs are self-signed and live for ten years. Leaf certificates are signed by
//! the CA they reference by name.

use super::config::{CertType, CertificateConfig, PkcsEncoding};
use super::keys::{decode_private_key, encode_private_key, generate_rsa_key};
use super::SecretData;
use crate::constants::{
    CA_VALIDITY_DAYS, CERTIFICATE_KEY_BITS, CERT_VALIDITY_DAYS, DATA_KEY_CERTIFICATE,
    DATA_KEY_CERTIFICATE_CA, DATA_KEY_PRIVATE_KEY, DATA_KEY_PRIVATE_KEY_CA,
};
use crate::errors::SecretsError;
use rcgen::{
    string::Ia5String, BasicConstraints, CertificateParams, DistinguishedName, DnType, DnValue,
    ExtendedKeyUsagePurpose, IsCa, Issuer, KeyPair, KeyUsagePurpose, SanType,
};

/// Compute (`not_before`, `not_after`) starting now.
fn compute_validity(days: i64) -> (time::OffsetDateTime, time::OffsetDateTime) {
    let now = time::OffsetDateTime::now_utc();
    (now, now + time::Duration::days(days))
}

/// A certificate with its private key and the CA bundle that verifies it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Certificate {
    pub name: String,
    /// PEM of the signing CA; equals `certificate_pem` for a CA
    pub ca_pem: String,
    pub certificate_pem: String,
    pub private_key_pem: String,
    pub is_ca: bool,
}

impl Certificate {
    /// Create the certificate described by `config`.
    ///
    /// CAs are self-signed; every other type must be given its signing CA.
    ///
    /// # Errors
    ///
    /// Returns [`SecretsError::UnresolvedSigningCa`] if a leaf certificate has
    /// no CA, or a generation error if key or certificate creation fails.
    pub fn generate(
        config: &CertificateConfig,
        signing_ca: Option<&Certificate>,
    ) -> Result<Self, SecretsError> {
        let cert_err = |reason: String| SecretsError::CertificateGeneration {
            secret: config.name.clone(),
            reason,
        };

        let params = certificate_params(config)?;

        let private_key = generate_rsa_key(&config.name, CERTIFICATE_KEY_BITS)?;
        let stored_key_pem = encode_private_key(&config.name, &private_key, config.pkcs)?;
        let signing_pem = encode_private_key(&config.name, &private_key, PkcsEncoding::Pkcs8)?;
        let key_pair = KeyPair::from_pem(&signing_pem)
            .map_err(|e| cert_err(format!("failed to load key pair: {e}")))?;

        if config.cert_type == CertType::Ca {
            let cert = params
                .self_signed(&key_pair)
                .map_err(|e| cert_err(format!("failed to self-sign CA: {e}")))?;
            let pem = cert.pem();

            return Ok(Self {
                name: config.name.clone(),
                ca_pem: pem.clone(),
                certificate_pem: pem,
                private_key_pem: stored_key_pem,
                is_ca: true,
            });
        }

        let ca = signing_ca.ok_or_else(|| SecretsError::UnresolvedSigningCa {
            secret: config.name.clone(),
            ca: config.signing_ca.clone().unwrap_or_default(),
        })?;
        let ca_key = ca.signing_key_pair()?;
        let issuer = Issuer::from_ca_cert_pem(&ca.certificate_pem, &ca_key)
            .map_err(|e| cert_err(format!("failed to load issuer '{}': {e}", ca.name)))?;
        let cert = params
            .signed_by(&key_pair, &issuer)
            .map_err(|e| cert_err(format!("failed to sign with '{}': {e}", ca.name)))?;

        Ok(Self {
            name: config.name.clone(),
            ca_pem: ca.certificate_pem.clone(),
            certificate_pem: cert.pem(),
            private_key_pem: stored_key_pem,
            is_ca: false,
        })
    }

    /// Load the private key in a form `rcgen` can sign with.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored key cannot be decoded.
    pub fn signing_key_pair(&self) -> Result<KeyPair, SecretsError> {
        let key = decode_private_key(&self.name, &self.private_key_pem)?;
        let pkcs8 = encode_private_key(&self.name, &key, PkcsEncoding::Pkcs8)?;
        KeyPair::from_pem(&pkcs8).map_err(|e| SecretsError::MalformedLedgerEntry {
            name: self.name.clone(),
            reason: format!("private key unusable for signing: {e}"),
        })
    }

    /// Secret data: `ca.crt`/`ca.key` for CAs, `ca.crt`/`tls.crt`/`tls.key` otherwise.
    #[must_use]
    pub fn secret_data(&self) -> SecretData {
        let mut data = SecretData::new();
        data.insert(
            DATA_KEY_CERTIFICATE_CA.to_string(),
            self.ca_pem.clone().into_bytes(),
        );
        if self.is_ca {
            data.insert(
                DATA_KEY_PRIVATE_KEY_CA.to_string(),
                self.private_key_pem.clone().into_bytes(),
            );
        } else {
            data.insert(
                DATA_KEY_CERTIFICATE.to_string(),
                self.certificate_pem.clone().into_bytes(),
            );
            data.insert(
                DATA_KEY_PRIVATE_KEY.to_string(),
                self.private_key_pem.clone().into_bytes(),
            );
        }
        data
    }

    /// Rebuild a CA from its stored `ca.crt` and `ca.key`.
    ///
    /// # Errors
    ///
    /// Returns an error if either key is missing or not UTF-8.
    pub fn ca_from_secret_data(name: &str, data: &SecretData) -> Result<Self, SecretsError> {
        let certificate_pem = super::credentials::utf8_value(name, data, DATA_KEY_CERTIFICATE_CA)?;
        let private_key_pem = super::credentials::utf8_value(name, data, DATA_KEY_PRIVATE_KEY_CA)?;

        Ok(Self {
            name: name.to_string(),
            ca_pem: certificate_pem.clone(),
            certificate_pem,
            private_key_pem,
            is_ca: true,
        })
    }
}

fn certificate_params(config: &CertificateConfig) -> Result<CertificateParams, SecretsError> {
    let mut params = CertificateParams::default();

    let mut dn = DistinguishedName::new();
    dn.push(
        DnType::CommonName,
        DnValue::Utf8String(config.common_name.clone()),
    );
    // rcgen keeps one value per attribute type
    if let Some(organization) = config.organization.first() {
        dn.push(
            DnType::OrganizationName,
            DnValue::Utf8String(organization.clone()),
        );
    }
    params.distinguished_name = dn;

    let default_days = match config.cert_type {
        CertType::Ca => CA_VALIDITY_DAYS,
        _ => CERT_VALIDITY_DAYS,
    };
    let (not_before, not_after) = compute_validity(config.validity_days.unwrap_or(default_days));
    params.not_before = not_before;
    params.not_after = not_after;

    match config.cert_type {
        CertType::Ca => {
            params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
            params.key_usages = vec![
                KeyUsagePurpose::KeyCertSign,
                KeyUsagePurpose::CrlSign,
                KeyUsagePurpose::DigitalSignature,
            ];
        }
        CertType::Server | CertType::Client | CertType::ServerClient => {
            params.is_ca = IsCa::NoCa;
            params.key_usages = vec![
                KeyUsagePurpose::DigitalSignature,
                KeyUsagePurpose::KeyEncipherment,
            ];
            params.extended_key_usages = match config.cert_type {
                CertType::Server => vec![ExtendedKeyUsagePurpose::ServerAuth],
                CertType::Client => vec![ExtendedKeyUsagePurpose::ClientAuth],
                _ => vec![
                    ExtendedKeyUsagePurpose::ServerAuth,
                    ExtendedKeyUsagePurpose::ClientAuth,
                ],
            };
        }
    }

    let mut sans = Vec::with_capacity(config.dns_names.len() + config.ip_addresses.len());
    for dns_name in &config.dns_names {
        let name = Ia5String::try_from(dns_name.clone()).map_err(|e| {
            SecretsError::CertificateGeneration {
                secret: config.name.clone(),
                reason: format!("invalid DNS name '{dns_name}': {e}"),
            }
        })?;
        sans.push(SanType::DnsName(name));
    }
    sans.extend(config.ip_addresses.iter().copied().map(SanType::IpAddress));
    params.subject_alt_names = sans;

    Ok(params)
}

#[cfg(test)]
#[path = "certificate_tests.rs"]
mod certificate_tests;
