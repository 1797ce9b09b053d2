// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! RSA keypairs and OpenVPN static keys.

use super::config::{PkcsEncoding, RsaConfig};
use super::SecretData;
use crate::constants::{DATA_KEY_RSA_PRIVATE_KEY, DATA_KEY_SSH_AUTHORIZED_KEYS, DATA_KEY_VPN_TLS_AUTH};
use crate::errors::SecretsError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use rand::RngCore;
use rsa::pkcs1::{DecodeRsaPrivateKey, EncodeRsaPrivateKey};
use rsa::pkcs8::{DecodePrivateKey, EncodePrivateKey, LineEnding};
use rsa::traits::PublicKeyParts;
use rsa::RsaPrivateKey;

/// Number of random bytes in an OpenVPN static key
const VPN_TLS_AUTH_KEY_BYTES: usize = 256;

/// Hex characters per line of an OpenVPN static key
const VPN_TLS_AUTH_LINE_WIDTH: usize = 32;

/// Generate an RSA private key of `bits` length.
///
/// # Errors
///
/// Returns [`SecretsError::KeyGeneration`] if the key cannot be created.
pub fn generate_rsa_key(secret: &str, bits: usize) -> Result<RsaPrivateKey, SecretsError> {
    RsaPrivateKey::new(&mut rand::thread_rng(), bits).map_err(|e| SecretsError::KeyGeneration {
        secret: secret.to_string(),
        reason: e.to_string(),
    })
}

/// Encode a private key as PEM in the requested format.
///
/// # Errors
///
/// Returns [`SecretsError::KeyGeneration`] if encoding fails.
pub fn encode_private_key(
    secret: &str,
    key: &RsaPrivateKey,
    encoding: PkcsEncoding,
) -> Result<String, SecretsError> {
    let pem = match encoding {
        PkcsEncoding::Pkcs1 => key
            .to_pkcs1_pem(LineEnding::LF)
            .map(|p| p.to_string())
            .map_err(|e| e.to_string()),
        PkcsEncoding::Pkcs8 => key
            .to_pkcs8_pem(LineEnding::LF)
            .map(|p| p.to_string())
            .map_err(|e| e.to_string()),
    };

    pem.map_err(|reason| SecretsError::KeyGeneration {
        secret: secret.to_string(),
        reason,
    })
}

/// Decode a PEM private key stored in either PKCS#1 or PKCS#8 form.
///
/// # Errors
///
/// Returns [`SecretsError::MalformedLedgerEntry`] if the PEM is neither.
pub fn decode_private_key(secret: &str, pem: &str) -> Result<RsaPrivateKey, SecretsError> {
    RsaPrivateKey::from_pkcs1_pem(pem)
        .or_else(|_| RsaPrivateKey::from_pkcs8_pem(pem))
        .map_err(|e| SecretsError::MalformedLedgerEntry {
            name: secret.to_string(),
            reason: format!("private key is neither PKCS#1 nor PKCS#8: {e}"),
        })
}

/// Encode the public half of `key` as an OpenSSH `authorized_keys` line.
#[must_use]
pub fn ssh_authorized_key(key: &RsaPrivateKey) -> String {
    let mut blob = Vec::new();
    write_ssh_string(&mut blob, b"ssh-rsa");
    write_ssh_mpint(&mut blob, &key.e().to_bytes_be());
    write_ssh_mpint(&mut blob, &key.n().to_bytes_be());

    format!("ssh-rsa {}\n", STANDARD.encode(blob))
}

fn write_ssh_string(out: &mut Vec<u8>, value: &[u8]) {
    // Lengths are bounded by the key size, far below u32::MAX
    out.extend_from_slice(&u32::try_from(value.len()).unwrap_or(u32::MAX).to_be_bytes());
    out.extend_from_slice(value);
}

fn write_ssh_mpint(out: &mut Vec<u8>, magnitude: &[u8]) {
    let trimmed: Vec<u8> = magnitude.iter().copied().skip_while(|b| *b == 0).collect();
    if trimmed.first().is_some_and(|b| b & 0x80 != 0) {
        let mut padded = Vec::with_capacity(trimmed.len() + 1);
        padded.push(0);
        padded.extend_from_slice(&trimmed);
        write_ssh_string(out, &padded);
    } else {
        write_ssh_string(out, &trimmed);
    }
}

/// An RSA keypair stored as `id_rsa` and optionally `id_rsa.pub`.
#[derive(Clone, Debug)]
pub struct RsaKeys {
    pub name: String,
    pub private_key_pem: String,
    pub ssh_public_key: Option<String>,
}

impl RsaKeys {
    /// # Errors
    ///
    /// Returns an error if key generation or encoding fails.
    pub fn generate(config: &RsaConfig) -> Result<Self, SecretsError> {
        let key = generate_rsa_key(&config.name, config.bits)?;
        let private_key_pem = encode_private_key(&config.name, &key, PkcsEncoding::Pkcs1)?;
        let ssh_public_key = config.used_for_ssh.then(|| ssh_authorized_key(&key));

        Ok(Self {
            name: config.name.clone(),
            private_key_pem,
            ssh_public_key,
        })
    }

    #[must_use]
    pub fn secret_data(&self) -> SecretData {
        let mut data = SecretData::new();
        data.insert(
            DATA_KEY_RSA_PRIVATE_KEY.to_string(),
            self.private_key_pem.clone().into_bytes(),
        );
        if let Some(public_key) = &self.ssh_public_key {
            data.insert(
                DATA_KEY_SSH_AUTHORIZED_KEYS.to_string(),
                public_key.clone().into_bytes(),
            );
        }
        data
    }
}

/// An OpenVPN "Static key V1" used for TLS authentication.
#[derive(Clone, Debug)]
pub struct VpnTlsAuth {
    pub name: String,
    pub key: String,
}

impl VpnTlsAuth {
    #[must_use]
    pub fn generate(name: &str) -> Self {
        let mut bytes = [0u8; VPN_TLS_AUTH_KEY_BYTES];
        rand::thread_rng().fill_bytes(&mut bytes);

        let hex: String = bytes.iter().map(|b| format!("{b:02x}")).collect();
        let mut key = String::from(
            "#\n# 2048 bit OpenVPN static key\n#\n-----BEGIN OpenVPN Static key V1-----\n",
        );
        for line in hex.as_bytes().chunks(VPN_TLS_AUTH_LINE_WIDTH) {
            key.push_str(&String::from_utf8_lossy(line));
            key.push('\n');
        }
        key.push_str("-----END OpenVPN Static key V1-----\n");

        Self {
            name: name.to_string(),
            key,
        }
    }

    #[must_use]
    pub fn secret_data(&self) -> SecretData {
        let mut data = SecretData::new();
        data.insert(DATA_KEY_VPN_TLS_AUTH.to_string(), self.key.clone().into_bytes());
        data
    }
}

#[cfg(test)]
#[path = "keys_tests.rs"]
mod keys_tests;
