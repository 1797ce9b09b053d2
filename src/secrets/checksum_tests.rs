// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `checksum.rs`

#[cfg(test)]
mod tests {
    use super::super::*;

    #[test]
    fn test_checksum_hashes_sorted_base64_json() {
        let mut data = SecretData::new();
        data.insert("b".to_string(), b"2".to_vec());
        data.insert("a".to_string(), b"1".to_vec());

        assert_eq!(
            compute_checksum(&data),
            sha256_hex(br#"{"a":"MQ==","b":"Mg=="}"#)
        );
    }

    #[test]
    fn test_checksum_tracks_content() {
        let mut data = SecretData::new();
        data.insert("token".to_string(), b"abc".to_vec());
        let first = compute_checksum(&data);

        assert_eq!(first, compute_checksum(&data.clone()));
        assert_eq!(first.len(), 64);

        data.insert("token".to_string(), b"abd".to_vec());
        assert_ne!(first, compute_checksum(&data));
    }

    #[test]
    fn test_sha256_hex_known_value() {
        assert_eq!(
            sha256_hex(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
