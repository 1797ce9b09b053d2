// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `ledger.rs`

#[cfg(test)]
mod tests {
    use super::super::*;
    use serde_json::json;

    fn entry(name: &str, value: &[u8]) -> LedgerEntry {
        let mut data = SecretData::new();
        data.insert("token".to_string(), value.to_vec());
        LedgerEntry::new(name, "rsa", data, Some("abc".to_string()))
    }

    #[test]
    fn test_entry_persisted_layout() {
        let encoded = entry("ssh-keypair", b"key").encode().unwrap();

        assert_eq!(encoded.name, "ssh-keypair");
        assert_eq!(encoded.type_, "rsa");
        assert_eq!(
            encoded.data,
            json!({"secretData": {"token": "a2V5"}, "configChecksum": "abc"})
        );
        assert_eq!(LedgerEntry::decode(&encoded).unwrap(), entry("ssh-keypair", b"key"));
    }

    #[test]
    fn test_imported_entry_has_no_checksum() {
        let resource = GardenerResourceData {
            name: "ca".to_string(),
            type_: KIND_IMPORTED.to_string(),
            data: json!({"secretData": {"ca.crt": "Q0E="}}),
        };

        let decoded = LedgerEntry::decode(&resource).unwrap();
        assert_eq!(decoded.config_checksum, None);
        assert_eq!(decoded.data["ca.crt"], b"CA".to_vec());
    }

    #[test]
    fn test_malformed_entries_are_rejected() {
        let not_base64 = GardenerResourceData {
            name: "ca".to_string(),
            type_: "certificate".to_string(),
            data: json!({"secretData": {"ca.crt": "!!!"}}),
        };
        assert!(matches!(
            LedgerEntry::decode(&not_base64),
            Err(SecretsError::MalformedLedgerEntry { .. })
        ));

        let wrong_shape = GardenerResourceData {
            name: "ca".to_string(),
            type_: "certificate".to_string(),
            data: json!({"secretData": ["a", "b"]}),
        };
        assert!(LedgerEntry::decode(&wrong_shape).is_err());
    }

    #[test]
    fn test_list_upsert_keeps_position_and_uniqueness() {
        let mut list = GardenerResourceDataList::default();
        list.upsert_entry(&entry("a", b"1")).unwrap();
        list.upsert_entry(&entry("b", b"2")).unwrap();
        list.upsert_entry(&entry("a", b"3")).unwrap();

        assert_eq!(list.names(), vec!["a", "b"]);
        assert_eq!(list.entry("a").unwrap().unwrap().data["token"], b"3".to_vec());
        assert!(list.entry("missing").unwrap().is_none());
    }

    #[test]
    fn test_list_delete() {
        let mut list: GardenerResourceDataList = vec![
            entry("a", b"1").encode().unwrap(),
            entry("b", b"2").encode().unwrap(),
        ]
        .into();

        assert!(list.delete("a"));
        assert!(!list.delete("a"));
        assert_eq!(list.names(), vec!["b"]);
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn test_from_vec_deduplicates_by_name() {
        let list: GardenerResourceDataList = vec![
            entry("a", b"1").encode().unwrap(),
            entry("a", b"2").encode().unwrap(),
        ]
        .into();

        assert_eq!(list.len(), 1);
        assert_eq!(list.entry("a").unwrap().unwrap().data["token"], b"2".to_vec());
    }
}
