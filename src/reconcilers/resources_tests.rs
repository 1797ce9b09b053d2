// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `resources.rs`

#[cfg(test)]
mod tests {
    use super::super::*;

    use kube::core::response::StatusSummary;
    use kube::core::Status;

    fn api_error(code: u16, reason: &str) -> kube::Error {
        kube::Error::Api(Box::new(Status {
            status: Some(StatusSummary::Failure),
            message: format!("{reason} error"),
            reason: reason.to_string(),
            code,
            ..Status::default()
        }))
    }

    #[test]
    fn test_not_found_detection() {
        assert!(is_not_found(&api_error(404, "NotFound")));
        assert!(!is_not_found(&api_error(409, "Conflict")));
        assert!(!is_not_found(&api_error(500, "InternalError")));
    }

    #[test]
    fn test_conflict_detection() {
        assert!(is_conflict(&api_error(409, "Conflict")));
        assert!(!is_conflict(&api_error(404, "NotFound")));
    }

    #[test]
    fn test_non_api_errors_are_neither_not_found_nor_conflict() {
        let err = kube::Error::LinesCodecMaxLineLengthExceeded;
        assert!(!is_not_found(&err));
        assert!(!is_conflict(&err));
    }

    #[test]
    fn test_operation_result_equality() {
        assert_ne!(OperationResult::Created, OperationResult::Updated);
        assert_eq!(OperationResult::Unchanged, OperationResult::Unchanged);
    }
}
