use ppdcache::{PpdCache, PpdCacheError, Result, last_error};

#[test]
fn test_error_display() {
    let err = PpdCacheError::OutOfDate {
        found: "10".to_string(),
        expected: 11,
    };
    assert!(err.to_string().contains("version 10"));
    assert!(err.to_string().contains("expected 11"));
}

#[test]
fn test_invalid_input() {
    let err = PpdCacheError::InvalidInput("document has no page sizes".into());
    assert!(err.to_string().contains("invalid input"));
}

#[test]
fn test_result_alias() {
    fn returns_error() -> Result<()> {
        Err(PpdCacheError::Ipp("short read".into()))
    }
    assert!(returns_error().is_err());
}

// ============================================================================
// Classification and status tracking
// ============================================================================

#[test]
fn bad_format_reports_the_line() {
    let err = PpdCache::from_bytes(b"#CUPS-PPD-CACHE-11\nNumSizes\n", false).unwrap_err();
    assert!(err.is_bad_format());
    assert!(!err.is_out_of_date());
    assert!(err.to_string().contains("line 2"), "{err}");
}

#[test]
fn failed_build_sets_last_error() {
    let err = PpdCache::from_ppd(&ppdcache::ppd::PpdDocument::new()).unwrap_err();
    assert!(matches!(err, PpdCacheError::InvalidInput(_)));
    assert_eq!(last_error(), Some(err.to_string()));
}

#[test]
fn io_errors_name_the_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("gone.data");
    let err = PpdCache::load(&path).unwrap_err();
    assert!(err.to_string().contains("gone.data"));
    assert!(std::error::Error::source(&err).is_some());
}
