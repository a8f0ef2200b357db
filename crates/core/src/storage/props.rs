//! Property-based tests for key validation and path containment.

use proptest::prelude::*;
use std::path::Path;

use super::error::StorageError;
use super::key::ImageKey;

/// Strategy producing filenames the pattern accepts.
fn valid_filename() -> impl Strategy<Value = String> {
    ("[A-Za-z]{1,32}", "[a-z]{3}").prop_map(|(stem, ext)| format!("{stem}.{ext}"))
}

/// Strategy producing traversal-shaped filenames.
fn adversarial_filename() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("../../etc/passwd".to_string()),
        Just("..%2f..%2fetc%2fpasswd".to_string()),
        Just("%2e%2e/secret.png".to_string()),
        Just("..\\windows\\system.ini".to_string()),
        "[A-Za-z]{1,8}".prop_map(|s| format!("../{s}.png")),
        "[A-Za-z]{1,8}".prop_map(|s| format!("/{s}.png")),
        "[A-Za-z]{1,8}".prop_map(|s| format!("{s}/../{s}.png")),
        "[A-Za-z]{1,8}".prop_map(|s| format!("{s}\u{0}.png")),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// Accepted filenames always match the pattern exactly.
    #[test]
    fn prop_accepted_filenames_match_pattern(id in 0u64..u64::MAX, name in valid_filename()) {
        let key = ImageKey::new(id, &name).expect("pattern filenames are accepted");

        let (stem, ext) = key.filename().rsplit_once('.').expect("has extension");
        prop_assert!(!stem.is_empty());
        prop_assert!(stem.bytes().all(|b| b.is_ascii_alphabetic()));
        prop_assert_eq!(ext.len(), 3);
        prop_assert!(ext.bytes().all(|b| b.is_ascii_lowercase()));
    }

    /// Resolved locations always stay inside the store root.
    #[test]
    fn prop_resolved_path_contained_in_root(id in 0u64..u64::MAX, name in valid_filename()) {
        let root = Path::new("/srv/images");
        let key = ImageKey::new(id, &name).expect("valid key");
        let resolved = key.resolve_under(root).expect("should resolve");

        prop_assert!(resolved.starts_with(root));
        // Exactly two segments below the root: {id}/{filename}.
        let below = resolved.strip_prefix(root).expect("prefix holds");
        prop_assert_eq!(below.components().count(), 2);
    }

    /// Distinct (id, filename) pairs never collide on a location.
    #[test]
    fn prop_distinct_keys_never_collide(
        a in (0u64..10_000, valid_filename()),
        b in (0u64..10_000, valid_filename()),
    ) {
        prop_assume!(a != b);
        let ka = ImageKey::new(a.0, &a.1).expect("valid key");
        let kb = ImageKey::new(b.0, &b.1).expect("valid key");
        prop_assert_ne!(ka.relative_path(), kb.relative_path());
    }

    /// Traversal-shaped names are rejected before any path is built.
    #[test]
    fn prop_adversarial_filenames_rejected(id in 0u64..u64::MAX, name in adversarial_filename()) {
        let result = ImageKey::new(id, &name);
        prop_assert!(matches!(result, Err(StorageError::InvalidFilename(_))));
    }

    /// Arbitrary strings either fail validation or resolve under the root.
    #[test]
    fn prop_any_string_rejected_or_contained(id in 0u64..u64::MAX, name in ".*") {
        let root = Path::new("/srv/images");
        if let Ok(key) = ImageKey::new(id, &name) {
            let resolved = key.resolve_under(root).expect("accepted keys resolve");
            prop_assert!(resolved.starts_with(root));
            prop_assert!(!name.contains('/'));
            prop_assert!(!name.contains(".."));
        }
    }
}
