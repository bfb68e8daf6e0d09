//! Property tests for content fingerprinting.

use proptest::prelude::*;
use sha2::{Digest, Sha256};

use longshore::hash::hash_file;

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 128,
        .. ProptestConfig::default()
    })]

    /// PROPERTY: The streamed fingerprint matches a one-shot digest for any
    /// content, including sizes that straddle the read block size.
    #[test]
    fn property_streamed_digest_matches_one_shot(
        content in proptest::collection::vec(any::<u8>(), 0..40_000)
    ) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blob");
        std::fs::write(&path, &content).unwrap();

        let streamed = hash_file(&path).unwrap();
        let expected = format!("{:x}", Sha256::digest(&content));
        prop_assert_eq!(streamed, expected);
    }

    /// PROPERTY: The fingerprint depends only on content, not on the file name.
    #[test]
    fn property_fingerprint_ignores_file_name(
        content in proptest::collection::vec(any::<u8>(), 0..4096)
    ) {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("a.bin");
        let second = dir.path().join("completely-different-name.css");
        std::fs::write(&first, &content).unwrap();
        std::fs::write(&second, &content).unwrap();

        prop_assert_eq!(hash_file(&first).unwrap(), hash_file(&second).unwrap());
    }
}
