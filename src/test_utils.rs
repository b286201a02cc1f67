//! Test utilities for property-based testing
//!
//! This module provides generators and helpers for proptest.

#[cfg(test)]
pub mod generators {
    use proptest::prelude::*;

    /// Generate an architecture name
    pub fn arch_name() -> impl Strategy<Value = String> {
        prop_oneof![
            Just("armv7".to_string()),
            Just("armv7s".to_string()),
            Just("armv8".to_string()),
            Just("armv8.3".to_string()),
            Just("x86".to_string()),
            Just("x86_64".to_string()),
        ]
    }

    /// Generate a list of architectures, duplicates allowed
    pub fn arch_list() -> impl Strategy<Value = Vec<String>> {
        prop::collection::vec(arch_name(), 0..6)
    }

    /// Generate a relative path inside a package tree
    pub fn package_path() -> impl Strategy<Value = String> {
        (
            prop_oneof![Just("include"), Just("lib"), Just("bin"), Just("share")],
            "[a-z][a-z0-9_]{0,10}",
            prop_oneof![Just(".h"), Just(".a"), Just(".dylib"), Just(".txt"), Just("")],
        )
            .prop_map(|(dir, stem, ext)| format!("{dir}/{stem}{ext}"))
    }
}

#[cfg(test)]
mod tests {
    use super::generators::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn test_arch_list_generator(archs in arch_list()) {
            prop_assert!(archs.len() < 6);
            prop_assert!(archs.iter().all(|a| !a.contains(';')));
        }

        #[test]
        fn test_package_path_generator(path in package_path()) {
            prop_assert!(path.contains('/'));
            prop_assert!(!path.starts_with('/'));
        }
    }
}
