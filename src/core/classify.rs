//! Binary classification for fat merges
//!
//! Decides whether a staged file is an architecture-specific binary that must
//! be combined, or a plain file that is copied verbatim. Extension hints settle
//! the common cases without touching the file; everything else is sniffed by
//! its leading magic bytes.

use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Extensions that are always combinable binaries
const BINARY_EXTENSIONS: &[&str] = &["a", "dylib"];

/// Extensions that are never binaries
const PLAIN_EXTENSIONS: &[&str] = &[
    "h", "hpp", "hxx", "c", "cc", "cxx", "cpp", "m", "mm", "txt", "md", "html", "jpg", "png",
];

/// Classification of a file for merge purposes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileClass {
    /// Architecture-specific binary, combined across architectures
    Binary,
    /// Anything else, copied verbatim
    Plain,
}

/// What the file name alone tells us
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtensionHint {
    /// Known binary extension
    Binary,
    /// Known plain extension
    Plain,
    /// Inconclusive, the content must be sniffed
    Unknown,
}

/// Recognized binary signatures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MachMagic {
    /// Mach-O 64-bit thin object, bytes `CF FA ED FE`
    Thin64,
    /// Mach-O universal (fat) object, bytes `CA FE BA BE`
    Fat,
    /// Static `ar` archive, bytes `!<arch>\n`
    Archive,
}

impl MachMagic {
    /// All recognized signatures
    pub const ALL: [MachMagic; 3] = [MachMagic::Thin64, MachMagic::Fat, MachMagic::Archive];

    /// Byte sequence at the start of the file
    pub fn bytes(self) -> &'static [u8] {
        match self {
            MachMagic::Thin64 => &[0xcf, 0xfa, 0xed, 0xfe],
            MachMagic::Fat => &[0xca, 0xfe, 0xba, 0xbe],
            MachMagic::Archive => b"!<arch>\n",
        }
    }

    /// Longest signature, which bounds how much of a file is read
    pub const MAX_LEN: usize = 8;

    /// Match a file header against the known signatures
    pub fn detect(header: &[u8]) -> Option<MachMagic> {
        Self::ALL
            .into_iter()
            .find(|magic| header.starts_with(magic.bytes()))
    }
}

/// Classify a path by its extension only
pub fn extension_hint(path: &Path) -> ExtensionHint {
    let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
        return ExtensionHint::Unknown;
    };
    if BINARY_EXTENSIONS.contains(&ext) {
        ExtensionHint::Binary
    } else if PLAIN_EXTENSIONS.contains(&ext) {
        ExtensionHint::Plain
    } else {
        ExtensionHint::Unknown
    }
}

/// Read the leading signature of a file
///
/// Returns `None` for short reads and I/O errors alike.
pub fn sniff(path: &Path) -> Option<MachMagic> {
    let file = File::open(path).ok()?;
    let mut header = Vec::with_capacity(MachMagic::MAX_LEN);
    file.take(MachMagic::MAX_LEN as u64)
        .read_to_end(&mut header)
        .ok()?;
    MachMagic::detect(&header)
}

/// Classify a file as binary or plain
pub fn classify(path: &Path) -> FileClass {
    match extension_hint(path) {
        ExtensionHint::Binary => FileClass::Binary,
        ExtensionHint::Plain => FileClass::Plain,
        ExtensionHint::Unknown => {
            if sniff(path).is_some() {
                FileClass::Binary
            } else {
                FileClass::Plain
            }
        }
    }
}

/// Convenience wrapper over [`classify`]
pub fn is_macho_binary(path: &Path) -> bool {
    classify(path) == FileClass::Binary
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, content: &[u8]) -> std::path::PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_known_binary_extensions_skip_reading() {
        // Paths do not exist: a read attempt would fall back to Plain
        assert_eq!(classify(Path::new("/nonexistent/libfoo.a")), FileClass::Binary);
        assert_eq!(
            classify(Path::new("/nonexistent/libfoo.dylib")),
            FileClass::Binary
        );
    }

    #[test]
    fn test_known_plain_extensions_skip_reading() {
        let dir = TempDir::new().unwrap();
        // Content looks like a Mach-O object, the extension still wins
        let header = write(&dir, "foo.h", &[0xcf, 0xfa, 0xed, 0xfe, 0, 0]);
        assert_eq!(classify(&header), FileClass::Plain);
        assert_eq!(classify(Path::new("/nonexistent/foo.cpp")), FileClass::Plain);
    }

    #[test]
    fn test_sniffs_thin_macho() {
        let dir = TempDir::new().unwrap();
        let exe = write(&dir, "tool", &[0xcf, 0xfa, 0xed, 0xfe, 7, 0, 0, 1]);
        assert_eq!(sniff(&exe), Some(MachMagic::Thin64));
        assert_eq!(classify(&exe), FileClass::Binary);
    }

    #[test]
    fn test_sniffs_fat_macho() {
        let dir = TempDir::new().unwrap();
        let exe = write(&dir, "tool", &[0xca, 0xfe, 0xba, 0xbe, 0, 0, 0, 2]);
        assert_eq!(sniff(&exe), Some(MachMagic::Fat));
    }

    #[test]
    fn test_sniffs_archive_without_extension() {
        let dir = TempDir::new().unwrap();
        let lib = write(&dir, "libfoo", b"!<arch>\n/               0");
        assert_eq!(sniff(&lib), Some(MachMagic::Archive));
        assert_eq!(classify(&lib), FileClass::Binary);
    }

    #[test]
    fn test_empty_file_is_plain() {
        let dir = TempDir::new().unwrap();
        let empty = write(&dir, "data.bin", b"");
        assert_eq!(classify(&empty), FileClass::Plain);
    }

    #[test]
    fn test_short_file_is_plain() {
        let dir = TempDir::new().unwrap();
        let short = write(&dir, "blob", &[0xcf, 0xfa]);
        assert_eq!(classify(&short), FileClass::Plain);
    }

    #[test]
    fn test_unreadable_file_is_plain() {
        assert_eq!(classify(Path::new("/nonexistent/blob")), FileClass::Plain);
    }

    #[test]
    fn test_elf_is_plain() {
        let dir = TempDir::new().unwrap();
        let elf = write(&dir, "tool", &[0x7f, b'E', b'L', b'F', 2, 1, 1, 0]);
        assert_eq!(classify(&elf), FileClass::Plain);
    }

    #[test]
    fn test_extension_hint_without_extension() {
        assert_eq!(extension_hint(Path::new("lib/tool")), ExtensionHint::Unknown);
        assert_eq!(extension_hint(Path::new("lib/foo.so")), ExtensionHint::Unknown);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn prop_binary_extension_always_binary(stem in "[a-z][a-z0-9_]{0,12}", ext in prop_oneof![Just("a"), Just("dylib")]) {
            let path = std::path::PathBuf::from(format!("/nonexistent/{stem}.{ext}"));
            prop_assert_eq!(classify(&path), FileClass::Binary);
        }

        #[test]
        fn prop_plain_extension_always_plain(stem in "[a-z][a-z0-9_]{0,12}", idx in 0usize..PLAIN_EXTENSIONS.len()) {
            let path = std::path::PathBuf::from(format!("/nonexistent/{stem}.{}", PLAIN_EXTENSIONS[idx]));
            prop_assert_eq!(classify(&path), FileClass::Plain);
        }

        #[test]
        fn prop_missing_files_never_sniff_as_binary(rel in crate::test_utils::generators::package_path()) {
            let path = Path::new("/nonexistent").join(&rel);
            let expected = if rel.ends_with(".a") || rel.ends_with(".dylib") {
                FileClass::Binary
            } else {
                FileClass::Plain
            };
            prop_assert_eq!(classify(&path), expected);
        }
    }
}
