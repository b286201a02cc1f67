//! Default configuration values

/// Name of the per-architecture scratch folder under build and package roots
pub const ARCH_FOLDER: &str = "conan_archs";

/// Delimiter between architectures in the multi-arch setting
pub const ARCH_DELIMITER: char = ';';

/// Setting that lists the architectures of a fat build
pub const FAT_ARCH_SETTING: &str = "os.fat_arch";

/// Setting for the single target architecture
pub const ARCH_SETTING: &str = "arch";

/// Setting for the target operating system
pub const OS_SETTING: &str = "os";

/// Setting for the minimum OS version (deployment target)
pub const OS_VERSION_SETTING: &str = "os.version";

/// Setting that overrides the multi-arch generator allow-list
pub const MULTI_ARCH_GENERATORS_SETTING: &str = "multi_arch_generators";

/// Option marking a header-only package
pub const HEADER_ONLY_OPTION: &str = "header_only";

/// Option that explicitly declares native multi-arch support
pub const MULTI_ARCH_OPTION: &str = "multi_arch";

/// Default external architecture-combining tool
pub const DEFAULT_COMBINE_TOOL: &str = "lipo";

/// Generators that can natively emit multi-arch builds
pub const DEFAULT_MULTI_ARCH_GENERATORS: &[&str] = &["cmake"];

/// CMake generator that drives all architectures in one invocation
pub const XCODE_CMAKE_GENERATOR: &str = "Xcode";

/// Intermediate per-translation-unit artifacts kept out of packages
pub const DEFAULT_PACKAGE_FILTER: &[&str] = &["*.o", "*.obj", "*.d", "*.dia"];

/// Default recipe file name
pub const DEFAULT_RECIPE_FILE: &str = "recipe.toml";

/// File name of the generated CMake toolchain
pub const TOOLCHAIN_FILE: &str = "fatbuild-toolchain.cmake";
