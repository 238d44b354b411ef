/// Version string of the running DDEV build.
///
/// Release builds inject it through the `DDEV_VERSION` environment variable
/// at compile time; local builds fall back to the crate version.
pub const DDEV_VERSION: &str = match option_env!("DDEV_VERSION") {
    Some(version) => version,
    None => concat!("v", env!("CARGO_PKG_VERSION")),
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_not_empty() {
        assert!(!DDEV_VERSION.is_empty());
    }
}
