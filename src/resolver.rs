use anyhow::Result;
use std::path::PathBuf;

/// Expand `~` and environment variables in a configured path.
pub fn resolve_path(path: &str) -> Result<PathBuf> {
    let expanded = shellexpand::full(path)
        .map_err(|e| anyhow::anyhow!("Failed to expand path '{}': {}", path, e))?;
    Ok(PathBuf::from(expanded.as_ref()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_tilde_root() {
        let home = dirs::home_dir().unwrap();
        let resolved = resolve_path("~/shop").unwrap();
        assert_eq!(resolved, home.join("shop"));
    }

    #[test]
    fn relative_paths_are_unchanged() {
        let resolved = resolve_path("src/lib/products.ts").unwrap();
        assert_eq!(resolved, PathBuf::from("src/lib/products.ts"));
    }

    #[test]
    fn unknown_variable_is_an_error() {
        assert!(resolve_path("$VITRINE_SURELY_UNSET_VARIABLE/x").is_err());
    }
}
