use crate::accept::AcceptRules;
use crate::collection::Collection;
use crate::resolver;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Collections {
    pub products: String,
    pub ads: String,
    pub socials: String,
}

impl Default for Collections {
    fn default() -> Self {
        Self {
            products: "src/lib/products.ts".to_string(),
            ads: "src/lib/ads.ts".to_string(),
            socials: "src/lib/socials.ts".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MediaConfig {
    pub dir: String,
    pub accept: Vec<String>,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            dir: "public/products".to_string(),
            accept: ["*.png", "*.jpg", "*.jpeg", "*.webp", "*.gif", "*.mp4", "*.webm", "*.mov"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub version: String,
    #[serde(default = "default_root")]
    pub root: String,
    #[serde(default)]
    pub collections: Collections,
    #[serde(default)]
    pub media: MediaConfig,
}

fn default_root() -> String {
    ".".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: "v1".to_string(),
            root: default_root(),
            collections: Collections::default(),
            media: MediaConfig::default(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::info!("{} not found, using default layout", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Invalid config: {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Config =
            serde_yaml::from_str(content).with_context(|| "Failed to parse config")?;

        if config.version != "v1" {
            anyhow::bail!("Unsupported config version: {}", config.version);
        }

        Ok(config)
    }

    pub fn root_dir(&self) -> Result<PathBuf> {
        resolver::resolve_path(&self.root)
    }

    pub fn collection_path(&self, collection: Collection) -> Result<PathBuf> {
        let relative = match collection {
            Collection::Products => &self.collections.products,
            Collection::Ads => &self.collections.ads,
            Collection::Socials => &self.collections.socials,
        };
        Ok(self.root_dir()?.join(resolver::resolve_path(relative)?))
    }

    pub fn media_dir(&self) -> Result<PathBuf> {
        Ok(self.root_dir()?.join(resolver::resolve_path(&self.media.dir)?))
    }

    /// An empty `media.accept` list lets every file through.
    pub fn accept_rules(&self) -> Result<AcceptRules> {
        if self.media.accept.is_empty() {
            return Ok(AcceptRules::accept_all());
        }
        AcceptRules::new(&self.media.accept).context("Invalid media.accept pattern")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_minimal_config() {
        let config = Config::parse("version: v1").unwrap();
        assert_eq!(config.version, "v1");
        assert_eq!(config.root, ".");
        assert_eq!(config.collections.products, "src/lib/products.ts");
        assert_eq!(config.media.dir, "public/products");
        assert!(!config.media.accept.is_empty());
    }

    #[test]
    fn empty_accept_list_allows_any_file() {
        let config = Config::parse("version: v1\nmedia:\n  accept: []").unwrap();
        let rules = config.accept_rules().unwrap();
        assert!(rules.is_accepted("manual.pdf"));

        let rules = Config::parse("version: v1").unwrap().accept_rules().unwrap();
        assert!(!rules.is_accepted("manual.pdf"));
        assert!(rules.is_accepted("photo.JPG"));
    }

    #[test]
    fn parse_rejects_unknown_version() {
        let err = Config::parse("version: v99").unwrap_err();
        assert!(err.to_string().contains("Unsupported config version"));
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = Config::parse(
            r#"
version: v1
root: /srv/shop
collections:
  ads: data/ads.ts
media:
  accept: ["*.jpg"]
"#,
        )
        .unwrap();

        assert_eq!(config.collections.ads, "data/ads.ts");
        assert_eq!(config.collections.socials, "src/lib/socials.ts");
        assert_eq!(config.media.dir, "public/products");
        assert_eq!(
            config.collection_path(Collection::Ads).unwrap(),
            PathBuf::from("/srv/shop/data/ads.ts")
        );
        assert_eq!(
            config.media_dir().unwrap(),
            PathBuf::from("/srv/shop/public/products")
        );

        let rules = config.accept_rules().unwrap();
        assert!(rules.is_accepted("a.jpg"));
        assert!(!rules.is_accepted("a.png"));
    }

    #[test]
    fn absolute_collection_path_overrides_root() {
        let config = Config::parse("version: v1\nroot: /srv/shop\ncollections:\n  products: /tmp/p.ts").unwrap();
        assert_eq!(
            config.collection_path(Collection::Products).unwrap(),
            PathBuf::from("/tmp/p.ts")
        );
    }

    #[test]
    fn missing_config_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(&dir.path().join("vitrine.yaml")).unwrap();
        assert_eq!(config.version, "v1");
        assert_eq!(config.collections.socials, "src/lib/socials.ts");
    }
}
