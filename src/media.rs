use crate::accept::AcceptRules;
use crate::error::{CatalogError, Result};
use crate::record::Record;
use crate::store::Store;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Managed media directory. Files are referenced by callers as
/// `/<dir name>/<file name>`.
pub struct MediaStore<'a> {
    store: &'a dyn Store,
    dir: PathBuf,
    public_name: String,
    accept: AcceptRules,
}

impl<'a> MediaStore<'a> {
    pub fn new(store: &'a dyn Store, dir: impl Into<PathBuf>, accept: AcceptRules) -> Self {
        let dir = dir.into();
        let public_name = dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            store,
            dir,
            public_name,
            accept,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn public_path(&self, file_name: &str) -> String {
        format!("/{}/{}", self.public_name, file_name)
    }

    /// Copy `source` into the media directory without overwriting anything
    /// already there, and return its public path.
    pub fn copy(&self, source: &Path) -> Result<String> {
        let failure = |reason: String| CatalogError::MediaCopy {
            file: source.to_path_buf(),
            reason,
        };

        if !self.store.exists(source) {
            return Err(failure("source file does not exist".to_string()));
        }
        let file_name = source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| failure("source has no file name".to_string()))?;
        if !self.accept.is_accepted(&file_name) {
            return Err(failure("file type is not accepted".to_string()));
        }

        let destination = self.free_destination(&file_name);
        self.store
            .copy(source, &destination)
            .map_err(|e| failure(format!("{:#}", e)))?;

        let final_name = destination
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or(file_name);
        log::info!("Copied {} to {}", source.display(), destination.display());
        Ok(self.public_path(&final_name))
    }

    /// `name.ext`, then `name_1.ext`, `name_2.ext`, ... until unused.
    fn free_destination(&self, file_name: &str) -> PathBuf {
        let candidate = self.dir.join(file_name);
        if !self.store.exists(&candidate) {
            return candidate;
        }

        let path = Path::new(file_name);
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| file_name.to_string());
        let extension = path
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();

        (1..)
            .map(|n| self.dir.join(format!("{}_{}{}", stem, n, extension)))
            .find(|candidate| !self.store.exists(candidate))
            .unwrap_or(candidate)
    }

    /// File on disk behind a public path, if it points into this directory.
    pub fn resolve(&self, public_path: &str) -> Option<PathBuf> {
        let prefix = format!("/{}/", self.public_name);
        let name = public_path.strip_prefix(&prefix)?;
        if name.is_empty() || name.contains('/') || name.contains("..") {
            return None;
        }
        Some(self.dir.join(name))
    }

    /// Every file in the media directory, as sorted public paths.
    pub fn list(&self) -> Result<Vec<String>> {
        let mut paths: Vec<String> = self
            .store
            .list_dir(&self.dir)?
            .iter()
            .filter_map(|path| path.file_name())
            .map(|name| self.public_path(&name.to_string_lossy()))
            .collect();
        paths.sort();
        Ok(paths)
    }

    /// Delete the file behind `public_path`. Returns whether a file was
    /// removed.
    pub fn remove(&self, public_path: &str) -> Result<bool> {
        let Some(path) = self.resolve(public_path) else {
            log::warn!("{} is not inside {}", public_path, self.dir.display());
            return Ok(false);
        };
        if !self.store.exists(&path) {
            return Ok(false);
        }
        self.store.remove(&path)?;
        log::info!("Removed {}", path.display());
        Ok(true)
    }

    /// Media files that no record refers to through `image` or `images`.
    pub fn orphans<'r>(&self, records: impl IntoIterator<Item = &'r Record>) -> Result<Vec<String>> {
        let referenced: HashSet<String> = records
            .into_iter()
            .flat_map(referenced_media)
            .collect();

        Ok(self
            .list()?
            .into_iter()
            .filter(|path| !referenced.contains(path))
            .collect())
    }
}

/// Public paths a record points at.
pub fn referenced_media(record: &Record) -> Vec<String> {
    ["image", "images"]
        .iter()
        .filter_map(|key| record.get(key))
        .flat_map(|value| value.items())
        .filter(|path| !path.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::FieldValue;
    use crate::store::mock::MockStore;
    use crate::store::FileStore;
    use std::fs;

    fn media(root: &Path) -> MediaStore<'static> {
        MediaStore::new(&FileStore, root.join("public/products"), AcceptRules::accept_all())
    }

    #[test]
    fn copy_avoids_collisions() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("a")).unwrap();
        fs::create_dir_all(dir.path().join("b")).unwrap();
        fs::write(dir.path().join("a/photo.jpg"), b"first").unwrap();
        fs::write(dir.path().join("b/photo.jpg"), b"second").unwrap();

        let media = media(dir.path());
        let first = media.copy(&dir.path().join("a/photo.jpg")).unwrap();
        let second = media.copy(&dir.path().join("b/photo.jpg")).unwrap();
        let third = media.copy(&dir.path().join("a/photo.jpg")).unwrap();

        assert_eq!(first, "/products/photo.jpg");
        assert_eq!(second, "/products/photo_1.jpg");
        assert_eq!(third, "/products/photo_2.jpg");

        let stored = dir.path().join("public/products");
        assert_eq!(fs::read(stored.join("photo.jpg")).unwrap(), b"first");
        assert_eq!(fs::read(stored.join("photo_1.jpg")).unwrap(), b"second");
    }

    #[test]
    fn copy_without_extension() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("clip"), b"x").unwrap();

        let media = media(dir.path());
        assert_eq!(media.copy(&dir.path().join("clip")).unwrap(), "/products/clip");
        assert_eq!(media.copy(&dir.path().join("clip")).unwrap(), "/products/clip_1");
    }

    #[test]
    fn missing_source_is_a_copy_failure() {
        let dir = tempfile::tempdir().unwrap();
        let err = media(dir.path())
            .copy(&dir.path().join("nope.jpg"))
            .unwrap_err();
        assert!(matches!(err, CatalogError::MediaCopy { .. }));
    }

    #[test]
    fn rejected_file_type_is_a_copy_failure() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("notes.txt"), b"x").unwrap();

        let media = MediaStore::new(
            &FileStore,
            dir.path().join("public/products"),
            AcceptRules::new(&["*.jpg", "*.png"]).unwrap(),
        );
        let err = media.copy(&dir.path().join("notes.txt")).unwrap_err();
        assert!(matches!(err, CatalogError::MediaCopy { .. }));
        assert!(!dir.path().join("public/products/notes.txt").exists());
    }

    #[test]
    fn list_orphans_and_remove() {
        let dir = tempfile::tempdir().unwrap();
        let stored = dir.path().join("public/products");
        fs::create_dir_all(&stored).unwrap();
        for name in ["a.jpg", "b.jpg", "c.jpg"] {
            fs::write(stored.join(name), b"x").unwrap();
        }

        let media = media(dir.path());
        assert_eq!(
            media.list().unwrap(),
            vec!["/products/a.jpg", "/products/b.jpg", "/products/c.jpg"]
        );

        let record = Record::new()
            .with("image", FieldValue::text("/products/a.jpg"))
            .with(
                "images",
                FieldValue::List(vec!["/products/a.jpg".into(), "/products/c.jpg".into()]),
            );
        assert_eq!(media.orphans([&record]).unwrap(), vec!["/products/b.jpg"]);

        assert!(media.remove("/products/b.jpg").unwrap());
        assert!(!media.remove("/products/b.jpg").unwrap());
        assert!(!media.remove("/elsewhere/a.jpg").unwrap());
        assert!(!media.remove("/products/../secret").unwrap());
        assert_eq!(media.orphans([&record]).unwrap(), Vec::<String>::new());
    }

    #[test]
    fn orphans_through_any_store() {
        let store = MockStore::new()
            .with_file("public/products/a.jpg", b"a")
            .with_file("public/products/b.mp4", b"b")
            .with_file("public/other/c.jpg", b"c")
            .with_file("src/lib/ads.ts", b"export const ads = [\n];");
        let media = MediaStore::new(&store, "public/products", AcceptRules::accept_all());

        assert_eq!(
            media.list().unwrap(),
            vec!["/products/a.jpg", "/products/b.mp4"]
        );

        let record = Record::new().with("image", FieldValue::text("/products/b.mp4"));
        assert_eq!(media.orphans([&record]).unwrap(), vec!["/products/a.jpg"]);

        assert!(media.remove("/products/a.jpg").unwrap());
        assert!(store.contents("public/products/a.jpg").is_none());
    }

    #[test]
    fn list_missing_directory_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(media(dir.path()).list().unwrap().is_empty());
    }
}
