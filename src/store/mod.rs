mod file;

pub use file::FileStore;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

pub trait Store: Send + Sync {
    fn name(&self) -> &'static str;

    fn read(&self, path: &Path) -> Result<Vec<u8>>;

    fn write(&self, path: &Path, content: &[u8]) -> Result<()>;

    fn exists(&self, path: &Path) -> bool;

    fn remove(&self, path: &Path) -> Result<()>;

    /// Files directly inside `dir`, in no particular order. A missing
    /// directory has no files.
    fn list_dir(&self, dir: &Path) -> Result<Vec<PathBuf>>;

    fn read_to_string(&self, path: &Path) -> Result<String> {
        let bytes = self.read(path)?;
        String::from_utf8(bytes).with_context(|| format!("Not valid UTF-8: {}", path.display()))
    }

    fn copy(&self, source: &Path, destination: &Path) -> Result<()> {
        let content = self.read(source)?;
        self.write(destination, &content)
    }
}

#[cfg(test)]
pub mod mock {
    use super::Store;
    use anyhow::Result;
    use std::collections::HashMap;
    use std::path::{Path, PathBuf};
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct MockStore {
        files: Mutex<HashMap<PathBuf, Vec<u8>>>,
    }

    impl MockStore {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_file(self, path: &str, content: &[u8]) -> Self {
            self.files
                .lock()
                .unwrap()
                .insert(PathBuf::from(path), content.to_vec());
            self
        }

        pub fn contents(&self, path: &str) -> Option<String> {
            self.files
                .lock()
                .unwrap()
                .get(Path::new(path))
                .map(|b| String::from_utf8_lossy(b).into_owned())
        }
    }

    impl Store for MockStore {
        fn name(&self) -> &'static str {
            "mock"
        }

        fn read(&self, path: &Path) -> Result<Vec<u8>> {
            self.files
                .lock()
                .unwrap()
                .get(path)
                .cloned()
                .ok_or_else(|| anyhow::anyhow!("File not found: {}", path.display()))
        }

        fn write(&self, path: &Path, content: &[u8]) -> Result<()> {
            self.files
                .lock()
                .unwrap()
                .insert(path.to_path_buf(), content.to_vec());
            Ok(())
        }

        fn exists(&self, path: &Path) -> bool {
            self.files.lock().unwrap().contains_key(path)
        }

        fn remove(&self, path: &Path) -> Result<()> {
            self.files.lock().unwrap().remove(path);
            Ok(())
        }

        fn list_dir(&self, dir: &Path) -> Result<Vec<PathBuf>> {
            Ok(self
                .files
                .lock()
                .unwrap()
                .keys()
                .filter(|path| path.parent() == Some(dir))
                .cloned()
                .collect())
        }
    }
}
