use crate::catalog::CatalogStore;
use crate::collection::Collection;
use crate::config::Config;
use crate::error::CatalogError;
use crate::media::MediaStore;
use crate::record::Record;
use crate::store::Store;
use anyhow::Result;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectionState {
    /// Backing file absent; the first save creates it.
    Missing,
    Ok { records: usize },
    /// The file exists but a marker is gone, so saving would fail.
    Broken { marker: String },
}

#[derive(Debug)]
pub struct CollectionStatus {
    pub collection: Collection,
    pub path: PathBuf,
    pub state: CollectionState,
}

#[derive(Debug)]
pub struct MediaStatus {
    pub dir: PathBuf,
    pub files: usize,
    pub orphans: Vec<String>,
}

pub struct StatusChecker<'a> {
    config: &'a Config,
    store: &'a dyn Store,
}

impl<'a> StatusChecker<'a> {
    pub fn new(config: &'a Config, store: &'a dyn Store) -> Self {
        Self { config, store }
    }

    fn check_loaded(&self, catalog: &CatalogStore) -> Result<CollectionState> {
        if !self.store.exists(catalog.path()) {
            return Ok(CollectionState::Missing);
        }
        match catalog.render() {
            Ok(_) => Ok(CollectionState::Ok {
                records: catalog.records().len(),
            }),
            Err(CatalogError::StructureNotFound { marker, .. }) => {
                Ok(CollectionState::Broken { marker })
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Load every collection, returning each one's state and the records of
    /// the array collections.
    pub fn check_collections(&self) -> Result<(Vec<CollectionStatus>, Vec<Record>)> {
        let mut statuses = Vec::new();
        let mut records = Vec::new();

        for collection in Collection::ALL {
            let path = self.config.collection_path(collection)?;
            let mut catalog = CatalogStore::new(self.store, collection, path.clone());
            catalog.load()?;

            let state = self.check_loaded(&catalog)?;
            if collection != Collection::Socials {
                records.extend(catalog.records().iter().cloned());
            }

            statuses.push(CollectionStatus {
                collection,
                path,
                state,
            });
        }

        Ok((statuses, records))
    }

    pub fn check_media(&self, records: &[Record]) -> Result<MediaStatus> {
        let media = MediaStore::new(
            self.store,
            self.config.media_dir()?,
            self.config.accept_rules()?,
        );
        let files = media.list()?.len();
        let orphans = media.orphans(records)?;

        Ok(MediaStatus {
            dir: media.dir().to_path_buf(),
            files,
            orphans,
        })
    }
}
