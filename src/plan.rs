use crate::catalog::CatalogStore;
use crate::collection::Collection;
use anyhow::Result;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteStatus {
    Same,
    Create,
    Overwrite,
}

/// One backing file about to be rewritten.
#[derive(Debug, Clone)]
pub struct PendingWrite {
    pub collection: Collection,
    pub path: PathBuf,
    pub before: Option<String>,
    pub after: String,
    pub status: WriteStatus,
    /// Human-readable description of the in-memory edits.
    pub changes: Vec<String>,
}

impl PendingWrite {
    pub fn new(
        collection: Collection,
        path: PathBuf,
        before: Option<String>,
        after: String,
        changes: Vec<String>,
    ) -> Self {
        let status = match &before {
            None => WriteStatus::Create,
            Some(text) if *text == after => WriteStatus::Same,
            Some(_) => WriteStatus::Overwrite,
        };
        Self {
            collection,
            path,
            before,
            after,
            status,
            changes,
        }
    }

    /// Snapshot what `catalog.save()` would do right now.
    pub fn from_catalog(catalog: &CatalogStore, changes: Vec<String>) -> Result<Self> {
        let before = catalog.original()?;
        let after = catalog.render()?;
        Ok(Self::new(
            catalog.collection(),
            catalog.path().to_path_buf(),
            before,
            after,
            changes,
        ))
    }
}

#[derive(Debug, Default)]
pub struct Plan {
    pub writes: Vec<PendingWrite>,
    /// Public paths of media files to delete once the writes succeed.
    pub removals: Vec<String>,
}

impl Plan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, write: PendingWrite) {
        self.writes.push(write);
    }

    pub fn remove_media(&mut self, public_path: impl Into<String>) {
        let public_path = public_path.into();
        if !self.removals.contains(&public_path) {
            self.removals.push(public_path);
        }
    }

    pub fn has_changes(&self) -> bool {
        !self.removals.is_empty() || self.writes.iter().any(|w| w.status != WriteStatus::Same)
    }

    pub fn count_by_status(&self, status: WriteStatus) -> usize {
        self.writes.iter().filter(|w| w.status == status).count()
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty() && self.removals.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{FieldValue, Record};
    use crate::store::mock::MockStore;

    fn write(before: Option<&str>, after: &str) -> PendingWrite {
        PendingWrite::new(
            Collection::Ads,
            PathBuf::from("ads.ts"),
            before.map(str::to_string),
            after.to_string(),
            vec![],
        )
    }

    #[test]
    fn status_create_when_file_missing() {
        assert_eq!(write(None, "x").status, WriteStatus::Create);
    }

    #[test]
    fn status_same_when_content_matches() {
        assert_eq!(write(Some("x"), "x").status, WriteStatus::Same);
    }

    #[test]
    fn status_overwrite_when_content_differs() {
        assert_eq!(write(Some("x"), "y").status, WriteStatus::Overwrite);
    }

    #[test]
    fn plan_tracks_changes() {
        let mut plan = Plan::new();
        assert!(plan.is_empty());

        plan.add(write(Some("x"), "x"));
        assert!(!plan.has_changes());

        plan.add(write(None, "x"));
        assert!(plan.has_changes());
        assert_eq!(plan.count_by_status(WriteStatus::Same), 1);
        assert_eq!(plan.count_by_status(WriteStatus::Create), 1);
    }

    #[test]
    fn media_removals_count_as_changes() {
        let mut plan = Plan::new();
        plan.remove_media("/products/a.jpg");
        plan.remove_media("/products/a.jpg");

        assert!(!plan.is_empty());
        assert!(plan.has_changes());
        assert_eq!(plan.removals, vec!["/products/a.jpg"]);

        plan.add(write(Some("x"), "x"));
        assert!(plan.has_changes());
    }

    #[test]
    fn from_catalog_reflects_unsaved_edits() {
        let original = "export const ads = [\n];";
        let store = MockStore::new().with_file("ads.ts", original.as_bytes());
        let mut catalog = CatalogStore::new(&store, Collection::Ads, "ads.ts");
        catalog.load().unwrap();

        let unchanged = PendingWrite::from_catalog(&catalog, vec![]).unwrap();
        assert_eq!(unchanged.status, WriteStatus::Same);

        catalog
            .append(
                Record::new().with("text", FieldValue::text("Sale")),
                &["/products/a.jpg".to_string()],
            )
            .unwrap();
        let pending = PendingWrite::from_catalog(&catalog, vec!["add".into()]).unwrap();
        assert_eq!(pending.status, WriteStatus::Overwrite);
        assert_eq!(pending.before.as_deref(), Some(original));
        assert!(pending.after.contains("text: \"Sale\""));
        assert_eq!(store.contents("ads.ts").unwrap(), original);
    }
}
