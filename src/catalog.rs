use crate::codec::{self, MissingMarker};
use crate::collection::{Collection, Layout};
use crate::error::{CatalogError, Result, ValidationError};
use crate::record::{FieldValue, Record};
use crate::store::Store;
use std::path::{Path, PathBuf};

/// In-memory copy of one collection, backed by one text file.
///
/// Nothing touches disk except [`CatalogStore::load`] and
/// [`CatalogStore::save`]; every mutation in between is in memory only.
pub struct CatalogStore<'a> {
    store: &'a dyn Store,
    collection: Collection,
    path: PathBuf,
    records: Vec<Record>,
}

impl<'a> CatalogStore<'a> {
    pub fn new(store: &'a dyn Store, collection: Collection, path: impl Into<PathBuf>) -> Self {
        Self {
            store,
            collection,
            path: path.into(),
            records: Vec::new(),
        }
    }

    pub fn collection(&self) -> Collection {
        self.collection
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Re-read the backing file, replacing whatever is held in memory.
    pub fn load(&mut self) -> Result<&[Record]> {
        let template = self.collection.template();
        let schema = self.collection.schema();

        let parsed = if self.store.exists(&self.path) {
            let text = self.store.read_to_string(&self.path)?;
            codec::parse(&text, &template, &schema)
        } else {
            log::debug!(
                "{} does not exist, starting with an empty {}",
                self.path.display(),
                self.collection.name()
            );
            Vec::new()
        };

        self.records = match template.layout {
            Layout::Array { .. } => parsed,
            Layout::Mapping => vec![schema.with_defaults(parsed.into_iter().next())],
        };

        log::info!(
            "Loaded {} {} record(s) from {} via {} store",
            self.records.len(),
            self.collection.name(),
            self.path.display(),
            self.store.name()
        );
        Ok(&self.records)
    }

    /// Check user-supplied fields before anything is copied or appended.
    /// `media` lists the public paths that will be attached by `append`.
    pub fn validate(&self, fields: &Record, media: &[String]) -> Result<()> {
        let schema = self.collection.schema();

        for key in schema.required {
            let from_media = !media.is_empty()
                && (*key == "image" || (schema.multi_media && *key == "images"));
            if !fields.contains_key(key) && !from_media {
                return Err(ValidationError::MissingField(key.to_string()).into());
            }
        }

        for (key, value) in fields.iter() {
            if value.is_empty() {
                return Err(ValidationError::EmptyField(key.to_string()).into());
            }
        }

        for key in schema.numeric {
            if let Some(value) = fields.get(key) {
                if numeric(value).is_none() {
                    return Err(ValidationError::NotNumeric {
                        field: key.to_string(),
                        value: value.to_string(),
                    }
                    .into());
                }
            }
        }

        if let Some(id) = fields.get("id") {
            let id = id.to_string();
            if self.records.iter().any(|r| r.display("id") == id) {
                return Err(ValidationError::DuplicateId(id).into());
            }
        }

        Ok(())
    }

    /// `max(existing numeric ids, default 0) + 1`.
    pub fn next_id(&self) -> Result<u64> {
        let highest = self
            .records
            .iter()
            .filter_map(Record::numeric_id)
            .max()
            .unwrap_or(0);
        highest
            .checked_add(1)
            .ok_or_else(|| ValidationError::IdExhausted(highest).into())
    }

    pub fn append(&mut self, fields: Record, media: &[String]) -> Result<&Record> {
        self.ensure_array("append")?;
        self.validate(&fields, media)?;
        let schema = self.collection.schema();
        let id = if schema.sequential_ids {
            Some(self.next_id()?)
        } else {
            None
        };

        let mut record = Record::new();
        for (key, value) in fields.iter() {
            if key == "id" {
                continue;
            }
            let value = match (schema.numeric.contains(&key), numeric(value)) {
                (true, Some(n)) => FieldValue::Number(n),
                _ => value.clone(),
            };
            record.insert(key, value);
        }

        if let Some(id) = id {
            record.insert("id", FieldValue::Text(id.to_string()));
        }

        if let Some(first) = media.first() {
            record.insert("image", FieldValue::text(first.as_str()));
        }
        if schema.multi_media {
            if !record.contains_key("image") {
                record.insert("image", FieldValue::text(""));
            }
            record.insert("images", FieldValue::List(media.to_vec()));
        }

        log::debug!(
            "Appending {} record with id {}",
            self.collection.name(),
            record.display("id")
        );
        let index = self.records.len();
        self.records.push(record);
        Ok(&self.records[index])
    }

    pub fn delete_at(&mut self, index: usize) -> Result<Record> {
        self.ensure_array("delete")?;
        if index >= self.records.len() {
            return Err(CatalogError::NotFound {
                index,
                len: self.records.len(),
            });
        }
        Ok(self.records.remove(index))
    }

    /// Add or update one key of a mapping collection.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.ensure_mapping("set")?;
        if key.trim().is_empty() {
            return Err(ValidationError::EmptyField("key".to_string()).into());
        }
        self.mapping_mut().insert(key.trim(), FieldValue::text(value));
        Ok(())
    }

    pub fn unset(&mut self, key: &str) -> Result<Option<FieldValue>> {
        self.ensure_mapping("unset")?;
        Ok(self.mapping_mut().remove(key))
    }

    /// Current content of the backing file, if any.
    pub fn original(&self) -> Result<Option<String>> {
        if !self.store.exists(&self.path) {
            return Ok(None);
        }
        Ok(Some(self.store.read_to_string(&self.path)?))
    }

    /// Full file text that `save` would write.
    pub fn render(&self) -> Result<String> {
        let template = self.collection.template();
        let block = codec::serialize(&self.records, &template);

        match self.original()? {
            None => Ok(format!("{}\n", block)),
            Some(original) => codec::splice(&original, &template, &block).map_err(
                |MissingMarker(marker)| CatalogError::StructureNotFound {
                    path: self.path.clone(),
                    marker,
                },
            ),
        }
    }

    pub fn save(&self) -> Result<()> {
        let text = self.render()?;
        self.store.write(&self.path, text.as_bytes())?;
        log::info!(
            "Saved {} {} record(s) to {}",
            self.records.len(),
            self.collection.name(),
            self.path.display()
        );
        Ok(())
    }

    fn mapping_mut(&mut self) -> &mut Record {
        if self.records.is_empty() {
            self.records.push(Record::new());
        }
        &mut self.records[0]
    }

    fn ensure_array(&self, operation: &'static str) -> Result<()> {
        match self.collection.template().layout {
            Layout::Array { .. } => Ok(()),
            Layout::Mapping => Err(self.unsupported(operation)),
        }
    }

    fn ensure_mapping(&self, operation: &'static str) -> Result<()> {
        match self.collection.template().layout {
            Layout::Mapping => Ok(()),
            Layout::Array { .. } => Err(self.unsupported(operation)),
        }
    }

    fn unsupported(&self, operation: &'static str) -> CatalogError {
        CatalogError::Unsupported {
            collection: self.collection.name(),
            operation,
        }
    }
}

fn numeric(value: &FieldValue) -> Option<f64> {
    match value {
        FieldValue::Number(n) => Some(*n),
        FieldValue::Text(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        FieldValue::List(_) => None,
    }
}
