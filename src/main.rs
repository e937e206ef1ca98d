mod accept;
mod catalog;
mod cli;
mod codec;
mod collection;
mod config;
mod error;
mod media;
mod plan;
mod record;
mod resolver;
mod review;
mod status;
mod store;

use anyhow::{Context, Result};
use colored::Colorize;
use std::path::PathBuf;

use catalog::CatalogStore;
use cli::{AdAction, Command, MediaAction, ProductAction, SocialAction};
use collection::Collection;
use config::Config;
use media::MediaStore;
use plan::{PendingWrite, Plan};
use record::{FieldValue, Record};
use review::Review;
use status::{CollectionState, StatusChecker};
use store::{FileStore, Store};

fn main() -> Result<()> {
    env_logger::init();

    let args = cli::parse();
    let config = Config::load(&args.config)?;
    let store = FileStore;

    match args.command {
        Command::Products { product_action } => {
            run_products(&config, &store, product_action, args.yes)
        }
        Command::Ads { ad_action } => run_ads(&config, &store, ad_action, args.yes),
        Command::Socials { social_action } => {
            run_socials(&config, &store, social_action, args.yes)
        }
        Command::Media { media_action } => run_media(&config, &store, media_action, args.yes),
        Command::Status => run_status(&config, &store),
    }
}

fn run_products(config: &Config, store: &dyn Store, action: ProductAction, yes: bool) -> Result<()> {
    match action {
        ProductAction::List => list_records(
            config,
            store,
            Collection::Products,
            &["id", "name", "price", "category", "image"],
        ),
        ProductAction::Add {
            name,
            description,
            price,
            category,
            media,
        } => {
            let fields = Record::new()
                .with("name", FieldValue::Text(name))
                .with("description", FieldValue::Text(description))
                .with("price", FieldValue::Text(price))
                .with("category", FieldValue::Text(category));
            add_record(config, store, Collection::Products, fields, &media, yes)
        }
        ProductAction::Delete { purge_media, index } => {
            delete_record(config, store, Collection::Products, index, purge_media, yes)
        }
    }
}

fn run_ads(config: &Config, store: &dyn Store, action: AdAction, yes: bool) -> Result<()> {
    match action {
        AdAction::List => list_records(config, store, Collection::Ads, &["id", "text", "image"]),
        AdAction::Add { text, media } => {
            let fields = Record::new().with("text", FieldValue::Text(text));
            add_record(config, store, Collection::Ads, fields, &[media], yes)
        }
        AdAction::Delete { purge_media, index } => {
            delete_record(config, store, Collection::Ads, index, purge_media, yes)
        }
    }
}

fn open_catalog<'a>(
    config: &Config,
    store: &'a dyn Store,
    collection: Collection,
) -> Result<CatalogStore<'a>> {
    let path = config.collection_path(collection)?;
    let mut catalog = CatalogStore::new(store, collection, path);
    catalog
        .load()
        .with_context(|| format!("Failed to load {}", collection.name()))?;
    Ok(catalog)
}

fn open_media<'a>(config: &Config, store: &'a dyn Store) -> Result<MediaStore<'a>> {
    Ok(MediaStore::new(
        store,
        config.media_dir()?,
        config.accept_rules()?,
    ))
}

fn list_records(
    config: &Config,
    store: &dyn Store,
    collection: Collection,
    columns: &[&str],
) -> Result<()> {
    let catalog = open_catalog(config, store, collection)?;

    if catalog.records().is_empty() {
        println!("No {} in {}.", collection.name(), catalog.path().display());
        return Ok(());
    }

    println!("{:>4}  {}", "#".bold(), columns.join("  ").bold());
    for (idx, record) in catalog.records().iter().enumerate() {
        let values: Vec<String> = columns.iter().map(|c| record.display(c)).collect();
        println!("{:>4}  {}", idx + 1, values.join("  "));
    }
    Ok(())
}

fn add_record(
    config: &Config,
    store: &dyn Store,
    collection: Collection,
    fields: Record,
    sources: &[PathBuf],
    yes: bool,
) -> Result<()> {
    let mut catalog = open_catalog(config, store, collection)?;
    let media = open_media(config, store)?;

    let pending: Vec<String> = sources.iter().map(|p| p.display().to_string()).collect();
    catalog.validate(&fields, &pending)?;

    let mut copied = Vec::new();
    for source in sources {
        match media.copy(source) {
            Ok(public_path) => copied.push(public_path),
            Err(e) => {
                discard_media(&media, &copied);
                return Err(e.into());
            }
        }
    }

    // Copied files only stay if the record referring to them was written.
    match save_added(&mut catalog, fields, &copied, yes) {
        Ok(true) => Ok(()),
        Ok(false) => {
            discard_media(&media, &copied);
            Ok(())
        }
        Err(e) => {
            discard_media(&media, &copied);
            Err(e)
        }
    }
}

/// Append, review and save. Returns whether the file was written.
fn save_added(
    catalog: &mut CatalogStore,
    fields: Record,
    media: &[String],
    yes: bool,
) -> Result<bool> {
    let record = catalog.append(fields, media)?;
    let added = format!("add #{} {}", record.display("id"), describe(record));

    let mut plan = Plan::new();
    plan.add(PendingWrite::from_catalog(catalog, vec![added])?);

    let operation = format!("Save {}", catalog.collection().name());
    Review.run(&plan, &operation, yes, || Ok(catalog.save()?))
}

fn delete_record(
    config: &Config,
    store: &dyn Store,
    collection: Collection,
    position: usize,
    purge_media: bool,
    yes: bool,
) -> Result<()> {
    let mut catalog = open_catalog(config, store, collection)?;
    let index = position.checked_sub(1).context("Positions start at 1")?;
    let removed = catalog.delete_at(index)?;

    let mut plan = Plan::new();
    plan.add(PendingWrite::from_catalog(
        &catalog,
        vec![format!("delete #{} {}", position, describe(&removed))],
    )?);
    if purge_media {
        for path in media::referenced_media(&removed) {
            plan.remove_media(path);
        }
    }

    let media = open_media(config, store)?;
    let operation = format!("Save {}", collection.name());
    Review.run(&plan, &operation, yes, || {
        catalog.save()?;
        remove_media(&media, &plan.removals)
    })?;
    Ok(())
}

fn remove_media(media: &MediaStore, paths: &[String]) -> Result<()> {
    for path in paths {
        media.remove(path)?;
    }
    Ok(())
}

fn discard_media(media: &MediaStore, copied: &[String]) {
    for path in copied {
        if let Err(e) = media.remove(path) {
            log::warn!("Could not remove {}: {}", path, e);
        }
    }
}

fn describe(record: &Record) -> String {
    ["name", "text"]
        .iter()
        .find_map(|key| record.get(key))
        .map(|v| format!("'{}'", v))
        .unwrap_or_default()
}

fn run_socials(config: &Config, store: &dyn Store, action: SocialAction, yes: bool) -> Result<()> {
    let mut catalog = open_catalog(config, store, Collection::Socials)?;

    let change = match action {
        SocialAction::Show => {
            if let Some(links) = catalog.records().first() {
                for (key, value) in links.iter() {
                    let value = value.to_string();
                    let shown = if value.is_empty() {
                        "(not set)".dimmed()
                    } else {
                        value.normal()
                    };
                    println!("  {:<10} {}", key.bold(), shown);
                }
            }
            return Ok(());
        }
        SocialAction::Set { key, value } => {
            catalog.set(&key, &value)?;
            format!("set {} = {}", key, value)
        }
        SocialAction::Unset { key } => {
            if catalog.unset(&key)?.is_none() {
                println!("No social link named '{}'.", key);
                return Ok(());
            }
            format!("unset {}", key)
        }
    };

    let mut plan = Plan::new();
    plan.add(PendingWrite::from_catalog(&catalog, vec![change])?);
    Review.run(&plan, "Save socials", yes, || Ok(catalog.save()?))?;
    Ok(())
}

fn run_media(config: &Config, store: &dyn Store, action: MediaAction, yes: bool) -> Result<()> {
    let media = open_media(config, store)?;

    match action {
        MediaAction::Copy { file } => {
            let public_path = media.copy(&file)?;
            println!("{}", public_path);
        }
        MediaAction::List => {
            for path in media.list()? {
                println!("{}", path);
            }
        }
        MediaAction::Orphans { purge } => {
            let mut records = Vec::new();
            for collection in [Collection::Products, Collection::Ads] {
                let catalog = open_catalog(config, store, collection)?;
                records.extend(catalog.records().iter().cloned());
            }

            let orphans = media.orphans(&records)?;
            if orphans.is_empty() {
                println!("No orphaned media in {}.", media.dir().display());
                return Ok(());
            }
            if !purge {
                for path in &orphans {
                    println!("  {}", path);
                }
                return Ok(());
            }

            let mut plan = Plan::new();
            for path in orphans {
                plan.remove_media(path);
            }
            Review.run(&plan, "Remove orphaned media", yes, || {
                remove_media(&media, &plan.removals)
            })?;
        }
    }
    Ok(())
}

fn run_status(config: &Config, store: &dyn Store) -> Result<()> {
    let checker = StatusChecker::new(config, store);
    let (collections, records) = checker.check_collections()?;

    println!("{}:", "Collections".bold());
    for status in &collections {
        let label = match &status.state {
            CollectionState::Missing => "missing".yellow(),
            CollectionState::Ok { records } => format!("{} record(s)", records).green(),
            CollectionState::Broken { marker } => format!("missing marker '{}'", marker).red(),
        };
        println!(
            "  {:<9} {} ({})",
            status.collection.name(),
            status.path.display(),
            label
        );
    }

    let media = checker.check_media(&records)?;
    println!("\n{}:", "Media".bold());
    println!(
        "  {} ({} file(s), {} orphaned)",
        media.dir.display(),
        media.files,
        media.orphans.len()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;

    fn config_for(root: &Path) -> Config {
        Config::parse(&format!("version: v1\nroot: {}", root.display())).unwrap()
    }

    fn media_files(root: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(root.join("public/products"))
            .map(|entries| {
                entries
                    .filter_map(|e| e.ok())
                    .map(|e| e.file_name().to_string_lossy().into_owned())
                    .collect()
            })
            .unwrap_or_default();
        names.sort();
        names
    }

    fn shop(ads: &str) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let lib = dir.path().join("src/lib");
        fs::create_dir_all(&lib).unwrap();
        fs::write(lib.join("ads.ts"), ads).unwrap();
        fs::write(dir.path().join("photo.jpg"), b"jpeg").unwrap();
        dir
    }

    #[test]
    fn add_saves_record_and_keeps_media() {
        let dir = shop("export const ads = [\n];\n");
        let config = config_for(dir.path());
        let fields = Record::new().with("text", FieldValue::text("Sale"));

        add_record(
            &config,
            &FileStore,
            Collection::Ads,
            fields,
            &[dir.path().join("photo.jpg")],
            true,
        )
        .unwrap();

        let ads = fs::read_to_string(dir.path().join("src/lib/ads.ts")).unwrap();
        assert!(ads.contains("image: \"/products/photo.jpg\""));
        assert_eq!(media_files(dir.path()), vec!["photo.jpg"]);
    }

    #[test]
    fn failed_save_discards_copied_media() {
        let original = "// hand written\nconst ads = [];\n";
        let dir = shop(original);
        let config = config_for(dir.path());
        let fields = Record::new().with("text", FieldValue::text("Sale"));

        let err = add_record(
            &config,
            &FileStore,
            Collection::Ads,
            fields,
            &[dir.path().join("photo.jpg")],
            true,
        )
        .unwrap_err();

        assert!(err.to_string().contains("export const ads = ["));
        assert!(media_files(dir.path()).is_empty());
        assert_eq!(
            fs::read_to_string(dir.path().join("src/lib/ads.ts")).unwrap(),
            original
        );
    }

    #[test]
    fn orphan_purge_removes_only_unreferenced_files() {
        let dir = shop(
            "export const ads = [\n  { text: \"A\", image: \"/products/used.jpg\" }\n];\n",
        );
        let stored = dir.path().join("public/products");
        fs::create_dir_all(&stored).unwrap();
        fs::write(stored.join("used.jpg"), b"u").unwrap();
        fs::write(stored.join("stale.jpg"), b"s").unwrap();
        let config = config_for(dir.path());

        run_media(&config, &FileStore, MediaAction::Orphans { purge: false }, true).unwrap();
        assert_eq!(media_files(dir.path()), vec!["stale.jpg", "used.jpg"]);

        run_media(&config, &FileStore, MediaAction::Orphans { purge: true }, true).unwrap();
        assert_eq!(media_files(dir.path()), vec!["used.jpg"]);
    }

    #[test]
    fn delete_with_purge_removes_the_record_media() {
        let dir = shop(
            "export const ads = [\n  { text: \"A\", image: \"/products/a.jpg\" }\n];\n",
        );
        let stored = dir.path().join("public/products");
        fs::create_dir_all(&stored).unwrap();
        fs::write(stored.join("a.jpg"), b"a").unwrap();
        let config = config_for(dir.path());

        delete_record(&config, &FileStore, Collection::Ads, 1, true, true).unwrap();

        assert_eq!(
            fs::read_to_string(dir.path().join("src/lib/ads.ts")).unwrap(),
            "export const ads = [\n];\n"
        );
        assert!(media_files(dir.path()).is_empty());
    }
}
