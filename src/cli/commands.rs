//! CLI Command Implementations
//!
//! Implements the actual logic for each CLI command.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use log::{info, warn};
use walkdir::WalkDir;

use crate::assets::{self, Asset};
use crate::bundle::{self, ResourceBundle, ANIMATION_MIME_TYPE, TILEMAP_MIME_TYPE};
use crate::config::ProjectConfig;
use crate::error::{AssetError, Result};
use crate::project::AssetProject;

/// Read and parse a bundle file.
pub fn read_bundle(path: &Path) -> Result<ResourceBundle> {
    let content = fs::read_to_string(path).map_err(|e| AssetError::FileReadError {
        path: path.to_path_buf(),
        source: e,
    })?;
    bundle::parse_bundle(&content)
}

/// Load a bundle file into a fresh project.
pub fn load_project(bundle_path: &Path, config: Option<&Path>) -> Result<AssetProject> {
    let config = match config {
        Some(path) => ProjectConfig::load(path)?,
        None => ProjectConfig::default(),
    };

    let bundle = read_bundle(bundle_path)?;
    let mut project = AssetProject::with_config(config);
    let summary = project.load_bundles(&bundle, &[]);
    if summary.skipped > 0 {
        warn!(
            "{} entries in {} could not be decoded",
            summary.skipped,
            bundle_path.display()
        );
    }
    Ok(project)
}

/// List every asset in a bundle.
pub fn list(bundle_path: &Path, config: Option<&Path>) -> Result<()> {
    info!("Listing assets in: {}", bundle_path.display());
    let project = load_project(bundle_path, config)?;

    let assets = project.get_all_assets();
    if assets.is_empty() {
        println!("No assets in bundle.");
        return Ok(());
    }

    println!("{:<10} {:<32} {:<24} {:>6}", "KIND", "ID", "NAME", "IID");
    println!("{:-<75}", "");
    for asset in &assets {
        println!(
            "{:<10} {:<32} {:<24} {:>6}",
            asset.asset_type(),
            asset.id(),
            asset.meta().display_name().unwrap_or("-"),
            asset.internal_id()
        );
    }
    println!("{:-<75}", "");
    println!("{} assets", assets.len());

    for asset in invalid_display_names(&project) {
        warn!(
            "{} {} has display name '{}' which cannot be used in source references",
            asset.asset_type(),
            asset.id(),
            asset.meta().display_name().unwrap_or_default()
        );
    }

    Ok(())
}

/// Collect the contents of every `.ts` and `.py` file under `dir`, keyed by
/// path relative to `dir`.
pub fn collect_source_files(dir: &Path) -> Result<BTreeMap<String, String>> {
    let mut files = BTreeMap::new();

    for entry in WalkDir::new(dir) {
        let entry = entry.map_err(|e| AssetError::Io(e.into()))?;
        if !entry.file_type().is_file() {
            continue;
        }

        let name = entry.file_name().to_string_lossy();
        if !(name.ends_with(".ts") || name.ends_with(".py")) {
            continue;
        }

        let content = fs::read_to_string(entry.path()).map_err(|e| AssetError::FileReadError {
            path: entry.path().to_path_buf(),
            source: e,
        })?;
        let key = entry
            .path()
            .strip_prefix(dir)
            .unwrap_or(entry.path())
            .to_string_lossy()
            .into_owned();
        files.insert(key, content);
    }

    Ok(files)
}

/// Project assets not referenced by any block, tilemap or source file.
pub fn unused_assets(project: &AssetProject, files: &BTreeMap<String, String>) -> Vec<Asset> {
    project
        .get_all_assets()
        .into_iter()
        .filter(|asset| !project.is_asset_used(asset, Some(files), &[]))
        .collect()
}

/// Project assets whose display name is not a valid source identifier.
pub fn invalid_display_names(project: &AssetProject) -> Vec<Asset> {
    project
        .get_all_assets()
        .into_iter()
        .filter(|asset| {
            asset
                .meta()
                .display_name()
                .is_some_and(|name| !assets::validate_asset_name(name))
        })
        .collect()
}

/// One report line: kind, id and the expression that would reference it.
pub fn describe_asset(asset: &Asset) -> String {
    match assets::ts_reference_for_asset(asset, false) {
        Some(reference) => format!("{} {} ({})", asset.asset_type(), asset.id(), reference),
        None => format!("{} {}", asset.asset_type(), asset.id()),
    }
}

/// Report assets that no source file references.
pub fn usage(bundle_path: &Path, source_dir: &Path, config: Option<&Path>) -> Result<()> {
    info!(
        "Checking usage of {} against {}",
        bundle_path.display(),
        source_dir.display()
    );
    let project = load_project(bundle_path, config)?;
    let files = collect_source_files(source_dir)?;
    info!("Scanned {} source files", files.len());

    let unused = unused_assets(&project, &files);
    if unused.is_empty() {
        println!("All assets are in use.");
        return Ok(());
    }

    println!("Unused assets:");
    for asset in &unused {
        println!("  {}", describe_asset(asset));
    }
    println!("{} of {} assets unused", unused.len(), project.get_all_assets().len());

    Ok(())
}

/// Ids of tilemap and animation entries whose data changes after a load and
/// re-export. JSON-encoded animations are always rewritten and not reported.
pub fn roundtrip_changes(original: &ResourceBundle, config: ProjectConfig) -> Result<Vec<String>> {
    let mut project = AssetProject::with_config(config);
    project.load_bundles(original, &[]);

    let exported = bundle::merge_bundles([
        &project.get_project_tileset_bundle()?,
        &project.get_project_assets_bundle()?,
    ]);

    let reloaded: BTreeMap<String, String> = bundle::inflate_bundle(&exported)
        .into_values()
        .map(|entry| (entry.asset_id(), entry.data))
        .collect();

    let changed = bundle::inflate_bundle(original)
        .into_values()
        .filter(|entry| entry.mime_type == TILEMAP_MIME_TYPE || entry.mime_type == ANIMATION_MIME_TYPE)
        .filter(|entry| !entry.is_json_encoded())
        .filter(|entry| reloaded.get(&entry.asset_id()) != Some(&entry.data))
        .map(|entry| entry.asset_id())
        .collect();

    Ok(changed)
}

/// Reload and re-export a bundle, reporting entries whose encoding changes.
pub fn roundtrip(bundle_path: &Path, config: Option<&Path>) -> Result<()> {
    info!("Round-tripping: {}", bundle_path.display());

    let config = match config {
        Some(path) => ProjectConfig::load(path)?,
        None => ProjectConfig::default(),
    };
    let original = read_bundle(bundle_path)?;
    let changed = roundtrip_changes(&original, config)?;

    if changed.is_empty() {
        println!("Round trip is lossless.");
    } else {
        println!("Entries changed by round trip:");
        for id in &changed {
            println!("  {}", id);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::AssetType;
    use crate::sprite::Bitmap;

    fn sample_bundle() -> ResourceBundle {
        let mut project = AssetProject::new();
        project.create_new_tilemap(None, 8, Some((3, 2)));
        project.create_new_project_image(Bitmap::new(4, 4), Some("hero"));
        project.create_new_animation_from_data(vec![Bitmap::new(2, 2); 3], Some(200), Some("walk"));

        bundle::merge_bundles([
            &project.get_project_tileset_bundle().unwrap(),
            &project.get_project_assets_bundle().unwrap(),
        ])
    }

    fn write_bundle(dir: &Path, bundle: &ResourceBundle) -> std::path::PathBuf {
        let path = dir.join("assets.json");
        fs::write(&path, bundle::bundle_to_json(bundle).unwrap()).unwrap();
        path
    }

    #[test]
    fn test_load_project_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_bundle(dir.path(), &sample_bundle());

        let project = load_project(&path, None).unwrap();
        assert_eq!(project.get_assets(AssetType::Tilemap).len(), 1);
        assert_eq!(project.get_assets(AssetType::Animation).len(), 1);
        assert!(project.lookup_asset_by_name(AssetType::Image, "hero").is_some());
    }

    #[test]
    fn test_collect_source_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("lib")).unwrap();
        fs::write(dir.path().join("main.ts"), "let a = 1").unwrap();
        fs::write(dir.path().join("lib").join("util.py"), "a = 1").unwrap();
        fs::write(dir.path().join("README.md"), "# readme").unwrap();

        let files = collect_source_files(dir.path()).unwrap();
        assert_eq!(files.len(), 2);
        assert!(files.contains_key("main.ts"));
    }

    #[test]
    fn test_unused_assets() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_bundle(dir.path(), &sample_bundle());
        let project = load_project(&path, None).unwrap();

        let mut files = BTreeMap::new();
        files.insert(
            "main.ts".to_string(),
            "scene.setTileMap(tilemap`level1`)\nlet hero = assets.image`hero`".to_string(),
        );

        let unused: Vec<String> = unused_assets(&project, &files)
            .iter()
            .map(|a| a.id().to_string())
            .collect();
        assert_eq!(unused, vec!["myAnimations.anim1".to_string()]);
    }

    #[test]
    fn test_describe_asset_shows_reference() {
        let mut project = AssetProject::new();
        let hero = project.create_new_project_image(Bitmap::new(4, 4), Some("hero"));
        let (tilemap_id, _) = project.create_new_tilemap(Some("level"), 16, Some((2, 2)));
        let tilemap = project.get_tilemap(&tilemap_id).unwrap();

        let line = describe_asset(&Asset::Image(hero.clone()));
        assert_eq!(line, format!("image {} (assets.image`hero`)", hero.id));

        let line = describe_asset(&Asset::Tilemap(tilemap.clone()));
        assert_eq!(line, format!("tilemap {} (tilemap`{}`)", tilemap.id, tilemap.id));
    }

    #[test]
    fn test_invalid_display_names() {
        let mut project = AssetProject::new();
        project.create_new_project_image(Bitmap::new(4, 4), Some("hero"));
        let bad = project.create_new_project_image(Bitmap::new(4, 4), Some("bad`name"));

        let invalid: Vec<String> = invalid_display_names(&project)
            .iter()
            .map(|a| a.id().to_string())
            .collect();
        assert_eq!(invalid, vec![bad.id]);
    }

    #[test]
    fn test_roundtrip_is_lossless() {
        let changed = roundtrip_changes(&sample_bundle(), ProjectConfig::default()).unwrap();
        assert!(changed.is_empty(), "unexpected changes: {:?}", changed);
    }

    #[test]
    fn test_missing_bundle_file() {
        let err = read_bundle(Path::new("/nonexistent/assets.json")).unwrap_err();
        assert_eq!(err.error_code(), "FILE_READ_ERROR");
    }
}
