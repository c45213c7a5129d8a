//! Packaging -> environment -> resolution, as a deployment goes through it.

use monokel::mount::{Direction, MountEntry, PathExtractor, PathResolver, derive_entries};
use monokel::{ManifestEmitter, MonokelError};

const SETTINGS: &str = r#"
[logging]
default = "warn"

[[watchers]]
paths = [ "/temp",
          '/foo' ]
recursive = true
handler = "log"
"#;

/// Turn the rendered environment block back into variables, as compose does
/// (`$$` is compose's escape for a literal `$`).
fn environment_from_manifest(manifest: &str) -> Vec<(String, String)> {
    manifest
        .lines()
        .skip_while(|line| line.trim() != "environment:")
        .skip(1)
        .map_while(|line| line.trim().strip_prefix("- "))
        .filter_map(|item| item.split_once('='))
        .map(|(k, v)| (k.to_string(), v.replace("$$", "$")))
        .collect()
}

fn build() -> (Vec<MountEntry>, String) {
    let paths = PathExtractor::new()
        .extract("settings.toml", SETTINGS)
        .unwrap();
    let entries = derive_entries(&paths).unwrap();
    let manifest = ManifestEmitter::default()
        .render(&entries, "monokel", "3.0")
        .unwrap();
    (entries, manifest)
}

#[test]
fn test_manifest_environment_rebuilds_the_mount_table() {
    let (entries, manifest) = build();
    assert_eq!(entries.len(), 2);

    let vars = environment_from_manifest(&manifest);
    let mount_vars: Vec<_> = vars.iter().filter(|(k, _)| k.starts_with("MOUNT_")).collect();
    assert_eq!(mount_vars.len(), 2);
    assert!(vars.contains(&("CONTAINER".to_string(), "1".to_string())));

    let resolver = PathResolver::from_vars(vars).unwrap();
    assert!(resolver.in_container());
    assert_eq!(resolver.table().len(), 2);

    for entry in &entries {
        assert_eq!(
            resolver.table().container_path(&entry.host_path),
            Some(entry.container_path().as_str())
        );
    }
}

#[test]
fn test_resolution_inside_the_container() {
    let (entries, manifest) = build();
    let resolver = PathResolver::from_vars(environment_from_manifest(&manifest)).unwrap();
    let temp = entries.iter().find(|e| e.host_path == "/temp").unwrap();

    assert_eq!(resolver.to_container("/temp").unwrap(), temp.container_path());
    assert_eq!(
        resolver.to_container("/temp/notes.txt").unwrap(),
        format!("{}/notes.txt", temp.container_path())
    );

    for entry in &entries {
        let inside = resolver
            .resolve(&entry.host_path, Direction::HostToContainer)
            .unwrap();
        let back = resolver.resolve(&inside, Direction::ContainerToHost).unwrap();
        assert_eq!(back, entry.host_path);
    }

    let err = resolver.to_container("/unmapped/path").unwrap_err();
    assert!(matches!(err, MonokelError::UnresolvedPath { .. }));
    assert!(err.to_string().contains("/unmapped/path"));
}

#[test]
fn test_same_manifest_on_the_host_is_identity() {
    let (_, manifest) = build();
    let vars: Vec<_> = environment_from_manifest(&manifest)
        .into_iter()
        .filter(|(k, _)| k != "CONTAINER")
        .collect();
    let resolver = PathResolver::from_vars(vars).unwrap();

    assert!(!resolver.in_container());
    assert_eq!(resolver.to_container("/unmapped/path").unwrap(), "/unmapped/path");
    assert_eq!(resolver.to_container("/temp").unwrap(), "/temp");
}

#[test]
fn test_dollar_and_escaped_paths_match_the_runtime_settings() {
    let settings = r#"
# paths = ["/legacy"]
[[watchers]]
paths = ["/data/$cache", "/data/caf\u00e9"]
"#;
    let paths = PathExtractor::new().extract("settings.toml", settings).unwrap();
    let entries = derive_entries(&paths).unwrap();
    let manifest = ManifestEmitter::default()
        .render(&entries, "monokel", "3.0")
        .unwrap();
    let resolver = PathResolver::from_vars(environment_from_manifest(&manifest)).unwrap();

    // What the runtime sees after loading the same file
    let loaded: toml::Table = toml::from_str(settings).unwrap();
    let declared = loaded["watchers"][0]["paths"].as_array().unwrap();
    assert_eq!(declared.len(), 2);
    assert_eq!(resolver.table().len(), 2);

    for path in declared {
        let path = path.as_str().unwrap();
        let inside = resolver.to_container(path).unwrap();
        assert_eq!(resolver.to_host(&inside).unwrap(), path);
    }
}
