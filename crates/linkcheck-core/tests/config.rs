use linkcheck_core::config::{dirs_path, GlobalConfig};

#[test]
fn test_global_config_default_max_parsers_nonzero() {
    let config = GlobalConfig::default();
    assert!(config.limits.max_parsers > 0, "max_parsers should be > 0");
}

#[test]
fn test_global_config_default_cache_dir() {
    let config = GlobalConfig::default();
    assert_eq!(config.cache.dir, "~/.linkcheck/cache");
}

#[test]
fn test_global_config_default_from_empty_toml() {
    let config: GlobalConfig = toml::from_str("").unwrap();
    assert!(config.limits.max_parsers > 0);
    assert!(config.limits.max_open_archives > 0);
}

#[test]
fn test_global_config_default_empty_repos() {
    let config = GlobalConfig::default();
    assert!(config.repositories.is_empty());
}

#[test]
fn test_dirs_path_ends_with_linkcheck() {
    let path = dirs_path();
    assert!(path.ends_with(".linkcheck"));
}

#[test]
fn test_global_config_parse_from_toml() {
    let toml = r#"
[limits]
max-parsers = 4
max-open-archives = 16

[cache]
dir = "/custom/cache"
max-size = "5GB"
"#;
    let config: GlobalConfig = toml::from_str(toml).unwrap();
    assert_eq!(config.limits.max_parsers, 4);
    assert_eq!(config.limits.max_open_archives, 16);
    assert_eq!(config.cache.dir, "/custom/cache");
    assert_eq!(config.cache.max_size.as_deref(), Some("5GB"));
}
