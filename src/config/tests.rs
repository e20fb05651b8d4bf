use super::*;
use figment::Jail;

fn load(jail: &Jail, config_file: Option<&str>, overrides: &SettingsOverrides) -> figment::error::Result<ScanSettings> {
    let path = config_file.map(|name| jail.directory().join(name));
    ScanSettings::load(path.as_deref(), overrides).map_err(|e| figment::Error::from(format!("{:#}", e)))
}

#[test]
fn test_defaults() {
    Jail::expect_with(|jail| {
        let settings = load(jail, None, &SettingsOverrides::default())?;
        assert_eq!(settings, ScanSettings::default());

        let config = settings.resolve().unwrap();
        assert_eq!(config.max_workers, 8);
        assert_eq!(config.max_file_size, 10 * 1024 * 1024);
        assert_eq!(config.drain, DrainPolicy::Tracked);
        Ok(())
    });
}

#[test]
fn test_config_file_layer() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "filesift.cfg",
            "# scan settings\nthreads=3\nmaxSize=2MB\nthreads=9\nunknown=value\n",
        )?;

        let settings = load(jail, Some("filesift.cfg"), &SettingsOverrides::default())?;
        assert_eq!(settings.workers, 3);
        assert_eq!(settings.max_size, "2MB");
        Ok(())
    });
}

#[test]
fn test_env_overrides_file_and_cli_overrides_env() {
    Jail::expect_with(|jail| {
        jail.create_file("filesift.cfg", "threads=3\n")?;
        jail.set_env("FILESIFT_WORKERS", "5");
        jail.set_env("FILESIFT_MAX_SIZE", "1GB");

        let settings = load(jail, Some("filesift.cfg"), &SettingsOverrides::default())?;
        assert_eq!(settings.workers, 5);
        assert_eq!(settings.max_size, "1GB");

        let cli = SettingsOverrides {
            workers: Some(2),
            ..Default::default()
        };
        let settings = load(jail, Some("filesift.cfg"), &cli)?;
        assert_eq!(settings.workers, 2);
        assert_eq!(settings.max_size, "1GB");
        Ok(())
    });
}

#[test]
fn test_malformed_config_file_is_fatal() {
    Jail::expect_with(|jail| {
        jail.create_file("bad.cfg", "threads\n")?;
        assert!(load(jail, Some("bad.cfg"), &SettingsOverrides::default()).is_err());

        jail.create_file("bad-size.cfg", "maxSize=10\n")?;
        assert!(load(jail, Some("bad-size.cfg"), &SettingsOverrides::default()).is_err());

        assert!(load(jail, Some("missing.cfg"), &SettingsOverrides::default()).is_err());
        Ok(())
    });
}

#[test]
fn test_parse_first_occurrence_wins() {
    let overrides = file::parse("maxSize=1K\nmaxSize=2K\n").unwrap();
    assert_eq!(overrides.max_size.as_deref(), Some("1K"));
    assert_eq!(overrides.workers, None);
}

#[test]
fn test_parse_rejects_extra_equals() {
    let err = file::parse("# ok\n\nthreads=1=2\n").unwrap_err();
    assert!(err.to_string().contains("line 3"));

    assert!(file::parse("threads=0\n").is_err());
}

#[test]
fn test_resolve_timeout_drain() {
    let settings = ScanSettings {
        drain: DrainMode::Timeout,
        wait: 2,
        ..Default::default()
    };
    assert_eq!(settings.resolve().unwrap().drain, DrainPolicy::Timeout { seconds: 2 });

    let settings = ScanSettings {
        drain: DrainMode::Timeout,
        wait: 0,
        ..Default::default()
    };
    assert!(settings.resolve().is_err());
}

#[test]
fn test_resolve_auto_workers_and_bad_size() {
    let settings = ScanSettings {
        workers: 0,
        ..Default::default()
    };
    assert!(settings.resolve().unwrap().max_workers >= 1);

    let settings = ScanSettings {
        max_size: "-5MB".to_string(),
        ..Default::default()
    };
    assert!(settings.resolve().is_err());
}
