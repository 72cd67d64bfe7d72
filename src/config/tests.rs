use super::*;
use figment::Jail;

fn argv(parts: &[&str]) -> CommandTemplate {
    CommandTemplate::Argv(parts.iter().map(|s| s.to_string()).collect())
}

fn with_command(settings: Settings) -> Settings {
    Settings {
        command: Some(argv(&["echo", "{}"])),
        ..settings
    }
}

#[test]
fn test_config_loads_defaults() {
    Jail::expect_with(|_jail| {
        let settings = Settings::load(None, &Overrides::default()).expect("defaults should load");
        assert_eq!(settings, Settings::default());
        Ok(())
    });
}

#[test]
fn test_repo_config_file_is_picked_up() {
    Jail::expect_with(|jail| {
        jail.create_file(
            REPO_CONFIG_FILE,
            r#"
                workers = 3
                command = "echo {}"
                pass_std = true
            "#,
        )?;

        let config = Settings::load(None, &Overrides::default())
            .unwrap()
            .validate()
            .unwrap();
        assert_eq!(config.workers.get(), 3);
        assert_eq!(config.template.args(), ["echo", "{}"]);
        assert_eq!(config.mode, OutputMode::PassThrough);
        Ok(())
    });
}

#[test]
fn test_explicit_yaml_config() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "custom.yml",
            "command:\n  - printf\n  - '%s\\n'\n  - '{}'\nreplace: '{}'\n",
        )?;

        let settings = Settings::load(Some(Path::new("custom.yml")), &Overrides::default()).unwrap();
        assert_eq!(settings.command, Some(argv(&["printf", "%s\\n", "{}"])));
        Ok(())
    });
}

#[test]
fn test_missing_explicit_config_is_an_error() {
    Jail::expect_with(|_jail| {
        let error = Settings::load(Some(Path::new("nope.toml")), &Overrides::default()).unwrap_err();
        assert_eq!(
            error.downcast_ref::<ConfigError>(),
            Some(&ConfigError::MissingFile("nope.toml".into()))
        );
        Ok(())
    });
}

#[test]
fn test_env_overrides_file_and_cli_overrides_env() {
    Jail::expect_with(|jail| {
        jail.create_file(REPO_CONFIG_FILE, "workers = 2\ncommand = \"true\"")?;
        jail.set_env("PARDO_WORKERS", "5");
        jail.set_env("PARDO_TO_STDERR", "true");

        let settings = Settings::load(None, &Overrides::default()).unwrap();
        assert_eq!(settings.workers, Some(5));
        assert!(settings.to_stderr);

        let overrides = Overrides {
            workers: Some(7),
            log: true,
            ..Overrides::default()
        };
        let config = Settings::load(None, &overrides).unwrap().validate().unwrap();
        assert_eq!(config.workers.get(), 7);
        assert_eq!(config.mode, OutputMode::DiagnosticLog);
        Ok(())
    });
}

#[test]
fn test_replace_env_is_taken_verbatim() {
    Jail::expect_with(|jail| {
        jail.set_env(REPLACE_ENV, "{}");
        let settings = Settings::load(None, &Overrides::default()).unwrap();
        assert_eq!(settings.replace, "{}");

        jail.set_env(REPLACE_ENV, "%%");
        let config = with_command(Settings::load(None, &Overrides::default()).unwrap())
            .validate()
            .unwrap();
        assert_eq!(config.placeholder, "%%");

        let overrides = Overrides {
            replace: Some("@".into()),
            ..Overrides::default()
        };
        assert_eq!(Settings::load(None, &overrides).unwrap().replace, "@");
        Ok(())
    });
}

#[test]
fn test_unbalanced_quotes_in_config_command() {
    Jail::expect_with(|jail| {
        jail.create_file(REPO_CONFIG_FILE, "command = \"sh -c 'echo {}\"")?;

        let settings = Settings::load(None, &Overrides::default()).unwrap();
        assert_eq!(
            settings.validate(),
            Err(ConfigError::UnbalancedQuotes("sh -c 'echo {}".into()))
        );
        Ok(())
    });
}

#[test]
fn test_unset_cli_flags_keep_config_values() {
    Jail::expect_with(|jail| {
        jail.create_file(REPO_CONFIG_FILE, "echo = true\ncommand = \"true\"")?;

        let config = Settings::load(None, &Overrides::default())
            .unwrap()
            .validate()
            .unwrap();
        assert!(config.echo_input);
        assert_eq!(config.mode, OutputMode::EchoOnly);
        Ok(())
    });
}

#[test]
fn test_zero_and_negative_workers_are_rejected() {
    for workers in [0, -1, -32] {
        let settings = with_command(Settings {
            workers: Some(workers),
            ..Settings::default()
        });
        assert_eq!(settings.validate(), Err(ConfigError::InvalidWorkers(workers)));
    }
}

#[test]
fn test_too_many_workers_are_rejected() {
    for workers in [MAX_WORKERS as i64 + 1, 99_999_999_999_999, i64::MAX] {
        let settings = with_command(Settings {
            workers: Some(workers),
            ..Settings::default()
        });
        assert_eq!(settings.validate(), Err(ConfigError::TooManyWorkers(workers)));
    }

    let config = with_command(Settings {
        workers: Some(MAX_WORKERS as i64),
        ..Settings::default()
    })
    .validate()
    .unwrap();
    assert_eq!(config.workers.get(), MAX_WORKERS);
}

#[test]
fn test_channel_capacity_is_capped() {
    let config = with_command(Settings {
        workers: Some(MAX_WORKERS as i64),
        channel_buffer_multiplier: usize::MAX,
        ..Settings::default()
    })
    .validate()
    .unwrap();
    assert_eq!(config.channel_capacity(), MAX_CHANNEL_CAPACITY);

    let config = with_command(Settings {
        workers: Some(4),
        channel_buffer_multiplier: 0,
        ..Settings::default()
    })
    .validate()
    .unwrap();
    assert_eq!(config.channel_capacity(), 0);
}

#[test]
fn test_default_workers_used_when_unset() {
    let config = with_command(Settings::default()).validate().unwrap();
    assert_eq!(config.workers.get(), default_workers());
    assert_eq!(config.mode, OutputMode::Silent);
    assert_eq!(config.placeholder, "{}");
    assert_eq!(config.channel_capacity(), default_workers() * 2);
}

#[test]
fn test_missing_or_empty_command_is_rejected() {
    assert_eq!(Settings::default().validate(), Err(ConfigError::MissingCommand));

    let settings = Settings {
        command: Some(CommandTemplate::Line("   ".into())),
        ..Settings::default()
    };
    assert_eq!(settings.validate(), Err(ConfigError::MissingCommand));
}

#[test]
fn test_empty_placeholder_is_rejected() {
    let settings = with_command(Settings {
        replace: String::new(),
        ..Settings::default()
    });
    assert_eq!(settings.validate(), Err(ConfigError::EmptyPlaceholder));
}
