use super::*;

const REQUIRED: [(&str, Option<&str>); 2] = [
    ("CAMPUS__DATABASE__URL", Some("postgres://localhost/campus_test")),
    ("CAMPUS__JWT__SECRET", Some("test-secret")),
];

#[test]
fn test_load_applies_defaults() {
    temp_env::with_vars(REQUIRED, || {
        let config = AppConfig::load().expect("config should load");

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.database.url, "postgres://localhost/campus_test");
        assert_eq!(config.database.max_connections, 10);
        assert_eq!(config.jwt.access_token_expiry_secs, 3600);
        assert_eq!(config.jwt.refresh_token_expiry_secs, 2_592_000);
        assert!(config.storage.is_none());
        assert!(config.auth.admin_emails.is_empty());
    });
}

#[test]
fn test_load_reads_storage_section() {
    let mut vars = REQUIRED.to_vec();
    vars.push(("CAMPUS__STORAGE__PROVIDER", Some("local_fs")));
    vars.push(("CAMPUS__STORAGE__ROOT", Some("/tmp/campus")));
    vars.push(("CAMPUS__STORAGE__MAX_FILE_SIZE_MB", Some("25")));

    temp_env::with_vars(vars, || {
        let config = AppConfig::load().expect("config should load");
        let storage = config.storage.expect("storage section present");

        assert_eq!(storage.provider, "local_fs");
        assert_eq!(storage.root.as_deref(), Some("/tmp/campus"));
        assert_eq!(storage.max_file_size_mb, 25);
        assert!(storage.bucket.is_none());
    });
}

#[test]
fn test_load_parses_admin_email_list() {
    let mut vars = REQUIRED.to_vec();
    vars.push((
        "CAMPUS__AUTH__ADMIN_EMAILS",
        Some("root@campus.test,dean@campus.test"),
    ));

    temp_env::with_vars(vars, || {
        let config = AppConfig::load().expect("config should load");
        assert_eq!(
            config.auth.admin_emails,
            vec!["root@campus.test".to_string(), "dean@campus.test".to_string()]
        );
    });
}

#[test]
fn test_load_fails_without_database_url() {
    temp_env::with_vars(
        [
            ("CAMPUS__DATABASE__URL", None),
            ("CAMPUS__JWT__SECRET", Some("test-secret")),
        ],
        || {
            assert!(AppConfig::load().is_err());
        },
    );
}

#[test]
fn test_is_admin_email() {
    let auth = AuthConfig {
        admin_emails: vec!["Root@Campus.test".to_string()],
    };

    assert!(auth.is_admin_email("root@campus.test"));
    assert!(auth.is_admin_email("  root@campus.test "));
    assert!(!auth.is_admin_email("student@campus.test"));
    assert!(!AuthConfig::default().is_admin_email("root@campus.test"));
}
