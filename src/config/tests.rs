use super::*;
use serial_test::serial;
use std::env;
use std::net::IpAddr;
use std::path::PathBuf;

fn with_env_vars<F, R>(vars: &[(&str, &str)], f: F) -> R
where
    F: FnOnce() -> R,
{
    // SAFETY: Test code only, we accept the thread-safety risk in tests.
    for (key, value) in vars {
        unsafe { env::set_var(key, value) };
    }

    let result = f();

    // SAFETY: Test code only, we accept the thread-safety risk in tests.
    for (key, _) in vars {
        unsafe { env::remove_var(key) };
    }

    result
}

fn clear_marksure_env() {
    // SAFETY: Test code only, we accept the thread-safety risk in tests.
    unsafe {
        env::remove_var("MARKSURE_PORT");
        env::remove_var("MARKSURE_BIND_ADDR");
        env::remove_var("MARKSURE_STORAGE_PATH");
        env::remove_var("MARKSURE_AI_SERVICE_URL");
        env::remove_var("MARKSURE_AI_TIMEOUT_SECS");
        env::remove_var("MARKSURE_MAX_UPLOAD_BYTES");
        env::remove_var("MARKSURE_MOCK_OCR");
    }
}

#[test]
fn test_default_config() {
    let config = Config::default();

    assert_eq!(config.port, 5000);
    assert_eq!(
        config.bind_addr,
        IpAddr::V4(std::net::Ipv4Addr::new(127, 0, 0, 1))
    );
    assert_eq!(config.storage_path, PathBuf::from("./.data"));
    assert_eq!(config.ai_service_url, "http://localhost:8000");
    assert_eq!(config.ai_timeout, Duration::from_secs(30));
    assert_eq!(config.max_upload_bytes, 10 * 1024 * 1024);
    assert!(!config.mock_ocr);
}

#[test]
fn test_socket_addr() {
    let config = Config::default();
    assert_eq!(config.socket_addr(), "127.0.0.1:5000");

    let config = Config {
        port: 3000,
        bind_addr: IpAddr::V4(std::net::Ipv4Addr::new(0, 0, 0, 0)),
        ..Default::default()
    };
    assert_eq!(config.socket_addr(), "0.0.0.0:3000");
}

#[test]
fn test_derived_paths() {
    let config = Config {
        storage_path: PathBuf::from("/var/lib/marksure"),
        ..Default::default()
    };

    assert_eq!(config.uploads_dir(), PathBuf::from("/var/lib/marksure/uploads"));
    assert_eq!(
        config.snapshot_path(),
        PathBuf::from("/var/lib/marksure/snapshot.json")
    );
}

#[test]
#[serial]
fn test_from_env_with_defaults() {
    clear_marksure_env();

    let config = Config::from_env().expect("should parse with defaults");

    assert_eq!(config.port, 5000);
    assert_eq!(config.ai_service_url, DEFAULT_AI_SERVICE_URL);
    assert!(!config.mock_ocr);
}

#[test]
#[serial]
fn test_from_env_custom_port() {
    clear_marksure_env();

    with_env_vars(&[("MARKSURE_PORT", "3000")], || {
        let config = Config::from_env().expect("should parse");
        assert_eq!(config.port, 3000);
    });
}

#[test]
#[serial]
fn test_from_env_ipv6_bind_addr() {
    clear_marksure_env();

    with_env_vars(&[("MARKSURE_BIND_ADDR", "::1")], || {
        let config = Config::from_env().expect("should parse");
        assert_eq!(
            config.bind_addr,
            IpAddr::V6(std::net::Ipv6Addr::new(0, 0, 0, 0, 0, 0, 0, 1))
        );
    });
}

#[test]
#[serial]
fn test_invalid_port_zero() {
    clear_marksure_env();

    with_env_vars(&[("MARKSURE_PORT", "0")], || {
        let err = Config::from_env().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPort { .. }));
        assert!(err.to_string().contains("invalid port"));
    });
}

#[test]
#[serial]
fn test_invalid_port_not_number() {
    clear_marksure_env();

    with_env_vars(&[("MARKSURE_PORT", "not_a_port")], || {
        let err = Config::from_env().unwrap_err();
        assert!(matches!(err, ConfigError::PortParseError { .. }));
    });
}

#[test]
#[serial]
fn test_invalid_bind_addr() {
    clear_marksure_env();

    with_env_vars(&[("MARKSURE_BIND_ADDR", "not.an.ip.address")], || {
        let err = Config::from_env().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidBindAddr { .. }));
        assert!(err.to_string().contains("failed to parse bind address"));
    });
}

#[test]
#[serial]
fn test_service_url_trailing_slash_is_trimmed() {
    clear_marksure_env();

    with_env_vars(&[("MARKSURE_AI_SERVICE_URL", "http://ocr.lab:9000/")], || {
        let config = Config::from_env().expect("should parse");
        assert_eq!(config.ai_service_url, "http://ocr.lab:9000");
    });
}

#[test]
#[serial]
fn test_invalid_numbers_fall_back_to_defaults() {
    clear_marksure_env();

    with_env_vars(
        &[
            ("MARKSURE_AI_TIMEOUT_SECS", "soon"),
            ("MARKSURE_MAX_UPLOAD_BYTES", "-1"),
        ],
        || {
            let config = Config::from_env().expect("should parse with fallback");
            assert_eq!(config.ai_timeout, Duration::from_secs(30));
            assert_eq!(config.max_upload_bytes, 10 * 1024 * 1024);
        },
    );
}

#[test]
#[serial]
fn test_mock_ocr_flag() {
    clear_marksure_env();

    for (value, expected) in [("1", true), ("true", true), ("0", false), ("false", false), ("", false)] {
        with_env_vars(&[("MARKSURE_MOCK_OCR", value)], || {
            let config = Config::from_env().expect("should parse");
            assert_eq!(config.mock_ocr, expected, "MARKSURE_MOCK_OCR={value:?}");
        });
    }
}

#[test]
#[serial]
fn test_full_config_parse() {
    clear_marksure_env();

    with_env_vars(
        &[
            ("MARKSURE_PORT", "8080"),
            ("MARKSURE_BIND_ADDR", "0.0.0.0"),
            ("MARKSURE_STORAGE_PATH", "/srv/marksure"),
            ("MARKSURE_AI_SERVICE_URL", "https://ocr.internal"),
            ("MARKSURE_AI_TIMEOUT_SECS", "5"),
            ("MARKSURE_MAX_UPLOAD_BYTES", "2048"),
        ],
        || {
            let config = Config::from_env().expect("should parse full config");

            assert_eq!(config.socket_addr(), "0.0.0.0:8080");
            assert_eq!(config.storage_path, PathBuf::from("/srv/marksure"));
            assert_eq!(config.ai_service_url, "https://ocr.internal");
            assert_eq!(config.ai_timeout, Duration::from_secs(5));
            assert_eq!(config.max_upload_bytes, 2048);
            assert!(config.validate().is_ok());
        },
    );
}

#[test]
fn test_validate_storage_path_is_file() {
    let config = Config {
        storage_path: PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("Cargo.toml"),
        ..Default::default()
    };

    let err = config.validate().unwrap_err();
    assert!(matches!(err, ConfigError::NotADirectory { .. }));
}

#[test]
fn test_validate_rejects_non_http_url() {
    let config = Config {
        ai_service_url: "ftp://ocr".to_string(),
        ..Default::default()
    };

    let err = config.validate().unwrap_err();
    assert!(matches!(err, ConfigError::InvalidServiceUrl { .. }));
}

#[test]
fn test_validate_ignores_url_in_mock_mode() {
    let config = Config {
        ai_service_url: "not a url".to_string(),
        mock_ocr: true,
        ..Default::default()
    };

    assert!(config.validate().is_ok());
}

#[test]
fn test_validate_rejects_zero_limits() {
    let config = Config {
        ai_timeout: Duration::ZERO,
        ..Default::default()
    };
    assert!(matches!(
        config.validate().unwrap_err(),
        ConfigError::ZeroValue {
            name: "MARKSURE_AI_TIMEOUT_SECS"
        }
    ));

    let config = Config {
        max_upload_bytes: 0,
        ..Default::default()
    };
    assert!(matches!(
        config.validate().unwrap_err(),
        ConfigError::ZeroValue {
            name: "MARKSURE_MAX_UPLOAD_BYTES"
        }
    ));
}

#[test]
fn test_validate_success_with_defaults() {
    assert!(Config::default().validate().is_ok());
}
