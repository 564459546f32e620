use std::io::Write;
use std::sync::Mutex;

use tempfile::Builder;

use detection_viewer::config::DetectConfig;

static ENV_LOCK: Mutex<()> = Mutex::new(());

fn clear_env() {
    for key in [
        "DETECT_CONFIG",
        "DETECT_USE_CUSTOM_API",
        "DETECT_API_ENDPOINT",
        "DETECT_MODELS_URL",
        "DETECT_MODEL",
        "GEMINI_API_KEY",
        "API_KEY",
        "DETECT_GEMINI_MODEL",
        "DETECT_TIMEOUT_SECS",
    ] {
        std::env::remove_var(key);
    }
}

#[test]
fn loads_json_config_and_env_overrides() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let mut file = Builder::new().suffix(".json").tempfile().expect("temp config");
    let json = r#"{
        "use_custom_api": true,
        "timeout_secs": 30,
        "custom": {
            "endpoint": "http://detector.local:8000/predict",
            "model": "yolov8n"
        },
        "gemini": {
            "model": "gemini-2.0-flash"
        }
    }"#;
    file.write_all(json.as_bytes()).expect("write config");

    std::env::set_var("DETECT_CONFIG", file.path());
    std::env::set_var("DETECT_MODEL", "rtdetr-l");
    std::env::set_var("DETECT_MODELS_URL", "http://detector.local:9000");
    std::env::set_var("DETECT_TIMEOUT_SECS", "12");

    let cfg = DetectConfig::load().expect("load config");

    assert!(cfg.use_custom_api);
    assert_eq!(
        cfg.custom.endpoint.as_deref(),
        Some("http://detector.local:8000/predict")
    );
    assert_eq!(cfg.custom.model.as_deref(), Some("rtdetr-l"));
    assert_eq!(cfg.gemini.model, "gemini-2.0-flash");
    assert_eq!(cfg.timeout.as_secs(), 12);
    let listing = cfg.models_listing_url().unwrap().unwrap();
    assert_eq!(listing.as_str(), "http://detector.local:9000/api/v2/models");

    clear_env();
}

#[test]
fn loads_toml_config() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let mut file = Builder::new().suffix(".toml").tempfile().expect("temp config");
    let toml = r#"
use_custom_api = false

[gemini]
api_key = "secret"
temperature = 0.2
"#;
    file.write_all(toml.as_bytes()).expect("write config");
    std::env::set_var("DETECT_CONFIG", file.path());

    let cfg = DetectConfig::load().expect("load config");
    assert!(!cfg.use_custom_api);
    assert_eq!(cfg.gemini.api_key.as_deref(), Some("secret"));
    assert_eq!(cfg.gemini.model, "gemini-2.5-flash");
    assert!((cfg.gemini.temperature - 0.2).abs() < f32::EPSILON);
    assert_eq!(cfg.timeout.as_secs(), 60);

    clear_env();
}

#[test]
fn custom_api_flag_is_case_insensitive_and_requires_endpoint() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    std::env::set_var("DETECT_USE_CUSTOM_API", "TRUE");
    let err = DetectConfig::load().unwrap_err();
    assert!(err.to_string().contains("API endpoint is not configured"));

    std::env::set_var("DETECT_API_ENDPOINT", "http://127.0.0.1:8000/predict");
    let cfg = DetectConfig::load().expect("load config");
    assert!(cfg.use_custom_api);

    clear_env();
}

#[test]
fn remote_model_requires_api_key() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    std::env::set_var("DETECT_USE_CUSTOM_API", "yes");
    let err = DetectConfig::load().unwrap_err();
    assert!(err.to_string().contains("API key is missing"));

    std::env::set_var("API_KEY", "fallback-key");
    let cfg = DetectConfig::load().expect("load config");
    assert!(!cfg.use_custom_api);
    assert_eq!(cfg.gemini.api_key.as_deref(), Some("fallback-key"));

    clear_env();
}

#[test]
fn rejects_bad_timeout() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    std::env::set_var("GEMINI_API_KEY", "k");
    std::env::set_var("DETECT_TIMEOUT_SECS", "soon");
    assert!(DetectConfig::load().is_err());
    std::env::set_var("DETECT_TIMEOUT_SECS", "0");
    assert!(DetectConfig::load().is_err());

    clear_env();
}
