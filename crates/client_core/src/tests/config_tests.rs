use std::{
    collections::HashMap,
    env, fs,
    time::{SystemTime, UNIX_EPOCH},
};

use super::*;

fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key| map.get(key).cloned()
}

#[test]
fn defaults_match_reference_gesture_constants() {
    let settings = ClientSettings::default();
    assert_eq!(
        settings.commit_policy(),
        CommitPolicy::Distance { threshold: 75.0 }
    );
    assert_eq!(settings.controller_settings().rotation_divisor, 20.0);
    assert_eq!(settings.max_in_flight_decisions, 4);
}

#[test]
fn partial_toml_keeps_remaining_defaults() {
    let settings = parse_settings(
        r#"
api_url = "https://jobs.example.com/api"
commit_mode = "swipe_power"
swipe_confidence = 5000.0
"#,
    )
    .expect("parse");
    assert_eq!(settings.api_url, "https://jobs.example.com/api");
    assert_eq!(
        settings.commit_policy(),
        CommitPolicy::SwipePower { confidence: 5000.0 }
    );
    assert_eq!(settings.feedback_ms, 450);
}

#[test]
fn env_overrides_win_and_bad_numbers_are_ignored() {
    let mut settings = ClientSettings::default();
    apply_env_overrides(
        &mut settings,
        lookup_from(&[
            ("JOBFEED_API_URL", "https://ignored.example.com"),
            ("APP__API_URL", "https://jobs.example.com"),
            ("APP__TOKEN", "secret"),
            ("APP__COMMIT_MODE", "swipe-power"),
            ("APP__MAX_IN_FLIGHT", "not-a-number"),
            ("APP__FEEDBACK_MS", "500"),
        ]),
    );
    assert_eq!(settings.api_url, "https://jobs.example.com");
    assert_eq!(settings.token.as_deref(), Some("secret"));
    assert_eq!(settings.commit_mode, CommitMode::SwipePower);
    assert_eq!(settings.max_in_flight_decisions, 4);
    assert_eq!(settings.feedback_ms, 500);
}

#[test]
fn load_settings_reads_file_and_rejects_invalid_values() {
    let suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    let temp_root = env::temp_dir().join(format!("jobfeed_config_test_{suffix}"));
    fs::create_dir_all(&temp_root).expect("temp root");

    let good = temp_root.join("feed.toml");
    fs::write(&good, "commit_threshold_px = 90.0\n").expect("write");
    let settings = load_settings(Some(&good)).expect("load");
    assert_eq!(settings.commit_threshold_px, 90.0);

    let bad = temp_root.join("bad.toml");
    fs::write(&bad, "max_in_flight_decisions = 0\n").expect("write");
    let err = load_settings(Some(&bad)).expect_err("zero in-flight cap");
    assert!(err.to_string().contains("max_in_flight_decisions"));

    for (name, raw, field) in [
        ("negative_threshold.toml", "commit_threshold_px = -5.0\n", "commit_threshold_px"),
        ("nan_threshold.toml", "commit_threshold_px = nan\n", "commit_threshold_px"),
        ("negative_confidence.toml", "swipe_confidence = -1.0\n", "swipe_confidence"),
        ("infinite_confidence.toml", "swipe_confidence = inf\n", "swipe_confidence"),
    ] {
        let path = temp_root.join(name);
        fs::write(&path, raw).expect("write");
        let err = load_settings(Some(&path)).expect_err(name);
        assert!(err.to_string().contains(field), "{name}: {err}");
    }

    let missing = temp_root.join("missing.toml");
    assert!(load_settings(Some(&missing)).is_ok());

    fs::remove_dir_all(temp_root).expect("cleanup");
}
