mod common;
use common::*;
use tempstream_lib::error::ConfigError;

#[test]
fn test_defaults() {
    let config = StreamConfig::default();
    assert_eq!(config.family, SensorFamily::Max30205);
    assert_eq!(config.period(), Duration::from_secs(1));
    assert_eq!(config.poll.interval(), Duration::from_millis(1));
    assert_eq!(config.poll.max_attempts, 100);
}

#[test]
fn test_from_json_partial() {
    let config = StreamConfig::from_json(r#"{ "family": "ad5933", "poll": { "max_attempts": 20 } }"#)
        .expect("Failed to parse config");
    assert_eq!(config.family, SensorFamily::Ad5933);
    assert_eq!(config.period_ms, 1000);
    assert_eq!(config.poll, PollConfig {
        interval_ms: 1,
        max_attempts: 20,
    });
}

#[test]
fn test_from_json_rejects_zero_period() {
    let err = StreamConfig::from_json(r#"{ "period_ms": 0 }"#).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)), "got {err:?}");
}

#[test]
fn test_from_json_rejects_zero_attempts() {
    let err = StreamConfig::from_json(r#"{ "poll": { "max_attempts": 0 } }"#).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)), "got {err:?}");
}

#[test]
fn test_from_json_rejects_unknown_family() {
    let err = StreamConfig::from_json(r#"{ "family": "ds18b20" }"#).unwrap_err();
    assert!(matches!(err, ConfigError::Json(_)), "got {err:?}");
}

#[test]
fn test_serialize_roundtrip() {
    let config = StreamConfig::new(SensorFamily::Ad5933).with_period(Duration::from_millis(250));
    let json = serde_json::to_string(&config).expect("Failed to serialize");
    assert!(json.contains(r#""family":"ad5933""#), "{json}");
    assert_eq!(StreamConfig::from_json(&json).expect("Failed to parse"), config);
}

#[test]
fn test_load_from_file() {
    let path = std::env::temp_dir().join(format!("tempstream-config-{}.json", std::process::id()));
    std::fs::write(&path, r#"{ "period_ms": 2000 }"#).expect("Failed to write config");
    let config = StreamConfig::load(&path);
    let _ = std::fs::remove_file(&path);
    assert_eq!(config.expect("Failed to load").period(), Duration::from_secs(2));

    let err = StreamConfig::load(std::env::temp_dir().join("tempstream-missing.json")).unwrap_err();
    assert!(matches!(err, ConfigError::Io(_)), "got {err:?}");
}

#[tokio::test]
async fn test_spawn_rejects_invalid_config() {
    let (notifier, _rx) = ChannelNotifier::channel();
    let config = StreamConfig::new(SensorFamily::Max30205).with_period(Duration::ZERO);
    let result = Streamer::spawn(SimulatedSensor::new(SensorFamily::Max30205), notifier, &config);
    assert!(matches!(result, Err(ConfigError::Invalid(_))));
}

#[tokio::test(start_paused = true)]
async fn test_custom_period_and_poll_budget() {
    init_tracing();
    let sensor = SimulatedSensor::with_temperature(SensorFamily::Ad5933, 20.0);
    sensor.set_conversion_polls(5);
    let (notifier, mut rx) = ChannelNotifier::channel();
    let config = StreamConfig::new(SensorFamily::Ad5933)
        .with_period(Duration::from_millis(200))
        .with_poll(PollConfig {
            interval_ms: 1,
            max_attempts: 4,
        });
    let streamer = Streamer::spawn(sensor.clone(), notifier, &config).expect("Invalid config");
    connect_and_start(&streamer, &mut rx).await;

    // Conversion needs 5 polls, budget is 4: every cycle times out
    tokio::time::sleep(Duration::from_millis(500)).await;
    assert!(drain(&mut rx).is_empty());
    assert_eq!(sensor.write_count(), 3);

    sensor.set_conversion_polls(2);
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert!(!drain(&mut rx).is_empty());
}
