//! Integration test against the live OpenWeather API.
//!
//! These tests require OPENWEATHER_API_KEY to be set.
//!
//! Run with: cargo test --features integ_test --test live_fetch

#[cfg(feature = "integ_test")]
mod tests {
    use std::time::Duration;

    use airbot::air::openweather::{Client, DEFAULT_BASE_URL, Location, ReadingSource};
    use airbot::air::{classify, psi_from_pm25};

    fn api_key() -> Option<String> {
        std::env::var("OPENWEATHER_API_KEY").ok().filter(|k| !k.is_empty())
    }

    #[tokio::test]
    async fn test_fetch_jakarta() {
        let Some(key) = api_key() else {
            eprintln!("Skipping test: OPENWEATHER_API_KEY not set");
            return;
        };

        let client = Client::new(
            key,
            DEFAULT_BASE_URL.to_string(),
            Location::default(),
            Duration::from_secs(30),
        )
        .expect("Failed to build client");

        let reading = client.fetch_current().await.expect("fetch failed");
        let index = psi_from_pm25(reading.pm25());
        assert!(index <= 500);
        assert!((1..=5).contains(&reading.aqi().0));
        println!("PM2.5 {} -> PSI {} ({})", reading.pm25(), index, classify(index).label);
    }

    #[tokio::test]
    async fn test_bad_key_is_fetch_error() {
        let client = Client::new(
            "definitely-not-a-key".to_string(),
            DEFAULT_BASE_URL.to_string(),
            Location::default(),
            Duration::from_secs(30),
        )
        .expect("Failed to build client");

        let err = client.fetch_current().await.unwrap_err();
        assert!(err.to_string().contains("failed to fetch air quality data"));
    }
}
