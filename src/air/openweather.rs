//! OpenWeather Air Pollution API client.

use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{debug, info};

use crate::air::pollutant::{Concentration, PollutantKind};

pub const DEFAULT_BASE_URL: &str = "http://api.openweathermap.org";

/// The fixed point readings are fetched for.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Location {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
}

impl Default for Location {
    fn default() -> Self {
        Self {
            name: "Jakarta".to_string(),
            lat: -6.2088,
            lon: 106.8456,
        }
    }
}

/// Any failure producing a reading: network, HTTP status or payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchError(pub String);

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to fetch air quality data: {}", self.0)
    }
}

impl std::error::Error for FetchError {}

/// OpenWeather's own 1-5 index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OwmAqi(pub u8);

impl OwmAqi {
    pub fn description(&self) -> &'static str {
        match self.0 {
            1 => "Good 😊",
            2 => "Fair 😐",
            3 => "Moderate 😷",
            4 => "Poor 😰",
            5 => "Very Poor 💀",
            _ => "Unknown",
        }
    }
}

/// One snapshot of pollutant concentrations for the configured location.
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    aqi: OwmAqi,
    measured_at: DateTime<Utc>,
    pm25: Concentration,
    concentrations: BTreeMap<PollutantKind, Concentration>,
}

impl Reading {
    /// Build a reading. PM2.5 must be present since the index is derived from it.
    pub fn new<I>(aqi: OwmAqi, measured_at: DateTime<Utc>, concentrations: I) -> Result<Self, FetchError>
    where
        I: IntoIterator<Item = (PollutantKind, Concentration)>,
    {
        let concentrations: BTreeMap<_, _> = concentrations.into_iter().collect();
        let pm25 = *concentrations
            .get(&PollutantKind::Pm25)
            .ok_or_else(|| FetchError("reading has no PM2.5 value".to_string()))?;
        Ok(Self { aqi, measured_at, pm25, concentrations })
    }

    pub fn aqi(&self) -> OwmAqi {
        self.aqi
    }

    pub fn measured_at(&self) -> DateTime<Utc> {
        self.measured_at
    }

    pub fn pm25(&self) -> Concentration {
        self.pm25
    }

    pub fn get(&self, kind: PollutantKind) -> Option<Concentration> {
        self.concentrations.get(&kind).copied()
    }
}

/// Anything that can supply the current reading.
pub trait ReadingSource: Send + Sync {
    fn fetch_current(&self) -> impl Future<Output = Result<Reading, FetchError>> + Send;
}

#[derive(Deserialize)]
struct ApiResponse {
    list: Vec<ApiEntry>,
}

#[derive(Deserialize)]
struct ApiEntry {
    dt: i64,
    main: ApiMain,
    components: ApiComponents,
}

#[derive(Deserialize)]
struct ApiMain {
    aqi: u8,
}

#[derive(Deserialize)]
struct ApiComponents {
    co: Option<f64>,
    no: Option<f64>,
    no2: Option<f64>,
    o3: Option<f64>,
    so2: Option<f64>,
    pm2_5: Option<f64>,
    pm10: Option<f64>,
    nh3: Option<f64>,
}

impl ApiComponents {
    fn values(&self) -> [(PollutantKind, Option<f64>); 8] {
        [
            (PollutantKind::Pm25, self.pm2_5),
            (PollutantKind::Pm10, self.pm10),
            (PollutantKind::No2, self.no2),
            (PollutantKind::O3, self.o3),
            (PollutantKind::Co, self.co),
            (PollutantKind::No, self.no),
            (PollutantKind::So2, self.so2),
            (PollutantKind::Nh3, self.nh3),
        ]
    }
}

/// Parse an air pollution response body into a reading.
pub fn parse_response(body: &str) -> Result<Reading, FetchError> {
    let parsed: ApiResponse =
        serde_json::from_str(body).map_err(|e| FetchError(format!("Parse error: {e}")))?;

    let entry = parsed
        .list
        .into_iter()
        .next()
        .ok_or_else(|| FetchError("Empty list in response".to_string()))?;

    let measured_at = DateTime::from_timestamp(entry.dt, 0)
        .ok_or_else(|| FetchError(format!("Invalid timestamp: {}", entry.dt)))?;

    let mut concentrations = Vec::new();
    for (kind, value) in entry.components.values() {
        if let Some(v) = value {
            let c = Concentration::new(v).map_err(|e| FetchError(format!("{kind}: {e}")))?;
            concentrations.push((kind, c));
        }
    }

    Reading::new(OwmAqi(entry.main.aqi), measured_at, concentrations)
}

/// HTTP client for one fixed location.
pub struct Client {
    api_key: String,
    base_url: String,
    location: Location,
    http: reqwest::Client,
}

impl Client {
    pub fn new(
        api_key: String,
        base_url: String,
        location: Location,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_http(api_key, base_url, location, http))
    }

    pub(crate) fn with_http(
        api_key: String,
        base_url: String,
        location: Location,
        http: reqwest::Client,
    ) -> Self {
        Self {
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            location,
            http,
        }
    }

    async fn fetch(&self) -> Result<Reading, FetchError> {
        let url = format!("{}/data/2.5/air_pollution", self.base_url);
        let lat = self.location.lat.to_string();
        let lon = self.location.lon.to_string();

        let response = self
            .http
            .get(&url)
            .query(&[("lat", lat.as_str()), ("lon", lon.as_str()), ("appid", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| FetchError(format!("HTTP error: {}", e.without_url())))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| FetchError(format!("Failed to read response: {}", e.without_url())))?;

        debug!("OpenWeather response status: {status}");

        if !status.is_success() {
            return Err(FetchError(format!("API error {status}: {body}")));
        }

        let reading = parse_response(&body)?;
        info!(
            "🌫️ Fetched reading for {}: PM2.5 {} μg/m³, AQI {}",
            self.location.name,
            reading.pm25(),
            reading.aqi().0
        );
        Ok(reading)
    }
}

impl ReadingSource for Client {
    fn fetch_current(&self) -> impl Future<Output = Result<Reading, FetchError>> + Send {
        self.fetch()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "coord": {"lon": 106.8456, "lat": -6.2088},
        "list": [{
            "main": {"aqi": 4},
            "components": {
                "co": 1361.85, "no": 0.31, "no2": 33.59, "o3": 70.1,
                "so2": 27.18, "pm2_5": 58.74, "pm10": 72.53, "nh3": 9.31
            },
            "dt": 1760680800
        }]
    }"#;

    #[test]
    fn test_parse_sample() {
        let reading = parse_response(SAMPLE).unwrap();
        assert_eq!(reading.aqi(), OwmAqi(4));
        assert_eq!(reading.pm25().value(), 58.74);
        assert_eq!(reading.get(PollutantKind::No2).map(|c| c.value()), Some(33.59));
        assert_eq!(reading.get(PollutantKind::Nh3).map(|c| c.value()), Some(9.31));
        assert_eq!(reading.measured_at().timestamp(), 1760680800);
    }

    #[test]
    fn test_parse_missing_optional_component() {
        let body = r#"{"list":[{"dt":0,"main":{"aqi":1},"components":{"pm2_5":3.0}}]}"#;
        let reading = parse_response(body).unwrap();
        assert_eq!(reading.get(PollutantKind::Pm10), None);
        assert_eq!(reading.pm25().value(), 3.0);
    }

    #[test]
    fn test_parse_rejects_missing_pm25() {
        let body = r#"{"list":[{"dt":0,"main":{"aqi":1},"components":{"pm10":3.0}}]}"#;
        let err = parse_response(body).unwrap_err();
        assert!(err.to_string().contains("PM2.5"));
    }

    #[test]
    fn test_parse_rejects_negative_value() {
        let body = r#"{"list":[{"dt":0,"main":{"aqi":1},"components":{"pm2_5":-1.0}}]}"#;
        assert!(parse_response(body).is_err());
    }

    #[test]
    fn test_parse_rejects_empty_list() {
        let err = parse_response(r#"{"list":[]}"#).unwrap_err();
        assert!(err.to_string().contains("Empty list"));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        let err = parse_response("<html>502</html>").unwrap_err();
        assert!(err.to_string().starts_with("failed to fetch air quality data"));
    }

    /// Serve one canned HTTP response on a local port. Resolves to the raw request head.
    async fn serve_once(response: String) -> (std::net::SocketAddr, tokio::task::JoinHandle<String>) {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = stream.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            stream.write_all(response.as_bytes()).await.unwrap();
            stream.shutdown().await.ok();
            String::from_utf8_lossy(&request).to_string()
        });
        (addr, handle)
    }

    fn http_response(status: &str, body: &str) -> String {
        format!(
            "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        )
    }

    fn local_client(base_url: String) -> Client {
        let http = reqwest::Client::builder()
            .no_proxy()
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap();
        Client::with_http("secret-key".to_string(), base_url, Location::default(), http)
    }

    #[tokio::test]
    async fn test_fetch_success_builds_query() {
        let (addr, server) = serve_once(http_response("200 OK", SAMPLE)).await;
        // Trailing slash must not produce a double slash in the path
        let client = local_client(format!("http://{addr}/"));

        let reading = client.fetch_current().await.unwrap();
        assert_eq!(reading.pm25().value(), 58.74);
        assert_eq!(reading.aqi(), OwmAqi(4));

        let request = server.await.unwrap();
        let request_line = request.lines().next().unwrap();
        assert_eq!(
            request_line,
            "GET /data/2.5/air_pollution?lat=-6.2088&lon=106.8456&appid=secret-key HTTP/1.1"
        );
    }

    #[tokio::test]
    async fn test_fetch_non_success_status() {
        let body = r#"{"cod":401,"message":"Invalid API key"}"#;
        let (addr, server) = serve_once(http_response("401 Unauthorized", body)).await;
        let client = local_client(format!("http://{addr}/"));

        let err = client.fetch_current().await.unwrap_err();
        assert!(
            err.to_string().starts_with("failed to fetch air quality data: API error 401"),
            "got: {err}"
        );
        assert!(err.to_string().contains("Invalid API key"));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_fetch_malformed_body() {
        let (addr, server) = serve_once(http_response("200 OK", r#"{"list":[]}"#)).await;
        let client = local_client(format!("http://{addr}"));

        let err = client.fetch_current().await.unwrap_err();
        assert!(err.0.contains("Empty list"));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_fetch_connection_refused_hides_key() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let client = local_client(format!("http://{addr}"));

        let err = client.fetch_current().await.unwrap_err();
        assert!(err.0.starts_with("HTTP error"), "got: {err}");
        assert!(!err.to_string().contains("secret-key"));
    }

    #[test]
    fn test_aqi_description() {
        assert_eq!(OwmAqi(1).description(), "Good 😊");
        assert_eq!(OwmAqi(5).description(), "Very Poor 💀");
        assert_eq!(OwmAqi(0).description(), "Unknown");
        assert_eq!(OwmAqi(9).description(), "Unknown");
    }

    #[test]
    fn test_default_location_is_jakarta() {
        let loc = Location::default();
        assert_eq!(loc.name, "Jakarta");
        assert_eq!(loc.lat, -6.2088);
        assert_eq!(loc.lon, 106.8456);
    }
}
