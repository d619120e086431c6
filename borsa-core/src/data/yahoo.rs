//! Yahoo Finance data provider.
//!
//! Fetches OHLCV history from Yahoo's v8 chart API using `range` and
//! `interval` descriptors. The chart endpoint serves one symbol per request,
//! so a multi-ticker `download` walks the batch sequentially and assembles a
//! grouped frame. No retries happen here: the fetcher owns the retry policy.
//!
//! Yahoo Finance has no official API and is subject to unannounced format changes.

use super::provider::{ConstituentSource, DataError, HistoryFrame, HistoryProvider};
use crate::domain::{HistoryRequest, Interval, RawRow};
use chrono::{NaiveDateTime, NaiveTime};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, warn};

/// Yahoo Finance v8 chart API response.
#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartResult,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    result: Option<Vec<ChartData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    meta: Option<ChartMeta>,
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct ChartMeta {
    gmtoffset: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<QuoteData>,
    adjclose: Option<Vec<AdjCloseData>>,
}

#[derive(Debug, Deserialize)]
struct QuoteData {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<u64>>,
}

#[derive(Debug, Deserialize)]
struct AdjCloseData {
    adjclose: Vec<Option<f64>>,
}

const CHART_BASE_URL: &str = "https://query2.finance.yahoo.com/v8/finance/chart";

/// Yahoo Finance data provider.
pub struct YahooProvider {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl YahooProvider {
    pub fn new() -> Result<Self, DataError> {
        Self::with_base_url(CHART_BASE_URL)
    }

    /// Point the provider at a different chart endpoint (mirrors, proxies).
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, DataError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .build()
            .map_err(|e| DataError::Other(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    /// Build the chart API URL for a symbol and request.
    fn chart_url(&self, symbol: &str, request: &HistoryRequest) -> String {
        format!(
            "{}/{symbol}?range={}&interval={}&includeAdjustedClose=true",
            self.base_url, request.period, request.interval
        )
    }

    /// Parse a chart API body into raw rows.
    ///
    /// Rows keep missing fields as `None`; dropping them is the caller's job.
    fn parse_response(
        symbol: &str,
        body: &str,
        interval: &Interval,
    ) -> Result<Vec<RawRow>, DataError> {
        let resp: ChartResponse = serde_json::from_str(body).map_err(|e| {
            DataError::ResponseFormatChanged(format!("failed to parse response for {symbol}: {e}"))
        })?;

        let result = resp.chart.result.ok_or_else(|| {
            if let Some(err) = resp.chart.error {
                if err.code == "Not Found" {
                    DataError::SymbolNotFound {
                        symbol: symbol.to_string(),
                    }
                } else {
                    DataError::ResponseFormatChanged(format!("{}: {}", err.code, err.description))
                }
            } else {
                DataError::ResponseFormatChanged("empty result with no error".into())
            }
        })?;

        let data = result
            .into_iter()
            .next()
            .ok_or_else(|| DataError::ResponseFormatChanged("result array is empty".into()))?;

        // Delisted or brand-new symbols come back without timestamps.
        let Some(timestamps) = data.timestamp else {
            return Ok(Vec::new());
        };

        let offset = data.meta.and_then(|m| m.gmtoffset).unwrap_or(0);

        let quote = data
            .indicators
            .quote
            .into_iter()
            .next()
            .ok_or_else(|| DataError::ResponseFormatChanged("no quote data".into()))?;

        let adj_closes = data
            .indicators
            .adjclose
            .and_then(|v| v.into_iter().next())
            .map(|a| a.adjclose);

        let mut rows = Vec::with_capacity(timestamps.len());

        for (i, &ts) in timestamps.iter().enumerate() {
            let timestamp = to_exchange_time(ts, offset, interval).ok_or_else(|| {
                DataError::ResponseFormatChanged(format!("invalid timestamp: {ts}"))
            })?;

            let close = quote.close.get(i).copied().flatten();
            // Intraday charts carry no adjclose series.
            let adj_close = match &adj_closes {
                Some(v) => v.get(i).copied().flatten(),
                None => close,
            };

            rows.push(RawRow {
                timestamp,
                open: quote.open.get(i).copied().flatten(),
                high: quote.high.get(i).copied().flatten(),
                low: quote.low.get(i).copied().flatten(),
                close,
                adj_close,
                volume: quote.volume.get(i).copied().flatten(),
            });
        }

        Ok(rows)
    }

    /// Execute a single chart request for one symbol.
    fn fetch_symbol(&self, symbol: &str, request: &HistoryRequest) -> Result<Vec<RawRow>, DataError> {
        let url = self.chart_url(symbol, request);
        debug!(%symbol, %url, "requesting chart");

        let resp = self
            .client
            .get(&url)
            .send()
            .map_err(|e| DataError::NetworkUnreachable(e.to_string()))?;

        let status = resp.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(DataError::RateLimited);
        }
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            });
        }
        if !status.is_success() {
            return Err(DataError::Http {
                status: status.as_u16(),
                symbol: symbol.to_string(),
            });
        }

        let body = resp
            .text()
            .map_err(|e| DataError::NetworkUnreachable(e.to_string()))?;
        Self::parse_response(symbol, &body, &request.interval)
    }
}

/// Shift a UTC epoch to exchange-local time; daily-or-longer bars keep only the date.
fn to_exchange_time(ts: i64, gmtoffset: i64, interval: &Interval) -> Option<NaiveDateTime> {
    let local = chrono::DateTime::from_timestamp(ts.checked_add(gmtoffset)?, 0)?.naive_utc();
    if interval.is_intraday() {
        Some(local)
    } else {
        Some(local.date().and_time(NaiveTime::MIN))
    }
}

/// Fetch each symbol in turn and group the per-symbol outcomes.
///
/// A batch-wide error on any symbol aborts the call. Other failures are kept
/// against their symbol; if no symbol succeeds, the last failure is returned.
fn collect_batch<F>(symbols: &[String], mut fetch: F) -> Result<HistoryFrame, DataError>
where
    F: FnMut(&str) -> Result<Vec<RawRow>, DataError>,
{
    let mut grouped = BTreeMap::new();
    let mut last_error = None;

    for symbol in symbols {
        match fetch(symbol) {
            Ok(rows) => {
                grouped.insert(symbol.clone(), Ok(rows));
            }
            Err(e) if e.is_batch_wide() => return Err(e),
            Err(e) => {
                warn!(%symbol, error = %e, "symbol failed inside batch");
                last_error = Some(e.clone());
                grouped.insert(symbol.clone(), Err(e));
            }
        }
    }

    match last_error {
        Some(e) if grouped.values().all(Result::is_err) => Err(e),
        _ => Ok(HistoryFrame::Grouped(grouped)),
    }
}

impl HistoryProvider for YahooProvider {
    fn name(&self) -> &str {
        "yahoo_finance"
    }

    fn download(
        &self,
        tickers: &[String],
        request: &HistoryRequest,
    ) -> Result<HistoryFrame, DataError> {
        match tickers {
            [] => Err(DataError::EmptyRequest),
            [single] => Ok(HistoryFrame::Flat(self.fetch_symbol(single, request)?)),
            many => collect_batch(many, |symbol| self.fetch_symbol(symbol, request)),
        }
    }
}

impl ConstituentSource for YahooProvider {
    /// The chart API has no membership endpoint.
    fn constituents(&self, _index: &str) -> Result<Option<Vec<String>>, DataError> {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Period;

    const DAILY_BODY: &str = r#"{
        "chart": {
            "result": [{
                "meta": {"gmtoffset": 3600},
                "timestamp": [1704182400, 1704268800, 1704355200],
                "indicators": {
                    "quote": [{
                        "open":   [15.0, 15.2, null],
                        "high":   [15.4, 15.5, null],
                        "low":    [14.9, 15.0, null],
                        "close":  [15.3, 15.1, null],
                        "volume": [1000, 1200, null]
                    }],
                    "adjclose": [{"adjclose": [14.8, 14.6, null]}]
                }
            }],
            "error": null
        }
    }"#;

    #[test]
    fn parses_daily_rows_keeping_gaps() {
        let rows =
            YahooProvider::parse_response("ENI.MI", DAILY_BODY, &Interval::Daily).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].timestamp.to_string(), "2024-01-02 00:00:00");
        assert_eq!(rows[0].close, Some(15.3));
        assert_eq!(rows[1].adj_close, Some(14.6));
        assert!(rows[2].close.is_none());
    }

    #[test]
    fn intraday_keeps_time_and_falls_back_to_close() {
        let body = r#"{"chart":{"result":[{"meta":{"gmtoffset":0},
            "timestamp":[1704186000],
            "indicators":{"quote":[{"open":[1.0],"high":[2.0],"low":[0.5],"close":[1.5],"volume":[10]}]}}],
            "error":null}}"#;
        let rows =
            YahooProvider::parse_response("X", body, &Interval::Other("1h".into())).unwrap();
        assert_eq!(rows[0].timestamp.to_string(), "2024-01-02 09:00:00");
        assert_eq!(rows[0].adj_close, Some(1.5));
    }

    #[test]
    fn not_found_error_maps_to_symbol_not_found() {
        let body = r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found, symbol may be delisted"}}}"#;
        let err = YahooProvider::parse_response("NOPE", body, &Interval::Daily).unwrap_err();
        assert!(matches!(err, DataError::SymbolNotFound { symbol } if symbol == "NOPE"));
    }

    #[test]
    fn missing_timestamps_yield_empty_rows() {
        let body = r#"{"chart":{"result":[{"meta":{},"indicators":{"quote":[{}]}}],"error":null}}"#;
        let rows = YahooProvider::parse_response("OLD", body, &Interval::Daily).unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn garbage_body_is_format_change() {
        let err = YahooProvider::parse_response("X", "<html>", &Interval::Daily).unwrap_err();
        assert!(matches!(err, DataError::ResponseFormatChanged(_)));
    }

    #[test]
    fn chart_url_carries_range_and_interval() {
        let provider = YahooProvider::with_base_url("http://localhost:1/chart").unwrap();
        let req = HistoryRequest::new(Period::FiveYears, Interval::Weekly);
        assert_eq!(
            provider.chart_url("ENI.MI", &req),
            "http://localhost:1/chart/ENI.MI?range=5y&interval=1wk&includeAdjustedClose=true"
        );
    }

    #[test]
    fn empty_request_rejected_without_network() {
        let provider = YahooProvider::with_base_url("http://localhost:1/chart").unwrap();
        let err = provider
            .download(&[], &HistoryRequest::default())
            .unwrap_err();
        assert!(matches!(err, DataError::EmptyRequest));
    }

    #[test]
    fn overflowing_offset_is_format_change() {
        let body = r#"{"chart":{"result":[{"meta":{"gmtoffset":9223372036854775807},
            "timestamp":[1704186000],
            "indicators":{"quote":[{"open":[1.0],"high":[2.0],"low":[0.5],"close":[1.5],"volume":[10]}]}}],
            "error":null}}"#;
        let err = YahooProvider::parse_response("X", body, &Interval::Daily).unwrap_err();
        assert!(matches!(err, DataError::ResponseFormatChanged(_)));
    }

    // ─── Multi-symbol batches ───────────────────────────────────────

    fn symbols(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    fn one_row() -> Vec<RawRow> {
        YahooProvider::parse_response("A", DAILY_BODY, &Interval::Daily).unwrap()
    }

    fn http(status: u16, symbol: &str) -> DataError {
        DataError::Http {
            status,
            symbol: symbol.to_string(),
        }
    }

    #[test]
    fn server_error_on_one_symbol_fails_whole_batch() {
        let mut seen = Vec::new();
        let err = collect_batch(&symbols(&["A", "B", "C"]), |s| {
            seen.push(s.to_string());
            match s {
                "B" => Err(http(503, s)),
                _ => Ok(one_row()),
            }
        })
        .unwrap_err();
        assert_eq!(err, http(503, "B"));
        // stops at the failing symbol
        assert_eq!(seen, vec!["A", "B"]);
    }

    #[test]
    fn truncated_body_fails_whole_batch() {
        let err = collect_batch(&symbols(&["A", "B"]), |s| match s {
            "A" => Err(DataError::ResponseFormatChanged("EOF while parsing".into())),
            _ => Ok(one_row()),
        })
        .unwrap_err();
        assert!(matches!(err, DataError::ResponseFormatChanged(_)));
    }

    #[test]
    fn not_found_symbol_kept_with_its_error() {
        let frame = collect_batch(&symbols(&["A", "B"]), |s| match s {
            "B" => Err(DataError::SymbolNotFound { symbol: s.into() }),
            _ => Ok(one_row()),
        })
        .unwrap();
        let HistoryFrame::Grouped(map) = frame else {
            panic!("expected grouped frame");
        };
        assert_eq!(map["A"].as_ref().map(Vec::len), Ok(3));
        assert_eq!(map["B"], Err(DataError::SymbolNotFound { symbol: "B".into() }));
    }

    #[test]
    fn every_symbol_failing_returns_last_error() {
        let err = collect_batch(&symbols(&["A", "B"]), |s| Err(http(404, s))).unwrap_err();
        assert_eq!(err, http(404, "B"));
    }

    /// Serves one canned HTTP response per accepted connection.
    fn serve(responses: Vec<(&'static str, &'static str)>) -> String {
        use std::io::{BufRead, BufReader, Write};

        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        std::thread::spawn(move || {
            for (status, body) in responses {
                let (mut stream, _) = listener.accept().unwrap();
                let mut reader = BufReader::new(stream.try_clone().unwrap());
                let mut line = String::new();
                while reader.read_line(&mut line).unwrap() > 0 && line != "\r\n" {
                    line.clear();
                }
                write!(
                    stream,
                    "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                )
                .unwrap();
            }
        });
        format!("http://{addr}/chart")
    }

    #[test]
    fn http_503_inside_batch_surfaces_as_batch_error() {
        let base = serve(vec![("200 OK", DAILY_BODY), ("503 Service Unavailable", "")]);
        let provider = YahooProvider::with_base_url(base).unwrap();

        let err = provider
            .download(&symbols(&["A", "B"]), &HistoryRequest::default())
            .unwrap_err();
        assert_eq!(err, http(503, "B"));
        assert!(err.is_batch_wide());
    }

    #[test]
    fn http_404_inside_batch_is_kept_per_symbol() {
        let base = serve(vec![("404 Not Found", ""), ("200 OK", DAILY_BODY)]);
        let provider = YahooProvider::with_base_url(base).unwrap();

        let frame = provider
            .download(&symbols(&["A", "B"]), &HistoryRequest::default())
            .unwrap();
        let HistoryFrame::Grouped(map) = frame else {
            panic!("expected grouped frame");
        };
        assert_eq!(map["A"], Err(DataError::SymbolNotFound { symbol: "A".into() }));
        assert!(map["B"].is_ok());
    }
}
