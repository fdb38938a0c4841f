use std::fmt;
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::{debug, instrument, warn};

use crate::records::{
    group_consumption, ConsumptionPoint, EmissionPoint, KwhPrice, MeteringPoint, MeteringPointId,
    ValuePoint,
};
use crate::time::{format_timestamp, one_day, truncate_hour};
use crate::{rpc, BarryError, Consumption, PriceArea, Result, TimeSeries};

pub const DEFAULT_ENDPOINT: &str = "https://jsonrpc.barry.energy/json-rpc";

const METHOD_PREFIX: &str = "co.getbarry.api.v1.OpenApiController.";

/// Blocking client for the Barry Energy API.
///
/// Holds no state besides the token, so it can be shared between threads.
/// Timestamps of any time zone are accepted and sent as UTC.
pub struct BarryClient {
    http: reqwest::blocking::Client,
    endpoint: String,
    token: String,
}

impl fmt::Debug for BarryClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BarryClient")
            .field("endpoint", &self.endpoint)
            .field("token", &"<redacted>")
            .finish()
    }
}

impl BarryClient {
    /// Creates a client talking to [`DEFAULT_ENDPOINT`].
    pub fn new(token: impl Into<String>) -> Result<Self> {
        Self::builder(token).build()
    }

    pub fn builder(token: impl Into<String>) -> BarryClientBuilder {
        BarryClientBuilder {
            token: token.into(),
            endpoint: DEFAULT_ENDPOINT.to_owned(),
            timeout: None,
        }
    }

    /// Reads the token from `BARRY_API_TOKEN` and, if set, the endpoint from
    /// `BARRY_API_ENDPOINT`.
    pub fn from_env() -> Result<Self> {
        let token = std::env::var("BARRY_API_TOKEN")
            .map_err(|_| BarryError::InvalidInput("BARRY_API_TOKEN is not set".to_owned()))?;
        let mut builder = Self::builder(token);
        if let Ok(endpoint) = std::env::var("BARRY_API_ENDPOINT") {
            builder = builder.endpoint(endpoint);
        }
        builder.build()
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Query the hourly spot prices in `area` between `start` and `end`.
    #[instrument(
        skip_all,
        fields(area = %area, start = %format_timestamp(&start), end = %format_timestamp(&end))
    )]
    pub fn spot_prices<TZ: TimeZone>(
        &self,
        area: PriceArea,
        start: DateTime<TZ>,
        end: DateTime<TZ>,
    ) -> Result<TimeSeries> {
        let params =
            [json!(area.as_str()), json!(format_timestamp(&start)), json!(format_timestamp(&end))];
        let points: Vec<ValuePoint> = self.execute_list("getPrice", &params)?;
        Ok(points.into_iter().map(ValuePoint::into_entry).collect())
    }

    /// Query the CO2 intensity (g/kWh) of the grid in `area` between `start` and `end`.
    #[instrument(
        skip_all,
        fields(area = %area, start = %format_timestamp(&start), end = %format_timestamp(&end))
    )]
    pub fn co2_intensity<TZ: TimeZone>(
        &self,
        area: PriceArea,
        start: DateTime<TZ>,
        end: DateTime<TZ>,
    ) -> Result<TimeSeries> {
        let params =
            [json!(area.as_str()), json!(format_timestamp(&start)), json!(format_timestamp(&end))];
        let points: Vec<ValuePoint> = self.execute_list("getCo2Intensity", &params)?;
        Ok(points.into_iter().map(ValuePoint::into_entry).collect())
    }

    /// Query the CO2 emissions (kg) of all metering points of the account.
    ///
    /// The data usually lags two to three days behind, a limitation of the
    /// regulatory authorities.
    #[instrument(
        skip_all,
        fields(start = %format_timestamp(&start), end = %format_timestamp(&end))
    )]
    pub fn hourly_co2_emission<TZ: TimeZone>(
        &self,
        start: DateTime<TZ>,
        end: DateTime<TZ>,
    ) -> Result<TimeSeries> {
        let params = [json!(format_timestamp(&start)), json!(format_timestamp(&end))];
        let points: Vec<EmissionPoint> = self.execute_list("getHourlyCo2Emission", &params)?;
        Ok(points.into_iter().map(EmissionPoint::into_entry).collect())
    }

    /// Returns the metering points linked to the contract.
    #[instrument(skip_all)]
    pub fn metering_points(&self) -> Result<Vec<MeteringPoint>> {
        self.execute_list("getMeteringPoints", &[])
    }

    /// Query the hourly consumption (kWh) of every metering point between
    /// `start` and `end`.
    ///
    /// The range has to span at least one day.
    #[instrument(
        skip_all,
        fields(start = %format_timestamp(&start), end = %format_timestamp(&end))
    )]
    pub fn metering_point_consumption<TZ: TimeZone>(
        &self,
        start: DateTime<TZ>,
        end: DateTime<TZ>,
    ) -> Result<Consumption> {
        let (start, end) = (start.with_timezone(&Utc), end.with_timezone(&Utc));
        if (end - start).abs() < one_day() {
            return Err(BarryError::InvalidInput("date range must be at least one day".to_owned()));
        }

        let params = [json!(format_timestamp(&start)), json!(format_timestamp(&end))];
        let points: Vec<ConsumptionPoint> =
            self.execute_list("getAggregatedConsumption", &params)?;
        Ok(group_consumption(points))
    }

    /// Same as [`Self::metering_point_consumption`], but only returns the
    /// series of `mpid`.
    pub fn metering_point_consumption_for<TZ: TimeZone>(
        &self,
        start: DateTime<TZ>,
        end: DateTime<TZ>,
        mpid: &MeteringPointId,
    ) -> Result<TimeSeries> {
        self.metering_point_consumption(start, end)?
            .shift_remove(mpid)
            .ok_or_else(|| BarryError::UnknownMeteringPoint(mpid.clone()))
    }

    /// Returns the total price per kWh of `mpid` for the hour containing `at`,
    /// including grid fees, tariffs, subscription and spot price.
    #[instrument(skip_all, fields(mpid = %mpid, at = %format_timestamp(&at)))]
    pub fn hourly_kwh_price<TZ: TimeZone>(
        &self,
        at: DateTime<TZ>,
        mpid: &MeteringPointId,
    ) -> Result<f64> {
        // Wider ranges come back as the sum of their hourly prices.
        let start = truncate_hour(at.with_timezone(&Utc));
        let end = start + chrono::Duration::hours(1);

        let params = [json!(mpid), json!(format_timestamp(&start)), json!(format_timestamp(&end))];
        let price: KwhPrice = self.execute("getTotalKwHPrice", &params)?;
        Ok(price.value)
    }

    /// Like [`Self::execute`], but a `null` result reads as an empty list.
    fn execute_list<T: DeserializeOwned>(&self, method: &str, params: &[Value]) -> Result<Vec<T>> {
        let items: Option<Vec<T>> = self.execute(method, params)?;
        Ok(items.unwrap_or_default())
    }

    fn execute<T: DeserializeOwned>(&self, method: &str, params: &[Value]) -> Result<T> {
        let method = format!("{METHOD_PREFIX}{method}");
        debug!(method = %method, ?params, "calling");

        let body = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.token)
            .json(&rpc::Request::new(&method, params))
            .send()?
            .error_for_status()?
            .text()?;
        let response: rpc::Response = serde_json::from_str(&body)?;

        let result = Result::<Value>::from(response).map_err(|error| {
            warn!(method = %method, %error, "call failed");
            error
        })?;
        if let Value::Array(items) = &result {
            debug!(method = %method, n_items = items.len(), "received");
        }
        Ok(serde_json::from_value(result)?)
    }
}

pub struct BarryClientBuilder {
    token: String,
    endpoint: String,
    timeout: Option<Duration>,
}

impl BarryClientBuilder {
    /// Overrides the JSON-RPC endpoint.
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Sets a timeout for every request instead of the HTTP client's default.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn build(self) -> Result<BarryClient> {
        let mut http = reqwest::blocking::Client::builder();
        if let Some(timeout) = self.timeout {
            http = http.timeout(timeout);
        }
        Ok(BarryClient { http: http.build()?, endpoint: self.endpoint, token: self.token })
    }
}
