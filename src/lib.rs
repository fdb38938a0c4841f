//! Client for the [Barry Energy](https://barry.energy) JSON-RPC API.
//!
//! Every call is a single blocking HTTP request:
//!
//! ```no_run
//! use barry_energy_api::{BarryClient, PriceArea};
//! use chrono::{Duration, Utc};
//!
//! let client = BarryClient::new("my-token")?;
//! let now = Utc::now();
//! let prices = client.spot_prices(PriceArea::DkNordpoolSpotDk1, now - Duration::days(1), now)?;
//! for (start, price) in prices {
//!     println!("{start}: {price}");
//! }
//! # Ok::<(), barry_energy_api::BarryError>(())
//! ```

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use indexmap::IndexMap;
use thiserror::Error;

mod client;
mod records;
mod rpc;
mod time;

pub use client::{BarryClient, BarryClientBuilder, DEFAULT_ENDPOINT};
pub use records::{MeteringPoint, MeteringPointId};
pub use time::{current_hour, one_day, today_start, truncate_hour, yesterday_end, yesterday_start};

/// Values keyed by the UTC start of the slot they apply to, in the order the
/// API sent them.
pub type TimeSeries = IndexMap<DateTime<Utc>, f64>;

/// Consumption series keyed by metering point.
pub type Consumption = IndexMap<MeteringPointId, TimeSeries>;

pub type Result<T, E = BarryError> = std::result::Result<T, E>;

#[derive(Error, Debug)]
pub enum BarryError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("api returned an error: {0}")]
    Rpc(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("metering point {0} is not part of the response")]
    UnknownMeteringPoint(MeteringPointId),
    #[error("api responded with an unsupported response: {0}")]
    UnsupportedResponse(String),
}

impl From<serde_json::Error> for BarryError {
    fn from(error: serde_json::Error) -> Self {
        Self::UnsupportedResponse(error.to_string())
    }
}

/// Market zone for spot prices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PriceArea {
    DkNordpoolSpotDk1,
    DkNordpoolSpotDk2,
    FrEpexSpotFr,
}

impl PriceArea {
    pub const ALL: [Self; 3] = [Self::DkNordpoolSpotDk1, Self::DkNordpoolSpotDk2, Self::FrEpexSpotFr];

    /// Returns the identifier the API expects for this zone.
    pub const fn as_str(self) -> &'static str {
        match self {
            PriceArea::DkNordpoolSpotDk1 => "DK_NORDPOOL_SPOT_DK1",
            PriceArea::DkNordpoolSpotDk2 => "DK_NORDPOOL_SPOT_DK2",
            PriceArea::FrEpexSpotFr => "FR_EPEX_SPOT_FR",
        }
    }

    /// Returns the time zone the market of this zone trades in.
    pub const fn time_zone(self) -> Tz {
        match self {
            PriceArea::DkNordpoolSpotDk1 | PriceArea::DkNordpoolSpotDk2 => {
                chrono_tz::Europe::Copenhagen
            }
            PriceArea::FrEpexSpotFr => chrono_tz::Europe::Paris,
        }
    }

    /// Returns the instant the market day `date` begins, i.e. local midnight
    /// in the zone's time zone.
    pub fn day_start(self, date: NaiveDate) -> DateTime<Utc> {
        time::midnight(&self.time_zone(), date)
    }
}

impl fmt::Display for PriceArea {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PriceArea {
    type Err = BarryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|area| area.as_str() == s)
            .ok_or_else(|| BarryError::InvalidInput(format!("unknown price area {s}")))
    }
}
