use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use time::Duration;

use crate::ValidationError;

/// Chart lookback windows offered by the dashboard.
///
/// Each range fixes the candle resolution and lookback used for the upstream
/// history fetch: finer resolution over shorter windows, coarser over longer
/// ones, so every range stays within a sane point count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeRange {
    #[serde(rename = "1D")]
    Intraday,
    #[serde(rename = "5D")]
    FiveDay,
    #[serde(rename = "1M")]
    OneMonth,
    #[serde(rename = "6M")]
    SixMonth,
    #[serde(rename = "1Y")]
    OneYear,
    #[serde(rename = "5Y")]
    FiveYear,
}

impl TimeRange {
    pub const ALL: [Self; 6] = [
        Self::Intraday,
        Self::FiveDay,
        Self::OneMonth,
        Self::SixMonth,
        Self::OneYear,
        Self::FiveYear,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Intraday => "1D",
            Self::FiveDay => "5D",
            Self::OneMonth => "1M",
            Self::SixMonth => "6M",
            Self::OneYear => "1Y",
            Self::FiveYear => "5Y",
        }
    }

    /// Candle resolution parameter for the upstream history endpoint:
    /// minutes for intraday ranges, `D`/`W`/`M` buckets beyond that.
    pub const fn resolution(self) -> &'static str {
        match self {
            Self::Intraday => "30",
            Self::FiveDay => "60",
            Self::OneMonth | Self::SixMonth => "D",
            Self::OneYear => "W",
            Self::FiveYear => "M",
        }
    }

    pub const fn lookback(self) -> Duration {
        match self {
            Self::Intraday => Duration::days(1),
            Self::FiveDay => Duration::days(5),
            Self::OneMonth => Duration::days(30),
            Self::SixMonth => Duration::days(182),
            Self::OneYear => Duration::days(365),
            Self::FiveYear => Duration::days(1825),
        }
    }
}

impl Display for TimeRange {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimeRange {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "1D" => Ok(Self::Intraday),
            "5D" => Ok(Self::FiveDay),
            "1M" => Ok(Self::OneMonth),
            "6M" => Ok(Self::SixMonth),
            "1Y" => Ok(Self::OneYear),
            "5Y" => Ok(Self::FiveYear),
            other => Err(ValidationError::InvalidRange {
                value: other.to_owned(),
            }),
        }
    }
}
