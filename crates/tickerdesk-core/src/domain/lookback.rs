use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ValidationError;

/// Trailing window of price history requested from a provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Lookback {
    #[serde(rename = "1mo")]
    OneMonth,
    #[serde(rename = "3mo")]
    ThreeMonths,
    #[serde(rename = "6mo")]
    SixMonths,
    #[serde(rename = "1y")]
    OneYear,
    #[serde(rename = "2y")]
    TwoYears,
    #[serde(rename = "5y")]
    FiveYears,
}

impl Lookback {
    pub const ALL: [Self; 6] = [
        Self::OneMonth,
        Self::ThreeMonths,
        Self::SixMonths,
        Self::OneYear,
        Self::TwoYears,
        Self::FiveYears,
    ];

    /// Provider range code (`range=` query parameter on the Yahoo chart API).
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OneMonth => "1mo",
            Self::ThreeMonths => "3mo",
            Self::SixMonths => "6mo",
            Self::OneYear => "1y",
            Self::TwoYears => "2y",
            Self::FiveYears => "5y",
        }
    }

    /// Human label used in chart titles.
    pub const fn label(self) -> &'static str {
        match self {
            Self::OneMonth => "Last month",
            Self::ThreeMonths => "Last 3 months",
            Self::SixMonths => "Last 6 months",
            Self::OneYear => "Last year",
            Self::TwoYears => "Last 2 years",
            Self::FiveYears => "Last 5 years",
        }
    }

    pub const fn days(self) -> u32 {
        match self {
            Self::OneMonth => 30,
            Self::ThreeMonths => 91,
            Self::SixMonths => 182,
            Self::OneYear => 365,
            Self::TwoYears => 730,
            Self::FiveYears => 1826,
        }
    }
}

impl Default for Lookback {
    fn default() -> Self {
        Self::SixMonths
    }
}

impl Display for Lookback {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Lookback {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "1mo" => Ok(Self::OneMonth),
            "3mo" => Ok(Self::ThreeMonths),
            "6mo" => Ok(Self::SixMonths),
            "1y" => Ok(Self::OneYear),
            "2y" => Ok(Self::TwoYears),
            "5y" => Ok(Self::FiveYears),
            other => Err(ValidationError::InvalidLookback {
                value: other.to_owned(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_window_is_six_months() {
        assert_eq!(Lookback::default(), Lookback::SixMonths);
        assert_eq!(Lookback::default().label(), "Last 6 months");
    }

    #[test]
    fn parses_every_range_code() {
        for lookback in Lookback::ALL {
            assert_eq!(Lookback::from_str(lookback.as_str()), Ok(lookback));
        }
    }

    #[test]
    fn rejects_unknown_range() {
        let err = Lookback::from_str("max").expect_err("must fail");
        assert!(matches!(err, ValidationError::InvalidLookback { .. }));
    }
}
