use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{Interval, Lookback, Symbol, UtcDateTime, ValidationError};

/// Headline shown for a news item that carries neither a title nor a publisher.
pub const UNTITLED_NEWS: &str = "No title";

/// Company profile fields surfaced in the info panel, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum InfoField {
    ShortName,
    LongName,
    Sector,
    Industry,
    Country,
    Website,
}

impl InfoField {
    pub const ALL: [Self; 6] = [
        Self::ShortName,
        Self::LongName,
        Self::Sector,
        Self::Industry,
        Self::Country,
        Self::Website,
    ];

    /// Key under which the provider reports this field.
    pub const fn key(self) -> &'static str {
        match self {
            Self::ShortName => "shortName",
            Self::LongName => "longName",
            Self::Sector => "sector",
            Self::Industry => "industry",
            Self::Country => "country",
            Self::Website => "website",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::ShortName => "Name",
            Self::LongName => "Legal name",
            Self::Sector => "Sector",
            Self::Industry => "Industry",
            Self::Country => "Country",
            Self::Website => "Website",
        }
    }
}

/// One projected profile value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InfoEntry {
    pub field: InfoField,
    pub value: String,
}

/// Free-form company info as returned by a provider.
///
/// Every key is optional; callers read it through [`CompanyInfo::profile`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompanyInfo {
    fields: Map<String, Value>,
}

impl CompanyInfo {
    /// Wrap a JSON value; anything other than an object yields empty info.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(fields) => Self { fields },
            _ => Self::default(),
        }
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Merge keys from `other` that are not present yet.
    pub fn absorb(&mut self, other: Map<String, Value>) {
        for (key, value) in other {
            self.fields.entry(key).or_insert(value);
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Whitelisted profile fields that are present and non-empty, in
    /// [`InfoField::ALL`] order.
    pub fn profile(&self) -> Vec<InfoEntry> {
        InfoField::ALL
            .into_iter()
            .filter_map(|field| {
                let value = self.fields.get(field.key())?;
                if !is_truthy(value) {
                    return None;
                }
                Some(InfoEntry {
                    field,
                    value: display_value(value),
                })
            })
            .collect()
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().map(|n| n != 0.0).unwrap_or(true),
        Value::String(text) => !text.trim().is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.trim().to_owned(),
        other => other.to_string(),
    }
}

/// One closing price observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub ts: UtcDateTime,
    pub close: f64,
}

impl PricePoint {
    pub fn new(ts: UtcDateTime, close: f64) -> Result<Self, ValidationError> {
        validate_non_negative("close", close)?;
        Ok(Self { ts, close })
    }
}

/// Closing-price series for one symbol over a lookback window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceHistory {
    pub symbol: Symbol,
    pub lookback: Lookback,
    pub interval: Interval,
    pub points: Vec<PricePoint>,
}

impl PriceHistory {
    /// Points are kept in ascending timestamp order.
    pub fn new(
        symbol: Symbol,
        lookback: Lookback,
        interval: Interval,
        mut points: Vec<PricePoint>,
    ) -> Self {
        points.sort_by_key(|point| point.ts);
        Self {
            symbol,
            lookback,
            interval,
            points,
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> Option<&PricePoint> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&PricePoint> {
        self.points.last()
    }

    /// `(min, max)` of the closing prices, `None` for an empty series.
    pub fn close_range(&self) -> Option<(f64, f64)> {
        let mut closes = self.points.iter().map(|point| point.close);
        let first = closes.next()?;
        Some(closes.fold((first, first), |(low, high), close| {
            (low.min(close), high.max(close))
        }))
    }
}

/// Provider news headline. All fields are optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsItem {
    pub title: Option<String>,
    pub publisher: Option<String>,
    pub link: Option<String>,
    pub published_at: Option<UtcDateTime>,
}

impl NewsItem {
    /// Title, else publisher, else [`UNTITLED_NEWS`].
    pub fn headline(&self) -> &str {
        non_blank(self.title.as_deref())
            .or_else(|| non_blank(self.publisher.as_deref()))
            .unwrap_or(UNTITLED_NEWS)
    }

    pub fn href(&self) -> Option<&str> {
        non_blank(self.link.as_deref())
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|text| !text.is_empty())
}

fn validate_non_negative(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::NonFiniteValue { field });
    }
    if value < 0.0 {
        return Err(ValidationError::NegativeValue { field });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn profile_keeps_whitelisted_truthy_fields_in_order() {
        let info = CompanyInfo::from_value(json!({
            "website": "https://apple.com",
            "longName": "Apple Inc.",
            "sector": "",
            "industry": null,
            "country": "United States",
            "fullTimeEmployees": 150000
        }));

        let profile = info.profile();
        let fields = profile.iter().map(|entry| entry.field).collect::<Vec<_>>();
        assert_eq!(
            fields,
            vec![InfoField::LongName, InfoField::Country, InfoField::Website]
        );
        assert_eq!(profile[0].value, "Apple Inc.");
    }

    #[test]
    fn profile_is_empty_when_no_whitelisted_field_present() {
        let info = CompanyInfo::from_value(json!({ "marketCap": 1_000_000 }));
        assert!(!info.is_empty());
        assert!(info.profile().is_empty());
    }

    #[test]
    fn non_object_payload_becomes_empty_info() {
        assert!(CompanyInfo::from_value(json!([1, 2, 3])).is_empty());
    }

    #[test]
    fn history_sorts_points_and_reports_range() {
        let symbol = Symbol::parse("AAPL").expect("valid");
        let later = PricePoint::new(UtcDateTime::from_unix(200).expect("ts"), 12.0).expect("point");
        let earlier = PricePoint::new(UtcDateTime::from_unix(100).expect("ts"), 10.0).expect("point");

        let history = PriceHistory::new(
            symbol,
            Lookback::SixMonths,
            Interval::OneDay,
            vec![later, earlier],
        );

        assert_eq!(history.first().map(|p| p.close), Some(10.0));
        assert_eq!(history.close_range(), Some((10.0, 12.0)));
    }

    #[test]
    fn rejects_negative_close() {
        let ts = UtcDateTime::from_unix(0).expect("ts");
        let err = PricePoint::new(ts, -1.0).expect_err("must fail");
        assert_eq!(err, ValidationError::NegativeValue { field: "close" });
    }

    #[test]
    fn headline_falls_back_to_publisher_then_placeholder() {
        let titled = NewsItem {
            title: Some(String::from("Earnings beat")),
            publisher: Some(String::from("Reuters")),
            ..NewsItem::default()
        };
        let publisher_only = NewsItem {
            title: Some(String::from("  ")),
            publisher: Some(String::from("Reuters")),
            ..NewsItem::default()
        };

        assert_eq!(titled.headline(), "Earnings beat");
        assert_eq!(publisher_only.headline(), "Reuters");
        assert_eq!(NewsItem::default().headline(), UNTITLED_NEWS);
        assert_eq!(NewsItem::default().href(), None);
    }
}
