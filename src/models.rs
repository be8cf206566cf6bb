use crate::validation::{Bounds, FieldReader, ViolationKind, Violations};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::{IntoParams, ToSchema};

/// A resource kind persisted in its own collection.
///
/// `validate` is a pure structural pass over a decoded JSON body: each field is
/// checked on its own and every violation is reported.
pub trait Entity: Serialize + Sized + Send + 'static {
    /// Name of the collection documents of this kind are stored in.
    const COLLECTION: &'static str;

    fn validate(input: &Value) -> Result<Self, Violations>;
}

// ============ Property ============

/// A real-estate listing shown in the deal feed.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Property {
    /// Listing headline.
    pub title: String,
    /// Street address.
    pub address: String,
    pub city: String,
    /// Two-letter US state code.
    pub state: String,
    pub zipcode: String,
    /// Asking price in USD.
    pub price: f64,
    /// Cap rate percentage.
    pub cap_rate: Option<f64>,
    /// Cash-on-cash return percentage.
    pub cash_on_cash: Option<f64>,
    /// Number of units (multifamily).
    pub units: Option<i64>,
    /// SFR, Multifamily, Industrial, Retail, Land, etc.
    pub property_type: String,
    /// Image URLs.
    pub images: Vec<String>,
    /// Lead source or marketplace.
    pub source: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl Entity for Property {
    const COLLECTION: &'static str = "property";

    fn validate(input: &Value) -> Result<Self, Violations> {
        validate_property(input)
    }
}

pub fn validate_property(input: &Value) -> Result<Property, Violations> {
    let mut r = FieldReader::new(input);

    let property = Property {
        title: r.required_str("title"),
        address: r.required_str("address"),
        city: r.required_str("city"),
        state: r.required_letters("state", 2, "a 2-letter state code"),
        zipcode: r.required_str("zipcode"),
        price: r.required_number("price", Bounds::NON_NEGATIVE),
        cap_rate: r.optional_number("cap_rate", Bounds::PERCENT),
        cash_on_cash: r.optional_number("cash_on_cash", Bounds::PERCENT),
        units: r.optional_integer("units", Bounds::NON_NEGATIVE),
        property_type: r.required_str("property_type"),
        images: r.string_list("images"),
        source: r.optional_str("source"),
        latitude: r.optional_number("latitude", Bounds::ANY),
        longitude: r.optional_number("longitude", Bounds::ANY),
    };

    r.finish(property)
}

// ============ Saved Search ============

/// A market-monitoring subscription.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct SavedSearch {
    pub name: String,
    /// Subscriber email.
    pub email: String,
    /// Markets like "Austin, TX".
    pub markets: Vec<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub min_cap_rate: Option<f64>,
    pub property_types: Vec<String>,
}

impl Entity for SavedSearch {
    const COLLECTION: &'static str = "savedsearch";

    fn validate(input: &Value) -> Result<Self, Violations> {
        validate_saved_search(input)
    }
}

pub fn validate_saved_search(input: &Value) -> Result<SavedSearch, Violations> {
    let mut r = FieldReader::new(input);

    let search = SavedSearch {
        name: r.required_str("name"),
        email: r.required_email("email"),
        markets: r.string_list("markets"),
        min_price: r.optional_number("min_price", Bounds::NON_NEGATIVE),
        max_price: r.optional_number("max_price", Bounds::NON_NEGATIVE),
        min_cap_rate: r.optional_number("min_cap_rate", Bounds::PERCENT),
        property_types: r.string_list("property_types"),
    };

    r.finish(search)
}

// ============ Lead ============

/// An inbound contact submission.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Lead {
    pub name: String,
    pub email: String,
    pub message: Option<String>,
    pub company: Option<String>,
    pub phone: Option<String>,
}

impl Entity for Lead {
    const COLLECTION: &'static str = "lead";

    fn validate(input: &Value) -> Result<Self, Violations> {
        validate_lead(input)
    }
}

pub fn validate_lead(input: &Value) -> Result<Lead, Violations> {
    let mut r = FieldReader::new(input);

    let lead = Lead {
        name: r.required_str("name"),
        email: r.required_email("email"),
        message: r.optional_str("message"),
        company: r.optional_str("company"),
        phone: r.optional_str("phone"),
    };

    r.finish(lead)
}

// ============ API Models ============

/// Query parameters for the property feed.
#[derive(Debug, Clone, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PropertyQuery {
    /// Maximum number of listings to return (default 12). A negative value
    /// is read as its absolute value.
    pub limit: i64,
    /// Exact, case-sensitive city match.
    pub city: Option<String>,
    /// Exact, case-sensitive state match.
    pub state: Option<String>,
}

pub const DEFAULT_FEED_LIMIT: i64 = 12;

impl Default for PropertyQuery {
    fn default() -> Self {
        Self {
            limit: DEFAULT_FEED_LIMIT,
            city: None,
            state: None,
        }
    }
}

/// Feed parameters exactly as they arrive in the query string.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawPropertyQuery {
    pub limit: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
}

impl PropertyQuery {
    /// Parses `limit`, reporting a non-integer value as a `limit` violation.
    pub fn from_raw(raw: RawPropertyQuery) -> Result<Self, Violations> {
        let limit = match raw.limit.as_deref().map(str::trim) {
            None | Some("") => DEFAULT_FEED_LIMIT,
            Some(value) => value.parse::<i64>().map_err(|_| {
                Violations::single(
                    "limit",
                    ViolationKind::WrongType {
                        expected: "a valid integer",
                    },
                )
            })?,
        };

        Ok(Self {
            limit,
            city: raw.city,
            state: raw.state,
        })
    }

    /// Number of documents to read: `|limit|`, saturated to the store's range.
    pub fn row_limit(&self) -> u32 {
        u32::try_from(self.limit.unsigned_abs()).unwrap_or(u32::MAX)
    }
}

/// Response to a successful insert.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreatedResponse {
    /// Store-generated identifier of the new document.
    pub id: String,
    pub status: String,
}

impl CreatedResponse {
    pub fn ok(id: String) -> Self {
        Self {
            id,
            status: "ok".to_string(),
        }
    }
}

/// Diagnostic report returned by `GET /test`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DiagnosticReport {
    pub backend: String,
    pub database: String,
    pub database_url: String,
    pub database_name: String,
    pub connection_status: String,
    pub collections: Vec<String>,
}
