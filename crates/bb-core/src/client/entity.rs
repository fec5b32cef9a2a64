//! Client Aggregate Entities
//!
//! A Client owns exactly one Contact, one Deposit, and an append-only list of
//! BalanceLog entries. The four records are created together and deleted
//! together; only the BalanceLog is append-only in between.

use bson::serde_helpers::chrono_datetime_as_bson_datetime;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use bb_common::SurrogateKey;

/// Marital status of a client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Marital {
    Married,
    Single,
    Divorced,
}

impl Marital {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Married => "married",
            Self::Single => "single",
            Self::Divorced => "divorced",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "married" => Some(Self::Married),
            "single" => Some(Self::Single),
            "divorced" => Some(Self::Divorced),
            _ => None,
        }
    }
}

/// Education level of a client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Education {
    Primary,
    Secondary,
    Tertiary,
    Unknown,
}

impl Education {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::Secondary => "secondary",
            Self::Tertiary => "tertiary",
            Self::Unknown => "unknown",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "primary" => Some(Self::Primary),
            "secondary" => Some(Self::Secondary),
            "tertiary" => Some(Self::Tertiary),
            "unknown" => Some(Self::Unknown),
            _ => None,
        }
    }
}

/// How the client was contacted during the campaign
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContactChannel {
    Cellular,
    Telephone,
    Unknown,
}

impl ContactChannel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cellular => "cellular",
            Self::Telephone => "telephone",
            Self::Unknown => "unknown",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "cellular" => Some(Self::Cellular),
            "telephone" => Some(Self::Telephone),
            "unknown" => Some(Self::Unknown),
            _ => None,
        }
    }
}

/// Month of the last campaign contact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Month {
    Jan,
    Feb,
    Mar,
    Apr,
    May,
    Jun,
    Jul,
    Aug,
    Sep,
    Oct,
    Nov,
    Dec,
}

impl Month {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Jan => "jan",
            Self::Feb => "feb",
            Self::Mar => "mar",
            Self::Apr => "apr",
            Self::May => "may",
            Self::Jun => "jun",
            Self::Jul => "jul",
            Self::Aug => "aug",
            Self::Sep => "sep",
            Self::Oct => "oct",
            Self::Nov => "nov",
            Self::Dec => "dec",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "jan" => Some(Self::Jan),
            "feb" => Some(Self::Feb),
            "mar" => Some(Self::Mar),
            "apr" => Some(Self::Apr),
            "may" => Some(Self::May),
            "jun" => Some(Self::Jun),
            "jul" => Some(Self::Jul),
            "aug" => Some(Self::Aug),
            "sep" => Some(Self::Sep),
            "oct" => Some(Self::Oct),
            "nov" => Some(Self::Nov),
            "dec" => Some(Self::Dec),
            _ => None,
        }
    }
}

/// Outcome of the previous marketing campaign
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Success,
    Failure,
    Other,
    Unknown,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failure => "failure",
            Self::Other => "other",
            Self::Unknown => "unknown",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "success" => Some(Self::Success),
            "failure" => Some(Self::Failure),
            "other" => Some(Self::Other),
            "unknown" => Some(Self::Unknown),
            _ => None,
        }
    }
}

/// Client entity - the root of the aggregate
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    /// Surrogate key as Crockford Base32 string
    #[serde(rename = "_id")]
    pub id: String,

    pub age: i32,
    pub job: String,
    pub marital: Marital,
    pub education: Education,

    /// Whether the client has credit in default
    #[serde(rename = "default")]
    pub default: bool,

    /// Current account balance
    pub balance: f64,

    /// Whether the client has a housing loan
    pub housing: bool,

    /// Whether the client has a personal loan
    pub loan: bool,

    /// Audit fields
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

/// Contact entity - campaign contact details, exactly one per client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    #[serde(rename = "_id")]
    pub id: String,

    pub client_id: String,
    pub contact_type: ContactChannel,

    /// Day of month of the last contact
    pub day: i32,
    pub month: Month,

    /// Duration of the last contact in seconds
    pub duration: i32,

    /// Contacts performed during this campaign
    pub campaign: i32,

    /// Days since the client was last contacted (-1 = never)
    pub pdays: i32,

    /// Contacts performed before this campaign
    pub previous: i32,

    pub poutcome: Outcome,
}

/// Deposit entity - term-deposit subscription flag, exactly one per client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deposit {
    #[serde(rename = "_id")]
    pub id: String,

    pub client_id: String,
    pub deposit: bool,
}

/// BalanceLog entity - append-only audit trail of balance changes.
///
/// One entry is written at client creation and one more each time an update
/// actually changes the balance. Entries are never mutated; they are only
/// bulk-deleted together with the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceLog {
    #[serde(rename = "_id")]
    pub id: String,

    pub client_id: String,
    pub old_balance: f64,
    pub new_balance: f64,

    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub change_time: DateTime<Utc>,
}

impl BalanceLog {
    pub fn record(client_id: impl Into<String>, old_balance: f64, new_balance: f64) -> Self {
        Self {
            id: SurrogateKey::generate(),
            client_id: client_id.into(),
            old_balance,
            new_balance,
            change_time: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enum_wire_form_is_lowercase() {
        assert_eq!(serde_json::to_string(&Marital::Divorced).unwrap(), "\"divorced\"");
        assert_eq!(serde_json::to_string(&Month::Oct).unwrap(), "\"oct\"");
        assert_eq!(serde_json::to_string(&Outcome::Unknown).unwrap(), "\"unknown\"");
        let channel: ContactChannel = serde_json::from_str("\"cellular\"").unwrap();
        assert_eq!(channel, ContactChannel::Cellular);
    }

    #[test]
    fn test_enum_parse_round_trips() {
        for m in [Marital::Married, Marital::Single, Marital::Divorced] {
            assert_eq!(Marital::parse(m.as_str()), Some(m));
        }
        for e in [Education::Primary, Education::Secondary, Education::Tertiary, Education::Unknown] {
            assert_eq!(Education::parse(e.as_str()), Some(e));
        }
        for mo in [
            Month::Jan, Month::Feb, Month::Mar, Month::Apr, Month::May, Month::Jun,
            Month::Jul, Month::Aug, Month::Sep, Month::Oct, Month::Nov, Month::Dec,
        ] {
            assert_eq!(Month::parse(mo.as_str()), Some(mo));
        }
        assert_eq!(Marital::parse("widowed"), None);
        assert_eq!(Month::parse("january"), None);
    }

    #[test]
    fn test_client_default_field_serializes_as_default() {
        let client = Client {
            id: "0TESTCLIENT01".to_string(),
            age: 41,
            job: "technician".to_string(),
            marital: Marital::Married,
            education: Education::Secondary,
            default: false,
            balance: 1270.0,
            housing: true,
            loan: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let json = serde_json::to_value(&client).unwrap();
        assert_eq!(json["default"], serde_json::json!(false));
        assert_eq!(json["_id"], serde_json::json!("0TESTCLIENT01"));
    }

    #[test]
    fn test_balance_log_record() {
        let log = BalanceLog::record("client-1", 100.0, 250.5);
        assert_eq!(log.client_id, "client-1");
        assert_eq!(log.old_balance, 100.0);
        assert_eq!(log.new_balance, 250.5);
        assert_eq!(log.id.len(), 13);
    }
}
