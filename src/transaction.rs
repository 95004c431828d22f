//! Ledger transactions

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const TIME_FORMAT: &str = "%H:%M:%S";

/// A single recorded transaction.
///
/// Field values are taken as given: the ledger does not validate the amount's
/// sign or range, nor the uniqueness of `transaction_number`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub name: String,
    pub transaction_number: String,
    #[serde(with = "amount_format")]
    pub amount: f64,
    pub date: String,
    pub time: String,
}

impl Transaction {
    /// Record a transaction stamped with the current local date and time.
    pub fn new(name: impl Into<String>, transaction_number: impl Into<String>, amount: f64) -> Self {
        Self::at(name, transaction_number, amount, Local::now())
    }

    pub fn at(
        name: impl Into<String>,
        transaction_number: impl Into<String>,
        amount: f64,
        captured: DateTime<Local>,
    ) -> Self {
        Transaction {
            name: name.into(),
            transaction_number: transaction_number.into(),
            amount,
            date: captured.format(DATE_FORMAT).to_string(),
            time: captured.format(TIME_FORMAT).to_string(),
        }
    }

    /// JSON object with sorted keys, used as this transaction's contribution
    /// to a block hash.
    pub fn canonical_value(&self) -> Value {
        // serde_json::Map is BTreeMap-backed, so keys serialize sorted.
        json!({
            "amount": amount_format::to_value(self.amount),
            "date": self.date,
            "name": self.name,
            "time": self.time,
            "transaction_number": self.transaction_number,
        })
    }
}

/// Amounts are JSON numbers when finite. NaN and the infinities have no JSON
/// number form, so they are written as the tokens `"NaN"`, `"inf"` and
/// `"-inf"`, both on the wire and in the hash preimage.
mod amount_format {
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};
    use serde_json::Value;

    const NAN: &str = "NaN";
    const INFINITY: &str = "inf";
    const NEG_INFINITY: &str = "-inf";

    fn token(amount: f64) -> Option<&'static str> {
        if amount.is_nan() {
            Some(NAN)
        } else if amount == f64::INFINITY {
            Some(INFINITY)
        } else if amount == f64::NEG_INFINITY {
            Some(NEG_INFINITY)
        } else {
            None
        }
    }

    pub fn to_value(amount: f64) -> Value {
        match token(amount) {
            Some(t) => Value::from(t),
            None => Value::from(amount),
        }
    }

    pub fn serialize<S: Serializer>(amount: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        match token(*amount) {
            Some(t) => serializer.serialize_str(t),
            None => serializer.serialize_f64(*amount),
        }
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Encoded {
        Number(f64),
        Token(String),
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        match Encoded::deserialize(deserializer)? {
            Encoded::Number(n) => Ok(n),
            Encoded::Token(t) => match t.as_str() {
                NAN => Ok(f64::NAN),
                INFINITY => Ok(f64::INFINITY),
                NEG_INFINITY => Ok(f64::NEG_INFINITY),
                other => Err(D::Error::custom(format!("invalid amount: {:?}", other))),
            },
        }
    }
}
