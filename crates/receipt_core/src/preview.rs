//! Payload of the backend `token-preview` function.

use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenPreview {
    pub token: TokenInfo,
    pub receipt: Receipt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenStatus {
    Active,
    Consumed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenInfo {
    pub token_id: String,
    pub status: TokenStatus,
    #[serde(default)]
    pub consumed_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Receipt {
    pub issued_at: String,
    pub retailer_id: String,
    #[serde(default)]
    pub store_id: Option<String>,
    pub currency: String,
    #[serde(deserialize_with = "lenient_amount")]
    pub subtotal: f64,
    #[serde(deserialize_with = "lenient_amount")]
    pub vat_total: f64,
    #[serde(deserialize_with = "lenient_amount")]
    pub total: f64,
    #[serde(default)]
    pub items: Vec<ReceiptItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReceiptItem {
    pub line_no: u32,
    #[serde(default)]
    pub sku: Option<String>,
    pub name: String,
    #[serde(deserialize_with = "lenient_amount")]
    pub qty: f64,
    #[serde(deserialize_with = "lenient_amount")]
    pub unit_price: f64,
    #[serde(deserialize_with = "lenient_amount")]
    pub line_total: f64,
    #[serde(default, deserialize_with = "lenient_optional_amount")]
    pub vat_rate: Option<f64>,
    #[serde(default, deserialize_with = "lenient_optional_amount")]
    pub vat_amount: Option<f64>,
}

impl TokenPreview {
    pub fn is_consumed(&self) -> bool {
        self.token.status == TokenStatus::Consumed
    }
}

/// Body of a non-2xx response.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Formats an amount with two decimals followed by the currency code.
///
/// Rounds to whole cents, half away from zero, as Postgres rounds
/// `numeric` values: `0.125` shows as `0.13`.
pub fn format_money(amount: f64, currency: &str) -> String {
    let cents = (amount * 100.0).round();
    // Avoid "-0.00" for tiny negative amounts.
    let cents = if cents == 0.0 { 0.0 } else { cents };
    format!("{:.2} {currency}", cents / 100.0)
}

/// Database decimals arrive either as JSON numbers or as numeric strings.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawAmount {
    Number(f64),
    Text(String),
}

impl RawAmount {
    fn into_f64<E: serde::de::Error>(self) -> Result<f64, E> {
        match self {
            RawAmount::Number(value) => Ok(value),
            RawAmount::Text(text) => text
                .trim()
                .parse::<f64>()
                .map_err(|_| E::custom(format!("invalid amount {text:?}"))),
        }
    }
}

fn lenient_amount<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    RawAmount::deserialize(deserializer)?.into_f64()
}

fn lenient_optional_amount<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<RawAmount>::deserialize(deserializer)?
        .map(RawAmount::into_f64)
        .transpose()
}
