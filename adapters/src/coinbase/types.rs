use serde::Deserialize;

/// `GET /v2/prices/{product}/spot`
#[derive(Debug, Deserialize)]
pub struct SpotEnvelope {
    pub data: SpotPrice,
}

#[derive(Debug, Deserialize)]
pub struct SpotPrice {
    /// Decimal string, e.g. `"30500.12"`.
    pub amount: String,
    #[serde(default)]
    pub base: Option<String>,
    #[serde(default)]
    pub currency: Option<String>,
}

/// One element of `GET /products`.
#[derive(Debug, Deserialize)]
pub struct Product {
    pub id: Option<String>,
    pub base_currency: String,
    pub quote_currency: String,
    #[serde(default)]
    pub trading_disabled: bool,
}
