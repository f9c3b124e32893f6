//! Pure conversions from Coinbase wire types into scanner types.

use std::collections::BTreeSet;

use market::Pair;

use super::errors::CoinbaseError;
use super::types::{Product, SpotEnvelope};

/// Spot amount as a finite, strictly positive price.
pub fn parse_spot_price(envelope: &SpotEnvelope) -> Result<f64, CoinbaseError> {
    let price: f64 = envelope.data.amount.trim().parse()?;
    if !price.is_finite() || price <= 0.0 {
        return Err(CoinbaseError::InvalidResponse(format!(
            "non-positive spot amount {:?}",
            envelope.data.amount
        )));
    }
    Ok(price)
}

/// Base symbols of enabled products quoted in `quote`, sorted and unique.
pub fn select_quoted_pairs(products: &[Product], quote: &str) -> Vec<Pair> {
    products
        .iter()
        .filter(|p| !p.trading_disabled && p.quote_currency.eq_ignore_ascii_case(quote))
        .filter_map(|p| Pair::parse(&p.base_currency))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
