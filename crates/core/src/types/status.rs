//! Status enums for catalog entities.

use serde::{Deserialize, Serialize};

/// Stock status of a product or variation.
///
/// Maps to the commerce backend's `stock_status` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum StockStatus {
    #[default]
    #[serde(rename = "instock")]
    InStock,
    #[serde(rename = "outofstock")]
    OutOfStock,
    #[serde(rename = "onbackorder")]
    OnBackorder,
}

impl StockStatus {
    /// Whether the item can currently be ordered.
    #[must_use]
    pub const fn is_purchasable(&self) -> bool {
        matches!(self, Self::InStock | Self::OnBackorder)
    }
}

impl std::fmt::Display for StockStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InStock => write!(f, "instock"),
            Self::OutOfStock => write!(f, "outofstock"),
            Self::OnBackorder => write!(f, "onbackorder"),
        }
    }
}

impl std::str::FromStr for StockStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "instock" => Ok(Self::InStock),
            "outofstock" => Ok(Self::OutOfStock),
            "onbackorder" => Ok(Self::OnBackorder),
            _ => Err(format!("invalid stock status: {s}")),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_stock_status_serde() {
        let json = serde_json::to_string(&StockStatus::OutOfStock).unwrap();
        assert_eq!(json, "\"outofstock\"");

        let parsed: StockStatus = serde_json::from_str("\"onbackorder\"").unwrap();
        assert_eq!(parsed, StockStatus::OnBackorder);
    }

    #[test]
    fn test_stock_status_purchasable() {
        assert!(StockStatus::InStock.is_purchasable());
        assert!(StockStatus::OnBackorder.is_purchasable());
        assert!(!StockStatus::OutOfStock.is_purchasable());
    }

    #[test]
    fn test_stock_status_round_trip_str() {
        for status in [
            StockStatus::InStock,
            StockStatus::OutOfStock,
            StockStatus::OnBackorder,
        ] {
            assert_eq!(status.to_string().parse::<StockStatus>().unwrap(), status);
        }
    }
}
