use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::errors::{DeskError, DeskResult};

/// Static terms of a treasury security. Identity is the CUSIP; never mutated
/// after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bond {
    pub cusip: String,
    pub ticker: String,
    /// Annual coupon as a decimal fraction (0.04125 = 4.125%).
    pub coupon: f64,
    /// Maturity date, ISO `YYYY-MM-DD`.
    pub maturity: String,
}

/// Read-only reference catalog, passed explicitly to whatever needs product
/// lookups. There is no process-wide product table.
pub struct ProductCatalog {
    bonds: HashMap<String, Bond>,
}

impl ProductCatalog {
    pub fn new(bonds: Vec<Bond>) -> Self {
        let bonds = bonds.into_iter().map(|b| (b.cusip.clone(), b)).collect();
        Self { bonds }
    }

    /// The seven on-the-run US Treasuries the desk trades.
    /// Source: treasurydirect.gov auction results.
    pub fn on_the_run() -> Self {
        let terms: [(&str, f64, &str); 7] = [
            ("91282CFX4", 0.04505, "2024-11-30"), // 2Y
            ("91282CFW6", 0.04093, "2025-11-15"), // 3Y
            ("91282CFZ9", 0.03974, "2027-11-30"), // 5Y
            ("91282CFY2", 0.03890, "2029-11-30"), // 7Y
            ("91282CFV8", 0.04125, "2032-11-15"), // 10Y
            ("912810TM0", 0.03935, "2042-11-15"), // 20Y
            ("912810TL2", 0.03513, "2052-11-15"), // 30Y
        ];
        Self::new(
            terms
                .into_iter()
                .map(|(cusip, coupon, maturity)| Bond {
                    cusip: cusip.to_string(),
                    ticker: "T".to_string(),
                    coupon,
                    maturity: maturity.to_string(),
                })
                .collect(),
        )
    }

    pub fn get(&self, cusip: &str) -> DeskResult<&Bond> {
        self.bonds.get(cusip).ok_or_else(|| DeskError::UnknownProduct(cusip.to_string()))
    }

    pub fn contains(&self, cusip: &str) -> bool {
        self.bonds.contains_key(cusip)
    }

    pub fn cusips(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.bonds.keys().map(String::as_str).collect();
        ids.sort();
        ids
    }
}
