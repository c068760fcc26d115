use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Currency {
    pub code: &'static str,
    pub symbol: &'static str,
    pub name: &'static str,
}

impl Currency {
    const fn new(code: &'static str, symbol: &'static str, name: &'static str) -> Self {
        Self { code, symbol, name }
    }

    /// `$30.00`, `€111.00`, ...
    pub fn format_amount(&self, amount: f64) -> String {
        // -0.0 + 0.0 is +0.0
        format!("{}{:.2}", self.symbol, amount + 0.0)
    }
}

pub const CURRENCIES: [Currency; 10] = [
    Currency::new("USD", "$", "US Dollar"),
    Currency::new("INR", "₹", "Indian Rupee"),
    Currency::new("EUR", "€", "Euro"),
    Currency::new("GBP", "£", "British Pound"),
    Currency::new("JPY", "¥", "Japanese Yen"),
    Currency::new("CAD", "C$", "Canadian Dollar"),
    Currency::new("AUD", "A$", "Australian Dollar"),
    Currency::new("CHF", "CHF", "Swiss Franc"),
    Currency::new("CNY", "¥", "Chinese Yuan"),
    Currency::new("SGD", "S$", "Singapore Dollar"),
];

/// Fallback for codes that are not in the catalog (first entry).
pub const DEFAULT_CURRENCY: Currency = CURRENCIES[0];

pub fn lookup(code: &str) -> Option<Currency> {
    CURRENCIES.iter().copied().find(|c| c.code == code)
}

/// Like [`lookup`], but falls back to [`DEFAULT_CURRENCY`].
pub fn lookup_or_default(code: &str) -> Currency {
    lookup(code).unwrap_or_else(|| {
        tracing::warn!("Unknown currency code '{}', using {}", code, DEFAULT_CURRENCY.code);
        DEFAULT_CURRENCY
    })
}
