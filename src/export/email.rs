use reqwest::blocking::Client;
use serde::Serialize;
use thiserror::Error;

use crate::model::Invoice;

pub const DEFAULT_EMAIL_ENDPOINT: &str = "http://localhost:3000/api/send-invoice";

#[derive(Debug, Error)]
pub enum EmailError {
    #[error("Email endpoint rejected the request with status {0}")]
    Rejected(u16),

    #[error("Email request failed: {0}")]
    Transport(String),
}

/// Request body for the send endpoint: the whole invoice, not the markup.
#[derive(Debug, Serialize)]
pub struct EmailPayload<'a> {
    pub to: &'a str,
    #[serde(rename = "invoiceData")]
    pub invoice_data: &'a Invoice,
}

pub trait EmailTransport {
    /// One attempt; no retries.
    fn send(&self, payload: &EmailPayload<'_>) -> Result<(), EmailError>;
}

pub struct HttpEmailTransport {
    client: Client,
    endpoint: String,
}

impl HttpEmailTransport {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl EmailTransport for HttpEmailTransport {
    fn send(&self, payload: &EmailPayload<'_>) -> Result<(), EmailError> {
        tracing::info!(
            "Sending invoice {} to {} via {}",
            payload.invoice_data.invoice_number,
            payload.to,
            self.endpoint
        );

        let response = self
            .client
            .post(&self.endpoint)
            .json(payload)
            .send()
            .map_err(|e| {
                tracing::error!("Failed to send POST request to {}: {}", self.endpoint, e);
                EmailError::Transport(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!("Email endpoint {} answered {}", self.endpoint, status);
            return Err(EmailError::Rejected(status.as_u16()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::currency::DEFAULT_CURRENCY;
    use chrono::NaiveDate;

    #[test]
    fn test_payload_shape() {
        let invoice = Invoice::new("INV-5", NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(), DEFAULT_CURRENCY);
        let payload = EmailPayload { to: "ap@example.com", invoice_data: &invoice };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["to"], "ap@example.com");
        assert_eq!(json["invoiceData"]["invoiceNumber"], "INV-5");
        assert_eq!(json["invoiceData"]["currency"]["code"], "USD");
        assert_eq!(json["invoiceData"]["items"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_unreachable_endpoint_is_transport_error() {
        let invoice = Invoice::new("INV-5", NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(), DEFAULT_CURRENCY);
        let transport = HttpEmailTransport::new("http://127.0.0.1:9/api/send-invoice");
        let err = transport
            .send(&EmailPayload { to: "ap@example.com", invoice_data: &invoice })
            .unwrap_err();
        assert!(matches!(err, EmailError::Transport(_)));
    }
}
