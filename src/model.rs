use chrono::{Local, NaiveDate};
use rand::Rng;
use serde::Serialize;

use crate::currency::{Currency, DEFAULT_CURRENCY};
use crate::export::safe_file_stem;

#[derive(Debug, Serialize, Clone, Default, PartialEq)]
pub struct Sender {
    pub name: String,
    pub company: String,
    pub email: String,
}

#[derive(Debug, Serialize, Clone, Default, PartialEq)]
pub struct Recipient {
    pub name: String,
    pub email: String,
}

/// Partial update for [`Sender`]; `None` leaves the field as it is.
#[derive(Debug, Clone, Default)]
pub struct SenderChanges {
    pub name: Option<String>,
    pub company: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct RecipientChanges {
    pub name: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct LineItem {
    pub id: u32,
    pub name: String,
    pub description: String,
    pub quantity: f64,
    #[serde(rename = "price")]
    pub unit_price: f64,
}

impl LineItem {
    /// A fresh row: one unit at zero price.
    pub fn blank(id: u32) -> Self {
        Self {
            id,
            name: String::new(),
            description: String::new(),
            quantity: 1.0,
            unit_price: 0.0,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ItemChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub quantity: Option<f64>,
    pub unit_price: Option<f64>,
}

impl ItemChanges {
    pub fn unit_price(value: f64) -> Self {
        Self { unit_price: Some(value), ..Self::default() }
    }

    pub fn quantity(value: f64) -> Self {
        Self { quantity: Some(value), ..Self::default() }
    }

    /// Copy of `item` with the present fields replaced.
    pub(crate) fn merged_into(&self, item: &LineItem) -> LineItem {
        LineItem {
            id: item.id,
            name: self.name.clone().unwrap_or_else(|| item.name.clone()),
            description: self.description.clone().unwrap_or_else(|| item.description.clone()),
            quantity: self.quantity.unwrap_or(item.quantity),
            unit_price: self.unit_price.unwrap_or(item.unit_price),
        }
    }
}

/// An image embedded as a `data:` URI.
#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(transparent)]
pub struct LogoImage(String);

impl LogoImage {
    pub fn from_data_uri(uri: impl Into<String>) -> Self {
        Self(uri.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    pub logo: Option<LogoImage>,
    pub invoice_number: String,
    #[serde(rename = "date")]
    pub issue_date: NaiveDate,
    #[serde(rename = "fromDetails")]
    pub sender: Sender,
    #[serde(rename = "billTo")]
    pub recipient: Recipient,
    pub items: Vec<LineItem>,
    pub terms: String,
    pub notes: String,
    pub currency: Currency,
}

impl Invoice {
    /// Empty invoice with a single blank row.
    pub fn new(invoice_number: impl Into<String>, issue_date: NaiveDate, currency: Currency) -> Self {
        Self {
            logo: None,
            invoice_number: invoice_number.into(),
            issue_date,
            sender: Sender::default(),
            recipient: Recipient::default(),
            items: vec![LineItem::blank(1)],
            terms: String::new(),
            notes: String::new(),
            currency,
        }
    }

    /// Today's invoice with a randomized `INV-` number.
    pub fn for_session(currency: Currency) -> Self {
        Self::new(random_invoice_number(), Local::now().date_naive(), currency)
    }

    pub fn item(&self, id: u32) -> Option<&LineItem> {
        self.items.iter().find(|i| i.id == id)
    }

    /// Invoice number reduced to a single path component.
    pub fn file_stem(&self) -> String {
        safe_file_stem(&self.invoice_number)
    }

    /// File name used for the PDF export.
    pub fn pdf_filename(&self) -> String {
        format!("{}.pdf", self.file_stem())
    }
}

impl Default for Invoice {
    fn default() -> Self {
        Self::for_session(DEFAULT_CURRENCY)
    }
}

pub fn random_invoice_number() -> String {
    let n: u32 = rand::thread_rng().gen_range(0..1_000_000);
    format!("INV-{}", n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::currency;

    fn sample() -> Invoice {
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        Invoice::new("INV-42", date, currency::lookup("EUR").unwrap())
    }

    #[test]
    fn test_new_invoice_has_one_blank_row() {
        let invoice = sample();
        assert_eq!(invoice.items, vec![LineItem::blank(1)]);
        assert!(invoice.logo.is_none());
        assert_eq!(invoice.sender, Sender::default());
    }

    #[test]
    fn test_random_invoice_number_shape() {
        let number = random_invoice_number();
        let digits = number.strip_prefix("INV-").unwrap();
        assert!(digits.parse::<u32>().unwrap() < 1_000_000);
    }

    #[test]
    fn test_item_changes_merge_only_present_fields() {
        let mut item = LineItem::blank(7);
        item.name = "Widget".to_string();
        let merged = ItemChanges::unit_price(9.99).merged_into(&item);
        assert_eq!(merged.id, 7);
        assert_eq!(merged.name, "Widget");
        assert_eq!(merged.quantity, 1.0);
        assert_eq!(merged.unit_price, 9.99);
    }

    #[test]
    fn test_serialized_field_names() {
        let mut invoice = sample();
        invoice.logo = Some(LogoImage::from_data_uri("data:image/png;base64,AA=="));
        let json = serde_json::to_value(&invoice).unwrap();
        assert_eq!(json["invoiceNumber"], "INV-42");
        assert_eq!(json["date"], "2024-05-01");
        assert_eq!(json["logo"], "data:image/png;base64,AA==");
        assert_eq!(json["fromDetails"]["company"], "");
        assert_eq!(json["billTo"]["email"], "");
        assert_eq!(json["items"][0]["price"], 0.0);
        assert_eq!(json["currency"]["symbol"], "€");
    }

    #[test]
    fn test_pdf_filename() {
        assert_eq!(sample().pdf_filename(), "INV-42.pdf");
    }

    #[test]
    fn test_pdf_filename_stays_one_component() {
        let mut invoice = sample();
        invoice.invoice_number = "../../outside".to_string();
        assert_eq!(invoice.pdf_filename(), ".._.._outside.pdf");

        invoice.invoice_number = "/tmp/x".to_string();
        assert_eq!(invoice.pdf_filename(), "_tmp_x.pdf");

        invoice.invoice_number = String::new();
        assert_eq!(invoice.pdf_filename(), "invoice.pdf");
    }
}
