//! Invoice → HTML document.
//!
//! The markup produced here is shared by every output channel (preview, print
//! and PDF), so what the user previews is what gets printed. All user text is
//! HTML-escaped by the template engine.

use std::sync::LazyLock;

use serde::Serialize;
use tera::{Context, Tera};
use thiserror::Error;

use crate::input::display_quantity;
use crate::ledger::{grand_total, line_total};
use crate::model::{Invoice, Recipient, Sender};

// Embed template at compile time to ensure availability
const INVOICE_TEMPLATE: &str = include_str!("../templates/invoice.html.tera");
const TEMPLATE_NAME: &str = "invoice.html";

#[derive(Debug, Error)]
#[error("Template error: {0}")]
pub struct RenderError(#[from] tera::Error);

#[derive(Serialize)]
struct RowContext<'a> {
    name: &'a str,
    description: &'a str,
    quantity: String,
    price: String,
    total: String,
}

#[derive(Serialize)]
struct DocumentContext<'a> {
    logo: Option<&'a str>,
    invoice_number: &'a str,
    date: String,
    sender: &'a Sender,
    recipient: &'a Recipient,
    rows: Vec<RowContext<'a>>,
    total: String,
    terms: &'a str,
    notes: &'a str,
}

impl<'a> DocumentContext<'a> {
    fn from_invoice(invoice: &'a Invoice) -> Self {
        let currency = invoice.currency;
        let rows = invoice
            .items
            .iter()
            .map(|item| RowContext {
                name: &item.name,
                description: &item.description,
                quantity: display_quantity(item.quantity),
                price: currency.format_amount(item.unit_price),
                total: currency.format_amount(line_total(item)),
            })
            .collect();

        Self {
            logo: invoice.logo.as_ref().map(|l| l.as_str()),
            invoice_number: &invoice.invoice_number,
            date: invoice.issue_date.format("%Y-%m-%d").to_string(),
            sender: &invoice.sender,
            recipient: &invoice.recipient,
            rows,
            total: currency.format_amount(grand_total(&invoice.items)),
            terms: &invoice.terms,
            notes: &invoice.notes,
        }
    }
}

/// Holds the compiled invoice template.
pub struct DocumentRenderer {
    tera: Tera,
}

impl DocumentRenderer {
    pub fn new() -> Result<Self, RenderError> {
        let mut tera = Tera::default();
        tera.autoescape_on(vec![".html"]);
        tera.add_raw_template(TEMPLATE_NAME, INVOICE_TEMPLATE)?;
        Ok(Self { tera })
    }

    pub fn render(&self, invoice: &Invoice) -> Result<String, RenderError> {
        let context = Context::from_serialize(DocumentContext::from_invoice(invoice))?;
        let markup = self.tera.render(TEMPLATE_NAME, &context)?;
        tracing::debug!(
            invoice = %invoice.invoice_number,
            rows = invoice.items.len(),
            bytes = markup.len(),
            "Rendered invoice document"
        );
        Ok(markup)
    }
}

// tera::Error is not Clone, so a failed build is kept as its message.
static SHARED_RENDERER: LazyLock<Result<DocumentRenderer, String>> =
    LazyLock::new(|| DocumentRenderer::new().map_err(|e| e.to_string()));

/// Renders with a process-wide renderer built on first use.
pub fn render_invoice(invoice: &Invoice) -> Result<String, RenderError> {
    match &*SHARED_RENDERER {
        Ok(renderer) => renderer.render(invoice),
        Err(msg) => Err(RenderError(tera::Error::msg(msg.clone()))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::currency;
    use crate::model::{LineItem, LogoImage};
    use chrono::NaiveDate;

    fn invoice(code: &str) -> Invoice {
        let date = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        let mut invoice = Invoice::new("INV-1001", date, currency::lookup(code).unwrap());
        invoice.items.clear();
        invoice
    }

    fn item(id: u32, name: &str, quantity: f64, unit_price: f64) -> LineItem {
        LineItem {
            name: name.to_string(),
            quantity,
            unit_price,
            ..LineItem::blank(id)
        }
    }

    #[test]
    fn test_single_widget_usd() {
        let mut inv = invoice("USD");
        inv.items.push(item(1, "Widget", 3.0, 10.0));
        let html = render_invoice(&inv).unwrap();
        assert!(html.contains("Total: $30.00"));
        assert!(html.contains(">$30.00</td>"));
        assert!(html.contains(">$10.00</td>"));
        assert!(html.contains(">3</td>"));
        assert!(html.contains(">Widget</td>"));
    }

    #[test]
    fn test_two_items_eur() {
        let mut inv = invoice("EUR");
        inv.items.push(item(1, "Hours", 2.0, 5.5));
        inv.items.push(item(2, "Licence", 1.0, 100.0));
        let html = render_invoice(&inv).unwrap();
        assert!(html.contains("Total: €111.00"));
        assert!(html.contains(">€11.00</td>"));
        assert!(html.contains(">€100.00</td>"));
    }

    #[test]
    fn test_render_is_deterministic() {
        let mut inv = invoice("GBP");
        inv.items.push(item(1, "Consulting", 1.5, 80.0));
        inv.terms = "Net 30".to_string();
        let renderer = DocumentRenderer::new().unwrap();
        assert_eq!(renderer.render(&inv).unwrap(), renderer.render(&inv).unwrap());
    }

    #[test]
    fn test_shared_renderer_matches_fresh_one() {
        let mut inv = invoice("CHF");
        inv.items.push(item(1, "Audit", 2.0, 450.0));
        let shared = render_invoice(&inv).unwrap();
        assert!(SHARED_RENDERER.is_ok());
        assert_eq!(render_invoice(&inv).unwrap(), shared);
        assert_eq!(DocumentRenderer::new().unwrap().render(&inv).unwrap(), shared);
    }

    #[test]
    fn test_logo_block_only_when_present() {
        let mut inv = invoice("USD");
        assert!(!render_invoice(&inv).unwrap().contains("<img"));

        inv.logo = Some(LogoImage::from_data_uri("data:image/png;base64,iVBORw0KGgo="));
        let html = render_invoice(&inv).unwrap();
        assert!(html.contains("<img"));
        assert!(html.contains("iVBORw0KGgo="));
    }

    #[test]
    fn test_section_order() {
        let mut inv = invoice("USD");
        inv.items.push(item(1, "Widget", 1.0, 1.0));
        inv.logo = Some(LogoImage::from_data_uri("data:image/png;base64,AA=="));
        let html = render_invoice(&inv).unwrap();

        let positions: Vec<usize> = [
            "<img", "From", "INVOICE", "Bill To", "<th", "Total: ", "Terms", "Notes",
        ]
        .iter()
        .map(|needle| html.find(needle).unwrap())
        .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]), "{:?}", positions);
    }

    #[test]
    fn test_headers_and_metadata() {
        let mut inv = invoice("USD");
        inv.sender.name = "Ada".to_string();
        inv.sender.company = "Engines Ltd".to_string();
        inv.recipient.email = "bob@example.com".to_string();
        let html = render_invoice(&inv).unwrap();
        for header in ["Item", "Description", "Quantity", "Price", "Total"] {
            assert!(html.contains(&format!(">{}</th>", header)));
        }
        assert!(html.contains(">INV-1001</p>"));
        assert!(html.contains("Date: 2024-03-15"));
        assert!(html.contains(">Engines Ltd</p>"));
        assert!(html.contains(">bob@example.com</p>"));
    }

    #[test]
    fn test_empty_fields_still_render() {
        let html = render_invoice(&invoice("USD")).unwrap();
        assert!(html.contains("Total: $0.00"));
        assert!(html.contains("Terms"));
        assert!(html.contains("Notes"));
        assert!(html.contains("<p style=\"margin: 5px 0;\"></p>"));
    }

    #[test]
    fn test_zero_quantity_negative_price_row() {
        let mut inv = invoice("USD");
        inv.items.push(item(1, "Refund", 0.0, -5.0));
        let html = render_invoice(&inv).unwrap();
        assert!(!html.contains("$-0.00"));
        assert!(html.contains(">$0.00</td>"));
        assert!(html.contains("Total: $0.00"));
    }

    #[test]
    fn test_user_text_is_escaped() {
        let mut inv = invoice("USD");
        inv.notes = "<script>alert(1)</script>".to_string();
        let html = render_invoice(&inv).unwrap();
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn test_grand_total_matches_row_totals() {
        let mut inv = invoice("USD");
        inv.items.push(item(1, "A", 2.0, 12.25));
        inv.items.push(item(2, "B", 4.0, 0.5));
        inv.items.push(item(3, "C", 1.0, 99.0));
        let html = render_invoice(&inv).unwrap();

        let row_sum: f64 = inv
            .items
            .iter()
            .map(|i| {
                let shown = inv.currency.format_amount(line_total(i));
                assert!(html.contains(&shown));
                shown.trim_start_matches('$').parse::<f64>().unwrap()
            })
            .sum();
        assert_eq!(row_sum, grand_total(&inv.items));
        assert!(html.contains(&format!("Total: {}", inv.currency.format_amount(row_sum))));
    }
}
