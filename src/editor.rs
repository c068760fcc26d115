//! The editing session: sole owner and writer of the invoice.

use chrono::NaiveDate;
use std::path::{Path, PathBuf};

use crate::currency::{self, Currency};
use crate::error::InvoiceError;
use crate::export::email::{EmailPayload, EmailTransport};
use crate::export::pdf::{self, PdfEngine, PdfOptions};
use crate::export::print::{self, PrintSurface};
use crate::logo::{LogoDecode, LogoError};
use crate::model::{Invoice, ItemChanges, LineItem, LogoImage, RecipientChanges, SenderChanges};
use crate::render::DocumentRenderer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Error,
}

/// A message for the user, shown once.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub title: String,
    pub description: String,
}

impl Notification {
    fn success(title: &str, description: &str) -> Self {
        Self {
            kind: NotificationKind::Success,
            title: title.to_string(),
            description: description.to_string(),
        }
    }

    fn error(title: &str, description: &str) -> Self {
        Self {
            kind: NotificationKind::Error,
            title: title.to_string(),
            description: description.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EmailDialog {
    pub open: bool,
    pub recipient: String,
}

pub struct InvoiceEditor {
    invoice: Invoice,
    renderer: DocumentRenderer,
    preview: Option<String>,
    email_dialog: EmailDialog,
    notifications: Vec<Notification>,
    next_item_id: u32,
    pending_logo: Option<LogoDecode>,
}

impl InvoiceEditor {
    /// Starts a session on a fresh default invoice.
    pub fn new(currency: Currency) -> Result<Self, InvoiceError> {
        Self::with_invoice(Invoice::for_session(currency))
    }

    pub fn with_invoice(invoice: Invoice) -> Result<Self, InvoiceError> {
        let next_item_id = invoice.items.iter().map(|i| i.id).max().unwrap_or(0) + 1;
        Ok(Self {
            invoice,
            renderer: DocumentRenderer::new()?,
            preview: None,
            email_dialog: EmailDialog::default(),
            notifications: Vec::new(),
            next_item_id,
            pending_logo: None,
        })
    }

    pub fn invoice(&self) -> &Invoice {
        &self.invoice
    }

    // ------------------------------------------
    // Line items
    // ------------------------------------------

    /// Appends a blank row and returns its id. Ids are never handed out twice.
    pub fn add_item(&mut self) -> u32 {
        let id = self.next_item_id;
        self.next_item_id += 1;
        self.invoice.items.push(LineItem::blank(id));
        id
    }

    /// Returns `false` (and changes nothing) when `id` is not on the invoice.
    pub fn remove_item(&mut self, id: u32) -> bool {
        let before = self.invoice.items.len();
        self.invoice.items.retain(|item| item.id != id);
        self.invoice.items.len() != before
    }

    pub fn update_item(&mut self, id: u32, changes: ItemChanges) -> bool {
        match self.invoice.items.iter_mut().find(|item| item.id == id) {
            Some(item) => {
                *item = changes.merged_into(item);
                true
            }
            None => false,
        }
    }

    // ------------------------------------------
    // Header fields
    // ------------------------------------------

    pub fn update_sender(&mut self, changes: SenderChanges) {
        let sender = &mut self.invoice.sender;
        if let Some(name) = changes.name {
            sender.name = name;
        }
        if let Some(company) = changes.company {
            sender.company = company;
        }
        if let Some(email) = changes.email {
            sender.email = email;
        }
    }

    pub fn update_recipient(&mut self, changes: RecipientChanges) {
        let recipient = &mut self.invoice.recipient;
        if let Some(name) = changes.name {
            recipient.name = name;
        }
        if let Some(email) = changes.email {
            recipient.email = email;
        }
    }

    pub fn set_invoice_number(&mut self, number: impl Into<String>) {
        self.invoice.invoice_number = number.into();
    }

    pub fn set_issue_date(&mut self, date: NaiveDate) {
        self.invoice.issue_date = date;
    }

    /// Switches currency; unknown codes are rejected and nothing changes.
    pub fn set_currency(&mut self, code: &str) -> Result<(), InvoiceError> {
        let currency =
            currency::lookup(code).ok_or_else(|| InvoiceError::UnknownCurrency(code.to_string()))?;
        self.invoice.currency = currency;
        Ok(())
    }

    pub fn set_terms(&mut self, terms: impl Into<String>) {
        self.invoice.terms = terms.into();
    }

    pub fn set_notes(&mut self, notes: impl Into<String>) {
        self.invoice.notes = notes.into();
    }

    // ------------------------------------------
    // Logo
    // ------------------------------------------

    /// Starts decoding `path` in the background. A newer call supersedes a
    /// pending one. The invoice only changes once the decode is installed by
    /// [`poll_logo`](Self::poll_logo) or [`wait_logo`](Self::wait_logo).
    pub fn set_logo(&mut self, path: impl Into<PathBuf>) {
        if let Some(previous) = self.pending_logo.take() {
            tracing::debug!("Superseding logo decode of {:?}", previous.path());
            previous.cancel();
        }
        self.pending_logo = Some(LogoDecode::start(path));
    }

    pub fn has_pending_logo(&self) -> bool {
        self.pending_logo.is_some()
    }

    /// Installs a finished decode. Returns `true` if the logo changed.
    pub fn poll_logo(&mut self) -> bool {
        let Some(result) = self.pending_logo.as_ref().and_then(|task| task.try_take()) else {
            return false;
        };
        self.pending_logo = None;
        self.install_logo(result)
    }

    /// Blocks until the pending decode (if any) finishes, then installs it.
    pub fn wait_logo(&mut self) -> bool {
        match self.pending_logo.take() {
            Some(task) => {
                let result = task.wait();
                self.install_logo(result)
            }
            None => false,
        }
    }

    pub fn clear_logo(&mut self) {
        if let Some(task) = self.pending_logo.take() {
            task.cancel();
        }
        self.invoice.logo = None;
    }

    fn install_logo(&mut self, result: Result<LogoImage, LogoError>) -> bool {
        match result {
            Ok(logo) => {
                self.invoice.logo = Some(logo);
                true
            }
            Err(LogoError::Cancelled) => false,
            Err(e) => {
                tracing::warn!("Logo decode failed: {}", e);
                self.notifications
                    .push(Notification::error("Logo Error", &e.to_string()));
                false
            }
        }
    }

    // ------------------------------------------
    // Preview & exports
    // ------------------------------------------

    /// Renders the current invoice and keeps the markup for display.
    pub fn preview(&mut self) -> Result<&str, InvoiceError> {
        let markup = self.renderer.render(&self.invoice)?;
        Ok(self.preview.insert(markup).as_str())
    }

    pub fn preview_markup(&self) -> Option<&str> {
        self.preview.as_deref()
    }

    pub fn close_preview(&mut self) {
        self.preview = None;
    }

    pub fn render(&self) -> Result<String, InvoiceError> {
        Ok(self.renderer.render(&self.invoice)?)
    }

    /// Prints through `surface`; a missing surface is silently ignored.
    pub fn print(&self, surface: &dyn PrintSurface) -> Result<(), InvoiceError> {
        let markup = self.render()?;
        print::print(surface, &self.invoice.invoice_number, &markup);
        Ok(())
    }

    pub fn export_pdf(&self, engine: &dyn PdfEngine, output_dir: &Path) -> Result<PathBuf, InvoiceError> {
        let markup = self.render()?;
        let options = PdfOptions::for_invoice(&self.invoice);
        Ok(pdf::export_pdf(engine, &markup, &options, output_dir)?)
    }

    // ------------------------------------------
    // Email dialog
    // ------------------------------------------

    pub fn email_dialog(&self) -> &EmailDialog {
        &self.email_dialog
    }

    pub fn open_email_dialog(&mut self) {
        self.email_dialog.open = true;
    }

    pub fn close_email_dialog(&mut self) {
        self.email_dialog.open = false;
    }

    pub fn set_email_recipient(&mut self, to: impl Into<String>) {
        self.email_dialog.recipient = to.into();
    }

    /// Sends the invoice to the drafted recipient. On success the dialog
    /// closes; on failure it stays open with the draft intact.
    pub fn send_email(&mut self, transport: &dyn EmailTransport) -> bool {
        let payload = EmailPayload {
            to: &self.email_dialog.recipient,
            invoice_data: &self.invoice,
        };
        match transport.send(&payload) {
            Ok(()) => {
                self.notifications.push(Notification::success(
                    "Email Sent",
                    "The invoice has been sent successfully.",
                ));
                self.email_dialog.open = false;
                true
            }
            Err(e) => {
                tracing::error!("Failed to send invoice {}: {}", self.invoice.invoice_number, e);
                self.notifications.push(Notification::error(
                    "Error",
                    "Failed to send the invoice. Please try again.",
                ));
                false
            }
        }
    }

    // ------------------------------------------
    // Notifications
    // ------------------------------------------

    pub fn take_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.notifications)
    }
}
