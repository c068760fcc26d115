//! Build an invoice, preview it, and send it out as a print job, a PDF, or an
//! email.

pub mod config;
pub mod currency;
pub mod editor;
pub mod error;
pub mod export;
pub mod input;
pub mod ledger;
pub mod logo;
pub mod model;
pub mod render;

pub use currency::{CURRENCIES, Currency};
pub use editor::{EmailDialog, InvoiceEditor, Notification, NotificationKind};
pub use error::InvoiceError;
pub use model::{Invoice, ItemChanges, LineItem, LogoImage, Recipient, RecipientChanges, Sender, SenderChanges};
pub use render::{DocumentRenderer, RenderError, render_invoice};
