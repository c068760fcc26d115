use thiserror::Error;

use crate::export::PdfError;
use crate::render::RenderError;

#[derive(Debug, Error)]
pub enum InvoiceError {
    #[error("Unknown currency code: {0}")]
    UnknownCurrency(String),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Pdf(#[from] PdfError),
}
