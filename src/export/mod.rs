//! Output channels for a rendered invoice: print, PDF and email. Preview needs
//! no adapter; the editor keeps the rendered markup itself.

pub mod email;
pub mod pdf;
pub mod print;

pub use email::{EmailError, EmailPayload, EmailTransport, HttpEmailTransport};
pub use pdf::{PdfEngine, PdfError, PdfOptions, WkHtmlToPdf};
pub use print::{BrowserPrintSurface, PrintDocument, PrintSurface};

/// Maps `name` onto something usable as a single file name component.
///
/// ASCII alphanumerics, `-`, `_` and `.` are kept, everything else becomes
/// `_`. A result made only of dots would still walk the tree, so it falls
/// back to `invoice` like an empty one.
pub fn safe_file_stem(name: &str) -> String {
    let stem: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();

    if stem.chars().all(|c| c == '.') {
        "invoice".to_string()
    } else {
        stem
    }
}
