use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

use super::safe_file_stem;

/// Somewhere a fresh document can be opened for printing.
pub trait PrintSurface {
    /// `None` when the environment cannot provide a new document.
    fn open(&self, title: &str) -> Option<Box<dyn PrintDocument>>;
}

pub trait PrintDocument {
    fn write(&mut self, markup: &str) -> io::Result<()>;
    /// Closes the document and brings up the print dialog.
    fn print(self: Box<Self>) -> io::Result<()>;
}

/// Writes `markup` into a new document on `surface` and asks for a print.
///
/// Every failure is swallowed; an unavailable surface makes this a no-op.
pub fn print(surface: &dyn PrintSurface, title: &str, markup: &str) {
    let Some(mut document) = surface.open(title) else {
        tracing::debug!("No print surface available, skipping print");
        return;
    };
    if let Err(e) = document.write(markup) {
        tracing::debug!("Print document write failed: {}", e);
        return;
    }
    if let Err(e) = document.print() {
        tracing::debug!("Print dialog failed to open: {}", e);
    }
}

/// Wraps a rendered invoice in a standalone page that prints itself on load.
pub fn printable_page(title: &str, markup: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n</head>\n<body onload=\"window.print()\">\n{}\n</body>\n</html>\n",
        tera::escape_html(title),
        markup
    )
}

/// Opens the page in the system browser through the platform opener.
pub struct BrowserPrintSurface {
    scratch_dir: PathBuf,
}

impl BrowserPrintSurface {
    pub fn new(scratch_dir: impl Into<PathBuf>) -> Self {
        Self {
            scratch_dir: scratch_dir.into(),
        }
    }
}

impl Default for BrowserPrintSurface {
    fn default() -> Self {
        Self::new(std::env::temp_dir().join("invoice-maker"))
    }
}

impl PrintSurface for BrowserPrintSurface {
    fn open(&self, title: &str) -> Option<Box<dyn PrintDocument>> {
        fs::create_dir_all(&self.scratch_dir).ok()?;
        Some(Box::new(BrowserDocument {
            path: self.scratch_dir.join(format!("{}-print.html", safe_file_stem(title))),
            title: title.to_string(),
            body: String::new(),
        }))
    }
}

struct BrowserDocument {
    path: PathBuf,
    title: String,
    body: String,
}

impl PrintDocument for BrowserDocument {
    fn write(&mut self, markup: &str) -> io::Result<()> {
        self.body.push_str(markup);
        Ok(())
    }

    fn print(self: Box<Self>) -> io::Result<()> {
        fs::write(&self.path, printable_page(&self.title, &self.body))?;
        open_in_browser(&self.path)
    }
}

fn open_in_browser(path: &Path) -> io::Result<()> {
    #[cfg(target_os = "macos")]
    Command::new("open").arg(path).spawn()?;

    #[cfg(target_os = "windows")]
    Command::new("explorer").arg(path).spawn()?;

    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    Command::new("xdg-open").arg(path).spawn()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Default)]
    struct Recorded {
        written: String,
        printed: bool,
    }

    struct FakeDocument(Rc<RefCell<Recorded>>);

    impl PrintDocument for FakeDocument {
        fn write(&mut self, markup: &str) -> io::Result<()> {
            self.0.borrow_mut().written.push_str(markup);
            Ok(())
        }

        fn print(self: Box<Self>) -> io::Result<()> {
            self.0.borrow_mut().printed = true;
            Ok(())
        }
    }

    struct FakeSurface {
        available: bool,
        record: Rc<RefCell<Recorded>>,
    }

    impl PrintSurface for FakeSurface {
        fn open(&self, _title: &str) -> Option<Box<dyn PrintDocument>> {
            if self.available {
                Some(Box::new(FakeDocument(Rc::clone(&self.record))))
            } else {
                None
            }
        }
    }

    #[test]
    fn test_print_writes_then_prints() {
        let record = Rc::new(RefCell::new(Recorded::default()));
        let surface = FakeSurface { available: true, record: Rc::clone(&record) };
        print(&surface, "INV-1", "<div>invoice</div>");
        assert_eq!(record.borrow().written, "<div>invoice</div>");
        assert!(record.borrow().printed);
    }

    #[test]
    fn test_unavailable_surface_is_a_no_op() {
        let record = Rc::new(RefCell::new(Recorded::default()));
        let surface = FakeSurface { available: false, record: Rc::clone(&record) };
        print(&surface, "INV-1", "<div>invoice</div>");
        assert!(record.borrow().written.is_empty());
        assert!(!record.borrow().printed);
    }

    #[test]
    fn test_printable_page() {
        let page = printable_page("INV<1>", "<div>body</div>");
        assert!(page.contains("<title>INV&lt;1&gt;</title>"));
        let quoted = printable_page("\"A&B\" 'x'", "");
        assert!(quoted.contains("<title>&quot;A&amp;B&quot; &#x27;x&#x27;</title>"));
        assert!(page.contains("onload=\"window.print()\""));
        assert!(page.contains("<div>body</div>"));
    }

    #[test]
    fn test_browser_surface_names_scratch_file() {
        let dir = tempfile::tempdir().unwrap();
        let surface = BrowserPrintSurface::new(dir.path().join("scratch"));
        assert!(surface.open("INV/42").is_some());
        assert!(dir.path().join("scratch").is_dir());
    }
}
