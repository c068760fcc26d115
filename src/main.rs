use anyhow::{Context as _, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use comfy_table::{Attribute, Cell, CellAlignment, Table};
use inquire::{Confirm, DateSelect, InquireError, Select, Text};
use std::fs;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use invoice_maker::config::Settings;
use invoice_maker::currency::{self, CURRENCIES};
use invoice_maker::export::{BrowserPrintSurface, HttpEmailTransport, WkHtmlToPdf};
use invoice_maker::input::{display_quantity, parse_price, parse_quantity};
use invoice_maker::ledger::{grand_total, line_total};
use invoice_maker::{
    InvoiceEditor, ItemChanges, NotificationKind, RecipientChanges, SenderChanges,
};

// ==========================================
// Constants
// ==========================================
const IMAGE_EXTENSIONS: [&str; 7] = ["png", "jpg", "jpeg", "gif", "webp", "svg", "bmp"];

// ==========================================
// CLI
// ==========================================

#[derive(Parser)]
#[command(name = "invoice-maker")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start a new invoice
    New,
    /// List supported currencies
    Currencies,
    /// Configure output folder, email endpoint and defaults
    Config,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Details,
    AddItem,
    EditItem,
    RemoveItem,
    Currency,
    Logo,
    TermsNotes,
    Preview,
    Print,
    Pdf,
    Email,
    Quit,
}

impl Action {
    const ALL: [Action; 12] = [
        Action::Details,
        Action::AddItem,
        Action::EditItem,
        Action::RemoveItem,
        Action::Currency,
        Action::Logo,
        Action::TermsNotes,
        Action::Preview,
        Action::Print,
        Action::Pdf,
        Action::Email,
        Action::Quit,
    ];
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Action::Details => "✏️  Edit Sender / Recipient / Number / Date",
            Action::AddItem => "➕ Add Item",
            Action::EditItem => "📝 Edit Item",
            Action::RemoveItem => "➖ Remove Item",
            Action::Currency => "💱 Change Currency",
            Action::Logo => "🖼️  Set Logo",
            Action::TermsNotes => "📄 Edit Terms & Notes",
            Action::Preview => "👀 Preview",
            Action::Print => "🖨️  Print",
            Action::Pdf => "📑 Export PDF",
            Action::Email => "📧 Email Invoice",
            Action::Quit => "🚪 Quit",
        };
        f.write_str(label)
    }
}

// ==========================================
// Main Function
// ==========================================

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "invoice_maker=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(e) = run() {
        eprintln!("❌ Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        use clap::CommandFactory;
        Cli::command().print_help()?;
        return Ok(());
    };

    match command {
        Commands::New => {
            let settings = Settings::load().context("Failed to load settings")?;
            run_session(&settings)
        }
        Commands::Currencies => {
            show_currencies();
            Ok(())
        }
        Commands::Config => {
            setup_config_wizard()?;
            Ok(())
        }
    }
}

// ==========================================
// 1. Editing Session
// ==========================================

fn run_session(settings: &Settings) -> Result<()> {
    let mut editor = InvoiceEditor::new(settings.currency())?;
    println!(
        "🧾 New invoice {} ({})",
        editor.invoice().invoice_number,
        editor.invoice().currency.code
    );

    loop {
        if editor.poll_logo() {
            println!("✅ Logo installed.");
        }
        report_notifications(&mut editor);

        let action = match Select::new("What next?", Action::ALL.to_vec())
            .with_page_size(12)
            .prompt()
        {
            Ok(a) => a,
            Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => Action::Quit,
            Err(e) => return Err(e.into()),
        };

        match action {
            Action::Details => edit_details(&mut editor)?,
            Action::AddItem => {
                let id = editor.add_item();
                println!("➕ Added item #{}", id);
                edit_item(&mut editor, id)?;
            }
            Action::EditItem => {
                if let Some(id) = pick_item(&editor, "Select Item to Edit:")? {
                    edit_item(&mut editor, id)?;
                }
            }
            Action::RemoveItem => {
                if let Some(id) = pick_item(&editor, "Select Item to Remove:")? {
                    if editor.remove_item(id) {
                        println!("🗑️  Removed item #{}", id);
                    }
                }
            }
            Action::Currency => choose_currency(&mut editor)?,
            Action::Logo => choose_logo(&mut editor)?,
            Action::TermsNotes => {
                if let Some(terms) = ask("Terms:", &editor.invoice().terms)? {
                    editor.set_terms(terms);
                }
                if let Some(notes) = ask("Notes:", &editor.invoice().notes)? {
                    editor.set_notes(notes);
                }
            }
            Action::Preview => preview(&mut editor, settings)?,
            Action::Print => {
                editor.print(&BrowserPrintSurface::default())?;
                println!("🖨️  Sent to print.");
            }
            Action::Pdf => export_pdf(&editor, settings),
            Action::Email => send_email(&mut editor, settings)?,
            Action::Quit => {
                let leave = Confirm::new("Discard this invoice and quit?")
                    .with_default(false)
                    .prompt()
                    .unwrap_or(true);
                if leave {
                    return Ok(());
                }
            }
        }
    }
}

fn report_notifications(editor: &mut InvoiceEditor) {
    for note in editor.take_notifications() {
        match note.kind {
            NotificationKind::Success => println!("✅ {}: {}", note.title, note.description),
            NotificationKind::Error => println!("❌ {}: {}", note.title, note.description),
        }
    }
}

// ==========================================
// 2. Data Entry Helpers
// ==========================================

/// Text prompt pre-filled with `current`. `None` when the user cancels.
fn ask(prompt: &str, current: &str) -> Result<Option<String>> {
    match Text::new(prompt).with_initial_value(current).prompt() {
        Ok(value) => Ok(Some(value)),
        Err(InquireError::OperationCanceled) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn edit_details(editor: &mut InvoiceEditor) -> Result<()> {
    println!("\n--- From ---");
    let sender = editor.invoice().sender.clone();
    editor.update_sender(SenderChanges {
        name: ask("Your Name:", &sender.name)?,
        company: ask("Company (Optional):", &sender.company)?,
        email: ask("Your Email:", &sender.email)?,
    });

    println!("\n--- Bill To ---");
    let recipient = editor.invoice().recipient.clone();
    editor.update_recipient(RecipientChanges {
        name: ask("Client Name:", &recipient.name)?,
        email: ask("Client Email:", &recipient.email)?,
    });

    println!("\n--- Invoice ---");
    if let Some(number) = ask("Invoice Number:", &editor.invoice().invoice_number)? {
        editor.set_invoice_number(number);
    }

    let current: NaiveDate = editor.invoice().issue_date;
    match DateSelect::new("Invoice Date:").with_default(current).prompt() {
        Ok(date) => editor.set_issue_date(date),
        Err(InquireError::OperationCanceled) => {}
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

fn pick_item(editor: &InvoiceEditor, prompt: &str) -> Result<Option<u32>> {
    let items = &editor.invoice().items;
    if items.is_empty() {
        println!("❌ No items on this invoice.");
        return Ok(None);
    }

    let options: Vec<String> = items
        .iter()
        .map(|i| {
            let name = if i.name.is_empty() { "(unnamed)" } else { i.name.as_str() };
            format!("#{} | {} | {} x {}", i.id, name, display_quantity(i.quantity), i.unit_price)
        })
        .collect();

    match Select::new(prompt, options).prompt() {
        Ok(choice) => Ok(choice
            .split(" | ")
            .next()
            .and_then(|id| id.trim_start_matches('#').parse().ok())),
        Err(InquireError::OperationCanceled) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn edit_item(editor: &mut InvoiceEditor, id: u32) -> Result<()> {
    let Some(item) = editor.invoice().item(id).cloned() else {
        return Ok(());
    };
    println!("💡 Tip: non-numeric quantity or price counts as 0.");

    let changes = ItemChanges {
        name: ask("Item:", &item.name)?,
        description: ask("Description:", &item.description)?,
        quantity: ask("Quantity:", &display_quantity(item.quantity))?.map(|q| parse_quantity(&q)),
        unit_price: ask("Price:", &format!("{:.2}", item.unit_price))?.map(|p| parse_price(&p)),
    };
    editor.update_item(id, changes);
    Ok(())
}

fn choose_currency(editor: &mut InvoiceEditor) -> Result<()> {
    let options: Vec<String> = CURRENCIES
        .iter()
        .map(|c| format!("{} - {}", c.code, c.name))
        .collect();
    let start = CURRENCIES
        .iter()
        .position(|c| c.code == editor.invoice().currency.code)
        .unwrap_or(0);

    match Select::new("Currency:", options).with_starting_cursor(start).prompt() {
        Ok(choice) => {
            let code = choice.split(" - ").next().unwrap_or_default();
            editor.set_currency(code)?;
            println!("💱 Currency set to {}", code);
            Ok(())
        }
        Err(InquireError::OperationCanceled) => Ok(()),
        Err(e) => Err(e.into()),
    }
}

fn choose_logo(editor: &mut InvoiceEditor) -> Result<()> {
    if editor.invoice().logo.is_some() {
        let remove = Confirm::new("Remove the current logo instead?")
            .with_default(false)
            .prompt()?;
        if remove {
            editor.clear_logo();
            println!("🗑️  Logo removed.");
            return Ok(());
        }
    }

    println!("📂 Opening file picker...");
    let picked = rfd::FileDialog::new()
        .set_title("Select Logo Image")
        .add_filter("Images", &IMAGE_EXTENSIONS)
        .pick_file();

    let path = match picked {
        Some(path) => path,
        None => {
            println!("❌ No file selected. Falling back to manual input.");
            match ask("Logo file path (leave empty to cancel):", "")? {
                Some(p) if !p.trim().is_empty() => PathBuf::from(p.trim()),
                _ => return Ok(()),
            }
        }
    };

    println!("⏳ Loading logo {:?}...", path);
    editor.set_logo(path);
    Ok(())
}

// ==========================================
// 3. Preview & Export
// ==========================================

fn preview(editor: &mut InvoiceEditor, settings: &Settings) -> Result<()> {
    print_summary(editor);

    let markup = editor.preview()?.to_string();
    let save = Confirm::new("Save HTML preview to the output folder?")
        .with_default(false)
        .prompt()
        .unwrap_or(false);
    if save {
        let dir = settings.output_path();
        fs::create_dir_all(&dir).with_context(|| format!("Failed to create {:?}", dir))?;
        let path = dir.join(format!("{}-preview.html", editor.invoice().file_stem()));
        fs::write(&path, markup).with_context(|| format!("Failed to write {:?}", path))?;
        println!("✅ Preview saved: {:?}", path);
    }
    editor.close_preview();
    Ok(())
}

fn print_summary(editor: &InvoiceEditor) {
    let invoice = editor.invoice();
    let currency = invoice.currency;

    let mut table = Table::new();
    table.set_header(vec![
        Cell::new("Item"),
        Cell::new("Description"),
        Cell::new("Quantity"),
        Cell::new("Price"),
        Cell::new("Total"),
    ]);

    for item in &invoice.items {
        table.add_row(vec![
            Cell::new(&item.name),
            Cell::new(&item.description),
            Cell::new(display_quantity(item.quantity)).set_alignment(CellAlignment::Right),
            Cell::new(currency.format_amount(item.unit_price)).set_alignment(CellAlignment::Right),
            Cell::new(currency.format_amount(line_total(item))).set_alignment(CellAlignment::Right),
        ]);
    }

    table.add_row(vec![
        Cell::new("Total").add_attribute(Attribute::Bold),
        Cell::new(""),
        Cell::new(""),
        Cell::new(""),
        Cell::new(currency.format_amount(grand_total(&invoice.items)))
            .add_attribute(Attribute::Bold)
            .set_alignment(CellAlignment::Right),
    ]);

    println!("\n--- INVOICE {} ({}) ---", invoice.invoice_number, invoice.issue_date);
    println!("From:    {} {} {}", invoice.sender.name, invoice.sender.company, invoice.sender.email);
    println!("Bill To: {} {}", invoice.recipient.name, invoice.recipient.email);
    if invoice.logo.is_some() {
        println!("Logo:    attached");
    }
    println!("{table}");
    if !invoice.terms.is_empty() {
        println!("Terms: {}", invoice.terms);
    }
    if !invoice.notes.is_empty() {
        println!("Notes: {}", invoice.notes);
    }
}

fn export_pdf(editor: &InvoiceEditor, settings: &Settings) {
    let engine = WkHtmlToPdf::new(Some(settings.pdf_engine.clone()));
    println!("\n🔨 Compiling PDF...");
    match editor.export_pdf(&engine, &settings.output_path()) {
        Ok(path) => println!("✅ PDF Generated: {:?}", path),
        Err(e) => println!("❌ {}", e),
    }
}

fn send_email(editor: &mut InvoiceEditor, settings: &Settings) -> Result<()> {
    let transport = HttpEmailTransport::new(settings.email_endpoint.clone());
    editor.open_email_dialog();

    while editor.email_dialog().open {
        let draft = editor.email_dialog().recipient.clone();
        let Some(to) = ask("Recipient Email:", &draft)? else {
            editor.close_email_dialog();
            break;
        };
        editor.set_email_recipient(to);

        println!("📧 Sending...");
        let sent = editor.send_email(&transport);
        report_notifications(editor);

        if !sent {
            let retry = Confirm::new("Try again?").with_default(true).prompt().unwrap_or(false);
            if !retry {
                editor.close_email_dialog();
            }
        }
    }
    Ok(())
}

// ==========================================
// 4. Currencies & Config
// ==========================================

fn show_currencies() {
    let mut table = Table::new();
    table.set_header(vec![Cell::new("Code"), Cell::new("Symbol"), Cell::new("Name")]);
    for c in CURRENCIES.iter() {
        table.add_row(vec![Cell::new(c.code), Cell::new(c.symbol), Cell::new(c.name)]);
    }
    println!("{table}");
}

fn setup_config_wizard() -> Result<Settings> {
    println!("\n⚙️  --- Configuration Setup ---");
    let current = Settings::load().unwrap_or_default();

    println!("📂 Opening folder picker...");
    let picked_path = rfd::FileDialog::new()
        .set_title("Select Invoice Output Directory")
        .pick_folder();

    let output_dir = if let Some(path) = picked_path {
        path.to_string_lossy().to_string()
    } else {
        println!("❌ No folder selected. Falling back to manual input.");
        Text::new("Output Directory:").with_default(&current.output_dir).prompt()?
    };

    let email_endpoint = Text::new("Email Endpoint URL:")
        .with_default(&current.email_endpoint)
        .prompt()?;
    let pdf_engine = Text::new("wkhtmltopdf Binary:")
        .with_default(&current.pdf_engine)
        .prompt()?;

    let codes: Vec<&str> = CURRENCIES.iter().map(|c| c.code).collect();
    let start = codes
        .iter()
        .position(|c| *c == current.currency().code)
        .unwrap_or(0);
    let default_currency = Select::new("Default Currency:", codes)
        .with_starting_cursor(start)
        .prompt()?
        .to_string();

    let settings = Settings {
        output_dir,
        email_endpoint,
        pdf_engine,
        default_currency: currency::lookup_or_default(&default_currency).code.to_string(),
    };
    settings.save().context("Failed to save settings")?;
    println!("✅ Settings saved.");
    Ok(settings)
}
