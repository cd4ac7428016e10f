//! `landing`: loads the concert landing page headlessly, replays a visitor
//! session against its forms and prints what the visitor ends up seeing.

mod demo;

use anyhow::{Context, Result, bail};
use clap::Parser;
use forms::{FormsConfig, FormsController, Page, PatternMask};
use platform::{FileStorage, MemoryStorage, Storage};
use std::path::PathBuf;
use url::Url;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[derive(Parser)]
#[command(name = "landing")]
#[command(about = "Drive the landing page forms without a browser", long_about = None)]
struct Cli {
    /// Forms configuration (TOML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Address the page is opened at; a confirmation query is honoured
    #[arg(long, default_value = "https://landing.test/index.html")]
    url: String,

    /// JSON file backing draft storage; drafts stay in memory without it
    #[arg(long)]
    storage: Option<PathBuf>,

    /// Fill and send the contacts form
    #[arg(long, num_args = 2, value_names = ["NAME", "EMAIL"])]
    submit_contacts: Option<Vec<String>>,

    /// Fill and send the ticket order form
    #[arg(long, num_args = 3, value_names = ["NAME", "PHONE", "TICKETS"])]
    submit_order: Option<Vec<String>>,

    /// Milliseconds to let pass before printing
    #[arg(long, default_value_t = 0)]
    wait: u64,

    /// Maximum number of outline lines to print
    #[arg(long, default_value_t = 60)]
    outline: usize,

    /// Log filter used when `RUST_LOG` is unset
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = match &cli.config {
        Some(path) => FormsConfig::load(path)
            .with_context(|| format!("loading forms config from {}", path.display()))?,
        None => FormsConfig::default(),
    };
    let controller = FormsController::new(config).context("invalid forms configuration")?;

    let storage: Box<dyn Storage> = match &cli.storage {
        Some(path) => Box::new(FileStorage::new(path)),
        None => Box::new(MemoryStorage::new()),
    };
    let url = Url::parse(&cli.url).with_context(|| format!("invalid page url `{}`", cli.url))?;

    let mut page = Page::new(demo::landing_page(), url, storage, controller)
        .with_input_mask(PatternMask::ukrainian_phone());
    page.load();

    if let Some(args) = &cli.submit_contacts {
        fill(&mut page, "contacts", &[("name", args[0].as_str()), ("e-mail", args[1].as_str())])?;
        send(&mut page, "contacts")?;
    }
    if let Some(args) = &cli.submit_order {
        fill(
            &mut page,
            "order",
            &[
                ("name", args[0].as_str()),
                ("phone", args[1].as_str()),
                ("ticket-count", args[2].as_str()),
            ],
        )?;
        send(&mut page, "order")?;
    }
    page.advance(cli.wait);

    report(&page, cli.outline);
    Ok(())
}

fn form_named(page: &Page, name: &str) -> Result<dom::NodeId> {
    let doc = page.document();
    doc.descendant_elements(doc.root())
        .into_iter()
        .find(|&n| doc.tag(n) == Some("form") && doc.attr(n, "name") == Some(name))
        .with_context(|| format!("no form named `{name}` on the page"))
}

fn fill(page: &mut Page, form_name: &str, values: &[(&str, &str)]) -> Result<()> {
    let form = form_named(page, form_name)?;
    for &(name, value) in values {
        let field = page
            .document()
            .named_element(form, name)
            .with_context(|| format!("form `{form_name}` has no field `{name}`"))?;
        page.type_text(field, value);
    }
    Ok(())
}

/// Ticks the policy box and clicks the submit button like a visitor would.
fn send(page: &mut Page, form_name: &str) -> Result<()> {
    let form = form_named(page, form_name)?;
    let doc = page.document();
    if let Some(policy) = doc.named_element(form, "policy") {
        page.set_checked(policy, true);
    }

    let doc = page.document();
    let Some(button) = doc
        .form_elements(form)
        .into_iter()
        .find(|&n| doc.tag(n) == Some("button"))
    else {
        bail!("form `{form_name}` has no submit button");
    };
    let shown = page.notifications().shown_total();
    page.click(button);

    if page.notifications().shown_total() == shown {
        let doc = page.document();
        let problems: Vec<String> = doc
            .form_elements(form)
            .into_iter()
            .flat_map(|field| {
                let name = doc.attr(field, "name").unwrap_or("?").to_string();
                page.messages_for(field)
                    .into_iter()
                    .map(move |msg| format!("{name}: {msg}"))
            })
            .collect();
        log::warn!("`{form_name}` was not sent: {}", problems.join("; "));
    }
    Ok(())
}

fn report(page: &Page, outline: usize) {
    println!("location: {}", page.location());
    println!("history entries: {}", page.window().history().len());
    if page.notifications().is_empty() {
        println!("notifications: none");
    }
    for (i, text) in page.notifications().texts().iter().enumerate() {
        println!("notification #{}:", i + 1);
        for line in text.lines() {
            println!("  {line}");
        }
    }
    println!();
    for line in page.outline(outline) {
        println!("{line}");
    }
}
