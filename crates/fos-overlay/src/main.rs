//! fOS Overlay - Main Entry Point
//!
//! Loads a page fixture, attaches the accessibility overlay and plays a
//! session script against it. Spoken output goes to stdout.

mod console;
mod page;
mod runner;
mod script;

use std::path::PathBuf;

use anyhow::Context;
use fos_a11y::OverlayConfig;
use tracing_subscriber::EnvFilter;

use crate::page::PageFixture;
use crate::runner::Session;
use crate::script::Script;

const USAGE: &str = "usage: fos-overlay <page.json> <script.json> [config.json]";

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let mut args = std::env::args().skip(1).map(PathBuf::from);
    let (Some(page_path), Some(script_path)) = (args.next(), args.next()) else {
        anyhow::bail!(USAGE);
    };
    let config = match args.next() {
        Some(path) => {
            let json = std::fs::read_to_string(&path)
                .with_context(|| format!("reading config {}", path.display()))?;
            OverlayConfig::from_json(&json).with_context(|| format!("parsing config {}", path.display()))?
        }
        None => OverlayConfig::default(),
    };

    let fixture = PageFixture::load(&page_path)?;
    let script = Script::load(&script_path)?;
    let doc = fixture.build()?;

    tracing::info!("Starting fOS Overlay on {} ({})", fixture.url, config.default_lang);

    let mut session = Session::new(doc, config);
    smol::block_on(session.run(&script))?;

    let title = session.document().title();
    tracing::debug!(
        "Cursor ended at {:?} on {:?}",
        session.controller().cursor().position(),
        if title.is_empty() { fixture.url.as_str() } else { title.as_str() }
    );
    Ok(())
}
