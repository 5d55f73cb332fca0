//! One-shot exploration commands

use std::io::Write;

use anyhow::{anyhow, Context, Result};
use clap::ValueEnum;
use rettam_core::diagnostics;
use rettam_store::{Exploration, Session};

use crate::client::ApiClient;

/// Output format of `graph`
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum GraphFormat {
    Html,
    Dot,
    Json,
}

pub fn list(session: &Session, out: &mut dyn Write) -> Result<()> {
    if session.store().is_empty() {
        writeln!(out, "No explorations")?;
        return Ok(());
    }
    for exploration in session.store().iter() {
        let status = if exploration.metadata.is_some() {
            "processed"
        } else {
            "empty"
        };
        let marker = if session.current_name() == Some(exploration.name.as_str()) {
            "*"
        } else {
            " "
        };
        writeln!(out, "{marker} {} ({status})", exploration.name)?;
    }
    Ok(())
}

pub fn create(session: &mut Session, name: Option<&str>, out: &mut dyn Write) -> Result<()> {
    let name = session.create_exploration(name)?;
    writeln!(out, "Created {name}")?;
    Ok(())
}

pub fn delete(session: &mut Session, name: &str, out: &mut dyn Write) -> Result<()> {
    session.delete(name)?;
    writeln!(out, "Deleted {name}")?;
    Ok(())
}

pub fn clear(session: &mut Session, out: &mut dyn Write) -> Result<()> {
    let count = session.store().len();
    session.clear_all()?;
    writeln!(out, "Cleared {count} exploration(s)")?;
    Ok(())
}

/// Send `text` for extraction and store the result on the current
/// exploration. A failed request leaves the exploration untouched.
pub async fn process_current(
    session: &mut Session,
    client: &ApiClient,
    text: &str,
    out: &mut dyn Write,
) -> Result<()> {
    let name = session
        .current_name()
        .map(str::to_string)
        .ok_or_else(|| anyhow!("no exploration selected"))?;

    let metadata = client
        .breakup(text)
        .await
        .with_context(|| format!("processing {name} failed"))?;

    writeln!(
        out,
        "Processed {name}: {} entities, {} noun chunks, {} dependencies",
        metadata.extraction.entities.len(),
        metadata.extraction.noun_chunks.len(),
        metadata.extraction.dependencies.len()
    )?;
    session.record_processed(text, metadata)?;
    Ok(())
}

pub async fn process(
    session: &mut Session,
    client: &ApiClient,
    name: &str,
    text: &str,
    out: &mut dyn Write,
) -> Result<()> {
    session.select(name)?;
    process_current(session, client, text, out).await
}

fn processed<'a>(session: &'a Session, name: &str) -> Result<&'a Exploration> {
    let exploration = session
        .store()
        .get(name)
        .ok_or_else(|| anyhow!("exploration not found: {name}"))?;
    if exploration.metadata.is_none() {
        return Err(anyhow!("{name} has not been processed yet"));
    }
    Ok(exploration)
}

/// Print entities, dependencies and noun chunks
pub fn show(session: &Session, name: &str, out: &mut dyn Write) -> Result<()> {
    let exploration = processed(session, name)?;
    let Some(metadata) = exploration.metadata.as_ref() else {
        return Ok(());
    };
    let extraction = &metadata.extraction;

    writeln!(out, "Text: {}", exploration.text)?;
    writeln!(out, "\nEntities:")?;
    writeln!(out, "{}", serde_json::to_string_pretty(&extraction.entities)?)?;
    writeln!(out, "\nDependencies:")?;
    writeln!(out, "{}", serde_json::to_string_pretty(&extraction.dependencies)?)?;
    writeln!(out, "\nNoun chunks:")?;
    writeln!(out, "{}", serde_json::to_string_pretty(&extraction.noun_chunks)?)?;
    Ok(())
}

/// Render the graph of `name` under the session's toggles
pub fn render_graph(session: &mut Session, name: &str, format: GraphFormat) -> Result<String> {
    processed(session, name)?;
    session.select(name)?;
    let graph = session
        .current_graph()
        .ok_or_else(|| anyhow!("{name} has not been processed yet"))?;

    let rendered = match format {
        GraphFormat::Html => graph.to_html(name)?,
        GraphFormat::Dot => graph.to_dot(),
        GraphFormat::Json => serde_json::to_string_pretty(&graph.view())?,
    };
    Ok(rendered)
}

/// Depth-bounded dump of the stored metadata
pub fn inspect(session: &Session, name: &str, max_depth: usize, out: &mut dyn Write) -> Result<()> {
    let exploration = processed(session, name)?;
    let value = serde_json::to_value(&exploration.metadata)?;
    for line in diagnostics::flatten(&value, max_depth) {
        writeln!(out, "{line}")?;
    }
    Ok(())
}
