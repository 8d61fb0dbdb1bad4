//! Print the export plan of an edit document.

use std::path::PathBuf;

use cutline_common::config::AppConfig;
use cutline_export_engine::plan::{plan_export_with, PlanOptions};

use crate::document::EditDocument;

pub fn run(path: PathBuf, config: &AppConfig) -> anyhow::Result<()> {
    let doc = EditDocument::load(&path)?;
    let log = doc
        .to_log()
        .map_err(|e| anyhow::anyhow!("Failed to replay operations: {e}"))?;

    let plan = plan_export_with(&doc.source, &log, &PlanOptions::from(&config.export));
    println!("{}", serde_json::to_string_pretty(&plan)?);

    Ok(())
}
