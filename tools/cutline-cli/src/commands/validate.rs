//! Validate an edit document.

use std::path::PathBuf;

use crate::document::EditDocument;

pub fn run(path: PathBuf) -> anyhow::Result<()> {
    println!("Validating edit document at: {}", path.display());

    let doc = EditDocument::load(&path)?;

    println!("  Version: {}", doc.version);
    println!("  Source: {}", doc.source.origin);
    println!("  Operations: {}", doc.operations.len());

    let mut issues: Vec<String> = Vec::new();
    if let Err(e) = doc.source.validate() {
        issues.push(e.to_string());
    }
    for entry in doc.invalid_entries() {
        issues.push(format!("#{} ({}): {}", entry.index, entry.id, entry.error));
    }

    if issues.is_empty() {
        println!("\nDocument is valid.");
    } else {
        println!("\nValidation issues:");
        for issue in &issues {
            println!("  - {issue}");
        }
        println!("\n{} issue(s) found. Invalid operations are rejected on replay.", issues.len());
    }

    Ok(())
}
