//! Offline previews
//!
//! Slug generation, artifact extraction and descriptor rendering without
//! touching the network.

use anyhow::{Context, Result};
use clap::ValueEnum;
use colored::*;
use launchpad_core::domain::artifact::{ArtifactSource, ContentKind, Extraction, extract_detailed};
use launchpad_core::domain::slug::{Slug, UniqueSuffix, slugify};
use launchpad_engine::descriptors::{WorkflowParams, render_dockerfile, render_workflow};
use std::io::Read;
use std::path::Path;

/// Descriptor staged next to the application files
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum DescriptorKind {
    Dockerfile,
    Workflow,
}

/// Resolve a user-supplied suffix, falling back to the current time
fn resolve_suffix(suffix: Option<&str>) -> Result<UniqueSuffix> {
    match suffix {
        Some(raw) => UniqueSuffix::new(raw)
            .with_context(|| format!("Suffix `{}` has no usable characters", raw)),
        None => Ok(UniqueSuffix::now()),
    }
}

pub fn show_slug(name: &str, suffix: Option<&str>) -> Result<()> {
    let suffix = resolve_suffix(suffix)?;
    let slug = Slug::generate(name, &suffix);

    println!("{}", slug.as_str().bold());
    println!("  Base:      {}", slugify(name).dimmed());
    println!("  Suffix:    {}", suffix.as_str().dimmed());
    println!("  Workspace: {}", format!("app-{}", slug).dimmed());
    Ok(())
}

/// Run the extractor over a saved completion
///
/// # Arguments
/// * `input` - File holding the completion text, stdin when `None`
/// * `out` - Directory to write the three files into
pub fn extract(input: Option<&Path>, out: Option<&Path>) -> Result<()> {
    let text = match input {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read completion file: {}", path.display()))?,
        None => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("Failed to read completion from stdin")?;
            text
        }
    };

    let extraction = extract_detailed(&text);
    print_extraction(&extraction);

    if let Some(dir) = out {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
        for (name, content) in extraction.artifact.files() {
            let path = dir.join(name);
            std::fs::write(&path, content)
                .with_context(|| format!("Failed to write {}", path.display()))?;
        }
        println!("{}", format!("✓ Files written to {}", dir.display()).green().bold());
    }

    Ok(())
}

fn print_extraction(extraction: &Extraction) {
    for kind in ContentKind::ALL {
        let content = extraction.artifact.get(kind);
        let line = format!(
            "{:<7} {:<11} {} ({} bytes)",
            kind.to_string(),
            kind.file_name(),
            describe(extraction.source(kind)),
            content.len()
        );
        match extraction.source(kind) {
            ArtifactSource::Placeholder => println!("{} {}", "!".yellow().bold(), line.yellow()),
            _ => println!("{} {}", "✓".green().bold(), line),
        }
    }
}

fn describe(source: ArtifactSource) -> &'static str {
    match source {
        ArtifactSource::FencedBlock => "fenced block",
        ArtifactSource::InlineTag => "inline tag",
        ArtifactSource::Placeholder => "placeholder",
    }
}

pub fn render(
    kind: DescriptorKind,
    name: &str,
    suffix: Option<&str>,
    project: &str,
    region: &str,
    secret_name: &str,
    branch: &str,
) -> Result<()> {
    let rendered = match kind {
        DescriptorKind::Dockerfile => render_dockerfile(),
        DescriptorKind::Workflow => {
            let slug = Slug::generate(name, &resolve_suffix(suffix)?);
            render_workflow(WorkflowParams {
                slug: &slug,
                project_id: project,
                region,
                secret_name,
                branch,
            })
        }
    };

    print!("{}", rendered);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_resolve_suffix() {
        assert_eq!(resolve_suffix(Some("AB-12")).unwrap().as_str(), "ab-12");
        assert!(resolve_suffix(Some("!!!")).is_err());
        assert!(!resolve_suffix(None).unwrap().as_str().is_empty());
    }

    #[test]
    fn test_extract_writes_files() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("completion.md");
        std::fs::write(&input, "```css\nbody { color: red; }\n```").unwrap();
        let out = dir.path().join("out");

        extract(Some(&input), Some(&out)).unwrap();

        assert_eq!(
            std::fs::read_to_string(out.join("styles.css")).unwrap(),
            "body { color: red; }"
        );
        assert!(out.join("index.html").is_file());
        assert!(out.join("script.js").is_file());
    }

    #[test]
    fn test_extract_missing_input_fails() {
        let dir = TempDir::new().unwrap();
        let err = extract(Some(&dir.path().join("nope.md")), None).unwrap_err();
        assert!(err.to_string().contains("Failed to read completion file"));
    }
}
