//! Plot command - render a graph with Graphviz
//!
//! `.dot` / `.gv` outputs are written directly. Any other extension is
//! rendered by piping the DOT text through `dot -T<ext>`.

use anyhow::{bail, Context, Result};
use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};

use vfbench_core::exporter::dot;
use vfbench_core::VfGraph;

use crate::output::{Output, OutputFormat, SuccessMessage};

const DOT_EXTENSIONS: &[&str] = &["dot", "gv"];

/// Graphviz output format for a path, or `None` for raw DOT.
pub fn render_format(output: &Path) -> Result<Option<String>> {
    let Some(ext) = output.extension().and_then(|e| e.to_str()) else {
        bail!("Cannot infer image format of {}", output.display());
    };
    let ext = ext.to_lowercase();
    if DOT_EXTENSIONS.contains(&ext.as_str()) {
        Ok(None)
    } else {
        Ok(Some(ext))
    }
}

pub fn run(input: &str, output: Option<&str>, dot_binary: &str, format: OutputFormat) -> Result<()> {
    let graph = VfGraph::load(input).with_context(|| format!("Failed to load graph {}", input))?;
    let text = dot::export(&graph);

    let Some(output) = output else {
        print!("{}", text);
        return Ok(());
    };
    let path = Path::new(output);

    match render_format(path)? {
        None => std::fs::write(path, &text).with_context(|| format!("Failed to write {}", output))?,
        Some(image_format) => render_with_graphviz(dot_binary, &text, &image_format, path)?,
    }

    Output::new(SuccessMessage::new(format!("Plotted {} to {}", input, output)), format).render()
}

fn render_with_graphviz(dot_binary: &str, text: &str, image_format: &str, path: &Path) -> Result<()> {
    tracing::debug!("Rendering {} with {} -T{}", path.display(), dot_binary, image_format);
    let mut child = Command::new(dot_binary)
        .arg(format!("-T{}", image_format))
        .arg("-o")
        .arg(path)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()
        .with_context(|| format!("Failed to run '{}' (is Graphviz installed?)", dot_binary))?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin
            .write_all(text.as_bytes())
            .with_context(|| format!("Failed to send graph to '{}'", dot_binary))?;
    }

    let result = child
        .wait_with_output()
        .with_context(|| format!("Failed to wait for '{}'", dot_binary))?;
    if !result.status.success() {
        bail!(
            "'{}' failed ({}): {}",
            dot_binary,
            result.status,
            String::from_utf8_lossy(&result.stderr).trim()
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_format() {
        assert_eq!(render_format(Path::new("g.dot")).unwrap(), None);
        assert_eq!(render_format(Path::new("g.GV")).unwrap(), None);
        assert_eq!(render_format(Path::new("out/g.png")).unwrap(), Some("png".to_string()));
        assert!(render_format(Path::new("graph")).is_err());
    }
}
