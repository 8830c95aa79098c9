//! CLI logic for the Fabric document renderer.
//!
//! Reads `.fabric` source units from files and directories, renders one
//! document and writes its lines to a file or stdout.

pub mod error_adapter;

mod args;
mod config;

pub use args::Args;

use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};

use log::{debug, info, warn};
use walkdir::WalkDir;

use fabric::{FabricError, Renderer, SourceUnit, config::AppConfig};

const SOURCE_EXTENSION: &str = "fabric";

/// Run the Fabric CLI application
///
/// The rendered lines are written even when the render reported errors, so
/// the unaffected parts of the document are still available. Warnings are
/// logged; errors are returned.
///
/// # Errors
///
/// Returns `FabricError` for:
/// - File I/O errors
/// - Configuration loading errors
/// - A render that produced error diagnostics
pub fn run(args: &Args) -> Result<(), FabricError> {
    info!(
        inputs = args.inputs.len(),
        document = args.document;
        "Rendering document"
    );

    let mut app_config = config::load_config(args.config.as_ref())?;
    apply_overrides(&mut app_config, args);

    let units = collect_units(&args.inputs)?;
    debug!(units = units.len(); "Collected source units");

    let renderer = Renderer::new(app_config);
    let output = renderer.render(&units, &args.document);

    for diagnostic in output.diagnostics() {
        if diagnostic.severity().is_warning() {
            warn!("{diagnostic}");
        }
    }

    write_output(args.output.as_deref(), output.lines())?;

    if output.has_errors() {
        let errors = output
            .diagnostics()
            .iter()
            .filter(|diagnostic| diagnostic.severity().is_error())
            .cloned()
            .collect();
        return Err(FabricError::new_diagnostics_error(errors, units));
    }

    info!(lines = output.lines().len(); "Document rendered successfully");

    Ok(())
}

fn apply_overrides(config: &mut AppConfig, args: &Args) {
    if let Some(base_dir) = &args.base_dir {
        config.plugins_mut().set_base_dir(Some(base_dir.clone()));
    }
    if let Some(timeout_ms) = args.timeout_ms {
        config.render_mut().set_timeout_ms(Some(timeout_ms));
    }
}

/// Read every input file, and every `.fabric` file below every input
/// directory.
fn collect_units(inputs: &[PathBuf]) -> Result<Vec<SourceUnit>, FabricError> {
    let mut units = Vec::new();

    for input in inputs {
        if !input.is_dir() {
            units.push(SourceUnit::from_path(input)?);
            continue;
        }

        for entry in WalkDir::new(input).sort_by_file_name() {
            let entry = entry.map_err(io::Error::from)?;
            if entry.file_type().is_file() && is_source_file(entry.path()) {
                units.push(SourceUnit::from_path(entry.path())?);
            }
        }
    }

    Ok(units)
}

fn is_source_file(path: &Path) -> bool {
    path.extension().and_then(|ext| ext.to_str()) == Some(SOURCE_EXTENSION)
}

fn write_output(path: Option<&Path>, lines: &[String]) -> Result<(), FabricError> {
    let mut text = lines.join("\n");
    if !text.is_empty() {
        text.push('\n');
    }

    match path {
        Some(path) => {
            fs::write(path, text)?;
            info!(output_file = path.display().to_string(); "Output written");
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(text.as_bytes())?;
            stdout.flush()?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn test_collect_units_walks_directories() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("nested");
        fs::create_dir(&nested).unwrap();
        fs::write(dir.path().join("b.fabric"), "").unwrap();
        fs::write(nested.join("a.fabric"), "").unwrap();
        fs::write(dir.path().join("notes.txt"), "").unwrap();

        let units = collect_units(&[dir.path().to_path_buf()]).unwrap();

        let mut names: Vec<_> = units.iter().map(|unit| unit.name().to_string()).collect();
        names.sort();
        assert_eq!(names.len(), 2);
        assert!(names.iter().all(|name| name.ends_with(".fabric")));
    }

    #[test]
    fn test_collect_units_reads_explicit_files_of_any_extension() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("doc.txt");
        fs::write(&file, "document \"d\" {}").unwrap();

        let units = collect_units(&[file]).unwrap();

        assert_eq!(units.len(), 1);
        assert_eq!(units[0].source(), "document \"d\" {}");
    }

    #[test]
    fn test_missing_input_is_an_io_error() {
        let dir = tempdir().unwrap();
        let err = collect_units(&[dir.path().join("absent.fabric")]).unwrap_err();
        assert!(matches!(err, FabricError::Io(_)));
    }

    #[test]
    fn test_overrides_replace_config_values() {
        let mut config = AppConfig::default();
        let args = Args {
            inputs: vec![PathBuf::from(".")],
            document: "d".to_string(),
            output: None,
            config: None,
            log_level: "info".to_string(),
            base_dir: Some(PathBuf::from("data")),
            timeout_ms: Some(10),
        };

        apply_overrides(&mut config, &args);

        assert_eq!(config.plugins().base_dir(), Some(Path::new("data")));
        assert_eq!(
            config.render().timeout(),
            Some(std::time::Duration::from_millis(10))
        );
    }
}
