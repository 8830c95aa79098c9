use std::{fs, path::PathBuf};

use tempfile::tempdir;

use fabric::FabricError;
use fabric_cli::{Args, run};

fn demos_dir() -> PathBuf {
    // Demos live at the workspace root
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .parent()
        .unwrap()
        .join("demos")
}

/// Top-level demo files; each declares a document named after its file stem.
fn collect_demo_documents(dir: &PathBuf) -> Vec<String> {
    let mut documents: Vec<String> = fs::read_dir(dir)
        .map(|entries| {
            entries
                .flatten()
                .map(|entry| entry.path())
                .filter(|path| {
                    path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("fabric")
                })
                .filter_map(|path| Some(path.file_stem()?.to_string_lossy().into_owned()))
                .collect()
        })
        .unwrap_or_default();

    documents.sort();
    documents
}

fn args(inputs: Vec<PathBuf>, document: &str, output: PathBuf) -> Args {
    Args {
        inputs,
        document: document.to_string(),
        output: Some(output),
        config: None,
        log_level: "off".to_string(),
        base_dir: Some(demos_dir()),
        timeout_ms: None,
    }
}

#[test]
fn e2e_smoke_test_demo_documents() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let demos = demos_dir();
    let documents = collect_demo_documents(&demos);

    assert!(!documents.is_empty(), "No demo documents found in demos/");

    let mut failed = Vec::new();
    for document in &documents {
        let output = temp_dir.path().join(format!("{document}.md"));
        match run(&args(vec![demos.clone()], document, output.clone())) {
            Ok(()) => {
                let text = fs::read_to_string(&output).unwrap();
                if text.trim().is_empty() {
                    failed.push(format!("{document}: empty output"));
                }
            }
            Err(err) => failed.push(format!("{document}: {err}")),
        }
    }

    assert!(failed.is_empty(), "Demo documents failed: {failed:#?}");
}

#[test]
fn e2e_hello_output() {
    let temp_dir = tempdir().unwrap();
    let output = temp_dir.path().join("hello.md");

    run(&args(vec![demos_dir()], "hello", output.clone())).unwrap();

    assert_eq!(
        fs::read_to_string(output).unwrap(),
        "# Welcome\nHello from fabric\n"
    );
}

#[test]
fn e2e_team_uses_shared_library_and_json_data() {
    let temp_dir = tempdir().unwrap();
    let output = temp_dir.path().join("team.md");

    run(&args(vec![demos_dir()], "team", output.clone())).unwrap();

    let text = fs::read_to_string(output).unwrap();
    let lines: Vec<_> = text.lines().collect();
    assert_eq!(lines[0], "# Team");
    assert_eq!(lines[1], "The team is led by Ada.");
    assert!(lines.contains(&"| Grace | admiral |"));
    assert!(lines.contains(&"# Conventions"));
    assert!(lines.contains(&"- [ ] Write tests first"));
    assert!(lines.contains(&"cargo test --workspace"));
}

#[test]
fn e2e_render_errors_are_reported() {
    let temp_dir = tempdir().unwrap();
    let source = temp_dir.path().join("broken.fabric");
    fs::write(
        &source,
        r#"
        document "broken" {
          content text { value = "kept" }
          content ref { base = content.text.ghost }
        }
        "#,
    )
    .unwrap();
    let output = temp_dir.path().join("broken.md");

    let err = run(&args(vec![source], "broken", output.clone())).unwrap_err();

    match err {
        FabricError::Diagnostics {
            diagnostics,
            sources,
        } => {
            assert_eq!(diagnostics.len(), 1);
            assert_eq!(diagnostics[0].message(), "Reference not found");
            assert_eq!(sources.len(), 1);
        }
        other => panic!("expected diagnostics, got {other}"),
    }
    // Unaffected lines are still written
    assert_eq!(fs::read_to_string(output).unwrap(), "kept\n");
}
