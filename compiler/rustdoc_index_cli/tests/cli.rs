use std::process::{Command, Output};

use camino::{Utf8Path, Utf8PathBuf};

fn fixtures() -> Utf8PathBuf {
    Utf8Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("../../rustdoc/rustdoc_implementors/tests/fixtures/doc")
}

fn run(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_rustdoc-index"))
        .args(["--color", "never"])
        .args(args)
        .env_remove("RUSTDOC_INDEX_LOG")
        .output()
        .unwrap()
}

/// An empty doc root. It's deleted when the returned guard is dropped.
fn doc_root() -> (tempfile::TempDir, Utf8PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let root = Utf8PathBuf::from_path_buf(dir.path().to_owned()).unwrap();
    (dir, root)
}

fn write_drop_loader(implementors_dir: &Utf8Path) {
    let dir = implementors_dir.join("core/ops/drop");
    fs_err::create_dir_all(&dir).unwrap();
    fs_err::write(
        dir.join("trait.Drop.js"),
        "(function() {var implementors = {};\n\
         implementors[\"tracing\"] = [{\"text\":\"impl Drop for Span\",\"synthetic\":false,\"types\":[\"Span\"]}];\n\
         implementors[\"eyre\"] = [{\"text\":\"impl Drop for Report\",\"synthetic\":false,\"types\":[]}];\n\
         if (window.register_implementors) {window.register_implementors(implementors);} else {window.pending_implementors = implementors;}})()",
    )
    .unwrap();
}

#[test]
fn rustdoc_output_passes_the_check() {
    let output = run(&["check", fixtures().as_str()]);
    assert!(output.status.success(), "{output:?}");
    insta::assert_snapshot!(String::from_utf8_lossy(&output.stderr), @"5 index files checked");
}

#[test]
fn implementors_are_listed_in_registration_order() {
    let output = run(&[
        "implementors",
        fixtures().as_str(),
        "core::fmt::LowerHex",
        "--order",
        "loader-first",
    ]);
    assert!(output.status.success(), "{output:?}");
    let stdout = String::from_utf8(output.stdout).unwrap();
    let subjects: Vec<_> = stdout.lines().filter(|l| !l.starts_with(' ')).collect();
    assert_eq!(subjects, vec!["generic_array", "owo_colors"]);
    assert_eq!(stdout.lines().count(), 2 + 1 + 14);
}

#[test]
fn implementors_can_be_printed_as_json() {
    let (_guard, root) = doc_root();
    write_drop_loader(&root.join("implementors"));

    let output = run(&[
        "implementors",
        root.as_str(),
        "core::ops::drop::Drop",
        "--json",
    ]);
    assert!(output.status.success(), "{output:?}");
    insta::assert_snapshot!(String::from_utf8(output.stdout).unwrap(), @r#"
    {
      "tracing": [
        {
          "text": "impl Drop for Span",
          "synthetic": false,
          "types": [
            "Span"
          ]
        }
      ],
      "eyre": [
        {
          "text": "impl Drop for Report",
          "synthetic": false,
          "types": []
        }
      ]
    }
    "#);
}

#[test]
fn sidebar_entries_are_grouped_by_kind() {
    let output = run(&["sidebar", fixtures().as_str(), "eyre"]);
    assert!(output.status.success(), "{output:?}");
    insta::assert_snapshot!(String::from_utf8(output.stdout).unwrap(), @r"
fn
    set_hook: Install the provided error hook for constructing EyreHandlers when converting Errors to Reports
macro
    bail: Return early with an error.
    ensure: Return early with an error if a condition is not satisfied.
    eyre: Construct an ad-hoc error from a string.
struct
    Chain: Iterator of a chain of source errors.
    DefaultHandler: The default provided error report handler for `eyre::Report`.
    InstallError: Error indicating that `set_hook` was unable to install the provided ErrorHook
    Report: The core error reporting type of the library, a wrapper around a dynamic error reporting type.
trait
    ContextCompat: Provides the `context` method for `Option` when porting from `anyhow`
    EyreHandler: Error Report Handler trait for customizing `eyre::Report`
    WrapErr: Provides the `wrap_err` method for `Result`.
type
    Result: type alias for `Result<T, Report>`
");
}

#[test]
fn sidebar_entries_can_be_printed_as_json() {
    let output = run(&["sidebar", fixtures().as_str(), "eyre", "--json"]);
    assert!(output.status.success(), "{output:?}");
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(
        json["type"],
        serde_json::json!([["Result", "type alias for `Result<T, Report>`"]])
    );
    assert_eq!(json["macro"].as_array().unwrap().len(), 3);
}

#[test]
fn a_configuration_file_can_relocate_the_implementors() {
    let (_guard, root) = doc_root();
    write_drop_loader(&root.join("loaders"));
    let config = root.join("custom.yml");
    fs_err::write(&config, "implementors_dir: loaders\n").unwrap();

    let output = run(&[
        "--config",
        config.as_str(),
        "implementors",
        root.as_str(),
        "core::ops::drop::Drop",
    ]);
    assert!(output.status.success(), "{output:?}");

    // Without the configuration file, the default location is used.
    let output = run(&["implementors", root.as_str(), "core::ops::drop::Drop"]);
    assert!(!output.status.success(), "{output:?}");
}

#[test]
fn environment_variables_override_the_configuration_file() {
    let (_guard, root) = doc_root();
    write_drop_loader(&root.join("loaders"));
    fs_err::write(root.join("rustdoc-index.yml"), "implementors_dir: elsewhere\n").unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_rustdoc-index"))
        .args(["--color", "never", "implementors", root.as_str(), "core::ops::drop::Drop"])
        .env_remove("RUSTDOC_INDEX_LOG")
        .env("RUSTDOC_INDEX_IMPLEMENTORS_DIR", "loaders")
        .output()
        .unwrap();
    assert!(output.status.success(), "{output:?}");
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.starts_with("tracing\n"), "{stdout}");
}

#[test]
fn a_missing_configuration_file_is_an_error() {
    let output = run(&[
        "check",
        fixtures().as_str(),
        "--config",
        fixtures().join("typo.yml").as_str(),
    ]);
    assert!(!output.status.success(), "{output:?}");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Failed to load configuration"), "{stderr}");
}

#[test]
fn a_non_canonical_data_loader_fails_the_check_until_normalized() {
    let (_guard, root) = doc_root();
    let dir = root.join("implementors/core/fmt");
    fs_err::create_dir_all(&dir).unwrap();
    fs_err::write(
        dir.join("trait.LowerHex.js"),
        "(function() {var implementors = {};\n\
         implementors[\"eyre\"] = [{ \"text\": \"impl LowerHex for Report\" }];\n\
         if (window.register_implementors) {window.register_implementors(implementors);} else {window.pending_implementors = implementors;}})()",
    )
    .unwrap();

    let output = run(&["check", root.as_str()]);
    assert!(!output.status.success(), "{output:?}");

    let output = run(&["normalize", root.as_str()]);
    assert!(output.status.success(), "{output:?}");

    let output = run(&["check", root.as_str()]);
    assert!(output.status.success(), "{output:?}");
}

#[test]
fn an_invalid_trait_path_is_rejected() {
    let output = run(&["implementors", fixtures().as_str(), "core::::Drop"]);
    assert!(!output.status.success());
}
