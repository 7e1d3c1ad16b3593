//! Integration tests for the `sis` command-line binary.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

/// A temporary installation root and catalog for running the `sis` binary.
struct TestContext {
    temp_dir: TempDir,
    root: PathBuf,
    catalog: PathBuf,
}

impl TestContext {
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        let root = temp_dir.path().join("root");
        let catalog = temp_dir.path().join("catalog");
        std::fs::create_dir_all(catalog.join("linux-x86_64")).expect("failed to create catalog");
        Self {
            temp_dir,
            root,
            catalog,
        }
    }

    fn sis_cmd(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_sis"));
        cmd.env("HOME", self.temp_dir.path())
            .env("SIS_ROOT", &self.root)
            .env("SIS_CATALOG", &self.catalog)
            .env_remove("SIS_BUILD_DIR")
            .env_remove("RUST_LOG")
            .args(["--platform", "linux-x86_64"]);
        cmd
    }

    fn run(&self, args: &[&str]) -> Output {
        self.sis_cmd().args(args).output().expect("failed to run sis")
    }

    /// Publish a binary package `name` 1.0 holding one executable.
    fn with_catalog(self) -> Self {
        std::fs::write(
            self.catalog.join("index.xml"),
            r#"<sis-extend>
                <message>Welcome to the test catalog</message>
                <package id="tool"><desc>A command line tool</desc><req name="libtool"/></package>
                <package id="libtool"><desc>Support library</desc></package>
            </sis-extend>"#,
        )
        .unwrap();
        write_package(&self.catalog, "tool", &[("install.xml", r#"<sis-install><install file="bin/tool"/></sis-install>"#), ("bin/tool", "#!/bin/sh\n")]);
        write_package(&self.catalog, "libtool", &[("install.xml", r#"<sis-install><install file="lib/libtool.a"/></sis-install>"#), ("lib/libtool.a", "!<arch>\n")]);
        std::fs::write(
            self.catalog.join("linux-x86_64/index.xml"),
            r#"<sis-extend>
                <package id="tool"><version number="1.0"><file>tool.tar.gz</file></version></package>
                <package id="libtool"><version number="0.9"><file>libtool.tar.gz</file></version></package>
            </sis-extend>"#,
        )
        .unwrap();
        self
    }
}

fn write_package(catalog: &Path, name: &str, files: &[(&str, &str)]) {
    let encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
    let mut builder = tar::Builder::new(encoder);
    for (file, content) in files {
        let mut header = tar::Header::new_gnu();
        header.set_size(content.len() as u64);
        header.set_mode(0o755);
        header.set_cksum();
        builder
            .append_data(&mut header, format!("{name}/{file}"), content.as_bytes())
            .unwrap();
    }
    let bytes = builder.into_inner().unwrap().finish().unwrap();
    std::fs::write(catalog.join("linux-x86_64").join(format!("{name}.tar.gz")), bytes).unwrap();
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn test_help_command() {
    let ctx = TestContext::new();
    let output = ctx.run(&["--help"]);
    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.contains("Usage:"));
    assert!(text.contains("install"));
    assert!(text.contains("uninstall"));
}

#[test]
fn test_init_creates_database() {
    let ctx = TestContext::new();
    let output = ctx.run(&["init"]);
    assert!(output.status.success(), "{}", stderr(&output));
    assert!(ctx.root.join("install.xml").is_file());
    assert!(ctx.root.join("logs").is_dir());
}

#[test]
fn test_list_shows_catalog() {
    let ctx = TestContext::new().with_catalog();
    let output = ctx.run(&["list"]);
    assert!(output.status.success(), "{}", stderr(&output));
    let text = stdout(&output);
    assert!(text.contains("Welcome to the test catalog"));
    assert!(text.contains("tool"));
    assert!(text.contains("not installed (avail. 1.0)"));
}

#[test]
fn test_install_and_uninstall() {
    let ctx = TestContext::new().with_catalog();

    let output = ctx.run(&["install", "tool"]);
    assert!(output.status.success(), "{}", stderr(&output));
    assert!(ctx.root.join("bin/tool").is_file());
    assert!(ctx.root.join("lib/libtool.a").is_file());

    let info = ctx.run(&["info", "tool"]);
    assert!(stdout(&info).contains("1.0 (binary)"));

    let blocked = ctx.run(&["uninstall", "libtool"]);
    assert!(!blocked.status.success());
    assert!(stderr(&blocked).contains("required by installed package(s): tool"));

    let output = ctx.run(&["uninstall", "tool", "libtool"]);
    assert!(output.status.success(), "{}", stderr(&output));
    assert!(!ctx.root.join("bin/tool").exists());
    assert!(!ctx.root.join("lib/libtool.a").exists());
}

#[test]
fn test_dry_run_changes_nothing() {
    let ctx = TestContext::new().with_catalog();
    let output = ctx.run(&["install", "--dry-run", "tool"]);
    assert!(output.status.success(), "{}", stderr(&output));
    let text = stdout(&output);
    assert!(text.find("libtool").unwrap() < text.rfind("tool").unwrap());
    assert!(!ctx.root.join("bin/tool").exists());
}

#[test]
fn test_unknown_package_fails() {
    let ctx = TestContext::new().with_catalog();
    let output = ctx.run(&["install", "nothing"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("nothing"));
}

#[test]
fn test_missing_catalog_fails() {
    let ctx = TestContext::new();
    let output = ctx.run(&["list"]);
    assert!(!output.status.success());
}

#[test]
fn test_sources_needs_build_dir() {
    let ctx = TestContext::new().with_catalog();
    let output = ctx.run(&["sources", "tool"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("build directory"));
}

#[test]
fn test_completions() {
    let ctx = TestContext::new();
    let output = ctx.run(&["completions", "bash"]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("sis"));
}
