use anyhow::Result;
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use sourcemap::{SourceMap, SourceMapBuilder};

use crate::CliTest;

const MAIN_JS: &str = "\
const nls = require('vscode-nls');
const localize = nls.loadMessageBundle();
console.log(localize('greeting', 'Hello {0}', name));
";

const BAD_JS: &str = "\
const nls = require('vscode-nls');
const localize = nls.loadMessageBundle();
localize(key, 'A');
";

fn read_json(test: &CliTest, path: &str) -> Result<Value> {
    Ok(serde_json::from_str(&test.read_file(path)?)?)
}

#[test]
fn test_process_rewrites_in_place() -> Result<()> {
    let test = CliTest::with_file("out/main.js", MAIN_JS)?;

    let output = test.process_command().output()?;
    assert!(output.status.success());
    assert!(String::from_utf8(output.stdout)?.contains("Rewrote 1 file of 1 (1 message)"));

    insta::assert_snapshot!(test.read_file("out/main.js")?, @r"
    const nls = require('vscode-nls');
    const localize = nls.loadMessageBundle(__filename);
    console.log(localize(0, null, name));
    ");
    assert_eq!(test.read_file("out/main.nls.json")?, r#"["Hello {0}"]"#);
    assert_eq!(
        read_json(&test, "out/main.nls.metadata.json")?,
        json!({
            "messages": ["Hello {0}"],
            "keys": ["greeting"],
            "filePath": "main"
        })
    );
    assert!(!test.exists("out/nls.metadata.json"));

    Ok(())
}

#[test]
fn test_process_leaves_other_files_untouched() -> Result<()> {
    let test = CliTest::with_file("out/plain.js", "console.log('hi');\n")?;
    test.write_file("out/main.js", MAIN_JS)?;

    let output = test.process_command().output()?;
    assert!(output.status.success());
    assert_eq!(test.read_file("out/plain.js")?, "console.log('hi');\n");
    assert!(!test.exists("out/plain.nls.json"));

    Ok(())
}

#[test]
fn test_process_reports_invalid_calls() -> Result<()> {
    let test = CliTest::with_file("out/bad.js", BAD_JS)?;
    test.write_file("out/main.js", MAIN_JS)?;

    let output = test.process_command().output()?;
    assert_eq!(output.status.code(), Some(1));

    let stdout = String::from_utf8(output.stdout)?;
    assert!(stdout.contains("error: key argument must be a string literal"));
    assert!(stdout.contains("--> out/bad.js:3:10"));
    assert!(stdout.contains("3 | localize(key, 'A');"));
    assert!(stdout.contains("1 problems (1 error, 0 warnings)"));

    assert_eq!(test.read_file("out/bad.js")?, BAD_JS);
    assert!(!test.exists("out/bad.nls.json"));
    // Other files are still processed.
    assert!(test.exists("out/main.nls.json"));

    Ok(())
}

#[test]
fn test_process_with_bundle_id() -> Result<()> {
    let test = CliTest::with_file("out/main.js", MAIN_JS)?;
    test.write_file("out/util/strings.js", MAIN_JS)?;

    let output = test
        .process_command()
        .args(["--bundle-id", "publisher.extension"])
        .output()?;
    assert!(output.status.success());

    let bundle = read_json(&test, "out/nls.metadata.json")?;
    assert_eq!(
        bundle,
        json!({
            "main": { "messages": ["Hello {0}"], "keys": ["greeting"] },
            "util/strings": { "messages": ["Hello {0}"], "keys": ["greeting"] }
        })
    );

    let header = read_json(&test, "out/nls.metadata.header.json")?;
    assert_eq!(header["id"], "publisher.extension");
    assert_eq!(header["type"], "extensionBundle");
    assert_eq!(header["outDir"], "out");
    assert_eq!(header["hash"].as_str().map(str::len), Some(64));

    Ok(())
}

#[test]
fn test_process_into_out_dir() -> Result<()> {
    let test = CliTest::with_file("out/main.js", MAIN_JS)?;

    let output = test.process_command().args(["--out-dir", "dist"]).output()?;
    assert!(output.status.success());

    assert_eq!(test.read_file("out/main.js")?, MAIN_JS);
    assert!(test.read_file("dist/main.js")?.contains("localize(0, null, name)"));
    assert!(test.exists("dist/main.nls.json"));
    assert!(test.exists("dist/main.nls.metadata.json"));

    Ok(())
}

#[test]
fn test_process_relative_paths() -> Result<()> {
    let test = CliTest::with_file("out/main.js", MAIN_JS)?;

    let output = test.process_command().arg("--relative-paths").output()?;
    assert!(output.status.success());
    assert!(test.read_file("out/main.js")?.contains(
        "nls.loadMessageBundle(require('path').join(__dirname, 'main.js'))"
    ));

    Ok(())
}

fn source_map(positions: &[(u32, u32)]) -> Result<String> {
    let mut builder = SourceMapBuilder::new(Some("main.js"));
    for &(line, column) in positions {
        builder.add(line, column, line, column, Some("main.ts"), None, false);
    }
    let mut out = Vec::new();
    builder.into_sourcemap().to_writer(&mut out)?;
    Ok(String::from_utf8(out)?)
}

#[test]
fn test_process_rewrites_sibling_source_map() -> Result<()> {
    let test = CliTest::with_file("out/main.js", MAIN_JS)?;
    // Line 1: after `loadMessageBundle()`. Line 2: inside 'Hello {0}' and at `name`.
    test.write_file(
        "out/main.js.map",
        &source_map(&[(1, 0), (1, 40), (2, 0), (2, 35), (2, 46)])?,
    )?;

    let output = test.process_command().output()?;
    assert!(output.status.success());

    let map = SourceMap::from_slice(test.read_file("out/main.js.map")?.as_bytes())?;
    let tokens: Vec<((u32, u32), (u32, u32))> = map
        .tokens()
        .map(|t| {
            (
                (t.get_dst_line(), t.get_dst_col()),
                (t.get_src_line(), t.get_src_col()),
            )
        })
        .collect();
    assert_eq!(
        tokens,
        vec![
            ((1, 0), (1, 0)),
            ((1, 50), (1, 40)),
            ((2, 0), (2, 0)),
            ((2, 30), (2, 46)),
        ]
    );
    assert_eq!(map.get_source(0), Some("main.ts"));

    Ok(())
}

#[test]
fn test_process_out_dir_copies_files_not_rewritten() -> Result<()> {
    let test = CliTest::with_file("out/main.js", MAIN_JS)?;
    test.write_file("out/lib/plain.js", "console.log('hi');\n")?;
    test.write_file("out/lib/plain.js.map", &source_map(&[(0, 0)])?)?;
    test.write_file("out/bad.js", BAD_JS)?;

    let output = test.process_command().args(["--out-dir", "dist"]).output()?;
    // bad.js has an invalid call.
    assert_eq!(output.status.code(), Some(1));

    assert_eq!(test.read_file("dist/lib/plain.js")?, "console.log('hi');\n");
    assert_eq!(
        test.read_file("dist/lib/plain.js.map")?,
        test.read_file("out/lib/plain.js.map")?
    );
    assert_eq!(test.read_file("dist/bad.js")?, BAD_JS);
    assert!(!test.exists("dist/lib/plain.nls.json"));
    assert!(!test.exists("dist/bad.nls.json"));
    assert!(test.exists("dist/main.nls.json"));

    Ok(())
}

#[test]
fn test_process_keeps_byte_order_mark() -> Result<()> {
    let test = CliTest::with_file("out/main.js", &format!("\u{feff}{}", MAIN_JS))?;

    let output = test.process_command().output()?;
    assert!(output.status.success());

    let rewritten = test.read_file("out/main.js")?;
    assert!(rewritten.starts_with('\u{feff}'));
    assert!(rewritten.contains("nls.loadMessageBundle(__filename);"));
    assert!(rewritten.contains("console.log(localize(0, null, name));"));
    assert_eq!(test.read_file("out/main.nls.json")?, r#"["Hello {0}"]"#);

    Ok(())
}

#[test]
fn test_process_uses_config_file() -> Result<()> {
    let test = CliTest::with_file(
        ".nlsrc.json",
        r#"{ "root": "./build", "moduleName": "@scope/nls", "bundleId": "pub.ext" }"#,
    )?;
    test.write_file(
        "build/main.js",
        "const nls = require('@scope/nls');\nconst localize = nls.loadMessageBundle();\nlocalize('a', 'A');\n",
    )?;

    let output = test.process_command().output()?;
    assert!(output.status.success());
    assert_eq!(test.read_file("build/main.nls.json")?, r#"["A"]"#);
    assert!(test.exists("build/nls.metadata.header.json"));

    Ok(())
}

#[test]
fn test_process_missing_root_is_error() -> Result<()> {
    let test = CliTest::new()?;

    let output = test.process_command().args(["--root", "missing"]).output()?;
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8(output.stderr)?.starts_with("Error: Root directory not found"));

    Ok(())
}
