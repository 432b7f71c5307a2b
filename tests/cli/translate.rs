use anyhow::Result;
use pretty_assertions::assert_eq;
use serde_json::{Value, json};

use crate::CliTest;

const METADATA: &str = r#"{
  "messages": ["Hello {0}", "Bye"],
  "keys": ["greeting", { "key": "bye", "comment": ["Shown on exit"] }],
  "filePath": "main"
}"#;

const GERMAN: &str = r#"{
  // translated by hand
  "greeting": "Hallo {0}", /* keep placeholder */
  "bye": "Tschüss"
}"#;

fn read_json(test: &CliTest, path: &str) -> Result<Value> {
    Ok(serde_json::from_str(&test.read_file(path)?)?)
}

#[test]
fn test_translate_metadata_files() -> Result<()> {
    let test = CliTest::with_file("out/main.nls.metadata.json", METADATA)?;
    test.write_file("i18n/deu/main.i18n.json", GERMAN)?;

    let output = test.translate_command().args(["-l", "deu:de"]).output()?;
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    assert_eq!(
        read_json(&test, "out/main.nls.de.json")?,
        json!(["Hallo {0}", "Tschüss"])
    );
    let stdout = String::from_utf8(output.stdout)?;
    assert!(!stdout.contains("warning:"));
    assert!(stdout.contains("Wrote 1 file for 1 bundle and 1 language"));

    Ok(())
}

#[test]
fn test_translate_reports_missing_messages() -> Result<()> {
    let test = CliTest::with_file("out/main.nls.metadata.json", METADATA)?;
    test.write_file("i18n/deu/main.i18n.json", r#"{ "greeting": "Hallo {0}" }"#)?;

    let output = test
        .translate_command()
        .args(["-l", "deu:de", "-l", "fra"])
        .output()?;
    // Missing translations are warnings only.
    assert!(output.status.success());

    assert_eq!(
        read_json(&test, "out/main.nls.de.json")?,
        json!(["Hallo {0}", "Bye"])
    );
    assert_eq!(
        read_json(&test, "out/main.nls.fra.json")?,
        json!(["Hello {0}", "Bye"])
    );

    let stdout = String::from_utf8(output.stdout)?;
    assert!(stdout.contains("warning: No localized message found for key bye [de]"));
    assert!(stdout.contains("warning: No localized messages found for file main [fra]"));
    assert!(stdout.contains("--> out/main.nls.metadata.json"));
    assert!(stdout.contains("2 problems (0 errors, 2 warnings)"));

    Ok(())
}

#[test]
fn test_translate_package_messages() -> Result<()> {
    let test = CliTest::with_file(
        "out/package.nls.json",
        r#"{
  "displayName": "Sample",
  "command.run": { "message": "Run", "comment": ["Command title"] }
}"#,
    )?;
    test.write_file("i18n/deu/package.i18n.json", r#"{ "command.run": "Ausführen" }"#)?;

    let output = test.translate_command().args(["-l", "deu:de"]).output()?;
    assert!(output.status.success());

    let translated = test.read_file("out/package.nls.de.json")?;
    assert_eq!(
        serde_json::from_str::<Value>(&translated)?,
        json!({ "displayName": "Sample", "command.run": "Ausführen" })
    );
    // Key order follows package.nls.json.
    assert!(translated.find("displayName") < translated.find("command.run"));

    Ok(())
}

#[test]
fn test_translate_metadata_bundle() -> Result<()> {
    let test = CliTest::with_file(
        "out/nls.metadata.json",
        r#"{ "main": { "messages": ["Hello {0}"], "keys": ["greeting"] } }"#,
    )?;
    test.write_file("i18n/deu/main.i18n.json", GERMAN)?;

    let output = test.translate_command().args(["-l", "deu:de"]).output()?;
    assert!(output.status.success());
    assert_eq!(
        read_json(&test, "out/nls.bundle.de.json")?,
        json!({ "main": ["Hallo {0}"] })
    );

    Ok(())
}

#[test]
fn test_translate_after_process() -> Result<()> {
    let test = CliTest::with_file(
        "out/main.js",
        "const nls = require('vscode-nls');\nconst localize = nls.loadMessageBundle();\nlocalize('greeting', 'Hello {0}', name);\n",
    )?;
    test.write_file("i18n/deu/main.i18n.json", GERMAN)?;

    assert!(test.process_command().output()?.status.success());
    let output = test.translate_command().args(["-l", "deu:de"]).output()?;
    assert!(output.status.success());
    assert_eq!(
        read_json(&test, "out/main.nls.de.json")?,
        json!(["Hallo {0}"])
    );

    Ok(())
}

#[test]
fn test_translate_requires_language() -> Result<()> {
    let test = CliTest::new()?;
    let output = test.translate_command().output()?;
    assert!(!output.status.success());
    Ok(())
}
