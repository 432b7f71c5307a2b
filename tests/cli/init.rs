use anyhow::{Context, Result};
use serde_json::Value;

use crate::CliTest;

/// Validates config file structure and default values.
fn assert_config_content(content: &str) -> Result<()> {
    let parsed: Value = serde_json::from_str(content).context("Config should be valid JSON")?;

    assert_eq!(parsed["includes"], serde_json::json!(["**/*.js"]));
    assert_eq!(parsed["root"], "./out");
    assert_eq!(parsed["moduleName"], "vscode-nls");
    assert!(
        parsed.get("i18nRoot").is_some(),
        "Config should have 'i18nRoot' field"
    );

    Ok(())
}

#[test]
fn test_init_creates_config() -> Result<()> {
    let test = CliTest::new()?;

    let output = test.command().arg("init").output()?;
    assert!(output.status.success());
    assert!(String::from_utf8(output.stdout)?.contains("Created .nlsrc.json"));

    assert!(test.root().join(".nlsrc.json").exists());
    let content = test.read_file(".nlsrc.json")?;
    assert_config_content(&content)?;

    Ok(())
}

#[test]
fn test_init_fails_if_exists() -> Result<()> {
    let test = CliTest::with_file(".nlsrc.json", "{}")?;

    let output = test.command().arg("init").output()?;
    assert_eq!(output.status.code(), Some(2));
    assert_eq!(
        String::from_utf8(output.stderr)?,
        "Error: .nlsrc.json already exists\n"
    );
    assert_eq!(test.read_file(".nlsrc.json")?, "{}");

    Ok(())
}

#[test]
fn test_init_config_is_immediately_usable() -> Result<()> {
    let test = CliTest::new()?;
    test.command().arg("init").output()?;

    test.write_file("out/main.js", "console.log('hi');\n")?;

    let output = test.process_command().output()?;
    assert!(
        output.status.success(),
        "Process command should work with initialized config. stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert_eq!(test.read_file("out/main.js")?, "console.log('hi');\n");

    Ok(())
}
