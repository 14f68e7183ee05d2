//! End-to-end linting of files on disk.

use std::fs;
use std::path::Path;

use firestore_lint::config::discover_config;
use firestore_lint::{LintConfig, Linter, RuleCategory, RuleSeverity};

const SAVE_PROFILE: &str = r#"import { doc, getFirestore, setDoc } from 'firebase/firestore';

export async function saveProfile(uid: string, name?: string) {
  const profile = { name, updatedAt: undefined };
  await setDoc(doc(getFirestore(), 'users', uid), profile);
}
"#;

fn write(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_lint_file_reports_both_rules() {
    let dir = tempfile::tempdir().unwrap();
    let file = write(dir.path(), "src/profile.ts", SAVE_PROFILE);

    let linter = Linter::new(LintConfig::default());
    let diagnostics = linter.lint_file(&file).unwrap();

    let found: Vec<(&str, usize, RuleSeverity)> = diagnostics
        .iter()
        .map(|d| (d.rule_id.as_str(), d.line, d.severity))
        .collect();
    assert_eq!(
        found,
        vec![
            ("firestore-no-undefined-values", 5, RuleSeverity::Error),
            ("firestore-set-require-merge", 5, RuleSeverity::Warning),
        ]
    );
    assert_eq!(diagnostics[0].column, 50);
    assert_eq!(diagnostics[1].column, 8);
}

#[test]
fn test_lint_file_missing() {
    let dir = tempfile::tempdir().unwrap();
    let linter = Linter::new(LintConfig::default());
    let err = linter.lint_file(dir.path().join("absent.js")).unwrap_err();
    assert!(format!("{err:#}").contains("absent.js"));
}

#[test]
fn test_project_config_overrides() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        ".firestore-lint.toml",
        r#"
[lints]
suggestion = "allow"
firestore-no-undefined-values = { level = "warn", additionalObjects = ["batch"] }
"#,
    );
    let file = write(
        dir.path(),
        "functions/index.js",
        "batch.set({ a: undefined });\ntransaction.set({ a: undefined });\ndoc().set({});\n",
    );

    let project = discover_config(&file).unwrap();
    let linter = Linter::new(LintConfig {
        project,
        ..LintConfig::default()
    });
    let diagnostics = linter.lint_file(&file).unwrap();

    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].rule_id, "firestore-no-undefined-values");
    assert_eq!(diagnostics[0].line, 1);
    assert_eq!(diagnostics[0].severity, RuleSeverity::Warning);
}

#[test]
fn test_invalid_project_config() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "firestore-lint.toml",
        "[lints]\nfirestore-set-require-merge = { level = \"warn\", merge = true }\n",
    );
    let err = discover_config(dir.path()).unwrap_err();
    assert!(format!("{err:#}").contains("does not accept options"));
}

#[test]
fn test_cli_style_filters() {
    let code = "doc().set({ a: undefined });";

    let errors_only = Linter::new(LintConfig {
        min_severity: RuleSeverity::Error,
        ..LintConfig::default()
    });
    let diagnostics = errors_only.lint_str(code, "a.js").unwrap();
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].rule_id, "firestore-no-undefined-values");

    let suggestions_only = Linter::new(LintConfig {
        all_rules: false,
        categories: vec![RuleCategory::Suggestion],
        ..LintConfig::default()
    });
    let diagnostics = suggestions_only.lint_str(code, "a.js").unwrap();
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].rule_id, "firestore-set-require-merge");

    let disabled = Linter::new(LintConfig {
        disabled_rules: vec!["firestore-set-require-merge".to_string()],
        ..LintConfig::default()
    });
    assert_eq!(disabled.lint_str(code, "a.js").unwrap().len(), 1);
}

#[test]
fn test_jsx_and_unsupported_files() {
    let linter = Linter::new(LintConfig::default());

    let jsx = "export const Save = () => <button onClick={() => setDoc(ref, { a: undefined }, { merge: true })} />;";
    let diagnostics = linter.lint_str(jsx, "Save.jsx").unwrap();
    assert_eq!(diagnostics.len(), 1);

    let tsx = "export const Save = () => <button onClick={() => setDoc(ref, { a: undefined }, { merge: true })} />;";
    assert_eq!(linter.lint_str(tsx, "Save.tsx").unwrap().len(), 1);

    assert!(linter
        .lint_str("doc().set({ a: undefined })", "README.md")
        .unwrap()
        .is_empty());
}

#[test]
fn test_suppression_comments() {
    let linter = Linter::new(LintConfig::default());
    let code = r#"
// firestore-lint-disable-next-line firestore-set-require-merge -- full overwrite intended
doc().set({ a: 1 });
doc().set({ b: undefined }); // firestore-lint-disable-line
doc().set({ c: 1 });
"#;
    let diagnostics = linter.lint_str(code, "a.js").unwrap();
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].line, 5);
}
