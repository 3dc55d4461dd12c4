use assert_cmd::Command;
use predicates::prelude::*;
use std::fs::write;

const VIOLATION_PAYLOAD: &str = r##"{
    "violations": [
        {
            "id": "image-alt",
            "help": "Images must have alternate text",
            "helpUrl": "https://example.com/rules/image-alt?application=axeAPI&lang=en",
            "impact": "critical",
            "nodes": [
                {
                    "html": "<img src=\"hero.png\">",
                    "failureSummary": "Fix any of the following: missing alt",
                    "target": ["#hero > img"]
                }
            ]
        }
    ],
    "passes": []
}"##;

const CLEAN_PAYLOAD: &str = r#"{
    "violations": [],
    "passes": [
        { "id": "document-title", "help": "Documents must have a title" },
        { "id": "html-has-lang", "help": "The html element must have a lang attribute" }
    ]
}"#;

fn cmd() -> Command {
    Command::cargo_bin("axe-runner-cli").unwrap()
}

#[test]
fn clean_payload_passes_with_summary() {
    cmd()
        .arg("scan")
        .write_stdin(CLEAN_PAYLOAD)
        .assert()
        .success()
        .stdout(predicate::str::contains("axe: 2 passed."))
        .stdout(predicate::str::contains("Verdict: pass"));
}

#[test]
fn violations_fail_with_exit_code_one() {
    cmd()
        .arg("scan")
        .write_stdin(VIOLATION_PAYLOAD)
        .assert()
        .code(1)
        .stdout(predicate::str::contains("-----1 axe violations-----"))
        .stdout(predicate::str::contains(
            "See: https://example.com/rules/image-alt",
        ))
        .stdout(predicate::str::contains("?application").not());
}

#[test]
fn selector_lines_require_the_flag() {
    cmd()
        .arg("scan")
        .write_stdin(VIOLATION_PAYLOAD)
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Selector:").not());

    cmd()
        .args(["scan", "--selectors"])
        .write_stdin(VIOLATION_PAYLOAD)
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Selector: #hero > img"));
}

#[test]
fn results_can_come_from_a_file() {
    let file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
    write(file.path(), VIOLATION_PAYLOAD).unwrap();

    cmd()
        .args(["scan", file.path().to_str().unwrap(), "--json"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("\"verdict\": \"fail\""));
}

#[test]
fn verbose_lists_each_pass() {
    cmd()
        .args(["scan", "--verbose"])
        .write_stdin(CLEAN_PAYLOAD)
        .assert()
        .success()
        .stdout(predicate::str::contains("Documents must have a title"));
}

#[test]
fn config_file_supplies_defaults_and_flags_override_it() {
    let dir = tempfile::tempdir().unwrap();
    let conf = dir.path().join("axe.conf.json");
    write(
        &conf,
        r##"{
  // project-wide scan settings
  context: "#app",
  options: { timeout: 3000, selectors: true },
}"##,
    )
    .unwrap();

    cmd()
        .args([
            "--config",
            conf.to_str().unwrap(),
            "show-config",
            "--timeout",
            "500",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"context\": \"#app\""))
        .stdout(predicate::str::contains("\"timeout\": 500"))
        .stdout(predicate::str::contains("\"selectors\": true"));
}

#[test]
fn malformed_config_file_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let conf = dir.path().join("axe.conf.json");
    write(&conf, "{ context: ").unwrap();

    cmd()
        .args(["--config", conf.to_str().unwrap(), "show-config"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid config file"));
}

#[test]
fn garbage_results_payload_is_rejected() {
    cmd()
        .arg("scan")
        .write_stdin("not json")
        .assert()
        .failure()
        .stderr(predicate::str::contains("not valid axe-core JSON"));
}
