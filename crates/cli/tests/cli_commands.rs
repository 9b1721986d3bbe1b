use std::path::Path;
use std::process::Command;

use tempfile::TempDir;

fn run_msgr(workdir: &Path, args: &[&str]) -> (bool, String, String) {
	let output = Command::new(env!("CARGO_BIN_EXE_msgr"))
		.current_dir(workdir)
		.args(args)
		.output()
		.expect("failed to execute msgr");

	let stdout = String::from_utf8_lossy(&output.stdout).to_string();
	let stderr = String::from_utf8_lossy(&output.stderr).to_string();
	(output.status.success(), stdout, stderr)
}

#[test]
fn state_show_lists_cookies_and_identity() {
	let temp = TempDir::new().unwrap();
	std::fs::write(
		temp.path().join("state.json"),
		r#"[
  {"key": "c_user", "value": "100", "domain": ".example.com", "path": "/"},
  {"key": "xs", "value": "secret", "domain": ".example.com", "expires": "Fri, 01 Jan 2027 00:00:00 GMT"}
]"#,
	)
	.unwrap();

	let (success, stdout, stderr) = run_msgr(temp.path(), &["state", "show", "state.json"]);
	assert!(success, "stderr: {stderr}");
	assert!(stdout.contains("COOKIES (2):"));
	assert!(stdout.contains("Fri, 01 Jan 2027 00:00:00 GMT"));
	assert!(stdout.contains("identity: 100"));
}

#[test]
fn state_show_rejects_malformed_files() {
	let temp = TempDir::new().unwrap();
	std::fs::write(temp.path().join("state.json"), "{ nope").unwrap();

	let (success, _stdout, _stderr) = run_msgr(temp.path(), &["state", "show", "state.json"]);
	assert!(!success);
}

#[test]
fn config_init_refuses_to_overwrite_without_force() {
	let temp = TempDir::new().unwrap();
	let path = temp.path().join("cfg").join("config.json");
	let path_arg = path.to_str().unwrap();

	let (success, stdout, stderr) = run_msgr(temp.path(), &["config", "init", "--path", path_arg]);
	assert!(success, "stderr: {stderr}");
	assert!(stdout.contains("Wrote default configuration"));
	let written: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
	assert_eq!(written["mqtt"]["reconnectInterval"], 3600);

	let (success, _, _) = run_msgr(temp.path(), &["config", "init", "--path", path_arg]);
	assert!(!success);

	let (success, _, stderr) = run_msgr(temp.path(), &["config", "init", "--path", path_arg, "--force"]);
	assert!(success, "stderr: {stderr}");
}

#[test]
fn config_show_merges_over_defaults() {
	let temp = TempDir::new().unwrap();
	let path = temp.path().join("config.json");
	std::fs::write(&path, r#"{"autoUpdate": false}"#).unwrap();

	let (success, stdout, stderr) = run_msgr(temp.path(), &["config", "show", "--path", path.to_str().unwrap()]);
	assert!(success, "stderr: {stderr}");
	assert!(stdout.contains(r#""autoUpdate": false"#));
	assert!(stdout.contains(r#""reconnectInterval": 3600"#));
}
