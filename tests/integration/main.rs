//! Integration tests for crumbjar

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use chrono::{Duration, Utc};
    use crumbjar::jar::Entry;
    use predicates::prelude::*;
    use std::fs;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    const HEX_KEY: &str = "00112233445566778899aabbccddeeff";

    /// A temp dir holding a config path (never created) and a jar path
    struct Sandbox {
        dir: TempDir,
    }

    impl Sandbox {
        fn new() -> Self {
            Self {
                dir: TempDir::new().unwrap(),
            }
        }

        fn jar(&self) -> PathBuf {
            self.dir.path().join("cookies.json")
        }

        fn config(&self) -> PathBuf {
            self.dir.path().join("config.toml")
        }

        fn cmd(&self) -> Command {
            let mut cmd = cargo_bin_cmd!("crumbjar");
            cmd.env_remove("CRUMBJAR_KEY")
                .env_remove("CRUMBJAR_JAR")
                .env("CRUMBJAR_CONFIG", self.config())
                .arg("--jar")
                .arg(self.jar());
            cmd
        }

        fn seed(&self, path: &Path, entries: &[Entry]) {
            fs::write(path, serde_json::to_string(entries).unwrap()).unwrap();
        }

        fn stored(&self) -> Vec<Entry> {
            serde_json::from_str(&fs::read_to_string(self.jar()).unwrap()).unwrap()
        }
    }

    fn cookie(domain: &str, name: &str, value: &str) -> Entry {
        let now = Utc::now();
        Entry::new(domain, "/", name, value, now + Duration::days(1), now)
    }

    fn expired(domain: &str, name: &str) -> Entry {
        let now = Utc::now();
        Entry::new(domain, "/", name, "old", now - Duration::days(1), now - Duration::days(2))
    }

    #[test]
    fn help_displays() {
        cargo_bin_cmd!("crumbjar")
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("Persistent cookie jar shared safely between processes"))
            .stdout(predicate::str::contains("Show or initialize configuration"));
    }

    #[test]
    fn version_displays() {
        cargo_bin_cmd!("crumbjar")
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("crumbjar"));
    }

    #[test]
    fn keygen_prints_hex_key() {
        cargo_bin_cmd!("crumbjar")
            .arg("keygen")
            .assert()
            .success()
            .stdout(predicate::str::is_match("^[0-9a-f]{64}\n$").unwrap());

        cargo_bin_cmd!("crumbjar")
            .args(["keygen", "--bits", "128"])
            .assert()
            .success()
            .stdout(predicate::str::is_match("^[0-9a-f]{32}\n$").unwrap());
    }

    #[test]
    fn keygen_rejects_bad_size() {
        cargo_bin_cmd!("crumbjar")
            .args(["keygen", "--bits", "100"])
            .assert()
            .failure();
    }

    #[test]
    fn list_empty() {
        let sandbox = Sandbox::new();
        sandbox
            .cmd()
            .arg("list")
            .assert()
            .success()
            .stdout(predicate::str::contains("No cookies in jar"));

        sandbox
            .cmd()
            .args(["list", "--format", "json"])
            .assert()
            .success()
            .stdout(predicate::str::diff("[]\n"));
    }

    #[test]
    fn list_formats() {
        let sandbox = Sandbox::new();
        sandbox.seed(&sandbox.jar(), &[cookie("example.com", "sid", "s3cret")]);

        sandbox
            .cmd()
            .args(["list", "--format", "json"])
            .assert()
            .success()
            .stdout(predicate::str::contains("\"sid\""))
            .stdout(predicate::str::contains("s3cret").not());

        sandbox
            .cmd()
            .args(["list", "--format", "plain", "--show-values"])
            .assert()
            .success()
            .stdout(predicate::str::contains("example.com\t/\tsid\ts3cret"));
    }

    #[test]
    fn list_rejects_corrupt_file() {
        let sandbox = Sandbox::new();
        fs::write(sandbox.jar(), "not json").unwrap();

        sandbox
            .cmd()
            .arg("list")
            .assert()
            .failure()
            .stderr(predicate::str::contains("not valid JSON"));
    }

    #[test]
    fn purge_drops_expired() {
        let sandbox = Sandbox::new();
        sandbox.seed(
            &sandbox.jar(),
            &[cookie("a.com", "live", "1"), expired("b.com", "stale")],
        );

        sandbox
            .cmd()
            .arg("purge")
            .assert()
            .success()
            .stdout(predicate::str::contains("Purged 1 expired cookie(s)"));

        let stored = sandbox.stored();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].name, "live");
    }

    #[test]
    fn list_hides_expired() {
        let sandbox = Sandbox::new();
        sandbox.seed(
            &sandbox.jar(),
            &[cookie("a.com", "live", "1"), expired("b.com", "stale")],
        );

        sandbox
            .cmd()
            .args(["list", "--format", "plain"])
            .assert()
            .success()
            .stdout(predicate::str::contains("live"))
            .stdout(predicate::str::contains("stale").not());
    }

    #[test]
    fn purge_recovers_corrupt_file() {
        let sandbox = Sandbox::new();
        fs::write(sandbox.jar(), "{{{ garbage").unwrap();

        sandbox
            .cmd()
            .arg("purge")
            .assert()
            .success()
            .stderr(predicate::str::contains("ignoring it"));

        assert!(sandbox.stored().is_empty());
    }

    #[test]
    fn remove_cookie() {
        let sandbox = Sandbox::new();
        sandbox.seed(
            &sandbox.jar(),
            &[cookie("a.com", "keep", "1"), cookie("a.com", "drop", "2")],
        );

        sandbox
            .cmd()
            .args(["remove", "a.com", "/", "drop"])
            .assert()
            .success();

        let names: Vec<_> = sandbox.stored().into_iter().map(|e| e.name).collect();
        assert_eq!(names, ["keep"]);
    }

    #[test]
    fn remove_missing_cookie_fails() {
        let sandbox = Sandbox::new();
        sandbox
            .cmd()
            .args(["remove", "a.com", "/", "ghost"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("No cookie named 'ghost'"));
    }

    #[test]
    fn clear_requires_confirmation() {
        let sandbox = Sandbox::new();
        sandbox.seed(&sandbox.jar(), &[cookie("a.com", "n", "v")]);

        // Non-interactive without --yes keeps everything
        sandbox
            .cmd()
            .arg("clear")
            .assert()
            .success()
            .stderr(predicate::str::contains("Nothing deleted"));
        assert_eq!(sandbox.stored().len(), 1);

        sandbox
            .cmd()
            .args(["clear", "--yes"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Deleted 1 cookie(s)"));
        assert!(sandbox.stored().is_empty());
    }

    #[test]
    fn merge_other_file() {
        let sandbox = Sandbox::new();
        let other = sandbox.dir.path().join("other.json");
        sandbox.seed(&sandbox.jar(), &[cookie("a.com", "mine", "1")]);
        sandbox.seed(&other, &[cookie("b.com", "theirs", "2")]);
        let other_before = fs::read_to_string(&other).unwrap();

        sandbox
            .cmd()
            .arg("merge")
            .arg(&other)
            .assert()
            .success()
            .stdout(predicate::str::contains("Merged 1 cookie(s)"));

        assert_eq!(sandbox.stored().len(), 2);
        assert_eq!(fs::read_to_string(&other).unwrap(), other_before);
    }

    #[test]
    fn encrypted_jar_hides_values() {
        let sandbox = Sandbox::new();
        let plain = sandbox.dir.path().join("plain.json");
        sandbox.seed(&plain, &[cookie("a.com", "sid", "visible-value")]);

        sandbox
            .cmd()
            .env("CRUMBJAR_KEY", HEX_KEY)
            .arg("merge")
            .arg(&plain)
            .assert()
            .success();

        let raw = fs::read_to_string(sandbox.jar()).unwrap();
        assert!(!raw.contains("visible-value"));
        assert!(raw.contains("\"EncryptedValue\":\"v01"));

        sandbox
            .cmd()
            .env("CRUMBJAR_KEY", HEX_KEY)
            .args(["list", "--format", "plain", "--show-values"])
            .assert()
            .success()
            .stdout(predicate::str::contains("visible-value"));
    }

    #[test]
    fn wrong_key_skips_entries() {
        let sandbox = Sandbox::new();
        let plain = sandbox.dir.path().join("plain.json");
        sandbox.seed(&plain, &[cookie("a.com", "sid", "v")]);
        sandbox
            .cmd()
            .env("CRUMBJAR_KEY", HEX_KEY)
            .arg("merge")
            .arg(&plain)
            .assert()
            .success();

        sandbox
            .cmd()
            .env("CRUMBJAR_KEY", "ff".repeat(16))
            .args(["list", "--format", "json"])
            .assert()
            .success()
            .stdout(predicate::str::diff("[]\n"));
    }

    #[test]
    fn fingerprint_requires_key() {
        let sandbox = Sandbox::new();
        sandbox
            .cmd()
            .arg("fingerprint")
            .assert()
            .failure()
            .stderr(predicate::str::contains("No encryption key configured"))
            .stderr(predicate::str::contains("crumbjar keygen"));

        sandbox
            .cmd()
            .env("CRUMBJAR_KEY", HEX_KEY)
            .arg("fingerprint")
            .assert()
            .success()
            .stdout(predicate::str::is_match("^[0-9a-f]{12}\n$").unwrap());
    }

    #[test]
    fn invalid_key_is_reported() {
        let sandbox = Sandbox::new();
        sandbox
            .cmd()
            .env("CRUMBJAR_KEY", "abc")
            .arg("list")
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid encryption key"));
    }

    #[test]
    fn config_path_and_init() {
        let sandbox = Sandbox::new();
        sandbox
            .cmd()
            .args(["config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("config.toml"));

        sandbox
            .cmd()
            .args(["config", "init"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Configuration initialized"));
        assert!(sandbox.config().exists());

        sandbox
            .cmd()
            .args(["config", "init"])
            .assert()
            .success()
            .stderr(predicate::str::contains("Use --force to overwrite"));
    }

    #[test]
    fn config_show() {
        let sandbox = Sandbox::new();
        sandbox
            .cmd()
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[lock]"))
            .stdout(predicate::str::contains("timeout_ms = 100"));
    }

    #[test]
    fn config_file_selects_jar() {
        let sandbox = Sandbox::new();
        let configured = sandbox.dir.path().join("configured.json");
        fs::write(
            sandbox.config(),
            format!("[jar]\npath = {:?}\n", configured.display().to_string()),
        )
        .unwrap();
        sandbox.seed(&configured, &[cookie("a.com", "from-config", "1")]);

        let mut cmd = cargo_bin_cmd!("crumbjar");
        cmd.env_remove("CRUMBJAR_KEY")
            .env_remove("CRUMBJAR_JAR")
            .arg("--config")
            .arg(sandbox.config())
            .args(["list", "--format", "plain"])
            .assert()
            .success()
            .stdout(predicate::str::contains("from-config"));
    }

    #[test]
    fn malformed_config_fails() {
        let sandbox = Sandbox::new();
        fs::write(sandbox.config(), "[lock]\nstrategy = \"bogus\"\n").unwrap();
        sandbox
            .cmd()
            .arg("list")
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid configuration"));
    }
}
