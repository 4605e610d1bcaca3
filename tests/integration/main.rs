//! Integration tests for thumbcask

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    /// A command with cache and config isolated to a sandbox
    fn thumbcask(sandbox: &Path) -> Command {
        let mut cmd = cargo_bin_cmd!("thumbcask");
        cmd.env("XDG_CACHE_HOME", sandbox.join("cache"));
        cmd.env("XDG_CONFIG_HOME", sandbox.join("config"));
        cmd.env("HOME", sandbox);
        cmd
    }

    fn write_source_png(dir: &Path) -> PathBuf {
        let src = dir.join("photo.png");
        image::RgbaImage::from_fn(96, 64, |x, y| {
            image::Rgba([(x * 2) as u8, (y * 3) as u8, 64, 255])
        })
        .save(&src)
        .unwrap();
        src
    }

    #[test]
    fn help_displays() {
        let sandbox = TempDir::new().unwrap();
        thumbcask(sandbox.path())
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("shared thumbnail cache"));
    }

    #[test]
    fn version_displays() {
        let sandbox = TempDir::new().unwrap();
        thumbcask(sandbox.path())
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("thumbcask"));
    }

    #[test]
    fn completions_generate() {
        let sandbox = TempDir::new().unwrap();
        thumbcask(sandbox.path())
            .args(["--completions", "bash"])
            .assert()
            .success()
            .stdout(predicate::str::contains("thumbcask"));
    }

    #[test]
    fn generates_and_prints_thumbnail_path() {
        let sandbox = TempDir::new().unwrap();
        let src = write_source_png(sandbox.path());

        let output = thumbcask(sandbox.path())
            .arg(&src)
            .output()
            .unwrap();
        assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

        let printed = String::from_utf8(output.stdout).unwrap();
        let path = PathBuf::from(printed.trim());
        assert!(path.exists(), "printed path must exist: {}", path.display());
        assert!(path.starts_with(sandbox.path().join("cache").join("thumbnails")));
        assert!(path.to_string_lossy().contains("/large/"));
    }

    #[test]
    fn repeated_call_resolves_same_path() {
        let sandbox = TempDir::new().unwrap();
        let src = write_source_png(sandbox.path());

        let first = thumbcask(sandbox.path()).arg(&src).output().unwrap();
        let second = thumbcask(sandbox.path()).arg(&src).output().unwrap();

        assert!(first.status.success());
        assert_eq!(first.stdout, second.stdout);
    }

    #[test]
    fn size_flag_selects_tier() {
        let sandbox = TempDir::new().unwrap();
        let src = write_source_png(sandbox.path());

        thumbcask(sandbox.path())
            .args(["--size", "normal"])
            .arg(&src)
            .assert()
            .success()
            .stdout(predicate::str::contains("/normal/"));
    }

    #[test]
    fn missing_source_exits_one() {
        let sandbox = TempDir::new().unwrap();
        thumbcask(sandbox.path())
            .arg("/definitely/not/there.png")
            .assert()
            .failure()
            .stderr(predicate::str::contains("no thumbnail"));
    }

    #[test]
    fn lookup_only_miss_exits_one() {
        let sandbox = TempDir::new().unwrap();
        let src = write_source_png(sandbox.path());

        thumbcask(sandbox.path())
            .args(["--lookup-only"])
            .arg(&src)
            .assert()
            .failure();
    }

    #[test]
    fn lookup_only_hits_after_generation() {
        let sandbox = TempDir::new().unwrap();
        let src = write_source_png(sandbox.path());

        thumbcask(sandbox.path()).arg(&src).assert().success();
        thumbcask(sandbox.path())
            .args(["--lookup-only"])
            .arg(&src)
            .assert()
            .success()
            .stdout(predicate::str::contains("thumbnails"));
    }

    #[test]
    fn url_without_mtime_is_an_error() {
        let sandbox = TempDir::new().unwrap();
        thumbcask(sandbox.path())
            .arg("http://example.com/a.pdf")
            .assert()
            .failure()
            .stderr(predicate::str::contains("Error:"));
    }

    #[test]
    fn json_format_reports_miss_as_null() {
        let sandbox = TempDir::new().unwrap();
        thumbcask(sandbox.path())
            .args(["--format", "json", "/definitely/not/there.png"])
            .assert()
            .failure()
            .stdout(predicate::str::contains("\"path\":null"));
    }

    #[test]
    fn unknown_size_is_a_usage_error() {
        let sandbox = TempDir::new().unwrap();
        thumbcask(sandbox.path())
            .args(["--size", "gigantic", "a.png"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("unsupported size"));
    }
}
