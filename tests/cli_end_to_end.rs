use std::fs;
use std::path::Path;
use std::process::{Command, Output};

const BOM: [u8; 3] = [0xEF, 0xBB, 0xBF];

fn debom(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_debom"))
        .args(args)
        .current_dir(dir)
        .output()
        .expect("run debom")
}

#[test]
fn strips_bom_from_named_file() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), [0xEF, 0xBB, 0xBF, 0x48, 0x69]).unwrap();

    let out = debom(dir.path(), &["a.txt"]);
    assert!(
        out.status.success(),
        "debom failed: {}",
        String::from_utf8_lossy(&out.stderr)
    );
    assert_eq!(fs::read(dir.path().join("a.txt")).unwrap(), [0x48, 0x69]);
    // Silent on success.
    assert!(out.stdout.is_empty());
    assert!(out.stderr.is_empty());
}

#[test]
fn bom_only_file_becomes_empty() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("b.txt"), BOM).unwrap();

    let out = debom(dir.path(), &["b.txt"]);
    assert_eq!(out.status.code(), Some(0));
    assert_eq!(fs::metadata(dir.path().join("b.txt")).unwrap().len(), 0);
}

#[test]
fn unknown_switch_prints_usage_and_touches_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let bytes = [&BOM[..], b"keep"].concat();
    fs::write(dir.path().join("a.txt"), &bytes).unwrap();

    let out = debom(dir.path(), &["/X", "a.txt"]);
    assert_eq!(out.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("Invalid switch - \"/X\""));
    assert!(stdout.contains("/Q"));
    assert!(stdout.contains("/R"));
    assert_eq!(fs::read(dir.path().join("a.txt")).unwrap(), bytes);
}

#[test]
fn no_paths_prints_usage() {
    let dir = tempfile::tempdir().unwrap();
    let out = debom(dir.path(), &["/Q"]);
    assert_eq!(out.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&out.stdout).contains("Removes UTF-8 BOM"));
}

#[test]
fn missing_path_is_reported_unless_quiet() {
    let dir = tempfile::tempdir().unwrap();

    let out = debom(dir.path(), &["missing.txt"]);
    assert_eq!(out.status.code(), Some(1));
    assert!(
        String::from_utf8_lossy(&out.stderr).contains("No such file or directory: missing.txt")
    );

    let out = debom(dir.path(), &["/q", "missing.txt"]);
    assert_eq!(out.status.code(), Some(1));
    assert!(out.stdout.is_empty());
    assert!(out.stderr.is_empty());
}

#[test]
fn later_arguments_run_after_a_failure() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("late.txt"), [&BOM[..], b"late"].concat()).unwrap();

    let out = debom(dir.path(), &["/Q", "missing.txt", "late.txt"]);
    assert_eq!(out.status.code(), Some(1));
    assert_eq!(fs::read(dir.path().join("late.txt")).unwrap(), b"late");
}

#[test]
fn pattern_respects_recursion_switch() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    fs::create_dir_all(root.join("nested/more")).unwrap();
    for rel in ["top.txt", "nested/mid.txt", "nested/more/low.txt", "top.md"] {
        fs::write(root.join(rel), [&BOM[..], rel.as_bytes()].concat()).unwrap();
    }

    let out = debom(root, &["*.txt"]);
    assert!(out.status.success());
    assert_eq!(fs::read(root.join("top.txt")).unwrap(), b"top.txt");
    assert!(fs::read(root.join("nested/mid.txt")).unwrap().starts_with(&BOM));
    assert!(fs::read(root.join("top.md")).unwrap().starts_with(&BOM));

    let out = debom(root, &["/r", "*.txt"]);
    assert!(out.status.success());
    assert_eq!(fs::read(root.join("nested/mid.txt")).unwrap(), b"nested/mid.txt");
    assert_eq!(
        fs::read(root.join("nested/more/low.txt")).unwrap(),
        b"nested/more/low.txt"
    );
    assert!(fs::read(root.join("top.md")).unwrap().starts_with(&BOM));
}

#[test]
fn directory_argument_strips_every_file_and_leaves_no_temporaries() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    fs::create_dir(root.join("docs")).unwrap();
    fs::write(root.join("docs/one.csv"), [&BOM[..], b"1,2\n"].concat()).unwrap();
    fs::write(root.join("docs/two.json"), [&BOM[..], b"{}"].concat()).unwrap();
    fs::write(root.join("docs/plain.txt"), b"plain").unwrap();

    let out = debom(root, &["docs"]);
    assert!(out.status.success());
    assert_eq!(fs::read(root.join("docs/one.csv")).unwrap(), b"1,2\n");
    assert_eq!(fs::read(root.join("docs/two.json")).unwrap(), b"{}");
    assert_eq!(fs::read(root.join("docs/plain.txt")).unwrap(), b"plain");

    let names: Vec<String> = fs::read_dir(root.join("docs"))
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names.len(), 3, "unexpected entries: {names:?}");
}

#[test]
fn second_run_changes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), [&BOM[..], b"same"].concat()).unwrap();

    assert!(debom(dir.path(), &["a.txt"]).status.success());
    let once = fs::read(dir.path().join("a.txt")).unwrap();
    assert!(debom(dir.path(), &["a.txt"]).status.success());
    assert_eq!(fs::read(dir.path().join("a.txt")).unwrap(), once);
}

#[test]
fn verbose_lists_modified_files() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("with.txt"), [&BOM[..], b"x"].concat()).unwrap();
    fs::write(dir.path().join("without.txt"), b"x").unwrap();

    let out = debom(dir.path(), &["/V", "*.txt"]);
    assert!(out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("stripped:"));
    assert!(stderr.contains("with.txt"));
    assert!(!stderr.contains("without.txt"));

    let out = debom(dir.path(), &["-vv", "*.txt"]);
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("no bom:"));
    assert!(stderr.contains("Totals: files=2"));
}

#[test]
fn help_and_version_exit_cleanly() {
    let dir = tempfile::tempdir().unwrap();
    let out = debom(dir.path(), &["--help"]);
    assert!(out.status.success());
    assert!(String::from_utf8_lossy(&out.stdout).contains("--recursive"));

    let out = debom(dir.path(), &["--version"]);
    assert!(out.status.success());
    assert!(String::from_utf8_lossy(&out.stdout).contains(env!("CARGO_PKG_VERSION")));
}

#[cfg(unix)]
#[test]
fn unwritable_file_is_reported_and_the_rest_still_stripped() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    fs::write(root.join("a_locked.txt"), [&BOM[..], b"locked"].concat()).unwrap();
    fs::write(root.join("b_later.txt"), [&BOM[..], b"later"].concat()).unwrap();
    fs::set_permissions(root.join("a_locked.txt"), fs::Permissions::from_mode(0o444)).unwrap();
    if fs::OpenOptions::new()
        .write(true)
        .open(root.join("a_locked.txt"))
        .is_ok()
    {
        // Running privileged: write access cannot be denied.
        return;
    }

    let out = debom(root, &["*.txt"]);
    assert_eq!(out.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&out.stderr).contains("a_locked.txt"));
    assert_eq!(fs::read(root.join("b_later.txt")).unwrap(), b"later");

    fs::write(root.join("b_later.txt"), [&BOM[..], b"again"].concat()).unwrap();
    let out = debom(root, &["/Q", "*.txt"]);
    assert_eq!(out.status.code(), Some(1));
    assert!(out.stderr.is_empty());
    assert!(out.stdout.is_empty());
    assert_eq!(fs::read(root.join("b_later.txt")).unwrap(), b"again");
}

#[test]
fn repeated_switches_still_strip() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), [&BOM[..], b"a"].concat()).unwrap();

    let out = debom(dir.path(), &["/Q", "/q", "/R", "/r", "a.txt"]);
    assert_eq!(out.status.code(), Some(0));
    assert_eq!(fs::read(dir.path().join("a.txt")).unwrap(), b"a");
}
