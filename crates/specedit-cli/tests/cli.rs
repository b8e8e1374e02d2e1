use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use predicates::str::contains;
use tempfile::TempDir;

const SPEC: &str = "\
Name:           flannel
Version:        0.5.5
Provides:       /bin/cp, flannel-tools = 0.5.5

%description
Network fabric.

%install
install -d -p %{buildroot}%{_bindir}
install -p -m 0755 flanneld %{buildroot}%{_bindir}

%files
%doc README.md
%{_bindir}/flanneld

%changelog
* Mon Nov 30 2015 Jan Chaloupka <jchaloup@redhat.com> - 0.5.5-1
- Update to 0.5.5
";

fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

fn specedit() -> Command {
    let mut cmd = Command::cargo_bin("specedit").unwrap();
    cmd.env_remove("RUST_LOG").env("HOME", "/nonexistent-specedit-home");
    cmd
}

fn run_on(path: &Path) -> Command {
    let mut cmd = specedit();
    cmd.arg(path);
    cmd
}

#[test]
fn nonexistent_file() {
    specedit()
        .arg("somenonlongnameofanonexistentfile")
        .assert()
        .failure()
        .stdout("")
        .stderr(contains("No such file or directory"));
}

#[test]
fn prints_file_unchanged() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "flannel.spec", SPEC);
    run_on(&path).assert().success().stdout(SPEC);
}

#[test]
fn prints_empty_file() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "EMPTY", "");
    run_on(&path).assert().success().stdout("");
}

#[test]
fn parse_error_prints_nothing() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "bad.spec", "%if 0%{?fedora}\nName: x\n");
    run_on(&path)
        .assert()
        .failure()
        .stdout("")
        .stderr(contains("%endif"));
}

#[test]
fn sections_add_merges_side_channel() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "in1.spec", SPEC);
    let overlay = "%files\n%license LICENSE\n%{_bindir}/flanneld\n\n%check\ngo test ./...\n";

    let expected = SPEC
        .replace(
            "%files\n%doc README.md\n%{_bindir}/flanneld\n",
            "%files\n%license LICENSE\n%{_bindir}/flanneld\n",
        )
        .replace(
            "- Update to 0.5.5\n",
            "- Update to 0.5.5\n\n%check\ngo test ./...\n",
        );

    run_on(&path)
        .arg("--sections-add")
        .write_stdin(overlay)
        .assert()
        .success()
        .stdout(expected);
}

#[test]
fn sections_add_from_side_channel_file() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "in1.spec", SPEC);
    let overlay = write(&dir, "in2.spec", "%check\nmake check\n");

    run_on(&path)
        .arg("--sections-add")
        .arg("--side-channel")
        .arg(&overlay)
        .assert()
        .success()
        .stdout(predicate::str::ends_with("%check\nmake check\n"));
}

#[test]
fn roundtrip_then_sections_add() {
    let dir = TempDir::new().unwrap();
    let base = "%global foo bar\n%description\nText.\n";
    let path = write(&dir, "base.spec", base);
    run_on(&path).assert().success().stdout(base);

    run_on(&path)
        .arg("--sections-add")
        .write_stdin("%files\n/usr/bin/foo\n")
        .assert()
        .success()
        .stdout("%global foo bar\n%description\nText.\n%files\n/usr/bin/foo\n");
}

#[test]
fn sections_add_keeps_one_section_per_kind() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "base.spec", "Name: x\n%files\n/a\n%files devel\n/b\n");
    run_on(&path)
        .arg("--sections-add")
        .write_stdin("%files\n/c\n")
        .assert()
        .success()
        .stdout("Name: x\n%files\n/c\n");
}

#[test]
fn install_edit() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "flannel.spec", SPEC);
    run_on(&path)
        .arg("--install-edit=777")
        .assert()
        .success()
        .stdout(contains("install -p -m 777 flanneld"))
        .stdout(contains("install -d -p %{buildroot}%{_bindir}\n"));
}

#[test]
fn install_edit_rejects_bad_mode() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "flannel.spec", SPEC);
    run_on(&path)
        .arg("--install-edit=rwx")
        .assert()
        .failure()
        .stdout("")
        .stderr(contains("octal"));
}

#[test]
fn provides_show() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "flannel.spec", SPEC);
    run_on(&path)
        .arg("--provides-show=*")
        .assert()
        .success()
        .stdout("flannel: /bin/cp\nflannel: flannel-tools = 0.5.5\n");
}

#[test]
fn provides_remove() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "flannel.spec", SPEC);
    run_on(&path)
        .arg("--custom-model-writer=provides")
        .arg("--provides-remove=/bin/cp")
        .assert()
        .success()
        .stdout(SPEC.replace("/bin/cp, ", ""));
}

#[test]
fn unknown_strategy() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "flannel.spec", SPEC);
    run_on(&path)
        .arg("--custom-editor=no-such-editor")
        .assert()
        .failure()
        .stderr(contains("unknown strategy"));
}

#[test]
fn dump_tree() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "tiny.spec", "Name: x\n");
    run_on(&path)
        .arg("--dump-tree")
        .assert()
        .success()
        .stdout(contains("ROOT@0..8").and(contains("DEFINITION@0..7")));
}

#[cfg(unix)]
#[test]
fn configured_external_renderer() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "flannel.spec", SPEC);
    let script = executable(
        &dir,
        "count.sh",
        "#!/bin/sh\necho \"$SPECEDIT_OPERATION $SPECEDIT_PARAM_PROVIDES_SHOW $(wc -l)\"\n",
    );
    let config = write(
        &dir,
        "config.toml",
        &format!(
            "[strategies.count]\nkind = \"renderer\"\ncommand = \"{}\"\n",
            script.display()
        ),
    );

    run_on(&path)
        .arg("--config")
        .arg(&config)
        .arg("--custom-manipulator-renderer=count")
        .arg("--provides-show=x")
        .assert()
        .success()
        .stdout(format!("renderer x {}\n", SPEC.lines().count()));
}

#[cfg(unix)]
fn executable(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = write(dir, name, content);
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

#[cfg(unix)]
#[test]
fn renderer_receives_side_channel() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "flannel.spec", SPEC);
    let script = executable(
        &dir,
        "render.sh",
        "#!/bin/sh\necho \"[$(cat \"$SPECEDIT_SIDE_CHANNEL\")]\"\n",
    );
    let side = write(&dir, "side.txt", "SIDE-CONTENT");

    run_on(&path)
        .arg(format!("--custom-manipulator-renderer={}", script.display()))
        .arg("--provides-show=*")
        .arg("--side-channel")
        .arg(&side)
        .assert()
        .success()
        .stdout("[SIDE-CONTENT]\n");

    run_on(&path)
        .arg(format!("--custom-manipulator-renderer={}", script.display()))
        .arg("--provides-show=*")
        .write_stdin("PIPED")
        .assert()
        .success()
        .stdout("[PIPED]\n");
}

#[cfg(unix)]
#[test]
fn model_writer_receives_side_channel() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "tiny.spec", "Name: x\n");
    let script = executable(
        &dir,
        "writer.sh",
        "#!/bin/sh\ncat\necho \"Summary: $(cat \"$SPECEDIT_SIDE_CHANNEL\")\"\n",
    );

    run_on(&path)
        .arg(format!("--custom-model-writer={}", script.display()))
        .write_stdin("from stdin")
        .assert()
        .success()
        .stdout("Name: x\nSummary: from stdin\n");
}

#[cfg(unix)]
#[test]
fn strategy_by_relative_path() {
    let dir = TempDir::new().unwrap();
    write(&dir, "a.spec", SPEC);
    executable(&dir, "render.sh", "#!/bin/sh\necho \"$SPECEDIT_OPERATION\"\n");

    specedit()
        .current_dir(dir.path())
        .arg("a.spec")
        .arg("--custom-manipulator-renderer=render.sh")
        .arg("--provides-show=*")
        .assert()
        .success()
        .stdout("renderer\n");
}

#[test]
fn verbose_logs_to_stderr() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "flannel.spec", SPEC);
    run_on(&path)
        .arg("-v")
        .assert()
        .success()
        .stdout(SPEC)
        .stderr(contains("parsed"));
}
