use std::{cell::RefCell, fs, io, path::PathBuf, rc::Rc};

use cucumber_pipeline::{ConfigResolver, Driver, Steps};
use tempfile::TempDir;

#[derive(Default)]
struct World(u32);

#[derive(Clone, Default)]
struct Console(Rc<RefCell<Vec<u8>>>);

impl Console {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.borrow()).into_owned()
    }
}

impl io::Write for Console {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn steps() -> Steps<World> {
    let mut steps = Steps::<World>::new();
    steps
        .given("^there is a cucumber basket$", |_, _| {})
        .given(r"^I have (\d+) cucumbers$", |w, args| {
            w.0 = args[0].parse().unwrap();
        })
        .given("^I am (hungry|polite)$", |_, _| {})
        .when(r"^I eat (\d+) cucumbers$", |w, args| {
            let n = args[0].parse::<u32>().unwrap();
            assert!(w.0 >= n, "not enough cucumbers");
            w.0 -= n;
        })
        .then(r"^I have (\d+) cucumbers$", |w, args| {
            assert_eq!(w.0, args[0].parse::<u32>().unwrap());
        });
    steps
}

fn fixture(name: &str) -> String {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/features")
        .join(name)
        .to_string_lossy()
        .into_owned()
}

fn driver(dir: &TempDir) -> (Driver<World>, Console) {
    let console = Console::default();
    let out = console.clone();
    let driver = Driver::new(steps())
        .resolver(ConfigResolver::new().profile_file(dir.path().join("cucumber.yml")))
        .console(move || Box::new(out.clone()));
    (driver, console)
}

#[test]
fn zero_files_succeed() {
    let dir = tempfile::tempdir().unwrap();
    let empty = dir.path().to_string_lossy().into_owned();
    let (mut driver, _) = driver(&dir);

    assert_eq!(driver.status(&[empty.as_str()]), 0);
    assert_eq!(driver.status::<&str>(&[]), 0);
}

#[test]
fn passing_and_pending_steps_succeed() {
    let dir = tempfile::tempdir().unwrap();
    let (mut driver, console) = driver(&dir);

    let summary = driver.run(&[fixture("eating")]).unwrap();

    assert_eq!(summary.scenarios, 4);
    assert_eq!(summary.passed, 15);
    assert_eq!(summary.pending, 1);
    assert_eq!(summary.skipped, 1);
    assert!(!summary.has_failed());

    let output = console.contents();
    assert!(output.contains("Feature: Eating cucumbers"));
    assert!(output.contains("Feature: Sharing cucumbers"));
    assert!(output.contains("4 scenarios"));
}

#[test]
fn failing_step_is_reported_by_every_formatter() {
    let dir = tempfile::tempdir().unwrap();
    let out = |name: &str| dir.path().join(name).to_string_lossy().into_owned();
    let (progress, html, doc, profile) =
        (out("progress.txt"), out("report.html"), out("doc.html"), out("profile.txt"));
    let (mut driver, console) = driver(&dir);

    let status = driver.status(&[
        "--format",
        "pretty",
        "--format",
        "progress",
        "--out",
        progress.as_str(),
        "--format",
        "html",
        "--out",
        html.as_str(),
        "--format",
        "doc",
        "--out",
        doc.as_str(),
        "--format",
        "profile",
        "--out",
        profile.as_str(),
        fixture("failing").as_str(),
    ]);

    assert_eq!(status, 1);
    let reports = [
        console.contents(),
        fs::read_to_string(&progress).unwrap(),
        fs::read_to_string(&html).unwrap(),
        fs::read_to_string(&doc).unwrap(),
        fs::read_to_string(&profile).unwrap(),
    ];
    for report in reports {
        assert!(report.contains("not enough cucumbers"), "{report}");
        assert!(report.contains("end_to_end.rs"), "{report}");
    }
}

#[test]
fn file_destination_replaces_console() {
    let dir = tempfile::tempdir().unwrap();
    let report = dir.path().join("report.html");
    let report_arg = report.to_string_lossy().into_owned();
    let (mut driver, console) = driver(&dir);

    driver
        .run(&[
            "--format",
            "pretty",
            "--format",
            "html",
            "--out",
            report_arg.as_str(),
            fixture("eating/later.feature").as_str(),
        ])
        .unwrap();

    let console = console.contents();
    let html = fs::read_to_string(&report).unwrap();
    assert!(console.contains("Feature: Sharing cucumbers"));
    assert!(!console.contains("<html"));
    assert!(html.contains("<html"));
    assert!(html.contains(r#"<div class="story">"#));
}

#[test]
fn line_filter_selects_single_outline_row() {
    let dir = tempfile::tempdir().unwrap();
    let (mut driver, _) = driver(&dir);

    let summary = driver
        .run(&["--format", "progress", "--line", "24", fixture("eating/eat.feature").as_str()])
        .unwrap();

    assert_eq!(summary.scenarios, 1);
    assert_eq!(summary.passed, 4);
}

#[test]
fn dry_run_skips_everything() {
    let dir = tempfile::tempdir().unwrap();
    let (mut driver, console) = driver(&dir);

    let summary = driver
        .run(&["--dry-run", "--format", "progress", fixture("failing").as_str()])
        .unwrap();

    assert!(!summary.has_failed());
    assert_eq!(summary.skipped, 3);
    assert!(console.contents().starts_with("___"));
}
