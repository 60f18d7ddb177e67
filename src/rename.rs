//! Planning renames and carrying them out on the filesystem.
//!
//! Each input path is matched, transformed and then either previewed or renamed.
//! Failures are per item: they get reported and the batch moves on.

use std::{collections::HashSet,
          ffi::OsString,
          fs,
          io,
          path::{Path, PathBuf}};

use owo_colors::OwoColorize;
use regex::Regex;

use crate::{error::{Error, Result},
            number::Number,
            transform::transform};

/// Appended to a file's final name while it waits for the second rename pass.
pub const STAGING_SUFFIX: &str = ".mid";

/// Whether renames touch the filesystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Only report what would be renamed.
    Preview,
    #[default]
    Apply,
}

/// How a batch of renames avoids tripping over itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Staging {
    /// Rename each file straight to its new name, in an order chosen to dodge the rest of the batch.
    #[value(name = "none")]
    Direct,
    /// Rename everything to a staging name first, then everything to its final name.
    #[default]
    TwoPhase,
}

/// Everything a run needs besides the pattern and the paths.
#[derive(Debug, Clone, Copy, Default)]
pub struct Config {
    pub delta:   Number,
    pub mode:    Mode,
    pub staging: Staging,
}

/// One file's computed move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenamePlan {
    pub from: PathBuf,
    pub to:   PathBuf,
}

/// Receives the outcome of every input path.
pub trait Report {
    fn previewed(&mut self, plan: &RenamePlan);
    fn renamed(&mut self, plan: &RenamePlan);
    fn unchanged(&mut self, path: &Path);
    fn skipped(&mut self, path: &Path, error: &Error);
    fn failed(&mut self, path: &Path, error: &Error);
    fn finished(&mut self, _summary: &Summary) {}
}

/// Colored lines on stdout for renames, error logs for everything that went wrong.
#[derive(Debug, Default)]
pub struct ConsoleReport;

impl Report for ConsoleReport {
    fn previewed(&mut self, plan: &RenamePlan) {
        println!("Rename: {} -> {}",
                 plan.from.display().black().bold().on_green(),
                 plan.to.display().red().bold().on_blue());
    }

    fn renamed(&mut self, plan: &RenamePlan) {
        println!("Renamed: {} ~~> {}",
                 plan.from.display().black().bold().on_green(),
                 plan.to.display().red().bold().on_blue());
    }

    fn unchanged(&mut self, path: &Path) {
        tracing::info!("Name unchanged, leaving {} alone", path.display());
    }

    fn skipped(&mut self, path: &Path, error: &Error) {
        tracing::error!("Skipping {}: {}", path.display(), error);
    }

    fn failed(&mut self, path: &Path, error: &Error) {
        tracing::error!("Could not rename {}: {}", path.display(), error);
    }

    fn finished(&mut self, summary: &Summary) {
        if summary.previewed > 0 {
            println!("Total previewed: {}", summary.previewed.cyan());
        }
        println!("Total renamed: {}", summary.renamed.cyan());
        if !summary.failed.is_empty() {
            println!("Total failed: {}", summary.failed.len().red());
        }
    }
}

/// Tally of one run.
#[derive(Debug, Default)]
pub struct Summary {
    pub previewed: usize,
    pub renamed:   usize,
    pub unchanged: usize,
    pub skipped:   Vec<(PathBuf, Error)>,
    pub failed:    Vec<(PathBuf, Error)>,
}

/// Drives one batch: match, transform, then preview or rename.
pub struct Renamer<'a> {
    config:  Config,
    pattern: &'a Regex,
    report:  &'a mut dyn Report,
    summary: Summary,
}

impl<'a> Renamer<'a> {
    pub fn new(config: Config, pattern: &'a Regex, report: &'a mut dyn Report) -> Self {
        Self { config, pattern, report, summary: Summary::default() }
    }

    /// Attempt every path; nothing here aborts the batch.
    #[tracing::instrument(skip(self), fields(pattern = %self.pattern, config = ?self.config))]
    pub fn run(mut self, paths: &[PathBuf]) -> Summary {
        let mut plans: Vec<RenamePlan> = paths.iter().filter_map(|path| self.plan(path)).collect();
        tracing::debug!("{} of {} paths have a new name", plans.len(), paths.len());

        match (self.config.mode, self.config.staging) {
            (Mode::Preview, _) => {
                for plan in &plans {
                    self.report.previewed(plan);
                    self.summary.previewed += 1;
                }
            }
            (Mode::Apply, Staging::Direct) => {
                order_for_direct(&mut plans, self.config.delta);
                for plan in plans {
                    match move_if_free(&plan.from, &plan.to) {
                        Ok(()) => self.renamed(plan),
                        Err(e) => self.failed(plan.from, e),
                    }
                }
            }
            (Mode::Apply, Staging::TwoPhase) => self.two_phase(plans),
        }

        let summary = &self.summary;
        tracing::info!("{} renamed, {} previewed, {} unchanged, {} skipped, {} failed",
                       summary.renamed,
                       summary.previewed,
                       summary.unchanged,
                       summary.skipped.len(),
                       summary.failed.len());
        if !summary.failed.is_empty() {
            tracing::warn!("{} rename(s) failed", summary.failed.len());
        }
        self.report.finished(&self.summary);
        self.summary
    }

    /// `Pending -> Matched -> Transformed`, or `Skipped`.
    fn plan(&mut self, path: &Path) -> Option<RenamePlan> {
        // Guard: name must be usable as a str for the regex
        let Some(file_name) = path.file_name().and_then(|name| name.to_str()) else {
            self.skipped(path, Error::NonUtf8Name { path: path.to_owned() });
            return None;
        };
        // Guard: no regex match
        let Some(captures) = self.pattern.captures(file_name) else {
            let no_match = Error::NoMatch { file_name: file_name.to_owned(),
                                            pattern:   self.pattern.to_string() };
            self.skipped(path, no_match);
            return None;
        };
        tracing::trace!("captures for {}: {:?}", file_name.purple(), captures);
        // Guard: zero delta, don't rewrite literals like `1.00` into `1`
        if self.config.delta.is_zero() {
            self.report.unchanged(path);
            self.summary.unchanged += 1;
            return None;
        }

        let new_name = transform(file_name, &captures, self.config.delta);
        // Guard: nothing to do
        if new_name == file_name {
            self.report.unchanged(path);
            self.summary.unchanged += 1;
            return None;
        }
        Some(RenamePlan { from: path.to_owned(), to: path.with_file_name(new_name) })
    }

    /// Stage every plan under [`STAGING_SUFFIX`], then strip the suffix off every staged file.
    ///
    /// A plan whose final name is held by a file outside the batch is refused up front.
    /// If a final name turns out to be taken anyway, the staged file goes back where it came from.
    fn two_phase(&mut self, plans: Vec<RenamePlan>) {
        let sources: HashSet<PathBuf> = plans.iter().map(|plan| plan.from.clone()).collect();

        let mut staged = Vec::with_capacity(plans.len());
        for plan in plans {
            match stage(&plan, &sources) {
                Ok(staged_path) => staged.push((plan.from, staged_path)),
                Err(e) => self.failed(plan.from, e),
            }
        }

        for (from, staged_path) in staged {
            let Some(to) = unstaged_path(&staged_path) else {
                self.failed(from, Error::NonUtf8Name { path: staged_path });
                continue;
            };
            match move_if_free(&staged_path, &to) {
                Ok(()) => self.renamed(RenamePlan { from, to }),
                Err(e) => {
                    if let Err(restore) = move_if_free(&staged_path, &from) {
                        tracing::error!("Could not move {} back to {}: {}",
                                        staged_path.display(),
                                        from.display(),
                                        restore);
                    }
                    self.failed(from, e);
                }
            }
        }
    }

    fn renamed(&mut self, plan: RenamePlan) {
        tracing::debug!("renamed {} to {}", plan.from.display(), plan.to.display());
        self.report.renamed(&plan);
        self.summary.renamed += 1;
    }

    fn skipped(&mut self, path: &Path, error: Error) {
        self.report.skipped(path, &error);
        self.summary.skipped.push((path.to_owned(), error));
    }

    fn failed(&mut self, path: PathBuf, error: Error) {
        self.report.failed(&path, &error);
        self.summary.failed.push((path, error));
    }
}

/// Path a file waits under between the two passes.
pub fn staged_path(final_path: &Path) -> PathBuf {
    let mut name = OsString::from(final_path.as_os_str());
    name.push(STAGING_SUFFIX);
    PathBuf::from(name)
}

/// Final path of a staged file: exactly one [`STAGING_SUFFIX`] removed from its name.
pub fn unstaged_path(staged: &Path) -> Option<PathBuf> {
    let name = staged.file_name()?.to_str()?.strip_suffix(STAGING_SUFFIX)?;
    (!name.is_empty()).then(|| staged.with_file_name(name))
}

fn stage(plan: &RenamePlan, sources: &HashSet<PathBuf>) -> Result<PathBuf> {
    // Guard: final name held by something that won't move out of the way
    if !sources.contains(&plan.to) && occupied(&plan.to)? {
        return Err(Error::Collision { path: plan.to.clone() });
    }
    let staged = staged_path(&plan.to);
    move_if_free(&plan.from, &staged)?;
    tracing::debug!("staged {} as {}", plan.from.display(), staged.display());
    Ok(staged)
}

/// Renames that grow numbers go highest first, shrinking ones lowest first.
///
/// Ordering by path only approximates "highest number"; two-phase staging is the reliable option.
fn order_for_direct(plans: &mut [RenamePlan], delta: Number) {
    plans.sort_by(|a, b| a.from.cmp(&b.from));
    if !delta.is_negative() {
        plans.reverse();
    }
}

/// `fs::rename`, except an existing destination is a [`Error::Collision`] instead of being replaced.
fn move_if_free(from: &Path, to: &Path) -> Result<()> {
    if occupied(to)? {
        return Err(Error::Collision { path: to.to_owned() });
    }
    fs::rename(from, to)?;
    Ok(())
}

fn occupied(path: &Path) -> Result<bool> {
    match fs::symlink_metadata(path) {
        Ok(_) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
pub mod tests {
    use std::collections::BTreeSet;

    use assert_fs::{prelude::*, TempDir};
    use predicates::prelude::*;
    use test_log::test;

    use super::*;

    /// Remembers what happened to each path, in order.
    #[derive(Debug, Default)]
    pub struct RecordingReport {
        pub events: Vec<String>,
    }

    impl Report for RecordingReport {
        fn previewed(&mut self, plan: &RenamePlan) {
            self.events.push(format!("preview {} -> {}", name(&plan.from), name(&plan.to)));
        }

        fn renamed(&mut self, plan: &RenamePlan) {
            self.events.push(format!("renamed {} -> {}", name(&plan.from), name(&plan.to)));
        }

        fn unchanged(&mut self, path: &Path) {
            self.events.push(format!("unchanged {}", name(path)));
        }

        fn skipped(&mut self, path: &Path, _error: &Error) {
            self.events.push(format!("skipped {}", name(path)));
        }

        fn failed(&mut self, path: &Path, _error: &Error) {
            self.events.push(format!("failed {}", name(path)));
        }
    }

    fn name(path: &Path) -> String {
        path.file_name().unwrap().to_string_lossy().into_owned()
    }

    /// Temp dir holding empty files with the given names, plus their paths.
    fn dir_with(files: &[&str]) -> (TempDir, Vec<PathBuf>) {
        let dir = TempDir::new().unwrap();
        let paths = files.iter()
                         .map(|f| {
                             let child = dir.child(f);
                             child.touch().unwrap();
                             child.to_path_buf()
                         })
                         .collect();
        (dir, paths)
    }

    fn names_in(dir: &TempDir) -> BTreeSet<String> {
        fs::read_dir(dir.path()).unwrap()
                                .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
                                .collect()
    }

    fn set(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn config(delta: &str, mode: Mode, staging: Staging) -> Config {
        Config { delta: delta.parse().unwrap(), mode, staging }
    }

    fn run_with(pattern: &str, config: Config, paths: &[PathBuf]) -> (Summary, RecordingReport) {
        let re = Regex::new(pattern).unwrap();
        let mut report = RecordingReport::default();
        let summary = Renamer::new(config, &re, &mut report).run(paths);
        (summary, report)
    }

    #[test]
    fn two_phase_shifts_into_each_other() {
        let (dir, paths) = dir_with(&["1.txt", "2.txt"]);
        let (summary, _) = run_with(r"^(\d)", config("1", Mode::Apply, Staging::TwoPhase), &paths);

        assert_eq!(names_in(&dir), set(&["2.txt", "3.txt"]));
        assert_eq!(summary.renamed, 2);
        assert!(summary.failed.is_empty());
    }

    #[test]
    fn two_phase_batches() {
        let test_cases = vec![(vec!["1.txt", "2.txt"], r"^(\d)", vec!["2.txt", "3.txt"]),
                              (vec!["1.txt", "1_2.txt"], r"^(\d)", vec!["2.txt", "2_2.txt"]),
                              (vec!["1_1.txt", "2.txt", "3_1.txt"], r"_(\d)", vec!["1_2.txt", "2.txt", "3_2.txt"])];
        for (files, pattern, expected) in test_cases {
            let (dir, paths) = dir_with(&files);
            run_with(pattern, config("1", Mode::Apply, Staging::TwoPhase), &paths);
            assert_eq!(names_in(&dir), set(&expected), "{pattern} over {files:?}");
        }
    }

    #[test]
    fn no_match_is_skipped_and_reported() {
        let (dir, paths) = dir_with(&["1_1.txt", "2.txt", "3_1.txt"]);
        let (summary, report) = run_with(r"_(\d)", config("1", Mode::Apply, Staging::TwoPhase), &paths);

        assert_eq!(summary.skipped.len(), 1);
        assert!(matches!(summary.skipped[0].1, Error::NoMatch { .. }));
        assert!(report.events.contains(&"skipped 2.txt".to_string()));
        dir.child("2.txt").assert(predicate::path::exists());
    }

    #[test]
    fn preview_never_touches_the_filesystem() {
        for staging in [Staging::TwoPhase, Staging::Direct] {
            for (pattern, delta) in [(r"(\d)", "1"), (r"^(\d)", "-1"), (r"(\d)_(\d)", "0.5"), (r"nomatch(\d)", "1")] {
                let (dir, paths) = dir_with(&["1_1.txt", "2.txt", "3_1.txt"]);
                let before = names_in(&dir);
                run_with(pattern, config(delta, Mode::Preview, staging), &paths);
                assert_eq!(names_in(&dir), before, "{pattern} by {delta}");
            }
        }
    }

    #[test]
    fn preview_reports_each_mapping() {
        let (_dir, paths) = dir_with(&["1.txt", "2.txt"]);
        let (summary, report) = run_with(r"(\d)", config("1", Mode::Preview, Staging::TwoPhase), &paths);

        assert_eq!(summary.previewed, 2);
        assert_eq!(summary.renamed, 0);
        assert_eq!(report.events, vec!["preview 1.txt -> 2.txt", "preview 2.txt -> 3.txt"]);
    }

    #[test]
    fn direct_orders_around_the_batch() {
        let (dir, paths) = dir_with(&["1.txt", "2.txt"]);
        let (summary, report) = run_with(r"^(\d)", config("1", Mode::Apply, Staging::Direct), &paths);
        assert_eq!(names_in(&dir), set(&["2.txt", "3.txt"]));
        assert_eq!(summary.renamed, 2);
        assert_eq!(report.events, vec!["renamed 2.txt -> 3.txt", "renamed 1.txt -> 2.txt"]);

        let (dir, paths) = dir_with(&["1.txt", "2.txt"]);
        run_with(r"^(\d)", config("-1", Mode::Apply, Staging::Direct), &paths);
        assert_eq!(names_in(&dir), set(&["0.txt", "1.txt"]));
    }

    #[test]
    fn collision_with_an_outside_file() {
        for staging in [Staging::TwoPhase, Staging::Direct] {
            let (dir, paths) = dir_with(&["1.txt"]);
            dir.child("2.txt").touch().unwrap();
            let (summary, _) = run_with(r"^(\d)", config("1", Mode::Apply, staging), &paths);

            assert_eq!(names_in(&dir), set(&["1.txt", "2.txt"]), "{staging:?}");
            assert_eq!(summary.failed.len(), 1);
            assert!(matches!(summary.failed[0].1, Error::Collision { .. }));
        }
    }

    #[test]
    fn two_plans_for_one_name_first_wins() {
        let (dir, paths) = dir_with(&["1.txt", "1.0.txt"]);
        let (summary, report) = run_with(r"^([\d.]+)\.txt", config("1", Mode::Apply, Staging::TwoPhase), &paths);

        assert_eq!(names_in(&dir), set(&["2.txt", "1.0.txt"]));
        assert_eq!(summary.renamed, 1);
        assert_eq!(report.events, vec!["failed 1.0.txt", "renamed 1.txt -> 2.txt"]);
    }

    #[test]
    fn failed_final_pass_moves_the_file_back() {
        let (dir, paths) = dir_with(&["1.txt", "2.txt"]);
        dir.child("3.txt").touch().unwrap();
        let (summary, _) = run_with(r"^(\d)", config("1", Mode::Apply, Staging::TwoPhase), &paths);

        // 2.txt can't become 3.txt, so 1.txt can't become 2.txt either
        assert_eq!(names_in(&dir), set(&["1.txt", "2.txt", "3.txt"]));
        assert_eq!(summary.renamed, 0);
        assert_eq!(summary.failed.len(), 2);
    }

    #[test]
    fn zero_delta_leaves_files_alone() {
        let files = ["01_x.txt", "2.5_y.txt", "1.00_a.txt", ".5_b.txt"];
        let (dir, paths) = dir_with(&files);
        let (summary, report) = run_with(r"^([\d.]+)_", config("0", Mode::Apply, Staging::TwoPhase), &paths);

        assert_eq!(names_in(&dir), set(&files));
        assert_eq!(summary.unchanged, 4);
        assert_eq!(summary.renamed, 0);
        assert!(report.events.contains(&"unchanged 1.00_a.txt".to_string()));
    }

    #[test]
    fn only_the_file_name_is_matched() {
        let dir = TempDir::new().unwrap();
        dir.child("take9").create_dir_all().unwrap();
        let file = dir.child("take9").child("1.txt");
        file.touch().unwrap();
        run_with(r"(\d)", config("1", Mode::Apply, Staging::TwoPhase), &[file.to_path_buf()]);

        dir.child("take9/2.txt").assert(predicate::path::exists());
        dir.child("take9/1.txt").assert(predicate::path::missing());
    }

    #[test]
    fn staging_suffix_round_trip() {
        let staged = staged_path(Path::new("a/1.mid.txt"));
        assert_eq!(staged, PathBuf::from("a/1.mid.txt.mid"));
        assert_eq!(unstaged_path(&staged), Some(PathBuf::from("a/1.mid.txt")));
        assert_eq!(unstaged_path(Path::new("a/1.txt")), None);
        assert_eq!(unstaged_path(Path::new("a/.mid")), None);
    }
}
