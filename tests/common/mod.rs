#![allow(dead_code)]

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::{TempDir, tempdir};

pub const INDIVIDUAL_HEADER: &str = "CODUSU,NRO_HOGAR,AGLOMERADO,CH04,CH06,NIVEL_ED,IP_III_04,IP_III_05,IP_III_06";
pub const HOUSEHOLD_HEADER: &str = "CODUSU,NRO_HOGAR,AGLOMERADO,IH_II_01,IH_II_02,ITF";

/// Number of respondents in the standard scenario.
pub const SCENARIO_SIZE: usize = 100;

/// Returns the absolute path to a fixture under `tests/data`.
pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("data")
        .join(name)
}

/// Scratch directory helper that cleans up files automatically on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    /// Creates a fresh scratch directory for the current test case.
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    /// Returns the root path for all files owned by this workspace.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes `contents` into a file under the workspace and returns the path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        let mut file = File::create(&path).expect("create temp file");
        file.write_all(contents.as_bytes())
            .expect("write temp file contents");
        path
    }

    pub fn read(&self, relative: &str) -> String {
        fs::read_to_string(self.temp_dir.path().join(relative)).expect("read workspace file")
    }

    /// Writes the standard scenario and returns (individuals, households).
    pub fn write_scenario(&self) -> (PathBuf, PathBuf) {
        (
            self.write("individuals.csv", &scenario_individuals()),
            self.write("households.csv", &scenario_households()),
        )
    }
}

/// Computer and internet answers of respondent `idx` in the scenario:
/// 50 use both, 10 lack only a computer, 10 lack only internet and 30 use
/// neither.
pub fn scenario_answers(idx: usize) -> (u8, u8) {
    match idx {
        0..50 => (1, 1),
        50..60 => (2, 1),
        60..70 => (1, 2),
        _ => (2, 2),
    }
}

/// One individual per household; ages cycle through 10..=79, sex alternates
/// between male and female and education cycles through codes 1..=7.
pub fn scenario_individuals() -> String {
    let mut out = String::from(INDIVIDUAL_HEADER);
    out.push('\n');
    for idx in 0..SCENARIO_SIZE {
        let (computer, internet) = scenario_answers(idx);
        let sex = if idx % 2 == 0 { 1 } else { 2 };
        let age = 10 + idx % 70;
        let education = 1 + idx % 7;
        out.push_str(&format!(
            "H{idx:03},1,33,{sex},{age},{education},{computer},1,{internet}\n"
        ));
    }
    out
}

/// Households: every second one lacks a computer; among the 40 poorest,
/// every second one lacks internet. Income grows with the household number.
pub fn scenario_households() -> String {
    let mut out = String::from(HOUSEHOLD_HEADER);
    out.push('\n');
    for idx in 0..SCENARIO_SIZE {
        let computer = if idx % 2 == 0 { 1 } else { 2 };
        let internet = if idx < 40 && idx % 2 == 0 { 2 } else { 1 };
        let income = (idx + 1) * 1000;
        out.push_str(&format!("H{idx:03},1,33,{computer},{internet},{income}\n"));
    }
    out
}
