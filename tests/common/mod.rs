#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::{TempDir, tempdir};

/// Scratch directory helper that cleans up files automatically on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

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
}

/// A small but representative survey export: single-choice, parent-gender
/// matrices, row-anchored matrices, a unit-axis duration matrix, and a
/// birth year/country matrix. Row two carries the question wording.
pub fn sample_export() -> String {
    let mut out = String::new();
    out.push_str(
        "ResponseId,DE2,DE14_1,DE14_2,DE15_1,DE15_2,PL1_1,PL1_2,PL2_1_1,PL2_2_2,DE23_1_1,DE23_1_2\n",
    );
    out.push_str(concat!(
        "Response ID,What is your gender? - Selected Choice,",
        "Gender - Parent 1,Gender - Parent 2,",
        "Education - Parent 1,Education - Parent 2,",
        "Paid leave - PhD students,Paid leave - Postdocs,",
        "Leave duration - PhD students - Weeks,Leave duration - Postdocs - Months,",
        "Child 1 - Years ago,Child 1 - Country\n",
    ));
    out.push_str("R_1,1,1,2,5,6,2,1,12,6,2,25\n");
    out.push_str("R_2,2,1,1,3,,1,,4,,12,23\n");
    out.push_str("R_3,1,,,,,,,,,,\n");
    out
}
