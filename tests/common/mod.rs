#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::{TempDir, tempdir};
use ticket_insights::Dataset;

pub const SCENARIO_CSV: &str = "\
Ticket,Tipo,Análise,Data
T1,Liveness,ideal,2024-03-01
T2,Liveness, NÃO IDEAL ,2024-03-02
T3,Outros,IDEAL,02/03/2024
";

/// Three-row sheet used by the worked examples, with raw (unnormalized) verdicts.
pub fn scenario_dataset() -> Dataset {
    Dataset::from_records(
        &["Ticket", "Tipo", "Análise"],
        vec![
            vec!["T1", "Liveness", "ideal"],
            vec!["T2", "Liveness", " NÃO IDEAL "],
            vec!["T3", "Outros", "IDEAL"],
        ],
    )
    .expect("scenario dataset")
}

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
