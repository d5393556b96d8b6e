
use anyhow::Context;
use log::info;
use std::io::Write;
use std::path::Path;
use std::time::Instant;

/// Records elapsed time between pipeline stages for `time.log`
#[derive(Debug)]
pub struct Checkpoints {
    /// When the run started
    start: Instant,
    /// Time of the most recent checkpoint
    last: Instant,
    /// If false, only the final total is recorded
    record_stages: bool,
    /// Formatted lines, in order
    lines: Vec<String>
}

impl Checkpoints {
    /// Starts the clock
    /// # Arguments
    /// * `record_stages` - if true, every `stage()` call is recorded; otherwise only `finish()` is
    pub fn new(record_stages: bool) -> Self {
        let now = Instant::now();
        Self {
            start: now,
            last: now,
            record_stages,
            lines: vec![]
        }
    }

    /// Records the time since the previous checkpoint under `desc`
    pub fn stage(&mut self, desc: &str) {
        let now = Instant::now();
        if self.record_stages {
            self.push_line(desc, now.duration_since(self.last).as_secs_f64());
        }
        self.last = now;
    }

    /// Records the total time since the start
    pub fn finish(&mut self) {
        let now = Instant::now();
        self.push_line("Total time", now.duration_since(self.start).as_secs_f64());
        self.last = now;
    }

    fn push_line(&mut self, desc: &str, seconds: f64) {
        let line = format_line(desc, seconds);
        info!("{line}");
        self.lines.push(line);
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Writes every recorded line, newline terminated
    /// # Errors
    /// * if the file cannot be created or written
    pub fn write(&self, filename: &Path) -> anyhow::Result<()> {
        let mut fp = std::fs::File::create(filename)
            .with_context(|| format!("Error while creating {filename:?}:"))?;
        for line in self.lines.iter() {
            writeln!(fp, "{line}")
                .with_context(|| format!("Error while writing to {filename:?}:"))?;
        }
        Ok(())
    }
}

fn format_line(desc: &str, seconds: f64) -> String {
    format!("{desc:<40}{seconds:.2} seconds")
}
