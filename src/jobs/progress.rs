//! Per-file progress estimation from agent output.

use crate::agent::{is_completion_marker, parse_percent};
use crate::types::{FileEntry, Phase, ProgressEvent};

/// Turns agent output lines into file-count estimates
///
/// Completion markers are counted (capped at the file total) and combined with
/// the highest percent seen so far; the larger of the two wins. The figures are
/// advisory, only the agent's exit status decides success.
#[derive(Debug, Clone)]
pub struct FileProgress {
    outputs: Vec<String>,
    completed: usize,
    percent: u8,
}

impl FileProgress {
    /// Tracker for a resolved file list
    pub fn new(files: &[FileEntry]) -> Self {
        Self {
            outputs: files.iter().map(|f| f.output.clone()).collect(),
            completed: 0,
            percent: 0,
        }
    }

    /// Number of files being transferred
    pub fn total(&self) -> usize {
        self.outputs.len()
    }

    /// Output path of the file at `index`, if any
    pub fn current_file(&self, index: usize) -> Option<String> {
        self.outputs.get(index).cloned()
    }

    /// Fold one agent line into the estimate
    pub fn observe(&mut self, line: &str) -> ProgressEvent {
        let total = self.total();
        if is_completion_marker(line) && self.completed < total {
            self.completed += 1;
        }

        if let Some(percent) = parse_percent(line) {
            self.percent = self.percent.max(percent);
        }
        let estimated = usize::from(self.percent) * total / 100;
        let done = self.completed.max(estimated).min(total);

        self.event(Phase::Downloading, self.percent, line.to_string(), done)
    }

    /// Event announcing the start of the transfer
    pub fn started(&self, message: impl Into<String>) -> ProgressEvent {
        self.event(Phase::Downloading, 0, message.into(), 0)
    }

    /// Final event for a successful transfer
    pub fn finished(&self) -> ProgressEvent {
        self.event(Phase::Done, 100, "download completed".to_string(), self.total())
    }

    fn event(&self, phase: Phase, percent: u8, message: String, done: usize) -> ProgressEvent {
        let total = self.total();
        ProgressEvent {
            phase,
            percent,
            message,
            total_files: total,
            done_files: done,
            remaining_files: total - done,
            current_file: self.current_file(done),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn files(n: usize) -> Vec<FileEntry> {
        (0..n)
            .map(|i| FileEntry {
                url: format!("https://host/get/f{i}"),
                output: format!("Root/f{i}.bin"),
            })
            .collect()
    }

    #[test]
    fn percent_estimates_done_files() {
        let mut progress = FileProgress::new(&files(4));
        let event = progress.observe("[#1 10MiB/20MiB(50%) CN:10]");
        assert_eq!(event.percent, 50);
        assert_eq!(event.done_files, 2);
        assert_eq!(event.remaining_files, 2);
        assert_eq!(event.current_file.as_deref(), Some("Root/f2.bin"));
        assert_eq!(event.phase, Phase::Downloading);
    }

    #[test]
    fn estimate_rounds_down() {
        let mut progress = FileProgress::new(&files(3));
        assert_eq!(progress.observe("(66%)").done_files, 1);
        assert_eq!(progress.observe("(99%)").done_files, 2);
    }

    #[test]
    fn markers_count_and_cap_at_total() {
        let mut progress = FileProgress::new(&files(2));
        progress.observe("[NOTICE] Download complete: Root/f0.bin");
        progress.observe("[NOTICE] Download complete: Root/f1.bin");
        let event = progress.observe("[NOTICE] DOWNLOAD COMPLETE: again");
        assert_eq!(event.done_files, 2);
        assert_eq!(event.remaining_files, 0);
        assert_eq!(event.current_file, None);
    }

    #[test]
    fn markers_beat_a_lower_percent() {
        let mut progress = FileProgress::new(&files(4));
        progress.observe("Download complete: a");
        progress.observe("Download complete: b");
        progress.observe("Download complete: c");
        let event = progress.observe("(10%)");
        assert_eq!(event.done_files, 3);
        assert_eq!(event.current_file.as_deref(), Some("Root/f3.bin"));
    }

    #[test]
    fn line_without_numbers_keeps_marker_count() {
        let mut progress = FileProgress::new(&files(2));
        progress.observe("Download complete: a");
        let event = progress.observe("Download Results:");
        assert_eq!(event.done_files, 1);
        assert_eq!(event.percent, 0);
        assert_eq!(event.message, "Download Results:");
    }

    #[test]
    fn status_lines_keep_the_highest_percent() {
        let mut progress = FileProgress::new(&files(4));
        progress.observe("[#1 10MiB/20MiB(50%) CN:10]");

        let event = progress.observe("[NOTICE] some status line");
        assert_eq!(event.percent, 50);
        assert_eq!(event.done_files, 2);
        assert_eq!(event.remaining_files, 2);
        assert_eq!(event.current_file.as_deref(), Some("Root/f2.bin"));

        let event = progress.observe("[#1 9MiB/20MiB(45%) CN:10]");
        assert_eq!(event.percent, 50);
        assert_eq!(event.done_files, 2);

        let event = progress.observe("[#1 15MiB/20MiB(75%) CN:10]");
        assert_eq!(event.percent, 75);
        assert_eq!(event.done_files, 3);

        let event = progress.observe("Download Results:");
        assert_eq!(event.percent, 75);
        assert_eq!(event.done_files, 3);
        assert_eq!(event.message, "Download Results:");
    }

    #[test]
    fn done_files_never_trail_the_reported_percent() {
        let lines = [
            "(20%)",
            "[NOTICE] status",
            "Download complete: a",
            "(60%)",
            "",
            "(10%)",
            "Download complete: b",
        ];
        let mut progress = FileProgress::new(&files(5));
        let mut last_done = 0;
        for line in lines {
            let event = progress.observe(line);
            assert!(event.done_files >= usize::from(event.percent) * 5 / 100);
            assert!(event.done_files >= last_done, "done_files went backwards on {line:?}");
            assert_eq!(event.done_files + event.remaining_files, 5);
            last_done = event.done_files;
        }
    }

    #[test]
    fn finished_reports_everything_done() {
        let progress = FileProgress::new(&files(3));
        let event = progress.finished();
        assert_eq!(event.phase, Phase::Done);
        assert_eq!(event.percent, 100);
        assert_eq!(event.done_files, 3);
        assert_eq!(event.remaining_files, 0);
    }

    #[test]
    fn started_points_at_first_file() {
        let progress = FileProgress::new(&files(2));
        let event = progress.started("download started");
        assert_eq!(event.done_files, 0);
        assert_eq!(event.remaining_files, 2);
        assert_eq!(event.current_file.as_deref(), Some("Root/f0.bin"));
    }
}
