//! Engine observers used by the samples.

use std::fs::File;
use std::path::Path;

use cs_core::Tick;
use cs_engine::EngineObserver;
use csv::Writer;
use tracing::info;

/// Writes one CSV row per completed tick: `tick,tasks_run`.
///
/// Errors from the writer are stored because `EngineObserver` methods have
/// no return value; check [`take_error`][Self::take_error] after the run.
pub struct CsvTickObserver {
    writer:     Writer<File>,
    last_error: Option<csv::Error>,
    finished:   bool,
}

impl CsvTickObserver {
    pub fn create(path: &Path) -> csv::Result<Self> {
        let mut writer = Writer::from_path(path)?;
        writer.write_record(["tick", "tasks_run"])?;
        Ok(Self { writer, last_error: None, finished: false })
    }

    /// Take the stored write error (if any).
    pub fn take_error(&mut self) -> Option<csv::Error> {
        self.last_error.take()
    }

    fn store_err(&mut self, result: csv::Result<()>) {
        if let Err(e) = result {
            // Keep only the first error.
            if self.last_error.is_none() {
                self.last_error = Some(e);
            }
        }
    }
}

impl EngineObserver for CsvTickObserver {
    fn on_tick_end(&mut self, tick: Tick, tasks_run: usize) {
        let result = self.writer.write_record(&[tick.0.to_string(), tasks_run.to_string()]);
        self.store_err(result);
    }

    fn on_sim_end(&mut self, _final_tick: Tick) {
        if self.finished {
            return;
        }
        self.finished = true;
        let result = self.writer.flush().map_err(csv::Error::from);
        self.store_err(result);
    }
}

/// Logs each completed tick at `info`.
pub struct ProgressObserver;

impl EngineObserver for ProgressObserver {
    fn on_tick_end(&mut self, tick: Tick, tasks_run: usize) {
        info!(tick = %tick, tasks_run, "tick complete");
    }

    fn on_sim_end(&mut self, final_tick: Tick) {
        info!(final_tick = %final_tick, "simulation finished");
    }
}
