//! Output formatting and logging utilities

use crate::error::{MdError, Result};
use crate::run_md::ForceOutput;
use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime as StdSystemTime;
use tracing::{info, warn};
use tracing_subscriber::{
    fmt::format::Writer, fmt::layer, fmt::time::FormatTime, layer::SubscriberExt,
    util::SubscriberInitExt, Registry,
};

/// Custom time formatter that shows only seconds
struct SecondPrecisionTimer;

impl FormatTime for SecondPrecisionTimer {
    fn format_time(&self, w: &mut Writer<'_>) -> fmt::Result {
        let now = StdSystemTime::now();
        let duration = now
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default();

        let total_seconds = duration.as_secs();
        let hours = (total_seconds / 3600) % 24;
        let minutes = (total_seconds / 60) % 60;
        let seconds = total_seconds % 60;

        write!(w, "{:02}:{:02}:{:02}", hours, minutes, seconds)
    }
}

/// Destination of the log records
#[derive(Debug)]
enum LogTarget {
    File(File),
    Stdout,
    /// The requested file could not be created, so stdout is used instead
    StdoutFallback { path: String, error: std::io::Error },
}

fn log_target(output_path: Option<&String>) -> LogTarget {
    match output_path {
        Some(path) => match File::create(path) {
            Ok(log) => LogTarget::File(log),
            Err(error) => LogTarget::StdoutFallback {
                path: path.clone(),
                error,
            },
        },
        None => LogTarget::Stdout,
    }
}

fn init_stdout() {
    let stdout_layer = layer()
        .with_writer(std::io::stdout)
        .with_timer(SecondPrecisionTimer)
        .with_ansi(true);
    Registry::default().with(stdout_layer).init();
}

/// Setup log output to file or stdout
pub fn setup_output(output_path: Option<&String>) {
    match log_target(output_path) {
        LogTarget::File(log) => {
            let file_layer = layer()
                .with_writer(log)
                .with_timer(SecondPrecisionTimer)
                .with_ansi(false);
            Registry::default().with(file_layer).init();
            if let Some(path) = output_path {
                info!("Output will be written to: {}", path);
            }
        }
        LogTarget::Stdout => init_stdout(),
        LogTarget::StdoutFallback { path, error } => {
            init_stdout();
            warn!("Could not create output file {}: {}, logging to stdout", path, error);
        }
    }
}

/// Writes one line per sampled step: step, kinetic energy, potential
/// energy, the three virial components and the three heat-current
/// components, with 16 decimals.
pub struct EnergyWriter<W: Write> {
    writer: W,
    path: PathBuf,
}

impl EnergyWriter<BufWriter<File>> {
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::create(&path).map_err(|source| MdError::Io {
            path: path.display().to_string(),
            source,
        })?;
        info!("Energies will be written to: {}", path.display());
        Ok(EnergyWriter {
            writer: BufWriter::new(file),
            path,
        })
    }
}

impl<W: Write> EnergyWriter<W> {
    pub fn new(writer: W) -> Self {
        EnergyWriter {
            writer,
            path: PathBuf::from("<writer>"),
        }
    }

    pub fn write_sample(&mut self, step: usize, kinetic_energy: f64, output: &ForceOutput) -> Result<()> {
        let v = &output.virial;
        let j = &output.heat_current;
        writeln!(
            self.writer,
            "{} {:.16} {:.16} {:.16} {:.16} {:.16} {:.16} {:.16} {:.16}",
            step, kinetic_energy, output.potential_energy, v.x, v.y, v.z, j.x, j.y, j.z
        )
        .map_err(|source| self.io_error(source))
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush().map_err(|source| self.io_error(source))
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn io_error(&self, source: std::io::Error) -> MdError {
        MdError::Io {
            path: self.path.display().to_string(),
            source,
        }
    }
}
