//! This module contains the global logger instance used by the `log` crate.
//!
//! Records are written to a sink installed once at boot, usually a serial port
//! or a framebuffer console.

use core::fmt::Write;
use spin::Mutex;

type Sink = &'static mut (dyn Write + Send);

/// The output of the logger.
static SINK: Mutex<Option<Sink>> = Mutex::new(None);

/// The static API for the logger.
pub static LOGGER_API: LockedLogger = LockedLogger;

/// An API that is backed by a static locked sink.
///
/// It is used to interface with the `log` crate.
pub struct LockedLogger;

/// Installs the logger, writing records to `sink`.
///
/// Fails if a logger has already been installed.
pub fn init(sink: Sink) -> Result<&'static LockedLogger, log::SetLoggerError> {
    log::set_logger(&LOGGER_API)?;
    *SINK.lock() = Some(sink);

    log::set_max_level(if cfg!(debug_assertions) {
        log::LevelFilter::Trace
    } else {
        log::LevelFilter::Info
    });

    Ok(&LOGGER_API)
}

impl log::Log for LockedLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        if cfg!(debug_assertions) {
            true
        } else {
            metadata.level() <= log::Level::Info
        }
    }

    fn log(&self, record: &log::Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let mut sink = SINK.lock();
        let Some(writer) = sink.as_mut() else {
            return;
        };

        // There is nowhere to report a failing sink
        let _ = if cfg!(debug_assertions) {
            writeln!(
                writer,
                "[{:5}] {}:{}: {}",
                record.level(),
                record.file().unwrap_or("unknown"),
                record.line().unwrap_or(0),
                record.args()
            )
        } else {
            writeln!(writer, "[{:5}] {}", record.level(), record.args())
        };
    }

    fn flush(&self) {}
}
