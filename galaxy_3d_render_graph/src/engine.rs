/// Galaxy3D Engine - process-wide state for the render graph
///
/// Holds the global logger and remembers which thread initialized the
/// engine. Graph construction is single-threaded: builder operations check
/// `Engine::is_main_thread()` before touching the graph.

use std::sync::{OnceLock, RwLock};
use std::thread::{self, ThreadId};
use std::time::SystemTime;
use crate::error::Result;
use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger};

// ===== INTERNAL STATE =====

static ENGINE_STATE: OnceLock<EngineState> = OnceLock::new();

static LOGGER: OnceLock<RwLock<Box<dyn Logger>>> = OnceLock::new();

struct EngineState {
    /// Thread that called `Engine::initialize`, None once shut down
    main_thread: RwLock<Option<ThreadId>>,
}

impl EngineState {
    fn new() -> Self {
        Self {
            main_thread: RwLock::new(None),
        }
    }
}

// ===== PUBLIC API =====

/// Engine entry point
///
/// # Example
///
/// ```no_run
/// use galaxy_3d_render_graph::galaxy3d::Engine;
///
/// Engine::initialize()?;
/// assert!(Engine::is_main_thread());
/// Engine::shutdown();
/// # Ok::<(), galaxy_3d_render_graph::galaxy3d::Error>(())
/// ```
pub struct Engine;

impl Engine {
    /// Initialize the engine and record the calling thread as the main thread
    ///
    /// Calling it again from the same thread is a no-op. Calling it from
    /// another thread while initialized moves the main thread there.
    pub fn initialize() -> Result<()> {
        let state = ENGINE_STATE.get_or_init(EngineState::new);
        let current = thread::current().id();
        if let Ok(mut main) = state.main_thread.write() {
            if let Some(previous) = *main {
                if previous != current {
                    crate::engine_warn!("galaxy3d::Engine",
                        "Engine re-initialized from another thread, main thread moved");
                }
            }
            *main = Some(current);
        }
        crate::engine_debug!("galaxy3d::Engine", "Engine initialized");
        Ok(())
    }

    /// Forget the main thread. `initialize()` must be called again afterwards.
    pub fn shutdown() {
        if let Some(state) = ENGINE_STATE.get() {
            if let Ok(mut main) = state.main_thread.write() {
                *main = None;
            }
        }
    }

    pub fn is_initialized() -> bool {
        ENGINE_STATE
            .get()
            .and_then(|state| state.main_thread.read().ok().map(|main| main.is_some()))
            .unwrap_or(false)
    }

    /// True when called from the initializing thread
    ///
    /// Without an initialized engine there is no recorded main thread and
    /// every thread is accepted.
    pub fn is_main_thread() -> bool {
        let Some(state) = ENGINE_STATE.get() else {
            return true;
        };
        match state.main_thread.read() {
            Ok(main) => match *main {
                Some(id) => id == thread::current().id(),
                None => true,
            },
            Err(_) => false,
        }
    }

    /// Reset engine state for tests
    #[cfg(test)]
    pub fn reset_for_testing() {
        Self::shutdown();
        Self::reset_logger();
    }

    // ===== LOGGING API =====

    /// Replace the global logger
    pub fn set_logger<L: Logger + 'static>(logger: L) {
        let logger_lock = LOGGER.get_or_init(|| RwLock::new(Box::new(DefaultLogger)));
        if let Ok(mut lock) = logger_lock.write() {
            *lock = Box::new(logger);
        }
    }

    /// Restore the colored console logger
    pub fn reset_logger() {
        let logger_lock = LOGGER.get_or_init(|| RwLock::new(Box::new(DefaultLogger)));
        if let Ok(mut lock) = logger_lock.write() {
            *lock = Box::new(DefaultLogger);
        }
    }

    /// Used by engine_trace!/engine_debug!/engine_info!/engine_warn!
    pub fn log(severity: LogSeverity, source: &str, message: String) {
        let logger_lock = LOGGER.get_or_init(|| RwLock::new(Box::new(DefaultLogger)));
        if let Ok(lock) = logger_lock.read() {
            lock.log(&LogEntry {
                severity,
                timestamp: SystemTime::now(),
                source: source.to_string(),
                message,
                file: None,
                line: None,
            });
        }
    }

    /// Used by engine_error!/engine_err!/engine_bail!
    pub fn log_detailed(
        severity: LogSeverity,
        source: &str,
        message: String,
        file: &'static str,
        line: u32,
    ) {
        let logger_lock = LOGGER.get_or_init(|| RwLock::new(Box::new(DefaultLogger)));
        if let Ok(lock) = logger_lock.read() {
            lock.log(&LogEntry {
                severity,
                timestamp: SystemTime::now(),
                source: source.to_string(),
                message,
                file: Some(file),
                line: Some(line),
            });
        }
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
