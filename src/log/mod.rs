//! Diagnostic logging for simulation runs.
//!
//! Modules log through the `log` facade macros (`error!`, `warn!`, `info!`,
//! `debug!`, `trace!`). Nothing is emitted until a level is set: logging is
//! off by default. Messages go to standard error so that standard output only
//! carries results.
//!
//! Levels can be set globally or per module path:
//!
//! ```rust
//! use vaxnet::log::{set_log_level, set_module_filter, LevelFilter};
//!
//! set_log_level(LevelFilter::Info);
//! set_module_filter("vaxnet::voter", LevelFilter::Trace);
//! ```
//!
//! The command line takes the same settings as a single string, parsed by
//! [`LogSpec::parse`]: a bare level applies globally and `module=level`
//! entries set module filters, e.g. `vaxnet::voter=trace,info`.
#[cfg(feature = "logging")]
mod standard_logger;

#[cfg(not(feature = "logging"))]
mod null_logger;

use std::collections::hash_map::Entry;
use std::str::FromStr;
use std::sync::{LazyLock, Mutex, MutexGuard};

pub use log::{debug, error, info, trace, warn, LevelFilter};
#[cfg(feature = "logging")]
use log4rs::Handle;
use rustc_hash::FxHashMap as HashMap;

use crate::error::SimError;

const DEFAULT_LOG_LEVEL: LevelFilter = LevelFilter::Off;

/// A global instance of the logging configuration.
static LOG_CONFIGURATION: LazyLock<Mutex<LogConfiguration>> = LazyLock::new(Mutex::default);

/// The level filter for one module path (e.g. `"vaxnet::network"`).
#[derive(Debug, PartialEq)]
struct ModuleLogConfiguration {
    module: String,
    level: LevelFilter,
}

impl From<(&str, LevelFilter)> for ModuleLogConfiguration {
    fn from((module, level): (&str, LevelFilter)) -> Self {
        Self {
            module: module.to_string(),
            level,
        }
    }
}

/// Module filters plus the handle of the installed logger. Loggers are
/// process-global, so there is exactly one of these, reached through the free
/// functions below.
#[derive(Debug)]
pub(in crate::log) struct LogConfiguration {
    /// Level for modules without their own filter. `Off` disables logging.
    pub(in crate::log) global_log_level: LevelFilter,
    module_configurations: HashMap<String, ModuleLogConfiguration>,

    #[cfg(feature = "logging")]
    root_handle: Option<Handle>,
}

impl Default for LogConfiguration {
    fn default() -> Self {
        Self {
            global_log_level: DEFAULT_LOG_LEVEL,
            module_configurations: HashMap::default(),

            #[cfg(feature = "logging")]
            root_handle: None,
        }
    }
}

impl LogConfiguration {
    fn set_log_level(&mut self, level: LevelFilter) {
        self.global_log_level = level;
        self.set_config();
    }

    /// Returns true if the configuration changed.
    fn insert_module_filter(&mut self, module: &str, level: LevelFilter) -> bool {
        match self.module_configurations.entry(module.to_string()) {
            Entry::Occupied(mut entry) => {
                if entry.get().level == level {
                    return false;
                }
                entry.get_mut().level = level;
            }
            Entry::Vacant(entry) => {
                entry.insert((module, level).into());
            }
        }
        true
    }

    fn set_module_filters<S: AsRef<str>>(&mut self, module_filters: &[(S, LevelFilter)]) {
        let mut mutated = false;
        for (module, level) in module_filters {
            mutated |= self.insert_module_filter(module.as_ref(), *level);
        }
        if mutated {
            self.set_config();
        }
    }

    fn remove_module_filter(&mut self, module: &str) {
        if self.module_configurations.remove(module).is_some() {
            self.set_config();
        }
    }
}

/// A parsed `--log-level` argument.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LogSpec {
    pub global: Option<LevelFilter>,
    pub modules: Vec<(String, LevelFilter)>,
}

fn parse_level(text: &str) -> Result<LevelFilter, SimError> {
    LevelFilter::from_str(text.trim()).map_err(|_| {
        SimError::invalid(
            "log_level",
            format!("unknown level `{text}`, expected off, error, warn, info, debug or trace"),
        )
    })
}

impl LogSpec {
    /// Parses a comma separated list of `level` and `module=level` entries.
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` for unknown levels, empty module names or
    /// more than one bare level.
    pub fn parse(spec: &str) -> Result<Self, SimError> {
        let mut parsed = LogSpec::default();
        for entry in spec.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            match entry.split_once('=') {
                Some((module, level)) => {
                    let module = module.trim();
                    if module.is_empty() {
                        return Err(SimError::invalid(
                            "log_level",
                            format!("missing module name in `{entry}`"),
                        ));
                    }
                    parsed.modules.push((module.to_string(), parse_level(level)?));
                }
                None => {
                    if parsed.global.is_some() {
                        return Err(SimError::invalid(
                            "log_level",
                            "more than one global level given",
                        ));
                    }
                    parsed.global = Some(parse_level(entry)?);
                }
            }
        }
        Ok(parsed)
    }

    /// Installs the module filters, then the global level if one was given.
    pub fn apply(&self) {
        let mut log_configuration = get_log_configuration();
        log_configuration.set_module_filters(&self.modules);
        if let Some(level) = self.global {
            log_configuration.set_log_level(level);
        }
    }
}

// The public API

/// Turns on all log messages. Equivalent to `set_log_level(LevelFilter::Trace)`.
pub fn enable_logging() {
    set_log_level(LevelFilter::Trace);
}

/// Turns off all log messages. Equivalent to `set_log_level(LevelFilter::Off)`.
pub fn disable_logging() {
    set_log_level(LevelFilter::Off);
}

/// Sets the global log level.
pub fn set_log_level(level: LevelFilter) {
    get_log_configuration().set_log_level(level);
}

/// Sets a level filter for the given module path.
pub fn set_module_filter(module_path: &str, level_filter: LevelFilter) {
    get_log_configuration().set_module_filters(&[(module_path, level_filter)]);
}

/// Sets several module filters with a single logger reconfiguration.
pub fn set_module_filters<S: AsRef<str>>(module_filters: &[(S, LevelFilter)]) {
    get_log_configuration().set_module_filters(module_filters);
}

/// Removes the filter for `module_path`; the global level applies to it again.
pub fn remove_module_filter(module_path: &str) {
    get_log_configuration().remove_module_filter(module_path);
}

fn get_log_configuration() -> MutexGuard<'static, LogConfiguration> {
    LOG_CONFIGURATION.lock().expect("Mutex poisoned")
}
