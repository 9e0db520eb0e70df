//! Log routing for library diagnostics.
//!
//! Every [`Device`][crate::Device] logs through a [`LogContext`]: either one assigned to the
//! device with [`Device::set_log_context`][crate::Device::set_log_context], or the process-wide
//! default set with [`set_default_log_context`].
//!
//! The default handler, [`LogFacade`], forwards everything to the [`log`] crate under the
//! `evsync` target, so applications that already install a `log` backend need no setup.

use std::{
    fmt,
    sync::{Arc, PoisonError, RwLock},
};

/// Severity of a log message.
///
/// Lower numeric values are more severe. A [`LogContext`] lets through every message whose
/// priority is at most as verbose as its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum LogPriority {
    Error = 10,
    Info = 20,
    Debug = 30,
}

/// Receives the messages that pass a [`LogContext`]'s priority filter.
pub trait LogHandler: Send + Sync {
    fn log(&self, priority: LogPriority, args: fmt::Arguments<'_>);
}

impl<F> LogHandler for F
where
    F: Fn(LogPriority, fmt::Arguments<'_>) + Send + Sync,
{
    fn log(&self, priority: LogPriority, args: fmt::Arguments<'_>) {
        self(priority, args)
    }
}

/// A [`LogHandler`] that forwards to the [`log`] crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogFacade;

impl LogHandler for LogFacade {
    fn log(&self, priority: LogPriority, args: fmt::Arguments<'_>) {
        match priority {
            LogPriority::Error => log::error!(target: "evsync", "{args}"),
            LogPriority::Info => log::info!(target: "evsync", "{args}"),
            LogPriority::Debug => log::debug!(target: "evsync", "{args}"),
        }
    }
}

/// A log handler together with the most verbose priority it should receive.
#[derive(Clone)]
pub struct LogContext {
    priority: LogPriority,
    handler: Arc<dyn LogHandler>,
}

impl LogContext {
    pub fn new(priority: LogPriority, handler: impl LogHandler + 'static) -> Self {
        Self {
            priority,
            handler: Arc::new(handler),
        }
    }

    #[inline]
    pub fn priority(&self) -> LogPriority {
        self.priority
    }

    #[inline]
    pub fn set_priority(&mut self, priority: LogPriority) {
        self.priority = priority;
    }

    /// Returns whether a message of the given priority would reach the handler.
    #[inline]
    pub fn enabled(&self, priority: LogPriority) -> bool {
        priority <= self.priority
    }

    pub fn log(&self, priority: LogPriority, args: fmt::Arguments<'_>) {
        if self.enabled(priority) {
            self.handler.log(priority, args);
        }
    }
}

impl Default for LogContext {
    fn default() -> Self {
        Self::new(LogPriority::Info, LogFacade)
    }
}

impl fmt::Debug for LogContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogContext")
            .field("priority", &self.priority)
            .finish_non_exhaustive()
    }
}

static DEFAULT: RwLock<Option<LogContext>> = RwLock::new(None);

/// Replaces the process-wide [`LogContext`] used by devices without their own.
pub fn set_default_log_context(ctx: LogContext) {
    *DEFAULT.write().unwrap_or_else(PoisonError::into_inner) = Some(ctx);
}

/// Returns the process-wide [`LogContext`].
pub fn default_log_context() -> LogContext {
    DEFAULT
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
        .unwrap_or_default()
}
