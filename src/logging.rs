use std::sync::OnceLock;
use std::thread;
use std::time::Instant;

static EPOCH: OnceLock<Instant> = OnceLock::new();

/// Pin the log clock; later calls keep the first instant.
pub fn mark_start() {
    EPOCH.get_or_init(Instant::now);
}

pub fn dev_log(message: &str) {
    if !cfg!(debug_assertions) {
        return;
    }

    let since_start = EPOCH.get_or_init(Instant::now).elapsed().as_millis();
    let current = thread::current();
    let thread_name = current.name().unwrap_or("unnamed");
    eprintln!("[+{since_start}ms][{thread_name}] {message}");
}

#[macro_export]
macro_rules! log_dev {
    ($($arg:tt)*) => {
        if cfg!(debug_assertions) {
            $crate::logging::dev_log(&format!($($arg)*));
        }
    };
}
