use env_logger::Builder;
use log::LevelFilter;
use std::io::Write;

/// Initialize the logger with custom formatting
///
/// Output goes to stderr so it does not interleave with the menu, which
/// draws on stdout.
pub fn init_logger(level: LevelFilter) {
    Builder::new()
        .format(|buf, record| {
            writeln!(
                buf,
                "{} [{}] - {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .filter(None, level)
        .target(env_logger::Target::Stderr)
        .init();
}

/// Get log level from string
pub fn get_log_level(level: &str) -> LevelFilter {
    match level.to_lowercase().as_str() {
        "trace" => LevelFilter::Trace,
        "debug" => LevelFilter::Debug,
        "info" => LevelFilter::Info,
        "warn" => LevelFilter::Warn,
        "error" => LevelFilter::Error,
        "off" => LevelFilter::Off,
        _ => LevelFilter::Info,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_is_case_insensitive() {
        assert_eq!(get_log_level("WARN"), LevelFilter::Warn);
        assert_eq!(get_log_level("debug"), LevelFilter::Debug);
    }

    #[test]
    fn test_unknown_log_level_falls_back_to_info() {
        assert_eq!(get_log_level("chatty"), LevelFilter::Info);
    }
}
