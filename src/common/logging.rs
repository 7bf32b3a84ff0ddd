use owo_colors::{OwoColorize, Stream::Stdout};

/// Setting this environment variable to anything forces trace logging
pub const TRACE_ENV_VAR: &str = "WEAVE_PLUGIN_TRACE";

/// Enable the logger
pub fn enable_logger(level: log::LevelFilter, verbose: bool) -> Result<(), log::SetLoggerError> {
    fern::Dispatch::new()
        .format(move |out, message, record| {
            out.finish(format_args!(
                "{}{}: {}",
                // Level messages are padded to keep the output looking somewhat sane
                match record.level() {
                    log::Level::Error => "ERROR"
                        .if_supports_color(Stdout, |text| text.red())
                        .if_supports_color(Stdout, |text| text.bold())
                        .to_string(),
                    log::Level::Warn => "WARN "
                        .if_supports_color(Stdout, |text| text.yellow())
                        .if_supports_color(Stdout, |text| text.bold())
                        .to_string(),
                    log::Level::Info => "INFO "
                        .if_supports_color(Stdout, |text| text.green())
                        .if_supports_color(Stdout, |text| text.bold())
                        .to_string(),
                    log::Level::Debug => "DEBUG"
                        .if_supports_color(Stdout, |text| text.bright_blue())
                        .if_supports_color(Stdout, |text| text.bold())
                        .to_string(),
                    log::Level::Trace => "TRACE"
                        .if_supports_color(Stdout, |text| text.bright_white())
                        .if_supports_color(Stdout, |text| text.bold())
                        .to_string(),
                },
                // Only show the outer package name if verbose logging is enabled (otherwise nothing)
                match verbose {
                    true => format!(" [{}]", record.target().split("::").next().unwrap_or_default()),
                    false => String::new(),
                }
                .if_supports_color(Stdout, |text| text.bright_black()),
                message
            ))
        })
        .level(effective_level(
            level,
            verbose,
            std::env::var_os(TRACE_ENV_VAR).is_some(),
        ))
        // Output to STDOUT
        .chain(std::io::stdout())
        .apply()
}

/// Work out the level to log at from the configured level and the overrides
fn effective_level(level: log::LevelFilter, verbose: bool, trace: bool) -> log::LevelFilter {
    match (trace, verbose) {
        (true, _) => log::LevelFilter::Trace,
        (false, true) => level.max(log::LevelFilter::Debug),
        (false, false) => level,
    }
}

/// Parses a log level name as accepted by `--log-level`
pub fn parse_log_level(string: &str) -> Result<log::LevelFilter, String> {
    match string.to_ascii_lowercase().as_str() {
        "off" => Ok(log::LevelFilter::Off),
        "error" => Ok(log::LevelFilter::Error),
        "warn" | "warning" => Ok(log::LevelFilter::Warn),
        "info" => Ok(log::LevelFilter::Info),
        "debug" => Ok(log::LevelFilter::Debug),
        "trace" => Ok(log::LevelFilter::Trace),
        _ => Err(format!(
            "Unknown log level {string:?}. Must be one of debug, info, warning, or error"
        )),
    }
}

/// Deserializes a log level name the same way `--log-level` parses it
pub fn deserialize_log_level<'de, D>(deserializer: D) -> Result<log::LevelFilter, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let string = <String as serde::Deserialize>::deserialize(deserializer)?;
    parse_log_level(&string).map_err(serde::de::Error::custom)
}
