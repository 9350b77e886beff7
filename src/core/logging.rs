//! Process-wide logging on top of flexi_logger
//!
//! Every phase transition, skip and per-file failure is a single log line;
//! the format is chosen once at startup.

// Global logger handle; dropping it would stop flexi_logger's writers
static LOGGER_HANDLE: std::sync::OnceLock<std::sync::Mutex<flexi_logger::LoggerHandle>> =
    std::sync::OnceLock::new();

/// Initialise the global logger
///
/// * `log_level` - flexi_logger spec string, defaults to `info`
/// * `log_format` - `text` (default), `ext` (with source location) or `json`
/// * `log_file` - optional file that receives a copy of every line
/// * `color_enabled` - colorize level tags on the console
pub fn init_logging(
    log_level: Option<&str>,
    log_format: Option<&str>,
    log_file: Option<&std::path::Path>,
    color_enabled: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    use flexi_logger::{Duplicate, FileSpec, Logger};

    let level = log_level.unwrap_or("info");
    let format = log_format.unwrap_or("text");

    let mut logger =
        Logger::try_with_str(logger_spec(level))?.format(formatter_for(format, color_enabled));

    if let Some(file_path) = log_file {
        let file_spec = FileSpec::try_from(file_path)?;
        logger = logger
            .log_to_file(file_spec)
            .duplicate_to_stderr(Duplicate::All);
    }

    let handle = logger.start()?;
    let _ = LOGGER_HANDLE.set(std::sync::Mutex::new(handle));

    Ok(())
}

const TIMESTAMP: &str = "%Y-%m-%d %H:%M:%S%.3f";

type Formatter = fn(
    &mut dyn std::io::Write,
    &mut flexi_logger::DeferredNow,
    &log::Record,
) -> Result<(), std::io::Error>;

fn formatter_for(format: &str, color: bool) -> Formatter {
    match (format, color) {
        ("json", _) => json_format,
        ("ext", true) => extended_color_format,
        ("ext", false) => extended_format,
        (_, true) => simple_color_format,
        (_, false) => simple_format,
    }
}

/// Transport crates log every connection at debug; keep them at warn unless tracing
fn logger_spec(level: &str) -> String {
    if level.trim() == "trace" {
        level.to_string()
    } else {
        format!("{}, hyper=warn, rustls=warn, reqwest=warn", level)
    }
}

fn level_tag(level: log::Level) -> &'static str {
    match level {
        log::Level::Error => "ERR",
        log::Level::Warn => "WRN",
        log::Level::Info => "INF",
        log::Level::Debug => "DBG",
        log::Level::Trace => "TRC",
    }
}

/// One text log line: `<time> <LVL> <message>[ (<file>:<line>)]`
fn text_line(
    w: &mut dyn std::io::Write,
    now: &mut flexi_logger::DeferredNow,
    record: &log::Record,
    color: bool,
    with_location: bool,
) -> Result<(), std::io::Error> {
    use colored::Colorize;

    let stamp = now.format(TIMESTAMP).to_string();
    let tag = level_tag(record.level());
    let location = with_location.then(|| format_target_as_path(record.target(), record.line()));

    if color {
        let tag = match record.level() {
            log::Level::Error => tag.red().bold(),
            log::Level::Warn => tag.yellow(),
            log::Level::Info => tag.green(),
            log::Level::Debug => tag.blue(),
            log::Level::Trace => tag.magenta(),
        };
        write!(w, "{} {} {}", stamp.dimmed(), tag, record.args())?;
        if let Some(location) = location {
            write!(w, " ({})", location.dimmed())?;
        }
    } else {
        write!(w, "{} {} {}", stamp, tag, record.args())?;
        if let Some(location) = location {
            write!(w, " ({})", location)?;
        }
    }
    Ok(())
}

fn simple_format(
    w: &mut dyn std::io::Write,
    now: &mut flexi_logger::DeferredNow,
    record: &log::Record,
) -> Result<(), std::io::Error> {
    text_line(w, now, record, false, false)
}

fn simple_color_format(
    w: &mut dyn std::io::Write,
    now: &mut flexi_logger::DeferredNow,
    record: &log::Record,
) -> Result<(), std::io::Error> {
    text_line(w, now, record, true, false)
}

fn extended_format(
    w: &mut dyn std::io::Write,
    now: &mut flexi_logger::DeferredNow,
    record: &log::Record,
) -> Result<(), std::io::Error> {
    text_line(w, now, record, false, true)
}

fn extended_color_format(
    w: &mut dyn std::io::Write,
    now: &mut flexi_logger::DeferredNow,
    record: &log::Record,
) -> Result<(), std::io::Error> {
    text_line(w, now, record, true, true)
}

// one object per line, for log shippers
fn json_format(
    w: &mut dyn std::io::Write,
    now: &mut flexi_logger::DeferredNow,
    record: &log::Record,
) -> Result<(), std::io::Error> {
    let line = serde_json::json!({
        "timestamp": now.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string(),
        "level": level_tag(record.level()),
        "message": record.args().to_string(),
        "target": format_target_as_path(record.target(), record.line()),
    });
    serde_json::to_writer(&mut *w, &line).map_err(std::io::Error::from)
}

// scan_smuggler::transfer::orchestrator -> transfer/orchestrator.rs
fn format_target_as_path(target: &str, line: Option<u32>) -> String {
    let path = match target.strip_prefix("scan_smuggler::") {
        Some(module) => format!("{}.rs", module.replace("::", "/")),
        None => target.replace("::", "/"),
    };
    match line {
        Some(line) => format!("{}:{}", path, line),
        None => path,
    }
}
