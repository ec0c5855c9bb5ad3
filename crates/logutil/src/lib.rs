use tracing::Level;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::FmtSubscriber;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    HumanReadable,
    Json,
}

/// Configure the global tracing subscriber.
///
/// `default_level` applies when RUST_LOG isn't set. Does nothing if a global
/// subscriber was already installed.
pub fn configure_global_logger(default_level: Level, format: LogFormat) {
    let env_filter = EnvFilter::builder()
        .with_default_directive(default_level.into())
        .from_env_lossy();

    let builder = FmtSubscriber::builder()
        .with_env_filter(env_filter)
        .with_thread_ids(true)
        .with_thread_names(true)
        .with_file(true)
        .with_line_number(true);

    // Already set, e.g. multiple tests in the same binary.
    match format {
        LogFormat::HumanReadable => {
            let _ = tracing::subscriber::set_global_default(builder.finish());
        }
        LogFormat::Json => {
            let _ = tracing::subscriber::set_global_default(builder.json().finish());
        }
    }
}

/// Configure a subscriber that writes through the test harness so output is
/// captured per test.
pub fn configure_test_logger() {
    let env_filter = EnvFilter::builder()
        .with_default_directive(Level::ERROR.into())
        .from_env_lossy();

    let subscriber = FmtSubscriber::builder()
        .with_test_writer()
        .with_env_filter(env_filter)
        .with_file(true)
        .with_line_number(true)
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}
