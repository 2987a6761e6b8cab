//! Initializes the global tracing subscriber: pretty or JSON console output,
//! an optional rolling file sink, and an `EnvFilter` seeded from `--log-level`
//! (overridable with `RUST_LOG`).

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::cli::FILE_GUARD;

pub fn init_tracing(json: bool, log_level: &str, log_file: Option<&str>, rotation: Option<&str>) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let console_layer = if json {
        BoxedLayerExt::boxed(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr),
        )
    } else {
        BoxedLayerExt::boxed(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
    };

    let file_layer = log_file.map(|path| {
        let path = std::path::Path::new(path);
        let dir = path.parent().filter(|p| !p.as_os_str().is_empty());
        if let Some(dir) = dir {
            let _ = std::fs::create_dir_all(dir);
        }
        let file_name = path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("ergo.log");
        let appender = match rotation {
            Some("daily") => tracing_appender::rolling::daily(
                dir.unwrap_or_else(|| std::path::Path::new(".")),
                file_name,
            ),
            Some("hourly") => tracing_appender::rolling::hourly(
                dir.unwrap_or_else(|| std::path::Path::new(".")),
                file_name,
            ),
            _ => tracing_appender::rolling::never(
                dir.unwrap_or_else(|| std::path::Path::new(".")),
                file_name,
            ),
        };
        let (non_blocking, guard) = tracing_appender::non_blocking(appender);
        let _ = FILE_GUARD.set(guard);
        BoxedLayerExt::boxed(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(non_blocking),
        )
    });

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .try_init();
}

use tracing_subscriber::Layer;
trait BoxedLayerExt<S> {
    fn boxed(self) -> Box<dyn Layer<S> + Send + Sync + 'static>;
}

impl<S, L> BoxedLayerExt<S> for L
where
    L: Layer<S> + Send + Sync + 'static,
    S: tracing::Subscriber + for<'span> tracing_subscriber::registry::LookupSpan<'span>,
{
    fn boxed(self) -> Box<dyn Layer<S> + Send + Sync + 'static> {
        Box::new(self)
    }
}
