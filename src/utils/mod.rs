use std::path::{Path, PathBuf};
use std::sync::Once;

use dirs::home_dir;

use crate::errors::SyncError;

const DEFAULT_DIR_NAME: &str = ".ynab-sync";
const CONFIG_ROOT_ENV: &str = "YNAB_SYNC_HOME";

static TRACING_INIT: Once = Once::new();

/// Initializes the global tracing subscriber: stdout `fmt` layer filtered by
/// `RUST_LOG` (defaulting to `ynab_sync_core=info`), plus a daily-rotating file
/// layer under `<config-root>/logs` retained for 7 days.
pub fn init_tracing(config_root: &Path) {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        let filter = EnvFilter::from_default_env()
            .add_directive("ynab_sync_core=info".parse().unwrap());

        let logs_dir = config_root.join("logs");
        let _ = std::fs::create_dir_all(&logs_dir);
        let file_appender = tracing_appender::rolling::daily(&logs_dir, "sync.log");
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
        // Leaking the guard is intentional: it must outlive the process for the
        // non-blocking writer to flush, and this runs at most once per process.
        Box::leak(Box::new(guard));

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer())
            .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
            .init();
    });
}

/// Resolves the crate's config root: `$YNAB_SYNC_HOME` if set, else
/// `~/.config/ynab-sync`, falling back to `.` when no home directory is known.
pub fn config_root() -> PathBuf {
    if let Some(custom) = std::env::var_os(CONFIG_ROOT_ENV) {
        return PathBuf::from(custom);
    }
    home_dir()
        .map(|home| home.join(".config").join("ynab-sync"))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DIR_NAME))
}

pub fn ensure_dir(path: &Path) -> Result<(), SyncError> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.to_path_buf();
    let ext = match path.extension().and_then(|ext| ext.to_str()) {
        Some(existing) => format!("{existing}.tmp"),
        None => "tmp".to_string(),
    };
    tmp.set_extension(ext);
    tmp
}

/// Writes `data` to `path` via a temp-file-then-rename so readers never observe a
/// partially written file.
pub fn write_atomic(path: &Path, data: &str) -> Result<(), SyncError> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    let tmp = tmp_path(path);
    std::fs::write(&tmp, data)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

/// Validates that `segment` is safe to use as a single path component (a budget id
/// or sync-history filename stem): non-empty, no `/`, `\`, or `..` (§4.5 path
/// traversal guard — every caller-influenced path segment must pass this).
pub fn validate_path_segment(segment: &str) -> Result<(), SyncError> {
    if segment.is_empty()
        || segment == "."
        || segment == ".."
        || segment.contains('/')
        || segment.contains('\\')
    {
        return Err(SyncError::PathTraversal(segment.to_string()));
    }
    Ok(())
}
