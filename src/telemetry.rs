//! Log setup for the survey backend.
//!
//! `LOG_LEVEL` takes full `EnvFilter` directives; a bare level such as `warn`
//! keeps the per-target defaults below and only changes the global floor.
//! `LOG_FORMAT` is one of `pretty` (default), `compact` or `json`.
//!
//! Targets: `herdcheck` (server, chat, reviews), `survey` (sessions, scoring, results).

use tracing_subscriber::EnvFilter;

const TARGET_DIRECTIVES: &[&str] = &["herdcheck=debug", "survey=debug", "tower_http=info", "axum=info"];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogFormat {
  Pretty,
  Compact,
  Json,
}

impl LogFormat {
  /// Unknown or missing values fall back to `Pretty`.
  pub fn parse(raw: Option<&str>) -> Self {
    match raw.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
      Some("json") => LogFormat::Json,
      Some("compact") => LogFormat::Compact,
      _ => LogFormat::Pretty,
    }
  }
}

/// Filter directives for a `LOG_LEVEL` value.
pub fn filter_directives(raw: Option<&str>) -> String {
  let raw = raw.map(str::trim).filter(|s| !s.is_empty());
  match raw {
    Some(directives) if directives.contains('=') || directives.contains(',') => directives.to_string(),
    level => {
      let floor = level.unwrap_or("info");
      std::iter::once(floor).chain(TARGET_DIRECTIVES.iter().copied()).collect::<Vec<_>>().join(",")
    }
  }
}

pub fn init_tracing() {
  let level = std::env::var("LOG_LEVEL").ok();
  let directives = filter_directives(level.as_deref());
  let filter = EnvFilter::try_new(&directives).unwrap_or_else(|_| EnvFilter::new(filter_directives(None)));
  let format = LogFormat::parse(std::env::var("LOG_FORMAT").ok().as_deref());

  let builder = tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_target(true)
    .with_line_number(true);

  match format {
    LogFormat::Json => builder.json().init(),
    LogFormat::Compact => builder.compact().init(),
    LogFormat::Pretty => builder.with_file(true).init(),
  }
  tracing::debug!(target: "herdcheck", %directives, ?format, "Logging initialised");
}
