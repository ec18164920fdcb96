//! Course Registry API Server binary
//!
//! HTTP REST API for staging and committing course completions.

use anyhow::Context;
use clap::Parser;
use course_registry::api::{run_api_server, ApiConfig};
use course_registry::config::RegistryConfig;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "course-registry-server")]
#[command(version)]
#[command(about = "Course Registry API Server - HTTP REST API for the volunteer course registry")]
#[command(long_about = r#"
Course Registry API Server - HTTP REST API

Every uploaded workbook opens an isolated session:
  - POST   /api/v1/sessions                        - Upload a workbook (multipart 'file')
  - GET    /api/v1/sessions/:id/volunteers?category=ACTIVOS
  - GET    /api/v1/sessions/:id/courses?category=ACTIVOS
  - GET    /api/v1/sessions/:id/table?category=ACTIVOS&limit=20
  - GET    /api/v1/sessions/:id/edits              - List pending edits
  - POST   /api/v1/sessions/:id/edits              - Stage an edit
  - DELETE /api/v1/sessions/:id/edits/:position    - Remove one edit
  - DELETE /api/v1/sessions/:id/edits              - Clear all edits
  - POST   /api/v1/sessions/:id/commit             - Save pending edits
  - GET    /api/v1/sessions/:id/download           - Download Registro_Quinta_Cursos.xlsx
  - DELETE /api/v1/sessions/:id                    - Close the session

Example usage:
  course-registry-server                           # Start on localhost:8080
  course-registry-server --host 0.0.0.0 --port 3000
  course-registry-server --session-ttl-mins 30     # Drop sessions idle for 30 minutes

  curl -F file=@registro.xlsx http://localhost:8080/api/v1/sessions
"#)]
struct Args {
    /// Host address to bind to (use 0.0.0.0 for all interfaces)
    #[arg(short = 'H', long, default_value = "127.0.0.1", env = "COURSE_REGISTRY_HOST")]
    host: String,

    /// Port to listen on
    #[arg(short, long, default_value = "8080", env = "COURSE_REGISTRY_PORT")]
    port: u16,

    /// Largest accepted upload in megabytes
    #[arg(long, default_value = "16", value_parser = clap::value_parser!(u64).range(1..=4096))]
    max_upload_mb: u64,

    /// Minutes a session may stay idle before it is dropped
    #[arg(
        long,
        default_value = "120",
        env = "COURSE_REGISTRY_SESSION_TTL_MINS",
        value_parser = clap::value_parser!(u64).range(1..=10080)
    )]
    session_ttl_mins: u64,

    /// Layout/commit configuration (YAML)
    #[arg(long, env = "COURSE_REGISTRY_LAYOUT")]
    layout: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let registry = RegistryConfig::load(args.layout.as_deref())?;
    let max_upload_bytes = usize::try_from(args.max_upload_mb)
        .ok()
        .and_then(|mb| mb.checked_mul(1024 * 1024))
        .context("--max-upload-mb does not fit in memory on this platform")?;
    let config = ApiConfig {
        host: args.host,
        port: args.port,
        max_upload_bytes,
        session_ttl: Duration::from_secs(args.session_ttl_mins * 60),
    };

    run_api_server(config, registry).await
}
