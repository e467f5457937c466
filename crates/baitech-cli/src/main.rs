//! Baitech CLI: run the image pipeline and identifier generator from a shell.
//!
//! Configuration comes from the environment (or `.env`); see `AppConfig`.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use baitech_cli::{init_tracing, read_upload};
use baitech_core::models::IdentifierKind;
use baitech_core::{AppConfig, AppError, ErrorMetadata, LogLevel};
use baitech_db::{setup_database, InMemorySequenceStore, PgSequenceStore, SequenceStore};
use baitech_services::{
    CloudinaryClient, IdentifierGenerator, ImageUploadService, ImageValidator,
    TransformationPreset,
};
use clap::{Parser, Subcommand};
use serde::Serialize;

#[derive(Parser)]
#[command(name = "baitech", about = "Baitech media and identifier tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a file without storing anything
    Check {
        /// Path to the image
        file: PathBuf,
    },
    /// Optimize an image into local variants only
    Optimize {
        /// Path to the image
        file: PathBuf,
    },
    /// Upload one or more images (CDN first when configured, local fallback)
    Upload {
        /// Paths to the images
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// CDN folder (defaults to CLOUDINARY_FOLDER)
        #[arg(long)]
        folder: Option<String>,
    },
    /// Delete stored variants of an image
    Delete {
        /// File name (extension ignored) or, with --remote, the CDN public id
        name: String,
        /// Delete from the remote CDN instead of local storage
        #[arg(long)]
        remote: bool,
    },
    /// Print the CDN delivery URL of a public id
    Url {
        /// CDN public id
        public_id: String,
        /// Preset: thumbnail, medium, large, hero
        #[arg(long, default_value = "medium")]
        preset: TransformationPreset,
        /// Force an output format (e.g. webp)
        #[arg(long)]
        format: Option<String>,
    },
    /// Print CDN metadata of a public id
    Info {
        /// CDN public id
        public_id: String,
    },
    /// List images in a CDN folder
    List {
        /// Folder (defaults to CLOUDINARY_FOLDER)
        folder: Option<String>,
        /// Maximum number of results
        #[arg(long, default_value = "100")]
        limit: u32,
    },
    /// Generate the next identifier: order, service-request, product, service
    NextId {
        kind: IdentifierKind,
    },
    /// Apply database migrations
    Migrate,
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize response")?;
    println!("{}", out);
    Ok(())
}

/// Log a failed command and print it as a JSON result.
fn report(err: &anyhow::Error) {
    let body = match err.downcast_ref::<AppError>() {
        Some(app) => {
            let details = app.detailed_message();
            match app.log_level() {
                LogLevel::Debug => tracing::debug!(code = app.error_code(), "{}", details),
                LogLevel::Warn => tracing::warn!(code = app.error_code(), "{}", details),
                LogLevel::Error => tracing::error!(code = app.error_code(), "{}", details),
            }
            serde_json::json!({
                "success": false,
                "error_code": app.error_code(),
                "recoverable": app.is_recoverable(),
                "message": app.client_message(),
            })
        }
        None => {
            tracing::error!("{:#}", err);
            serde_json::json!({ "success": false, "message": format!("{:#}", err) })
        }
    };

    if let Err(e) = print_json(&body) {
        eprintln!("{:#}", e);
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report(&err);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = AppConfig::from_env().context("Failed to load configuration")?;
    config.validate()?;

    match cli.command {
        Commands::Check { file } => {
            let (filename, data) = read_upload(&file).await?;
            let service = ImageUploadService::from_config(&config).await?;
            let validation = ImageValidator::local(service.max_file_size())
                .validate_all(&filename, data.len());
            let providers: Vec<&str> = service
                .providers()
                .filter(|p| p.is_available() && p.accepts(&filename))
                .map(|p| p.name())
                .collect();
            print_json(&serde_json::json!({
                "filename": filename,
                "size": data.len(),
                "allowed": service.is_allowed_file(&filename),
                "valid": validation.is_ok(),
                "message": validation.err().map(|e| e.to_string()),
                "providers": providers,
            }))?;
        }
        Commands::Optimize { file } => {
            let (filename, data) = read_upload(&file).await?;
            let service = ImageUploadService::from_config(&config).await?;
            let result = service.optimize_uploaded_image(data, &filename).await?;
            print_json(&result)?;
        }
        Commands::Upload { files, folder } => {
            let service = ImageUploadService::from_config(&config).await?;
            if let [file] = files.as_slice() {
                let (filename, data) = read_upload(file).await?;
                let result = service
                    .upload_image(data, &filename, folder.as_deref())
                    .await?;
                print_json(&result)?;
            } else {
                let mut uploads = Vec::with_capacity(files.len());
                for file in &files {
                    uploads.push(read_upload(file).await?);
                }
                let (results, errors) = service.upload_many(uploads, folder.as_deref()).await;
                print_json(&serde_json::json!({
                    "results": results,
                    "errors": errors,
                }))?;
            }
        }
        Commands::Delete { name, remote } => {
            let service = ImageUploadService::from_config(&config).await?;
            let (success, message) = if remote {
                service.delete_remote(&name).await
            } else if service.delete_image_variants(&name).await {
                (true, format!("Deleted variants of {}", name))
            } else {
                (false, format!("Failed to delete variants of {}", name))
            };
            print_json(&serde_json::json!({ "success": success, "message": message }))?;
        }
        Commands::Url {
            public_id,
            preset,
            format,
        } => {
            let client = CloudinaryClient::new(config.cloudinary.clone()).map_err(AppError::from)?;
            let url = client
                .build_url(&public_id, preset, format.as_deref())
                .context("CLOUDINARY_CLOUD_NAME is not set")?;
            print_json(&serde_json::json!({ "url": url }))?;
        }
        Commands::Info { public_id } => {
            let client = CloudinaryClient::new(config.cloudinary.clone()).map_err(AppError::from)?;
            let image = client.resource(&public_id).await.map_err(AppError::from)?;
            print_json(&image)?;
        }
        Commands::List { folder, limit } => {
            let client = CloudinaryClient::new(config.cloudinary.clone()).map_err(AppError::from)?;
            let folder = folder.unwrap_or_else(|| config.cloudinary.folder.clone());
            let images = client
                .list_folder(&folder, limit)
                .await
                .map_err(AppError::from)?;
            print_json(&images)?;
        }
        Commands::NextId { kind } => {
            let store: Arc<dyn SequenceStore> = if config.database_url.is_some() {
                Arc::new(PgSequenceStore::new(setup_database(&config).await?))
            } else {
                tracing::warn!("DATABASE_URL not set; using a process-local sequence");
                Arc::new(InMemorySequenceStore::new())
            };
            let generator = IdentifierGenerator::new(store, config.id_timezone);
            let id = generator.generate(kind).await?;
            print_json(&serde_json::json!({ "kind": kind.to_string(), "id": id }))?;
        }
        Commands::Migrate => {
            setup_database(&config).await?;
            print_json(&serde_json::json!({ "success": true, "message": "Migrations applied" }))?;
        }
    }

    Ok(())
}
