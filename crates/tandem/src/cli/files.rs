//! File command handlers.

use super::commands::{Commands, OutputFormat};
use std::path::Path;
use tandem::{
    FileCoordinator, FileError, FileErrorKind, FileId, FileRecord, JsonError, StorageError,
    StorageErrorKind, TandemConfig, TandemResult, Upload, open_coordinator, open_record_store,
};

/// Handle a parsed command.
pub async fn handle_command(cmd: Commands, config: &TandemConfig) -> TandemResult<()> {
    match cmd {
        Commands::Upload {
            path,
            name,
            data,
            content_type,
        } => {
            let files = open_coordinator(config)?;
            upload_file(&files, &path, name.as_deref(), data.as_deref(), content_type).await
        }

        Commands::List { format } => list_files(&open_coordinator(config)?, format).await,

        Commands::Show { id, format } => {
            show_file(&open_coordinator(config)?, FileId(id), format).await
        }

        Commands::Rename { id, name, data } => {
            let files = open_coordinator(config)?;
            rename_file(&files, FileId(id), name.as_deref(), data.as_deref()).await
        }

        Commands::Delete { id } => {
            open_coordinator(config)?.delete(FileId(id)).await?;
            println!("Deleted #{}", id);
            Ok(())
        }

        Commands::Migrate => migrate(config).await,
    }
}

async fn upload_file(
    files: &FileCoordinator,
    path: &Path,
    name: Option<&str>,
    data: Option<&str>,
    content_type: String,
) -> TandemResult<()> {
    let upload = Upload::from_path(path, content_type).await.map_err(|e| {
        StorageError::new(StorageErrorKind::FileRead(format!(
            "{}: {}",
            path.display(),
            e
        )))
    })?;

    let record = files.upload(upload, name, data).await?;
    println!("Stored #{} as {}", record.id, record.filename);
    Ok(())
}

async fn rename_file(
    files: &FileCoordinator,
    id: FileId,
    name: Option<&str>,
    data: Option<&str>,
) -> TandemResult<()> {
    files.update(id, name, data).await?;
    if let Some(record) = files.get(id).await? {
        println!("Updated #{}: {}", record.id, record.filename);
    }
    Ok(())
}

async fn migrate(config: &TandemConfig) -> TandemResult<()> {
    let store = open_record_store(config)?;
    let applied = store.migrate().await?;

    if applied.is_empty() {
        println!("Database is up to date");
    }
    for version in applied {
        println!("Applied migration {}", version);
    }
    Ok(())
}

async fn list_files(files: &FileCoordinator, format: OutputFormat) -> TandemResult<()> {
    let records = files.get_all().await?;

    match format {
        OutputFormat::Json => println!("{}", to_json(&records)?),
        OutputFormat::Human => {
            println!("{:>6}  {:<40}  {}", "ID", "FILENAME", "CONTENT TYPE");
            println!("{:-<80}", "");
            for record in &records {
                println!(
                    "{:>6}  {:<40}  {}",
                    record.id, record.filename, record.content_type
                );
            }
            println!("Total: {} files", records.len());
        }
    }
    Ok(())
}

async fn show_file(files: &FileCoordinator, id: FileId, format: OutputFormat) -> TandemResult<()> {
    let record = files
        .get(id)
        .await?
        .ok_or_else(|| FileError::new(FileErrorKind::NotFound(id.0)))?;

    match format {
        OutputFormat::Json => println!("{}", to_json(&record)?),
        OutputFormat::Human => print_record(files, &record)?,
    }
    Ok(())
}

fn print_record(files: &FileCoordinator, record: &FileRecord) -> TandemResult<()> {
    println!("ID:           {}", record.id);
    println!("Filename:     {}", record.filename);
    println!("Content type: {}", record.content_type);
    println!("Path:         {}", files.blob_path(record)?.display());
    println!("Data:         {}", record.data);
    Ok(())
}

fn to_json<T: serde::Serialize>(value: &T) -> TandemResult<String> {
    Ok(serde_json::to_string_pretty(value).map_err(|e| JsonError::new(e.to_string()))?)
}
