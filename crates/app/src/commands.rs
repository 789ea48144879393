use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use billsnap_core::UserId;
use billsnap_ocr::{
    BillListParser, ImageUpload, RecognitionConfig, RecognitionError, RecognitionPipeline,
    RecognitionRequest, Recognizer,
};
use billsnap_storage::SqliteBookkeeping;
use chrono::{FixedOffset, Utc};
use serde::Serialize;
use tokio::io::AsyncReadExt;

use crate::Paths;

/// Printed on stdout when recognition fails, so callers always get JSON.
#[derive(Debug, Serialize)]
pub struct CommandError {
    pub code: &'static str,
    pub message: String,
}

impl From<&RecognitionError> for CommandError {
    fn from(e: &RecognitionError) -> Self {
        CommandError { code: e.code(), message: e.to_string() }
    }
}

pub async fn recognize(
    paths: &Paths,
    image_path: &Path,
    uid: i64,
    timezone: FixedOffset,
) -> Result<ExitCode> {
    let config = RecognitionConfig::load(&paths.config)
        .with_context(|| format!("load config {}", paths.config.display()))?;
    let recognizer = Recognizer::from_config(&config.provider, config.timeout())
        .context("set up OCR provider")?;
    let db = open_db(&paths.db).await?;
    let pipeline = RecognitionPipeline::new(config, recognizer, SqliteBookkeeping::new(db));

    let data = tokio::fs::read(image_path)
        .await
        .with_context(|| format!("read {}", image_path.display()))?;
    let file_name = image_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let request =
        RecognitionRequest::new(UserId(uid), timezone, Some(ImageUpload::new(file_name, data)));

    // Dropping the pipeline future on Ctrl-C also kills a running OCR child.
    let result = tokio::select! {
        result = pipeline.recognize(&request) => result,
        _ = tokio::signal::ctrl_c() => {
            tracing::warn!("Interrupted, recognition abandoned");
            return Ok(ExitCode::from(130));
        }
    };

    match result {
        Ok(response) => {
            println!("{}", serde_json::to_string_pretty(&response)?);
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            println!("{}", serde_json::to_string_pretty(&CommandError::from(&e))?);
            Ok(ExitCode::FAILURE)
        }
    }
}

pub async fn parse(input: &str, timezone: FixedOffset) -> Result<()> {
    let text = if input == "-" {
        let mut buf = String::new();
        tokio::io::stdin()
            .read_to_string(&mut buf)
            .await
            .context("read stdin")?;
        buf
    } else {
        tokio::fs::read_to_string(input)
            .await
            .with_context(|| format!("read {input}"))?
    };

    let items = BillListParser::parse(&text, &Utc::now().with_timezone(&timezone));
    tracing::info!("Parsed {} transaction lines", items.len());
    println!("{}", serde_json::to_string_pretty(&items)?);
    Ok(())
}

pub async fn init_db(paths: &Paths, demo: bool) -> Result<()> {
    let db = open_db(&paths.db).await?;
    tracing::info!("Database ready at {}", paths.db.display());
    if demo {
        let uid = billsnap_storage::seed_demo(&db)
            .await
            .context("seed demo data")?;
        println!("{}", uid.0);
    }
    db.close().await;
    Ok(())
}

async fn open_db(path: &Path) -> Result<billsnap_storage::DbPool> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("create {}", parent.display()))?;
    }
    billsnap_storage::create_db(path)
        .await
        .with_context(|| format!("open database {}", path.display()))
}
