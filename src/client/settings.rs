//! Persistence for [`ConnectionOptions`]: the flat settings store the UI
//! layer owns. Empty strings coming back from disk mean "unset".

use crate::client::types::ConnectionOptions;
use crate::errors;
use anyhow::Context;
use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::mpsc;

pub async fn load_options(path: &Path) -> anyhow::Result<ConnectionOptions> {
    match fs::read_to_string(path).await {
        Ok(contents) => match serde_yaml::from_str::<ConnectionOptions>(&contents) {
            Ok(mut options) => {
                options.normalize();
                options.validate().with_context(|| {
                    errors::settings::validation_failed(&path.display().to_string())
                })?;
                Ok(options)
            }
            Err(parse_error) => {
                tracing::error!(
                    "{}",
                    errors::settings::corrupted_yaml(
                        &path.display().to_string(),
                        &parse_error.to_string()
                    )
                );

                let backup_path = path.with_extension("yaml.bak");
                if let Err(e) = fs::copy(path, &backup_path).await {
                    tracing::warn!("Failed to create backup of corrupted settings: {}", e);
                } else {
                    tracing::info!(
                        "{}",
                        errors::settings::backup_created(&backup_path.display().to_string())
                    );
                }

                let defaults = ConnectionOptions::default();
                save_options(path, &defaults).await.with_context(|| {
                    format!(
                        "Failed to create new settings after corruption at {}",
                        path.display()
                    )
                })?;

                Err(anyhow::anyhow!(
                    "Settings file was corrupted and has been replaced with defaults. \
                     Backup saved to {}. Error: {}",
                    backup_path.display(),
                    parse_error
                ))
            }
        },
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            let defaults = ConnectionOptions::default();
            save_options(path, &defaults).await.with_context(|| {
                errors::settings::failed_to_create_default(&path.display().to_string())
            })?;
            Ok(defaults)
        }
        Err(e) => {
            Err(e).with_context(|| errors::settings::failed_to_read(&path.display().to_string()))
        }
    }
}

// Atomic write with temp file
pub async fn save_options(path: &Path, options: &ConnectionOptions) -> anyhow::Result<()> {
    let yaml_content =
        serde_yaml::to_string(options).context(errors::settings::failed_to_serialize())?;

    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent)
        .await
        .with_context(|| errors::settings::failed_to_create_dir(&parent.display().to_string()))?;

    let tmp_path = path.with_extension("tmp");

    fs::write(&tmp_path, yaml_content.as_bytes())
        .await
        .with_context(|| {
            errors::settings::failed_to_write_temp(&tmp_path.display().to_string())
        })?;

    #[cfg(unix)]
    {
        let file = fs::OpenOptions::new()
            .write(true)
            .open(&tmp_path)
            .await
            .context(errors::settings::FAILED_TO_OPEN_TEMP)?;
        file.sync_all()
            .await
            .context(errors::settings::FAILED_TO_FSYNC)?;
    }

    fs::rename(&tmp_path, path).await.with_context(|| {
        errors::settings::failed_to_rename(
            &tmp_path.display().to_string(),
            &path.display().to_string(),
        )
    })?;

    Ok(())
}

pub fn watch_settings_file(
    settings_path: PathBuf,
) -> anyhow::Result<mpsc::Receiver<notify::Result<Event>>> {
    let (tx, rx) = mpsc::channel(10);

    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| {
            let _ = tx.blocking_send(res);
        },
        notify::Config::default(),
    )
    .context(errors::settings::FAILED_TO_CREATE_WATCHER)?;

    watcher
        .watch(&settings_path, RecursiveMode::NonRecursive)
        .with_context(|| {
            errors::settings::failed_to_watch(&settings_path.display().to_string())
        })?;

    std::mem::forget(watcher);

    Ok(rx)
}
