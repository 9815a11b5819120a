use anyhow::{Context, Result};
use log::info;
use std::fs::File;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

use mind_core::config::MindSize;
use mind_core::error_bail;
use mind_core::schema::Split;

const MIND_RELEASE_URL: &str = "https://mind201910small.blob.core.windows.net/release";
const MIND_DEMO_URL: &str = "https://recodatasets.z20.web.core.windows.net/newsrec";

/// Archive name of one split, e.g. `MINDsmall_train.zip` or `MINDdemo_dev.zip`.
pub fn archive_name(size: MindSize, split: Split) -> String {
    let variant = match size {
        MindSize::Demo => "demo",
        MindSize::Small => "small",
        MindSize::Large => "large",
    };

    let part = match split {
        Split::Train => "train",
        Split::Valid => "dev",
    };

    format!("MIND{}_{}.zip", variant, part)
}

pub fn archive_url(size: MindSize, split: Split) -> String {
    let base = match size {
        MindSize::Demo => MIND_DEMO_URL,
        MindSize::Small | MindSize::Large => MIND_RELEASE_URL,
    };

    format!("{}/{}", base, archive_name(size, split))
}

/// Download the archive of `split` into `dest_path`, return the archive path.
///
/// An archive already present under `dest_path` is reused.
pub async fn download_mind(size: MindSize, split: Split, dest_path: &Path) -> Result<PathBuf> {
    let filename = dest_path.join(archive_name(size, split));

    if filename.exists() {
        info!("archive already exists, skip download: {}", filename.display());
        return Ok(filename);
    }

    tokio::fs::create_dir_all(dest_path).await?;

    let url = archive_url(size, split);
    info!("downloading {} to {}", url, filename.display());

    let mut response = reqwest::get(&url).await?;
    if !response.status().is_success() {
        error_bail!(
            "Failed to download MIND archive, url: {}, status: {}",
            url,
            response.status()
        );
    }

    // Write to a partial file first, a broken download must not look like a cached one.
    let partial = filename.with_extension("zip.part");
    let mut file = tokio::fs::File::create(&partial).await?;

    let mut total = 0;
    while let Some(chunk) = response.chunk().await? {
        total += chunk.len();
        file.write_all(&chunk).await?;
    }
    file.flush().await?;

    tokio::fs::rename(&partial, &filename).await?;

    info!("downloaded {} bytes to {}", total, filename.display());

    Ok(filename)
}

/// Extract every entry of the zip archive into `dst_dir`.
pub fn unzip_file(zip_path: &Path, dst_dir: &Path) -> Result<()> {
    let file = File::open(zip_path)
        .with_context(|| format!("failed to open archive: {}", zip_path.display()))?;

    let mut archive = zip::ZipArchive::new(file)?;

    std::fs::create_dir_all(dst_dir)?;
    archive.extract(dst_dir)?;

    info!(
        "extracted {} entries from {} to {}",
        archive.len(),
        zip_path.display(),
        dst_dir.display()
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_archive_url() {
        assert_eq!(
            archive_url(MindSize::Small, Split::Train),
            "https://mind201910small.blob.core.windows.net/release/MINDsmall_train.zip"
        );
        assert_eq!(
            archive_url(MindSize::Large, Split::Valid),
            "https://mind201910small.blob.core.windows.net/release/MINDlarge_dev.zip"
        );
        assert_eq!(
            archive_url(MindSize::Demo, Split::Valid),
            "https://recodatasets.z20.web.core.windows.net/newsrec/MINDdemo_dev.zip"
        );
    }
}
