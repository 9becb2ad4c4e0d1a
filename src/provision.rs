//! # Artifact provisioning.
//!
//! Before a server can launch, its working directory must contain the
//! versioned server artifact and the acceptance file. [`Provisioner`] runs
//! that as an explicit sequential pipeline with early exit on failure:
//!
//! 1. version `custom` (case-insensitive): skip download and copy, go
//!    straight to the acceptance file;
//! 2. create the cache root and working directory on demand;
//! 3. download the artifact into the shared cache keyed by version, unless
//!    already cached;
//! 4. copy the cached artifact into the working directory under the
//!    configured jar filename, removing any prior file there first;
//! 5. write `eula.txt` with `eula=true` iff absent.
//!
//! The cache is shared across instances: two working directories of the same
//! version download once. Repeated runs with everything in place perform no
//! destructive action and still succeed.

use std::path::{Path, PathBuf};

use futures::TryStreamExt;
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;
use tracing::info;

use crate::config::CUSTOM_VERSION;
use crate::error::ProvisionError;

/// Shared cache directory for downloaded artifacts, keyed by version.
pub const VERSIONS_DIR: &str = "versions";

/// Acceptance file name inside the working directory.
pub const EULA_FILE: &str = "eula.txt";

/// Acceptance file content, written only when the file is absent.
pub const EULA_CONTENT: &str = "eula=true";

fn artifact_url(version: &str) -> String {
    format!(
        "https://s3.amazonaws.com/Minecraft.Download/versions/{version}/minecraft_server.{version}.jar"
    )
}

/// Ensures the versioned artifact and acceptance file exist before launch.
#[derive(Clone, Debug)]
pub struct Provisioner {
    cache_dir: PathBuf,
    http: reqwest::Client,
}

impl Default for Provisioner {
    fn default() -> Self {
        Self::new(VERSIONS_DIR)
    }
}

impl Provisioner {
    /// Creates a provisioner with the given cache root.
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            http: reqwest::Client::new(),
        }
    }

    /// Runs the provisioning pipeline for `version` into `work_dir`.
    ///
    /// `jar` is the target artifact filename inside the working directory.
    /// A network or filesystem failure is fatal to this attempt; the caller
    /// must not launch afterwards.
    pub async fn ensure_artifact(
        &self,
        version: &str,
        work_dir: &Path,
        jar: &str,
    ) -> Result<(), ProvisionError> {
        fs::create_dir_all(work_dir).await?;

        if version.eq_ignore_ascii_case(CUSTOM_VERSION) {
            info!(version, "using custom artifact, skipping download");
            return ensure_eula(work_dir).await;
        }

        fs::create_dir_all(&self.cache_dir).await?;

        let cached = self.cache_dir.join(format!("{version}.jar"));
        if !fs::try_exists(&cached).await? {
            self.download(version, &cached).await?;
        }

        let dest = work_dir.join(jar);
        if fs::try_exists(&dest).await? {
            fs::remove_file(&dest).await?;
        }
        info!(version, dest = %dest.display(), "placing server artifact");
        fs::copy(&cached, &dest).await?;

        ensure_eula(work_dir).await
    }

    /// Streams the artifact into the cache, writing to a temp file first so
    /// a torn download never looks like a cached artifact.
    async fn download(&self, version: &str, cached: &Path) -> Result<(), ProvisionError> {
        let url = artifact_url(version);
        info!(version, url, "downloading server artifact");

        let response = self.http.get(url).send().await?.error_for_status()?;

        let tmp = cached.with_extension("jar.download");
        let mut file = File::create(&tmp).await?;
        let mut chunks = response.bytes_stream();
        while let Some(chunk) = chunks.try_next().await? {
            file.write_all(&chunk).await?;
        }
        file.flush().await?;

        fs::rename(&tmp, cached).await?;
        Ok(())
    }
}

async fn ensure_eula(work_dir: &Path) -> Result<(), ProvisionError> {
    let eula = work_dir.join(EULA_FILE);
    if !fs::try_exists(&eula).await? {
        info!(path = %eula.display(), "writing acceptance file");
        fs::write(&eula, EULA_CONTENT).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn seed_cache(provisioner: &Provisioner, version: &str, bytes: &[u8]) {
        fs::create_dir_all(&provisioner.cache_dir)
            .await
            .expect("create cache dir");
        fs::write(provisioner.cache_dir.join(format!("{version}.jar")), bytes)
            .await
            .expect("seed cached artifact");
    }

    #[tokio::test]
    async fn cached_artifact_is_copied_and_eula_written() {
        let root = tempfile::tempdir().expect("tempdir");
        let provisioner = Provisioner::new(root.path().join("versions"));
        seed_cache(&provisioner, "1.10.2", b"jarbytes").await;

        let work = root.path().join("srv");
        provisioner
            .ensure_artifact("1.10.2", &work, "minecraft_server.jar")
            .await
            .expect("provisioning succeeds");

        let copied = fs::read(work.join("minecraft_server.jar"))
            .await
            .expect("artifact copied");
        assert_eq!(copied, b"jarbytes");
        let eula = fs::read_to_string(work.join("eula.txt"))
            .await
            .expect("eula written");
        assert_eq!(eula, "eula=true");
    }

    #[tokio::test]
    async fn copy_replaces_a_prior_artifact() {
        let root = tempfile::tempdir().expect("tempdir");
        let provisioner = Provisioner::new(root.path().join("versions"));
        seed_cache(&provisioner, "1.10.2", b"fresh").await;

        let work = root.path().join("srv");
        fs::create_dir_all(&work).await.expect("create work dir");
        fs::write(work.join("minecraft_server.jar"), b"stale")
            .await
            .expect("seed stale artifact");

        provisioner
            .ensure_artifact("1.10.2", &work, "minecraft_server.jar")
            .await
            .expect("provisioning succeeds");

        let copied = fs::read(work.join("minecraft_server.jar"))
            .await
            .expect("artifact copied");
        assert_eq!(copied, b"fresh");
    }

    #[tokio::test]
    async fn repeated_runs_are_idempotent() {
        let root = tempfile::tempdir().expect("tempdir");
        let provisioner = Provisioner::new(root.path().join("versions"));
        seed_cache(&provisioner, "1.10.2", b"jarbytes").await;

        let work = root.path().join("srv");
        provisioner
            .ensure_artifact("1.10.2", &work, "minecraft_server.jar")
            .await
            .expect("first run");
        provisioner
            .ensure_artifact("1.10.2", &work, "minecraft_server.jar")
            .await
            .expect("second run");

        let eula = fs::read_to_string(work.join("eula.txt"))
            .await
            .expect("eula still present");
        assert_eq!(eula, "eula=true");
    }

    #[tokio::test]
    async fn cache_is_shared_across_work_dirs() {
        let root = tempfile::tempdir().expect("tempdir");
        let provisioner = Provisioner::new(root.path().join("versions"));
        seed_cache(&provisioner, "1.9", b"shared").await;

        for name in ["one", "two"] {
            let work = root.path().join(name);
            provisioner
                .ensure_artifact("1.9", &work, "minecraft_server.jar")
                .await
                .expect("provisioning succeeds");
            let copied = fs::read(work.join("minecraft_server.jar"))
                .await
                .expect("artifact copied");
            assert_eq!(copied, b"shared");
        }
    }

    #[tokio::test]
    async fn custom_version_never_touches_artifacts() {
        let root = tempfile::tempdir().expect("tempdir");
        // No cache directory exists; a download attempt would fail loudly.
        let provisioner = Provisioner::new(root.path().join("versions"));

        let work = root.path().join("srv");
        fs::create_dir_all(&work).await.expect("create work dir");
        fs::write(work.join("minecraft_server.jar"), b"operator-provided")
            .await
            .expect("seed custom artifact");

        provisioner
            .ensure_artifact("CuStOm", &work, "minecraft_server.jar")
            .await
            .expect("custom provisioning succeeds");

        let kept = fs::read(work.join("minecraft_server.jar"))
            .await
            .expect("artifact untouched");
        assert_eq!(kept, b"operator-provided");
        assert!(!fs::try_exists(root.path().join("versions"))
            .await
            .expect("cache check"));
        let eula = fs::read_to_string(work.join("eula.txt"))
            .await
            .expect("eula written");
        assert_eq!(eula, "eula=true");
    }

    #[tokio::test]
    async fn eula_is_not_overwritten() {
        let root = tempfile::tempdir().expect("tempdir");
        let provisioner = Provisioner::new(root.path().join("versions"));

        let work = root.path().join("srv");
        fs::create_dir_all(&work).await.expect("create work dir");
        fs::write(work.join("eula.txt"), "eula=false")
            .await
            .expect("seed eula");

        provisioner
            .ensure_artifact("custom", &work, "minecraft_server.jar")
            .await
            .expect("custom provisioning succeeds");

        let eula = fs::read_to_string(work.join("eula.txt"))
            .await
            .expect("eula read");
        assert_eq!(eula, "eula=false");
    }
}
