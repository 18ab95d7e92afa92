use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use log::{debug, info};
use reqwest::Client;

use super::installer::Installer;
use super::model::{Action, Model, UserActions};

/// Fetches the update manifest and the files chosen by the user.
#[derive(Debug, Clone)]
pub struct Loader {
    client: Client,
    update_url: String,
    download_dir: PathBuf,
}

impl Loader {
    pub fn new(update_url: &str, download_dir: PathBuf) -> Self {
        Self {
            client: Client::new(),
            update_url: update_url.to_string(),
            download_dir,
        }
    }

    pub async fn load_model(&self, expansions: BTreeMap<String, String>) -> Result<Model> {
        info!("Checking for updates at {}", self.update_url);
        let data = self.download(&self.update_url).await?;

        let mut model = Model::with_expansions(expansions);
        model.parse(&data)?;
        model.update_states();

        Ok(model)
    }

    /// Downloads every file to install, then hands everything to the installer.
    pub async fn apply_user_actions(&self, mut actions: UserActions) -> Result<()> {
        tokio::fs::create_dir_all(&self.download_dir)
            .await
            .with_context(|| format!("Failed to create {}", self.download_dir.display()))?;

        if let Some(files) = actions.get_vec_mut(&Action::Install) {
            for (i, file) in files.iter_mut().enumerate() {
                let data = self.download(&file.url).await?;
                let name = file.url.rsplit('/').next().unwrap_or_default();
                let path = self.download_dir.join(format!("{i}_{name}"));

                tokio::fs::write(&path, data)
                    .await
                    .with_context(|| format!("Failed to save {}", path.display()))?;
                debug!("Downloaded {} to {}", file.url, path.display());
                file.download_path = Some(path);
            }
        }

        tokio::task::spawn_blocking(move || Installer::new(actions).commit()).await??;
        info!("Updates applied");
        Ok(())
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| anyhow!("{url}: {e}"))?;

        let status = response.status();
        if !status.is_success() {
            return Err(anyhow!("{url}: {status}"));
        }

        Ok(response.bytes().await?.to_vec())
    }
}
