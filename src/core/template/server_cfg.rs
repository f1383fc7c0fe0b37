use std::path::Path;

use reqwest::Client;
use tracing::info;

use crate::core::error::{ServerError, ServerResult};

/// Literal, in-order placeholder replacement.
pub fn substitute(template: &str, replacements: &[(String, String)]) -> String {
    replacements
        .iter()
        .fold(template.to_string(), |text, (placeholder, value)| {
            text.replace(placeholder.as_str(), value)
        })
}

/// Fetches a game's config template from the config repository and fills it in.
pub struct ConfigTemplater {
    client: Client,
    repo_base: String,
}

impl ConfigTemplater {
    pub fn new(client: Client, repo_base: impl Into<String>) -> Self {
        Self {
            client,
            repo_base: repo_base.into(),
        }
    }

    /// `<repo>/<game name without ':'>/<file name of target>`.
    pub fn template_url(&self, game_name: &str, target: &Path) -> ServerResult<String> {
        let file_name = target
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .ok_or_else(|| ServerError::Other(format!("No file name in {target:?}")))?;
        Ok(format!(
            "{}/{}/{}",
            self.repo_base.trim_end_matches('/'),
            game_name.replace(':', ""),
            file_name
        ))
    }

    /// Download the template for `target`, substitute and write it.
    ///
    /// An existing file at `target` is only replaced once the new content is
    /// ready.
    pub async fn apply(
        &self,
        target: &Path,
        game_name: &str,
        replacements: &[(String, String)],
    ) -> ServerResult<()> {
        let url = self.template_url(game_name, target)?;
        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ServerError::HttpStatus {
                url,
                status: status.as_u16(),
            });
        }
        let template = response.text().await?;

        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| ServerError::io(parent, e))?;
        }
        tokio::fs::write(target, substitute(&template, replacements))
            .await
            .map_err(|e| ServerError::io(target, e))?;

        info!("Wrote {:?} from {}", target, url);
        Ok(())
    }
}
