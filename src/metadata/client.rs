use axum::async_trait;
use secrecy::{ExposeSecret, SecretString};
use url::Url;

use crate::config::BotConfig;
use crate::github::{GithubAppClient, GithubRepoName, Label};
use crate::metadata::{
    parse_document, parse_tracked_repositories, ApiCatalogDocument, ApiDescriptor,
    BaseLabelsDocument, MetadataSource, RepoRegistryDocument, RepoRegistryEntry, RetrievalError,
    TrackedRepositoriesDocument,
};

/// Loads metadata from the metadata repository on GitHub, from object storage
/// and from the public tracked repository registry.
pub struct MetadataClient {
    github: GithubAppClient,
    http: reqwest::Client,
    config: BotConfig,
    storage_token: Option<SecretString>,
}

impl MetadataClient {
    pub fn new(
        github: GithubAppClient,
        config: BotConfig,
        storage_token: Option<SecretString>,
    ) -> Self {
        Self {
            github,
            http: reqwest::Client::new(),
            config,
            storage_token,
        }
    }

    fn object_url(&self, object: &str) -> Url {
        let mut url = self.config.storage_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .push(&self.config.bucket)
                .push(object);
        }
        url
    }

    async fn download_object(
        &self,
        document: &'static str,
        object: &str,
    ) -> Result<Vec<u8>, RetrievalError> {
        let url = self.object_url(object);
        tracing::debug!("Downloading {document} from {url}");

        let mut request = self.http.get(url.clone());
        if let Some(token) = &self.storage_token {
            request = request.bearer_auth(token.expose_secret());
        }
        self.send(document, url, request).await
    }

    async fn send(
        &self,
        document: &'static str,
        url: Url,
        request: reqwest::RequestBuilder,
    ) -> Result<Vec<u8>, RetrievalError> {
        let to_error = |source| RetrievalError::Http {
            document,
            url: url.to_string(),
            source,
        };
        let bytes = request
            .send()
            .await
            .map_err(to_error)?
            .error_for_status()
            .map_err(to_error)?
            .bytes()
            .await
            .map_err(to_error)?;
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl MetadataSource for MetadataClient {
    async fn load_base_labels(&self) -> Result<Vec<Label>, RetrievalError> {
        const DOCUMENT: &str = "base labels";

        let repo = &self.config.metadata_repo;
        let path = &self.config.base_labels_path;
        tracing::info!("Loading base labels from {repo}/{path}");
        let content = self
            .github
            .load_file(repo, path)
            .await
            .map_err(|source| RetrievalError::GitHub {
                document: DOCUMENT,
                source,
            })?
            .ok_or_else(|| RetrievalError::MissingContent {
                document: DOCUMENT,
                path: format!("{repo}/{path}"),
            })?;
        let document: BaseLabelsDocument = parse_document(DOCUMENT, content.as_bytes())?;
        Ok(document.labels)
    }

    async fn load_repo_registry(&self) -> Result<Vec<RepoRegistryEntry>, RetrievalError> {
        const DOCUMENT: &str = "public repos";

        let content = self
            .download_object(DOCUMENT, &self.config.public_repos_object)
            .await?;
        let document: RepoRegistryDocument = parse_document(DOCUMENT, &content)?;
        Ok(document.repos)
    }

    async fn load_api_catalog(&self) -> Result<Vec<ApiDescriptor>, RetrievalError> {
        const DOCUMENT: &str = "API catalog";

        let content = self
            .download_object(DOCUMENT, &self.config.apis_object)
            .await?;
        let document: ApiCatalogDocument = parse_document(DOCUMENT, &content)?;
        Ok(document.apis)
    }

    async fn load_tracked_repositories(&self) -> Result<Vec<GithubRepoName>, RetrievalError> {
        const DOCUMENT: &str = "tracked repositories";

        let url = self.config.repos_url.clone();
        tracing::debug!("Downloading {DOCUMENT} from {url}");
        let content = self
            .send(DOCUMENT, url.clone(), self.http.get(url))
            .await?;
        let document: TrackedRepositoriesDocument = parse_document(DOCUMENT, &content)?;
        Ok(parse_tracked_repositories(document))
    }
}
