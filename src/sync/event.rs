use crate::github::GithubRepoName;

#[derive(Debug, PartialEq)]
pub enum SyncEvent {
    /// The labels of a single repository may be out of sync.
    RepositoryChanged(RepositoryChanged),
    /// The default branch of the metadata repository was updated, so the base labels
    /// and the labels of all tracked repositories may be out of date.
    MetadataChanged,
}

#[derive(Debug, PartialEq)]
pub struct RepositoryChanged {
    pub repository: GithubRepoName,
    pub trigger: SyncTrigger,
}

/// The webhook action that caused a repository to be synchronized.
#[derive(Debug, PartialEq, Clone, Copy)]
pub enum SyncTrigger {
    RepositoryCreated,
    RepositoryTransferred,
    LabelEdited,
    LabelDeleted,
}
