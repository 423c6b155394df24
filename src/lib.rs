//! repomirror - Bulk mirroring of an organization's Git repositories
//!
//! repomirror lists every repository an organization owns on a hosted Git
//! service, saves the list next to its configuration file, and then clones
//! missing repositories or rebase-pulls existing checkouts one at a time.
//!
//! ## Core Features
//!
//! - **GitHub Integration**: Paginated organization listing with two-factor support
//! - **Name Filtering**: Case-insensitive substring selection of repositories
//! - **Configuration Management**: INI-based configuration with a bootstrap template
//! - **Offline Reuse**: Sync from a previously saved repository list
//!
//! ## Modules
//!
//! - [`config`]: Configuration management and parsing
//! - [`github`]: GitHub API listing and the [`RepositoryLister`] trait
//! - [`sync`]: Clone/update orchestration

pub mod config;
pub mod credentials;
pub mod error;
pub mod filter;
pub mod gerrit;
pub mod github;
pub mod report;
pub mod repository;
pub mod runner;
pub mod store;
pub mod sync;

pub use config::{Config, Provider};
pub use credentials::{CredentialSource, TerminalPrompt};
pub use error::{MirrorError, Result};
pub use filter::filter_repositories;
pub use gerrit::GerritLister;
pub use github::{GitHubLister, RepositoryLister};
pub use report::Reporter;
pub use repository::Repository;
pub use runner::{CommandOutcome, CommandRunner, ShellRunner};
pub use store::RepositoryStore;
pub use sync::{SyncEngine, SyncOptions, SyncSummary};
