//! Gerrit project listing
//!
//! Only the SSH invocation exists; its output is not parsed into
//! repositories yet, so a Gerrit run always ends with an empty list.

use async_trait::async_trait;
use std::path::Path;
use tracing::warn;

use crate::config::GerritConfig;
use crate::error::Result;
use crate::github::RepositoryLister;
use crate::repository::Repository;
use crate::runner::CommandRunner;

pub struct GerritLister<R> {
    config: GerritConfig,
    runner: R,
}

impl<R: CommandRunner> GerritLister<R> {
    pub fn new(config: GerritConfig, runner: R) -> Self {
        Self { config, runner }
    }

    /// SSH command that asks the Gerrit server for its project list
    pub fn command(&self) -> String {
        format!(
            "ssh -p {} {}@{} -o UserKnownHostsFile=/dev/null -o StrictHostKeyChecking=no -i {} gerrit ls-projects",
            self.config.port, self.config.user, self.config.server, self.config.identity_file
        )
    }
}

#[async_trait]
impl<R: CommandRunner> RepositoryLister for GerritLister<R> {
    async fn list(&self) -> Result<Vec<Repository>> {
        // TODO: parse `gerrit ls-projects` output (or use the REST API) into repositories
        self.runner.run(&self.command(), Path::new("."), true).await?;
        warn!("Gerrit project output is not parsed; no repositories listed");
        Ok(Vec::new())
    }

    fn provider_name(&self) -> &'static str {
        "Gerrit"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MirrorError;
    use crate::runner::{CommandOutcome, MockCommandRunner};
    use assert_matches::assert_matches;

    #[test]
    fn test_default_command() {
        let lister = GerritLister::new(GerritConfig::default(), MockCommandRunner::new());
        assert_eq!(
            lister.command(),
            "ssh -p 29418 bob_builder@gerrit-server -o UserKnownHostsFile=/dev/null \
             -o StrictHostKeyChecking=no -i ~/.ssh/bob_builder gerrit ls-projects"
        );
    }

    #[tokio::test]
    async fn test_list_runs_command_and_returns_nothing() {
        let config = GerritConfig {
            server: "review.example.com".to_string(),
            port: 2222,
            ..GerritConfig::default()
        };

        let mut runner = MockCommandRunner::new();
        runner
            .expect_run()
            .withf(|command, _, stop_on_error| {
                command.starts_with("ssh -p 2222 bob_builder@review.example.com")
                    && command.ends_with("gerrit ls-projects")
                    && *stop_on_error
            })
            .times(1)
            .returning(|_, _, _| Ok(CommandOutcome::Success));

        let lister = GerritLister::new(config, runner);
        assert!(lister.list().await.unwrap().is_empty());
        assert_eq!(lister.provider_name(), "Gerrit");
    }

    #[tokio::test]
    async fn test_list_propagates_command_failure() {
        let mut runner = MockCommandRunner::new();
        runner.expect_run().returning(|command, _, _| {
            Err(MirrorError::CommandExecution {
                command: command.to_string(),
                code: 255,
            })
        });

        let lister = GerritLister::new(GerritConfig::default(), runner);
        assert_matches!(
            lister.list().await,
            Err(MirrorError::CommandExecution { code: 255, .. })
        );
    }
}
