use crate::repository::Repository;

/// Keep repositories whose name contains `pattern`, ignoring case
///
/// An absent or empty pattern keeps everything. Each excluded repository is
/// passed to `on_excluded` in input order.
pub fn filter_repositories(
    repositories: Vec<Repository>,
    pattern: Option<&str>,
    mut on_excluded: impl FnMut(&Repository),
) -> Vec<Repository> {
    let pattern = match pattern {
        Some(p) if !p.is_empty() => p.to_lowercase(),
        _ => return repositories,
    };

    repositories
        .into_iter()
        .filter(|repo| {
            let keep = repo.name.to_lowercase().contains(&pattern);
            if !keep {
                on_excluded(repo);
            }
            keep
        })
        .collect()
}
