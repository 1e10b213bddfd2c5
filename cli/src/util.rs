/// Characters of the task id kept in a repository name.
const REPO_NAME_TASK_CHARS: usize = 50;

/// Derive the repository name for round `round` of `task_id`.
///
/// The first 50 characters of the id are suffixed with `-r{round}`, then
/// everything except ASCII letters, digits, `-` and `_` is dropped.
pub fn derive_repo_name(task_id: &str, round: u32) -> String {
    let prefix: String = task_id
        .chars()
        .take(REPO_NAME_TASK_CHARS)
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_'))
        .collect();
    let prefix = if prefix.is_empty() { "task" } else { &prefix };
    format!("{prefix}-r{round}")
}
