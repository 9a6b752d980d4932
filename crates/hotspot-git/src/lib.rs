pub mod history;
pub mod repository;

pub use history::read_history;
pub use repository::GitRepository;

#[cfg(test)]
mod tests {
    use std::process::Command;

    use tempfile::tempdir;

    use super::*;

    fn run_git(dir: &std::path::Path, args: &[&str]) {
        let status = Command::new("git")
            .args(args)
            .current_dir(dir)
            .env("GIT_AUTHOR_NAME", "Test")
            .env("GIT_AUTHOR_EMAIL", "test@example.com")
            .env("GIT_COMMITTER_NAME", "Test")
            .env("GIT_COMMITTER_EMAIL", "test@example.com")
            .status()
            .expect("git command failed to run");
        assert!(status.success(), "git {args:?} failed");
    }

    #[test]
    fn reads_linear_history_newest_first() {
        let dir = tempdir().unwrap();
        run_git(dir.path(), &["init", "-q"]);
        std::fs::write(dir.path().join("a.txt"), "one\n").unwrap();
        run_git(dir.path(), &["add", "-A"]);
        run_git(dir.path(), &["commit", "-q", "-m", "first"]);

        std::fs::write(dir.path().join("a.txt"), "one\ntwo\n").unwrap();
        run_git(dir.path(), &["add", "-A"]);
        run_git(dir.path(), &["commit", "-q", "-m", "second"]);

        let repo = GitRepository::open(dir.path()).unwrap();
        let commits = read_history(&repo, None).unwrap();

        assert_eq!(commits.len(), 2);
        assert_eq!(commits[0].message.as_deref(), Some("second\n"));
        assert_eq!(commits[1].message.as_deref(), Some("first\n"));
        assert_eq!(commits[1].changes[0].file_path, "a.txt");
        assert_eq!(commits[1].changes[0].lines_added, 1);
    }

    #[test]
    fn stops_at_since_hash_exclusive() {
        let dir = tempdir().unwrap();
        run_git(dir.path(), &["init", "-q"]);
        std::fs::write(dir.path().join("a.txt"), "one\n").unwrap();
        run_git(dir.path(), &["add", "-A"]);
        run_git(dir.path(), &["commit", "-q", "-m", "first"]);
        let repo = GitRepository::open(dir.path()).unwrap();
        let first_hash = repo.head_hash().unwrap().unwrap();

        std::fs::write(dir.path().join("a.txt"), "one\ntwo\n").unwrap();
        run_git(dir.path(), &["add", "-A"]);
        run_git(dir.path(), &["commit", "-q", "-m", "second"]);

        let commits = read_history(&repo, Some(&first_hash)).unwrap();
        assert_eq!(commits.len(), 1);
        assert_eq!(commits[0].message.as_deref(), Some("second\n"));
    }
}
