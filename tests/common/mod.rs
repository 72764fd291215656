//! Shared test utilities for integration tests.
//!
//! Not all functions are used by every test file, but they're shared across tests.
#![allow(dead_code)]

use std::path::{Path, PathBuf};

use git2::{Oid, Repository, Signature, WorktreeAddOptions};

use auto_commit::{MessageWithParts, Part};

/// A test git repository builder for integration tests.
pub struct TestRepo {
    pub dir: tempfile::TempDir,
    pub repo: Repository,
}

impl TestRepo {
    /// Create a repository with a committer identity and one initial commit.
    ///
    /// `git commit` needs an identity, so it is written to the repository's
    /// own config rather than relying on the machine's global one.
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp directory");
        let repo = Repository::init(dir.path()).expect("Failed to init git repo");

        {
            let mut config = repo.config().expect("Failed to open repo config");
            config.set_str("user.name", "Test User").expect("Failed to set user.name");
            config
                .set_str("user.email", "test@example.com")
                .expect("Failed to set user.email");
            config.set_bool("commit.gpgsign", false).expect("Failed to set commit.gpgsign");
        }

        let test_repo = Self { dir, repo };
        test_repo.write_file("README.md", "# test\n");
        test_repo.commit_all("Initial commit");
        test_repo
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    fn signature(&self) -> Signature<'_> {
        Signature::now("Test User", "test@example.com").expect("Failed to create signature")
    }

    /// Write `contents` to `relative` inside the working tree.
    pub fn write_file(&self, relative: &str, contents: &str) {
        write_file(self.path(), relative, contents);
    }

    /// Stage everything and commit it with git2. Returns the commit OID.
    pub fn commit_all(&self, message: &str) -> Oid {
        let sig = self.signature();

        let mut index = self.repo.index().expect("Failed to get index");
        index
            .add_all(["*"].iter(), git2::IndexAddOption::DEFAULT, None)
            .expect("Failed to add files");
        index.write().expect("Failed to write index");
        let tree_id = index.write_tree().expect("Failed to write tree");
        let tree = self.repo.find_tree(tree_id).expect("Failed to find tree");

        let parent = self.repo.head().ok().and_then(|h| h.peel_to_commit().ok());
        let parents: Vec<&git2::Commit> = parent.iter().collect();

        self.repo
            .commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
            .expect("Failed to create commit")
    }

    /// Add a linked worktree on a new branch named `name`.
    ///
    /// The returned directory owns the parent of the worktree so it is removed
    /// together with it.
    pub fn add_worktree(&self, name: &str) -> LinkedWorktree {
        let parent = tempfile::tempdir().expect("Failed to create temp directory");
        let path = parent.path().join(name);
        self.repo
            .worktree(name, &path, Some(&WorktreeAddOptions::new()))
            .expect("Failed to add worktree");
        LinkedWorktree {
            _parent: parent,
            path,
        }
    }

    /// Number of commits reachable from HEAD.
    pub fn commit_count(&self) -> usize {
        commit_count(&self.repo)
    }

    /// Full message of the HEAD commit.
    pub fn head_message(&self) -> String {
        head_message(&self.repo)
    }
}

/// A linked worktree created by [`TestRepo::add_worktree`].
pub struct LinkedWorktree {
    _parent: tempfile::TempDir,
    pub path: PathBuf,
}

impl LinkedWorktree {
    pub fn repo(&self) -> Repository {
        Repository::open(&self.path).expect("Failed to open worktree")
    }

    pub fn write_file(&self, relative: &str, contents: &str) {
        write_file(&self.path, relative, contents);
    }
}

pub fn write_file(root: &Path, relative: &str, contents: &str) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("Failed to create parent directory");
    }
    std::fs::write(&path, contents).expect("Failed to write test file");
}

pub fn commit_count(repo: &Repository) -> usize {
    let mut walk = repo.revwalk().expect("Failed to create revwalk");
    walk.push_head().expect("Failed to push HEAD");
    walk.count()
}

pub fn head_message(repo: &Repository) -> String {
    repo.head()
        .and_then(|h| h.peel_to_commit())
        .expect("Failed to read HEAD commit")
        .message()
        .expect("Commit message is not UTF-8")
        .to_string()
}

/// A session history ending in one completed turn.
pub fn completed_turn(user_id: &str, prompt: &str, response: &str) -> Vec<MessageWithParts> {
    vec![
        MessageWithParts::user(user_id, vec![Part::text(prompt)]),
        MessageWithParts::assistant(format!("{user_id}_reply"), user_id, vec![Part::text(response)]),
    ]
}
