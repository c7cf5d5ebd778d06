use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use anyhow::{Context, Result, anyhow};
use log::debug;

use super::command::run_source_command;
use super::model::RawNode;
use super::parse::parse_tree;

/// Something that can hand out a fresh copy of the whole tree.
///
/// Fetches run off the UI thread, so implementations must be shareable.
pub trait TreeSource: Send + Sync {
    fn fetch_tree(&self) -> Result<RawNode>;

    fn describe(&self) -> String;
}

pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl TreeSource for FileSource {
    fn fetch_tree(&self) -> Result<RawNode> {
        let raw = fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read tree file {}", self.path.display()))?;
        let tree = parse_tree(&raw)
            .with_context(|| format!("failed to parse tree file {}", self.path.display()))?;
        debug!(
            "loaded {} nodes from {}",
            tree.node_count(),
            self.path.display()
        );
        Ok(tree)
    }

    fn describe(&self) -> String {
        format!("file {}", self.path.display())
    }
}

pub struct CommandSource {
    program: String,
    args: Vec<String>,
}

impl CommandSource {
    pub fn new(command: &[String]) -> Result<Self> {
        let (program, args) = command
            .split_first()
            .ok_or_else(|| anyhow!("tree command must not be empty"))?;
        Ok(Self {
            program: program.clone(),
            args: args.to_vec(),
        })
    }
}

impl TreeSource for CommandSource {
    fn fetch_tree(&self) -> Result<RawNode> {
        let raw = run_source_command(&self.program, &self.args)?;
        parse_tree(&raw).with_context(|| format!("failed to parse output of {}", self.program))
    }

    fn describe(&self) -> String {
        if self.args.is_empty() {
            format!("command {}", self.program)
        } else {
            format!("command {} {}", self.program, self.args.join(" "))
        }
    }
}

/// In-memory source whose tree can be swapped between fetches.
#[derive(Clone)]
pub struct StaticSource {
    tree: Arc<Mutex<Result<RawNode, String>>>,
}

impl StaticSource {
    pub fn new(tree: RawNode) -> Self {
        Self {
            tree: Arc::new(Mutex::new(Ok(tree))),
        }
    }

    pub fn replace(&self, tree: RawNode) {
        *self.tree.lock().unwrap_or_else(PoisonError::into_inner) = Ok(tree);
    }

    /// Makes every following fetch fail with `message` until a tree is set again.
    pub fn fail_with(&self, message: impl Into<String>) {
        *self.tree.lock().unwrap_or_else(PoisonError::into_inner) = Err(message.into());
    }
}

impl TreeSource for StaticSource {
    fn fetch_tree(&self) -> Result<RawNode> {
        self.tree
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .map_err(|message| anyhow!(message))
    }

    fn describe(&self) -> String {
        "in-memory tree".to_owned()
    }
}
