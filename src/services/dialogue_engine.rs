use rand::seq::SliceRandom;

use crate::error::{Error, Result};
use crate::models::dialogue::{
    DialoguePathStep, DialogueTree, END_NODE_KEY, ROOT_NODE_KEY,
};

/// Every step can award at most this many points; the traversal maximum is
/// `POINTS_PER_STEP * path length`.
pub const POINTS_PER_STEP: i32 = 5;

/// An option scoring at or above this is shown as a correct choice.
pub const CORRECT_SCORE_THRESHOLD: i32 = 5;

/// Guard against cyclic authored content: a traversal longer than this fails
/// instead of walking the tree forever.
const MAX_PATH_STEPS: usize = 64;

/// Walks a branching dialogue tree one choice at a time, accumulating a path
/// and a running score. Holds no rendering state and performs no I/O, so it
/// can be driven by a screen, a test, or a resumed session alike.
#[derive(Debug, Clone)]
pub struct DialogueEngine {
    tree: DialogueTree,
    current_key: String,
    path: Vec<DialoguePathStep>,
    total_score: i32,
    finished: bool,
}

/// What a caller needs to render one node: the prompt and the options in a
/// freshly shuffled presentation order. The shuffle is presentation-only;
/// choices are made by stable option key, never by position.
#[derive(Debug, Clone)]
pub struct NodeView {
    pub prompt: String,
    pub options: Vec<(String, String)>,
}

#[derive(Debug, Clone)]
pub struct ChoiceFeedback {
    pub justification: String,
    pub next_node_key: String,
    pub is_correct: bool,
}

#[derive(Debug, Clone)]
pub struct DialogueOutcome {
    pub path: Vec<DialoguePathStep>,
    pub score: i32,
    pub max_score: i32,
}

impl DialogueEngine {
    /// Positions at the root node `"1"`. Full link resolution is checked at
    /// content load; here only the root's existence is required.
    pub fn new(tree: DialogueTree) -> Result<Self> {
        if tree.node(ROOT_NODE_KEY).is_none() {
            return Err(Error::InvalidState(format!(
                "dialogue tree has no root node '{}'",
                ROOT_NODE_KEY
            )));
        }

        Ok(Self {
            tree,
            current_key: ROOT_NODE_KEY.to_string(),
            path: Vec::new(),
            total_score: 0,
            finished: false,
        })
    }

    pub fn current_key(&self) -> &str {
        &self.current_key
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn path(&self) -> &[DialoguePathStep] {
        &self.path
    }

    pub fn score(&self) -> i32 {
        self.total_score
    }

    /// Returns the node's prompt and shuffled options, or `None` when `key`
    /// is the terminal state. Unknown keys (a dangling `next_node_key` in the
    /// authored content) fail here, with no path step recorded for the
    /// failed entry.
    pub fn enter_node(&self, key: &str) -> Result<Option<NodeView>> {
        if key == END_NODE_KEY {
            return Ok(None);
        }

        let node = self.tree.node(key).ok_or_else(|| {
            Error::InvalidState(format!("dialogue node '{}' does not exist", key))
        })?;

        let mut options: Vec<(String, String)> = node
            .options
            .iter()
            .map(|(option_key, option)| (option_key.clone(), option.text.clone()))
            .collect();
        options.sort_by(|a, b| a.0.cmp(&b.0));
        options.shuffle(&mut rand::thread_rng());

        Ok(Some(NodeView {
            prompt: node.prompt.clone(),
            options,
        }))
    }

    /// Convenience for re-rendering after a resume.
    pub fn enter_current(&self) -> Result<Option<NodeView>> {
        self.enter_node(&self.current_key)
    }

    /// Applies one choice: appends the path step, adds the option's score to
    /// the running total and moves to the option's target node. Fails with
    /// `InvalidState` (and records nothing) when the dialogue is already
    /// finished, `node_key` is not the current node, or `option_key` does not
    /// exist under it.
    pub fn choose_option(&mut self, node_key: &str, option_key: &str) -> Result<ChoiceFeedback> {
        if self.finished {
            return Err(Error::InvalidState(
                "dialogue has already reached the terminal state".to_string(),
            ));
        }
        if node_key != self.current_key {
            return Err(Error::InvalidState(format!(
                "choice made on node '{}' but the dialogue is at node '{}'",
                node_key, self.current_key
            )));
        }
        if self.path.len() >= MAX_PATH_STEPS {
            return Err(Error::InvalidState(format!(
                "dialogue exceeded {} steps; the tree is likely cyclic",
                MAX_PATH_STEPS
            )));
        }

        let node = self.tree.node(node_key).ok_or_else(|| {
            Error::InvalidState(format!("dialogue node '{}' does not exist", node_key))
        })?;
        let option = node.options.get(option_key).ok_or_else(|| {
            Error::InvalidState(format!(
                "node '{}' has no option '{}'",
                node_key, option_key
            ))
        })?;

        self.path.push(DialoguePathStep {
            node_key: node_key.to_string(),
            chosen_option_key: option_key.to_string(),
            score_awarded: option.score,
            next_node_key: option.next_node_key.clone(),
        });
        self.total_score += option.score;

        if option.next_node_key == END_NODE_KEY {
            self.finished = true;
            tracing::info!(
                steps = self.path.len(),
                score = self.total_score,
                "dialogue completed"
            );
        }
        self.current_key = option.next_node_key.clone();

        Ok(ChoiceFeedback {
            justification: option.justification.clone(),
            next_node_key: option.next_node_key.clone(),
            is_correct: option.score >= CORRECT_SCORE_THRESHOLD,
        })
    }

    /// Final path and score. Only available once a choice has led to "end".
    pub fn outcome(&self) -> Result<DialogueOutcome> {
        if !self.finished {
            return Err(Error::InvalidState(
                "dialogue has not reached the terminal state yet".to_string(),
            ));
        }

        Ok(DialogueOutcome {
            path: self.path.clone(),
            score: self.total_score,
            max_score: POINTS_PER_STEP * self.path.len() as i32,
        })
    }
}
