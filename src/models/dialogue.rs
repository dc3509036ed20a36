use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{Error, Result};

/// Every authored tree starts at this node.
pub const ROOT_NODE_KEY: &str = "1";
/// Sentinel `next_node_key` that terminates a traversal.
pub const END_NODE_KEY: &str = "end";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DialogueTree {
    pub nodes: HashMap<String, DialogueNode>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DialogueNode {
    pub prompt: String,
    pub options: HashMap<String, DialogueOption>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DialogueOption {
    pub text: String,
    pub score: i32,
    pub justification: String,
    pub next_node_key: String,
}

/// One entry in the append-only traversal log. The concatenation of steps is
/// the user's path and is the input to scoring and post-hoc review.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DialoguePathStep {
    pub node_key: String,
    pub chosen_option_key: String,
    pub score_awarded: i32,
    pub next_node_key: String,
}

impl DialogueTree {
    pub fn node(&self, key: &str) -> Option<&DialogueNode> {
        self.nodes.get(key)
    }

    /// Authoring contract check: the root node exists and every
    /// `next_node_key` other than "end" resolves to a node. Run at content
    /// load so broken trees never reach a user mid-dialogue.
    pub fn validate(&self) -> Result<()> {
        if !self.nodes.contains_key(ROOT_NODE_KEY) {
            return Err(Error::InvalidState(format!(
                "dialogue tree has no root node '{}'",
                ROOT_NODE_KEY
            )));
        }

        for (node_key, node) in &self.nodes {
            if node.options.is_empty() {
                return Err(Error::InvalidState(format!(
                    "dialogue node '{}' has no options",
                    node_key
                )));
            }
            for (option_key, option) in &node.options {
                if option.next_node_key != END_NODE_KEY
                    && !self.nodes.contains_key(&option.next_node_key)
                {
                    return Err(Error::InvalidState(format!(
                        "option '{}' of node '{}' points to unknown node '{}'",
                        option_key, node_key, option.next_node_key
                    )));
                }
            }
        }

        Ok(())
    }
}
