//! Assembly of the per-job action script.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::observer::ProgressObserver;
use crate::template::ActionTemplate;
use crate::traversal::OrderedNodes;

/// Optional lines placed before and after the rendered job actions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptFrame {
    #[serde(default)]
    pub prologue: Option<String>,
    #[serde(default)]
    pub epilogue: Option<String>,
}

impl ScriptFrame {
    /// No framing; the script is exactly the rendered actions.
    pub fn none() -> Self {
        Self::default()
    }

    /// Wrap the actions in a pipeline `node { ... }` block.
    pub fn node_block() -> Self {
        Self {
            prologue: Some("node {".to_string()),
            epilogue: Some("}".to_string()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.prologue.is_none() && self.epilogue.is_none()
    }
}

/// An assembled action script, ready for a script executor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionScript {
    text: String,
    jobs: Vec<String>,
}

impl ActionScript {
    /// Full script text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Jobs the script was generated for, in order.
    pub fn jobs(&self) -> &[String] {
        &self.jobs
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.text.lines()
    }

    /// SHA-256 of the script text, hex encoded.
    pub fn digest(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.text.as_bytes());
        hex::encode(hasher.finalize())
    }

    /// First 12 hex characters of [`digest`](Self::digest).
    pub fn short_digest(&self) -> String {
        let mut digest = self.digest();
        digest.truncate(12);
        digest
    }

    pub fn into_text(self) -> String {
        self.text
    }
}

impl fmt::Display for ActionScript {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Concatenates rendered job actions into one script.
pub struct ScriptAssembler;

impl ScriptAssembler {
    /// Render `template` for every job of `sequence`, in order, each followed
    /// by a newline. `observer` is told about each job as it is queued.
    pub fn assemble(
        sequence: &OrderedNodes,
        template: &ActionTemplate,
        observer: &dyn ProgressObserver,
    ) -> ActionScript {
        Self::assemble_framed(sequence, template, &ScriptFrame::none(), observer)
    }

    /// Like [`assemble`](Self::assemble), with `frame` lines around the body.
    pub fn assemble_framed(
        sequence: &OrderedNodes,
        template: &ActionTemplate,
        frame: &ScriptFrame,
        observer: &dyn ProgressObserver,
    ) -> ActionScript {
        let mut text = String::new();
        let mut jobs = Vec::with_capacity(sequence.len());

        if let Some(prologue) = &frame.prologue {
            text.push_str(prologue);
            text.push('\n');
        }
        for node in sequence {
            observer.on_node_queued(node);
            text.push_str(&template.render(node));
            text.push('\n');
            jobs.push(node.name.clone());
        }
        if let Some(epilogue) = &frame.epilogue {
            text.push_str(epilogue);
            text.push('\n');
        }

        ActionScript { text, jobs }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::RecordingObserver;
    use crate::model::JobNode;

    fn sequence(names: &[&str]) -> OrderedNodes {
        let mut ordered = OrderedNodes::new();
        for name in names {
            ordered.push(JobNode::new(*name));
        }
        ordered
    }

    #[test]
    fn test_one_line_per_job_in_order() {
        let seq = sequence(&["child_a", "parent_a", "child_b", "parent_b", "grand"]);
        let script = ScriptAssembler::assemble(
            &seq,
            &ActionTemplate::new("build JOB_NAME"),
            &RecordingObserver::new(),
        );
        let lines: Vec<&str> = script.lines().collect();
        assert_eq!(
            lines,
            vec![
                "build 'child_a'",
                "build 'parent_a'",
                "build 'child_b'",
                "build 'parent_b'",
                "build 'grand'",
            ]
        );
        assert!(script.text().ends_with('\n'));
        assert_eq!(script.jobs().len(), 5);
    }

    #[test]
    fn test_observer_sees_each_job() {
        let seq = sequence(&["child_a", "parent_a"]);
        let observer = RecordingObserver::new();
        ScriptAssembler::assemble(&seq, &ActionTemplate::default(), &observer);
        assert_eq!(
            observer.messages(),
            vec![
                "Scheduling project: child_a".to_string(),
                "Scheduling project: parent_a".to_string(),
            ]
        );
    }

    #[test]
    fn test_empty_sequence_gives_empty_script() {
        let script = ScriptAssembler::assemble(
            &OrderedNodes::new(),
            &ActionTemplate::default(),
            &RecordingObserver::new(),
        );
        assert!(script.text().is_empty());
    }

    #[test]
    fn test_node_block_frame() {
        let seq = sequence(&["a", "b"]);
        let script = ScriptAssembler::assemble_framed(
            &seq,
            &ActionTemplate::default(),
            &ScriptFrame::node_block(),
            &RecordingObserver::new(),
        );
        assert_eq!(script.text(), "node {\nbuild 'a'\nbuild 'b'\n}\n");
        assert_eq!(script.jobs(), ["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_digest_tracks_content() {
        let observer = RecordingObserver::new();
        let a = ScriptAssembler::assemble(&sequence(&["a"]), &ActionTemplate::default(), &observer);
        let b = ScriptAssembler::assemble(&sequence(&["b"]), &ActionTemplate::default(), &observer);
        assert_eq!(a.digest().len(), 64);
        assert_ne!(a.digest(), b.digest());
        assert_eq!(a.short_digest(), a.digest()[..12]);
    }
}
