use regex::Regex;
use tracing::debug;

/// A single file recovered from a pipeline result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub name: String,
    pub content: String,
}

/// Ordered classification policy: the first rule whose tag appears in the
/// fence-open line (case-insensitive) decides the target filename.
const RULES: &[(&[&str], &str)] = &[
    (&["python", ".py"], "main.py"),
    (&["markdown", "md"], "README.md"),
    (&["javascript", ".js"], "app.js"),
    (&["html"], "index.html"),
    (&["css"], "style.css"),
    (&["json"], "config.json"),
    (&["yaml", "yml"], "config.yml"),
    (&["docker"], "Dockerfile"),
    (&["requirements", "dependencies"], "requirements.txt"),
];

const FALLBACK_FILE: &str = "code.txt";
const MAIN_FILE: &str = "main.py";

/// Scans free-form model output for fenced blocks and maps each one to a
/// project file. Pure over the input text; writing anything to disk is the
/// store's job.
pub struct ArtifactExtractor {
    fence: Regex,
}

impl Default for ArtifactExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl ArtifactExtractor {
    pub fn new() -> Self {
        Self {
            // Models emit both backtick and triple-quote fences.
            fence: Regex::new(r#"```|""""#).unwrap(),
        }
    }

    /// Extract all well-formed fenced blocks from `text`, in first-seen
    /// order. Duplicate classifications keep the later content (and the
    /// original position); a block left open at end of text is discarded.
    /// `main.py` is always present in the result, synthesized if needed.
    pub fn extract(&self, text: &str, project_name: &str) -> Vec<Artifact> {
        let mut artifacts: Vec<Artifact> = Vec::new();
        let mut block: Option<OpenBlock> = None;

        for line in text.lines() {
            let token = self.fence.find(line).map(|m| m.as_str());

            match block.take() {
                None => {
                    if let Some(token) = token {
                        block = Some(OpenBlock {
                            token: token.to_string(),
                            filename: classify(line),
                            lines: Vec::new(),
                        });
                    }
                }
                Some(mut open) => {
                    if token == Some(open.token.as_str()) {
                        commit(&mut artifacts, open.filename, &open.lines);
                    } else {
                        open.push(line);
                        block = Some(open);
                    }
                }
            }
        }

        if let Some(open) = block {
            // Unterminated block: never written, the content may be truncated.
            debug!(filename = open.filename, "discarding unterminated block");
        }

        if !artifacts.iter().any(|a| a.name == MAIN_FILE) {
            artifacts.push(Artifact {
                name: MAIN_FILE.to_string(),
                content: placeholder_main(project_name),
            });
        }

        artifacts
    }
}

struct OpenBlock {
    token: String,
    filename: &'static str,
    lines: Vec<String>,
}

impl OpenBlock {
    fn push(&mut self, line: &str) {
        self.lines.push(line.to_string());
    }
}

fn classify(marker_line: &str) -> &'static str {
    let tag = marker_line.to_lowercase();
    for (needles, filename) in RULES {
        if needles.iter().any(|needle| tag.contains(needle)) {
            return filename;
        }
    }
    FALLBACK_FILE
}

fn commit(artifacts: &mut Vec<Artifact>, filename: &str, lines: &[String]) {
    let content = lines.join("\n");
    match artifacts.iter_mut().find(|a| a.name == filename) {
        // Last write wins, original position kept
        Some(existing) => existing.content = content,
        None => artifacts.push(Artifact {
            name: filename.to_string(),
            content,
        }),
    }
}

/// Stub entry point written when the agents produced no recognizable
/// implementation, so every project has at least one runnable file.
fn placeholder_main(project_name: &str) -> String {
    format!(
        r#""""
{project_name} - Basic Implementation
Generated by the DevCrew multi-agent pipeline
"""

def main():
    """Entry point for {project_name}"""
    print("Welcome to {project_name}!")
    print("No implementation was extracted from the agent output.")
    print("Review result.txt and build out the functionality below.")

    # TODO: Implement the functionality described in the project requirements
    # TODO: Add error handling and input validation

    return True

if __name__ == "__main__":
    main()
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(text: &str) -> Vec<Artifact> {
        ArtifactExtractor::new().extract(text, "demo")
    }

    #[test]
    fn test_python_block_becomes_main_py() {
        let text = "Here is the code:\n```python\ndef add(a, b):\n    return a + b\n```\nDone.";
        let artifacts = extract(text);

        assert_eq!(artifacts.len(), 1);
        assert_eq!(artifacts[0].name, "main.py");
        assert_eq!(artifacts[0].content, "def add(a, b):\n    return a + b");
    }

    #[test]
    fn test_every_tag_maps_to_its_filename() {
        let cases = [
            ("markdown", "README.md"),
            ("javascript", "app.js"),
            ("html", "index.html"),
            ("css", "style.css"),
            ("json", "config.json"),
            ("yaml", "config.yml"),
            ("dockerfile", "Dockerfile"),
            ("text requirements.txt", "requirements.txt"),
        ];

        for (tag, expected) in cases {
            let text = format!("```{tag}\ncontent\n```");
            let artifacts = extract(&text);
            assert!(
                artifacts.iter().any(|a| a.name == expected),
                "tag {tag:?} should map to {expected}"
            );
        }
    }

    #[test]
    fn test_tag_match_is_case_insensitive() {
        let artifacts = extract("```Python\nprint('hi')\n```");
        assert_eq!(artifacts[0].name, "main.py");
        assert_eq!(artifacts[0].content, "print('hi')");
    }

    #[test]
    fn test_unmatched_tag_falls_back_to_code_txt() {
        let artifacts = extract("```rust\nfn main() {}\n```");
        let code = artifacts.iter().find(|a| a.name == "code.txt").unwrap();
        assert_eq!(code.content, "fn main() {}");
    }

    #[test]
    fn test_main_py_synthesized_when_absent() {
        let artifacts = extract("```markdown\n# Calc\n```");

        assert_eq!(artifacts.len(), 2);
        assert_eq!(artifacts[0].name, "README.md");
        let main = artifacts.iter().find(|a| a.name == "main.py").unwrap();
        assert!(main.content.contains("def main():"));
        assert!(main.content.contains("demo"));
    }

    #[test]
    fn test_no_blocks_yields_only_placeholder() {
        let artifacts = extract("The agents wrote prose and no code at all.");
        assert_eq!(artifacts.len(), 1);
        assert_eq!(artifacts[0].name, "main.py");
        assert!(artifacts[0].content.contains("TODO"));
    }

    #[test]
    fn test_last_write_wins_for_duplicate_classification() {
        let text = "```markdown\nfirst\n```\nmore prose\n```markdown\nsecond\n```";
        let artifacts = extract(text);

        let readmes: Vec<_> = artifacts.iter().filter(|a| a.name == "README.md").collect();
        assert_eq!(readmes.len(), 1);
        assert_eq!(readmes[0].content, "second");
    }

    #[test]
    fn test_duplicate_keeps_first_seen_position() {
        let text = "```markdown\nfirst\n```\n```html\n<p></p>\n```\n```md\nsecond\n```";
        let artifacts = extract(text);

        assert_eq!(artifacts[0].name, "README.md");
        assert_eq!(artifacts[0].content, "second");
        assert_eq!(artifacts[1].name, "index.html");
    }

    #[test]
    fn test_unterminated_trailing_block_is_dropped() {
        let artifacts = extract("\"\"\"python\nprint('hi')");

        assert_eq!(artifacts.len(), 1);
        assert_eq!(artifacts[0].name, "main.py");
        assert!(!artifacts[0].content.contains("print('hi')"));
    }

    #[test]
    fn test_close_token_must_match_open_token() {
        // A docstring inside a backtick fence must not close the block.
        let text = "```python\ndef f():\n    \"\"\"doc\"\"\"\n    return 1\n```";
        let artifacts = extract(text);

        assert_eq!(artifacts[0].name, "main.py");
        assert!(artifacts[0].content.contains("\"\"\"doc\"\"\""));
        assert!(artifacts[0].content.contains("return 1"));
    }

    #[test]
    fn test_extraction_is_idempotent() {
        let text = "```python\nx = 1\n```\n```markdown\n# Title\n```";
        let first = extract(text);
        let second = extract(text);
        assert_eq!(first, second);
    }

    #[test]
    fn test_n_blocks_yield_n_files() {
        let text = "```python\nx = 1\n```\n```markdown\n# T\n```\n```css\nbody {}\n```";
        let artifacts = extract(text);

        // Python already claimed main.py, so nothing is synthesized.
        assert_eq!(artifacts.len(), 3);
    }
}
