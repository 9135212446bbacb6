//! Conditional document assembly.
//!
//! Picks the manifest instructions that apply to the final state, orders and
//! groups them by category, fetches their fragments and renders one Markdown
//! document.

use std::collections::{HashMap, HashSet};

use futures_util::future::join_all;
use tracing::debug;

use wayfinder_types::docs::{DEFAULT_PRIORITY, Documentation, Instruction};

use crate::expression::ExpressionEvaluator;
use crate::ports::FragmentSource;
use crate::state::State;

/// One category of the document with its selected instructions, in order.
#[derive(Debug, Clone, PartialEq)]
pub struct DocSection<'a> {
    pub category: &'a str,
    pub title: String,
    pub priority: i64,
    pub instructions: Vec<&'a Instruction>,
}

/// Select, order and group the instructions that apply to `state`.
///
/// - an instruction is included when `always` is set, or when it has a
///   `when` condition that holds; with neither it is left out
/// - once an id is included, later instructions with the same id are skipped
/// - instructions are stably sorted by category priority then their own
///   priority (both default to 99), grouped by category in first-seen order,
///   and the groups stably sorted by category priority
/// - unknown categories get priority 99 and their raw id as title
pub fn select_sections<'a>(
    documentation: &'a Documentation,
    state: &State,
    evaluator: &ExpressionEvaluator,
) -> Vec<DocSection<'a>> {
    let categories: HashMap<&str, (&str, i64)> = documentation
        .categories
        .iter()
        .map(|c| (c.id.as_str(), (c.title.as_str(), c.priority)))
        .collect();
    let category_priority = |id: &str| {
        categories
            .get(id)
            .map_or(DEFAULT_PRIORITY, |(_, priority)| *priority)
    };

    let mut included = HashSet::new();
    let mut selected: Vec<&Instruction> = Vec::new();
    for instruction in &documentation.instructions {
        if included.contains(instruction.id.as_str()) {
            debug!(id = %instruction.id, "Skipping duplicate instruction");
            continue;
        }
        let applies = instruction.always
            || instruction
                .when
                .as_deref()
                .is_some_and(|when| evaluator.condition(Some(when), state.as_value()));
        if applies {
            included.insert(instruction.id.as_str());
            selected.push(instruction);
        }
    }

    selected.sort_by_key(|i| (category_priority(&i.category), i.effective_priority()));

    let mut sections: Vec<DocSection<'a>> = Vec::new();
    for instruction in selected {
        match sections
            .iter_mut()
            .find(|s| s.category == instruction.category)
        {
            Some(section) => section.instructions.push(instruction),
            None => {
                let (title, priority) = categories
                    .get(instruction.category.as_str())
                    .map_or((instruction.category.as_str(), DEFAULT_PRIORITY), |c| *c);
                sections.push(DocSection {
                    category: &instruction.category,
                    title: title.to_string(),
                    priority,
                    instructions: vec![instruction],
                });
            }
        }
    }
    sections.sort_by_key(|s| s.priority);

    sections
}

/// Render the document from selected sections and their fetched fragments.
///
/// `fragment` is looked up for every instruction that names a file.
fn render<'s>(
    title: &str,
    sections: &[DocSection<'_>],
    mut fragment: impl FnMut(&str) -> Option<&'s str>,
) -> String {
    let mut blocks = vec![format!("# {title}")];

    for section in sections {
        blocks.push(format!("## {}", section.title));
        for instruction in &section.instructions {
            if let Some(goal) = &instruction.goal {
                blocks.push(format!("### {goal}"));
            }
            if let Some(text) = instruction.file.as_deref().and_then(&mut fragment) {
                blocks.push(text.to_string());
            }
        }
    }

    blocks.join("\n\n")
}

/// Assemble the Markdown installation document for the final state.
///
/// Fragments are fetched concurrently; the output keeps the sorted order.
/// A fragment that cannot be fetched renders as the source's placeholder.
pub async fn assemble<F: FragmentSource>(
    documentation: &Documentation,
    state: &State,
    evaluator: &ExpressionEvaluator,
    fragments: &F,
) -> String {
    let sections = select_sections(documentation, state, evaluator);

    let files: Vec<&str> = sections
        .iter()
        .flat_map(|s| s.instructions.iter())
        .filter_map(|i| i.file.as_deref())
        .collect();
    let texts = join_all(files.iter().map(|path| fragments.fetch_fragment(path))).await;
    let fetched: HashMap<&str, String> = files.into_iter().zip(texts).collect();

    debug!(
        sections = sections.len(),
        fragments = fetched.len(),
        "Assembled documentation"
    );
    render(&documentation.title, &sections, |path| {
        fetched.get(path).map(String::as_str)
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use super::*;
    use crate::ports::fakes::MemorySource;
    use crate::ports::SourceFragments;
    use serde_json::{Value, json};

    fn docs(value: Value) -> Documentation {
        serde_json::from_value(value).unwrap()
    }

    fn state(value: Value) -> State {
        let mut state = State::new();
        if let Value::Object(map) = value {
            for (k, v) in map {
                state.set(&k.parse().unwrap(), v).unwrap();
            }
        }
        state
    }

    fn ids(sections: &[DocSection<'_>]) -> Vec<(String, Vec<String>)> {
        sections
            .iter()
            .map(|s| {
                (
                    s.category.to_string(),
                    s.instructions.iter().map(|i| i.id.clone()).collect(),
                )
            })
            .collect()
    }

    #[test]
    fn test_always_instructions_ignore_state() {
        let documentation = docs(json!({
            "title": "Install",
            "instructions": [
                { "id": "intro", "category": "general", "always": true },
                { "id": "never", "category": "general" },
                { "id": "wifi", "category": "general", "when": "wifi.enabled" }
            ]
        }));
        let eval = ExpressionEvaluator::new();

        let empty = select_sections(&documentation, &State::new(), &eval);
        assert_eq!(ids(&empty), vec![("general".to_string(), vec!["intro".to_string()])]);

        let with_wifi = select_sections(&documentation, &state(json!({ "wifi.enabled": true })), &eval);
        assert_eq!(
            ids(&with_wifi),
            vec![("general".to_string(), vec!["intro".to_string(), "wifi".to_string()])]
        );
    }

    #[test]
    fn test_first_included_duplicate_wins() {
        let documentation = docs(json!({
            "title": "Install",
            "instructions": [
                { "id": "flash", "category": "setup", "when": "board == 'rp2040'", "goal": "Drag the UF2 file" },
                { "id": "flash", "category": "setup", "always": true, "goal": "Flash with esptool" },
                { "id": "flash", "category": "setup", "always": true, "goal": "Never shown" }
            ]
        }));
        let eval = ExpressionEvaluator::new();

        let sections = select_sections(&documentation, &state(json!({ "board": "esp32" })), &eval);
        assert_eq!(sections[0].instructions.len(), 1);
        assert_eq!(sections[0].instructions[0].goal.as_deref(), Some("Flash with esptool"));

        let sections = select_sections(&documentation, &state(json!({ "board": "rp2040" })), &eval);
        assert_eq!(sections[0].instructions.len(), 1);
        assert_eq!(sections[0].instructions[0].goal.as_deref(), Some("Drag the UF2 file"));
    }

    #[test]
    fn test_sorting_by_category_then_instruction_priority() {
        let documentation = docs(json!({
            "title": "Install",
            "categories": [
                { "id": "A", "title": "Category A", "priority": 2 },
                { "id": "B", "title": "Category B", "priority": 1 }
            ],
            "instructions": [
                { "id": "a5", "category": "A", "priority": 5, "always": true },
                { "id": "b", "category": "B", "priority": 1, "always": true },
                { "id": "a1", "category": "A", "priority": 1, "always": true }
            ]
        }));
        let eval = ExpressionEvaluator::new();

        let sections = select_sections(&documentation, &State::new(), &eval);
        assert_eq!(
            ids(&sections),
            vec![
                ("B".to_string(), vec!["b".to_string()]),
                ("A".to_string(), vec!["a1".to_string(), "a5".to_string()]),
            ]
        );
        assert_eq!(sections[0].title, "Category B");
    }

    #[test]
    fn test_equal_priorities_keep_manifest_order() {
        let documentation = docs(json!({
            "title": "Install",
            "instructions": [
                { "id": "third", "category": "z", "always": true },
                { "id": "first", "category": "a", "always": true },
                { "id": "second", "category": "z", "always": true }
            ]
        }));
        let eval = ExpressionEvaluator::new();

        let sections = select_sections(&documentation, &State::new(), &eval);
        assert_eq!(
            ids(&sections),
            vec![
                ("z".to_string(), vec!["third".to_string(), "second".to_string()]),
                ("a".to_string(), vec!["first".to_string()]),
            ]
        );
    }

    #[test]
    fn test_unknown_category_defaults() {
        let documentation = docs(json!({
            "title": "Install",
            "categories": [{ "id": "known", "title": "Known", "priority": 100 }],
            "instructions": [
                { "id": "k", "category": "known", "always": true },
                { "id": "u", "category": "extras", "always": true }
            ]
        }));
        let eval = ExpressionEvaluator::new();

        let sections = select_sections(&documentation, &State::new(), &eval);
        assert_eq!(sections[0].category, "extras");
        assert_eq!(sections[0].title, "extras");
        assert_eq!(sections[0].priority, DEFAULT_PRIORITY);
        assert_eq!(sections[1].title, "Known");
    }

    #[test]
    fn test_broken_condition_excludes_instruction() {
        let documentation = docs(json!({
            "title": "Install",
            "instructions": [{ "id": "x", "category": "c", "when": "board ==" }]
        }));
        let eval = ExpressionEvaluator::new();
        assert!(select_sections(&documentation, &State::new(), &eval).is_empty());
    }

    #[tokio::test]
    async fn test_assemble_renders_markdown() {
        let documentation = docs(json!({
            "title": "Sensor Node Setup",
            "categories": [
                { "id": "hw", "title": "Hardware", "priority": 1 },
                { "id": "net", "title": "Network", "priority": 2 }
            ],
            "instructions": [
                { "id": "wifi", "category": "net", "when": "wifi.enabled", "goal": "Join Wi-Fi", "file": "wifi.md" },
                { "id": "wiring", "category": "hw", "always": true, "goal": "Wire the sensor", "file": "wiring.md" },
                { "id": "note", "category": "hw", "always": true, "priority": 100, "goal": "Double-check polarity" }
            ]
        }));
        let source = MemorySource::default()
            .with("docs/wifi.md", "Hold BOOT for two seconds.")
            .with("docs/wiring.md", "Connect VCC to 3V3.");
        let fragments = SourceFragments::new(&source, "docs");
        let eval = ExpressionEvaluator::new();

        let document = assemble(
            &documentation,
            &state(json!({ "wifi.enabled": true })),
            &eval,
            &fragments,
        )
        .await;

        assert_eq!(
            document,
            "# Sensor Node Setup\n\n\
             ## Hardware\n\n\
             ### Wire the sensor\n\n\
             Connect VCC to 3V3.\n\n\
             ### Double-check polarity\n\n\
             ## Network\n\n\
             ### Join Wi-Fi\n\n\
             Hold BOOT for two seconds."
        );
    }

    #[tokio::test]
    async fn test_missing_fragment_renders_placeholder() {
        let documentation = docs(json!({
            "title": "Guide",
            "instructions": [{ "id": "x", "category": "c", "always": true, "file": "gone.md" }]
        }));
        let source = MemorySource::default();
        let fragments = SourceFragments::new(&source, "docs");
        let eval = ExpressionEvaluator::new();

        let document = assemble(&documentation, &State::new(), &eval, &fragments).await;
        assert_eq!(
            document,
            "# Guide\n\n## c\n\n*Documentation file not found: gone.md*"
        );
    }

    #[tokio::test]
    async fn test_empty_selection_renders_title_only() {
        let documentation = docs(json!({ "title": "Nothing to do" }));
        let eval = ExpressionEvaluator::new();
        let source = MemorySource::default();
        let fragments = SourceFragments::new(&source, "docs");

        let document = assemble(&documentation, &State::new(), &eval, &fragments).await;
        assert_eq!(document, "# Nothing to do");
        assert!(source.requests.lock().unwrap().is_empty());
    }

    /// Fragment source whose responses finish in reverse request order.
    struct SlowFirst {
        finished: Mutex<Vec<String>>,
    }

    impl FragmentSource for SlowFirst {
        async fn fetch_fragment(&self, path: &str) -> String {
            let delay = if path == "first.md" { 30 } else { 1 };
            tokio::time::sleep(Duration::from_millis(delay)).await;
            self.finished.lock().unwrap().push(path.to_string());
            format!("contents of {path}")
        }
    }

    #[tokio::test]
    async fn test_output_order_ignores_completion_order() {
        let documentation = docs(json!({
            "title": "T",
            "instructions": [
                { "id": "1", "category": "c", "always": true, "file": "first.md" },
                { "id": "2", "category": "c", "always": true, "file": "second.md" }
            ]
        }));
        let source = SlowFirst {
            finished: Mutex::new(Vec::new()),
        };
        let eval = ExpressionEvaluator::new();

        let document = assemble(&documentation, &State::new(), &eval, &source).await;

        assert_eq!(
            document,
            "# T\n\n## c\n\ncontents of first.md\n\ncontents of second.md"
        );
        assert_eq!(*source.finished.lock().unwrap(), vec!["second.md", "first.md"]);
    }
}
