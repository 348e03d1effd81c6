//! Starter documents written by `add`. `{name}` is replaced at creation time.

pub const NAME_PLACEHOLDER: &str = "{name}";

pub const ERRAND_SKELETON: &str = r###"---
name: {name}
description: One-line summary of what this errand does
variables:
  # variable_name: What the value should contain
---

## Task

Describe the work. Reference runtime values as ${variable_name}.

## Acceptance Criteria

- [ ] First observable outcome
- [ ] Second observable outcome

## When Complete

1. `bd comments add <id> "## Summary\n\n<findings>"`
2. `bd label remove <id> in-progress`
3. `bd close <id>`
4. `bd label add <id> needs-review`
"###;

pub const PROTOCOL_SKELETON: &str = r#"---
name: {name}
description: When and why to follow this protocol
triggers:
  - phrase that starts this protocol
---

## Steps

1. First step
2. Second step

## Notes

Anything the assistant should keep in mind while following these steps.
"#;

pub const ROLODEX_SKELETON: &str = r#"---
name: {name}
description: What this contact or skill is good for
source: manual
---

## When to Use

Situations where this card applies.

## How to Reach

Commands, links, or skills to invoke.
"#;

/// Fill a skeleton's name placeholder.
pub fn instantiate(skeleton: &str, name: &str) -> String {
    skeleton.replace(NAME_PLACEHOLDER, name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontmatter;

    #[test]
    fn errand_skeleton_has_required_sections() {
        for section in ["## Task", "## Acceptance Criteria", "## When Complete"] {
            assert!(ERRAND_SKELETON.contains(section), "missing {section}");
        }
        assert!(ERRAND_SKELETON.contains("name: {name}"));
        assert!(ERRAND_SKELETON.contains("variables:"));
    }

    #[test]
    fn errand_skeleton_closes_in_four_steps() {
        let steps = [
            r###"1. `bd comments add <id> "## Summary\n\n<findings>"`"###,
            "2. `bd label remove <id> in-progress`",
            "3. `bd close <id>`",
            "4. `bd label add <id> needs-review`",
        ];
        let (_, closing) = ERRAND_SKELETON.split_once("## When Complete").unwrap();
        let lines: Vec<&str> = closing.lines().filter(|l| !l.is_empty()).collect();
        assert_eq!(lines, steps);
        assert!(!ERRAND_SKELETON.contains("--add-label"));
    }

    #[test]
    fn skeletons_parse_after_instantiation() {
        let errand = frontmatter::parse(&instantiate(ERRAND_SKELETON, "nightly")).unwrap();
        assert_eq!(errand.text("name"), Some("nightly"));
        assert!(errand.variables().is_empty());

        let protocol =
            frontmatter::parse_with_lists(&instantiate(PROTOCOL_SKELETON, "morning")).unwrap();
        assert_eq!(protocol.text("name"), Some("morning"));
        assert_eq!(protocol.list("triggers").len(), 1);

        let card = frontmatter::parse(&instantiate(ROLODEX_SKELETON, "calendar")).unwrap();
        assert_eq!(card.text("source"), Some("manual"));
    }
}
