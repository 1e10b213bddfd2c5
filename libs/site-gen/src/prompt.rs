use std::fmt::Write as _;

use task_api::types::task::Attachment;

use crate::{DESCRIPTION_DOCUMENT, ENTRY_DOCUMENT};

/// How much of an attachment's url is shown to the model.
const ATTACHMENT_PREVIEW_CHARS: usize = 100;

/// Build the single user prompt sent to the model.
pub fn build_prompt(brief: &str, checks: &[String], attachments: &[Attachment]) -> String {
    let mut prompt = format!(
        "Generate a COMPLETE static web app for: \"{brief}\"\n\
         \n\
         REQUIREMENTS:\n\
         - Single {ENTRY_DOCUMENT} with embedded CSS/JS\n\
         - Responsive, modern UI\n\
         - Vanilla HTML/CSS/JS only\n\
         - Max 1500 lines\n"
    );

    for check in checks {
        let _ = writeln!(prompt, "- {check}");
    }

    if !attachments.is_empty() {
        prompt.push_str("\nATTACHMENTS:\n");
        for attachment in attachments {
            let preview: String = attachment
                .url
                .chars()
                .take(ATTACHMENT_PREVIEW_CHARS)
                .collect();
            let _ = writeln!(prompt, "- {}: {}", attachment.name, preview);
        }
    }

    let _ = write!(
        prompt,
        "\nJSON OUTPUT ONLY, no commentary:\n\
         {{\"{ENTRY_DOCUMENT}\": \"FULL CODE\", \"{DESCRIPTION_DOCUMENT}\": \"Description\"}}"
    );

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_names_brief_checks_and_output_shape() {
        let checks = vec!["Page has a <h1> title".to_owned()];
        let prompt = build_prompt("a todo list app", &checks, &[]);

        assert!(prompt.contains("\"a todo list app\""));
        assert!(prompt.contains("- Page has a <h1> title"));
        assert!(prompt.contains(r#"{"index.html": "FULL CODE", "README.md": "Description"}"#));
        assert!(!prompt.contains("ATTACHMENTS"));
    }

    #[test]
    fn attachments_are_summarized_not_inlined() {
        let url = format!("data:text/csv;base64,{}", "A".repeat(500));
        let attachments = vec![Attachment {
            name: "sales.csv".to_owned(),
            url: url.clone(),
        }];

        let prompt = build_prompt("chart the sales", &[], &attachments);
        let expected: String = url.chars().take(ATTACHMENT_PREVIEW_CHARS).collect();

        assert!(prompt.contains(&format!("- sales.csv: {expected}\n")));
        assert!(!prompt.contains(&url));
    }
}
