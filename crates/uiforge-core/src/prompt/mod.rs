//! Modular prompt assembly.
//!
//! Every LLM call receives exactly two strings — a system prompt and a user
//! prompt — assembled here from composable, independently testable sections.
//! Section text never embeds stack-specific vocabulary; framework details
//! arrive through the template registry so a new stack is a registry entry,
//! not a prompt rewrite.
//!
//! Each section is a pure function of its inputs, so the engine can pick
//! small prompts for cheap stages and large prompts for code-emitting ones.

use crate::stack::{templates, TechStack};

/// Section toggles for system prompt assembly.
#[derive(Debug, Clone, Copy)]
pub struct PromptOptions {
    /// Emit the styling-requirements section.
    pub include_styling: bool,
    /// Emit the testing-requirements section.
    pub include_testing: bool,
    /// Emit the documentation-requirements section.
    pub include_docs: bool,
}

impl PromptOptions {
    /// Smallest useful prompt: styling/testing/docs off.
    pub fn minimal() -> Self {
        Self {
            include_styling: false,
            include_testing: false,
            include_docs: false,
        }
    }

    /// Everything on.
    pub fn full_featured() -> Self {
        Self {
            include_styling: true,
            include_testing: true,
            include_docs: true,
        }
    }
}

impl Default for PromptOptions {
    fn default() -> Self {
        Self::full_featured()
    }
}

/// Build the system prompt for a generation call.
///
/// Deterministic given inputs and registry contents. The framework section
/// always carries the full template strings for the stack triple.
pub fn build_system(
    stack: &TechStack,
    project_name: &str,
    app_type: &str,
    options: PromptOptions,
) -> String {
    let mut sections = vec![
        project_context(stack, project_name, app_type),
        response_format(),
        core_requirements(),
    ];

    if options.include_styling {
        sections.push(style_requirements(stack));
    }

    sections.push(framework_guidance(stack));

    if options.include_testing {
        sections.push(testing_requirements());
    }
    if options.include_docs {
        sections.push(documentation_requirements());
    }

    sections.push(output_checklist());
    sections.push(final_instruction());

    sections.join("\n\n")
}

/// Build the user prompt for a generation call.
pub fn build_user(
    description: &str,
    stack: &TechStack,
    features: &[String],
    styling_emphasis: bool,
) -> String {
    let mut out = format!(
        "Generate a complete {} application from the attached mockup.\n\n\
         Description:\n{description}\n",
        stack.summary(),
    );

    if !features.is_empty() {
        out.push_str("\nRequired features:\n");
        for feature in features {
            out.push_str("- ");
            out.push_str(feature);
            out.push('\n');
        }
    }

    if styling_emphasis {
        out.push_str(
            "\nMatch the mockup's visual layout closely: spacing, alignment, \
             hierarchy, and color relationships.\n",
        );
    }

    out
}

// ============================================================================
// Sections
// ============================================================================

fn section(label: &str, body: &str) -> String {
    format!("=== {label} ===\n{body}")
}

fn project_context(stack: &TechStack, project_name: &str, app_type: &str) -> String {
    section(
        "PROJECT CONTEXT",
        &format!(
            "Project name: {project_name}\n\
             Application type: {app_type}\n\
             Frontend: {}\n\
             Backend: {}\n\
             Database: {}\n\
             Architecture: {}",
            stack.frontend, stack.backend, stack.database, stack.architecture,
        ),
    )
}

fn response_format() -> String {
    section(
        "RESPONSE FORMAT",
        "Respond with a single JSON object and nothing else. No prose before \
         or after, no markdown fences. Schema:\n\
         {\n\
         \x20 \"files\": [{\"path\": \"relative/path\", \"content\": \"full file contents\", \"description\": \"one line\"}],\n\
         \x20 \"dependencies\": {\"frontend\": [], \"backend\": [], \"database\": []},\n\
         \x20 \"setup_instructions\": [\"step\"],\n\
         \x20 \"project_structure\": {\"directory\": [\"child\"]}\n\
         }\n\
         \"files\" is mandatory; all string values must be valid JSON strings \
         with newlines escaped as \\n.",
    )
}

fn core_requirements() -> String {
    section(
        "CORE REQUIREMENTS",
        "- Complete, runnable code in every file. No placeholders, no TODO \
         stubs, no elided bodies, no truncation.\n\
         - Validate and sanitize all user input; parameterize every database \
         query; never interpolate secrets into source.\n\
         - Respect architectural layering: routes/controllers stay thin, \
         business logic lives in services, data access in its own layer.\n\
         - Every file must be syntactically valid for its language; it will \
         be machine-checked.",
    )
}

fn style_requirements(stack: &TechStack) -> String {
    let template = templates::frontend(stack.frontend);
    let body = if template.styling_requirements.is_empty() {
        "Follow the mockup's layout using the stack's idiomatic styling \
         approach."
            .to_string()
    } else {
        template.styling_requirements.to_string()
    };
    section("STYLE REQUIREMENTS", &body)
}

fn framework_guidance(stack: &TechStack) -> String {
    let frontend = templates::frontend(stack.frontend);
    let backend = templates::backend(stack.backend);
    let database = templates::database(stack.database);

    section(
        "FRAMEWORK REQUIREMENTS",
        &format!(
            "Frontend ({}):\n{}\n\nBackend ({}):\n{}\n\nDatabase ({}):\n{}",
            stack.frontend,
            frontend.core_instructions,
            stack.backend,
            backend.core_instructions,
            stack.database,
            database.core_instructions,
        ),
    )
}

fn testing_requirements() -> String {
    section(
        "TESTING REQUIREMENTS",
        "Include test files covering the main API endpoints and core \
         components, using the stack's conventional test runner. Tests must \
         be runnable with the standard commands for the framework.",
    )
}

fn documentation_requirements() -> String {
    section(
        "DOCUMENTATION REQUIREMENTS",
        "Include a README.md with project overview, prerequisites, setup \
         steps, and the commands to run the app and its tests. Document \
         non-obvious environment variables.",
    )
}

fn output_checklist() -> String {
    section(
        "BEFORE RESPONDING, VERIFY",
        "- Every file in \"files\" has a unique path.\n\
         - Every file's content is complete and syntactically valid.\n\
         - Dependencies list every package your code imports.\n\
         - The response is one JSON object matching the schema exactly.\n\
         - No file references another file you did not generate.",
    )
}

fn final_instruction() -> String {
    section("BEGIN", "Generate the project now.")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stack::{Backend, Frontend, TechStack};

    fn stack() -> TechStack {
        TechStack::parse("react", "fastapi", "postgresql", None).unwrap()
    }

    #[test]
    fn build_system_is_deterministic() {
        let a = build_system(&stack(), "demo", "web app", PromptOptions::full_featured());
        let b = build_system(&stack(), "demo", "web app", PromptOptions::full_featured());
        assert_eq!(a, b);
    }

    #[test]
    fn minimal_omits_optional_sections() {
        let prompt = build_system(&stack(), "demo", "web app", PromptOptions::minimal());
        assert!(!prompt.contains("=== STYLE REQUIREMENTS ==="));
        assert!(!prompt.contains("=== TESTING REQUIREMENTS ==="));
        assert!(!prompt.contains("=== DOCUMENTATION REQUIREMENTS ==="));
        // The mandatory sections survive.
        assert!(prompt.contains("=== PROJECT CONTEXT ==="));
        assert!(prompt.contains("=== RESPONSE FORMAT ==="));
        assert!(prompt.contains("=== FRAMEWORK REQUIREMENTS ==="));
        assert!(prompt.contains("=== BEGIN ==="));
    }

    #[test]
    fn full_featured_includes_all_sections() {
        let prompt = build_system(&stack(), "demo", "web app", PromptOptions::full_featured());
        for label in [
            "PROJECT CONTEXT",
            "RESPONSE FORMAT",
            "CORE REQUIREMENTS",
            "STYLE REQUIREMENTS",
            "FRAMEWORK REQUIREMENTS",
            "TESTING REQUIREMENTS",
            "DOCUMENTATION REQUIREMENTS",
            "BEFORE RESPONDING, VERIFY",
            "BEGIN",
        ] {
            assert!(prompt.contains(&format!("=== {label} ===")), "missing {label}");
        }
    }

    #[test]
    fn full_template_strings_are_injected_for_every_stack() {
        // The historical failure mode is fetching templates but not
        // substituting them; assert the entire string lands in the prompt.
        for frontend in Frontend::ALL {
            for backend in Backend::ALL {
                let stack = TechStack {
                    frontend,
                    backend,
                    ..TechStack::parse("react", "fastapi", "postgresql", None).unwrap()
                };
                let prompt =
                    build_system(&stack, "demo", "web app", PromptOptions::minimal());
                assert!(
                    prompt.contains(crate::stack::templates::frontend(frontend).core_instructions),
                    "frontend template for {frontend} not injected in full"
                );
                assert!(
                    prompt.contains(crate::stack::templates::backend(backend).core_instructions),
                    "backend template for {backend} not injected in full"
                );
            }
        }
    }

    #[test]
    fn dotnet_stack_never_sees_python_guidance() {
        let stack = TechStack::parse("react", "dotnet", "postgresql", None).unwrap();
        let prompt = build_system(&stack, "demo", "web app", PromptOptions::minimal());
        assert!(prompt.contains("Program.cs"));
        assert!(!prompt.contains("FastAPI"));
    }

    #[test]
    fn build_user_carries_description_and_features() {
        let prompt = build_user(
            "task manager with auth",
            &stack(),
            &["authentication".to_string(), "kanban board".to_string()],
            true,
        );
        assert!(prompt.contains("task manager with auth"));
        assert!(prompt.contains("- authentication"));
        assert!(prompt.contains("- kanban board"));
        assert!(prompt.contains("Match the mockup's visual layout"));
    }

    #[test]
    fn build_user_without_features_or_emphasis() {
        let prompt = build_user("plain dashboard", &stack(), &[], false);
        assert!(!prompt.contains("Required features"));
        assert!(!prompt.contains("Match the mockup's visual layout"));
    }
}
