//! The fixed 11-stage pipeline: stage identities, token bounds, and
//! per-stage prompt assembly.
//!
//! Two properties here are load-bearing and tested:
//! - every code-emitting stage injects the **full** template string for the
//!   stack it generates (a truncated or missing template produces files in
//!   the wrong language);
//! - stages 3.x/4.x state the architecture's path prefix as a concrete
//!   example string, not a narrative description (narrative-only layout
//!   guidance produces mixed output).

use super::plan::ArchitecturePlan;
use crate::stack::{templates, Architecture, TechStack};

/// One stage of the chained pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// 1 — architecture plan (no files).
    Plan,
    /// 2 — database schema.
    DatabaseSchema,
    /// 3.1 — backend core (entry, config, db connection).
    BackendCore,
    /// 3.2 — backend models.
    BackendModels,
    /// 3.3 — backend routes.
    BackendRoutes,
    /// 3.4 — backend middleware and utilities.
    BackendMiddleware,
    /// 4.1 — frontend setup (build config, manifest).
    FrontendSetup,
    /// 4.2 — frontend core (entry, app shell, routing, API client).
    FrontendCore,
    /// 4.3 — frontend pages.
    FrontendPages,
    /// 4.4 — frontend components.
    FrontendComponents,
    /// 5 — configuration and deployment.
    Deployment,
}

impl Stage {
    /// All stages in pipeline order.
    pub const ALL: [Stage; 11] = [
        Self::Plan,
        Self::DatabaseSchema,
        Self::BackendCore,
        Self::BackendModels,
        Self::BackendRoutes,
        Self::BackendMiddleware,
        Self::FrontendSetup,
        Self::FrontendCore,
        Self::FrontendPages,
        Self::FrontendComponents,
        Self::Deployment,
    ];

    /// The stage number as printed in logs and advisories.
    pub fn id(self) -> &'static str {
        match self {
            Self::Plan => "1",
            Self::DatabaseSchema => "2",
            Self::BackendCore => "3.1",
            Self::BackendModels => "3.2",
            Self::BackendRoutes => "3.3",
            Self::BackendMiddleware => "3.4",
            Self::FrontendSetup => "4.1",
            Self::FrontendCore => "4.2",
            Self::FrontendPages => "4.3",
            Self::FrontendComponents => "4.4",
            Self::Deployment => "5",
        }
    }

    /// Stable snake_case name for metrics keys.
    pub fn name(self) -> &'static str {
        match self {
            Self::Plan => "architecture_plan",
            Self::DatabaseSchema => "database_schema",
            Self::BackendCore => "backend_core",
            Self::BackendModels => "backend_models",
            Self::BackendRoutes => "backend_routes",
            Self::BackendMiddleware => "backend_middleware",
            Self::FrontendSetup => "frontend_setup",
            Self::FrontendCore => "frontend_core",
            Self::FrontendPages => "frontend_pages",
            Self::FrontendComponents => "frontend_components",
            Self::Deployment => "deployment_config",
        }
    }

    /// Human-readable title used in advisories.
    pub fn title(self) -> &'static str {
        match self {
            Self::Plan => "architecture plan",
            Self::DatabaseSchema => "database schema",
            Self::BackendCore => "backend core",
            Self::BackendModels => "backend models",
            Self::BackendRoutes => "backend routes",
            Self::BackendMiddleware => "backend middleware/utilities",
            Self::FrontendSetup => "frontend setup",
            Self::FrontendCore => "frontend core",
            Self::FrontendPages => "frontend pages",
            Self::FrontendComponents => "frontend components",
            Self::Deployment => "configuration/deployment",
        }
    }

    /// Output token bound for this stage.
    pub fn max_tokens(self) -> u32 {
        match self {
            Self::Plan | Self::DatabaseSchema | Self::Deployment => 2000,
            Self::BackendCore | Self::BackendMiddleware | Self::FrontendSetup => 3000,
            Self::BackendModels | Self::FrontendCore | Self::FrontendComponents => 4000,
            Self::BackendRoutes | Self::FrontendPages => 5000,
        }
    }

    /// Whether the mockup image accompanies this stage's call.
    pub fn needs_image(self) -> bool {
        matches!(self, Self::Plan | Self::FrontendPages)
    }

    /// Expected file-count range, quoted to the model.
    pub fn expected_files(self) -> &'static str {
        match self {
            Self::Plan => "0",
            Self::DatabaseSchema => "3-5",
            Self::BackendCore => "3",
            Self::BackendModels => "4-8",
            Self::BackendRoutes => "5-10",
            Self::BackendMiddleware => "4-6",
            Self::FrontendSetup => "5",
            Self::FrontendCore => "5",
            Self::FrontendPages => "5-10",
            Self::FrontendComponents => "8-12",
            Self::Deployment => "5-7",
        }
    }
}

/// Concrete path prefixes for the chosen architecture.
///
/// These are quoted verbatim into stage prompts as example strings.
#[derive(Debug, Clone, Copy)]
pub struct PathPrefixes {
    /// Where backend source files live.
    pub backend: &'static str,
    /// Where frontend entry files (`main.*`, `App.*`) live.
    pub frontend_entry: &'static str,
    /// Where page components live.
    pub pages: &'static str,
    /// Where reusable components live.
    pub components: &'static str,
    /// Where hooks/composables live.
    pub hooks: &'static str,
    /// Where frontend utilities live.
    pub utils: &'static str,
}

/// The path layout dictated by an architecture.
pub fn path_prefixes(architecture: Architecture) -> PathPrefixes {
    match architecture {
        Architecture::Monolithic => PathPrefixes {
            backend: "src/server/",
            frontend_entry: "src/",
            pages: "src/client/pages/",
            components: "src/client/components/",
            hooks: "src/client/hooks/",
            utils: "src/client/utils/",
        },
        Architecture::Microservices => PathPrefixes {
            backend: "backend/",
            frontend_entry: "frontend/src/",
            pages: "frontend/src/pages/",
            components: "frontend/src/components/",
            hooks: "frontend/src/hooks/",
            utils: "frontend/src/utils/",
        },
    }
}

// ============================================================================
// System prompts
// ============================================================================

/// Build the system prompt for a stage.
pub fn system_prompt(stage: Stage, stack: &TechStack, project_name: &str) -> String {
    if stage == Stage::Plan {
        return plan_system_prompt();
    }

    let mut sections = vec![
        format!(
            "You are generating one slice of the project '{project_name}' \
             ({}). Other slices are generated separately; emit only the files \
             this stage owns.",
            stack.summary(),
        ),
        envelope_contract(),
        completeness_rules(),
        framework_block(stage, stack),
    ];

    sections.push(format!(
        "This stage: {}. Expected file count: {}.",
        stage_focus(stage),
        stage.expected_files(),
    ));

    sections.join("\n\n")
}

fn plan_system_prompt() -> String {
    "You are a software architect analyzing a UI mockup and a project \
     description. Respond with a single JSON object and nothing else:\n\
     {\n\
     \x20 \"app_type\": \"one-phrase category\",\n\
     \x20 \"pages\": [\"PageName\"],\n\
     \x20 \"components\": [\"ComponentName\"],\n\
     \x20 \"features\": {\"auth\": false, \"realtime\": false, \"file_upload\": false},\n\
     \x20 \"api_endpoints\": [\"GET /api/resource\"],\n\
     \x20 \"database_tables\": [\"table_name\"]\n\
     }\n\
     Every table and endpoint the finished app needs must appear here; later \
     generation steps implement exactly this plan and nothing else. Do not \
     generate any code."
        .to_string()
}

fn envelope_contract() -> String {
    "Respond with a single JSON object and nothing else. No prose, no \
     markdown fences. Schema:\n\
     {\n\
     \x20 \"files\": [{\"path\": \"relative/path\", \"content\": \"full file contents\", \"description\": \"one line\"}],\n\
     \x20 \"dependencies\": {\"frontend\": [], \"backend\": [], \"database\": []},\n\
     \x20 \"setup_instructions\": [\"step\"]\n\
     }\n\
     \"files\" is mandatory. Escape newlines in content as \\n."
        .to_string()
}

fn completeness_rules() -> String {
    "Every file must be complete and syntactically valid — no placeholders, \
     no TODO stubs, no elided bodies. Validate user input, parameterize \
     queries, keep secrets in environment variables."
        .to_string()
}

/// The framework templates this stage generates against, injected whole.
fn framework_block(stage: Stage, stack: &TechStack) -> String {
    let backend = templates::backend(stack.backend);
    let frontend = templates::frontend(stack.frontend);
    let database = templates::database(stack.database);

    match stage {
        Stage::Plan => String::new(),
        Stage::DatabaseSchema => format!(
            "Database requirements ({}):\n{}",
            stack.database, database.core_instructions,
        ),
        Stage::BackendCore
        | Stage::BackendModels
        | Stage::BackendRoutes
        | Stage::BackendMiddleware => format!(
            "Backend requirements ({}):\n{}\n\nDatabase requirements ({}):\n{}",
            stack.backend,
            backend.core_instructions,
            stack.database,
            database.core_instructions,
        ),
        Stage::FrontendSetup | Stage::FrontendCore => format!(
            "Frontend requirements ({}):\n{}",
            stack.frontend, frontend.core_instructions,
        ),
        Stage::FrontendPages | Stage::FrontendComponents => format!(
            "Frontend requirements ({}):\n{}\n\nStyling requirements:\n{}",
            stack.frontend, frontend.core_instructions, frontend.styling_requirements,
        ),
        Stage::Deployment => format!(
            "Frontend ({}):\n{}\n\nBackend ({}):\n{}\n\nDatabase ({}):\n{}",
            stack.frontend,
            frontend.core_instructions,
            stack.backend,
            backend.core_instructions,
            stack.database,
            database.core_instructions,
        ),
    }
}

fn stage_focus(stage: Stage) -> &'static str {
    match stage {
        Stage::Plan => "produce the architecture plan",
        Stage::DatabaseSchema => {
            "emit the database schema — table/collection definitions, \
             indexes, and a seed script"
        }
        Stage::BackendCore => {
            "emit the backend application entry point, configuration module, \
             and database connection setup"
        }
        Stage::BackendModels => {
            "emit one model/entity definition per database table from the \
             plan, plus their shared base if the framework uses one"
        }
        Stage::BackendRoutes => {
            "emit route/controller modules implementing every API endpoint \
             from the plan, grouped by resource"
        }
        Stage::BackendMiddleware => {
            "emit authentication middleware, error handling, and shared \
             backend utilities"
        }
        Stage::FrontendSetup => {
            "emit the frontend build scaffolding — package manifest, build \
             config, entry HTML, and global styles"
        }
        Stage::FrontendCore => {
            "emit the frontend entry point, app shell with routing, and the \
             typed API client pointing at the backend endpoints from the plan"
        }
        Stage::FrontendPages => {
            "emit one page component per page in the plan, matching the \
             mockup's layout"
        }
        Stage::FrontendComponents => {
            "emit the reusable components from the plan that the pages \
             compose"
        }
        Stage::Deployment => {
            "emit deployment and configuration files — container build, \
             environment examples, and a README with setup steps"
        }
    }
}

// ============================================================================
// User prompts
// ============================================================================

/// Build the user prompt for a stage.
///
/// `plan` is `None` only for stage 1. `backend_api` summarizes the backend
/// surface for the frontend stages that consume it.
pub fn user_prompt(
    stage: Stage,
    description: &str,
    stack: &TechStack,
    plan: Option<&ArchitecturePlan>,
    backend_api: Option<&str>,
) -> String {
    let mut out = format!("Project description:\n{description}\n");

    if let Some(plan) = plan {
        out.push_str("\nArchitecture plan:\n");
        out.push_str(&plan.summary());
        out.push('\n');
    }

    if let Some(api) = backend_api {
        if matches!(
            stage,
            Stage::FrontendCore | Stage::FrontendPages | Stage::FrontendComponents
        ) {
            out.push_str("\nBackend API surface:\n");
            out.push_str(api);
            out.push('\n');
        }
    }

    out.push_str(&layout_instructions(stage, stack));
    out
}

/// Concrete path-prefix examples for the stage, per architecture.
fn layout_instructions(stage: Stage, stack: &TechStack) -> String {
    let prefixes = path_prefixes(stack.architecture);
    let ext = stack.frontend.source_extension();

    match stage {
        Stage::Plan => String::new(),
        Stage::DatabaseSchema => {
            let dir = match stack.architecture {
                Architecture::Monolithic => "database/",
                Architecture::Microservices => "backend/database/",
            };
            format!(
                "\nPlace schema files under {dir} — for example {dir}schema.sql \
                 and {dir}seed.sql (or the idiomatic equivalent for the \
                 database)."
            )
        }
        Stage::BackendCore | Stage::BackendModels | Stage::BackendRoutes
        | Stage::BackendMiddleware => {
            let b = prefixes.backend;
            format!(
                "\nPlace every file under {b} — for example {b}main.py, \
                 {b}models/user.py, {b}routes/tasks.py (adjust names and \
                 extensions to the backend framework, keep the {b} prefix \
                 exactly)."
            )
        }
        Stage::FrontendSetup => {
            let root = match stack.architecture {
                Architecture::Monolithic => "",
                Architecture::Microservices => "frontend/",
            };
            format!(
                "\nPlace build scaffolding at the frontend root {root} — for \
                 example {root}package.json, {root}index.html, \
                 {root}vite.config.ts (adjust to the framework's build tool)."
            )
        }
        Stage::FrontendCore => {
            let e = prefixes.frontend_entry;
            let u = prefixes.utils;
            format!(
                "\nPlace entry files as {e}main.{ext} and {e}App.{ext}, and \
                 the API client under {u} — for example {u}api.ts. Keep these \
                 prefixes exactly."
            )
        }
        Stage::FrontendPages => {
            let p = prefixes.pages;
            format!(
                "\nPlace one file per page under {p} — for example \
                 {p}Dashboard.{ext} and {p}Login.{ext}. Keep the {p} prefix \
                 exactly."
            )
        }
        Stage::FrontendComponents => {
            let c = prefixes.components;
            let h = prefixes.hooks;
            format!(
                "\nPlace components under {c} — for example {c}TaskCard.{ext} \
                 — and hooks under {h} — for example {h}useTasks.ts. Keep \
                 these prefixes exactly."
            )
        }
        Stage::Deployment => {
            let note = match stack.architecture {
                Architecture::Monolithic => {
                    "Top-level files (Dockerfile, docker-compose.yml, \
                     .env.example, README.md) live at the repository root."
                }
                Architecture::Microservices => {
                    "Each service gets its own Dockerfile (backend/Dockerfile, \
                     frontend/Dockerfile); docker-compose.yml, .env.example, \
                     and README.md live at the repository root."
                }
            };
            format!("\n{note}")
        }
    }
}
