//! The chained generation engine: eleven bounded LLM calls whose outputs are
//! threaded forward as context.
//!
//! Failure semantics: a stage whose call fails (after the provider's own
//! retries) or whose envelope cannot be recovered is recorded as empty and
//! the pipeline continues — except stage 1, whose plan every later stage
//! consumes; without a plan the request fails. The final response enumerates
//! empty stages as advisories in `setup_instructions`.

use std::sync::Arc;

use rand::Rng;

use super::plan::ArchitecturePlan;
use super::stages::{self, Stage};
use super::{GenerationRequest, GenerationResponse, ResponseAccumulator};
use crate::error::GenerationError;
use crate::llm::{GenerationParams, LlmProvider, TokenUsage};
use crate::validate::{self, ValidationReport};

/// Per-stage outcome, surfaced for metrics and logging.
#[derive(Debug, Clone)]
pub struct StageReport {
    /// Stage number ("1", "3.2", …).
    pub stage_id: &'static str,
    /// Stable stage name for metrics keys.
    pub stage_name: &'static str,
    /// Files this stage contributed (after deduplication).
    pub files: usize,
    /// True when the stage produced no usable output.
    pub failed: bool,
    /// The failure, when there was one.
    pub error: Option<String>,
    /// Token usage for this stage's call.
    pub usage: TokenUsage,
}

/// Everything a completed chained run produced.
#[derive(Debug)]
pub struct ChainedOutcome {
    /// The merged response.
    pub response: GenerationResponse,
    /// Per-stage reports in pipeline order.
    pub stages: Vec<StageReport>,
    /// Duplicate paths dropped during merging.
    pub duplicate_paths: usize,
    /// Aggregate token usage across all calls.
    pub usage: TokenUsage,
    /// The syntax validation report over the merged file list.
    pub validation: ValidationReport,
    /// The model that served the run (from the last successful call).
    pub model: String,
}

/// Drives the 11-stage pipeline against an [`LlmProvider`].
pub struct ChainedEngine {
    provider: Arc<dyn LlmProvider>,
    temperature: f32,
    stage_timeout_secs: u64,
}

impl ChainedEngine {
    /// Create an engine over the given provider.
    pub fn new(provider: Arc<dyn LlmProvider>, temperature: f32, stage_timeout_secs: u64) -> Self {
        Self {
            provider,
            temperature,
            stage_timeout_secs,
        }
    }

    fn params_for(&self, stage: Stage) -> GenerationParams {
        GenerationParams {
            max_tokens: stage.max_tokens(),
            temperature: self.temperature,
            timeout_secs: self.stage_timeout_secs,
        }
    }

    /// Run the full pipeline.
    ///
    /// Stages execute strictly in order; each sees the plan plus whatever
    /// earlier stages declared. Returns an error only when stage 1 fails or
    /// when every code stage came back empty.
    pub async fn run(
        &self,
        request: &GenerationRequest,
    ) -> Result<ChainedOutcome, GenerationError> {
        let run_id: String = {
            let mut rng = rand::thread_rng();
            (0..8)
                .map(|_| format!("{:x}", rng.gen_range(0..16)))
                .collect()
        };

        tracing::info!(
            run_id = %run_id,
            project = %request.project_name,
            stack = %request.stack.summary(),
            "starting chained generation",
        );

        let mut usage = TokenUsage::default();
        let mut stage_reports = Vec::with_capacity(Stage::ALL.len());
        let mut model = String::new();

        // Stage 1: the plan. Without it nothing downstream can run.
        let plan = {
            let stage = Stage::Plan;
            let system = stages::system_prompt(stage, &request.stack, &request.project_name);
            let user = stages::user_prompt(
                stage,
                &request.description,
                &request.stack,
                None,
                None,
            );
            let response = self
                .provider
                .complete(
                    &system,
                    &user,
                    request.image.as_ref().filter(|_| stage.needs_image()),
                    &self.params_for(stage),
                )
                .await
                .map_err(|source| GenerationError::PlanFailed { source })?;

            usage.accumulate(&response.usage);
            model = response.model.clone();

            let plan = ArchitecturePlan::from_text(&response.text)
                .map_err(|source| GenerationError::PlanFailed { source })?;

            tracing::info!(
                run_id = %run_id,
                pages = plan.pages.len(),
                endpoints = plan.api_endpoints.len(),
                tables = plan.database_tables.len(),
                "architecture plan ready",
            );

            stage_reports.push(StageReport {
                stage_id: stage.id(),
                stage_name: stage.name(),
                files: 0,
                failed: false,
                error: None,
                usage: response.usage,
            });

            plan
        };

        let mut acc = ResponseAccumulator::default();

        for stage in Stage::ALL.into_iter().skip(1) {
            let system = stages::system_prompt(stage, &request.stack, &request.project_name);
            let backend_api = backend_api_summary(&plan, &acc, &request.stack);
            let user = stages::user_prompt(
                stage,
                &request.description,
                &request.stack,
                Some(&plan),
                Some(&backend_api),
            );

            let result = self
                .provider
                .complete(
                    &system,
                    &user,
                    request.image.as_ref().filter(|_| stage.needs_image()),
                    &self.params_for(stage),
                )
                .await;

            let report = match result {
                Ok(response) => {
                    usage.accumulate(&response.usage);
                    if !response.model.is_empty() {
                        model = response.model.clone();
                    }
                    match crate::llm::envelope::Envelope::from_text(&response.text) {
                        Ok(envelope) if !envelope.files.is_empty() => {
                            let before = acc.file_count();
                            acc.absorb(envelope);
                            let contributed = acc.file_count() - before;
                            tracing::info!(
                                run_id = %run_id,
                                stage = stage.id(),
                                files = contributed,
                                "stage complete",
                            );
                            StageReport {
                                stage_id: stage.id(),
                                stage_name: stage.name(),
                                files: contributed,
                                failed: false,
                                error: None,
                                usage: response.usage,
                            }
                        }
                        Ok(_) => {
                            tracing::warn!(
                                run_id = %run_id,
                                stage = stage.id(),
                                "stage returned an empty file list",
                            );
                            StageReport {
                                stage_id: stage.id(),
                                stage_name: stage.name(),
                                files: 0,
                                failed: true,
                                error: Some("envelope carried no files".to_string()),
                                usage: response.usage,
                            }
                        }
                        Err(err) => {
                            tracing::warn!(
                                run_id = %run_id,
                                stage = stage.id(),
                                error = %err,
                                "stage envelope unrecoverable, recording empty stage",
                            );
                            StageReport {
                                stage_id: stage.id(),
                                stage_name: stage.name(),
                                files: 0,
                                failed: true,
                                error: Some(err.to_string()),
                                usage: response.usage,
                            }
                        }
                    }
                }
                Err(err) => {
                    tracing::error!(
                        run_id = %run_id,
                        stage = stage.id(),
                        error = %err,
                        "stage call failed, recording empty stage",
                    );
                    StageReport {
                        stage_id: stage.id(),
                        stage_name: stage.name(),
                        files: 0,
                        failed: true,
                        error: Some(err.to_string()),
                        usage: TokenUsage::default(),
                    }
                }
            };

            stage_reports.push(report);
        }

        if acc.file_count() == 0 {
            return Err(GenerationError::NoOutput);
        }

        let mut advisories: Vec<String> = stage_reports
            .iter()
            .filter(|r| r.failed)
            .map(|r| {
                format!(
                    "Note: stage {} ({}) produced no output; its files are missing from this project.",
                    r.stage_id,
                    Stage::ALL
                        .iter()
                        .find(|s| s.id() == r.stage_id)
                        .map_or(r.stage_name, |s| s.title()),
                )
            })
            .collect();

        let validation = validate::validate_files(acc.files());
        if let Some(line) = validation.advisory() {
            advisories.push(line);
        }

        let failed_stages = stage_reports.iter().filter(|r| r.failed).count();
        let message = if failed_stages == 0 {
            format!(
                "Generated {} files across {} stages.",
                acc.file_count(),
                Stage::ALL.len(),
            )
        } else {
            format!(
                "Generated {} files across {} stages ({failed_stages} stages produced no output).",
                acc.file_count(),
                Stage::ALL.len(),
            )
        };

        let duplicate_paths = acc.duplicate_paths();
        let response = acc.finish(true, message, advisories);

        tracing::info!(
            run_id = %run_id,
            files = response.files.len(),
            duplicates = duplicate_paths,
            input_tokens = usage.input_tokens,
            output_tokens = usage.output_tokens,
            "chained generation complete",
        );

        Ok(ChainedOutcome {
            response,
            stages: stage_reports,
            duplicate_paths,
            usage,
            validation,
            model,
        })
    }
}

/// Summarize the backend surface for frontend stages: the planned endpoints
/// plus the backend files generated so far.
fn backend_api_summary(
    plan: &ArchitecturePlan,
    acc: &ResponseAccumulator,
    stack: &crate::stack::TechStack,
) -> String {
    let prefixes = stages::path_prefixes(stack.architecture);
    let backend_files: Vec<&str> = acc
        .files()
        .iter()
        .map(|f| f.path.as_str())
        .filter(|p| p.starts_with(prefixes.backend))
        .collect();

    let mut out = String::new();
    if plan.api_endpoints.is_empty() {
        out.push_str("Endpoints: (none planned)");
    } else {
        out.push_str("Endpoints:\n");
        for endpoint in &plan.api_endpoints {
            out.push_str("- ");
            out.push_str(endpoint);
            out.push('\n');
        }
    }
    if !backend_files.is_empty() {
        out.push_str("Implemented backend files:\n");
        for path in backend_files {
            out.push_str("- ");
            out.push_str(path);
            out.push('\n');
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LlmError;
    use crate::llm::LlmResponse;
    use crate::stack::TechStack;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Scripted provider: one canned result per pipeline call, in order.
    struct ScriptedProvider {
        script: Vec<Result<String, u16>>,
        calls: AtomicUsize,
    }

    impl ScriptedProvider {
        fn new(script: Vec<Result<String, u16>>) -> Self {
            Self {
                script,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait::async_trait]
    impl LlmProvider for ScriptedProvider {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn complete(
            &self,
            _system: &str,
            _user: &str,
            _image: Option<&crate::image::ImageAttachment>,
            _params: &GenerationParams,
        ) -> Result<LlmResponse, LlmError> {
            let idx = self.calls.fetch_add(1, Ordering::SeqCst);
            match self.script.get(idx) {
                Some(Ok(text)) => Ok(LlmResponse {
                    text: text.clone(),
                    usage: TokenUsage {
                        input_tokens: 100,
                        output_tokens: 50,
                    },
                    model: "scripted-model".to_string(),
                }),
                Some(Err(status)) => Err(LlmError::Api {
                    status: *status,
                    message: "scripted failure".to_string(),
                }),
                None => panic!("pipeline made more calls than scripted"),
            }
        }

        async fn health_check(&self) -> Result<(), LlmError> {
            Ok(())
        }
    }

    fn plan_json() -> String {
        r#"{
            "app_type": "task app",
            "pages": ["Dashboard", "Login"],
            "components": ["TaskCard"],
            "features": {"auth": true},
            "api_endpoints": ["GET /api/tasks", "POST /api/tasks"],
            "database_tables": ["users", "tasks"]
        }"#
        .to_string()
    }

    fn files_json(paths: &[&str]) -> String {
        let files: Vec<serde_json::Value> = paths
            .iter()
            .map(|p| serde_json::json!({"path": p, "content": format!("# {p}"), "description": ""}))
            .collect();
        serde_json::json!({ "files": files }).to_string()
    }

    fn request() -> GenerationRequest {
        GenerationRequest {
            image: None,
            description: "a task manager with authentication".to_string(),
            stack: TechStack::parse("react", "fastapi", "postgresql", None).unwrap(),
            project_name: "task-manager".to_string(),
            custom_prompt: None,
        }
    }

    fn full_script() -> Vec<Result<String, u16>> {
        vec![
            Ok(plan_json()),
            Ok(files_json(&["database/schema.sql", "database/seed.sql", "database/indexes.sql"])),
            Ok(files_json(&[
                "src/server/main.py",
                "src/server/config.py",
                "src/server/db.py",
            ])),
            Ok(files_json(&["src/server/models/user.py", "src/server/models/task.py"])),
            Ok(files_json(&["src/server/routes/auth.py", "src/server/routes/tasks.py"])),
            Ok(files_json(&["src/server/middleware/auth.py", "src/server/utils/errors.py"])),
            Ok(files_json(&["package.json", "index.html", "vite.config.ts"])),
            Ok(files_json(&["src/main.tsx", "src/App.tsx", "src/client/utils/api.ts"])),
            Ok(files_json(&["src/client/pages/Dashboard.tsx", "src/client/pages/Login.tsx"])),
            Ok(files_json(&["src/client/components/TaskCard.tsx"])),
            Ok(files_json(&["Dockerfile", "docker-compose.yml", "README.md"])),
        ]
    }

    fn engine(script: Vec<Result<String, u16>>) -> ChainedEngine {
        ChainedEngine::new(Arc::new(ScriptedProvider::new(script)), 0.7, 60)
    }

    #[tokio::test]
    async fn full_pipeline_merges_all_stages() {
        let outcome = engine(full_script()).run(&request()).await.expect("run");

        assert!(outcome.response.success);
        assert_eq!(outcome.stages.len(), 11);
        assert!(outcome.stages.iter().all(|s| !s.failed));
        assert_eq!(outcome.response.files.len(), 24);
        assert_eq!(outcome.duplicate_paths, 0);
        // 11 calls × (100 in, 50 out)
        assert_eq!(outcome.usage.input_tokens, 1100);
        assert_eq!(outcome.usage.output_tokens, 550);
        assert_eq!(outcome.model, "scripted-model");
        // No advisory when everything succeeded and validated.
        assert!(outcome
            .response
            .setup_instructions
            .iter()
            .all(|s| !s.starts_with("Note: stage")));
    }

    #[tokio::test]
    async fn stage_two_failure_is_recovered_with_advisory() {
        let mut script = full_script();
        script[1] = Err(503);
        let outcome = engine(script).run(&request()).await.expect("run");

        assert!(outcome.response.success);
        let db_stage = &outcome.stages[1];
        assert!(db_stage.failed);
        assert_eq!(db_stage.stage_id, "2");
        assert!(outcome
            .response
            .files
            .iter()
            .all(|f| !f.path.starts_with("database/")));
        // The advisory opens setup_instructions.
        assert!(outcome.response.setup_instructions[0]
            .contains("stage 2 (database schema) produced no output"));
        assert!(outcome.response.message.contains("1 stages produced no output"));
    }

    #[tokio::test]
    async fn plan_failure_aborts_pipeline() {
        let err = engine(vec![Err(500)]).run(&request()).await.unwrap_err();
        assert!(matches!(err, GenerationError::PlanFailed { .. }));
    }

    #[tokio::test]
    async fn unparseable_plan_aborts_pipeline() {
        let err = engine(vec![Ok("I cannot analyze this mockup.".to_string())])
            .run(&request())
            .await
            .unwrap_err();
        assert!(matches!(err, GenerationError::PlanFailed { .. }));
    }

    #[tokio::test]
    async fn malformed_stage_envelope_becomes_empty_stage() {
        let mut script = full_script();
        script[4] = Ok("here are the routes you asked for!".to_string());
        let outcome = engine(script).run(&request()).await.expect("run");

        let routes_stage = &outcome.stages[4];
        assert_eq!(routes_stage.stage_id, "3.3");
        assert!(routes_stage.failed);
        assert!(outcome.response.success);
    }

    #[tokio::test]
    async fn all_stages_empty_is_no_output_error() {
        let mut script: Vec<Result<String, u16>> = vec![Ok(plan_json())];
        script.extend(std::iter::repeat_with(|| Err(500)).take(10));
        let err = engine(script).run(&request()).await.unwrap_err();
        assert!(matches!(err, GenerationError::NoOutput));
    }

    #[tokio::test]
    async fn duplicate_paths_across_stages_first_write_wins() {
        let mut script = full_script();
        // Frontend components stage re-declares a page file.
        script[9] = Ok(files_json(&[
            "src/client/pages/Dashboard.tsx",
            "src/client/components/TaskCard.tsx",
        ]));
        let outcome = engine(script).run(&request()).await.expect("run");

        assert_eq!(outcome.duplicate_paths, 1);
        let count = outcome
            .response
            .files
            .iter()
            .filter(|f| f.path == "src/client/pages/Dashboard.tsx")
            .count();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn fenced_stage_output_is_recovered() {
        let mut script = full_script();
        script[10] = Ok(format!(
            "```json\n{}\n```",
            files_json(&["Dockerfile", "README.md"])
        ));
        let outcome = engine(script).run(&request()).await.expect("run");
        assert!(outcome.stages[10].files == 2);
    }

    #[tokio::test]
    async fn broken_generated_js_yields_validation_advisory() {
        let mut script = full_script();
        script[7] = Ok(serde_json::json!({
            "files": [{"path": "src/main.tsx", "content": "const a = (1 + ;", "description": ""}]
        })
        .to_string());
        let outcome = engine(script).run(&request()).await.expect("run");

        assert!(!outcome.validation.valid);
        assert!(outcome
            .response
            .setup_instructions
            .iter()
            .any(|s| s.contains("failed syntax validation")));
        // The broken file is still returned.
        assert!(outcome
            .response
            .files
            .iter()
            .any(|f| f.path == "src/main.tsx"));
    }
}
