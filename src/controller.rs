//! Per-session state machine behind the web form.
//!
//! `AwaitingKey -> AwaitingProfile -> PlansReady`, with the Q&A loop as a
//! self-transition on `PlansReady`. Every failure leaves the session context
//! exactly as it was before the action.

use std::sync::Arc;
use tracing::{info, warn};

use crate::agent::{self, follow_up_prompt};
use crate::error::{ActionError, ConfigError, ValidationError};
use crate::model::{ModelClient, ModelClientFactory};
use crate::plan::{format_diet, format_fitness};
use crate::profile::{ProfileForm, UserProfile};
use crate::secrets::{GLM_API_KEY_SECRET, SecretStore};
use crate::session::{QaEntry, SessionContext};

const EMPTY_ANSWER_FALLBACK: &str = "抱歉，目前暂时无法生成回复。";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    AwaitingKey,
    AwaitingProfile,
    PlansReady,
}

pub struct Controller {
    factory: Arc<dyn ModelClientFactory>,
    secrets: Arc<dyn SecretStore>,
    client: Option<Arc<dyn ModelClient>>,
    context: SessionContext,
    profile_form: ProfileForm,
}

impl Controller {
    pub fn new(factory: Arc<dyn ModelClientFactory>, secrets: Arc<dyn SecretStore>) -> Self {
        Self {
            factory,
            secrets,
            client: None,
            context: SessionContext::new(),
            profile_form: ProfileForm::default(),
        }
    }

    pub fn phase(&self) -> Phase {
        match (&self.client, self.context.plans_generated()) {
            (None, _) => Phase::AwaitingKey,
            (Some(_), false) => Phase::AwaitingProfile,
            (Some(_), true) => Phase::PlansReady,
        }
    }

    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    /// The profile fields as last submitted, so the form keeps its values
    /// across later actions.
    pub fn profile_form(&self) -> &ProfileForm {
        &self.profile_form
    }

    pub fn remember_profile_form(&mut self, form: ProfileForm) {
        self.profile_form = form;
    }

    /// Accepts the key typed into the form. A key from the secret store, when
    /// present, is used in its place.
    pub fn submit_key(&mut self, form_key: &str) -> Result<(), ActionError> {
        if form_key.trim().is_empty() {
            return Err(ConfigError::MissingApiKey.into());
        }

        let api_key = self
            .secrets
            .get_secret(GLM_API_KEY_SECRET)
            .unwrap_or_else(|| form_key.trim().to_string());
        let client = self.factory.build(&api_key).inspect_err(|err| {
            warn!(error = %err, "failed to initialize model client");
        })?;

        self.client = Some(client);
        info!(phase = ?self.phase(), "api key accepted");
        Ok(())
    }

    /// Runs the diet agent, then the fitness agent, and installs both plans
    /// only if both calls succeed.
    pub async fn generate(&mut self, profile: &UserProfile) -> Result<(), ActionError> {
        let client = self.client.clone().ok_or(ConfigError::MissingApiKey)?;
        let prompt = profile.to_prompt();

        let diet_text = agent::dietary_expert(client.clone()).run(&prompt).await?;
        let fitness_text = agent::fitness_expert(client).run(&prompt).await?;

        self.context
            .install_plans(format_diet(diet_text), format_fitness(fitness_text));
        info!(
            goal = profile.fitness_goal.label(),
            diet = profile.dietary_preference.label(),
            "plans generated"
        );
        Ok(())
    }

    /// The Q&A loop. Only available once plans exist.
    pub fn qa(&mut self) -> Option<QaLoop<'_>> {
        let client = self.client.clone()?;
        let plans = self.context.plans()?;
        let diet_body = plans.diet.body.clone();
        let fitness_body = plans.fitness.body.clone();
        Some(QaLoop {
            client,
            diet_body,
            fitness_body,
            context: &mut self.context,
        })
    }

    /// Drops plans and history but keeps the accepted key.
    pub fn start_over(&mut self) {
        self.context.reset();
        info!("session context reset");
    }
}

pub struct QaLoop<'a> {
    client: Arc<dyn ModelClient>,
    diet_body: String,
    fitness_body: String,
    context: &'a mut SessionContext,
}

impl QaLoop<'_> {
    /// Asks one follow-up question. Appends exactly one entry on success and
    /// none on failure.
    pub async fn ask(&mut self, question: &str) -> Result<&QaEntry, ActionError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(ValidationError::EmptyQuestion.into());
        }

        let prompt = follow_up_prompt(&self.diet_body, &self.fitness_body, question);
        let answer = agent::plan_assistant(self.client.clone())
            .run(&prompt)
            .await?;
        let answer = if answer.trim().is_empty() {
            EMPTY_ANSWER_FALLBACK.to_string()
        } else {
            answer
        };

        info!(question_len = question.len(), "follow-up question answered");
        Ok(self.context.push_qa(question.to_string(), answer))
    }
}
