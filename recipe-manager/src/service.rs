//! Aggregation orchestration
//!
//! `ResolvePans → FetchRecipe → Balance`. The calculator and balancer stages are
//! reached through traits so the same orchestration runs against the in-process
//! engine or a remote `recipe-engine`. Every stage and every aggregation is
//! timed into the service's [`RecipeMetrics`].

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use recipe_common::api::PanRequest;
use recipe_common::http::CorrelationId;
use recipe_common::{
    total_pans_area, Error, IngredientsBalancer, Pans, Recipe, RecipeAggregate, Result,
};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::metrics::{NoopMetrics, RecipeMetrics};

/// Source of stored recipes
#[async_trait]
pub trait RecipeRepository: Send + Sync {
    /// Fetch one recipe; `RecipeNotFound` when absent
    async fn get_recipe_by_uuid(&self, uuid: Uuid) -> Result<Recipe>;
}

/// Pan aggregation stage
#[async_trait]
pub trait CalculatorService: Send + Sync {
    async fn total_pans_area(&self, ctx: &CorrelationId, request: &PanRequest) -> Result<Pans>;
}

/// Balancing stage
#[async_trait]
pub trait BalancerService: Send + Sync {
    async fn balance(
        &self,
        ctx: &CorrelationId,
        recipe: &Recipe,
        pans: &Pans,
    ) -> Result<RecipeAggregate>;
}

/// In-process calculator
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalCalculator;

#[async_trait]
impl CalculatorService for LocalCalculator {
    async fn total_pans_area(&self, _ctx: &CorrelationId, request: &PanRequest) -> Result<Pans> {
        total_pans_area(&request.pans)
    }
}

/// In-process balancer
#[derive(Debug, Clone, Default)]
pub struct LocalBalancer {
    balancer: IngredientsBalancer,
}

impl LocalBalancer {
    pub fn new(balancer: IngredientsBalancer) -> Self {
        Self { balancer }
    }
}

#[async_trait]
impl BalancerService for LocalBalancer {
    async fn balance(
        &self,
        _ctx: &CorrelationId,
        recipe: &Recipe,
        pans: &Pans,
    ) -> Result<RecipeAggregate> {
        self.balancer.balance(recipe, pans)
    }
}

/// Orchestration stage, used to label failures in logs and metrics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    ResolvePans,
    FetchRecipe,
    Balance,
}

impl Stage {
    /// The dependency the stage calls
    pub fn metric_label(self) -> &'static str {
        match self {
            Stage::ResolvePans => "calculator",
            Stage::FetchRecipe => "database",
            Stage::Balance => "balancer",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::ResolvePans => "resolve_pans",
            Stage::FetchRecipe => "fetch_recipe",
            Stage::Balance => "balance",
        };
        f.write_str(name)
    }
}

fn stage_failed(stage: Stage, err: Error) -> Error {
    warn!(stage = %stage, code = err.code(), "Aggregation failed: {}", err);
    err
}

/// Recipe lookup and aggregation, shared by all HTTP handlers
pub struct RecipeService {
    repository: Arc<dyn RecipeRepository>,
    calculator: Arc<dyn CalculatorService>,
    balancer: Arc<dyn BalancerService>,
    metrics: Arc<dyn RecipeMetrics>,
}

impl RecipeService {
    pub fn new(
        repository: Arc<dyn RecipeRepository>,
        calculator: Arc<dyn CalculatorService>,
        balancer: Arc<dyn BalancerService>,
    ) -> Self {
        Self {
            repository,
            calculator,
            balancer,
            metrics: Arc::new(NoopMetrics),
        }
    }

    /// Record stage and aggregation measurements into `metrics`
    pub fn with_metrics(mut self, metrics: Arc<dyn RecipeMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn metrics(&self) -> &Arc<dyn RecipeMetrics> {
        &self.metrics
    }

    /// Service backed by the in-process engine
    pub fn local(repository: Arc<dyn RecipeRepository>, balancer: IngredientsBalancer) -> Self {
        Self::new(
            repository,
            Arc::new(LocalCalculator),
            Arc::new(LocalBalancer::new(balancer)),
        )
    }

    /// Unscaled stored recipe
    pub async fn get_recipe(&self, uuid: Uuid) -> Result<Recipe> {
        let start = Instant::now();
        let result = self.repository.get_recipe_by_uuid(uuid).await;
        self.metrics
            .record_stage(Stage::FetchRecipe, start.elapsed(), result.as_ref().err());
        result
    }

    /// Run one stage, recording its duration and outcome
    async fn stage<T>(&self, stage: Stage, call: impl Future<Output = Result<T>>) -> Result<T> {
        let start = Instant::now();
        let result = call.await;
        self.metrics
            .record_stage(stage, start.elapsed(), result.as_ref().err());
        result.map_err(|e| stage_failed(stage, e))
    }

    /// Scale the stored recipe `uuid` to the requested pans
    ///
    /// Pans are resolved before the recipe is fetched, so a bad pan request never
    /// touches the repository. The first failing stage's error is returned as is.
    pub async fn aggregate(
        &self,
        ctx: &CorrelationId,
        uuid: Uuid,
        request: &PanRequest,
    ) -> Result<RecipeAggregate> {
        let start = Instant::now();
        let result = self.run_aggregate(ctx, uuid, request).await;
        self.metrics
            .record_aggregation(start.elapsed(), result.as_ref().err());
        result
    }

    async fn run_aggregate(
        &self,
        ctx: &CorrelationId,
        uuid: Uuid,
        request: &PanRequest,
    ) -> Result<RecipeAggregate> {
        let pans = self
            .stage(
                Stage::ResolvePans,
                self.calculator.total_pans_area(ctx, request),
            )
            .await?;
        debug!(
            pans = pans.pans.len(),
            total_area = pans.total_area,
            "Pans resolved"
        );

        let recipe = self
            .stage(Stage::FetchRecipe, self.repository.get_recipe_by_uuid(uuid))
            .await?;
        debug!(recipe = %recipe.uuid, name = %recipe.name, "Recipe fetched");

        let aggregate = self
            .stage(Stage::Balance, self.balancer.balance(ctx, &recipe, &pans))
            .await?;
        debug!(
            dough_total = aggregate.recipe.dough.total(),
            "Recipe balanced"
        );

        Ok(aggregate)
    }
}
