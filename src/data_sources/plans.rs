//! `equinix_metal_plans`

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

use super::filter::{self, filter_block, sort_block};
use super::{merge, DataSource};
use crate::error::ProviderError;
use crate::metal::models::Plan;
use crate::metal::MetalClient;
use crate::schema::{Attribute, AttributeType, Diagnostic, Schema};

/// Server plans, filtered and sorted.
pub struct PlansDataSource;

/// Flatten a plan into a filterable record.
pub(crate) fn plan_record(plan: &Plan) -> Value {
    json!({
        "id": plan.id,
        "slug": plan.slug,
        "name": plan.name,
        "description": plan.description,
        "line": plan.line,
        "legacy": plan.legacy,
        "class": plan.class,
        "pricing_hour": plan.pricing.hour,
        "pricing_month": plan.pricing.month,
        "deployment_types": plan.deployment_types,
        "available_in": plan.available_in.iter().map(|l| l.code.clone()).collect::<Vec<_>>(),
        "available_in_metros": plan.available_in_metros.iter().map(|l| l.code.clone()).collect::<Vec<_>>(),
    })
}

#[async_trait]
impl DataSource for PlansDataSource {
    fn type_name(&self) -> &'static str {
        "equinix_metal_plans"
    }

    fn schema(&self) -> Schema {
        Schema::v0()
            .with_description("Server plans matching the filters.")
            .with_attribute("id", Attribute::computed_string())
            .with_attribute(
                "plans",
                Attribute::computed_object_list([
                    ("id", AttributeType::String),
                    ("slug", AttributeType::String),
                    ("name", AttributeType::String),
                    ("description", AttributeType::String),
                    ("line", AttributeType::String),
                    ("legacy", AttributeType::Bool),
                    ("class", AttributeType::String),
                    ("pricing_hour", AttributeType::Float64),
                    ("pricing_month", AttributeType::Float64),
                    ("deployment_types", AttributeType::list(AttributeType::String)),
                    ("available_in", AttributeType::list(AttributeType::String)),
                    ("available_in_metros", AttributeType::list(AttributeType::String)),
                ]),
            )
            .with_block("filter", filter_block())
            .with_block("sort", sort_block())
    }

    fn validate(&self, config: &Value) -> Vec<Diagnostic> {
        let mut diagnostics = crate::validation::validate(&self.schema(), config);
        if let Err(e) = filter::parse_filters(config) {
            diagnostics.push(Diagnostic::error(e.to_string()).with_attribute("filter"));
        }
        if let Err(e) = filter::parse_sorts(config) {
            diagnostics.push(Diagnostic::error(e.to_string()).with_attribute("sort"));
        }
        diagnostics
    }

    async fn read(&self, client: &MetalClient, config: &Value) -> Result<Value, ProviderError> {
        let filters = filter::parse_filters(config)?;
        let sorts = filter::parse_sorts(config)?;

        let records: Vec<Value> = client.list_plans().await?.iter().map(plan_record).collect();
        let total = records.len();
        let plans = filter::apply(records, &filters, &sorts);
        debug!(total, matched = plans.len(), "filtered plans");

        Ok(merge(config, json!({ "id": "equinix_metal_plans", "plans": plans })))
    }
}
