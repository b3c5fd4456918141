use super::RequestArgs;
use crate::distribution::DistributionPlan;
use corpus_templates::Registry;
use schemars::JsonSchema;
use serde::Serialize;

/// JSON output for the plan command
#[derive(Serialize, JsonSchema)]
pub(crate) struct PlanJsonOutput {
    family: String,
    tier: String,
    total_count: u64,
    batch_size: usize,
    batches: u64,
    streaming: bool,
    shuffle: bool,
    plan: DistributionPlan,
}

pub fn run(args: RequestArgs, json: bool) -> anyhow::Result<()> {
    let request = args.to_request()?;
    let registry = Registry::with_builtin_families();
    let plan = request.plan(&registry)?;
    let batches = plan.batch_count(request.batch_size);
    let shuffle = request.shuffles() && !registry.family(&request.family)?.ordered();

    if json {
        let output = PlanJsonOutput {
            family: request.family.clone(),
            tier: request.tier.to_string(),
            total_count: request.total_count,
            batch_size: request.batch_size,
            batches,
            streaming: request.is_streaming(),
            shuffle,
            plan,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!(
        "Distribution plan for {} {} documents ({}):",
        request.total_count, request.family, request.tier
    );
    let width = plan.tiers().map(str::len).max().unwrap_or(0);
    for allocation in &plan {
        let share = if request.total_count > 0 {
            allocation.count as f64 * 100.0 / request.total_count as f64
        } else {
            0.0
        };
        println!(
            "  {:<width$}  {:>10}  ({:.1}%)",
            allocation.tier,
            allocation.count,
            share,
            width = width
        );
    }
    println!();
    println!(
        "Batches: {} (batch size {})",
        batches, request.batch_size
    );
    let mode = if request.is_streaming() {
        "streaming, tier order"
    } else if shuffle {
        "in-memory, shuffled"
    } else {
        "in-memory, tier order"
    };
    println!("Mode: {}", mode);
    Ok(())
}
