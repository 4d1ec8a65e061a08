use super::ui;
use crate::core::allocation::{AllocationPlan, Allocator, Category};
use crate::core::cache::QuoteCache;
use crate::core::config::AppConfig;
use crate::providers::alpha_vantage::AlphaVantageProvider;
use crate::providers::resolver::CachingPriceResolver;
use crate::store::{DiskStore, MemoryStore};
use anyhow::Result;
use comfy_table::Cell;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

pub async fn run(config: &AppConfig) -> Result<()> {
    let cache = open_cache(config);

    let (base_url, api_key) = config.providers.alpha_vantage.as_ref().map_or(
        ("https://www.alphavantage.co", ""),
        |p| (p.base_url.as_str(), p.api_key.as_str()),
    );
    let provider = AlphaVantageProvider::new(base_url, api_key);

    let resolver = CachingPriceResolver::new(
        provider,
        cache,
        Duration::from_secs(config.cache.ttl_secs),
    );

    let categories = config.planned_categories();
    let settings = config.allocation_settings();

    let pb = ui::new_progress_bar(categories.len() as u64, true);
    pb.set_message("Fetching quotes...");
    let allocator = Allocator::new(&resolver, &settings);
    let plan = allocator.plan(&categories, &|| pb.inc(1)).await;
    pb.finish_and_clear();

    display_plan(&plan, &categories);
    Ok(())
}

/// Opens the persistent quote store, degrading to an in-memory store when
/// the disk cannot be used.
fn open_cache(config: &AppConfig) -> Arc<dyn QuoteCache> {
    let disk = config
        .default_data_path()
        .and_then(|path| DiskStore::open(&path.join("cache")));
    match disk {
        Ok(store) => Arc::new(store),
        Err(e) => {
            warn!("Quote cache unavailable, prices will not persist: {e}");
            Arc::new(MemoryStore::new())
        }
    }
}

fn display_plan(plan: &AllocationPlan, categories: &[Category]) {
    display_funds_summary(plan);
    display_categories(categories);
    display_allocations(plan);
    display_investment_summary(plan);

    if plan.overspent() {
        println!(
            "\n{}",
            ui::style_text(
                "Warning: the total investment value exceeds the total funds available!",
                ui::StyleType::Warning
            )
        );
    }

    if !plan.skipped.is_empty() {
        println!("\nThe following categories were skipped:");
        for record in &plan.skipped {
            println!(" - {} ({})", record.category_id, record.reason);
        }
    }
}

fn display_funds_summary(plan: &AllocationPlan) {
    let mut table = ui::new_styled_table();
    table.set_header(vec![ui::header_cell("Description"), ui::header_cell("Amount")]);
    table.add_row(vec![
        Cell::new("Total funds available"),
        ui::money_cell(plan.total_funds),
    ]);
    if let Some(mismatch) = plan.mismatch {
        table.add_row(vec![
            Cell::new("Total target funds"),
            ui::money_cell(plan.total_target),
        ]);
        table.add_row(vec![
            Cell::new("Available vs target difference"),
            ui::delta_cell(mismatch),
        ]);
    }

    println!("{}", ui::style_text("Funds Summary", ui::StyleType::Title));
    println!("{table}");
}

fn display_categories(categories: &[Category]) {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Category ID"),
        ui::header_cell("Category Name"),
        ui::header_cell("Target Funds"),
    ]);
    for category in categories {
        table.add_row(vec![
            Cell::new(&category.id),
            Cell::new(&category.name),
            ui::money_cell(category.target_funds),
        ]);
    }

    println!(
        "\n{}",
        ui::style_text("Model Categories", ui::StyleType::Title)
    );
    println!("{table}");
}

fn display_allocations(plan: &AllocationPlan) {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Category"),
        ui::header_cell("Ticker"),
        ui::header_cell("Price"),
        ui::header_cell("Adjusted Price"),
        ui::header_cell("Shares"),
        ui::header_cell("Investment"),
        ui::header_cell("Target"),
        ui::header_cell("Delta"),
    ]);
    for result in &plan.results {
        table.add_row(vec![
            Cell::new(&result.category_name),
            Cell::new(&result.ticker),
            ui::money_cell(result.raw_price),
            ui::money_cell(result.adjusted_price),
            Cell::new(result.shares.to_string())
                .set_alignment(comfy_table::CellAlignment::Right),
            ui::money_cell(result.invested_value),
            ui::money_cell(result.target_value),
            ui::delta_cell(result.delta),
        ]);
    }

    println!(
        "\n{}",
        ui::style_text("Ticker Allocation", ui::StyleType::Title)
    );
    println!("{table}");
}

fn display_investment_summary(plan: &AllocationPlan) {
    let mut table = ui::new_styled_table();
    table.set_header(vec![ui::header_cell("Description"), ui::header_cell("Amount")]);
    table.add_row(vec![
        Cell::new(ui::style_text("Total Investment Value", ui::StyleType::TotalLabel)),
        Cell::new(ui::style_text(
            &ui::format_money(plan.total_invested),
            ui::StyleType::TotalValue,
        )),
    ]);
    table.add_row(vec![
        Cell::new("Remainder vs Total Funds"),
        ui::delta_cell(plan.remainder),
    ]);

    println!(
        "\n{}",
        ui::style_text("Investment Summary", ui::StyleType::Title)
    );
    println!("{table}");
}
