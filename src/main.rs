use anyhow::{Context, Result};
use meal_planner::api_connection::{photo_url, CatalogClient};
use meal_planner::catalog::DishCatalog;
use meal_planner::cli::{parse_args, Command, SettingsAction};
use meal_planner::config::AppConfig;
use meal_planner::logging::init_logging;
use meal_planner::models::{NutritionalValues, YearMonth};
use meal_planner::nutrition::{calorie_progress, MacroBreakdown};
use meal_planner::plan_file::PlanFile;
use meal_planner::planner::PlannerSession;
use meal_planner::settings::{SettingsRepository, UserSettings};
use meal_planner::validation;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

async fn load_catalog(catalog_file: Option<&Path>, api_url: &str) -> Result<DishCatalog> {
    if let Some(path) = catalog_file {
        return DishCatalog::load_json_file(path);
    }

    let client = CatalogClient::new(api_url)?;
    let mut catalog = DishCatalog::default();
    catalog
        .refresh(&client)
        .await
        .with_context(|| format!("Failed to fetch dishes from '{}'", client.base_url()))?;
    Ok(catalog)
}

fn format_values(values: &NutritionalValues) -> String {
    format!(
        "{:.0} kcal | P {:.1} g | C {:.1} g | F {:.1} g",
        values.kcal, values.protein_g, values.carbs_g, values.fat_g
    )
}

fn format_macros(values: &NutritionalValues) -> String {
    let macros = MacroBreakdown::from_values(values);
    format!(
        "P {:.0}% / C {:.0}% / F {:.0}%",
        macros.protein_pct, macros.carbs_pct, macros.fat_pct
    )
}

fn print_settings(settings: &UserSettings) {
    println!("Meals per day:      {}", settings.number_of_meals);
    println!("Target calories:    {} kcal", settings.target_calories);
    println!("Weight:             {:.1} kg", settings.weight_kg);
    println!("Height:             {} cm", settings.height_cm);
    println!("Age:                {}", settings.age);
    println!("Gender:             {:?}", settings.gender);
    println!("Activity level:     {:?}", settings.activity_level);
    println!("Calculated target:  {} kcal", settings.calculated_calories());
    println!(
        "Effective target:   {} kcal ({})",
        settings.effective_target_calories(),
        if settings.use_calculated_calories { "calculated" } else { "manual" }
    );
    println!("BMI:                {:.1} ({:?})", settings.bmi(), settings.bmi_category());
}

fn list_dishes(catalog: &DishCatalog, search: Option<&str>, api_url: &str) {
    let dishes = catalog.search(search.unwrap_or(""));
    if dishes.is_empty() {
        println!("No dishes found.");
        return;
    }
    for dish in dishes {
        println!("[{}] {}", dish.id, dish.name);
        println!("    {}", format_values(&dish.nutritional_values));
        println!("    {} ingredients, photo: {}", dish.ingredients.len(), photo_url(api_url, dish));
    }
}

fn run_plan(
    plan_path: &Path,
    meals: Option<&str>,
    shopping_csv: Option<&Path>,
    catalog: &DishCatalog,
    settings_file: &Path,
) -> Result<()> {
    let plan = PlanFile::load(plan_path)?;
    let Some(first_date) = plan.entries.iter().map(|entry| entry.date).min() else {
        println!("Plan file has no entries.");
        return Ok(());
    };

    // Work on a copy so --meals never overwrites the saved settings.
    let saved = SettingsRepository::open(settings_file)?.get_settings();
    let repo = Arc::new(SettingsRepository::in_memory(saved.clone()));
    let mut session = PlannerSession::new(Arc::clone(&repo), first_date);

    let missing = plan.apply(&mut session, catalog);
    for dish_id in &missing {
        println!("Skipped dish {}: not in catalog", dish_id);
    }

    if let Some(meals) = meals {
        let number_of_meals = validation::parse_meal_count(meals)?;
        session.update_settings(&UserSettings { number_of_meals, ..saved })?;
    }

    let target = session.target_calories();
    let months: Vec<YearMonth> = plan.months().into_iter().collect();
    let store = session.plan();
    println!("Meals per day: {}, target {} kcal", store.meal_count(), target);

    for month in &months {
        println!("\n== {} ==", month);
        for date in month.days() {
            let Some(day) = store.day(date) else { continue };
            let totals = store.daily_nutrition(date);
            if day.dish_count() == 0 {
                continue;
            }
            println!(
                "{}  {}  ({:.0}% of target, {})",
                date,
                format_values(&totals),
                calorie_progress(totals.kcal, target) * 100.0,
                format_macros(&totals)
            );
            for meal_type in store.active_meal_types() {
                for dish in day.dishes(*meal_type) {
                    println!("    {:<16} {} ({:.0} kcal)", meal_type.label(), dish.name, dish.nutritional_values.kcal);
                }
            }
        }

        let stats = store.month_statistics(*month);
        println!("Days with meals: {}", stats.days_with_meals);
        println!("Month total:     {}", format_values(&stats.total));
        println!("Daily average:   {}", format_values(&stats.average));
    }

    let shopping_list = session.shopping_list();
    println!("\n== Shopping list ==");
    if shopping_list.is_empty() {
        println!("(empty)");
    }
    for item in shopping_list.items() {
        let dishes: Vec<&str> = item.sources.iter().map(|source| source.dish_name.as_str()).collect();
        println!("{:>8.1} {:<4} {}  [{}]", item.total_amount, item.unit, item.name, dishes.join(", "));
    }

    if let Some(path) = shopping_csv {
        let file = File::create(path)
            .with_context(|| format!("Failed to create shopping list file '{}'", path.display()))?;
        shopping_list
            .write_csv(file)
            .with_context(|| format!("Failed to write shopping list to '{}'", path.display()))?;
        println!("\nShopping list written to {}", path.display());
    }

    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn update_settings(
    repo: &SettingsRepository,
    meals: Option<&str>,
    calories: Option<&str>,
    weight: Option<&str>,
    height: Option<&str>,
    age: Option<&str>,
    gender: Option<&str>,
    activity: Option<&str>,
    use_calculated: Option<bool>,
) -> Result<UserSettings> {
    let mut settings = repo.get_settings();
    if let Some(meals) = meals {
        settings.number_of_meals = validation::parse_meal_count(meals)?;
    }
    if let Some(calories) = calories {
        settings.target_calories = validation::parse_target_calories(calories)?;
    }
    if let Some(weight) = weight {
        settings.weight_kg = validation::parse_weight_kg(weight)?;
    }
    if let Some(height) = height {
        settings.height_cm = validation::parse_height_cm(height)?;
    }
    if let Some(age) = age {
        settings.age = validation::parse_age(age)?;
    }
    if let Some(gender) = gender {
        settings.gender = gender.parse().map_err(anyhow::Error::msg)?;
    }
    if let Some(activity) = activity {
        settings.activity_level = activity.parse().map_err(anyhow::Error::msg)?;
    }
    if let Some(use_calculated) = use_calculated {
        settings.use_calculated_calories = use_calculated;
    }

    repo.save_settings(&settings)?;
    Ok(repo.get_settings())
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::from_env();
    init_logging(&config.log_level);

    let cli_args = parse_args();
    let api_url = cli_args.api_url.unwrap_or(config.api_url);
    let settings_file: PathBuf = cli_args.settings_file.unwrap_or(config.settings_file);

    match cli_args.command {
        Command::Dishes { search } => {
            let catalog = load_catalog(cli_args.catalog_file.as_deref(), &api_url).await?;
            list_dishes(&catalog, search.as_deref(), &api_url);
        }
        Command::Plan { plan_file, meals, shopping_csv } => {
            let catalog = load_catalog(cli_args.catalog_file.as_deref(), &api_url).await?;
            run_plan(&plan_file, meals.as_deref(), shopping_csv.as_deref(), &catalog, &settings_file)?;
        }
        Command::Settings { action } => {
            let repo = SettingsRepository::open(&settings_file)
                .with_context(|| format!("Failed to open settings file '{}'", settings_file.display()))?;
            match action {
                SettingsAction::Show => print_settings(&repo.get_settings()),
                SettingsAction::Set { meals, calories, weight, height, age, gender, activity, use_calculated } => {
                    let saved = update_settings(
                        &repo,
                        meals.as_deref(),
                        calories.as_deref(),
                        weight.as_deref(),
                        height.as_deref(),
                        age.as_deref(),
                        gender.as_deref(),
                        activity.as_deref(),
                        use_calculated,
                    )?;
                    println!("Settings saved to {}", settings_file.display());
                    print_settings(&saved);
                }
            }
        }
    }

    Ok(())
}
