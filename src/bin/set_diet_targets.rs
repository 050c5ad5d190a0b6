//! Utility to set a user's diet targets in the database
//!
//! Usage:
//!   set_diet_targets <user_id> <calories> [preset]
//!   set_diet_targets <user_id> <calories> <protein%> <carb%> <fat%>

use kylo::config;
use kylo::db::Database;
use kylo::models::{DietTargets, DietTargetsUpsert};
use kylo::nutrition::{parse_calorie_target, DietPreset, MacroSplit};

const USAGE: &str = "usage: set_diet_targets <user_id> <calories> [preset | <protein%> <carb%> <fat%>]";

fn parse_percent(s: &str) -> Result<u32, String> {
    s.trim()
        .trim_end_matches('%')
        .parse()
        .map_err(|_| format!("Invalid percentage '{}'", s))
}

fn parse_split(args: &[String]) -> Result<MacroSplit, String> {
    match args {
        [] => Ok(DietPreset::default().split()),
        [preset] => DietPreset::parse(preset)
            .map(|p| p.split())
            .ok_or_else(|| format!("Unknown diet preset '{}'", preset)),
        [p, c, f] => Ok(MacroSplit::new(parse_percent(p)?, parse_percent(c)?, parse_percent(f)?)),
        _ => Err(USAGE.to_string()),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.len() < 2 {
        return Err(USAGE.into());
    }

    let user_id = args[0].trim();
    let calories = parse_calorie_target(&args[1])?;
    let split = parse_split(&args[2..])?;
    let data = DietTargetsUpsert::compute(user_id, calories, split, chrono::Local::now().date_naive())?;

    let db_path = config::database_path();
    println!("Database path: {}", db_path.display());
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let database = Database::new(&db_path)?;

    database.with_conn(|conn| {
        kylo::db::migrations::run_migrations(conn)?;
        Ok(())
    })?;

    database.with_conn(|conn| {
        let targets = DietTargets::upsert(conn, &data)?;
        println!("Diet targets set for {}:", targets.id);
        println!("  Calories: {}", targets.target_calories);
        println!("  Protein:  {} g", targets.target_protein_grams);
        println!("  Carbs:    {} g", targets.target_carb_grams);
        println!("  Fat:      {} g", targets.target_fat_grams);
        println!("  From:     {}", targets.effective_from);
        Ok(())
    })?;

    Ok(())
}
