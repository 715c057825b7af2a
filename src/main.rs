use tracing::info;

use modelweek::config::Config;
use modelweek::model::{Day, Minutes, format_hhmm, parse_hhmm};
use modelweek::store::{FileStore, WeekStore};

/// Print a user's stored week.
/// `modelweek [user] [--json] [--at HH:MM] [--day DAY]`
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let mut config = Config::from_env();
    let mut json = false;
    let mut at: Option<Minutes> = None;
    let mut day: Option<Day> = None;
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--json" => json = true,
            "--at" => {
                let value = args.next().ok_or("--at needs a time")?;
                at = Some(parse_hhmm(&value).ok_or_else(|| format!("invalid time {value:?}, expected HH:MM"))?);
            }
            "--day" => {
                let value = args.next().ok_or("--day needs a day name")?;
                day = Some(value.parse()?);
            }
            _ => config.user = arg,
        }
    }
    modelweek::observability::init(config.metrics_port)?;

    let store = FileStore::new(&config.data_dir, &config.user)?;
    info!("reading {}", store.path().display());
    let Some(week) = store.load().await? else {
        println!("no week stored for {}", config.user);
        return Ok(());
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&week)?);
        return Ok(());
    }

    if let Some(t) = at {
        let day = day.unwrap_or_else(Day::today);
        match week.block_at(day, t) {
            Some(block) => println!(
                "{day} {}: {} [{}] {}",
                format_hhmm(t),
                block.span,
                block.meta.activity.label(),
                block.meta.title,
            ),
            None => println!("{day} {}: free", format_hhmm(t)),
        }
        return Ok(());
    }

    for day in Day::ALL {
        println!("{day}");
        for block in week.day(day) {
            let task = block
                .meta
                .linked_task_name
                .as_deref()
                .map(|t| format!(" -> {t}"))
                .unwrap_or_default();
            println!(
                "  {}-{}  [{}] {}{task}",
                format_hhmm(block.span.start),
                format_hhmm(block.span.end),
                block.meta.activity.label(),
                block.meta.title,
            );
        }
    }
    let prefs = &week.preferences;
    println!(
        "preferences: max {} blocks/day, {} min buffer",
        prefs.max_blocks_per_day, prefs.buffer_minutes
    );
    if let Some((day, id)) = week.first_violation() {
        tracing::warn!("stored week breaks an invariant on {day} at block {id}");
    }
    Ok(())
}
