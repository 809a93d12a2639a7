use pbs_line::assembly::policy::{FirstInQueue, MinForecast, RandomPolicy, ShortestProcessingTime};
use pbs_line::assembly::rollout::{evaluate, EpisodeSummary, EvaluationReport};
use pbs_line::assembly::schedule::SyntheticSchedule;
use pbs_line::{AssemblyConfig, ConcurrencyMode};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn print_report(name: &str, summaries: &[EpisodeSummary]) {
    match EvaluationReport::from_summaries(summaries) {
        Some(report) => println!(
            "  {:<26} episodes={:<3} mean lead time={:>8.2} best={:>8.2} worst={:>8.2} mean reward={:>8.2}",
            name,
            report.episodes,
            report.mean_lead_time,
            report.best_lead_time,
            report.worst_lead_time,
            report.mean_reward
        ),
        None => println!("  {:<26} no episodes", name),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Warn)
        .format_timestamp(None)
        .init();

    let schedule = SyntheticSchedule::default();
    let blocks = schedule.generate(&mut StdRng::seed_from_u64(2024))?;

    let config = AssemblyConfig::new(schedule.num_stations, 10)
        .with_seed(42)
        .with_concurrency(ConcurrencyMode::Rayon);

    println!("Panel block assembly line");
    println!(
        "  {} blocks, {} stations, queue of {}, state size {}",
        blocks.len(),
        config.num_stations(),
        config.queue_capacity,
        config.state_size()
    );

    let seeds: Vec<u64> = (0..32).collect();

    print_report("first_in_queue", &evaluate(&config, &blocks, &seeds, |_| FirstInQueue)?);
    print_report("random", &evaluate(&config, &blocks, &seeds, RandomPolicy::new)?);
    print_report(
        "shortest_processing_time",
        &evaluate(&config, &blocks, &seeds, |_| ShortestProcessingTime)?,
    );
    print_report("min_forecast", &evaluate(&config, &blocks, &seeds, |_| MinForecast)?);

    Ok(())
}
