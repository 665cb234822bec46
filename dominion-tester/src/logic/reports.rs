use anyhow::Result;
use colored::Colorize;
use std::io::Write;
use std::time::Duration;

use super::ScenarioResult;
use super::campaign::{CampaignAggregate, CampaignRecord};

/// # Errors
///
/// Returns an error if writing to the output fails.
pub fn generate_console_report<W: Write + ?Sized>(
    out: &mut W,
    results: &[ScenarioResult],
    aggregates: &[CampaignAggregate],
    total_duration: Duration,
) -> Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", "📊 Logic Test Results Summary".bright_cyan().bold())?;
    writeln!(out, "{}", "==============================".cyan())?;

    let total_tests = results.len();
    let passed_tests = results.iter().filter(|r| r.passed).count();
    let failed_tests = total_tests - passed_tests;

    writeln!(out, "Total scenarios: {total_tests}")?;
    writeln!(out, "Passed: {}", passed_tests.to_string().green())?;
    writeln!(out, "Failed: {}", failed_tests.to_string().red())?;
    writeln!(out, "Success rate: {:.1}%", success_rate(passed_tests, total_tests))?;
    writeln!(out, "Total time: {total_duration:?}")?;
    writeln!(out)?;

    for result in results {
        let status = if result.passed {
            "✅ PASS".green()
        } else {
            "❌ FAIL".red()
        };

        writeln!(
            out,
            "{} {} (seed {})",
            status,
            result.scenario_name.bold(),
            result.seed
        )?;
        writeln!(
            out,
            "   Iterations: {}/{} successful",
            result.successful_iterations, result.iterations_run
        )?;
        writeln!(out, "   Average time: {:?}", result.average_duration)?;

        if !result.failures.is_empty() {
            writeln!(out, "   Failures:")?;
            for failure in &result.failures {
                writeln!(out, "     • {}", failure.red())?;
            }
        }
        writeln!(out)?;
    }

    if let (Some(fastest), Some(slowest)) = (
        results.iter().min_by_key(|r| r.average_duration),
        results.iter().max_by_key(|r| r.average_duration),
    ) {
        writeln!(out, "{}", "⚡ Performance Summary".bright_yellow().bold())?;
        writeln!(out, "{}", "=====================".yellow())?;
        writeln!(
            out,
            "Fastest: {} ({:?})",
            fastest.scenario_name.green(),
            fastest.average_duration
        )?;
        writeln!(
            out,
            "Slowest: {} ({:?})",
            slowest.scenario_name.yellow(),
            slowest.average_duration
        )?;
        writeln!(out)?;
    }

    if !aggregates.is_empty() {
        writeln!(out, "{}", "🏰 Campaign Summary".bright_magenta().bold())?;
        writeln!(out, "{}", "===================".magenta())?;
        for aggregate in aggregates {
            writeln!(
                out,
                "{:12} runs:{:4} rank:{:5.2} networth:{:10.1}±{:<9.1} land:{:8.1} \
                 wins:{:5.1}% survived:{:5.1}%",
                aggregate.strategy.label(),
                aggregate.iterations,
                aggregate.mean_rank,
                aggregate.mean_networth,
                aggregate.std_networth,
                aggregate.mean_land,
                aggregate.win_rate * 100.0,
                aggregate.survival_rate * 100.0
            )?;
        }
    }
    Ok(())
}

/// # Errors
///
/// Returns an error if serialization or writing fails.
pub fn generate_json_report<W: Write + ?Sized>(
    out: &mut W,
    results: &[ScenarioResult],
) -> Result<()> {
    let json_output = serde_json::to_string_pretty(results)?;
    writeln!(out, "{json_output}")?;
    Ok(())
}

/// # Errors
///
/// Returns an error if writing to the output fails.
pub fn generate_markdown_report<W: Write + ?Sized>(
    out: &mut W,
    results: &[ScenarioResult],
) -> Result<()> {
    writeln!(out, "# Dominion Logic Test Results\n")?;

    let total_tests = results.len();
    let passed_tests = results.iter().filter(|r| r.passed).count();
    let failed_tests = total_tests - passed_tests;

    writeln!(out, "## Summary\n")?;
    writeln!(out, "- **Total scenarios**: {total_tests}")?;
    writeln!(out, "- **Passed**: {passed_tests}")?;
    writeln!(out, "- **Failed**: {failed_tests}")?;
    writeln!(
        out,
        "- **Success rate**: {:.1}%\n",
        success_rate(passed_tests, total_tests)
    )?;

    writeln!(out, "## Detailed Results\n")?;

    for result in results {
        let status = if result.passed { "✅" } else { "❌" };

        writeln!(out, "### {} {} (seed {})\n", status, result.scenario_name, result.seed)?;
        writeln!(
            out,
            "- **Iterations**: {}/{} successful",
            result.successful_iterations, result.iterations_run
        )?;
        writeln!(out, "- **Average time**: {:?}", result.average_duration)?;

        if !result.failures.is_empty() {
            writeln!(out, "- **Failures**:")?;
            for failure in &result.failures {
                writeln!(out, "  - {failure}")?;
            }
        }
        writeln!(out)?;
    }
    Ok(())
}

/// One row per campaign run.
///
/// # Errors
///
/// Returns an error if writing to the output fails.
pub fn generate_csv_report<W: Write + ?Sized>(
    out: &mut W,
    records: &[CampaignRecord],
) -> Result<()> {
    writeln!(
        out,
        "strategy,seed,seed_code,final_rank,networth,land,rounds_played,\
         player_eliminated,bots_eliminated,attacks_won"
    )?;
    for record in records {
        writeln!(
            out,
            "{},{},{},{},{},{},{},{},{},{}",
            record.strategy.label(),
            record.seed,
            record.seed_code,
            record.final_rank,
            record.networth,
            record.land,
            record.rounds_played,
            record.player_eliminated,
            record.bots_eliminated,
            record.attacks_won
        )?;
    }
    Ok(())
}

#[allow(clippy::cast_precision_loss)]
fn success_rate(passed: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        (passed as f64 / total as f64) * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::policy::GameplayStrategy;
    use std::hash::Hasher;
    use twox_hash::XxHash64;

    fn sample_result(passed: bool) -> ScenarioResult {
        ScenarioResult {
            scenario_name: "Smoke".to_string(),
            seed: 1337,
            passed,
            iterations_run: 3,
            successful_iterations: if passed { 3 } else { 2 },
            failures: if passed {
                Vec::new()
            } else {
                vec!["round 2: bot overspent".to_string()]
            },
            average_duration: Duration::from_millis(10),
            performance_data: vec![Duration::from_millis(10)],
        }
    }

    fn sample_record(seed: u64) -> CampaignRecord {
        CampaignRecord {
            strategy: GameplayStrategy::Raider,
            seed,
            seed_code: "FALCON42-1F3A".to_string(),
            final_rank: 2,
            networth: 41_250,
            land: 612,
            rounds_played: 20,
            player_eliminated: false,
            bots_eliminated: 1,
            attacks_won: 7,
        }
    }

    fn render(write: impl FnOnce(&mut Vec<u8>) -> Result<()>) -> String {
        let mut buffer = Vec::new();
        write(&mut buffer).unwrap();
        String::from_utf8(buffer).unwrap()
    }

    #[test]
    fn console_report_lists_failures_and_campaigns() {
        let aggregate = CampaignAggregate {
            strategy: GameplayStrategy::Builder,
            iterations: 4,
            mean_rank: 2.5,
            mean_networth: 30_000.0,
            std_networth: 1_200.0,
            mean_land: 540.0,
            mean_attacks_won: 0.0,
            survival_rate: 1.0,
            win_rate: 0.25,
        };
        let text = render(|out| {
            generate_console_report(
                out,
                &[sample_result(true), sample_result(false)],
                &[aggregate],
                Duration::from_secs(1),
            )
        });
        assert!(text.contains("Total scenarios: 2"));
        assert!(text.contains("bot overspent"));
        assert!(text.contains("Campaign Summary"));
        assert!(text.contains("Builder"));
    }

    #[test]
    fn markdown_report_has_summary_and_details() {
        let text = render(|out| generate_markdown_report(out, &[sample_result(false)]));
        assert!(text.starts_with("# Dominion Logic Test Results"));
        assert!(text.contains("- **Failed**: 1"));
        assert!(text.contains("### ❌ Smoke (seed 1337)"));
    }

    #[test]
    fn json_report_is_parseable() {
        let text = render(|out| generate_json_report(out, &[sample_result(true)]));
        let parsed: Vec<ScenarioResult> = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed.len(), 1);
        assert!(parsed[0].passed);
    }

    #[test]
    fn csv_report_is_stable_for_identical_records() {
        let records = vec![sample_record(1), sample_record(2)];
        let first = render(|out| generate_csv_report(out, &records));
        let second = render(|out| generate_csv_report(out, &records));
        assert_eq!(first.lines().count(), 3);
        assert!(first.contains("Raider,2,FALCON42-1F3A,2,41250,612,20,false,1,7"));

        let digest = |text: &str| {
            let mut hasher = XxHash64::with_seed(0);
            hasher.write(text.as_bytes());
            hasher.finish()
        };
        assert_eq!(digest(&first), digest(&second));
    }

    #[test]
    fn success_rate_handles_empty_runs() {
        assert!(success_rate(0, 0).abs() < f64::EPSILON);
        assert!((success_rate(1, 4) - 25.0).abs() < f64::EPSILON);
    }
}
