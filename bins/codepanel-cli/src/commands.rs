// CLI commands for working with the problem catalog and execution service
use anyhow::{bail, Context, Result};
use codepanel_common::config::AppConfig;
use codepanel_common::types::{ExampleVerdict, Language, Problem};
use codepanel_engine::catalog::ProblemCatalog;
use codepanel_engine::config::LanguageConfigManager;
use codepanel_engine::engine::PistonEngine;
use codepanel_engine::executor::VerdictEngine;
use codepanel_engine::harness;
use codepanel_engine::store::{RedisStore, SubmissionStore};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Built-in catalog unless a JSON catalog is given
pub fn load_catalog(path: Option<&Path>) -> Result<ProblemCatalog> {
    match path {
        Some(path) => ProblemCatalog::load(path)
            .with_context(|| format!("Failed to load problem catalog from {}", path.display())),
        None => Ok(ProblemCatalog::builtin()),
    }
}

fn find_problem<'a>(catalog: &'a ProblemCatalog, id: &str) -> Result<&'a Problem> {
    match catalog.get(id) {
        Some(problem) => Ok(problem),
        None => {
            let known: Vec<&str> = catalog.problems().iter().map(|p| p.id.as_str()).collect();
            bail!("Unknown problem '{}' (available: {})", id, known.join(", "))
        }
    }
}

fn read_source(file: &Path) -> Result<String> {
    let source = fs::read_to_string(file)
        .with_context(|| format!("Failed to read solution file {}", file.display()))?;
    if source.trim().is_empty() {
        bail!("Solution file {} is empty", file.display());
    }
    Ok(source)
}

/// List every problem in the catalog
pub fn list_problems(catalog: &ProblemCatalog) {
    println!("📋 Problems:\n");
    println!("{:<20} {:<28} {:<8} {:<10}", "ID", "TITLE", "LEVEL", "EXAMPLES");
    println!("{}", "─".repeat(70));

    let default_id = &catalog.default_problem().id;
    for problem in catalog.problems() {
        let id = if &problem.id == default_id {
            format!("{} *", problem.id)
        } else {
            problem.id.clone()
        };
        println!(
            "{:<20} {:<28} {:<8} {:<10}",
            id,
            problem.title,
            format!("{:?}", problem.difficulty),
            problem.examples.len()
        );
    }

    println!("\n✅ Total: {} problem(s)  (* = default)", catalog.problems().len());
}

/// Print a problem statement
pub fn show_problem(catalog: &ProblemCatalog, id: &str, language: Option<Language>) -> Result<()> {
    let problem = find_problem(catalog, id)?;

    println!("📘 {} ({:?})\n", problem.title, problem.difficulty);
    println!("{}\n", problem.description);

    if !problem.constraints.is_empty() {
        println!("Constraints:");
        for constraint in &problem.constraints {
            println!("  • {}", constraint);
        }
        println!();
    }

    for (idx, example) in problem.examples.iter().enumerate() {
        println!("Example {}:", idx + 1);
        println!("  Input:  {}", example.input);
        println!("  Output: {}", example.output);
        if let Some(explanation) = &example.explanation {
            println!("  Why:    {}", explanation);
        }
    }

    let languages: Vec<Language> = match language {
        Some(language) => vec![language],
        None => problem.starter_code.keys().copied().collect(),
    };
    for language in languages {
        match problem.starter_code(language) {
            Some(starter) => println!("\n── {} starter ──\n{}", language.display_name(), starter),
            None => println!("\n⚠️  No {} starter code for this problem", language.display_name()),
        }
    }

    Ok(())
}

/// Print the program that would be executed for one example
pub fn print_harness(
    catalog: &ProblemCatalog,
    id: &str,
    language: Language,
    file: &Path,
    example: usize,
) -> Result<()> {
    let problem = find_problem(catalog, id)?;
    let source = read_source(file)?;

    if example == 0 || example > problem.examples.len() {
        bail!(
            "Example {} does not exist ({} has {} example(s))",
            example,
            problem.id,
            problem.examples.len()
        );
    }

    let program = harness::build_program(problem, language, &source, &problem.examples[example - 1])
        .with_context(|| format!("Failed to build program for example {}", example))?;
    println!("{}", program);
    Ok(())
}

/// One line per example, e.g. `✅ Example 1  expected [0,1]  got [0, 1]`
pub fn format_verdict(verdict: &ExampleVerdict) -> String {
    let icon = if verdict.passed { "✅" } else { "❌" };
    format!(
        "{} {:<10} expected {}  got {}",
        icon, verdict.test_name, verdict.expected_output, verdict.actual_output
    )
}

/// Run a local file against every example of a problem
#[allow(clippy::too_many_arguments)]
pub async fn run_solution(
    catalog: &ProblemCatalog,
    id: &str,
    language: Language,
    file: &Path,
    piston_url: &str,
    languages_config: &Path,
    timeout_ms: u64,
    json: bool,
) -> Result<()> {
    let problem = find_problem(catalog, id)?;
    let source = read_source(file)?;

    let languages = LanguageConfigManager::load_or_default(languages_config)?;
    let timeout = Duration::from_millis(timeout_ms);
    let engine = PistonEngine::new(piston_url, languages, timeout)?;
    let verdicts = VerdictEngine::new(
        Arc::new(engine),
        timeout,
        AppConfig::from_env().max_parallel_examples,
    );

    if !json {
        println!(
            "🚀 Running {} against {} example(s) of '{}'...\n",
            file.display(),
            problem.examples.len(),
            problem.id
        );
    }

    let result = verdicts.run(problem, language, &source).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    for verdict in &result.test_results {
        println!("{}", format_verdict(verdict));
    }
    println!(
        "\n{} ({}/{} passed)",
        result.summary.message(),
        result.passed_count,
        result.total
    );

    Ok(())
}

/// List persisted submissions of a session
pub async fn list_submissions(redis_url: &str, session_id: &str) -> Result<()> {
    let store = RedisStore::connect(redis_url)
        .await
        .with_context(|| format!("Failed to connect to Redis at {}", redis_url))?;
    let submissions = store
        .list_submissions(session_id)
        .await
        .context("Failed to read submissions")?;

    if submissions.is_empty() {
        println!("No submissions for session '{}'.", session_id);
        return Ok(());
    }

    println!("📋 Submissions for session '{}':\n", session_id);
    println!("{:<38} {:<20} {:<12} {:<8} {:<25}", "ID", "QUESTION", "LANGUAGE", "STATUS", "SUBMITTED");
    println!("{}", "─".repeat(105));

    for submission in &submissions {
        println!(
            "{:<38} {:<20} {:<12} {:<8} {:<25}",
            submission.id.to_string(),
            submission.question_id,
            submission.language.as_str(),
            format!("{:?}", submission.status).to_lowercase(),
            submission.submitted_at.format("%Y-%m-%d %H:%M:%S UTC").to_string()
        );
    }

    println!("\n✅ Total: {} submission(s)", submissions.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn verdict(passed: bool, actual: &str) -> ExampleVerdict {
        ExampleVerdict {
            example_index: 0,
            test_name: "Example 1".to_string(),
            passed,
            expected_output: "[0,1]".to_string(),
            actual_output: actual.to_string(),
        }
    }

    #[test]
    fn test_format_verdict() {
        assert!(format_verdict(&verdict(true, "[0, 1]")).starts_with("✅ Example 1"));

        let line = format_verdict(&verdict(false, "Error: SyntaxError"));
        assert!(line.starts_with("❌"));
        assert!(line.ends_with("got Error: SyntaxError"));
    }

    #[test]
    fn test_unknown_problem_lists_known_ids() {
        let catalog = ProblemCatalog::builtin();

        let err = find_problem(&catalog, "three-sum").unwrap_err().to_string();

        assert!(err.contains("three-sum"));
        assert!(err.contains("two-sum"));
    }

    #[test]
    fn test_missing_solution_file() {
        let err = read_source(Path::new("/nonexistent/solution.py")).unwrap_err();
        assert!(err.to_string().contains("Failed to read solution file"));
    }

    #[test]
    fn test_harness_example_out_of_range() {
        let catalog = ProblemCatalog::builtin();
        let file = std::env::temp_dir().join(format!("codepanel-cli-{}.py", std::process::id()));
        fs::write(&file, "def twoSum(nums, target):\n    return [0, 1]\n").unwrap();

        let result = print_harness(&catalog, "two-sum", Language::Python, &file, 4);

        fs::remove_file(&file).ok();
        assert!(result.unwrap_err().to_string().contains("Example 4 does not exist"));
    }
}
