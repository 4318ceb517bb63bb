use clap::Parser;
use gonggu_lens::core::matching::NormalizedMatch;
use gonggu_lens::core::quality_gate::QualityGate;
use gonggu_lens::domain::ports::{ConfigProvider, MatchPolicy};
use gonggu_lens::utils::error::ErrorSeverity;
use gonggu_lens::utils::{logger, validation::Validate};
use gonggu_lens::{AnalysisFailure, AnalysisResult, CliConfig, DefaultOrchestrator, LensError, TomlConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    let toml = match &cli.config {
        Some(path) => match TomlConfig::from_file(path) {
            Ok(config) => Some(config),
            Err(e) => {
                eprintln!("❌ Failed to load config file '{}': {}", path, e);
                eprintln!("💡 Make sure the file exists and is valid TOML format");
                std::process::exit(1);
            }
        },
        None => None,
    };

    // 初始化日誌
    let log_json = cli.log_json || toml.as_ref().is_some_and(|t| t.log_json());
    if log_json {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting gonggu-lens");

    // 驗證配置
    let validation = match &toml {
        Some(config) => config.validate().and_then(|_| cli.validate_image_args()),
        None => cli.validate(),
    };
    if let Err(e) = validation {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    let monitor_enabled = cli.monitor || toml.as_ref().is_some_and(|t| t.monitoring_enabled());

    let outcome = match &toml {
        Some(config) => run(&cli, config, monitor_enabled).await,
        None => run(&cli, &cli, monitor_enabled).await,
    };

    match outcome {
        Ok((result, threshold)) => {
            println!("{}", serde_json::to_string_pretty(&result)?);
            report(&cli, &result, threshold);
        }
        Err(e) => {
            // 記錄詳細錯誤信息
            tracing::error!(
                "❌ Analysis failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            println!(
                "{}",
                serde_json::to_string_pretty(&AnalysisFailure::from_error(&e))?
            );

            let exit_code = match e.severity() {
                ErrorSeverity::Low => 0,
                ErrorSeverity::Medium => 2,
                ErrorSeverity::High => 1,
                ErrorSeverity::Critical => 3,
            };

            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }

    Ok(())
}

async fn run<C: ConfigProvider>(
    cli: &CliConfig,
    config: &C,
    monitor_enabled: bool,
) -> Result<(AnalysisResult, f64), LensError> {
    let orchestrator = DefaultOrchestrator::from_config(config)?.with_monitoring(monitor_enabled);
    let image = cli.image_reference().await?;
    let result = orchestrator.analyze(image).await?;
    Ok((result, config.quality_threshold()))
}

fn report(cli: &CliConfig, result: &AnalysisResult, threshold: f64) {
    eprintln!(
        "✅ {} candidates (via {})",
        result.candidates.len(),
        result.provenance.as_str()
    );

    let Some(top) = result.top() else {
        return;
    };

    if cli.explain {
        let report = QualityGate::new(threshold).evaluate(&top.candidate);
        eprintln!(
            "📊 Quality of '{}': {:.2} / {} ({})",
            top.candidate.name,
            report.score,
            report.threshold,
            if report.passed { "PASS" } else { "LOW" }
        );
        for (field, ok) in &report.details {
            eprintln!("   {} {}", if *ok { "✅" } else { "❌" }, field);
        }
    }

    if let Some(truth) = cli.expected() {
        let matched = NormalizedMatch.matches(&top.candidate, &truth);
        eprintln!(
            "{} Top candidate {} the expected tool",
            if matched { "🎯" } else { "⚠️" },
            if matched { "matches" } else { "does not match" }
        );
    }
}
