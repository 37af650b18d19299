use crate::{
    cli::OutputFormat,
    config::AppConfig,
    error::{CliError, Result},
    output::{Color, OutputManager, write_output},
};
use indicatif::{ProgressBar, ProgressStyle};
use std::{path::Path, sync::Arc, time::Duration};
use stream_resolver::{
    StreamDescriptor,
    extractor::{TransportConfig, factory::ExtractorFactory, factory_with_config},
};
use tokio::{sync::Semaphore, time::timeout};
use tracing::{debug, info};

type BatchResultTuple = (usize, String, Result<StreamDescriptor>);

pub struct CommandExecutor {
    config: AppConfig,
    factory: Arc<ExtractorFactory>,
    timeout: Duration,
}

impl CommandExecutor {
    pub fn new(config: AppConfig, transport: TransportConfig) -> Result<Self> {
        let timeout = transport.timeout;
        let factory = Arc::new(factory_with_config(&transport)?);
        Ok(Self {
            config,
            factory,
            timeout,
        })
    }

    pub async fn resolve_single(
        &self,
        url: &str,
        output_file: Option<&Path>,
        output_format: OutputFormat,
    ) -> Result<()> {
        let pb = self.create_progress_bar("Resolving...");
        let result = resolve_with_timeout(&self.factory, url, self.timeout).await;
        pb.finish_and_clear();

        let descriptor = result?;
        info!("resolved {} -> {}", url, descriptor.destination_url);

        let output = OutputManager::new(self.config.colored_output)
            .format_descriptor(&descriptor, &output_format)?;
        write_output(&output, output_file)
    }

    pub async fn batch_process(
        &self,
        input_file: &Path,
        output_dir: Option<&Path>,
        concurrency: usize,
        output_format: OutputFormat,
    ) -> Result<()> {
        let content = std::fs::read_to_string(input_file)?;
        let urls = parse_url_list(&content);

        if urls.is_empty() {
            return Err(CliError::invalid_input("No valid URLs found in input file"));
        }

        let pb = Arc::new(ProgressBar::new(urls.len() as u64));
        if let Ok(style) = ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")
        {
            pb.set_style(style.progress_chars("█▉▊▋▌▍▎▏  "));
        }

        let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
        let mut tasks = Vec::with_capacity(urls.len());

        for (index, url) in urls.into_iter().enumerate() {
            let pb = Arc::clone(&pb);
            let factory = Arc::clone(&self.factory);
            let permit = semaphore.clone().acquire_owned().await?;
            let timeout_duration = self.timeout;

            tasks.push(tokio::spawn(async move {
                let _permit = permit;
                pb.set_message(format!("Processing: {url}"));

                let result = resolve_with_timeout(&factory, &url, timeout_duration).await;
                if let Err(e) = &result {
                    debug!("batch entry {} failed: {}", index, e);
                }

                pb.inc(1);
                (index, url, result)
            }));
        }

        let mut results: Vec<BatchResultTuple> = Vec::with_capacity(tasks.len());
        for task in tasks {
            results.push(task.await?);
        }

        pb.finish_with_message("Batch processing completed");

        let output_dir = output_dir.or(self.config.default_output_dir.as_deref());
        match output_format {
            OutputFormat::Json | OutputFormat::JsonCompact => {
                let output = batch_json(&results, output_format == OutputFormat::Json)?;
                let output_file = output_dir.map(|dir| dir.join("batch_results.json"));
                write_output(&output, output_file.as_deref())
            }
            _ => {
                let output = batch_summary(&results);
                let output_file = output_dir.map(|dir| dir.join("batch_summary.txt"));
                write_output(&output, output_file.as_deref())
            }
        }
    }

    pub fn list_sites(&self, detailed: bool, output_format: OutputFormat) -> Result<()> {
        let sites = self.factory.supported_sites();

        match output_format {
            OutputFormat::Json | OutputFormat::JsonCompact => {
                let sites_json: Vec<serde_json::Value> = sites
                    .iter()
                    .map(|(name, domains)| {
                        serde_json::json!({
                            "name": name,
                            "domains": domains,
                        })
                    })
                    .collect();

                let output = if output_format == OutputFormat::Json {
                    serde_json::to_string_pretty(&sites_json)?
                } else {
                    serde_json::to_string(&sites_json)?
                };
                println!("{output}");
            }
            _ => {
                let manager = OutputManager::new(self.config.colored_output);
                println!("{}", manager.colorize("Supported Sites:", &Color::Green, true));

                for (name, domains) in sites {
                    if detailed {
                        println!(
                            "  {} - {}",
                            manager.colorize(name, &Color::Cyan, true),
                            manager.colorize(&domains.join(", "), &Color::Blue, false)
                        );
                    } else {
                        println!("  {}", manager.colorize(name, &Color::Cyan, true));
                    }
                }
            }
        }

        Ok(())
    }

    fn create_progress_bar(&self, message: &str) -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        pb.enable_steady_tick(Duration::from_millis(500));
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
            pb.set_style(style.tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ "));
        }
        pb.set_message(message.to_string());
        pb
    }
}

/// Resolves one URL under a single deadline shared by every hop of its chain.
/// The same duration also bounds each request at the transport.
async fn resolve_with_timeout(
    factory: &ExtractorFactory,
    url: &str,
    timeout_duration: Duration,
) -> Result<StreamDescriptor> {
    match timeout(timeout_duration, factory.resolve(url)).await {
        Ok(result) => Ok(result?),
        Err(_) => Err(CliError::timeout(timeout_duration.as_secs())),
    }
}

/// URLs from a batch file: one per line, blank lines and `#` comments skipped.
fn parse_url_list(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(String::from)
        .collect()
}

fn batch_json(results: &[BatchResultTuple], pretty: bool) -> Result<String> {
    let json_results: Vec<serde_json::Value> = results
        .iter()
        .map(|(index, url, result)| match result {
            Ok(descriptor) => serde_json::json!({
                "index": index,
                "url": url,
                "status": "success",
                "descriptor": descriptor,
            }),
            Err(e) => serde_json::json!({
                "index": index,
                "url": url,
                "status": "error",
                "error": e.to_string(),
            }),
        })
        .collect();

    let mut output = if pretty {
        serde_json::to_string_pretty(&json_results)?
    } else {
        serde_json::to_string(&json_results)?
    };
    output.push('\n');
    Ok(output)
}

fn batch_summary(results: &[BatchResultTuple]) -> String {
    let mut summary = String::new();

    summary.push_str("=== Batch Processing Summary ===\n\n");

    let successful = results.iter().filter(|(_, _, r)| r.is_ok()).count();
    let failed = results.len() - successful;

    summary.push_str(&format!("Total URLs: {}\n", results.len()));
    summary.push_str(&format!("Successful: {successful}\n"));
    summary.push_str(&format!("Failed: {failed}\n\n"));

    for (index, url, result) in results {
        let status_line = match result {
            Ok(descriptor) => format!(
                "[{}] ✓ {}: {} ({})",
                index + 1,
                url,
                descriptor.destination_url,
                descriptor.endpoint()
            ),
            Err(e) => format!("[{}] ✗ {}: {}", index + 1, url, e),
        };
        summary.push_str(&status_line);
        summary.push('\n');
    }

    summary
}
