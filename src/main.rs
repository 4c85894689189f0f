use anyhow::Context;
use clap::Parser;
use img_press::batch::{run_batch, DiscoveryFilters};
use img_press::cli::{Args, Commands};
use img_press::codec::NativeCodec;
use img_press::config::{load_config, merge_settings, write_sample_config, CliOverrides};
use img_press::report::Summary;
use img_press::{error_msg, info, logger, verbose};
use rayon::ThreadPoolBuilder;
use std::env;

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    match args.command {
        Commands::Run {
            input,
            output,
            quality,
            resize,
            format,
            aggressive_png,
            ultra_png,
            no_skip_small,
            min_size,
            threads,
            no_config,
            quiet,
            verbose,
        } => {
            logger::set_quiet_mode(quiet);
            logger::set_verbose_mode(verbose);
            setup_thread_pool(threads);

            let cli = CliOverrides {
                quality,
                resize,
                format,
                output,
                aggressive_png,
                ultra_png,
                no_skip_small,
                min_size,
            };

            let config = if no_config {
                None
            } else {
                let cwd = env::current_dir().context("cannot determine working directory")?;
                load_config(&cwd)
            };
            if config.is_some() {
                verbose!("using config file discovered near the working directory");
            }

            let settings = match merge_settings(&cli, config.as_ref()) {
                Ok(settings) => settings,
                Err(e) => {
                    error_msg!("{}", e);
                    std::process::exit(1);
                }
            };
            let filters =
                match DiscoveryFilters::from_patterns(&settings.include, &settings.exclude) {
                    Ok(filters) => filters,
                    Err(e) => {
                        error_msg!("{}", e);
                        std::process::exit(1);
                    }
                };

            info!("📸 img-press");
            info!("================================");
            info!("Input: {}", input);
            info!("Output: {}", settings.output.display());
            info!("Quality: {}", settings.options.quality);
            if let Some((w, h)) = settings.options.resize {
                info!("Resize: {}x{}", w, h);
            }
            if let Some(fmt) = settings.options.format {
                info!("Format: {}", fmt);
            }

            let codec = NativeCodec::new();
            let results = run_batch(
                &codec,
                &input,
                &settings.output,
                &settings.options,
                &filters,
            )?;

            if !results.is_empty() {
                info!("{}", Summary::from_results(&results).render());
            }
            Ok(())
        }

        Commands::InitConfig { path } => {
            write_sample_config(&path)
                .with_context(|| format!("failed to write config to {}", path.display()))?;
            info!("✅ Wrote sample config to {}", path.display());
            Ok(())
        }
    }
}

fn setup_thread_pool(threads: Option<usize>) {
    if let Some(num_threads) = threads {
        ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .build_global()
            .unwrap_or_else(|e| {
                eprintln!("Warning: Failed to set thread pool size: {}", e);
            });
    }
}
