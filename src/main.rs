// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use anyhow::{bail, Context};
use std::env;
use std::time::Instant;
use the_conduit::backends::local::{CollectorSink, IterSource, LocalUnitFactory};
use the_conduit::config::load_and_validate_config;
use the_conduit::engine::Composer;
use the_conduit::observability;
use the_conduit::units::{Unit, UnitSettings};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    observability::init_tracing();

    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        eprintln!("Usage: {} <pipeline.yaml|pipeline.toml> <input_text> [input_text ...]", args[0]);
        eprintln!("Example: {} configs/shout.yaml \"hello world\"", args[0]);
        eprintln!("Available processors:");
        for name in LocalUnitFactory::list_available_implementations() {
            eprintln!("  • {}", name);
        }
        std::process::exit(1);
    }

    run_pipeline(&args[1], &args[2..]).await
}

async fn run_pipeline(config_file: &str, inputs: &[String]) -> anyhow::Result<()> {
    let start_time = Instant::now();

    let config = load_and_validate_config(config_file)
        .with_context(|| format!("loading pipeline {}", config_file))?;

    let settings = UnitSettings::from(&config.options);
    let mut composer = Composer::new().options(config.options.clone()).unit(Unit::source_with(
        IterSource::texts(inputs.iter().cloned()),
        UnitSettings {
            name: Some("input".to_string()),
            ..settings.clone()
        },
    ));
    for unit_config in &config.units {
        composer = composer.unit(LocalUnitFactory::create_unit(unit_config, &config.options)?);
    }
    let (collector, collected) = CollectorSink::new();
    let pipeline = composer
        .unit(Unit::sink_with(
            collector,
            UnitSettings {
                name: Some("output".to_string()),
                ..settings
            },
        ))
        .compose_deferred();

    println!("📋 Configuration: {}", config_file);
    println!("🔗 Units: {}", config.units.len());
    println!("🧩 Composite shape: {}", pipeline.shape());

    if let Err(error) = (&pipeline).await {
        bail!("pipeline failed: {}", error);
    }

    println!("\n🎯 Results:");
    for (input, chunk) in inputs.iter().zip(collected.chunks()) {
        let output = chunk.to_text().unwrap_or_else(|| format!("{:?}", chunk));
        println!("   \"{}\" → \"{}\"", input, output);
    }
    println!("\n⏱️  Total Time (including config load): {:?}", start_time.elapsed());

    Ok(())
}
