// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use anyhow::Result;
use kube::Client;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use flagsource_operator::config::Config;
use flagsource_operator::kubernetes::AnnotationIndex;
use flagsource_operator::reconcilers::FlagSourceConfigurationReconciler;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting flagsource operator");

    let config = Config::from_env()?;
    info!(
        "Configuration loaded: proxy={}/{} image={}",
        config.proxy.namespace,
        config.proxy.deployment_name,
        config.proxy.image_reference()
    );

    let client = Client::try_default().await?;
    info!("Connected to Kubernetes cluster");

    let index = AnnotationIndex::new(config.annotations.clone());
    let reconciler =
        FlagSourceConfigurationReconciler::new(client.clone(), &config, index.clone());

    info!("Starting reconciler...");

    tokio::try_join!(index.run(client), reconciler.run())?;

    // Both tasks run until their watch streams end
    warn!("Operator stopped unexpectedly");
    Ok(())
}
