use crate::app::context::AppContext;
use crate::app::status::{StatusReport, render_status};
use crate::cli::commands::{Cli, Commands, PageArgs, Toggle};
use anyhow::{Context, Result, bail};
use coresync::Config;
use coresync::actions::{ImproveOutcome, SaveStatus, improve_prompt, save_selection};
use coresync::platforms::Platform;
use coresync::sync::AutoSyncMode;
use std::io::Write;

pub async fn dispatch(cli: Cli, config: Config) -> Result<()> {
    if let Commands::Detect { url } = &cli.command {
        match Platform::detect(url) {
            Some(platform) => println!("{} ({platform})", platform.display_name()),
            None => println!("Unsupported page"),
        }
        return Ok(());
    }

    let ctx = AppContext::from_config(config).await?;

    match cli.command {
        Commands::Detect { .. } => Ok(()),
        Commands::Login {
            api_key,
            base_url,
            no_verify,
        } => login(&ctx, api_key, base_url, no_verify).await,
        Commands::Status { clear_sync_flag } => status(&ctx, clear_sync_flag).await,
        Commands::Sync { page } => sync_once(&ctx, &page).await,
        Commands::Watch { page, interval_ms } => watch(&ctx, &page, interval_ms).await,
        Commands::AutoSync { state } => {
            let enabled = state == Toggle::On;
            ctx.settings
                .set_auto_sync_enabled(enabled)
                .await
                .context("Failed to store auto-sync setting")?;
            println!("Auto-sync {}", if enabled { "on" } else { "off" });
            Ok(())
        }
        Commands::Spaces => {
            let spaces = ctx.client().fetch_spaces().await?;
            if spaces.is_empty() {
                println!("No spaces.");
            }
            for space in spaces {
                match space.description.as_deref().filter(|d| !d.is_empty()) {
                    Some(description) => println!("{}  {}  - {description}", space.id, space.name),
                    None => println!("{}  {}", space.id, space.name),
                }
            }
            Ok(())
        }
        Commands::Save { text } => match save_selection(&ctx.client(), &text).await {
            SaveStatus::Saved => {
                println!("Saved to memory.");
                Ok(())
            }
            SaveStatus::Empty => bail!("Nothing to save: text is empty"),
            SaveStatus::Failed => bail!("Failed to save to memory"),
        },
        Commands::Improve { page, prompt } => improve(&ctx, &page, prompt).await,
    }
}

async fn login(
    ctx: &AppContext,
    api_key: String,
    base_url: Option<String>,
    no_verify: bool,
) -> Result<()> {
    let api_key = api_key.trim().to_string();
    if api_key.is_empty() {
        bail!("API key must not be empty");
    }

    let mut config = (*ctx.config).clone();
    config.api_key = Some(api_key.clone());
    if base_url.is_some() {
        config.api_base_url.clone_from(&base_url);
    }
    config.validate()?;
    config.save()?;

    ctx.settings
        .set_api_key(&api_key)
        .await
        .context("Failed to store API key")?;
    if let Some(base_url) = base_url.as_deref() {
        ctx.settings
            .set_api_base_url(base_url)
            .await
            .context("Failed to store API base URL")?;
    }

    if no_verify {
        println!("API key saved.");
        return Ok(());
    }
    let spaces = ctx
        .client()
        .fetch_spaces()
        .await
        .context("API key saved, but the connectivity check failed")?;
    println!("API key saved. Connected ({} spaces).", spaces.len());
    Ok(())
}

async fn status(ctx: &AppContext, clear_sync_flag: bool) -> Result<()> {
    if clear_sync_flag {
        ctx.engine()
            .state()
            .reset()
            .await
            .context("Failed to clear sync flag")?;
        println!("Sync flag cleared.");
    }

    let settings = &ctx.settings;
    let report = StatusReport {
        config: &ctx.config,
        api_key_set: settings.api_key().await?.is_some(),
        api_base_url: settings.api_base_url().await?,
        state: settings.extension_state().await?,
        flag: settings.syncing_flag().await?,
    };
    println!("{}", render_status(&report));
    Ok(())
}

async fn sync_once(ctx: &AppContext, page: &PageArgs) -> Result<()> {
    let opened = AppContext::open_page(&page.url, &page.html)?;
    let outcome = ctx.engine().run(opened.adapter.as_ref()).await;
    println!("{outcome}");
    Ok(())
}

async fn watch(ctx: &AppContext, page: &PageArgs, interval_ms: Option<u64>) -> Result<()> {
    if let Some(interval_ms) = interval_ms {
        if interval_ms == 0 {
            bail!("--interval-ms must be greater than 0");
        }
        ctx.settings
            .set_sync_interval_ms(interval_ms)
            .await
            .context("Failed to store sync interval")?;
    }

    let opened = AppContext::open_page(&page.url, &page.html)?;
    let platform = opened.adapter.platform();
    let controller = ctx.controller(opened.adapter);
    let mut status = controller.subscribe();

    if controller.initialize().await? == AutoSyncMode::Disabled
        && let Some(outcome) = controller.set_enabled(true).await?
    {
        println!("{outcome}");
    }
    println!(
        "Watching {} conversation, press Ctrl-C to stop.",
        platform.display_name()
    );

    loop {
        tokio::select! {
            signal = tokio::signal::ctrl_c() => {
                if let Err(error) = signal {
                    tracing::warn!(%error, "failed to listen for Ctrl-C");
                }
                break;
            }
            changed = status.changed() => {
                if changed.is_err() { break; }
                let syncing = *status.borrow_and_update();
                tracing::info!(syncing, "sync status changed");
            }
        }
    }

    controller.shutdown().await;
    Ok(())
}

async fn improve(ctx: &AppContext, page: &PageArgs, prompt: Option<String>) -> Result<()> {
    let opened = AppContext::open_page(&page.url, &page.html)?;
    if let Some(prompt) = prompt.as_deref() {
        opened.adapter.add_to_input(prompt);
    }

    let mut stdout = std::io::stdout();
    let outcome = improve_prompt(
        &ctx.client(),
        &ctx.trigger_stream(),
        opened.adapter.as_ref(),
        opened.page.as_ref(),
        |delta| {
            let _ = write!(stdout, "{delta}");
            let _ = stdout.flush();
        },
    )
    .await?;

    match outcome {
        ImproveOutcome::EmptyPrompt => bail!("Nothing to improve: the composer is empty"),
        ImproveOutcome::Improved { .. } => {
            println!();
            Ok(())
        }
    }
}
