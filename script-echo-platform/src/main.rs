//! Script Echo Platform
//!
//! Boots the platform with in-process collaborators, runs a hosted session
//! and a mini-game, and prints the final player snapshot.

use std::sync::Arc;
use std::time::Duration;
use anyhow::Context;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use script_echo::{
    VERSION,
    app::{Collaborators, Platform},
    config::PlatformConfig,
    game::profile::{PlayerProfile, RoleType},
    integration::{
        local::{InstantLoader, RecordingTimeControl, ScriptedMission, StaticLocator},
        minigame::IntegrationEvent,
    },
    platform::surface::RecordingSurfaces,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("failed to set tracing subscriber")?;

    info!("Script Echo Platform v{}", VERSION);

    let mut config = PlatformConfig::from_env().context("invalid SCRIPT_ECHO_* configuration")?;
    // Keep the demo short.
    config.integration.grace_period = Duration::from_millis(200);
    info!(
        "Mini-game area: {}, timeout: {:?}",
        config.integration.default_area, config.integration.session_timeout
    );

    let mission = Arc::new(ScriptedMission::new(3));
    let loader = InstantLoader::with_delay(Duration::from_millis(100))
        .restricted_to(&[config.integration.default_area.as_str()]);
    let platform = Platform::new(
        config,
        Collaborators {
            surfaces: Arc::new(RecordingSurfaces::new()),
            loader: Arc::new(loader),
            locator: Arc::new(StaticLocator::with_source(mission.clone())),
            time: Arc::new(RecordingTimeControl::new()),
        },
    );

    let player = platform.bootstrap();
    let auto_save = platform.spawn_auto_save();

    demo_session(&platform).await?;
    demo_mini_game(&platform, &mission).await?;

    let snapshot = platform.shutdown().context("no player to save")?;
    if let Some((handle, _rx)) = auto_save {
        handle.abort();
    }

    info!(
        "Player {} ({}) finished at level {}",
        snapshot.display_name,
        player.lock().id.short(),
        snapshot.level()
    );
    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    Ok(())
}

/// Host a session, fill it, play it and settle revenue.
async fn demo_session(platform: &Platform) -> anyhow::Result<()> {
    info!("=== Hosting Demo Session ===");

    let id = platform.host_session("Midnight Manor", "manor_v1").await?;
    for (name, role) in [("Grace", RoleType::Suspect), ("Linus", RoleType::Witness), ("Barbara", RoleType::Victim)] {
        platform.join_session(id, &PlayerProfile::new(name), role).await?;
    }

    let session = platform.sessions().get_session(&id).await.context("hosted session vanished")?;
    {
        let mut session = session.write().await;
        let ids: Vec<_> = session.players().iter().map(|p| p.player_id).collect();
        for pid in &ids {
            session.set_player_ready(pid, true);
        }
        session.check_readiness();
        info!("Session {} status: {:?}", id.short(), session.status());

        session.start_session()?;
        session.enable_bonus_mini_game("MainGameAR_ARDK");
        session.advance_chapter()?;
        session.complete_objective("find_the_key");
    }

    let split = platform.finish_session(id).await?;
    info!(
        "Revenue - total: {}, host: {}, platform: {}, players: {}",
        split.total, split.host, split.platform, split.players
    );

    let archived = platform.sessions().archive_finished().await;
    info!("Archived {} finished sessions", archived.len());
    Ok(())
}

/// Launch the mini-game, clear every target and wait for the automatic exit.
async fn demo_mini_game(platform: &Platform, mission: &ScriptedMission) -> anyhow::Result<()> {
    info!("=== Running Demo Mini-Game ===");

    let mut events = platform.integration().subscribe();
    platform.launch_mini_game(None)?;

    loop {
        match events.recv().await? {
            IntegrationEvent::AreaReady { .. } => {
                for lap in ["lap_1", "lap_2", "lap_3"] {
                    tokio::time::sleep(Duration::from_millis(50)).await;
                    mission.complete_one(lap);
                }
            }
            IntegrationEvent::Exited(report) => {
                info!("Mini-game over ({:?}) after {:?}", report.reason, report.elapsed);
                break;
            }
            IntegrationEvent::LoadFailed { reason, .. } => {
                anyhow::bail!("mini-game failed to load: {}", reason);
            }
            _ => {}
        }
    }

    let stats = platform.integration().stats();
    info!("Integration active after exit: {}", stats.active);
    Ok(())
}
