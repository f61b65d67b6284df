mod config;
mod inputs;

use std::{path::PathBuf, process::ExitCode, time::Duration};

use bevy::{
    log::{LogPlugin, debug, info, warn},
    prelude::*,
    time::TimeUpdateStrategy,
};
use bevy_anim_replay::prelude::*;
use clap::Parser;
use config::{ToolConfig, ToolError, read_to_string};
use inputs::{DrivenCharacter, InputDriver, drive_inputs};

/// Records a graph driven by random inputs and checks that a client joining part way through
/// reproduces the recorded poses.
#[derive(Parser)]
struct Cli {
    /// Graph definition (`*.syncgraph.ron`). Defaults to the bundled walker graph.
    #[arg(short, long)]
    graph: Option<PathBuf>,
    /// Number of ticks to record
    #[arg(short, long)]
    frames: Option<usize>,
    /// Frame at which the replicated instance joins
    #[arg(short, long)]
    join_frame: Option<usize>,
    #[arg(short, long)]
    seed: Option<u64>,
    /// Tool configuration (`*.ron`). Command line flags take precedence.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

impl Cli {
    fn into_config(self) -> Result<ToolConfig, ToolError> {
        let mut config = match &self.config {
            Some(path) => ToolConfig::load(path)?,
            None => ToolConfig::default(),
        };
        if self.graph.is_some() {
            config.graph = self.graph;
        }
        if let Some(frames) = self.frames {
            config.frames = frames;
        }
        if self.join_frame.is_some() {
            config.join_frame = self.join_frame;
        }
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        config.validate()?;
        Ok(config)
    }
}

fn main() -> Result<ExitCode, ToolError> {
    let config = Cli::parse().into_config()?;
    let definition = match &config.graph {
        Some(path) => SyncGraphDefinition::from_ron_str(&read_to_string(path)?)?,
        None => SyncGraphDefinition::from_ron_str(WALKER_GRAPH_RON)?,
    };
    let variation = SyncGraphVariation::new(definition);

    let mut app = App::new();
    app //
        .add_plugins((MinimalPlugins, LogPlugin::default()))
        .add_plugins(NetworkReplayPlugin::new(variation.clone()).in_schedule(Update))
        .insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_secs_f32(
            config.delta_time,
        )))
        .insert_resource(InputDriver::new(config.seed, config.input_interval))
        .add_systems(Update, drive_inputs.before(ReplaySet::Record));

    if let Ok(effective) = ron::ser::to_string(&config) {
        info!("Running with {effective}");
    }

    let character = app
        .world_mut()
        .spawn((
            DrivenCharacter,
            Transform::default(),
            ReplayGraphPlayer::new(variation.instantiate(0)),
        ))
        .id();

    queue(&mut app, ReplayCommand::StartRecording(character));
    // The first update has no elapsed time and records nothing
    app.update();
    for _ in 0..config.frames {
        app.update();
    }

    queue(&mut app, ReplayCommand::StopRecording);
    if let Some(join_frame) = config.join_frame {
        queue(&mut app, ReplayCommand::SelectFrame(join_frame));
        queue(&mut app, ReplayCommand::SimulateJoinInProgress);
    }
    app.update();

    Ok(summarize(
        app.world()
            .resource::<NetworkReplayDebugView<SyncGraphVariation>>(),
    ))
}

fn queue(app: &mut App, command: ReplayCommand) {
    app.world_mut()
        .resource_mut::<NetworkReplayDebugView<SyncGraphVariation>>()
        .queue(command);
}

/// Logs the replay results. Fails when the replicated track diverged after joining.
fn summarize(view: &NetworkReplayDebugView<SyncGraphVariation>) -> ExitCode {
    if let Some(error) = view.last_error() {
        warn!("Replay failed: {error}");
        return ExitCode::FAILURE;
    }
    let Some(session) = view.session() else {
        warn!("Nothing was recorded");
        return ExitCode::FAILURE;
    };
    let store = view.store();

    if let Some(stats) = session.size_stats() {
        info!(
            "Recorded {} frames, serialized task data between {} and {} bytes",
            stats.sizes.len(),
            stats.min,
            stats.max
        );
    }

    for frame in 0..store.count() {
        match frame_report(store, session.actual_instance(), frame) {
            Ok(report) => debug!("{report}"),
            Err(error) => warn!("{error}"),
        }
    }
    if let Some(report) = view.report() {
        info!("{report}");
    }

    let divergent = &session.actual_track().divergent_frames;
    if !divergent.is_empty() {
        warn!("Task streams were not reproduced on frames {divergent:?}");
    }

    let mismatched = session.mismatched_frames();
    if mismatched.is_empty() {
        info!(
            "Replicated track matches the actual track from frame {}",
            session.join_frame().unwrap_or(0)
        );
        ExitCode::SUCCESS
    } else {
        warn!("Replicated track diverged on frames {mismatched:?}");
        ExitCode::FAILURE
    }
}
