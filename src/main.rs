use std::time::Duration;

use anyhow::Result;
use log::info;
use structopt::StructOpt;

use overworld::input::Intent;
use overworld::state::game_state::GameState;

// ---------------------------------------------------------------------------------------------------------------------

#[derive(StructOpt, Debug)]
struct Options {
    /// Number of fixed 60 Hz steps to simulate
    #[structopt(short, long, default_value = "600")]
    steps: u32,

    /// Walk right and hop periodically instead of standing still
    #[structopt(short, long)]
    autoplay: bool,
}

// ---------------------------------------------------------------------------------------------------------------------

/// Headless driver standing in for the excluded presentation layer: it
/// synthesizes input intents, steps the simulation at a fixed cadence,
/// and logs scene summaries instead of drawing them.
fn main() -> Result<()> {
    env_logger::init();

    let options = Options::from_args();
    let mut state = GameState::new()?;
    let dt = Duration::from_secs_f32(1.0 / 60.0);

    for step in 0..options.steps {
        let intent = if options.autoplay {
            scripted(step)
        } else {
            Intent::default()
        };
        if intent.quit {
            break;
        }

        state.update(dt, &intent);

        if step % 60 == 0 {
            let scene = state.scene();
            info!(
                "t={:>6.2}s player at ({:6.1}, {:6.1}) frame {:2}, {} fireball(s) live",
                state.time(),
                scene.player.bounds.origin.x,
                scene.player.bounds.origin.y,
                scene.player.frame,
                scene.fireballs.len(),
            );
        }
    }

    let scene = state.scene();
    println!(
        "simulated {:.2}s: player ended at ({:.1}, {:.1}); {} blocks, {} items, {} coins in scene",
        state.time(),
        scene.player.bounds.origin.x,
        scene.player.bounds.origin.y,
        scene.blocks.len(),
        scene.items.len(),
        scene.coins.len(),
    );

    Ok(())
}

fn scripted(step: u32) -> Intent {
    Intent {
        move_right: true,
        jump: step % 75 < 20,
        ..Intent::default()
    }
}
