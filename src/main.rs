//! `rend` — an offline CPU ray tracer driven by a scene description
//! file. Parses a scene, validates it, renders it with a multi-threaded
//! job pool, and saves the result as BMP or PNG.

use clap::Parser;
use log::error;
use rend_rs::scene::Scene;
use rend_rs::{error, image_io, parser};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;

/// rend — an offline CPU ray tracer
#[derive(Parser, Debug)]
#[command(
    name = "rend",
    version,
    about = "Offline CPU ray tracer with CSG solids and procedural shaders",
    after_help = "EXAMPLES:\n  \
                  rend scene.scn out.png\n  \
                  rend -j4 scene.scn out.bmp\n  \
                  rend --interactive"
)]
struct Cli {
    /// Scene description file to render
    scene_file: Option<PathBuf>,

    /// Output image path (extension selects BMP/PNG, default PNG)
    image_file: Option<PathBuf>,

    /// Number of worker threads (defaults to hardware concurrency when
    /// omitted or given with no value)
    #[arg(short = 'j', long = "jobs", num_args = 0..=1, default_missing_value = "0")]
    jobs: Option<usize>,

    /// Enter an interactive REPL instead of rendering one scene
    #[arg(short, long)]
    interactive: bool,

    /// Gamma value applied when converting linear samples to 8-bit output
    #[arg(long, default_value_t = 2.2)]
    gamma: f64,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    if cli.interactive {
        return run_repl(cli.jobs.unwrap_or(0), cli.gamma);
    }

    let Some(scene_path) = cli.scene_file else {
        error!("no scene file given (use --interactive for a REPL)");
        return ExitCode::FAILURE;
    };
    let image_path = cli.image_file.unwrap_or_else(|| scene_path.with_extension("png"));

    match render_to_file(&scene_path, &image_path, cli.jobs.unwrap_or(0), cli.gamma) {
        Ok(()) => ExitCode::SUCCESS,
        Err(msg) => {
            error!("{msg}");
            ExitCode::FAILURE
        }
    }
}

fn render_to_file(scene_path: &PathBuf, image_path: &PathBuf, jobs: usize, gamma: f64) -> Result<(), String> {
    let mut scene = parser::load_scene(scene_path).map_err(|e| e.to_string())?;
    scene.init().map_err(|e| e.to_string())?;
    let fb = scene.render(jobs);
    image_io::write_image(&fb, image_path, gamma).map_err(|e| e.to_string())
}

/// A minimal line-oriented REPL: `load <scene-file>`, `render
/// <image-file>`, `quit`. There is no progressive/live display of a
/// render in progress — each `render` command blocks until the frame
/// buffer is complete, then saves it.
fn run_repl(jobs: usize, gamma: f64) -> ExitCode {
    let stdin = io::stdin();
    let mut scene: Option<Scene> = None;
    print!("rend> ");
    let _ = io::stdout().flush();

    for line in stdin.lock().lines() {
        let Ok(line) = line else { break };
        let mut parts = line.trim().splitn(2, ' ');
        match parts.next() {
            Some("load") => {
                let Some(path) = parts.next() else {
                    println!("usage: load <scene-file>");
                    continue;
                };
                match parser::load_scene(&PathBuf::from(path)).and_then(|mut s| {
                    s.init().map(|_| s).map_err(|e| error::ParseError::UnexpectedToken {
                        path: PathBuf::from(path),
                        line: 0,
                        column: 0,
                        message: e.to_string(),
                    })
                }) {
                    Ok(s) => {
                        println!("loaded {path}");
                        scene = Some(s);
                    }
                    Err(e) => println!("error: {e}"),
                }
            }
            Some("render") => {
                let Some(path) = parts.next() else {
                    println!("usage: render <image-file>");
                    continue;
                };
                match &scene {
                    Some(s) => {
                        let fb = s.render(jobs);
                        match image_io::write_image(&fb, &PathBuf::from(path), gamma) {
                            Ok(()) => println!("wrote {path}"),
                            Err(e) => println!("error: {e}"),
                        }
                    }
                    None => println!("no scene loaded"),
                }
            }
            Some("quit") | Some("exit") => break,
            Some("") | None => {}
            Some(other) => println!("unknown command '{other}'"),
        }
        print!("rend> ");
        let _ = io::stdout().flush();
    }
    ExitCode::SUCCESS
}
