use anyhow::{Context, Result};
use mac_smoke::view::{self, ScreenMap};
use mac_smoke::{
    load_initial_conditions, save_initial_conditions, Brush, Grid, ProjectOptions, SimConfig,
    StepParams, Vec2, WindTunnel,
};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

const REPORT_EVERY: usize = 60;
const VALUE_FLAGS: [&str; 3] = ["--steps", "--project", "--snapshot"];

struct Args {
    config: Option<PathBuf>,
    steps: usize,
    wind_tunnel: bool,
    project: Option<PathBuf>,
    snapshot: Option<PathBuf>,
}

fn flag_value(args: &[String], name: &str) -> Option<String> {
    args.windows(2).find(|w| w[0] == name).map(|w| w[1].clone())
}

/// First argument that is neither a flag nor the value of one.
fn positional(args: &[String]) -> Option<&String> {
    let mut skip_next = false;
    for arg in args {
        if skip_next {
            skip_next = false;
        } else if arg.starts_with("--") {
            skip_next = VALUE_FLAGS.contains(&arg.as_str());
        } else {
            return Some(arg);
        }
    }
    None
}

fn parse_args() -> Result<Args> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let steps = match flag_value(&args, "--steps") {
        Some(value) => value
            .parse()
            .with_context(|| format!("--steps expects a count, got {value:?}"))?,
        None => 600,
    };
    let config = positional(&args).map(PathBuf::from);
    Ok(Args {
        config,
        steps,
        wind_tunnel: args.iter().any(|a| a == "--wind-tunnel"),
        project: flag_value(&args, "--project").map(PathBuf::from),
        snapshot: flag_value(&args, "--snapshot").map(PathBuf::from),
    })
}

fn build_grid(args: &Args) -> Result<Grid> {
    let mut config = match &args.config {
        Some(path) => SimConfig::load(path)
            .with_context(|| format!("reading config {}", path.display()))?,
        None => SimConfig::default(),
    };
    let Some(project) = &args.project else {
        return Grid::new(config, None).context("invalid simulation config");
    };
    match ProjectOptions::load(project) {
        Ok(options) => options.apply_to(&mut config),
        Err(err) => log::warn!("{err}; keeping config resolution"),
    }
    let grid = config.grid().context("invalid simulation config")?;
    let report = load_initial_conditions(project, grid);
    if !report.all_loaded() {
        log::info!(
            "project {}: u {:?}, v {:?}, smoke {:?}, walls {:?}",
            project.display(),
            report.u,
            report.v,
            report.smoke,
            report.walls
        );
    }
    Grid::new(config, Some(report.initial)).context("initial conditions do not fit the grid")
}

fn save_project(sim: &mut Grid, project: &Path) -> Result<()> {
    sim.capture_initial_conditions();
    save_initial_conditions(project, sim.initial_conditions())
        .with_context(|| format!("saving {}", project.display()))?;
    let config = sim.config();
    let options = ProjectOptions {
        resolution: config.resolution,
        gravity: config.gravity,
    };
    options.save(project)?;
    Ok(())
}

fn write_snapshot(sim: &Grid, path: &Path) -> Result<()> {
    let map = ScreenMap::new(sim.grid().num_cells(), sim.config().cell_px);
    let mut image = view::smoke_image(sim.smoke(), false);
    view::overlay_walls(&mut image, sim.walls(), view::WALL_COLOUR);
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    image
        .scaled(map.cell_px)
        .write_ppm(BufWriter::new(file))
        .with_context(|| format!("writing {}", path.display()))?;
    log::info!("wrote {}x{} snapshot to {}", map.size_px(), map.size_px(), path.display());
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    let args = parse_args()?;
    let mut sim = build_grid(&args)?;
    let n = sim.grid().num_cells();

    if args.wind_tunnel {
        sim.set_wind_tunnel(Some(WindTunnel {
            speed: 2.0,
            smoke_width: (n / 12).max(3),
        }));
    } else if sim.smoke().sum() == 0.0 {
        // Nothing to look at otherwise: a rising plume from the floor.
        let brush = Brush::new((n / 2, n / 6), (n / 16).max(2));
        let (cx, cy) = sim.grid().cell_center(brush.center.0, brush.center.1);
        log::info!("plume source at ({cx:.2} m, {cy:.2} m)");
        sim.paint_smoke(brush, 1.0);
        sim.paint_velocity(brush, Vec2::new(0.0, 4.0));
    }

    let params = StepParams::from(sim.config());
    for step in 1..=args.steps {
        let report = sim.step(&params).context("invalid step parameters")?;
        if step % REPORT_EVERY == 0 || step == args.steps {
            log::info!(
                "step {step}: |div| {:.4} -> {:.4}, smoke {:.2}, max speed {:.3}",
                report.divergence_before,
                report.divergence_after,
                report.total_smoke,
                report.max_speed
            );
        }
        if !report.max_speed.is_finite() {
            log::warn!("solution diverged at step {step}; try a smaller dt");
            break;
        }
    }

    let diag = sim.diagnostics();
    println!(
        "{} steps, total |div| {:.4}, smoke {:.3}, max speed {:.3}, pressure [{:.1}, {:.1}]",
        diag.steps,
        diag.total_divergence,
        diag.total_smoke,
        diag.max_speed,
        diag.pressure_range.0,
        diag.pressure_range.1
    );

    if let Some(path) = &args.snapshot {
        write_snapshot(&sim, path)?;
    }
    if let Some(project) = &args.project {
        save_project(&mut sim, project)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(args: &[&str]) -> Vec<String> {
        args.iter().map(|a| a.to_string()).collect()
    }

    #[test]
    fn config_path_may_follow_flags() {
        let args = strings(&["--steps", "10", "--wind-tunnel", "cfg.json"]);
        assert_eq!(positional(&args).map(String::as_str), Some("cfg.json"));
        let args = strings(&["cfg.json", "--snapshot", "out.ppm"]);
        assert_eq!(positional(&args).map(String::as_str), Some("cfg.json"));
        let args = strings(&["--project", "proj", "--snapshot", "out.ppm"]);
        assert_eq!(positional(&args), None);
    }
}
