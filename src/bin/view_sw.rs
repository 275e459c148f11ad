use anyhow::Context;
use clap::{Parser, ValueEnum};
use minifb::{Key, KeyRepeat, Window, WindowOptions};
use std::time::{Duration, Instant};

use yadoom_refresh::{
    engine::{
        BrightnessMode, ChasecamMode, RenderConfig, RendererContext, Session, Viewport, ZoomState,
    },
    math::{ANG90, ANG180, Angle, FRACUNIT},
    renderer::{Rasterizer, Software},
    sim::{InputCmd, TicRunner},
    world::two_room_level,
};

/// CLI options handled via `clap` derive.
#[derive(Parser, Debug)]
#[command(author, version, about = "Walk around a test level with the software refresh")]
struct Opts {
    /// Integer upscale of the 320×200 view
    #[arg(long, default_value_t = 3)]
    scale: i32,

    /// Widescreen view width in pixels (needs --height)
    #[arg(long, requires = "height")]
    width: Option<i32>,

    /// Widescreen view height in pixels (needs --width)
    #[arg(long, requires = "width")]
    height: Option<i32>,

    /// Horizontal field of view in degrees
    #[arg(long, default_value_t = 90)]
    fov: i32,

    /// 32 light levels instead of 16
    #[arg(long)]
    smooth: bool,

    #[arg(long, value_enum, default_value_t = Chase::Off)]
    chasecam: Chase,

    /// Classic refresh only, no cosmetic effects
    #[arg(long)]
    strict: bool,

    /// Flash the view before drawing so holes show up
    #[arg(long)]
    hom: bool,

    /// Render only on tic boundaries
    #[arg(long)]
    no_uncapped: bool,

    /// -v debug, -vv trace
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Chase {
    Off,
    Back,
    Front,
}

impl From<Chase> for ChasecamMode {
    fn from(c: Chase) -> Self {
        match c {
            Chase::Off => ChasecamMode::Off,
            Chase::Back => ChasecamMode::Back,
            Chase::Front => ChasecamMode::Front,
        }
    }
}

/* ── stderr logger ────────────────────────────────────────────────── */
struct StderrLog;

impl log::Log for StderrLog {
    fn enabled(&self, meta: &log::Metadata) -> bool {
        meta.level() <= log::max_level()
    }

    fn log(&self, record: &log::Record) {
        if self.enabled(record.metadata()) {
            eprintln!("[{:5}] {}: {}", record.level(), record.target(), record.args());
        }
    }

    fn flush(&self) {}
}

static LOGGER: StderrLog = StderrLog;

fn next_chasecam(mode: ChasecamMode) -> ChasecamMode {
    match mode {
        ChasecamMode::Off => ChasecamMode::Back,
        ChasecamMode::Back => ChasecamMode::Front,
        ChasecamMode::Front => ChasecamMode::Off,
    }
}

fn main() -> anyhow::Result<()> {
    let opts = Opts::parse();

    log::set_logger(&LOGGER).map_err(|e| anyhow::anyhow!("logger: {e}"))?;
    log::set_max_level(match opts.verbose {
        0 => log::LevelFilter::Info,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    });

    let viewport = match (opts.width, opts.height) {
        (Some(w), Some(h)) => Viewport::widescreen(w, h),
        _ => Viewport::classic(opts.scale.max(1)),
    };

    let config = RenderConfig {
        fov: opts.fov,
        brightness: if opts.smooth {
            BrightnessMode::Smooth
        } else {
            BrightnessMode::Coarse
        },
        chasecam_mode: opts.chasecam.into(),
        strict: opts.strict,
        autodetect_hom: opts.hom,
        uncapped: !opts.no_uncapped,
        ..RenderConfig::default()
    };

    let level = two_room_level();
    log::info!(
        "level {}: {} sectors, {} segs",
        level.name,
        level.sectors.len(),
        level.segs.len()
    );

    let mut sim = TicRunner::new(&level, -128 * FRACUNIT, 0, Angle(0));
    let mut renderer = Software::default();
    let mut ctx = RendererContext::new(config, viewport, 1);

    let (w, h) = (viewport.width as usize, viewport.height as usize);
    let mut win = Window::new("yadoom refresh", w, h, WindowOptions::default())
        .context("opening window")?;
    win.set_target_fps(35);

    // ────────────────── benchmarking state ──────────────────────────────
    let mut acc_time = Duration::ZERO; // cumulated render time
    let mut acc_frames = 0usize; // frames in the current window
    let mut last_print = Instant::now(); // when we printed last
    let mut zoomed = false;

    while win.is_open() && !win.is_key_down(Key::Escape) {
        let t0 = Instant::now(); // ┌─ frame timer start

        /* --------------- build one InputCmd per frame --------------------- */
        let mut cmd = InputCmd::default();

        if win.is_key_down(Key::Up) || win.is_key_down(Key::W) {
            cmd.forward += 1.0;
        }
        if win.is_key_down(Key::Down) || win.is_key_down(Key::S) {
            cmd.forward -= 1.0;
        }

        let alt = win.is_key_down(Key::LeftAlt) || win.is_key_down(Key::RightAlt);
        if alt {
            /* Alt + ←/→  = strafe */
            if win.is_key_down(Key::Left) {
                cmd.strafe -= 1.0;
            }
            if win.is_key_down(Key::Right) {
                cmd.strafe += 1.0;
            }
        } else {
            /* plain ←/→   = turn   */
            if win.is_key_down(Key::Left) {
                cmd.turn += 1.0;
            }
            if win.is_key_down(Key::Right) {
                cmd.turn -= 1.0;
            }
        }

        /* WASD strafing mirrors arrow-key strafing */
        if win.is_key_down(Key::A) {
            cmd.strafe -= 1.0;
        }
        if win.is_key_down(Key::D) {
            cmd.strafe += 1.0;
        }
        cmd.run = win.is_key_down(Key::LeftShift) || win.is_key_down(Key::RightShift);

        /* view toggles (edge-triggered) ------------------------------------ */
        if win.is_key_pressed(Key::Z, KeyRepeat::No) {
            zoomed = !zoomed;
            ctx.set_zoom(if zoomed { ZoomState::On } else { ZoomState::Off });
        }
        if win.is_key_pressed(Key::T, KeyRepeat::No) {
            zoomed = false;
            let here = sim.snapshot(&level).map(|p| p.x).unwrap_or(0);
            let (x, angle) = if here < 0 {
                (128 * FRACUNIT, ANG180)
            } else {
                (-128 * FRACUNIT, Angle(0))
            };
            sim.teleport(&level, x, 0, angle);
            ctx.trigger_teleport();
        }
        if win.is_key_pressed(Key::X, KeyRepeat::No) {
            ctx.add_shake(20);
        }
        if win.is_key_pressed(Key::C, KeyRepeat::No) {
            let mut cfg = ctx.config().clone();
            cfg.chasecam_mode = next_chasecam(cfg.chasecam_mode);
            log::info!("chasecam {:?}", cfg.chasecam_mode);
            ctx.set_config(cfg);
        }
        if win.is_key_pressed(Key::B, KeyRepeat::No) {
            let mode = match ctx.config().brightness {
                BrightnessMode::Coarse => BrightnessMode::Smooth,
                BrightnessMode::Smooth => BrightnessMode::Coarse,
            };
            log::info!("brightness {mode:?}");
            ctx.set_brightness_mode(mode);
        }
        if win.is_key_pressed(Key::H, KeyRepeat::No) {
            let mut cfg = ctx.config().clone();
            cfg.autodetect_hom = !cfg.autodetect_hom;
            ctx.set_config(cfg);
        }
        if win.is_key_pressed(Key::Q, KeyRepeat::No) {
            // Quarter turn without interpolating, to exercise the snap path.
            if let Some(p) = sim.snapshot(&level) {
                sim.teleport(&level, p.x, p.y, p.angle + ANG90);
            }
        }

        /* tics ------------------------------------------------------------- */
        sim.set_input(cmd);
        sim.pump(&level);

        let Some(player) = sim.snapshot(&level) else {
            anyhow::bail!("player entity is gone");
        };

        /* draw ------------------------------------------------------------- */
        ctx.render_player_view(
            &level,
            &player,
            None,
            &sim.clock(),
            &Session::default(),
            &mut renderer,
            &mut || {},
        );

        let mut shown = Ok(());
        renderer.end_frame(|fb, w, h| {
            // ─────────── accumulate & report every ~3 s ────────────────────
            acc_time += t0.elapsed();
            acc_frames += 1;
            shown = win.update_with_buffer(fb, w, h);
        });
        shown.context("presenting frame")?;

        if last_print.elapsed() >= Duration::from_secs(3) {
            let avg_ms = acc_time.as_secs_f64() * 1000.0 / acc_frames as f64;
            let fps = 1000.0 / avg_ms;
            println!("avg render: {:.2} ms  ({:.1} FPS)", avg_ms, fps);
            acc_time = Duration::ZERO;
            acc_frames = 0;
            last_print = Instant::now();
        }
    }
    Ok(())
}
