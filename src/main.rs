// What it does:
// • Watches a square around the center of the target window for red pixels.
// • While MOUSE1/MOUSE3 is held (or autoaim is on), nudges the pointer onto them.
// • L-CTRL + L-ALT toggles the bot, [ autoaim, ] the outline, \ prints scans/s.
// • Runs until killed.

mod aim;
mod config;
mod draw;
mod error;
mod mouse;
mod platform;
mod pointer;
mod rng;
mod scan;
mod session;
mod smooth;
mod status;
mod types;
mod vision;
mod x11;

use aim::Controller;
use clap::Parser;
use config::{CONFIG_FILE, Config, FIND_WINDOW_STR, OPTION_DELAY};
use draw::Preview;
use error::Result;
use platform::{Inputs, WindowResolver};
use rng::Rng32;
use session::Session;
use status::{StatusMode, StatusView};
use std::io::{self, Stdout};
use std::thread;
use std::time::Instant;
use tracing::{debug, error, info, trace, warn};
use tracing_subscriber::EnvFilter;
use x11::X11Desktop;

#[derive(Parser, Debug)]
#[command(name = "crimson-lock", version, about = "Color-locked aim assist for X11", long_about = None)]
struct Args {
    /// Status display: omit (or 0) for the full panel, otherwise a single
    /// status line drawn in this 256-color index
    mode: Option<u8>,
}

fn main() {
    let args = Args::parse();
    init_logging();

    // Unrecoverable platform failures end the process, still with status 0.
    if let Err(e) = run(&args) {
        error!(error = %e, "stopping");
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("crimson_lock=warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn run(args: &Args) -> Result<()> {
    let mut status = StatusView::new(io::stdout(), StatusMode::from_arg(args.mode), Rng32::from_time());

    let cfg = Config::load(CONFIG_FILE)?;
    let mut desk = X11Desktop::connect()?;

    let mut ctl = Controller::new(&cfg, Instant::now());
    ctl.session.target = desk.resolve(FIND_WINDOW_STR);
    redraw(&mut status, &ctl.session);

    let buttons = mouse::spawn_poller(mouse::MICE_DEVICE)?;

    let mut preview = match cfg.preview_scale {
        0 => None,
        scale => match Preview::new(scale) {
            Ok(p) => Some(p),
            Err(e) => {
                warn!(error = %e, "scan preview unavailable");
                None
            }
        },
    };

    info!(?cfg, "control loop running");
    loop {
        thread::sleep(cfg.scan_delay);

        let inputs = Inputs::poll(&desk, buttons.snapshot());
        let report = ctl.tick(&mut desk, &inputs, Instant::now());

        if let Some((dx, dy)) = report.moved {
            trace!(dx, dy, "cycle moved pointer");
        }
        if report.window_missing {
            log_io(status.window_failure());
        }
        if let Some(sps) = report.sps {
            log_io(status.scans_per_second(sps));
        }

        if let Some(p) = preview.as_mut() {
            let shown = match &report.frame {
                Some(frame) => p.show(frame, ctl.session.locked_on),
                None => {
                    p.idle();
                    Ok(())
                }
            };
            if let Err(e) = shown {
                warn!(error = %e, "preview update failed");
            }
            if !p.is_open() {
                info!("preview closed");
                preview = None;
            }
        }

        if report.changed {
            thread::sleep(OPTION_DELAY);
            if !report.window_missing {
                redraw(&mut status, &ctl.session);
            }
        }
    }
}

fn redraw(status: &mut StatusView<Stdout>, session: &Session) {
    log_io(status.reprint(session));
}

fn log_io(res: io::Result<()>) {
    if let Err(e) = res {
        debug!(error = %e, "status output failed");
    }
}
